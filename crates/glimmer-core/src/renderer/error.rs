// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Defines the hierarchy of error types for the rendering subsystem.

use std::fmt;

/// An error raised while loading a shader program or resolving its handles.
///
/// Every variant names the module (program label) it concerns, so a failure at
/// startup points at the shader that needs fixing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShaderError {
    /// The program could not be loaded into an effect.
    LoadFailed {
        /// The module being loaded.
        module: String,
        /// Backend-specific details.
        details: String,
    },
    /// A parameter name was not found in the program.
    MissingParameter {
        /// The module being resolved.
        module: String,
        /// The parameter name that was looked up.
        name: String,
    },
    /// A technique name was not found in the program.
    MissingTechnique {
        /// The module being resolved.
        module: String,
        /// The technique name that was looked up.
        name: String,
    },
}

impl ShaderError {
    /// The module the error concerns.
    pub fn module(&self) -> &str {
        match self {
            ShaderError::LoadFailed { module, .. }
            | ShaderError::MissingParameter { module, .. }
            | ShaderError::MissingTechnique { module, .. } => module,
        }
    }
}

impl fmt::Display for ShaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderError::LoadFailed { module, details } => {
                write!(f, "Failed to load shader module '{module}': {details}")
            }
            ShaderError::MissingParameter { module, name } => {
                write!(f, "Shader module '{module}' has no parameter named '{name}'")
            }
            ShaderError::MissingTechnique { module, name } => {
                write!(f, "Shader module '{module}' has no technique named '{name}'")
            }
        }
    }
}

impl std::error::Error for ShaderError {}

/// An error related to the creation or use of a GPU resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceError {
    /// The handle does not refer to a live resource. Handles created before a
    /// device reset end up here.
    NotFound {
        /// The kind of resource that was looked up.
        kind: &'static str,
        /// The raw handle value.
        id: usize,
    },
    /// The handle exists but cannot be used for the requested operation.
    InvalidHandle(String),
    /// The format cannot be used for the requested operation.
    UnsupportedFormat(String),
    /// Uploaded data does not match the resource size.
    SizeMismatch {
        /// Expected number of bytes.
        expected: usize,
        /// Received number of bytes.
        actual: usize,
    },
    /// An error originating from the specific graphics backend implementation.
    BackendError(String),
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceError::NotFound { kind, id } => write!(f, "No live {kind} with ID {id}"),
            ResourceError::InvalidHandle(msg) => write!(f, "Invalid resource handle: {msg}"),
            ResourceError::UnsupportedFormat(msg) => write!(f, "Unsupported format: {msg}"),
            ResourceError::SizeMismatch { expected, actual } => {
                write!(f, "Data size mismatch: expected {expected} bytes, got {actual}")
            }
            ResourceError::BackendError(msg) => {
                write!(f, "Backend-specific resource error: {msg}")
            }
        }
    }
}

impl std::error::Error for ResourceError {}

/// A protocol violation by the caller, such as rendering outside a begin/end pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UsageError {
    /// `begin` was called while the scope was already open.
    AlreadyBegun {
        /// The scope that was opened twice.
        scope: &'static str,
    },
    /// An operation requiring an open scope was called outside of it.
    NotBegun {
        /// The scope that should have been open.
        scope: &'static str,
    },
    /// A render target was popped with only the default output bound.
    TargetStackEmpty,
}

impl fmt::Display for UsageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UsageError::AlreadyBegun { scope } => {
                write!(f, "{scope}: begin called twice without end")
            }
            UsageError::NotBegun { scope } => write!(f, "{scope}: called outside begin/end"),
            UsageError::TargetStackEmpty => {
                write!(f, "Cannot pop the default render target")
            }
        }
    }
}

impl std::error::Error for UsageError {}

/// A high-level error that can occur within the rendering system.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderError {
    /// The graphics device was lost. Every resource created so far is gone.
    DeviceLost,
    /// An error related to a GPU resource.
    Resource(ResourceError),
    /// An error related to a shader program.
    Shader(ShaderError),
    /// A protocol violation by the caller.
    Usage(UsageError),
    /// A parameter upload did not match the parameter's declared type.
    ParameterTypeMismatch {
        /// The module owning the parameter.
        module: String,
        /// The parameter name.
        name: String,
    },
}

impl RenderError {
    /// Returns `true` for [`RenderError::DeviceLost`].
    pub fn is_device_lost(&self) -> bool {
        matches!(self, RenderError::DeviceLost)
    }
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::DeviceLost => write!(f, "The graphics device was lost"),
            RenderError::Resource(e) => write!(f, "Resource error: {e}"),
            RenderError::Shader(e) => write!(f, "Shader error: {e}"),
            RenderError::Usage(e) => write!(f, "Usage error: {e}"),
            RenderError::ParameterTypeMismatch { module, name } => {
                write!(f, "Parameter '{name}' of '{module}' received a value of the wrong type")
            }
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::Resource(e) => Some(e),
            RenderError::Shader(e) => Some(e),
            RenderError::Usage(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ResourceError> for RenderError {
    fn from(err: ResourceError) -> Self {
        RenderError::Resource(err)
    }
}

impl From<ShaderError> for RenderError {
    fn from(err: ShaderError) -> Self {
        RenderError::Shader(err)
    }
}

impl From<UsageError> for RenderError {
    fn from(err: UsageError) -> Self {
        RenderError::Usage(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shader_errors_name_the_module() {
        let err = ShaderError::MissingParameter {
            module: "PointLight".into(),
            name: "InvLightRadius".into(),
        };
        assert_eq!(err.module(), "PointLight");
        let msg = RenderError::from(err).to_string();
        assert!(msg.contains("PointLight"));
        assert!(msg.contains("InvLightRadius"));
    }

    #[test]
    fn device_lost_is_detected() {
        assert!(RenderError::DeviceLost.is_device_lost());
        assert!(!RenderError::from(UsageError::TargetStackEmpty).is_device_lost());
    }
}
