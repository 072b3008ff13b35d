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

//! Errors raised by the lighting lanes.

use glimmer_core::renderer::{RenderError, ShaderError, UsageError};

/// Errors raised while configuring or running the light pre-pass.
#[derive(thiserror::Error, Debug)]
pub enum LightingError {
    /// A device call failed.
    #[error(transparent)]
    Render(#[from] RenderError),

    /// A configuration value is out of range.
    #[error("Invalid light pre-pass configuration: {0}")]
    InvalidConfig(String),

    /// A light was submitted with out-of-range parameters and was skipped.
    #[error("Invalid light: {0}")]
    InvalidLight(String),

    /// The configuration file could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file is not valid RON.
    #[error("Parse error: {0}")]
    Parse(String),
}

impl LightingError {
    /// Returns `true` if the device was lost and the frame should be retried
    /// after a reset.
    pub fn is_device_lost(&self) -> bool {
        matches!(self, LightingError::Render(e) if e.is_device_lost())
    }

    /// The usage error behind this failure, if any.
    pub fn usage(&self) -> Option<&UsageError> {
        match self {
            LightingError::Render(RenderError::Usage(e)) => Some(e),
            _ => None,
        }
    }

    /// The shader module a shader error refers to, if any.
    pub fn shader_module(&self) -> Option<&str> {
        match self {
            LightingError::Render(RenderError::Shader(e)) => Some(e.module()),
            LightingError::Render(RenderError::ParameterTypeMismatch { module, .. }) => {
                Some(module)
            }
            _ => None,
        }
    }
}

impl From<ShaderError> for LightingError {
    fn from(e: ShaderError) -> Self {
        LightingError::Render(RenderError::Shader(e))
    }
}

impl From<UsageError> for LightingError {
    fn from(e: UsageError) -> Self {
        LightingError::Render(RenderError::Usage(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrapped_errors_keep_their_details() {
        let err = LightingError::from(ShaderError::MissingParameter {
            module: "PointLight".into(),
            name: "Foo".into(),
        });
        assert_eq!(err.shader_module(), Some("PointLight"));
        assert!(err.to_string().contains("Foo"));
        assert!(!err.is_device_lost());

        let lost = LightingError::from(RenderError::DeviceLost);
        assert!(lost.is_device_lost());

        let usage = LightingError::from(UsageError::NotBegun { scope: "lane" });
        assert_eq!(usage.usage(), Some(&UsageError::NotBegun { scope: "lane" }));
    }
}
