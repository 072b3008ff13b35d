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

//! Provides the public, backend-agnostic rendering contracts.
//!
//! This module defines the 'what' of rendering: the [`GraphicsDevice`] trait, the
//! data types it exchanges, the per-frame camera and light descriptions, and the
//! error types. The 'how' lives in a backend crate implementing these traits,
//! and the lighting lanes use them without knowing which backend runs.

pub mod api;
pub mod camera;
pub mod error;
pub mod light;
pub mod traits;

// Re-export the most important traits and types for easier use.
pub use self::api::*;
pub use self::camera::{CameraFrame, GBufferTextures};
pub use self::error::{RenderError, ResourceError, ShaderError, UsageError};
pub use self::light::{
    ClipVolume, DirectionalLightParams, Light, PointLightParams, ShadowSource, VolumeSpace,
};
pub use self::traits::GraphicsDevice;
