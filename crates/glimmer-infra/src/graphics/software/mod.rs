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

//! A CPU implementation of the `GraphicsDevice` contract.
//!
//! Draws run the shader programs of `glimmer-core` directly: vertices go through
//! the program's vertex stage, triangles are clipped against the near plane and
//! rasterized with a top-left fill rule, and each covered sample runs the
//! stencil test, the depth test, the fragment stage and blending in that order.
//! Samples sit at integer window coordinates.

mod device;
mod gbuffer;
mod raster;
mod surface;

pub use device::*;
pub use gbuffer::*;
pub use surface::{cube_face_uv, cube_texel_direction};
