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

//! Light accumulation lanes.
//!
//! A frame of the light pre-pass opens the [`AccumulationBuffer`], then for each
//! light calls `begin` and `render` on the lane matching the light kind, and
//! finally closes the buffer. Every lane uploads its parameters through its own
//! [`ParameterCache`].

mod accumulation;
mod config;
mod directional_lane;
mod error;
mod parameter_cache;
mod point_lane;
pub mod shaders;
mod visibility;
mod volume;

pub use accumulation::*;
pub use config::*;
pub use directional_lane::*;
pub use error::*;
pub use parameter_cache::*;
pub use point_lane::*;
pub use visibility::*;
pub use volume::*;
