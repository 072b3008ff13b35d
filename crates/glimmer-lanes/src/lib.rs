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

//! # Glimmer Lanes
//!
//! Hot-path strategies of the light pre-pass: the light accumulation buffer,
//! the directional and point light lanes, the parameter cache they upload
//! through, and the heuristic choosing how a point light volume is drawn.
//!
//! Lanes only talk to the `GraphicsDevice` contract of `glimmer-core` and never
//! to a concrete backend.

#![warn(missing_docs)]

pub mod light_lane;

pub use light_lane::*;
