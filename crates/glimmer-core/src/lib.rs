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

//! # Glimmer Core
//!
//! Foundational crate containing the math primitives, backend-agnostic rendering
//! contracts, and error types shared by every other Glimmer crate.
//!
//! Nothing in here talks to a real GPU. The lanes in `glimmer-lanes` are written
//! against the [`renderer::GraphicsDevice`] trait, and concrete backends live in
//! `glimmer-infra`.

#![warn(missing_docs)]

pub mod lane;
pub mod math;
pub mod renderer;
