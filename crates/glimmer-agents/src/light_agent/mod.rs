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

//! Acts as the **[A]gent** of the light pre-pass.
//!
//! [`LightPrePassAgent`] owns the accumulation buffer and one lane per light
//! kind. Every frame it opens the buffer, dispatches each submitted light to
//! the matching lane in submission order, and closes the buffer. A lost device
//! abandons the frame; the agent then recreates its device objects on the next
//! call instead of surfacing the failure.

mod agent;
mod report;

pub use agent::*;
pub use report::*;
