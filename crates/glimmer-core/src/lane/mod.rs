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

//! # Lane Abstraction
//!
//! The base trait shared by every lighting strategy.
//!
//! A **Lane** is a reusable, swappable processing strategy owned by an agent.
//! Each lane encapsulates one algorithmic approach to a rendering task, holds
//! GPU-side handles it resolved during initialization, and must be able to
//! drop those handles when the device is reset.
//!
//! ## Usage
//!
//! ```rust
//! use glimmer_core::lane::{Lane, LaneKind};
//!
//! struct FlatAmbientLane {
//!     resolved: bool,
//! }
//!
//! impl Lane for FlatAmbientLane {
//!     fn strategy_name(&self) -> &'static str { "FlatAmbient" }
//!     fn lane_kind(&self) -> LaneKind { LaneKind::Lighting }
//!     fn on_device_reset(&mut self) { self.resolved = false; }
//! }
//!
//! let mut lane = FlatAmbientLane { resolved: true };
//! lane.on_device_reset();
//! assert!(!lane.resolved);
//! assert_eq!(lane.lane_kind().to_string(), "Lighting");
//! ```

use std::fmt;

/// Classification of lane types, used for routing and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LaneKind {
    /// Light accumulation into the light buffer.
    Lighting,
    /// Render target ownership and clearing.
    Target,
}

impl fmt::Display for LaneKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LaneKind::Lighting => write!(f, "Lighting"),
            LaneKind::Target => write!(f, "Target"),
        }
    }
}

/// Common interface of every lane.
pub trait Lane: Send {
    /// A short, stable name used in logs and frame reports.
    fn strategy_name(&self) -> &'static str;

    /// The kind of work this lane performs.
    fn lane_kind(&self) -> LaneKind;

    /// Called after the graphics device has been reset.
    ///
    /// Every handle resolved from the old device is stale at this point.
    /// Implementations must forget them and re-resolve on next use.
    fn on_device_reset(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullLane;

    impl Lane for NullLane {
        fn strategy_name(&self) -> &'static str {
            "Null"
        }

        fn lane_kind(&self) -> LaneKind {
            LaneKind::Target
        }
    }

    #[test]
    fn test_default_reset_is_noop() {
        let mut lane = NullLane;
        lane.on_device_reset();
        assert_eq!(lane.strategy_name(), "Null");
        assert_eq!(format!("{}", lane.lane_kind()), "Target");
    }
}
