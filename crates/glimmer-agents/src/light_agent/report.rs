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

//! Per-frame statistics of the light pre-pass.

use std::fmt;
use std::time::Duration;

/// What happened during one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameReport {
    /// Index of the frame, starting at 1 for the first rendered frame.
    pub frame: u64,
    /// Directional lights accumulated.
    pub directional_lights: u32,
    /// Point lights drawn with the two-pass stencil path.
    pub near_point_lights: u32,
    /// Point lights drawn with the single-pass path.
    pub far_point_lights: u32,
    /// Lights rejected because of invalid parameters.
    pub skipped_lights: u32,
    /// Parameter uploads that reached the device.
    pub parameter_uploads: u64,
    /// Parameter uploads avoided by the caches.
    pub parameter_uploads_skipped: u64,
    /// Wall-clock time spent in the frame.
    pub frame_time: Duration,
}

impl FrameReport {
    /// Total number of lights accumulated.
    pub fn lights_rendered(&self) -> u32 {
        self.directional_lights + self.near_point_lights + self.far_point_lights
    }
}

impl fmt::Display for FrameReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "frame={} lights={} (dir={} near={} far={} skipped={}) uploads={} cached={} time={:.2}ms",
            self.frame,
            self.lights_rendered(),
            self.directional_lights,
            self.near_point_lights,
            self.far_point_lights,
            self.skipped_lights,
            self.parameter_uploads,
            self.parameter_uploads_skipped,
            self.frame_time.as_secs_f32() * 1000.0,
        )
    }
}

/// Result of [`LightPrePassAgent::render_frame`](super::LightPrePassAgent::render_frame).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameOutcome {
    /// The frame was lit completely.
    Rendered(FrameReport),
    /// The device was lost during the frame. Nothing usable was produced and
    /// the agent will rebuild its device objects on the next call.
    Skipped,
}

impl FrameOutcome {
    /// The report of a rendered frame.
    pub fn report(&self) -> Option<&FrameReport> {
        match self {
            FrameOutcome::Rendered(report) => Some(report),
            FrameOutcome::Skipped => None,
        }
    }

    /// Returns `true` if the frame was skipped.
    pub fn is_skipped(&self) -> bool {
        matches!(self, FrameOutcome::Skipped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_lists_counts() {
        let report = FrameReport {
            frame: 3,
            directional_lights: 1,
            near_point_lights: 2,
            far_point_lights: 4,
            ..FrameReport::default()
        };
        assert_eq!(report.lights_rendered(), 7);
        let text = report.to_string();
        assert!(text.starts_with("frame=3 lights=7 (dir=1 near=2 far=4 skipped=0)"));
    }

    #[test]
    fn skipped_outcome_has_no_report() {
        assert!(FrameOutcome::Skipped.is_skipped());
        assert!(FrameOutcome::Skipped.report().is_none());
        let rendered = FrameOutcome::Rendered(FrameReport::default());
        assert!(rendered.report().is_some());
    }
}
