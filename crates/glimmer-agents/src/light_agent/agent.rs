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

//! Defines the LightPrePassAgent, the orchestrator of the lighting pass.

use std::time::Instant;

use anyhow::{Context, Result};
use glimmer_core::lane::Lane;
use glimmer_core::math::{Extent2D, LinearRgba};
use glimmer_core::renderer::{CameraFrame, GBufferTextures, GraphicsDevice, Light, RenderTargetId};
use glimmer_lanes::{
    AccumulationBuffer, DirectionalLightLane, LightPrePassConfig, LightingError, PointLightLane,
    PointLightPath,
};

use super::{FrameOutcome, FrameReport};

/// A failure tagged with the stage that raised it.
struct StageError {
    stage: &'static str,
    error: LightingError,
}

trait StageContext<T> {
    fn stage(self, stage: &'static str) -> Result<T, StageError>;
}

impl<T> StageContext<T> for Result<T, LightingError> {
    fn stage(self, stage: &'static str) -> Result<T, StageError> {
        self.map_err(|error| StageError { stage, error })
    }
}

/// Drives one light pre-pass per frame.
///
/// The agent is the only owner of its lanes; two agents never share state.
pub struct LightPrePassAgent {
    config: LightPrePassConfig,
    accumulation: AccumulationBuffer,
    directional: DirectionalLightLane,
    point: PointLightLane,
    // Set when a frame was abandoned because of a lost device.
    stale: bool,
    frame_count: u64,
    last_report: Option<FrameReport>,
}

impl LightPrePassAgent {
    /// Creates the accumulation buffer at `size` and loads both light modules.
    ///
    /// ## Errors
    ///
    /// Fails if the configuration is invalid or a light module cannot be
    /// loaded. The error names the module.
    pub fn new(
        device: &mut dyn GraphicsDevice,
        size: Extent2D,
        config: LightPrePassConfig,
    ) -> Result<Self> {
        config
            .validate()
            .context("Invalid light pre-pass configuration")?;
        let accumulation = AccumulationBuffer::new(device, size, &config)
            .context("Failed to create the light accumulation buffer")?;
        let directional = DirectionalLightLane::new(device, &config)
            .context("Failed to load the directional light module")?;
        let point = PointLightLane::new(device, &config)
            .context("Failed to load the point light module")?;
        log::info!(
            "LightPrePassAgent: ready at {}x{} (near threshold {} x fov)",
            size.width,
            size.height,
            config.near_light_fov_fraction
        );
        Ok(Self {
            config,
            accumulation,
            directional,
            point,
            stale: false,
            frame_count: 0,
            last_report: None,
        })
    }

    /// Every lane owned by the agent.
    fn lanes_mut(&mut self) -> [&mut dyn Lane; 3] {
        [
            &mut self.accumulation,
            &mut self.directional,
            &mut self.point,
        ]
    }

    /// Tells the agent the device was reset by its owner.
    ///
    /// Device objects are recreated lazily on the next frame.
    pub fn notify_device_reset(&mut self) {
        self.stale = true;
    }

    fn recover_from_reset(&mut self) {
        for lane in self.lanes_mut() {
            log::debug!("LightPrePassAgent: resetting lane {}", lane.strategy_name());
            lane.on_device_reset();
        }
        self.stale = false;
        log::info!("LightPrePassAgent: device objects invalidated, recreating on demand");
    }

    /// Lights one frame.
    ///
    /// Clears the accumulation buffer to `ambient` (alpha `0`), then adds every
    /// light in submission order. Point lights with an invalid radius are
    /// skipped with a warning.
    ///
    /// ## Returns
    ///
    /// [`FrameOutcome::Skipped`] if the device was lost during the frame. The
    /// next call rebuilds every device object, so the G-buffer must have been
    /// recreated on the reset device by then.
    pub fn render_frame(
        &mut self,
        device: &mut dyn GraphicsDevice,
        camera: &CameraFrame,
        gbuffer: &GBufferTextures,
        ambient: LinearRgba,
        lights: &[Light],
    ) -> Result<FrameOutcome> {
        if self.stale {
            self.recover_from_reset();
        }
        let start = Instant::now();
        self.directional.parameter_cache_mut().reset_counters();
        self.point.parameter_cache_mut().reset_counters();

        match self.light_frame(device, camera, gbuffer, ambient, lights) {
            Ok(mut report) => {
                self.frame_count += 1;
                report.frame = self.frame_count;
                report.frame_time = start.elapsed();
                log::trace!("LightPrePassAgent: {report}");
                self.last_report = Some(report);
                Ok(FrameOutcome::Rendered(report))
            }
            Err(StageError { stage, error }) if error.is_device_lost() => {
                log::warn!("LightPrePassAgent: device lost during {stage}, skipping frame");
                self.stale = true;
                Ok(FrameOutcome::Skipped)
            }
            Err(StageError { stage, error }) => {
                self.abandon_frame(device);
                Err(anyhow::Error::new(error).context(format!("Light pre-pass failed in {stage}")))
            }
        }
    }

    fn light_frame(
        &mut self,
        device: &mut dyn GraphicsDevice,
        camera: &CameraFrame,
        gbuffer: &GBufferTextures,
        ambient: LinearRgba,
        lights: &[Light],
    ) -> Result<FrameReport, StageError> {
        self.accumulation
            .begin(device, ambient, gbuffer)
            .stage("accumulation buffer")?;

        let mut report = FrameReport::default();
        for light in lights {
            match light {
                Light::Directional(params) => {
                    self.directional
                        .begin(device, &self.accumulation, gbuffer, camera)
                        .stage("directional light module")?;
                    match self.directional.render(device, &self.accumulation, params) {
                        Ok(()) => report.directional_lights += 1,
                        Err(LightingError::InvalidLight(reason)) => {
                            log::warn!("LightPrePassAgent: skipping light: {reason}");
                            report.skipped_lights += 1;
                        }
                        Err(error) => {
                            return Err(StageError {
                                stage: "directional light module",
                                error,
                            })
                        }
                    }
                }
                Light::Point(params) => {
                    self.point
                        .begin(device, &self.accumulation, gbuffer, camera)
                        .stage("point light module")?;
                    match self.point.render(device, &self.accumulation, params) {
                        Ok(PointLightPath::Near) => report.near_point_lights += 1,
                        Ok(PointLightPath::Far) => report.far_point_lights += 1,
                        Err(LightingError::InvalidLight(reason)) => {
                            log::warn!("LightPrePassAgent: skipping light: {reason}");
                            report.skipped_lights += 1;
                        }
                        Err(error) => {
                            return Err(StageError {
                                stage: "point light module",
                                error,
                            })
                        }
                    }
                }
            }
        }

        self.directional.end();
        self.point.end();
        self.accumulation.end(device).stage("accumulation buffer")?;

        for cache in [
            self.directional.parameter_cache(),
            self.point.parameter_cache(),
        ] {
            report.parameter_uploads += cache.uploads();
            report.parameter_uploads_skipped += cache.skipped();
        }
        Ok(report)
    }

    /// Closes whatever is still open after a fatal error.
    fn abandon_frame(&mut self, device: &mut dyn GraphicsDevice) {
        self.directional.end();
        self.point.end();
        if self.accumulation.is_open() {
            if let Err(e) = self.accumulation.end(device) {
                log::error!("LightPrePassAgent: failed to close the accumulation buffer: {e}");
            }
        }
    }

    /// Recreates the accumulation buffer at a new resolution.
    pub fn resize(&mut self, device: &mut dyn GraphicsDevice, size: Extent2D) -> Result<()> {
        self.accumulation
            .resize(device, size)
            .context("Failed to resize the light accumulation buffer")
    }

    /// Reads back the accumulated light of the last frame.
    pub fn read_accumulation(&self, device: &dyn GraphicsDevice) -> Result<Vec<LinearRgba>> {
        self.accumulation
            .read(device)
            .context("Failed to read the light accumulation buffer")
    }

    /// Turns parameter memoisation on or off in both light modules.
    pub fn set_parameter_cache_enabled(&mut self, enabled: bool) {
        self.directional.parameter_cache_mut().set_enabled(enabled);
        self.point.parameter_cache_mut().set_enabled(enabled);
    }

    /// The accumulation target, consumed by the material pass.
    pub fn accumulation_target(&self) -> Option<RenderTargetId> {
        self.accumulation.target()
    }

    /// The accumulation buffer.
    pub fn accumulation(&self) -> &AccumulationBuffer {
        &self.accumulation
    }

    /// The report of the last rendered frame.
    pub fn last_report(&self) -> Option<&FrameReport> {
        self.last_report.as_ref()
    }

    /// Number of frames rendered so far.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Whether device objects will be rebuilt on the next frame.
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// The configuration the agent was created with.
    pub fn config(&self) -> &LightPrePassConfig {
        &self.config
    }
}
