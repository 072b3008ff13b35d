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

//! The HDR light buffer and the begin/end protocol of a lighting pass.

use glimmer_core::lane::{Lane, LaneKind};
use glimmer_core::math::{Extent2D, LinearRgba};
use glimmer_core::renderer::{
    ClearFlags, GBufferTextures, GraphicsDevice, RenderStateSet, RenderTargetDescriptor,
    RenderTargetId, StateSetId, TextureFormat, UsageError,
};

use super::{LightPrePassConfig, LightingError};

/// Scope name reported in usage errors.
pub(crate) const ACCUMULATION_SCOPE: &str = "accumulation buffer";

/// Fails with [`UsageError::NotBegun`] unless a lighting pass is open.
pub(crate) fn require_open(
    accumulation: &AccumulationBuffer,
    caller: &str,
) -> Result<(), LightingError> {
    if accumulation.is_open() {
        return Ok(());
    }
    log::error!("{caller}: used while the accumulation buffer is closed");
    Err(UsageError::NotBegun {
        scope: ACCUMULATION_SCOPE,
    }
    .into())
}

#[derive(Debug, Clone, Copy)]
struct AccumulationResources {
    target: RenderTargetId,
    base_state: StateSetId,
}

/// Owns the render target lights are summed into.
///
/// Between [`begin`](Self::begin) and [`end`](Self::end) the target is the
/// active output, with the G-buffer depth-stencil surface attached, and every
/// light lane draws into it. Each `begin` starts a new pass with a new
/// [`pass_serial`](Self::pass_serial).
#[derive(Debug)]
pub struct AccumulationBuffer {
    size: Extent2D,
    format: TextureFormat,
    resources: Option<AccumulationResources>,
    open: bool,
    pass_serial: u64,
}

impl AccumulationBuffer {
    /// Creates the accumulation target and its base state set.
    pub fn new(
        device: &mut dyn GraphicsDevice,
        size: Extent2D,
        config: &LightPrePassConfig,
    ) -> Result<Self, LightingError> {
        if size.is_empty() {
            return Err(LightingError::InvalidConfig(format!(
                "accumulation buffer size {}x{} is empty",
                size.width, size.height
            )));
        }
        let mut buffer = Self {
            size,
            format: config.accumulation_format,
            resources: None,
            open: false,
            pass_serial: 0,
        };
        buffer.ensure_resources(device)?;
        log::info!(
            "AccumulationBuffer: created {}x{} {:?} target",
            size.width,
            size.height,
            buffer.format
        );
        Ok(buffer)
    }

    fn ensure_resources(
        &mut self,
        device: &mut dyn GraphicsDevice,
    ) -> Result<AccumulationResources, LightingError> {
        if let Some(resources) = self.resources {
            return Ok(resources);
        }
        let target = device.create_render_target(&RenderTargetDescriptor {
            label: "LightAccumulation".to_string(),
            size: self.size,
            format: self.format,
        })?;
        let base_state = device.create_state_set(&RenderStateSet::additive("AccumulationBase"))?;
        let resources = AccumulationResources { target, base_state };
        self.resources = Some(resources);
        Ok(resources)
    }

    /// Opens a lighting pass.
    ///
    /// Binds the target, applies additive blending without depth test and
    /// clears color to `(ambient.r, ambient.g, ambient.b, 0)`. The depth and
    /// stencil planes of the G-buffer are left untouched.
    ///
    /// ## Errors
    ///
    /// [`UsageError::AlreadyBegun`] if the pass is already open. If binding
    /// fails, nothing stays bound.
    pub fn begin(
        &mut self,
        device: &mut dyn GraphicsDevice,
        ambient: LinearRgba,
        gbuffer: &GBufferTextures,
    ) -> Result<(), LightingError> {
        if self.open {
            log::error!("AccumulationBuffer: begin called twice without end");
            return Err(UsageError::AlreadyBegun {
                scope: ACCUMULATION_SCOPE,
            }
            .into());
        }
        let resources = self.ensure_resources(device)?;
        device.push_render_target(resources.target, Some(gbuffer.depth_stencil))?;
        let prepared = device
            .apply_state_set(resources.base_state)
            .and_then(|_| device.clear(ClearFlags::COLOR, ambient.with_alpha(0.0), 1.0, 0));
        if let Err(e) = prepared {
            if let Err(pop) = device.pop_render_target() {
                log::warn!("AccumulationBuffer: failed to unbind after error: {pop}");
            }
            return Err(e.into());
        }
        self.open = true;
        self.pass_serial += 1;
        Ok(())
    }

    /// Closes the lighting pass and restores the previous output.
    pub fn end(&mut self, device: &mut dyn GraphicsDevice) -> Result<(), LightingError> {
        if !self.open {
            log::error!("AccumulationBuffer: end called without begin");
            return Err(UsageError::NotBegun {
                scope: ACCUMULATION_SCOPE,
            }
            .into());
        }
        device.pop_render_target()?;
        self.open = false;
        Ok(())
    }

    /// Recreates the target at a new resolution.
    ///
    /// Lanes pick up the new half-texel offset on their next `begin`.
    pub fn resize(
        &mut self,
        device: &mut dyn GraphicsDevice,
        size: Extent2D,
    ) -> Result<(), LightingError> {
        if self.open {
            log::error!("AccumulationBuffer: resize called during a lighting pass");
            return Err(UsageError::AlreadyBegun {
                scope: ACCUMULATION_SCOPE,
            }
            .into());
        }
        if size.is_empty() {
            return Err(LightingError::InvalidConfig(format!(
                "accumulation buffer size {}x{} is empty",
                size.width, size.height
            )));
        }
        if size == self.size {
            return Ok(());
        }
        if let Some(resources) = self.resources.take() {
            device.destroy_render_target(resources.target)?;
        }
        self.size = size;
        self.ensure_resources(device)?;
        log::info!(
            "AccumulationBuffer: resized to {}x{}",
            size.width,
            size.height
        );
        Ok(())
    }

    /// Reads back the accumulated light, row-major, top row first.
    pub fn read(&self, device: &dyn GraphicsDevice) -> Result<Vec<LinearRgba>, LightingError> {
        let resources = self.resources.ok_or(UsageError::NotBegun {
            scope: ACCUMULATION_SCOPE,
        })?;
        Ok(device.read_render_target(resources.target)?)
    }

    /// Whether a lighting pass is open.
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// The accumulation target, or `None` while it awaits recreation after a
    /// device reset.
    pub fn target(&self) -> Option<RenderTargetId> {
        self.resources.map(|r| r.target)
    }

    /// Resolution of the target.
    pub fn size(&self) -> Extent2D {
        self.size
    }

    /// Texel format of the target.
    pub fn format(&self) -> TextureFormat {
        self.format
    }

    /// Number of passes opened so far. Lanes use it to detect a stale `begin`.
    pub fn pass_serial(&self) -> u64 {
        self.pass_serial
    }
}

impl Lane for AccumulationBuffer {
    fn strategy_name(&self) -> &'static str {
        "LightAccumulation"
    }

    fn lane_kind(&self) -> LaneKind {
        LaneKind::Target
    }

    fn on_device_reset(&mut self) {
        self.resources = None;
        self.open = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glimmer_infra::{AnalyticScene, SoftwareGraphicsDevice};

    fn setup(size: Extent2D) -> (SoftwareGraphicsDevice, GBufferTextures, AccumulationBuffer) {
        let mut device = SoftwareGraphicsDevice::new(size);
        let gbuffer = AnalyticScene::create_gbuffer(&mut device, size).unwrap();
        let buffer =
            AccumulationBuffer::new(&mut device, size, &LightPrePassConfig::default()).unwrap();
        (device, gbuffer, buffer)
    }

    #[test]
    fn begin_clears_to_ambient_with_zero_alpha() {
        let (mut device, gbuffer, mut buffer) = setup(Extent2D::new(8, 4));
        let ambient = LinearRgba::rgb(0.1, 0.2, 0.3);
        buffer.begin(&mut device, ambient, &gbuffer).unwrap();
        let texels = buffer.read(&device).unwrap();
        assert_eq!(texels.len(), 32);
        assert!(texels.iter().all(|t| *t == LinearRgba::new(0.1, 0.2, 0.3, 0.0)));
        buffer.end(&mut device).unwrap();
        assert_eq!(device.current_target_size(), Extent2D::new(8, 4));
    }

    #[test]
    fn begin_twice_is_a_usage_error() {
        let (mut device, gbuffer, mut buffer) = setup(Extent2D::new(4, 4));
        buffer.begin(&mut device, LinearRgba::BLACK, &gbuffer).unwrap();
        let err = buffer.begin(&mut device, LinearRgba::BLACK, &gbuffer).unwrap_err();
        assert_eq!(
            err.usage(),
            Some(&UsageError::AlreadyBegun {
                scope: ACCUMULATION_SCOPE
            })
        );
        assert!(buffer.is_open());
        assert_eq!(buffer.pass_serial(), 1);
    }

    #[test]
    fn end_without_begin_is_a_usage_error() {
        let (mut device, _, mut buffer) = setup(Extent2D::new(4, 4));
        let err = buffer.end(&mut device).unwrap_err();
        assert!(matches!(err.usage(), Some(UsageError::NotBegun { .. })));
    }

    #[test]
    fn end_restores_previous_output() {
        let back = Extent2D::new(16, 16);
        let mut device = SoftwareGraphicsDevice::new(back);
        let size = Extent2D::new(4, 2);
        let gbuffer = AnalyticScene::create_gbuffer(&mut device, size).unwrap();
        let mut buffer =
            AccumulationBuffer::new(&mut device, size, &LightPrePassConfig::default()).unwrap();
        buffer.begin(&mut device, LinearRgba::BLACK, &gbuffer).unwrap();
        assert_eq!(device.current_target_size(), size);
        buffer.end(&mut device).unwrap();
        assert_eq!(device.current_target_size(), back);
    }

    #[test]
    fn failed_end_leaves_the_pass_open() {
        let (mut device, gbuffer, mut buffer) = setup(Extent2D::new(4, 4));
        buffer.begin(&mut device, LinearRgba::BLACK, &gbuffer).unwrap();
        device.simulate_device_lost();
        let err = buffer.end(&mut device).unwrap_err();
        assert!(err.is_device_lost());
        assert!(buffer.is_open());

        device.reset();
        buffer.on_device_reset();
        assert!(!buffer.is_open());
    }

    #[test]
    fn mismatched_gbuffer_binds_nothing() {
        let mut device = SoftwareGraphicsDevice::new(Extent2D::new(16, 16));
        let gbuffer = AnalyticScene::create_gbuffer(&mut device, Extent2D::new(8, 8)).unwrap();
        let mut buffer = AccumulationBuffer::new(
            &mut device,
            Extent2D::new(4, 4),
            &LightPrePassConfig::default(),
        )
        .unwrap();
        assert!(buffer.begin(&mut device, LinearRgba::BLACK, &gbuffer).is_err());
        assert!(!buffer.is_open());
        assert_eq!(device.current_target_size(), Extent2D::new(16, 16));
    }

    #[test]
    fn resize_recreates_target() {
        let (mut device, _, mut buffer) = setup(Extent2D::new(4, 4));
        let old = buffer.target();
        buffer.resize(&mut device, Extent2D::new(8, 2)).unwrap();
        assert_ne!(buffer.target(), old);
        assert_eq!(buffer.size(), Extent2D::new(8, 2));
        let target = buffer.target().unwrap();
        assert_eq!(device.render_target_size(target).unwrap(), Extent2D::new(8, 2));
    }

    #[test]
    fn empty_size_is_rejected() {
        let mut device = SoftwareGraphicsDevice::default();
        let err = AccumulationBuffer::new(
            &mut device,
            Extent2D::new(0, 4),
            &LightPrePassConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, LightingError::InvalidConfig(_)));
    }

    #[test]
    fn device_reset_recreates_on_next_begin() {
        let size = Extent2D::new(4, 4);
        let (mut device, _, mut buffer) = setup(size);
        let old = buffer.target();
        device.reset();
        buffer.on_device_reset();
        assert!(buffer.target().is_none());

        let gbuffer = AnalyticScene::create_gbuffer(&mut device, size).unwrap();
        buffer.begin(&mut device, LinearRgba::WHITE, &gbuffer).unwrap();
        assert!(buffer.target().is_some());
        assert_ne!(buffer.target(), old);
        buffer.end(&mut device).unwrap();
    }
}
