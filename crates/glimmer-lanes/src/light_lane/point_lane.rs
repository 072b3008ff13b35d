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

//! Volume-bounded lighting of point lights with stencil culling.
//!
//! Each point light is drawn as a closed volume, by default a sphere scaled to
//! the light radius. Depending on how much of the screen the volume covers,
//! one of two paths runs:
//!
//! * [`PointLightPath::Near`] marks, with the front faces, the pixels whose
//!   geometry lies in front of the volume, then shades the back faces wherever
//!   the geometry is in front of them and the pixel is unmarked. Only pixels
//!   whose geometry sits inside the volume are lit, and a volume crossing the
//!   near plane is handled correctly.
//! * [`PointLightPath::Far`] shades the front faces in one depth-tested pass.
//!
//! The stencil plane is cleared before every light, so marks never leak from
//! one light to the next.

use std::sync::Arc;

use glimmer_core::lane::{Lane, LaneKind};
use glimmer_core::math::{LinearRgba, Vec2};
use glimmer_core::renderer::{
    BlendState, CameraFrame, ClearFlags, ColorWrites, CompareFunction, CullMode,
    DepthStencilState, EffectDescriptor, EffectId, FrontFace, GBufferTextures, GraphicsDevice,
    MeshId, ParameterHandle, ParameterValue, PointLightParams, RasterizerState, RenderError,
    RenderStateSet, ShaderProgram, ShadowSource, StateSetId, StencilFaceState, StencilOperation,
    TechniqueHandle, UsageError,
};

use super::accumulation::require_open;
use super::shaders::{params, PointLightProgram, NO_SHADOW, WITH_SHADOW};
use super::{
    select_point_light_path, unit_sphere, AccumulationBuffer, LightPrePassConfig, LightingError,
    ParameterCache, PointLightPath,
};

const POINT_SCOPE: &str = "point light lane";

/// Label of the stencil marking pass of the near path.
pub const STENCIL_MARK_STATE: &str = "PointLight.StencilMark";
/// Label of the lighting pass of the near path.
pub const STENCIL_LIGHT_STATE: &str = "PointLight.StencilLight";
/// Label of the far path.
pub const SINGLE_PASS_STATE: &str = "PointLight.SinglePass";

#[derive(Debug, Clone, Copy)]
struct PointHandles {
    depth_texture: ParameterHandle,
    normal_texture: ParameterHandle,
    half_pixel: ParameterHandle,
    far_plane: ParameterHandle,
    world_view: ParameterHandle,
    world_view_projection: ParameterHandle,
    light_position: ParameterHandle,
    light_color: ParameterHandle,
    light_intensity: ParameterHandle,
    inv_light_radius: ParameterHandle,
    shadow_cube: ParameterHandle,
    inverse_view: ParameterHandle,
    shadow_texel_size: ParameterHandle,
    shadow_bias: ParameterHandle,
    no_shadow: TechniqueHandle,
    with_shadow: TechniqueHandle,
}

impl PointHandles {
    fn resolve(device: &dyn GraphicsDevice, effect: EffectId) -> Result<Self, RenderError> {
        let param = |name: &str| device.parameter_handle(effect, name);
        Ok(Self {
            depth_texture: param(params::DEPTH_TEXTURE)?,
            normal_texture: param(params::NORMAL_TEXTURE)?,
            half_pixel: param(params::HALF_PIXEL)?,
            far_plane: param(params::FAR_PLANE)?,
            world_view: param(params::WORLD_VIEW)?,
            world_view_projection: param(params::WORLD_VIEW_PROJECTION)?,
            light_position: param(params::LIGHT_POSITION)?,
            light_color: param(params::LIGHT_COLOR)?,
            light_intensity: param(params::LIGHT_INTENSITY)?,
            inv_light_radius: param(params::INV_LIGHT_RADIUS)?,
            shadow_cube: param(params::SHADOW_CUBE)?,
            inverse_view: param(params::INVERSE_VIEW)?,
            shadow_texel_size: param(params::SHADOW_TEXEL_SIZE)?,
            shadow_bias: param(params::SHADOW_BIAS)?,
            no_shadow: device.technique_handle(effect, NO_SHADOW)?,
            with_shadow: device.technique_handle(effect, WITH_SHADOW)?,
        })
    }
}

#[derive(Debug, Clone, Copy)]
struct PointStates {
    stencil_mark: StateSetId,
    stencil_light: StateSetId,
    single_pass: StateSetId,
}

impl PointStates {
    fn create(
        device: &mut dyn GraphicsDevice,
        config: &LightPrePassConfig,
    ) -> Result<Self, RenderError> {
        let front_faces = RasterizerState {
            cull_mode: CullMode::Back,
            front_face: FrontFace::Ccw,
        };
        let back_faces = RasterizerState {
            cull_mode: CullMode::Front,
            front_face: FrontFace::Ccw,
        };

        // Marks pixels whose geometry hides the front faces.
        let mark = StencilFaceState {
            compare: config.stencil_mark_compare,
            fail_op: StencilOperation::Keep,
            depth_fail_op: StencilOperation::Replace,
            depth_pass_op: StencilOperation::Keep,
        };
        let stencil_mark = device.create_state_set(&RenderStateSet {
            label: STENCIL_MARK_STATE.to_string(),
            blend: None,
            write_mask: ColorWrites::empty(),
            depth_stencil: DepthStencilState::with_stencil(CompareFunction::Less, mark),
            rasterizer: front_faces,
        })?;

        let test_mark = StencilFaceState {
            compare: config.stencil_light_compare,
            ..StencilFaceState::IGNORE
        };
        let stencil_light = device.create_state_set(&RenderStateSet {
            label: STENCIL_LIGHT_STATE.to_string(),
            blend: Some(BlendState::ADDITIVE),
            write_mask: ColorWrites::ALL,
            depth_stencil: DepthStencilState::with_stencil(CompareFunction::Greater, test_mark),
            rasterizer: back_faces,
        })?;

        let single_pass = device.create_state_set(&RenderStateSet {
            label: SINGLE_PASS_STATE.to_string(),
            blend: Some(BlendState::ADDITIVE),
            write_mask: ColorWrites::ALL,
            depth_stencil: DepthStencilState::depth_read_only(CompareFunction::LessEqual),
            rasterizer: front_faces,
        })?;

        Ok(Self {
            stencil_mark,
            stencil_light,
            single_pass,
        })
    }
}

#[derive(Debug, Clone, Copy)]
struct PointResources {
    effect: EffectId,
    handles: PointHandles,
    sphere: MeshId,
    states: PointStates,
}

#[derive(Debug, Clone, Copy)]
struct FrameInputs {
    pass_serial: u64,
    camera: CameraFrame,
}

/// Accumulates point lights, one bounded volume per light.
#[derive(Debug)]
pub struct PointLightLane {
    program: Arc<dyn ShaderProgram>,
    config: LightPrePassConfig,
    resources: Option<PointResources>,
    cache: ParameterCache,
    frame: Option<FrameInputs>,
}

impl PointLightLane {
    /// Loads the built-in point light program.
    pub fn new(
        device: &mut dyn GraphicsDevice,
        config: &LightPrePassConfig,
    ) -> Result<Self, LightingError> {
        Self::with_program(device, Arc::new(PointLightProgram), config)
    }

    /// Loads a custom program exposing the point light parameters of
    /// [`params`] and both shadow techniques.
    pub fn with_program(
        device: &mut dyn GraphicsDevice,
        program: Arc<dyn ShaderProgram>,
        config: &LightPrePassConfig,
    ) -> Result<Self, LightingError> {
        config.validate()?;
        let mut lane = Self {
            program,
            config: config.clone(),
            resources: None,
            cache: ParameterCache::new(config.parameter_cache_enabled),
            frame: None,
        };
        lane.ensure_resources(device)?;
        log::info!(
            "PointLightLane: loaded module '{}' ({}x{} light sphere)",
            lane.program.label(),
            config.sphere_stacks,
            config.sphere_slices
        );
        Ok(lane)
    }

    fn ensure_resources(
        &mut self,
        device: &mut dyn GraphicsDevice,
    ) -> Result<PointResources, LightingError> {
        if let Some(resources) = self.resources {
            return Ok(resources);
        }
        let effect = device.create_effect(&EffectDescriptor {
            program: Arc::clone(&self.program),
        })?;
        let handles = PointHandles::resolve(device, effect)?;
        let sphere = device.create_mesh(&unit_sphere(
            self.config.sphere_stacks,
            self.config.sphere_slices,
        ))?;
        let states = PointStates::create(device, &self.config)?;
        let resources = PointResources {
            effect,
            handles,
            sphere,
            states,
        };
        self.cache.invalidate();
        self.resources = Some(resources);
        Ok(resources)
    }

    fn upload(
        &mut self,
        device: &mut dyn GraphicsDevice,
        effect: EffectId,
        handle: ParameterHandle,
        value: ParameterValue,
    ) -> Result<(), RenderError> {
        self.cache.set(device, effect, handle, value).map(|_| ())
    }

    /// Prepares the lane for the current lighting pass.
    ///
    /// Keeps `camera` for the visibility heuristic and uploads the G-buffer
    /// textures, the far plane and the half-texel offset of the bound target.
    pub fn begin(
        &mut self,
        device: &mut dyn GraphicsDevice,
        accumulation: &AccumulationBuffer,
        gbuffer: &GBufferTextures,
        camera: &CameraFrame,
    ) -> Result<(), LightingError> {
        require_open(accumulation, "PointLightLane")?;
        let PointResources {
            effect, handles, ..
        } = self.ensure_resources(device)?;

        let size = device.current_target_size();
        let half_pixel = Vec2::new(
            -0.5 / (size.width as f32 * 0.5),
            0.5 / (size.height as f32 * 0.5),
        );
        self.upload(device, effect, handles.depth_texture, ParameterValue::Texture(Some(gbuffer.depth)))?;
        self.upload(device, effect, handles.normal_texture, ParameterValue::Texture(Some(gbuffer.normal)))?;
        self.upload(device, effect, handles.far_plane, ParameterValue::Float(camera.far))?;
        self.upload(device, effect, handles.half_pixel, ParameterValue::Vec2(half_pixel))?;

        self.frame = Some(FrameInputs {
            pass_serial: accumulation.pass_serial(),
            camera: *camera,
        });
        Ok(())
    }

    /// Accumulates one point light and reports the path it took.
    ///
    /// ## Errors
    ///
    /// * [`UsageError::NotBegun`] unless [`begin`](Self::begin) was called
    ///   during the currently open accumulation pass.
    /// * [`LightingError::InvalidLight`] for a radius that is not strictly
    ///   positive and finite, or an intensity that is negative or not finite.
    ///   Nothing is drawn in that case.
    pub fn render(
        &mut self,
        device: &mut dyn GraphicsDevice,
        accumulation: &AccumulationBuffer,
        light: &PointLightParams,
    ) -> Result<PointLightPath, LightingError> {
        let (frame, resources) = match (self.frame, self.resources) {
            (Some(frame), Some(resources))
                if accumulation.is_open() && frame.pass_serial == accumulation.pass_serial() =>
            {
                (frame, resources)
            }
            _ => {
                log::error!("PointLightLane: render called outside begin/end");
                return Err(UsageError::NotBegun { scope: POINT_SCOPE }.into());
            }
        };
        if !(light.radius > 0.0 && light.radius.is_finite()) {
            return Err(LightingError::InvalidLight(format!(
                "point light at {:?} has radius {}",
                light.position, light.radius
            )));
        }
        if !(light.intensity >= 0.0 && light.intensity.is_finite()) {
            return Err(LightingError::InvalidLight(format!(
                "point light at {:?} has intensity {}",
                light.position, light.intensity
            )));
        }
        let PointResources {
            effect,
            handles,
            sphere,
            states,
        } = resources;
        let camera = frame.camera;

        device.clear(
            ClearFlags::STENCIL,
            LinearRgba::TRANSPARENT,
            1.0,
            self.config.stencil_clear_value,
        )?;

        let world = light.volume_transform();
        let mesh = light.clip_volume.map_or(sphere, |volume| volume.mesh);
        let path = select_point_light_path(
            camera.position,
            camera.fov_y,
            light.position,
            light.radius,
            self.config.near_light_fov_fraction,
        );

        let world_view = camera.view * world;
        self.upload(device, effect, handles.world_view, ParameterValue::Mat4(world_view))?;
        self.upload(
            device,
            effect,
            handles.world_view_projection,
            ParameterValue::Mat4(camera.projection * world_view),
        )?;
        self.upload(
            device,
            effect,
            handles.light_position,
            ParameterValue::Vec3(camera.view.transform_point(light.position)),
        )?;
        self.upload(device, effect, handles.light_color, ParameterValue::Vec3(light.color.rgb_vec()))?;
        self.upload(device, effect, handles.light_intensity, ParameterValue::Float(light.intensity))?;
        self.upload(device, effect, handles.inv_light_radius, ParameterValue::Float(1.0 / light.radius))?;

        let technique = match light.shadow {
            ShadowSource::NoShadow => handles.no_shadow,
            ShadowSource::WithShadow(cube) => {
                let face = device.texture_size(cube)?;
                self.upload(device, effect, handles.shadow_cube, ParameterValue::Texture(Some(cube)))?;
                self.upload(device, effect, handles.inverse_view, ParameterValue::Mat4(camera.inverse_view()))?;
                self.upload(
                    device,
                    effect,
                    handles.shadow_texel_size,
                    ParameterValue::Float(1.0 / face.width.max(1) as f32),
                )?;
                self.upload(device, effect, handles.shadow_bias, ParameterValue::Float(self.config.shadow_bias))?;
                handles.with_shadow
            }
        };

        device.set_stencil_reference(self.config.stencil_reference)?;
        match path {
            PointLightPath::Near => {
                device.apply_state_set(states.stencil_mark)?;
                device.draw_mesh(mesh, effect, technique)?;
                device.apply_state_set(states.stencil_light)?;
                device.draw_mesh(mesh, effect, technique)?;
            }
            PointLightPath::Far => {
                device.apply_state_set(states.single_pass)?;
                device.draw_mesh(mesh, effect, technique)?;
            }
        }
        log::debug!(
            "PointLightLane: light at {:?} (radius {}) took the {} path",
            light.position,
            light.radius,
            path
        );
        Ok(path)
    }

    /// Closes the per-pass scope.
    pub fn end(&mut self) {
        self.frame = None;
    }

    /// The configuration the lane was created with.
    pub fn config(&self) -> &LightPrePassConfig {
        &self.config
    }

    /// The parameter cache of this lane.
    pub fn parameter_cache(&self) -> &ParameterCache {
        &self.cache
    }

    /// Mutable access to the parameter cache.
    pub fn parameter_cache_mut(&mut self) -> &mut ParameterCache {
        &mut self.cache
    }
}

impl Lane for PointLightLane {
    fn strategy_name(&self) -> &'static str {
        "PointLight"
    }

    fn lane_kind(&self) -> LaneKind {
        LaneKind::Lighting
    }

    fn on_device_reset(&mut self) {
        self.resources = None;
        self.frame = None;
        self.cache.invalidate();
    }
}
