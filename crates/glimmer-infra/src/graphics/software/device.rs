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

//! The software implementation of [`GraphicsDevice`].

use std::collections::HashMap;
use std::sync::Arc;

use glimmer_core::math::{Extent2D, LinearRgba, Vec2, Vec3};
use glimmer_core::renderer::{
    BlendComponentDescriptor, BlendFactor, BlendOperation, ClearFlags, ColorWrites,
    DepthStencilDescriptor, DepthStencilId, DrawRecord, EffectDescriptor, EffectId,
    FragmentInput, GraphicsDevice, MeshData, MeshId, ParameterHandle, ParameterValue,
    RenderError, RenderStateSet, RenderStats, RenderTargetDescriptor, RenderTargetId,
    ResourceError, ShaderContext, ShaderError, ShaderProgram, ShaderResources, StateSetId,
    StencilOperation, TechniqueHandle, TextureDescriptor, TextureDimension, TextureFormat,
    TextureId, UsageError,
};

use super::raster::{clip_near, rasterize_polygon, ClipVertex};
use super::surface::{quantize, ColorSurface, DepthStencilSurface, TextureStorage};

/// Resolution of the default output created with the device.
pub const DEFAULT_BACK_BUFFER_SIZE: Extent2D = Extent2D::new(64, 64);

#[derive(Debug)]
struct Effect {
    program: Arc<dyn ShaderProgram>,
    values: Vec<Option<ParameterValue>>,
}

/// What a fragment stage sees during a draw.
struct DrawResources<'a> {
    values: &'a [Option<ParameterValue>],
    textures: &'a HashMap<TextureId, TextureStorage>,
}

impl ShaderResources for DrawResources<'_> {
    fn parameter(&self, handle: ParameterHandle) -> Option<&ParameterValue> {
        self.values.get(handle.index())?.as_ref()
    }

    fn sample_2d(&self, texture: TextureId, uv: Vec2) -> Option<LinearRgba> {
        self.textures.get(&texture)?.sample_2d(uv)
    }

    fn sample_cube(&self, texture: TextureId, direction: Vec3) -> Option<LinearRgba> {
        self.textures.get(&texture)?.sample_cube(direction)
    }

    fn texture_size(&self, texture: TextureId) -> Option<Extent2D> {
        self.textures.get(&texture).map(|t| t.descriptor.size)
    }
}

/// A CPU reference implementation of the graphics device contract.
///
/// Everything runs synchronously on the calling thread. Besides the trait
/// surface, the device keeps a draw log for inspection, can simulate a lost
/// device, and lets a caller fill depth-stencil surfaces directly in place of a
/// geometry pass.
#[derive(Debug)]
pub struct SoftwareGraphicsDevice {
    next_id: usize,
    generation: u32,
    lost: bool,
    back_buffer: RenderTargetId,
    back_buffer_size: Extent2D,

    textures: HashMap<TextureId, TextureStorage>,
    targets: HashMap<RenderTargetId, ColorSurface>,
    depth_stencils: HashMap<DepthStencilId, DepthStencilSurface>,
    meshes: HashMap<MeshId, Arc<MeshData>>,
    state_sets: HashMap<StateSetId, RenderStateSet>,
    effects: HashMap<EffectId, Effect>,

    target_stack: Vec<(RenderTargetId, Option<DepthStencilId>)>,
    current_state: RenderStateSet,
    stencil_reference: u8,

    stats: RenderStats,
    draw_log: Vec<DrawRecord>,
}

fn default_state() -> RenderStateSet {
    RenderStateSet {
        label: "Default".to_string(),
        blend: None,
        write_mask: ColorWrites::ALL,
        depth_stencil: Default::default(),
        rasterizer: Default::default(),
    }
}

impl SoftwareGraphicsDevice {
    /// Creates a device with a default output of `back_buffer_size`.
    pub fn new(back_buffer_size: Extent2D) -> Self {
        let mut device = Self {
            next_id: 0,
            generation: 0,
            lost: false,
            back_buffer: RenderTargetId(0),
            back_buffer_size,
            textures: HashMap::new(),
            targets: HashMap::new(),
            depth_stencils: HashMap::new(),
            meshes: HashMap::new(),
            state_sets: HashMap::new(),
            effects: HashMap::new(),
            target_stack: Vec::new(),
            current_state: default_state(),
            stencil_reference: 0,
            stats: RenderStats::default(),
            draw_log: Vec::new(),
        };
        device.create_back_buffer();
        log::info!(
            "SoftwareGraphicsDevice: Initialized with a {}x{} back buffer",
            back_buffer_size.width,
            back_buffer_size.height
        );
        device
    }

    fn create_back_buffer(&mut self) {
        let id = RenderTargetId(self.allocate_id());
        self.targets.insert(
            id,
            ColorSurface::new(
                "BackBuffer".to_string(),
                self.back_buffer_size,
                TextureFormat::Rgba8Unorm,
            ),
        );
        self.back_buffer = id;
        self.target_stack = vec![(id, None)];
    }

    fn allocate_id(&mut self) -> usize {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn check_alive(&self) -> Result<(), RenderError> {
        if self.lost {
            Err(RenderError::DeviceLost)
        } else {
            Ok(())
        }
    }

    /// The default output, at the bottom of the target stack.
    pub fn back_buffer(&self) -> RenderTargetId {
        self.back_buffer
    }

    /// Number of resets performed so far.
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Returns `true` while the device is lost.
    pub fn is_lost(&self) -> bool {
        self.lost
    }

    /// Marks the device as lost. Every call fails with
    /// [`RenderError::DeviceLost`] until [`reset`](Self::reset).
    pub fn simulate_device_lost(&mut self) {
        log::warn!("SoftwareGraphicsDevice: Device lost");
        self.lost = true;
    }

    /// Recovers a lost device. All resources are released and every handle
    /// created before the reset is reported as missing afterwards.
    pub fn reset(&mut self) {
        self.textures.clear();
        self.targets.clear();
        self.depth_stencils.clear();
        self.meshes.clear();
        self.state_sets.clear();
        self.effects.clear();
        self.current_state = default_state();
        self.stencil_reference = 0;
        self.lost = false;
        self.generation += 1;
        self.create_back_buffer();
        log::info!(
            "SoftwareGraphicsDevice: Reset complete (generation {})",
            self.generation
        );
    }

    /// The draws recorded since the log was last taken.
    pub fn draw_log(&self) -> &[DrawRecord] {
        &self.draw_log
    }

    /// Returns and clears the draw log.
    pub fn take_draw_log(&mut self) -> Vec<DrawRecord> {
        std::mem::take(&mut self.draw_log)
    }

    /// Zeroes the statistics counters and the draw log.
    pub fn reset_stats(&mut self) {
        self.stats = RenderStats::default();
        self.draw_log.clear();
    }

    /// Overwrites the depth plane of a depth-stencil surface, emulating the
    /// geometry pass. Values are device depths in `[0, 1]`, row-major.
    pub fn write_depth(&mut self, id: DepthStencilId, depth: &[f32]) -> Result<(), RenderError> {
        self.check_alive()?;
        let surface = self
            .depth_stencils
            .get_mut(&id)
            .ok_or(ResourceError::NotFound {
                kind: "depth-stencil surface",
                id: id.0,
            })?;
        if depth.len() != surface.depth.len() {
            return Err(ResourceError::SizeMismatch {
                expected: surface.depth.len() * 4,
                actual: depth.len() * 4,
            }
            .into());
        }
        surface.depth.copy_from_slice(depth);
        Ok(())
    }

    /// Reads the stencil plane of a depth-stencil surface.
    pub fn read_stencil(&self, id: DepthStencilId) -> Result<Vec<u8>, RenderError> {
        self.check_alive()?;
        self.depth_stencils
            .get(&id)
            .map(|s| s.stencil.clone())
            .ok_or_else(|| {
                ResourceError::NotFound {
                    kind: "depth-stencil surface",
                    id: id.0,
                }
                .into()
            })
    }

    /// Reads back one layer of a texture, after format conversion.
    pub fn read_texture(&self, id: TextureId, layer: u32) -> Result<Vec<LinearRgba>, RenderError> {
        self.check_alive()?;
        let texture = self.textures.get(&id).ok_or(ResourceError::NotFound {
            kind: "texture",
            id: id.0,
        })?;
        texture
            .layer(layer)
            .map(<[LinearRgba]>::to_vec)
            .ok_or_else(|| {
                ResourceError::InvalidHandle(format!("layer {layer} out of range for texture {}", id.0))
                    .into()
            })
    }

    fn effect(&self, id: EffectId) -> Result<&Effect, RenderError> {
        self.effects.get(&id).ok_or_else(|| {
            ResourceError::NotFound {
                kind: "effect",
                id: id.0,
            }
            .into()
        })
    }
}

impl Default for SoftwareGraphicsDevice {
    fn default() -> Self {
        Self::new(DEFAULT_BACK_BUFFER_SIZE)
    }
}

fn blend_factor(factor: BlendFactor, src: f32, src_a: f32, dst: f32, dst_a: f32) -> f32 {
    match factor {
        BlendFactor::Zero => 0.0,
        BlendFactor::One => 1.0,
        BlendFactor::Src => src,
        BlendFactor::OneMinusSrc => 1.0 - src,
        BlendFactor::SrcAlpha => src_a,
        BlendFactor::OneMinusSrcAlpha => 1.0 - src_a,
        BlendFactor::Dst => dst,
        BlendFactor::OneMinusDst => 1.0 - dst,
        BlendFactor::DstAlpha => dst_a,
        BlendFactor::OneMinusDstAlpha => 1.0 - dst_a,
    }
}

fn blend_channel(
    eq: &BlendComponentDescriptor,
    src: f32,
    src_a: f32,
    dst: f32,
    dst_a: f32,
) -> f32 {
    let s = src * blend_factor(eq.src_factor, src, src_a, dst, dst_a);
    let d = dst * blend_factor(eq.dst_factor, src, src_a, dst, dst_a);
    match eq.operation {
        BlendOperation::Add => s + d,
        BlendOperation::Subtract => s - d,
        BlendOperation::ReverseSubtract => d - s,
        BlendOperation::Min => src.min(dst),
        BlendOperation::Max => src.max(dst),
    }
}

fn write_color(state: &RenderStateSet, format: TextureFormat, dst: &mut LinearRgba, src: LinearRgba) {
    let blended = match &state.blend {
        Some(blend) => LinearRgba::new(
            blend_channel(&blend.color, src.r, src.a, dst.r, dst.a),
            blend_channel(&blend.color, src.g, src.a, dst.g, dst.a),
            blend_channel(&blend.color, src.b, src.a, dst.b, dst.a),
            blend_channel(&blend.alpha, src.a, src.a, dst.a, dst.a),
        ),
        None => src,
    };
    let mask = state.write_mask;
    let mut out = *dst;
    if mask.contains(ColorWrites::R) {
        out.r = blended.r;
    }
    if mask.contains(ColorWrites::G) {
        out.g = blended.g;
    }
    if mask.contains(ColorWrites::B) {
        out.b = blended.b;
    }
    if mask.contains(ColorWrites::A) {
        out.a = blended.a;
    }
    *dst = quantize(format, out);
}

impl GraphicsDevice for SoftwareGraphicsDevice {
    fn create_texture(&mut self, descriptor: &TextureDescriptor) -> Result<TextureId, RenderError> {
        self.check_alive()?;
        if descriptor.size.is_empty() {
            return Err(ResourceError::InvalidHandle(format!(
                "texture '{}' has an empty extent",
                descriptor.label
            ))
            .into());
        }
        if descriptor.dimension == TextureDimension::Cube
            && descriptor.size.width != descriptor.size.height
        {
            return Err(ResourceError::InvalidHandle(format!(
                "cube texture '{}' must have square faces",
                descriptor.label
            ))
            .into());
        }
        let id = TextureId(self.allocate_id());
        self.textures
            .insert(id, TextureStorage::new(descriptor.clone()));
        Ok(id)
    }

    fn write_texture(
        &mut self,
        id: TextureId,
        layer: u32,
        texels: &[LinearRgba],
    ) -> Result<(), RenderError> {
        self.check_alive()?;
        let texture = self.textures.get_mut(&id).ok_or(ResourceError::NotFound {
            kind: "texture",
            id: id.0,
        })?;
        texture.write(layer, texels)?;
        Ok(())
    }

    fn destroy_texture(&mut self, id: TextureId) -> Result<(), RenderError> {
        self.check_alive()?;
        self.textures
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| {
                ResourceError::NotFound {
                    kind: "texture",
                    id: id.0,
                }
                .into()
            })
    }

    fn create_render_target(
        &mut self,
        descriptor: &RenderTargetDescriptor,
    ) -> Result<RenderTargetId, RenderError> {
        self.check_alive()?;
        if !descriptor.format.is_color_renderable() {
            return Err(ResourceError::UnsupportedFormat(format!(
                "{:?} cannot be used for render target '{}'",
                descriptor.format, descriptor.label
            ))
            .into());
        }
        if descriptor.size.is_empty() {
            return Err(ResourceError::InvalidHandle(format!(
                "render target '{}' has an empty extent",
                descriptor.label
            ))
            .into());
        }
        let id = RenderTargetId(self.allocate_id());
        self.targets.insert(
            id,
            ColorSurface::new(descriptor.label.clone(), descriptor.size, descriptor.format),
        );
        log::debug!(
            "SoftwareGraphicsDevice: Created render target '{}' ({}x{}, {:?})",
            descriptor.label,
            descriptor.size.width,
            descriptor.size.height,
            descriptor.format
        );
        Ok(id)
    }

    fn destroy_render_target(&mut self, id: RenderTargetId) -> Result<(), RenderError> {
        self.check_alive()?;
        if self.target_stack.iter().any(|(t, _)| *t == id) {
            return Err(ResourceError::InvalidHandle(format!(
                "render target {} is bound and cannot be destroyed",
                id.0
            ))
            .into());
        }
        self.targets
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| {
                ResourceError::NotFound {
                    kind: "render target",
                    id: id.0,
                }
                .into()
            })
    }

    fn create_depth_stencil(
        &mut self,
        descriptor: &DepthStencilDescriptor,
    ) -> Result<DepthStencilId, RenderError> {
        self.check_alive()?;
        let id = DepthStencilId(self.allocate_id());
        self.depth_stencils
            .insert(id, DepthStencilSurface::new(descriptor.size));
        Ok(id)
    }

    fn create_mesh(&mut self, mesh: &MeshData) -> Result<MeshId, RenderError> {
        self.check_alive()?;
        if !mesh.is_valid() {
            return Err(ResourceError::InvalidHandle(format!(
                "mesh '{}' has out-of-range or incomplete indices",
                mesh.label
            ))
            .into());
        }
        let id = MeshId(self.allocate_id());
        self.meshes.insert(id, Arc::new(mesh.clone()));
        Ok(id)
    }

    fn create_state_set(&mut self, state: &RenderStateSet) -> Result<StateSetId, RenderError> {
        self.check_alive()?;
        let id = StateSetId(self.allocate_id());
        self.state_sets.insert(id, state.clone());
        Ok(id)
    }

    fn create_effect(&mut self, descriptor: &EffectDescriptor) -> Result<EffectId, RenderError> {
        self.check_alive()?;
        let program = descriptor.program.clone();
        if program.techniques().is_empty() {
            return Err(ShaderError::LoadFailed {
                module: program.label().to_string(),
                details: "program declares no techniques".to_string(),
            }
            .into());
        }
        let id = EffectId(self.allocate_id());
        let values = vec![None; program.parameters().len()];
        log::debug!(
            "SoftwareGraphicsDevice: Loaded effect '{}' ({} parameters, {} techniques)",
            program.label(),
            program.parameters().len(),
            program.techniques().len()
        );
        self.effects.insert(id, Effect { program, values });
        Ok(id)
    }

    fn parameter_handle(&self, effect: EffectId, name: &str) -> Result<ParameterHandle, RenderError> {
        self.check_alive()?;
        let effect = self.effect(effect)?;
        effect
            .program
            .parameters()
            .iter()
            .position(|p| p.name == name)
            .map(|i| ParameterHandle(i as u32))
            .ok_or_else(|| {
                ShaderError::MissingParameter {
                    module: effect.program.label().to_string(),
                    name: name.to_string(),
                }
                .into()
            })
    }

    fn technique_handle(&self, effect: EffectId, name: &str) -> Result<TechniqueHandle, RenderError> {
        self.check_alive()?;
        let effect = self.effect(effect)?;
        effect
            .program
            .techniques()
            .iter()
            .position(|t| *t == name)
            .map(|i| TechniqueHandle(i as u32))
            .ok_or_else(|| {
                ShaderError::MissingTechnique {
                    module: effect.program.label().to_string(),
                    name: name.to_string(),
                }
                .into()
            })
    }

    fn set_parameter(
        &mut self,
        effect: EffectId,
        handle: ParameterHandle,
        value: ParameterValue,
    ) -> Result<(), RenderError> {
        self.check_alive()?;
        if let ParameterValue::Texture(Some(texture)) = value {
            if !self.textures.contains_key(&texture) {
                return Err(ResourceError::NotFound {
                    kind: "texture",
                    id: texture.0,
                }
                .into());
            }
        }
        let entry = self.effects.get_mut(&effect).ok_or(ResourceError::NotFound {
            kind: "effect",
            id: effect.0,
        })?;
        let info = *entry
            .program
            .parameters()
            .get(handle.index())
            .ok_or_else(|| {
                ResourceError::InvalidHandle(format!(
                    "parameter handle {} is out of range for '{}'",
                    handle.0,
                    entry.program.label()
                ))
            })?;
        if !value.matches(info.kind) {
            return Err(RenderError::ParameterTypeMismatch {
                module: entry.program.label().to_string(),
                name: info.name.to_string(),
            });
        }
        entry.values[handle.index()] = Some(value);
        self.stats.parameter_uploads += 1;
        Ok(())
    }

    fn push_render_target(
        &mut self,
        target: RenderTargetId,
        depth_stencil: Option<DepthStencilId>,
    ) -> Result<(), RenderError> {
        self.check_alive()?;
        let surface = self.targets.get(&target).ok_or(ResourceError::NotFound {
            kind: "render target",
            id: target.0,
        })?;
        if let Some(ds) = depth_stencil {
            let ds_surface = self.depth_stencils.get(&ds).ok_or(ResourceError::NotFound {
                kind: "depth-stencil surface",
                id: ds.0,
            })?;
            if ds_surface.size != surface.size {
                return Err(ResourceError::InvalidHandle(format!(
                    "depth-stencil {}x{} does not match render target '{}' {}x{}",
                    ds_surface.size.width,
                    ds_surface.size.height,
                    surface.label,
                    surface.size.width,
                    surface.size.height
                ))
                .into());
            }
        }
        self.target_stack.push((target, depth_stencil));
        Ok(())
    }

    fn pop_render_target(&mut self) -> Result<(), RenderError> {
        self.check_alive()?;
        if self.target_stack.len() <= 1 {
            return Err(UsageError::TargetStackEmpty.into());
        }
        self.target_stack.pop();
        Ok(())
    }

    fn current_target_size(&self) -> Extent2D {
        self.target_stack
            .last()
            .and_then(|(t, _)| self.targets.get(t))
            .map(|s| s.size)
            .unwrap_or_default()
    }

    fn clear(
        &mut self,
        flags: ClearFlags,
        color: LinearRgba,
        depth: f32,
        stencil: u8,
    ) -> Result<(), RenderError> {
        self.check_alive()?;
        let (target, ds) = *self
            .target_stack
            .last()
            .ok_or(UsageError::TargetStackEmpty)?;
        if flags.intersects(ClearFlags::DEPTH | ClearFlags::STENCIL) {
            let ds = ds.ok_or_else(|| {
                ResourceError::InvalidHandle("no depth-stencil surface is bound".to_string())
            })?;
            let surface = self.depth_stencils.get_mut(&ds).ok_or(ResourceError::NotFound {
                kind: "depth-stencil surface",
                id: ds.0,
            })?;
            if flags.contains(ClearFlags::DEPTH) {
                surface.depth.iter_mut().for_each(|d| *d = depth);
            }
            if flags.contains(ClearFlags::STENCIL) {
                surface.stencil.iter_mut().for_each(|s| *s = stencil);
            }
        }
        if flags.contains(ClearFlags::COLOR) {
            let surface = self.targets.get_mut(&target).ok_or(ResourceError::NotFound {
                kind: "render target",
                id: target.0,
            })?;
            surface.fill(color);
        }
        self.stats.clears += 1;
        Ok(())
    }

    fn apply_state_set(&mut self, id: StateSetId) -> Result<(), RenderError> {
        self.check_alive()?;
        let state = self.state_sets.get(&id).ok_or(ResourceError::NotFound {
            kind: "state set",
            id: id.0,
        })?;
        self.current_state = state.clone();
        self.stats.state_changes += 1;
        Ok(())
    }

    fn set_stencil_reference(&mut self, reference: u8) -> Result<(), RenderError> {
        self.check_alive()?;
        self.stencil_reference = reference;
        Ok(())
    }

    fn draw_mesh(
        &mut self,
        mesh: MeshId,
        effect: EffectId,
        technique: TechniqueHandle,
    ) -> Result<(), RenderError> {
        self.check_alive()?;
        let mesh_data = self
            .meshes
            .get(&mesh)
            .cloned()
            .ok_or(ResourceError::NotFound {
                kind: "mesh",
                id: mesh.0,
            })?;
        let effect_entry = self.effects.get(&effect).ok_or(ResourceError::NotFound {
            kind: "effect",
            id: effect.0,
        })?;
        let technique_name = effect_entry
            .program
            .techniques()
            .get(technique.index())
            .copied()
            .ok_or_else(|| {
                ResourceError::InvalidHandle(format!(
                    "technique handle {} is out of range for '{}'",
                    technique.0,
                    effect_entry.program.label()
                ))
            })?;
        let (target_id, ds_id) = *self
            .target_stack
            .last()
            .ok_or(UsageError::TargetStackEmpty)?;

        let target = self.targets.get_mut(&target_id).ok_or(ResourceError::NotFound {
            kind: "render target",
            id: target_id.0,
        })?;
        let mut depth_stencil = match ds_id {
            Some(ds) => Some(self.depth_stencils.get_mut(&ds).ok_or(
                ResourceError::NotFound {
                    kind: "depth-stencil surface",
                    id: ds.0,
                },
            )?),
            None => None,
        };

        let program = effect_entry.program.as_ref();
        let resources = DrawResources {
            values: &effect_entry.values,
            textures: &self.textures,
        };
        let ctx = ShaderContext::new(&resources);
        let state = &self.current_state;
        let reference = self.stencil_reference;
        let size = target.size;
        let format = target.format;
        let shades_color = !state.write_mask.is_empty();

        let outputs: Vec<ClipVertex> = mesh_data
            .vertices
            .iter()
            .map(|v| program.vertex(&ctx, v))
            .collect();

        let mut fragments_shaded = 0u64;
        let mut triangles = 0u32;
        for tri in mesh_data.indices.chunks_exact(3) {
            let clip = [
                outputs[tri[0] as usize],
                outputs[tri[1] as usize],
                outputs[tri[2] as usize],
            ];
            let polygon = clip_near(&clip);
            triangles += rasterize_polygon(
                &polygon,
                size,
                state.rasterizer.cull_mode,
                state.rasterizer.front_face,
                &mut |frag| {
                    // Depth clip against the far plane.
                    if frag.ndc.z > 1.0 {
                        return;
                    }
                    let index = (frag.y * size.width + frag.x) as usize;
                    let ds_state = &state.depth_stencil;
                    let face = if frag.front_facing {
                        &ds_state.stencil_front
                    } else {
                        &ds_state.stencil_back
                    };

                    if let Some(ds) = depth_stencil.as_deref_mut() {
                        let stored = ds.stencil[index];
                        let write_stencil = |ds: &mut DepthStencilSurface, op: StencilOperation| {
                            let value = op.apply(stored, reference);
                            let mask = ds_state.stencil_write_mask;
                            ds.stencil[index] = (stored & !mask) | (value & mask);
                        };
                        let read_mask = ds_state.stencil_read_mask;
                        if !face.compare.test(reference & read_mask, stored & read_mask) {
                            write_stencil(ds, face.fail_op);
                            return;
                        }
                        if !ds_state.depth_compare.test(frag.ndc.z, ds.depth[index]) {
                            write_stencil(ds, face.depth_fail_op);
                            return;
                        }
                    }

                    let color = if shades_color {
                        let input = FragmentInput {
                            pixel: (frag.x, frag.y),
                            ndc: frag.ndc,
                            varyings: frag.varyings,
                        };
                        fragments_shaded += 1;
                        let Some(c) = program.fragment(&ctx, technique, &input) else {
                            return;
                        };
                        Some(c)
                    } else {
                        None
                    };

                    if let Some(ds) = depth_stencil.as_deref_mut() {
                        let stored = ds.stencil[index];
                        let value = face.depth_pass_op.apply(stored, reference);
                        let mask = ds_state.stencil_write_mask;
                        ds.stencil[index] = (stored & !mask) | (value & mask);
                        if ds_state.depth_write_enabled {
                            ds.depth[index] = frag.ndc.z;
                        }
                    }
                    if let Some(c) = color {
                        write_color(state, format, &mut target.texels[index], c);
                    }
                },
            );
        }

        self.stats.draw_calls += 1;
        self.stats.triangles_rasterized += triangles;
        self.stats.fragments_shaded += fragments_shaded;
        self.draw_log.push(DrawRecord {
            state_set: self.current_state.label.clone(),
            mesh: mesh_data.label.clone(),
            effect: program.label().to_string(),
            technique: technique_name.to_string(),
            stencil_reference: reference,
            fragments_shaded,
        });
        Ok(())
    }

    fn read_render_target(&self, id: RenderTargetId) -> Result<Vec<LinearRgba>, RenderError> {
        self.check_alive()?;
        self.targets
            .get(&id)
            .map(|s| s.texels.clone())
            .ok_or_else(|| {
                ResourceError::NotFound {
                    kind: "render target",
                    id: id.0,
                }
                .into()
            })
    }

    fn texture_size(&self, id: TextureId) -> Result<Extent2D, RenderError> {
        self.check_alive()?;
        self.textures
            .get(&id)
            .map(|t| t.descriptor.size)
            .ok_or_else(|| {
                ResourceError::NotFound {
                    kind: "texture",
                    id: id.0,
                }
                .into()
            })
    }

    fn render_target_size(&self, id: RenderTargetId) -> Result<Extent2D, RenderError> {
        self.check_alive()?;
        self.targets.get(&id).map(|s| s.size).ok_or_else(|| {
            ResourceError::NotFound {
                kind: "render target",
                id: id.0,
            }
            .into()
        })
    }

    fn stats(&self) -> RenderStats {
        self.stats
    }
}
