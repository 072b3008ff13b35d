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

//! Triangle setup and coverage: near-plane clipping, face classification and
//! sample enumeration.
//!
//! Samples sit at integer window coordinates, with `(0, 0)` at the top-left
//! pixel. A full-screen primitive therefore needs the half-pixel offset applied
//! by the light shaders to line texel centers up with samples. Shared edges are
//! owned by exactly one of the two triangles, so additive passes never shade a
//! pixel twice.

use glimmer_core::math::{Extent2D, Vec3, Vec4};
use glimmer_core::renderer::{CullMode, FrontFace, VertexOutput, VARYING_COUNT};

/// A vertex after the vertex stage, in clip space.
pub(crate) type ClipVertex = VertexOutput;

/// A vertex after perspective division and viewport mapping.
#[derive(Debug, Clone, Copy)]
struct ScreenVertex {
    x: f64,
    y: f64,
    z: f64,
    inv_w: f64,
    varyings: [Vec4; VARYING_COUNT],
}

/// One covered sample handed to the fragment pipeline.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Fragment {
    pub(crate) x: u32,
    pub(crate) y: u32,
    pub(crate) ndc: Vec3,
    pub(crate) front_facing: bool,
    pub(crate) varyings: [Vec4; VARYING_COUNT],
}

fn lerp_vertex(a: &ClipVertex, b: &ClipVertex, t: f32) -> ClipVertex {
    let mut varyings = [Vec4::ZERO; VARYING_COUNT];
    for (i, v) in varyings.iter_mut().enumerate() {
        *v = a.varyings[i] + (b.varyings[i] - a.varyings[i]) * t;
    }
    ClipVertex {
        position: a.position + (b.position - a.position) * t,
        varyings,
    }
}

/// Clips a triangle against the near plane (`z >= 0` in clip space).
///
/// Returns the clipped polygon, which has zero, three or four vertices.
pub(crate) fn clip_near(triangle: &[ClipVertex; 3]) -> Vec<ClipVertex> {
    let mut out = Vec::with_capacity(4);
    for i in 0..3 {
        let cur = &triangle[i];
        let next = &triangle[(i + 1) % 3];
        let (dc, dn) = (cur.position.z, next.position.z);
        if dc >= 0.0 {
            out.push(*cur);
        }
        if (dc >= 0.0) != (dn >= 0.0) {
            let t = dc / (dc - dn);
            out.push(lerp_vertex(cur, next, t));
        }
    }
    out
}

fn to_screen(v: &ClipVertex, size: Extent2D) -> Option<ScreenVertex> {
    let w = v.position.w as f64;
    if w <= 0.0 || !w.is_finite() {
        return None;
    }
    let inv_w = 1.0 / w;
    let ndc_x = v.position.x as f64 * inv_w;
    let ndc_y = v.position.y as f64 * inv_w;
    Some(ScreenVertex {
        x: (ndc_x + 1.0) * 0.5 * size.width as f64,
        y: (1.0 - ndc_y) * 0.5 * size.height as f64,
        z: v.position.z as f64 * inv_w,
        inv_w,
        varyings: v.varyings,
    })
}

fn raw_edge(a: (f64, f64), b: (f64, f64), p: (f64, f64)) -> f64 {
    (b.0 - a.0) * (p.1 - a.1) - (b.1 - a.1) * (p.0 - a.0)
}

/// Edge function evaluated in a canonical vertex order, so that
/// `edge(a, b, p) == -edge(b, a, p)` holds exactly.
fn edge(a: (f64, f64), b: (f64, f64), p: (f64, f64)) -> f64 {
    if (a.1, a.0) <= (b.1, b.0) {
        raw_edge(a, b, p)
    } else {
        -raw_edge(b, a, p)
    }
}

/// Whether a triangle owns samples lying exactly on its edge `a -> b`.
///
/// With the triangle walked clockwise on screen, top edges run right and left
/// edges run up; those are the owned ones.
fn owns_edge(a: (f64, f64), b: (f64, f64), orientation: f64) -> bool {
    let dx = (b.0 - a.0) * orientation;
    let dy = (b.1 - a.1) * orientation;
    dy < 0.0 || (dy == 0.0 && dx > 0.0)
}

/// Rasterizes one clipped polygon, calling `emit` for every covered sample.
///
/// Returns the number of triangles that survived culling.
pub(crate) fn rasterize_polygon(
    polygon: &[ClipVertex],
    size: Extent2D,
    cull_mode: CullMode,
    front_face: FrontFace,
    emit: &mut dyn FnMut(Fragment),
) -> u32 {
    if polygon.len() < 3 || size.is_empty() {
        return 0;
    }
    let Some(screen) = polygon
        .iter()
        .map(|v| to_screen(v, size))
        .collect::<Option<Vec<_>>>()
    else {
        return 0;
    };

    let mut drawn = 0;
    for i in 1..(screen.len() - 1) {
        if rasterize_triangle(
            [screen[0], screen[i], screen[i + 1]],
            size,
            cull_mode,
            front_face,
            emit,
        ) {
            drawn += 1;
        }
    }
    drawn
}

fn rasterize_triangle(
    tri: [ScreenVertex; 3],
    size: Extent2D,
    cull_mode: CullMode,
    front_face: FrontFace,
    emit: &mut dyn FnMut(Fragment),
) -> bool {
    let p = [(tri[0].x, tri[0].y), (tri[1].x, tri[1].y), (tri[2].x, tri[2].y)];
    let area = edge(p[0], p[1], p[2]);
    if area == 0.0 || !area.is_finite() {
        return false;
    }

    // Window space has +Y down, so a counter-clockwise triangle in NDC has a
    // negative window-space area.
    let ccw = area < 0.0;
    let front_facing = match front_face {
        FrontFace::Ccw => ccw,
        FrontFace::Cw => !ccw,
    };
    let culled = match cull_mode {
        CullMode::None => false,
        CullMode::Back => !front_facing,
        CullMode::Front => front_facing,
    };
    if culled {
        return false;
    }

    let orientation = area.signum();
    let edges = [(1usize, 2usize), (2, 0), (0, 1)];
    let owns = edges.map(|(a, b)| owns_edge(p[a], p[b], orientation));

    let min_x = p.iter().map(|v| v.0).fold(f64::INFINITY, f64::min).ceil().max(0.0);
    let max_x = p
        .iter()
        .map(|v| v.0)
        .fold(f64::NEG_INFINITY, f64::max)
        .floor()
        .min(size.width as f64 - 1.0);
    let min_y = p.iter().map(|v| v.1).fold(f64::INFINITY, f64::min).ceil().max(0.0);
    let max_y = p
        .iter()
        .map(|v| v.1)
        .fold(f64::NEG_INFINITY, f64::max)
        .floor()
        .min(size.height as f64 - 1.0);
    if min_x > max_x || min_y > max_y {
        return true;
    }

    let inv_area = 1.0 / area;
    for py in (min_y as u32)..=(max_y as u32) {
        for px in (min_x as u32)..=(max_x as u32) {
            let s = (px as f64, py as f64);
            let mut weights = [0.0f64; 3];
            let mut inside = true;
            for (k, &(a, b)) in edges.iter().enumerate() {
                let e = edge(p[a], p[b], s);
                let signed = e * orientation;
                if signed < 0.0 || (signed == 0.0 && !owns[k]) {
                    inside = false;
                    break;
                }
                weights[k] = e * inv_area;
            }
            if !inside {
                continue;
            }

            let [l0, l1, l2] = weights;
            // Relative form keeps a constant depth exact across the triangle.
            let z = tri[0].z + l1 * (tri[1].z - tri[0].z) + l2 * (tri[2].z - tri[0].z);
            let persp = [l0 * tri[0].inv_w, l1 * tri[1].inv_w, l2 * tri[2].inv_w];
            let denom = persp[0] + persp[1] + persp[2];
            if denom <= 0.0 {
                continue;
            }
            let mut varyings = [Vec4::ZERO; VARYING_COUNT];
            for (i, out) in varyings.iter_mut().enumerate() {
                let mut acc = Vec4::ZERO;
                for (k, v) in tri.iter().enumerate() {
                    acc = acc + v.varyings[i] * (persp[k] / denom) as f32;
                }
                *out = acc;
            }

            emit(Fragment {
                x: px,
                y: py,
                ndc: Vec3::new(
                    (2.0 * s.0 / size.width as f64 - 1.0) as f32,
                    (1.0 - 2.0 * s.1 / size.height as f64) as f32,
                    z as f32,
                ),
                front_facing,
                varyings,
            });
        }
    }
    true
}
