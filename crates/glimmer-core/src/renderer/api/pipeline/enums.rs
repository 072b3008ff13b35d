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

//! Enums for fixed-function pipeline configuration.

use serde::{Deserialize, Serialize};

/// Defines which face of a triangle to cull (not render).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CullMode {
    /// No culling is performed.
    #[default]
    None,
    /// Cull front-facing triangles.
    Front,
    /// Cull back-facing triangles.
    Back,
}

/// Defines which vertex winding order considers a triangle to be "front-facing".
///
/// Winding is evaluated in normalized device coordinates, with `+Y` pointing up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FrontFace {
    /// Counter-clockwise winding order is the front face.
    #[default]
    Ccw,
    /// Clockwise winding order is the front face.
    Cw,
}

/// The comparison function used for depth and stencil testing.
///
/// The incoming value is on the left: `Less` passes when `new < existing`.
/// For stencil tests the incoming value is the masked reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CompareFunction {
    /// The test never passes.
    Never,
    /// The test passes if the new value is less than the existing value.
    Less,
    /// The test passes if the new value is equal to the existing value.
    Equal,
    /// The test passes if the new value is less than or equal to the existing value.
    LessEqual,
    /// The test passes if the new value is greater than the existing value.
    Greater,
    /// The test passes if the new value is not equal to the existing value.
    NotEqual,
    /// The test passes if the new value is greater than or equal to the existing value.
    GreaterEqual,
    /// The test always passes.
    #[default]
    Always,
}

impl CompareFunction {
    /// Evaluates the comparison for `incoming` against `existing`.
    #[inline]
    pub fn test<T: PartialOrd>(self, incoming: T, existing: T) -> bool {
        match self {
            CompareFunction::Never => false,
            CompareFunction::Less => incoming < existing,
            CompareFunction::Equal => incoming == existing,
            CompareFunction::LessEqual => incoming <= existing,
            CompareFunction::Greater => incoming > existing,
            CompareFunction::NotEqual => incoming != existing,
            CompareFunction::GreaterEqual => incoming >= existing,
            CompareFunction::Always => true,
        }
    }
}

/// The operation to perform on a stencil value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StencilOperation {
    /// Keep the current value.
    #[default]
    Keep,
    /// Set the value to 0.
    Zero,
    /// Replace the value with the reference value.
    Replace,
    /// Invert the bits of the value.
    Invert,
    /// Increment the value, clamping to the maximum representable value.
    IncrementClamp,
    /// Decrement the value, clamping to 0.
    DecrementClamp,
    /// Increment the value, wrapping to 0 on overflow.
    IncrementWrap,
    /// Decrement the value, wrapping to the maximum representable value on underflow.
    DecrementWrap,
}

impl StencilOperation {
    /// Applies the operation to `current`, given the stencil `reference`.
    #[inline]
    pub fn apply(self, current: u8, reference: u8) -> u8 {
        match self {
            StencilOperation::Keep => current,
            StencilOperation::Zero => 0,
            StencilOperation::Replace => reference,
            StencilOperation::Invert => !current,
            StencilOperation::IncrementClamp => current.saturating_add(1),
            StencilOperation::DecrementClamp => current.saturating_sub(1),
            StencilOperation::IncrementWrap => current.wrapping_add(1),
            StencilOperation::DecrementWrap => current.wrapping_sub(1),
        }
    }
}

/// A factor used in a blend equation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendFactor {
    /// `0.0`
    Zero,
    /// `1.0`
    One,
    /// The source color.
    Src,
    /// `1.0 - source color`
    OneMinusSrc,
    /// The source alpha.
    SrcAlpha,
    /// `1.0 - source alpha`
    OneMinusSrcAlpha,
    /// The destination color.
    Dst,
    /// `1.0 - destination color`
    OneMinusDst,
    /// The destination alpha.
    DstAlpha,
    /// `1.0 - destination alpha`
    OneMinusDstAlpha,
}

/// The operation that combines the weighted source and destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendOperation {
    /// `src + dst`
    Add,
    /// `src - dst`
    Subtract,
    /// `dst - src`
    ReverseSubtract,
    /// `min(src, dst)`
    Min,
    /// `max(src, dst)`
    Max,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compare_uses_incoming_on_the_left() {
        assert!(CompareFunction::Less.test(0.25, 0.5));
        assert!(!CompareFunction::Less.test(0.5, 0.5));
        assert!(CompareFunction::LessEqual.test(0.5, 0.5));
        assert!(CompareFunction::Greater.test(0.75, 0.5));
        assert!(CompareFunction::NotEqual.test(1, 0));
        assert!(!CompareFunction::Never.test(1, 1));
    }

    #[test]
    fn stencil_ops() {
        assert_eq!(StencilOperation::Replace.apply(0, 7), 7);
        assert_eq!(StencilOperation::Keep.apply(3, 7), 3);
        assert_eq!(StencilOperation::IncrementClamp.apply(255, 0), 255);
        assert_eq!(StencilOperation::IncrementWrap.apply(255, 0), 0);
        assert_eq!(StencilOperation::DecrementClamp.apply(0, 0), 0);
        assert_eq!(StencilOperation::Invert.apply(0b1010_1010, 0), 0b0101_0101);
    }
}
