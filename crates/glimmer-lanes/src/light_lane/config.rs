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

//! Tunables of the light pre-pass.

use std::path::Path;

use glimmer_core::renderer::{CompareFunction, TextureFormat};
use serde::{Deserialize, Serialize};

use super::LightingError;

/// Fraction of the camera's vertical field of view above which a point light
/// volume counts as "near" and takes the two-pass stencil path.
pub const NEAR_LIGHT_FOV_FRACTION: f32 = 0.2;

/// Stencil value written by the marking pass of near point lights.
pub const STENCIL_REFERENCE: u8 = 1;

/// Stencil value restored before every point light.
pub const STENCIL_CLEAR_VALUE: u8 = 0;

/// Default depth bias for cube shadow comparisons, in world units.
pub const SHADOW_BIAS: f32 = 0.05;

/// Configuration of the light pre-pass.
///
/// Every field has a default, so a RON file only needs to list what it
/// overrides:
///
/// ```
/// use glimmer_lanes::LightPrePassConfig;
///
/// let config = LightPrePassConfig::from_ron_str("(near_light_fov_fraction: 0.3)").unwrap();
/// assert_eq!(config.near_light_fov_fraction, 0.3);
/// assert_eq!(config.stencil_reference, 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightPrePassConfig {
    /// Threshold of the point light heuristic, as a fraction of the field of view.
    pub near_light_fov_fraction: f32,
    /// Stencil reference of the two-pass path.
    pub stencil_reference: u8,
    /// Stencil value cleared before each point light.
    pub stencil_clear_value: u8,
    /// Stencil comparison of the marking pass.
    pub stencil_mark_compare: CompareFunction,
    /// Stencil comparison of the lighting pass.
    pub stencil_light_compare: CompareFunction,
    /// Whether parameter uploads are memoised.
    pub parameter_cache_enabled: bool,
    /// Latitude bands of the light sphere.
    pub sphere_stacks: u32,
    /// Longitude segments of the light sphere.
    pub sphere_slices: u32,
    /// Depth bias of cube shadow comparisons.
    pub shadow_bias: f32,
    /// Format of the accumulation target.
    pub accumulation_format: TextureFormat,
}

impl Default for LightPrePassConfig {
    fn default() -> Self {
        Self {
            near_light_fov_fraction: NEAR_LIGHT_FOV_FRACTION,
            stencil_reference: STENCIL_REFERENCE,
            stencil_clear_value: STENCIL_CLEAR_VALUE,
            stencil_mark_compare: CompareFunction::Always,
            stencil_light_compare: CompareFunction::NotEqual,
            parameter_cache_enabled: true,
            sphere_stacks: 12,
            sphere_slices: 16,
            shadow_bias: SHADOW_BIAS,
            accumulation_format: TextureFormat::Rgba16Float,
        }
    }
}

impl LightPrePassConfig {
    /// Parses a configuration from RON and validates it.
    pub fn from_ron_str(source: &str) -> Result<Self, LightingError> {
        let config: Self =
            ron::from_str(source).map_err(|e| LightingError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a configuration from a RON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LightingError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        let config = Self::from_ron_str(&source)?;
        log::info!("LightPrePassConfig: Loaded {}", path.display());
        Ok(config)
    }

    /// Serializes the configuration to pretty RON.
    pub fn to_ron_string(&self) -> Result<String, LightingError> {
        let pretty = ron::ser::PrettyConfig::default().indentor("  ".to_string());
        ron::ser::to_string_pretty(self, pretty).map_err(|e| LightingError::Parse(e.to_string()))
    }

    /// Checks that every value is usable.
    pub fn validate(&self) -> Result<(), LightingError> {
        if !self.near_light_fov_fraction.is_finite() || self.near_light_fov_fraction <= 0.0 {
            return Err(LightingError::InvalidConfig(format!(
                "near_light_fov_fraction must be a positive number, got {}",
                self.near_light_fov_fraction
            )));
        }
        if self.stencil_reference == self.stencil_clear_value {
            return Err(LightingError::InvalidConfig(format!(
                "stencil_reference and stencil_clear_value must differ, both are {}",
                self.stencil_reference
            )));
        }
        if self.sphere_stacks < 2 || self.sphere_slices < 3 {
            return Err(LightingError::InvalidConfig(format!(
                "sphere tessellation {}x{} is too coarse (minimum 2x3)",
                self.sphere_stacks, self.sphere_slices
            )));
        }
        if !self.shadow_bias.is_finite() || self.shadow_bias < 0.0 {
            return Err(LightingError::InvalidConfig(format!(
                "shadow_bias must be non-negative, got {}",
                self.shadow_bias
            )));
        }
        if !self.accumulation_format.is_color_renderable() {
            return Err(LightingError::InvalidConfig(format!(
                "{:?} cannot hold accumulated light",
                self.accumulation_format
            )));
        }
        if !self.accumulation_format.is_hdr() {
            log::warn!(
                "LightPrePassConfig: {:?} clamps accumulated light to [0, 1]",
                self.accumulation_format
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_the_named_constants() {
        let config = LightPrePassConfig::default();
        assert_eq!(config.near_light_fov_fraction, NEAR_LIGHT_FOV_FRACTION);
        assert_eq!(config.stencil_reference, STENCIL_REFERENCE);
        assert_eq!(config.accumulation_format, TextureFormat::Rgba16Float);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn ron_overrides_and_round_trip() {
        let config = LightPrePassConfig::from_ron_str(
            "(stencil_reference: 7, parameter_cache_enabled: false, stencil_light_compare: Equal)",
        )
        .expect("valid config");
        assert_eq!(config.stencil_reference, 7);
        assert!(!config.parameter_cache_enabled);
        assert_eq!(config.stencil_light_compare, CompareFunction::Equal);

        let text = config.to_ron_string().expect("serializable");
        assert_eq!(LightPrePassConfig::from_ron_str(&text).expect("reparse"), config);
    }

    #[test]
    fn invalid_values_are_rejected() {
        for source in [
            "(near_light_fov_fraction: 0.0)",
            "(stencil_reference: 0)",
            "(sphere_stacks: 1)",
            "(shadow_bias: -1.0)",
            "(accumulation_format: Depth24PlusStencil8)",
        ] {
            assert!(
                matches!(
                    LightPrePassConfig::from_ron_str(source),
                    Err(LightingError::InvalidConfig(_))
                ),
                "{source}"
            );
        }
        assert!(matches!(
            LightPrePassConfig::from_ron_str("(near_light_fov_fraction: \"big\")"),
            Err(LightingError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        assert!(matches!(
            LightPrePassConfig::load("/nonexistent/light_prepass.ron"),
            Err(LightingError::Io(_))
        ));
    }
}
