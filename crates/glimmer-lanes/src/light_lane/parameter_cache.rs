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

//! Memoisation of shader parameter uploads.

use std::collections::HashMap;

use glimmer_core::renderer::{EffectId, GraphicsDevice, ParameterHandle, ParameterValue, RenderError};

/// Remembers the last value uploaded to each parameter of one effect and skips
/// uploads that would not change anything.
///
/// Each lane owns its own cache. The cache must be [invalidated](Self::invalidate)
/// whenever the device loses the effect's state, after which the next upload of
/// every parameter goes through.
#[derive(Debug, Clone)]
pub struct ParameterCache {
    values: HashMap<ParameterHandle, ParameterValue>,
    enabled: bool,
    uploads: u64,
    skipped: u64,
}

impl Default for ParameterCache {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ParameterCache {
    /// Creates an empty cache.
    pub fn new(enabled: bool) -> Self {
        Self {
            values: HashMap::new(),
            enabled,
            uploads: 0,
            skipped: 0,
        }
    }

    /// Uploads `value` unless it is already the parameter's current value.
    ///
    /// ## Arguments
    ///
    /// * `device` - The device holding the effect.
    /// * `effect` - The effect owning `handle`. A cache serves a single effect.
    /// * `handle` - The resolved parameter.
    /// * `value` - The new value.
    ///
    /// ## Returns
    ///
    /// `true` if the device was called, `false` if the upload was skipped.
    pub fn set(
        &mut self,
        device: &mut dyn GraphicsDevice,
        effect: EffectId,
        handle: ParameterHandle,
        value: ParameterValue,
    ) -> Result<bool, RenderError> {
        if self.enabled && self.values.get(&handle) == Some(&value) {
            self.skipped += 1;
            return Ok(false);
        }
        device.set_parameter(effect, handle, value)?;
        if self.enabled {
            self.values.insert(handle, value);
        }
        self.uploads += 1;
        Ok(true)
    }

    /// Forgets every remembered value.
    pub fn invalidate(&mut self) {
        self.values.clear();
    }

    /// Turns memoisation on or off. Turning it off also forgets all values.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.values.clear();
        }
    }

    /// Whether memoisation is on.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Number of uploads that reached the device.
    pub fn uploads(&self) -> u64 {
        self.uploads
    }

    /// Number of uploads skipped because the value was unchanged.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    /// Zeroes both counters.
    pub fn reset_counters(&mut self) {
        self.uploads = 0;
        self.skipped = 0;
    }
}
