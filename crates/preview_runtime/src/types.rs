//! Module and context value types shared across the runtime.

use std::collections::HashMap;

use serde_json::Value;

/// Executable module payload for one component/preview-type pairing. In a
/// non-browser host, modules travel as opaque JSON values.
pub type ComponentModule = Value;

/// The sub-value an included preview type's model selector extracts for a
/// dependent render call.
pub type PreviewModel = Value;

/// Opaque payload the host displays after a successful render.
pub type RenderOutput = Value;

/// A module-cache entry: the preview type's main module (if one was linked
/// at startup) plus the per-component modules resolved so far under this
/// cache key.
#[derive(Debug, Clone, Default)]
pub struct PreviewModule {
    pub main_module: Option<ComponentModule>,
    pub component_map: HashMap<String, ComponentModule>,
}

impl PreviewModule {
    pub fn component(&self, full_name: &str) -> Option<&ComponentModule> {
        self.component_map.get(full_name)
    }
}

/// Merged bag of values contributed by all registered context providers,
/// available to every render call.
#[derive(Debug, Clone, Default)]
pub struct RenderingContext {
    values: HashMap<String, Value>,
}

impl RenderingContext {
    pub(crate) fn new(values: HashMap<String, Value>) -> Self {
        Self { values }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Result of a completed render, as handed to the host.
#[derive(Debug, Clone)]
pub struct RenderedPreview {
    pub component: String,
    pub preview_type: String,
    pub output: RenderOutput,
}
