use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Payload served by a bundle delivery endpoint.
///
/// A built bundle announces the modules it carries: for each versionless
/// component id, a mapping from preview-type name to that pairing's module.
/// Loading a bundle merges these registrations into the runtime's
/// linked-module table, after which the loader looks up the slot it asked
/// for.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BundleManifest {
    pub components: HashMap<String, HashMap<String, Value>>,
}

impl BundleManifest {
    pub fn register(
        &mut self,
        component_id_without_version: impl Into<String>,
        preview_type: impl Into<String>,
        module: Value,
    ) {
        self.components
            .entry(component_id_without_version.into())
            .or_default()
            .insert(preview_type.into(), module);
    }
}
