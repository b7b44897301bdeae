//! Append-only registries populated at process start by extension wiring.

use std::{collections::HashMap, sync::Arc};

use anyhow::{bail, Result};
use serde_json::Value;

use shared::error::PreviewError;

use crate::{types::RenderingContext, PreviewDefinition, RenderingContextProvider};

/// Ordered collection of preview type definitions.
///
/// Re-registering a name replaces the earlier entry in place, keeping the
/// first-registered default fallback deterministic.
#[derive(Clone, Default)]
pub struct PreviewRegistry {
    entries: Vec<Arc<dyn PreviewDefinition>>,
}

impl PreviewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, definition: Arc<dyn PreviewDefinition>) -> Result<()> {
        let name = definition.name().to_string();
        if definition.includes().iter().any(|included| *included == name) {
            bail!("preview type {name} must not include itself");
        }
        match self.entries.iter().position(|entry| entry.name() == name) {
            Some(position) => self.entries[position] = definition,
            None => self.entries.push(definition),
        }
        Ok(())
    }

    pub fn values(&self) -> &[Arc<dyn PreviewDefinition>] {
        &self.entries
    }

    pub fn by_name(&self, name: &str) -> Option<Arc<dyn PreviewDefinition>> {
        self.entries
            .iter()
            .find(|entry| entry.name() == name)
            .cloned()
    }

    /// The unique definition flagged as default, else the first registered.
    pub fn default_definition(&self) -> Option<Arc<dyn PreviewDefinition>> {
        self.entries
            .iter()
            .find(|entry| entry.is_default())
            .or_else(|| self.entries.first())
            .cloned()
    }
}

/// Ordered collection of rendering-context providers.
#[derive(Clone, Default)]
pub struct RenderingContextRegistry {
    providers: Vec<Arc<dyn RenderingContextProvider>>,
}

impl RenderingContextRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, provider: Arc<dyn RenderingContextProvider>) {
        self.providers.push(provider);
    }

    pub fn values(&self) -> &[Arc<dyn RenderingContextProvider>] {
        &self.providers
    }

    /// Invokes every provider in registration order and shallow-merges the
    /// results; later providers win on key collisions. A failing provider
    /// aborts construction.
    pub async fn build_context(&self) -> Result<RenderingContext, PreviewError> {
        let mut values: HashMap<String, Value> = HashMap::new();
        for provider in &self.providers {
            let contributed =
                provider
                    .context()
                    .await
                    .map_err(|err| PreviewError::ContextProviderFailure {
                        message: err.to_string(),
                    })?;
            values.extend(contributed);
        }
        Ok(RenderingContext::new(values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PreviewModel, PreviewModule, RenderOutput};
    use anyhow::anyhow;
    use async_trait::async_trait;
    use serde_json::json;

    struct TestDefinition {
        name: &'static str,
        default: bool,
        includes: Vec<String>,
    }

    impl TestDefinition {
        fn named(name: &'static str) -> Arc<Self> {
            Arc::new(Self {
                name,
                default: false,
                includes: Vec::new(),
            })
        }

        fn default_type(name: &'static str) -> Arc<Self> {
            Arc::new(Self {
                name,
                default: true,
                includes: Vec::new(),
            })
        }
    }

    #[async_trait]
    impl PreviewDefinition for TestDefinition {
        fn name(&self) -> &str {
            self.name
        }

        fn is_default(&self) -> bool {
            self.default
        }

        fn includes(&self) -> Vec<String> {
            self.includes.clone()
        }

        async fn render(
            &self,
            _component_full_name: &str,
            _module: Arc<PreviewModule>,
            _includes: Vec<PreviewModel>,
            _ctx: &RenderingContext,
        ) -> Result<RenderOutput> {
            Ok(json!(self.name))
        }
    }

    struct StaticProvider(Vec<(&'static str, Value)>);

    #[async_trait]
    impl RenderingContextProvider for StaticProvider {
        async fn context(&self) -> Result<HashMap<String, Value>> {
            Ok(self
                .0
                .iter()
                .map(|(key, value)| (key.to_string(), value.clone()))
                .collect())
        }
    }

    struct FailingProvider;

    #[async_trait]
    impl RenderingContextProvider for FailingProvider {
        async fn context(&self) -> Result<HashMap<String, Value>> {
            Err(anyhow!("theme store unavailable"))
        }
    }

    #[test]
    fn default_flag_wins_over_registration_order() {
        let mut registry = PreviewRegistry::new();
        registry.register(TestDefinition::named("docs")).unwrap();
        registry
            .register(TestDefinition::default_type("compositions"))
            .unwrap();

        let default = registry.default_definition().unwrap();
        assert_eq!(default.name(), "compositions");
    }

    #[test]
    fn first_registered_is_default_when_none_flagged() {
        let mut registry = PreviewRegistry::new();
        registry.register(TestDefinition::named("docs")).unwrap();
        registry
            .register(TestDefinition::named("compositions"))
            .unwrap();

        assert_eq!(registry.default_definition().unwrap().name(), "docs");
    }

    #[test]
    fn empty_registry_has_no_default() {
        assert!(PreviewRegistry::new().default_definition().is_none());
    }

    #[test]
    fn re_registration_replaces_in_place() {
        let mut registry = PreviewRegistry::new();
        registry.register(TestDefinition::named("docs")).unwrap();
        registry
            .register(TestDefinition::named("compositions"))
            .unwrap();
        registry
            .register(TestDefinition::default_type("docs"))
            .unwrap();

        let names: Vec<_> = registry.values().iter().map(|d| d.name()).collect();
        assert_eq!(names, ["docs", "compositions"]);
        assert!(registry.by_name("docs").unwrap().is_default());
    }

    #[test]
    fn self_including_definition_is_rejected() {
        let mut registry = PreviewRegistry::new();
        let err = registry
            .register(Arc::new(TestDefinition {
                name: "docs",
                default: false,
                includes: vec!["docs".to_string()],
            }))
            .unwrap_err();
        assert!(err.to_string().contains("must not include itself"));
    }

    #[tokio::test]
    async fn later_provider_wins_key_collisions() {
        let mut registry = RenderingContextRegistry::new();
        registry.register(Arc::new(StaticProvider(vec![
            ("theme", json!("light")),
            ("lang", json!("en")),
        ])));
        registry.register(Arc::new(StaticProvider(vec![("theme", json!("dark"))])));

        let ctx = registry.build_context().await.unwrap();
        assert_eq!(ctx.get("theme"), Some(&json!("dark")));
        assert_eq!(ctx.get("lang"), Some(&json!("en")));
        assert_eq!(ctx.len(), 2);
    }

    #[tokio::test]
    async fn failing_provider_aborts_context_construction() {
        let mut registry = RenderingContextRegistry::new();
        registry.register(Arc::new(StaticProvider(vec![("theme", json!("light"))])));
        registry.register(Arc::new(FailingProvider));

        let err = registry.build_context().await.unwrap_err();
        assert!(matches!(err, PreviewError::ContextProviderFailure { .. }));
    }
}
