//! Preview resolution and rendering runtime.
//!
//! Resolves the current host location into a (preview type, component)
//! pair, loads the pairing's previously-built bundle exactly once, caches
//! it, composes any included preview types, and hands the result to the
//! preview type's render function.

use std::{collections::HashMap, sync::Arc};

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tokio::sync::{broadcast, watch, Mutex};
use tracing::{debug, info, warn};

pub mod fetcher;
pub mod loader;
pub mod location;
pub mod registry;
pub mod types;

pub use fetcher::{BundleFetcher, HttpBundleFetcher, MissingBundleFetcher};
pub use loader::ModuleLoader;
pub use location::{resolve_location, LocationState};
pub use registry::{PreviewRegistry, RenderingContextRegistry};
pub use shared::{
    domain::ComponentId, error::PreviewError, events::PreviewEvent, protocol::BundleManifest,
};
pub use types::{
    ComponentModule, PreviewModel, PreviewModule, RenderOutput, RenderedPreview, RenderingContext,
};

/// A named way of rendering a component (documentation, interactive
/// composition, app view).
#[async_trait]
pub trait PreviewDefinition: Send + Sync {
    /// Unique name within the registry.
    fn name(&self) -> &str;

    /// At most one registered definition should claim the default slot; when
    /// none does, the first-registered definition is the default.
    fn is_default(&self) -> bool {
        false
    }

    /// Ordered names of other preview types composed into this one's render
    /// call. Must not contain this definition's own name.
    fn includes(&self) -> Vec<String> {
        Vec::new()
    }

    /// Invoked exactly once per successful resolution.
    async fn render(
        &self,
        component_full_name: &str,
        module: Arc<PreviewModule>,
        includes: Vec<PreviewModel>,
        ctx: &RenderingContext,
    ) -> Result<RenderOutput>;

    /// Consulted only when this definition is referenced as an included
    /// dependency of another: extracts the sub-value the dependent render
    /// actually needs. `None` means this included type contributes nothing.
    fn select_preview_model(
        &self,
        _component_full_name: &str,
        _module: &PreviewModule,
    ) -> Option<PreviewModel> {
        None
    }
}

/// Contributes a named bag of values available to every preview render call.
#[async_trait]
pub trait RenderingContextProvider: Send + Sync {
    async fn context(&self) -> Result<HashMap<String, Value>>;
}

/// The render orchestrator. Owns both registries and the module loader for
/// the process's whole lifetime; constructed once at startup and driven by
/// host navigation callbacks.
pub struct PreviewRuntime {
    previews: Mutex<PreviewRegistry>,
    contexts: Mutex<RenderingContextRegistry>,
    loader: Arc<ModuleLoader>,
    location_tx: watch::Sender<String>,
    events: broadcast::Sender<PreviewEvent>,
}

impl PreviewRuntime {
    pub fn new() -> Arc<Self> {
        Self::new_with_fetcher(Arc::new(MissingBundleFetcher))
    }

    pub fn new_with_fetcher(fetcher: Arc<dyn BundleFetcher>) -> Arc<Self> {
        let (location_tx, _) = watch::channel(String::new());
        let (events, _) = broadcast::channel(256);
        Arc::new(Self {
            previews: Mutex::new(PreviewRegistry::new()),
            contexts: Mutex::new(RenderingContextRegistry::new()),
            loader: ModuleLoader::new(fetcher),
            location_tx,
            events,
        })
    }

    pub fn loader(&self) -> &Arc<ModuleLoader> {
        &self.loader
    }

    /// Registers a preview type. Expected to complete during startup, before
    /// the first render; registration during an in-flight render has
    /// undefined effect on that render.
    pub async fn register_preview(&self, definition: Arc<dyn PreviewDefinition>) -> Result<()> {
        debug!(preview_type = definition.name(), "registering preview type");
        self.previews.lock().await.register(definition)
    }

    /// Registers a rendering-context provider.
    pub async fn register_render_context(&self, provider: Arc<dyn RenderingContextProvider>) {
        self.contexts.lock().await.register(provider);
    }

    /// Startup pre-linking of modules the enclosing build already carries;
    /// pre-linked components render without any fetch.
    pub async fn link_modules(
        &self,
        preview_type: &str,
        main_module: Value,
        component_map: HashMap<String, Value>,
    ) {
        self.loader
            .link_modules(preview_type, main_module, component_map)
            .await;
    }

    /// Host navigation callback: records the latest observed location. The
    /// render loop always picks up the newest value; intermediate locations
    /// may be skipped entirely.
    pub fn update_location(&self, location: &str) {
        let _ = self.location_tx.send(location.to_string());
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<PreviewEvent> {
        self.events.subscribe()
    }

    /// Publishes an observed in-page click for external pub/sub consumers.
    pub fn publish_click(&self, event: Value) {
        let _ = self.events.send(PreviewEvent::ClickInsideFrame {
            timestamp: Utc::now(),
            event,
        });
    }

    /// Renders the current location once.
    pub async fn render(&self) -> Result<RenderedPreview, PreviewError> {
        let location = self.location_tx.borrow().clone();
        self.render_location(&location).await
    }

    async fn render_location(&self, location: &str) -> Result<RenderedPreview, PreviewError> {
        let LocationState {
            preview_type_name,
            component_id,
        } = resolve_location(location);

        let (definition, name) = {
            let previews = self.previews.lock().await;
            let name = match preview_type_name {
                Some(name) => name,
                None => previews
                    .default_definition()
                    .map(|definition| definition.name().to_string())
                    .unwrap_or_default(),
            };
            (previews.by_name(&name), name)
        };

        let (definition, component_id) = match (definition, component_id) {
            (Some(definition), Some(component_id)) => (definition, component_id),
            _ => return Err(PreviewError::not_found(name)),
        };

        let full_name = component_id.full_name();

        let mut includes = Vec::new();
        for included_name in definition.includes() {
            let included = { self.previews.lock().await.by_name(&included_name) };
            let Some(included) = included else {
                debug!(
                    preview_type = %included_name,
                    "included preview type not registered; contributes nothing"
                );
                continue;
            };
            let module = self.loader.load(&component_id, &included_name).await?;
            if let Some(model) = included.select_preview_model(&full_name, &module) {
                includes.push(model);
            }
        }

        let module = self.loader.load(&component_id, &name).await?;

        let contexts = { self.contexts.lock().await.clone() };
        let ctx = contexts.build_context().await?;

        info!(component = %full_name, preview_type = %name, "rendering preview");
        let output = definition
            .render(&full_name, module, includes, &ctx)
            .await
            .map_err(|err| PreviewError::RenderFunctionFailure {
                preview_type: name.clone(),
                message: err.to_string(),
            })?;

        Ok(RenderedPreview {
            component: full_name,
            preview_type: name,
            output,
        })
    }

    /// Serialized render loop: renders the newest observed location, then
    /// waits for the next navigation. A navigation arriving while a render
    /// is in progress is processed as a fresh render once the current one
    /// settles, so the latest location always wins and a stale render's
    /// output is never published after a fresher one.
    pub async fn run(self: Arc<Self>) {
        let mut location_rx = self.location_tx.subscribe();
        loop {
            let location = location_rx.borrow_and_update().clone();
            if !location.is_empty() {
                match self.render_location(&location).await {
                    Ok(rendered) => {
                        let _ = self.events.send(PreviewEvent::RenderCompleted {
                            location: location.clone(),
                            component: rendered.component,
                            preview_type: rendered.preview_type,
                            output: rendered.output,
                        });
                    }
                    Err(err) => {
                        warn!(%location, error = %err, "preview render failed");
                        let _ = self.events.send(PreviewEvent::RenderFailed {
                            location: location.clone(),
                            error: err.to_string(),
                        });
                    }
                }
            }
            if location_rx.changed().await.is_err() {
                break;
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
