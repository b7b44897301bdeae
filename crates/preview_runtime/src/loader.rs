//! Lazy, cache-sensitive loading of preview bundles.

use std::{collections::HashMap, sync::Arc};

use futures::{
    future::{BoxFuture, Shared},
    FutureExt,
};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use shared::{domain::ComponentId, error::PreviewError};

use crate::{fetcher::BundleFetcher, types::PreviewModule};

type LoadResult = Result<Arc<PreviewModule>, PreviewError>;
type SharedLoad = Shared<BoxFuture<'static, LoadResult>>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ModuleCacheKey {
    preview_type: String,
    full_name: String,
}

/// Resolves the executable module for a (component, preview type) pairing.
///
/// Entries live for the whole process; a failed load never populates the
/// cache and is retried on the next request. Concurrent requests for the
/// same pairing share one in-flight fetch.
pub struct ModuleLoader {
    fetcher: Arc<dyn BundleFetcher>,
    inner: Mutex<LoaderState>,
}

#[derive(Default)]
struct LoaderState {
    /// Per-preview-type main modules registered via [`ModuleLoader::link_modules`].
    main_modules: HashMap<String, Value>,
    /// The linked-module table: versionless component id to the preview-type
    /// modules a loaded bundle registered for it.
    linked: HashMap<String, HashMap<String, Value>>,
    cache: HashMap<ModuleCacheKey, Arc<PreviewModule>>,
    inflight: HashMap<ModuleCacheKey, SharedLoad>,
}

impl ModuleLoader {
    pub fn new(fetcher: Arc<dyn BundleFetcher>) -> Arc<Self> {
        Arc::new(Self {
            fetcher,
            inner: Mutex::new(LoaderState::default()),
        })
    }

    /// Deterministic bundle URL for a component/preview-type pairing.
    pub fn bundle_url(id: &ComponentId) -> String {
        format!(
            "/api/{id}/~aspect/component-preview/{}-preview.js",
            id.fs_compatible_without_version()
        )
    }

    /// Startup pre-linking: records a preview type's main module and seeds
    /// cache entries for every component the enclosing build already carries.
    /// Pre-linked components render without any fetch.
    pub async fn link_modules(
        &self,
        preview_type: &str,
        main_module: Value,
        component_map: HashMap<String, Value>,
    ) {
        let mut state = self.inner.lock().await;
        state
            .main_modules
            .insert(preview_type.to_string(), main_module.clone());
        for (full_name, module) in component_map {
            let key = ModuleCacheKey {
                preview_type: preview_type.to_string(),
                full_name: full_name.clone(),
            };
            state.cache.insert(
                key,
                Arc::new(PreviewModule {
                    main_module: Some(main_module.clone()),
                    component_map: HashMap::from([(full_name, module)]),
                }),
            );
        }
    }

    /// Returns the module for the pairing, fetching its bundle at most once.
    pub async fn load(self: &Arc<Self>, id: &ComponentId, preview_type: &str) -> LoadResult {
        let key = ModuleCacheKey {
            preview_type: preview_type.to_string(),
            full_name: id.full_name(),
        };

        let pending = {
            let mut state = self.inner.lock().await;
            if let Some(entry) = state.cache.get(&key) {
                if entry.component_map.contains_key(&key.full_name) {
                    return Ok(Arc::clone(entry));
                }
            }
            match state.inflight.get(&key) {
                Some(pending) => pending.clone(),
                None => {
                    let pending = Self::fetch_and_cache(Arc::clone(self), id.clone(), key.clone())
                        .boxed()
                        .shared();
                    state.inflight.insert(key, pending.clone());
                    pending
                }
            }
        };

        pending.await
    }

    async fn fetch_and_cache(loader: Arc<Self>, id: ComponentId, key: ModuleCacheKey) -> LoadResult {
        let result = loader.resolve_bundle(&id, &key).await;

        let mut state = loader.inner.lock().await;
        state.inflight.remove(&key);
        match result {
            Ok(module) => {
                let module = Arc::new(module);
                state.cache.insert(key, Arc::clone(&module));
                Ok(module)
            }
            Err(err) => Err(err),
        }
    }

    async fn resolve_bundle(
        &self,
        id: &ComponentId,
        key: &ModuleCacheKey,
    ) -> Result<PreviewModule, PreviewError> {
        let url = Self::bundle_url(id);
        debug!(component = %id, preview_type = %key.preview_type, %url, "fetching preview bundle");

        let manifest = self.fetcher.fetch(&url).await.map_err(|err| {
            warn!(component = %id, preview_type = %key.preview_type, error = %err, "preview bundle fetch failed");
            PreviewError::not_found(&key.preview_type)
        })?;

        let slot = id.to_string_without_version();
        let mut state = self.inner.lock().await;
        for (component, modules) in manifest.components {
            state.linked.entry(component).or_default().extend(modules);
        }

        let module = state
            .linked
            .get(&slot)
            .and_then(|registered| registered.get(&key.preview_type))
            .cloned()
            .ok_or_else(|| {
                warn!(component = %id, preview_type = %key.preview_type, "loaded bundle did not register the requested preview module");
                PreviewError::not_found(&key.preview_type)
            })?;

        Ok(PreviewModule {
            main_module: state.main_modules.get(&key.preview_type).cloned(),
            component_map: HashMap::from([(key.full_name.clone(), module)]),
        })
    }
}
