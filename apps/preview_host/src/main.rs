use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use clap::Parser;
use preview_runtime::{
    HttpBundleFetcher, PreviewDefinition, PreviewModel, PreviewModule, PreviewRuntime,
    RenderOutput, RenderingContext,
};
use serde_json::{json, Value};

#[derive(Parser, Debug)]
struct Args {
    /// Base URL of the bundle delivery server, e.g. http://localhost:3000
    #[arg(long)]
    server_url: String,
    /// Location to render, e.g. '#acme.scope/button@1.2.0?preview=overview'
    location: String,
}

/// Pass-through preview used when no framework-specific definition is wired:
/// renders the component's module payload as-is.
struct OverviewPreview;

#[async_trait]
impl PreviewDefinition for OverviewPreview {
    fn name(&self) -> &str {
        "overview"
    }

    fn is_default(&self) -> bool {
        true
    }

    async fn render(
        &self,
        component_full_name: &str,
        module: Arc<PreviewModule>,
        _includes: Vec<PreviewModel>,
        _ctx: &RenderingContext,
    ) -> Result<RenderOutput> {
        Ok(module
            .component(component_full_name)
            .cloned()
            .unwrap_or(Value::Null))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();
    let args = Args::parse();

    let runtime =
        PreviewRuntime::new_with_fetcher(Arc::new(HttpBundleFetcher::new(args.server_url)));
    runtime.register_preview(Arc::new(OverviewPreview)).await?;

    runtime.update_location(&args.location);
    let rendered = runtime.render().await?;

    println!(
        "{}",
        serde_json::to_string_pretty(&json!({
            "component": rendered.component,
            "preview_type": rendered.preview_type,
            "output": rendered.output,
        }))?
    );
    Ok(())
}
