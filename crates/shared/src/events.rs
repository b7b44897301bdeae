use chrono::{DateTime, Utc};
use serde_json::Value;

/// Events broadcast by the preview runtime to whatever host displays the
/// preview.
#[derive(Debug, Clone)]
pub enum PreviewEvent {
    RenderCompleted {
        location: String,
        component: String,
        preview_type: String,
        output: Value,
    },
    RenderFailed {
        location: String,
        error: String,
    },
    /// Instrumentation: an in-page click observed by the host, republished
    /// for external pub/sub consumers.
    ClickInsideFrame {
        timestamp: DateTime<Utc>,
        event: Value,
    },
}
