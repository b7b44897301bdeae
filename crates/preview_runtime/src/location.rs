//! Resolution of the host location string into a preview request.

use shared::domain::ComponentId;
use url::form_urlencoded;

/// What the current location asks for. Derived, never stored: recomputed
/// from the location string on every navigation event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationState {
    pub preview_type_name: Option<String>,
    pub component_id: Option<ComponentId>,
}

/// Parses a location of the form `#<componentId>?preview=<previewType>`.
///
/// Everything before the first `#` is ignored, so both a bare fragment and a
/// full URL are accepted. Pure function of its input.
pub fn resolve_location(location: &str) -> LocationState {
    let without_hash = location
        .split_once('#')
        .map(|(_, rest)| rest)
        .unwrap_or("");
    let (before, after) = match without_hash.split_once('?') {
        Some((before, after)) => (before, after),
        None => (without_hash, ""),
    };

    let preview_type_name = form_urlencoded::parse(after.as_bytes())
        .find(|(key, _)| key == "preview")
        .map(|(_, value)| value.into_owned());

    LocationState {
        preview_type_name,
        component_id: ComponentId::try_from_str(before),
    }
}
