use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid component id: {raw}")]
pub struct InvalidComponentId {
    pub raw: String,
}

/// Structured identity of a single component instance: `scope/name[@version]`.
///
/// The scope is a single dotted segment (`acme.scope`); the name may contain
/// further `/`-separated namespace segments (`ui/button`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ComponentId {
    scope: String,
    name: String,
    version: Option<String>,
}

fn is_id_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}

impl ComponentId {
    pub fn new(
        scope: impl Into<String>,
        name: impl Into<String>,
        version: Option<String>,
    ) -> Result<Self, InvalidComponentId> {
        let scope = scope.into();
        let name = name.into();
        let raw = match &version {
            Some(v) => format!("{scope}/{name}@{v}"),
            None => format!("{scope}/{name}"),
        };
        if !is_id_segment(&scope)
            || name.is_empty()
            || !name.split('/').all(is_id_segment)
            || version.as_deref().is_some_and(|v| v.is_empty() || v.contains('@'))
        {
            return Err(InvalidComponentId { raw });
        }
        Ok(Self {
            scope,
            name,
            version,
        })
    }

    pub fn parse(raw: &str) -> Result<Self, InvalidComponentId> {
        let invalid = || InvalidComponentId {
            raw: raw.to_string(),
        };
        let (id_part, version) = match raw.split_once('@') {
            Some((id, v)) => (id, Some(v.to_string())),
            None => (raw, None),
        };
        let (scope, name) = id_part.split_once('/').ok_or_else(invalid)?;
        Self::new(scope, name, version).map_err(|_| invalid())
    }

    /// Soft-failing parse used by the location resolver: malformed input is
    /// simply "no component identity", never an error.
    pub fn try_from_str(raw: &str) -> Option<Self> {
        Self::parse(raw).ok()
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// The version-stripped identity string, e.g. `acme.scope/button`.
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.scope, self.name)
    }

    pub fn to_string_without_version(&self) -> String {
        self.full_name()
    }

    /// Full name rendered safe for use as a bundle file stem: `/` becomes `_`.
    pub fn fs_compatible_without_version(&self) -> String {
        self.full_name().replace('/', "_")
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(version) => write!(f, "{}/{}@{}", self.scope, self.name, version),
            None => write!(f, "{}/{}", self.scope, self.name),
        }
    }
}
