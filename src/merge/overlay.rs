//! Overlay merge: file contents layered on top of the default value.

use super::{ConfigMerge, Format};
use crate::core::Validate;
use crate::error::MergeError;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Merges a configuration document onto a default value.
///
/// The defaults are serialized to a document tree and the parsed file is laid
/// over it:
/// - mappings merge key by key, recursively
/// - scalars and lists from the file replace the default
/// - an explicit `null` in the file keeps the default
/// - lists under a *union key* are added to the default list instead of
///   replacing it (sorted and de-duplicated when they hold strings)
///
/// The merged tree is deserialized back into `T` and validated. An empty file
/// yields the defaults.
///
/// # Examples
///
/// ```rust
/// use meshconfig_cache::merge::{ConfigMerge, Format, OverlayMerge};
/// use meshconfig_cache::mesh::MeshConfig;
///
/// let merge = OverlayMerge::new(Format::Yaml).with_union_key("trustDomainAliases");
/// let merged: MeshConfig = merge
///     .merge(b"ingressClass: nginx\n", &MeshConfig::default())
///     .unwrap();
/// assert_eq!(merged.ingress_class, "nginx");
/// ```
#[derive(Debug, Clone, Default)]
pub struct OverlayMerge {
    format: Format,
    union_keys: Vec<String>,
}

impl OverlayMerge {
    /// Create a merge reading files in the given format.
    pub fn new(format: Format) -> Self {
        Self {
            format,
            union_keys: Vec::new(),
        }
    }

    /// Treat lists stored under `key` (at any depth) as sets to extend.
    pub fn with_union_key(mut self, key: impl Into<String>) -> Self {
        self.union_keys.push(key.into());
        self
    }

    /// The format this merge parses.
    pub fn format(&self) -> Format {
        self.format
    }

    fn overlay(&self, base: &mut Value, overlay: Value) {
        match (base, overlay) {
            (_, Value::Null) => {}
            (Value::Object(base_map), Value::Object(overlay_map)) => {
                self.overlay_map(base_map, overlay_map)
            }
            (base, overlay) => *base = overlay,
        }
    }

    fn overlay_map(&self, base: &mut Map<String, Value>, overlay: Map<String, Value>) {
        for (key, value) in overlay {
            if value.is_null() {
                continue;
            }
            let union = self.is_union_key(&key);
            match base.get_mut(&key) {
                Some(Value::Array(existing)) if union && value.is_array() => {
                    if let Value::Array(incoming) = value {
                        union_into(existing, incoming);
                    }
                }
                Some(existing) => self.overlay(existing, value),
                None => {
                    base.insert(key, value);
                }
            }
        }
    }

    fn is_union_key(&self, key: &str) -> bool {
        self.union_keys.iter().any(|k| k == key)
    }
}

fn union_into(existing: &mut Vec<Value>, incoming: Vec<Value>) {
    for value in incoming {
        if !existing.contains(&value) {
            existing.push(value);
        }
    }
    if existing.iter().all(Value::is_string) {
        existing.sort_by(|a, b| a.as_str().cmp(&b.as_str()));
    }
}

impl<T> ConfigMerge<T> for OverlayMerge
where
    T: Serialize + DeserializeOwned + Validate,
{
    fn merge(&self, raw: &[u8], defaults: &T) -> Result<T, MergeError> {
        let overlay = self.format.parse(raw)?;
        if !(overlay.is_object() || overlay.is_null()) {
            return Err(MergeError::ParseError(
                "configuration document must be a mapping".to_string(),
            ));
        }

        let mut merged = serde_json::to_value(defaults).map_err(|e| {
            MergeError::DeserializationError(format!("Failed to serialize defaults: {}", e))
        })?;
        self.overlay(&mut merged, overlay);

        let config: T = serde_json::from_value(merged)
            .map_err(|e| MergeError::DeserializationError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}
