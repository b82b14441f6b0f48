//! Defaults registry: built-in and custom attribute names per type.
//!
//! # Invariants
//! - First registration of a type name wins; later ones are ignored.
//! - `HOLDER_SENTINEL` and blank names are never accepted as custom types.
//! - A malformed registration leaves the registry untouched.
//! - Effective lists contain no duplicates and keep first-seen order.

use log::{info, warn};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Name reserved for the default parent container.
pub const HOLDER_SENTINEL: &str = "Holder";

const BUILTIN_DEFAULTS: &[(&str, &[&str])] = &[
    ("Blog", &["Author"]),
    ("Event", &["Start Time", "End Time", "Location"]),
    ("News", &["Author"]),
    ("Publication", &["Author"]),
];

/// Attribute name lists keyed by content type title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultsRegistry {
    builtin: BTreeMap<String, Vec<String>>,
    custom: BTreeMap<String, Vec<String>>,
}

impl Default for DefaultsRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl DefaultsRegistry {
    /// Registry holding only the built-in types.
    pub fn with_builtins() -> Self {
        let builtin = BUILTIN_DEFAULTS
            .iter()
            .map(|(name, attributes)| {
                (
                    (*name).to_string(),
                    attributes.iter().map(|value| (*value).to_string()).collect(),
                )
            })
            .collect();
        Self {
            builtin,
            custom: BTreeMap::new(),
        }
    }

    /// Registry with no types at all.
    pub fn empty() -> Self {
        Self {
            builtin: BTreeMap::new(),
            custom: BTreeMap::new(),
        }
    }

    /// Merges typed `(type, attribute names)` registrations.
    ///
    /// Returns the type names accepted by this call, in input order.
    pub fn register<I, K, V>(&mut self, entries: I) -> Vec<String>
    where
        I: IntoIterator<Item = (K, Vec<V>)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut accepted: Vec<(String, Vec<String>)> = Vec::new();
        for (name, attributes) in entries {
            let name = name.into().trim().to_string();
            if name.is_empty() || name == HOLDER_SENTINEL {
                continue;
            }
            if self.custom.contains_key(&name) || accepted.iter().any(|(seen, _)| *seen == name) {
                continue;
            }
            accepted.push((name, attributes.into_iter().map(Into::into).collect()));
        }

        let names: Vec<String> = accepted.iter().map(|(name, _)| name.clone()).collect();
        self.custom.extend(accepted);
        if !names.is_empty() {
            info!(
                "event=defaults_register module=defaults status=ok accepted={}",
                names.len()
            );
        }
        names
    }

    /// Merges a loosely-typed registration.
    ///
    /// `input` must be an object mapping type names to arrays of strings.
    /// Anything else rejects the whole call and returns an empty list.
    pub fn register_value(&mut self, input: &Value) -> Vec<String> {
        match parse_registration(input) {
            Some(entries) => self.register(entries),
            None => {
                warn!("event=defaults_register module=defaults status=skip reason=malformed_input");
                Vec::new()
            }
        }
    }

    /// Built-in names followed by custom names, duplicates removed.
    pub fn effective_defaults(&self, type_name: &str) -> Vec<String> {
        let mut seen: BTreeSet<&String> = BTreeSet::new();
        self.builtin
            .get(type_name)
            .into_iter()
            .chain(self.custom.get(type_name))
            .flatten()
            .filter(|name| seen.insert(*name))
            .cloned()
            .collect()
    }

    /// Every known type name, sorted.
    pub fn type_names(&self) -> Vec<String> {
        self.builtin
            .keys()
            .chain(self.custom.keys())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn contains_type(&self, type_name: &str) -> bool {
        self.builtin.contains_key(type_name) || self.custom.contains_key(type_name)
    }

    /// Full effective table, one entry per known type.
    pub fn snapshot(&self) -> BTreeMap<String, Vec<String>> {
        self.type_names()
            .into_iter()
            .map(|name| {
                let attributes = self.effective_defaults(&name);
                (name, attributes)
            })
            .collect()
    }
}

fn parse_registration(input: &Value) -> Option<Vec<(String, Vec<String>)>> {
    let object = input.as_object()?;
    let mut entries = Vec::with_capacity(object.len());
    for (name, attributes) in object {
        let names = attributes
            .as_array()?
            .iter()
            .map(|value| value.as_str().map(str::to_string))
            .collect::<Option<Vec<_>>>()?;
        entries.push((name.clone(), names));
    }
    Some(entries)
}
