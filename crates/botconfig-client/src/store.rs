//! Cache of configuration documents pushed by the server.
//!
//! Documents are keyed by guild id, or by [`WILDCARD_KEY`] for the base
//! configuration. Each document has the shape `{id, data}` and is replaced
//! wholesale on every update.
//!
//! Dotted lookups (`"42.prefix.value"`) pick the document with the first
//! segment and walk the rest inside its `data` member. Numeric segments
//! index into arrays.

use std::collections::HashMap;

use serde_json::Value;

use crate::errors::ConfigError;

/// Key of the base configuration shared by every guild.
pub const WILDCARD_KEY: &str = "*";

/// What to do when a dotted lookup finds nothing.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LookupOptions {
    /// Value returned on a miss. Takes precedence over `fail_on_miss`.
    pub fallback: Option<Value>,
    /// Return [`ConfigError::MissingConfigKey`] on a miss without fallback.
    pub fail_on_miss: bool,
}

impl LookupOptions {
    /// Return `value` on a miss.
    pub fn with_fallback(value: impl Into<Value>) -> Self {
        Self {
            fallback: Some(value.into()),
            fail_on_miss: false,
        }
    }

    /// Fail on a miss.
    pub fn strict() -> Self {
        Self {
            fallback: None,
            fail_on_miss: true,
        }
    }
}

/// In-memory document cache.
#[derive(Debug, Default)]
pub struct ConfigStore {
    documents: HashMap<String, Value>,
}

impl ConfigStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the document stored under `id`.
    pub fn get(&self, id: &str) -> Option<Value> {
        self.documents.get(id).cloned()
    }

    /// Store `document` under `id`, returning the previous one.
    pub fn replace(&mut self, id: impl Into<String>, document: Value) -> Option<Value> {
        self.documents.insert(id.into(), document)
    }

    /// Replace every entry present in `documents`, keeping the others.
    pub fn load(&mut self, documents: impl IntoIterator<Item = (String, Value)>) -> usize {
        let mut count = 0;
        for (id, document) in documents {
            let _ = self.documents.insert(id, document);
            count += 1;
        }
        count
    }

    /// Number of cached documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Whether nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Sorted ids of cached documents.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.documents.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Resolve a dotted path.
    pub fn get_path(
        &self,
        path: &str,
        options: &LookupOptions,
    ) -> Result<Option<Value>, ConfigError> {
        let segments: Vec<&str> = path.split('.').collect();
        let Some((&head, rest)) = segments.split_first() else {
            return Err(ConfigError::InvalidArgument("path must not be empty".into()));
        };
        if head.is_empty() {
            return Err(ConfigError::InvalidArgument(format!(
                "path '{path}' must start with a document id"
            )));
        }

        let found = self
            .documents
            .get(head)
            .and_then(|document| resolve(document, rest));

        match (found, &options.fallback) {
            (Some(value), _) => Ok(Some(value.clone())),
            (None, Some(fallback)) => Ok(Some(fallback.clone())),
            (None, None) if options.fail_on_miss => Err(ConfigError::MissingConfigKey {
                path: path.to_owned(),
            }),
            (None, None) => Ok(None),
        }
    }
}

fn resolve<'a>(document: &'a Value, segments: &[&str]) -> Option<&'a Value> {
    if segments.is_empty() {
        return Some(document);
    }
    segments
        .iter()
        .try_fold(document.get("data")?, |current, segment| match current {
            Value::Object(map) => map.get(*segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
}
