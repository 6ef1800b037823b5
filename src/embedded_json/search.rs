//! Lookups over a JSON tree of unknown shape.

use serde_json::{Map, Value};
use std::collections::HashSet;

/// A set of keys that marks an object as a chart entry.
///
/// Keys are compared case-insensitively; an object matches when it carries
/// every key of the signature (extra keys are fine).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySignature {
    keys: Vec<String>,
}

impl KeySignature {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keys: keys
                .into_iter()
                .map(|k| k.as_ref().to_lowercase())
                .collect(),
        }
    }

    pub fn matches(&self, object: &Map<String, Value>) -> bool {
        let present: HashSet<String> = object.keys().map(|k| k.to_lowercase()).collect();
        self.keys.iter().all(|k| present.contains(k))
    }
}

/// Signatures seen on chart sites so far.
pub fn default_signatures() -> Vec<KeySignature> {
    vec![
        KeySignature::new(["title", "artist"]),
        KeySignature::new(["name", "artists"]),
        KeySignature::new(["track", "position"]),
    ]
}

/// Follows `path` through nested objects.
pub fn lookup_path<'a>(root: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(root, |node, key| node.as_object()?.get(*key))
}

/// Follows `path` and returns the list at its end, if it is a non-empty list.
pub fn lookup_list<'a>(root: &'a Value, path: &[&str]) -> Option<&'a [Value]> {
    lookup_path(root, path)?
        .as_array()
        .map(Vec::as_slice)
        .filter(|items| !items.is_empty())
}

/// Depth-first search for the first list containing an object accepted by
/// `is_entry`.
///
/// Object values are visited in document order and list elements in order;
/// an element is tested before the search descends into it. The first match
/// wins.
pub fn find_first_list<'a, P>(value: &'a Value, is_entry: &P) -> Option<&'a [Value]>
where
    P: Fn(&Map<String, Value>) -> bool,
{
    match value {
        Value::Object(map) => map.values().find_map(|v| find_first_list(v, is_entry)),
        Value::Array(items) => {
            for item in items {
                if let Value::Object(object) = item {
                    if is_entry(object) {
                        return Some(items.as_slice());
                    }
                }
                if let Some(found) = find_first_list(item, is_entry) {
                    return Some(found);
                }
            }
            None
        }
        _ => None,
    }
}
