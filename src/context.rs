use serde_json::{Map, Value};
use std::fmt;

use crate::defines::Defines;

/// Nested lookup tree built from flat dotted defines.
/// `"device.isMobile" = true` becomes `{"device": {"isMobile": true}}`.
///
/// Built once per preprocessing call and read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Context {
    root: Map<String, Value>,
}

impl Context {
    /// Build the tree. Entries are applied in insertion order; when one key
    /// uses a prefix as a leaf and another as a mapping, the later one wins.
    /// Empty segments (`"a..b"`) are kept as empty-string keys.
    pub fn build(defines: &Defines) -> Self {
        let mut root = Map::new();
        for (key, value) in defines.iter() {
            let segments: Vec<&str> = key.split('.').collect();
            set_deep(&mut root, &segments, value.to_value());
        }
        Self { root }
    }

    /// Descend the tree along `path`. `None` if a segment is missing or a
    /// leaf is reached before the path ends.
    pub fn resolve<S: AsRef<str>>(&self, path: &[S]) -> Option<&Value> {
        let (first, rest) = path.split_first()?;
        let mut node = self.root.get(first.as_ref())?;
        for seg in rest {
            node = match node {
                Value::Object(m) => m.get(seg.as_ref())?,
                _ => return None,
            };
        }
        Some(node)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.root
    }
}

fn set_deep(root: &mut Map<String, Value>, segments: &[&str], value: Value) {
    let Some((last, parents)) = segments.split_last() else {
        return;
    };
    let mut current = root;
    for seg in parents {
        let slot = current.entry(seg.to_string()).or_insert(Value::Null);
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        let Value::Object(next) = slot else {
            return;
        };
        current = next;
    }
    current.insert(last.to_string(), value);
}

/// Renders the tree as compact JSON, used in evaluation error messages.
impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(&self.root) {
            Ok(s) => f.write_str(&s),
            Err(_) => Err(fmt::Error),
        }
    }
}
