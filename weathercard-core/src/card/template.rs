//! Adaptive Card template expansion.
//!
//! Supports the subset the weather card uses:
//! - `${path}` placeholders inside strings, resolved against the current scope
//!   (`$root.` addresses the top-level data);
//! - `"$data": "${path}"` on an object, which rescopes it, or repeats it once
//!   per element when the binding is an array.
//!
//! Unknown placeholders are left as written.

use serde_json::{Map, Value};

const DATA_KEY: &str = "$data";
const ROOT_PREFIX: &str = "$root";

pub struct Template<'a> {
    root: &'a Value,
}

impl<'a> Template<'a> {
    pub fn new(root: &'a Value) -> Self {
        Self { root }
    }

    /// Expand `node` against the root data.
    pub fn expand(&self, node: &Value) -> Value {
        self.expand_value(node, self.root)
    }

    fn expand_value(&self, node: &Value, scope: &Value) -> Value {
        match node {
            Value::String(text) => Value::String(self.substitute(text, scope)),
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .flat_map(|item| self.expand_item(item, scope))
                    .collect(),
            ),
            Value::Object(map) if map.contains_key(DATA_KEY) => {
                let mut copies = self.expand_item(node, scope);
                if copies.len() == 1 {
                    copies.remove(0)
                } else {
                    Value::Array(copies)
                }
            }
            Value::Object(map) => Value::Object(self.expand_object(map, scope)),
            other => other.clone(),
        }
    }

    /// Expand an array member; a `$data` array turns one member into many.
    fn expand_item(&self, node: &Value, scope: &Value) -> Vec<Value> {
        let Value::Object(map) = node else {
            return vec![self.expand_value(node, scope)];
        };
        let Some(binding) = map.get(DATA_KEY) else {
            return vec![Value::Object(self.expand_object(map, scope))];
        };

        match self.resolve_binding(binding, scope) {
            Some(Value::Array(elements)) => elements
                .iter()
                .map(|element| Value::Object(self.expand_object(map, element)))
                .collect(),
            Some(data) => vec![Value::Object(self.expand_object(map, data))],
            None => {
                tracing::debug!(?binding, "unresolved $data binding, dropping element");
                Vec::new()
            }
        }
    }

    fn expand_object(&self, map: &Map<String, Value>, scope: &Value) -> Map<String, Value> {
        map.iter()
            .filter(|(key, _)| key.as_str() != DATA_KEY)
            .map(|(key, value)| (key.clone(), self.expand_value(value, scope)))
            .collect()
    }

    fn resolve_binding<'b>(&'b self, binding: &'b Value, scope: &'b Value) -> Option<&'b Value> {
        match binding {
            Value::String(text) => {
                let path = text.strip_prefix("${")?.strip_suffix('}')?;
                self.lookup(path.trim(), scope)
            }
            Value::Array(_) | Value::Object(_) => Some(binding),
            _ => None,
        }
    }

    fn lookup<'b>(&'b self, path: &str, scope: &'b Value) -> Option<&'b Value> {
        let (mut current, rest) = match path.strip_prefix(ROOT_PREFIX) {
            Some(rest) => (self.root, rest.strip_prefix('.').unwrap_or(rest)),
            None => (scope, path),
        };

        for segment in rest.split('.').filter(|s| !s.is_empty()) {
            current = match current {
                Value::Object(map) => map.get(segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    fn substitute(&self, text: &str, scope: &Value) -> String {
        let mut out = String::with_capacity(text.len());
        let mut rest = text;

        while let Some(start) = rest.find("${") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];

            let Some(end) = after.find('}') else {
                out.push_str(&rest[start..]);
                return out;
            };

            let placeholder = &rest[start..start + 2 + end + 1];
            match self.lookup(after[..end].trim(), scope).and_then(display) {
                Some(value) => out.push_str(&value),
                None => out.push_str(placeholder),
            }
            rest = &after[end + 1..];
        }

        out.push_str(rest);
        out
    }
}

fn display(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => Some(String::new()),
        Value::Array(_) | Value::Object(_) => None,
    }
}
