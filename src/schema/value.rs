// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeMap;

use super::path::{AttributePath, PathStep};

/// Attributes of one block, keyed by attribute name.
pub type Block = BTreeMap<String, Value>;

/// Node of the configuration tree.
///
/// An attribute missing from its [`Block`] is absent. `Null` is an explicit null and `Unknown`
/// is a value that is not resolved yet; neither of them counts as set.
#[derive(Clone, Debug)]
pub enum Value {
    Null,
    Unknown,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Set(Vec<Value>),
    Map(BTreeMap<String, Value>),
    Block(Block),
}

impl Value {
    /// Whether the value is present and resolved.
    pub fn is_known(&self) -> bool {
        !matches!(self, Value::Null | Value::Unknown)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Unknown => "unknown",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Set(_) => "set",
            Value::Map(_) => "map",
            Value::Block(_) => "block",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(val) => Some(val),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(val) => Some(*val),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(val) => Some(*val),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(val) => Some(*val),
            Value::Int(val) => Some(*val as f64),
            _ => None,
        }
    }

    /// Elements of a list or a set.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) | Value::Set(items) => Some(items),
            _ => None,
        }
    }

    /// Entries of a map or of a single block.
    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(entries) | Value::Block(entries) => Some(entries),
            _ => None,
        }
    }

    /// Stable textual identity of the value, used to key set members.
    pub fn key(&self) -> String {
        match self {
            Value::String(val) => val.clone(),
            Value::Int(val) => val.to_string(),
            Value::Bool(val) => val.to_string(),
            Value::Float(val) => val.to_string(),
            other => format!("{:?}", other),
        }
    }

    pub(crate) fn lookup<'a>(root: &'a Block, path: &AttributePath) -> Option<&'a Value> {
        let mut steps = path.steps().iter();
        let mut current = match steps.next()? {
            PathStep::Attr(name) => root.get(name)?,
            PathStep::Index(_) => return None,
        };
        for step in steps {
            current = match (step, current) {
                (PathStep::Attr(name), Value::Block(entries) | Value::Map(entries)) => {
                    entries.get(name)?
                }
                (PathStep::Index(idx), Value::List(items) | Value::Set(items)) => items.get(*idx)?,
                _ => return None,
            };
        }
        Some(current)
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null | Value::Unknown => serde_json::Value::Null,
            Value::Bool(val) => (*val).into(),
            Value::Int(val) => (*val).into(),
            Value::Float(val) => (*val).into(),
            Value::String(val) => val.clone().into(),
            Value::List(items) | Value::Set(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Map(entries) | Value::Block(entries) => serde_json::Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

/// Sets compare as unordered collections, everything else structurally.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) | (Value::Unknown, Value::Unknown) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => {
                (*a as f64) == *b
            }
            (Value::String(a), Value::String(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Set(a), Value::Set(b)) | (Value::Set(a), Value::List(b)) | (Value::List(a), Value::Set(b)) => {
                a.len() == b.len() && a.iter().all(|x| b.contains(x)) && b.iter().all(|x| a.contains(x))
            }
            (Value::Map(a) | Value::Block(a), Value::Map(b) | Value::Block(b)) => a == b,
            _ => false,
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&String> for Value {
    fn from(value: &String) -> Self {
        Value::String(value.clone())
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value.into())
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<Vec<String>> for Value {
    fn from(value: Vec<String>) -> Self {
        Value::List(value.into_iter().map(Value::String).collect())
    }
}

impl From<BTreeMap<String, String>> for Value {
    fn from(value: BTreeMap<String, String>) -> Self {
        Value::Map(
            value
                .into_iter()
                .map(|(k, v)| (k, Value::String(v)))
                .collect(),
        )
    }
}

impl From<Block> for Value {
    fn from(value: Block) -> Self {
        Value::Block(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

impl From<&serde_json::Value> for Value {
    fn from(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(val) => Value::Bool(*val),
            serde_json::Value::Number(num) => num
                .as_i64()
                .map(Value::Int)
                .or_else(|| num.as_f64().map(Value::Float))
                .unwrap_or(Value::Null),
            serde_json::Value::String(val) => Value::String(val.clone()),
            serde_json::Value::Array(items) => Value::List(items.iter().map(Into::into).collect()),
            serde_json::Value::Object(entries) => Value::Block(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.into()))
                    .collect(),
            ),
        }
    }
}

/// Build a block from attribute/value pairs.
pub fn block<const N: usize>(items: [(&str, Value); N]) -> Block {
    items
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

/// Wrap an optional group into the list-of-one representation used by the tree.
pub fn nested(value: Option<Block>) -> Value {
    Value::List(value.map(Value::Block).into_iter().collect())
}

/// Accumulates the attributes of a flattened block, skipping the ones the API did not return.
#[derive(Clone, Debug, Default)]
pub struct BlockBuilder(Block);

impl BlockBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put<V: Into<Value>>(mut self, key: &str, value: Option<V>) -> Self {
        if let Some(value) = value {
            self.0.insert(key.to_string(), value.into());
        }
        self
    }

    /// Store an optional group in its list-of-one form.
    pub fn group(mut self, key: &str, value: Option<Block>) -> Self {
        if let Some(value) = value {
            self.0.insert(key.to_string(), nested(Some(value)));
        }
        self
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn build(self) -> Block {
        self.0
    }
}

impl From<Block> for BlockBuilder {
    fn from(value: Block) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_set_equality() {
        let a = Value::Set(vec!["a".into(), "b".into()]);
        let b = Value::Set(vec!["b".into(), "a".into()]);
        assert_eq!(a, b);
        assert_ne!(
            Value::List(vec!["a".into(), "b".into()]),
            Value::List(vec!["b".into(), "a".into()])
        );
        assert_ne!(a, Value::Set(vec!["a".into()]));
    }

    #[test]
    fn test_lookup() {
        let root = match Value::from(&json!({
            "options": [{"validation": [{"username": [{"min": 3}]}]}],
            "metadata": {"foo": "bar"}
        })) {
            Value::Block(root) => root,
            _ => panic!("not a block"),
        };
        assert_eq!(
            Some(&Value::Int(3)),
            Value::lookup(&root, &"options.0.validation.0.username.0.min".into())
        );
        assert_eq!(
            Some(&Value::String("bar".into())),
            Value::lookup(&root, &"metadata.foo".into())
        );
        assert_eq!(None, Value::lookup(&root, &"options.1".into()));
        assert_eq!(None, Value::lookup(&root, &"options.0.missing".into()));
    }

    #[test]
    fn test_known() {
        assert!(!Value::Null.is_known());
        assert!(!Value::Unknown.is_known());
        assert!(Value::Bool(false).is_known());
        assert_eq!(Value::Null, Value::from(None::<String>));
    }

    #[test]
    fn test_block_builder() {
        let res = BlockBuilder::new()
            .put("name", Some("foo"))
            .put("enabled", None::<bool>)
            .put("count", Some(0))
            .group("totp", Some(block([("length", 6.into())])))
            .group("mfa", None)
            .build();
        assert_eq!(
            block([
                ("name", "foo".into()),
                ("count", 0.into()),
                (
                    "totp",
                    Value::List(vec![block([("length", 6.into())]).into()])
                ),
            ]),
            res
        );
    }
}
