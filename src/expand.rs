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
//! Typed access to configuration tree attributes.
//!
//! Every helper returns `None` when the attribute is absent, null or unknown, or when one of the
//! supplied [`Condition`]s does not hold. Explicit zero values (`false`, `0`, `""`) are returned
//! as `Some`, because the management API distinguishes an omitted field from a cleared one.

use std::collections::BTreeMap;

use crate::error::ProviderError;
use crate::schema::{Scope, Value};

/// Predicate deciding whether an attribute takes part in an expanded payload.
#[derive(Clone, Debug, PartialEq)]
pub enum Condition {
    /// The resource is being created.
    IsNewResource,
    /// The attribute differs between prior and desired state.
    HasChange,
    Not(Box<Condition>),
    /// At least one of the conditions holds.
    Any(Vec<Condition>),
}

impl Condition {
    #[allow(clippy::should_implement_trait)]
    pub fn not(condition: Condition) -> Self {
        Self::Not(Box::new(condition))
    }

    pub fn evaluate(&self, d: &Scope<'_>, path: &str) -> bool {
        match self {
            Self::IsNewResource => d.is_new_resource(),
            Self::HasChange => d.has_change(path),
            Self::Not(inner) => !inner.evaluate(d, path),
            Self::Any(conditions) => conditions.iter().any(|x| x.evaluate(d, path)),
        }
    }
}

fn gated<'a>(d: &Scope<'a>, path: &str, conditions: &[Condition]) -> Option<&'a Value> {
    if conditions.iter().all(|x| x.evaluate(d, path)) {
        d.get(path)
    } else {
        None
    }
}

pub fn string(d: &Scope<'_>, path: &str, conditions: &[Condition]) -> Option<String> {
    gated(d, path, conditions)
        .and_then(Value::as_str)
        .map(ToString::to_string)
}

pub fn bool(d: &Scope<'_>, path: &str, conditions: &[Condition]) -> Option<bool> {
    gated(d, path, conditions).and_then(Value::as_bool)
}

pub fn int(d: &Scope<'_>, path: &str, conditions: &[Condition]) -> Option<i64> {
    gated(d, path, conditions).and_then(Value::as_int)
}

pub fn float(d: &Scope<'_>, path: &str, conditions: &[Condition]) -> Option<f64> {
    gated(d, path, conditions).and_then(Value::as_float)
}

/// String elements of a list or set attribute.
pub fn string_list(d: &Scope<'_>, path: &str, conditions: &[Condition]) -> Option<Vec<String>> {
    gated(d, path, conditions).and_then(Value::as_list).map(|items| {
        items
            .iter()
            .filter_map(Value::as_str)
            .map(ToString::to_string)
            .collect()
    })
}

pub fn string_map(
    d: &Scope<'_>,
    path: &str,
    conditions: &[Condition],
) -> Option<BTreeMap<String, String>> {
    gated(d, path, conditions).and_then(Value::as_map).map(|entries| {
        entries
            .iter()
            .filter_map(|(k, v)| v.as_str().map(|v| (k.clone(), v.to_string())))
            .collect()
    })
}

/// String attribute holding a JSON object.
pub fn json_map(
    d: &Scope<'_>,
    path: &str,
    conditions: &[Condition],
) -> Result<Option<serde_json::Map<String, serde_json::Value>>, ProviderError> {
    match string(d, path, conditions) {
        Some(raw) if !raw.is_empty() => serde_json::from_str(&raw).map(Some).map_err(|err| {
            ProviderError::ValidationConflict(format!("`{path}` is not a valid JSON object: {err}"))
        }),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::schema::{Block, ResourceData, Schema};

    fn tree(value: serde_json::Value) -> Block {
        ResourceData::block_from_json(&value).unwrap()
    }

    fn existing(old: serde_json::Value, new: serde_json::Value) -> ResourceData {
        ResourceData::existing(Schema::new(), "id", tree(old), tree(new))
    }

    #[test]
    fn test_absent_is_none_zero_is_some() {
        let d = ResourceData::new_resource(
            Schema::new(),
            tree(json!({
                "flag": false,
                "count": 0,
                "ratio": 0.0,
                "name": "",
                "tags": [],
                "meta": {},
                "nothing": null
            })),
        );
        let s = d.scope();
        assert_eq!(Some(false), bool(&s, "flag", &[]));
        assert_eq!(Some(0), int(&s, "count", &[]));
        assert_eq!(Some(0.0), float(&s, "ratio", &[]));
        assert_eq!(Some(String::new()), string(&s, "name", &[]));
        assert_eq!(Some(Vec::new()), string_list(&s, "tags", &[]));
        assert_eq!(Some(BTreeMap::new()), string_map(&s, "meta", &[]));

        assert_eq!(None, bool(&s, "missing", &[]));
        assert_eq!(None, int(&s, "missing", &[]));
        assert_eq!(None, float(&s, "missing", &[]));
        assert_eq!(None, string(&s, "nothing", &[]));
        assert_eq!(None, string_list(&s, "missing", &[]));
        assert_eq!(None, string_map(&s, "missing", &[]));
    }

    #[test]
    fn test_unknown_is_none() {
        let mut new = Block::new();
        new.insert("flag".into(), Value::Unknown);
        let d = ResourceData::new_resource(Schema::new(), new);
        assert_eq!(None, bool(&d.scope(), "flag", &[]));
    }

    #[test]
    fn test_conditions() {
        let d = existing(
            json!({"name": "a", "flag": true, "secret": "s"}),
            json!({"name": "b", "flag": true, "secret": "s"}),
        );
        let s = d.scope();
        assert_eq!(
            Some("b".to_string()),
            string(&s, "name", &[Condition::HasChange])
        );
        assert_eq!(None, bool(&s, "flag", &[Condition::HasChange]));
        assert_eq!(
            Some(true),
            bool(&s, "flag", &[Condition::not(Condition::HasChange)])
        );
        assert_eq!(None, string(&s, "secret", &[Condition::IsNewResource]));
        assert_eq!(
            Some("s".to_string()),
            string(
                &s,
                "secret",
                &[Condition::Any(vec![
                    Condition::IsNewResource,
                    Condition::not(Condition::HasChange)
                ])]
            )
        );
        // All conditions must hold.
        assert_eq!(
            None,
            string(
                &s,
                "name",
                &[Condition::HasChange, Condition::IsNewResource]
            )
        );
    }

    #[test]
    fn test_false_predicate_hides_value() {
        let d = ResourceData::new_resource(
            Schema::new(),
            tree(json!({"flag": false, "tags": ["a"], "meta": {"k": "v"}})),
        );
        let s = d.scope();
        let never = [Condition::not(Condition::IsNewResource)];
        assert_eq!(None, bool(&s, "flag", &never));
        assert_eq!(None, string_list(&s, "tags", &never));
        assert_eq!(None, string_map(&s, "meta", &never));
        assert_eq!(
            Some(vec!["a".to_string()]),
            string_list(&s, "tags", &[Condition::IsNewResource])
        );
    }

    #[test]
    fn test_json_map() {
        let d = ResourceData::new_resource(
            Schema::new(),
            tree(json!({"good": "{\"a\": 1}", "empty": "", "bad": "{"})),
        );
        let s = d.scope();
        assert_eq!(
            Some(json!({"a": 1}).as_object().unwrap().clone()),
            json_map(&s, "good", &[]).unwrap()
        );
        assert_eq!(None, json_map(&s, "empty", &[]).unwrap());
        assert_eq!(None, json_map(&s, "missing", &[]).unwrap());
        assert!(matches!(
            json_map(&s, "bad", &[]),
            Err(ProviderError::ValidationConflict(_))
        ));
    }
}
