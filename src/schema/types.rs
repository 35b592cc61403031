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

use super::error::SchemaError;
use super::value::{Block, Value};

/// Declared type of an attribute.
#[derive(Clone, Debug, PartialEq)]
pub enum AttributeType {
    String,
    Bool,
    Int,
    Float,
    List(Box<AttributeType>),
    Set(Box<AttributeType>),
    /// Map of string to string.
    Map,
    /// Repeated block (also used for the 0..1 optional group).
    Block(Schema),
    /// Unordered blocks identified by the `key` attribute.
    BlockSet { schema: Schema, key: &'static str },
}

impl AttributeType {
    pub fn string_list() -> Self {
        Self::List(Box::new(Self::String))
    }

    pub fn string_set() -> Self {
        Self::Set(Box::new(Self::String))
    }

    fn name(&self) -> String {
        match self {
            Self::String => "string".into(),
            Self::Bool => "bool".into(),
            Self::Int => "int".into(),
            Self::Float => "float".into(),
            Self::List(elem) => format!("list of {}", elem.name()),
            Self::Set(elem) => format!("set of {}", elem.name()),
            Self::Map => "map of string".into(),
            Self::Block(_) => "list of blocks".into(),
            Self::BlockSet { .. } => "set of blocks".into(),
        }
    }

    /// Reshape `value` into the declared collection kind. Lists stored under set attributes
    /// become [`Value::Set`], which compares without regard to order.
    fn normalize(&self, value: Value) -> Value {
        match (self, value) {
            (Self::List(elem), Value::List(items)) => {
                Value::List(items.into_iter().map(|x| elem.normalize(x)).collect())
            }
            (Self::Set(elem), Value::List(items) | Value::Set(items)) => {
                Value::Set(items.into_iter().map(|x| elem.normalize(x)).collect())
            }
            (Self::Block(schema), Value::List(items)) => {
                Value::List(items.into_iter().map(|x| schema.normalize_value(x)).collect())
            }
            (Self::BlockSet { schema, .. }, Value::List(items) | Value::Set(items)) => {
                Value::Set(items.into_iter().map(|x| schema.normalize_value(x)).collect())
            }
            (_, other) => other,
        }
    }

    fn check(&self, attribute: &str, value: &Value) -> Result<(), SchemaError> {
        let mismatch = || SchemaError::TypeMismatch {
            attribute: attribute.to_string(),
            expected: self.name(),
            found: value.type_name().into(),
        };
        if !value.is_known() {
            return Ok(());
        }
        match self {
            Self::String => value.as_str().map(|_| ()).ok_or_else(mismatch),
            Self::Bool => value.as_bool().map(|_| ()).ok_or_else(mismatch),
            Self::Int => value.as_int().map(|_| ()).ok_or_else(mismatch),
            Self::Float => value.as_float().map(|_| ()).ok_or_else(mismatch),
            Self::List(elem) | Self::Set(elem) => {
                let items = value.as_list().ok_or_else(mismatch)?;
                for (idx, item) in items.iter().enumerate() {
                    elem.check(&format!("{attribute}.{idx}"), item)?;
                }
                Ok(())
            }
            Self::Map => {
                let entries = value.as_map().ok_or_else(mismatch)?;
                for (key, item) in entries {
                    Self::String.check(&format!("{attribute}.{key}"), item)?;
                }
                Ok(())
            }
            Self::Block(schema) | Self::BlockSet { schema, .. } => {
                let items = value.as_list().ok_or_else(mismatch)?;
                for (idx, item) in items.iter().enumerate() {
                    match item {
                        Value::Block(entries) => {
                            schema.check_block(&format!("{attribute}.{idx}"), entries)?
                        }
                        other => {
                            return Err(SchemaError::TypeMismatch {
                                attribute: format!("{attribute}.{idx}"),
                                expected: "block".into(),
                                found: other.type_name().into(),
                            });
                        }
                    }
                }
                Ok(())
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Attribute {
    pub ty: AttributeType,
    /// Changing the attribute replaces the resource instead of updating it.
    pub force_new: bool,
}

/// Static description of the attributes of a resource (or of a nested block).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Schema {
    attributes: BTreeMap<&'static str, Attribute>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attribute(mut self, name: &'static str, ty: AttributeType) -> Self {
        self.attributes.insert(
            name,
            Attribute {
                ty,
                force_new: false,
            },
        );
        self
    }

    pub fn force_new(mut self, name: &'static str, ty: AttributeType) -> Self {
        self.attributes.insert(
            name,
            Attribute {
                ty,
                force_new: true,
            },
        );
        self
    }

    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    pub fn force_new_attributes(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.attributes
            .iter()
            .filter(|(_, attr)| attr.force_new)
            .map(|(name, _)| *name)
    }

    /// Reshape every declared attribute of `block`, undeclared ones are kept as they are.
    pub fn normalize(&self, block: Block) -> Block {
        block
            .into_iter()
            .map(|(name, value)| {
                let value = self.normalize_attribute(&name, value);
                (name, value)
            })
            .collect()
    }

    pub fn normalize_attribute(&self, name: &str, value: Value) -> Value {
        match self.attributes.get(name) {
            Some(attr) => attr.ty.normalize(value),
            None => value,
        }
    }

    fn normalize_value(&self, value: Value) -> Value {
        match value {
            Value::Block(entries) => Value::Block(self.normalize(entries)),
            other => other,
        }
    }

    /// Verify that `value` may be stored under the top level attribute `name`.
    pub fn check(&self, name: &str, value: &Value) -> Result<(), SchemaError> {
        self.check_attribute(name, name, value)
    }

    fn check_attribute(&self, path: &str, name: &str, value: &Value) -> Result<(), SchemaError> {
        let attr = self
            .attributes
            .get(name)
            .ok_or_else(|| SchemaError::UnknownAttribute(path.to_string()))?;
        attr.ty.check(path, value)
    }

    fn check_block(&self, path: &str, entries: &Block) -> Result<(), SchemaError> {
        for (name, value) in entries {
            self.check_attribute(&format!("{path}.{name}"), name, value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::value::block;

    fn schema() -> Schema {
        Schema::new()
            .force_new("name", AttributeType::String)
            .attribute("enabled", AttributeType::Bool)
            .attribute("tags", AttributeType::string_set())
            .attribute("metadata", AttributeType::Map)
            .attribute(
                "options",
                AttributeType::Block(Schema::new().attribute("min", AttributeType::Int)),
            )
    }

    #[test]
    fn test_check() {
        let sot = schema();
        assert!(sot.check("name", &"foo".into()).is_ok());
        assert!(sot.check("name", &Value::Null).is_ok());
        assert!(sot.check("enabled", &false.into()).is_ok());
        assert!(
            sot.check("tags", &Value::Set(vec!["a".into(), "b".into()]))
                .is_ok()
        );
        assert!(
            sot.check(
                "options",
                &Value::List(vec![block([("min", 1.into())]).into()])
            )
            .is_ok()
        );
    }

    #[test]
    fn test_normalize() {
        let sot = Schema::new()
            .attribute("tags", AttributeType::string_set())
            .attribute("names", AttributeType::string_list())
            .attribute(
                "members",
                AttributeType::BlockSet {
                    schema: Schema::new().attribute("roles", AttributeType::string_set()),
                    key: "roles",
                },
            );
        let normalized = sot.normalize(block([
            ("tags", Value::List(vec!["b".into(), "a".into()])),
            ("names", Value::List(vec!["b".into(), "a".into()])),
            (
                "members",
                Value::List(vec![
                    block([("roles", Value::List(vec!["x".into()]))]).into(),
                ]),
            ),
            ("other", Value::List(vec!["z".into()])),
        ]));
        assert!(matches!(normalized.get("tags"), Some(Value::Set(_))));
        assert!(matches!(normalized.get("names"), Some(Value::List(_))));
        assert!(matches!(normalized.get("other"), Some(Value::List(_))));
        match normalized.get("members") {
            Some(Value::Set(items)) => match &items[0] {
                Value::Block(entries) => {
                    assert!(matches!(entries.get("roles"), Some(Value::Set(_))))
                }
                other => panic!("unexpected {:?}", other),
            },
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_check_errors() {
        let sot = schema();
        assert_eq!(
            Err(SchemaError::UnknownAttribute("foo".into())),
            sot.check("foo", &"bar".into())
        );
        assert_eq!(
            Err(SchemaError::TypeMismatch {
                attribute: "enabled".into(),
                expected: "bool".into(),
                found: "string".into()
            }),
            sot.check("enabled", &"yes".into())
        );
        assert_eq!(
            Err(SchemaError::UnknownAttribute("options.0.max".into())),
            sot.check(
                "options",
                &Value::List(vec![block([("max", 1.into())]).into()])
            )
        );
        assert!(
            sot.check("metadata", &Value::Map(block([("foo", 1.into())])))
                .is_err()
        );
    }

    #[test]
    fn test_force_new() {
        assert_eq!(vec!["name"], schema().force_new_attributes().collect::<Vec<_>>());
    }
}
