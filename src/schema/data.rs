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

use super::error::SchemaError;
use super::path::AttributePath;
use super::types::Schema;
use super::value::{Block, Value};

/// Prior and desired state of a single resource during one reconciliation pass.
///
/// `old` is the last observed state, `new` is the desired configuration. Flatten writes go into
/// `new`, which then becomes the state handed back to the orchestrator.
#[derive(Clone, Debug, Default)]
pub struct ResourceData {
    schema: Schema,
    id: Option<String>,
    old: Block,
    new: Block,
    is_new: bool,
}

impl ResourceData {
    /// Data of a resource that is about to be created.
    pub fn new_resource(schema: Schema, config: Block) -> Self {
        let new = schema.normalize(config);
        Self {
            schema,
            id: None,
            old: Block::new(),
            new,
            is_new: true,
        }
    }

    /// Data of an existing resource transitioning from `old` to `new`.
    pub fn existing<S: Into<String>>(schema: Schema, id: S, old: Block, new: Block) -> Self {
        let (old, new) = (schema.normalize(old), schema.normalize(new));
        Self {
            schema,
            id: Some(id.into()),
            old,
            new,
            is_new: false,
        }
    }

    /// Data of an existing resource without pending changes (refresh, import and delete).
    pub fn from_state<S: Into<String>>(schema: Schema, id: S, state: Block) -> Self {
        Self::existing(schema, id, state.clone(), state)
    }

    /// Build a tree out of a JSON document.
    pub fn block_from_json(value: &serde_json::Value) -> Result<Block, SchemaError> {
        match Value::from(value) {
            Value::Block(entries) => Ok(entries),
            _ => Err(SchemaError::NotAnObject),
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn set_id<S: Into<String>>(&mut self, id: S) {
        self.id = Some(id.into());
    }

    /// Forget the resource, it no longer exists remotely.
    pub fn clear_id(&mut self) {
        self.id = None;
    }

    pub fn is_new_resource(&self) -> bool {
        self.is_new
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Current (desired or freshly read) state.
    pub fn state(&self) -> &Block {
        &self.new
    }

    pub fn scope(&self) -> Scope<'_> {
        Scope {
            data: self,
            prefix: AttributePath::default(),
        }
    }

    pub fn get(&self, path: &str) -> Option<&Value> {
        self.scope().get(path)
    }

    pub fn has_change(&self, path: &str) -> bool {
        self.scope().has_change(path)
    }

    /// Store a flattened value under the top level attribute `key`.
    pub fn set<V: Into<Value>>(&mut self, key: &str, value: V) -> Result<(), SchemaError> {
        let value = self.schema.normalize_attribute(key, value.into());
        self.schema.check(key, &value)?;
        self.new.insert(key.to_string(), value);
        Ok(())
    }

    /// Force-new attributes whose value changed, the resource must be replaced when non-empty.
    pub fn requires_replacement(&self) -> Vec<&'static str> {
        if self.is_new {
            return Vec::new();
        }
        self.schema
            .force_new_attributes()
            .filter(|name| self.has_change(name))
            .collect()
    }
}

/// Old and new value of one attribute.
#[derive(Clone, Debug, PartialEq)]
pub struct Change<'a> {
    pub old: Option<&'a Value>,
    pub new: Option<&'a Value>,
}

impl Change<'_> {
    pub fn changed(&self) -> bool {
        self.old != self.new
    }
}

/// Read view into [`ResourceData`] rooted at a block path.
#[derive(Clone, Debug)]
pub struct Scope<'a> {
    data: &'a ResourceData,
    prefix: AttributePath,
}

impl<'a> Scope<'a> {
    fn path(&self, path: &str) -> AttributePath {
        self.prefix.join(&AttributePath::from(path))
    }

    pub fn is_new_resource(&self) -> bool {
        self.data.is_new
    }

    /// Raw desired value, including explicit nulls and unknown values.
    pub fn get_raw(&self, path: &str) -> Option<&'a Value> {
        Value::lookup(&self.data.new, &self.path(path))
    }

    /// Desired value, `None` when absent, null or unknown.
    pub fn get(&self, path: &str) -> Option<&'a Value> {
        self.get_raw(path).filter(|x| x.is_known())
    }

    /// Prior value, `None` when absent, null or unknown.
    pub fn get_old(&self, path: &str) -> Option<&'a Value> {
        Value::lookup(&self.data.old, &self.path(path)).filter(|x| x.is_known())
    }

    pub fn is_set(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    pub fn is_unknown(&self, path: &str) -> bool {
        matches!(self.get_raw(path), Some(Value::Unknown))
    }

    pub fn get_change(&self, path: &str) -> Change<'a> {
        Change {
            old: self.get_old(path),
            new: self.get(path),
        }
    }

    /// Whether the attribute differs between the prior and the desired state. A value that is
    /// not known yet always counts as a change.
    pub fn has_change(&self, path: &str) -> bool {
        self.is_unknown(path) || self.get_change(path).changed()
    }

    /// Scope of the first block of a 0..1 optional group.
    pub fn first_block(&self, path: &str) -> Option<Scope<'a>> {
        match self.get(path)?.as_list()?.first()? {
            Value::Block(_) => Some(Scope {
                data: self.data,
                prefix: self.path(path).index(0),
            }),
            _ => None,
        }
    }

    /// Scopes of all desired blocks of a repeated group.
    pub fn blocks(&self, path: &str) -> Vec<Scope<'a>> {
        let base = self.path(path);
        self.get(path)
            .and_then(Value::as_list)
            .map(|items| {
                items
                    .iter()
                    .enumerate()
                    .filter(|(_, item)| matches!(item, Value::Block(_)))
                    .map(|(idx, _)| Scope {
                        data: self.data,
                        prefix: base.index(idx),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn for_each_block<E, F>(&self, path: &str, mut f: F) -> Result<(), E>
    where
        F: FnMut(Scope<'a>) -> Result<(), E>,
    {
        for scope in self.blocks(path) {
            f(scope)?;
        }
        Ok(())
    }
}
