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
//! Add/remove deltas of relationship collections.

use std::collections::BTreeMap;

use crate::schema::{Scope, Value};

/// Delta between the prior and desired members of a keyed collection.
#[derive(Clone, Debug, PartialEq)]
pub struct Difference<T> {
    /// Members only present in the desired collection.
    pub to_add: Vec<T>,
    /// Members only present in the prior collection.
    pub to_remove: Vec<T>,
    /// Desired members whose key exists on both sides but whose attributes differ.
    pub changed: Vec<T>,
}

impl<T> Default for Difference<T> {
    fn default() -> Self {
        Self {
            to_add: Vec::new(),
            to_remove: Vec::new(),
            changed: Vec::new(),
        }
    }
}

impl<T> Difference<T> {
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty() && self.changed.is_empty()
    }

    pub fn map<U, F: Fn(T) -> U>(self, f: F) -> Difference<U> {
        Difference {
            to_add: self.to_add.into_iter().map(&f).collect(),
            to_remove: self.to_remove.into_iter().map(&f).collect(),
            changed: self.changed.into_iter().map(&f).collect(),
        }
    }

    /// Like [`Difference::map`], stopping at the first member `f` rejects.
    pub fn try_map<U, E, F: Fn(T) -> Result<U, E>>(self, f: F) -> Result<Difference<U>, E> {
        Ok(Difference {
            to_add: self.to_add.into_iter().map(&f).collect::<Result<_, _>>()?,
            to_remove: self.to_remove.into_iter().map(&f).collect::<Result<_, _>>()?,
            changed: self.changed.into_iter().map(&f).collect::<Result<_, _>>()?,
        })
    }
}

/// Compare two collections keyed by `key`. Duplicate keys collapse, the last one wins.
pub fn keyed<T, K, F, O, N>(old: O, new: N, key: F) -> Difference<T>
where
    T: PartialEq,
    K: Ord,
    F: Fn(&T) -> K,
    O: IntoIterator<Item = T>,
    N: IntoIterator<Item = T>,
{
    let mut old: BTreeMap<K, T> = old.into_iter().map(|x| (key(&x), x)).collect();
    let new: BTreeMap<K, T> = new.into_iter().map(|x| (key(&x), x)).collect();

    let mut result = Difference::default();
    for (k, item) in new {
        match old.remove(&k) {
            None => result.to_add.push(item),
            Some(prev) if prev != item => result.changed.push(item),
            Some(_) => {}
        }
    }
    result.to_remove.extend(old.into_values());
    result
}

/// Compare two collections of plain strings.
pub fn strings<O, N>(old: O, new: N) -> Difference<String>
where
    O: IntoIterator<Item = String>,
    N: IntoIterator<Item = String>,
{
    keyed(old, new, Clone::clone)
}

fn members<'a>(value: Option<&'a Value>) -> Vec<Value> {
    value
        .and_then(Value::as_list)
        .map(<[Value]>::to_vec)
        .unwrap_or_default()
}

/// Delta of a collection attribute between the prior and the desired tree. Members are keyed by
/// the `key` attribute for collections of blocks and by their value otherwise.
pub fn collection(d: &Scope<'_>, path: &str, key: Option<&str>) -> Difference<Value> {
    collection_by(d, path, |item| match key {
        Some(key) => item
            .as_map()
            .and_then(|x| x.get(key))
            .map(Value::key)
            .unwrap_or_default(),
        None => item.key(),
    })
}

/// Same as [`collection`] with a caller supplied identity.
pub fn collection_by<K, F>(d: &Scope<'_>, path: &str, key: F) -> Difference<Value>
where
    K: Ord,
    F: Fn(&Value) -> K,
{
    keyed(members(d.get_old(path)), members(d.get(path)), key)
}

/// Delta of a set of strings.
pub fn string_set(d: &Scope<'_>, path: &str) -> Difference<String> {
    let strings_of = |value: Option<&Value>| -> Vec<String> {
        members(value)
            .iter()
            .filter_map(Value::as_str)
            .map(ToString::to_string)
            .collect()
    };
    strings(strings_of(d.get_old(path)), strings_of(d.get(path)))
}
