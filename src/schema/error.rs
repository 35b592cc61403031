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

use thiserror::Error;

#[derive(Clone, Error, Debug, PartialEq)]
pub enum SchemaError {
    /// Attribute is not part of the resource schema.
    #[error("attribute `{0}` is not declared in the resource schema")]
    UnknownAttribute(String),

    /// Value does not fit the declared attribute type.
    #[error("attribute `{attribute}`: expected {expected}, got {found}")]
    TypeMismatch {
        attribute: String,
        expected: String,
        found: String,
    },

    /// Document used to seed a tree is not an object.
    #[error("resource document must be a JSON object")]
    NotAnObject,
}
