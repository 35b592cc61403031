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
//! Configuration tree.
//!
//! A resource is described by a static [`Schema`] and carries two snapshots of its attribute
//! tree: the prior state and the desired state. [`ResourceData`] bundles both together with the
//! tracked resource id and gives read access through [`Scope`] views.

mod data;
pub mod error;
mod path;
mod types;
mod value;

pub use data::{Change, ResourceData, Scope};
pub use error::SchemaError;
pub use path::{AttributePath, PathStep};
pub use types::{Attribute, AttributeType, Schema};
pub use value::{Block, BlockBuilder, Value, block, nested};
