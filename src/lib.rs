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
//! Reconciliation engine of the Auth0 provider.
//!
//! The engine converts a declarative configuration tree into typed Auth0 management API
//! payloads, calls the management API through the per-resource client traits and flattens the
//! responses back into the tree. Relationship collections (role assignments, permission grants,
//! organization memberships and connections, resource server scopes) are reconciled by computing
//! add/remove deltas and applying them as separate calls.

pub mod action;
pub mod client;
pub mod config;
pub mod connection;
pub mod diff;
pub mod error;
pub mod expand;
pub mod guardian;
pub mod management;
pub mod organization;
pub mod provider;
pub mod resource_server;
pub mod retry;
pub mod role;
pub mod schema;
pub mod tenant;
pub mod user;
