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

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// API protected by the tenant.
#[derive(Builder, Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[builder(setter(strip_option, into))]
pub struct ResourceServer {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    pub name: Option<String>,

    /// Audience of the API, immutable.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    pub identifier: Option<String>,

    /// Scopes, only present in responses.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    pub scopes: Option<Vec<ResourceServerScope>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    pub signing_alg: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    pub signing_secret: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    pub allow_offline_access: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    pub token_lifetime: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    pub token_lifetime_for_web: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    pub skip_consent_for_verifiable_first_party_clients: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    pub enforce_policies: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    pub token_dialect: Option<String>,
}

#[derive(Builder, Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[builder(setter(strip_option, into))]
pub struct ResourceServerScope {
    pub value: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    pub description: Option<String>,
}
