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

use std::fmt;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// Custom code executed on a trigger.
#[derive(Builder, Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[builder(setter(strip_option, into))]
pub struct Action {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    pub supported_triggers: Option<Vec<ActionTrigger>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    pub code: Option<String>,

    /// `node16`, `node18`, ...
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    pub runtime: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    pub dependencies: Option<Vec<ActionDependency>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    pub secrets: Option<Vec<ActionSecret>>,

    /// Build status, only returned by the API.
    #[serde(skip_serializing)]
    #[builder(default)]
    pub status: Option<BuildStatus>,

    #[serde(skip_serializing)]
    #[builder(default)]
    pub deployed_version: Option<ActionVersion>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct ActionTrigger {
    pub id: String,
    pub version: String,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, Ord, PartialEq, PartialOrd, Serialize)]
pub struct ActionDependency {
    pub name: String,
    pub version: String,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct ActionSecret {
    pub name: String,
    /// Never returned by the API.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct ActionVersion {
    pub id: String,
    #[serde(default)]
    pub number: i64,
}

/// Status of the asynchronous build of an action.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildStatus {
    Pending,
    Building,
    Packaged,
    Built,
    Failed,
    Retrying,
}

impl BuildStatus {
    /// Whether the build is over, successfully or not.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Built | Self::Failed)
    }
}

impl fmt::Display for BuildStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pending => "pending",
            Self::Building => "building",
            Self::Packaged => "packaged",
            Self::Built => "built",
            Self::Failed => "failed",
            Self::Retrying => "retrying",
        };
        f.write_str(name)
    }
}
