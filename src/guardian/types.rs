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
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ProviderError;

/// Multi-factor authentication factor.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Factor {
    #[serde(rename = "sms")]
    Sms,
    #[serde(rename = "email")]
    Email,
    #[serde(rename = "otp")]
    Otp,
    #[serde(rename = "push-notification")]
    Push,
    #[serde(rename = "webauthn-roaming")]
    WebauthnRoaming,
    #[serde(rename = "webauthn-platform")]
    WebauthnPlatform,
    #[serde(rename = "duo")]
    Duo,
    #[serde(rename = "recovery-code")]
    RecoveryCode,
}

impl Factor {
    pub const ALL: [Factor; 8] = [
        Factor::Sms,
        Factor::Email,
        Factor::Otp,
        Factor::Push,
        Factor::WebauthnRoaming,
        Factor::WebauthnPlatform,
        Factor::Duo,
        Factor::RecoveryCode,
    ];

    /// Name used by the management API.
    pub fn as_str(&self) -> &'static str {
        match self {
            Factor::Sms => "sms",
            Factor::Email => "email",
            Factor::Otp => "otp",
            Factor::Push => "push-notification",
            Factor::WebauthnRoaming => "webauthn-roaming",
            Factor::WebauthnPlatform => "webauthn-platform",
            Factor::Duo => "duo",
            Factor::RecoveryCode => "recovery-code",
        }
    }

    /// Configuration tree attribute holding the flag of the factor.
    pub fn attribute(&self) -> &'static str {
        match self {
            Factor::Sms => "sms",
            Factor::Email => "email",
            Factor::Otp => "otp",
            Factor::Push => "push",
            Factor::WebauthnRoaming => "webauthn_roaming",
            Factor::WebauthnPlatform => "webauthn_platform",
            Factor::Duo => "duo",
            Factor::RecoveryCode => "recovery_code",
        }
    }
}

impl fmt::Display for Factor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Factor {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Factor::ALL
            .into_iter()
            .find(|x| x.as_str() == s)
            .ok_or_else(|| ProviderError::ValidationConflict(format!("unknown MFA factor `{s}`")))
    }
}

/// Enabled state of a factor as reported by the API.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct FactorStatus {
    pub name: String,
    pub enabled: bool,
}

/// Toggles and policy an apply run sends.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct GuardianChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy: Option<String>,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub factors: BTreeMap<Factor, bool>,
}

impl GuardianChanges {
    pub fn is_empty(&self) -> bool {
        self.policy.is_none() && self.factors.is_empty()
    }
}
