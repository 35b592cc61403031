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

/// Tenant settings.
#[derive(Builder, Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[builder(setter(strip_option, into))]
pub struct Tenant {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    pub friendly_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    pub picture_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    pub support_email: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    pub support_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    pub allowed_logout_urls: Option<Vec<String>>,

    /// Hours.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    pub session_lifetime: Option<f64>,

    /// Hours.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    pub idle_session_lifetime: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    pub default_audience: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    pub default_directory: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    pub default_redirection_uri: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    pub enabled_locales: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    pub sandbox_version: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    pub flags: Option<TenantFlags>,
}

/// Feature flags of the tenant.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct TenantFlags {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_client_connections: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_apis_section: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_pipeline2: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_dynamic_client_registration: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_custom_domain_in_emails: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_public_signup_user_exists_error: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_scope_descriptions_for_consent: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable_clickjack_protection_headers: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable_management_api_sms_obfuscation: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub revoke_refresh_token_grant: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_disclose_enterprise_connections: Option<bool>,
}

/// Accessors of every flag by its attribute name.
pub(super) type FlagField = (
    &'static str,
    fn(&TenantFlags) -> Option<bool>,
    fn(&mut TenantFlags, Option<bool>),
);

macro_rules! flag_fields {
    ($($name:ident),* $(,)?) => {
        pub(super) const FLAGS: &[FlagField] = &[
            $((
                stringify!($name),
                |f: &TenantFlags| f.$name,
                |f: &mut TenantFlags, value: Option<bool>| f.$name = value,
            )),*
        ];
    };
}

flag_fields!(
    enable_client_connections,
    enable_apis_section,
    enable_pipeline2,
    enable_dynamic_client_registration,
    enable_custom_domain_in_emails,
    enable_public_signup_user_exists_error,
    use_scope_descriptions_for_consent,
    disable_clickjack_protection_headers,
    disable_management_api_sms_obfuscation,
    revoke_refresh_token_grant,
    no_disclose_enterprise_connections,
);
