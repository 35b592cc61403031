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

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::error::ProviderError;

/// Identity provider kind of a connection. Immutable once the connection exists.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Strategy {
    #[serde(rename = "auth0")]
    Auth0,
    #[serde(rename = "google-oauth2")]
    GoogleOAuth2,
    #[serde(rename = "google-apps")]
    GoogleApps,
    #[serde(rename = "oauth2")]
    OAuth2,
    #[serde(rename = "dropbox")]
    Dropbox,
    #[serde(rename = "bitbucket")]
    Bitbucket,
    #[serde(rename = "paypal")]
    Paypal,
    #[serde(rename = "twitter")]
    Twitter,
    #[serde(rename = "amazon")]
    Amazon,
    #[serde(rename = "yahoo")]
    Yahoo,
    #[serde(rename = "box")]
    BoxCom,
    #[serde(rename = "wordpress")]
    Wordpress,
    #[serde(rename = "shopify")]
    Shopify,
    #[serde(rename = "custom")]
    Custom,
    #[serde(rename = "facebook")]
    Facebook,
    #[serde(rename = "apple")]
    Apple,
    #[serde(rename = "linkedin")]
    LinkedIn,
    #[serde(rename = "github")]
    GitHub,
    #[serde(rename = "windowslive")]
    WindowsLive,
    #[serde(rename = "salesforce")]
    Salesforce,
    #[serde(rename = "salesforce-community")]
    SalesforceCommunity,
    #[serde(rename = "salesforce-sandbox")]
    SalesforceSandbox,
    #[serde(rename = "email")]
    Email,
    #[serde(rename = "sms")]
    Sms,
    #[serde(rename = "oidc")]
    Oidc,
    #[serde(rename = "okta")]
    Okta,
    #[serde(rename = "ad")]
    Ad,
    #[serde(rename = "waad")]
    AzureAd,
    #[serde(rename = "adfs")]
    Adfs,
    #[serde(rename = "pingfederate")]
    PingFederate,
    #[serde(rename = "samlp")]
    Samlp,
}

impl Strategy {
    pub const ALL: [Strategy; 31] = [
        Strategy::Auth0,
        Strategy::GoogleOAuth2,
        Strategy::GoogleApps,
        Strategy::OAuth2,
        Strategy::Dropbox,
        Strategy::Bitbucket,
        Strategy::Paypal,
        Strategy::Twitter,
        Strategy::Amazon,
        Strategy::Yahoo,
        Strategy::BoxCom,
        Strategy::Wordpress,
        Strategy::Shopify,
        Strategy::Custom,
        Strategy::Facebook,
        Strategy::Apple,
        Strategy::LinkedIn,
        Strategy::GitHub,
        Strategy::WindowsLive,
        Strategy::Salesforce,
        Strategy::SalesforceCommunity,
        Strategy::SalesforceSandbox,
        Strategy::Email,
        Strategy::Sms,
        Strategy::Oidc,
        Strategy::Okta,
        Strategy::Ad,
        Strategy::AzureAd,
        Strategy::Adfs,
        Strategy::PingFederate,
        Strategy::Samlp,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Auth0 => "auth0",
            Strategy::GoogleOAuth2 => "google-oauth2",
            Strategy::GoogleApps => "google-apps",
            Strategy::OAuth2 => "oauth2",
            Strategy::Dropbox => "dropbox",
            Strategy::Bitbucket => "bitbucket",
            Strategy::Paypal => "paypal",
            Strategy::Twitter => "twitter",
            Strategy::Amazon => "amazon",
            Strategy::Yahoo => "yahoo",
            Strategy::BoxCom => "box",
            Strategy::Wordpress => "wordpress",
            Strategy::Shopify => "shopify",
            Strategy::Custom => "custom",
            Strategy::Facebook => "facebook",
            Strategy::Apple => "apple",
            Strategy::LinkedIn => "linkedin",
            Strategy::GitHub => "github",
            Strategy::WindowsLive => "windowslive",
            Strategy::Salesforce => "salesforce",
            Strategy::SalesforceCommunity => "salesforce-community",
            Strategy::SalesforceSandbox => "salesforce-sandbox",
            Strategy::Email => "email",
            Strategy::Sms => "sms",
            Strategy::Oidc => "oidc",
            Strategy::Okta => "okta",
            Strategy::Ad => "ad",
            Strategy::AzureAd => "waad",
            Strategy::Adfs => "adfs",
            Strategy::PingFederate => "pingfederate",
            Strategy::Samlp => "samlp",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Strategy::ALL
            .iter()
            .find(|x| x.as_str() == s)
            .copied()
            .ok_or_else(|| ProviderError::UnsupportedStrategy(s.to_string()))
    }
}

/// Connection payload and response.
#[derive(Builder, Clone, Debug, Default, PartialEq, Serialize)]
#[builder(setter(strip_option, into))]
pub struct Connection {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    pub display_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    pub strategy: Option<Strategy>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    pub is_domain_connection: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    pub show_as_button: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    pub realms: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    pub metadata: Option<BTreeMap<String, String>>,

    /// Strategy specific options.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    pub options: Option<ConnectionOptions>,
}

/// Options of a connection, one variant per family of strategies.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ConnectionOptions {
    Database(DatabaseOptions),
    GoogleOAuth2(GoogleOAuth2Options),
    GoogleApps(GoogleAppsOptions),
    OAuth2(OAuth2Options),
    Facebook(FacebookOptions),
    Apple(AppleOptions),
    LinkedIn(LinkedInOptions),
    GitHub(GitHubOptions),
    WindowsLive(WindowsLiveOptions),
    Salesforce(SalesforceOptions),
    Email(EmailOptions),
    Sms(SmsOptions),
    Oidc(OidcOptions),
    Okta(OktaOptions),
    Ad(AdOptions),
    AzureAd(AzureAdOptions),
    Adfs(AdfsOptions),
    PingFederate(PingFederateOptions),
    Saml(SamlOptions),
    /// Options the client could not classify, e.g. a strategy introduced after this crate.
    Unmapped(UnmappedOptions),
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct UnmappedOptions {
    #[serde(skip)]
    pub strategy: String,
    #[serde(flatten)]
    pub raw: Map<String, JsonValue>,
}

/// Options understood by every strategy.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct CommonOptions {
    /// User attributes that are not stored by Auth0.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub non_persistent_attrs: Option<Vec<String>>,

    /// When root user attributes get updated from the identity provider.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub set_user_root_attributes: Option<String>,

    /// Parameters passed through to the identity provider.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upstream_params: Option<Map<String, JsonValue>>,
}

/// Scope switches of social connections; every scope is a boolean attribute of the options.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ScopeFlags(pub BTreeMap<String, bool>);

impl ScopeFlags {
    pub fn enabled(&self) -> Vec<String> {
        self.0
            .iter()
            .filter(|(_, enabled)| **enabled)
            .map(|(scope, _)| scope.clone())
            .collect()
    }

    pub fn toggle(&mut self, enable: bool, scopes: &[String]) {
        for scope in scopes {
            self.0.insert(scope.clone(), enable);
        }
    }
}

/// Options exposing OAuth scopes through per scope switches instead of a settable list.
pub trait ScopeToggle {
    /// Scopes enabled in the options.
    fn scopes(&self) -> Vec<String>;

    fn set_scopes(&mut self, enable: bool, scopes: &[String]);

    /// Prime the options with the scopes enabled remotely. Only needed where all scopes travel
    /// in a single attribute, which would otherwise lose the unchanged ones.
    fn seed_scopes(&mut self, _enabled: &[String]) {}
}

macro_rules! impl_scope_flags {
    ($($options:ty),+ $(,)?) => {
        $(
            impl ScopeToggle for $options {
                fn scopes(&self) -> Vec<String> {
                    self.scopes.enabled()
                }

                fn set_scopes(&mut self, enable: bool, scopes: &[String]) {
                    self.scopes.toggle(enable, scopes);
                }
            }
        )+
    };
}

macro_rules! impl_scope_string {
    ($($options:ty),+ $(,)?) => {
        $(
            impl ScopeToggle for $options {
                fn scopes(&self) -> Vec<String> {
                    split_scopes(self.scope.as_deref())
                }

                fn set_scopes(&mut self, enable: bool, scopes: &[String]) {
                    let mut current: BTreeSet<String> =
                        split_scopes(self.scope.as_deref()).into_iter().collect();
                    for scope in scopes {
                        if enable {
                            current.insert(scope.clone());
                        } else {
                            current.remove(scope);
                        }
                    }
                    self.scope = Some(current.into_iter().collect::<Vec<_>>().join(" "));
                }

                fn seed_scopes(&mut self, enabled: &[String]) {
                    if self.scope.is_none() && !enabled.is_empty() {
                        self.set_scopes(true, enabled);
                    }
                }
            }
        )+
    };
}

fn split_scopes(scope: Option<&str>) -> Vec<String> {
    scope
        .map(|x| x.split_whitespace().map(ToString::to_string).collect())
        .unwrap_or_default()
}

impl_scope_flags!(
    GoogleOAuth2Options,
    FacebookOptions,
    AppleOptions,
    LinkedInOptions,
    GitHubOptions,
    WindowsLiveOptions,
    SalesforceOptions,
    AzureAdOptions,
);

impl_scope_string!(OAuth2Options, OidcOptions, OktaOptions);

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct UsernameValidation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<i64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Validation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<UsernameValidation>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PasswordHistory {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<i64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PasswordNoPersonalInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable: Option<bool>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PasswordDictionary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dictionary: Option<Vec<String>>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PasswordComplexityOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<i64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct MfaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_enroll_settings: Option<bool>,
}

/// Options of the `auth0` database strategy.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct DatabaseOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<Validation>,
    #[serde(rename = "passwordPolicy", skip_serializing_if = "Option::is_none")]
    pub password_policy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_history: Option<PasswordHistory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_no_personal_info: Option<PasswordNoPersonalInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_dictionary: Option<PasswordDictionary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_complexity_options: Option<PasswordComplexityOptions>,
    #[serde(
        rename = "enabledDatabaseCustomization",
        skip_serializing_if = "Option::is_none"
    )]
    pub enabled_database_customization: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brute_force_protection: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub import_mode: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable_signup: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable_self_service_change_password: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requires_username: Option<bool>,
    #[serde(rename = "customScripts", skip_serializing_if = "Option::is_none")]
    pub custom_scripts: Option<BTreeMap<String, String>>,
    /// Secrets made available to the custom scripts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub configuration: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mfa: Option<MfaOptions>,
    #[serde(flatten)]
    pub common: CommonOptions,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct GoogleOAuth2Options {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_audiences: Option<Vec<String>>,
    #[serde(flatten)]
    pub scopes: ScopeFlags,
    #[serde(flatten)]
    pub common: CommonOptions,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct GoogleAppsOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain_aliases: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_enable_users: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub map_user_id_to_id: Option<bool>,
    #[serde(flatten)]
    pub common: CommonOptions,
}

/// Options of the generic OAuth2 strategy family (`oauth2`, `dropbox`, `custom`, ...).
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct OAuth2Options {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    #[serde(rename = "authorizationURL", skip_serializing_if = "Option::is_none")]
    pub authorization_endpoint: Option<String>,
    #[serde(rename = "tokenURL", skip_serializing_if = "Option::is_none")]
    pub token_endpoint: Option<String>,
    /// Space separated scopes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scripts: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
    #[serde(rename = "pkce_enabled", skip_serializing_if = "Option::is_none")]
    pub pkce_enabled: Option<bool>,
    #[serde(flatten)]
    pub common: CommonOptions,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct FacebookOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    #[serde(flatten)]
    pub scopes: ScopeFlags,
    #[serde(flatten)]
    pub common: CommonOptions,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct AppleOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    /// Private key used to sign the client assertion.
    #[serde(rename = "app_secret", skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_id: Option<String>,
    #[serde(rename = "kid", skip_serializing_if = "Option::is_none")]
    pub key_id: Option<String>,
    #[serde(flatten)]
    pub scopes: ScopeFlags,
    #[serde(flatten)]
    pub common: CommonOptions,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct LinkedInOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy_version: Option<i64>,
    #[serde(flatten)]
    pub scopes: ScopeFlags,
    #[serde(flatten)]
    pub common: CommonOptions,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct GitHubOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    #[serde(flatten)]
    pub scopes: ScopeFlags,
    #[serde(flatten)]
    pub common: CommonOptions,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct WindowsLiveOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy_version: Option<i64>,
    #[serde(flatten)]
    pub scopes: ScopeFlags,
    #[serde(flatten)]
    pub common: CommonOptions,
}

/// Options of the `salesforce`, `salesforce-community` and `salesforce-sandbox` strategies.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SalesforceOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub community_base_url: Option<String>,
    #[serde(flatten)]
    pub scopes: ScopeFlags,
    #[serde(flatten)]
    pub common: CommonOptions,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Totp {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_step: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<i64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct EmailTemplate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub syntax: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

/// Options of the passwordless `email` strategy.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct EmailOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<EmailTemplate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub totp: Option<Totp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable_signup: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brute_force_protection: Option<bool>,
    #[serde(rename = "authParams", skip_serializing_if = "Option::is_none")]
    pub auth_params: Option<BTreeMap<String, String>>,
    #[serde(flatten)]
    pub common: CommonOptions,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct GatewayAuthentication {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audience: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_base64_encoded: Option<bool>,
}

/// Options of the passwordless `sms` strategy.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SmsOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub syntax: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twilio_sid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twilio_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub messaging_service_sid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub totp: Option<Totp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable_signup: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brute_force_protection: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forward_request_info: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_authentication: Option<GatewayAuthentication>,
    #[serde(flatten)]
    pub common: CommonOptions,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct OidcOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain_aliases: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_domain: Option<String>,
    /// `front_channel` or `back_channel`.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub r#type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jwks_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discovery_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub userinfo_endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization_endpoint: Option<String>,
    /// Space separated scopes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(flatten)]
    pub common: CommonOptions,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct OktaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain_aliases: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jwks_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub userinfo_endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization_endpoint: Option<String>,
    /// Space separated scopes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
    #[serde(flatten)]
    pub common: CommonOptions,
}

/// Options of the Active Directory / LDAP strategy.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct AdOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain_aliases: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ips: Option<Vec<String>>,
    #[serde(rename = "certAuth", skip_serializing_if = "Option::is_none")]
    pub use_cert_auth: Option<bool>,
    #[serde(rename = "kerberos", skip_serializing_if = "Option::is_none")]
    pub use_kerberos: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable_cache: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brute_force_protection: Option<bool>,
    #[serde(flatten)]
    pub common: CommonOptions,
}

/// Options of the Azure AD (`waad`) strategy.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct AzureAdOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain_aliases: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity_api: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub waad_protocol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_wsfed: Option<bool>,
    #[serde(rename = "useCommonEndpoint", skip_serializing_if = "Option::is_none")]
    pub use_common_endpoint: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_groups_to_retrieve: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_enable_users: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub should_trust_email_verified_connection: Option<String>,
    #[serde(flatten)]
    pub scopes: ScopeFlags,
    #[serde(flatten)]
    pub common: CommonOptions,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct AdfsOptions {
    #[serde(rename = "adfs_server", skip_serializing_if = "Option::is_none")]
    pub adfs_server: Option<String>,
    #[serde(rename = "fedMetadataXml", skip_serializing_if = "Option::is_none")]
    pub fed_metadata_xml: Option<String>,
    #[serde(rename = "signInEndpoint", skip_serializing_if = "Option::is_none")]
    pub sign_in_endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain_aliases: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_enable_users: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub should_trust_email_verified_connection: Option<String>,
    #[serde(flatten)]
    pub common: CommonOptions,
}

/// IdP initiated login settings of SAML based strategies.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct IdpInitiated {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(rename = "client_protocol", skip_serializing_if = "Option::is_none")]
    pub client_protocol: Option<String>,
    #[serde(rename = "client_authorizequery", skip_serializing_if = "Option::is_none")]
    pub client_authorize_query: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PingFederateOptions {
    #[serde(rename = "signingCert", skip_serializing_if = "Option::is_none")]
    pub signing_cert: Option<String>,
    #[serde(rename = "signInEndpoint", skip_serializing_if = "Option::is_none")]
    pub sign_in_endpoint: Option<String>,
    #[serde(rename = "digestAlgorithm", skip_serializing_if = "Option::is_none")]
    pub digest_algorithm: Option<String>,
    #[serde(rename = "signSAMLRequest", skip_serializing_if = "Option::is_none")]
    pub sign_saml_request: Option<bool>,
    #[serde(rename = "signatureAlgorithm", skip_serializing_if = "Option::is_none")]
    pub signature_algorithm: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain_aliases: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
    #[serde(rename = "pingFederateBaseUrl", skip_serializing_if = "Option::is_none")]
    pub ping_federate_base_url: Option<String>,
    #[serde(rename = "idpinitiated", skip_serializing_if = "Option::is_none")]
    pub idp_initiated: Option<IdpInitiated>,
    #[serde(flatten)]
    pub common: CommonOptions,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SigningKey {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cert: Option<String>,
}

/// Options of the SAML (`samlp`) strategy.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SamlOptions {
    #[serde(rename = "signingCert", skip_serializing_if = "Option::is_none")]
    pub signing_cert: Option<String>,
    #[serde(rename = "signing_key", skip_serializing_if = "Option::is_none")]
    pub signing_key: Option<SigningKey>,
    #[serde(rename = "protocolBinding", skip_serializing_if = "Option::is_none")]
    pub protocol_binding: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<bool>,
    #[serde(rename = "signInEndpoint", skip_serializing_if = "Option::is_none")]
    pub sign_in_endpoint: Option<String>,
    #[serde(rename = "signOutEndpoint", skip_serializing_if = "Option::is_none")]
    pub sign_out_endpoint: Option<String>,
    #[serde(rename = "disableSignout", skip_serializing_if = "Option::is_none")]
    pub disable_sign_out: Option<bool>,
    #[serde(rename = "signatureAlgorithm", skip_serializing_if = "Option::is_none")]
    pub signature_algorithm: Option<String>,
    #[serde(rename = "digestAlgorithm", skip_serializing_if = "Option::is_none")]
    pub digest_algorithm: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain_aliases: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
    #[serde(rename = "entityId", skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    #[serde(rename = "metadataUrl", skip_serializing_if = "Option::is_none")]
    pub metadata_url: Option<String>,
    #[serde(rename = "metadataXml", skip_serializing_if = "Option::is_none")]
    pub metadata_xml: Option<String>,
    #[serde(rename = "signSAMLRequest", skip_serializing_if = "Option::is_none")]
    pub sign_saml_request: Option<bool>,
    #[serde(rename = "user_id_attribute", skip_serializing_if = "Option::is_none")]
    pub user_id_attribute: Option<String>,
    #[serde(rename = "fieldsMap", skip_serializing_if = "Option::is_none")]
    pub fields_map: Option<Map<String, JsonValue>>,
    #[serde(rename = "idpinitiated", skip_serializing_if = "Option::is_none")]
    pub idp_initiated: Option<IdpInitiated>,
    #[serde(flatten)]
    pub common: CommonOptions,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_strategy_names() {
        for strategy in Strategy::ALL {
            assert_eq!(strategy, strategy.as_str().parse().unwrap());
            assert_eq!(
                json!(strategy.as_str()),
                serde_json::to_value(strategy).unwrap()
            );
        }
        assert!(matches!(
            "myspace".parse::<Strategy>(),
            Err(ProviderError::UnsupportedStrategy(_))
        ));
    }

    #[test]
    fn test_scope_flags() {
        let mut options = GoogleOAuth2Options::default();
        options.set_scopes(true, &["email".into(), "profile".into()]);
        options.set_scopes(false, &["profile".into()]);
        assert_eq!(vec!["email".to_string()], options.scopes());
        assert_eq!(
            json!({"email": true, "profile": false}),
            serde_json::to_value(&options).unwrap()
        );
    }

    #[test]
    fn test_scope_string() {
        let mut options = OidcOptions::default();
        options.seed_scopes(&["openid".into(), "profile".into()]);
        options.set_scopes(true, &["email".into()]);
        options.set_scopes(false, &["profile".into()]);
        assert_eq!(Some("email openid".to_string()), options.scope);
        assert_eq!(
            vec!["email".to_string(), "openid".to_string()],
            options.scopes()
        );
    }

    #[test]
    fn test_options_serialization_skips_absent() {
        let options = ConnectionOptions::Database(DatabaseOptions {
            brute_force_protection: Some(false),
            password_policy: Some("good".into()),
            common: CommonOptions {
                non_persistent_attrs: Some(vec!["ethnicity".into()]),
                ..Default::default()
            },
            ..Default::default()
        });
        assert_eq!(
            json!({
                "brute_force_protection": false,
                "passwordPolicy": "good",
                "non_persistent_attrs": ["ethnicity"]
            }),
            serde_json::to_value(&options).unwrap()
        );
    }

    #[test]
    fn test_connection_builder() {
        let connection = ConnectionBuilder::default()
            .name("Username-Password")
            .strategy(Strategy::Auth0)
            .build()
            .unwrap();
        assert_eq!(Some(Strategy::Auth0), connection.strategy);
        assert_eq!(None, connection.options);
    }
}
