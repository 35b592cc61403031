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
//! Configuration tree to connection payload.

use tracing::debug;

use crate::diff;
use crate::error::ProviderError;
use crate::expand::{self as field, Condition};
use crate::schema::{ResourceData, Scope, Value};

use super::types::*;

/// Connection payload for a create (everything configured) or an update (what changed).
pub(super) fn expand_connection(d: &ResourceData) -> Result<Connection, ProviderError> {
    let s = d.scope();
    let mut connection = Connection {
        name: field::string(&s, "name", &[Condition::IsNewResource]),
        strategy: field::string(&s, "strategy", &[Condition::IsNewResource])
            .map(|x| x.parse::<Strategy>())
            .transpose()?,
        display_name: field::string(&s, "display_name", &[Condition::HasChange]),
        is_domain_connection: field::bool(&s, "is_domain_connection", &[Condition::HasChange]),
        show_as_button: field::bool(&s, "show_as_button", &[Condition::HasChange]),
        realms: field::string_list(&s, "realms", &[Condition::HasChange]),
        metadata: field::string_map(&s, "metadata", &[Condition::HasChange]),
        ..Default::default()
    };

    if s.has_change("options") {
        let strategy: Strategy = d
            .get("strategy")
            .and_then(Value::as_str)
            .ok_or_else(|| ProviderError::ValidationConflict("`strategy` is required".into()))?
            .parse()?;
        if let Some(options) = s.first_block("options") {
            connection.options = Some(expand_options(strategy, &options)?);
        }
    }
    Ok(connection)
}

/// Route the options block through the expand function of `strategy`.
pub(super) fn expand_options(
    strategy: Strategy,
    o: &Scope<'_>,
) -> Result<ConnectionOptions, ProviderError> {
    debug!("expanding {} connection options", strategy);
    Ok(match strategy {
        Strategy::Auth0 => ConnectionOptions::Database(expand_database(o)?),
        Strategy::GoogleOAuth2 => {
            let mut options = GoogleOAuth2Options {
                client_id: field::string(o, "client_id", &[]),
                client_secret: field::string(o, "client_secret", &[]),
                allowed_audiences: field::string_list(o, "allowed_audiences", &[]),
                common: expand_common(o)?,
                ..Default::default()
            };
            expand_scopes(o, &mut options);
            ConnectionOptions::GoogleOAuth2(options)
        }
        Strategy::GoogleApps => ConnectionOptions::GoogleApps(GoogleAppsOptions {
            client_id: field::string(o, "client_id", &[]),
            client_secret: field::string(o, "client_secret", &[]),
            domain: field::string(o, "domain", &[]),
            tenant_domain: field::string(o, "tenant_domain", &[]),
            domain_aliases: field::string_list(o, "domain_aliases", &[]),
            api_enable_users: field::bool(o, "api_enable_users", &[]),
            icon_url: field::string(o, "icon_url", &[]),
            map_user_id_to_id: field::bool(o, "map_user_id_to_id", &[]),
            common: expand_common(o)?,
        }),
        Strategy::OAuth2
        | Strategy::Dropbox
        | Strategy::Bitbucket
        | Strategy::Paypal
        | Strategy::Twitter
        | Strategy::Amazon
        | Strategy::Yahoo
        | Strategy::BoxCom
        | Strategy::Wordpress
        | Strategy::Shopify
        | Strategy::Custom => {
            let mut options = OAuth2Options {
                client_id: field::string(o, "client_id", &[]),
                client_secret: field::string(o, "client_secret", &[]),
                authorization_endpoint: field::string(o, "authorization_endpoint", &[]),
                token_endpoint: field::string(o, "token_endpoint", &[]),
                scripts: field::string_map(o, "scripts", &[]),
                icon_url: field::string(o, "icon_url", &[]),
                pkce_enabled: field::bool(o, "pkce_enabled", &[]),
                common: expand_common(o)?,
                ..Default::default()
            };
            expand_scopes(o, &mut options);
            ConnectionOptions::OAuth2(options)
        }
        Strategy::Facebook => {
            let mut options = FacebookOptions {
                client_id: field::string(o, "client_id", &[]),
                client_secret: field::string(o, "client_secret", &[]),
                common: expand_common(o)?,
                ..Default::default()
            };
            expand_scopes(o, &mut options);
            ConnectionOptions::Facebook(options)
        }
        Strategy::Apple => {
            let mut options = AppleOptions {
                client_id: field::string(o, "client_id", &[]),
                client_secret: field::string(o, "client_secret", &[]),
                team_id: field::string(o, "team_id", &[]),
                key_id: field::string(o, "key_id", &[]),
                common: expand_common(o)?,
                ..Default::default()
            };
            expand_scopes(o, &mut options);
            ConnectionOptions::Apple(options)
        }
        Strategy::LinkedIn => {
            let mut options = LinkedInOptions {
                client_id: field::string(o, "client_id", &[]),
                client_secret: field::string(o, "client_secret", &[]),
                strategy_version: field::int(o, "strategy_version", &[]),
                common: expand_common(o)?,
                ..Default::default()
            };
            expand_scopes(o, &mut options);
            ConnectionOptions::LinkedIn(options)
        }
        Strategy::GitHub => {
            let mut options = GitHubOptions {
                client_id: field::string(o, "client_id", &[]),
                client_secret: field::string(o, "client_secret", &[]),
                common: expand_common(o)?,
                ..Default::default()
            };
            expand_scopes(o, &mut options);
            ConnectionOptions::GitHub(options)
        }
        Strategy::WindowsLive => {
            let mut options = WindowsLiveOptions {
                client_id: field::string(o, "client_id", &[]),
                client_secret: field::string(o, "client_secret", &[]),
                strategy_version: field::int(o, "strategy_version", &[]),
                common: expand_common(o)?,
                ..Default::default()
            };
            expand_scopes(o, &mut options);
            ConnectionOptions::WindowsLive(options)
        }
        Strategy::Salesforce | Strategy::SalesforceCommunity | Strategy::SalesforceSandbox => {
            let mut options = SalesforceOptions {
                client_id: field::string(o, "client_id", &[]),
                client_secret: field::string(o, "client_secret", &[]),
                community_base_url: field::string(o, "community_base_url", &[]),
                common: expand_common(o)?,
                ..Default::default()
            };
            expand_scopes(o, &mut options);
            ConnectionOptions::Salesforce(options)
        }
        Strategy::Email => ConnectionOptions::Email(EmailOptions {
            name: field::string(o, "name", &[]),
            email: Some(EmailTemplate {
                from: field::string(o, "from", &[]),
                syntax: field::string(o, "syntax", &[]),
                subject: field::string(o, "subject", &[]),
                body: field::string(o, "template", &[]),
            })
            .filter(|x| *x != EmailTemplate::default()),
            totp: expand_totp(o),
            disable_signup: field::bool(o, "disable_signup", &[]),
            brute_force_protection: field::bool(o, "brute_force_protection", &[]),
            auth_params: field::string_map(o, "auth_params", &[]),
            common: expand_common(o)?,
        }),
        Strategy::Sms => ConnectionOptions::Sms(SmsOptions {
            name: field::string(o, "name", &[]),
            from: field::string(o, "from", &[]),
            syntax: field::string(o, "syntax", &[]),
            template: field::string(o, "template", &[]),
            twilio_sid: field::string(o, "twilio_sid", &[]),
            twilio_token: field::string(o, "twilio_token", &[]),
            messaging_service_sid: field::string(o, "messaging_service_sid", &[]),
            totp: expand_totp(o),
            disable_signup: field::bool(o, "disable_signup", &[]),
            brute_force_protection: field::bool(o, "brute_force_protection", &[]),
            provider: field::string(o, "provider", &[]),
            gateway_url: field::string(o, "gateway_url", &[]),
            forward_request_info: field::bool(o, "forward_request_info", &[]),
            gateway_authentication: o.first_block("gateway_authentication").map(|g| {
                GatewayAuthentication {
                    method: field::string(&g, "method", &[]),
                    subject: field::string(&g, "subject", &[]),
                    audience: field::string(&g, "audience", &[]),
                    secret: field::string(&g, "secret", &[]),
                    secret_base64_encoded: field::bool(&g, "secret_base64_encoded", &[]),
                }
            }),
            common: expand_common(o)?,
        }),
        Strategy::Oidc => {
            let mut options = OidcOptions {
                client_id: field::string(o, "client_id", &[]),
                client_secret: field::string(o, "client_secret", &[]),
                icon_url: field::string(o, "icon_url", &[]),
                domain_aliases: field::string_list(o, "domain_aliases", &[]),
                tenant_domain: field::string(o, "tenant_domain", &[]),
                r#type: field::string(o, "type", &[]),
                issuer: field::string(o, "issuer", &[]),
                jwks_uri: field::string(o, "jwks_uri", &[]),
                discovery_url: field::string(o, "discovery_url", &[]),
                token_endpoint: field::string(o, "token_endpoint", &[]),
                userinfo_endpoint: field::string(o, "userinfo_endpoint", &[]),
                authorization_endpoint: field::string(o, "authorization_endpoint", &[]),
                common: expand_common(o)?,
                ..Default::default()
            };
            expand_scopes(o, &mut options);
            ConnectionOptions::Oidc(options)
        }
        Strategy::Okta => {
            let mut options = OktaOptions {
                client_id: field::string(o, "client_id", &[]),
                client_secret: field::string(o, "client_secret", &[]),
                domain: field::string(o, "domain", &[]),
                domain_aliases: field::string_list(o, "domain_aliases", &[]),
                issuer: field::string(o, "issuer", &[]),
                jwks_uri: field::string(o, "jwks_uri", &[]),
                token_endpoint: field::string(o, "token_endpoint", &[]),
                userinfo_endpoint: field::string(o, "userinfo_endpoint", &[]),
                authorization_endpoint: field::string(o, "authorization_endpoint", &[]),
                icon_url: field::string(o, "icon_url", &[]),
                common: expand_common(o)?,
                ..Default::default()
            };
            expand_scopes(o, &mut options);
            ConnectionOptions::Okta(options)
        }
        Strategy::Ad => ConnectionOptions::Ad(AdOptions {
            domain_aliases: field::string_list(o, "domain_aliases", &[]),
            tenant_domain: field::string(o, "tenant_domain", &[]),
            icon_url: field::string(o, "icon_url", &[]),
            ips: field::string_list(o, "ips", &[]),
            use_cert_auth: field::bool(o, "use_cert_auth", &[]),
            use_kerberos: field::bool(o, "use_kerberos", &[]),
            disable_cache: field::bool(o, "disable_cache", &[]),
            brute_force_protection: field::bool(o, "brute_force_protection", &[]),
            common: expand_common(o)?,
        }),
        Strategy::AzureAd => {
            let mut options = AzureAdOptions {
                client_id: field::string(o, "client_id", &[]),
                client_secret: field::string(o, "client_secret", &[]),
                app_id: field::string(o, "app_id", &[]),
                tenant_domain: field::string(o, "tenant_domain", &[]),
                domain: field::string(o, "domain", &[]),
                domain_aliases: field::string_list(o, "domain_aliases", &[]),
                icon_url: field::string(o, "icon_url", &[]),
                identity_api: field::string(o, "identity_api", &[]),
                waad_protocol: field::string(o, "waad_protocol", &[]),
                use_wsfed: field::bool(o, "use_wsfed", &[]),
                use_common_endpoint: field::bool(o, "use_common_endpoint", &[]),
                max_groups_to_retrieve: field::string(o, "max_groups_to_retrieve", &[]),
                api_enable_users: field::bool(o, "api_enable_users", &[]),
                should_trust_email_verified_connection: field::string(
                    o,
                    "should_trust_email_verified_connection",
                    &[],
                ),
                common: expand_common(o)?,
                ..Default::default()
            };
            expand_scopes(o, &mut options);
            ConnectionOptions::AzureAd(options)
        }
        Strategy::Adfs => ConnectionOptions::Adfs(AdfsOptions {
            adfs_server: field::string(o, "adfs_server", &[]),
            fed_metadata_xml: field::string(o, "fed_metadata_xml", &[]),
            sign_in_endpoint: field::string(o, "sign_in_endpoint", &[]),
            tenant_domain: field::string(o, "tenant_domain", &[]),
            domain_aliases: field::string_list(o, "domain_aliases", &[]),
            icon_url: field::string(o, "icon_url", &[]),
            api_enable_users: field::bool(o, "api_enable_users", &[]),
            should_trust_email_verified_connection: field::string(
                o,
                "should_trust_email_verified_connection",
                &[],
            ),
            common: expand_common(o)?,
        }),
        Strategy::PingFederate => ConnectionOptions::PingFederate(PingFederateOptions {
            signing_cert: field::string(o, "signing_cert", &[]),
            sign_in_endpoint: field::string(o, "sign_in_endpoint", &[]),
            digest_algorithm: field::string(o, "digest_algorithm", &[]),
            sign_saml_request: field::bool(o, "sign_saml_request", &[]),
            signature_algorithm: field::string(o, "signature_algorithm", &[]),
            tenant_domain: field::string(o, "tenant_domain", &[]),
            domain_aliases: field::string_list(o, "domain_aliases", &[]),
            icon_url: field::string(o, "icon_url", &[]),
            ping_federate_base_url: field::string(o, "ping_federate_base_url", &[]),
            idp_initiated: expand_idp_initiated(o),
            common: expand_common(o)?,
        }),
        Strategy::Samlp => ConnectionOptions::Saml(SamlOptions {
            signing_cert: field::string(o, "signing_cert", &[]),
            signing_key: o.first_block("signing_key").map(|k| SigningKey {
                key: field::string(&k, "key", &[]),
                cert: field::string(&k, "cert", &[]),
            }),
            protocol_binding: field::string(o, "protocol_binding", &[]),
            debug: field::bool(o, "debug", &[]),
            sign_in_endpoint: field::string(o, "sign_in_endpoint", &[]),
            sign_out_endpoint: field::string(o, "sign_out_endpoint", &[]),
            disable_sign_out: field::bool(o, "disable_sign_out", &[]),
            signature_algorithm: field::string(o, "signature_algorithm", &[]),
            digest_algorithm: field::string(o, "digest_algorithm", &[]),
            tenant_domain: field::string(o, "tenant_domain", &[]),
            domain_aliases: field::string_list(o, "domain_aliases", &[]),
            icon_url: field::string(o, "icon_url", &[]),
            entity_id: field::string(o, "entity_id", &[]),
            metadata_url: field::string(o, "metadata_url", &[]),
            metadata_xml: field::string(o, "metadata_xml", &[]),
            sign_saml_request: field::bool(o, "sign_saml_request", &[]),
            user_id_attribute: field::string(o, "user_id_attribute", &[]),
            fields_map: field::json_map(o, "fields_map", &[])?,
            idp_initiated: expand_idp_initiated(o),
            common: expand_common(o)?,
        }),
    })
}

fn expand_database(o: &Scope<'_>) -> Result<DatabaseOptions, ProviderError> {
    Ok(DatabaseOptions {
        validation: o.first_block("validation").map(|v| Validation {
            username: v.first_block("username").map(|u| UsernameValidation {
                min: field::int(&u, "min", &[]),
                max: field::int(&u, "max", &[]),
            }),
        }),
        password_policy: field::string(o, "password_policy", &[]),
        password_history: o.first_block("password_history").map(|x| PasswordHistory {
            enable: field::bool(&x, "enable", &[]),
            size: field::int(&x, "size", &[]),
        }),
        password_no_personal_info: o.first_block("password_no_personal_info").map(|x| {
            PasswordNoPersonalInfo {
                enable: field::bool(&x, "enable", &[]),
            }
        }),
        password_dictionary: o.first_block("password_dictionary").map(|x| PasswordDictionary {
            enable: field::bool(&x, "enable", &[]),
            dictionary: field::string_list(&x, "dictionary", &[]),
        }),
        password_complexity_options: o.first_block("password_complexity_options").map(|x| {
            PasswordComplexityOptions {
                min_length: field::int(&x, "min_length", &[]),
            }
        }),
        enabled_database_customization: field::bool(o, "enabled_database_customization", &[]),
        brute_force_protection: field::bool(o, "brute_force_protection", &[]),
        import_mode: field::bool(o, "import_mode", &[]),
        disable_signup: field::bool(o, "disable_signup", &[]),
        disable_self_service_change_password: field::bool(
            o,
            "disable_self_service_change_password",
            &[],
        ),
        requires_username: field::bool(o, "requires_username", &[]),
        custom_scripts: field::string_map(o, "custom_scripts", &[]),
        configuration: field::string_map(o, "configuration", &[Condition::HasChange]),
        mfa: o.first_block("mfa").map(|x| MfaOptions {
            active: field::bool(&x, "active", &[]),
            return_enroll_settings: field::bool(&x, "return_enroll_settings", &[]),
        }),
        common: expand_common(o)?,
    })
}

/// Attributes every strategy understands.
pub(super) fn expand_common(o: &Scope<'_>) -> Result<CommonOptions, ProviderError> {
    Ok(CommonOptions {
        non_persistent_attrs: field::string_list(o, "non_persistent_attrs", &[]),
        set_user_root_attributes: field::string(o, "set_user_root_attributes", &[]),
        upstream_params: field::json_map(o, "upstream_params", &[])?,
    })
}

/// Toggle the scopes added to or removed from the `scopes` set since the last pass.
pub(super) fn expand_scopes<T: ScopeToggle>(o: &Scope<'_>, options: &mut T) {
    let enabled: Vec<String> = o
        .get_old("scopes")
        .and_then(Value::as_list)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(ToString::to_string)
                .collect()
        })
        .unwrap_or_default();
    options.seed_scopes(&enabled);

    let delta = diff::string_set(o, "scopes");
    for scope in delta.to_add {
        options.set_scopes(true, &[scope]);
    }
    for scope in delta.to_remove {
        options.set_scopes(false, &[scope]);
    }
}

fn expand_totp(o: &Scope<'_>) -> Option<Totp> {
    o.first_block("totp").map(|x| Totp {
        time_step: field::int(&x, "time_step", &[]),
        length: field::int(&x, "length", &[]),
    })
}

fn expand_idp_initiated(o: &Scope<'_>) -> Option<IdpInitiated> {
    o.first_block("idp_initiated").map(|x| IdpInitiated {
        client_id: field::string(&x, "client_id", &[]),
        client_protocol: field::string(&x, "client_protocol", &[]),
        client_authorize_query: field::string(&x, "client_authorize_query", &[]),
    })
}
