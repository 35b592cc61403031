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
//! Connection response to configuration tree.

use tracing::warn;

use crate::error::{Diagnostics, ProviderError};
use crate::schema::{Block, BlockBuilder, ResourceData, nested};

use super::types::*;

/// Option attributes the API never echoes back.
const SECRETS: [&str; 4] = ["client_secret", "twilio_token", "signing_key", "configuration"];

pub(super) fn flatten_connection(
    d: &mut ResourceData,
    connection: &Connection,
) -> Result<(), ProviderError> {
    let mut errors = Diagnostics::default();
    errors.collect(d.set("name", connection.name.clone()));
    errors.collect(d.set("display_name", connection.display_name.clone()));
    errors.collect(d.set("strategy", connection.strategy.map(|x| x.as_str())));
    errors.collect(d.set("is_domain_connection", connection.is_domain_connection));
    errors.collect(d.set("show_as_button", connection.show_as_button));
    errors.collect(d.set("realms", connection.realms.clone()));
    errors.collect(d.set("metadata", connection.metadata.clone()));

    if let Some(options) = flatten_options(connection.options.as_ref()) {
        let mut options = BlockBuilder::from(options);
        for secret in SECRETS {
            if !options.contains(secret) {
                let prior = d.get(&format!("options.0.{secret}")).cloned();
                options = options.put(secret, prior);
            }
        }
        errors.collect(d.set("options", nested(Some(options.build()))));
    }
    errors.into_result()
}

/// Options block of the response, `None` when there is nothing the tree can hold.
pub(super) fn flatten_options(options: Option<&ConnectionOptions>) -> Option<Block> {
    let block = match options? {
        ConnectionOptions::Database(o) => flatten_common(BlockBuilder::new(), &o.common)
            .group(
                "validation",
                o.validation.as_ref().map(|v| {
                    BlockBuilder::new()
                        .group(
                            "username",
                            v.username.as_ref().map(|u| {
                                BlockBuilder::new()
                                    .put("min", u.min)
                                    .put("max", u.max)
                                    .build()
                            }),
                        )
                        .build()
                }),
            )
            .put("password_policy", o.password_policy.clone())
            .group(
                "password_history",
                o.password_history.as_ref().map(|x| {
                    BlockBuilder::new()
                        .put("enable", x.enable)
                        .put("size", x.size)
                        .build()
                }),
            )
            .group(
                "password_no_personal_info",
                o.password_no_personal_info
                    .as_ref()
                    .map(|x| BlockBuilder::new().put("enable", x.enable).build()),
            )
            .group(
                "password_dictionary",
                o.password_dictionary.as_ref().map(|x| {
                    BlockBuilder::new()
                        .put("enable", x.enable)
                        .put("dictionary", x.dictionary.clone())
                        .build()
                }),
            )
            .group(
                "password_complexity_options",
                o.password_complexity_options
                    .as_ref()
                    .map(|x| BlockBuilder::new().put("min_length", x.min_length).build()),
            )
            .put(
                "enabled_database_customization",
                o.enabled_database_customization,
            )
            .put("brute_force_protection", o.brute_force_protection)
            .put("import_mode", o.import_mode)
            .put("disable_signup", o.disable_signup)
            .put(
                "disable_self_service_change_password",
                o.disable_self_service_change_password,
            )
            .put("requires_username", o.requires_username)
            .put("custom_scripts", o.custom_scripts.clone())
            .put("configuration", o.configuration.clone())
            .group(
                "mfa",
                o.mfa.as_ref().map(|x| {
                    BlockBuilder::new()
                        .put("active", x.active)
                        .put("return_enroll_settings", x.return_enroll_settings)
                        .build()
                }),
            ),
        ConnectionOptions::GoogleOAuth2(o) => flatten_scopes(flatten_common(BlockBuilder::new(), &o.common), o)
            .put("client_id", o.client_id.clone())
            .put("client_secret", o.client_secret.clone())
            .put("allowed_audiences", o.allowed_audiences.clone()),
        ConnectionOptions::GoogleApps(o) => flatten_common(BlockBuilder::new(), &o.common)
            .put("client_id", o.client_id.clone())
            .put("client_secret", o.client_secret.clone())
            .put("domain", o.domain.clone())
            .put("tenant_domain", o.tenant_domain.clone())
            .put("domain_aliases", o.domain_aliases.clone())
            .put("api_enable_users", o.api_enable_users)
            .put("icon_url", o.icon_url.clone())
            .put("map_user_id_to_id", o.map_user_id_to_id),
        ConnectionOptions::OAuth2(o) => flatten_scopes(flatten_common(BlockBuilder::new(), &o.common), o)
            .put("client_id", o.client_id.clone())
            .put("client_secret", o.client_secret.clone())
            .put("authorization_endpoint", o.authorization_endpoint.clone())
            .put("token_endpoint", o.token_endpoint.clone())
            .put("scripts", o.scripts.clone())
            .put("icon_url", o.icon_url.clone())
            .put("pkce_enabled", o.pkce_enabled),
        ConnectionOptions::Facebook(o) => flatten_scopes(flatten_common(BlockBuilder::new(), &o.common), o)
            .put("client_id", o.client_id.clone())
            .put("client_secret", o.client_secret.clone()),
        ConnectionOptions::Apple(o) => flatten_scopes(flatten_common(BlockBuilder::new(), &o.common), o)
            .put("client_id", o.client_id.clone())
            .put("client_secret", o.client_secret.clone())
            .put("team_id", o.team_id.clone())
            .put("key_id", o.key_id.clone()),
        ConnectionOptions::LinkedIn(o) => flatten_scopes(flatten_common(BlockBuilder::new(), &o.common), o)
            .put("client_id", o.client_id.clone())
            .put("client_secret", o.client_secret.clone())
            .put("strategy_version", o.strategy_version),
        ConnectionOptions::GitHub(o) => flatten_scopes(flatten_common(BlockBuilder::new(), &o.common), o)
            .put("client_id", o.client_id.clone())
            .put("client_secret", o.client_secret.clone()),
        ConnectionOptions::WindowsLive(o) => flatten_scopes(flatten_common(BlockBuilder::new(), &o.common), o)
            .put("client_id", o.client_id.clone())
            .put("client_secret", o.client_secret.clone())
            .put("strategy_version", o.strategy_version),
        ConnectionOptions::Salesforce(o) => flatten_scopes(flatten_common(BlockBuilder::new(), &o.common), o)
            .put("client_id", o.client_id.clone())
            .put("client_secret", o.client_secret.clone())
            .put("community_base_url", o.community_base_url.clone()),
        ConnectionOptions::Email(o) => {
            let template = o.email.clone().unwrap_or_default();
            flatten_common(BlockBuilder::new(), &o.common)
                .put("name", o.name.clone())
                .put("from", template.from)
                .put("syntax", template.syntax)
                .put("subject", template.subject)
                .put("template", template.body)
                .group("totp", flatten_totp(o.totp.as_ref()))
                .put("disable_signup", o.disable_signup)
                .put("brute_force_protection", o.brute_force_protection)
                .put("auth_params", o.auth_params.clone())
        }
        ConnectionOptions::Sms(o) => flatten_common(BlockBuilder::new(), &o.common)
            .put("name", o.name.clone())
            .put("from", o.from.clone())
            .put("syntax", o.syntax.clone())
            .put("template", o.template.clone())
            .put("twilio_sid", o.twilio_sid.clone())
            .put("twilio_token", o.twilio_token.clone())
            .put("messaging_service_sid", o.messaging_service_sid.clone())
            .group("totp", flatten_totp(o.totp.as_ref()))
            .put("disable_signup", o.disable_signup)
            .put("brute_force_protection", o.brute_force_protection)
            .put("provider", o.provider.clone())
            .put("gateway_url", o.gateway_url.clone())
            .put("forward_request_info", o.forward_request_info)
            .group(
                "gateway_authentication",
                o.gateway_authentication.as_ref().map(|g| {
                    BlockBuilder::new()
                        .put("method", g.method.clone())
                        .put("subject", g.subject.clone())
                        .put("audience", g.audience.clone())
                        .put("secret", g.secret.clone())
                        .put("secret_base64_encoded", g.secret_base64_encoded)
                        .build()
                }),
            ),
        ConnectionOptions::Oidc(o) => flatten_scopes(flatten_common(BlockBuilder::new(), &o.common), o)
            .put("client_id", o.client_id.clone())
            .put("client_secret", o.client_secret.clone())
            .put("icon_url", o.icon_url.clone())
            .put("domain_aliases", o.domain_aliases.clone())
            .put("tenant_domain", o.tenant_domain.clone())
            .put("type", o.r#type.clone())
            .put("issuer", o.issuer.clone())
            .put("jwks_uri", o.jwks_uri.clone())
            .put("discovery_url", o.discovery_url.clone())
            .put("token_endpoint", o.token_endpoint.clone())
            .put("userinfo_endpoint", o.userinfo_endpoint.clone())
            .put("authorization_endpoint", o.authorization_endpoint.clone()),
        ConnectionOptions::Okta(o) => flatten_scopes(flatten_common(BlockBuilder::new(), &o.common), o)
            .put("client_id", o.client_id.clone())
            .put("client_secret", o.client_secret.clone())
            .put("domain", o.domain.clone())
            .put("domain_aliases", o.domain_aliases.clone())
            .put("issuer", o.issuer.clone())
            .put("jwks_uri", o.jwks_uri.clone())
            .put("token_endpoint", o.token_endpoint.clone())
            .put("userinfo_endpoint", o.userinfo_endpoint.clone())
            .put("authorization_endpoint", o.authorization_endpoint.clone())
            .put("icon_url", o.icon_url.clone()),
        ConnectionOptions::Ad(o) => flatten_common(BlockBuilder::new(), &o.common)
            .put("domain_aliases", o.domain_aliases.clone())
            .put("tenant_domain", o.tenant_domain.clone())
            .put("icon_url", o.icon_url.clone())
            .put("ips", o.ips.clone())
            .put("use_cert_auth", o.use_cert_auth)
            .put("use_kerberos", o.use_kerberos)
            .put("disable_cache", o.disable_cache)
            .put("brute_force_protection", o.brute_force_protection),
        ConnectionOptions::AzureAd(o) => flatten_scopes(flatten_common(BlockBuilder::new(), &o.common), o)
            .put("client_id", o.client_id.clone())
            .put("client_secret", o.client_secret.clone())
            .put("app_id", o.app_id.clone())
            .put("tenant_domain", o.tenant_domain.clone())
            .put("domain", o.domain.clone())
            .put("domain_aliases", o.domain_aliases.clone())
            .put("icon_url", o.icon_url.clone())
            .put("identity_api", o.identity_api.clone())
            .put("waad_protocol", o.waad_protocol.clone())
            .put("use_wsfed", o.use_wsfed)
            .put("use_common_endpoint", o.use_common_endpoint)
            .put("max_groups_to_retrieve", o.max_groups_to_retrieve.clone())
            .put("api_enable_users", o.api_enable_users)
            .put(
                "should_trust_email_verified_connection",
                o.should_trust_email_verified_connection.clone(),
            ),
        ConnectionOptions::Adfs(o) => flatten_common(BlockBuilder::new(), &o.common)
            .put("adfs_server", o.adfs_server.clone())
            .put("fed_metadata_xml", o.fed_metadata_xml.clone())
            .put("sign_in_endpoint", o.sign_in_endpoint.clone())
            .put("tenant_domain", o.tenant_domain.clone())
            .put("domain_aliases", o.domain_aliases.clone())
            .put("icon_url", o.icon_url.clone())
            .put("api_enable_users", o.api_enable_users)
            .put(
                "should_trust_email_verified_connection",
                o.should_trust_email_verified_connection.clone(),
            ),
        ConnectionOptions::PingFederate(o) => flatten_common(BlockBuilder::new(), &o.common)
            .put("signing_cert", o.signing_cert.clone())
            .put("sign_in_endpoint", o.sign_in_endpoint.clone())
            .put("digest_algorithm", o.digest_algorithm.clone())
            .put("sign_saml_request", o.sign_saml_request)
            .put("signature_algorithm", o.signature_algorithm.clone())
            .put("tenant_domain", o.tenant_domain.clone())
            .put("domain_aliases", o.domain_aliases.clone())
            .put("icon_url", o.icon_url.clone())
            .put("ping_federate_base_url", o.ping_federate_base_url.clone())
            .group("idp_initiated", flatten_idp_initiated(o.idp_initiated.as_ref())),
        ConnectionOptions::Saml(o) => flatten_common(BlockBuilder::new(), &o.common)
            .put("signing_cert", o.signing_cert.clone())
            .group(
                "signing_key",
                o.signing_key.as_ref().map(|k| {
                    BlockBuilder::new()
                        .put("key", k.key.clone())
                        .put("cert", k.cert.clone())
                        .build()
                }),
            )
            .put("protocol_binding", o.protocol_binding.clone())
            .put("debug", o.debug)
            .put("sign_in_endpoint", o.sign_in_endpoint.clone())
            .put("sign_out_endpoint", o.sign_out_endpoint.clone())
            .put("disable_sign_out", o.disable_sign_out)
            .put("signature_algorithm", o.signature_algorithm.clone())
            .put("digest_algorithm", o.digest_algorithm.clone())
            .put("tenant_domain", o.tenant_domain.clone())
            .put("domain_aliases", o.domain_aliases.clone())
            .put("icon_url", o.icon_url.clone())
            .put("entity_id", o.entity_id.clone())
            .put("metadata_url", o.metadata_url.clone())
            .put("metadata_xml", o.metadata_xml.clone())
            .put("sign_saml_request", o.sign_saml_request)
            .put("user_id_attribute", o.user_id_attribute.clone())
            .put(
                "fields_map",
                o.fields_map
                    .as_ref()
                    .and_then(|x| serde_json::to_string(x).ok()),
            )
            .group("idp_initiated", flatten_idp_initiated(o.idp_initiated.as_ref())),
        ConnectionOptions::Unmapped(o) => {
            warn!(
                "connection options of strategy `{}` are not mapped, skipping them",
                o.strategy
            );
            return None;
        }
    };
    Some(block.build())
}

fn flatten_common(b: BlockBuilder, common: &CommonOptions) -> BlockBuilder {
    b.put("non_persistent_attrs", common.non_persistent_attrs.clone())
        .put(
            "set_user_root_attributes",
            common.set_user_root_attributes.clone(),
        )
        .put(
            "upstream_params",
            common
                .upstream_params
                .as_ref()
                .and_then(|x| serde_json::to_string(x).ok()),
        )
}

fn flatten_scopes<T: ScopeToggle>(b: BlockBuilder, options: &T) -> BlockBuilder {
    b.put("scopes", Some(options.scopes()).filter(|x| !x.is_empty()))
}

fn flatten_totp(totp: Option<&Totp>) -> Option<Block> {
    totp.map(|x| {
        BlockBuilder::new()
            .put("time_step", x.time_step)
            .put("length", x.length)
            .build()
    })
}

fn flatten_idp_initiated(idp: Option<&IdpInitiated>) -> Option<Block> {
    idp.map(|x| {
        BlockBuilder::new()
            .put("client_id", x.client_id.clone())
            .put("client_protocol", x.client_protocol.clone())
            .put("client_authorize_query", x.client_authorize_query.clone())
            .build()
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tracing_test::traced_test;

    use super::*;
    use crate::connection::expand::expand_options;
    use crate::connection::schema;
    use crate::schema::Value;

    fn tree(value: serde_json::Value) -> Block {
        ResourceData::block_from_json(&value).unwrap()
    }

    /// Variant every strategy is expected to land in.
    fn variant(options: &ConnectionOptions) -> &'static str {
        match options {
            ConnectionOptions::Database(_) => "database",
            ConnectionOptions::GoogleOAuth2(_) => "google-oauth2",
            ConnectionOptions::GoogleApps(_) => "google-apps",
            ConnectionOptions::OAuth2(_) => "oauth2",
            ConnectionOptions::Facebook(_) => "facebook",
            ConnectionOptions::Apple(_) => "apple",
            ConnectionOptions::LinkedIn(_) => "linkedin",
            ConnectionOptions::GitHub(_) => "github",
            ConnectionOptions::WindowsLive(_) => "windowslive",
            ConnectionOptions::Salesforce(_) => "salesforce",
            ConnectionOptions::Email(_) => "email",
            ConnectionOptions::Sms(_) => "sms",
            ConnectionOptions::Oidc(_) => "oidc",
            ConnectionOptions::Okta(_) => "okta",
            ConnectionOptions::Ad(_) => "ad",
            ConnectionOptions::AzureAd(_) => "waad",
            ConnectionOptions::Adfs(_) => "adfs",
            ConnectionOptions::PingFederate(_) => "pingfederate",
            ConnectionOptions::Saml(_) => "samlp",
            ConnectionOptions::Unmapped(_) => "unmapped",
        }
    }

    #[test]
    fn test_every_strategy_round_trips() {
        let options = json!({
            "non_persistent_attrs": ["ethnicity", "gender"],
            "set_user_root_attributes": "on_each_login",
            "upstream_params": "{\"screen_name\":{\"alias\":\"login_hint\"}}"
        });
        let mut variants = std::collections::BTreeSet::new();
        for strategy in Strategy::ALL {
            let d = ResourceData::new_resource(
                schema(),
                tree(json!({"name": "c", "strategy": strategy.as_str(), "options": [options]})),
            );
            let expanded = expand_options(strategy, &d.scope().first_block("options").unwrap())
                .unwrap();
            variants.insert(variant(&expanded));

            let remote = Connection {
                id: Some("con_1".into()),
                strategy: Some(strategy),
                options: Some(expanded),
                ..Default::default()
            };
            let mut state = ResourceData::from_state(schema(), "con_1", Block::new());
            flatten_connection(&mut state, &remote).unwrap();
            assert_eq!(
                Some(&Value::List(vec![Value::Block(tree(options.clone()))])),
                state.get("options"),
                "{strategy}"
            );
            assert_eq!(Some(&Value::from(strategy.as_str())), state.get("strategy"));
        }
        assert_eq!(19, variants.len());
        assert!(!variants.contains("unmapped"));
    }

    #[test]
    fn test_scopes_round_trip() {
        let d = ResourceData::new_resource(
            schema(),
            tree(json!({
                "name": "c",
                "strategy": "google-oauth2",
                "options": [{"client_id": "id", "scopes": ["email", "profile"]}]
            })),
        );
        let expanded =
            expand_options(Strategy::GoogleOAuth2, &d.scope().first_block("options").unwrap())
                .unwrap();
        let block = flatten_options(Some(&expanded)).unwrap();
        assert_eq!(
            Some(&Value::List(vec!["email".into(), "profile".into()])),
            block.get("scopes")
        );
        assert_eq!(Some(&Value::from("id")), block.get("client_id"));
    }

    #[test]
    fn test_secrets_preserved() {
        let mut d = ResourceData::from_state(
            schema(),
            "con_1",
            tree(json!({
                "strategy": "facebook",
                "options": [{"client_id": "id", "client_secret": "secret"}]
            })),
        );
        let remote = Connection {
            strategy: Some(Strategy::Facebook),
            options: Some(ConnectionOptions::Facebook(FacebookOptions {
                client_id: Some("id2".into()),
                ..Default::default()
            })),
            ..Default::default()
        };
        flatten_connection(&mut d, &remote).unwrap();
        assert_eq!(Some(&Value::from("id2")), d.get("options.0.client_id"));
        assert_eq!(Some(&Value::from("secret")), d.get("options.0.client_secret"));
    }

    #[test]
    #[traced_test]
    fn test_unmapped_options_skipped() {
        let mut d = ResourceData::from_state(
            schema(),
            "con_1",
            tree(json!({"strategy": "auth0", "options": [{"disable_signup": true}]})),
        );
        let remote = Connection {
            name: Some("legacy".into()),
            options: Some(ConnectionOptions::Unmapped(UnmappedOptions {
                strategy: "myspace".into(),
                raw: serde_json::Map::new(),
            })),
            ..Default::default()
        };
        flatten_connection(&mut d, &remote).unwrap();
        assert_eq!(Some(&Value::from("legacy")), d.get("name"));
        assert_eq!(Some(&Value::Bool(true)), d.get("options.0.disable_signup"));
        assert!(logs_contain("`myspace` are not mapped"));
    }
}
