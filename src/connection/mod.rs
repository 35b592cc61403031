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
//! # Connections
//!
//! A connection is the source of users of the tenant. Its `options` depend on the `strategy`,
//! which selects one of the [`ConnectionOptions`] variants. The strategy can not be changed
//! in place: a different strategy (or name) replaces the connection.

use async_trait::async_trait;
#[cfg(test)]
use mockall::mock;
use tracing::debug;

mod expand;
mod flatten;
pub mod types;

use crate::error::{Phase, ProviderError};
use crate::management::ApiError;
use crate::provider::{Reconcile, ensure_updatable, ignore_not_found, read_failed, require_id};
use crate::schema::{AttributeType, ResourceData, Schema};
use expand::expand_connection;
use flatten::flatten_connection;
pub use types::*;

const RESOURCE: &str = "connection";

#[async_trait]
pub trait ConnectionApi: Send + Sync {
    async fn create_connection(&self, connection: Connection) -> Result<Connection, ApiError>;

    async fn get_connection<'a>(&self, id: &'a str) -> Result<Connection, ApiError>;

    async fn update_connection<'a>(
        &self,
        id: &'a str,
        connection: Connection,
    ) -> Result<Connection, ApiError>;

    async fn delete_connection<'a>(&self, id: &'a str) -> Result<(), ApiError>;
}

#[cfg(test)]
mock! {
    pub ConnectionClient {}

    #[async_trait]
    impl ConnectionApi for ConnectionClient {
        async fn create_connection(&self, connection: Connection) -> Result<Connection, ApiError>;

        async fn get_connection<'a>(&self, id: &'a str) -> Result<Connection, ApiError>;

        async fn update_connection<'a>(
            &self,
            id: &'a str,
            connection: Connection,
        ) -> Result<Connection, ApiError>;

        async fn delete_connection<'a>(&self, id: &'a str) -> Result<(), ApiError>;
    }

    impl Clone for ConnectionClient {
        fn clone(&self) -> Self;
    }
}

/// Attributes of the options block, the union over all strategies.
fn options_schema() -> Schema {
    let flag = |name| Schema::new().attribute(name, AttributeType::Bool);
    Schema::new()
        .attribute("non_persistent_attrs", AttributeType::string_set())
        .attribute("set_user_root_attributes", AttributeType::String)
        .attribute("upstream_params", AttributeType::String)
        .attribute("scopes", AttributeType::string_set())
        .attribute("client_id", AttributeType::String)
        .attribute("client_secret", AttributeType::String)
        .attribute("allowed_audiences", AttributeType::string_set())
        .attribute("domain", AttributeType::String)
        .attribute("tenant_domain", AttributeType::String)
        .attribute("domain_aliases", AttributeType::string_set())
        .attribute("api_enable_users", AttributeType::Bool)
        .attribute("icon_url", AttributeType::String)
        .attribute("map_user_id_to_id", AttributeType::Bool)
        .attribute("authorization_endpoint", AttributeType::String)
        .attribute("token_endpoint", AttributeType::String)
        .attribute("userinfo_endpoint", AttributeType::String)
        .attribute("issuer", AttributeType::String)
        .attribute("jwks_uri", AttributeType::String)
        .attribute("discovery_url", AttributeType::String)
        .attribute("type", AttributeType::String)
        .attribute("scripts", AttributeType::Map)
        .attribute("pkce_enabled", AttributeType::Bool)
        .attribute("team_id", AttributeType::String)
        .attribute("key_id", AttributeType::String)
        .attribute("strategy_version", AttributeType::Int)
        .attribute("community_base_url", AttributeType::String)
        // database
        .attribute(
            "validation",
            AttributeType::Block(Schema::new().attribute(
                "username",
                AttributeType::Block(
                    Schema::new()
                        .attribute("min", AttributeType::Int)
                        .attribute("max", AttributeType::Int),
                ),
            )),
        )
        .attribute("password_policy", AttributeType::String)
        .attribute(
            "password_history",
            AttributeType::Block(flag("enable").attribute("size", AttributeType::Int)),
        )
        .attribute(
            "password_no_personal_info",
            AttributeType::Block(flag("enable")),
        )
        .attribute(
            "password_dictionary",
            AttributeType::Block(
                flag("enable").attribute("dictionary", AttributeType::string_set()),
            ),
        )
        .attribute(
            "password_complexity_options",
            AttributeType::Block(Schema::new().attribute("min_length", AttributeType::Int)),
        )
        .attribute("enabled_database_customization", AttributeType::Bool)
        .attribute("brute_force_protection", AttributeType::Bool)
        .attribute("import_mode", AttributeType::Bool)
        .attribute("disable_signup", AttributeType::Bool)
        .attribute("disable_self_service_change_password", AttributeType::Bool)
        .attribute("requires_username", AttributeType::Bool)
        .attribute("custom_scripts", AttributeType::Map)
        .attribute("configuration", AttributeType::Map)
        .attribute(
            "mfa",
            AttributeType::Block(flag("active").attribute("return_enroll_settings", AttributeType::Bool)),
        )
        // passwordless
        .attribute("name", AttributeType::String)
        .attribute("from", AttributeType::String)
        .attribute("syntax", AttributeType::String)
        .attribute("subject", AttributeType::String)
        .attribute("template", AttributeType::String)
        .attribute(
            "totp",
            AttributeType::Block(
                Schema::new()
                    .attribute("time_step", AttributeType::Int)
                    .attribute("length", AttributeType::Int),
            ),
        )
        .attribute("auth_params", AttributeType::Map)
        .attribute("twilio_sid", AttributeType::String)
        .attribute("twilio_token", AttributeType::String)
        .attribute("messaging_service_sid", AttributeType::String)
        .attribute("provider", AttributeType::String)
        .attribute("gateway_url", AttributeType::String)
        .attribute("forward_request_info", AttributeType::Bool)
        .attribute(
            "gateway_authentication",
            AttributeType::Block(
                Schema::new()
                    .attribute("method", AttributeType::String)
                    .attribute("subject", AttributeType::String)
                    .attribute("audience", AttributeType::String)
                    .attribute("secret", AttributeType::String)
                    .attribute("secret_base64_encoded", AttributeType::Bool),
            ),
        )
        // enterprise
        .attribute("ips", AttributeType::string_set())
        .attribute("use_cert_auth", AttributeType::Bool)
        .attribute("use_kerberos", AttributeType::Bool)
        .attribute("disable_cache", AttributeType::Bool)
        .attribute("app_id", AttributeType::String)
        .attribute("identity_api", AttributeType::String)
        .attribute("waad_protocol", AttributeType::String)
        .attribute("use_wsfed", AttributeType::Bool)
        .attribute("use_common_endpoint", AttributeType::Bool)
        .attribute("max_groups_to_retrieve", AttributeType::String)
        .attribute("should_trust_email_verified_connection", AttributeType::String)
        .attribute("adfs_server", AttributeType::String)
        .attribute("fed_metadata_xml", AttributeType::String)
        .attribute("sign_in_endpoint", AttributeType::String)
        .attribute("sign_out_endpoint", AttributeType::String)
        .attribute("disable_sign_out", AttributeType::Bool)
        .attribute("signing_cert", AttributeType::String)
        .attribute(
            "signing_key",
            AttributeType::Block(
                Schema::new()
                    .attribute("key", AttributeType::String)
                    .attribute("cert", AttributeType::String),
            ),
        )
        .attribute("protocol_binding", AttributeType::String)
        .attribute("debug", AttributeType::Bool)
        .attribute("signature_algorithm", AttributeType::String)
        .attribute("digest_algorithm", AttributeType::String)
        .attribute("sign_saml_request", AttributeType::Bool)
        .attribute("ping_federate_base_url", AttributeType::String)
        .attribute("entity_id", AttributeType::String)
        .attribute("metadata_url", AttributeType::String)
        .attribute("metadata_xml", AttributeType::String)
        .attribute("user_id_attribute", AttributeType::String)
        .attribute("fields_map", AttributeType::String)
        .attribute(
            "idp_initiated",
            AttributeType::Block(
                Schema::new()
                    .attribute("client_id", AttributeType::String)
                    .attribute("client_protocol", AttributeType::String)
                    .attribute("client_authorize_query", AttributeType::String),
            ),
        )
}

pub fn schema() -> Schema {
    Schema::new()
        .force_new("name", AttributeType::String)
        .force_new("strategy", AttributeType::String)
        .attribute("display_name", AttributeType::String)
        .attribute("is_domain_connection", AttributeType::Bool)
        .attribute("show_as_button", AttributeType::Bool)
        .attribute("realms", AttributeType::string_list())
        .attribute("metadata", AttributeType::Map)
        .attribute("options", AttributeType::Block(options_schema()))
}

/// Payload create (for a new resource) or update would send.
pub fn plan(d: &ResourceData) -> Result<serde_json::Value, ProviderError> {
    Ok(serde_json::to_value(expand_connection(d)?)?)
}

/// Reconciler of `auth0_connection`.
#[derive(Clone, Debug)]
pub struct ConnectionResource<A> {
    api: A,
}

impl<A: ConnectionApi> ConnectionResource<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }
}

#[async_trait]
impl<A: ConnectionApi + 'static> Reconcile for ConnectionResource<A> {
    fn type_name(&self) -> &'static str {
        "auth0_connection"
    }

    fn schema(&self) -> Schema {
        schema()
    }

    fn plan(&self, d: &ResourceData) -> Result<serde_json::Value, ProviderError> {
        plan(d)
    }

    #[tracing::instrument(level = "debug", skip(self, d))]
    async fn create(&self, d: &mut ResourceData) -> Result<(), ProviderError> {
        let connection = expand_connection(d)?;
        let created = self
            .api
            .create_connection(connection)
            .await
            .map_err(|err| ProviderError::remote(RESOURCE, Phase::Create, err))?;
        d.set_id(
            created
                .id
                .ok_or_else(|| ProviderError::MissingId(RESOURCE.into()))?,
        );
        self.read(d).await
    }

    #[tracing::instrument(level = "debug", skip(self, d))]
    async fn read(&self, d: &mut ResourceData) -> Result<(), ProviderError> {
        let id = require_id(d, RESOURCE)?;
        match self.api.get_connection(&id).await {
            Ok(connection) => flatten_connection(d, &connection),
            Err(err) => read_failed(d, RESOURCE, err),
        }
    }

    #[tracing::instrument(level = "debug", skip(self, d))]
    async fn update(&self, d: &mut ResourceData) -> Result<(), ProviderError> {
        ensure_updatable(d, RESOURCE)?;
        let id = require_id(d, RESOURCE)?;
        let connection = expand_connection(d)?;
        if connection == Connection::default() {
            debug!("connection {} has no changes to send", id);
        } else {
            self.api
                .update_connection(&id, connection)
                .await
                .map_err(|err| ProviderError::remote(RESOURCE, Phase::Update, err))?;
        }
        self.read(d).await
    }

    #[tracing::instrument(level = "debug", skip(self, d))]
    async fn delete(&self, d: &mut ResourceData) -> Result<(), ProviderError> {
        let id = require_id(d, RESOURCE)?;
        ignore_not_found(RESOURCE, Phase::Delete, self.api.delete_connection(&id).await)?;
        d.clear_id();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tracing_test::traced_test;

    use super::*;
    use crate::schema::{Block, Value};

    fn tree(value: serde_json::Value) -> Block {
        ResourceData::block_from_json(&value).unwrap()
    }

    fn remote() -> Connection {
        ConnectionBuilder::default()
            .id("con_1")
            .name("db")
            .strategy(Strategy::Auth0)
            .options(ConnectionOptions::Database(DatabaseOptions {
                disable_signup: Some(true),
                ..Default::default()
            }))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_create() {
        let mut api = MockConnectionClient::default();
        api.expect_create_connection()
            .withf(|c: &Connection| {
                c.name.as_deref() == Some("db")
                    && c.strategy == Some(Strategy::Auth0)
                    && c.id.is_none()
            })
            .returning(|_| Ok(remote()));
        api.expect_get_connection()
            .withf(|id: &'_ str| id == "con_1")
            .returning(|_| Ok(remote()));

        let mut d = ResourceData::new_resource(
            schema(),
            tree(json!({"name": "db", "strategy": "auth0", "options": [{"disable_signup": true}]})),
        );
        ConnectionResource::new(api).create(&mut d).await.unwrap();
        assert_eq!(Some("con_1"), d.id());
        assert_eq!(Some(&Value::Bool(true)), d.get("options.0.disable_signup"));
    }

    #[tokio::test]
    async fn test_create_error() {
        let mut api = MockConnectionClient::default();
        api.expect_create_connection()
            .returning(|_| Err(ApiError::status(400, "bad options")));

        let mut d = ResourceData::new_resource(
            schema(),
            tree(json!({"name": "db", "strategy": "auth0"})),
        );
        match ConnectionResource::new(api).create(&mut d).await {
            Err(ProviderError::RemoteFatal { phase, .. }) => assert_eq!(Phase::Create, phase),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(None, d.id());
    }

    #[tokio::test]
    #[traced_test]
    async fn test_update_without_changes() {
        let mut api = MockConnectionClient::default();
        api.expect_update_connection().never();
        api.expect_get_connection()
            .withf(|id: &'_ str| id == "con_1")
            .times(1)
            .returning(|_| Ok(remote()));

        let state = tree(json!({
            "name": "db",
            "strategy": "auth0",
            "options": [{"disable_signup": true}]
        }));
        let mut d = ResourceData::from_state(schema(), "con_1", state);
        ConnectionResource::new(api).update(&mut d).await.unwrap();
        assert!(logs_contain("has no changes to send"));
    }

    #[tokio::test]
    async fn test_update() {
        let mut api = MockConnectionClient::default();
        api.expect_update_connection()
            .withf(|id: &'_ str, c: &Connection| {
                id == "con_1"
                    && c.display_name.as_deref() == Some("Database")
                    && c.options.is_none()
                    && c.name.is_none()
            })
            .returning(|_, _| Ok(remote()));
        api.expect_get_connection().returning(|_| Ok(remote()));

        let mut d = ResourceData::existing(
            schema(),
            "con_1",
            tree(json!({"name": "db", "strategy": "auth0"})),
            tree(json!({"name": "db", "strategy": "auth0", "display_name": "Database"})),
        );
        ConnectionResource::new(api).update(&mut d).await.unwrap();
    }

    #[tokio::test]
    async fn test_update_strategy_requires_replacement() {
        let mut api = MockConnectionClient::default();
        api.expect_update_connection().never();

        let mut d = ResourceData::existing(
            schema(),
            "con_1",
            tree(json!({"name": "db", "strategy": "auth0"})),
            tree(json!({"name": "db", "strategy": "oidc"})),
        );
        assert!(matches!(
            ConnectionResource::new(api).update(&mut d).await,
            Err(ProviderError::ReplacementRequired { .. })
        ));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_read_gone() {
        let mut api = MockConnectionClient::default();
        api.expect_get_connection()
            .returning(|_| Err(ApiError::not_found("The connection does not exist")));

        let mut d = ResourceData::from_state(schema(), "con_1", Block::new());
        ConnectionResource::new(api).read(&mut d).await.unwrap();
        assert_eq!(None, d.id());
        assert!(logs_contain("no longer exists"));
    }

    #[tokio::test]
    async fn test_delete_not_found() {
        let mut api = MockConnectionClient::default();
        api.expect_delete_connection()
            .withf(|id: &'_ str| id == "con_1")
            .returning(|_| Err(ApiError::not_found("The connection does not exist")));

        let mut d = ResourceData::from_state(schema(), "con_1", Block::new());
        ConnectionResource::new(api).delete(&mut d).await.unwrap();
        assert_eq!(None, d.id());
    }

    #[tokio::test]
    async fn test_delete_error() {
        let mut api = MockConnectionClient::default();
        api.expect_delete_connection()
            .returning(|_| Err(ApiError::status(503, "unavailable")));

        let mut d = ResourceData::from_state(schema(), "con_1", Block::new());
        let res = ConnectionResource::new(api).delete(&mut d).await;
        assert!(matches!(res, Err(ProviderError::RemoteTransient { .. })));
        assert_eq!(Some("con_1"), d.id());
    }

    #[test]
    fn test_plan() {
        let d = ResourceData::new_resource(
            schema(),
            tree(json!({"name": "db", "strategy": "auth0", "options": [{"disable_signup": false}]})),
        );
        assert_eq!(
            json!({"name": "db", "strategy": "auth0", "options": {"disable_signup": false}}),
            ConnectionResource::new(MockConnectionClient::default())
                .plan(&d)
                .unwrap()
        );
    }
}
