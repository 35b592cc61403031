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
//! # Resource servers
//!
//! APIs and the scopes they define.

use async_trait::async_trait;
#[cfg(test)]
use mockall::mock;
use tracing::debug;

pub mod types;

use crate::diff;
use crate::error::{Diagnostics, Phase, ProviderError};
use crate::expand::{self as field, Condition};
use crate::management::ApiError;
use crate::provider::{Reconcile, ensure_updatable, ignore_not_found, read_failed, require_id};
use crate::schema::{AttributeType, BlockBuilder, ResourceData, Schema, Value};
pub use types::*;

const RESOURCE: &str = "resource server";

#[async_trait]
pub trait ResourceServerApi: Send + Sync {
    async fn create_resource_server(
        &self,
        server: ResourceServer,
    ) -> Result<ResourceServer, ApiError>;

    async fn get_resource_server<'a>(&self, id: &'a str) -> Result<ResourceServer, ApiError>;

    async fn update_resource_server<'a>(
        &self,
        id: &'a str,
        server: ResourceServer,
    ) -> Result<ResourceServer, ApiError>;

    async fn delete_resource_server<'a>(&self, id: &'a str) -> Result<(), ApiError>;

    async fn add_resource_server_scopes<'a>(
        &self,
        id: &'a str,
        scopes: Vec<ResourceServerScope>,
    ) -> Result<(), ApiError>;

    async fn update_resource_server_scope<'a>(
        &self,
        id: &'a str,
        scope: ResourceServerScope,
    ) -> Result<(), ApiError>;

    async fn remove_resource_server_scopes<'a>(
        &self,
        id: &'a str,
        scopes: Vec<String>,
    ) -> Result<(), ApiError>;
}

#[cfg(test)]
mock! {
    pub ResourceServerClient {}

    #[async_trait]
    impl ResourceServerApi for ResourceServerClient {
        async fn create_resource_server(
            &self,
            server: ResourceServer,
        ) -> Result<ResourceServer, ApiError>;

        async fn get_resource_server<'a>(&self, id: &'a str) -> Result<ResourceServer, ApiError>;

        async fn update_resource_server<'a>(
            &self,
            id: &'a str,
            server: ResourceServer,
        ) -> Result<ResourceServer, ApiError>;

        async fn delete_resource_server<'a>(&self, id: &'a str) -> Result<(), ApiError>;

        async fn add_resource_server_scopes<'a>(
            &self,
            id: &'a str,
            scopes: Vec<ResourceServerScope>,
        ) -> Result<(), ApiError>;

        async fn update_resource_server_scope<'a>(
            &self,
            id: &'a str,
            scope: ResourceServerScope,
        ) -> Result<(), ApiError>;

        async fn remove_resource_server_scopes<'a>(
            &self,
            id: &'a str,
            scopes: Vec<String>,
        ) -> Result<(), ApiError>;
    }

    impl Clone for ResourceServerClient {
        fn clone(&self) -> Self;
    }
}

pub fn schema() -> Schema {
    Schema::new()
        .force_new("identifier", AttributeType::String)
        .attribute("name", AttributeType::String)
        .attribute("signing_alg", AttributeType::String)
        .attribute("signing_secret", AttributeType::String)
        .attribute("allow_offline_access", AttributeType::Bool)
        .attribute("token_lifetime", AttributeType::Int)
        .attribute("token_lifetime_for_web", AttributeType::Int)
        .attribute(
            "skip_consent_for_verifiable_first_party_clients",
            AttributeType::Bool,
        )
        .attribute("enforce_policies", AttributeType::Bool)
        .attribute("token_dialect", AttributeType::String)
        .attribute(
            "scopes",
            AttributeType::BlockSet {
                schema: Schema::new()
                    .attribute("value", AttributeType::String)
                    .attribute("description", AttributeType::String),
                key: "value",
            },
        )
}

fn expand_resource_server(d: &ResourceData) -> ResourceServer {
    let s = d.scope();
    let changed = [Condition::HasChange];
    ResourceServer {
        identifier: field::string(&s, "identifier", &[Condition::IsNewResource]),
        name: field::string(&s, "name", &changed),
        signing_alg: field::string(&s, "signing_alg", &changed),
        signing_secret: field::string(&s, "signing_secret", &changed),
        allow_offline_access: field::bool(&s, "allow_offline_access", &changed),
        token_lifetime: field::int(&s, "token_lifetime", &changed),
        token_lifetime_for_web: field::int(&s, "token_lifetime_for_web", &changed),
        skip_consent_for_verifiable_first_party_clients: field::bool(
            &s,
            "skip_consent_for_verifiable_first_party_clients",
            &changed,
        ),
        enforce_policies: field::bool(&s, "enforce_policies", &changed),
        token_dialect: field::string(&s, "token_dialect", &changed),
        ..Default::default()
    }
}

fn expand_scope(value: &Value) -> Result<ResourceServerScope, ProviderError> {
    let get = |name: &str| {
        value
            .as_map()
            .and_then(|x| x.get(name))
            .and_then(Value::as_str)
    };
    let mut builder = ResourceServerScopeBuilder::default();
    if let Some(val) = get("value") {
        builder.value(val);
    }
    if let Some(val) = get("description") {
        builder.description(val);
    }
    builder.build().map_err(|err| ProviderError::Builder {
        resource: RESOURCE.into(),
        message: err.to_string(),
    })
}

/// Payload create (for a new resource) or update would send.
pub fn plan(d: &ResourceData) -> Result<serde_json::Value, ProviderError> {
    Ok(serde_json::to_value(expand_resource_server(d))?)
}

/// Reconciler of `auth0_resource_server`.
#[derive(Clone, Debug)]
pub struct ResourceServerResource<A> {
    api: A,
}

impl<A: ResourceServerApi> ResourceServerResource<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }

    async fn apply_scopes(&self, d: &ResourceData, id: &str) -> Result<(), ProviderError> {
        let delta = diff::collection(&d.scope(), "scopes", Some("value"))
            .try_map(|x| expand_scope(&x))?;
        if !delta.to_remove.is_empty() {
            let scopes: Vec<String> = delta.to_remove.into_iter().map(|x| x.value).collect();
            debug!("removing scopes {:?} of {}", scopes, id);
            ignore_not_found(
                RESOURCE,
                Phase::Update,
                self.api.remove_resource_server_scopes(id, scopes).await,
            )?;
        }
        if !delta.to_add.is_empty() {
            self.api
                .add_resource_server_scopes(id, delta.to_add)
                .await
                .map_err(|err| ProviderError::remote(RESOURCE, Phase::Update, err))?;
        }
        for scope in delta.changed {
            self.api
                .update_resource_server_scope(id, scope)
                .await
                .map_err(|err| ProviderError::remote(RESOURCE, Phase::Update, err))?;
        }
        Ok(())
    }
}

#[async_trait]
impl<A: ResourceServerApi + 'static> Reconcile for ResourceServerResource<A> {
    fn type_name(&self) -> &'static str {
        "auth0_resource_server"
    }

    fn schema(&self) -> Schema {
        schema()
    }

    fn plan(&self, d: &ResourceData) -> Result<serde_json::Value, ProviderError> {
        plan(d)
    }

    #[tracing::instrument(level = "debug", skip(self, d))]
    async fn create(&self, d: &mut ResourceData) -> Result<(), ProviderError> {
        let created = self
            .api
            .create_resource_server(expand_resource_server(d))
            .await
            .map_err(|err| ProviderError::remote(RESOURCE, Phase::Create, err))?;
        let id = created
            .id
            .ok_or_else(|| ProviderError::MissingId(RESOURCE.into()))?;
        d.set_id(id.clone());
        self.apply_scopes(d, &id).await?;
        self.read(d).await
    }

    #[tracing::instrument(level = "debug", skip(self, d))]
    async fn read(&self, d: &mut ResourceData) -> Result<(), ProviderError> {
        let id = require_id(d, RESOURCE)?;
        let server = match self.api.get_resource_server(&id).await {
            Ok(server) => server,
            Err(err) => return read_failed(d, RESOURCE, err),
        };
        let mut errors = Diagnostics::default();
        errors.collect(d.set("identifier", server.identifier));
        errors.collect(d.set("name", server.name));
        errors.collect(d.set("signing_alg", server.signing_alg));
        if server.signing_secret.is_some() {
            errors.collect(d.set("signing_secret", server.signing_secret));
        }
        errors.collect(d.set("allow_offline_access", server.allow_offline_access));
        errors.collect(d.set("token_lifetime", server.token_lifetime));
        errors.collect(d.set("token_lifetime_for_web", server.token_lifetime_for_web));
        errors.collect(d.set(
            "skip_consent_for_verifiable_first_party_clients",
            server.skip_consent_for_verifiable_first_party_clients,
        ));
        errors.collect(d.set("enforce_policies", server.enforce_policies));
        errors.collect(d.set("token_dialect", server.token_dialect));
        errors.collect(d.set(
            "scopes",
            Value::Set(
                server
                    .scopes
                    .unwrap_or_default()
                    .into_iter()
                    .map(|x| {
                        BlockBuilder::new()
                            .put("value", Some(x.value))
                            .put("description", x.description)
                            .build()
                            .into()
                    })
                    .collect(),
            ),
        ));
        errors.into_result()
    }

    #[tracing::instrument(level = "debug", skip(self, d))]
    async fn update(&self, d: &mut ResourceData) -> Result<(), ProviderError> {
        ensure_updatable(d, RESOURCE)?;
        let id = require_id(d, RESOURCE)?;
        let server = expand_resource_server(d);
        if server != ResourceServer::default() {
            self.api
                .update_resource_server(&id, server)
                .await
                .map_err(|err| ProviderError::remote(RESOURCE, Phase::Update, err))?;
        }
        self.apply_scopes(d, &id).await?;
        self.read(d).await
    }

    #[tracing::instrument(level = "debug", skip(self, d))]
    async fn delete(&self, d: &mut ResourceData) -> Result<(), ProviderError> {
        let id = require_id(d, RESOURCE)?;
        ignore_not_found(
            RESOURCE,
            Phase::Delete,
            self.api.delete_resource_server(&id).await,
        )?;
        d.clear_id();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::schema::Block;

    fn tree(value: serde_json::Value) -> Block {
        ResourceData::block_from_json(&value).unwrap()
    }

    fn scope(value: &str, description: &str) -> ResourceServerScope {
        ResourceServerScope {
            value: value.into(),
            description: Some(description.into()),
        }
    }

    #[tokio::test]
    async fn test_create() {
        let mut api = MockResourceServerClient::default();
        api.expect_create_resource_server()
            .withf(|server: &ResourceServer| {
                server.identifier.as_deref() == Some("https://api.example.com")
                    && server.signing_secret.as_deref() == Some("0123456789abcdef")
                    && server.scopes.is_none()
            })
            .returning(|_| {
                Ok(ResourceServerBuilder::default()
                    .id("rs_1")
                    .build()
                    .unwrap())
            });
        api.expect_add_resource_server_scopes()
            .withf(|id: &'_ str, scopes: &Vec<ResourceServerScope>| {
                id == "rs_1" && *scopes == vec![scope("read:items", "Read items")]
            })
            .returning(|_, _| Ok(()));
        api.expect_get_resource_server().returning(|_| {
            Ok(ResourceServerBuilder::default()
                .id("rs_1")
                .identifier("https://api.example.com")
                .scopes(vec![scope("read:items", "Read items")])
                .build()
                .unwrap())
        });

        let mut d = ResourceData::new_resource(
            schema(),
            tree(json!({
                "identifier": "https://api.example.com",
                "signing_secret": "0123456789abcdef",
                "scopes": [{"value": "read:items", "description": "Read items"}]
            })),
        );
        ResourceServerResource::new(api)
            .create(&mut d)
            .await
            .unwrap();
        assert_eq!(
            Some(&Value::from("0123456789abcdef")),
            d.get("signing_secret")
        );
        assert_eq!(Some(&Value::from("read:items")), d.get("scopes.0.value"));
    }

    #[tokio::test]
    async fn test_update_scopes() {
        let mut api = MockResourceServerClient::default();
        api.expect_update_resource_server()
            .withf(|_, server: &ResourceServer| {
                server.signing_secret.is_none() && server.name.as_deref() == Some("Items")
            })
            .returning(|_, _| Ok(ResourceServer::default()));
        api.expect_remove_resource_server_scopes()
            .withf(|_, scopes: &Vec<String>| *scopes == vec!["delete:items"])
            .returning(|_, _| Ok(()));
        api.expect_add_resource_server_scopes()
            .withf(|_, scopes: &Vec<ResourceServerScope>| {
                *scopes == vec![scope("write:items", "Write items")]
            })
            .returning(|_, _| Ok(()));
        api.expect_update_resource_server_scope()
            .withf(|_, x: &ResourceServerScope| *x == scope("read:items", "Read all items"))
            .times(1)
            .returning(|_, _| Ok(()));
        api.expect_get_resource_server()
            .returning(|_| Ok(ResourceServerBuilder::default().id("rs_1").build().unwrap()));

        let mut d = ResourceData::existing(
            schema(),
            "rs_1",
            tree(json!({
                "identifier": "https://api.example.com",
                "name": "API",
                "signing_secret": "0123456789abcdef",
                "scopes": [
                    {"value": "read:items", "description": "Read items"},
                    {"value": "delete:items", "description": "Delete items"}
                ]
            })),
            tree(json!({
                "identifier": "https://api.example.com",
                "name": "Items",
                "signing_secret": "0123456789abcdef",
                "scopes": [
                    {"value": "read:items", "description": "Read all items"},
                    {"value": "write:items", "description": "Write items"}
                ]
            })),
        );
        ResourceServerResource::new(api)
            .update(&mut d)
            .await
            .unwrap();
    }

    #[test]
    fn test_expand_scope_requires_identity() {
        let res = expand_scope(&tree(json!({"description": "Read"})).into());
        assert!(matches!(res, Err(ProviderError::Builder { .. })));
        assert_eq!(
            scope("read", "Read"),
            expand_scope(&tree(json!({"value": "read", "description": "Read"})).into()).unwrap()
        );
    }

    #[tokio::test]
    async fn test_keyless_scope_is_rejected() {
        let mut api = MockResourceServerClient::default();
        api.expect_update_resource_server().never();
        api.expect_remove_resource_server_scopes().never();
        api.expect_add_resource_server_scopes().never();
        api.expect_update_resource_server_scope().never();

        let mut d = ResourceData::existing(
            schema(),
            "rs_1",
            tree(json!({"identifier": "https://a", "scopes": [
                {"value": "read", "description": "Read"}
            ]})),
            tree(json!({"identifier": "https://a", "scopes": [
                {"value": "read", "description": "Read"},
                {"description": "Write"}
            ]})),
        );
        assert!(matches!(
            ResourceServerResource::new(api).update(&mut d).await,
            Err(ProviderError::Builder { .. })
        ));
    }

    #[tokio::test]
    async fn test_identifier_requires_replacement() {
        let mut api = MockResourceServerClient::default();
        api.expect_update_resource_server().never();
        let mut d = ResourceData::existing(
            schema(),
            "rs_1",
            tree(json!({"identifier": "https://a"})),
            tree(json!({"identifier": "https://b"})),
        );
        assert!(
            ResourceServerResource::new(api)
                .update(&mut d)
                .await
                .is_err()
        );
    }
}
