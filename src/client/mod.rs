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
//! # Clients
//!
//! Applications of the tenant. Changing `client_secret_rotation_trigger` rotates the client
//! secret; the trigger value itself is never sent.

use async_trait::async_trait;
#[cfg(test)]
use mockall::mock;
use tracing::{debug, info};

pub mod types;

use crate::error::{Diagnostics, Phase, ProviderError};
use crate::expand::{self as field, Condition};
use crate::management::ApiError;
use crate::provider::{Reconcile, ensure_updatable, ignore_not_found, read_failed, require_id};
use crate::schema::{AttributeType, BlockBuilder, ResourceData, Schema, nested};
pub use types::*;

const RESOURCE: &str = "client";

#[async_trait]
pub trait ClientApi: Send + Sync {
    async fn create_client(&self, client: Client) -> Result<Client, ApiError>;

    async fn get_client<'a>(&self, id: &'a str) -> Result<Client, ApiError>;

    async fn update_client<'a>(&self, id: &'a str, client: Client) -> Result<Client, ApiError>;

    async fn delete_client<'a>(&self, id: &'a str) -> Result<(), ApiError>;

    /// Generate a new client secret.
    async fn rotate_client_secret<'a>(&self, id: &'a str) -> Result<Client, ApiError>;
}

#[cfg(test)]
mock! {
    pub ClientClient {}

    #[async_trait]
    impl ClientApi for ClientClient {
        async fn create_client(&self, client: Client) -> Result<Client, ApiError>;

        async fn get_client<'a>(&self, id: &'a str) -> Result<Client, ApiError>;

        async fn update_client<'a>(&self, id: &'a str, client: Client) -> Result<Client, ApiError>;

        async fn delete_client<'a>(&self, id: &'a str) -> Result<(), ApiError>;

        async fn rotate_client_secret<'a>(&self, id: &'a str) -> Result<Client, ApiError>;
    }

    impl Clone for ClientClient {
        fn clone(&self) -> Self;
    }
}

pub fn schema() -> Schema {
    Schema::new()
        .attribute("name", AttributeType::String)
        .attribute("description", AttributeType::String)
        .attribute("app_type", AttributeType::String)
        .attribute("logo_uri", AttributeType::String)
        .attribute("callbacks", AttributeType::string_list())
        .attribute("allowed_origins", AttributeType::string_list())
        .attribute("web_origins", AttributeType::string_list())
        .attribute("allowed_logout_urls", AttributeType::string_list())
        .attribute("grant_types", AttributeType::string_list())
        .attribute("is_first_party", AttributeType::Bool)
        .attribute("oidc_conformant", AttributeType::Bool)
        .attribute("sso", AttributeType::Bool)
        .attribute("cross_origin_auth", AttributeType::Bool)
        .attribute("token_endpoint_auth_method", AttributeType::String)
        .attribute(
            "jwt_configuration",
            AttributeType::Block(
                Schema::new()
                    .attribute("lifetime_in_seconds", AttributeType::Int)
                    .attribute("secret_encoded", AttributeType::Bool)
                    .attribute("scopes", AttributeType::Map)
                    .attribute("alg", AttributeType::String),
            ),
        )
        .attribute("client_metadata", AttributeType::Map)
        .attribute("client_id", AttributeType::String)
        .attribute("client_secret", AttributeType::String)
        .attribute("client_secret_rotation_trigger", AttributeType::Map)
}

fn expand_client(d: &ResourceData) -> Client {
    let s = d.scope();
    let changed = [Condition::HasChange];
    Client {
        name: field::string(&s, "name", &changed),
        description: field::string(&s, "description", &changed),
        app_type: field::string(&s, "app_type", &changed),
        logo_uri: field::string(&s, "logo_uri", &changed),
        callbacks: field::string_list(&s, "callbacks", &changed),
        allowed_origins: field::string_list(&s, "allowed_origins", &changed),
        web_origins: field::string_list(&s, "web_origins", &changed),
        allowed_logout_urls: field::string_list(&s, "allowed_logout_urls", &changed),
        grant_types: field::string_list(&s, "grant_types", &changed),
        is_first_party: field::bool(&s, "is_first_party", &changed),
        oidc_conformant: field::bool(&s, "oidc_conformant", &changed),
        sso: field::bool(&s, "sso", &changed),
        cross_origin_auth: field::bool(&s, "cross_origin_auth", &changed),
        token_endpoint_auth_method: field::string(&s, "token_endpoint_auth_method", &changed),
        jwt_configuration: s
            .first_block("jwt_configuration")
            .filter(|_| s.has_change("jwt_configuration"))
            .map(|j| JwtConfiguration {
                lifetime_in_seconds: field::int(&j, "lifetime_in_seconds", &[]),
                secret_encoded: field::bool(&j, "secret_encoded", &[Condition::IsNewResource]),
                scopes: field::string_map(&j, "scopes", &[]),
                alg: field::string(&j, "alg", &[]),
            })
            .filter(|x| *x != JwtConfiguration::default()),
        client_metadata: field::string_map(&s, "client_metadata", &changed),
        ..Default::default()
    }
}

/// Payload create (for a new resource) or update would send.
pub fn plan(d: &ResourceData) -> Result<serde_json::Value, ProviderError> {
    Ok(serde_json::to_value(expand_client(d))?)
}

/// Reconciler of `auth0_client`.
#[derive(Clone, Debug)]
pub struct ClientResource<A> {
    api: A,
}

impl<A: ClientApi> ClientResource<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }
}

#[async_trait]
impl<A: ClientApi + 'static> Reconcile for ClientResource<A> {
    fn type_name(&self) -> &'static str {
        "auth0_client"
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
            .create_client(expand_client(d))
            .await
            .map_err(|err| ProviderError::remote(RESOURCE, Phase::Create, err))?;
        d.set_id(
            created
                .client_id
                .ok_or_else(|| ProviderError::MissingId(RESOURCE.into()))?,
        );
        self.read(d).await
    }

    #[tracing::instrument(level = "debug", skip(self, d))]
    async fn read(&self, d: &mut ResourceData) -> Result<(), ProviderError> {
        let id = require_id(d, RESOURCE)?;
        let client = match self.api.get_client(&id).await {
            Ok(client) => client,
            Err(err) => return read_failed(d, RESOURCE, err),
        };
        let mut errors = Diagnostics::default();
        errors.collect(d.set("client_id", client.client_id));
        errors.collect(d.set("client_secret", client.client_secret));
        errors.collect(d.set("name", client.name));
        errors.collect(d.set("description", client.description));
        errors.collect(d.set("app_type", client.app_type));
        errors.collect(d.set("logo_uri", client.logo_uri));
        errors.collect(d.set("callbacks", client.callbacks));
        errors.collect(d.set("allowed_origins", client.allowed_origins));
        errors.collect(d.set("web_origins", client.web_origins));
        errors.collect(d.set("allowed_logout_urls", client.allowed_logout_urls));
        errors.collect(d.set("grant_types", client.grant_types));
        errors.collect(d.set("is_first_party", client.is_first_party));
        errors.collect(d.set("oidc_conformant", client.oidc_conformant));
        errors.collect(d.set("sso", client.sso));
        errors.collect(d.set("cross_origin_auth", client.cross_origin_auth));
        errors.collect(d.set(
            "token_endpoint_auth_method",
            client.token_endpoint_auth_method,
        ));
        errors.collect(d.set(
            "jwt_configuration",
            nested(client.jwt_configuration.map(|j| {
                BlockBuilder::new()
                    .put("lifetime_in_seconds", j.lifetime_in_seconds)
                    .put("secret_encoded", j.secret_encoded)
                    .put("scopes", j.scopes)
                    .put("alg", j.alg)
                    .build()
            })),
        ));
        errors.collect(d.set("client_metadata", client.client_metadata));
        errors.into_result()
    }

    #[tracing::instrument(level = "debug", skip(self, d))]
    async fn update(&self, d: &mut ResourceData) -> Result<(), ProviderError> {
        ensure_updatable(d, RESOURCE)?;
        let id = require_id(d, RESOURCE)?;
        let client = expand_client(d);
        if client == Client::default() {
            debug!("client {} has no changes to send", id);
        } else {
            self.api
                .update_client(&id, client)
                .await
                .map_err(|err| ProviderError::remote(RESOURCE, Phase::Update, err))?;
        }
        if d.has_change("client_secret_rotation_trigger") {
            info!("rotating the secret of client {}", id);
            self.api
                .rotate_client_secret(&id)
                .await
                .map_err(|err| ProviderError::remote(RESOURCE, Phase::Update, err))?;
        }
        self.read(d).await
    }

    #[tracing::instrument(level = "debug", skip(self, d))]
    async fn delete(&self, d: &mut ResourceData) -> Result<(), ProviderError> {
        let id = require_id(d, RESOURCE)?;
        ignore_not_found(RESOURCE, Phase::Delete, self.api.delete_client(&id).await)?;
        d.clear_id();
        Ok(())
    }
}
