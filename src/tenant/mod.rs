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
//! # Tenant
//!
//! Settings of the tenant itself. The tenant always exists: create applies the configured
//! settings to it and delete only forgets the id.

use async_trait::async_trait;
#[cfg(test)]
use mockall::mock;
use tracing::{debug, info};

pub mod types;

use crate::error::{Diagnostics, Phase, ProviderError};
use crate::expand::{self as field, Condition};
use crate::management::ApiError;
use crate::provider::{Reconcile, read_failed};
use crate::schema::{AttributeType, BlockBuilder, ResourceData, Schema, nested};
pub use types::*;
use types::FLAGS;

const RESOURCE: &str = "tenant";

/// Id of the singleton.
pub const TENANT_ID: &str = "tenant";

#[async_trait]
pub trait TenantApi: Send + Sync {
    async fn get_tenant(&self) -> Result<Tenant, ApiError>;

    async fn update_tenant(&self, tenant: Tenant) -> Result<Tenant, ApiError>;
}

#[cfg(test)]
mock! {
    pub TenantClient {}

    #[async_trait]
    impl TenantApi for TenantClient {
        async fn get_tenant(&self) -> Result<Tenant, ApiError>;

        async fn update_tenant(&self, tenant: Tenant) -> Result<Tenant, ApiError>;
    }

    impl Clone for TenantClient {
        fn clone(&self) -> Self;
    }
}

pub fn schema() -> Schema {
    Schema::new()
        .attribute("friendly_name", AttributeType::String)
        .attribute("picture_url", AttributeType::String)
        .attribute("support_email", AttributeType::String)
        .attribute("support_url", AttributeType::String)
        .attribute("allowed_logout_urls", AttributeType::string_list())
        .attribute("session_lifetime", AttributeType::Float)
        .attribute("idle_session_lifetime", AttributeType::Float)
        .attribute("default_audience", AttributeType::String)
        .attribute("default_directory", AttributeType::String)
        .attribute("default_redirection_uri", AttributeType::String)
        .attribute("enabled_locales", AttributeType::string_list())
        .attribute("sandbox_version", AttributeType::String)
        .attribute(
            "flags",
            AttributeType::Block(FLAGS.iter().fold(Schema::new(), |schema, (name, _, _)| {
                schema.attribute(*name, AttributeType::Bool)
            })),
        )
}

fn expand_flags(d: &ResourceData) -> Option<TenantFlags> {
    let s = d.scope();
    let f = s.first_block("flags")?;
    let mut flags = TenantFlags::default();
    for (name, _, set) in FLAGS {
        set(&mut flags, field::bool(&f, name, &[Condition::HasChange]));
    }
    Some(flags).filter(|x| *x != TenantFlags::default())
}

fn expand_tenant(d: &ResourceData) -> Tenant {
    let s = d.scope();
    let changed = [Condition::HasChange];
    Tenant {
        friendly_name: field::string(&s, "friendly_name", &changed),
        picture_url: field::string(&s, "picture_url", &changed),
        support_email: field::string(&s, "support_email", &changed),
        support_url: field::string(&s, "support_url", &changed),
        allowed_logout_urls: field::string_list(&s, "allowed_logout_urls", &changed),
        session_lifetime: field::float(&s, "session_lifetime", &changed),
        idle_session_lifetime: field::float(&s, "idle_session_lifetime", &changed),
        default_audience: field::string(&s, "default_audience", &changed),
        default_directory: field::string(&s, "default_directory", &changed),
        default_redirection_uri: field::string(&s, "default_redirection_uri", &changed),
        enabled_locales: field::string_list(&s, "enabled_locales", &changed),
        sandbox_version: field::string(&s, "sandbox_version", &changed),
        flags: expand_flags(d),
    }
}

/// Payload create (for a new resource) or update would send.
pub fn plan(d: &ResourceData) -> Result<serde_json::Value, ProviderError> {
    Ok(serde_json::to_value(expand_tenant(d))?)
}

/// Reconciler of `auth0_tenant`.
#[derive(Clone, Debug)]
pub struct TenantResource<A> {
    api: A,
}

impl<A: TenantApi> TenantResource<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }

    async fn apply(&self, d: &ResourceData, phase: Phase) -> Result<(), ProviderError> {
        let tenant = expand_tenant(d);
        if tenant == Tenant::default() {
            debug!("tenant has no changes to send");
            return Ok(());
        }
        self.api
            .update_tenant(tenant)
            .await
            .map_err(|err| ProviderError::remote(RESOURCE, phase, err))?;
        Ok(())
    }
}

#[async_trait]
impl<A: TenantApi + 'static> Reconcile for TenantResource<A> {
    fn type_name(&self) -> &'static str {
        "auth0_tenant"
    }

    fn schema(&self) -> Schema {
        schema()
    }

    fn plan(&self, d: &ResourceData) -> Result<serde_json::Value, ProviderError> {
        plan(d)
    }

    #[tracing::instrument(level = "debug", skip(self, d))]
    async fn create(&self, d: &mut ResourceData) -> Result<(), ProviderError> {
        d.set_id(TENANT_ID);
        self.apply(d, Phase::Create).await?;
        self.read(d).await
    }

    #[tracing::instrument(level = "debug", skip(self, d))]
    async fn read(&self, d: &mut ResourceData) -> Result<(), ProviderError> {
        let tenant = match self.api.get_tenant().await {
            Ok(tenant) => tenant,
            Err(err) => return read_failed(d, RESOURCE, err),
        };
        let mut errors = Diagnostics::default();
        errors.collect(d.set("friendly_name", tenant.friendly_name));
        errors.collect(d.set("picture_url", tenant.picture_url));
        errors.collect(d.set("support_email", tenant.support_email));
        errors.collect(d.set("support_url", tenant.support_url));
        errors.collect(d.set("allowed_logout_urls", tenant.allowed_logout_urls));
        errors.collect(d.set("session_lifetime", tenant.session_lifetime));
        errors.collect(d.set("idle_session_lifetime", tenant.idle_session_lifetime));
        errors.collect(d.set("default_audience", tenant.default_audience));
        errors.collect(d.set("default_directory", tenant.default_directory));
        errors.collect(d.set("default_redirection_uri", tenant.default_redirection_uri));
        errors.collect(d.set("enabled_locales", tenant.enabled_locales));
        errors.collect(d.set("sandbox_version", tenant.sandbox_version));
        errors.collect(d.set(
            "flags",
            nested(tenant.flags.map(|flags| {
                FLAGS
                    .iter()
                    .fold(BlockBuilder::new(), |b, (name, get, _)| {
                        b.put(name, get(&flags))
                    })
                    .build()
            })),
        ));
        errors.into_result()
    }

    #[tracing::instrument(level = "debug", skip(self, d))]
    async fn update(&self, d: &mut ResourceData) -> Result<(), ProviderError> {
        self.apply(d, Phase::Update).await?;
        self.read(d).await
    }

    #[tracing::instrument(level = "debug", skip(self, d))]
    async fn delete(&self, d: &mut ResourceData) -> Result<(), ProviderError> {
        info!("tenant settings are left as they are, forgetting the resource");
        d.clear_id();
        Ok(())
    }
}
