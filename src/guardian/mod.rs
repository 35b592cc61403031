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
//! # Guardian
//!
//! Tenant wide multi-factor authentication settings. There is exactly one such resource per
//! tenant, so create only records a fixed id and delete switches every factor off.

use async_trait::async_trait;
#[cfg(test)]
use mockall::mock;
use tracing::debug;

pub mod types;

use crate::error::{Diagnostics, Phase, ProviderError};
use crate::expand::{self as field, Condition};
use crate::management::ApiError;
use crate::provider::{Reconcile, ignore_not_found, read_failed};
use crate::schema::{AttributeType, ResourceData, Schema};
pub use types::*;

const RESOURCE: &str = "guardian";

/// Id of the singleton.
pub const GUARDIAN_ID: &str = "guardian";

/// Policy applied when no policy is configured.
const NO_POLICY: &str = "never";

#[async_trait]
pub trait GuardianApi: Send + Sync {
    async fn list_factors(&self) -> Result<Vec<FactorStatus>, ApiError>;

    async fn update_factor(&self, factor: Factor, enabled: bool) -> Result<(), ApiError>;

    async fn get_mfa_policies(&self) -> Result<Vec<String>, ApiError>;

    async fn update_mfa_policies(&self, policies: Vec<String>) -> Result<(), ApiError>;
}

#[cfg(test)]
mock! {
    pub GuardianClient {}

    #[async_trait]
    impl GuardianApi for GuardianClient {
        async fn list_factors(&self) -> Result<Vec<FactorStatus>, ApiError>;

        async fn update_factor(&self, factor: Factor, enabled: bool) -> Result<(), ApiError>;

        async fn get_mfa_policies(&self) -> Result<Vec<String>, ApiError>;

        async fn update_mfa_policies(&self, policies: Vec<String>) -> Result<(), ApiError>;
    }

    impl Clone for GuardianClient {
        fn clone(&self) -> Self;
    }
}

pub fn schema() -> Schema {
    Factor::ALL.iter().fold(
        Schema::new().attribute("policy", AttributeType::String),
        |schema, factor| schema.attribute(factor.attribute(), AttributeType::Bool),
    )
}

fn expand_guardian(d: &ResourceData) -> GuardianChanges {
    let s = d.scope();
    let changed = [Condition::HasChange];
    GuardianChanges {
        policy: field::string(&s, "policy", &changed),
        factors: Factor::ALL
            .into_iter()
            .filter_map(|factor| {
                field::bool(&s, factor.attribute(), &changed).map(|enabled| (factor, enabled))
            })
            .collect(),
    }
}

/// Payload create (for a new resource) or update would send.
pub fn plan(d: &ResourceData) -> Result<serde_json::Value, ProviderError> {
    Ok(serde_json::to_value(expand_guardian(d))?)
}

/// Reconciler of `auth0_guardian`.
#[derive(Clone, Debug)]
pub struct GuardianResource<A> {
    api: A,
}

impl<A: GuardianApi> GuardianResource<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }

    async fn apply(&self, changes: GuardianChanges, phase: Phase) -> Result<(), ProviderError> {
        if changes.is_empty() {
            debug!("guardian has no changes to send");
            return Ok(());
        }
        if let Some(policy) = changes.policy {
            let policies = if policy == NO_POLICY {
                Vec::new()
            } else {
                vec![policy]
            };
            self.api
                .update_mfa_policies(policies)
                .await
                .map_err(|err| ProviderError::remote(RESOURCE, phase, err))?;
        }
        for (factor, enabled) in changes.factors {
            debug!("setting factor {} enabled={}", factor, enabled);
            self.api
                .update_factor(factor, enabled)
                .await
                .map_err(|err| ProviderError::remote(RESOURCE, phase, err))?;
        }
        Ok(())
    }
}

#[async_trait]
impl<A: GuardianApi + 'static> Reconcile for GuardianResource<A> {
    fn type_name(&self) -> &'static str {
        "auth0_guardian"
    }

    fn schema(&self) -> Schema {
        schema()
    }

    fn plan(&self, d: &ResourceData) -> Result<serde_json::Value, ProviderError> {
        plan(d)
    }

    #[tracing::instrument(level = "debug", skip(self, d))]
    async fn create(&self, d: &mut ResourceData) -> Result<(), ProviderError> {
        d.set_id(GUARDIAN_ID);
        self.apply(expand_guardian(d), Phase::Create).await?;
        self.read(d).await
    }

    #[tracing::instrument(level = "debug", skip(self, d))]
    async fn read(&self, d: &mut ResourceData) -> Result<(), ProviderError> {
        let factors = match self.api.list_factors().await {
            Ok(factors) => factors,
            Err(err) => return read_failed(d, RESOURCE, err),
        };
        let policies = match self.api.get_mfa_policies().await {
            Ok(policies) => policies,
            Err(err) => return read_failed(d, RESOURCE, err),
        };
        let mut errors = Diagnostics::default();
        errors.collect(d.set(
            "policy",
            policies
                .into_iter()
                .next()
                .unwrap_or_else(|| NO_POLICY.to_string()),
        ));
        for status in factors {
            match status.name.parse::<Factor>() {
                Ok(factor) => {
                    errors.collect(d.set(factor.attribute(), status.enabled));
                }
                Err(_) => debug!("ignoring unknown factor {}", status.name),
            }
        }
        errors.into_result()
    }

    #[tracing::instrument(level = "debug", skip(self, d))]
    async fn update(&self, d: &mut ResourceData) -> Result<(), ProviderError> {
        self.apply(expand_guardian(d), Phase::Update).await?;
        self.read(d).await
    }

    #[tracing::instrument(level = "debug", skip(self, d))]
    async fn delete(&self, d: &mut ResourceData) -> Result<(), ProviderError> {
        ignore_not_found(
            RESOURCE,
            Phase::Delete,
            self.api.update_mfa_policies(Vec::new()).await,
        )?;
        for factor in Factor::ALL {
            ignore_not_found(
                RESOURCE,
                Phase::Delete,
                self.api.update_factor(factor, false).await,
            )?;
        }
        d.clear_id();
        Ok(())
    }
}
