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
//! # Actions
//!
//! Actions are built asynchronously by the API. Whenever the code, the runtime, the dependencies
//! or the secrets change, the reconciler waits for the build to finish (within the configured
//! budget) and deploys the built version when `deploy` is set.

use std::time::Duration;

use async_trait::async_trait;
#[cfg(test)]
use mockall::mock;
use tracing::{debug, info};

pub mod types;

use crate::config::Config;
use crate::error::{Diagnostics, Phase, ProviderError};
use crate::expand::{self as field, Condition};
use crate::management::ApiError;
use crate::provider::{Reconcile, ensure_updatable, ignore_not_found, read_failed, require_id};
use crate::retry::{RetryError, retry};
use crate::schema::{AttributeType, BlockBuilder, ResourceData, Schema, Scope, Value, nested};
pub use types::*;

const RESOURCE: &str = "action";

/// Attributes that trigger a new build.
const BUILD_INPUTS: [&str; 4] = ["code", "runtime", "dependencies", "secrets"];

#[async_trait]
pub trait ActionApi: Send + Sync {
    async fn create_action(&self, action: Action) -> Result<Action, ApiError>;

    async fn get_action<'a>(&self, id: &'a str) -> Result<Action, ApiError>;

    async fn update_action<'a>(&self, id: &'a str, action: Action) -> Result<Action, ApiError>;

    async fn delete_action<'a>(&self, id: &'a str) -> Result<(), ApiError>;

    /// Deploy the latest built version.
    async fn deploy_action<'a>(&self, id: &'a str) -> Result<ActionVersion, ApiError>;
}

#[cfg(test)]
mock! {
    pub ActionClient {}

    #[async_trait]
    impl ActionApi for ActionClient {
        async fn create_action(&self, action: Action) -> Result<Action, ApiError>;

        async fn get_action<'a>(&self, id: &'a str) -> Result<Action, ApiError>;

        async fn update_action<'a>(&self, id: &'a str, action: Action) -> Result<Action, ApiError>;

        async fn delete_action<'a>(&self, id: &'a str) -> Result<(), ApiError>;

        async fn deploy_action<'a>(&self, id: &'a str) -> Result<ActionVersion, ApiError>;
    }

    impl Clone for ActionClient {
        fn clone(&self) -> Self;
    }
}

pub fn schema() -> Schema {
    Schema::new()
        .attribute("name", AttributeType::String)
        .force_new(
            "supported_triggers",
            AttributeType::Block(
                Schema::new()
                    .attribute("id", AttributeType::String)
                    .attribute("version", AttributeType::String),
            ),
        )
        .attribute("code", AttributeType::String)
        .attribute("runtime", AttributeType::String)
        .attribute(
            "dependencies",
            AttributeType::BlockSet {
                schema: Schema::new()
                    .attribute("name", AttributeType::String)
                    .attribute("version", AttributeType::String),
                key: "name",
            },
        )
        .attribute(
            "secrets",
            AttributeType::BlockSet {
                schema: Schema::new()
                    .attribute("name", AttributeType::String)
                    .attribute("value", AttributeType::String),
                key: "name",
            },
        )
        .attribute("deploy", AttributeType::Bool)
        .attribute("version_id", AttributeType::String)
}

/// Whole list of blocks under `path` when it changed.
fn expand_blocks<T, F>(s: &Scope<'_>, path: &str, f: F) -> Option<Vec<T>>
where
    F: Fn(&Scope<'_>) -> Option<T>,
{
    s.has_change(path)
        .then(|| s.blocks(path).iter().filter_map(f).collect())
}

fn expand_action(d: &ResourceData) -> Action {
    let s = d.scope();
    let changed = [Condition::HasChange];
    Action {
        name: field::string(&s, "name", &changed),
        supported_triggers: s
            .first_block("supported_triggers")
            .filter(|_| s.is_new_resource())
            .map(|t| {
                vec![ActionTrigger {
                    id: field::string(&t, "id", &[]).unwrap_or_default(),
                    version: field::string(&t, "version", &[]).unwrap_or_default(),
                }]
            }),
        code: field::string(&s, "code", &changed),
        runtime: field::string(&s, "runtime", &changed),
        dependencies: expand_blocks(&s, "dependencies", |b| {
            Some(ActionDependency {
                name: field::string(b, "name", &[])?,
                version: field::string(b, "version", &[])?,
            })
        }),
        secrets: expand_blocks(&s, "secrets", |b| {
            Some(ActionSecret {
                name: field::string(b, "name", &[])?,
                value: field::string(b, "value", &[]),
            })
        }),
        ..Default::default()
    }
}

/// Payload create (for a new resource) or update would send.
pub fn plan(d: &ResourceData) -> Result<serde_json::Value, ProviderError> {
    Ok(serde_json::to_value(expand_action(d))?)
}

/// Reconciler of `auth0_action`.
#[derive(Clone, Debug)]
pub struct ActionResource<A> {
    api: A,
    build_timeout: Duration,
    poll_interval: Duration,
}

impl<A: ActionApi> ActionResource<A> {
    pub fn new(config: &Config, api: A) -> Self {
        Self {
            api,
            build_timeout: config.action.build_timeout(),
            poll_interval: config.action.poll_interval(),
        }
    }

    /// Poll the action until its build reached a terminal status.
    async fn wait_built(&self, id: &str) -> Result<(), ProviderError> {
        let api = &self.api;
        retry(
            &format!("build of action {id}"),
            self.build_timeout,
            self.poll_interval,
            || async move {
                let action = api
                    .get_action(id)
                    .await
                    .map_err(|err| ProviderError::remote(RESOURCE, Phase::Read, err))?;
                match action.status {
                    Some(BuildStatus::Built) => Ok(()),
                    Some(status) => {
                        let err = ProviderError::ActionBuild {
                            id: id.to_string(),
                            status: status.to_string(),
                        };
                        if status.is_terminal() {
                            Err(RetryError::NonRetryable(err))
                        } else {
                            Err(RetryError::Retryable(err))
                        }
                    }
                    None => Err(RetryError::Retryable(ProviderError::ActionBuild {
                        id: id.to_string(),
                        status: "unknown".into(),
                    })),
                }
            },
        )
        .await
    }

    /// Wait for the build triggered by the last change and deploy it when requested.
    async fn build_and_deploy(
        &self,
        d: &mut ResourceData,
        id: &str,
        phase: Phase,
    ) -> Result<(), ProviderError> {
        if !d.is_new_resource() && !BUILD_INPUTS.iter().any(|x| d.has_change(x)) {
            return Ok(());
        }
        self.wait_built(id).await?;
        if d.get("deploy").and_then(Value::as_bool) == Some(true) {
            let version = self
                .api
                .deploy_action(id)
                .await
                .map_err(|err| ProviderError::remote(RESOURCE, phase, err))?;
            info!("deployed version {} of action {}", version.number, id);
            d.set("version_id", version.id)?;
        }
        Ok(())
    }
}

#[async_trait]
impl<A: ActionApi + 'static> Reconcile for ActionResource<A> {
    fn type_name(&self) -> &'static str {
        "auth0_action"
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
            .create_action(expand_action(d))
            .await
            .map_err(|err| ProviderError::remote(RESOURCE, Phase::Create, err))?;
        let id = created
            .id
            .ok_or_else(|| ProviderError::MissingId(RESOURCE.into()))?;
        d.set_id(id.clone());
        self.build_and_deploy(d, &id, Phase::Create).await?;
        self.read(d).await
    }

    #[tracing::instrument(level = "debug", skip(self, d))]
    async fn read(&self, d: &mut ResourceData) -> Result<(), ProviderError> {
        let id = require_id(d, RESOURCE)?;
        let action = match self.api.get_action(&id).await {
            Ok(action) => action,
            Err(err) => return read_failed(d, RESOURCE, err),
        };
        let mut errors = Diagnostics::default();
        errors.collect(d.set("name", action.name));
        errors.collect(d.set(
            "supported_triggers",
            nested(
                action
                    .supported_triggers
                    .unwrap_or_default()
                    .into_iter()
                    .next()
                    .map(|t| {
                        BlockBuilder::new()
                            .put("id", Some(t.id))
                            .put("version", Some(t.version))
                            .build()
                    }),
            ),
        ));
        errors.collect(d.set("code", action.code));
        errors.collect(d.set("runtime", action.runtime));
        errors.collect(d.set(
            "dependencies",
            Value::Set(
                action
                    .dependencies
                    .unwrap_or_default()
                    .into_iter()
                    .map(|x| {
                        BlockBuilder::new()
                            .put("name", Some(x.name))
                            .put("version", Some(x.version))
                            .build()
                            .into()
                    })
                    .collect(),
            ),
        ));
        // Secret values are write-only, the configured ones stay in the state.
        if let Some(version) = action.deployed_version {
            errors.collect(d.set("version_id", version.id));
        }
        errors.into_result()
    }

    #[tracing::instrument(level = "debug", skip(self, d))]
    async fn update(&self, d: &mut ResourceData) -> Result<(), ProviderError> {
        ensure_updatable(d, RESOURCE)?;
        let id = require_id(d, RESOURCE)?;
        let action = expand_action(d);
        if action == Action::default() {
            debug!("action {} has no changes to send", id);
        } else {
            self.api
                .update_action(&id, action)
                .await
                .map_err(|err| ProviderError::remote(RESOURCE, Phase::Update, err))?;
        }
        self.build_and_deploy(d, &id, Phase::Update).await?;
        self.read(d).await
    }

    #[tracing::instrument(level = "debug", skip(self, d))]
    async fn delete(&self, d: &mut ResourceData) -> Result<(), ProviderError> {
        let id = require_id(d, RESOURCE)?;
        ignore_not_found(RESOURCE, Phase::Delete, self.api.delete_action(&id).await)?;
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

    fn config() -> Config {
        let mut config = Config::default();
        config.action.build_timeout = 10;
        config.action.poll_interval = 1000;
        config
    }

    fn action(status: BuildStatus) -> Action {
        ActionBuilder::default()
            .id("act_1")
            .name("enrich")
            .code("exports.onExecutePostLogin = async () => {};")
            .runtime("node18")
            .status(status)
            .build()
            .unwrap()
    }

    fn desired() -> serde_json::Value {
        json!({
            "name": "enrich",
            "supported_triggers": [{"id": "post-login", "version": "v3"}],
            "code": "exports.onExecutePostLogin = async () => {};",
            "runtime": "node18",
            "dependencies": [{"name": "lodash", "version": "4.17.21"}],
            "secrets": [{"name": "API_KEY", "value": "k"}],
            "deploy": true
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_create_waits_and_deploys() {
        let mut api = MockActionClient::default();
        api.expect_create_action()
            .withf(|action: &Action| {
                action.supported_triggers
                    == Some(vec![ActionTrigger {
                        id: "post-login".into(),
                        version: "v3".into(),
                    }])
                    && action.dependencies
                        == Some(vec![ActionDependency {
                            name: "lodash".into(),
                            version: "4.17.21".into(),
                        }])
                    && action.secrets
                        == Some(vec![ActionSecret {
                            name: "API_KEY".into(),
                            value: Some("k".into()),
                        }])
            })
            .returning(|_| Ok(action(BuildStatus::Pending)));
        let mut polls = 0;
        api.expect_get_action()
            .withf(|id: &'_ str| id == "act_1")
            .returning(move |_| {
                polls += 1;
                Ok(action(if polls < 3 {
                    BuildStatus::Building
                } else {
                    BuildStatus::Built
                }))
            });
        api.expect_deploy_action().times(1).returning(|_| {
            Ok(ActionVersion {
                id: "ver_1".into(),
                number: 1,
            })
        });

        let mut d = ResourceData::new_resource(schema(), tree(desired()));
        ActionResource::new(&config(), api)
            .create(&mut d)
            .await
            .unwrap();
        assert_eq!(Some("act_1"), d.id());
        assert_eq!(Some(&Value::from("ver_1")), d.get("version_id"));
        assert_eq!(Some(&Value::from("k")), d.get("secrets.0.value"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_build() {
        let mut api = MockActionClient::default();
        api.expect_create_action()
            .returning(|_| Ok(action(BuildStatus::Pending)));
        api.expect_get_action()
            .times(1)
            .returning(|_| Ok(action(BuildStatus::Failed)));
        api.expect_deploy_action().never();

        let mut d = ResourceData::new_resource(schema(), tree(desired()));
        let res = ActionResource::new(&config(), api).create(&mut d).await;
        match res {
            Err(ProviderError::ActionBuild { id, status }) => {
                assert_eq!("act_1", id);
                assert_eq!("failed", status);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_build_timeout() {
        let mut api = MockActionClient::default();
        api.expect_create_action()
            .returning(|_| Ok(action(BuildStatus::Pending)));
        api.expect_get_action()
            .returning(|_| Ok(action(BuildStatus::Building)));
        api.expect_deploy_action().never();

        let mut d = ResourceData::new_resource(schema(), tree(desired()));
        let res = ActionResource::new(&config(), api).create(&mut d).await;
        match res {
            Err(ProviderError::Timeout { source, .. }) => {
                assert!(matches!(*source, ProviderError::ActionBuild { .. }))
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_rename_skips_build() {
        let mut api = MockActionClient::default();
        api.expect_update_action()
            .withf(|_, action: &Action| {
                action.name.as_deref() == Some("enrich")
                    && action.code.is_none()
                    && action.supported_triggers.is_none()
            })
            .returning(|_, _| Ok(action(BuildStatus::Built)));
        api.expect_get_action()
            .times(1)
            .returning(|_| Ok(action(BuildStatus::Built)));
        api.expect_deploy_action().never();

        let mut old = desired();
        old["name"] = json!("old-name");
        let mut d = ResourceData::existing(schema(), "act_1", tree(old), tree(desired()));
        ActionResource::new(&config(), api)
            .update(&mut d)
            .await
            .unwrap();
    }

    #[test]
    fn test_trigger_replacement() {
        let mut new = desired();
        new["supported_triggers"] = json!([{"id": "pre-user-registration", "version": "v2"}]);
        let d = ResourceData::existing(schema(), "act_1", tree(desired()), tree(new));
        assert_eq!(vec!["supported_triggers"], d.requires_replacement());
    }
}
