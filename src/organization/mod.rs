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
//! # Organizations
//!
//! Besides its own attributes an organization links connections (with a per link
//! `assign_membership_on_login` flag) and member users. Both relations are maintained through
//! add/remove calls computed from the difference against the previous state.

use async_trait::async_trait;
#[cfg(test)]
use mockall::mock;
use tracing::debug;

pub mod types;

use crate::config::Config;
use crate::diff;
use crate::error::{Diagnostics, Phase, ProviderError};
use crate::expand::{self as field, Condition};
use crate::management::{ApiError, ListParameters, Page, fetch_all};
use crate::provider::{Reconcile, ensure_updatable, ignore_not_found, read_failed, require_id};
use crate::schema::{AttributeType, BlockBuilder, ResourceData, Schema, Value, nested};
pub use types::*;

const RESOURCE: &str = "organization";

#[async_trait]
pub trait OrganizationApi: Send + Sync {
    async fn create_organization(
        &self,
        organization: Organization,
    ) -> Result<Organization, ApiError>;

    async fn get_organization<'a>(&self, id: &'a str) -> Result<Organization, ApiError>;

    async fn update_organization<'a>(
        &self,
        id: &'a str,
        organization: Organization,
    ) -> Result<Organization, ApiError>;

    async fn delete_organization<'a>(&self, id: &'a str) -> Result<(), ApiError>;

    async fn list_organization_connections<'a>(
        &self,
        id: &'a str,
        params: ListParameters,
    ) -> Result<Page<OrganizationConnection>, ApiError>;

    async fn add_organization_connection<'a>(
        &self,
        id: &'a str,
        connection: OrganizationConnection,
    ) -> Result<(), ApiError>;

    async fn update_organization_connection<'a>(
        &self,
        id: &'a str,
        connection: OrganizationConnection,
    ) -> Result<(), ApiError>;

    async fn remove_organization_connection<'a>(
        &self,
        id: &'a str,
        connection_id: &'a str,
    ) -> Result<(), ApiError>;

    async fn list_organization_members<'a>(
        &self,
        id: &'a str,
        params: ListParameters,
    ) -> Result<Page<OrganizationMember>, ApiError>;

    async fn add_organization_members<'a>(
        &self,
        id: &'a str,
        members: Vec<String>,
    ) -> Result<(), ApiError>;

    async fn remove_organization_members<'a>(
        &self,
        id: &'a str,
        members: Vec<String>,
    ) -> Result<(), ApiError>;
}

#[cfg(test)]
mock! {
    pub OrganizationClient {}

    #[async_trait]
    impl OrganizationApi for OrganizationClient {
        async fn create_organization(
            &self,
            organization: Organization,
        ) -> Result<Organization, ApiError>;

        async fn get_organization<'a>(&self, id: &'a str) -> Result<Organization, ApiError>;

        async fn update_organization<'a>(
            &self,
            id: &'a str,
            organization: Organization,
        ) -> Result<Organization, ApiError>;

        async fn delete_organization<'a>(&self, id: &'a str) -> Result<(), ApiError>;

        async fn list_organization_connections<'a>(
            &self,
            id: &'a str,
            params: ListParameters,
        ) -> Result<Page<OrganizationConnection>, ApiError>;

        async fn add_organization_connection<'a>(
            &self,
            id: &'a str,
            connection: OrganizationConnection,
        ) -> Result<(), ApiError>;

        async fn update_organization_connection<'a>(
            &self,
            id: &'a str,
            connection: OrganizationConnection,
        ) -> Result<(), ApiError>;

        async fn remove_organization_connection<'a>(
            &self,
            id: &'a str,
            connection_id: &'a str,
        ) -> Result<(), ApiError>;

        async fn list_organization_members<'a>(
            &self,
            id: &'a str,
            params: ListParameters,
        ) -> Result<Page<OrganizationMember>, ApiError>;

        async fn add_organization_members<'a>(
            &self,
            id: &'a str,
            members: Vec<String>,
        ) -> Result<(), ApiError>;

        async fn remove_organization_members<'a>(
            &self,
            id: &'a str,
            members: Vec<String>,
        ) -> Result<(), ApiError>;
    }

    impl Clone for OrganizationClient {
        fn clone(&self) -> Self;
    }
}

pub fn schema() -> Schema {
    Schema::new()
        .attribute("name", AttributeType::String)
        .attribute("display_name", AttributeType::String)
        .attribute(
            "branding",
            AttributeType::Block(
                Schema::new()
                    .attribute("logo_url", AttributeType::String)
                    .attribute("colors", AttributeType::Map),
            ),
        )
        .attribute("metadata", AttributeType::Map)
        .attribute(
            "connections",
            AttributeType::BlockSet {
                schema: Schema::new()
                    .attribute("connection_id", AttributeType::String)
                    .attribute("assign_membership_on_login", AttributeType::Bool),
                key: "connection_id",
            },
        )
        .attribute("members", AttributeType::string_set())
}

fn expand_organization(d: &ResourceData) -> Organization {
    let s = d.scope();
    let changed = [Condition::HasChange];
    Organization {
        name: field::string(&s, "name", &changed),
        display_name: field::string(&s, "display_name", &changed),
        branding: s
            .has_change("branding")
            .then(|| s.first_block("branding"))
            .flatten()
            .map(|b| Branding {
                logo_url: field::string(&b, "logo_url", &[]),
                colors: field::string_map(&b, "colors", &[]),
            }),
        metadata: field::string_map(&s, "metadata", &changed),
        ..Default::default()
    }
}

fn expand_connection(value: &Value) -> Result<OrganizationConnection, ProviderError> {
    let entries = value.as_map();
    let get = |name: &str| entries.and_then(|x| x.get(name));
    let mut builder = OrganizationConnectionBuilder::default();
    if let Some(val) = get("connection_id").and_then(Value::as_str) {
        builder.connection_id(val);
    }
    if let Some(val) = get("assign_membership_on_login").and_then(Value::as_bool) {
        builder.assign_membership_on_login(val);
    }
    builder.build().map_err(|err| ProviderError::Builder {
        resource: RESOURCE.into(),
        message: err.to_string(),
    })
}

fn flatten_connection(connection: &OrganizationConnection) -> Value {
    BlockBuilder::new()
        .put("connection_id", Some(connection.connection_id.clone()))
        .put(
            "assign_membership_on_login",
            connection.assign_membership_on_login,
        )
        .build()
        .into()
}

/// Payload create (for a new resource) or update would send.
pub fn plan(d: &ResourceData) -> Result<serde_json::Value, ProviderError> {
    Ok(serde_json::to_value(expand_organization(d))?)
}

/// Reconciler of `auth0_organization`.
#[derive(Clone, Debug)]
pub struct OrganizationResource<A> {
    api: A,
    page_size: u32,
}

impl<A: OrganizationApi> OrganizationResource<A> {
    pub fn new(config: &Config, api: A) -> Self {
        Self {
            api,
            page_size: config.reconcile.page_size,
        }
    }

    async fn apply_connections(&self, d: &ResourceData, id: &str) -> Result<(), ProviderError> {
        let delta = diff::collection(&d.scope(), "connections", Some("connection_id"))
            .try_map(|x| expand_connection(&x))?;
        for connection in delta.to_remove {
            debug!(
                "disabling connection {} for organization {}",
                connection.connection_id, id
            );
            ignore_not_found(
                RESOURCE,
                Phase::Update,
                self.api
                    .remove_organization_connection(id, &connection.connection_id)
                    .await,
            )?;
        }
        for connection in delta.to_add {
            debug!(
                "enabling connection {} for organization {}",
                connection.connection_id, id
            );
            self.api
                .add_organization_connection(id, connection)
                .await
                .map_err(|err| ProviderError::remote(RESOURCE, Phase::Update, err))?;
        }
        for connection in delta.changed {
            self.api
                .update_organization_connection(id, connection)
                .await
                .map_err(|err| ProviderError::remote(RESOURCE, Phase::Update, err))?;
        }
        Ok(())
    }

    async fn apply_members(&self, d: &ResourceData, id: &str) -> Result<(), ProviderError> {
        let delta = diff::string_set(&d.scope(), "members");
        if !delta.to_remove.is_empty() {
            ignore_not_found(
                RESOURCE,
                Phase::Update,
                self.api
                    .remove_organization_members(id, delta.to_remove)
                    .await,
            )?;
        }
        if !delta.to_add.is_empty() {
            self.api
                .add_organization_members(id, delta.to_add)
                .await
                .map_err(|err| ProviderError::remote(RESOURCE, Phase::Update, err))?;
        }
        Ok(())
    }
}

#[async_trait]
impl<A: OrganizationApi + 'static> Reconcile for OrganizationResource<A> {
    fn type_name(&self) -> &'static str {
        "auth0_organization"
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
            .create_organization(expand_organization(d))
            .await
            .map_err(|err| ProviderError::remote(RESOURCE, Phase::Create, err))?;
        let id = created
            .id
            .ok_or_else(|| ProviderError::MissingId(RESOURCE.into()))?;
        d.set_id(id.clone());
        self.apply_connections(d, &id).await?;
        self.apply_members(d, &id).await?;
        self.read(d).await
    }

    #[tracing::instrument(level = "debug", skip(self, d))]
    async fn read(&self, d: &mut ResourceData) -> Result<(), ProviderError> {
        let id = require_id(d, RESOURCE)?;
        let organization = match self.api.get_organization(&id).await {
            Ok(organization) => organization,
            Err(err) => return read_failed(d, RESOURCE, err),
        };
        let (api, org_id) = (&self.api, id.as_str());
        let connections = fetch_all(self.page_size, move |params| {
            api.list_organization_connections(org_id, params)
        })
        .await
        .map_err(|err| ProviderError::remote(RESOURCE, Phase::Read, err))?;
        let members = fetch_all(self.page_size, move |params| {
            api.list_organization_members(org_id, params)
        })
        .await
        .map_err(|err| ProviderError::remote(RESOURCE, Phase::Read, err))?;

        let mut errors = Diagnostics::default();
        errors.collect(d.set("name", organization.name));
        errors.collect(d.set("display_name", organization.display_name));
        errors.collect(d.set("metadata", organization.metadata));
        errors.collect(d.set(
            "branding",
            nested(organization.branding.map(|b| {
                BlockBuilder::new()
                    .put("logo_url", b.logo_url)
                    .put("colors", b.colors)
                    .build()
            })),
        ));
        errors.collect(d.set(
            "connections",
            Value::Set(connections.iter().map(flatten_connection).collect()),
        ));
        errors.collect(d.set(
            "members",
            members.into_iter().map(|x| x.user_id).collect::<Vec<_>>(),
        ));
        errors.into_result()
    }

    #[tracing::instrument(level = "debug", skip(self, d))]
    async fn update(&self, d: &mut ResourceData) -> Result<(), ProviderError> {
        ensure_updatable(d, RESOURCE)?;
        let id = require_id(d, RESOURCE)?;
        let organization = expand_organization(d);
        if organization != Organization::default() {
            self.api
                .update_organization(&id, organization)
                .await
                .map_err(|err| ProviderError::remote(RESOURCE, Phase::Update, err))?;
        }
        self.apply_connections(d, &id).await?;
        self.apply_members(d, &id).await?;
        self.read(d).await
    }

    #[tracing::instrument(level = "debug", skip(self, d))]
    async fn delete(&self, d: &mut ResourceData) -> Result<(), ProviderError> {
        let id = require_id(d, RESOURCE)?;
        ignore_not_found(
            RESOURCE,
            Phase::Delete,
            self.api.delete_organization(&id).await,
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

    fn org_connection(id: &str, assign: bool) -> OrganizationConnection {
        OrganizationConnectionBuilder::default()
            .connection_id(id)
            .assign_membership_on_login(assign)
            .build()
            .unwrap()
    }

    fn resource(api: MockOrganizationClient) -> OrganizationResource<MockOrganizationClient> {
        OrganizationResource::new(&Config::default(), api)
    }

    fn expect_read(api: &mut MockOrganizationClient) {
        api.expect_get_organization()
            .returning(|_| Ok(OrganizationBuilder::default().id("org_1").build().unwrap()));
        api.expect_list_organization_connections()
            .returning(|_, _| Ok(Page::new(vec![], false)));
        api.expect_list_organization_members()
            .returning(|_, _| Ok(Page::new(vec![], false)));
    }

    #[tokio::test]
    async fn test_connection_delta() {
        let mut api = MockOrganizationClient::default();
        api.expect_update_organization().never();
        api.expect_remove_organization_connection()
            .withf(|id: &'_ str, connection_id: &'_ str| id == "org_1" && connection_id == "con_c")
            .times(1)
            .returning(|_, _| Ok(()));
        api.expect_add_organization_connection()
            .withf(|_, connection: &OrganizationConnection| {
                *connection == org_connection("con_d", false)
            })
            .times(1)
            .returning(|_, _| Ok(()));
        api.expect_update_organization_connection()
            .withf(|_, connection: &OrganizationConnection| {
                *connection == org_connection("con_b", true)
            })
            .times(1)
            .returning(|_, _| Ok(()));
        api.expect_add_organization_members().never();
        api.expect_remove_organization_members().never();
        expect_read(&mut api);

        let mut d = ResourceData::existing(
            schema(),
            "org_1",
            tree(json!({"connections": [
                {"connection_id": "con_a", "assign_membership_on_login": false},
                {"connection_id": "con_b", "assign_membership_on_login": false},
                {"connection_id": "con_c", "assign_membership_on_login": false}
            ]})),
            tree(json!({"connections": [
                {"connection_id": "con_d", "assign_membership_on_login": false},
                {"connection_id": "con_b", "assign_membership_on_login": true},
                {"connection_id": "con_a", "assign_membership_on_login": false}
            ]})),
        );
        resource(api).update(&mut d).await.unwrap();
    }

    #[test]
    fn test_expand_connection_requires_identity() {
        let res = expand_connection(&tree(json!({"assign_membership_on_login": true})).into());
        assert!(matches!(res, Err(ProviderError::Builder { .. })));
        assert_eq!(
            org_connection("con_a", true),
            expand_connection(
                &tree(json!({"connection_id": "con_a", "assign_membership_on_login": true}))
                    .into()
            )
            .unwrap()
        );
    }

    #[tokio::test]
    async fn test_keyless_connection_is_rejected() {
        let mut api = MockOrganizationClient::default();
        api.expect_update_organization().never();
        api.expect_remove_organization_connection().never();
        api.expect_add_organization_connection().never();
        api.expect_update_organization_connection().never();

        let mut d = ResourceData::existing(
            schema(),
            "org_1",
            tree(json!({"connections": [
                {"connection_id": "con_a", "assign_membership_on_login": false}
            ]})),
            tree(json!({"connections": [
                {"assign_membership_on_login": true},
                {"assign_membership_on_login": false}
            ]})),
        );
        assert!(matches!(
            resource(api).update(&mut d).await,
            Err(ProviderError::Builder { .. })
        ));
    }

    #[tokio::test]
    async fn test_members_delta_tolerates_gone_member() {
        let mut api = MockOrganizationClient::default();
        api.expect_update_organization()
            .withf(|_, org: &Organization| {
                org.display_name.as_deref() == Some("Acme") && org.name.is_none()
            })
            .returning(|_, _| Ok(Organization::default()));
        api.expect_remove_organization_members()
            .withf(|_, members: &Vec<String>| *members == vec!["auth0|gone"])
            .returning(|_, _| Err(ApiError::not_found("member does not exist")));
        api.expect_add_organization_members()
            .withf(|_, members: &Vec<String>| *members == vec!["auth0|new"])
            .returning(|_, _| Ok(()));
        expect_read(&mut api);

        let mut d = ResourceData::existing(
            schema(),
            "org_1",
            tree(json!({"name": "acme", "members": ["auth0|1", "auth0|gone"]})),
            tree(json!({
                "name": "acme",
                "display_name": "Acme",
                "members": ["auth0|new", "auth0|1"]
            })),
        );
        resource(api).update(&mut d).await.unwrap();
    }

    #[tokio::test]
    async fn test_read() {
        let mut api = MockOrganizationClient::default();
        api.expect_get_organization().returning(|_| {
            Ok(OrganizationBuilder::default()
                .id("org_1")
                .name("acme")
                .branding(Branding {
                    logo_url: Some("https://acme/logo.png".into()),
                    colors: None,
                })
                .build()
                .unwrap())
        });
        api.expect_list_organization_connections()
            .returning(|_, params: ListParameters| {
                Ok(match params.page {
                    0 => Page::new(vec![org_connection("con_a", true)], true),
                    _ => Page::new(vec![org_connection("con_b", false)], false),
                })
            });
        api.expect_list_organization_members()
            .returning(|_, _| {
                Ok(Page::new(
                    vec![OrganizationMember {
                        user_id: "auth0|1".into(),
                    }],
                    false,
                ))
            });

        let mut d = ResourceData::from_state(schema(), "org_1", Block::new());
        resource(api).read(&mut d).await.unwrap();
        assert_eq!(Some(&Value::from("acme")), d.get("name"));
        assert_eq!(
            Some(&Value::from("https://acme/logo.png")),
            d.get("branding.0.logo_url")
        );
        assert_eq!(
            2,
            d.get("connections").and_then(Value::as_list).unwrap().len()
        );
        assert_eq!(Some(&Value::List(vec!["auth0|1".into()])), d.get("members"));
    }

    #[tokio::test]
    async fn test_read_gone() {
        let mut api = MockOrganizationClient::default();
        api.expect_get_organization()
            .returning(|_| Err(ApiError::not_found("no organization")));
        api.expect_list_organization_connections().never();

        let mut d = ResourceData::from_state(schema(), "org_1", Block::new());
        resource(api).read(&mut d).await.unwrap();
        assert_eq!(None, d.id());
    }
}
