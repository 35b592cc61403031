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
//! # Roles
//!
//! Roles carry a set of permissions of resource servers. The API only knows how to grant and
//! revoke permissions, so an update is expressed as the delta against the previous state.

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
use crate::schema::{AttributeType, BlockBuilder, ResourceData, Schema, Value};
pub use types::*;

const RESOURCE: &str = "role";

#[async_trait]
pub trait RoleApi: Send + Sync {
    async fn create_role(&self, role: Role) -> Result<Role, ApiError>;

    async fn get_role<'a>(&self, id: &'a str) -> Result<Role, ApiError>;

    async fn update_role<'a>(&self, id: &'a str, role: Role) -> Result<Role, ApiError>;

    async fn delete_role<'a>(&self, id: &'a str) -> Result<(), ApiError>;

    async fn list_role_permissions<'a>(
        &self,
        id: &'a str,
        params: ListParameters,
    ) -> Result<Page<Permission>, ApiError>;

    async fn add_role_permissions<'a>(
        &self,
        id: &'a str,
        permissions: Vec<Permission>,
    ) -> Result<(), ApiError>;

    async fn remove_role_permissions<'a>(
        &self,
        id: &'a str,
        permissions: Vec<Permission>,
    ) -> Result<(), ApiError>;
}

#[cfg(test)]
mock! {
    pub RoleClient {}

    #[async_trait]
    impl RoleApi for RoleClient {
        async fn create_role(&self, role: Role) -> Result<Role, ApiError>;

        async fn get_role<'a>(&self, id: &'a str) -> Result<Role, ApiError>;

        async fn update_role<'a>(&self, id: &'a str, role: Role) -> Result<Role, ApiError>;

        async fn delete_role<'a>(&self, id: &'a str) -> Result<(), ApiError>;

        async fn list_role_permissions<'a>(
            &self,
            id: &'a str,
            params: ListParameters,
        ) -> Result<Page<Permission>, ApiError>;

        async fn add_role_permissions<'a>(
            &self,
            id: &'a str,
            permissions: Vec<Permission>,
        ) -> Result<(), ApiError>;

        async fn remove_role_permissions<'a>(
            &self,
            id: &'a str,
            permissions: Vec<Permission>,
        ) -> Result<(), ApiError>;
    }

    impl Clone for RoleClient {
        fn clone(&self) -> Self;
    }
}

pub fn schema() -> Schema {
    Schema::new()
        .attribute("name", AttributeType::String)
        .attribute("description", AttributeType::String)
        .attribute(
            "permissions",
            AttributeType::BlockSet {
                schema: Schema::new()
                    .attribute("resource_server_identifier", AttributeType::String)
                    .attribute("name", AttributeType::String),
                key: "name",
            },
        )
}

fn expand_role(d: &ResourceData) -> Role {
    let s = d.scope();
    Role {
        name: field::string(&s, "name", &[Condition::HasChange]),
        description: field::string(&s, "description", &[Condition::HasChange]),
        ..Default::default()
    }
}

fn attr<'a>(value: &'a Value, name: &str) -> Option<&'a str> {
    value.as_map()?.get(name)?.as_str()
}

/// Identity of a permission member of the tree.
fn permission_key(value: &Value) -> (String, String) {
    (
        attr(value, "resource_server_identifier")
            .unwrap_or_default()
            .to_string(),
        attr(value, "name").unwrap_or_default().to_string(),
    )
}

fn expand_permission(value: &Value) -> Result<Permission, ProviderError> {
    let mut builder = PermissionBuilder::default();
    if let Some(val) = attr(value, "resource_server_identifier") {
        builder.resource_server_identifier(val);
    }
    if let Some(val) = attr(value, "name") {
        builder.name(val);
    }
    builder.build().map_err(|err| ProviderError::Builder {
        resource: RESOURCE.into(),
        message: err.to_string(),
    })
}

fn flatten_permission(permission: &Permission) -> Value {
    BlockBuilder::new()
        .put(
            "resource_server_identifier",
            Some(permission.resource_server_identifier.clone()),
        )
        .put("name", Some(permission.name.clone()))
        .build()
        .into()
}

/// Payload create (for a new resource) or update would send.
pub fn plan(d: &ResourceData) -> Result<serde_json::Value, ProviderError> {
    Ok(serde_json::to_value(expand_role(d))?)
}

/// Reconciler of `auth0_role`.
#[derive(Clone, Debug)]
pub struct RoleResource<A> {
    api: A,
    page_size: u32,
}

impl<A: RoleApi> RoleResource<A> {
    pub fn new(config: &Config, api: A) -> Self {
        Self {
            api,
            page_size: config.reconcile.page_size,
        }
    }

    /// Revoke the removed permissions and grant the added ones.
    async fn apply_permissions(&self, d: &ResourceData, id: &str) -> Result<(), ProviderError> {
        let delta = diff::collection_by(&d.scope(), "permissions", permission_key);
        if !delta.to_remove.is_empty() {
            let permissions = delta
                .to_remove
                .iter()
                .map(expand_permission)
                .collect::<Result<Vec<_>, _>>()?;
            debug!("revoking {} permissions of role {}", permissions.len(), id);
            ignore_not_found(
                RESOURCE,
                Phase::Update,
                self.api.remove_role_permissions(id, permissions).await,
            )?;
        }
        if !delta.to_add.is_empty() {
            let permissions = delta
                .to_add
                .iter()
                .map(expand_permission)
                .collect::<Result<Vec<_>, _>>()?;
            debug!("granting {} permissions to role {}", permissions.len(), id);
            self.api
                .add_role_permissions(id, permissions)
                .await
                .map_err(|err| ProviderError::remote(RESOURCE, Phase::Update, err))?;
        }
        Ok(())
    }
}

#[async_trait]
impl<A: RoleApi + 'static> Reconcile for RoleResource<A> {
    fn type_name(&self) -> &'static str {
        "auth0_role"
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
            .create_role(expand_role(d))
            .await
            .map_err(|err| ProviderError::remote(RESOURCE, Phase::Create, err))?;
        let id = created
            .id
            .ok_or_else(|| ProviderError::MissingId(RESOURCE.into()))?;
        d.set_id(id.clone());
        self.apply_permissions(d, &id).await?;
        self.read(d).await
    }

    #[tracing::instrument(level = "debug", skip(self, d))]
    async fn read(&self, d: &mut ResourceData) -> Result<(), ProviderError> {
        let id = require_id(d, RESOURCE)?;
        let role = match self.api.get_role(&id).await {
            Ok(role) => role,
            Err(err) => return read_failed(d, RESOURCE, err),
        };
        let (api, role_id) = (&self.api, id.as_str());
        let permissions = fetch_all(self.page_size, move |params| {
            api.list_role_permissions(role_id, params)
        })
        .await
        .map_err(|err| ProviderError::remote(RESOURCE, Phase::Read, err))?;

        let mut errors = Diagnostics::default();
        errors.collect(d.set("name", role.name));
        errors.collect(d.set("description", role.description));
        errors.collect(d.set(
            "permissions",
            Value::Set(permissions.iter().map(flatten_permission).collect()),
        ));
        errors.into_result()
    }

    #[tracing::instrument(level = "debug", skip(self, d))]
    async fn update(&self, d: &mut ResourceData) -> Result<(), ProviderError> {
        ensure_updatable(d, RESOURCE)?;
        let id = require_id(d, RESOURCE)?;
        let role = expand_role(d);
        if role != Role::default() {
            self.api
                .update_role(&id, role)
                .await
                .map_err(|err| ProviderError::remote(RESOURCE, Phase::Update, err))?;
        }
        self.apply_permissions(d, &id).await?;
        self.read(d).await
    }

    #[tracing::instrument(level = "debug", skip(self, d))]
    async fn delete(&self, d: &mut ResourceData) -> Result<(), ProviderError> {
        let id = require_id(d, RESOURCE)?;
        ignore_not_found(RESOURCE, Phase::Delete, self.api.delete_role(&id).await)?;
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

    fn permission(api: &str, name: &str) -> Permission {
        PermissionBuilder::default()
            .resource_server_identifier(api)
            .name(name)
            .build()
            .unwrap()
    }

    fn resource(api: MockRoleClient) -> RoleResource<MockRoleClient> {
        RoleResource::new(&Config::default(), api)
    }

    #[tokio::test]
    async fn test_create_grants_everything() {
        let mut api = MockRoleClient::default();
        api.expect_create_role()
            .withf(|role: &Role| role.name.as_deref() == Some("admin"))
            .returning(|_| {
                Ok(RoleBuilder::default()
                    .id("rol_1")
                    .name("admin")
                    .build()
                    .unwrap())
            });
        api.expect_remove_role_permissions().never();
        api.expect_add_role_permissions()
            .withf(|id: &'_ str, permissions: &Vec<Permission>| {
                id == "rol_1" && *permissions == vec![permission("https://api", "read:all")]
            })
            .returning(|_, _| Ok(()));
        api.expect_get_role().returning(|_| {
            Ok(RoleBuilder::default()
                .id("rol_1")
                .name("admin")
                .build()
                .unwrap())
        });
        api.expect_list_role_permissions()
            .returning(|_, _| Ok(Page::new(vec![permission("https://api", "read:all")], false)));

        let mut d = ResourceData::new_resource(
            schema(),
            tree(json!({
                "name": "admin",
                "permissions": [{"resource_server_identifier": "https://api", "name": "read:all"}]
            })),
        );
        resource(api).create(&mut d).await.unwrap();
        assert_eq!(Some("rol_1"), d.id());
        assert_eq!(
            Some(&Value::Set(vec![
                tree(json!({"resource_server_identifier": "https://api", "name": "read:all"}))
                    .into()
            ])),
            d.get("permissions")
        );
    }

    #[tokio::test]
    async fn test_update_permission_delta() {
        let mut api = MockRoleClient::default();
        api.expect_update_role().never();
        api.expect_remove_role_permissions()
            .withf(|_, permissions: &Vec<Permission>| {
                *permissions == vec![permission("https://api", "write:all")]
            })
            .returning(|_, _| Err(ApiError::not_found("resource server is gone")));
        api.expect_add_role_permissions()
            .withf(|_, permissions: &Vec<Permission>| {
                *permissions == vec![permission("https://other", "read:all")]
            })
            .returning(|_, _| Ok(()));
        api.expect_get_role()
            .returning(|_| Ok(RoleBuilder::default().id("rol_1").build().unwrap()));
        api.expect_list_role_permissions()
            .returning(|_, _| Ok(Page::new(vec![], false)));

        let mut d = ResourceData::existing(
            schema(),
            "rol_1",
            tree(json!({
                "name": "admin",
                "permissions": [
                    {"resource_server_identifier": "https://api", "name": "read:all"},
                    {"resource_server_identifier": "https://api", "name": "write:all"}
                ]
            })),
            tree(json!({
                "name": "admin",
                "permissions": [
                    {"resource_server_identifier": "https://other", "name": "read:all"},
                    {"resource_server_identifier": "https://api", "name": "read:all"}
                ]
            })),
        );
        resource(api).update(&mut d).await.unwrap();
    }

    #[tokio::test]
    async fn test_read_paginates() {
        let mut api = MockRoleClient::default();
        api.expect_get_role()
            .returning(|_| Ok(RoleBuilder::default().id("rol_1").build().unwrap()));
        api.expect_list_role_permissions()
            .withf(|id: &'_ str, _| id == "rol_1")
            .times(2)
            .returning(|_, params: ListParameters| {
                Ok(match params.page {
                    0 => Page::new(vec![permission("https://api", "a")], true),
                    _ => Page::new(vec![permission("https://api", "b")], false),
                })
            });

        let mut d = ResourceData::from_state(schema(), "rol_1", Block::new());
        resource(api).read(&mut d).await.unwrap();
        assert_eq!(
            2,
            d.get("permissions").and_then(Value::as_list).unwrap().len()
        );
    }

    #[test]
    fn test_expand_permission_requires_identity() {
        let res = expand_permission(&tree(json!({"resource_server_identifier": "x"})).into());
        assert!(matches!(res, Err(ProviderError::Builder { .. })));
        assert_eq!(
            permission("x", "read"),
            expand_permission(
                &tree(json!({"resource_server_identifier": "x", "name": "read"})).into()
            )
            .unwrap()
        );
    }
}
