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

use std::collections::BTreeMap;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::action::{ActionApi, ActionResource};
use crate::client::{ClientApi, ClientResource};
use crate::config::Config;
use crate::connection::{ConnectionApi, ConnectionResource};
use crate::error::{Phase, ProviderError};
use crate::guardian::{GuardianApi, GuardianResource};
use crate::management::ApiError;
use crate::organization::{OrganizationApi, OrganizationResource};
use crate::resource_server::{ResourceServerApi, ResourceServerResource};
use crate::role::{RoleApi, RoleResource};
use crate::schema::{ResourceData, Schema};
use crate::tenant::{TenantApi, TenantResource};
use crate::user::{UserApi, UserResource};

/// Lifecycle of one resource type.
#[async_trait]
pub trait Reconcile: Send + Sync {
    /// Resource type name, e.g. `auth0_connection`.
    fn type_name(&self) -> &'static str;

    /// Attributes of the resource.
    fn schema(&self) -> Schema;

    /// Payload `create` (for a new resource) or `update` would send, without calling the API.
    fn plan(&self, d: &ResourceData) -> Result<serde_json::Value, ProviderError>;

    /// Create the resource and populate `d` with the resulting state.
    async fn create(&self, d: &mut ResourceData) -> Result<(), ProviderError>;

    /// Refresh `d` from the remote state, clearing the id when the resource is gone.
    async fn read(&self, d: &mut ResourceData) -> Result<(), ProviderError>;

    /// Send the changed attributes, apply relationship deltas and refresh `d`.
    async fn update(&self, d: &mut ResourceData) -> Result<(), ProviderError>;

    /// Delete the resource. Deleting a resource that is already gone succeeds.
    async fn delete(&self, d: &mut ResourceData) -> Result<(), ProviderError>;
}

/// Every client trait the reconcilers need.
pub trait ManagementApi:
    ActionApi
    + ClientApi
    + ConnectionApi
    + GuardianApi
    + OrganizationApi
    + ResourceServerApi
    + RoleApi
    + TenantApi
    + UserApi
    + Clone
    + 'static
{
}

impl<T> ManagementApi for T where
    T: ActionApi
        + ClientApi
        + ConnectionApi
        + GuardianApi
        + OrganizationApi
        + ResourceServerApi
        + RoleApi
        + TenantApi
        + UserApi
        + Clone
        + 'static
{
}

/// Reconcilers by resource type name.
#[derive(Default)]
pub struct ResourceRegistry {
    resources: BTreeMap<&'static str, Box<dyn Reconcile>>,
}

impl ResourceRegistry {
    /// Registry of all resources backed by one management client.
    pub fn new<A: ManagementApi>(config: &Config, api: A) -> Self {
        let mut registry = Self::default();
        registry.register(Box::new(ActionResource::new(config, api.clone())));
        registry.register(Box::new(ClientResource::new(api.clone())));
        registry.register(Box::new(ConnectionResource::new(api.clone())));
        registry.register(Box::new(GuardianResource::new(api.clone())));
        registry.register(Box::new(OrganizationResource::new(config, api.clone())));
        registry.register(Box::new(ResourceServerResource::new(api.clone())));
        registry.register(Box::new(RoleResource::new(config, api.clone())));
        registry.register(Box::new(TenantResource::new(api.clone())));
        registry.register(Box::new(UserResource::new(config, api)));
        registry
    }

    /// Register a reconciler, replacing the one of the same type if any.
    pub fn register(&mut self, resource: Box<dyn Reconcile>) {
        self.resources.insert(resource.type_name(), resource);
    }

    pub fn get<S: AsRef<str>>(&self, type_name: S) -> Option<&dyn Reconcile> {
        self.resources.get(type_name.as_ref()).map(|x| x.as_ref())
    }

    pub fn type_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.resources.keys().copied()
    }
}

/// Offline view of one resource type, usable without a management client.
#[derive(Clone, Copy)]
pub struct Planner {
    pub type_name: &'static str,
    pub schema: fn() -> Schema,
    pub plan: fn(&ResourceData) -> Result<serde_json::Value, ProviderError>,
}

/// Planners of every supported resource type.
pub fn planners() -> [Planner; 9] {
    [
        Planner {
            type_name: "auth0_action",
            schema: crate::action::schema,
            plan: crate::action::plan,
        },
        Planner {
            type_name: "auth0_client",
            schema: crate::client::schema,
            plan: crate::client::plan,
        },
        Planner {
            type_name: "auth0_connection",
            schema: crate::connection::schema,
            plan: crate::connection::plan,
        },
        Planner {
            type_name: "auth0_guardian",
            schema: crate::guardian::schema,
            plan: crate::guardian::plan,
        },
        Planner {
            type_name: "auth0_organization",
            schema: crate::organization::schema,
            plan: crate::organization::plan,
        },
        Planner {
            type_name: "auth0_resource_server",
            schema: crate::resource_server::schema,
            plan: crate::resource_server::plan,
        },
        Planner {
            type_name: "auth0_role",
            schema: crate::role::schema,
            plan: crate::role::plan,
        },
        Planner {
            type_name: "auth0_tenant",
            schema: crate::tenant::schema,
            plan: crate::tenant::plan,
        },
        Planner {
            type_name: "auth0_user",
            schema: crate::user::schema,
            plan: crate::user::plan,
        },
    ]
}

/// Planner of the resource type.
pub fn planner<S: AsRef<str>>(type_name: S) -> Option<Planner> {
    planners()
        .into_iter()
        .find(|x| x.type_name == type_name.as_ref())
}

/// Id of the resource or an error when there is none.
pub(crate) fn require_id(d: &ResourceData, resource: &str) -> Result<String, ProviderError> {
    d.id()
        .map(ToString::to_string)
        .ok_or_else(|| ProviderError::MissingId(resource.to_string()))
}

/// Refuse in-place updates of force-new attributes.
pub(crate) fn ensure_updatable(d: &ResourceData, resource: &str) -> Result<(), ProviderError> {
    let attributes = d.requires_replacement();
    if attributes.is_empty() {
        Ok(())
    } else {
        Err(ProviderError::ReplacementRequired {
            resource: resource.to_string(),
            attributes: attributes.into_iter().map(Into::into).collect(),
        })
    }
}

/// Turn a failed read into "resource is gone" when the API reports it missing.
pub(crate) fn read_failed(
    d: &mut ResourceData,
    resource: &str,
    err: ApiError,
) -> Result<(), ProviderError> {
    if err.is_not_found() {
        info!(
            "{} {} no longer exists, removing it from the state",
            resource,
            d.id().unwrap_or_default()
        );
        d.clear_id();
        Ok(())
    } else {
        Err(ProviderError::remote(resource, Phase::Read, err))
    }
}

/// Treat a not-found answer as an already satisfied delete or removal.
pub(crate) fn ignore_not_found(
    resource: &str,
    phase: Phase,
    result: Result<(), ApiError>,
) -> Result<(), ProviderError> {
    match result {
        Ok(()) => Ok(()),
        Err(err) if err.is_not_found() => {
            warn!("{} is already gone: {}", resource, err);
            Ok(())
        }
        Err(err) => Err(ProviderError::remote(resource, phase, err)),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use serde_json::json;

    use super::*;
    use crate::connection::MockConnectionClient;
    use crate::schema::{AttributeType, Block};

    fn schema() -> Schema {
        Schema::new().force_new("name", AttributeType::String)
    }

    #[test]
    fn test_registry() {
        let mut registry = ResourceRegistry::default();
        registry.register(Box::new(ConnectionResource::new(
            MockConnectionClient::default(),
        )));
        assert!(registry.get("auth0_connection").is_some());
        assert!(registry.get("auth0_unknown").is_none());
        assert_eq!(
            vec!["auth0_connection"],
            registry.type_names().collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_planners() {
        let unique: BTreeSet<_> = planners().iter().map(|x| x.type_name).collect();
        assert_eq!(planners().len(), unique.len());
        for name in &unique {
            assert_eq!(Some(*name), planner(name).map(|x| x.type_name));
        }
        assert!(planner("auth0_unknown").is_none());

        let tenant = planner("auth0_tenant").unwrap();
        let d = ResourceData::new_resource(
            (tenant.schema)(),
            ResourceData::block_from_json(&json!({"friendly_name": "Acme"})).unwrap(),
        );
        assert_eq!(json!({"friendly_name": "Acme"}), (tenant.plan)(&d).unwrap());
    }

    #[test]
    fn test_read_failed() {
        let mut d = ResourceData::from_state(schema(), "id", Block::new());
        read_failed(&mut d, "user", ApiError::not_found("gone")).unwrap();
        assert_eq!(None, d.id());

        let mut d = ResourceData::from_state(schema(), "id", Block::new());
        assert!(read_failed(&mut d, "user", ApiError::status(403, "forbidden")).is_err());
        assert_eq!(Some("id"), d.id());
    }

    #[test]
    fn test_ignore_not_found() {
        assert!(ignore_not_found("role", Phase::Delete, Err(ApiError::not_found("gone"))).is_ok());
        assert!(ignore_not_found("role", Phase::Delete, Ok(())).is_ok());
        assert!(
            ignore_not_found("role", Phase::Delete, Err(ApiError::status(500, "boom"))).is_err()
        );
    }

    #[test]
    fn test_ensure_updatable() {
        let tree = |v| ResourceData::block_from_json(&v).unwrap();
        let d = ResourceData::existing(
            schema(),
            "id",
            tree(json!({"name": "a"})),
            tree(json!({"name": "b"})),
        );
        match ensure_updatable(&d, "connection") {
            Err(ProviderError::ReplacementRequired { attributes, .. }) => {
                assert_eq!(vec!["name".to_string()], attributes)
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(require_id(&d, "connection").is_ok());
    }
}
