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
//! # Users
//!
//! Users of a connection together with the roles assigned to them.

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
use crate::role::Role;
use crate::schema::{AttributeType, ResourceData, Schema};
pub use types::*;

const RESOURCE: &str = "user";

/// Attributes the API refuses to change within one request.
const EXCLUSIVE_CHANGES: [(&str, &str); 3] = [
    ("username", "password"),
    ("username", "email_verified"),
    ("password", "email_verified"),
];

/// Attributes requiring the connection to be named in an update.
const CONNECTION_BOUND: [&str; 4] = ["email", "username", "password", "phone_number"];

#[async_trait]
pub trait UserApi: Send + Sync {
    async fn create_user(&self, user: User) -> Result<User, ApiError>;

    async fn get_user<'a>(&self, id: &'a str) -> Result<User, ApiError>;

    async fn update_user<'a>(&self, id: &'a str, user: User) -> Result<User, ApiError>;

    async fn delete_user<'a>(&self, id: &'a str) -> Result<(), ApiError>;

    async fn list_user_roles<'a>(
        &self,
        id: &'a str,
        params: ListParameters,
    ) -> Result<Page<Role>, ApiError>;

    async fn assign_user_roles<'a>(&self, id: &'a str, roles: Vec<String>)
    -> Result<(), ApiError>;

    async fn remove_user_roles<'a>(&self, id: &'a str, roles: Vec<String>)
    -> Result<(), ApiError>;
}

#[cfg(test)]
mock! {
    pub UserClient {}

    #[async_trait]
    impl UserApi for UserClient {
        async fn create_user(&self, user: User) -> Result<User, ApiError>;

        async fn get_user<'a>(&self, id: &'a str) -> Result<User, ApiError>;

        async fn update_user<'a>(&self, id: &'a str, user: User) -> Result<User, ApiError>;

        async fn delete_user<'a>(&self, id: &'a str) -> Result<(), ApiError>;

        async fn list_user_roles<'a>(
            &self,
            id: &'a str,
            params: ListParameters,
        ) -> Result<Page<Role>, ApiError>;

        async fn assign_user_roles<'a>(&self, id: &'a str, roles: Vec<String>)
        -> Result<(), ApiError>;

        async fn remove_user_roles<'a>(&self, id: &'a str, roles: Vec<String>)
        -> Result<(), ApiError>;
    }

    impl Clone for UserClient {
        fn clone(&self) -> Self;
    }
}

pub fn schema() -> Schema {
    Schema::new()
        .force_new("user_id", AttributeType::String)
        .force_new("connection_name", AttributeType::String)
        .attribute("email", AttributeType::String)
        .attribute("email_verified", AttributeType::Bool)
        .attribute("verify_email", AttributeType::Bool)
        .attribute("username", AttributeType::String)
        .attribute("password", AttributeType::String)
        .attribute("phone_number", AttributeType::String)
        .attribute("phone_verified", AttributeType::Bool)
        .attribute("name", AttributeType::String)
        .attribute("given_name", AttributeType::String)
        .attribute("family_name", AttributeType::String)
        .attribute("nickname", AttributeType::String)
        .attribute("picture", AttributeType::String)
        .attribute("blocked", AttributeType::Bool)
        .attribute("user_metadata", AttributeType::String)
        .attribute("app_metadata", AttributeType::String)
        .attribute("roles", AttributeType::string_set())
}

/// Report every pair of attributes that may not change together.
fn validate_user(d: &ResourceData) -> Result<(), ProviderError> {
    let mut errors = Diagnostics::default();
    if !d.is_new_resource() {
        for (first, second) in EXCLUSIVE_CHANGES {
            if d.has_change(first) && d.has_change(second) {
                errors.push(ProviderError::ValidationConflict(format!(
                    "cannot update {first} and {second} simultaneously"
                )));
            }
        }
    }
    errors.into_result()
}

fn expand_user(d: &ResourceData) -> Result<User, ProviderError> {
    let s = d.scope();
    let changed = [Condition::HasChange];
    let mut user = User {
        user_id: field::string(&s, "user_id", &[Condition::IsNewResource]),
        email: field::string(&s, "email", &changed),
        email_verified: field::bool(&s, "email_verified", &changed),
        verify_email: field::bool(&s, "verify_email", &changed),
        username: field::string(&s, "username", &changed),
        password: field::string(&s, "password", &changed),
        phone_number: field::string(&s, "phone_number", &changed),
        phone_verified: field::bool(&s, "phone_verified", &changed),
        name: field::string(&s, "name", &changed),
        given_name: field::string(&s, "given_name", &changed),
        family_name: field::string(&s, "family_name", &changed),
        nickname: field::string(&s, "nickname", &changed),
        picture: field::string(&s, "picture", &changed),
        blocked: field::bool(&s, "blocked", &changed),
        user_metadata: field::json_map(&s, "user_metadata", &changed)?,
        app_metadata: field::json_map(&s, "app_metadata", &changed)?,
        ..Default::default()
    };
    if d.is_new_resource() || CONNECTION_BOUND.iter().any(|x| d.has_change(x)) {
        user.connection = field::string(&s, "connection_name", &[]);
    }
    Ok(user)
}

/// Payload create (for a new resource) or update would send.
pub fn plan(d: &ResourceData) -> Result<serde_json::Value, ProviderError> {
    validate_user(d)?;
    Ok(serde_json::to_value(expand_user(d)?)?)
}

/// Reconciler of `auth0_user`.
#[derive(Clone, Debug)]
pub struct UserResource<A> {
    api: A,
    page_size: u32,
}

impl<A: UserApi> UserResource<A> {
    pub fn new(config: &Config, api: A) -> Self {
        Self {
            api,
            page_size: config.reconcile.page_size,
        }
    }

    async fn apply_roles(&self, d: &ResourceData, id: &str) -> Result<(), ProviderError> {
        let delta = diff::string_set(&d.scope(), "roles");
        if !delta.to_remove.is_empty() {
            debug!("removing roles {:?} from user {}", delta.to_remove, id);
            ignore_not_found(
                RESOURCE,
                Phase::Update,
                self.api.remove_user_roles(id, delta.to_remove).await,
            )?;
        }
        if !delta.to_add.is_empty() {
            debug!("assigning roles {:?} to user {}", delta.to_add, id);
            self.api
                .assign_user_roles(id, delta.to_add)
                .await
                .map_err(|err| ProviderError::remote(RESOURCE, Phase::Update, err))?;
        }
        Ok(())
    }
}

#[async_trait]
impl<A: UserApi + 'static> Reconcile for UserResource<A> {
    fn type_name(&self) -> &'static str {
        "auth0_user"
    }

    fn schema(&self) -> Schema {
        schema()
    }

    fn plan(&self, d: &ResourceData) -> Result<serde_json::Value, ProviderError> {
        plan(d)
    }

    #[tracing::instrument(level = "debug", skip(self, d))]
    async fn create(&self, d: &mut ResourceData) -> Result<(), ProviderError> {
        let user = expand_user(d)?;
        let created = self
            .api
            .create_user(user)
            .await
            .map_err(|err| ProviderError::remote(RESOURCE, Phase::Create, err))?;
        let id = created
            .user_id
            .ok_or_else(|| ProviderError::MissingId(RESOURCE.into()))?;
        d.set_id(id.clone());
        self.apply_roles(d, &id).await?;
        self.read(d).await
    }

    #[tracing::instrument(level = "debug", skip(self, d))]
    async fn read(&self, d: &mut ResourceData) -> Result<(), ProviderError> {
        let id = require_id(d, RESOURCE)?;
        let user = match self.api.get_user(&id).await {
            Ok(user) => user,
            Err(err) => return read_failed(d, RESOURCE, err),
        };
        let (api, user_id) = (&self.api, id.as_str());
        let roles = fetch_all(self.page_size, move |params| {
            api.list_user_roles(user_id, params)
        })
        .await
        .map_err(|err| ProviderError::remote(RESOURCE, Phase::Read, err))?;

        let metadata = |value: Option<serde_json::Map<String, serde_json::Value>>| {
            value
                .filter(|x| !x.is_empty())
                .map(|x| serde_json::to_string(&x))
                .transpose()
        };
        let mut errors = Diagnostics::default();
        errors.collect(d.set("user_id", user.user_id));
        errors.collect(d.set("email", user.email));
        errors.collect(d.set("email_verified", user.email_verified));
        errors.collect(d.set("username", user.username));
        errors.collect(d.set("phone_number", user.phone_number));
        errors.collect(d.set("phone_verified", user.phone_verified));
        errors.collect(d.set("name", user.name));
        errors.collect(d.set("given_name", user.given_name));
        errors.collect(d.set("family_name", user.family_name));
        errors.collect(d.set("nickname", user.nickname));
        errors.collect(d.set("picture", user.picture));
        errors.collect(d.set("blocked", user.blocked));
        if let Some(value) = errors.collect(metadata(user.user_metadata)) {
            errors.collect(d.set("user_metadata", value));
        }
        if let Some(value) = errors.collect(metadata(user.app_metadata)) {
            errors.collect(d.set("app_metadata", value));
        }
        errors.collect(d.set(
            "roles",
            roles.into_iter().filter_map(|x| x.id).collect::<Vec<_>>(),
        ));
        errors.into_result()
    }

    #[tracing::instrument(level = "debug", skip(self, d))]
    async fn update(&self, d: &mut ResourceData) -> Result<(), ProviderError> {
        validate_user(d)?;
        ensure_updatable(d, RESOURCE)?;
        let id = require_id(d, RESOURCE)?;
        let user = expand_user(d)?;
        if user == User::default() {
            debug!("user {} has no changes to send", id);
        } else {
            self.api
                .update_user(&id, user)
                .await
                .map_err(|err| ProviderError::remote(RESOURCE, Phase::Update, err))?;
        }
        self.apply_roles(d, &id).await?;
        self.read(d).await
    }

    #[tracing::instrument(level = "debug", skip(self, d))]
    async fn delete(&self, d: &mut ResourceData) -> Result<(), ProviderError> {
        let id = require_id(d, RESOURCE)?;
        ignore_not_found(RESOURCE, Phase::Delete, self.api.delete_user(&id).await)?;
        d.clear_id();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tracing_test::traced_test;

    use super::*;
    use crate::role::RoleBuilder;
    use crate::schema::{Block, Value};

    fn tree(value: serde_json::Value) -> Block {
        ResourceData::block_from_json(&value).unwrap()
    }

    fn role(id: &str) -> Role {
        RoleBuilder::default().id(id).build().unwrap()
    }

    fn remote() -> User {
        UserBuilder::default()
            .user_id("auth0|1")
            .email("jane@example.com")
            .build()
            .unwrap()
    }

    fn resource(api: MockUserClient) -> UserResource<MockUserClient> {
        UserResource::new(&Config::default(), api)
    }

    #[tokio::test]
    async fn test_conflicting_changes() {
        let mut api = MockUserClient::default();
        api.expect_update_user().never();
        api.expect_assign_user_roles().never();
        api.expect_remove_user_roles().never();
        api.expect_get_user().never();

        let mut d = ResourceData::existing(
            schema(),
            "auth0|1",
            tree(json!({"username": "jane", "password": "old", "roles": ["rol_1"]})),
            tree(json!({"username": "janet", "password": "new", "roles": ["rol_2"]})),
        );
        match resource(api).update(&mut d).await {
            Err(ProviderError::Diagnostics(errors)) => {
                assert_eq!(1, errors.len());
                assert!(
                    errors
                        .iter()
                        .any(|x| x.to_string().contains("username and password"))
                );
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_all_conflicts_reported() {
        let d = ResourceData::existing(
            schema(),
            "auth0|1",
            tree(json!({"username": "jane", "password": "old", "email_verified": false})),
            tree(json!({"username": "janet", "password": "new", "email_verified": true})),
        );
        match validate_user(&d) {
            Err(ProviderError::Diagnostics(errors)) => assert_eq!(3, errors.len()),
            other => panic!("unexpected {:?}", other),
        }
        let d = ResourceData::new_resource(
            schema(),
            tree(json!({"username": "jane", "password": "secret"})),
        );
        assert!(validate_user(&d).is_ok());
    }

    #[tokio::test]
    async fn test_create() {
        let mut api = MockUserClient::default();
        api.expect_create_user()
            .withf(|user: &User| {
                user.connection.as_deref() == Some("Username-Password-Authentication")
                    && user.password.as_deref() == Some("secret")
                    && user.user_metadata.as_ref().and_then(|x| x.get("team"))
                        == Some(&json!("blue"))
            })
            .returning(|_| Ok(remote()));
        api.expect_assign_user_roles()
            .withf(|id: &'_ str, roles: &Vec<String>| id == "auth0|1" && *roles == vec!["rol_1"])
            .returning(|_, _| Ok(()));
        api.expect_get_user().returning(|_| Ok(remote()));
        api.expect_list_user_roles()
            .returning(|_, _| Ok(Page::new(vec![role("rol_1")], false)));

        let mut d = ResourceData::new_resource(
            schema(),
            tree(json!({
                "connection_name": "Username-Password-Authentication",
                "email": "jane@example.com",
                "password": "secret",
                "user_metadata": "{\"team\": \"blue\"}",
                "roles": ["rol_1"]
            })),
        );
        resource(api).create(&mut d).await.unwrap();
        assert_eq!(Some("auth0|1"), d.id());
        assert_eq!(Some(&Value::from("secret")), d.get("password"));
        assert_eq!(
            Some(&Value::List(vec!["rol_1".into()])),
            d.get("roles")
        );
    }

    #[tokio::test]
    #[traced_test]
    async fn test_remove_role_of_deleted_role() {
        let mut api = MockUserClient::default();
        api.expect_update_user().never();
        api.expect_remove_user_roles()
            .withf(|_, roles: &Vec<String>| *roles == vec!["rol_gone"])
            .returning(|_, _| Err(ApiError::not_found("The role does not exist")));
        api.expect_assign_user_roles().never();
        api.expect_get_user().returning(|_| Ok(remote()));
        api.expect_list_user_roles()
            .returning(|_, _| Ok(Page::new(vec![role("rol_1")], false)));

        let mut d = ResourceData::existing(
            schema(),
            "auth0|1",
            tree(json!({"roles": ["rol_1", "rol_gone"]})),
            tree(json!({"roles": ["rol_1"]})),
        );
        resource(api).update(&mut d).await.unwrap();
        assert!(logs_contain("is already gone"));
    }

    #[tokio::test]
    async fn test_update_names_connection() {
        let mut api = MockUserClient::default();
        api.expect_update_user()
            .withf(|_, user: &User| {
                user.email.as_deref() == Some("new@example.com")
                    && user.connection.as_deref() == Some("db")
                    && user.name.is_none()
            })
            .returning(|_, _| Ok(remote()));
        api.expect_get_user().returning(|_| Ok(remote()));
        api.expect_list_user_roles()
            .returning(|_, _| Ok(Page::new(vec![], false)));

        let mut d = ResourceData::existing(
            schema(),
            "auth0|1",
            tree(json!({"connection_name": "db", "email": "old@example.com", "name": "Jane"})),
            tree(json!({"connection_name": "db", "email": "new@example.com", "name": "Jane"})),
        );
        resource(api).update(&mut d).await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_not_found() {
        let mut api = MockUserClient::default();
        api.expect_delete_user()
            .returning(|_| Err(ApiError::not_found("The user does not exist")));

        let mut d = ResourceData::from_state(schema(), "auth0|1", Block::new());
        resource(api).delete(&mut d).await.unwrap();
        assert_eq!(None, d.id());
    }
}
