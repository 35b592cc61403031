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

use eyre::Report;
use serde_json::json;

use auth0_provider::diff;
use auth0_provider::error::ProviderError;
use auth0_provider::provider::planners;
use auth0_provider::schema::{ResourceData, Schema};

mod common;

use common::*;

#[test]
fn test_connection_create() -> Result<(), Report> {
    let payload = plan_create(
        "auth0_connection",
        json!({
            "name": "google",
            "strategy": "google-oauth2",
            "options": [{"client_id": "abc", "scopes": ["email", "profile"]}]
        }),
    )?;
    assert_eq!("google", payload["name"]);
    assert_eq!("google-oauth2", payload["strategy"]);
    assert_eq!("abc", payload["options"]["client_id"]);
    assert_eq!(true, payload["options"]["email"]);
    assert_eq!(true, payload["options"]["profile"]);
    Ok(())
}

#[test]
fn test_update_sends_only_changes() -> Result<(), Report> {
    let payload = plan_update(
        "auth0_resource_server",
        json!({"identifier": "https://api", "name": "API", "token_lifetime": 3600}),
        json!({"identifier": "https://api", "name": "API", "token_lifetime": 7200}),
    )?;
    assert_eq!(json!({"token_lifetime": 7200}), payload);
    Ok(())
}

#[test]
fn test_user_conflicts() -> Result<(), Report> {
    let res = plan_update(
        "auth0_user",
        json!({"connection_name": "db", "username": "a", "password": "x"}),
        json!({"connection_name": "db", "username": "b", "password": "y"}),
    );
    let err = res.expect_err("conflicting changes are planned");
    match err.downcast_ref::<ProviderError>() {
        Some(ProviderError::Diagnostics(errors)) => {
            assert_eq!(1, errors.len());
            assert!(errors.to_string().contains("username and password"));
        }
        other => panic!("unexpected {:?}", other),
    }
    Ok(())
}

#[test]
fn test_every_resource_plans_an_empty_update() -> Result<(), Report> {
    for planner in planners() {
        let d = ResourceData::existing(
            (planner.schema)(),
            "planned",
            ResourceData::block_from_json(&json!({}))?,
            ResourceData::block_from_json(&json!({}))?,
        );
        let payload = (planner.plan)(&d)?;
        assert!(
            payload.as_object().is_some_and(|x| x.is_empty()),
            "{} plans {}",
            planner.type_name,
            payload
        );
    }
    Ok(())
}

#[test]
fn test_collection_delta() -> Result<(), Report> {
    let d = ResourceData::existing(
        Schema::new(),
        "planned",
        ResourceData::block_from_json(&json!({"connections": [
            {"connection_id": "con_1", "assign_membership_on_login": false},
            {"connection_id": "con_2", "assign_membership_on_login": false}
        ]}))?,
        ResourceData::block_from_json(&json!({"connections": [
            {"connection_id": "con_2", "assign_membership_on_login": true},
            {"connection_id": "con_3", "assign_membership_on_login": false}
        ]}))?,
    );
    let delta = diff::collection(&d.scope(), "connections", Some("connection_id"));
    let ids = |items: &[auth0_provider::schema::Value]| -> Vec<serde_json::Value> {
        items
            .iter()
            .map(|x| x.to_json()["connection_id"].clone())
            .collect()
    };
    assert_eq!(vec![json!("con_3")], ids(&delta.to_add));
    assert_eq!(vec![json!("con_1")], ids(&delta.to_remove));
    assert_eq!(vec![json!("con_2")], ids(&delta.changed));
    Ok(())
}
