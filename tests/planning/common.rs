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
//! Helpers shared by the planning tests.

use eyre::Report;
use serde_json::Value;

use auth0_provider::provider::{Planner, planner};
use auth0_provider::schema::ResourceData;

pub fn planner_of(resource: &str) -> Result<Planner, Report> {
    planner(resource).ok_or_else(|| eyre::eyre!("no planner for {resource}"))
}

/// Payload of a new resource.
pub fn plan_create(resource: &str, desired: Value) -> Result<Value, Report> {
    let planner = planner_of(resource)?;
    let d = ResourceData::new_resource(
        (planner.schema)(),
        ResourceData::block_from_json(&desired)?,
    );
    Ok((planner.plan)(&d)?)
}

/// Payload of an update from `prior` to `desired`.
pub fn plan_update(resource: &str, prior: Value, desired: Value) -> Result<Value, Report> {
    let planner = planner_of(resource)?;
    let d = ResourceData::existing(
        (planner.schema)(),
        "planned",
        ResourceData::block_from_json(&prior)?,
        ResourceData::block_from_json(&desired)?,
    );
    Ok((planner.plan)(&d)?)
}
