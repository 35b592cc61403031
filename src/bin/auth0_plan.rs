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

//! Offline inspection of the payloads the reconcilers send.

use std::io;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Report, Result, WrapErr, eyre};
use tracing::{debug, warn};
use tracing_subscriber::{filter::LevelFilter, prelude::*};

use auth0_provider::diff;
use auth0_provider::provider::{planner, planners};
use auth0_provider::schema::{Block, ResourceData, Schema, Value};

/// Show what the provider would send to the management API.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Verbosity level. Repeat to increase level.
    #[arg(short, long, global=true, action = clap::ArgAction::Count, display_order = 920)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the payload create (without `--old`) or update would send.
    Expand {
        /// Resource type, e.g. `auth0_connection`.
        #[arg(short, long)]
        resource: String,

        /// Prior state of an existing resource.
        #[arg(long)]
        old: Option<PathBuf>,

        /// Desired configuration.
        new: PathBuf,
    },
    /// Print the delta between two versions of a collection attribute.
    Diff {
        /// Attribute holding the collection.
        #[arg(short, long)]
        path: String,

        /// Attribute identifying the collection elements.
        #[arg(short, long)]
        key: Option<String>,

        old: PathBuf,

        new: PathBuf,
    },
    /// List the supported resource types.
    Resources,
}

async fn load(path: &PathBuf) -> Result<Block> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .wrap_err_with(|| format!("cannot read {}", path.display()))?;
    let value: serde_json::Value =
        serde_json::from_str(&raw).wrap_err_with(|| format!("{} is not JSON", path.display()))?;
    Ok(ResourceData::block_from_json(&value)?)
}

fn values(items: &[Value]) -> serde_json::Value {
    serde_json::Value::Array(items.iter().map(Value::to_json).collect())
}

async fn expand(
    resource: &str,
    old: Option<&PathBuf>,
    new: &PathBuf,
) -> Result<serde_json::Value> {
    let planner =
        planner(resource).ok_or_else(|| eyre!("unsupported resource type `{resource}`"))?;
    let desired = load(new).await?;
    let d = match old {
        Some(old) => {
            let d =
                ResourceData::existing((planner.schema)(), "planned", load(old).await?, desired);
            let replaced = d.requires_replacement();
            if !replaced.is_empty() {
                warn!(
                    "{} must be replaced, changed attributes: {}",
                    resource,
                    replaced.join(", ")
                );
            }
            d
        }
        None => ResourceData::new_resource((planner.schema)(), desired),
    };
    Ok((planner.plan)(&d)?)
}

async fn delta(
    path: &str,
    key: Option<&str>,
    old: &PathBuf,
    new: &PathBuf,
) -> Result<serde_json::Value> {
    let d = ResourceData::existing(
        Schema::new(),
        "planned",
        load(old).await?,
        load(new).await?,
    );
    let delta = diff::collection(&d.scope(), path, key);
    debug!(
        "{} added, {} removed, {} changed",
        delta.to_add.len(),
        delta.to_remove.len(),
        delta.changed.len()
    );
    Ok(serde_json::json!({
        "to_add": values(&delta.to_add),
        "to_remove": values(&delta.to_remove),
        "changed": values(&delta.changed),
    }))
}

#[tokio::main]
async fn main() -> Result<(), Report> {
    color_eyre::install()?;
    let args = Args::parse();

    let log_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_filter(match args.verbose {
            0 => LevelFilter::WARN,
            1 => LevelFilter::INFO,
            2 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        });

    // build the tracing registry
    tracing_subscriber::registry().with(log_layer).init();

    let output = match &args.command {
        Command::Expand { resource, old, new } => expand(resource, old.as_ref(), new).await?,
        Command::Diff {
            path,
            key,
            old,
            new,
        } => delta(path, key.as_deref(), old, new).await?,
        Command::Resources => serde_json::Value::Array(
            planners()
                .iter()
                .map(|x| serde_json::Value::from(x.type_name))
                .collect(),
        ),
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
