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

use config::{File, FileFormat};
use eyre::Report;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Default, Deserialize, Clone)]
pub struct Config {
    /// Reconciliation settings
    #[serde(default)]
    pub reconcile: ReconcileSection,

    /// Action build polling
    #[serde(default)]
    pub action: ActionSection,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReconcileSection {
    /// Page size used when listing relationship collections.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl Default for ReconcileSection {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ActionSection {
    /// Budget (in seconds) for an action build to reach a terminal status.
    #[serde(default = "default_build_timeout")]
    pub build_timeout: u64,

    /// Delay (in milliseconds) between two build status checks.
    #[serde(default = "default_poll_interval")]
    pub poll_interval: u64,
}

impl Default for ActionSection {
    fn default() -> Self {
        Self {
            build_timeout: default_build_timeout(),
            poll_interval: default_poll_interval(),
        }
    }
}

impl ActionSection {
    pub fn build_timeout(&self) -> Duration {
        Duration::from_secs(self.build_timeout)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval)
    }
}

fn default_page_size() -> u32 {
    50
}

fn default_build_timeout() -> u64 {
    300
}

fn default_poll_interval() -> u64 {
    1000
}

impl Config {
    /// Load the INI file at `path` on top of the defaults. A missing file yields the defaults.
    ///
    /// Embedders pass the result to the reconcilers that list or poll, e.g.
    /// `OrganizationResource::new(&config, api)`.
    pub fn new(path: PathBuf) -> Result<Self, Report> {
        let mut builder = config::Config::builder();

        builder = builder.set_default("reconcile.page_size", "50")?;
        if std::path::Path::new(&path).is_file() {
            builder = builder.add_source(File::from(path).format(FileFormat::Ini));
        }

        Ok(builder.build()?.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use tempfile::NamedTempFile;

    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = Config::default();
        assert_eq!(50, cfg.reconcile.page_size);
        assert_eq!(Duration::from_secs(300), cfg.action.build_timeout());
        assert_eq!(Duration::from_millis(1000), cfg.action.poll_interval());
    }

    #[test]
    fn test_missing_file() {
        let cfg = Config::new("/nonexistent/provider.conf".into()).unwrap();
        assert_eq!(50, cfg.reconcile.page_size);
    }

    #[test]
    fn test_load_ini() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[reconcile]\npage_size = 100\n\n[action]\nbuild_timeout = 60\npoll_interval = 250"
        )
        .unwrap();
        let cfg = Config::new(file.path().to_path_buf()).unwrap();
        assert_eq!(100, cfg.reconcile.page_size);
        assert_eq!(Duration::from_secs(60), cfg.action.build_timeout());
        assert_eq!(Duration::from_millis(250), cfg.action.poll_interval());
    }

    #[test]
    fn test_unknown_section_ignored() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[DEFAULT]\ndebug = true\n\n[reconcile]\npage_size = 20").unwrap();
        let cfg = Config::new(file.path().to_path_buf()).unwrap();
        assert_eq!(20, cfg.reconcile.page_size);
        assert_eq!(Duration::from_secs(300), cfg.action.build_timeout());
    }
}
