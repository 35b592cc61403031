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

use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::management::ApiError;
use crate::schema::SchemaError;

/// Lifecycle phase a remote call belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Create,
    Read,
    Update,
    Delete,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Create => write!(f, "create"),
            Phase::Read => write!(f, "read"),
            Phase::Update => write!(f, "update"),
            Phase::Delete => write!(f, "delete"),
        }
    }
}

/// Provider error.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// The resource or relationship member is gone remotely.
    #[error("{resource} {id} not found")]
    NotFound { resource: String, id: String },

    /// Mutually exclusive or unsupported combination of attributes.
    #[error("{0}")]
    ValidationConflict(String),

    /// Unsupported connection strategy.
    #[error("unsupported connection strategy `{0}`")]
    UnsupportedStrategy(String),

    /// Remote call failed for a reason that may resolve with time.
    #[error("{resource} {phase} failed: {source}")]
    RemoteTransient {
        resource: String,
        phase: Phase,
        /// The source of the error.
        source: ApiError,
    },

    /// Any other remote error.
    #[error("{resource} {phase} failed: {source}")]
    RemoteFatal {
        resource: String,
        phase: Phase,
        /// The source of the error.
        source: ApiError,
    },

    /// Retry budget exhausted.
    #[error("timeout after {budget:?} waiting for {what}: {source}")]
    Timeout {
        what: String,
        budget: Duration,
        /// Last retryable error.
        source: Box<ProviderError>,
    },

    /// Asynchronous build of an action did not succeed.
    #[error("action {id} build is {status}")]
    ActionBuild { id: String, status: String },

    /// Several errors collected together.
    #[error(transparent)]
    Diagnostics(Diagnostics),

    /// Configuration tree error.
    #[error(transparent)]
    Schema {
        /// The source of the error.
        #[from]
        source: SchemaError,
    },

    #[error("data serialization error: {}", source)]
    Serde {
        /// The source of the error.
        #[from]
        source: serde_json::Error,
    },

    #[error("error building {resource} payload: {message}")]
    Builder { resource: String, message: String },

    /// Lifecycle call on a resource that has no id.
    #[error("{0} has no id")]
    MissingId(String),

    /// Force-new attribute changed, the resource must be replaced.
    #[error("{resource} cannot be updated in place, changed attributes require replacement: {}", attributes.join(", "))]
    ReplacementRequired {
        resource: String,
        attributes: Vec<String>,
    },
}

impl ProviderError {
    /// Classify a remote error raised while processing `resource` in the given `phase`.
    pub fn remote<S: AsRef<str>>(resource: S, phase: Phase, source: ApiError) -> Self {
        if source.is_retryable() {
            Self::RemoteTransient {
                resource: resource.as_ref().to_string(),
                phase,
                source,
            }
        } else {
            Self::RemoteFatal {
                resource: resource.as_ref().to_string(),
                phase,
                source,
            }
        }
    }

    /// Whether the error signals that the target is already gone.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } => true,
            Self::RemoteFatal { source, .. } => source.is_not_found(),
            _ => false,
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RemoteTransient { .. })
    }
}

/// Collector of errors that must all be reported together instead of failing on the first one.
#[derive(Debug, Default)]
pub struct Diagnostics {
    errors: Vec<ProviderError>,
}

impl Diagnostics {
    pub fn push<E: Into<ProviderError>>(&mut self, error: E) {
        match error.into() {
            ProviderError::Diagnostics(nested) => self.errors.extend(nested.errors),
            other => self.errors.push(other),
        }
    }

    /// Record the error of `result` (if any) and return the successful value.
    pub fn collect<T, E: Into<ProviderError>>(&mut self, result: Result<T, E>) -> Option<T> {
        match result {
            Ok(val) => Some(val),
            Err(err) => {
                self.push(err);
                None
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProviderError> {
        self.errors.iter()
    }

    pub fn into_result(self) -> Result<(), ProviderError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ProviderError::Diagnostics(self))
        }
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.errors.len() == 1 {
            write!(f, "1 error occurred:")?;
        } else {
            write!(f, "{} errors occurred:", self.errors.len())?;
        }
        for err in &self.errors {
            write!(f, "\n\t* {err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for Diagnostics {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_classification() {
        let err = ProviderError::remote("user", Phase::Read, ApiError::status(503, "unavailable"));
        assert!(err.is_retryable());
        let err = ProviderError::remote("user", Phase::Read, ApiError::status(400, "bad"));
        assert!(!err.is_retryable());
        assert!(!err.is_not_found());
        let err = ProviderError::remote("user", Phase::Delete, ApiError::not_found("gone"));
        assert!(err.is_not_found());
        assert_eq!("user delete failed: 404: gone", err.to_string());
    }

    #[test]
    fn test_diagnostics() {
        let mut diags = Diagnostics::default();
        assert!(diags.collect(Ok::<_, ProviderError>(1)).is_some());
        diags.push(ProviderError::ValidationConflict("first".into()));
        let mut nested = Diagnostics::default();
        nested.push(ProviderError::ValidationConflict("second".into()));
        diags.push(ProviderError::Diagnostics(nested));
        assert_eq!(2, diags.len());

        let err = diags.into_result().unwrap_err();
        assert_eq!("2 errors occurred:\n\t* first\n\t* second", err.to_string());
        assert!(Diagnostics::default().into_result().is_ok());
    }
}
