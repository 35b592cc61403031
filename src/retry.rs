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
//! Bounded polling of asynchronous remote operations.

use std::future::Future;
use std::time::Duration;

use tokio::time::{Instant, sleep};
use tracing::debug;

use crate::error::ProviderError;

/// Outcome of a failed attempt.
#[derive(Debug)]
pub enum RetryError {
    /// Not there yet, try again while the budget allows it.
    Retryable(ProviderError),
    /// Stop immediately.
    NonRetryable(ProviderError),
}

impl From<ProviderError> for RetryError {
    fn from(value: ProviderError) -> Self {
        if value.is_retryable() {
            Self::Retryable(value)
        } else {
            Self::NonRetryable(value)
        }
    }
}

/// Call `f` until it succeeds, fails with a non retryable error or `budget` is exhausted.
pub async fn retry<T, F, Fut>(
    what: &str,
    budget: Duration,
    interval: Duration,
    mut f: F,
) -> Result<T, ProviderError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, RetryError>>,
{
    let deadline = Instant::now() + budget;
    let mut attempt: u32 = 0;
    loop {
        attempt += 1;
        match f().await {
            Ok(val) => return Ok(val),
            Err(RetryError::NonRetryable(err)) => return Err(err),
            Err(RetryError::Retryable(err)) => {
                if Instant::now() + interval > deadline {
                    return Err(ProviderError::Timeout {
                        what: what.to_string(),
                        budget,
                        source: Box::new(err),
                    });
                }
                debug!("attempt {} for {} is not final yet: {}", attempt, what, err);
                sleep(interval).await;
            }
        }
    }
}
