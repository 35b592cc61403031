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
//! Contract of the external management API client.
//!
//! The HTTP client itself lives outside of this crate; every resource module declares the calls
//! it needs as an `async_trait` and the client implements them. This module holds the pieces
//! shared by all of them: the client error and pagination.

use std::future::Future;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

pub mod error;

pub use error::ApiError;

/// Pagination request.
#[derive(Builder, Clone, Copy, Debug, Default, Deserialize, PartialEq, Serialize)]
#[builder(setter(into))]
pub struct ListParameters {
    /// Zero based page number.
    #[builder(default)]
    pub page: u32,
    /// Maximum number of items per page.
    pub per_page: u32,
}

/// One page of a list call.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub has_next: bool,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, has_next: bool) -> Self {
        Self { items, has_next }
    }

    pub fn has_next(&self) -> bool {
        self.has_next
    }
}

/// Walk all pages of a list call.
pub async fn fetch_all<T, F, Fut>(per_page: u32, mut list: F) -> Result<Vec<T>, ApiError>
where
    F: FnMut(ListParameters) -> Fut,
    Fut: Future<Output = Result<Page<T>, ApiError>>,
{
    let mut result = Vec::new();
    let mut page = 0;
    loop {
        let current = list(ListParameters { page, per_page }).await?;
        let last = !current.has_next() || current.items.is_empty();
        result.extend(current.items);
        if last {
            return Ok(result);
        }
        page += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fetch_all() {
        let res = fetch_all(2, |params| async move {
            assert_eq!(2, params.per_page);
            Ok(match params.page {
                0 => Page::new(vec![1, 2], true),
                1 => Page::new(vec![3, 4], true),
                _ => Page::new(vec![5], false),
            })
        })
        .await
        .unwrap();
        assert_eq!(vec![1, 2, 3, 4, 5], res);
    }

    #[tokio::test]
    async fn test_fetch_all_stops_on_empty_page() {
        let res: Vec<u32> = fetch_all(10, |_| async { Ok(Page::new(vec![], true)) })
            .await
            .unwrap();
        assert!(res.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_all_error() {
        let res: Result<Vec<u32>, _> = fetch_all(10, |params| async move {
            if params.page == 0 {
                Ok(Page::new(vec![1], true))
            } else {
                Err(ApiError::status(500, "boom"))
            }
        })
        .await;
        assert_eq!(Err(ApiError::status(500, "boom")), res);
    }

    #[test]
    fn test_list_parameters_builder() {
        let params = ListParametersBuilder::default()
            .per_page(25u32)
            .build()
            .unwrap();
        assert_eq!(
            ListParameters {
                page: 0,
                per_page: 25
            },
            params
        );
    }
}
