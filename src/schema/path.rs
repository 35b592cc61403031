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

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PathStep {
    Attr(String),
    Index(usize),
}

/// Dotted path into the configuration tree, e.g. `options.0.validation.0.username.0.min`.
///
/// Numeric segments address elements of lists and sets of blocks, every other segment names an
/// attribute.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AttributePath(Vec<PathStep>);

impl AttributePath {
    pub fn steps(&self) -> &[PathStep] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Path of `other` relative to `self`.
    pub fn join(&self, other: &AttributePath) -> AttributePath {
        let mut steps = self.0.clone();
        steps.extend(other.0.iter().cloned());
        AttributePath(steps)
    }

    pub fn index(&self, idx: usize) -> AttributePath {
        let mut steps = self.0.clone();
        steps.push(PathStep::Index(idx));
        AttributePath(steps)
    }
}

impl From<&str> for AttributePath {
    fn from(value: &str) -> Self {
        AttributePath(
            value
                .split('.')
                .filter(|x| !x.is_empty())
                .map(|x| match x.parse::<usize>() {
                    Ok(idx) => PathStep::Index(idx),
                    Err(_) => PathStep::Attr(x.to_string()),
                })
                .collect(),
        )
    }
}

impl fmt::Display for AttributePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ".")?;
            }
            match step {
                PathStep::Attr(name) => write!(f, "{name}")?,
                PathStep::Index(idx) => write!(f, "{idx}")?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        let path = AttributePath::from("options.0.validation.0.username.0.min");
        assert_eq!(
            &[
                PathStep::Attr("options".into()),
                PathStep::Index(0),
                PathStep::Attr("validation".into()),
                PathStep::Index(0),
                PathStep::Attr("username".into()),
                PathStep::Index(0),
                PathStep::Attr("min".into()),
            ],
            path.steps()
        );
        assert_eq!("options.0.validation.0.username.0.min", path.to_string());
        assert!(AttributePath::from("").is_empty());
    }

    #[test]
    fn test_join() {
        let base = AttributePath::from("options").index(0);
        assert_eq!(
            "options.0.scopes",
            base.join(&AttributePath::from("scopes")).to_string()
        );
    }
}
