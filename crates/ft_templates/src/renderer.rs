//! Placeholder token substitution.
//!
//! Tokens look like `{{ ft.project_slug }}`, optionally piped through one
//! filter: `{{ ft.project_name | slug }}`. Anything else inside `{{ }}` is
//! left alone so Jinja expressions in generated views pass through verbatim.

use std::path::Path;

use regex::{Captures, Regex};

use crate::case;
use crate::error::{TemplateError, TemplateResult};
use crate::params::ParameterSet;

/// Filter applied to a token's value before substitution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
    Lower,
    Upper,
    Slug,
    Snake,
    Kebab,
    Pascal,
    Title,
}

impl Filter {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "lower" => Some(Filter::Lower),
            "upper" => Some(Filter::Upper),
            "slug" => Some(Filter::Slug),
            "snake" => Some(Filter::Snake),
            "kebab" => Some(Filter::Kebab),
            "pascal" => Some(Filter::Pascal),
            "title" => Some(Filter::Title),
            _ => None,
        }
    }

    pub fn apply(self, value: &str) -> String {
        match self {
            Filter::Lower => value.to_lowercase(),
            Filter::Upper => value.to_uppercase(),
            Filter::Slug => case::to_slug(value),
            Filter::Snake => case::to_snake_case(value),
            Filter::Kebab => case::to_kebab_case(value),
            Filter::Pascal => case::to_pascal_case(value),
            Filter::Title => case::to_title_case(value),
        }
    }
}

/// A token occurrence found in a piece of template text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRef {
    /// Full token text, e.g. `{{ ft.project_name | slug }}`.
    pub text: String,
    pub name: String,
    pub filter: Option<String>,
}

/// Replaces placeholder tokens with resolved parameter values.
#[derive(Debug, Clone)]
pub struct TokenSubstitutor {
    token_pattern: Regex,
    marker_pattern: Regex,
}

impl Default for TokenSubstitutor {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenSubstitutor {
    /// Create a new token substitutor.
    pub fn new() -> Self {
        Self {
            // Names and filters are captured loosely so malformed ones are reported, not skipped.
            token_pattern: Regex::new(
                r"\{\{\s*ft\.([^\s|}]*)\s*(?:\|\s*([^\s}]*)\s*)?\}\}",
            )
            .expect("token pattern is a valid regex"),
            marker_pattern: Regex::new(r"\{\{\s*ft\.").expect("marker pattern is a valid regex"),
        }
    }

    /// Substitute every token in `text`.
    ///
    /// `origin` names the file the text came from and is carried into errors.
    pub fn substitute(
        &self,
        text: &str,
        parameters: &ParameterSet,
        origin: &Path,
    ) -> TemplateResult<String> {
        if let Some(token) = self.malformed(text).into_iter().next() {
            return Err(TemplateError::MalformedToken {
                token,
                path: origin.to_path_buf(),
            });
        }

        let mut failure = None;
        let rendered = self.token_pattern.replace_all(text, |caps: &Captures| {
            if failure.is_some() {
                return String::new();
            }
            match self.render_token(caps, parameters, origin) {
                Ok(value) => value,
                Err(e) => {
                    failure = Some(e);
                    String::new()
                }
            }
        });

        match failure {
            Some(e) => Err(e),
            None => Ok(rendered.into_owned()),
        }
    }

    fn render_token(
        &self,
        caps: &Captures,
        parameters: &ParameterSet,
        origin: &Path,
    ) -> TemplateResult<String> {
        let token = caps[0].to_string();
        let value = parameters
            .get(&caps[1])
            .ok_or_else(|| TemplateError::UnresolvedToken {
                token: token.clone(),
                path: origin.to_path_buf(),
            })?;

        match caps.get(2) {
            None => Ok(value.to_string()),
            Some(filter_name) => {
                let filter = Filter::parse(filter_name.as_str()).ok_or_else(|| {
                    TemplateError::InvalidToken {
                        token: token.clone(),
                        filter: filter_name.as_str().to_string(),
                        path: origin.to_path_buf(),
                    }
                })?;
                Ok(filter.apply(value))
            }
        }
    }

    /// List the tokens referenced by `text`, in order of appearance.
    pub fn tokens(&self, text: &str) -> Vec<TokenRef> {
        self.token_pattern
            .captures_iter(text)
            .map(|caps| TokenRef {
                text: caps[0].to_string(),
                name: caps[1].to_string(),
                filter: caps.get(2).map(|m| m.as_str().to_string()),
            })
            .collect()
    }

    /// Markers in `text` that do not form a well-formed token.
    ///
    /// Each entry runs from the marker to the next `}}`, or to the end of the
    /// line when the token is never closed.
    pub fn malformed(&self, text: &str) -> Vec<String> {
        let rest = self.token_pattern.replace_all(text, "");
        self.marker_pattern
            .find_iter(&rest)
            .map(|marker| {
                let tail = rest[marker.start()..].split('\n').next().unwrap_or_default();
                let end = tail.find("}}").map(|i| i + 2).unwrap_or(tail.len());
                tail[..end].trim_end().to_string()
            })
            .collect()
    }

    /// Whether any placeholder marker survives in `text`.
    pub fn contains_marker(&self, text: &str) -> bool {
        self.marker_pattern.is_match(text)
    }
}
