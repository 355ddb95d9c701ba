//! Template manifest definitions.
//!
//! A manifest declares the parameters a template substitutes, in the order
//! they are resolved, together with their prompt text, default value and
//! validation rule. Manifests are plain YAML:
//!
//! ```yaml
//! id: flask-app
//! name: Flask application
//! description: Flask app with authentication
//! parameters:
//!   - name: project_name
//!     prompt: Project name
//!     default: My Flask App
//!     rule: text
//!   - name: project_slug
//!     prompt: Project slug
//!     default: "{{ ft.project_name | slug }}"
//!     rule: slug
//! ```

use std::collections::HashSet;
use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{TemplateError, TemplateResult};
use crate::renderer::{Filter, TokenSubstitutor};

/// Rule a resolved parameter value must satisfy.
#[derive(Debug, Clone)]
pub enum ValidationRule {
    /// Any value, including the empty string.
    Any,
    /// Non-blank text.
    Text,
    /// Letters, digits, `_`, `.` and `-`, starting with a letter or digit.
    Slug,
    /// A Python-style identifier.
    Identifier,
    Integer,
    /// An integer in 1..=65535.
    Port,
    Email,
    Pattern(Regex),
    Choice(Vec<String>),
}

impl ValidationRule {
    /// Parse a rule from its manifest spelling, e.g. `slug` or `pattern:^3\.\d+$`.
    pub fn parse(spec: &str) -> Result<Self, String> {
        let spec = spec.trim();
        if let Some(pattern) = spec.strip_prefix("pattern:") {
            let anchored = format!("^(?:{})$", pattern.trim_start_matches('^').trim_end_matches('$'));
            return Regex::new(&anchored)
                .map(ValidationRule::Pattern)
                .map_err(|e| format!("invalid pattern '{}': {}", pattern, e));
        }
        if let Some(choices) = spec.strip_prefix("choice:") {
            let options: Vec<String> = choices
                .split('|')
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .collect();
            if options.is_empty() {
                return Err("choice rule needs at least one option".to_string());
            }
            return Ok(ValidationRule::Choice(options));
        }

        match spec {
            "any" => Ok(ValidationRule::Any),
            "text" => Ok(ValidationRule::Text),
            "slug" => Ok(ValidationRule::Slug),
            "identifier" => Ok(ValidationRule::Identifier),
            "integer" => Ok(ValidationRule::Integer),
            "port" => Ok(ValidationRule::Port),
            "email" => Ok(ValidationRule::Email),
            other => Err(format!("unknown validation rule '{}'", other)),
        }
    }

    /// Check a value, returning a human-readable reason on failure.
    pub fn check(&self, value: &str) -> Result<(), String> {
        let ok = match self {
            ValidationRule::Any => true,
            ValidationRule::Text => !value.trim().is_empty(),
            ValidationRule::Slug => {
                let mut chars = value.chars();
                chars.next().is_some_and(|c| c.is_ascii_alphanumeric())
                    && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
            }
            ValidationRule::Identifier => is_identifier(value),
            ValidationRule::Integer => value.parse::<i64>().is_ok(),
            ValidationRule::Port => value.parse::<u16>().is_ok_and(|p| p > 0),
            ValidationRule::Email => {
                let mut parts = value.splitn(2, '@');
                let local = parts.next().unwrap_or_default();
                let domain = parts.next().unwrap_or_default();
                !local.is_empty()
                    && !domain.starts_with('.')
                    && domain.contains('.')
                    && !domain.ends_with('.')
                    && !value.chars().any(char::is_whitespace)
            }
            ValidationRule::Pattern(re) => re.is_match(value),
            ValidationRule::Choice(options) => options.iter().any(|o| o == value),
        };

        if ok {
            Ok(())
        } else {
            Err(format!("expected {}", self))
        }
    }
}

impl fmt::Display for ValidationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationRule::Any => write!(f, "any value"),
            ValidationRule::Text => write!(f, "non-empty text"),
            ValidationRule::Slug => write!(f, "a slug (letters, digits, '_', '-', '.')"),
            ValidationRule::Identifier => write!(f, "an identifier"),
            ValidationRule::Integer => write!(f, "an integer"),
            ValidationRule::Port => write!(f, "a port number between 1 and 65535"),
            ValidationRule::Email => write!(f, "an email address"),
            ValidationRule::Pattern(re) => write!(f, "a value matching {}", re.as_str()),
            ValidationRule::Choice(options) => write!(f, "one of: {}", options.join(", ")),
        }
    }
}

/// Whether `s` is a valid identifier (`[A-Za-z_][A-Za-z0-9_]*`).
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Parameter declaration as written in the manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawParameter {
    name: String,
    #[serde(default)]
    prompt: Option<String>,
    #[serde(default)]
    default: Option<String>,
    #[serde(default)]
    rule: Option<String>,
}

/// Manifest as written on disk, before validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawManifest {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default = "default_version")]
    version: String,
    #[serde(default)]
    parameters: Vec<RawParameter>,
    #[serde(default)]
    copy_without_render: Vec<String>,
}

fn default_version() -> String {
    "1.0.0".to_string()
}

/// A validated parameter declaration.
#[derive(Debug, Clone)]
pub struct ParameterSpec {
    pub name: String,
    pub prompt: String,
    /// Default value; may reference earlier parameters through tokens.
    pub default: String,
    pub rule: ValidationRule,
}

/// A validated template manifest.
#[derive(Debug, Clone)]
pub struct Manifest {
    /// Unique template identifier
    pub id: String,
    /// Display name
    pub name: String,
    pub description: String,
    pub version: String,
    /// Parameters in resolution order
    pub parameters: Vec<ParameterSpec>,
    /// Paths copied verbatim, without token substitution
    pub copy_without_render: Vec<glob::Pattern>,
}

impl Manifest {
    /// Parse and validate a manifest from YAML text.
    ///
    /// `source` names the manifest in error messages.
    pub fn from_yaml(source: &str, yaml: &str) -> TemplateResult<Self> {
        let raw: RawManifest = serde_yaml::from_str(yaml)
            .map_err(|e| TemplateError::configuration(source, e.to_string()))?;
        Self::validate(raw)
    }

    fn validate(raw: RawManifest) -> TemplateResult<Self> {
        let template = raw.id.clone();
        let config_err = |message: String| TemplateError::configuration(&template, message);

        if raw.id.trim().is_empty() {
            return Err(config_err("field 'id' must not be empty".to_string()));
        }
        if raw.name.trim().is_empty() {
            return Err(config_err("field 'name' must not be empty".to_string()));
        }

        let substitutor = TokenSubstitutor::new();
        let mut declared: HashSet<String> = HashSet::new();
        let mut parameters = Vec::with_capacity(raw.parameters.len());

        for param in raw.parameters {
            if !is_identifier(&param.name) {
                return Err(config_err(format!("invalid parameter name '{}'", param.name)));
            }
            if declared.contains(&param.name) {
                return Err(config_err(format!("duplicate parameter '{}'", param.name)));
            }

            let rule = match &param.rule {
                Some(spec) => ValidationRule::parse(spec)
                    .map_err(|e| config_err(format!("parameter '{}': {}", param.name, e)))?,
                None => ValidationRule::Any,
            };

            let default = param.default.unwrap_or_default();
            let tokens = substitutor.tokens(&default);
            for token in &tokens {
                if !declared.contains(&token.name) {
                    return Err(config_err(format!(
                        "default of '{}' references '{}', which is not declared before it",
                        param.name, token.name
                    )));
                }
                if let Some(filter) = &token.filter {
                    if Filter::parse(filter).is_none() {
                        return Err(config_err(format!(
                            "default of '{}' uses unknown filter '{}'",
                            param.name, filter
                        )));
                    }
                }
            }
            // Literal defaults can be checked now; derived ones are checked at resolution.
            if tokens.is_empty() {
                if let Err(reason) = rule.check(&default) {
                    return Err(config_err(format!(
                        "default {:?} of '{}' is invalid: {}",
                        default, param.name, reason
                    )));
                }
            }

            declared.insert(param.name.clone());
            parameters.push(ParameterSpec {
                prompt: param.prompt.unwrap_or_else(|| param.name.clone()),
                name: param.name,
                default,
                rule,
            });
        }

        let copy_without_render = raw
            .copy_without_render
            .iter()
            .map(|p| {
                glob::Pattern::new(p)
                    .map_err(|e| config_err(format!("invalid copy_without_render pattern '{}': {}", p, e)))
            })
            .collect::<TemplateResult<Vec<_>>>()?;

        Ok(Manifest {
            id: raw.id,
            name: raw.name,
            description: raw.description,
            version: raw.version,
            parameters,
            copy_without_render,
        })
    }

    /// Look up a parameter declaration by name.
    pub fn parameter(&self, name: &str) -> Option<&ParameterSpec> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Whether a template-relative path is copied without substitution.
    pub fn is_copy_only(&self, relative: &std::path::Path) -> bool {
        self.copy_without_render
            .iter()
            .any(|p| p.matches_path(relative))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"
id: demo
name: Demo
description: Demo template
parameters:
  - name: project_name
    prompt: Project name
    default: My App
    rule: text
  - name: project_slug
    default: "{{ ft.project_name | slug }}"
    rule: slug
  - name: flask_port
    default: "5000"
    rule: port
copy_without_render:
  - "**/*.png"
"#;

    #[test]
    fn test_parse_manifest() {
        let manifest = Manifest::from_yaml("demo", MANIFEST).unwrap();
        assert_eq!(manifest.id, "demo");
        assert_eq!(manifest.version, "1.0.0");
        assert_eq!(manifest.parameters.len(), 3);
        assert_eq!(manifest.parameters[1].prompt, "project_slug");
        assert!(manifest.is_copy_only(std::path::Path::new("app/static/logo.png")));
        assert!(!manifest.is_copy_only(std::path::Path::new("app/config.py")));
    }

    #[test]
    fn test_missing_required_field() {
        let err = Manifest::from_yaml("bad", "name: No id\n").unwrap_err();
        assert!(matches!(err, TemplateError::Configuration { .. }));
    }

    #[test]
    fn test_duplicate_parameter() {
        let yaml = r#"
id: dup
name: Dup
parameters:
  - name: a
  - name: a
"#;
        let err = Manifest::from_yaml("dup", yaml).unwrap_err();
        assert!(err.to_string().contains("duplicate parameter 'a'"));
    }

    #[test]
    fn test_invalid_rule() {
        let yaml = r#"
id: bad
name: Bad
parameters:
  - name: a
    rule: colour
"#;
        let err = Manifest::from_yaml("bad", yaml).unwrap_err();
        assert!(err.to_string().contains("unknown validation rule 'colour'"));
    }

    #[test]
    fn test_forward_reference_in_default() {
        let yaml = r#"
id: fwd
name: Fwd
parameters:
  - name: slug
    default: "{{ ft.name }}"
  - name: name
    default: x
"#;
        let err = Manifest::from_yaml("fwd", yaml).unwrap_err();
        assert!(err.to_string().contains("not declared before it"));
    }

    #[test]
    fn test_literal_default_must_satisfy_rule() {
        let yaml = r#"
id: port
name: Port
parameters:
  - name: flask_port
    default: "eighty"
    rule: port
"#;
        assert!(Manifest::from_yaml("port", yaml).is_err());
    }

    #[test]
    fn test_rules() {
        assert!(ValidationRule::parse("port").unwrap().check("5000").is_ok());
        assert!(ValidationRule::parse("port").unwrap().check("0").is_err());
        assert!(ValidationRule::parse("port").unwrap().check("70000").is_err());
        assert!(ValidationRule::parse("slug").unwrap().check("my_app").is_ok());
        assert!(ValidationRule::parse("slug").unwrap().check("my/app").is_err());
        assert!(ValidationRule::parse("email").unwrap().check("a@b.io").is_ok());
        assert!(ValidationRule::parse("email").unwrap().check("a@b").is_err());
        let pattern = ValidationRule::parse(r"pattern:^3\.\d+$").unwrap();
        assert!(pattern.check("3.12").is_ok());
        assert!(pattern.check("2.7x").is_err());
        let choice = ValidationRule::parse("choice:sqlite|postgres").unwrap();
        assert!(choice.check("postgres").is_ok());
        assert!(choice.check("mysql").is_err());
        assert!(ValidationRule::parse("pattern:(").is_err());
    }
}
