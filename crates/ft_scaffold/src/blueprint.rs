//! Resource registration in a project's `app/__init__.py`.
//!
//! Two sites are updated: the blueprint registrations in `create_app` and the
//! models exposed by `make_shell_context`.

use std::fs;
use std::path::Path;

use regex::Regex;
use tracing::{debug, info};

use crate::error::ScaffoldResult;
use crate::resource::Resource;

/// Outcome of a registration attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    Added,
    AlreadyRegistered,
    /// The file has nothing to anchor the insertion on.
    NoRegistrationSite,
    MissingAppInit,
}

/// What [`register_resource`] did to each registration site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistrationReport {
    pub blueprint: Registration,
    pub shell_context: Registration,
}

/// Insert the import and `register_blueprint` call for `<plural>_bp` after the
/// last existing registration in `text`. Returns `None` when nothing changes.
pub fn insert_registration(text: &str, plural: &str) -> (Registration, Option<String>) {
    let import_line = format!("from app.controllers.{plural} import {plural}_bp");
    if text.contains(&import_line) {
        return (Registration::AlreadyRegistered, None);
    }

    let pattern = Regex::new(r"(?m)^([ \t]*)app\.register_blueprint\(.*\)[ \t]*\r?$")
        .expect("registration pattern is a valid regex");
    let Some(last) = pattern.captures_iter(text).last() else {
        return (Registration::NoRegistrationSite, None);
    };
    let (Some(line), Some(indent)) = (last.get(0), last.get(1)) else {
        return (Registration::NoRegistrationSite, None);
    };
    let indent = indent.as_str();

    let mut updated = String::with_capacity(text.len() + 128);
    updated.push_str(&text[..line.end()]);
    updated.push('\n');
    updated.push_str(&format!("{indent}{import_line}\n"));
    updated.push_str(&format!(
        "{indent}app.register_blueprint({plural}_bp, url_prefix=\"/{plural}\")"
    ));
    updated.push_str(&text[line.end()..]);

    (Registration::Added, Some(updated))
}

/// Expose `model` in `make_shell_context`: import it from `app.models.<snake>`
/// next to the existing model imports and add it to the returned dict.
pub fn insert_shell_context(text: &str, snake: &str, model: &str) -> (Registration, Option<String>) {
    let def_pattern = Regex::new(r"(?m)^[ \t]*def make_shell_context\(\)\s*:")
        .expect("shell context pattern is a valid regex");
    let return_pattern = Regex::new(r"(?m)^([ \t]*)return \{(.*)\}")
        .expect("shell context return pattern is a valid regex");
    let import_pattern = Regex::new(r"(?m)^[ \t]*from app\.models\.\w+ import [^\r\n]*")
        .expect("model import pattern is a valid regex");

    let Some(def) = def_pattern.find(text) else {
        return (Registration::NoRegistrationSite, None);
    };
    let body_start = def.end();
    let Some(ret) = return_pattern.captures(&text[body_start..]) else {
        return (Registration::NoRegistrationSite, None);
    };
    let (Some(ret_line), Some(indent), Some(entries)) = (ret.get(0), ret.get(1), ret.get(2)) else {
        return (Registration::NoRegistrationSite, None);
    };
    let ret_start = body_start + ret_line.start();
    let ret_end = body_start + ret_line.end();
    let indent = indent.as_str();

    let import_line = format!("from app.models.{snake} import {model}");
    let body = &text[body_start..ret_start];
    if body.lines().any(|line| line.trim() == import_line) {
        return (Registration::AlreadyRegistered, None);
    }

    let entry = format!("\"{model}\": {model}");
    let entries = entries.as_str().trim_end().trim_end_matches(',');
    let entries = if entries.trim().is_empty() {
        entry
    } else {
        format!("{entries}, {entry}")
    };

    let mut updated = String::with_capacity(text.len() + 128);
    match import_pattern.find_iter(body).last() {
        Some(last_import) => {
            let at = body_start + last_import.end();
            updated.push_str(&text[..at]);
            updated.push('\n');
            updated.push_str(&format!("{indent}{import_line}"));
            updated.push_str(&text[at..ret_start]);
        }
        None => {
            updated.push_str(&text[..ret_start]);
            updated.push_str(&format!("{indent}{import_line}\n\n"));
        }
    }
    updated.push_str(&format!("{indent}return {{{entries}}}"));
    updated.push_str(&text[ret_end..]);

    (Registration::Added, Some(updated))
}

/// Register `resource` in `<project>/app/__init__.py`: its blueprint and its
/// model in the shell context.
pub fn register_resource(
    project_root: &Path,
    resource: &Resource,
) -> ScaffoldResult<RegistrationReport> {
    let init = project_root.join("app").join("__init__.py");
    if !init.is_file() {
        debug!("No app/__init__.py in {:?}", project_root);
        return Ok(RegistrationReport {
            blueprint: Registration::MissingAppInit,
            shell_context: Registration::MissingAppInit,
        });
    }

    let mut text = fs::read_to_string(&init)?;
    let mut changed = false;

    let (blueprint, updated) = insert_registration(&text, resource.plural());
    if let Some(updated) = updated {
        text = updated;
        changed = true;
        info!("Registered blueprint {}_bp in {:?}", resource.plural(), init);
    }

    let (shell_context, updated) = insert_shell_context(&text, resource.snake(), resource.name());
    if let Some(updated) = updated {
        text = updated;
        changed = true;
        info!("Added {} to the shell context in {:?}", resource.name(), init);
    }

    if changed {
        fs::write(&init, text)?;
    }
    Ok(RegistrationReport {
        blueprint,
        shell_context,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const APP_INIT: &str = r#"def create_app():
    app = Flask(__name__)

    # Register blueprints
    from app.controllers.auth import auth_bp
    from app.controllers.main import main_bp

    app.register_blueprint(main_bp)
    app.register_blueprint(auth_bp, url_prefix="/auth")

    @app.shell_context_processor
    def make_shell_context():
        """Make database models available in flask shell."""
        from app.models.user import User

        return {"db": db, "User": User}

    return app
"#;

    #[test]
    fn test_inserts_after_last_registration() {
        let (registration, updated) = insert_registration(APP_INIT, "posts");
        assert_eq!(registration, Registration::Added);
        let updated = updated.unwrap();
        assert!(updated.contains(
            "    app.register_blueprint(auth_bp, url_prefix=\"/auth\")\n    from app.controllers.posts import posts_bp\n    app.register_blueprint(posts_bp, url_prefix=\"/posts\")\n\n    @app.shell_context_processor"
        ));
    }

    #[test]
    fn test_second_insert_is_noop() {
        let (_, updated) = insert_registration(APP_INIT, "posts");
        let (registration, again) = insert_registration(&updated.unwrap(), "posts");
        assert_eq!(registration, Registration::AlreadyRegistered);
        assert!(again.is_none());
    }

    #[test]
    fn test_no_registration_site() {
        let (registration, updated) = insert_registration("app = Flask(__name__)\n", "posts");
        assert_eq!(registration, Registration::NoRegistrationSite);
        assert!(updated.is_none());
    }

    #[test]
    fn test_shell_context_gets_model() {
        let (registration, updated) = insert_shell_context(APP_INIT, "post", "Post");
        assert_eq!(registration, Registration::Added);
        let updated = updated.unwrap();
        assert!(updated.contains(
            "        from app.models.user import User\n        from app.models.post import Post\n\n        return {\"db\": db, \"User\": User, \"Post\": Post}\n"
        ));

        let (registration, again) = insert_shell_context(&updated, "post", "Post");
        assert_eq!(registration, Registration::AlreadyRegistered);
        assert!(again.is_none());
    }

    #[test]
    fn test_shell_context_without_model_imports() {
        let text = "def make_shell_context():\n    return {\"db\": db}\n";
        let (registration, updated) = insert_shell_context(text, "blog_post", "BlogPost");
        assert_eq!(registration, Registration::Added);
        assert_eq!(
            updated.unwrap(),
            "def make_shell_context():\n    from app.models.blog_post import BlogPost\n\n    return {\"db\": db, \"BlogPost\": BlogPost}\n"
        );
    }

    #[test]
    fn test_no_shell_context() {
        let (registration, updated) = insert_shell_context("app = Flask(__name__)\n", "post", "Post");
        assert_eq!(registration, Registration::NoRegistrationSite);
        assert!(updated.is_none());
    }
}
