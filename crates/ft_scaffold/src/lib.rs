//! # ft_scaffold
//!
//! Adds a resource (model, form, controller, view and migration) to an
//! existing FlaskTrack project by rendering the fragment templates declared
//! in `scaffold.yaml`.

pub mod appender;
pub mod blueprint;
pub mod error;
pub mod field;
pub mod fragment;
pub mod inflect;
pub mod migration;
pub mod resource;

pub use appender::{RenderedFragment, ScaffoldAppender, ScaffoldOptions, ScaffoldReport};
pub use blueprint::{register_resource, Registration, RegistrationReport};
pub use error::{ScaffoldError, ScaffoldResult};
pub use field::{parse_fields, Field, FieldType};
pub use fragment::{Fragment, FragmentKind, FragmentSet};
pub use inflect::pluralize;
pub use resource::Resource;
