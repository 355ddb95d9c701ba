//! Resource field definitions (`name:type`).

use std::collections::HashSet;
use std::fmt;

use ft_templates::case::to_pascal_case;
use ft_templates::manifest::is_identifier;
use regex::Regex;

use crate::error::{ScaffoldError, ScaffoldResult};

/// Column types a scaffolded field may have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Text,
    Integer,
    Float,
    Decimal,
    Boolean,
    Date,
    DateTime,
    References,
    BelongsTo,
}

impl FieldType {
    pub fn all() -> [FieldType; 10] {
        [
            FieldType::String,
            FieldType::Text,
            FieldType::Integer,
            FieldType::Float,
            FieldType::Decimal,
            FieldType::Boolean,
            FieldType::Date,
            FieldType::DateTime,
            FieldType::References,
            FieldType::BelongsTo,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Text => "text",
            FieldType::Integer => "integer",
            FieldType::Float => "float",
            FieldType::Decimal => "decimal",
            FieldType::Boolean => "boolean",
            FieldType::Date => "date",
            FieldType::DateTime => "datetime",
            FieldType::References => "references",
            FieldType::BelongsTo => "belongs_to",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::all().into_iter().find(|t| t.as_str() == s)
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, FieldType::References | FieldType::BelongsTo)
    }

    /// SQLAlchemy column type used in the model.
    pub fn column_type(&self) -> &'static str {
        match self {
            FieldType::String => "db.String(255)",
            FieldType::Text => "db.Text",
            FieldType::Integer | FieldType::References | FieldType::BelongsTo => "db.Integer",
            FieldType::Float => "db.Float",
            FieldType::Decimal => "db.Numeric",
            FieldType::Boolean => "db.Boolean",
            FieldType::Date => "db.Date",
            FieldType::DateTime => "db.DateTime",
        }
    }

    /// Alembic column type used in the migration.
    pub fn migration_type(&self) -> &'static str {
        match self {
            FieldType::String => "sa.String(length=255)",
            FieldType::Text => "sa.Text()",
            FieldType::Integer | FieldType::References | FieldType::BelongsTo => "sa.Integer()",
            FieldType::Float => "sa.Float()",
            FieldType::Decimal => "sa.Numeric()",
            FieldType::Boolean => "sa.Boolean()",
            FieldType::Date => "sa.Date()",
            FieldType::DateTime => "sa.DateTime()",
        }
    }

    /// WTForms field class used in the form.
    pub fn form_field(&self) -> &'static str {
        match self {
            FieldType::String => "StringField",
            FieldType::Text => "TextAreaField",
            FieldType::Integer => "IntegerField",
            FieldType::Float => "FloatField",
            FieldType::Decimal => "DecimalField",
            FieldType::Boolean => "BooleanField",
            FieldType::Date => "DateField",
            FieldType::DateTime => "DateTimeLocalField",
            FieldType::References | FieldType::BelongsTo => "SelectField",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One parsed `name:type` field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub field_type: FieldType,
    /// Model a reference field points at.
    pub referenced_model: Option<String>,
}

impl Field {
    /// Parse a single definition such as `title:string` or `author:references[User]`.
    pub fn parse(definition: &str) -> ScaffoldResult<Self> {
        let (name, type_spec) = definition
            .split_once(':')
            .ok_or_else(|| ScaffoldError::InvalidFieldDefinition(definition.to_string()))?;
        let name = name.trim();
        let type_spec = type_spec.trim();

        if !is_identifier(name) {
            return Err(ScaffoldError::InvalidFieldName(name.to_string()));
        }

        let reference = Regex::new(r"^(references|belongs_to)(?:\[([A-Za-z_][A-Za-z0-9_]*)\])?$")
            .expect("reference pattern is a valid regex");
        let (type_name, referenced_model) = match reference.captures(type_spec) {
            Some(caps) => (
                caps.get(1).map_or("", |m| m.as_str()),
                Some(
                    caps.get(2)
                        .map(|m| m.as_str().to_string())
                        .unwrap_or_else(|| to_pascal_case(name)),
                ),
            ),
            None => (type_spec, None),
        };

        let field_type = FieldType::parse(type_name).ok_or_else(|| ScaffoldError::InvalidFieldType {
            field: name.to_string(),
            field_type: type_spec.to_string(),
            valid: FieldType::all().map(|t| t.as_str()).join(", "),
        })?;

        Ok(Field {
            name: name.to_string(),
            field_type,
            referenced_model,
        })
    }

    pub fn is_reference(&self) -> bool {
        self.field_type.is_reference()
    }

    /// Column name in the table: reference fields get an `_id` suffix.
    pub fn column_name(&self) -> String {
        if self.is_reference() {
            format!("{}_id", self.name)
        } else {
            self.name.clone()
        }
    }
}

/// Parse an ordered list of field definitions, rejecting duplicates.
pub fn parse_fields<S: AsRef<str>>(definitions: &[S]) -> ScaffoldResult<Vec<Field>> {
    let mut seen = HashSet::new();
    let mut fields = Vec::with_capacity(definitions.len());
    for definition in definitions {
        let field = Field::parse(definition.as_ref())?;
        if !seen.insert(field.column_name()) {
            return Err(ScaffoldError::DuplicateField(field.name));
        }
        fields.push(field);
    }
    Ok(fields)
}
