//! A resource to scaffold and the token values derived from it.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use ft_templates::case::{to_snake_case, to_title_case};
use ft_templates::ParameterSet;
use regex::Regex;

use crate::error::{ScaffoldError, ScaffoldResult};
use crate::field::{parse_fields, Field, FieldType};
use crate::inflect::pluralize;

/// A named resource with its ordered fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    name: String,
    snake: String,
    plural: String,
    fields: Vec<Field>,
}

impl Resource {
    /// Validate the resource name and parse its `name:type` field definitions.
    pub fn new<S: AsRef<str>>(name: &str, fields: &[S]) -> ScaffoldResult<Self> {
        let pattern = Regex::new(r"^[A-Z][A-Za-z0-9]*$").expect("resource pattern is a valid regex");
        if !pattern.is_match(name) {
            return Err(ScaffoldError::InvalidResourceName(name.to_string()));
        }

        let fields = parse_fields(fields)?;
        let snake = to_snake_case(name);
        let plural = pluralize(&snake);
        Ok(Self {
            name: name.to_string(),
            snake,
            plural,
            fields,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn snake(&self) -> &str {
        &self.snake
    }

    /// Table and blueprint name.
    pub fn plural(&self) -> &str {
        &self.plural
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Referenced models, deduplicated, in first-use order.
    fn referenced_models(&self) -> Vec<&str> {
        let mut seen = BTreeSet::new();
        self.fields
            .iter()
            .filter_map(|f| f.referenced_model.as_deref())
            .filter(|m| seen.insert(*m))
            .collect()
    }

    /// Token values for rendering fragments, stamped with `now`.
    pub fn parameters(&self, now: DateTime<Utc>) -> ParameterSet {
        ParameterSet::from_pairs([
            ("resource_name", self.name.clone()),
            ("resource_snake", self.snake.clone()),
            ("resource_plural", self.plural.clone()),
            ("resource_title", to_title_case(&self.snake)),
            ("resource_title_plural", to_title_case(&self.plural)),
            ("field_summary", self.field_summary()),
            ("model_columns", self.model_columns()),
            ("form_imports", self.form_imports()),
            ("form_fields", self.form_fields()),
            ("controller_model_imports", self.controller_model_imports()),
            ("controller_reference_choices", self.controller_reference_choices()),
            ("controller_assignments", self.controller_assignments()),
            ("view_headers", self.view_headers()),
            ("view_cells", self.view_cells()),
            ("view_form_rows", self.view_form_rows()),
            ("migration_columns", self.migration_columns()),
            ("migration_timestamp", now.format("%Y%m%d%H%M%S").to_string()),
            ("migration_created", now.format("%Y-%m-%d %H:%M:%S").to_string()),
        ])
    }

    fn field_summary(&self) -> String {
        self.fields
            .iter()
            .map(|f| f.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn model_columns(&self) -> String {
        let mut lines = Vec::new();
        for field in &self.fields {
            match &field.referenced_model {
                Some(model) => {
                    lines.push(format!(
                        "    {} = db.Column({}, db.ForeignKey(\"{}.id\"))",
                        field.column_name(),
                        field.field_type.column_type(),
                        table_name(model)
                    ));
                    lines.push(format!(
                        "    {} = db.relationship(\"{}\", backref=\"{}\")",
                        field.name, model, self.plural
                    ));
                }
                None => lines.push(format!(
                    "    {} = db.Column({})",
                    field.name,
                    field.field_type.column_type()
                )),
            }
        }
        lines.join("\n")
    }

    fn form_imports(&self) -> String {
        let mut classes: BTreeSet<&str> = self
            .fields
            .iter()
            .map(|f| f.field_type.form_field())
            .collect();
        classes.insert("SubmitField");
        classes.into_iter().collect::<Vec<_>>().join(", ")
    }

    fn form_fields(&self) -> String {
        self.fields
            .iter()
            .map(|field| {
                let label = match &field.referenced_model {
                    Some(model) => model.clone(),
                    None => to_title_case(&field.name),
                };
                let class = field.field_type.form_field();
                let args = match field.field_type {
                    FieldType::Boolean => String::new(),
                    FieldType::References | FieldType::BelongsTo => {
                        ", coerce=int, validators=[DataRequired()]".to_string()
                    }
                    FieldType::String | FieldType::Text => {
                        ", validators=[DataRequired()]".to_string()
                    }
                    _ => ", validators=[Optional()]".to_string(),
                };
                format!(
                    "    {} = {}(\"{}\"{})",
                    field.column_name(),
                    class,
                    label,
                    args
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn controller_model_imports(&self) -> String {
        self.referenced_models()
            .into_iter()
            .filter(|model| *model != self.name)
            .map(|model| format!("from app.models.{} import {}\n", to_snake_case(model), model))
            .collect()
    }

    fn controller_reference_choices(&self) -> String {
        self.fields
            .iter()
            .filter_map(|field| {
                field.referenced_model.as_ref().map(|model| {
                    format!(
                        "    form.{}.choices = [(item.id, str(item)) for item in {}.query.order_by({}.id).all()]",
                        field.column_name(),
                        model,
                        model
                    )
                })
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn controller_assignments(&self) -> String {
        if self.fields.is_empty() {
            return "    pass".to_string();
        }
        self.fields
            .iter()
            .map(|field| {
                let column = field.column_name();
                format!("    {}.{} = form.{}.data", self.snake, column, column)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn view_headers(&self) -> String {
        self.fields
            .iter()
            .map(|field| {
                let label = match &field.referenced_model {
                    Some(model) => model.clone(),
                    None => to_title_case(&field.name),
                };
                format!("      <th>{}</th>", label)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn view_cells(&self) -> String {
        self.fields
            .iter()
            .map(|field| format!("      <td>{{{{ {}.{} }}}}</td>", self.snake, field.column_name()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn view_form_rows(&self) -> String {
        self.fields
            .iter()
            .map(|field| {
                let column = field.column_name();
                format!(
                    "  <p>{{{{ form.{c}.label }}}} {{{{ form.{c}() }}}}</p>",
                    c = column
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn migration_columns(&self) -> String {
        self.fields
            .iter()
            .map(|field| match &field.referenced_model {
                Some(model) => format!(
                    "        sa.Column(\"{}\", {}, sa.ForeignKey(\"{}.id\")),",
                    field.column_name(),
                    field.field_type.migration_type(),
                    table_name(model)
                ),
                None => format!(
                    "        sa.Column(\"{}\", {}),",
                    field.name,
                    field.field_type.migration_type()
                ),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn table_name(model: &str) -> String {
    pluralize(&to_snake_case(model))
}
