//! Field type registry and schema consistency checks.

use std::collections::HashSet;

use crate::domain::{FieldTypeDefinition, FormPort, FormResult, FormSchema, ValidationError};
use tracing::debug;

/// Read-only set of field types, loaded once per session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldTypeRegistry {
    types: Vec<FieldTypeDefinition>,
}

impl FieldTypeRegistry {
    pub fn new(types: Vec<FieldTypeDefinition>) -> Self {
        Self { types }
    }

    /// The types a fresh backend installs: Text, LargeText, Email, Select, PDF.
    pub fn builtin() -> Self {
        let mut types = vec![
            FieldTypeDefinition::new(1, "Text", false),
            FieldTypeDefinition::new(2, "LargeText", false),
            FieldTypeDefinition::new(3, "Email", false),
            FieldTypeDefinition::new(4, "Select", true),
            FieldTypeDefinition::new(5, "PDF", false),
        ];
        let descriptions = [
            "Single line text input field",
            "Multi-line text area for longer content",
            "Email input field with validation",
            "Dropdown select field with predefined options",
            "File upload field for PDF documents",
        ];
        for (ft, description) in types.iter_mut().zip(descriptions) {
            ft.description = Some(description.to_string());
        }
        Self { types }
    }

    /// Fetch the registry from the backend
    pub async fn fetch(port: &dyn FormPort) -> FormResult<Self> {
        let types = port.list_field_types().await?;
        debug!(count = types.len(), "Loaded field type registry");
        Ok(Self::new(types))
    }

    pub fn get(&self, id: i64) -> Option<&FieldTypeDefinition> {
        self.types.iter().find(|t| t.id == id)
    }

    pub fn first(&self) -> Option<&FieldTypeDefinition> {
        self.types.first()
    }

    pub fn has_options(&self, id: i64) -> bool {
        self.get(id).map(|t| t.has_options).unwrap_or(false)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldTypeDefinition> {
        self.types.iter()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Check a schema against the registry, collecting every violation.
    ///
    /// Mirrors the rules the backend applies when a form is created: known
    /// type ids, options present exactly when the type takes them, and
    /// unique field ids.
    pub fn check_schema(&self, schema: &FormSchema) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        let mut seen = HashSet::new();

        for field in &schema.fields {
            if !seen.insert(field.field_id.as_str()) {
                errors.push(ValidationError::DuplicateFieldId(field.field_id.clone()));
            }

            let Some(field_type) = self.get(field.field_type_id) else {
                errors.push(ValidationError::UnknownFieldType {
                    field_id: field.field_id.clone(),
                    field_type_id: field.field_type_id,
                });
                continue;
            };

            let has_options = field.options.as_ref().is_some_and(|o| !o.is_empty());
            if field_type.has_options && !has_options {
                errors.push(ValidationError::OptionsRequired {
                    label: field.label.clone(),
                    type_name: field_type.name.clone(),
                });
            } else if !field_type.has_options && has_options {
                errors.push(ValidationError::OptionsNotAccepted {
                    label: if field.label.is_empty() {
                        "Unknown".to_string()
                    } else {
                        field.label.clone()
                    },
                    type_name: field_type.name.clone(),
                });
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
