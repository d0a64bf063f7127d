//! Schema editor used by administrators to assemble a form.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};

use super::registry::FieldTypeRegistry;
use crate::domain::{FieldDescriptor, FormError, FormResult, FormSchema, ValidationError};

/// Type id used for new fields when the registry is empty
const FALLBACK_FIELD_TYPE_ID: i64 = 1;

/// Move one element from `from` to `to`, keeping everyone else's relative order.
///
/// This is the primitive a drag-and-drop list hands back to the editor.
pub fn move_element<T>(items: &mut Vec<T>, from: usize, to: usize) -> FormResult<()> {
    let len = items.len();
    if from >= len {
        return Err(FormError::IndexOutOfRange { index: from, len });
    }
    if to >= len {
        return Err(FormError::IndexOutOfRange { index: to, len });
    }
    let item = items.remove(from);
    items.insert(to, item);
    Ok(())
}

/// Split a comma-delimited option list. Tokens are trimmed and empty tokens
/// dropped, so `"a, ,b,,"` becomes `["a", "b"]`.
pub fn parse_options(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Source of fresh field ids
pub trait FieldIdSource: Send + Sync {
    fn next_id(&mut self) -> String;
}

/// `field_<millis>` ids; strictly increasing even when called within the same millisecond.
#[derive(Debug, Default)]
pub struct TimestampIds {
    last: i64,
}

impl FieldIdSource for TimestampIds {
    fn next_id(&mut self) -> String {
        let now = Utc::now().timestamp_millis();
        self.last = now.max(self.last + 1);
        format!("field_{}", self.last)
    }
}

/// Partial update merged into a field by `SchemaEditor::update_field`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldPatch {
    pub field_type_id: Option<i64>,
    pub label: Option<String>,
    pub required: Option<bool>,
    pub options: Option<Vec<String>>,
}

impl FieldPatch {
    pub fn label(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            ..Default::default()
        }
    }

    pub fn field_type(field_type_id: i64) -> Self {
        Self {
            field_type_id: Some(field_type_id),
            ..Default::default()
        }
    }

    pub fn required(required: bool) -> Self {
        Self {
            required: Some(required),
            ..Default::default()
        }
    }

    pub fn options(options: Vec<String>) -> Self {
        Self {
            options: Some(options),
            ..Default::default()
        }
    }
}

/// In-memory form schema under construction
pub struct SchemaEditor {
    title: String,
    description: String,
    fields: Vec<FieldDescriptor>,
    registry: Arc<FieldTypeRegistry>,
    ids: Box<dyn FieldIdSource>,
}

impl SchemaEditor {
    pub fn new(registry: Arc<FieldTypeRegistry>) -> Self {
        Self::with_id_source(registry, Box::new(TimestampIds::default()))
    }

    pub fn with_id_source(registry: Arc<FieldTypeRegistry>, ids: Box<dyn FieldIdSource>) -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            fields: Vec::new(),
            registry,
            ids,
        }
    }

    /// Start from an existing schema, e.g. to edit a saved form
    pub fn from_schema(schema: FormSchema, registry: Arc<FieldTypeRegistry>) -> Self {
        let mut editor = Self::new(registry);
        editor.title = schema.title;
        editor.description = schema.description;
        editor.fields = schema.fields;
        editor
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn registry(&self) -> &FieldTypeRegistry {
        &self.registry
    }

    fn check_index(&self, index: usize) -> FormResult<()> {
        if index < self.fields.len() {
            Ok(())
        } else {
            Err(FormError::IndexOutOfRange {
                index,
                len: self.fields.len(),
            })
        }
    }

    /// Append a blank field and return its index
    pub fn add_field(&mut self) -> usize {
        let mut field_id = self.ids.next_id();
        while self.fields.iter().any(|f| f.field_id == field_id) {
            field_id = self.ids.next_id();
        }

        let field_type_id = self
            .registry
            .first()
            .map(|t| t.id)
            .unwrap_or(FALLBACK_FIELD_TYPE_ID);

        debug!(field_id = %field_id, field_type_id, "Adding field");
        self.fields.push(FieldDescriptor {
            field_id,
            field_type_id,
            label: String::new(),
            required: false,
            options: None,
        });
        self.fields.len() - 1
    }

    /// Merge `patch` into the field at `index`
    pub fn update_field(&mut self, index: usize, patch: FieldPatch) -> FormResult<()> {
        self.check_index(index)?;
        let takes_options = patch
            .field_type_id
            .map(|id| self.registry.has_options(id));
        let field = &mut self.fields[index];

        if let Some(field_type_id) = patch.field_type_id {
            field.field_type_id = field_type_id;
            if takes_options == Some(false) {
                field.options = None;
            }
        }
        if let Some(label) = patch.label {
            field.label = label;
        }
        if let Some(required) = patch.required {
            field.required = required;
        }
        if let Some(options) = patch.options {
            field.options = Some(options);
        }
        Ok(())
    }

    /// Remove the field at `index`; later fields shift down by one
    pub fn remove_field(&mut self, index: usize) -> FormResult<FieldDescriptor> {
        self.check_index(index)?;
        let removed = self.fields.remove(index);
        debug!(field_id = %removed.field_id, index, "Removed field");
        Ok(removed)
    }

    pub fn reorder(&mut self, source: usize, dest: usize) -> FormResult<()> {
        move_element(&mut self.fields, source, dest)
    }

    /// Comma-joined options of the field at `index`
    pub fn options_text(&self, index: usize) -> FormResult<String> {
        self.check_index(index)?;
        Ok(self.fields[index]
            .options
            .as_ref()
            .map(|o| o.join(", "))
            .unwrap_or_default())
    }

    /// Replace the options of the field at `index` from comma-delimited text
    pub fn set_options_text(&mut self, index: usize, text: &str) -> FormResult<()> {
        self.check_index(index)?;
        let field = &self.fields[index];
        if !self.registry.has_options(field.field_type_id) {
            return Err(FormError::InvalidState(format!(
                "field '{}' has a type without options",
                field.field_id
            )));
        }
        self.update_field(index, FieldPatch::options(parse_options(text)))
    }

    /// Finalize the schema. Rules are checked in order and the first failure wins.
    pub fn validate_and_build(&self) -> Result<FormSchema, ValidationError> {
        if self.title.trim().is_empty() {
            warn!("Schema rejected: missing title");
            return Err(ValidationError::MissingTitle);
        }
        if self.fields.is_empty() {
            warn!("Schema rejected: no fields");
            return Err(ValidationError::NoFields);
        }
        if let Some(index) = self.fields.iter().position(|f| f.label.trim().is_empty()) {
            warn!(index, "Schema rejected: field without label");
            return Err(ValidationError::MissingLabel { index });
        }

        Ok(FormSchema {
            title: self.title.clone(),
            description: self.description.clone(),
            fields: self.fields.clone(),
        })
    }
}
