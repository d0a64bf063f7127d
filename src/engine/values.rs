//! Per-field values held by a form session.

use std::path::Path;

use bytes::Bytes;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use super::kind::{FieldKind, KindResolver};
use crate::domain::{FieldDescriptor, FormResult};

pub const PDF_MEDIA_TYPE: &str = "application/pdf";

/// A file selected by the applicant
#[derive(Clone, PartialEq, Eq)]
pub struct FileHandle {
    pub name: String,
    pub media_type: String,
    pub content: Bytes,
}

impl FileHandle {
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            content: content.into(),
        }
    }

    /// Read a local file, guessing its media type from the extension
    pub async fn from_path(path: impl AsRef<Path>) -> FormResult<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        let media_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        Ok(Self::new(name, media_type, content))
    }

    pub fn is_pdf(&self) -> bool {
        self.media_type.eq_ignore_ascii_case(PDF_MEDIA_TYPE)
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

impl std::fmt::Debug for FileHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileHandle")
            .field("name", &self.name)
            .field("media_type", &self.media_type)
            .field("len", &self.content.len())
            .finish()
    }
}

/// Value of a non-file field
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Flag(bool),
}

impl FieldValue {
    /// Initial value for a field of `kind`; file kinds have none
    pub fn initial(kind: FieldKind) -> Option<Self> {
        match kind {
            FieldKind::File => None,
            FieldKind::Checkbox => Some(FieldValue::Flag(false)),
            _ => Some(FieldValue::Text(String::new())),
        }
    }

    /// Empty means a literal empty string; flags are never empty.
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.is_empty(),
            FieldValue::Flag(_) => false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            FieldValue::Flag(_) => None,
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            FieldValue::Flag(b) => Some(*b),
            FieldValue::Text(_) => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Flag(b)
    }
}

/// A declared field paired with its resolved kind
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedField {
    pub descriptor: FieldDescriptor,
    pub kind: FieldKind,
}

impl ResolvedField {
    pub fn resolve_all(fields: &[FieldDescriptor], resolver: &dyn KindResolver) -> Vec<Self> {
        fields
            .iter()
            .map(|f| ResolvedField {
                kind: resolver.resolve(f),
                descriptor: f.clone(),
            })
            .collect()
    }

    pub fn field_id(&self) -> &str {
        &self.descriptor.field_id
    }

    pub fn label(&self) -> &str {
        &self.descriptor.label
    }
}

/// Non-file values in schema order. Serializes as a JSON object keyed by field id.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FormValues {
    entries: Vec<(String, FieldValue)>,
}

impl FormValues {
    /// Seed one entry per non-file field
    pub fn seed(fields: &[ResolvedField]) -> Self {
        let entries = fields
            .iter()
            .filter_map(|f| FieldValue::initial(f.kind).map(|v| (f.field_id().to_string(), v)))
            .collect();
        Self { entries }
    }

    pub fn get(&self, field_id: &str) -> Option<&FieldValue> {
        self.entries
            .iter()
            .find(|(id, _)| id == field_id)
            .map(|(_, v)| v)
    }

    pub fn contains(&self, field_id: &str) -> bool {
        self.get(field_id).is_some()
    }

    /// Replace the value for `field_id`, returning the previous value.
    /// Returns `None` without inserting when the field is not tracked.
    pub fn replace(&mut self, field_id: &str, value: FieldValue) -> Option<FieldValue> {
        self.entries
            .iter_mut()
            .find(|(id, _)| id == field_id)
            .map(|(_, v)| std::mem::replace(v, value))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.entries.iter().map(|(id, v)| (id.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl Serialize for FormValues {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (id, value) in &self.entries {
            map.serialize_entry(id, value)?;
        }
        map.end()
    }
}

/// Selected files keyed by field id, in schema order
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FileMap {
    entries: Vec<(String, Option<FileHandle>)>,
}

impl FileMap {
    /// One empty slot per file field
    pub fn seed(fields: &[ResolvedField]) -> Self {
        let entries = fields
            .iter()
            .filter(|f| f.kind.is_file())
            .map(|f| (f.field_id().to_string(), None))
            .collect();
        Self { entries }
    }

    pub fn get(&self, field_id: &str) -> Option<&FileHandle> {
        self.entries
            .iter()
            .find(|(id, _)| id == field_id)
            .and_then(|(_, f)| f.as_ref())
    }

    pub fn has_slot(&self, field_id: &str) -> bool {
        self.entries.iter().any(|(id, _)| id == field_id)
    }

    /// Replace the selection for `field_id`; `None` clears it.
    /// Returns false when the field has no file slot.
    pub fn set(&mut self, field_id: &str, file: Option<FileHandle>) -> bool {
        match self.entries.iter_mut().find(|(id, _)| id == field_id) {
            Some((_, slot)) => {
                *slot = file;
                true
            }
            None => false,
        }
    }

    /// Selected files only, in schema order
    pub fn selected(&self) -> impl Iterator<Item = (&str, &FileHandle)> {
        self.entries
            .iter()
            .filter_map(|(id, f)| f.as_ref().map(|f| (id.as_str(), f)))
    }

    pub fn selected_count(&self) -> usize {
        self.selected().count()
    }
}
