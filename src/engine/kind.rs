//! Field-kind resolution
//!
//! Maps a descriptor's `field_type_id` onto the kind of input it renders as.
//! Two strategies share one interface:
//! - `RegistryResolver`: looks the id up in a fetched `FieldTypeRegistry`
//! - `StaticResolver`: a fixed id table for forms that never load the registry
//!
//! Unknown ids always degrade to plain text.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::registry::FieldTypeRegistry;
use crate::domain::{FieldDescriptor, FieldTypeDefinition};

/// Kind of input a field renders as
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    #[default]
    Text,
    Multiline,
    Email,
    Checkbox,
    Select,
    File,
}

impl FieldKind {
    pub fn is_file(&self) -> bool {
        matches!(self, FieldKind::File)
    }

    /// Boolean-valued kinds
    pub fn is_flag(&self) -> bool {
        matches!(self, FieldKind::Checkbox)
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            FieldKind::Text => "Text",
            FieldKind::Multiline => "Multi-line text",
            FieldKind::Email => "Email",
            FieldKind::Checkbox => "Checkbox",
            FieldKind::Select => "Select",
            FieldKind::File => "File",
        }
    }

    /// Kind implied by a registry entry's name
    pub fn from_type_name(name: &str) -> Option<FieldKind> {
        match name.trim().to_lowercase().as_str() {
            "text" => Some(FieldKind::Text),
            "largetext" | "textarea" | "multiline" => Some(FieldKind::Multiline),
            "email" => Some(FieldKind::Email),
            "checkbox" | "boolean" => Some(FieldKind::Checkbox),
            "select" | "dropdown" => Some(FieldKind::Select),
            "pdf" | "file" | "upload" => Some(FieldKind::File),
            _ => None,
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Resolves a field type id to the kind of input it renders as
pub trait KindResolver: Send + Sync {
    fn kind_of(&self, field_type_id: i64) -> FieldKind;

    fn resolve(&self, field: &FieldDescriptor) -> FieldKind {
        self.kind_of(field.field_type_id)
    }
}

/// Fixed `type id -> kind` table used by the single-upload form variant.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticResolver;

impl KindResolver for StaticResolver {
    fn kind_of(&self, field_type_id: i64) -> FieldKind {
        match field_type_id {
            1 => FieldKind::Text,
            2 => FieldKind::Multiline,
            3 => FieldKind::Email,
            4 => FieldKind::Checkbox,
            5 => FieldKind::File,
            _ => FieldKind::Text,
        }
    }
}

/// Lookup through the fetched field type registry.
#[derive(Debug, Clone)]
pub struct RegistryResolver {
    registry: Arc<FieldTypeRegistry>,
}

impl RegistryResolver {
    pub fn new(registry: Arc<FieldTypeRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &FieldTypeRegistry {
        &self.registry
    }

    fn kind_for(definition: &FieldTypeDefinition) -> FieldKind {
        if let Some(kind) = FieldKind::from_type_name(&definition.name) {
            return kind;
        }
        if definition.has_options {
            FieldKind::Select
        } else {
            FieldKind::Text
        }
    }
}

impl KindResolver for RegistryResolver {
    fn kind_of(&self, field_type_id: i64) -> FieldKind {
        self.registry
            .get(field_type_id)
            .map(Self::kind_for)
            .unwrap_or_default()
    }
}
