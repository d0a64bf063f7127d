use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod error;
pub mod session;

pub use error::{FormError, FormResult, ValidationError};
pub use session::SessionContext;

use crate::engine::submission::SubmissionPayload;

/// Registry entry describing what kind of input a field renders as.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct FieldTypeDefinition {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub has_options: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl FieldTypeDefinition {
    pub fn new(id: i64, name: impl Into<String>, has_options: bool) -> Self {
        Self {
            id,
            name: name.into(),
            has_options,
            description: None,
            created_at: None,
        }
    }
}

/// One question within a form schema.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub field_id: String,
    pub field_type_id: i64,
    pub label: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

/// Ordered set of field descriptors plus form-level metadata.
///
/// On the wire the field list is called `field_config`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct FormSchema {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "field_config", alias = "fields", default)]
    pub fields: Vec<FieldDescriptor>,
}

impl FormSchema {
    pub fn field(&self, field_id: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.field_id == field_id)
    }
}

/// A schema as persisted by the backend.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct FormRecord {
    pub id: i64,
    #[serde(flatten)]
    pub schema: FormSchema,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// A completed application as acknowledged by the backend.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ApplicationRecord {
    pub id: i64,
    pub form_id: i64,
    #[serde(default)]
    pub form_data: serde_json::Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Binary content fetched from the admin download endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadedFile {
    pub file_name: Option<String>,
    pub media_type: String,
    pub content: Bytes,
}

/// Offset pagination used by the list endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub skip: u32,
    pub limit: u32,
}

impl Default for Page {
    fn default() -> Self {
        Self { skip: 0, limit: 100 }
    }
}

/// Backend operations the applicant-facing engine depends on.
#[async_trait]
pub trait FormPort: Send + Sync {
    async fn get_form(&self, form_id: i64) -> FormResult<FormRecord>;
    async fn list_field_types(&self) -> FormResult<Vec<FieldTypeDefinition>>;
    async fn submit_application(
        &self,
        form_id: i64,
        payload: &SubmissionPayload,
    ) -> FormResult<ApplicationRecord>;
    async fn download_file(&self, application_id: i64, field_id: &str) -> FormResult<DownloadedFile>;
}

/// Administrative operations on forms and the applications they collect.
#[async_trait]
pub trait AdminPort: Send + Sync {
    async fn list_forms(&self, page: Page) -> FormResult<Vec<FormRecord>>;
    async fn create_form(&self, schema: &FormSchema) -> FormResult<FormRecord>;
    async fn delete_form(&self, form_id: i64) -> FormResult<()>;
    async fn get_field_type(&self, field_type_id: i64) -> FormResult<FieldTypeDefinition>;
    async fn list_applications(&self, form_id: i64, page: Page) -> FormResult<Vec<ApplicationRecord>>;
    async fn get_application(&self, application_id: i64) -> FormResult<ApplicationRecord>;
    async fn delete_application(&self, application_id: i64) -> FormResult<ApplicationRecord>;
}
