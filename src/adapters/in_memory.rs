//! In-memory backend for tests, benchmarks and offline demos.
//!
//! Mirrors the REST backend's observable behavior: form creation checks the
//! schema against the field type registry, submissions store the uploaded files
//! under their owning field, and missing records surface as `NotFound`.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;

use crate::domain::{
    AdminPort, ApplicationRecord, DownloadedFile, FieldTypeDefinition, FormError, FormPort,
    FormRecord, FormResult, FormSchema, Page,
};
use crate::engine::registry::FieldTypeRegistry;
use crate::engine::submission::{SubmissionPayload, TaggedFile};

#[derive(Default)]
struct Store {
    field_types: Vec<FieldTypeDefinition>,
    forms: BTreeMap<i64, FormRecord>,
    applications: BTreeMap<i64, (ApplicationRecord, Vec<TaggedFile>)>,
    next_form_id: i64,
    next_application_id: i64,
    submissions: usize,
    form_fetches: usize,
    fail_next: Option<FormError>,
    fail_next_load: Option<FormError>,
    submit_delay: Option<Duration>,
    load_delay: Option<Duration>,
}

pub struct InMemoryFormApi {
    store: RwLock<Store>,
}

impl InMemoryFormApi {
    /// Backend seeded with the built-in field types
    pub fn new() -> Self {
        Self::with_field_types(FieldTypeRegistry::builtin().iter().cloned().collect())
    }

    pub fn with_field_types(field_types: Vec<FieldTypeDefinition>) -> Self {
        Self {
            store: RwLock::new(Store {
                field_types,
                next_form_id: 1,
                next_application_id: 1,
                ..Default::default()
            }),
        }
    }

    /// Store a schema without the registry check and return its id
    pub async fn insert_form(&self, schema: FormSchema) -> i64 {
        let mut store = self.store.write().await;
        let id = store.next_form_id;
        store.next_form_id += 1;
        store.forms.insert(
            id,
            FormRecord {
                id,
                schema,
                creator_id: None,
                created_at: Some(Utc::now()),
            },
        );
        id
    }

    /// Number of submission requests received, successful or not
    pub async fn submission_count(&self) -> usize {
        self.store.read().await.submissions
    }

    /// Make the next submission fail with `err`
    pub async fn fail_next_submission(&self, err: FormError) {
        self.store.write().await.fail_next = Some(err);
    }

    /// Hold every submission for `delay` before answering
    pub async fn set_submit_delay(&self, delay: Option<Duration>) {
        self.store.write().await.submit_delay = delay;
    }

    /// Number of `get_form` requests received
    pub async fn form_fetch_count(&self) -> usize {
        self.store.read().await.form_fetches
    }

    /// Make the next `get_form` fail with `err`
    pub async fn fail_next_load(&self, err: FormError) {
        self.store.write().await.fail_next_load = Some(err);
    }

    /// Hold every `get_form` for `delay` before answering
    pub async fn set_load_delay(&self, delay: Option<Duration>) {
        self.store.write().await.load_delay = delay;
    }
}

impl Default for InMemoryFormApi {
    fn default() -> Self {
        Self::new()
    }
}

fn not_found(what: &str) -> FormError {
    FormError::NotFound(format!("{} not found", what))
}

#[async_trait]
impl FormPort for InMemoryFormApi {
    async fn get_form(&self, form_id: i64) -> FormResult<FormRecord> {
        let delay = {
            let mut store = self.store.write().await;
            store.form_fetches += 1;
            store.load_delay
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut store = self.store.write().await;
        if let Some(err) = store.fail_next_load.take() {
            return Err(err);
        }
        store.forms.get(&form_id).cloned().ok_or_else(|| not_found("Form"))
    }

    async fn list_field_types(&self) -> FormResult<Vec<FieldTypeDefinition>> {
        Ok(self.store.read().await.field_types.clone())
    }

    async fn submit_application(
        &self,
        form_id: i64,
        payload: &SubmissionPayload,
    ) -> FormResult<ApplicationRecord> {
        let delay = {
            let mut store = self.store.write().await;
            store.submissions += 1;
            store.submit_delay
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut store = self.store.write().await;
        if let Some(err) = store.fail_next.take() {
            return Err(err);
        }
        if !store.forms.contains_key(&form_id) {
            return Err(not_found("Form"));
        }

        let mut form_data: Map<String, Value> = serde_json::from_str(&payload.form_data)
            .map_err(|_| FormError::Server {
                status: 400,
                detail: Some("Invalid form data JSON".into()),
            })?;
        for tagged in &payload.files {
            form_data.insert(tagged.field_id.clone(), Value::String(tagged.file.name.clone()));
        }

        let id = store.next_application_id;
        store.next_application_id += 1;
        let record = ApplicationRecord {
            id,
            form_id,
            form_data,
            created_at: Some(Utc::now()),
            status: Some("submitted".into()),
        };
        debug!(form_id, application_id = id, "Stored application");
        store
            .applications
            .insert(id, (record.clone(), payload.files.clone()));
        Ok(record)
    }

    async fn download_file(&self, application_id: i64, field_id: &str) -> FormResult<DownloadedFile> {
        let store = self.store.read().await;
        let (_, files) = store
            .applications
            .get(&application_id)
            .ok_or_else(|| not_found("Application"))?;
        let tagged = files
            .iter()
            .find(|t| t.field_id == field_id)
            .ok_or_else(|| not_found("File"))?;
        Ok(DownloadedFile {
            file_name: Some(tagged.file.name.clone()),
            media_type: tagged.file.media_type.clone(),
            content: tagged.file.content.clone(),
        })
    }
}

#[async_trait]
impl AdminPort for InMemoryFormApi {
    async fn list_forms(&self, page: Page) -> FormResult<Vec<FormRecord>> {
        let store = self.store.read().await;
        Ok(store
            .forms
            .values()
            .skip(page.skip as usize)
            .take(page.limit as usize)
            .cloned()
            .collect())
    }

    async fn create_form(&self, schema: &FormSchema) -> FormResult<FormRecord> {
        {
            let store = self.store.read().await;
            let registry = FieldTypeRegistry::new(store.field_types.clone());
            if let Err(errors) = registry.check_schema(schema) {
                return Err(FormError::Server {
                    status: 400,
                    detail: errors.first().map(|e| e.to_string()),
                });
            }
        }
        let id = self.insert_form(schema.clone()).await;
        self.get_form(id).await
    }

    async fn delete_form(&self, form_id: i64) -> FormResult<()> {
        let mut store = self.store.write().await;
        store
            .forms
            .remove(&form_id)
            .map(|_| ())
            .ok_or_else(|| not_found("Form"))
    }

    async fn get_field_type(&self, field_type_id: i64) -> FormResult<FieldTypeDefinition> {
        let store = self.store.read().await;
        store
            .field_types
            .iter()
            .find(|t| t.id == field_type_id)
            .cloned()
            .ok_or_else(|| not_found("Field type"))
    }

    async fn list_applications(&self, form_id: i64, page: Page) -> FormResult<Vec<ApplicationRecord>> {
        let store = self.store.read().await;
        if !store.forms.contains_key(&form_id) {
            return Err(not_found("Form"));
        }
        Ok(store
            .applications
            .values()
            .filter(|(a, _)| a.form_id == form_id)
            .skip(page.skip as usize)
            .take(page.limit as usize)
            .map(|(a, _)| a.clone())
            .collect())
    }

    async fn get_application(&self, application_id: i64) -> FormResult<ApplicationRecord> {
        let store = self.store.read().await;
        store
            .applications
            .get(&application_id)
            .map(|(a, _)| a.clone())
            .ok_or_else(|| not_found("Application"))
    }

    async fn delete_application(&self, application_id: i64) -> FormResult<ApplicationRecord> {
        let mut store = self.store.write().await;
        store
            .applications
            .remove(&application_id)
            .map(|(a, _)| a)
            .ok_or_else(|| not_found("Application"))
    }
}
