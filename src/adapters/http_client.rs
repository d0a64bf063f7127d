//! HTTP adapter for the form backend REST API.
//!
//! Implements both [`FormPort`] and [`AdminPort`] over `reqwest`. Error bodies
//! follow the backend's `{"detail": ...}` convention.

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, warn};

use crate::domain::{
    AdminPort, ApplicationRecord, DownloadedFile, FieldTypeDefinition, FormError, FormPort,
    FormRecord, FormResult, FormSchema, Page, SessionContext,
};
use crate::engine::submission::{FileTagging, SubmissionPayload, FORM_DATA_PART};

/// REST client for the forms backend
#[derive(Clone, Debug)]
pub struct HttpFormApi {
    client: Client,
    base_url: String,
    session: SessionContext,
    tagging: FileTagging,
}

impl HttpFormApi {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> FormResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session: SessionContext::anonymous(),
            tagging: FileTagging::default(),
        })
    }

    pub fn with_session(mut self, session: SessionContext) -> Self {
        self.session = session;
        self
    }

    pub fn with_tagging(mut self, tagging: FileTagging) -> Self {
        self.tagging = tagging;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.session.authorization() {
            Some(value) => builder.header(AUTHORIZATION, value),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder, what: &str) -> FormResult<Response> {
        let response = self.authorize(builder).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let detail = extract_detail(&body);
        if status.is_server_error() {
            error!(status = status.as_u16(), what, detail = ?detail, "Backend request failed");
        } else {
            warn!(status = status.as_u16(), what, detail = ?detail, "Backend request rejected");
        }

        if status == StatusCode::NOT_FOUND {
            return Err(FormError::NotFound(
                detail.unwrap_or_else(|| format!("{} not found", what)),
            ));
        }
        Err(FormError::Server {
            status: status.as_u16(),
            detail,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, what: &str) -> FormResult<T> {
        debug!(path, "GET");
        let response = self.send(self.client.get(self.url(path)), what).await?;
        Ok(response.json().await?)
    }

    fn multipart(&self, payload: &SubmissionPayload) -> FormResult<Form> {
        let mut form = Form::new().text(FORM_DATA_PART, payload.form_data.clone());
        for tagged in &payload.files {
            let (part_name, file_name) = self.tagging.encode(&tagged.field_id, &tagged.file.name);
            let part = Part::bytes(tagged.file.content.to_vec())
                .file_name(file_name)
                .mime_str(&tagged.file.media_type)?;
            form = form.part(part_name, part);
        }
        Ok(form)
    }
}

/// Pull the `detail` message out of an error body.
///
/// Structured details (request validation errors) are returned as JSON text.
fn extract_detail(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

/// Filename from a `Content-Disposition` header
fn disposition_filename(header: &str) -> Option<String> {
    header.split(';').map(str::trim).find_map(|param| {
        let value = param.strip_prefix("filename=")?;
        let value = value.trim_matches('"');
        (!value.is_empty()).then(|| value.to_string())
    })
}

#[async_trait]
impl FormPort for HttpFormApi {
    async fn get_form(&self, form_id: i64) -> FormResult<FormRecord> {
        self.get_json(&format!("/forms/{}", form_id), "Form").await
    }

    async fn list_field_types(&self) -> FormResult<Vec<FieldTypeDefinition>> {
        self.get_json("/field-types/", "Field types").await
    }

    async fn submit_application(
        &self,
        form_id: i64,
        payload: &SubmissionPayload,
    ) -> FormResult<ApplicationRecord> {
        let form = self.multipart(payload)?;
        debug!(form_id, files = payload.files.len(), "POST application");
        let builder = self
            .client
            .post(self.url(&format!("/applications/submit/{}", form_id)))
            .multipart(form);
        let response = self.send(builder, "Form").await?;
        Ok(response.json().await?)
    }

    async fn download_file(&self, application_id: i64, field_id: &str) -> FormResult<DownloadedFile> {
        let path = format!("/applications/{}/download-file/{}", application_id, field_id);
        let response = self.send(self.client.get(self.url(&path)), "File").await?;

        let headers = response.headers();
        let media_type = headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();
        let file_name = headers
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(disposition_filename);

        let content = response.bytes().await?;
        Ok(DownloadedFile {
            file_name,
            media_type,
            content,
        })
    }
}

#[async_trait]
impl AdminPort for HttpFormApi {
    async fn list_forms(&self, page: Page) -> FormResult<Vec<FormRecord>> {
        self.get_json(
            &format!("/forms/?skip={}&limit={}", page.skip, page.limit),
            "Forms",
        )
        .await
    }

    async fn create_form(&self, schema: &FormSchema) -> FormResult<FormRecord> {
        let builder = self.client.post(self.url("/forms/")).json(schema);
        let response = self.send(builder, "Form").await?;
        Ok(response.json().await?)
    }

    async fn delete_form(&self, form_id: i64) -> FormResult<()> {
        let builder = self.client.delete(self.url(&format!("/forms/{}", form_id)));
        self.send(builder, "Form").await?;
        Ok(())
    }

    async fn get_field_type(&self, field_type_id: i64) -> FormResult<FieldTypeDefinition> {
        self.get_json(&format!("/field-types/{}", field_type_id), "Field type")
            .await
    }

    async fn list_applications(&self, form_id: i64, page: Page) -> FormResult<Vec<ApplicationRecord>> {
        self.get_json(
            &format!(
                "/applications/form/{}?skip={}&limit={}",
                form_id, page.skip, page.limit
            ),
            "Form",
        )
        .await
    }

    async fn get_application(&self, application_id: i64) -> FormResult<ApplicationRecord> {
        self.get_json(&format!("/applications/{}", application_id), "Application")
            .await
    }

    async fn delete_application(&self, application_id: i64) -> FormResult<ApplicationRecord> {
        let builder = self
            .client
            .delete(self.url(&format!("/applications/{}", application_id)));
        let response = self.send(builder, "Application").await?;
        Ok(response.json().await?)
    }
}
