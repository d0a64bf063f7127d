//! Applicant-facing form session
//!
//! One `FormSession` per rendered form. It owns the fetched schema, the
//! editable values and the selected files, and walks the state machine
//!
//! ```text
//! Loading -> Ready -> Submitting -> Submitted
//!    |         ^          |
//!    v         +----------+  (failure, error recorded)
//! NotFound / Error
//! ```
//!
//! The session is shared behind an `Arc`; `Submitting` doubles as the gate
//! that keeps a second submission off the network. Network calls run on
//! spawned tasks that write their outcome back, so a caller that stops
//! waiting never strands the session in `Loading` or `Submitting`.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::kind::{FieldKind, KindResolver};
use super::notices::{Notice, NoticeQueue};
use super::submission::SubmissionPayload;
use super::validation::{collect_violations, validate_required};
use super::values::{FieldValue, FileHandle, FileMap, FormValues, ResolvedField};
use crate::domain::{
    ApplicationRecord, FormError, FormPort, FormRecord, FormResult, FormSchema, ValidationError,
};

/// Lifecycle of one form instance
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormState {
    Loading,
    Ready,
    Submitting,
    Submitted,
    NotFound,
    Error,
}

impl FormState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, FormState::Submitted | FormState::NotFound | FormState::Error)
    }
}

/// Which files a file field accepts at selection time
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileAcceptPolicy {
    /// No restriction; the backend decides
    #[default]
    Any,
    /// Resume uploads: `application/pdf` only
    PdfOnly,
}

impl FileAcceptPolicy {
    pub fn check(&self, file: &FileHandle) -> Result<(), ValidationError> {
        match self {
            FileAcceptPolicy::Any => Ok(()),
            FileAcceptPolicy::PdfOnly if file.is_pdf() => Ok(()),
            FileAcceptPolicy::PdfOnly => Err(ValidationError::RejectedFile {
                file_name: file.name.clone(),
                media_type: file.media_type.clone(),
            }),
        }
    }
}

#[derive(Clone, Debug)]
pub struct SessionOptions {
    pub accept_policy: FileAcceptPolicy,
    /// Upper bound on a single submission request
    pub submit_timeout: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            accept_policy: FileAcceptPolicy::Any,
            submit_timeout: Duration::from_secs(30),
        }
    }
}

struct Inner {
    state: FormState,
    schema: Option<FormSchema>,
    fields: Vec<ResolvedField>,
    values: FormValues,
    files: FileMap,
    last_error: Option<String>,
    receipt: Option<ApplicationRecord>,
    loading: bool,
    in_flight: Option<CancellationToken>,
    notices: NoticeQueue,
}

impl Inner {
    fn require_ready(&self) -> FormResult<()> {
        match self.state {
            FormState::Ready => Ok(()),
            FormState::Submitting => Err(FormError::SubmissionInProgress),
            other => Err(FormError::InvalidState(format!(
                "form is {:?}, not ready for edits",
                other
            ))),
        }
    }

    fn field(&self, field_id: &str) -> Result<&ResolvedField, ValidationError> {
        self.fields
            .iter()
            .find(|f| f.field_id() == field_id)
            .ok_or_else(|| ValidationError::UnknownField(field_id.to_string()))
    }

    fn reseed(&mut self) {
        self.values = FormValues::seed(&self.fields);
        self.files = FileMap::seed(&self.fields);
    }

    fn finish_load(
        &mut self,
        form_id: i64,
        resolver: &dyn KindResolver,
        result: FormResult<FormRecord>,
    ) -> FormResult<()> {
        self.loading = false;
        match result {
            Ok(record) => {
                self.fields = ResolvedField::resolve_all(&record.schema.fields, resolver);
                self.reseed();
                info!(form_id, fields = self.fields.len(), "Form ready");
                self.schema = Some(record.schema);
                self.state = FormState::Ready;
                Ok(())
            }
            Err(err) => {
                self.state = match err {
                    FormError::NotFound(_) => FormState::NotFound,
                    _ => FormState::Error,
                };
                self.last_error = Some(err.detail());
                self.notices.push_error(&err);
                Err(err)
            }
        }
    }

    fn finish_submit(
        &mut self,
        form_id: i64,
        outcome: FormResult<ApplicationRecord>,
    ) -> FormResult<ApplicationRecord> {
        self.in_flight = None;
        match outcome {
            Ok(record) => {
                info!(form_id, application_id = record.id, "Application submitted");
                self.reseed();
                self.receipt = Some(record.clone());
                self.state = FormState::Submitted;
                self.notices.push(Notice::info(
                    "Application Submitted",
                    "Your application has been submitted successfully.",
                ));
                Ok(record)
            }
            Err(err) => {
                warn!(form_id, error = %err, "Submission failed");
                self.state = FormState::Ready;
                self.last_error = Some(err.detail());
                self.notices.push_error(&err);
                Err(err)
            }
        }
    }
}

pub struct FormSession {
    form_id: i64,
    port: Arc<dyn FormPort>,
    resolver: Arc<dyn KindResolver>,
    options: SessionOptions,
    inner: Arc<RwLock<Inner>>,
}

impl FormSession {
    pub fn new(
        form_id: i64,
        port: Arc<dyn FormPort>,
        resolver: Arc<dyn KindResolver>,
        options: SessionOptions,
    ) -> Self {
        Self {
            form_id,
            port,
            resolver,
            options,
            inner: Arc::new(RwLock::new(Inner {
                state: FormState::Loading,
                schema: None,
                fields: Vec::new(),
                values: FormValues::default(),
                files: FileMap::default(),
                last_error: None,
                receipt: None,
                loading: false,
                in_flight: None,
                notices: NoticeQueue::new(),
            })),
        }
    }

    /// Create a session and fetch its schema in one step
    pub async fn open(
        form_id: i64,
        port: Arc<dyn FormPort>,
        resolver: Arc<dyn KindResolver>,
        options: SessionOptions,
    ) -> Arc<Self> {
        let session = Arc::new(Self::new(form_id, port, resolver, options));
        // Failures are recorded in the session state and notices.
        let _ = session.load().await;
        session
    }

    pub fn form_id(&self) -> i64 {
        self.form_id
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Fetch the schema and seed initial values. Only valid while `Loading`,
    /// and only one fetch may be outstanding.
    ///
    /// The fetch runs on its own task, so dropping this future does not leave
    /// the session half-loaded.
    pub async fn load(&self) -> FormResult<()> {
        {
            let mut inner = self.inner.write().await;
            if inner.state != FormState::Loading {
                return Err(FormError::InvalidState(format!(
                    "form is {:?}, already loaded",
                    inner.state
                )));
            }
            if inner.loading {
                return Err(FormError::InvalidState("form is already loading".into()));
            }
            inner.loading = true;
        }

        debug!(form_id = self.form_id, "Loading form schema");
        let form_id = self.form_id;
        let port = self.port.clone();
        let resolver = self.resolver.clone();
        let shared = self.inner.clone();
        let task = tokio::spawn(async move {
            let result = port.get_form(form_id).await;
            let mut inner = shared.write().await;
            inner.finish_load(form_id, resolver.as_ref(), result)
        });

        match task.await {
            Ok(result) => result,
            Err(join) => {
                let err = FormError::InvalidState(format!("form load aborted: {}", join));
                let mut inner = self.inner.write().await;
                inner.finish_load(self.form_id, self.resolver.as_ref(), Err(err))
            }
        }
    }

    pub async fn state(&self) -> FormState {
        self.inner.read().await.state
    }

    pub async fn schema(&self) -> Option<FormSchema> {
        self.inner.read().await.schema.clone()
    }

    pub async fn fields(&self) -> Vec<ResolvedField> {
        self.inner.read().await.fields.clone()
    }

    pub async fn values(&self) -> FormValues {
        self.inner.read().await.values.clone()
    }

    pub async fn value(&self, field_id: &str) -> Option<FieldValue> {
        self.inner.read().await.values.get(field_id).cloned()
    }

    pub async fn file(&self, field_id: &str) -> Option<FileHandle> {
        self.inner.read().await.files.get(field_id).cloned()
    }

    /// Error message left by the last failed load or submission
    pub async fn last_error(&self) -> Option<String> {
        self.inner.read().await.last_error.clone()
    }

    /// Acknowledgment of a successful submission
    pub async fn receipt(&self) -> Option<ApplicationRecord> {
        self.inner.read().await.receipt.clone()
    }

    pub async fn drain_notices(&self) -> Vec<Notice> {
        self.inner.write().await.notices.drain()
    }

    /// Replace the value of one non-file field
    pub async fn set_value(&self, field_id: &str, value: impl Into<FieldValue>) -> FormResult<()> {
        let value = value.into();
        let mut inner = self.inner.write().await;
        inner.require_ready()?;

        let kind = inner.field(field_id)?.kind;
        match (kind, &value) {
            (FieldKind::File, _) => {
                return Err(FormError::InvalidState(format!(
                    "field '{}' takes a file, not a value",
                    field_id
                )))
            }
            (FieldKind::Checkbox, FieldValue::Text(_)) => {
                return Err(FormError::InvalidState(format!(
                    "field '{}' expects a boolean",
                    field_id
                )))
            }
            (k, FieldValue::Flag(_)) if !k.is_flag() => {
                return Err(FormError::InvalidState(format!(
                    "field '{}' expects text",
                    field_id
                )))
            }
            _ => {}
        }

        inner.values.replace(field_id, value);
        Ok(())
    }

    /// Replace the selected file of one file field; `None` clears it.
    pub async fn set_file(&self, field_id: &str, file: Option<FileHandle>) -> FormResult<()> {
        let mut inner = self.inner.write().await;
        inner.require_ready()?;
        if !inner.field(field_id)?.kind.is_file() {
            return Err(FormError::InvalidState(format!(
                "field '{}' does not take files",
                field_id
            )));
        }
        if let Some(f) = &file {
            debug!(field_id, file = %f.name, size = f.len(), "File selected");
        }
        inner.files.set(field_id, file);
        Ok(())
    }

    /// Select a file subject to the session's accept policy.
    ///
    /// A rejected file raises a warning notice and leaves the selection as it was.
    pub async fn accept_file(&self, field_id: &str, file: FileHandle) -> FormResult<()> {
        if let Err(err) = self.options.accept_policy.check(&file) {
            let mut inner = self.inner.write().await;
            inner
                .notices
                .push(Notice::warning("Invalid file type", err.to_string()));
            return Err(err.into());
        }
        self.set_file(field_id, Some(file)).await
    }

    /// Restore every value and file to its initial state
    pub async fn reset(&self) -> FormResult<()> {
        let mut inner = self.inner.write().await;
        inner.require_ready()?;
        inner.reseed();
        Ok(())
    }

    /// First missing required field, if any
    pub async fn validate(&self) -> Result<(), ValidationError> {
        let inner = self.inner.read().await;
        validate_required(&inner.fields, &inner.values, &inner.files)
    }

    /// Every missing required field
    pub async fn validate_all(&self) -> Vec<ValidationError> {
        let inner = self.inner.read().await;
        collect_violations(&inner.fields, &inner.values, &inner.files)
    }

    pub async fn build_submission(&self) -> FormResult<SubmissionPayload> {
        let inner = self.inner.read().await;
        SubmissionPayload::build(&inner.values, &inner.files)
    }

    /// Cancel the submission in flight, if any
    pub async fn cancel_submission(&self) -> bool {
        match &self.inner.read().await.in_flight {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Validate and submit. Exactly one network call per accepted attempt;
    /// attempts made while another is in flight are rejected.
    pub async fn submit(&self) -> FormResult<ApplicationRecord> {
        let (payload, token) = {
            let mut inner = self.inner.write().await;
            match inner.state {
                FormState::Ready => {}
                FormState::Submitting => {
                    debug!(form_id = self.form_id, "Ignoring submit while one is in flight");
                    return Err(FormError::SubmissionInProgress);
                }
                other => {
                    return Err(FormError::InvalidState(format!(
                        "cannot submit a form that is {:?}",
                        other
                    )))
                }
            }

            if let Err(err) = validate_required(&inner.fields, &inner.values, &inner.files) {
                let err = FormError::from(err);
                inner.last_error = Some(err.detail());
                inner.notices.push_error(&err);
                return Err(err);
            }

            let payload = match SubmissionPayload::build(&inner.values, &inner.files) {
                Ok(payload) => payload,
                Err(err) => {
                    inner.notices.push_error(&err);
                    return Err(err);
                }
            };

            let token = CancellationToken::new();
            inner.in_flight = Some(token.clone());
            inner.last_error = None;
            inner.state = FormState::Submitting;
            (payload, token)
        };

        debug!(
            form_id = self.form_id,
            files = payload.files.len(),
            "Submitting application"
        );
        let form_id = self.form_id;
        let timeout = self.options.submit_timeout;
        let port = self.port.clone();
        let shared = self.inner.clone();
        // Owns the request and the exit from `Submitting`, even if the caller
        // stops waiting.
        let task = tokio::spawn(async move {
            let outcome = tokio::select! {
                _ = token.cancelled() => Err(FormError::Cancelled),
                res = tokio::time::timeout(timeout, port.submit_application(form_id, &payload)) => {
                    match res {
                        Ok(result) => result,
                        Err(_) => Err(FormError::Timeout(timeout)),
                    }
                }
            };
            let mut inner = shared.write().await;
            inner.finish_submit(form_id, outcome)
        });

        match task.await {
            Ok(result) => result,
            Err(join) => {
                let err = FormError::InvalidState(format!("submission aborted: {}", join));
                let mut inner = self.inner.write().await;
                inner.finish_submit(self.form_id, Err(err))
            }
        }
    }
}
