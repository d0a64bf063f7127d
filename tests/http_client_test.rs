mod common;

use common::MockBackend;
use intake::adapters::HttpFormApi;
use intake::domain::{
    AdminPort, FieldDescriptor, FormError, FormPort, FormSchema, Page, SessionContext,
};
use intake::engine::kind::{FieldKind, RegistryResolver};
use intake::engine::registry::FieldTypeRegistry;
use intake::engine::session::{FormSession, FormState, SessionOptions};
use intake::engine::submission::{FileTagging, SubmissionPayload, TaggedFile};
use intake::engine::values::{FileHandle, PDF_MEDIA_TYPE};
use std::sync::Arc;
use std::time::Duration;

fn field(id: &str, label: &str, type_id: i64, required: bool) -> FieldDescriptor {
    FieldDescriptor {
        field_id: id.into(),
        field_type_id: type_id,
        label: label.into(),
        required,
        options: None,
    }
}

fn developer_form() -> FormSchema {
    FormSchema {
        title: "Backend Developer".into(),
        description: "Rust platform team".into(),
        fields: vec![
            field("name", "Full name", 1, true),
            field("resume", "Resume", 5, true),
        ],
    }
}

fn client(backend: &MockBackend) -> HttpFormApi {
    HttpFormApi::new(&backend.base_url, Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_get_form_and_not_found() {
    let backend = MockBackend::start().await;
    let form_id = backend.add_form(developer_form()).await;
    let api = client(&backend);

    let record = api.get_form(form_id).await.unwrap();
    assert_eq!(record.schema.title, "Backend Developer");
    assert_eq!(record.schema.fields.len(), 2);

    match api.get_form(1).await {
        Err(FormError::NotFound(detail)) => assert_eq!(detail, "Form not found"),
        other => panic!("expected NotFound, got {:?}", other),
    }
}

#[tokio::test]
async fn test_submission_multipart_shape() {
    let backend = MockBackend::start().await;
    let form_id = backend.add_form(developer_form()).await;
    let api = client(&backend).with_session(SessionContext::with_token("secret-token"));

    let payload = SubmissionPayload {
        form_data: r#"{"name":"Ann"}"#.into(),
        files: vec![TaggedFile {
            field_id: "resume".into(),
            file: FileHandle::new("cv.pdf", PDF_MEDIA_TYPE, &b"%PDF-1.4"[..]),
        }],
    };
    let record = api.submit_application(form_id, &payload).await.unwrap();
    assert_eq!(record.form_id, form_id);
    assert_eq!(record.form_data["name"], "Ann");
    assert_eq!(record.form_data["resume"], "cv.pdf");

    let state = backend.state.lock().await;
    let parts = &state.received[0];
    assert_eq!(parts.len(), 2);
    assert_eq!(parts[0].name, "form_data");
    assert_eq!(parts[0].data, br#"{"name":"Ann"}"#);
    assert_eq!(parts[1].name, "files");
    assert_eq!(parts[1].file_name.as_deref(), Some("resume___cv.pdf"));
    assert_eq!(parts[1].content_type.as_deref(), Some(PDF_MEDIA_TYPE));
    assert_eq!(
        state.authorization[0].as_deref(),
        Some("Bearer secret-token")
    );
}

#[tokio::test]
async fn test_part_name_tagging_keeps_filename() {
    let backend = MockBackend::start().await;
    let form_id = backend.add_form(developer_form()).await;
    let api = client(&backend).with_tagging(FileTagging::PartName);

    let payload = SubmissionPayload {
        form_data: "{}".into(),
        files: vec![TaggedFile {
            field_id: "resume".into(),
            file: FileHandle::new("my___cv.pdf", PDF_MEDIA_TYPE, &b"%PDF"[..]),
        }],
    };
    api.submit_application(form_id, &payload).await.unwrap();

    let state = backend.state.lock().await;
    let part = &state.received[0][1];
    assert_eq!(part.name, "files.resume");
    assert_eq!(part.file_name.as_deref(), Some("my___cv.pdf"));
    assert_eq!(
        FileTagging::PartName.decode(&part.name, part.file_name.as_deref().unwrap()),
        Some(("resume", "my___cv.pdf"))
    );
}

#[tokio::test]
async fn test_anonymous_requests_carry_no_authorization() {
    let backend = MockBackend::start().await;
    let form_id = backend.add_form(developer_form()).await;
    let api = client(&backend);

    let payload = SubmissionPayload {
        form_data: "{}".into(),
        files: Vec::new(),
    };
    api.submit_application(form_id, &payload).await.unwrap();
    assert_eq!(backend.state.lock().await.authorization[0], None);
}

#[tokio::test]
async fn test_server_error_detail_is_surfaced() {
    let backend = MockBackend::start().await;
    let form_id = backend.add_form(developer_form()).await;
    backend.state.lock().await.fail_submissions = true;

    let payload = SubmissionPayload {
        form_data: "{}".into(),
        files: Vec::new(),
    };
    let err = client(&backend)
        .submit_application(form_id, &payload)
        .await
        .unwrap_err();
    match &err {
        FormError::Server { status, detail } => {
            assert_eq!(*status, 500);
            assert_eq!(detail.as_deref(), Some("Database unavailable"));
        }
        other => panic!("expected Server error, got {:?}", other),
    }
    assert_eq!(err.detail(), "Database unavailable");
}

#[tokio::test]
async fn test_create_form_validation_and_admin_listing() {
    let backend = MockBackend::start().await;
    let api = client(&backend);

    let mut schema = developer_form();
    schema.fields.push(field("level", "Level", 4, false));
    match api.create_form(&schema).await {
        Err(FormError::Server { status: 400, detail }) => {
            assert_eq!(
                detail.as_deref(),
                Some("Field 'Level' requires options for field type 'Select'")
            );
        }
        other => panic!("expected 400, got {:?}", other),
    }

    schema.fields[2].options = Some(vec!["Junior".into(), "Senior".into()]);
    let created = api.create_form(&schema).await.unwrap();
    let forms = api.list_forms(Page::default()).await.unwrap();
    assert_eq!(forms.len(), 1);
    assert_eq!(forms[0].id, created.id);

    api.delete_form(created.id).await.unwrap();
    assert!(matches!(
        api.delete_form(created.id).await,
        Err(FormError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_download_uploaded_file() {
    let backend = MockBackend::start().await;
    let form_id = backend.add_form(developer_form()).await;
    let api = client(&backend);

    let payload = SubmissionPayload {
        form_data: r#"{"name":"Ann"}"#.into(),
        files: vec![TaggedFile {
            field_id: "resume".into(),
            file: FileHandle::new("cv.pdf", PDF_MEDIA_TYPE, &b"%PDF-1.7 body"[..]),
        }],
    };
    let app = api.submit_application(form_id, &payload).await.unwrap();

    let apps = api.list_applications(form_id, Page::default()).await.unwrap();
    assert_eq!(apps.len(), 1);

    let file = api.download_file(app.id, "resume").await.unwrap();
    assert_eq!(file.file_name.as_deref(), Some("cv.pdf"));
    assert_eq!(file.media_type, PDF_MEDIA_TYPE);
    assert_eq!(&file.content[..], b"%PDF-1.7 body");

    assert!(matches!(
        api.download_file(app.id, "cover").await,
        Err(FormError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_session_end_to_end_with_registry() {
    let backend = MockBackend::start().await;
    let form_id = backend.add_form(developer_form()).await;
    let api = Arc::new(client(&backend));

    let registry = Arc::new(FieldTypeRegistry::fetch(api.as_ref()).await.unwrap());
    assert_eq!(registry.len(), 5);
    let resolver = Arc::new(RegistryResolver::new(registry));

    let session = FormSession::open(form_id, api.clone(), resolver, SessionOptions::default()).await;
    assert_eq!(session.state().await, FormState::Ready);
    let kinds: Vec<FieldKind> = session.fields().await.iter().map(|f| f.kind).collect();
    assert_eq!(kinds, vec![FieldKind::Text, FieldKind::File]);

    session.set_value("name", "Ann").await.unwrap();
    session
        .accept_file("resume", FileHandle::new("cv.pdf", PDF_MEDIA_TYPE, &b"%PDF"[..]))
        .await
        .unwrap();
    let record = session.submit().await.unwrap();
    assert_eq!(record.form_data["resume"], "cv.pdf");
    assert_eq!(session.state().await, FormState::Submitted);
}

#[tokio::test]
async fn test_unreachable_backend_is_network_error() {
    let api = HttpFormApi::new("http://127.0.0.1:1", Duration::from_secs(2)).unwrap();
    assert!(matches!(api.get_form(1).await, Err(FormError::Network(_))));
}
