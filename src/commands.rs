//! Subcommand implementations for the `intake` binary.

use anyhow::{anyhow, bail, Context};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::adapters::HttpFormApi;
use crate::cli::{Cli, Command};
use crate::config::{KindResolution, Settings};
use crate::domain::{AdminPort, FormPort, FormSchema, Page, SessionContext, ValidationError};
use crate::engine::builder::SchemaEditor;
use crate::engine::kind::{KindResolver, RegistryResolver, StaticResolver};
use crate::engine::registry::FieldTypeRegistry;
use crate::engine::session::{FormSession, FormState};
use crate::engine::values::FileHandle;

/// Read a schema draft from JSON, or YAML for `.yaml`/`.yml` files.
pub async fn load_schema_draft(path: &Path) -> anyhow::Result<FormSchema> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );
    let schema = if is_yaml {
        serde_yaml::from_str(&text)?
    } else {
        serde_json::from_str(&text)?
    };
    Ok(schema)
}

/// Run the editor rules then the registry consistency check.
///
/// All problems are returned, editor rule first.
pub fn check_schema(
    schema: FormSchema,
    registry: Arc<FieldTypeRegistry>,
) -> Result<FormSchema, Vec<ValidationError>> {
    let editor = SchemaEditor::from_schema(schema, registry.clone());
    let built = editor.validate_and_build().map_err(|e| vec![e])?;
    registry.check_schema(&built)?;
    Ok(built)
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let settings = Settings::new_with_cli(&cli)?;
    let session = SessionContext::from_token_or_env(cli.token.clone());
    let api = Arc::new(
        HttpFormApi::new(settings.api.base_url.clone(), settings.timeout())?
            .with_session(session)
            .with_tagging(settings.file_tagging()),
    );
    debug!(base_url = api.base_url(), "Using backend");

    match cli.command {
        Command::FieldTypes => {
            for t in api.list_field_types().await? {
                println!(
                    "{:>4}  {:<12} options={:<5} {}",
                    t.id,
                    t.name,
                    t.has_options,
                    t.description.unwrap_or_default()
                );
            }
        }
        Command::Show { form_id } => {
            let resolver = resolver(&settings, api.as_ref()).await;
            let session =
                FormSession::open(form_id, api.clone(), resolver, settings.session_options()).await;
            let schema = ready_schema(&session).await?;
            println!("{}", schema.title);
            if !schema.description.is_empty() {
                println!("{}", schema.description);
            }
            for field in session.fields().await {
                let marker = if field.descriptor.required { "*" } else { " " };
                print!("  {}{} [{}] ({})", field.label(), marker, field.kind, field.field_id());
                if let Some(options) = &field.descriptor.options {
                    print!(" {}", options.join(" | "));
                }
                println!();
            }
        }
        Command::Submit {
            form_id,
            values,
            checks,
            files,
        } => {
            let resolver = resolver(&settings, api.as_ref()).await;
            let session =
                FormSession::open(form_id, api.clone(), resolver, settings.session_options()).await;
            ready_schema(&session).await?;

            for (field_id, text) in values {
                session.set_value(&field_id, text).await?;
            }
            for field_id in checks {
                session.set_value(&field_id, true).await?;
            }
            for (field_id, path) in files {
                let handle = FileHandle::from_path(&path).await?;
                session.accept_file(&field_id, handle).await?;
            }

            match session.submit().await {
                Ok(record) => {
                    for notice in session.drain_notices().await {
                        println!("{}: {}", notice.title, notice.message);
                    }
                    println!("application id: {}", record.id);
                }
                Err(err) => bail!(err.detail()),
            }
        }
        Command::CheckSchema { path } => {
            let registry = registry_or_builtin(api.as_ref()).await;
            let schema = load_schema_draft(&path).await?;
            match check_schema(schema, registry) {
                Ok(schema) => println!("{}: ok ({} fields)", schema.title, schema.fields.len()),
                Err(errors) => bail!(join_errors(&errors)),
            }
        }
        Command::CreateForm { path } => {
            let registry = Arc::new(FieldTypeRegistry::fetch(api.as_ref()).await?);
            let schema = load_schema_draft(&path).await?;
            let schema = check_schema(schema, registry).map_err(|e| anyhow!(join_errors(&e)))?;
            let record = api.create_form(&schema).await?;
            info!(form_id = record.id, "Form created");
            println!("form id: {}", record.id);
        }
        Command::Applications {
            form_id,
            skip,
            limit,
        } => {
            for app in api.list_applications(form_id, Page { skip, limit }).await? {
                println!(
                    "{:>6}  {}  {}",
                    app.id,
                    app.status.as_deref().unwrap_or("-"),
                    serde_json::Value::Object(app.form_data)
                );
            }
        }
        Command::Download {
            application_id,
            field_id,
            out,
        } => {
            let file = api.download_file(application_id, &field_id).await?;
            let out = out.unwrap_or_else(|| {
                file.file_name
                    .clone()
                    .unwrap_or_else(|| format!("{}-{}", application_id, field_id))
                    .into()
            });
            tokio::fs::write(&out, &file.content)
                .await
                .with_context(|| format!("writing {}", out.display()))?;
            println!("saved {} ({} bytes, {})", out.display(), file.content.len(), file.media_type);
        }
    }

    Ok(())
}

async fn resolver(settings: &Settings, api: &dyn FormPort) -> Arc<dyn KindResolver> {
    match settings.renderer.resolution {
        KindResolution::Static => Arc::new(StaticResolver),
        KindResolution::Registry => Arc::new(RegistryResolver::new(registry_or_builtin(api).await)),
    }
}

async fn registry_or_builtin(api: &dyn FormPort) -> Arc<FieldTypeRegistry> {
    match FieldTypeRegistry::fetch(api).await {
        Ok(registry) => Arc::new(registry),
        Err(err) => {
            warn!(error = %err, "Could not fetch field types, using built-in registry");
            Arc::new(FieldTypeRegistry::builtin())
        }
    }
}

async fn ready_schema(session: &FormSession) -> anyhow::Result<FormSchema> {
    match session.state().await {
        FormState::Ready => session
            .schema()
            .await
            .ok_or_else(|| anyhow!("form {} has no schema", session.form_id())),
        FormState::NotFound => bail!("form {} not found", session.form_id()),
        _ => bail!(session
            .last_error()
            .await
            .unwrap_or_else(|| "failed to load form".to_string())),
    }
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}
