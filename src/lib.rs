//! # Intake - Dynamic Form Engine
//!
//! Intake builds, renders and submits schema-driven application forms backed
//! by a REST forms service.
//!
//! ## Features
//!
//! - **Schema Editor**: add, update, remove and reorder fields, then validate
//! - **Field Kinds**: resolve field type ids through the fetched registry or a static table
//! - **Form Sessions**: seed values, validate required fields, submit once at a time
//! - **File Tagging**: carry each upload's owning field id through multipart requests
//! - **Admin Operations**: list, create and delete forms; browse applications and files
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use intake::adapters::HttpFormApi;
//! use intake::engine::{FormSession, SessionOptions, StaticResolver};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let api = Arc::new(HttpFormApi::new("http://localhost:8000", Duration::from_secs(30))?);
//!     let session = FormSession::open(1, api, Arc::new(StaticResolver), SessionOptions::default()).await;
//!
//!     session.set_value("name", "Ann").await?;
//!     let receipt = session.submit().await?;
//!     println!("submitted application {}", receipt.id);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! Intake follows Hexagonal Architecture:
//! - **Domain**: data model, errors and the backend ports
//! - **Engine**: editor, kind resolution, values, validation and sessions
//! - **Adapters**: HTTP and in-memory implementations of the ports
//! - **Config**: layered settings with validation

pub mod adapters;
pub mod cli;
pub mod commands;
pub mod config;
pub mod domain;
pub mod engine;
