//! Form engine: schema editing, field kinds, values, validation and the
//! applicant session.

pub mod builder;
pub mod kind;
pub mod notices;
pub mod registry;
pub mod session;
pub mod submission;
pub mod validation;
pub mod values;

pub use builder::{FieldPatch, SchemaEditor};
pub use kind::{FieldKind, KindResolver, RegistryResolver, StaticResolver};
pub use notices::{Notice, NoticeLevel};
pub use registry::FieldTypeRegistry;
pub use session::{FileAcceptPolicy, FormSession, FormState, SessionOptions};
pub use submission::{FileTagging, SubmissionPayload};
pub use values::{FieldValue, FileHandle};
