//! Error types for blogify.
//!
//! Each family maps to one kind of user action failing. Validation and image
//! errors are recovered locally as field messages; upload, persistence and
//! fetch errors wrap the [`BackendError`] reported by the collaborator.

use std::path::PathBuf;

use miette::Diagnostic;
use smol_str::SmolStr;
use thiserror::Error;

/// Top-level error type for blogify operations
#[derive(Debug, Error, Diagnostic)]
pub enum BlogifyError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Image(#[from] ImageError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Upload(#[from] UploadError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Persistence(#[from] PersistenceError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Backend(#[from] BackendError),

    #[error("a publish is already in progress")]
    #[diagnostic(code(publish::in_progress))]
    PublishInProgress,
}

impl BlogifyError {
    /// Message suitable for showing to the user in an alert or inline.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(e) => e.user_message(),
            Self::Image(e) => e.user_message().to_string(),
            Self::Upload(e) => format!("Upload Error: {}", e.message()),
            Self::Persistence(e) => format!("{}: {}", e.label(), e.message()),
            Self::Fetch(e) => format!("Error fetching blogs: {}", e.message()),
            Self::Config(e) => e.to_string(),
            Self::Backend(e) => e.message(),
            Self::PublishInProgress => "Publishing...".to_string(),
        }
    }
}

/// A form field that can carry a validation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    Title,
    Content,
    Image,
}

impl Field {
    pub fn name(self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Content => "content",
            Field::Image => "image",
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Draft validation failures. Raised before any collaborator call.
#[derive(Debug, Error, Diagnostic, PartialEq, Eq)]
pub enum ValidationError {
    #[error("missing required fields: {}", display_fields(fields))]
    #[diagnostic(code(validation::fields), help("fill in the highlighted fields"))]
    MissingFields { fields: Vec<Field> },

    #[error("no authenticated user")]
    #[diagnostic(code(validation::unauthenticated))]
    Unauthenticated,
}

impl ValidationError {
    pub fn user_message(&self) -> String {
        match self {
            Self::MissingFields { fields } => fields
                .iter()
                .map(|f| required_message(*f))
                .collect::<Vec<_>>()
                .join(" "),
            Self::Unauthenticated => "Please log in to create a blog post.".to_string(),
        }
    }

    pub fn missing(&self, field: Field) -> bool {
        matches!(self, Self::MissingFields { fields } if fields.contains(&field))
    }
}

/// Inline message shown under a required field left empty.
pub fn required_message(field: Field) -> &'static str {
    match field {
        Field::Title => "Title is required",
        Field::Content => "Content is required",
        Field::Image => "Image is required",
    }
}

fn display_fields(fields: &[Field]) -> String {
    fields
        .iter()
        .map(|f| f.name())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Cover image rejected during intake.
#[derive(Debug, Error, Diagnostic, PartialEq, Eq)]
pub enum ImageError {
    #[error("invalid image type: {mime_type}")]
    #[diagnostic(code(image::invalid_type), help("only JPEG, JPG and PNG images are allowed"))]
    InvalidImageType { mime_type: SmolStr },

    #[error("image too large: {size} bytes (max {max})")]
    #[diagnostic(code(image::too_large))]
    ImageTooLarge { size: usize, max: usize },

    #[error("image data could not be decoded")]
    #[diagnostic(code(image::undecodable))]
    Undecodable,
}

impl ImageError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::InvalidImageType { .. } => "Only JPEG, JPG, and PNG images are allowed.",
            Self::ImageTooLarge { .. } => "Image must be less than 5MB.",
            Self::Undecodable => "The selected file is not a readable image.",
        }
    }
}

/// Object storage rejected the cover image.
#[derive(Debug, Error, Diagnostic)]
#[error("failed to upload {key}")]
#[diagnostic(code(storage::upload))]
pub struct UploadError {
    pub key: String,
    #[source]
    pub source: BackendError,
}

impl UploadError {
    pub fn message(&self) -> String {
        self.source.message()
    }
}

/// Database write failures
#[derive(Debug, Error, Diagnostic)]
pub enum PersistenceError {
    #[error("failed to insert into {table}")]
    #[diagnostic(code(database::insert))]
    Insert {
        table: SmolStr,
        #[source]
        source: BackendError,
    },

    #[error("failed to update {table} row {id}")]
    #[diagnostic(code(database::update))]
    Update {
        table: SmolStr,
        id: SmolStr,
        #[source]
        source: BackendError,
    },

    #[error("failed to delete {table} row {id}")]
    #[diagnostic(code(database::delete))]
    Delete {
        table: SmolStr,
        id: SmolStr,
        #[source]
        source: BackendError,
    },
}

impl PersistenceError {
    /// Prefix shown to the user, naming the action and the kind of record.
    pub fn label(&self) -> String {
        match self {
            Self::Insert { .. } => "Submission Error".to_string(),
            Self::Update { table, .. } => format!("Error updating {}", record_name(table)),
            Self::Delete { table, .. } => format!("Error deleting {}", record_name(table)),
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::Insert { source, .. }
            | Self::Update { source, .. }
            | Self::Delete { source, .. } => source.message(),
        }
    }
}

/// `blogs` -> `blog`, `profiles` -> `profile`.
fn record_name(table: &str) -> &str {
    table.strip_suffix('s').unwrap_or(table)
}

/// Database read failures
#[derive(Debug, Error, Diagnostic)]
#[error("failed to fetch from {table}")]
#[diagnostic(code(database::select))]
pub struct FetchError {
    pub table: SmolStr,
    #[source]
    pub source: BackendError,
}

impl FetchError {
    pub fn message(&self) -> String {
        self.source.message()
    }
}

/// Configuration loading errors
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("missing environment variable: {var}")]
    #[diagnostic(code(config::missing_env))]
    MissingEnv { var: &'static str },

    #[error("invalid URL {url}: {message}")]
    #[diagnostic(code(config::url))]
    UrlParse { url: String, message: String },

    #[error("failed to read config file {}", path.display())]
    #[diagnostic(code(config::io))]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {}: {message}", path.display())]
    #[diagnostic(code(config::parse))]
    Parse { path: PathBuf, message: String },
}

/// Errors reported by a collaborator (auth provider, object store, database).
#[derive(Debug, Error, Diagnostic)]
pub enum BackendError {
    #[error("request failed")]
    #[diagnostic(code(backend::request))]
    Request(#[from] reqwest::Error),

    #[error("backend returned {status}: {message}")]
    #[diagnostic(code(backend::status))]
    Status { status: u16, message: String },

    #[error("failed to decode response")]
    #[diagnostic(code(backend::decode))]
    Decode(#[from] serde_json::Error),

    #[error("no row in {table} with id {id}")]
    #[diagnostic(code(backend::not_found))]
    NotFound { table: SmolStr, id: SmolStr },

    #[error("backend unavailable: {message}")]
    #[diagnostic(code(backend::unavailable))]
    Unavailable { message: String },
}

impl BackendError {
    /// The collaborator's own message, without our framing.
    pub fn message(&self) -> String {
        match self {
            Self::Request(e) => e.to_string(),
            Self::Status { message, .. } => message.clone(),
            Self::Decode(e) => e.to_string(),
            Self::NotFound { .. } => self.to_string(),
            Self::Unavailable { message } => message.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_message() {
        let err = ValidationError::MissingFields {
            fields: vec![Field::Title, Field::Content],
        };
        assert_eq!(err.to_string(), "missing required fields: title, content");
        assert_eq!(err.user_message(), "Title is required Content is required");
        assert!(err.missing(Field::Title));
        assert!(!err.missing(Field::Image));
    }

    #[test]
    fn test_upload_error_surfaces_backend_message() {
        let err = BlogifyError::from(UploadError {
            key: "blog-images/public/u-1".into(),
            source: BackendError::Status {
                status: 413,
                message: "Payload too large".into(),
            },
        });
        assert_eq!(err.user_message(), "Upload Error: Payload too large");
    }

    #[test]
    fn test_persistence_messages_name_the_action() {
        let source = || BackendError::Status {
            status: 400,
            message: "bad request".into(),
        };
        let insert = BlogifyError::from(PersistenceError::Insert {
            table: "blogs".into(),
            source: source(),
        });
        let update = BlogifyError::from(PersistenceError::Update {
            table: "blogs".into(),
            id: "7".into(),
            source: source(),
        });
        let delete = BlogifyError::from(PersistenceError::Delete {
            table: "blogs".into(),
            id: "7".into(),
            source: source(),
        });
        let profile = BlogifyError::from(PersistenceError::Update {
            table: "profiles".into(),
            id: "u-1".into(),
            source: source(),
        });
        assert_eq!(insert.user_message(), "Submission Error: bad request");
        assert_eq!(update.user_message(), "Error updating blog: bad request");
        assert_eq!(delete.user_message(), "Error deleting blog: bad request");
        assert_eq!(profile.user_message(), "Error updating profile: bad request");
    }
}
