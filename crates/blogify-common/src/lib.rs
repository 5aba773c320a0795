//! Shared types and backend access for blogify.

pub mod backend;
pub mod config;
pub mod error;
pub mod memory;
pub mod rest;
pub mod telemetry;
pub mod types;

pub use backend::{AuthProvider, Backend, Database, ObjectStore};
pub use config::BackendConfig;
pub use error::{
    BackendError, BlogifyError, ConfigError, FetchError, Field, ImageError, PersistenceError,
    UploadError, ValidationError,
};
pub use memory::{BackendCall, MemoryBackend, Operation};
pub use rest::RestBackend;
pub use types::{
    NewPost, NewProfile, Post, PostId, PostPatch, Profile, ProfilePatch, User, UserId,
    UserMetadata,
};

pub use bytes::Bytes;
pub use smol_str::SmolStr;
