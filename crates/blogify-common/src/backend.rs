//! Collaborator traits for the managed backend.
//!
//! The application never talks to the backend directly; it goes through
//! these three capabilities so the same workflows run against the REST
//! backend and the in-memory one.

use std::future::Future;

use bytes::Bytes;
use serde::{Serialize, de::DeserializeOwned};
use url::Url;

use crate::error::BackendError;
use crate::types::User;

/// Identity provider. Read-only apart from the sign-in redirect and sign-out.
pub trait AuthProvider: Send + Sync {
    /// The user of the persisted session, if any.
    fn current_user(&self) -> impl Future<Output = Result<Option<User>, BackendError>> + Send;

    /// Where to send the browser to start an OAuth sign-in with `provider`.
    fn authorize_url(&self, provider: &str) -> Result<Url, BackendError>;

    /// End the persisted session.
    fn sign_out(&self) -> impl Future<Output = Result<(), BackendError>> + Send;
}

/// Object storage with public URLs.
pub trait ObjectStore: Send + Sync {
    fn upload<'a>(
        &'a self,
        key: &'a str,
        data: Bytes,
        content_type: &'a str,
    ) -> impl Future<Output = Result<(), BackendError>> + Send + 'a;

    /// Public URL for an object. Does not check that the object exists.
    fn public_url(&self, key: &str) -> String;
}

/// Row-oriented database.
pub trait Database: Send + Sync {
    fn insert<'a, R>(
        &'a self,
        table: &'a str,
        record: &'a R,
    ) -> impl Future<Output = Result<(), BackendError>> + Send + 'a
    where
        R: Serialize + Sync;

    fn select<'a, R>(
        &'a self,
        table: &'a str,
        columns: &'a [&'a str],
    ) -> impl Future<Output = Result<Vec<R>, BackendError>> + Send + 'a
    where
        R: DeserializeOwned + Send + 'a;

    /// All columns of the row with `id`, if it exists.
    fn select_by_id<'a, R>(
        &'a self,
        table: &'a str,
        id: &'a str,
    ) -> impl Future<Output = Result<Option<R>, BackendError>> + Send + 'a
    where
        R: DeserializeOwned + Send + 'a;

    fn update<'a, P>(
        &'a self,
        table: &'a str,
        patch: &'a P,
        id: &'a str,
    ) -> impl Future<Output = Result<(), BackendError>> + Send + 'a
    where
        P: Serialize + Sync;

    fn delete<'a>(
        &'a self,
        table: &'a str,
        id: &'a str,
    ) -> impl Future<Output = Result<(), BackendError>> + Send + 'a;
}

/// Everything the application needs from a managed backend.
pub trait Backend: AuthProvider + ObjectStore + Database {}

impl<T> Backend for T where T: AuthProvider + ObjectStore + Database {}
