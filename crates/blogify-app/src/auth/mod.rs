mod state;
pub use state::Session;

use blogify_common::config::OAuthConfig;
use blogify_common::{AuthProvider, BackendError};
use url::Url;

use crate::routes::Route;

/// Result of attempting to restore a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreResult {
    /// Session was successfully restored
    Restored,
    /// No saved session was found
    NoSession,
    /// The auth provider could not be reached; treated as signed out
    Unavailable,
}

impl Session {
    /// Pick up the persisted session from the auth provider.
    pub async fn restore<A: AuthProvider>(&mut self, auth: &A) -> RestoreResult {
        match auth.current_user().await {
            Ok(Some(user)) => {
                tracing::info!(user_id = %user.id, "session restored");
                self.set_authenticated(user);
                RestoreResult::Restored
            }
            Ok(None) => {
                self.clear();
                RestoreResult::NoSession
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to restore session");
                self.clear();
                RestoreResult::Unavailable
            }
        }
    }

    /// End the session with the provider and locally.
    ///
    /// The local session is cleared even if the provider call fails.
    pub async fn sign_out<A: AuthProvider>(&mut self, auth: &A) -> Result<Route, BackendError> {
        let user_id = self.user_id().cloned();
        self.clear();
        if let Err(e) = auth.sign_out().await {
            tracing::warn!(error = %e, "provider sign-out failed");
            return Err(e);
        }
        tracing::info!(user_id = ?user_id.as_ref().map(|id| id.as_str()), "signed out");
        Ok(Route::Home)
    }
}

/// Where to send the browser for login or sign-up.
pub fn sign_in_url<A: AuthProvider>(auth: &A, oauth: &OAuthConfig) -> Result<Url, BackendError> {
    auth.authorize_url(&oauth.provider)
}

#[cfg(test)]
mod tests {
    use super::*;
    use blogify_common::{BackendCall, MemoryBackend, Operation, User, UserId, UserMetadata};

    fn user() -> User {
        User {
            id: UserId::from("u-1"),
            email: Some("ada@example.com".into()),
            metadata: UserMetadata::default(),
        }
    }

    #[tokio::test]
    async fn test_restore_and_sign_out() {
        let backend = MemoryBackend::with_user(user());
        let mut session = Session::anonymous();

        assert_eq!(session.restore(&backend).await, RestoreResult::Restored);
        assert_eq!(session.user_id().map(UserId::as_str), Some("u-1"));

        assert_eq!(session.sign_out(&backend).await.unwrap(), Route::Home);
        assert!(!session.is_authenticated());
        assert_eq!(backend.calls().await.last(), Some(&BackendCall::SignOut));

        assert_eq!(session.restore(&backend).await, RestoreResult::NoSession);
    }

    #[tokio::test]
    async fn test_restore_failure_is_signed_out() {
        let backend = MemoryBackend::with_user(user());
        let mut session = Session::signed_in(user());
        backend.fail_next(Operation::CurrentUser).await;
        assert_eq!(session.restore(&backend).await, RestoreResult::Unavailable);
        assert!(!session.is_authenticated());
    }

    #[test]
    fn test_sign_in_url_uses_provider() {
        let backend = MemoryBackend::new();
        let url = sign_in_url(&backend, &OAuthConfig::default()).unwrap();
        assert!(url.query_pairs().any(|(k, v)| k == "provider" && v == "github"));
    }
}
