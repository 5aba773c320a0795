//! Application context: the backend, its configuration and the session.

use blogify_common::telemetry::{self, TelemetryConfig};
use blogify_common::{
    Backend, BackendConfig, BackendError, BlogifyError, RestBackend, SmolStr, ValidationError,
};
use blogify_editor_core::Composer;
use rand::Rng;
use url::Url;

use crate::auth::{self, RestoreResult, Session};
use crate::feed::Feed;
use crate::profile::{self, ProfileEditor};
use crate::publish::{self, PublishOutcome};
use crate::routes::Route;

pub struct Blogify<B> {
    backend: B,
    config: BackendConfig,
    session: Session,
}

impl Blogify<RestBackend> {
    /// Set up logging and connect to the backend named by the environment.
    pub fn from_env() -> Result<Self, BlogifyError> {
        telemetry::init(TelemetryConfig::from_env("blogify-app"));
        let config = BackendConfig::from_env()?;
        tracing::info!(url = %config.url, bucket = %config.bucket, "backend configured");
        Ok(Self::connect(config))
    }

    pub fn connect(config: BackendConfig) -> Self {
        Self::new(RestBackend::new(config.clone()), config)
    }

    /// Connect with the access token of an existing sign-in.
    pub fn connect_with_token(config: BackendConfig, token: impl Into<SmolStr>) -> Self {
        Self::new(
            RestBackend::new(config.clone()).with_access_token(token),
            config,
        )
    }

    /// Install the access token returned by the OAuth redirect. Call
    /// [`Blogify::start`] afterwards to pick up the user.
    pub fn set_access_token(&mut self, token: impl Into<SmolStr>) {
        self.backend.set_access_token(token);
    }
}

impl<B: Backend> Blogify<B> {
    pub fn new(backend: B, config: BackendConfig) -> Self {
        Self {
            backend,
            config,
            session: Session::anonymous(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Restore the persisted session, if any.
    pub async fn start(&mut self) -> RestoreResult {
        self.session.restore(&self.backend).await
    }

    pub fn sign_in_url(&self) -> Result<Url, BackendError> {
        auth::sign_in_url(&self.backend, &self.config.oauth)
    }

    pub async fn sign_out(&mut self) -> Result<Route, BlogifyError> {
        Ok(self.session.sign_out(&self.backend).await?)
    }

    /// Where navigating to `route` actually lands.
    pub fn resolve(&self, route: Route) -> Route {
        if route.requires_auth() && !self.session.is_authenticated() {
            tracing::debug!(%route, "not signed in, redirecting to login");
            Route::Login
        } else {
            route
        }
    }

    pub async fn publish(&self, composer: &mut Composer) -> Result<PublishOutcome, BlogifyError> {
        publish::publish(&self.backend, &self.config.tables, &self.session, composer).await
    }

    pub async fn load_feed<R: Rng>(&self, rng: &mut R) -> Feed {
        Feed::load(&self.backend, &self.config.tables.blogs, rng).await
    }

    pub async fn load_profile(&self) -> Result<ProfileEditor, BlogifyError> {
        let user = self
            .session
            .user()
            .ok_or(ValidationError::Unauthenticated)?;
        let profile = profile::load_or_create(&self.backend, &self.config.tables.profiles, user).await?;
        Ok(ProfileEditor::new(profile))
    }

    pub async fn save_profile(&self, editor: &mut ProfileEditor) -> Result<(), BlogifyError> {
        editor.save(&self.backend, &self.config.tables.profiles).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blogify_common::{MemoryBackend, User, UserId, UserMetadata};

    fn config() -> BackendConfig {
        BackendConfig::new(Url::parse("https://project.example.co").unwrap(), "anon")
    }

    #[tokio::test]
    async fn test_guarded_routes_follow_session() {
        let user = User {
            id: UserId::from("u-1"),
            email: None,
            metadata: UserMetadata::default(),
        };
        let mut app = Blogify::new(MemoryBackend::with_user(user), config());
        assert_eq!(app.resolve(Route::CreateBlog), Route::Login);
        assert_eq!(app.resolve(Route::UserBlog), Route::UserBlog);

        assert_eq!(app.start().await, RestoreResult::Restored);
        assert_eq!(app.resolve(Route::CreateBlog), Route::CreateBlog);

        assert_eq!(app.sign_out().await.unwrap(), Route::Home);
        assert_eq!(app.resolve(Route::Dashboard), Route::Login);
    }

    #[tokio::test]
    async fn test_rest_app_carries_access_token() {
        let mut app = Blogify::connect(config());
        assert_eq!(app.backend().access_token(), None);
        assert_eq!(app.start().await, RestoreResult::NoSession);

        app.set_access_token("jwt-1");
        assert_eq!(app.backend().access_token(), Some("jwt-1"));

        let app = Blogify::connect_with_token(config(), "jwt-2");
        assert_eq!(app.backend().access_token(), Some("jwt-2"));
    }

    #[tokio::test]
    async fn test_profile_requires_user() {
        let app = Blogify::new(MemoryBackend::new(), config());
        let err = app.load_profile().await.unwrap_err();
        assert!(matches!(
            err,
            BlogifyError::Validation(ValidationError::Unauthenticated)
        ));
    }
}
