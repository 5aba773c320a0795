//! Blogify client: session handling, publishing, the post feed and the
//! profile dashboard, on top of any [`blogify_common::Backend`].

pub mod app;
pub mod auth;
pub mod feed;
pub mod profile;
pub mod publish;
pub mod routes;

pub use app::Blogify;
pub use auth::{RestoreResult, Session};
pub use feed::{ALL_TAGS, Feed, FeedItem, PostEdit};
pub use profile::ProfileEditor;
pub use publish::PublishOutcome;
pub use routes::Route;
