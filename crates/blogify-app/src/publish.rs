//! Publishing a draft as a new post.
//!
//! Checks run before any backend call: a publish already in flight is
//! refused, then the draft is validated, then a signed-in user is required.
//! After that the cover image (if any) is uploaded and the post is inserted,
//! strictly in that order.

use blogify_common::config::TableNames;
use blogify_common::{
    BlogifyError, Database, NewPost, ObjectStore, PersistenceError, UploadError, UserId,
    ValidationError,
};
use blogify_editor_core::{Composer, Draft, to_plain_text};
use chrono::Utc;
use uuid::Uuid;

use crate::auth::Session;
use crate::routes::Route;

/// Prefix of cover image keys inside the bucket.
const IMAGE_KEY_PREFIX: &str = "blog-images/public";

/// A successfully published post.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishOutcome {
    /// The record as inserted
    pub post: NewPost,
    /// Storage key of the uploaded cover image
    pub image_key: Option<String>,
    /// Where to navigate next
    pub redirect: Route,
}

fn image_key(user_id: &UserId) -> String {
    format!("{}/{}-{}", IMAGE_KEY_PREFIX, user_id, Uuid::new_v4())
}

/// Publish the composer's draft for the signed-in user.
///
/// On success the composer is reset. On any failure the draft is kept as it
/// was, and validation failures are reflected in the composer's field errors.
pub async fn publish<B>(
    backend: &B,
    tables: &TableNames,
    session: &Session,
    composer: &mut Composer,
) -> Result<PublishOutcome, BlogifyError>
where
    B: ObjectStore + Database,
{
    if composer.is_submitting() {
        tracing::debug!("publish refused, already in progress");
        return Err(BlogifyError::PublishInProgress);
    }

    composer.validate()?;

    let Some(user_id) = session.user_id() else {
        return Err(ValidationError::Unauthenticated.into());
    };

    composer.set_submitting(true);
    let result = submit(backend, tables, user_id, composer.draft()).await;
    composer.set_submitting(false);

    match result {
        Ok(outcome) => {
            composer.reset();
            Ok(outcome)
        }
        Err(e) => {
            tracing::error!(error = %e, "publish failed");
            Err(e)
        }
    }
}

async fn submit<B>(
    backend: &B,
    tables: &TableNames,
    user_id: &UserId,
    draft: &Draft,
) -> Result<PublishOutcome, BlogifyError>
where
    B: ObjectStore + Database,
{
    let mut image_key_used = None;
    let mut cover_url = None;

    if let Some(cover) = &draft.cover_image {
        let key = image_key(user_id);
        tracing::debug!(%key, bytes = cover.len(), "uploading cover image");
        backend
            .upload(&key, cover.data.clone(), &cover.mime_type)
            .await
            .map_err(|source| UploadError {
                key: key.clone(),
                source,
            })?;
        cover_url = Some(backend.public_url(&key));
        image_key_used = Some(key);
    }

    let post = NewPost {
        title: draft.title.clone(),
        content: to_plain_text(&draft.content),
        markdown_content: draft.content.clone(),
        tags: draft.tags.to_vec(),
        cover_image: cover_url,
        author_id: user_id.clone(),
        created_at: Utc::now(),
        is_public: draft.is_public,
    };

    backend
        .insert(&tables.blogs, &post)
        .await
        .map_err(|source| PersistenceError::Insert {
            table: tables.blogs.as_str().into(),
            source,
        })?;

    tracing::info!(
        author_id = %user_id,
        title = %post.title,
        has_cover = post.cover_image.is_some(),
        "post published"
    );

    Ok(PublishOutcome {
        post,
        image_key: image_key_used,
        redirect: Route::UserBlog,
    })
}
