//! The post listing.
//!
//! Like and comment counters are made up at load time and only live in
//! memory; a reload starts over. Edits and deletes go to the backend.

use std::collections::{BTreeSet, HashSet};

use blogify_common::{
    BlogifyError, Database, FetchError, PersistenceError, Post, PostId, PostPatch, UserId,
};
use rand::Rng;
use serde_json::Value;

/// Tag filter value that matches every post.
pub const ALL_TAGS: &str = "All";

#[derive(Debug, Clone, PartialEq)]
pub struct FeedItem {
    pub post: Post,
    pub likes: u32,
    pub comments: u32,
    pub liked_by: HashSet<UserId>,
}

impl FeedItem {
    fn new<R: Rng>(post: Post, rng: &mut R) -> Self {
        Self {
            post,
            likes: rng.random_range(0..100),
            comments: rng.random_range(0..50),
            liked_by: HashSet::new(),
        }
    }

    pub fn is_liked_by(&self, user: &UserId) -> bool {
        self.liked_by.contains(user)
    }
}

/// Editable copy of a post's title, content and tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostEdit {
    pub id: PostId,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
}

impl PostEdit {
    fn patch(&self) -> PostPatch {
        PostPatch {
            title: self.title.clone(),
            content: self.content.clone(),
            tags: self.tags.clone(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Feed {
    table: String,
    items: Vec<FeedItem>,
    editing: Option<PostEdit>,
    pending_delete: Option<PostId>,
}

impl Feed {
    /// Fetch the listing from `table`.
    ///
    /// A failed fetch is logged and yields an empty feed.
    pub async fn load<D, R>(db: &D, table: &str, rng: &mut R) -> Self
    where
        D: Database,
        R: Rng,
    {
        let mut feed = Self {
            table: table.to_string(),
            ..Self::default()
        };
        match feed.fetch(db).await {
            Ok(posts) => {
                if posts.is_empty() {
                    tracing::warn!(table, "no posts found");
                } else {
                    tracing::debug!(table, count = posts.len(), "loaded posts");
                }
                feed.items = posts.into_iter().map(|p| FeedItem::new(p, rng)).collect();
            }
            Err(e) => {
                tracing::error!(error = %e, message = %e.message(), "error fetching posts");
            }
        }
        feed
    }

    /// Rows are decoded one by one; a row that does not fit [`Post`] is
    /// skipped rather than failing the whole listing.
    async fn fetch<D: Database>(&self, db: &D) -> Result<Vec<Post>, FetchError> {
        let rows: Vec<Value> = db
            .select(&self.table, Post::DISPLAY_COLUMNS)
            .await
            .map_err(|source| FetchError {
                table: self.table.as_str().into(),
                source,
            })?;
        Ok(rows
            .into_iter()
            .filter_map(|row| {
                let id = row.get("id").cloned();
                match serde_json::from_value::<Post>(row) {
                    Ok(post) => Some(post),
                    Err(e) => {
                        tracing::warn!(table = %self.table, ?id, error = %e, "skipping undecodable post row");
                        None
                    }
                }
            })
            .collect())
    }

    pub fn items(&self) -> &[FeedItem] {
        &self.items
    }

    pub fn get(&self, id: &PostId) -> Option<&FeedItem> {
        self.items.iter().find(|item| &item.post.id == id)
    }

    fn get_mut(&mut self, id: &PostId) -> Option<&mut FeedItem> {
        self.items.iter_mut().find(|item| &item.post.id == id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Flip `user`'s like on a post. Returns the new liked state, or `None`
    /// if the post is not in the feed.
    pub fn toggle_like(&mut self, id: &PostId, user: &UserId) -> Option<bool> {
        let item = self.get_mut(id)?;
        if item.liked_by.remove(user) {
            item.likes = item.likes.saturating_sub(1);
            Some(false)
        } else {
            item.liked_by.insert(user.clone());
            item.likes += 1;
            Some(true)
        }
    }

    /// Open the editor on a post.
    pub fn begin_edit(&mut self, id: &PostId) -> Option<&mut PostEdit> {
        let post = &self.get(id)?.post;
        let edit = PostEdit {
            id: post.id.clone(),
            title: post.title.clone(),
            content: post.content.clone(),
            tags: post.tags.clone(),
        };
        Some(self.editing.insert(edit))
    }

    pub fn editing(&self) -> Option<&PostEdit> {
        self.editing.as_ref()
    }

    pub fn edit_mut(&mut self) -> Option<&mut PostEdit> {
        self.editing.as_mut()
    }

    pub fn cancel_edit(&mut self) {
        self.editing = None;
    }

    /// Write the open edit back and replace the local entry.
    ///
    /// Counters of the entry are kept. On failure the edit stays open.
    pub async fn submit_edit<D: Database>(&mut self, db: &D) -> Result<(), BlogifyError> {
        let Some(edit) = self.editing.as_ref() else {
            return Ok(());
        };
        db.update(&self.table, &edit.patch(), edit.id.as_str())
            .await
            .map_err(|source| {
                tracing::error!(id = %edit.id, error = %source, "error updating post");
                PersistenceError::Update {
                    table: self.table.as_str().into(),
                    id: edit.id.as_str().into(),
                    source,
                }
            })?;

        if let Some(edit) = self.editing.take() {
            if let Some(item) = self.get_mut(&edit.id) {
                item.post.title = edit.title;
                item.post.content = edit.content;
                item.post.tags = edit.tags;
            }
        }
        Ok(())
    }

    /// First phase of a delete: remember which post to delete.
    pub fn request_delete(&mut self, id: &PostId) {
        self.pending_delete = Some(id.clone());
    }

    pub fn pending_delete(&self) -> Option<&PostId> {
        self.pending_delete.as_ref()
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
    }

    /// Delete the pending post from the backend, then from the feed.
    ///
    /// Does nothing without a pending delete. On failure the request stays
    /// pending and the post is kept.
    pub async fn confirm_delete<D: Database>(&mut self, db: &D) -> Result<(), BlogifyError> {
        let Some(id) = self.pending_delete.clone() else {
            return Ok(());
        };
        db.delete(&self.table, id.as_str()).await.map_err(|source| {
            tracing::error!(%id, error = %source, "error deleting post");
            PersistenceError::Delete {
                table: self.table.as_str().into(),
                id: id.as_str().into(),
                source,
            }
        })?;
        self.items.retain(|item| item.post.id != id);
        self.pending_delete = None;
        tracing::info!(%id, "post deleted");
        Ok(())
    }

    /// Posts whose title contains `search` (ignoring case), restricted to
    /// `tag` unless it is [`ALL_TAGS`] or empty.
    pub fn filtered<'a>(
        &'a self,
        search: &str,
        tag: &'a str,
    ) -> impl Iterator<Item = &'a FeedItem> + 'a {
        let needle = search.trim().to_lowercase();
        let tag = if tag.is_empty() || tag == ALL_TAGS {
            None
        } else {
            Some(tag)
        };
        self.items.iter().filter(move |item| {
            item.post.title.to_lowercase().contains(&needle)
                && tag.is_none_or(|t| item.post.tags.iter().any(|pt| pt == t))
        })
    }

    /// Every tag used in the feed, sorted.
    pub fn tags(&self) -> Vec<&str> {
        self.items
            .iter()
            .flat_map(|item| item.post.tags.iter().map(String::as_str))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blogify_common::{BackendCall, MemoryBackend, Operation};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use serde_json::json;

    async fn seeded() -> (MemoryBackend, Feed) {
        let backend = MemoryBackend::new();
        for (title, tags) in [
            ("Learning Rust", json!(["rust", "tech"])),
            ("Weekend in Lisbon", json!(["travel"])),
            ("Rusty bikes", json!([])),
        ] {
            backend
                .seed(
                    "blogs",
                    &json!({"title": title, "content": "c", "tags": tags, "author_id": "u-1"}),
                )
                .await
                .unwrap();
        }
        let mut rng = StdRng::seed_from_u64(7);
        let feed = Feed::load(&backend, "blogs", &mut rng).await;
        backend.clear_calls().await;
        (backend, feed)
    }

    #[tokio::test]
    async fn test_load_assigns_counters_in_range() {
        let (_backend, feed) = seeded().await;
        assert_eq!(feed.len(), 3);
        for item in feed.items() {
            assert!(item.likes < 100);
            assert!(item.comments < 50);
            assert!(item.liked_by.is_empty());
        }
    }

    #[tokio::test]
    async fn test_fetch_failure_yields_empty_feed() {
        let backend = MemoryBackend::new();
        backend
            .seed("blogs", &json!({"title": "t", "author_id": "u-1"}))
            .await
            .unwrap();
        backend.fail_next(Operation::Select).await;
        let feed = Feed::load(&backend, "blogs", &mut StdRng::seed_from_u64(1)).await;
        assert!(feed.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_row_is_skipped() {
        let backend = MemoryBackend::new();
        for row in [
            json!({"title": "good", "author_id": "u-1"}),
            json!({"title": "legacy", "author_id": null}),
        ] {
            backend.seed("blogs", &row).await.unwrap();
        }
        let feed = Feed::load(&backend, "blogs", &mut StdRng::seed_from_u64(3)).await;
        assert_eq!(feed.len(), 1);
        assert_eq!(feed.items()[0].post.title, "good");
    }

    #[tokio::test]
    async fn test_toggle_like_twice_restores() {
        let (_backend, mut feed) = seeded().await;
        let id = feed.items()[0].post.id.clone();
        let user = UserId::from("u-9");
        let likes = feed.items()[0].likes;

        assert_eq!(feed.toggle_like(&id, &user), Some(true));
        assert_eq!(feed.get(&id).unwrap().likes, likes + 1);
        assert!(feed.get(&id).unwrap().is_liked_by(&user));

        assert_eq!(feed.toggle_like(&id, &user), Some(false));
        assert_eq!(feed.get(&id).unwrap().likes, likes);
        assert!(!feed.get(&id).unwrap().is_liked_by(&user));

        assert_eq!(feed.toggle_like(&PostId::from("missing"), &user), None);
    }

    #[tokio::test]
    async fn test_edit_writes_three_fields_and_keeps_counters() {
        let (backend, mut feed) = seeded().await;
        let id = feed.items()[1].post.id.clone();
        let likes = feed.items()[1].likes;

        let edit = feed.begin_edit(&id).unwrap();
        edit.title = "Two weeks in Lisbon".into();
        edit.tags.push("food".into());
        feed.submit_edit(&backend).await.unwrap();

        assert!(feed.editing().is_none());
        let item = feed.get(&id).unwrap();
        assert_eq!(item.post.title, "Two weeks in Lisbon");
        assert_eq!(item.post.tags, vec!["travel", "food"]);
        assert_eq!(item.likes, likes);
        assert_eq!(
            backend.calls().await,
            vec![BackendCall::Update {
                table: "blogs".into(),
                id: id.as_str().into()
            }]
        );
    }

    #[tokio::test]
    async fn test_cancel_edit_writes_nothing() {
        let (backend, mut feed) = seeded().await;
        let id = feed.items()[0].post.id.clone();
        feed.begin_edit(&id).unwrap().title = "changed".into();
        feed.cancel_edit();
        assert_eq!(feed.get(&id).unwrap().post.title, "Learning Rust");
        assert!(backend.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_delete_needs_confirmation() {
        let (backend, mut feed) = seeded().await;
        let id = feed.items()[0].post.id.clone();

        feed.request_delete(&id);
        assert!(feed.get(&id).is_some());
        assert!(backend.calls().await.is_empty());

        feed.cancel_delete();
        assert!(feed.pending_delete().is_none());
        assert_eq!(feed.len(), 3);

        feed.request_delete(&id);
        feed.confirm_delete(&backend).await.unwrap();
        assert!(feed.get(&id).is_none());
        assert_eq!(backend.rows("blogs").await.len(), 2);
    }

    #[tokio::test]
    async fn test_failed_delete_keeps_post() {
        let (backend, mut feed) = seeded().await;
        let id = feed.items()[0].post.id.clone();
        feed.request_delete(&id);
        backend.fail_next(Operation::Delete).await;
        assert!(feed.confirm_delete(&backend).await.is_err());
        assert!(feed.get(&id).is_some());
        assert_eq!(feed.pending_delete(), Some(&id));
    }

    #[tokio::test]
    async fn test_filtered_by_title_and_tag() {
        let (_backend, feed) = seeded().await;
        let titles = |search: &str, tag: &str| {
            feed.filtered(search, tag)
                .map(|item| item.post.title.clone())
                .collect::<Vec<_>>()
        };
        assert_eq!(titles("rust", ALL_TAGS), vec!["Learning Rust", "Rusty bikes"]);
        assert_eq!(titles("RUST", "tech"), vec!["Learning Rust"]);
        assert_eq!(titles("", "travel"), vec!["Weekend in Lisbon"]);
        assert_eq!(feed.tags(), vec!["rust", "tech", "travel"]);
    }
}
