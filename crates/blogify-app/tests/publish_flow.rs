use blogify_app::{Blogify, RestoreResult, Route};
use blogify_common::{
    BackendCall, BackendConfig, BlogifyError, Field, ImageError, MemoryBackend, Post, User,
    UserId, UserMetadata,
};
use blogify_editor_core::{Composer, ImageFile, MAX_IMAGE_BYTES};
use bytes::Bytes;
use rand::SeedableRng;
use rand::rngs::StdRng;
use url::Url;

fn author() -> User {
    User {
        id: UserId::from("author-1"),
        email: Some("author@example.com".into()),
        metadata: UserMetadata {
            name: Some("Author".into()),
            ..Default::default()
        },
    }
}

async fn signed_in_app() -> Blogify<MemoryBackend> {
    let config = BackendConfig::new(Url::parse("https://project.example.co").unwrap(), "anon");
    let mut app = Blogify::new(MemoryBackend::with_user(author()), config);
    assert_eq!(app.start().await, RestoreResult::Restored);
    app.backend().clear_calls().await;
    app
}

fn png(len: usize) -> ImageFile {
    let mut data = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR".to_vec();
    data.resize(len, 0);
    ImageFile {
        name: "cover.png".into(),
        mime_type: "image/png".into(),
        data: Bytes::from(data),
    }
}

#[tokio::test]
async fn publish_with_cover_uploads_then_inserts() {
    let app = signed_in_app().await;
    let mut composer = Composer::new();
    composer.set_title("Hello");
    composer.set_content("# Hello\n**World**\n[link](http://x)");
    composer.set_tag_input("intro");
    composer.add_tag();
    composer.attach_image(png(1024)).unwrap();

    let outcome = app.publish(&mut composer).await.unwrap();
    assert_eq!(outcome.redirect, Route::UserBlog);
    assert_eq!(outcome.redirect.path(), "/userblog");

    let calls = app.backend().calls().await;
    assert_eq!(calls.len(), 2);
    let BackendCall::Upload {
        key,
        content_type,
        len,
    } = &calls[0]
    else {
        panic!("expected upload first, got {:?}", calls[0]);
    };
    assert!(key.starts_with("blog-images/public/author-1-"));
    assert_eq!(content_type, "image/png");
    assert_eq!(*len, 1024);
    assert_eq!(
        calls[1],
        BackendCall::Insert {
            table: "blogs".into()
        }
    );

    let expected_url = format!("memory://storage/public/{}", key);
    assert_eq!(outcome.post.cover_image.as_deref(), Some(expected_url.as_str()));
    assert_eq!(outcome.image_key.as_deref(), Some(key.as_str()));

    let rows = app.backend().rows("blogs").await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["content"], "Hello World link");
    assert_eq!(rows[0]["markdown_content"], "# Hello\n**World**\n[link](http://x)");
    assert_eq!(rows[0]["author_id"], "author-1");
    assert_eq!(rows[0]["is_public"], true);
    assert!(composer.draft().is_blank());
}

#[tokio::test]
async fn empty_title_reports_only_title_and_writes_nothing() {
    let app = signed_in_app().await;
    let mut composer = Composer::new();
    composer.set_content("Some body");
    composer.attach_image(png(256)).unwrap();

    let err = app.publish(&mut composer).await.unwrap_err();
    let BlogifyError::Validation(validation) = &err else {
        panic!("expected validation error, got {err:?}");
    };
    assert!(validation.missing(Field::Title));
    assert!(!validation.missing(Field::Content));
    assert_eq!(
        composer.errors().fields().collect::<Vec<_>>(),
        vec![Field::Title]
    );
    assert!(app.backend().calls().await.is_empty());
}

#[tokio::test]
async fn rejected_image_keeps_accepted_cover() {
    let mut composer = Composer::new();
    composer.attach_image(png(512)).unwrap();
    let accepted = composer.draft().cover_image.clone();

    let too_big = composer.attach_image(png(MAX_IMAGE_BYTES + 1)).unwrap_err();
    assert!(matches!(too_big, ImageError::ImageTooLarge { .. }));
    assert_eq!(composer.draft().cover_image, accepted);

    let mut gif = png(512);
    gif.mime_type = "image/gif".into();
    let wrong_type = composer.attach_image(gif).unwrap_err();
    assert!(matches!(wrong_type, ImageError::InvalidImageType { .. }));
    assert_eq!(composer.draft().cover_image, accepted);
}

#[tokio::test]
async fn published_post_shows_up_in_feed() {
    let app = signed_in_app().await;
    let mut composer = Composer::new();
    composer.set_title("Fresh post");
    composer.set_content("*new* content");
    app.publish(&mut composer).await.unwrap();

    let mut feed = app.load_feed(&mut StdRng::seed_from_u64(42)).await;
    assert_eq!(feed.len(), 1);
    let item = &feed.items()[0];
    assert_eq!(item.post.title, "Fresh post");
    assert_eq!(item.post.content, "new content");

    let id = item.post.id.clone();
    let likes = item.likes;
    let user = author().id;
    feed.toggle_like(&id, &user);
    feed.toggle_like(&id, &user);
    assert_eq!(feed.get(&id).unwrap().likes, likes);
    assert!(feed.get(&id).unwrap().liked_by.is_empty());

    app.backend().clear_calls().await;
    feed.request_delete(&id);
    assert!(app.backend().calls().await.is_empty());
    assert_eq!(feed.len(), 1);

    feed.confirm_delete(app.backend()).await.unwrap();
    assert!(feed.is_empty());
    let remaining: Vec<Post> = app
        .backend()
        .rows("blogs")
        .await
        .into_iter()
        .map(|row| serde_json::from_value(row.into()).unwrap())
        .collect();
    assert!(remaining.is_empty());
}
