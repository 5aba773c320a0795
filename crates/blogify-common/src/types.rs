//! Records exchanged with the managed backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use smol_str::{SmolStr, ToSmolStr};

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        #[serde(transparent)]
        pub struct $name(SmolStr);

        impl $name {
            pub fn new(id: impl Into<SmolStr>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                self.0.as_str()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.into())
            }
        }

        // The database hands out either uuid strings or bigint keys.
        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                #[derive(Deserialize)]
                #[serde(untagged)]
                enum Raw {
                    Str(SmolStr),
                    Int(i64),
                }
                Ok(match Raw::deserialize(deserializer)? {
                    Raw::Str(s) => Self(s),
                    Raw::Int(i) => Self(i.to_smolstr()),
                })
            }
        }
    };
}

id_type!(
    /// Identifier the database assigns to a post.
    PostId
);
id_type!(
    /// Identifier of an authenticated user, as issued by the auth provider.
    UserId
);

/// Treat an explicit `null` the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// The signed-in user as reported by the auth provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, rename = "user_metadata", deserialize_with = "null_as_default")]
    pub metadata: UserMetadata,
}

/// Provider-supplied metadata. Only the fields we read are kept.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserMetadata {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
}

/// A row of the `blogs` table, as read back for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub markdown_content: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub cover_image: Option<String>,
    pub author_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_public: Option<bool>,
}

impl Post {
    /// Columns the listing selects.
    pub const DISPLAY_COLUMNS: &'static [&'static str] =
        &["id", "title", "content", "tags", "cover_image", "author_id"];
}

/// A post record ready for insertion. The database assigns the id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPost {
    pub title: String,
    /// Plain text derived from the markdown.
    pub content: String,
    pub markdown_content: String,
    pub tags: Vec<String>,
    pub cover_image: Option<String>,
    pub author_id: UserId,
    pub created_at: DateTime<Utc>,
    pub is_public: bool,
}

/// The fields an edit writes back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostPatch {
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
}

/// A row of the `profiles` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: UserId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub login: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blog: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub twitter_username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_url: Option<String>,
}

impl Profile {
    /// Initial profile for a user signing in for the first time.
    pub fn for_new_user(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user
                .metadata
                .name
                .clone()
                .unwrap_or_else(|| "Anonymous".to_string()),
            email: user.email.clone(),
            avatar_url: user.metadata.avatar_url.clone(),
            login: user.metadata.user_name.clone(),
            location: None,
            company: None,
            blog: None,
            twitter_username: None,
            html_url: user.metadata.html_url.clone(),
        }
    }

    /// Fill gaps in a stored profile from the provider metadata.
    pub fn merge_metadata(mut self, metadata: &UserMetadata) -> Self {
        if self.avatar_url.is_none() {
            self.avatar_url = metadata.avatar_url.clone();
        }
        if self.login.is_none() {
            self.login = metadata.user_name.clone();
        }
        if self.html_url.is_none() {
            self.html_url = metadata.html_url.clone();
        }
        self
    }
}

/// The row written when a profile is first created. Provider details such as
/// the login are only merged into the local copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProfile {
    pub id: UserId,
    pub name: String,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
}

impl From<&Profile> for NewProfile {
    fn from(profile: &Profile) -> Self {
        Self {
            id: profile.id.clone(),
            name: profile.name.clone(),
            email: profile.email.clone(),
            avatar_url: profile.avatar_url.clone(),
        }
    }
}

/// The profile fields a user can edit from the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfilePatch {
    pub name: String,
    pub location: Option<String>,
    pub company: Option<String>,
    pub twitter_username: Option<String>,
}

impl From<&Profile> for ProfilePatch {
    fn from(profile: &Profile) -> Self {
        Self {
            name: profile.name.clone(),
            location: profile.location.clone(),
            company: profile.company.clone(),
            twitter_username: profile.twitter_username.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_accepts_numeric_id_and_null_tags() {
        let json = r#"{"id": 42, "title": "Hi", "content": "there", "tags": null,
                       "cover_image": null, "author_id": "u-1"}"#;
        let post: Post = serde_json::from_str(json).unwrap();
        assert_eq!(post.id.as_str(), "42");
        assert!(post.tags.is_empty());
        assert_eq!(post.cover_image, None);
    }

    #[test]
    fn test_user_metadata_from_provider() {
        let json = r#"{"id": "abc", "email": "a@b.c",
                       "user_metadata": {"name": "Ada", "avatar_url": "https://x/a.png"}}"#;
        let user: User = serde_json::from_str(json).unwrap();
        let profile = Profile::for_new_user(&user);
        assert_eq!(profile.name, "Ada");
        assert_eq!(profile.avatar_url.as_deref(), Some("https://x/a.png"));
    }

    #[test]
    fn test_new_user_without_name_is_anonymous() {
        let user = User {
            id: UserId::from("u-2"),
            email: None,
            metadata: UserMetadata::default(),
        };
        assert_eq!(Profile::for_new_user(&user).name, "Anonymous");
    }
}
