//! The post being written.

use blogify_common::{Field, ValidationError};

use crate::image::CoverImage;
use crate::tags::TagList;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    pub title: String,
    /// Markdown source
    pub content: String,
    pub tags: TagList,
    pub cover_image: Option<CoverImage>,
    pub is_public: bool,
}

impl Default for Draft {
    fn default() -> Self {
        Self {
            title: String::new(),
            content: String::new(),
            tags: TagList::new(),
            cover_image: None,
            is_public: true,
        }
    }
}

impl Draft {
    /// Title and content must be non-empty after trimming.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut fields = Vec::new();
        if self.title.trim().is_empty() {
            fields.push(Field::Title);
        }
        if self.content.trim().is_empty() {
            fields.push(Field::Content);
        }
        if fields.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::MissingFields { fields })
        }
    }

    pub fn is_blank(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_draft_is_public_and_empty() {
        let draft = Draft::default();
        assert!(draft.is_public);
        assert!(draft.tags.is_empty());
        assert!(draft.is_blank());
    }

    #[test]
    fn test_whitespace_title_is_missing() {
        let draft = Draft {
            title: "   ".into(),
            content: "body".into(),
            ..Default::default()
        };
        assert_eq!(
            draft.validate(),
            Err(ValidationError::MissingFields {
                fields: vec![Field::Title]
            })
        );
    }

    #[test]
    fn test_both_missing() {
        let err = Draft::default().validate().unwrap_err();
        assert!(err.missing(Field::Title));
        assert!(err.missing(Field::Content));
    }
}
