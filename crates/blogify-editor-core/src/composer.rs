//! Form state for creating a post.
//!
//! [`Composer`] owns the [`Draft`] together with everything the form shows
//! around it: field messages, the tag input buffer and the submitting flag.
//! The publish workflow borrows it mutably for the whole attempt.

use blogify_common::{Field, ImageError, ValidationError};

use crate::draft::Draft;
use crate::fields::FieldErrors;
use crate::image::{self, ClipboardItem, CoverImage, ImageFile};
use crate::tags::TagInput;

#[derive(Debug, Clone, Default)]
pub struct Composer {
    draft: Draft,
    errors: FieldErrors,
    tag_input: TagInput,
    submitting: bool,
}

impl Composer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn tag_input(&self) -> &str {
        self.tag_input.value()
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.draft.title = title.into();
    }

    pub fn set_content(&mut self, content: impl Into<String>) {
        self.draft.content = content.into();
    }

    pub fn set_tag_input(&mut self, text: impl Into<String>) {
        self.tag_input.set(text);
    }

    /// Commit the tag input buffer.
    pub fn add_tag(&mut self) -> bool {
        self.tag_input.commit(&mut self.draft.tags)
    }

    pub fn remove_tag(&mut self, tag: &str) -> bool {
        self.draft.tags.remove(tag)
    }

    pub fn toggle_visibility(&mut self) -> bool {
        self.draft.is_public = !self.draft.is_public;
        self.draft.is_public
    }

    /// Accept a picked file as the cover image.
    ///
    /// On rejection the current cover stays and the image message is set.
    pub fn attach_image(&mut self, file: ImageFile) -> Result<(), ImageError> {
        let result = image::intake(file);
        self.apply_image(result)
    }

    /// Handle a paste. Returns `Ok(false)` when the paste had no image item.
    pub fn paste_image(
        &mut self,
        items: impl IntoIterator<Item = ClipboardItem>,
    ) -> Result<bool, ImageError> {
        match image::from_clipboard(items) {
            Some(result) => self.apply_image(result).map(|()| true),
            None => Ok(false),
        }
    }

    fn apply_image(&mut self, result: Result<CoverImage, ImageError>) -> Result<(), ImageError> {
        match result {
            Ok(cover) => {
                tracing::debug!(bytes = cover.len(), mime_type = %cover.mime_type, "cover image accepted");
                self.draft.cover_image = Some(cover);
                self.errors.clear(Field::Image);
                Ok(())
            }
            Err(err) => {
                self.errors.record_image(&err);
                Err(err)
            }
        }
    }

    pub fn clear_cover_image(&mut self) {
        self.draft.cover_image = None;
        self.errors.clear(Field::Image);
    }

    /// Validate the draft and refresh the title and content messages.
    pub fn validate(&mut self) -> Result<(), ValidationError> {
        let result = self.draft.validate();
        self.errors.record_validation(&result);
        result
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn set_submitting(&mut self, submitting: bool) {
        self.submitting = submitting;
    }

    /// Start over with an empty draft.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
