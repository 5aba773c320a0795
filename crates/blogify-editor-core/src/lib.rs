//! Authoring logic for blogify posts.
//!
//! Everything here is synchronous and owns its state; talking to the backend
//! is left to the application crate.

pub mod composer;
pub mod draft;
pub mod fields;
pub mod image;
pub mod normalize;
pub mod tags;

pub use composer::Composer;
pub use draft::Draft;
pub use fields::FieldErrors;
pub use image::{
    ALLOWED_IMAGE_TYPES, ClipboardItem, CoverImage, ImageFile, ImageSource, MAX_IMAGE_BYTES,
};
pub use normalize::to_plain_text;
pub use tags::{TagInput, TagList};
