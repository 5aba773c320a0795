//! Cover image intake from the file picker or a clipboard paste.

use base64::{Engine, engine::general_purpose::STANDARD};
use blogify_common::ImageError;
use bytes::Bytes;
use mime_sniffer::MimeTypeSniffer;
use smol_str::SmolStr;

/// 5 MiB.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Declared types accepted for a cover image.
pub const ALLOWED_IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png", "image/jpg"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSource {
    FilePicker,
    Clipboard,
}

/// A file as handed over by the picker.
#[derive(Debug, Clone)]
pub struct ImageFile {
    pub name: String,
    /// MIME type declared by the browser for the file
    pub mime_type: SmolStr,
    pub data: Bytes,
}

/// One entry of a paste event.
#[derive(Debug, Clone)]
pub struct ClipboardItem {
    pub mime_type: SmolStr,
    pub data: Bytes,
}

/// An accepted cover image, held in memory until publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverImage {
    pub name: Option<String>,
    /// Declared type, used as the upload content type
    pub mime_type: SmolStr,
    pub data: Bytes,
    pub source: ImageSource,
}

impl CoverImage {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Preview URL for the editor.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, STANDARD.encode(&self.data))
    }
}

/// Check a picked file and turn it into a cover image.
///
/// Declared type is checked before size. The bytes must also sniff as an
/// image, otherwise the browser would fail to load the preview.
pub fn intake(file: ImageFile) -> Result<CoverImage, ImageError> {
    accept(Some(file.name), file.mime_type, file.data, ImageSource::FilePicker)
}

/// Take the first image item of a paste. `None` if the paste carried no image.
pub fn from_clipboard(
    items: impl IntoIterator<Item = ClipboardItem>,
) -> Option<Result<CoverImage, ImageError>> {
    let item = items
        .into_iter()
        .find(|item| item.mime_type.contains("image"))?;
    Some(accept(None, item.mime_type, item.data, ImageSource::Clipboard))
}

fn accept(
    name: Option<String>,
    mime_type: SmolStr,
    data: Bytes,
    source: ImageSource,
) -> Result<CoverImage, ImageError> {
    let declared = mime_type.to_ascii_lowercase();
    if !ALLOWED_IMAGE_TYPES.contains(&declared.as_str()) {
        tracing::debug!(%mime_type, "rejected image type");
        return Err(ImageError::InvalidImageType { mime_type });
    }

    if data.len() > MAX_IMAGE_BYTES {
        tracing::debug!(size = data.len(), "rejected oversized image");
        return Err(ImageError::ImageTooLarge {
            size: data.len(),
            max: MAX_IMAGE_BYTES,
        });
    }

    match data.sniff_mime_type() {
        Some(sniffed) if sniffed.starts_with("image/") => {}
        sniffed => {
            tracing::debug!(?sniffed, declared = %mime_type, "image bytes did not sniff as an image");
            return Err(ImageError::Undecodable);
        }
    }

    Ok(CoverImage {
        name,
        mime_type: SmolStr::new(declared),
        data,
        source,
    })
}
