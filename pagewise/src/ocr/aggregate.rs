use std::path::Path;

use serde::{Deserialize, Serialize};

use super::api::{DocumentType, OcrResponse};

/// Provenance tag stored in [`OcrOutput::filepath`].
pub const SOURCE_TAG: &str = "mistral_ocr";

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "webp", "tiff", "tif"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Document,
    Image,
}

impl MediaKind {
    /// Image when the MIME type starts with `image` or the file extension is a
    /// known raster format. The extension wins over a generic MIME type.
    pub fn classify(file_name: &str, mimetype: Option<&str>) -> Self {
        let mime_is_image = mimetype.is_some_and(|m| m.starts_with("image"));

        let extension_is_image = Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                IMAGE_EXTENSIONS
                    .iter()
                    .any(|known| known.eq_ignore_ascii_case(ext))
            });

        if mime_is_image || extension_is_image {
            MediaKind::Image
        } else {
            MediaKind::Document
        }
    }

    pub fn document_type(&self) -> DocumentType {
        match self {
            MediaKind::Document => DocumentType::DocumentUrl,
            MediaKind::Image => DocumentType::ImageUrl,
        }
    }
}

/// Merged OCR result handed back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct OcrOutput {
    pub filename: String,
    /// Approximate size: four times the character count of `text`.
    pub bytes: usize,
    /// Source tag identifying the OCR provider.
    pub filepath: String,
    pub text: String,
    /// Base64 payloads of embedded images, in reading order.
    pub images: Vec<String>,
}

pub fn aggregate(response: &OcrResponse, filename: &str) -> OcrOutput {
    let multi_page = response.pages.len() > 1;
    let mut text = String::new();
    let mut images = Vec::new();

    for (index, page) in response.pages.iter().enumerate() {
        if multi_page {
            text.push_str(&format!("# PAGE {}\n", index + 1));
        }
        text.push_str(&page.markdown);
        text.push_str("\n\n");

        images.extend(
            page.images
                .iter()
                .filter_map(|image| image.image_base64.as_deref())
                .filter(|data| !data.is_empty())
                .map(str::to_string),
        );
    }

    OcrOutput {
        filename: filename.to_string(),
        bytes: text.chars().count() * 4,
        filepath: SOURCE_TAG.to_string(),
        text,
        images,
    }
}
