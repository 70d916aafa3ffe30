use crate::error::{ImprintError, ImprintResult};

/// Batch configuration document. One per run, immutable once parsed.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct BatchSpec {
    pub source_img: String,
    pub out_folder: String,
    pub font_path: String,
    pub font_size: f64,
    pub out_file_prefix: String,
    /// Overlay color as `"r,g,b,a"`. Opaque black when omitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rgba: Option<String>,
    pub texts: Vec<TextSpec>,
}

/// One text overlay. `content_type` selects which payload is read.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct TextSpec {
    pub content_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixed: Option<FixedContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_file: Option<FromFileContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_regex: Option<FromRegexContent>,
    /// Kept in the document but skipped at draw time.
    pub ignore: bool,
    // The wire key for bounds has always been lowercase.
    #[serde(rename = "bounds")]
    pub bounds: Bounds,
    /// Comma-separated transform tags, applied in order.
    pub text_transform: String,
}

#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct FixedContent {
    pub content: String,
}

#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct FromFileContent {
    pub file_path: String,
}

#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct FromRegexContent {
    pub pattern: String,
}

/// Draw position in pixel coordinates.
#[derive(Clone, Copy, Debug, Default, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Bounds {
    pub left: f64,
    pub top: f64,
}

/// One entry of the variation document: an operation name, an optional
/// filename suffix override, and an operation-specific parameter payload.
///
/// `suffix` distinguishes "absent" from "explicitly empty": `Some(String::new())`
/// still overrides the computed default.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct VariationStep {
    #[serde(rename = "Type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
    #[serde(skip_serializing_if = "serde_json::Value::is_null")]
    pub details: serde_json::Value,
}

impl BatchSpec {
    pub fn validate(&self) -> ImprintResult<()> {
        if self.source_img.trim().is_empty() {
            return Err(ImprintError::config("SourceImg must be a non-empty path"));
        }
        if self.out_folder.trim().is_empty() {
            return Err(ImprintError::config("OutFolder must be a non-empty path"));
        }

        if self.texts.iter().any(|t| !t.ignore) {
            if self.font_path.trim().is_empty() {
                return Err(ImprintError::config(
                    "FontPath must be a non-empty path when texts are drawn",
                ));
            }
            if !self.font_size.is_finite() || self.font_size <= 0.0 {
                return Err(ImprintError::config(
                    "FontSize must be finite and > 0 when texts are drawn",
                ));
            }
        }

        Ok(())
    }
}

/// Parse the shared overlay color.
///
/// `None` means the field was omitted and selects opaque black. A present
/// string needs at least four comma-separated integers; components clamp
/// to `0..=255`, extra components are ignored.
pub fn parse_rgba(raw: Option<&str>) -> ImprintResult<image::Rgba<u8>> {
    let Some(s) = raw else {
        return Ok(image::Rgba([0, 0, 0, 255]));
    };

    let parts: Vec<&str> = s.split(',').collect();
    if parts.len() < 4 {
        return Err(ImprintError::config(format!(
            "overlay color '{s}' must be \"r,g,b,a\" with four integer components"
        )));
    }

    let mut channels = [0u8; 4];
    for (slot, part) in channels.iter_mut().zip(&parts) {
        let value: i64 = part.parse().map_err(|_| {
            ImprintError::config(format!("overlay color component '{part}' is not an integer"))
        })?;
        *slot = value.clamp(0, 255) as u8;
    }
    Ok(image::Rgba(channels))
}
