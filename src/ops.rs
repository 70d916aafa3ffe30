//! The operation registry: names, parameter payloads, and filename suffixes.
//!
//! Operations form a closed set. [`Registry::compile`] turns one
//! [`VariationStep`] document entry into a [`CompiledStep`] holding the
//! typed [`Operation`] and its final filename suffix, failing up front on
//! unknown names or malformed payloads.

use image::RgbaImage;

use crate::error::{ImprintError, ImprintResult};
use crate::filters;
use crate::model::VariationStep;

/// Every operation name the registry accepts, including `combine`.
pub const OPERATION_NAMES: &[&str] = &[
    "brightness",
    "contrast",
    "gamma",
    "hue",
    "saturation",
    "boxBlur",
    "gaussianBlur",
    "dilate",
    "edgeDetection",
    "emboss",
    "erode",
    "grayscale",
    "invert",
    "median",
    "sepia",
    "sharpen",
    "sobel",
    "unsharpMask",
    "threshold",
    "cropIn",
    "flipH",
    "flipV",
    "shearH",
    "shearV",
    "translate",
    "resize",
    "rotate",
    "combine",
];

/// Single scalar amount, shared by most adjustment and kernel operations.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Adjust {
    pub amount: f64,
}

/// Whole-degree shift for the hue rotation.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct HueShift {
    pub amount: i64,
}

/// Channel-range cutoff. Values outside `0..=255` fail to decode.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Level {
    pub amount: u8,
}

/// Blur radius plus sharpening strength.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Unsharp {
    pub amount: f64,
    pub amount2: f64,
}

/// Per-edge crop insets in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Insets {
    pub top: i64,
    pub left: i64,
    pub bottom: i64,
    pub right: i64,
}

/// Pixel offset for translation.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Offset {
    pub x: i64,
    pub y: i64,
}

/// Per-axis resize percentages.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Scale {
    pub percent_x: i64,
    pub percent_y: i64,
}

/// Rotation angle with optional canvas growth and pivot. The pivot applies
/// only when both coordinates are present.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Rotation {
    pub degrees: f64,
    pub resize_bounds: bool,
    pub pivot_x: Option<i64>,
    pub pivot_y: Option<i64>,
}

/// A fully decoded operation, ready to apply.
#[derive(Clone, Debug, PartialEq)]
pub enum Operation {
    Brightness(Adjust),
    Contrast(Adjust),
    Gamma(Adjust),
    Hue(HueShift),
    Saturation(Adjust),
    BoxBlur(Adjust),
    GaussianBlur(Adjust),
    Dilate(Adjust),
    EdgeDetection(Adjust),
    Emboss,
    Erode(Adjust),
    Grayscale,
    Invert,
    Median(Adjust),
    Sepia,
    Sharpen,
    Sobel,
    UnsharpMask(Unsharp),
    Threshold(Level),
    CropIn(Insets),
    FlipH,
    FlipV,
    ShearH(Adjust),
    ShearV(Adjust),
    Translate(Offset),
    Resize(Scale),
    Rotate(Rotation),
    /// Chain of operations applied in sequence to one image.
    Combine(Vec<Operation>),
}

/// One compiled entry of the variation document.
#[derive(Clone, Debug, PartialEq)]
pub struct CompiledStep {
    pub op: Operation,
    /// Final filename suffix: the document override when present (an empty
    /// override still wins), otherwise the operation's default.
    pub suffix: String,
}

/// Closed dispatch table over [`OPERATION_NAMES`].
#[derive(Clone, Copy, Debug, Default)]
pub struct Registry;

impl Registry {
    pub fn new() -> Self {
        Registry
    }

    pub fn contains(&self, name: &str) -> bool {
        OPERATION_NAMES.contains(&name)
    }

    /// Compile a whole variation document, failing on the first bad step.
    pub fn compile_batch(&self, steps: &[VariationStep]) -> ImprintResult<Vec<CompiledStep>> {
        steps
            .iter()
            .enumerate()
            .map(|(index, step)| self.compile(step, index))
            .collect()
    }

    /// Compile one step. `index` is the step's position in its document and
    /// is reported in errors.
    pub fn compile(&self, step: &VariationStep, index: usize) -> ImprintResult<CompiledStep> {
        let op = self.decode(&step.kind, &step.details, index)?;
        let suffix = step.suffix.clone().unwrap_or_else(|| op.default_suffix());
        Ok(CompiledStep { op, suffix })
    }

    fn decode(
        &self,
        kind: &str,
        details: &serde_json::Value,
        index: usize,
    ) -> ImprintResult<Operation> {
        let op = match kind {
            "brightness" => Operation::Brightness(decode_params("brightness", details)?),
            "contrast" => Operation::Contrast(decode_params("contrast", details)?),
            "gamma" => Operation::Gamma(decode_params("gamma", details)?),
            "hue" => Operation::Hue(decode_params("hue", details)?),
            "saturation" => Operation::Saturation(decode_params("saturation", details)?),
            "boxBlur" => Operation::BoxBlur(decode_params("boxBlur", details)?),
            "gaussianBlur" => Operation::GaussianBlur(decode_params("gaussianBlur", details)?),
            "dilate" => Operation::Dilate(decode_params("dilate", details)?),
            "edgeDetection" => Operation::EdgeDetection(decode_params("edgeDetection", details)?),
            "emboss" => Operation::Emboss,
            "erode" => Operation::Erode(decode_params("erode", details)?),
            "grayscale" => Operation::Grayscale,
            "invert" => Operation::Invert,
            "median" => Operation::Median(decode_params("median", details)?),
            "sepia" => Operation::Sepia,
            "sharpen" => Operation::Sharpen,
            "sobel" => Operation::Sobel,
            "unsharpMask" => Operation::UnsharpMask(decode_params("unsharpMask", details)?),
            "threshold" => Operation::Threshold(decode_params("threshold", details)?),
            "cropIn" => Operation::CropIn(decode_params("cropIn", details)?),
            "flipH" => Operation::FlipH,
            "flipV" => Operation::FlipV,
            "shearH" => Operation::ShearH(decode_params("shearH", details)?),
            "shearV" => Operation::ShearV(decode_params("shearV", details)?),
            "translate" => Operation::Translate(decode_params("translate", details)?),
            "resize" => Operation::Resize(decode_params("resize", details)?),
            "rotate" => Operation::Rotate(decode_params("rotate", details)?),
            "combine" => {
                let nested: Vec<VariationStep> = decode_params("combine", details)?;
                let ops = nested
                    .iter()
                    .enumerate()
                    .map(|(i, step)| Ok(self.compile(step, i)?.op))
                    .collect::<ImprintResult<Vec<_>>>()?;
                Operation::Combine(ops)
            }
            other => {
                return Err(ImprintError::UnknownOperation {
                    name: other.to_string(),
                    index,
                });
            }
        };
        Ok(op)
    }
}

/// Decode a parameter payload. An absent payload is fatal for every
/// operation that reaches this; missing fields inside a present payload
/// fall back to zero values.
fn decode_params<T: serde::de::DeserializeOwned>(
    op: &'static str,
    details: &serde_json::Value,
) -> ImprintResult<T> {
    if details.is_null() {
        return Err(ImprintError::params(op, "missing parameter payload"));
    }
    serde_json::from_value(details.clone()).map_err(|err| ImprintError::params(op, err))
}

impl Operation {
    /// The filename suffix used when the document carries no override.
    pub fn default_suffix(&self) -> String {
        match self {
            Operation::Brightness(p) => format!("brightness-{}", p.amount),
            // gamma has always shared the contrast adjustment and its suffix.
            Operation::Contrast(p) | Operation::Gamma(p) => format!("contrast-{}", p.amount),
            Operation::Hue(p) => format!("hue-{}", p.amount),
            Operation::Saturation(p) => format!("saturation-{}", p.amount),
            Operation::BoxBlur(p) => format!("boxBlur-{}", p.amount),
            Operation::GaussianBlur(p) => format!("gaussianBlur-{}", p.amount),
            Operation::Dilate(p) => format!("dilate-{}", p.amount),
            Operation::EdgeDetection(p) => format!("edgeDetection-{}", p.amount),
            Operation::Emboss => "emboss".to_string(),
            Operation::Erode(p) => format!("erode-{}", p.amount),
            Operation::Grayscale => "grayscale".to_string(),
            Operation::Invert => "invert".to_string(),
            Operation::Median(p) => format!("median-{}", p.amount),
            Operation::Sepia => "sepia".to_string(),
            Operation::Sharpen => "sharpen".to_string(),
            Operation::Sobel => "sobel".to_string(),
            Operation::UnsharpMask(p) => format!("unsharpMask-{}-{}", p.amount, p.amount2),
            Operation::Threshold(p) => format!("threshold-{}", p.amount),
            Operation::CropIn(p) => {
                format!("cropIn-{}-{}-{}-{}", p.left, p.top, p.bottom, p.right)
            }
            Operation::FlipH => "flipH".to_string(),
            Operation::FlipV => "flipV".to_string(),
            Operation::ShearH(p) => format!("shearH-{}", p.amount),
            // Kept under its historical name so existing output sets line up.
            Operation::ShearV(p) => format!("shearY-{}", p.amount),
            Operation::Translate(p) => format!("translate-{}-{}", p.x, p.y),
            Operation::Resize(p) => format!("resize-{}-{}", p.percent_x, p.percent_y),
            Operation::Rotate(p) => format!("rotate-{}", p.degrees as i64),
            Operation::Combine(_) => "combine".to_string(),
        }
    }

    /// Apply the operation to an image, returning the transformed copy.
    pub fn apply(&self, img: &RgbaImage) -> ImprintResult<RgbaImage> {
        let out = match self {
            Operation::Brightness(p) => filters::brightness(img, p.amount),
            Operation::Contrast(p) | Operation::Gamma(p) => filters::contrast(img, p.amount),
            Operation::Hue(p) => filters::hue_rotate(img, p.amount),
            Operation::Saturation(p) => filters::saturation(img, p.amount),
            Operation::BoxBlur(p) => filters::box_blur(img, p.amount),
            Operation::GaussianBlur(p) => filters::gaussian_blur(img, p.amount),
            Operation::Dilate(p) => filters::dilate(img, p.amount),
            Operation::EdgeDetection(p) => filters::edge_detect(img, p.amount),
            Operation::Emboss => filters::emboss(img),
            Operation::Erode(p) => filters::erode(img, p.amount),
            Operation::Grayscale => filters::grayscale(img),
            Operation::Invert => filters::invert(img),
            Operation::Median(p) => filters::median(img, p.amount),
            Operation::Sepia => filters::sepia(img),
            Operation::Sharpen => filters::sharpen(img),
            Operation::Sobel => filters::sobel(img),
            Operation::UnsharpMask(p) => filters::unsharp_mask(img, p.amount, p.amount2),
            Operation::Threshold(p) => filters::threshold(img, p.amount),
            Operation::CropIn(p) => filters::crop_in(img, p.left, p.top, p.right, p.bottom),
            Operation::FlipH => filters::flip_h(img),
            Operation::FlipV => filters::flip_v(img),
            Operation::ShearH(p) => filters::shear_h(img, p.amount)?,
            Operation::ShearV(p) => filters::shear_v(img, p.amount)?,
            Operation::Translate(p) => filters::translate(img, p.x, p.y),
            Operation::Resize(p) => filters::resize_percent(img, p.percent_x, p.percent_y),
            Operation::Rotate(p) => {
                let pivot = match (p.pivot_x, p.pivot_y) {
                    (Some(x), Some(y)) => Some((x, y)),
                    _ => None,
                };
                filters::rotate(img, p.degrees, p.resize_bounds, pivot)
            }
            Operation::Combine(ops) => {
                let mut current = img.clone();
                for op in ops {
                    current = op.apply(&current)?;
                }
                current
            }
        };
        Ok(out)
    }
}
