//! Drawing resolved text content onto the working image.

use ab_glyph::{FontVec, PxScale};
use image::{Rgba, RgbaImage};
use imageproc::drawing::draw_text_mut;
use rand::Rng;

use crate::content;
use crate::error::{ImprintError, ImprintResult};
use crate::model::TextSpec;

/// Font, size, and color shared by every overlay of a run.
#[derive(Debug)]
pub struct OverlayStyle {
    font: FontVec,
    scale: PxScale,
    color: Rgba<u8>,
}

impl OverlayStyle {
    pub fn from_bytes(bytes: Vec<u8>, size: f64, color: Rgba<u8>) -> ImprintResult<Self> {
        let font = FontVec::try_from_vec(bytes)
            .map_err(|_| ImprintError::config("font bytes are not a parsable font"))?;
        Ok(OverlayStyle {
            font,
            scale: PxScale::from(size as f32),
            color,
        })
    }

    /// Draw every non-ignored text onto `img`, resolving content through
    /// `rng`. The anchor is the top-left corner of the rendered line.
    pub fn draw_texts(
        &self,
        img: &mut RgbaImage,
        texts: &[TextSpec],
        rng: &mut impl Rng,
    ) -> ImprintResult<()> {
        for text in texts {
            if text.ignore {
                continue;
            }
            let line = content::resolve(text, rng)?;
            draw_text_mut(
                img,
                self.color,
                text.bounds.left as i32,
                text.bounds.top as i32,
                self.scale,
                &self.font,
                &line,
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn garbage_font_bytes_are_rejected() {
        let err = OverlayStyle::from_bytes(vec![0u8; 64], 16.0, Rgba([0, 0, 0, 255])).unwrap_err();
        assert!(err.to_string().contains("font"));
    }
}
