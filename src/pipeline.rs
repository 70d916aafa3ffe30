use image::RgbaImage;

use crate::error::ImprintResult;
use crate::ops::CompiledStep;

/// One output image with the filename suffix it will be written under.
#[derive(Clone, Debug)]
pub struct Variation {
    pub image: RgbaImage,
    pub suffix: String,
}

/// Run every compiled step against `base`: the untouched baseline comes
/// first, then one variation per step.
///
/// Steps are independent. Each starts from `base`, never from another
/// step's output; chaining is what the `combine` operation is for.
pub fn run_steps(base: &RgbaImage, steps: &[CompiledStep]) -> ImprintResult<Vec<Variation>> {
    let mut out = Vec::with_capacity(steps.len() + 1);
    out.push(Variation {
        image: base.clone(),
        suffix: String::new(),
    });
    for step in steps {
        out.push(Variation {
            image: step.op.apply(base)?,
            suffix: step.suffix.clone(),
        });
    }
    Ok(out)
}
