//! Image decoding and conversion to host tensors.

mod load;

pub use load::load_image;

use ndarray::{Array3, Array4};

/// Image tensor in NHWC format (batch, height, width, channels).
/// Values are normalized to [0, 1].
pub type ImageTensor = Array4<f32>;

/// Mask tensor in NHW format (batch, height, width).
/// 1.0 is fully opaque, 0.0 fully transparent.
pub type MaskTensor = Array3<f32>;

/// Number of channels in RGB images.
pub const RGB_CHANNELS: usize = 3;

/// Tensors handed out when no image can be produced: a single black pixel
/// with a fully opaque mask.
#[must_use]
pub fn placeholder() -> (ImageTensor, MaskTensor) {
    (
        Array4::zeros((1, 1, 1, RGB_CHANNELS)),
        Array3::ones((1, 1, 1)),
    )
}
