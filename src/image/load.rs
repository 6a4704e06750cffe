//! Image loading utilities.

use std::fs;
use std::io::Cursor;
use std::path::Path;

use image::{DynamicImage, GenericImageView, ImageError, ImageFormat, ImageReader};
use ndarray::{Array3, Array4};

use crate::error::{Error, Result};

use super::{ImageTensor, MaskTensor, RGB_CHANNELS};

/// A decoded frame and whether its source stores a real alpha channel.
struct Decoded {
    image: DynamicImage,
    alpha: bool,
}

/// Load an image from disk and convert it to an image tensor and a mask.
///
/// The image is:
/// 1. Decoded from the specified path, with the format sniffed from its content
///    (first frame only for animations)
/// 2. Converted to 8-bit RGB
/// 3. Normalized to [0, 1] and returned as an NHWC tensor (1, H, W, 3)
///
/// The mask is the alpha channel normalized to [0, 1] when the source has an alpha
/// channel of its own, otherwise all ones. Palette transparency (GIF, indexed PNG)
/// and PNG `tRNS` colour keys do not count. Either way its shape is (1, H, W).
///
/// # Errors
///
/// Returns an error if the image cannot be read or decoded.
pub fn load_image<P: AsRef<Path>>(path: P) -> Result<(ImageTensor, MaskTensor)> {
    let path = path.as_ref();

    let decoded = decode(path).map_err(|source| Error::ImageLoad {
        path: path.to_path_buf(),
        source,
    })?;

    let (width, height) = decoded.image.dimensions();
    tracing::debug!(
        "Decoded {} ({width}x{height}, {:?}, alpha channel: {})",
        path.display(),
        decoded.image.color(),
        decoded.alpha
    );

    let tensor = image_to_tensor(&decoded.image)?;
    let mask = image_to_mask(&decoded.image, decoded.alpha)?;

    Ok((tensor, mask))
}

fn decode(path: &Path) -> std::result::Result<Decoded, ImageError> {
    let bytes = fs::read(path)?;

    let reader = ImageReader::new(Cursor::new(bytes.as_slice())).with_guessed_format()?;
    let format = reader.format();
    let image = reader.decode()?;

    let alpha = match format {
        // Decoded as RGBA, but the source only has palette transparency.
        Some(ImageFormat::Gif) => false,
        Some(ImageFormat::Png) => png_has_alpha_channel(&bytes),
        _ => image.color().has_alpha(),
    };

    Ok(Decoded { image, alpha })
}

/// Whether the PNG header declares a grayscale+alpha or RGBA colour type.
fn png_has_alpha_channel(bytes: &[u8]) -> bool {
    match png::Decoder::new(Cursor::new(bytes)).read_info() {
        Ok(reader) => matches!(
            reader.info().color_type,
            png::ColorType::GrayscaleAlpha | png::ColorType::Rgba
        ),
        Err(err) => {
            tracing::debug!("Could not read PNG header: {err}");
            false
        }
    }
}

/// Convert a `DynamicImage` to a normalized NHWC tensor.
fn image_to_tensor(img: &DynamicImage) -> Result<ImageTensor> {
    let rgb = img.to_rgb8();
    let (width, height) = (rgb.width() as usize, rgb.height() as usize);

    // RgbImage stores pixels row-major with interleaved channels, i.e. HWC.
    let data: Vec<f32> = rgb.as_raw().iter().map(|&v| normalize(v)).collect();

    Array4::from_shape_vec((1, height, width, RGB_CHANNELS), data).map_err(|err| {
        Error::ShapeMismatch {
            expected: format!("(1, {height}, {width}, {RGB_CHANNELS})"),
            actual: err.to_string(),
        }
    })
}

/// Build the mask from the alpha channel, or a fully opaque one if there is none.
fn image_to_mask(img: &DynamicImage, alpha: bool) -> Result<MaskTensor> {
    let (width, height) = (img.width() as usize, img.height() as usize);

    if !alpha {
        return Ok(Array3::ones((1, height, width)));
    }

    let alpha: Vec<f32> = img.to_rgba8().pixels().map(|p| normalize(p[3])).collect();

    Array3::from_shape_vec((1, height, width), alpha).map_err(|err| Error::ShapeMismatch {
        expected: format!("(1, {height}, {width})"),
        actual: err.to_string(),
    })
}

/// Normalize a channel value from [0, 255] to [0, 1].
#[inline]
fn normalize(value: u8) -> f32 {
    f32::from(value) / 255.0
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs::File;
    use std::io::BufWriter;

    use image::codecs::gif::GifEncoder;
    use image::{Frame, LumaA, Rgb, RgbImage, Rgba, RgbaImage};
    use tempfile::TempDir;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-6
    }

    fn write_gif(path: &Path, frames: Vec<RgbaImage>) {
        let mut encoder = GifEncoder::new(File::create(path).unwrap());
        encoder
            .encode_frames(frames.into_iter().map(Frame::new))
            .unwrap();
    }

    #[test]
    fn test_tensor_shape_and_layout() {
        let mut rgb = RgbImage::new(4, 2);
        rgb.put_pixel(3, 1, Rgb([255, 0, 51]));
        let tensor = image_to_tensor(&DynamicImage::ImageRgb8(rgb)).unwrap();

        assert_eq!(tensor.shape(), &[1, 2, 4, 3]);
        assert!(close(tensor[[0, 1, 3, 0]], 1.0));
        assert!(close(tensor[[0, 1, 3, 1]], 0.0));
        assert!(close(tensor[[0, 1, 3, 2]], 0.2));
        assert!(close(tensor[[0, 0, 0, 0]], 0.0));
    }

    #[test]
    fn test_normalization_range() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 8, Rgb([255, 255, 255])));
        let tensor = image_to_tensor(&img).unwrap();

        let min = tensor.iter().copied().fold(f32::INFINITY, f32::min);
        let max = tensor.iter().copied().fold(f32::NEG_INFINITY, f32::max);

        assert!(close(min, 1.0));
        assert!(close(max, 1.0));
    }

    #[test]
    fn test_mask_without_alpha_is_opaque() {
        let img = DynamicImage::new_rgb8(5, 3);
        let mask = image_to_mask(&img, false).unwrap();

        assert_eq!(mask.shape(), &[1, 3, 5]);
        assert!(mask.iter().all(|&v| close(v, 1.0)));
    }

    #[test]
    fn test_mask_follows_alpha() {
        let mut rgba = RgbaImage::from_pixel(3, 2, Rgba([10, 20, 30, 255]));
        rgba.put_pixel(0, 0, Rgba([10, 20, 30, 0]));
        rgba.put_pixel(2, 1, Rgba([10, 20, 30, 102]));
        let img = DynamicImage::ImageRgba8(rgba);

        let mask = image_to_mask(&img, true).unwrap();
        assert_eq!(mask.shape(), &[1, 2, 3]);
        assert!(close(mask[[0, 0, 0]], 0.0));
        assert!(close(mask[[0, 1, 2]], 0.4));
        assert!(close(mask[[0, 0, 1]], 1.0));

        // Colour survives regardless of alpha.
        let tensor = image_to_tensor(&img).unwrap();
        assert!(close(tensor[[0, 0, 0, 2]], 30.0 / 255.0));
    }

    #[test]
    fn test_grayscale_alpha_mask() {
        let mut la = image::GrayAlphaImage::from_pixel(2, 2, LumaA([128, 255]));
        la.put_pixel(1, 1, LumaA([128, 51]));
        let img = DynamicImage::ImageLumaA8(la);

        let tensor = image_to_tensor(&img).unwrap();
        assert_eq!(tensor.shape(), &[1, 2, 2, 3]);
        assert!(close(tensor[[0, 0, 0, 0]], tensor[[0, 0, 0, 2]]));

        let mask = image_to_mask(&img, true).unwrap();
        assert!(close(mask[[0, 1, 1]], 0.2));
        assert!(close(mask[[0, 0, 0]], 1.0));
    }

    #[test]
    fn test_load_sniffs_format_from_content() {
        let tmp = TempDir::new().unwrap();
        // PNG bytes behind a .jpg name.
        let path = tmp.path().join("mislabelled.jpg");
        RgbaImage::from_pixel(6, 4, Rgba([0, 255, 0, 0]))
            .save_with_format(&path, ImageFormat::Png)
            .unwrap();

        let (tensor, mask) = load_image(&path).unwrap();
        assert_eq!(tensor.shape(), &[1, 4, 6, 3]);
        assert_eq!(mask.shape(), &[1, 4, 6]);
        assert!(close(tensor[[0, 2, 3, 1]], 1.0));
        assert!(mask.iter().all(|&v| close(v, 0.0)));
    }

    #[test]
    fn test_load_corrupt_file_fails() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("broken.png");
        std::fs::write(&path, b"definitely not a png").unwrap();

        assert!(matches!(
            load_image(&path),
            Err(Error::ImageLoad { .. })
        ));
    }

    #[test]
    fn test_load_missing_file_fails() {
        let tmp = TempDir::new().unwrap();
        assert!(matches!(
            load_image(tmp.path().join("absent.png")),
            Err(Error::ImageLoad { .. })
        ));
    }

    #[test]
    fn test_gif_transparency_keeps_mask_opaque() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("sprite.gif");
        let mut frame = RgbaImage::from_pixel(2, 2, Rgba([200, 40, 40, 255]));
        frame.put_pixel(0, 0, Rgba([0, 0, 0, 0]));
        write_gif(&path, vec![frame]);

        let (tensor, mask) = load_image(&path).unwrap();
        assert_eq!(tensor.shape(), &[1, 2, 2, 3]);
        assert_eq!(mask.shape(), &[1, 2, 2]);
        assert!(mask.iter().all(|&v| close(v, 1.0)));
    }

    #[test]
    fn test_indexed_png_with_trns_keeps_mask_opaque() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("indexed.png");
        {
            let file = BufWriter::new(File::create(&path).unwrap());
            let mut encoder = png::Encoder::new(file, 2, 1);
            encoder.set_color(png::ColorType::Indexed);
            encoder.set_depth(png::BitDepth::Eight);
            encoder.set_palette(vec![255, 0, 0, 0, 0, 255]);
            encoder.set_trns(vec![0, 255]);
            let mut writer = encoder.write_header().unwrap();
            writer.write_image_data(&[0, 1]).unwrap();
            writer.finish().unwrap();
        }

        let (tensor, mask) = load_image(&path).unwrap();
        assert_eq!(mask.shape(), &[1, 1, 2]);
        assert!(mask.iter().all(|&v| close(v, 1.0)));
        assert!(close(tensor[[0, 0, 0, 0]], 1.0));
        assert!(close(tensor[[0, 0, 1, 2]], 1.0));
    }

    #[test]
    fn test_grayscale_alpha_png_uses_alpha() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("la.png");
        let mut la = image::GrayAlphaImage::from_pixel(2, 1, LumaA([90, 255]));
        la.put_pixel(1, 0, LumaA([90, 0]));
        la.save(&path).unwrap();

        let (_, mask) = load_image(&path).unwrap();
        assert!(close(mask[[0, 0, 0]], 1.0));
        assert!(close(mask[[0, 0, 1]], 0.0));
    }

    #[test]
    fn test_animated_gif_loads_first_frame() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("anim.gif");
        write_gif(
            &path,
            vec![
                RgbaImage::from_pixel(3, 3, Rgba([255, 0, 0, 255])),
                RgbaImage::from_pixel(3, 3, Rgba([0, 0, 255, 255])),
            ],
        );

        let (tensor, _) = load_image(&path).unwrap();
        assert_eq!(tensor.shape(), &[1, 3, 3, 3]);
        assert!(close(tensor[[0, 1, 1, 0]], 1.0));
        assert!(close(tensor[[0, 1, 1, 2]], 0.0));
    }
}
