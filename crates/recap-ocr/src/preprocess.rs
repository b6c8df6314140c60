use image::{DynamicImage, GrayImage, Luma};

use crate::CaptureArtifact;

/// Sharpen kernel: centre weight, uniform neighbour weight and divisor
const SHARPEN_CENTRE: i32 = 32;
const SHARPEN_NEIGHBOUR: i32 = -2;
const SHARPEN_DIVISOR: i32 = 16;

#[derive(Debug, thiserror::Error)]
pub enum PreprocessError {
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("preprocess task failed: {0}")]
    Join(String),
}

/// Grayscale, contrast boost and sharpen pass that helps OCR on screen text
#[derive(Debug, Clone)]
pub struct ImagePreprocessor {
    contrast: f32,
}

impl Default for ImagePreprocessor {
    fn default() -> Self {
        Self { contrast: 2.0 }
    }
}

impl ImagePreprocessor {
    pub fn new(contrast: f32) -> Self {
        Self { contrast }
    }

    pub fn process(&self, image: DynamicImage) -> GrayImage {
        let mut gray = image.to_luma8();
        enhance_contrast(&mut gray, self.contrast);
        sharpen(&gray)
    }

    /// Write the processed image next to `source`; the result cleans itself up on drop
    pub async fn preprocess(
        &self,
        source: &CaptureArtifact,
    ) -> Result<CaptureArtifact, PreprocessError> {
        let output = source.derive("preprocessed");

        let this = self.clone();
        let src = source.path().to_path_buf();
        let dst = output.path().to_path_buf();
        tokio::task::spawn_blocking(move || {
            let image = image::open(&src)?;
            this.process(image).save(&dst)?;
            Ok::<_, PreprocessError>(())
        })
        .await
        .map_err(|e| PreprocessError::Join(e.to_string()))??;

        Ok(output)
    }
}

/// Scale every pixel's distance from the image mean by `factor`
fn enhance_contrast(image: &mut GrayImage, factor: f32) {
    let count = u64::from(image.width()) * u64::from(image.height());
    if count == 0 {
        return;
    }

    let total: u64 = image.pixels().map(|p| u64::from(p.0[0])).sum();
    let mean = (total as f32 / count as f32).round();

    for pixel in image.pixels_mut() {
        let value = mean + factor * (f32::from(pixel.0[0]) - mean);
        pixel.0[0] = value.round().clamp(0.0, 255.0) as u8;
    }
}

/// 3x3 sharpen; neighbours outside the image repeat the edge pixel
fn sharpen(image: &GrayImage) -> GrayImage {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return image.clone();
    }

    let at = |x: i64, y: i64| -> i32 {
        let x = x.clamp(0, i64::from(width) - 1) as u32;
        let y = y.clamp(0, i64::from(height) - 1) as u32;
        i32::from(image.get_pixel(x, y).0[0])
    };

    GrayImage::from_fn(width, height, |x, y| {
        let (x, y) = (i64::from(x), i64::from(y));
        let mut acc = SHARPEN_CENTRE * at(x, y);
        for dy in -1..=1 {
            for dx in -1..=1 {
                if dx != 0 || dy != 0 {
                    acc += SHARPEN_NEIGHBOUR * at(x + dx, y + dy);
                }
            }
        }
        Luma([(acc / SHARPEN_DIVISOR).clamp(0, 255) as u8])
    })
}
