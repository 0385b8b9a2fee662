// src/services/image_processor.rs
use crate::errors::CarscanError;
use image::codecs::jpeg::JpegEncoder;
use image::metadata::Orientation;
use image::{DynamicImage, GenericImageView, ImageDecoder, ImageFormat, ImageReader};
use log::debug;
use std::io::Cursor;

/// Quality used when a capture has to be re-encoded.
pub const JPEG_QUALITY: u8 = 80;

/// A decoded capture with its EXIF orientation already applied to the pixels.
struct Capture {
    image: DynamicImage,
    format: Option<ImageFormat>,
    reoriented: bool,
}

pub struct ImageProcessor;

impl ImageProcessor {
    pub fn new() -> Self {
        Self
    }

    /// Returns the JPEG bytes to upload. An upright JPEG that already fits
    /// inside `max_dimension` goes out byte-for-byte. Everything else is
    /// rotated upright, scaled down if needed (keeping aspect ratio) and
    /// re-encoded, so the service always sees the frame the way it was shot.
    pub fn prepare_upload(&self, data: &[u8], max_dimension: u32) -> Result<Vec<u8>, CarscanError> {
        let capture = self.decode(data)?;
        let (width, height) = capture.image.dimensions();

        let fits = width <= max_dimension && height <= max_dimension;
        if capture.format == Some(ImageFormat::Jpeg) && fits && !capture.reoriented {
            return Ok(data.to_vec());
        }

        let img = if fits {
            capture.image
        } else {
            let ratio = max_dimension as f32 / width.max(height) as f32;
            let new_width = ((width as f32 * ratio) as u32).max(1);
            let new_height = ((height as f32 * ratio) as u32).max(1);
            debug!(
                "Downscaling capture from {}x{} to {}x{}",
                width, height, new_width, new_height
            );
            capture
                .image
                .resize(new_width, new_height, image::imageops::FilterType::Lanczos3)
        };

        self.encode_jpeg(&img)
    }

    fn decode(&self, data: &[u8]) -> Result<Capture, CarscanError> {
        if data.is_empty() {
            return Err(CarscanError::ImageProcessing("Image is empty".to_string()));
        }

        let invalid = |e: image::ImageError| {
            CarscanError::ImageProcessing(format!("Invalid image format: {}", e))
        };

        let reader = ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(|e| CarscanError::ImageProcessing(format!("Failed to read image: {}", e)))?;
        let format = reader.format();
        let mut decoder = reader.into_decoder().map_err(invalid)?;

        // Unreadable EXIF is treated like no EXIF.
        let orientation = decoder.orientation().unwrap_or(Orientation::NoTransforms);
        let mut image = DynamicImage::from_decoder(decoder).map_err(invalid)?;

        let reoriented = orientation != Orientation::NoTransforms;
        if reoriented {
            debug!("Applying EXIF orientation {:?}", orientation);
            image.apply_orientation(orientation);
        }

        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(CarscanError::ImageProcessing(
                "Image has zero width or height".to_string(),
            ));
        }

        Ok(Capture {
            image,
            format,
            reoriented,
        })
    }

    fn encode_jpeg(&self, img: &DynamicImage) -> Result<Vec<u8>, CarscanError> {
        let rgb = img.to_rgb8();
        let mut output = Vec::new();
        JpegEncoder::new_with_quality(&mut output, JPEG_QUALITY)
            .encode_image(&rgb)
            .map_err(|e| CarscanError::ImageProcessing(format!("Failed to encode JPEG: {}", e)))?;
        Ok(output)
    }
}

impl Default for ImageProcessor {
    fn default() -> Self {
        Self::new()
    }
}
