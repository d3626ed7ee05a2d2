//! Validation and letterboxing of uploaded photos.
//!
//! An upload is checked for type and size before anything is decoded, then
//! decoded, checked for minimum dimensions and placed on a square white canvas
//! with its aspect ratio preserved.

use image::imageops::{self, FilterType};
use image::{DynamicImage, GenericImageView, ImageFormat, Rgba, RgbaImage, RgbImage};
use std::path::Path;

use crate::config::PreprocessConfig;
use crate::error::IdentifyError;

/// Declared media type of an upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaType {
    Jpeg,
    Png,
    Webp,
    /// Anything else, keeping what was declared for the error message.
    Unsupported(String),
}

impl MediaType {
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => MediaType::Jpeg,
            "png" => MediaType::Png,
            "webp" => MediaType::Webp,
            other => MediaType::Unsupported(other.to_string()),
        }
    }

    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) => Self::from_extension(ext),
            None => MediaType::Unsupported("no extension".to_string()),
        }
    }

    fn image_format(&self) -> Option<ImageFormat> {
        match self {
            MediaType::Jpeg => Some(ImageFormat::Jpeg),
            MediaType::Png => Some(ImageFormat::Png),
            MediaType::Webp => Some(ImageFormat::WebP),
            MediaType::Unsupported(_) => None,
        }
    }
}

/// Raw upload as selected by the user.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub bytes: Vec<u8>,
    pub media_type: MediaType,
    pub size: u64,
}

impl UploadedImage {
    pub fn new(bytes: Vec<u8>, media_type: MediaType) -> Self {
        let size = bytes.len() as u64;
        Self {
            bytes,
            media_type,
            size,
        }
    }

    /// Describe a file from its extension and metadata. Nothing is read yet,
    /// so [`Preprocessor::validate`] can reject it cheaply.
    pub fn probe(path: &Path) -> Result<Self, IdentifyError> {
        let size = std::fs::metadata(path)
            .map_err(|e| unreadable(path, e))?
            .len();
        Ok(Self {
            bytes: Vec::new(),
            media_type: MediaType::from_path(path),
            size,
        })
    }

    /// Load the contents of a probed file.
    pub fn read_bytes(&mut self, path: &Path) -> Result<(), IdentifyError> {
        self.bytes = std::fs::read(path).map_err(|e| unreadable(path, e))?;
        self.size = self.bytes.len() as u64;
        Ok(())
    }
}

fn unreadable(path: &Path, e: std::io::Error) -> IdentifyError {
    IdentifyError::DecodeFailure(format!("{}: {}", path.display(), e))
}

/// Letterboxed classifier input.
#[derive(Debug, Clone)]
pub struct PreparedImage {
    pub pixels: RgbImage,
    /// Size of the scaled source inside the canvas.
    pub content_width: u32,
    pub content_height: u32,
    pub offset_x: u32,
    pub offset_y: u32,
    pub scale: f32,
}

impl PreparedImage {
    pub fn size(&self) -> u32 {
        self.pixels.width()
    }
}

pub struct Preprocessor {
    max_bytes: u64,
    min_dimension: u32,
    canvas_size: u32,
}

impl Preprocessor {
    pub fn new(config: &PreprocessConfig) -> Self {
        Self {
            max_bytes: config.max_bytes,
            min_dimension: config.min_dimension,
            canvas_size: config.canvas_size,
        }
    }

    /// Cheap checks that need no decoding.
    pub fn validate(&self, upload: &UploadedImage) -> Result<(), IdentifyError> {
        if let MediaType::Unsupported(ref declared) = upload.media_type {
            return Err(IdentifyError::UnsupportedType(declared.clone()));
        }

        if upload.size > self.max_bytes {
            return Err(IdentifyError::ImageTooLarge {
                size: upload.size,
                max: self.max_bytes,
            });
        }

        Ok(())
    }

    /// Decode and letterbox onto a white `canvas_size`² canvas.
    pub fn prepare(&self, upload: &UploadedImage) -> Result<PreparedImage, IdentifyError> {
        let format = upload
            .media_type
            .image_format()
            .ok_or_else(|| IdentifyError::UnsupportedType(format!("{:?}", upload.media_type)))?;

        let decoded = image::load_from_memory_with_format(&upload.bytes, format)
            .map_err(|e| IdentifyError::DecodeFailure(e.to_string()))?;

        self.letterbox(&decoded)
    }

    fn letterbox(&self, img: &DynamicImage) -> Result<PreparedImage, IdentifyError> {
        let (width, height) = img.dimensions();
        if width < self.min_dimension || height < self.min_dimension {
            return Err(IdentifyError::TooSmallImage {
                width,
                height,
                min: self.min_dimension,
            });
        }

        let size = self.canvas_size;
        let scale = (size as f32 / width as f32).min(size as f32 / height as f32);
        let content_width = ((width as f32 * scale).round() as u32).clamp(1, size);
        let content_height = ((height as f32 * scale).round() as u32).clamp(1, size);

        let scaled = img
            .resize_exact(content_width, content_height, FilterType::Triangle)
            .to_rgba8();

        let offset_x = (size - content_width) / 2;
        let offset_y = (size - content_height) / 2;

        // Alpha is composited onto the white padding colour.
        let mut canvas = RgbaImage::from_pixel(size, size, Rgba([255, 255, 255, 255]));
        imageops::overlay(&mut canvas, &scaled, offset_x as i64, offset_y as i64);

        tracing::debug!(
            width,
            height,
            scale,
            content_width,
            content_height,
            "Letterboxed image"
        );

        Ok(PreparedImage {
            pixels: DynamicImage::ImageRgba8(canvas).to_rgb8(),
            content_width,
            content_height,
            offset_x,
            offset_y,
            scale,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use std::io::Cursor;

    const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
    const MAX_BYTES: u64 = crate::config::MAX_IMAGE_BYTES;

    fn preprocessor() -> Preprocessor {
        Preprocessor::new(&PreprocessConfig::default())
    }

    fn png_upload(width: u32, height: u32) -> UploadedImage {
        let img = RgbImage::from_pixel(width, height, Rgb([200, 10, 10]));
        let mut buf = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        UploadedImage::new(buf, MediaType::Png)
    }

    #[test]
    fn test_media_type_from_extension() {
        assert_eq!(MediaType::from_extension("JPG"), MediaType::Jpeg);
        assert_eq!(MediaType::from_extension("jpeg"), MediaType::Jpeg);
        assert_eq!(MediaType::from_extension("webp"), MediaType::Webp);
        assert_eq!(
            MediaType::from_path(Path::new("cat.gif")),
            MediaType::Unsupported("gif".to_string())
        );
    }

    #[test]
    fn test_validate_rejects_unsupported_type() {
        let upload = UploadedImage::new(vec![0; 100], MediaType::Unsupported("gif".into()));
        assert!(matches!(
            preprocessor().validate(&upload),
            Err(IdentifyError::UnsupportedType(_))
        ));
    }

    #[test]
    fn test_validate_rejects_oversized_regardless_of_type() {
        let six_mb = vec![0u8; 6 * 1024 * 1024];
        for media_type in [MediaType::Jpeg, MediaType::Png, MediaType::Webp] {
            let upload = UploadedImage::new(six_mb.clone(), media_type);
            assert!(matches!(
                preprocessor().validate(&upload),
                Err(IdentifyError::ImageTooLarge { .. })
            ));
        }
    }

    #[test]
    fn test_validate_accepts_exact_limit() {
        let upload = UploadedImage::new(vec![0u8; MAX_BYTES as usize], MediaType::Jpeg);
        assert!(preprocessor().validate(&upload).is_ok());
    }

    #[test]
    fn test_prepare_rejects_small_dimensions() {
        for (w, h) in [(49, 200), (200, 49), (10, 10)] {
            let result = preprocessor().prepare(&png_upload(w, h));
            assert!(
                matches!(result, Err(IdentifyError::TooSmallImage { .. })),
                "{}x{} should be too small",
                w,
                h
            );
        }
        assert!(preprocessor().prepare(&png_upload(50, 50)).is_ok());
    }

    #[test]
    fn test_prepare_rejects_garbage() {
        let upload = UploadedImage::new(b"not an image".to_vec(), MediaType::Jpeg);
        assert!(matches!(
            preprocessor().prepare(&upload),
            Err(IdentifyError::DecodeFailure(_))
        ));
    }

    #[test]
    fn test_letterbox_wide_image() {
        let prepared = preprocessor().prepare(&png_upload(1000, 500)).unwrap();

        assert_eq!(prepared.pixels.dimensions(), (224, 224));
        assert_eq!((prepared.content_width, prepared.content_height), (224, 112));
        assert_eq!((prepared.offset_x, prepared.offset_y), (0, 56));
        assert!((prepared.scale - 0.224).abs() < 1e-6);

        assert_eq!(*prepared.pixels.get_pixel(112, 10), WHITE);
        assert_eq!(*prepared.pixels.get_pixel(112, 220), WHITE);
        assert_ne!(*prepared.pixels.get_pixel(112, 112), WHITE);
    }

    #[test]
    fn test_letterbox_tall_small_image_upscales() {
        let prepared = preprocessor().prepare(&png_upload(60, 120)).unwrap();

        assert_eq!(prepared.size(), 224);
        assert_eq!((prepared.content_width, prepared.content_height), (112, 224));
        assert_eq!(prepared.offset_x, 56);
        assert_eq!(*prepared.pixels.get_pixel(5, 112), WHITE);
        assert_ne!(*prepared.pixels.get_pixel(112, 112), WHITE);
    }

    #[test]
    fn test_letterbox_preserves_aspect_ratio() {
        for (w, h) in [(640, 480), (300, 977), (1234, 1234)] {
            let prepared = preprocessor().prepare(&png_upload(w, h)).unwrap();
            let expected = (224.0 / w as f32).min(224.0 / h as f32);
            assert!((prepared.scale - expected).abs() < 1e-6);

            let source = w as f32 / h as f32;
            let content = prepared.content_width as f32 / prepared.content_height as f32;
            assert!((source - content).abs() / source < 0.02);
        }
    }

    #[test]
    fn test_probe_then_read_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.PNG");
        let contents = png_upload(64, 64).bytes;
        std::fs::write(&path, &contents).unwrap();

        let mut upload = UploadedImage::probe(&path).unwrap();
        assert_eq!(upload.media_type, MediaType::Png);
        assert_eq!(upload.size, contents.len() as u64);
        assert!(upload.bytes.is_empty());

        upload.read_bytes(&path).unwrap();
        assert_eq!(upload.bytes, contents);
        assert!(preprocessor().prepare(&upload).is_ok());

        let missing = UploadedImage::probe(&dir.path().join("missing.jpg"));
        assert!(matches!(missing, Err(IdentifyError::DecodeFailure(_))));
    }

    #[test]
    fn test_oversized_file_rejected_from_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("huge.jpg");
        let file = std::fs::File::create(&path).unwrap();
        file.set_len(6 * 1024 * 1024).unwrap();

        let upload = UploadedImage::probe(&path).unwrap();
        assert_eq!(upload.size, 6 * 1024 * 1024);
        assert!(upload.bytes.is_empty());
        assert!(matches!(
            preprocessor().validate(&upload),
            Err(IdentifyError::ImageTooLarge { size, max }) if size == 6 * 1024 * 1024 && max == MAX_BYTES
        ));
    }
}
