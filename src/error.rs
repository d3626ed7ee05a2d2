//! User-facing failures of an identification run.
//!
//! Every variant is terminal for the run that raised it. The `Display` text is
//! rendered verbatim in the output region, so keep it short and readable.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifyError {
    #[error("Unsupported image type ({0}). Use a JPEG, PNG or WebP file.")]
    UnsupportedType(String),

    #[error("Image too large ({size} bytes, max {max} bytes).")]
    ImageTooLarge { size: u64, max: u64 },

    #[error("Image too small ({width}x{height}, minimum {min}x{min}).")]
    TooSmallImage { width: u32, height: u32, min: u32 },

    #[error("Could not read the image: {0}")]
    DecodeFailure(String),

    #[error("The recognition model is unavailable.")]
    ModelUnavailable,

    #[error("Animal not recognized. Try another photo.")]
    NoRecognizedAnimal,

    #[error("Select an image or type an animal name.")]
    EmptyInput,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_are_user_facing() {
        let err = IdentifyError::ImageTooLarge { size: 6_000_000, max: 5_242_880 };
        assert!(err.to_string().starts_with("Image too large"));

        assert_eq!(
            IdentifyError::NoRecognizedAnimal.to_string(),
            "Animal not recognized. Try another photo."
        );
    }
}
