use thiserror::Error;

/// All errors that the crate can generate
#[derive(Error, Debug)]
pub enum LetterError {
    #[error(transparent)]
    /// An I/O error occurred
    Io(#[from] std::io::Error),

    #[error(transparent)]
    /// [owned_ttf_parser] failed to parse the font
    FaceParsing(#[from] owned_ttf_parser::FaceParsingError),

    #[error(transparent)]
    /// [image] failed to decode or encode an image
    Image(#[from] image::ImageError),

    #[error("invalid letter request: {0}")]
    /// The JSON payload could not be parsed into a letter request
    Json(#[from] serde_json::Error),

    #[error("invalid base64 signature data: {0}")]
    /// The signature payload was not valid base64
    Base64(#[from] base64::DecodeError),

    #[error("data URI has no payload")]
    /// A `data:image` prefix was present without a `,` separating the payload
    DataUri,

    #[error("invalid configuration: {0}")]
    /// The configuration file could not be parsed
    Config(#[from] toml::de::Error),

    #[error("page is missing from the document")]
    /// A page id in the page order has no backing page
    PageMissing,
}

pub type Result<T> = std::result::Result<T, LetterError>;
