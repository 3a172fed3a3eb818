use thiserror::Error;

/// Errors that can occur during document validation.
///
/// All are terminal for the current request; the engine never retries.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("no format declaration found in order text (expected e.g. 'Formato: 17x24')")]
    MissingFormatLine,

    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("document converter unavailable: {0}")]
    ConverterUnavailable(String),

    #[error("document conversion timed out after {0} seconds")]
    ConversionTimeout(u64),

    #[error("document conversion failed: {0}")]
    ConversionFailed(String),

    #[error("converter reported success but produced no usable output")]
    ConversionVerificationFailed,

    #[error("corrupt or unreadable document: {0}")]
    CorruptDocument(String),

    #[error("property extraction failed: {0}")]
    ExtractionFailure(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
