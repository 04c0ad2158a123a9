//! Error taxonomy for the pipeline.
//!
//! Errors that block an entire request carry one of these variants so the
//! transport layer can map them to status codes without string matching.
//! Per-item failures inside a batch (a single chunk's upsert) are absorbed
//! locally and never surface here.

/// Request-level error categories.
#[derive(Debug)]
pub enum Error {
    /// Missing or invalid configuration (credentials, chunking parameters).
    Config(String),
    /// Document extension not recognized by any extractor.
    UnsupportedFormat(String),
    /// Extractor ran but produced no usable text.
    Extraction(String),
    /// An external capability (embedder, completion model, search, store)
    /// failed in a way that blocks the request.
    Provider(String),
    /// Referenced document does not exist in the index.
    NotFound(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Config(msg) => write!(f, "configuration error: {}", msg),
            Error::UnsupportedFormat(ext) => write!(f, "unsupported file format: {}", ext),
            Error::Extraction(msg) => write!(f, "extraction failed: {}", msg),
            Error::Provider(msg) => write!(f, "provider error: {}", msg),
            Error::NotFound(msg) => write!(f, "not found: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_category_and_message() {
        let err = Error::UnsupportedFormat("xyz".to_string());
        assert_eq!(err.to_string(), "unsupported file format: xyz");

        let err = Error::Config("overlap must be smaller than window".to_string());
        assert!(err.to_string().starts_with("configuration error:"));
    }

    #[test]
    fn downcasts_through_anyhow() {
        let err: anyhow::Error = Error::NotFound("report.pdf".to_string()).into();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::NotFound(_))
        ));
    }
}
