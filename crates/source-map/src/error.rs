//! Source map error types.

use thiserror::Error;

/// An error raised while decoding or encoding a source map.
#[derive(Debug, Error)]
pub enum SourceMapError {
    /// The text does not end with an inline source map comment.
    #[error("no inline source map found")]
    MissingInlineMap,

    /// The inline payload is not valid base64.
    #[error("inline source map is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    /// The payload is not a valid source map document.
    #[error("source map is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Only revision 3 source maps are understood.
    #[error("unsupported source map version {0}")]
    UnsupportedVersion(u32),

    /// `sources` and `sourcesContent` are not index-aligned.
    #[error("source map lists {sources} sources but {contents} source texts")]
    ContentMismatch {
        /// Number of entries in `sources`.
        sources: usize,
        /// Number of entries in `sourcesContent`.
        contents: usize,
    },

    /// A source has no embedded text.
    #[error("source map has no content for `{0}`")]
    MissingSourceContent(String),

    /// The `mappings` field contains invalid VLQ data.
    #[error("invalid VLQ mapping data at byte {offset}")]
    InvalidMappings {
        /// Byte offset into the `mappings` string.
        offset: usize,
    },

    /// A segment references a source index outside `sources`.
    #[error("mapping references unknown source index {0}")]
    UnknownSource(i64),
}
