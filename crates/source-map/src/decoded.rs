//! Revision 3 source maps and their inline data-URL form.

use crate::error::SourceMapError;
use crate::line_index::SourcePosition;
use crate::lookup::LookupSession;
use crate::vlq;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine as _;
use serde::{Deserialize, Serialize};

/// Prefix of the inline source map comment appended to generated scripts.
pub const INLINE_MARKER: &str = "# sourceMappingURL=data:application/json;charset=utf-8;base64,";

/// The same marker as emitted by tools that omit the charset.
const INLINE_MARKER_PLAIN: &str = "# sourceMappingURL=data:application/json;base64,";

const INLINE_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// The JSON document of a revision 3 source map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSourceMap {
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_root: Option<String>,
    pub sources: Vec<String>,
    #[serde(default)]
    pub sources_content: Vec<Option<String>>,
    #[serde(default)]
    pub names: Vec<String>,
    pub mappings: String,
}

/// Where a generated position came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenOrigin {
    /// Index into `sources`.
    pub source: u32,
    /// 1-based line in the original source.
    pub line: u32,
    /// 0-based column in the original source.
    pub column: u32,
    /// Index into `names`, if the segment carries one.
    pub name: Option<u32>,
}

/// One decoded mapping segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    /// Position in the generated text.
    pub generated: SourcePosition,
    /// Original location, absent for generated-only segments.
    pub original: Option<TokenOrigin>,
}

/// A decoded source map: the original sources, their text, and the mapping table.
///
/// `sources` and `sources_content` are index-aligned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedSourceMap {
    sources: Vec<String>,
    sources_content: Vec<String>,
    names: Vec<String>,
    /// Sorted by generated position.
    tokens: Vec<Token>,
}

impl DecodedSourceMap {
    /// Creates a map from already decoded parts.
    pub fn new(sources: Vec<String>, sources_content: Vec<String>, mut tokens: Vec<Token>) -> Self {
        tokens.sort_by_key(|token| token.generated);
        Self {
            sources,
            sources_content,
            names: Vec::new(),
            tokens,
        }
    }

    /// Decodes the inline source map trailing a generated text blob.
    pub fn from_inline(text: &str) -> Result<Self, SourceMapError> {
        let payload = [INLINE_MARKER, INLINE_MARKER_PLAIN]
            .iter()
            .filter_map(|marker| text.rfind(marker).map(|at| (at, at + marker.len())))
            .max_by_key(|(at, _)| *at)
            .map(|(_, payload_start)| &text[payload_start..])
            .ok_or(SourceMapError::MissingInlineMap)?;

        let payload = payload.split_whitespace().next().unwrap_or_default();
        let json = INLINE_ENGINE.decode(payload)?;
        let raw: RawSourceMap = serde_json::from_slice(&json)?;
        Self::try_from(raw)
    }

    /// Parses a source map JSON document.
    pub fn from_json(json: &str) -> Result<Self, SourceMapError> {
        let raw: RawSourceMap = serde_json::from_str(json)?;
        Self::try_from(raw)
    }

    /// Returns the original source paths.
    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    /// Returns the original source texts, index-aligned with [`Self::sources`].
    pub fn sources_content(&self) -> &[String] {
        &self.sources_content
    }

    /// Returns the path of the source at `index`.
    pub fn source(&self, index: usize) -> Option<&str> {
        self.sources.get(index).map(String::as_str)
    }

    /// Returns the text of the source at `index`.
    pub fn source_text(&self, index: usize) -> Option<&str> {
        self.sources_content.get(index).map(String::as_str)
    }

    /// Returns the decoded mapping segments, sorted by generated position.
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Opens a lookup session over this map.
    ///
    /// The session borrows the map and is meant to live for one pass.
    pub fn session(&self) -> LookupSession<'_> {
        LookupSession::new(self)
    }

    /// Converts back to the JSON document form.
    pub fn to_raw(&self) -> RawSourceMap {
        RawSourceMap {
            version: 3,
            file: None,
            source_root: None,
            sources: self.sources.clone(),
            sources_content: self.sources_content.iter().cloned().map(Some).collect(),
            names: self.names.clone(),
            mappings: encode_mappings(&self.tokens),
        }
    }

    /// Serializes the map as JSON.
    pub fn to_json(&self) -> Result<String, SourceMapError> {
        Ok(serde_json::to_string(&self.to_raw())?)
    }

    /// Renders the `//# sourceMappingURL=` comment carrying this map.
    pub fn to_inline_comment(&self) -> Result<String, SourceMapError> {
        let json = self.to_json()?;
        Ok(format!("//{}{}", INLINE_MARKER, INLINE_ENGINE.encode(json)))
    }
}

impl TryFrom<RawSourceMap> for DecodedSourceMap {
    type Error = SourceMapError;

    fn try_from(raw: RawSourceMap) -> Result<Self, Self::Error> {
        if raw.version != 3 {
            return Err(SourceMapError::UnsupportedVersion(raw.version));
        }
        if raw.sources.len() != raw.sources_content.len() {
            return Err(SourceMapError::ContentMismatch {
                sources: raw.sources.len(),
                contents: raw.sources_content.len(),
            });
        }

        let sources: Vec<String> = match raw.source_root.as_deref() {
            Some(root) if !root.is_empty() => raw
                .sources
                .iter()
                .map(|source| format!("{}/{}", root.trim_end_matches('/'), source))
                .collect(),
            _ => raw.sources,
        };

        let sources_content = raw
            .sources_content
            .into_iter()
            .zip(&sources)
            .map(|(content, source)| {
                content.ok_or_else(|| SourceMapError::MissingSourceContent(source.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut tokens = decode_mappings(&raw.mappings, sources.len())?;
        tokens.sort_by_key(|token| token.generated);

        Ok(Self {
            sources,
            sources_content,
            names: raw.names,
            tokens,
        })
    }
}

/// Decodes a `mappings` string into absolute tokens.
fn decode_mappings(mappings: &str, source_count: usize) -> Result<Vec<Token>, SourceMapError> {
    let bytes = mappings.as_bytes();
    let mut tokens = Vec::new();

    let mut line = 1u32;
    let mut column = 0i64;
    let mut source = 0i64;
    let mut original_line = 0i64;
    let mut original_column = 0i64;
    let mut name = 0i64;

    let mut pos = 0;
    while pos < bytes.len() {
        match bytes[pos] {
            b';' => {
                line += 1;
                column = 0;
                pos += 1;
                continue;
            }
            b',' => {
                pos += 1;
                continue;
            }
            _ => {}
        }

        let segment_start = pos;
        let mut fields = [0i64; 5];
        let mut count = 0;
        while pos < bytes.len() && bytes[pos] != b',' && bytes[pos] != b';' {
            if count == fields.len() {
                return Err(SourceMapError::InvalidMappings { offset: pos });
            }
            let (value, consumed) =
                vlq::decode(&bytes[pos..]).ok_or(SourceMapError::InvalidMappings { offset: pos })?;
            fields[count] = value;
            count += 1;
            pos += consumed;
        }

        if !matches!(count, 1 | 4 | 5) {
            return Err(SourceMapError::InvalidMappings {
                offset: segment_start,
            });
        }

        column += fields[0];
        if column < 0 {
            return Err(SourceMapError::InvalidMappings {
                offset: segment_start,
            });
        }

        let original = if count >= 4 {
            source += fields[1];
            original_line += fields[2];
            original_column += fields[3];

            if source < 0 || source as usize >= source_count {
                return Err(SourceMapError::UnknownSource(source));
            }
            if original_line < 0 || original_column < 0 {
                return Err(SourceMapError::InvalidMappings {
                    offset: segment_start,
                });
            }

            let name = if count == 5 {
                name += fields[4];
                Some(name as u32)
            } else {
                None
            };

            Some(TokenOrigin {
                source: source as u32,
                line: original_line as u32 + 1,
                column: original_column as u32,
                name,
            })
        } else {
            None
        };

        tokens.push(Token {
            generated: SourcePosition::new(line, column as u32),
            original,
        });
    }

    Ok(tokens)
}

/// Encodes sorted tokens into a `mappings` string.
fn encode_mappings(tokens: &[Token]) -> String {
    let mut out = String::new();
    let mut line = 1u32;
    let mut column = 0i64;
    let mut source = 0i64;
    let mut original_line = 0i64;
    let mut original_column = 0i64;
    let mut name = 0i64;
    let mut first_in_line = true;

    for token in tokens {
        while line < token.generated.line {
            out.push(';');
            line += 1;
            column = 0;
            first_in_line = true;
        }
        if !first_in_line {
            out.push(',');
        }
        first_in_line = false;

        let generated_column = i64::from(token.generated.column);
        vlq::encode_into(generated_column - column, &mut out);
        column = generated_column;

        if let Some(origin) = token.original {
            let origin_line = i64::from(origin.line) - 1;
            vlq::encode_into(i64::from(origin.source) - source, &mut out);
            vlq::encode_into(origin_line - original_line, &mut out);
            vlq::encode_into(i64::from(origin.column) - original_column, &mut out);
            source = i64::from(origin.source);
            original_line = origin_line;
            original_column = i64::from(origin.column);

            if let Some(origin_name) = origin.name {
                vlq::encode_into(i64::from(origin_name) - name, &mut out);
                name = i64::from(origin_name);
            }
        }
    }

    out
}
