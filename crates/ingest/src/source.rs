use crate::error::{IngestError, Result};
use std::path::Path;

const DEFAULT_MAX_BYTES: u64 = 5 * 1024 * 1024;

/// Plain-text formats that can be ingested without an external extractor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    Text,
    Markdown,
    Csv,
    Json,
    Html,
    Log,
}

impl SourceKind {
    pub fn from_extension(ext: &str) -> Result<Self> {
        match ext.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "txt" | "text" => Ok(Self::Text),
            "md" | "markdown" => Ok(Self::Markdown),
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "html" | "htm" => Ok(Self::Html),
            "log" => Ok(Self::Log),
            other => Err(IngestError::UnsupportedType(other.to_string())),
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            IngestError::UnsupportedType(format!("{} (no extension)", path.display()))
        })?;
        Self::from_extension(ext)
    }

    /// Label stored in the `type` metadata field
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "txt",
            Self::Markdown => "md",
            Self::Csv => "csv",
            Self::Json => "json",
            Self::Html => "html",
            Self::Log => "log",
        }
    }

    #[must_use]
    pub const fn max_bytes(self) -> u64 {
        DEFAULT_MAX_BYTES
    }

    pub fn check_size(self, size: u64) -> Result<()> {
        if size > self.max_bytes() {
            return Err(IngestError::TooLarge {
                kind: self.as_str(),
                size,
                limit: self.max_bytes(),
            });
        }
        Ok(())
    }

    /// Turn raw file content into the text that gets chunked.
    ///
    /// JSON is re-indented when it parses; HTML loses its markup. Other kinds pass through.
    #[must_use]
    pub fn extract_text(self, raw: &str) -> String {
        match self {
            Self::Json => serde_json::from_str::<serde_json::Value>(raw)
                .ok()
                .and_then(|value| serde_json::to_string_pretty(&value).ok())
                .unwrap_or_else(|| raw.to_string()),
            Self::Html => html_to_text(raw),
            Self::Text | Self::Markdown | Self::Csv | Self::Log => raw.to_string(),
        }
    }
}

/// Decode bytes as UTF-8, falling back to Latin-1 for legacy files.
#[must_use]
pub fn decode_text(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => err.into_bytes().into_iter().map(char::from).collect(),
    }
}

fn html_to_text(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut rest = html;

    while let Some(open) = rest.find('<') {
        out.push_str(&rest[..open]);
        let tag = &rest[open..];
        let skip_until = ["script", "style"].into_iter().find_map(|name| {
            tag.get(1..=name.len())
                .filter(|t| t.eq_ignore_ascii_case(name))
                .map(|_| name)
        });

        let consumed = match skip_until {
            Some(name) => {
                let close = format!("</{name}");
                tag.to_ascii_lowercase()
                    .find(&close)
                    .and_then(|at| tag[at..].find('>').map(|end| at + end + 1))
                    .unwrap_or(tag.len())
            }
            None => tag.find('>').map_or(tag.len(), |end| end + 1),
        };
        out.push('\n');
        rest = &tag[consumed..];
    }
    out.push_str(rest);

    let decoded = out
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");
    decoded
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
