//! Directory document loader
//!
//! Reads every supported file under a directory into a [`Document`]:
//! - Plain text and Markdown as-is
//! - HTML with markup, scripts and styles stripped
//! - PDF via pdf-extract
//!
//! Author: hephaex@gmail.com

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;

/// Errors that can occur while loading documents
#[derive(Error, Debug)]
pub enum LoadError {
    /// File format is not supported
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// IO error while reading a file or directory
    #[error("IO error reading {path}: {source}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// PDF parsing error
    #[error("PDF parsing error in {path}: {message}")]
    PdfError { path: String, message: String },

    /// Nothing usable was found
    #[error("No documents found in {0}")]
    Empty(String),
}

/// Supported file types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Pdf,
    Markdown,
    PlainText,
    Html,
    Unknown,
}

impl FileType {
    /// Detect file type from extension
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "pdf" => Self::Pdf,
            "md" | "markdown" => Self::Markdown,
            "txt" => Self::PlainText,
            "html" | "htm" => Self::Html,
            _ => Self::Unknown,
        }
    }

    /// Detect file type from path
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(Self::from_extension)
            .unwrap_or(Self::Unknown)
    }
}

impl std::fmt::Display for FileType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pdf => write!(f, "pdf"),
            Self::Markdown => write!(f, "markdown"),
            Self::PlainText => write!(f, "text"),
            Self::Html => write!(f, "html"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// A loaded document
#[derive(Debug, Clone)]
pub struct Document {
    /// Original file path
    pub path: PathBuf,

    /// Detected file type
    pub file_type: FileType,

    /// Extracted text content
    pub content: String,
}

impl Document {
    pub fn new(path: impl Into<PathBuf>, file_type: FileType, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            file_type,
            content: content.into(),
        }
    }
}

/// Load a single file, dispatching on its extension
pub fn load_file(path: &Path) -> Result<Document, LoadError> {
    let file_type = FileType::from_path(path);

    let content = match file_type {
        FileType::PlainText | FileType::Markdown => read_text(path)?,
        FileType::Html => html_to_text(&read_text(path)?),
        FileType::Pdf => read_pdf(path)?,
        FileType::Unknown => {
            return Err(LoadError::UnsupportedFormat(
                path.extension()
                    .and_then(|e| e.to_str())
                    .unwrap_or("none")
                    .to_string(),
            ))
        }
    };

    Ok(Document::new(path, file_type, content))
}

/// Load every supported document under `dir`, recursively, sorted by path.
///
/// Unsupported and hidden files are skipped; files that fail to parse are
/// logged and skipped.
pub fn load_directory(dir: &Path) -> Result<Vec<Document>, LoadError> {
    let mut paths = Vec::new();
    collect_files(dir, &mut paths)?;
    paths.sort();

    let mut documents = Vec::new();
    for path in paths {
        if FileType::from_path(&path) == FileType::Unknown {
            tracing::debug!("Skipping unsupported file {}", path.display());
            continue;
        }

        match load_file(&path) {
            Ok(doc) if doc.content.trim().is_empty() => {
                tracing::debug!("Skipping empty document {}", path.display());
            }
            Ok(doc) => {
                tracing::debug!(
                    "Loaded {} ({}, {} chars)",
                    path.display(),
                    doc.file_type,
                    doc.content.len()
                );
                documents.push(doc);
            }
            Err(e) => tracing::warn!("Skipping {}: {}", path.display(), e),
        }
    }

    if documents.is_empty() {
        return Err(LoadError::Empty(dir.display().to_string()));
    }

    tracing::info!("Loaded {} documents from {}", documents.len(), dir.display());
    Ok(documents)
}

fn collect_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), LoadError> {
    let entries = std::fs::read_dir(dir).map_err(|e| LoadError::IoError {
        path: dir.display().to_string(),
        source: e,
    })?;

    for entry in entries {
        let entry = entry.map_err(|e| LoadError::IoError {
            path: dir.display().to_string(),
            source: e,
        })?;
        let path = entry.path();

        let hidden = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with('.'));
        if hidden {
            continue;
        }

        if path.is_dir() {
            collect_files(&path, out)?;
        } else {
            out.push(path);
        }
    }

    Ok(())
}

fn read_text(path: &Path) -> Result<String, LoadError> {
    let bytes = std::fs::read(path).map_err(|e| LoadError::IoError {
        path: path.display().to_string(),
        source: e,
    })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn read_pdf(path: &Path) -> Result<String, LoadError> {
    let bytes = std::fs::read(path).map_err(|e| LoadError::IoError {
        path: path.display().to_string(),
        source: e,
    })?;

    pdf_extract::extract_text_from_mem(&bytes).map_err(|e| LoadError::PdfError {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

struct HtmlPatterns {
    hidden: Regex,
    comment: Regex,
    block: Regex,
    tag: Regex,
    spaces: Regex,
    blank_lines: Regex,
}

fn html_patterns() -> &'static HtmlPatterns {
    static PATTERNS: OnceLock<HtmlPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| HtmlPatterns {
        hidden: Regex::new(r"(?is)<(script|style|noscript|template)\b[^>]*>.*?</(script|style|noscript|template)\s*>")
            .expect("valid regex"),
        comment: Regex::new(r"(?s)<!--.*?-->").expect("valid regex"),
        block: Regex::new(r"(?i)</?(p|div|br|li|ul|ol|h[1-6]|tr|table|section|article|header|footer|nav|title)\b[^>]*>")
            .expect("valid regex"),
        tag: Regex::new(r"(?s)<[^>]*>").expect("valid regex"),
        spaces: Regex::new(r"[ \t\r\f]+").expect("valid regex"),
        blank_lines: Regex::new(r"\n\s*\n+").expect("valid regex"),
    })
}

/// Reduce an HTML page to its visible text.
///
/// Block-level tags become line breaks so paragraphs survive chunking.
/// Inline tags are removed without a separator.
pub fn html_to_text(html: &str) -> String {
    let p = html_patterns();

    let text = p.hidden.replace_all(html, " ");
    let text = p.comment.replace_all(&text, " ");
    let text = p.block.replace_all(&text, "\n");
    let text = p.tag.replace_all(&text, "");
    let text = decode_entities(&text);
    let text = p.spaces.replace_all(&text, " ");

    let lines: Vec<&str> = text.lines().map(str::trim).collect();
    let joined = lines.join("\n");
    p.blank_lines
        .replace_all(&joined, "\n\n")
        .trim()
        .to_string()
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
