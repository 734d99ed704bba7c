//! Structural code-block extraction.
//!
//! Each supported language has an extractor that scans source lines for
//! definition markers and returns a uniform list of [`CodeBlock`]s. Dispatch
//! is a flat table keyed by language name; languages without an extractor
//! fall back to plain windowing in the caller.

mod brace;
mod go;
mod java;
mod javascript;
mod python;
mod rust;

use std::path::Path;

pub use brace::BraceExtractor;
pub use python::PythonExtractor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Function,
    Method,
    Class,
    Struct,
    Enum,
    Interface,
    Trait,
    Impl,
    Type,
}

impl BlockKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockKind::Function => "function",
            BlockKind::Method => "method",
            BlockKind::Class => "class",
            BlockKind::Struct => "struct",
            BlockKind::Enum => "enum",
            BlockKind::Interface => "interface",
            BlockKind::Trait => "trait",
            BlockKind::Impl => "impl",
            BlockKind::Type => "type",
        }
    }
}

/// A contiguous run of source lines forming one definition.
#[derive(Debug, Clone, PartialEq)]
pub struct CodeBlock {
    pub kind: BlockKind,
    pub name: String,
    /// 1-based, inclusive.
    pub line_start: usize,
    /// 1-based, inclusive.
    pub line_end: usize,
    pub content: String,
}

impl CodeBlock {
    /// Build a block from zero-based inclusive line indices.
    pub(crate) fn from_lines(kind: BlockKind, name: &str, lines: &[&str], first: usize, last: usize) -> Self {
        Self {
            kind,
            name: name.to_string(),
            line_start: first + 1,
            line_end: last + 1,
            content: lines[first..=last].join("\n"),
        }
    }
}

pub trait BlockExtractor: Send + Sync {
    fn extract(&self, lines: &[&str]) -> Vec<CodeBlock>;
}

/// Map a file path to a language name using its extension.
pub fn detect_language(file_path: &str) -> &'static str {
    let path = Path::new(file_path);
    if path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.eq_ignore_ascii_case("dockerfile"))
    {
        return "dockerfile";
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "py" | "pyi" => "python",
        "js" | "jsx" | "mjs" | "cjs" => "javascript",
        "ts" | "tsx" | "mts" | "cts" => "typescript",
        "java" => "java",
        "cpp" | "cc" | "cxx" | "hpp" => "cpp",
        "c" | "h" => "c",
        "cs" => "csharp",
        "go" => "go",
        "rs" => "rust",
        "php" => "php",
        "rb" => "ruby",
        "swift" => "swift",
        "kt" | "kts" => "kotlin",
        "scala" => "scala",
        "sql" => "sql",
        "html" | "htm" => "html",
        "css" => "css",
        "scss" => "scss",
        "json" => "json",
        "xml" => "xml",
        "yaml" | "yml" => "yaml",
        "toml" => "toml",
        "md" | "markdown" => "markdown",
        "sh" | "bash" | "zsh" => "bash",
        "dockerfile" => "dockerfile",
        _ => "text",
    }
}

/// Extractor for `language`, if one exists.
pub fn extractor_for(language: &str) -> Option<&'static dyn BlockExtractor> {
    let extractor: &'static dyn BlockExtractor = match language {
        "python" => &python::PYTHON,
        "javascript" => &javascript::JAVASCRIPT,
        "typescript" => &javascript::TYPESCRIPT,
        "java" | "csharp" => &java::JAVA,
        "rust" => &rust::RUST,
        "go" => &go::GO,
        _ => return None,
    };
    Some(extractor)
}

/// Number of leading whitespace characters, counting a tab as four.
pub(crate) fn indent_width(line: &str) -> usize {
    line.chars()
        .take_while(|c| c.is_whitespace())
        .map(|c| if c == '\t' { 4 } else { 1 })
        .sum()
}
