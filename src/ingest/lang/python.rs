use once_cell::sync::Lazy;
use regex::Regex;

use super::{indent_width, BlockExtractor, BlockKind, CodeBlock};

static DEF_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?:async\s+)?def\s+(\w+)").unwrap());

static CLASS_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*class\s+(\w+)").unwrap());

/// Indentation-based extractor for Python.
///
/// A `def`/`class` line opens a block that absorbs following blank lines and
/// lines indented deeper than the definition, nested definitions included, so
/// a class block carries its methods. Decorators directly above a definition
/// belong to it.
pub struct PythonExtractor;

pub(super) static PYTHON: PythonExtractor = PythonExtractor;

struct OpenBlock {
    kind: BlockKind,
    name: String,
    first: usize,
    indent: usize,
}

impl OpenBlock {
    fn close(self, lines: &[&str], mut last: usize) -> CodeBlock {
        while last > self.first && lines[last].trim().is_empty() {
            last -= 1;
        }
        CodeBlock::from_lines(self.kind, &self.name, lines, self.first, last)
    }
}

fn match_definition(line: &str) -> Option<(BlockKind, String)> {
    if let Some(cap) = DEF_PATTERN.captures(line) {
        let kind = if indent_width(line) > 0 {
            BlockKind::Method
        } else {
            BlockKind::Function
        };
        return Some((kind, cap[1].to_string()));
    }
    CLASS_PATTERN
        .captures(line)
        .map(|cap| (BlockKind::Class, cap[1].to_string()))
}

/// First line of the decorator run directly above line `i`.
fn decorator_start(lines: &[&str], i: usize) -> usize {
    let mut first = i;
    while first > 0 && lines[first - 1].trim_start().starts_with('@') {
        first -= 1;
    }
    first
}

impl BlockExtractor for PythonExtractor {
    fn extract(&self, lines: &[&str]) -> Vec<CodeBlock> {
        let mut blocks = Vec::new();
        let mut open: Option<OpenBlock> = None;

        for (i, line) in lines.iter().enumerate() {
            if let Some((kind, name)) = match_definition(line) {
                if open.as_ref().is_some_and(|o| indent_width(line) > o.indent) {
                    continue;
                }
                let mut first = decorator_start(lines, i);
                if let Some(prev) = open.take() {
                    // Decorators can't reach back past the previous definition line.
                    first = first.max(prev.first + 1);
                    blocks.push(prev.close(lines, first - 1));
                }
                open = Some(OpenBlock {
                    kind,
                    name,
                    first,
                    indent: indent_width(line),
                });
                continue;
            }

            let ends_block = open
                .as_ref()
                .is_some_and(|o| !line.trim().is_empty() && indent_width(line) <= o.indent);
            if ends_block {
                if let Some(prev) = open.take() {
                    blocks.push(prev.close(lines, i - 1));
                }
            }
        }

        if let Some(prev) = open {
            blocks.push(prev.close(lines, lines.len() - 1));
        }

        blocks
    }
}
