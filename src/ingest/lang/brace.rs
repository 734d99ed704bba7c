use once_cell::sync::Lazy;
use regex::Regex;

use super::{BlockExtractor, BlockKind, CodeBlock};

/// A definition marker: lines matching `pattern` open a block of `kind`,
/// named by capture group `name`.
pub struct Definition {
    pub kind: BlockKind,
    pub pattern: Regex,
}

/// Identifiers that look like calls or definitions to the patterns but are
/// control flow.
const KEYWORDS: &[&str] = &[
    "if", "for", "while", "switch", "catch", "return", "new", "else", "match", "loop", "do",
    "try", "synchronized", "using", "lock", "foreach", "sizeof", "typeof", "await", "throw",
];

/// Extractor for brace-delimited languages.
///
/// A definition line starts a block that runs until the brace depth it opened
/// returns to zero, so a class or impl block carries its members and closing
/// brace. Definitions inside a captured block are not emitted again. A
/// definition terminated by `;` before any brace opens is a one-line block,
/// and one that never opens a body ends before the next definition.
pub struct BraceExtractor {
    pub definitions: &'static Lazy<Vec<Definition>>,
    /// Characters that open and close multi-character string literals.
    pub string_delims: &'static [char],
}

impl BraceExtractor {
    fn match_definition(&self, line: &str) -> Option<(BlockKind, String)> {
        let trimmed = line.trim_start();
        if trimmed.starts_with("//") || trimmed.starts_with('*') || trimmed.starts_with("/*") {
            return None;
        }

        self.definitions.iter().find_map(|def| {
            let caps = def.pattern.captures(line)?;
            let name = caps.name("name")?.as_str();
            if KEYWORDS.contains(&name) {
                return None;
            }
            Some((def.kind, name.to_string()))
        })
    }
}

impl BlockExtractor for BraceExtractor {
    fn extract(&self, lines: &[&str]) -> Vec<CodeBlock> {
        let starts: Vec<(usize, BlockKind, String)> = lines
            .iter()
            .enumerate()
            .filter_map(|(i, line)| self.match_definition(line).map(|(k, n)| (i, k, n)))
            .collect();

        let mut blocks = Vec::with_capacity(starts.len());
        let mut covered_until: Option<usize> = None;
        for (idx, (first, kind, name)) in starts.iter().enumerate() {
            if covered_until.is_some_and(|end| *first <= end) {
                continue;
            }
            // A definition whose body doesn't open before the next one stops there.
            let head = match starts.get(idx + 1) {
                Some((next, _, _)) => find_block_end(&lines[..*next], *first, self.string_delims),
                None => find_block_end(lines, *first, self.string_delims),
            };
            let mut last = if head.opened {
                find_block_end(lines, *first, self.string_delims).line
            } else {
                head.line
            };
            covered_until = Some(last);
            while last > *first && lines[last].trim().is_empty() {
                last -= 1;
            }
            blocks.push(CodeBlock::from_lines(*kind, name, lines, *first, last));
        }
        blocks
    }
}

/// Where a block opened at some line ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct BlockEnd {
    /// Zero-based index of the closing line.
    pub line: usize,
    /// Whether a `{` body was opened.
    pub opened: bool,
}

/// Finds where the block opened at `first` closes.
///
/// Skips string literals, character literals, line comments and block
/// comments while counting braces. Unterminated blocks run to the last line.
pub(crate) fn find_block_end(lines: &[&str], first: usize, string_delims: &[char]) -> BlockEnd {
    let mut depth: i32 = 0;
    let mut opened = false;
    let mut in_string: Option<char> = None;
    let mut in_block_comment = false;

    for (offset, line) in lines[first..].iter().enumerate() {
        let chars: Vec<char> = line.chars().collect();
        let mut i = 0;

        while i < chars.len() {
            let c = chars[i];
            let next = chars.get(i + 1).copied();

            if in_block_comment {
                if c == '*' && next == Some('/') {
                    in_block_comment = false;
                    i += 1;
                }
                i += 1;
                continue;
            }

            if let Some(delim) = in_string {
                if c == '\\' {
                    i += 2;
                    continue;
                }
                if c == delim {
                    in_string = None;
                }
                i += 1;
                continue;
            }

            match c {
                '/' if next == Some('/') => break,
                '/' if next == Some('*') => {
                    in_block_comment = true;
                    i += 1;
                }
                '\'' if !string_delims.contains(&'\'') => {
                    i += char_literal_len(&chars[i..]).saturating_sub(1);
                }
                c if string_delims.contains(&c) => in_string = Some(c),
                '{' => {
                    depth += 1;
                    opened = true;
                }
                '}' => {
                    depth -= 1;
                    if opened && depth <= 0 {
                        return BlockEnd {
                            line: first + offset,
                            opened,
                        };
                    }
                }
                ';' if !opened && depth == 0 => {
                    return BlockEnd {
                        line: first + offset,
                        opened,
                    }
                }
                _ => {}
            }
            i += 1;
        }
    }

    BlockEnd {
        line: lines.len().saturating_sub(1),
        opened,
    }
}

/// Length of a character literal starting at `chars[0] == '\''`, or 1 when
/// the quote is something else (a Rust lifetime, for instance).
fn char_literal_len(chars: &[char]) -> usize {
    match chars {
        ['\'', '\\', _, '\'', ..] => 4,
        ['\'', c, '\'', ..] if *c != '\\' => 3,
        ['\'', '\\', ..] => chars
            .iter()
            .skip(2)
            .position(|&c| c == '\'')
            .map_or(1, |p| p + 3),
        _ => 1,
    }
}
