use once_cell::sync::Lazy;
use regex::Regex;

use super::brace::{BraceExtractor, Definition};
use super::BlockKind;

const VISIBILITY: &str = r"(?:pub(?:\([^)]*\))?\s+)?";

static DEFINITIONS: Lazy<Vec<Definition>> = Lazy::new(|| {
    vec![
        Definition {
            kind: BlockKind::Function,
            pattern: Regex::new(&format!(
                r#"^\s*{VISIBILITY}(?:default\s+)?(?:const\s+)?(?:async\s+)?(?:unsafe\s+)?(?:extern\s+"[^"]*"\s+)?fn\s+(?P<name>\w+)"#
            ))
            .unwrap(),
        },
        Definition {
            kind: BlockKind::Struct,
            pattern: Regex::new(&format!(r"^\s*{VISIBILITY}struct\s+(?P<name>\w+)")).unwrap(),
        },
        Definition {
            kind: BlockKind::Enum,
            pattern: Regex::new(&format!(r"^\s*{VISIBILITY}enum\s+(?P<name>\w+)")).unwrap(),
        },
        Definition {
            kind: BlockKind::Trait,
            pattern: Regex::new(&format!(r"^\s*{VISIBILITY}(?:unsafe\s+)?trait\s+(?P<name>\w+)"))
                .unwrap(),
        },
        Definition {
            kind: BlockKind::Impl,
            pattern: Regex::new(
                r"^\s*(?:unsafe\s+)?impl(?:<[^>]*>)?\s+(?:[\w:<>, ']+\s+for\s+)?(?:[\w]+::)*(?P<name>\w+)",
            )
            .unwrap(),
        },
    ]
});

pub(super) static RUST: BraceExtractor = BraceExtractor {
    definitions: &DEFINITIONS,
    string_delims: &['"'],
};

#[cfg(test)]
mod tests {
    use super::super::BlockExtractor;
    use super::*;

    #[test]
    fn test_rust_items() {
        let src = r#"use std::fmt;

pub struct Config {
    pub name: String,
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

pub(crate) async fn load(path: &str) -> Config {
    let raw = "}{";
    Config { name: raw.to_string() }
}
"#;
        let lines: Vec<&str> = src.lines().collect();
        let blocks = RUST.extract(&lines);
        let names: Vec<_> = blocks.iter().map(|b| (b.kind, b.name.as_str())).collect();
        assert_eq!(
            names,
            vec![
                (BlockKind::Struct, "Config"),
                (BlockKind::Impl, "Config"),
                (BlockKind::Function, "load"),
            ]
        );
        assert_eq!((blocks[0].line_start, blocks[0].line_end), (3, 5));
        assert_eq!((blocks[1].line_start, blocks[1].line_end), (7, 11));
        assert!(blocks[1].content.contains("fn fmt"));
        assert!(blocks[1].content.ends_with('}'));
        assert_eq!((blocks[2].line_start, blocks[2].line_end), (13, 16));
    }
}
