use once_cell::sync::Lazy;
use regex::Regex;

use super::brace::{BraceExtractor, Definition};
use super::BlockKind;

// Shared by Java and C#: the declaration shapes are close enough that one
// pattern set covers both.
static DEFINITIONS: Lazy<Vec<Definition>> = Lazy::new(|| {
    let modifiers = r"(?:(?:public|private|protected|internal|static|final|abstract|sealed|partial|readonly|async|virtual|override|synchronized|native|default)\s+)*";
    vec![
        Definition {
            kind: BlockKind::Class,
            pattern: Regex::new(&format!(r"^\s*{modifiers}(?:class|record)\s+(?P<name>\w+)"))
                .unwrap(),
        },
        Definition {
            kind: BlockKind::Interface,
            pattern: Regex::new(&format!(r"^\s*{modifiers}(?:interface|@interface)\s+(?P<name>\w+)"))
                .unwrap(),
        },
        Definition {
            kind: BlockKind::Enum,
            pattern: Regex::new(&format!(r"^\s*{modifiers}enum\s+(?P<name>\w+)")).unwrap(),
        },
        Definition {
            kind: BlockKind::Struct,
            pattern: Regex::new(&format!(r"^\s*{modifiers}struct\s+(?P<name>\w+)")).unwrap(),
        },
        Definition {
            kind: BlockKind::Method,
            pattern: Regex::new(
                r"^\s*(?:public|private|protected|internal)\s+(?:(?:static|final|abstract|synchronized|async|virtual|override|sealed|native)\s+)*(?:<[^>]+>\s+)?(?:[\w.\[\]]+(?:<[^()]*>)?(?:\[\])*\s+)?(?P<name>\w+)\s*\(",
            )
            .unwrap(),
        },
    ]
});

pub(super) static JAVA: BraceExtractor = BraceExtractor {
    definitions: &DEFINITIONS,
    string_delims: &['"'],
};
