use once_cell::sync::Lazy;
use regex::Regex;

use super::brace::{BraceExtractor, Definition};
use super::BlockKind;

static DEFINITIONS: Lazy<Vec<Definition>> = Lazy::new(|| {
    vec![
        Definition {
            kind: BlockKind::Method,
            pattern: Regex::new(r"^func\s+\([^)]*\)\s*(?P<name>\w+)").unwrap(),
        },
        Definition {
            kind: BlockKind::Function,
            pattern: Regex::new(r"^func\s+(?P<name>\w+)").unwrap(),
        },
        Definition {
            kind: BlockKind::Struct,
            pattern: Regex::new(r"^type\s+(?P<name>\w+)\s+struct\b").unwrap(),
        },
        Definition {
            kind: BlockKind::Interface,
            pattern: Regex::new(r"^type\s+(?P<name>\w+)\s+interface\b").unwrap(),
        },
    ]
});

pub(super) static GO: BraceExtractor = BraceExtractor {
    definitions: &DEFINITIONS,
    string_delims: &['"', '`'],
};
