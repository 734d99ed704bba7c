use once_cell::sync::Lazy;
use regex::Regex;

use super::brace::{BraceExtractor, Definition};
use super::BlockKind;

static JS_DEFINITIONS: Lazy<Vec<Definition>> = Lazy::new(|| {
    vec![
        Definition {
            kind: BlockKind::Function,
            pattern: Regex::new(
                r"^\s*(?:export\s+)?(?:default\s+)?(?:async\s+)?function\s*\*?\s*(?P<name>\w+)",
            )
            .unwrap(),
        },
        Definition {
            kind: BlockKind::Function,
            pattern: Regex::new(
                r"^\s*(?:export\s+)?(?:const|let|var)\s+(?P<name>\w+)\s*(?::[^=]+)?=\s*(?:async\s+)?(?:function\b|\([^)]*\)\s*(?::[^=]+)?=>|\w+\s*=>)",
            )
            .unwrap(),
        },
        Definition {
            kind: BlockKind::Class,
            pattern: Regex::new(
                r"^\s*(?:export\s+)?(?:default\s+)?(?:abstract\s+)?class\s+(?P<name>\w+)",
            )
            .unwrap(),
        },
        Definition {
            kind: BlockKind::Method,
            pattern: Regex::new(
                r"^\s+(?:(?:public|private|protected|static|async|readonly|override|get|set)\s+)*(?P<name>\w+)\s*\([^)]*\)\s*(?::\s*[^{]+)?\{\s*$",
            )
            .unwrap(),
        },
    ]
});

static TS_DEFINITIONS: Lazy<Vec<Definition>> = Lazy::new(|| {
    let mut defs = vec![
        Definition {
            kind: BlockKind::Interface,
            pattern: Regex::new(r"^\s*(?:export\s+)?interface\s+(?P<name>\w+)").unwrap(),
        },
        Definition {
            kind: BlockKind::Enum,
            pattern: Regex::new(r"^\s*(?:export\s+)?(?:const\s+)?enum\s+(?P<name>\w+)").unwrap(),
        },
    ];
    defs.extend(JS_DEFINITIONS.iter().map(|d| Definition {
        kind: d.kind,
        pattern: d.pattern.clone(),
    }));
    defs
});

pub(super) static JAVASCRIPT: BraceExtractor = BraceExtractor {
    definitions: &JS_DEFINITIONS,
    string_delims: &['"', '\'', '`'],
};

pub(super) static TYPESCRIPT: BraceExtractor = BraceExtractor {
    definitions: &TS_DEFINITIONS,
    string_delims: &['"', '\'', '`'],
};
