//! Error classification
//!
//! Maps raw provider error text to an [`ErrorKind`] using per-provider
//! pattern tables. Categories are tried in priority order (credits, auth,
//! config) and the first category with any matching pattern wins.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::{ErrorKind, ProviderIdentity};

/// A single error pattern: a literal substring or a compiled regex.
enum Pattern {
    Literal(&'static str),
    Regex(Regex),
}

impl Pattern {
    fn regex(pattern: &str) -> Self {
        Self::Regex(Regex::new(pattern).expect("error pattern regex"))
    }

    fn matches(&self, text: &str) -> bool {
        match self {
            Self::Literal(needle) => text.contains(needle),
            Self::Regex(re) => re.is_match(text),
        }
    }
}

type PatternTable = Vec<(ErrorKind, Vec<Pattern>)>;

// ORDER MATTERS: credits before auth before config.
static VERTEX_PATTERNS: Lazy<PatternTable> = Lazy::new(|| {
    vec![
        (
            ErrorKind::Credits,
            vec![
                Pattern::Literal("RESOURCE_EXHAUSTED"),
                Pattern::Literal("quotaExceeded"),
                Pattern::regex(r"(?i)PERMISSION_DENIED.*billing"),
            ],
        ),
        (ErrorKind::Auth, vec![Pattern::Literal("UNAUTHENTICATED")]),
        (ErrorKind::Config, vec![Pattern::regex(r"(?i)NOT_FOUND.*model")]),
    ]
});

static ANTHROPIC_PATTERNS: Lazy<PatternTable> = Lazy::new(|| {
    vec![
        (
            ErrorKind::Credits,
            vec![
                Pattern::Literal("credit_balance_too_low"),
                Pattern::Literal("insufficient_quota"),
                Pattern::Literal("Credit balance is too low"),
            ],
        ),
        (
            ErrorKind::Auth,
            vec![
                Pattern::Literal("authentication_error"),
                Pattern::Literal("invalid_api_key"),
            ],
        ),
    ]
});

/// Classify an error message from `provider`. Never fails: text matching no
/// pattern is [`ErrorKind::Other`].
pub fn classify_error(text: &str, provider: ProviderIdentity) -> ErrorKind {
    let table = match provider {
        ProviderIdentity::Vertex => &*VERTEX_PATTERNS,
        ProviderIdentity::Anthropic => &*ANTHROPIC_PATTERNS,
    };

    table
        .iter()
        .find(|(_, patterns)| patterns.iter().any(|p| p.matches(text)))
        .map(|(kind, _)| *kind)
        .unwrap_or(ErrorKind::Other)
}
