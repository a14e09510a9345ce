//! Category-to-symbol resolution.
//!
//! Every entry in the README gets exactly one symbol even when it carries
//! several categories. The choice is an editorial priority list: technology
//! and culture first, then boy-to-girl, then personal, then a generic
//! fallback. Input order never matters, only the table order does.
use serde::Deserialize;

pub const TERM_TECHNOLOGY: &str = "technology";
pub const TERM_CULTURE: &str = "culture";
pub const TERM_BOY_TO_GIRL: &str = "boy-to-girl";
pub const TERM_PERSONAL: &str = "personal";
pub const TERM_SOCIAL_PLATFORMS: &str = "social-platforms";

pub const SYMBOL_TECHNOLOGY: &str = "🖥️";
pub const SYMBOL_CULTURE: &str = "🎞️";
pub const SYMBOL_BOY_TO_GIRL: &str = "💄";
pub const SYMBOL_PERSONAL: &str = "📓";
pub const SYMBOL_OTHER: &str = "🗞️";

/// Terms the site is known to publish under.
///
/// `social-platforms` is recognized but has no rule in the default table, so
/// entries tagged only with it fall through to [`SYMBOL_OTHER`].
pub const KNOWN_TERMS: [&str; 5] = [
    TERM_TECHNOLOGY,
    TERM_CULTURE,
    TERM_BOY_TO_GIRL,
    TERM_PERSONAL,
    TERM_SOCIAL_PLATFORMS,
];

pub fn is_known_term(term: &str) -> bool {
    KNOWN_TERMS.contains(&term)
}

/// One row of the priority table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CategoryRule {
    pub term: String,
    pub symbol: String,
}

impl CategoryRule {
    fn new(term: &str, symbol: &str) -> Self {
        Self {
            term: term.to_string(),
            symbol: symbol.to_string(),
        }
    }
}

/// Ordered category priority table plus the fallback symbol.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SymbolTable {
    /// Evaluated top to bottom; the first rule whose term is present wins.
    pub rules: Vec<CategoryRule>,
    /// Used when no rule matches.
    pub other: String,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self {
            rules: vec![
                CategoryRule::new(TERM_TECHNOLOGY, SYMBOL_TECHNOLOGY),
                CategoryRule::new(TERM_CULTURE, SYMBOL_CULTURE),
                CategoryRule::new(TERM_BOY_TO_GIRL, SYMBOL_BOY_TO_GIRL),
                CategoryRule::new(TERM_PERSONAL, SYMBOL_PERSONAL),
            ],
            other: SYMBOL_OTHER.to_string(),
        }
    }
}

impl SymbolTable {
    /// Returns the symbol for an entry's category terms. Never fails: empty
    /// or unrecognized input resolves to the fallback symbol.
    pub fn symbol_for<S: AsRef<str>>(&self, categories: &[S]) -> &str {
        self.rules
            .iter()
            .find(|rule| categories.iter().any(|c| c.as_ref() == rule.term))
            .map_or(self.other.as_str(), |rule| rule.symbol.as_str())
    }
}
