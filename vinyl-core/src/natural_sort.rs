//! Natural ("human") ordering of names with embedded numbers.
//!
//! `"Track 2"` sorts before `"Track 10"`; text runs compare case-insensitively.
//! Digit runs are compared by value without parsing into a fixed-width
//! integer, so arbitrarily long numbers never overflow.

use std::cmp::Ordering;

/// One run of a [`NaturalKey`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Lower-cased non-digit run.
    Text(String),
    /// Digit run with leading zeros stripped (`"007"` -> `"7"`, `"0"` -> `""`).
    Number(String),
}

impl Token {
    fn cmp_token(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a.len().cmp(&b.len()).then_with(|| a.cmp(b)),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            // Numbers sort before text, the same way '0'..'9' sort before letters
            (Self::Number(_), Self::Text(_)) => Ordering::Less,
            (Self::Text(_), Self::Number(_)) => Ordering::Greater,
        }
    }
}

/// Alternating text/number tokens derived from a name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NaturalKey {
    tokens: Vec<Token>,
    /// Original string, used to break ties between keys that are equal
    /// after case folding and zero stripping so the order stays total.
    raw: String,
}

impl NaturalKey {
    #[must_use]
    pub fn new(name: &str) -> Self {
        let mut tokens = Vec::new();
        let mut current = String::new();
        let mut in_digits = false;

        for c in name.chars() {
            let is_digit = c.is_ascii_digit();
            if !current.is_empty() && is_digit != in_digits {
                tokens.push(finish_token(&current, in_digits));
                current.clear();
            }
            in_digits = is_digit;
            current.push(c);
        }
        if !current.is_empty() {
            tokens.push(finish_token(&current, in_digits));
        }

        Self {
            tokens,
            raw: name.to_string(),
        }
    }

    #[must_use]
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }
}

fn finish_token(run: &str, digits: bool) -> Token {
    if digits {
        Token::Number(run.trim_start_matches('0').to_string())
    } else {
        Token::Text(run.to_lowercase())
    }
}

impl Ord for NaturalKey {
    fn cmp(&self, other: &Self) -> Ordering {
        for (a, b) in self.tokens.iter().zip(&other.tokens) {
            let ord = a.cmp_token(b);
            if ord != Ordering::Equal {
                return ord;
            }
        }
        self.tokens
            .len()
            .cmp(&other.tokens.len())
            .then_with(|| self.raw.cmp(&other.raw))
    }
}

impl PartialOrd for NaturalKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Compare two names in natural order.
#[must_use]
pub fn compare(a: &str, b: &str) -> Ordering {
    NaturalKey::new(a).cmp(&NaturalKey::new(b))
}

/// Sort names in place in natural order.
pub fn sort_natural(names: &mut [String]) {
    names.sort_by_cached_key(|name| NaturalKey::new(name));
}

/// Sort arbitrary items in place by a name they carry.
pub fn sort_natural_by<T, F>(items: &mut [T], mut name: F)
where
    F: FnMut(&T) -> &str,
{
    items.sort_by_cached_key(|item| NaturalKey::new(name(item)));
}
