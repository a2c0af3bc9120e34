//! Address patterns and wildcard matching
//!
//! Listener selectors are OSC address patterns matched against the literal
//! address of a decoded message:
//!
//! - `?` matches exactly one character
//! - `*` matches a run of characters, never crossing `/`
//! - `[abc]` matches one listed character, `[a-z]` a range, `[!...]` the
//!   negation
//! - `{foo,bar}` matches one of the listed alternatives as a unit
//!
//! A pattern must account for the entire address (implicit anchors at both
//! ends). `*` is resolved greedily with backtracking, longest run first.
//! Malformed syntax is rejected when the pattern is compiled, never at
//! match time.

use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
enum ClassEntry {
    Single(char),
    Range(char, char),
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Literal(char),
    AnyChar,
    Wildcard,
    Class {
        negated: bool,
        entries: Vec<ClassEntry>,
    },
    Alternation(Vec<String>),
}

/// A compiled address pattern.
#[derive(Debug, Clone)]
pub struct Pattern {
    raw: String,
    tokens: Vec<Token>,
}

impl Pattern {
    /// Compile a pattern string, validating its syntax.
    pub fn compile(pattern: &str) -> Result<Self> {
        if pattern.is_empty() {
            return Err(Error::InvalidPattern("empty pattern".to_string()));
        }
        if !pattern.starts_with('/') {
            return Err(Error::InvalidPattern(format!(
                "pattern must start with '/': {pattern}"
            )));
        }

        let mut tokens = Vec::new();
        let mut chars = pattern.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '?' => tokens.push(Token::AnyChar),
                '*' => {
                    // Adjacent stars collapse to one.
                    if tokens.last() != Some(&Token::Wildcard) {
                        tokens.push(Token::Wildcard);
                    }
                }
                '[' => tokens.push(parse_class(pattern, &mut chars)?),
                '{' => tokens.push(parse_alternation(pattern, &mut chars)?),
                ']' => {
                    return Err(Error::InvalidPattern(format!(
                        "unmatched ']' in {pattern}"
                    )))
                }
                '}' => {
                    return Err(Error::InvalidPattern(format!(
                        "unmatched '}}' in {pattern}"
                    )))
                }
                other => tokens.push(Token::Literal(other)),
            }
        }

        Ok(Self {
            raw: pattern.to_string(),
            tokens,
        })
    }

    /// The pattern source string.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// True if the pattern contains no wildcard syntax and can only match
    /// one exact address.
    pub fn is_literal(&self) -> bool {
        self.tokens.iter().all(|t| matches!(t, Token::Literal(_)))
    }

    /// Evaluate this pattern against a literal address.
    pub fn matches(&self, address: &str) -> bool {
        if self.is_literal() {
            return address == self.raw;
        }
        let chars: Vec<char> = address.chars().collect();
        match_tokens(&self.tokens, &chars)
    }
}

impl std::fmt::Display for Pattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for Pattern {}

fn parse_class(
    pattern: &str,
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
) -> Result<Token> {
    let negated = chars.peek() == Some(&'!');
    if negated {
        chars.next();
    }

    let mut entries = Vec::new();
    loop {
        let c = match chars.next() {
            Some(']') => break,
            Some(c) => c,
            None => {
                return Err(Error::InvalidPattern(format!(
                    "unterminated '[' in {pattern}"
                )))
            }
        };
        if chars.peek() == Some(&'-') {
            let mut ahead = chars.clone();
            ahead.next();
            match ahead.peek() {
                Some(&end) if end != ']' => {
                    chars.next();
                    chars.next();
                    entries.push(ClassEntry::Range(c, end));
                    continue;
                }
                _ => {}
            }
        }
        entries.push(ClassEntry::Single(c));
    }

    if entries.is_empty() {
        return Err(Error::InvalidPattern(format!(
            "empty character class in {pattern}"
        )));
    }
    Ok(Token::Class { negated, entries })
}

fn parse_alternation(
    pattern: &str,
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
) -> Result<Token> {
    let mut alternatives = Vec::new();
    let mut current = String::new();
    loop {
        match chars.next() {
            Some('}') => {
                alternatives.push(current);
                break;
            }
            Some(',') => alternatives.push(std::mem::take(&mut current)),
            Some('{') => {
                return Err(Error::InvalidPattern(format!(
                    "nested '{{' in {pattern}"
                )))
            }
            Some(c) => current.push(c),
            None => {
                return Err(Error::InvalidPattern(format!(
                    "unterminated '{{' in {pattern}"
                )))
            }
        }
    }
    Ok(Token::Alternation(alternatives))
}

fn class_contains(entries: &[ClassEntry], c: char) -> bool {
    entries.iter().any(|e| match e {
        ClassEntry::Single(s) => *s == c,
        ClassEntry::Range(lo, hi) => (*lo..=*hi).contains(&c),
    })
}

/// Greedy matcher with backtracking. Each call consumes one token; `*`
/// tries the longest non-separator run first and backs off on failure.
fn match_tokens(tokens: &[Token], addr: &[char]) -> bool {
    let Some((first, rest)) = tokens.split_first() else {
        return addr.is_empty();
    };
    match first {
        Token::Literal(c) => addr.first() == Some(c) && match_tokens(rest, &addr[1..]),
        Token::AnyChar => {
            matches!(addr.first(), Some(&c) if c != '/') && match_tokens(rest, &addr[1..])
        }
        Token::Class { negated, entries } => match addr.first() {
            Some(&c) => {
                let hit = if *negated {
                    c != '/' && !class_contains(entries, c)
                } else {
                    class_contains(entries, c)
                };
                hit && match_tokens(rest, &addr[1..])
            }
            None => false,
        },
        Token::Alternation(alternatives) => alternatives.iter().any(|alt| {
            match strip_literal(addr, alt) {
                Some(remaining) => match_tokens(rest, remaining),
                None => false,
            }
        }),
        Token::Wildcard => {
            // One or more characters, never '/': a wildcard cannot
            // fabricate an empty path segment.
            let run = addr.iter().take_while(|&&c| c != '/').count();
            (1..=run).rev().any(|taken| match_tokens(rest, &addr[taken..]))
        }
    }
}

fn strip_literal<'a>(addr: &'a [char], literal: &str) -> Option<&'a [char]> {
    let mut remaining = addr;
    for c in literal.chars() {
        match remaining.split_first() {
            Some((&head, tail)) if head == c => remaining = tail,
            _ => return None,
        }
    }
    Some(remaining)
}
