//! Fragment matching.
//!
//! Rewrites a query term so each word matches as a prefix, suffix, or
//! substring, or as a fuzzy character sequence. Field-scope tokens (those
//! starting with `@`) pass through untouched.

use std::fmt;
use std::str::FromStr;

use quarry_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Term rewriting scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FragmentMode {
    /// Leave the term alone.
    #[default]
    Exact,
    /// `word*`
    Prefix,
    /// `*word`
    Suffix,
    /// `*word*`
    Substring,
    /// `*c*h*a*r*s*` over the whole term with whitespace removed.
    Fuzzy,
}

impl FragmentMode {
    /// Canonical name.
    pub fn as_str(&self) -> &'static str {
        match self {
            FragmentMode::Exact => "exact",
            FragmentMode::Prefix => "prefix",
            FragmentMode::Suffix => "suffix",
            FragmentMode::Substring => "substring",
            FragmentMode::Fuzzy => "fuzzy",
        }
    }

    /// Rewrite `term`. An empty term stays empty.
    pub fn apply(&self, term: &str) -> String {
        match self {
            FragmentMode::Exact => term.to_string(),
            FragmentMode::Prefix => per_word(term, |w| format!("{w}*")),
            FragmentMode::Suffix => per_word(term, |w| format!("*{w}")),
            FragmentMode::Substring => per_word(term, |w| format!("*{w}*")),
            FragmentMode::Fuzzy => fuzzy(term),
        }
    }
}

impl fmt::Display for FragmentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FragmentMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exact" => Ok(FragmentMode::Exact),
            "prefix" | "start" => Ok(FragmentMode::Prefix),
            "suffix" | "end" => Ok(FragmentMode::Suffix),
            "substring" | "fragment" => Ok(FragmentMode::Substring),
            "fuzzy" | "textmate" => Ok(FragmentMode::Fuzzy),
            _ => Err(Error::InvalidFragmentMatchingScheme {
                scheme: s.to_string(),
            }),
        }
    }
}

fn is_scope(token: &str) -> bool {
    token.starts_with('@')
}

fn per_word(term: &str, wrap: impl Fn(&str) -> String) -> String {
    term.split_whitespace()
        .map(|word| if is_scope(word) { word.to_string() } else { wrap(word) })
        .collect::<Vec<_>>()
        .join(" ")
}

fn fuzzy(term: &str) -> String {
    let (scopes, words): (Vec<&str>, Vec<&str>) =
        term.split_whitespace().partition(|w| is_scope(w));
    let chars: Vec<String> = words.concat().chars().map(String::from).collect();
    let mut out: Vec<String> = scopes.into_iter().map(String::from).collect();
    if !chars.is_empty() {
        out.push(format!("*{}*", chars.join("*")));
    }
    out.join(" ")
}
