// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Item contents: a pitch or one of the two symbolic markers.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::music::{shift_pitch, Semitones};

/// Storage form of the rest marker (a horizontal gap)
pub const REST: &str = "—";
/// Storage form of the break marker (an explicit line wrap)
pub const BREAK: &str = "⏎";

/// What an item holds
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Token {
    /// A note identifier such as `"C4"`, stored untransposed
    Pitch(String),
    /// Horizontal gap
    Rest,
    /// Line wrap
    Break,
}

impl Token {
    /// Parse a stored string, accepting the legacy marker spellings
    pub fn parse(raw: &str) -> Self {
        match raw {
            REST | "SPACE" => Token::Rest,
            BREAK | "BR" | "SALTO" => Token::Break,
            other => Token::Pitch(other.to_string()),
        }
    }

    /// Canonical storage string
    pub fn as_storage(&self) -> &str {
        match self {
            Token::Pitch(p) => p,
            Token::Rest => REST,
            Token::Break => BREAK,
        }
    }

    /// The pitch, if this is one
    pub fn pitch(&self) -> Option<&str> {
        match self {
            Token::Pitch(p) => Some(p),
            _ => None,
        }
    }

    /// Whether this is a pitch rather than a marker
    pub fn is_pitch(&self) -> bool {
        matches!(self, Token::Pitch(_))
    }

    /// The token as shown with a transpose applied. Markers never shift.
    pub fn displayed(&self, transpose: Semitones) -> Token {
        match self {
            Token::Pitch(p) => Token::Pitch(shift_pitch(p, transpose)),
            other => other.clone(),
        }
    }
}

impl From<String> for Token {
    fn from(s: String) -> Self {
        Token::parse(&s)
    }
}

impl From<&str> for Token {
    fn from(s: &str) -> Self {
        Token::parse(s)
    }
}

impl From<Token> for String {
    fn from(t: Token) -> Self {
        t.as_storage().to_string()
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_storage())
    }
}
