// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Clipboard access and the tagged payload copied items travel in.

use serde::{Deserialize, Serialize};

use crate::document::{Item, Token};

/// Key marking a clipboard payload as copied items
pub const CLIPBOARD_TAG: &str = "ocarinaNotes";

/// Shared text clipboard
pub trait Clipboard {
    /// Current text, or `None` when empty or unreadable
    fn read_text(&self) -> Option<String>;
    /// Replace the clipboard text. Failures are ignored.
    fn write_text(&mut self, text: &str);
}

/// Process-local clipboard
#[derive(Debug, Clone, Default)]
pub struct MemoryClipboard {
    text: Option<String>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clipboard for MemoryClipboard {
    fn read_text(&self) -> Option<String> {
        self.text.clone()
    }

    fn write_text(&mut self, text: &str) {
        self.text = Some(text.to_string());
    }
}

#[derive(Serialize)]
struct OutgoingPayload<'a> {
    #[serde(rename = "ocarinaNotes")]
    notes: &'a [Item],
}

#[derive(Deserialize)]
struct IncomingNote {
    note: Token,
}

#[derive(Deserialize)]
struct IncomingPayload {
    #[serde(rename = "ocarinaNotes")]
    notes: Vec<IncomingNote>,
}

/// Serialize items as a tagged payload
pub fn encode_items(items: &[Item]) -> Result<String, serde_json::Error> {
    serde_json::to_string(&OutgoingPayload { notes: items })
}

/// Contents of a tagged payload. `None` when the text is not one or holds no items.
pub fn decode_tokens(text: &str) -> Option<Vec<Token>> {
    let payload: IncomingPayload = serde_json::from_str(text).ok()?;
    if payload.notes.is_empty() {
        return None;
    }
    Some(payload.notes.into_iter().map(|n| n.note).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_is_tagged() {
        let items = vec![Item::new(Token::from("C4")), Item::new(Token::Rest)];
        let text = encode_items(&items).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        let notes = value[CLIPBOARD_TAG].as_array().unwrap();
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[1]["note"], "—");
        assert_eq!(notes[0]["id"], items[0].id.as_str());
    }

    #[test]
    fn test_decode_tolerates_missing_ids() {
        let tokens = decode_tokens(r#"{"ocarinaNotes":[{"note":"D4"},{"note":"BR"}]}"#).unwrap();
        assert_eq!(tokens, vec![Token::from("D4"), Token::Break]);
    }

    #[test]
    fn test_decode_rejects_foreign_text() {
        assert!(decode_tokens("hello").is_none());
        assert!(decode_tokens(r#"{"other":[]}"#).is_none());
        assert!(decode_tokens(r#"{"ocarinaNotes":[]}"#).is_none());
        assert!(decode_tokens(r#"{"ocarinaNotes":[{"id":"x"}]}"#).is_none());
    }

    #[test]
    fn test_memory_clipboard() {
        let mut clip = MemoryClipboard::new();
        assert!(clip.read_text().is_none());
        clip.write_text("abc");
        assert_eq!(clip.read_text().as_deref(), Some("abc"));
    }
}
