// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Composing: selection, clipboard and copy-on-write edits.
//!
//! This module provides:
//! - Selection: anchor plus members, with toggle and range clicks
//! - Clipboard: tagged payloads for copy, cut and paste
//! - Editor: item inserts, deletes and moves on the active container
//! - Section edits: create, duplicate, replicate, rename, remove, reorder

pub mod clipboard;
pub mod sections;
pub mod selection;
pub mod session;

pub use clipboard::{Clipboard, MemoryClipboard, CLIPBOARD_TAG};
pub use selection::{ClickMode, Selection};
pub use session::{Editor, NotePreview, SilentPreview};
