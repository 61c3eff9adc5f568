// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Pitch and fingering utilities.
//!
//! The document stores base pitches only; shifting and fingering lookup
//! happen here, at display and playback time.

pub mod fingering;
pub mod pitch;

pub use fingering::{Fingering, FingeringChart, FingeringLookup, Hole};
pub use pitch::{chromatic_range, shift_pitch, Note, Pitch, Semitones};
