// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Pitch identifiers and chromatic shifting.
//!
//! Pitches are written as a letter, an optional accidental and an octave
//! (`"C4"`, `"F#5"`, `"Db4"`). Shifting always produces sharp spellings.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Semitone offset type
pub type Semitones = i32;

/// Note names (pitch classes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Note {
    C,
    Cs, // C# / Db
    D,
    Ds, // D# / Eb
    E,
    F,
    Fs, // F# / Gb
    G,
    Gs, // G# / Ab
    A,
    As, // A# / Bb
    B,
}

impl Note {
    /// All notes in chromatic order
    pub const ALL: [Note; 12] = [
        Note::C,
        Note::Cs,
        Note::D,
        Note::Ds,
        Note::E,
        Note::F,
        Note::Fs,
        Note::G,
        Note::Gs,
        Note::A,
        Note::As,
        Note::B,
    ];

    /// Get the pitch class (0-11) for this note
    pub fn pitch_class(self) -> u8 {
        Note::ALL.iter().position(|&n| n == self).unwrap_or(0) as u8
    }

    /// Get note from pitch class
    pub fn from_pitch_class(pc: u8) -> Self {
        Note::ALL[(pc % 12) as usize]
    }

    /// Pitch class of a natural letter name
    fn letter_class(letter: char) -> Option<i32> {
        match letter.to_ascii_uppercase() {
            'C' => Some(0),
            'D' => Some(2),
            'E' => Some(4),
            'F' => Some(5),
            'G' => Some(7),
            'A' => Some(9),
            'B' => Some(11),
            _ => None,
        }
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Note::C => "C",
            Note::Cs => "C#",
            Note::D => "D",
            Note::Ds => "D#",
            Note::E => "E",
            Note::F => "F",
            Note::Fs => "F#",
            Note::G => "G",
            Note::Gs => "G#",
            Note::A => "A",
            Note::As => "A#",
            Note::B => "B",
        };
        f.write_str(name)
    }
}

/// A concrete pitch: note name plus octave
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pitch {
    pub note: Note,
    pub octave: i32,
}

impl Pitch {
    /// Create a pitch
    pub fn new(note: Note, octave: i32) -> Self {
        Self { note, octave }
    }

    /// Parse `"C4"`, `"c#4"`, `"Db4"`, `"B-1"`. The octave is required.
    pub fn parse(s: &str) -> Option<Self> {
        let mut chars = s.trim().chars().peekable();
        let letter = Note::letter_class(chars.next()?)?;
        let accidental = match chars.peek() {
            Some('#') => {
                chars.next();
                1
            }
            Some('b') => {
                chars.next();
                -1
            }
            _ => 0,
        };
        let octave_str: String = chars.collect();
        let digits = octave_str.strip_prefix('-').unwrap_or(&octave_str);
        if digits.is_empty() || digits.len() > 2 || !digits.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        let octave: i32 = octave_str.parse().ok()?;
        Some(Self::from_index(octave * 12 + letter + accidental))
    }

    /// Absolute chromatic index (octave * 12 + pitch class)
    pub fn index(self) -> i32 {
        self.octave * 12 + self.note.pitch_class() as i32
    }

    /// Inverse of [`Pitch::index`]
    pub fn from_index(index: i32) -> Self {
        Self {
            note: Note::from_pitch_class(index.rem_euclid(12) as u8),
            octave: index.div_euclid(12),
        }
    }

    /// Shift by semitones. `None` when the index leaves the `i32` range.
    pub fn shifted(self, semitones: Semitones) -> Option<Self> {
        self.index().checked_add(semitones).map(Self::from_index)
    }
}

impl fmt::Display for Pitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.note, self.octave)
    }
}

/// Shift a pitch identifier. Identifiers that do not parse come back unchanged.
pub fn shift_pitch(pitch: &str, semitones: Semitones) -> String {
    if semitones == 0 {
        return pitch.to_string();
    }
    match Pitch::parse(pitch) {
        Some(p) => match p.shifted(semitones) {
            Some(shifted) => shifted.to_string(),
            None => pitch.to_string(),
        },
        None => pitch.to_string(),
    }
}

/// Every pitch between two pitches, inclusive, in ascending order
pub fn chromatic_range(from: &str, to: &str) -> Option<Vec<String>> {
    let a = Pitch::parse(from)?.index();
    let b = Pitch::parse(to)?.index();
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    Some((lo..=hi).map(|i| Pitch::from_index(i).to_string()).collect())
}
