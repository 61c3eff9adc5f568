// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Fingering lookup for a twelve-hole ocarina.
//!
//! The core only ever asks two questions: does a pitch have a fingering, and
//! what is it. [`FingeringChart`] answers them from a built-in table plus
//! user overrides persisted in the host store.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::pitch::Pitch;
use crate::error::StoreError;
use crate::store::KeyValueStore;

/// Store key holding fingering overrides as `{pitch: [holeId, ...]}`
pub const OVERRIDES_KEY: &str = "ocarina.fingeringOverrides.v1";

/// A tone hole
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Hole {
    L1,
    L2,
    L3,
    L4,
    R1,
    R2,
    R3,
    R4,
    /// Left sub-hole
    LS,
    /// Right sub-hole
    RS,
    /// Thumb holes
    B1,
    B2,
}

impl Hole {
    /// All holes, front first
    pub const ALL: [Hole; 12] = [
        Hole::L1,
        Hole::L2,
        Hole::L3,
        Hole::L4,
        Hole::R1,
        Hole::R2,
        Hole::R3,
        Hole::R4,
        Hole::LS,
        Hole::RS,
        Hole::B1,
        Hole::B2,
    ];

    /// Parse a hole id such as `"L1"`
    pub fn parse(id: &str) -> Option<Self> {
        Hole::ALL.iter().copied().find(|h| h.id() == id)
    }

    /// Stable id used in storage
    pub fn id(self) -> &'static str {
        match self {
            Hole::L1 => "L1",
            Hole::L2 => "L2",
            Hole::L3 => "L3",
            Hole::L4 => "L4",
            Hole::R1 => "R1",
            Hole::R2 => "R2",
            Hole::R3 => "R3",
            Hole::R4 => "R4",
            Hole::LS => "LS",
            Hole::RS => "RS",
            Hole::B1 => "B1",
            Hole::B2 => "B2",
        }
    }

    /// Whether this is a thumb hole on the back of the body
    pub fn is_back(self) -> bool {
        matches!(self, Hole::B1 | Hole::B2)
    }
}

impl fmt::Display for Hole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// The set of covered holes. Empty means every hole open.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fingering {
    covered: BTreeSet<Hole>,
}

impl Fingering {
    /// All holes open
    pub fn open() -> Self {
        Self::default()
    }

    /// Build from covered holes
    pub fn covering(holes: impl IntoIterator<Item = Hole>) -> Self {
        Self {
            covered: holes.into_iter().collect(),
        }
    }

    /// Build from stored hole ids, ignoring unknown ids
    pub fn from_ids<S: AsRef<str>>(ids: &[S]) -> Self {
        Self::covering(ids.iter().filter_map(|id| Hole::parse(id.as_ref())))
    }

    /// Stored hole ids in canonical order
    pub fn to_ids(&self) -> Vec<String> {
        self.covered.iter().map(|h| h.id().to_string()).collect()
    }

    /// Whether a hole is covered
    pub fn is_covered(&self, hole: Hole) -> bool {
        self.covered.contains(&hole)
    }

    /// Number of covered holes
    pub fn covered_count(&self) -> usize {
        self.covered.len()
    }
}

/// Pitch to fingering lookup consumed by the document and editor
pub trait FingeringLookup {
    /// Whether a pitch has a known fingering
    fn has_fingering(&self, pitch: &str) -> bool;
    /// The fingering for a pitch, or all-open when unknown
    fn lookup(&self, pitch: &str) -> Fingering;
}

/// Built-in chart plus persisted user overrides
#[derive(Debug, Clone)]
pub struct FingeringChart {
    builtin: HashMap<String, Fingering>,
    overrides: HashMap<String, Fingering>,
}

/// Order in which holes open going up the diatonic scale from C4
const OPENING_ORDER: [Hole; 11] = [
    Hole::LS,
    Hole::RS,
    Hole::R4,
    Hole::R3,
    Hole::R2,
    Hole::R1,
    Hole::L4,
    Hole::L3,
    Hole::L2,
    Hole::L1,
    Hole::B2,
];

const DIATONIC_FROM_C4: [&str; 12] = [
    "C4", "D4", "E4", "F4", "G4", "A4", "B4", "C5", "D5", "E5", "F5", "G5",
];

impl FingeringChart {
    /// The default chart with no overrides
    pub fn builtin() -> Self {
        let mut builtin = HashMap::new();
        for (step, pitch) in DIATONIC_FROM_C4.iter().enumerate() {
            let open: Vec<Hole> = OPENING_ORDER.iter().take(step).copied().collect();
            let covered = Hole::ALL.iter().copied().filter(|h| !open.contains(h));
            builtin.insert(pitch.to_string(), Fingering::covering(covered));
        }
        Self {
            builtin,
            overrides: HashMap::new(),
        }
    }

    /// Built-in chart plus overrides read from the store. Unreadable overrides are ignored.
    pub fn load<S: KeyValueStore + ?Sized>(store: &S) -> Self {
        let mut chart = Self::builtin();
        let raw = match store.get(OVERRIDES_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return chart,
            Err(e) => {
                warn!("could not read fingering overrides: {}", e);
                return chart;
            }
        };
        match serde_json::from_str::<HashMap<String, Vec<String>>>(&raw) {
            Ok(map) => {
                chart.overrides = map
                    .into_iter()
                    .map(|(pitch, ids)| (canonical(&pitch), Fingering::from_ids(&ids)))
                    .collect();
            }
            Err(e) => warn!("ignoring malformed fingering overrides: {}", e),
        }
        chart
    }

    /// Record an override and persist the full override map
    pub fn set_override<S: KeyValueStore + ?Sized>(
        &mut self,
        store: &mut S,
        pitch: &str,
        fingering: Fingering,
    ) -> Result<(), StoreError> {
        self.overrides.insert(canonical(pitch), fingering);
        self.persist(store)
    }

    /// Drop an override, falling back to the built-in chart
    pub fn clear_override<S: KeyValueStore + ?Sized>(
        &mut self,
        store: &mut S,
        pitch: &str,
    ) -> Result<(), StoreError> {
        self.overrides.remove(&canonical(pitch));
        self.persist(store)
    }

    fn persist<S: KeyValueStore + ?Sized>(&self, store: &mut S) -> Result<(), StoreError> {
        let map: HashMap<&str, Vec<String>> = self
            .overrides
            .iter()
            .map(|(pitch, f)| (pitch.as_str(), f.to_ids()))
            .collect();
        let json = serde_json::to_string(&map)?;
        store.set(OVERRIDES_KEY, &json)
    }

    fn find(&self, pitch: &str) -> Option<&Fingering> {
        let key = canonical(pitch);
        self.overrides.get(&key).or_else(|| self.builtin.get(&key))
    }
}

impl Default for FingeringChart {
    fn default() -> Self {
        Self::builtin()
    }
}

impl FingeringLookup for FingeringChart {
    fn has_fingering(&self, pitch: &str) -> bool {
        self.find(pitch).is_some()
    }

    fn lookup(&self, pitch: &str) -> Fingering {
        self.find(pitch).cloned().unwrap_or_default()
    }
}

/// Sharp spelling of a pitch so `Db4` and `C#4` share one entry
fn canonical(pitch: &str) -> String {
    Pitch::parse(pitch)
        .map(|p| p.to_string())
        .unwrap_or_else(|| pitch.trim().to_string())
}
