//! The persisted strategy file: run metadata plus the averaged policy.
//!
//! Policies map canonical infoset keys to eight-slot probability vectors in
//! wire action order. Files are JSON; probabilities are rounded to eight
//! decimals on save, so `load(save(p))` reproduces `p` within 1e-8.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::PolicyError;
use crate::game::NUM_ACTIONS;

/// Why a training run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    TargetIterationsReached,
    PlateauReached,
}

/// Evaluation results against the fixed opponent profiles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalSummary {
    /// (profile name, bot EV per hand in big blinds).
    pub per_profile: Vec<(String, f64)>,
    /// Mean EV across profiles.
    pub aggregate: f64,
}

/// One checkpoint's worth of trainer telemetry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointRecord {
    pub iteration: u64,
    pub infosets: usize,
    pub iters_per_sec: f64,
    /// Approximate bytes held by the node table.
    pub table_bytes: usize,
    /// Mean L1 drift vs the previous exported policy.
    pub drift: f64,
    pub eval: EvalSummary,
}

/// Strategy-file metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyMeta {
    pub iterations: u64,
    pub seed: u64,
    pub small_blind: f64,
    pub big_blind: f64,
    pub start_stack: f64,
    pub max_raises: u8,
    pub equity_trials: u32,
    pub abstraction_version: String,
    pub stop_reason: StopReason,
    pub checkpoints: Vec<CheckpointRecord>,
}

/// Infoset key → action-probability vector.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PolicyTable {
    map: FxHashMap<String, [f64; NUM_ACTIONS]>,
}

impl PolicyTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the vector for a key.
    pub fn insert(&mut self, key: String, probs: [f64; NUM_ACTIONS]) {
        self.map.insert(key, probs);
    }

    /// Probabilities for a key, if trained.
    #[must_use]
    pub fn lookup(&self, key: &str) -> Option<&[f64; NUM_ACTIONS]> {
        self.map.get(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &[f64; NUM_ACTIONS])> {
        self.map.iter()
    }

    /// Round every probability to eight decimals, the on-disk precision.
    fn rounded(&self) -> Self {
        let map = self
            .map
            .iter()
            .map(|(k, v)| {
                let mut r = [0.0; NUM_ACTIONS];
                for (slot, &p) in r.iter_mut().zip(v) {
                    *slot = (p * 1e8).round() / 1e8;
                }
                (k.clone(), r)
            })
            .collect();
        Self { map }
    }
}

/// A complete strategy file: meta block plus policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyFile {
    pub meta: PolicyMeta,
    pub policy: PolicyTable,
}

impl PolicyFile {
    /// Write the file as pretty JSON with rounded probabilities.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or serialized.
    pub fn save(&self, path: &Path) -> Result<(), PolicyError> {
        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        let on_disk = Self {
            meta: self.meta.clone(),
            policy: self.policy.rounded(),
        };
        serde_json::to_writer_pretty(writer, &on_disk)
            .map_err(|e| PolicyError::Serialization(e.to_string()))
    }

    /// Load a strategy file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or not a valid strategy file.
    pub fn load(path: &Path) -> Result<Self, PolicyError> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        serde_json::from_reader(reader).map_err(|e| PolicyError::Serialization(e.to_string()))
    }
}
