//! Per-scan state shared by extractors.
//!
//! A [`ScanContext`] lives for one generation run. It replaces process-wide
//! caches: parsed documents keyed by content hash, the commands that were
//! run, warnings, circuit-breaker counters and temporary directories all
//! belong to the scan and are released by [`ScanContext::finish`].

use crate::config::ExecutionConfig;
use crate::model::Bom;
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Shared, thread-safe state of one scan.
#[derive(Debug, Default)]
pub struct ScanContext {
    execution: ExecutionConfig,
    state: Mutex<ScanState>,
}

#[derive(Debug, Default)]
struct ScanState {
    documents: HashMap<u64, Bom>,
    commands: Vec<String>,
    warnings: Vec<String>,
    failures: HashMap<String, u32>,
    temp_dirs: Vec<PathBuf>,
}

/// Summary of a finished scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanReport {
    /// Command lines that were executed, in order
    pub commands_invoked: Vec<String>,
    /// Non-fatal problems, in order
    pub warnings: Vec<String>,
    /// Programs that hit the failure threshold
    pub open_circuits: Vec<String>,
    /// Distinct documents parsed
    pub documents_parsed: usize,
}

impl ScanContext {
    #[must_use]
    pub fn new(execution: ExecutionConfig) -> Self {
        Self {
            execution,
            state: Mutex::default(),
        }
    }

    /// Execution limits for external commands.
    #[must_use]
    pub const fn execution(&self) -> &ExecutionConfig {
        &self.execution
    }

    fn state(&self) -> MutexGuard<'_, ScanState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// A previously parsed document with this content hash.
    #[must_use]
    pub fn cached_document(&self, hash: u64) -> Option<Bom> {
        self.state().documents.get(&hash).cloned()
    }

    pub fn cache_document(&self, hash: u64, bom: Bom) {
        self.state().documents.insert(hash, bom);
    }

    pub fn record_command(&self, command_line: impl Into<String>) {
        self.state().commands.push(command_line.into());
    }

    /// Record a non-fatal problem and log it.
    pub fn warn(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!("{}", message);
        self.state().warnings.push(message);
    }

    /// Whether `program` failed often enough to be skipped.
    #[must_use]
    pub fn circuit_open(&self, program: &str) -> bool {
        self.state()
            .failures
            .get(program)
            .is_some_and(|count| *count >= self.execution.circuit_breaker_threshold)
    }

    /// Count a failed or empty run of `program`.
    pub fn record_failure(&self, program: &str) {
        let mut state = self.state();
        let count = state.failures.entry(program.to_string()).or_insert(0);
        *count += 1;
        if *count == self.execution.circuit_breaker_threshold {
            tracing::info!(
                "{} failed {} times in a row; not invoking it again in this scan",
                program,
                count
            );
        }
    }

    /// Reset the failure count of `program`.
    pub fn record_success(&self, program: &str) {
        self.state().failures.remove(program);
    }

    /// Remove `dir` when the scan finishes.
    pub fn register_temp_dir(&self, dir: PathBuf) {
        self.state().temp_dirs.push(dir);
    }

    /// Release scan resources and summarize the scan.
    #[must_use]
    pub fn finish(self) -> ScanReport {
        let threshold = self.execution.circuit_breaker_threshold;
        let state = self.state.into_inner().unwrap_or_else(PoisonError::into_inner);
        for dir in &state.temp_dirs {
            if let Err(e) = std::fs::remove_dir_all(dir) {
                tracing::debug!("Could not remove {}: {}", dir.display(), e);
            }
        }
        let mut open_circuits: Vec<String> = state
            .failures
            .into_iter()
            .filter(|(_, count)| *count >= threshold)
            .map(|(program, _)| program)
            .collect();
        open_circuits.sort();
        ScanReport {
            commands_invoked: state.commands,
            warnings: state.warnings,
            open_circuits,
            documents_parsed: state.documents.len(),
        }
    }
}
