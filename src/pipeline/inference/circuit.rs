use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Mutex, PoisonError};

use serde::Serialize;

use super::FlagStoreError;

/// Durable home of the forced-simulation flag.
pub trait SimulationFlagStore: Send + Sync {
    fn load(&self) -> Result<bool, FlagStoreError>;
    fn save(&self, forced: bool) -> Result<(), FlagStoreError>;
}

/// In-process flag store. Survives nothing; used by tests and `--mock` runs.
#[derive(Debug, Default)]
pub struct MemoryFlagStore {
    forced: AtomicBool,
}

impl MemoryFlagStore {
    pub fn new(forced: bool) -> Self {
        Self {
            forced: AtomicBool::new(forced),
        }
    }
}

impl SimulationFlagStore for MemoryFlagStore {
    fn load(&self) -> Result<bool, FlagStoreError> {
        Ok(self.forced.load(Ordering::SeqCst))
    }

    fn save(&self, forced: bool) -> Result<(), FlagStoreError> {
        self.forced.store(forced, Ordering::SeqCst);
        Ok(())
    }
}

/// Flag persisted as a marker file: present with `true` when forced,
/// removed when cleared.
#[derive(Debug, Clone)]
pub struct FileFlagStore {
    path: PathBuf,
}

impl FileFlagStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SimulationFlagStore for FileFlagStore {
    fn load(&self) -> Result<bool, FlagStoreError> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(content.trim().eq_ignore_ascii_case("true")),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(FlagStoreError::Io {
                path: self.path.clone(),
                source: e,
            }),
        }
    }

    fn save(&self, forced: bool) -> Result<(), FlagStoreError> {
        let io_err = |source| FlagStoreError::Io {
            path: self.path.clone(),
            source,
        };

        if forced {
            if let Some(parent) = self.path.parent() {
                fs::create_dir_all(parent).map_err(io_err)?;
            }
            fs::write(&self.path, "true").map_err(io_err)
        } else {
            match fs::remove_file(&self.path) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(io_err(e)),
            }
        }
    }
}

/// Point-in-time view of the breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CircuitState {
    pub consecutive_failures: u32,
    pub simulation_forced: bool,
    pub threshold: u32,
}

/// Consecutive-failure breaker in front of the inference service.
///
/// Reaching `threshold` consecutive failures forces simulation mode, which
/// is persisted through the flag store and cleared by the next success or
/// by an explicit [`CircuitBreaker::reset`]. Reads are lock-free; flag
/// transitions are serialized so the store never disagrees with memory.
pub struct CircuitBreaker {
    consecutive_failures: AtomicU32,
    simulation_forced: AtomicBool,
    threshold: u32,
    store: Box<dyn SimulationFlagStore>,
    transition: Mutex<()>,
}

impl CircuitBreaker {
    pub const DEFAULT_THRESHOLD: u32 = 2;

    /// Restore the forced flag from `store`. An unreadable store starts
    /// the breaker closed.
    pub fn new(threshold: u32, store: Box<dyn SimulationFlagStore>) -> Self {
        let forced = store.load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Circuit: could not read simulation flag, assuming live mode");
            false
        });
        if forced {
            tracing::info!("Circuit: simulation mode restored from previous session");
        }

        Self {
            consecutive_failures: AtomicU32::new(0),
            simulation_forced: AtomicBool::new(forced),
            threshold: threshold.max(1),
            store,
            transition: Mutex::new(()),
        }
    }

    pub fn in_memory(threshold: u32) -> Self {
        Self::new(threshold, Box::new(MemoryFlagStore::default()))
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    pub fn is_simulation_forced(&self) -> bool {
        self.simulation_forced.load(Ordering::SeqCst)
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> CircuitState {
        CircuitState {
            consecutive_failures: self.consecutive_failures(),
            simulation_forced: self.is_simulation_forced(),
            threshold: self.threshold,
        }
    }

    /// Count one failure, opening the circuit at the threshold.
    pub fn record_failure(&self) -> CircuitState {
        let failures = self
            .consecutive_failures
            .fetch_add(1, Ordering::SeqCst)
            .saturating_add(1);

        if failures >= self.threshold && self.set_forced(true) {
            tracing::warn!(
                failures,
                threshold = self.threshold,
                "Circuit: failure threshold reached, switching to simulation mode"
            );
        }
        self.snapshot()
    }

    /// A live success closes the circuit and clears the persisted flag.
    pub fn record_success(&self) {
        self.consecutive_failures.store(0, Ordering::SeqCst);
        if self.set_forced(false) {
            tracing::info!("Circuit: inference service recovered, simulation mode cleared");
        }
    }

    /// Enter simulation mode on request.
    pub fn force_simulation(&self) {
        if self.set_forced(true) {
            tracing::info!("Circuit: simulation mode forced");
        }
    }

    /// Explicit external reset: counter to zero, flag cleared.
    pub fn reset(&self) {
        self.consecutive_failures.store(0, Ordering::SeqCst);
        if self.set_forced(false) {
            tracing::info!("Circuit: reset, live inference re-enabled");
        }
    }

    /// Returns true when the flag actually changed.
    fn set_forced(&self, forced: bool) -> bool {
        let _guard = self
            .transition
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if self.simulation_forced.swap(forced, Ordering::SeqCst) == forced {
            return false;
        }
        if let Err(e) = self.store.save(forced) {
            tracing::warn!(error = %e, forced, "Circuit: could not persist simulation flag");
        }
        true
    }
}

impl std::fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("state", &self.snapshot())
            .finish_non_exhaustive()
    }
}
