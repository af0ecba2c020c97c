// Error types for the simulation library.
//
// Nothing in the simulation core is fatal. Each failure has a fallback:
// - `ActionError`: a build or mine input that cannot be applied. The world is
//   left untouched and the rejection is reported as a `SimEvent`.
// - `SnapshotError`: persisted data that fails to parse or validate. The
//   caller keeps whatever state it already has.
// - `StoreError` / `PersistError`: the key-value store could not be read or
//   written. Logged by the session; the next save trigger retries.
// - `ConfigError`: only surfaced to drivers at startup.

use crate::types::CellKey;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Why a build or mine action was rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ActionError {
    /// Build target cell already holds a block.
    #[error("cell {0} is already occupied")]
    OccupiedCell(CellKey),
    /// Mine target is indestructible.
    #[error("block at {0} is indestructible")]
    ProtectedBlock(CellKey),
    /// Build target is within the avatar's clearance radius.
    #[error("cell {0} is too close to the avatar")]
    OutOfRange(CellKey),
    /// No block within reach along the view ray.
    #[error("no block within reach")]
    NoTarget,
    /// The view ray starts inside the picked block, so there is no face to
    /// build against.
    #[error("no face to build against at {0}")]
    NoFace(CellKey),
}

/// A persisted snapshot could not be used.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("malformed snapshot: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("invalid player pose: {0}")]
    InvalidPose(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O failed for key {key:?}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid store key {0:?}")]
    InvalidKey(String),
}

/// Saving a snapshot failed.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("failed to encode snapshot: {0}")]
    Encode(#[source] serde_json::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}
