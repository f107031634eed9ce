//! Artifact-Ledger: versioned artifact storage and run records
//!
//! This crate is the persistence layer for basic-cleaning pipeline steps.
//! A step resolves its input through an [`ArtifactStore`], uploads its
//! output as a new artifact version, and keeps its configuration snapshot
//! and lineage in a [`RunLedger`].
//!
//! ## Layer 0 - Data/Persistence
//!
//! Focus: immutability of stored versions, content integrity, lineage.
//!
//! ## Key Components
//!
//! - `ArtifactRef`: `[<project>/]<name>[:latest|:v<N>]` references
//! - `FsArtifactStore` / `FsRunLedger`: filesystem backends
//! - `fakes`: in-memory implementations for tests

mod error;
pub mod fakes;
pub mod fs;
pub mod reference;
pub mod storage_traits;

pub use error::StorageError;
pub use fs::{FsArtifactStore, FsRunLedger};
pub use reference::{ArtifactAlias, ArtifactRef};
pub use storage_traits::{
    ArtifactDraft, ArtifactFile, ArtifactRecord, ArtifactStore, ContentDigest, LocalArtifact,
    RunId, RunLedger, RunRecord, RunStatus, RunSummary, StagedFile, StorageResult,
};
