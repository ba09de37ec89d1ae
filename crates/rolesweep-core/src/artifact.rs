//! Candidate artifact persistence
//!
//! The artifact is the sole handoff between the scan and removal phases: a
//! human-reviewable JSON array of candidate records. The removal engine
//! consumes it as the authoritative removal intent and never re-derives
//! candidates from a live scan.

use crate::error::{SweepError, SweepResult};
use crate::model::AssignmentRecord;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Write the candidate list, pretty-printed for review
///
/// Writes to a sibling temp file first and renames into place so a crashed
/// run never leaves a truncated artifact behind.
pub fn write(path: &Path, records: &[AssignmentRecord]) -> SweepResult<()> {
    let json = serde_json::to_string_pretty(records)?;
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, json)?;
    fs::rename(&tmp, path)?;
    debug!("wrote {} record(s) to {}", records.len(), path.display());
    Ok(())
}

/// Load and validate a candidate list
///
/// Every record must carry the identifying triple the removal engine deletes
/// by; a record missing any of it fails the whole load rather than being
/// silently dropped, since the reviewed artifact is a contract.
pub fn load(path: &Path) -> SweepResult<Vec<AssignmentRecord>> {
    let raw = fs::read_to_string(path).map_err(|e| {
        SweepError::Artifact(format!("cannot read '{}': {e}", path.display()))
    })?;
    let records: Vec<AssignmentRecord> = serde_json::from_str(&raw)
        .map_err(|e| SweepError::Artifact(format!("cannot parse '{}': {e}", path.display())))?;

    for (index, record) in records.iter().enumerate() {
        if !record.is_well_formed() {
            return Err(SweepError::Artifact(format!(
                "record {index} ('{}') is missing identifying fields",
                record.assignment_name
            )));
        }
    }
    Ok(records)
}
