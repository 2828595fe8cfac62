// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Distribution results written as JSON files
//!
//! One file per serie and day, `distribution_<serie>_<YYYY-MM-DD>.json`. A second
//! draw of the same serie on the same day replaces the earlier file.
//!
//! ASCII letters, digits and `-` are kept in the file name; every other byte of
//! the serie id, `_` included, is written as `_XX` in uppercase hex, so distinct
//! serie ids never share a file.

use std::path::{Path, PathBuf};

use source_client::{AssignmentSink, DistributionAssignment, SourceError};
use tracing::{debug, info};

/// Sink writing each assignment to a dated file under one directory
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    output_dir: PathBuf,
}

impl JsonFileSink {
    /// Create a sink writing into `output_dir`, created on first write if missing
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Directory the sink writes into
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Path the given assignment is written to
    pub fn path_for(&self, assignment: &DistributionAssignment) -> PathBuf {
        let serie = encode_serie(assignment.serie_id.as_str());
        self.output_dir.join(format!(
            "distribution_{serie}_{}.json",
            assignment.drawn_at.format("%Y-%m-%d")
        ))
    }
}

fn encode_serie(serie_id: &str) -> String {
    let mut encoded = String::with_capacity(serie_id.len());
    for byte in serie_id.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' {
            encoded.push(char::from(byte));
        } else {
            encoded.push_str(&format!("_{byte:02X}"));
        }
    }
    encoded
}

impl AssignmentSink for JsonFileSink {
    async fn persist(&self, assignment: &DistributionAssignment) -> Result<String, SourceError> {
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| {
                SourceError::io(format!(
                    "could not create output directory {}: {e}",
                    self.output_dir.display()
                ))
            })?;

        let path = self.path_for(assignment);
        let contents = serde_json::to_vec_pretty(assignment)?;
        debug!(path = %path.display(), bytes = contents.len(), "writing distribution file");

        tokio::fs::write(&path, contents)
            .await
            .map_err(|e| SourceError::io(format!("could not write {}: {e}", path.display())))?;

        info!(
            path = %path.display(),
            serie_id = %assignment.serie_id,
            assigned = assignment.assigned_count(),
            unassigned = assignment.unassigned.len(),
            "distribution persisted"
        );
        Ok(path.display().to_string())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use shared_types::{NftId, SerieId, UserId};
    use source_client::AssignmentEntry;

    use super::*;

    fn assignment(serie: &str, winner: &str) -> DistributionAssignment {
        DistributionAssignment {
            serie_id: SerieId::new(serie).unwrap(),
            drawn_at: Utc.with_ymd_and_hms(2024, 5, 17, 9, 30, 0).unwrap(),
            entries: vec![AssignmentEntry {
                nft_id: NftId::new("10").unwrap(),
                user_id: UserId::new(winner).unwrap(),
            }],
            unassigned: vec![NftId::new("11").unwrap()],
        }
    }

    #[tokio::test]
    async fn writes_dated_file_and_overwrites_same_day() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonFileSink::new(dir.path().join("out"));

        let location = sink.persist(&assignment("S1", "alice")).await.unwrap();
        assert!(location.ends_with("distribution_S1_2024-05-17.json"));

        sink.persist(&assignment("S1", "bob")).await.unwrap();
        let written: DistributionAssignment =
            serde_json::from_str(&std::fs::read_to_string(&location).unwrap()).unwrap();
        assert_eq!(written.entries[0].user_id.as_str(), "bob");
        assert_eq!(written.unassigned.len(), 1);
        assert_eq!(std::fs::read_dir(dir.path().join("out")).unwrap().count(), 1);
    }

    #[test]
    fn serie_id_is_escaped_in_file_name() {
        let sink = JsonFileSink::new("/tmp/draws");
        let path = sink.path_for(&assignment("../evil/S1", "alice"));
        assert_eq!(
            path,
            PathBuf::from("/tmp/draws/distribution__2E_2E_2Fevil_2FS1_2024-05-17.json")
        );
    }

    #[test]
    fn distinct_series_never_share_a_file() {
        let sink = JsonFileSink::new("/tmp/draws");
        let slash = sink.path_for(&assignment("a/b", "alice"));
        let underscore = sink.path_for(&assignment("a_b", "alice"));
        assert_ne!(slash, underscore);
        assert!(underscore.ends_with("distribution_a_5Fb_2024-05-17.json"));
    }
}
