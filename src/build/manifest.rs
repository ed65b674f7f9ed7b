// Copyright 2025-present the Jamharah authors
// SPDX-License-Identifier: Apache-2.0

//! Post-build manifest.
//!
//! The pipeline driver records what it produced — entity counts and artifact
//! sizes — as a small JSON file next to the artifacts. Nothing reads it back
//! at query time; it exists for operators and for diffing two builds.

use std::path::Path;

use serde::Serialize;

use crate::error::Result;

#[derive(Debug, Clone, Serialize)]
pub struct ArtifactInfo {
    pub name: String,
    pub bytes: u64,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct IndexManifest {
    pub book_count: u64,
    pub chapter_count: u64,
    pub page_count: u64,
    pub title_count: u64,
    pub block_count: u64,
    pub total_postings: u64,
    pub word_count: u64,
    pub artifacts: Vec<ArtifactInfo>,
}

impl IndexManifest {
    /// Record an artifact's on-disk size; missing files are skipped.
    pub fn add_artifact(&mut self, path: &Path) {
        if let Ok(meta) = std::fs::metadata(path) {
            self.artifacts.push(ArtifactInfo {
                name: path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string()),
                bytes: meta.len(),
            });
        }
    }
}

pub fn write_manifest(path: &Path, manifest: &IndexManifest) -> Result<()> {
    let json = serde_json::to_string_pretty(manifest)
        .map_err(|e| crate::error::Error::format(format!("manifest serialization: {e}")))?;
    std::fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_writes_json() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = dir.path().join("words.idx");
        std::fs::write(&artifact, b"0123456789").unwrap();

        let mut manifest = IndexManifest {
            book_count: 2,
            page_count: 40,
            word_count: 1234,
            ..Default::default()
        };
        manifest.add_artifact(&artifact);

        let out = dir.path().join("index.manifest.json");
        write_manifest(&out, &manifest).unwrap();
        let text = std::fs::read_to_string(&out).unwrap();
        assert!(text.contains("\"word_count\": 1234"));
        assert!(text.contains("\"words.idx\""));
        assert!(text.contains("\"bytes\": 10"));
    }
}
