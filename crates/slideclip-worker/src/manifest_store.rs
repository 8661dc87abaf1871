//! Manifest persistence.
//!
//! The manifest is rewritten in full after every checkpoint. Writes go to a
//! temporary file in the output directory and are renamed over the previous
//! manifest, so an interrupted run always leaves a readable manifest behind.

use std::path::{Path, PathBuf};

use tracing::debug;

use slideclip_media::fs_utils::{ensure_dir, write_atomic};
use slideclip_models::{ClipRecord, Manifest};

use crate::config::MANIFEST_FILE;
use crate::error::{PipelineError, PipelineResult};

/// Reads and writes `sections_summary.json` in an output directory.
#[derive(Debug, Clone)]
pub struct ManifestStore {
    path: PathBuf,
}

impl ManifestStore {
    pub fn new(output_dir: impl AsRef<Path>) -> Self {
        Self {
            path: output_dir.as_ref().join(MANIFEST_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Load the manifest; a missing file is an empty manifest.
    pub async fn load(&self) -> PipelineResult<Manifest> {
        if !self.exists() {
            return Ok(Manifest::new());
        }

        let contents = tokio::fs::read_to_string(&self.path).await?;
        let clips: Vec<ClipRecord> = serde_json::from_str(&contents).map_err(|e| {
            PipelineError::manifest_error(format!(
                "{} is not a valid manifest: {}",
                self.path.display(),
                e
            ))
        })?;
        let manifest = Manifest::from_clips(clips)?;

        debug!(path = %self.path.display(), clips = manifest.len(), "Loaded manifest");
        Ok(manifest)
    }

    /// Replace the manifest on disk.
    pub async fn save(&self, manifest: &Manifest) -> PipelineResult<()> {
        let json = serde_json::to_vec_pretty(manifest)?;
        if let Some(parent) = self.path.parent() {
            ensure_dir(parent).await?;
        }
        write_atomic(&self.path, &json)?;

        debug!(path = %self.path.display(), clips = manifest.len(), "Saved manifest");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slideclip_models::{ModelError, Segment};
    use tempfile::TempDir;

    fn clip(section: u32) -> ClipRecord {
        let start = f64::from(section - 1) * 4.0;
        let segment = Segment::new(section, start, start + 4.0).unwrap();
        ClipRecord::extracted(
            &segment,
            format!("section_{:03}.jpg", section),
            format!("section_{:03}.wav", section),
            4.0,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_missing_manifest_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = ManifestStore::new(dir.path());
        assert!(!store.exists());
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let store = ManifestStore::new(dir.path().join("out"));
        let manifest = Manifest::from_clips(vec![clip(2), clip(1)]).unwrap();

        store.save(&manifest).await.unwrap();
        let loaded = store.load().await.unwrap();

        assert_eq!(loaded, manifest);
        let sections: Vec<u32> = loaded.iter().map(|c| c.section).collect();
        assert_eq!(sections, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_manifest_is_a_plain_array() {
        let dir = TempDir::new().unwrap();
        let store = ManifestStore::new(dir.path());
        store
            .save(&Manifest::from_clips(vec![clip(1)]).unwrap())
            .await
            .unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(store.path()).unwrap()).unwrap();
        let first = &raw.as_array().unwrap()[0];
        assert_eq!(first["section"], 1);
        assert_eq!(first["image"], "section_001.jpg");
        assert_eq!(first["trim_start"], 0.0);
    }

    #[tokio::test]
    async fn test_corrupt_manifest() {
        let dir = TempDir::new().unwrap();
        let store = ManifestStore::new(dir.path());
        std::fs::write(store.path(), "{\"section\": 1}").unwrap();

        let err = store.load().await.unwrap_err();
        assert!(matches!(err, PipelineError::ManifestError(_)));
    }

    #[tokio::test]
    async fn test_duplicate_sections_rejected() {
        let dir = TempDir::new().unwrap();
        let store = ManifestStore::new(dir.path());
        let json = serde_json::to_string(&vec![clip(1), clip(1)]).unwrap();
        std::fs::write(store.path(), json).unwrap();

        let err = store.load().await.unwrap_err();
        assert!(matches!(err, PipelineError::Model(ModelError::DuplicateSection(1))));
    }
}
