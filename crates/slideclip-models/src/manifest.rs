//! The manifest: every clip record of a run, ordered by section index.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::clip::{ClipRecord, ClipStage};
use crate::error::{ModelError, ModelResult};

/// Ordered collection of clip records keyed by section index.
///
/// Serializes as a plain JSON array so the player page can read it directly.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct Manifest {
    clips: Vec<ClipRecord>,
}

impl Manifest {
    /// Create an empty manifest.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a manifest from records in any order.
    ///
    /// Fails if two records share a section index.
    pub fn from_clips(mut clips: Vec<ClipRecord>) -> ModelResult<Self> {
        clips.sort_by_key(|clip| clip.section);
        if let Some(pair) = clips.windows(2).find(|w| w[0].section == w[1].section) {
            return Err(ModelError::DuplicateSection(pair[0].section));
        }
        Ok(Self { clips })
    }

    /// Insert or replace the record with the same section, keeping order.
    pub fn upsert(&mut self, clip: ClipRecord) {
        match self
            .clips
            .binary_search_by_key(&clip.section, |existing| existing.section)
        {
            Ok(pos) => self.clips[pos] = clip,
            Err(pos) => self.clips.insert(pos, clip),
        }
    }

    /// Merge a batch of records, in whatever order they completed.
    pub fn merge(&mut self, clips: impl IntoIterator<Item = ClipRecord>) {
        for clip in clips {
            self.upsert(clip);
        }
    }

    /// Copies of the records selected by `predicate`, in section order.
    ///
    /// The manifest keeps its own copies, so a checkpoint taken while the
    /// selection is being worked on still lists every clip.
    pub fn select<F>(&self, mut predicate: F) -> Vec<ClipRecord>
    where
        F: FnMut(&ClipRecord) -> bool,
    {
        self.clips.iter().filter(|c| predicate(c)).cloned().collect()
    }

    pub fn get(&self, section: u32) -> Option<&ClipRecord> {
        self.clips
            .binary_search_by_key(&section, |clip| clip.section)
            .ok()
            .map(|pos| &self.clips[pos])
    }

    pub fn clips(&self) -> &[ClipRecord] {
        &self.clips
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClipRecord> {
        self.clips.iter()
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    /// Section indices of clips that have reached `stage`.
    pub fn sections_at(&self, stage: ClipStage) -> Vec<u32> {
        self.clips
            .iter()
            .filter(|clip| clip.stage.has_reached(stage))
            .map(|clip| clip.section)
            .collect()
    }

    /// Section indices of clips whose last step failed.
    pub fn failed_sections(&self) -> Vec<u32> {
        self.clips
            .iter()
            .filter(|clip| clip.failure.is_some())
            .map(|clip| clip.section)
            .collect()
    }

    /// Sum of original clip durations.
    pub fn total_original_duration(&self) -> f64 {
        self.clips.iter().map(|clip| clip.original_duration).sum()
    }

    /// Sum of current clip durations.
    pub fn total_current_duration(&self) -> f64 {
        self.clips.iter().map(|clip| clip.duration).sum()
    }
}
