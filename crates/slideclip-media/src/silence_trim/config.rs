//! Trim policies.
//!
//! The conversion pass runs on freshly extracted audio and is the more
//! cautious of the two; the cleanup pass runs on already trimmed MP3s and
//! may cut a larger share, but only bothers re-encoding for trims that are
//! audible.

use serde::{Deserialize, Deserializer, Serialize};

/// Parameters of one trimming pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrimPolicy {
    /// Level below which audio counts as silence (dB).
    pub noise_floor_db: f64,

    /// Shortest stretch reported as silence (seconds).
    pub min_silence_secs: f64,

    /// Silence kept before the first sound (seconds).
    pub padding_lead_secs: f64,

    /// Silence kept after the last sound (seconds).
    pub padding_tail_secs: f64,

    /// Cap on each of lead and tail trim as a fraction of the clip.
    pub max_trim_fraction: f64,

    /// Silence starting or ending this close to an edge counts as touching it.
    pub edge_epsilon_secs: f64,

    /// Trims that would leave less audio than this are vetoed.
    pub min_viable_secs: f64,

    /// Re-encode only when the lead or tail trim exceeds this (seconds).
    ///
    /// `0.0` means any non-zero trim is applied.
    pub min_significant_trim_secs: f64,
}

impl Default for TrimPolicy {
    fn default() -> Self {
        Self::conversion()
    }
}

impl TrimPolicy {
    /// Policy for the first pass, applied while converting WAV to MP3.
    pub fn conversion() -> Self {
        Self {
            noise_floor_db: -40.0,
            min_silence_secs: 0.3,
            padding_lead_secs: 0.1,
            padding_tail_secs: 0.1,
            max_trim_fraction: 0.3,
            edge_epsilon_secs: 0.1,
            min_viable_secs: 0.5,
            min_significant_trim_secs: 0.0,
        }
    }

    /// Policy for the second pass over the converted MP3s.
    pub fn cleanup() -> Self {
        Self {
            noise_floor_db: -40.0,
            min_silence_secs: 0.2,
            padding_lead_secs: 0.05,
            padding_tail_secs: 0.1,
            max_trim_fraction: 0.4,
            edge_epsilon_secs: 0.1,
            min_viable_secs: 0.5,
            min_significant_trim_secs: 0.1,
        }
    }

    /// Builder-style setter for the noise floor.
    pub fn with_noise_floor_db(mut self, db: f64) -> Self {
        self.noise_floor_db = db;
        self
    }

    /// Builder-style setter for both paddings.
    pub fn with_padding(mut self, lead_secs: f64, tail_secs: f64) -> Self {
        self.padding_lead_secs = lead_secs.max(0.0);
        self.padding_tail_secs = tail_secs.max(0.0);
        self
    }

    /// Builder-style setter for the per-edge trim cap.
    pub fn with_max_trim_fraction(mut self, fraction: f64) -> Self {
        self.max_trim_fraction = fraction.clamp(0.0, 1.0);
        self
    }

    /// Check that every field is usable.
    pub fn validate(&self) -> Result<(), String> {
        let non_negative = [
            ("min_silence_secs", self.min_silence_secs),
            ("padding_lead_secs", self.padding_lead_secs),
            ("padding_tail_secs", self.padding_tail_secs),
            ("edge_epsilon_secs", self.edge_epsilon_secs),
            ("min_viable_secs", self.min_viable_secs),
            ("min_significant_trim_secs", self.min_significant_trim_secs),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("{} must be a non-negative number, got {}", name, value));
            }
        }
        if !self.noise_floor_db.is_finite() || self.noise_floor_db > 0.0 {
            return Err(format!(
                "noise_floor_db must be at most 0 dB, got {}",
                self.noise_floor_db
            ));
        }
        if !(0.0..=1.0).contains(&self.max_trim_fraction) {
            return Err(format!(
                "max_trim_fraction must be within 0..=1, got {}",
                self.max_trim_fraction
            ));
        }
        Ok(())
    }
}

/// Fields of a policy as written in a policy file; any may be left out.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct PolicyOverrides {
    noise_floor_db: Option<f64>,
    min_silence_secs: Option<f64>,
    padding_lead_secs: Option<f64>,
    padding_tail_secs: Option<f64>,
    max_trim_fraction: Option<f64>,
    edge_epsilon_secs: Option<f64>,
    min_viable_secs: Option<f64>,
    min_significant_trim_secs: Option<f64>,
}

impl PolicyOverrides {
    fn apply(self, base: TrimPolicy) -> TrimPolicy {
        TrimPolicy {
            noise_floor_db: self.noise_floor_db.unwrap_or(base.noise_floor_db),
            min_silence_secs: self.min_silence_secs.unwrap_or(base.min_silence_secs),
            padding_lead_secs: self.padding_lead_secs.unwrap_or(base.padding_lead_secs),
            padding_tail_secs: self.padding_tail_secs.unwrap_or(base.padding_tail_secs),
            max_trim_fraction: self.max_trim_fraction.unwrap_or(base.max_trim_fraction),
            edge_epsilon_secs: self.edge_epsilon_secs.unwrap_or(base.edge_epsilon_secs),
            min_viable_secs: self.min_viable_secs.unwrap_or(base.min_viable_secs),
            min_significant_trim_secs: self
                .min_significant_trim_secs
                .unwrap_or(base.min_significant_trim_secs),
        }
    }
}

fn conversion_overrides<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<TrimPolicy, D::Error> {
    PolicyOverrides::deserialize(deserializer).map(|o| o.apply(TrimPolicy::conversion()))
}

fn cleanup_overrides<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<TrimPolicy, D::Error> {
    PolicyOverrides::deserialize(deserializer).map(|o| o.apply(TrimPolicy::cleanup()))
}

/// The policies of both passes, as loaded from a policy file.
///
/// A pass missing from the file keeps its default policy, and a field missing
/// from a pass keeps that pass's default value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrimPolicies {
    #[serde(
        default = "TrimPolicy::conversion",
        deserialize_with = "conversion_overrides"
    )]
    pub conversion: TrimPolicy,
    #[serde(default = "TrimPolicy::cleanup", deserialize_with = "cleanup_overrides")]
    pub cleanup: TrimPolicy,
}

impl Default for TrimPolicies {
    fn default() -> Self {
        Self {
            conversion: TrimPolicy::conversion(),
            cleanup: TrimPolicy::cleanup(),
        }
    }
}

impl TrimPolicies {
    /// Validate both policies.
    pub fn validate(&self) -> Result<(), String> {
        self.conversion
            .validate()
            .map_err(|e| format!("conversion policy: {}", e))?;
        self.cleanup
            .validate()
            .map_err(|e| format!("cleanup policy: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        let conversion = TrimPolicy::conversion();
        assert_eq!(conversion.max_trim_fraction, 0.3);
        assert_eq!(conversion.min_silence_secs, 0.3);
        assert_eq!(conversion.min_significant_trim_secs, 0.0);

        let cleanup = TrimPolicy::cleanup();
        assert_eq!(cleanup.max_trim_fraction, 0.4);
        assert_eq!(cleanup.padding_lead_secs, 0.05);
        assert_eq!(cleanup.min_significant_trim_secs, 0.1);

        assert!(conversion.validate().is_ok());
        assert!(cleanup.validate().is_ok());
    }

    #[test]
    fn test_builder_pattern() {
        let policy = TrimPolicy::cleanup()
            .with_padding(0.2, -1.0)
            .with_max_trim_fraction(1.5);

        assert_eq!(policy.padding_lead_secs, 0.2);
        assert_eq!(policy.padding_tail_secs, 0.0);
        assert_eq!(policy.max_trim_fraction, 1.0);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut policy = TrimPolicy::conversion();
        policy.min_viable_secs = -0.5;
        assert!(policy.validate().unwrap_err().contains("min_viable_secs"));

        let policy = TrimPolicy::conversion().with_noise_floor_db(12.0);
        assert!(policy.validate().is_err());
    }

    #[test]
    fn test_partial_policy_file() {
        let json = r#"{ "cleanup": { "padding_lead_secs": 0.2 } }"#;

        let policies: TrimPolicies = serde_json::from_str(json).unwrap();
        assert_eq!(policies.conversion, TrimPolicy::conversion());
        assert_eq!(policies.cleanup.padding_lead_secs, 0.2);
        assert_eq!(
            policies.cleanup,
            TrimPolicy::cleanup().with_padding(0.2, TrimPolicy::cleanup().padding_tail_secs)
        );
        assert!(policies.validate().is_ok());
    }

    #[test]
    fn test_missing_fields_use_their_own_pass_defaults() {
        let json = r#"{ "conversion": { "min_viable_secs": 1.0 }, "cleanup": {} }"#;

        let policies: TrimPolicies = serde_json::from_str(json).unwrap();
        assert_eq!(policies.conversion.min_viable_secs, 1.0);
        assert_eq!(policies.conversion.max_trim_fraction, 0.3);
        assert_eq!(policies.conversion.min_silence_secs, 0.3);
        assert_eq!(policies.cleanup, TrimPolicy::cleanup());

        let policies: TrimPolicies = serde_json::from_str("{}").unwrap();
        assert_eq!(policies, TrimPolicies::default());
    }

    #[test]
    fn test_unknown_policy_field_is_rejected() {
        let json = r#"{ "cleanup": { "padding_secs": 0.2 } }"#;
        assert!(serde_json::from_str::<TrimPolicies>(json).is_err());
    }
}
