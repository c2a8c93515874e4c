use serde::Deserialize;

/// Move-class switches and tuning parameters for the step driver.
///
/// The defaults reproduce the canonical configuration: bond and angle moves
/// on, dihedral moves reserved, and step-size tuning toward a 40% acceptance
/// ratio every 1000 steps. Deserializable so an external configuration layer
/// can override individual fields.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MoveConfig {
    pub enable_bond: bool,
    pub enable_angle: bool,
    /// Reserved: dihedral moves have no semantics yet. The flag only widens
    /// the per-batch scale factor split.
    pub enable_dihedral: bool,
    pub enable_tuning: bool,
    /// Acceptance ratio the tuner drives the move deltas toward.
    pub target_acceptance: f64,
    /// Dead zone around the target inside which no adjustment is made.
    pub ratio_margin: f64,
    /// Steps between tuning adjustments.
    pub tune_interval: u64,
}

impl Default for MoveConfig {
    fn default() -> Self {
        Self {
            enable_bond: true,
            enable_angle: true,
            enable_dihedral: false,
            enable_tuning: true,
            target_acceptance: 0.4,
            ratio_margin: 1e-4,
            tune_interval: 1000,
        }
    }
}

impl MoveConfig {
    /// Number of enabled internal move classes, clamped to at least one so
    /// scale factors stay finite with everything disabled.
    pub(crate) fn num_move_types(&self) -> u32 {
        (self.enable_bond as u32 + self.enable_angle as u32 + self.enable_dihedral as u32).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_canonical_configuration() {
        let config = MoveConfig::default();
        assert!(config.enable_bond);
        assert!(config.enable_angle);
        assert!(!config.enable_dihedral);
        assert!(config.enable_tuning);
        assert_eq!(config.target_acceptance, 0.4);
        assert_eq!(config.ratio_margin, 1e-4);
        assert_eq!(config.tune_interval, 1000);
    }

    #[test]
    fn move_type_count_clamps_at_one() {
        let config = MoveConfig {
            enable_bond: false,
            enable_angle: false,
            ..MoveConfig::default()
        };
        assert_eq!(config.num_move_types(), 1);
        assert_eq!(MoveConfig::default().num_move_types(), 2);
    }

    #[test]
    fn partial_deserialization_keeps_the_remaining_defaults() {
        let config: MoveConfig =
            serde_json::from_str(r#"{"enable_angle": false, "tune_interval": 500}"#).unwrap();
        assert!(config.enable_bond);
        assert!(!config.enable_angle);
        assert_eq!(config.tune_interval, 500);
        assert_eq!(config.target_acceptance, 0.4);
    }
}
