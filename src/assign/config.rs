//! Assigner configuration.

use crate::generator::GeneratorConfig;
use crate::npc::RaceAliases;
use std::collections::BTreeSet;

/// Configuration for [`AssetAssigner`](super::AssetAssigner).
///
/// # Examples
///
/// ```
/// use u_variants::assign::AssignerConfig;
///
/// let config = AssignerConfig::default()
///     .with_link_npcs_with_same_name(true)
///     .with_unique_name_exclusion("Guard")
///     .with_seed(7);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AssignerConfig {
    /// Record every successful assignment into the NPC's consistency record
    /// and honor previously recorded assignments.
    pub enable_consistency: bool,

    /// Give unique NPCs of the same name and gender the same combination.
    pub link_npcs_with_same_name: bool,

    /// Names never treated as linked uniques (case-insensitive).
    pub unique_name_exclusions: BTreeSet<String>,

    /// Races that receive assets as if they were another race.
    pub race_aliases: RaceAliases,

    /// Whether roster runs may assign NPCs in parallel using rayon.
    ///
    /// Only honored with the `parallel` cargo feature. Parallel runs give up
    /// the first-come ordering of unique-name linking.
    pub parallel: bool,

    /// Random seed for reproducibility. `None` uses a random seed.
    pub seed: Option<u64>,

    pub generator: GeneratorConfig,
}

impl Default for AssignerConfig {
    fn default() -> Self {
        Self {
            enable_consistency: true,
            link_npcs_with_same_name: false,
            unique_name_exclusions: BTreeSet::new(),
            race_aliases: RaceAliases::new(),
            parallel: false,
            seed: None,
            generator: GeneratorConfig::default(),
        }
    }
}

impl AssignerConfig {
    pub fn with_consistency(mut self, enabled: bool) -> Self {
        self.enable_consistency = enabled;
        self
    }

    pub fn with_link_npcs_with_same_name(mut self, enabled: bool) -> Self {
        self.link_npcs_with_same_name = enabled;
        self
    }

    pub fn with_unique_name_exclusion(mut self, name: impl Into<String>) -> Self {
        self.unique_name_exclusions.insert(name.into());
        self
    }

    pub fn with_race_aliases(mut self, aliases: RaceAliases) -> Self {
        self.race_aliases = aliases;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_generator(mut self, generator: GeneratorConfig) -> Self {
        self.generator = generator;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        self.generator.validate()?;
        if self.unique_name_exclusions.iter().any(|n| n.trim().is_empty()) {
            return Err("unique_name_exclusions must not contain blank names".into());
        }
        Ok(())
    }
}
