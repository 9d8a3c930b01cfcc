//! Generator configuration.

/// Configuration for [`CombinationGenerator`](super::CombinationGenerator).
///
/// # Examples
///
/// ```
/// use u_variants::generator::GeneratorConfig;
///
/// let config = GeneratorConfig::default().with_max_steps_per_seed(500);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeneratorConfig {
    /// Fill/backtrack iterations allowed for one seed before the seed is
    /// abandoned. Search always terminates without it; the budget bounds
    /// pathological packs with many slots and candidates.
    pub max_steps_per_seed: usize,

    /// Maximum number of seeds tried per call. 0 = no limit.
    pub max_seeds: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            max_steps_per_seed: 10_000,
            max_seeds: 0,
        }
    }
}

impl GeneratorConfig {
    pub fn with_max_steps_per_seed(mut self, n: usize) -> Self {
        self.max_steps_per_seed = n;
        self
    }

    pub fn with_max_seeds(mut self, n: usize) -> Self {
        self.max_seeds = n;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_steps_per_seed == 0 {
            return Err("max_steps_per_seed must be at least 1".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GeneratorConfig::default();
        assert_eq!(config.max_steps_per_seed, 10_000);
        assert_eq!(config.max_seeds, 0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_zero_budget() {
        let config = GeneratorConfig::default().with_max_steps_per_seed(0);
        assert!(config.validate().is_err());
    }
}
