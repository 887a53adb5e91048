//! World configuration assembled from an optional TOML file and flag overrides.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use colony_core::WorldConfig;

/// Reads a world configuration document, falling back to defaults for omitted keys.
pub(crate) fn load(path: &Path) -> Result<WorldConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read world config at {}", path.display()))?;
    parse(&contents).with_context(|| format!("invalid world config at {}", path.display()))
}

fn parse(contents: &str) -> Result<WorldConfig> {
    let config: WorldConfig =
        toml::from_str(contents).context("failed to parse world config toml contents")?;
    config.validate()?;
    Ok(config)
}

/// Command-line values that take precedence over the configuration document.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct Overrides {
    pub(crate) grid_size: Option<u32>,
    pub(crate) coverage_threshold: Option<f32>,
    pub(crate) max_factories: Option<usize>,
}

impl Overrides {
    pub(crate) fn apply(self, mut config: WorldConfig) -> Result<WorldConfig> {
        if let Some(grid_size) = self.grid_size {
            config.grid_size = grid_size;
        }
        if let Some(threshold) = self.coverage_threshold {
            config.coverage_threshold = threshold;
        }
        if let Some(max_factories) = self.max_factories {
            config.max_factories = max_factories;
        }
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use colony_core::DEFAULT_TILE_TIME;

    #[test]
    fn parse_accepts_partial_documents() {
        let config = parse(
            r#"
                grid_size = 24
                tree_granularity = 4
            "#,
        )
        .expect("valid document");

        assert_eq!(config.grid_size, 24);
        assert_eq!(config.tree_granularity, 4);
        assert_eq!(config.tile_time, DEFAULT_TILE_TIME);
    }

    #[test]
    fn parse_rejects_invalid_values() {
        let error = parse("coverage_threshold = 0.0").expect_err("threshold must be positive");
        assert!(error.to_string().contains("coverage_threshold"));
    }

    #[test]
    fn overrides_replace_document_values() {
        let overrides = Overrides {
            grid_size: Some(12),
            coverage_threshold: Some(0.5),
            max_factories: None,
        };
        let config = overrides
            .apply(WorldConfig::default())
            .expect("valid overrides");

        assert_eq!(config.grid_size, 12);
        assert_eq!(config.coverage_threshold, 0.5);
        assert_eq!(config.max_factories, WorldConfig::default().max_factories);
    }

    #[test]
    fn overrides_are_validated() {
        let overrides = Overrides {
            grid_size: Some(0),
            ..Overrides::default()
        };
        assert!(overrides.apply(WorldConfig::default()).is_err());
    }
}
