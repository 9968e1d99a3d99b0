// Configuration module for viewgraph
// Reads from environment variables with sensible defaults

use std::env;
use std::sync::OnceLock;

/// Global configuration instance
static CONFIG: OnceLock<Config> = OnceLock::new();

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum source file size in megabytes (VIEWGRAPH_MAX_FILE_SIZE_MB)
    pub max_file_size_mb: u64,

    /// Maximum text length for a semantic identifier fallback
    /// (VIEWGRAPH_SEMANTIC_TEXT_MAX)
    pub semantic_text_max: usize,

    /// Maximum depth when walking the import graph for section membership
    /// (VIEWGRAPH_SECTION_DEPTH_MAX)
    pub section_depth_max: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_file_size_mb: 10,
            semantic_text_max: 30,
            section_depth_max: 32,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Self {
        let mut config = Config::default();

        if let Ok(val) = env::var("VIEWGRAPH_MAX_FILE_SIZE_MB") {
            if let Ok(parsed) = val.parse() {
                config.max_file_size_mb = parsed;
            } else {
                eprintln!(
                    "viewgraph: Warning: Invalid VIEWGRAPH_MAX_FILE_SIZE_MB value: {}, using default: {}",
                    val, config.max_file_size_mb
                );
            }
        }

        if let Ok(val) = env::var("VIEWGRAPH_SEMANTIC_TEXT_MAX") {
            if let Ok(parsed) = val.parse() {
                config.semantic_text_max = parsed;
            } else {
                eprintln!(
                    "viewgraph: Warning: Invalid VIEWGRAPH_SEMANTIC_TEXT_MAX value: {}, using default: {}",
                    val, config.semantic_text_max
                );
            }
        }

        if let Ok(val) = env::var("VIEWGRAPH_SECTION_DEPTH_MAX") {
            if let Ok(parsed) = val.parse() {
                config.section_depth_max = parsed;
            } else {
                eprintln!(
                    "viewgraph: Warning: Invalid VIEWGRAPH_SECTION_DEPTH_MAX value: {}, using default: {}",
                    val, config.section_depth_max
                );
            }
        }

        config
    }

    /// Get the global configuration instance
    pub fn get() -> &'static Config {
        CONFIG.get_or_init(Config::from_env)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.max_file_size_mb, 10);
        assert_eq!(config.semantic_text_max, 30);
        assert_eq!(config.section_depth_max, 32);
    }
}
