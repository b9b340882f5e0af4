// Configuration module
// Reads INI-style configuration files with environment variable overrides.
// Loaded once in main and passed by value to whoever needs it.

use std::collections::HashMap;
use std::path::Path;

/// Configuration file parser
pub struct Config {
    values: HashMap<String, String>,
    env_prefix: String,
}

impl Config {
    /// Load configuration from a file.
    /// `env_prefix` is prepended when checking environment variables
    /// (e.g. "Authd_" turns "StorePath" into "Authd_StorePath").
    pub fn load(filename: &str, env_prefix: &str) -> Option<Self> {
        let content = std::fs::read_to_string(Path::new(filename)).ok()?;
        let mut values = HashMap::new();

        for line in content.lines() {
            let trimmed = line.trim();

            // Skip empty lines, comments and [Section] headers
            if trimmed.is_empty()
                || trimmed.starts_with('#')
                || trimmed.starts_with(';')
                || trimmed.starts_with('[')
            {
                continue;
            }

            if let Some(eq_pos) = trimmed.find('=') {
                let key = trimmed[..eq_pos].trim().to_string();
                let mut value = trimmed[eq_pos + 1..].trim().to_string();

                if value.starts_with('"') && value.ends_with('"') && value.len() >= 2 {
                    value = value[1..value.len() - 1].to_string();
                }

                values.insert(key, value);
            }
        }

        Some(Config {
            values,
            env_prefix: env_prefix.to_string(),
        })
    }

    /// An empty configuration (all defaults). Lets the binaries run
    /// without a config file at all.
    pub fn empty(env_prefix: &str) -> Self {
        Config {
            values: HashMap::new(),
            env_prefix: env_prefix.to_string(),
        }
    }

    /// Get a string value with a default
    pub fn get_string_default(&self, key: &str, default: &str) -> String {
        self.get_env_or_config(key)
            .unwrap_or_else(|| default.to_string())
    }

    /// Get a string value (empty string default)
    pub fn get_string(&self, key: &str) -> String {
        self.get_string_default(key, "")
    }

    /// Get a boolean value with a default
    pub fn get_bool_default(&self, key: &str, default: bool) -> bool {
        match self.get_env_or_config(key) {
            Some(val) => matches!(val.to_lowercase().as_str(), "1" | "true" | "yes"),
            None => default,
        }
    }

    /// Get an integer value with a default
    pub fn get_int_default(&self, key: &str, default: i32) -> i32 {
        match self.get_env_or_config(key) {
            Some(val) => val.parse().unwrap_or(default),
            None => default,
        }
    }

    /// Try environment variable first, then config file
    fn get_env_or_config(&self, key: &str) -> Option<String> {
        if !self.env_prefix.is_empty() {
            let env_key = format!("{}{}", self.env_prefix, key.replace('.', "_"));
            if let Ok(val) = std::env::var(&env_key) {
                return Some(val);
            }
        }

        self.values.get(key).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::empty("Test_");
        assert_eq!(config.get_int_default("nonexistent", 42), 42);
        assert_eq!(config.get_string_default("nonexistent", "hello"), "hello");
        assert!(config.get_bool_default("nonexistent", true));
    }
}
