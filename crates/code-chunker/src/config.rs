use crate::language::Language;
use serde::{Deserialize, Serialize};

/// Configuration for chunk extraction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkerConfig {
    /// Keep member functions defined inside an already accepted class/struct chunk.
    ///
    /// When disabled, every candidate that contains or is contained by an accepted
    /// range is rejected, so methods written inline in a class body are dropped.
    pub nest_members_in_scopes: bool,

    /// Which name slot receives the enclosing scope of a function
    pub scope_attribution: ScopeAttribution,

    /// Languages to extract (empty = all supported languages)
    pub supported_languages: Vec<Language>,

    /// Files larger than this are skipped with a warning
    pub max_file_bytes: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            nest_members_in_scopes: true,
            scope_attribution: ScopeAttribution::ByLanguage,
            supported_languages: vec![],
            max_file_bytes: 4 * 1024 * 1024,
        }
    }
}

impl ChunkerConfig {
    /// Create config where no accepted chunk range ever contains another
    pub fn strict() -> Self {
        Self {
            nest_members_in_scopes: false,
            ..Default::default()
        }
    }

    /// Whether files of this language should be extracted
    pub fn allows(&self, language: Language) -> bool {
        self.supported_languages.is_empty() || self.supported_languages.contains(&language)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_file_bytes == 0 {
            return Err("max_file_bytes must be > 0".to_string());
        }

        Ok(())
    }
}

/// How the enclosing scope name of a function is attributed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeAttribution {
    /// C++ files fill `class_name`, C files fill `struct_name`, whatever the scope is
    #[default]
    ByLanguage,

    /// The kind of the enclosing scope decides (`class` or `struct`).
    ///
    /// Scopes known only from a qualified name (`Foo::bar`) carry no kind and fall back
    /// to the language rule.
    ByScopeKind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        let config = ChunkerConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.nest_members_in_scopes);
        assert_eq!(config.scope_attribution, ScopeAttribution::ByLanguage);
    }

    #[test]
    fn test_strict_preset() {
        let config = ChunkerConfig::strict();
        assert!(!config.nest_members_in_scopes);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let config = ChunkerConfig {
            max_file_bytes: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_language_filter() {
        let config = ChunkerConfig {
            supported_languages: vec![Language::C],
            ..Default::default()
        };
        assert!(config.allows(Language::C));
        assert!(!config.allows(Language::Cpp));
        assert!(ChunkerConfig::default().allows(Language::Cpp));
    }
}
