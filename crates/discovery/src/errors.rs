//! Error types for class discovery and resolution

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DiscoveryError>;

#[derive(Error, Debug)]
pub enum DiscoveryError {
    /// Two source files declare the same class key.
    #[error(
        "class `{key}` is declared twice: in {} and in {}",
        .first.display(),
        .second.display()
    )]
    DuplicateDeclaration {
        key: String,
        first: PathBuf,
        second: PathBuf,
    },

    /// Several unrelated leaf classes override the same base.
    #[error(
        "divergent overrides of `{base}`: {} each extend it independently; remove all but one or give them a common subclass",
        .branches.join(", ")
    )]
    DivergentOverride { base: String, branches: Vec<String> },

    /// Every descendant of the base is itself extended, so no most-derived
    /// class exists.
    #[error("inheritance of `{base}` is cyclic, no most-derived class exists")]
    InheritanceCycle { base: String },

    #[error("{}", describe_not_found(.name, .required_ancestor.as_deref()))]
    NotFound {
        name: String,
        required_ancestor: Option<String>,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Cache(#[from] class_cache::CacheError),
}

fn describe_not_found(name: &str, required_ancestor: Option<&str>) -> String {
    match required_ancestor {
        Some(ancestor) => format!("no registered class `{name}` descending from `{ancestor}`"),
        None => format!("no registered class `{name}`"),
    }
}

impl DiscoveryError {
    pub fn not_found(name: &str, required_ancestor: Option<&str>) -> Self {
        Self::NotFound {
            name: name.to_string(),
            required_ancestor: required_ancestor.map(str::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_culprits() {
        let duplicate = DiscoveryError::DuplicateDeclaration {
            key: "widget".to_string(),
            first: PathBuf::from("/app/Widget.php"),
            second: PathBuf::from("/plugin/Widget.php"),
        };
        let message = duplicate.to_string();
        assert!(message.contains("/app/Widget.php"));
        assert!(message.contains("/plugin/Widget.php"));

        let divergent = DiscoveryError::DivergentOverride {
            base: "Widget".to_string(),
            branches: vec!["OtherWidget".to_string(), "SpecialWidget".to_string()],
        };
        let message = divergent.to_string();
        assert!(message.contains("`Widget`"));
        assert!(message.contains("OtherWidget, SpecialWidget"));

        assert_eq!(
            DiscoveryError::not_found("D", Some("A")).to_string(),
            "no registered class `D` descending from `A`"
        );
        assert_eq!(
            DiscoveryError::not_found("Missing", None).to_string(),
            "no registered class `Missing`"
        );
    }
}
