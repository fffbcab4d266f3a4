//! Declaration discovery without loading source files.
//!
//! Finding out which classes a tree declares must not execute or fully parse
//! it: files that would fail to load standalone are still discovered, and a
//! tree of thousands of files is scanned with one regex pass per file.
//!
//! The [`DeclarationScanner`] trait is the seam for that pass. The
//! [`PatternScanner`] recognizes declaration headers such as
//!
//! ```text
//! abstract class Widget extends \Framework\Component implements Renderable, Countable {
//! interface Renderable extends Stringable {
//! ```
//!
//! and a stricter, parser-backed scanner can replace it without touching the
//! registry or the resolver.

use crate::errors::{DiscoveryError, Result};
use crate::key::{ClassKey, short_name};
use crate::project::io::{ReadError, read_text_file};
use crate::project::source::PathFileSource;
use crate::registry::ClassEntry;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use strum::{AsRefStr, Display, EnumString};
use tracing::{debug, warn};

static DECLARATION_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?mi)^[ \t]*(?:<\?php[ \t]+)?((?:(?:abstract|final|readonly)[ \t]+)*)(class|interface|trait)[ \t]+([\p{L}_][\p{L}\p{N}_]*)([^{;]*)",
    )
    .expect("declaration pattern is valid")
});

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DeclarationKind {
    Class,
    AbstractClass,
    FinalClass,
    Interface,
    Trait,
}

impl DeclarationKind {
    fn from_header(modifiers: &str, keyword: &str) -> Self {
        let has_modifier = |wanted: &str| {
            modifiers
                .split_whitespace()
                .any(|modifier| modifier.eq_ignore_ascii_case(wanted))
        };

        if keyword.eq_ignore_ascii_case("interface") {
            Self::Interface
        } else if keyword.eq_ignore_ascii_case("trait") {
            Self::Trait
        } else if has_modifier("abstract") {
            Self::AbstractClass
        } else if has_modifier("final") {
            Self::FinalClass
        } else {
            Self::Class
        }
    }
}

/// What a declaration header says about one type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDescriptor {
    pub name: String,
    pub kind: DeclarationKind,
    /// `extends` targets: one for a class, any number for an interface
    pub parents: Vec<String>,
    /// `implements` targets
    pub interfaces: Vec<String>,
}

impl TypeDescriptor {
    pub fn new(name: impl Into<String>, kind: DeclarationKind) -> Self {
        Self {
            name: name.into(),
            kind,
            parents: Vec::new(),
            interfaces: Vec::new(),
        }
    }

    pub fn extends(mut self, parent: impl Into<String>) -> Self {
        self.parents.push(parent.into());
        self
    }

    pub fn implements(mut self, interface: impl Into<String>) -> Self {
        self.interfaces.push(interface.into());
        self
    }

    pub fn key(&self) -> ClassKey {
        ClassKey::new(&self.name)
    }

    /// Direct ancestors, parents first.
    pub fn direct_ancestors(&self) -> impl Iterator<Item = &str> {
        self.parents
            .iter()
            .chain(self.interfaces.iter())
            .map(String::as_str)
    }
}

pub trait DeclarationScanner: Send + Sync {
    /// Every type declared in `text`, in source order.
    fn scan_source(&self, text: &str) -> Vec<TypeDescriptor>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PatternScanner;

impl PatternScanner {
    pub fn new() -> Self {
        Self
    }
}

impl DeclarationScanner for PatternScanner {
    fn scan_source(&self, text: &str) -> Vec<TypeDescriptor> {
        DECLARATION_PATTERN
            .captures_iter(text)
            .map(|captures| {
                let modifiers = captures.get(1).map_or("", |m| m.as_str());
                let keyword = captures.get(2).map_or("", |m| m.as_str());
                let name = captures.get(3).map_or("", |m| m.as_str());
                let header = captures.get(4).map_or("", |m| m.as_str());

                let mut descriptor =
                    TypeDescriptor::new(name, DeclarationKind::from_header(modifiers, keyword));
                parse_header_clauses(header, &mut descriptor);
                descriptor
            })
            .collect()
    }
}

#[derive(Clone, Copy)]
enum Clause {
    None,
    Extends,
    Implements,
}

fn parse_header_clauses(header: &str, descriptor: &mut TypeDescriptor) {
    let mut clause = Clause::None;

    for token in header
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|token| !token.is_empty())
    {
        if token.eq_ignore_ascii_case("extends") {
            clause = Clause::Extends;
            continue;
        }
        if token.eq_ignore_ascii_case("implements") {
            clause = Clause::Implements;
            continue;
        }

        let name = short_name(token);
        if !is_identifier(name) {
            // Comments or attributes trailing the header end the clause list.
            break;
        }
        match clause {
            Clause::Extends => descriptor.parents.push(name.to_string()),
            Clause::Implements => descriptor.interfaces.push(name.to_string()),
            Clause::None => break,
        }
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
}

/// A source file that was passed over, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanWarning {
    pub path: PathBuf,
    pub reason: String,
}

impl From<ReadError> for ScanWarning {
    fn from(error: ReadError) -> Self {
        Self {
            path: PathBuf::from(error.file_path()),
            reason: error.reason().to_string(),
        }
    }
}

/// Result of scanning one directory tree.
#[derive(Debug, Default, Clone)]
pub struct ScanOutcome {
    pub directory: PathBuf,
    pub entries: Vec<ClassEntry>,
    pub files_scanned: usize,
    pub files_ignored: usize,
    pub warnings: Vec<ScanWarning>,
}

/// Walks directory trees and turns declarations into registry entries.
#[derive(Clone)]
pub struct SourceScanner {
    scanner: Arc<dyn DeclarationScanner>,
    extensions: Vec<String>,
    max_file_size: usize,
}

impl SourceScanner {
    pub fn new(
        scanner: Arc<dyn DeclarationScanner>,
        extensions: Vec<String>,
        max_file_size: usize,
    ) -> Self {
        Self {
            scanner,
            extensions,
            max_file_size,
        }
    }

    pub fn declarations(&self) -> &Arc<dyn DeclarationScanner> {
        &self.scanner
    }

    /// Reads one file and returns its declarations.
    pub fn scan_file(&self, path: &Path) -> std::result::Result<Vec<TypeDescriptor>, ReadError> {
        let text = read_text_file(path, self.max_file_size)?;
        Ok(self.scanner.scan_source(&text))
    }

    /// Scans a directory tree. Unreadable files become warnings; only a
    /// directory that is not a directory at all is an error.
    pub fn scan(&self, directory: &Path) -> Result<ScanOutcome> {
        if directory.exists() && !directory.is_dir() {
            return Err(DiscoveryError::Config(format!(
                "{} is not a directory",
                directory.display()
            )));
        }

        let source = PathFileSource::new(directory, &self.extensions);
        let found = source.get_files();

        let mut outcome = ScanOutcome {
            directory: directory.to_path_buf(),
            files_ignored: found.ignored,
            warnings: found
                .walk_errors
                .into_iter()
                .map(|(path, reason)| ScanWarning { path, reason })
                .collect(),
            ..ScanOutcome::default()
        };

        for path in found.files {
            match self.scan_file(&path) {
                Ok(descriptors) => {
                    outcome.files_scanned += 1;
                    for descriptor in descriptors {
                        debug!("Found {} `{}` in {}", descriptor.kind, descriptor.name, path.display());
                        outcome
                            .entries
                            .push(ClassEntry::new(&descriptor.name, path.clone(), descriptor.kind));
                    }
                }
                Err(e) => {
                    warn!("Skipping unreadable source {}: {}", e.file_path(), e.reason());
                    outcome.warnings.push(e.into());
                }
            }
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;
    use tracing_test::traced_test;

    fn scan(text: &str) -> Vec<TypeDescriptor> {
        PatternScanner::new().scan_source(text)
    }

    #[test]
    fn test_plain_class() {
        let found = scan("<?php\n\nclass Widget\n{\n}\n");
        assert_eq!(found, vec![TypeDescriptor::new("Widget", DeclarationKind::Class)]);

        let found = scan("<?php class Gadget {}");
        assert_eq!(found, vec![TypeDescriptor::new("Gadget", DeclarationKind::Class)]);
    }

    #[test]
    fn test_modifiers_and_clauses() {
        let found = scan(
            "<?php\nnamespace App;\n\nabstract class Special_Widget extends \\Framework\\Widget implements Renderable, \\Countable {\n}\n",
        );
        assert_eq!(
            found,
            vec![
                TypeDescriptor::new("Special_Widget", DeclarationKind::AbstractClass)
                    .extends("Widget")
                    .implements("Renderable")
                    .implements("Countable")
            ]
        );

        let found = scan("final   class Router extends BaseRouter{}");
        assert_eq!(
            found,
            vec![TypeDescriptor::new("Router", DeclarationKind::FinalClass).extends("BaseRouter")]
        );
    }

    #[test]
    fn test_interfaces_extend_many() {
        let found = scan("interface Stack extends Countable, Traversable\n{\n}");
        assert_eq!(
            found,
            vec![
                TypeDescriptor::new("Stack", DeclarationKind::Interface)
                    .extends("Countable")
                    .extends("Traversable")
            ]
        );
    }

    #[test]
    fn test_header_split_over_lines() {
        let found = scan("class Response\n    extends BaseResponse\n    implements\n        Sendable\n{\n}");
        assert_eq!(
            found,
            vec![
                TypeDescriptor::new("Response", DeclarationKind::Class)
                    .extends("BaseResponse")
                    .implements("Sendable")
            ]
        );
    }

    #[test]
    fn test_multiple_declarations_and_keywords_case() {
        let found = scan("CLASS First {}\n\ntrait Loggable {}\nInterface Third {}\n");
        let names: Vec<_> = found.iter().map(|d| (d.name.as_str(), d.kind)).collect();
        assert_eq!(
            names,
            vec![
                ("First", DeclarationKind::Class),
                ("Loggable", DeclarationKind::Trait),
                ("Third", DeclarationKind::Interface),
            ]
        );
    }

    #[test]
    fn test_non_declarations_are_ignored() {
        let text = r#"<?php
// class Commented extends Nothing
/*
 * class InDocBlock
 */
$name = Widget::class;
$anon = new class extends Widget {};
echo "class InString";
"#;
        assert!(scan(text).is_empty());
    }

    #[test]
    fn test_trailing_comment_ends_clause() {
        let found = scan("class Child extends ParentClass // overrides defaults\n{\n}");
        assert_eq!(
            found,
            vec![TypeDescriptor::new("Child", DeclarationKind::Class).extends("ParentClass")]
        );
    }

    #[test]
    fn test_kind_string_forms() {
        assert_eq!(DeclarationKind::AbstractClass.to_string(), "abstract_class");
        assert_eq!(
            "interface".parse::<DeclarationKind>().unwrap(),
            DeclarationKind::Interface
        );
        assert_eq!(DeclarationKind::FinalClass.as_ref(), "final_class");
    }

    #[traced_test]
    #[test]
    fn test_scan_directory_skips_unreadable_files() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("models")).unwrap();
        fs::write(root.join("Widget.php"), "<?php class Widget {}").unwrap();
        fs::write(
            root.join("models/Pair.php"),
            "<?php\nclass Left {}\nclass Right extends Left {}\n",
        )
        .unwrap();
        fs::write(root.join("models/Broken.php"), [0xc3, 0x28, 0xff]).unwrap();
        fs::write(root.join("models/notes.txt"), "class NotSource {}").unwrap();
        fs::write(root.join("models/empty.php"), "<?php\nreturn [];\n").unwrap();

        let scanner = SourceScanner::new(
            Arc::new(PatternScanner::new()),
            vec!["php".to_string()],
            1024,
        );
        let outcome = scanner.scan(root).unwrap();

        let names: Vec<_> = outcome
            .entries
            .iter()
            .map(|entry| entry.declared_name.as_str())
            .collect();
        assert_eq!(names, vec!["Widget", "Left", "Right"]);
        assert_eq!(outcome.entries[1].source_path, root.join("models/Pair.php"));
        assert_eq!(outcome.files_scanned, 3);
        assert_eq!(outcome.files_ignored, 1);
        assert_eq!(outcome.warnings.len(), 1);
        assert_eq!(outcome.warnings[0].path, root.join("models/Broken.php"));
        assert!(logs_contain("Skipping unreadable source"));
    }

    #[test]
    fn test_scan_rejects_file_as_directory() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("Widget.php");
        fs::write(&file, "<?php class Widget {}").unwrap();

        let scanner = SourceScanner::new(Arc::new(PatternScanner), vec!["php".to_string()], 1024);
        assert!(matches!(scanner.scan(&file), Err(DiscoveryError::Config(_))));
    }
}
