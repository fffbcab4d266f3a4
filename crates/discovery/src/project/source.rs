use ignore::WalkBuilder;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::warn;

// Every configured directory is trusted: hidden files and ignore files are
// not honored, so a class committed next to a .gitignore entry is still
// discovered. The walk is sequential and sorted so that duplicate
// declarations are always reported in the same order.

/// Source files found under one directory.
#[derive(Debug, Default, Clone)]
pub struct SourceFiles {
    pub files: Vec<PathBuf>,
    /// Files skipped for an extension outside the recognized set
    pub ignored: usize,
    /// Entries the walk could not visit, with the reason
    pub walk_errors: Vec<(PathBuf, String)>,
}

pub struct PathFileSource {
    pub root: PathBuf,
    pub supported_extensions: HashSet<String>,
}

impl PathFileSource {
    pub fn new<I, S>(root: impl Into<PathBuf>, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let supported_extensions = extensions
            .into_iter()
            .map(|ext| ext.as_ref().trim_start_matches('.').to_ascii_lowercase())
            .collect();
        Self {
            root: root.into(),
            supported_extensions,
        }
    }

    pub fn get_files(&self) -> SourceFiles {
        let mut source_files = SourceFiles::default();

        let walker = WalkBuilder::new(&self.root)
            .hidden(false)
            .git_ignore(false)
            .git_global(false)
            .git_exclude(false)
            .ignore(false)
            .parents(false)
            .sort_by_file_name(|a, b| a.cmp(b))
            .build();

        for result in walker {
            match result {
                Ok(entry) => {
                    if !entry.file_type().map(|ft| ft.is_file()).unwrap_or(false) {
                        continue;
                    }
                    if should_process_file(entry.path(), &self.supported_extensions) {
                        source_files.files.push(entry.into_path());
                    } else {
                        source_files.ignored += 1;
                    }
                }
                Err(e) => {
                    let path = walk_error_path(&e).unwrap_or_else(|| self.root.clone());
                    warn!("Could not walk {}: {e}", path.display());
                    source_files.walk_errors.push((path, e.to_string()));
                }
            }
        }

        source_files
    }
}

fn walk_error_path(error: &ignore::Error) -> Option<PathBuf> {
    match error {
        ignore::Error::WithPath { path, .. } => Some(path.clone()),
        ignore::Error::WithDepth { err, .. } | ignore::Error::WithLineNumber { err, .. } => {
            walk_error_path(err)
        }
        _ => None,
    }
}

fn should_process_file(path: &Path, supported_extensions: &HashSet<String>) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| supported_extensions.contains(&ext.to_ascii_lowercase()))
        .unwrap_or(false)
}
