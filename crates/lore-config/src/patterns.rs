//! Include/exclude pattern compilation and matching.
//!
//! Compiles the vault's glob patterns into efficient matchers for
//! determining which files belong in the index.

use std::path::{Component, Path};

use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::{ConfigError, VaultSettings};

/// Compiled glob patterns for efficient file matching.
#[derive(Debug)]
pub struct CompiledPatterns {
    /// Compiled include patterns.
    include: GlobSet,
    /// Compiled exclude patterns.
    exclude: GlobSet,
}

impl CompiledPatterns {
    /// Compiles the vault's include/exclude patterns into matchers.
    pub fn compile(vault: &VaultSettings) -> Result<Self, ConfigError> {
        let mut include_builder = GlobSetBuilder::new();
        for pattern in &vault.include {
            include_builder.add(compile_glob(pattern)?);
        }
        let include = include_builder
            .build()
            .map_err(|e| ConfigError::InvalidPattern {
                pattern: "<combined include patterns>".to_string(),
                source: e,
            })?;

        let mut exclude_builder = GlobSetBuilder::new();
        for pattern in &vault.exclude {
            exclude_builder.add(compile_glob(pattern)?);
        }
        let exclude = exclude_builder
            .build()
            .map_err(|e| ConfigError::InvalidPattern {
                pattern: "<combined exclude patterns>".to_string(),
                source: e,
            })?;

        Ok(Self { include, exclude })
    }

    /// Checks if a vault-relative path should be tracked.
    ///
    /// A file is tracked if it matches at least one include pattern, does not
    /// match any exclude pattern, and no path component is hidden (starts
    /// with `.`).
    pub fn matches(&self, rel_path: &Path) -> bool {
        if has_hidden_component(rel_path) {
            return false;
        }
        self.include.is_match(rel_path) && !self.exclude.is_match(rel_path)
    }
}

/// Checks whether any component of the path is a hidden file or directory.
fn has_hidden_component(path: &Path) -> bool {
    path.components().any(|c| match c {
        Component::Normal(name) => name.to_str().is_some_and(|s| s.starts_with('.')),
        _ => false,
    })
}

/// Compiles a single glob pattern.
fn compile_glob(pattern: &str) -> Result<Glob, ConfigError> {
    Glob::new(pattern).map_err(|e| ConfigError::InvalidPattern {
        pattern: pattern.to_string(),
        source: e,
    })
}
