/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Support module registry.
//!
//! An IOC is built against a fixed set of EPICS support modules (`asyn`,
//! `streamDevice`, …), each pinned to a version and an install location.
//! [`ModuleRegistry`] is an explicit object handed to the IOC builder rather
//! than process-wide state, with an init-once lifecycle:
//!
//! ```text
//! new() ──register()*──► seal() ──► lookups only
//! ```
//!
//! Registering after [`seal`](ModuleRegistry::seal) is an error, so every
//! protocol file and port sees the same module set.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::generator::ConfigError;

// ── ModuleVersion ─────────────────────────────────────────────────────────────

/// One support module pinned to a version and location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleVersion {
    pub name: String,
    /// Release tag such as `"4-10"`.  `None` for in-tree modules.
    pub version: Option<String>,
    /// Directory the module (or its versioned tree) lives under.
    pub home: PathBuf,
    /// When `true` the module lives at `home/name/version`; otherwise `home`
    /// is the module root itself.
    pub use_name: bool,
}

impl ModuleVersion {
    pub fn new(name: impl Into<String>, home: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            version: None,
            home: home.into(),
            use_name: true,
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_use_name(mut self, use_name: bool) -> Self {
        self.use_name = use_name;
        self
    }

    /// Root directory of the module.
    pub fn location(&self) -> PathBuf {
        if !self.use_name {
            return self.home.clone();
        }
        let mut path = self.home.join(&self.name);
        if let Some(version) = &self.version {
            path.push(version);
        }
        path
    }
}

// ── ModuleRegistry ────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct ModuleRegistry {
    /// Module name → version.  `BTreeMap` for a stable listing order.
    modules: BTreeMap<String, ModuleVersion>,
    sealed: bool,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `module` to the registry.
    ///
    /// # Errors
    /// * [`ConfigError::RegistrySealed`] after [`seal`](Self::seal).
    /// * [`ConfigError::DuplicateModule`] if the name is already registered.
    pub fn register(&mut self, module: ModuleVersion) -> Result<(), ConfigError> {
        if self.sealed {
            return Err(ConfigError::RegistrySealed {
                module: module.name,
            });
        }
        if self.modules.contains_key(&module.name) {
            return Err(ConfigError::DuplicateModule(module.name));
        }

        debug!(
            module = %module.name,
            version = module.version.as_deref().unwrap_or("-"),
            location = %module.location().display(),
            "Registered module"
        );
        self.modules.insert(module.name.clone(), module);
        Ok(())
    }

    /// End the registration phase.  Idempotent.
    pub fn seal(&mut self) {
        if !self.sealed {
            info!(modules = self.modules.len(), "Module registry sealed");
        }
        self.sealed = true;
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    pub fn get(&self, name: &str) -> Option<&ModuleVersion> {
        self.modules.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.modules.contains_key(name)
    }

    /// Location of a registered module.
    pub fn location(&self, name: &str) -> Result<PathBuf, ConfigError> {
        self.get(name)
            .map(ModuleVersion::location)
            .ok_or_else(|| ConfigError::UnknownModule(name.to_string()))
    }

    /// Resolve `relative` against the location of module `name`.
    pub fn resolve(&self, name: &str, relative: &Path) -> Result<PathBuf, ConfigError> {
        Ok(self.location(name)?.join(relative))
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Registered modules sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = &ModuleVersion> {
        self.modules.values()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
