/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! StreamDevice protocol binding.
//!
//! A [`ProtocolFile`] belongs to a registered support module; a
//! [`StreamProtocol`] binds that file to an asyn port and renders the
//! [`StreamLink`]s records carry.  The protocol file itself is never parsed
//! here: its format is owned by StreamDevice.
//!
//! Links reference the protocol file by its file name only.  StreamDevice
//! finds it through the IOC's protocol search path, which points at the
//! directory returned by [`ProtocolFile::directory`].

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::generator::ConfigError;
use crate::module::ModuleRegistry;
use crate::port::PortHandle;
use crate::record::StreamLink;

// ── ProtocolFile ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolFile {
    /// Path as written in the IOC description (relative to the module).
    path: PathBuf,
    module: String,
    /// `path` resolved against the module location.
    resolved: PathBuf,
}

impl ProtocolFile {
    /// Create a protocol file owned by `module`.
    ///
    /// # Errors
    /// [`ConfigError::UnknownModule`] if `module` is not in `registry`.
    pub fn new(
        path: impl Into<PathBuf>,
        module: impl Into<String>,
        registry: &ModuleRegistry,
    ) -> Result<Self, ConfigError> {
        let path = path.into();
        let module = module.into();
        let resolved = registry.resolve(&module, &path)?;

        debug!(
            module = %module,
            path = %path.display(),
            resolved = %resolved.display(),
            "Protocol file"
        );
        Ok(Self {
            path,
            module,
            resolved,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn resolved(&self) -> &Path {
        &self.resolved
    }

    /// Directory to add to the protocol search path.
    pub fn directory(&self) -> &Path {
        self.resolved.parent().unwrap_or_else(|| Path::new("."))
    }

    /// File name used inside stream links.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.to_string_lossy().into_owned())
    }
}

// ── StreamProtocol ────────────────────────────────────────────────────────────

/// A protocol file bound to the port it talks through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamProtocol {
    port: PortHandle,
    file: ProtocolFile,
}

impl StreamProtocol {
    pub fn new(port: PortHandle, file: ProtocolFile) -> Self {
        Self { port, file }
    }

    pub fn port(&self) -> &PortHandle {
        &self.port
    }

    pub fn file(&self) -> &ProtocolFile {
        &self.file
    }

    /// Build the link for `protocol` called with `args`.
    pub fn link<S: AsRef<str>>(&self, protocol: &str, args: &[S]) -> StreamLink {
        StreamLink {
            protocol_file: self.file.file_name(),
            protocol: protocol.to_string(),
            args: args.iter().map(|a| a.as_ref().to_string()).collect(),
            port: self.port.name().to_string(),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
