/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Record generator for StreamDevice IOCs.
//!
//! [`RecordGenerator`] owns the [`RecordDatabase`] of one IOC and registers
//! records against an attached [`StreamProtocol`].  Two entry points:
//!
//! * [`generate`](RecordGenerator::generate): the per-variable record set:
//!
//!   ```text
//!   P+var        ao  writeint(var)   Passive ──FLNK──►  P+var:RBV   ai  readint(var)  1 second
//!   P+var:RBVA   ai  read<var>(var)  I/O Intr
//!   ```
//!
//!   Writing the output record immediately re-reads the value through the
//!   forward link; the `:RBVA` record is updated whenever the device pushes
//!   data.
//!
//! * [`create`](RecordGenerator::create): a single record whose type is
//!   chosen at runtime by name, dispatched through the [`ConstructorTable`].
//!
//! # Example
//! ```rust,ignore
//! let mut generator = RecordGenerator::with_protocol(proto);
//! generator.generate("TESTSTREAM:", "A")?;
//! for ext in ["ao", "stringout", "bo", "longout"] {
//!     generator.create(ext, &format!("TESTSTREAM:{ext}"), "reseed", &[] as &[&str])?;
//! }
//! let db = generator.into_database();
//! ```

pub mod constructors;
pub mod error;

pub use constructors::{ConstructorTable, RecordConstructor};
pub use error::ConfigError;

use tracing::{debug, info};

use crate::database::RecordDatabase;
use crate::protocol::StreamProtocol;
use crate::record::{Record, RecordType, Scan, ScanPeriod};

// ── Constants ─────────────────────────────────────────────────────────────────

/// Poll rate of the periodic readback record.
pub const READBACK_SCAN: Scan = Scan::Periodic(ScanPeriod::OneSecond);

/// Suffix of the polled readback record.
pub const READBACK_SUFFIX: &str = ":RBV";

/// Suffix of the interrupt-driven readback record.
pub const RAW_READBACK_SUFFIX: &str = ":RBVA";

/// Protocol used by the polled readback record.
pub const READ_PROTOCOL: &str = "readint";

/// Protocol used by the output record.
pub const WRITE_PROTOCOL: &str = "writeint";

// ── GeneratedRecords ──────────────────────────────────────────────────────────

/// Names of the three records registered by one
/// [`generate`](RecordGenerator::generate) call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedRecords {
    /// `P+var+":RBV"`: polled readback.
    pub readback: String,
    /// `P+var`: output, forward-linked to `readback`.
    pub write: String,
    /// `P+var+":RBVA"`: interrupt-driven readback.
    pub raw_readback: String,
}

impl GeneratedRecords {
    /// Names in registration order.
    pub fn names(&self) -> [&str; 3] {
        [&self.readback, &self.write, &self.raw_readback]
    }
}

// ── RecordGenerator ───────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct RecordGenerator {
    protocol: Option<StreamProtocol>,
    constructors: ConstructorTable,
    database: RecordDatabase,
}

impl RecordGenerator {
    /// Create a generator with no protocol attached.  Record creation fails
    /// with [`ConfigError::ProtocolNotInitialized`] until
    /// [`attach_protocol`](Self::attach_protocol) is called.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_protocol(protocol: StreamProtocol) -> Self {
        let mut generator = Self::new();
        generator.attach_protocol(protocol);
        generator
    }

    /// Attach (or replace) the protocol new records are bound to.
    pub fn attach_protocol(&mut self, protocol: StreamProtocol) {
        info!(
            port = %protocol.port(),
            protocol_file = %protocol.file().path().display(),
            "Attached stream protocol"
        );
        self.protocol = Some(protocol);
    }

    pub fn is_initialized(&self) -> bool {
        self.protocol.is_some()
    }

    pub fn constructors(&self) -> &ConstructorTable {
        &self.constructors
    }

    pub fn database(&self) -> &RecordDatabase {
        &self.database
    }

    pub fn into_database(self) -> RecordDatabase {
        self.database
    }

    /// Register the readback / write / interrupt-readback records for `var`.
    ///
    /// All three names are checked before anything is inserted, so a failed
    /// call leaves the database unchanged.
    ///
    /// # Errors
    /// * [`ConfigError::EmptyPrefix`] / [`ConfigError::EmptyVariable`]
    /// * [`ConfigError::InvalidVariable`] if `var` contains anything but ASCII
    ///   letters, digits and `_`
    /// * [`ConfigError::ProtocolNotInitialized`]
    /// * [`ConfigError::DuplicateRecord`] if `var` was already generated under
    ///   `prefix` (or any of the names is otherwise taken)
    pub fn generate(&mut self, prefix: &str, var: &str) -> Result<GeneratedRecords, ConfigError> {
        if prefix.is_empty() {
            return Err(ConfigError::EmptyPrefix);
        }
        if var.is_empty() {
            return Err(ConfigError::EmptyVariable);
        }
        if !is_identifier(var) {
            return Err(ConfigError::InvalidVariable(var.to_string()));
        }
        let protocol = self
            .protocol
            .as_ref()
            .ok_or(ConfigError::ProtocolNotInitialized)?;

        let names = GeneratedRecords {
            readback: format!("{}{}{}", prefix, var, READBACK_SUFFIX),
            write: format!("{}{}", prefix, var),
            raw_readback: format!("{}{}{}", prefix, var, RAW_READBACK_SUFFIX),
        };

        let readback = Record::new(
            names.readback.clone(),
            RecordType::Ai,
            protocol.link(READ_PROTOCOL, &[var]),
        )
        .with_scan(READBACK_SCAN);

        let write = Record::new(
            names.write.clone(),
            RecordType::Ao,
            protocol.link(WRITE_PROTOCOL, &[var]),
        )
        .with_flnk(names.readback.clone());

        let raw_readback = Record::new(
            names.raw_readback.clone(),
            RecordType::Ai,
            protocol.link(&format!("read{}", var), &[var]),
        )
        .with_scan(Scan::IoIntr);

        // Pre-flight: only the names can clash, the FLNK target is the
        // readback record inserted first below.
        for name in names.names() {
            if self.database.contains(name) {
                return Err(ConfigError::DuplicateRecord(name.to_string()));
            }
        }

        self.database.insert(readback)?;
        self.database.insert(write)?;
        self.database.insert(raw_readback)?;

        info!(
            prefix = prefix,
            var = var,
            readback = %names.readback,
            write = %names.write,
            raw_readback = %names.raw_readback,
            "Generated variable records"
        );
        Ok(names)
    }

    /// Create a single passive record of the type named `type_key`, bound to
    /// `protocol` called with `args`.  Returns the record name.
    ///
    /// # Errors
    /// * [`ConfigError::UnknownRecordType`] if `type_key` is not a StreamDevice
    ///   record type.
    /// * [`ConfigError::ProtocolNotInitialized`]
    /// * [`ConfigError::DuplicateRecord`]
    pub fn create<S: AsRef<str>>(
        &mut self,
        type_key: &str,
        name: &str,
        protocol: &str,
        args: &[S],
    ) -> Result<String, ConfigError> {
        self.create_scanned(type_key, name, protocol, args, Scan::Passive)
    }

    /// [`create`](Self::create) with an explicit scan policy.
    pub fn create_scanned<S: AsRef<str>>(
        &mut self,
        type_key: &str,
        name: &str,
        protocol: &str,
        args: &[S],
        scan: Scan,
    ) -> Result<String, ConfigError> {
        let record = self.build(type_key, name, protocol, args)?.with_scan(scan);
        self.insert(record)?;

        debug!(record_type = type_key, record = name, protocol = protocol, "Created record");
        Ok(name.to_string())
    }

    /// Build a passive record of the type named `type_key` without registering
    /// it, so the caller can set further fields before [`insert`](Self::insert).
    ///
    /// # Errors
    /// * [`ConfigError::UnknownRecordType`]
    /// * [`ConfigError::ProtocolNotInitialized`]
    pub fn build<S: AsRef<str>>(
        &self,
        type_key: &str,
        name: &str,
        protocol: &str,
        args: &[S],
    ) -> Result<Record, ConfigError> {
        let constructor = self.constructors.get(type_key)?;
        let stream = self
            .protocol
            .as_ref()
            .ok_or(ConfigError::ProtocolNotInitialized)?;
        Ok(constructor.build(name, stream.link(protocol, args)))
    }

    /// Register a fully built record.
    ///
    /// The database rules apply: unique names and FLNK targets that already
    /// exist.
    pub fn insert(&mut self, record: Record) -> Result<(), ConfigError> {
        if self.protocol.is_none() {
            return Err(ConfigError::ProtocolNotInitialized);
        }
        self.database.insert(record)
    }
}

/// ASCII letters, digits and `_`.
fn is_identifier(var: &str) -> bool {
    var.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

// ── Tests ─────────────────────────────────────────────────────────────────────
