/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! EPICS record model for StreamDevice-backed process variables.
//!
//! ```text
//! RecordType ──┐
//! StreamLink ──┼──►  Record  ──(RecordDatabase::insert)──►  .db text
//! Scan       ──┘
//! ```
//!
//! Every record produced here uses device type `stream`; its I/O link points
//! at a protocol inside a protocol file and at the asyn port that protocol
//! talks through.

pub mod scan;

pub use scan::{Scan, ScanPeriod};

use std::collections::BTreeMap;
use std::fmt;

use crate::generator::ConfigError;

/// Device type (`DTYP`) selecting StreamDevice support.
pub const STREAM_DTYP: &str = "stream";

/// Fields every record renders from its own data.  They cannot be set
/// through [`Record::with_field`].
pub const RESERVED_FIELDS: [&str; 5] = ["DTYP", "INP", "OUT", "SCAN", "FLNK"];

// ── Record types ──────────────────────────────────────────────────────────────

/// Record types that StreamDevice ships device support for.
///
/// This is the closed set the dynamic record-type dispatch is validated
/// against; [`RecordType::key`] is the EPICS record type name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RecordType {
    Ai,
    Ao,
    Bi,
    Bo,
    Longin,
    Longout,
    Mbbi,
    Mbbo,
    MbbiDirect,
    MbboDirect,
    Stringin,
    Stringout,
    Waveform,
    /// Long string output.
    Lso,
}

impl RecordType {
    /// Every supported record type, in the order they are listed by
    /// `--list-record-types`.
    pub const ALL: [RecordType; 14] = [
        RecordType::Ai,
        RecordType::Ao,
        RecordType::Bi,
        RecordType::Bo,
        RecordType::Longin,
        RecordType::Longout,
        RecordType::Mbbi,
        RecordType::Mbbo,
        RecordType::MbbiDirect,
        RecordType::MbboDirect,
        RecordType::Stringin,
        RecordType::Stringout,
        RecordType::Waveform,
        RecordType::Lso,
    ];

    /// EPICS record type name.
    pub fn key(self) -> &'static str {
        match self {
            RecordType::Ai => "ai",
            RecordType::Ao => "ao",
            RecordType::Bi => "bi",
            RecordType::Bo => "bo",
            RecordType::Longin => "longin",
            RecordType::Longout => "longout",
            RecordType::Mbbi => "mbbi",
            RecordType::Mbbo => "mbbo",
            RecordType::MbbiDirect => "mbbiDirect",
            RecordType::MbboDirect => "mbboDirect",
            RecordType::Stringin => "stringin",
            RecordType::Stringout => "stringout",
            RecordType::Waveform => "waveform",
            RecordType::Lso => "lso",
        }
    }

    /// Parse an EPICS record type name.
    pub fn from_key(key: &str) -> Result<Self, ConfigError> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.key() == key)
            .ok_or_else(|| ConfigError::UnknownRecordType(key.to_string()))
    }

    /// Returns `true` for record types that write to the device.
    pub fn is_output(self) -> bool {
        matches!(
            self,
            RecordType::Ao
                | RecordType::Bo
                | RecordType::Longout
                | RecordType::Mbbo
                | RecordType::MbboDirect
                | RecordType::Stringout
                | RecordType::Lso
        )
    }

    /// Name of the link field carrying the stream link (`INP` or `OUT`).
    pub fn link_field(self) -> &'static str {
        if self.is_output() {
            "OUT"
        } else {
            "INP"
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

// ── Stream link ───────────────────────────────────────────────────────────────

/// StreamDevice I/O link: `@<file> <protocol>(<args>) <port>`.
///
/// The parentheses are dropped when the protocol takes no arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamLink {
    pub protocol_file: String,
    pub protocol: String,
    pub args: Vec<String>,
    pub port: String,
}

impl fmt::Display for StreamLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{} {}", self.protocol_file, self.protocol)?;
        if !self.args.is_empty() {
            write!(f, "({})", self.args.join(","))?;
        }
        write!(f, " {}", self.port)
    }
}

// ── Record ────────────────────────────────────────────────────────────────────

/// A single process-variable record.
///
/// Built with the `with_*` methods and handed to
/// [`RecordDatabase::insert`](crate::database::RecordDatabase::insert), which
/// enforces name uniqueness and FLNK validity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub name: String,
    pub record_type: RecordType,
    pub link: StreamLink,
    pub scan: Scan,
    /// Forward link: name of the record processed after this one.
    pub flnk: Option<String>,
    /// Additional EPICS fields, rendered after the standard ones.  Names in
    /// [`RESERVED_FIELDS`] are rejected by the database.
    pub fields: BTreeMap<String, String>,
}

impl Record {
    pub fn new(name: impl Into<String>, record_type: RecordType, link: StreamLink) -> Self {
        Self {
            name: name.into(),
            record_type,
            link,
            scan: Scan::Passive,
            flnk: None,
            fields: BTreeMap::new(),
        }
    }

    pub fn with_scan(mut self, scan: Scan) -> Self {
        self.scan = scan;
        self
    }

    pub fn with_flnk(mut self, target: impl Into<String>) -> Self {
        self.flnk = Some(target.into());
        self
    }

    pub fn with_field(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    /// First extra field that collides with a [reserved](RESERVED_FIELDS) one.
    pub fn reserved_field(&self) -> Option<&str> {
        self.fields
            .keys()
            .map(String::as_str)
            .find(|f| RESERVED_FIELDS.iter().any(|r| r == f))
    }

    /// Render the record as an EPICS database block.
    pub fn render(&self) -> String {
        let mut out = format!(
            "record({}, \"{}\")\n{{\n",
            self.record_type,
            escape(&self.name)
        );
        push_field(&mut out, "DTYP", STREAM_DTYP);
        push_field(&mut out, self.record_type.link_field(), &self.link.to_string());
        if !self.scan.is_passive() {
            push_field(&mut out, "SCAN", self.scan.as_str());
        }
        if let Some(target) = &self.flnk {
            push_field(&mut out, "FLNK", target);
        }
        for (field, value) in &self.fields {
            push_field(&mut out, field, value);
        }
        out.push_str("}\n");
        out
    }
}

fn push_field(out: &mut String, field: &str, value: &str) {
    out.push_str(&format!("    field({}, \"{}\")\n", field, escape(value)));
}

/// Escape a value for a double-quoted `.db` string.
fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

// ── Tests ─────────────────────────────────────────────────────────────────────
