/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Record scan policy (`SCAN` field).
//!
//! Only the choices of the standard EPICS `menuScan` are representable, so an
//! invalid SCAN string is rejected when the IOC is built rather than when the
//! generated database is loaded.

use std::fmt;

use crate::generator::ConfigError;

// ── Periodic scan rates ───────────────────────────────────────────────────────

/// Fixed periodic scan rates from `menuScan`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScanPeriod {
    TenSeconds,
    FiveSeconds,
    TwoSeconds,
    OneSecond,
    HalfSecond,
    FifthSecond,
    TenthSecond,
}

impl ScanPeriod {
    const ALL: [ScanPeriod; 7] = [
        ScanPeriod::TenSeconds,
        ScanPeriod::FiveSeconds,
        ScanPeriod::TwoSeconds,
        ScanPeriod::OneSecond,
        ScanPeriod::HalfSecond,
        ScanPeriod::FifthSecond,
        ScanPeriod::TenthSecond,
    ];

    /// The exact menu string EPICS expects in the `SCAN` field.
    pub fn as_str(self) -> &'static str {
        match self {
            ScanPeriod::TenSeconds => "10 second",
            ScanPeriod::FiveSeconds => "5 second",
            ScanPeriod::TwoSeconds => "2 second",
            ScanPeriod::OneSecond => "1 second",
            ScanPeriod::HalfSecond => ".5 second",
            ScanPeriod::FifthSecond => ".2 second",
            ScanPeriod::TenthSecond => ".1 second",
        }
    }
}

// ── Scan ──────────────────────────────────────────────────────────────────────

/// Scheduling policy of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Scan {
    /// Processed only when written to or forward-linked.  `SCAN` is omitted
    /// from the rendered record.
    #[default]
    Passive,
    /// Processed on a database event.
    Event,
    /// Processed when the driver signals new data (`"I/O Intr"`).
    IoIntr,
    /// Polled at a fixed rate.
    Periodic(ScanPeriod),
}

impl Scan {
    /// Parse a `SCAN` menu string.
    ///
    /// Leading and trailing whitespace is ignored; everything else must match
    /// the menu exactly (EPICS itself is case sensitive here).
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        let s = s.trim();
        match s {
            "Passive" => Ok(Scan::Passive),
            "Event" => Ok(Scan::Event),
            "I/O Intr" => Ok(Scan::IoIntr),
            other => ScanPeriod::ALL
                .iter()
                .copied()
                .find(|p| p.as_str() == other)
                .map(Scan::Periodic)
                .ok_or_else(|| ConfigError::InvalidScan(other.to_string())),
        }
    }

    /// Menu string for the `SCAN` field.
    pub fn as_str(self) -> &'static str {
        match self {
            Scan::Passive => "Passive",
            Scan::Event => "Event",
            Scan::IoIntr => "I/O Intr",
            Scan::Periodic(p) => p.as_str(),
        }
    }

    pub fn is_passive(self) -> bool {
        self == Scan::Passive
    }
}

impl fmt::Display for Scan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
