/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! IOC description loading.
//!
//! An IOC description is a YAML file naming the support modules, the asyn
//! port (and optional simulated device), the protocol file, the record name
//! prefix, and the records to generate:
//!
//! ```yaml
//! ioc:
//!   name: TESTSTREAM
//!   architecture: linux-x86
//! modules:
//!   - { name: asyn, version: "4-10", home: /dls_sw/prod/R3.14.8.2/support }
//!   - { name: streamDevice, home: ../.., use_name: false }
//! port:
//!   name: streamDeviceAsyn
//!   address: "172.23.111.180:7001"
//!   simulation:
//!     name: streamDeviceSim
//!     py_class: streamDevice
//!     module: streamDevice_sim
//!     ip_port: 8100
//!     rpc: 9001
//!     debug: 9010
//! protocol:
//!   file: data/test.proto
//!   module: streamDevice
//! prefix: "TESTSTREAM:"
//! variables: [A, B]
//! extra_records:
//!   - { record_type: ao, protocol: reseed }
//!   - record_type: longin
//!     name: COUNT
//!     protocol: readA
//!     scan: "I/O Intr"
//!     fields: { EGU: counts, HOPR: 1000 }
//! ```
//!
//! Loading only checks the YAML structure.  Semantic checks (known record
//! types, valid addresses, registered modules) happen when the description
//! is built into an IOC by [`IocBuilder`](crate::ioc::IocBuilder).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::module::ModuleVersion;
use crate::port::SerialSim;

/// Target architecture used when the description does not name one.
pub const DEFAULT_ARCHITECTURE: &str = "linux-x86";

// ── Private YAML deserialization types ────────────────────────────────────────

/// Top-level wrapper that maps directly onto the YAML file layout.
///
/// This is kept private – callers work with [`IocConfig`] instead.
#[derive(Debug, Deserialize)]
struct IocConfigFile {
    ioc: IocSection,
    #[serde(default)]
    modules: Vec<ModuleEntry>,
    port: PortEntry,
    protocol: ProtocolEntry,
    prefix: String,
    #[serde(default)]
    variables: Vec<String>,
    #[serde(default)]
    extra_records: Vec<ExtraRecordEntry>,
}

#[derive(Debug, Deserialize)]
struct IocSection {
    name: String,
    architecture: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ModuleEntry {
    name: String,
    version: Option<String>,
    home: PathBuf,
    /// Defaults to `true`: the module lives at `home/name/version`.
    #[serde(default = "default_use_name")]
    use_name: bool,
}

fn default_use_name() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct PortEntry {
    name: String,
    address: String,
    simulation: Option<SimulationEntry>,
}

#[derive(Debug, Deserialize)]
struct SimulationEntry {
    name: String,
    py_class: String,
    module: String,
    ip_port: u16,
    rpc: u16,
    debug: u16,
}

#[derive(Debug, Deserialize)]
struct ProtocolEntry {
    file: PathBuf,
    module: String,
}

#[derive(Debug, Deserialize)]
struct ExtraRecordEntry {
    record_type: String,
    /// Record name suffix; defaults to the record type name.
    name: Option<String>,
    protocol: String,
    #[serde(default)]
    args: Vec<String>,
    scan: Option<String>,
    /// Extra EPICS fields.  Scalars of any YAML type are accepted.
    #[serde(default)]
    fields: BTreeMap<String, serde_yaml::Value>,
}

/// Render a scalar field value the way it is written in a `.db` file.
fn field_value(record: &str, field: &str, value: serde_yaml::Value) -> Result<String> {
    Ok(match value {
        serde_yaml::Value::String(s) => s,
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        other => bail!(
            "field {} of extra record '{}' must be a scalar, got {:?}",
            field,
            record,
            other
        ),
    })
}

// ── Public data structures ────────────────────────────────────────────────────

/// asyn port settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortSettings {
    pub name: String,
    pub address: String,
    pub simulation: Option<SerialSim>,
}

/// Protocol file settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolSettings {
    /// Path relative to the owning module.
    pub file: PathBuf,
    pub module: String,
}

/// A single record created through record-type dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtraRecord {
    /// Record type name, resolved when the IOC is built.
    pub record_type: String,
    /// Name suffix appended to the prefix.
    pub name: String,
    pub protocol: String,
    pub args: Vec<String>,
    /// SCAN menu string; `None` means passive.
    pub scan: Option<String>,
    /// Extra EPICS fields, checked against the reserved ones at build time.
    pub fields: BTreeMap<String, String>,
}

/// A parsed IOC description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IocConfig {
    pub name: String,
    pub architecture: String,
    pub modules: Vec<ModuleVersion>,
    pub port: PortSettings,
    pub protocol: ProtocolSettings,
    pub prefix: String,
    pub variables: Vec<String>,
    pub extra_records: Vec<ExtraRecord>,
}

impl IocConfig {
    /// Parse the IOC description at `path`.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or if the YAML is
    /// structurally invalid.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        info!("Loading IOC description from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot open IOC description: {}", path.display()))?;

        Self::from_yaml_str(&content)
            .with_context(|| format!("Failed to parse YAML file: {}", path.display()))
    }

    /// Parse an IOC description from a YAML string.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let file: IocConfigFile = serde_yaml::from_str(content)?;

        let modules = file
            .modules
            .into_iter()
            .map(|m| {
                let mut module = ModuleVersion::new(m.name, m.home).with_use_name(m.use_name);
                module.version = m.version;
                module
            })
            .collect::<Vec<_>>();

        let extra_records = file
            .extra_records
            .into_iter()
            .map(|e| -> Result<ExtraRecord> {
                let name = e.name.unwrap_or_else(|| e.record_type.clone());
                let fields = e
                    .fields
                    .into_iter()
                    .map(|(field, value)| -> Result<(String, String)> {
                        let value = field_value(&name, &field, value)?;
                        Ok((field, value))
                    })
                    .collect::<Result<BTreeMap<_, _>>>()?;
                Ok(ExtraRecord {
                    name,
                    record_type: e.record_type,
                    protocol: e.protocol,
                    args: e.args,
                    scan: e.scan,
                    fields,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let config = IocConfig {
            name: file.ioc.name,
            architecture: file
                .ioc
                .architecture
                .unwrap_or_else(|| DEFAULT_ARCHITECTURE.to_string()),
            modules,
            port: PortSettings {
                name: file.port.name,
                address: file.port.address,
                simulation: file.port.simulation.map(|s| SerialSim {
                    name: s.name,
                    py_class: s.py_class,
                    module: s.module,
                    ip_port: s.ip_port,
                    rpc_port: s.rpc,
                    debug_port: s.debug,
                }),
            },
            protocol: ProtocolSettings {
                file: file.protocol.file,
                module: file.protocol.module,
            },
            prefix: file.prefix,
            variables: file.variables,
            extra_records,
        };

        if config.variables.is_empty() && config.extra_records.is_empty() {
            warn!(ioc = %config.name, "IOC description defines no records");
        }

        debug!(
            ioc = %config.name,
            arch = %config.architecture,
            modules = config.modules.len(),
            variables = ?config.variables,
            extra_records = config.extra_records.len(),
            "Parsed IOC description"
        );

        Ok(config)
    }

    /// Number of records the description will generate: three per variable
    /// plus one per extra record.
    pub fn expected_record_count(&self) -> usize {
        self.variables.len() * 3 + self.extra_records.len()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// Helper: write a YAML string to a temp file and return it.
    fn yaml_tempfile(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    const EXAMPLE: &str = r#"
ioc:
  name: TESTSTREAM
  architecture: linux-x86
modules:
  - { name: asyn, version: "4-10", home: /dls_sw/prod/R3.14.8.2/support }
  - { name: pyDrv, version: "1-2", home: /dls_sw/prod/R3.14.8.2/support }
  - { name: streamDevice, home: ../.., use_name: false }
port:
  name: streamDeviceAsyn
  address: "172.23.111.180:7001"
  simulation:
    name: streamDeviceSim
    py_class: streamDevice
    module: streamDevice_sim
    ip_port: 8100
    rpc: 9001
    debug: 9010
protocol:
  file: data/test.proto
  module: streamDevice
prefix: "TESTSTREAM:"
variables: [A, B]
extra_records:
  - { record_type: ao, protocol: reseed }
  - { record_type: stringout, protocol: reseed }
  - { record_type: bo, protocol: reseed }
  - { record_type: longout, protocol: reseed }
"#;

    #[test]
    fn load_example_yaml() {
        let f = yaml_tempfile(EXAMPLE);
        let cfg = IocConfig::load_from_file(f.path()).unwrap();

        assert_eq!(cfg.name, "TESTSTREAM");
        assert_eq!(cfg.architecture, "linux-x86");
        assert_eq!(cfg.prefix, "TESTSTREAM:");
        assert_eq!(cfg.variables, vec!["A", "B"]);

        assert_eq!(cfg.modules.len(), 3);
        assert_eq!(cfg.modules[0].name, "asyn");
        assert_eq!(cfg.modules[0].version.as_deref(), Some("4-10"));
        assert!(cfg.modules[0].use_name);
        assert!(!cfg.modules[2].use_name);
        assert_eq!(cfg.modules[2].location(), PathBuf::from("../.."));

        assert_eq!(cfg.port.name, "streamDeviceAsyn");
        assert_eq!(cfg.port.address, "172.23.111.180:7001");
        let sim = cfg.port.simulation.as_ref().unwrap();
        assert_eq!(sim.ip_port, 8100);
        assert_eq!(sim.rpc_port, 9001);
        assert_eq!(sim.debug_port, 9010);
        assert_eq!(sim.py_class, "streamDevice");

        assert_eq!(cfg.protocol.file, PathBuf::from("data/test.proto"));
        assert_eq!(cfg.protocol.module, "streamDevice");

        let types: Vec<_> = cfg
            .extra_records
            .iter()
            .map(|e| e.record_type.as_str())
            .collect();
        assert_eq!(types, vec!["ao", "stringout", "bo", "longout"]);
        assert_eq!(cfg.expected_record_count(), 10);
    }

    #[test]
    fn optional_fields_use_defaults_when_absent() {
        let yaml = r#"
ioc:
  name: MINIMAL
port:
  name: p
  address: "localhost:7001"
protocol:
  file: test.proto
  module: streamDevice
prefix: "M:"
"#;
        let cfg = IocConfig::from_yaml_str(yaml).unwrap();

        assert_eq!(cfg.architecture, DEFAULT_ARCHITECTURE);
        assert!(cfg.modules.is_empty());
        assert!(cfg.port.simulation.is_none());
        assert!(cfg.variables.is_empty());
        assert!(cfg.extra_records.is_empty());
        assert_eq!(cfg.expected_record_count(), 0);
    }

    #[test]
    fn module_use_name_defaults_to_true() {
        let yaml = r#"
ioc: { name: X }
modules:
  - { name: asyn, version: "4-10", home: /support }
port: { name: p, address: "h:1" }
protocol: { file: t.proto, module: asyn }
prefix: "X:"
"#;
        let cfg = IocConfig::from_yaml_str(yaml).unwrap();
        assert!(cfg.modules[0].use_name);
        assert_eq!(cfg.modules[0].location(), PathBuf::from("/support/asyn/4-10"));
    }

    #[test]
    fn extra_record_name_and_scan() {
        let yaml = r#"
ioc: { name: X }
port: { name: p, address: "h:1" }
protocol: { file: t.proto, module: m }
prefix: "X:"
extra_records:
  - { record_type: longin, name: "COUNT", protocol: count, args: [A, "2"], scan: "I/O Intr" }
  - { record_type: bo, protocol: reseed }
"#;
        let cfg = IocConfig::from_yaml_str(yaml).unwrap();

        let count = &cfg.extra_records[0];
        assert_eq!(count.name, "COUNT");
        assert_eq!(count.args, vec!["A", "2"]);
        assert_eq!(count.scan.as_deref(), Some("I/O Intr"));

        let bo = &cfg.extra_records[1];
        assert_eq!(bo.name, "bo", "name defaults to the record type");
        assert!(bo.args.is_empty());
        assert!(bo.scan.is_none());
        assert!(bo.fields.is_empty());
    }

    #[test]
    fn extra_record_fields_accept_scalars() {
        let yaml = r#"
ioc: { name: X }
port: { name: p, address: "h:1" }
protocol: { file: t.proto, module: m }
prefix: "X:"
extra_records:
  - record_type: longin
    protocol: readA
    fields: { EGU: counts, HOPR: 1000, LOPR: -1.5, PINI: true }
"#;
        let cfg = IocConfig::from_yaml_str(yaml).unwrap();
        let fields = &cfg.extra_records[0].fields;

        assert_eq!(fields["EGU"], "counts");
        assert_eq!(fields["HOPR"], "1000");
        assert_eq!(fields["LOPR"], "-1.5");
        assert_eq!(fields["PINI"], "true");
    }

    #[test]
    fn extra_record_field_must_be_scalar() {
        let yaml = r#"
ioc: { name: X }
port: { name: p, address: "h:1" }
protocol: { file: t.proto, module: m }
prefix: "X:"
extra_records:
  - { record_type: longin, protocol: readA, fields: { EGU: [a, b] } }
"#;
        let err = IocConfig::from_yaml_str(yaml).unwrap_err();
        assert!(format!("{:#}", err).contains("field EGU of extra record 'longin'"));
    }

    #[test]
    fn missing_required_section_returns_error() {
        let yaml = "ioc: { name: X }\nprefix: \"X:\"\n";
        assert!(IocConfig::from_yaml_str(yaml).is_err());
    }

    #[test]
    fn missing_file_returns_error() {
        let result = IocConfig::load_from_file(Path::new("/nonexistent/path/ioc.yaml"));
        assert!(result.is_err());
    }

    #[test]
    fn malformed_yaml_returns_error() {
        let f = yaml_tempfile("this is: not: valid: yaml: content:::");
        let result = IocConfig::load_from_file(f.path());
        assert!(result.is_err());
    }
}
