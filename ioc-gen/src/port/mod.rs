/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! asyn IP port model.
//!
//! An [`AsynIpPort`] is the named asyn driver instance a stream protocol talks
//! through.  It may carry a [`SerialSim`] describing a simulated serial device;
//! when the IOC is built for simulation the port is pointed at the simulator
//! instead of the real device.

use std::fmt;

use tracing::debug;

use crate::generator::ConfigError;

// ── SerialSim ─────────────────────────────────────────────────────────────────

/// A simulated serial device served over TCP.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialSim {
    pub name: String,
    /// Simulator class implementing the device.
    pub py_class: String,
    /// Module the simulator class is loaded from.
    pub module: String,
    /// TCP port the simulated device listens on.
    pub ip_port: u16,
    /// Control (RPC) port of the simulator.
    pub rpc_port: u16,
    /// Debug console port of the simulator.
    pub debug_port: u16,
}

impl SerialSim {
    /// Address the simulated device is reachable at.
    pub fn address(&self) -> String {
        format!("localhost:{}", self.ip_port)
    }
}

// ── PortHandle ────────────────────────────────────────────────────────────────

/// Cheap, cloneable reference to a constructed port, used by protocols.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PortHandle(String);

impl PortHandle {
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PortHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ── AsynIpPort ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsynIpPort {
    name: String,
    /// `host:port`, optionally followed by a transport (`"host:7001 UDP"`).
    address: String,
    simulation: Option<SerialSim>,
}

impl AsynIpPort {
    /// Create a port, validating its name and address.
    ///
    /// # Errors
    /// [`ConfigError::InvalidPort`] when the name is empty or the address is
    /// not `host:port` with a numeric port.
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Result<Self, ConfigError> {
        let name = name.into();
        let address = address.into();

        if name.trim().is_empty() {
            return Err(ConfigError::InvalidPort {
                port: name,
                reason: "port name is empty".into(),
            });
        }
        if let Err(reason) = validate_address(&address) {
            return Err(ConfigError::InvalidPort { port: name, reason });
        }

        debug!(port = %name, address = %address, "Created asyn IP port");
        Ok(Self {
            name,
            address,
            simulation: None,
        })
    }

    pub fn with_simulation(mut self, sim: SerialSim) -> Self {
        self.simulation = Some(sim);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn simulation(&self) -> Option<&SerialSim> {
        self.simulation.as_ref()
    }

    /// Address the IOC should connect to.
    ///
    /// With `simulation` set and a simulator attached this is the simulator's
    /// local address; otherwise the real device address.
    pub fn effective_address(&self, simulation: bool) -> String {
        match (&self.simulation, simulation) {
            (Some(sim), true) => sim.address(),
            _ => self.address.clone(),
        }
    }

    pub fn handle(&self) -> PortHandle {
        PortHandle(self.name.clone())
    }
}

fn validate_address(address: &str) -> Result<(), String> {
    let endpoint = address
        .split_whitespace()
        .next()
        .ok_or_else(|| "address is empty".to_string())?;
    let (host, port) = endpoint
        .rsplit_once(':')
        .ok_or_else(|| format!("address '{}' is not host:port", endpoint))?;
    if host.is_empty() {
        return Err(format!("address '{}' has no host", endpoint));
    }
    port.parse::<u16>()
        .map(|_| ())
        .map_err(|_| format!("'{}' is not a valid TCP port", port))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
