//! selfwatch Core - Domain types and ports for internal SDK monitoring
//!
//! This crate holds everything the monitoring core and its adapters share:
//! - **Domain types** - `Fault`, `ErrorRecord`, `StackTrace`, `Frame`, `Severity`
//! - **Configuration** - `MonitoringConfig` and its builder and validation
//! - **Port definitions** - Traits for collaborators: `ITransport`,
//!   `ITraceComputer`, `IContextProvider`, `IDebugSink`
//!
//! # Architecture
//!
//! Like a hexagonal core, this crate has no knowledge of batching, HTTP,
//! or how stack traces are computed. The `selfwatch-monitor` crate drives
//! the ports; `selfwatch-transport` provides the default transport adapter.

pub mod config;
pub mod domain;
pub mod ports;
