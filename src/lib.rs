//! Membership and attendance service for a single gym
//!
//! Use cases live in [`commands`] as [`tower::Service`] implementations on
//! [`commands::DomainLogic`], which talks to storage, identity and time through the traits in
//! [`ports`]. In-memory [`adapters`] back every port.

pub mod adapters;
pub mod commands;
pub mod config;
pub mod domain;
pub mod ports;
pub mod telemetry;
