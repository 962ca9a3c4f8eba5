//! Task lifecycle management for Fleetline.
//!
//! Tasks move between `PENDING`, `ACCEPTED` and `COMPLETED`. Drivers claim
//! tasks from their company's marketplace or from directed offers, reject or
//! cancel them back into the marketplace, and complete them; each of these
//! may adjust the driver's rating. The module follows hexagonal
//! architecture:
//!
//! - Domain types, guards, rating policy and visibility rule in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
