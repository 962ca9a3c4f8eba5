//! Fleetline: task lifecycle core for multi-tenant fleet management.
//!
//! Companies publish delivery tasks, drivers claim and complete them, and
//! driver ratings follow from how those tasks are handled.
//!
//! # Architecture
//!
//! Fleetline follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (database, notifier)
//!
//! # Modules
//!
//! - [`task`]: Task lifecycle state machine, rating policy and marketplace
//!   visibility

pub mod task;
