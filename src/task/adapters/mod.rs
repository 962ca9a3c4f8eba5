//! Adapter implementations of the task lifecycle ports.

pub mod memory;
pub mod postgres;
