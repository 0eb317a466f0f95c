//! Parking management domain logic.
//!
//! Pure business rules with no database or network I/O: billing, slot
//! allocation, the parking request state machine, and the store and notifier
//! contracts the outer crates implement.

pub mod allocator;
pub mod billing;
pub mod error;
pub mod lifecycle;
pub mod memory;
pub mod notify;
pub mod parking;
pub mod roles;
pub mod status;
pub mod store;
pub mod types;
pub mod vehicle;
