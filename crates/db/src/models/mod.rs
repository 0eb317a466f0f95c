//! Row models and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` row struct matching the database table
//! - A `Deserialize` + `Validate` create DTO for inserts
//! - Conversions into the `pms_core` domain types where the lifecycle needs them

pub mod entry_record;
pub mod parking_request;
pub mod parking_slot;
pub mod user;
