//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods. Methods
//! that only ever run outside a transaction take `&PgPool`; methods used by
//! the parking store's unit of work take `&mut PgConnection` so they can run
//! on an open transaction; reads used in both places accept any executor.

pub mod entry_record_repo;
pub mod parking_request_repo;
pub mod parking_slot_repo;
pub mod user_repo;

pub use entry_record_repo::EntryRecordRepo;
pub use parking_request_repo::ParkingRequestRepo;
pub use parking_slot_repo::ParkingSlotRepo;
pub use user_repo::UserRepo;
