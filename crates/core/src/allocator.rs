//! Slot selection and capacity bookkeeping.
//!
//! The allocator never reads-then-writes capacity itself: it asks the
//! [`SlotStore`] for a conditional reservation inside the caller's unit of
//! work, so the decrement is exclusive and is committed or discarded together
//! with the rest of the approval.

use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;
use crate::parking::ParkingSlot;
use crate::store::SlotStore;
use crate::types::DbId;

/// How the allocator picks a slot for an approved request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AllocationPolicy {
    /// Any slot with free capacity; the request's desired slot is ignored.
    #[default]
    AnyAvailable,
    /// The request's desired slot if it has capacity, otherwise any slot.
    PreferRequested,
}

impl AllocationPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AnyAvailable => "any",
            Self::PreferRequested => "preferred",
        }
    }
}

impl fmt::Display for AllocationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AllocationPolicy {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "any" => Ok(Self::AnyAvailable),
            "preferred" => Ok(Self::PreferRequested),
            other => Err(CoreError::Validation(format!(
                "Invalid allocation policy '{other}'. Must be one of: any, preferred"
            ))),
        }
    }
}

/// Take one unit from `slot`. Returns `false` (and leaves it untouched) when
/// the slot has no capacity left.
pub fn take_unit(slot: &mut ParkingSlot) -> bool {
    if slot.capacity <= 0 {
        return false;
    }
    slot.capacity -= 1;
    true
}

/// Return one unit to `slot`. Returns `false` (and leaves it untouched) when
/// the slot is already at its total capacity.
pub fn return_unit(slot: &mut ParkingSlot) -> bool {
    if slot.capacity >= slot.total_capacity {
        return false;
    }
    slot.capacity += 1;
    true
}

/// Reserves and releases slot capacity according to an [`AllocationPolicy`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SlotAllocator {
    policy: AllocationPolicy,
}

impl SlotAllocator {
    pub fn new(policy: AllocationPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> AllocationPolicy {
        self.policy
    }

    /// Reserve one unit of capacity, failing with [`CoreError::NoCapacity`]
    /// when no slot has any left.
    pub async fn reserve_one<S: SlotStore>(
        &self,
        store: &mut S,
        desired_slot_id: Option<DbId>,
    ) -> Result<ParkingSlot, CoreError> {
        if let (AllocationPolicy::PreferRequested, Some(slot_id)) = (self.policy, desired_slot_id) {
            if let Some(slot) = store.reserve_slot(slot_id).await? {
                tracing::debug!(slot_id, "Reserved requested slot");
                return check_reserved(slot);
            }
            tracing::debug!(slot_id, "Requested slot unavailable, falling back to any slot");
        }

        let slot = store.reserve_any_slot().await?.ok_or(CoreError::NoCapacity)?;
        tracing::debug!(slot_id = slot.id, capacity = slot.capacity, "Reserved slot");
        check_reserved(slot)
    }

    /// Return one unit of capacity to `slot_id`.
    pub async fn release<S: SlotStore>(
        &self,
        store: &mut S,
        slot_id: DbId,
    ) -> Result<ParkingSlot, CoreError> {
        if store.find_slot(slot_id).await?.is_none() {
            return Err(CoreError::NotFound {
                entity: "ParkingSlot",
                id: slot_id,
            });
        }

        store.release_slot(slot_id).await?.ok_or_else(|| {
            CoreError::InvalidState(format!("Slot {slot_id} is already at full capacity"))
        })
    }
}

/// A store that hands back a slot with negative or overflowing capacity is
/// broken; refuse to commit on top of it.
fn check_reserved(slot: ParkingSlot) -> Result<ParkingSlot, CoreError> {
    if slot.capacity < 0 || slot.capacity >= slot.total_capacity {
        return Err(CoreError::Internal(format!(
            "Slot {} reported capacity {} of {} after reservation",
            slot.id, slot.capacity, slot.total_capacity
        )));
    }
    Ok(slot)
}
