//! Status enums mapping to SMALLINT lookup tables.
//!
//! Each enum variant's discriminant matches the seed data (1-based) in the
//! corresponding `*_statuses` database table, and its label matches the
//! `name` column.

use std::fmt;

use serde::{Serialize, Serializer};

/// Status ID type matching SMALLINT in the database.
pub type StatusId = i16;

macro_rules! define_status_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $val:expr => $label:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[repr(i16)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $val ),+
        }

        impl $name {
            /// Return the database status ID.
            pub fn id(self) -> StatusId {
                self as StatusId
            }

            /// Return the canonical upper-case label.
            pub fn as_str(self) -> &'static str {
                match self {
                    $( Self::$variant => $label ),+
                }
            }

            /// Look up a variant by its database status ID.
            pub fn from_id(id: StatusId) -> Option<Self> {
                match id {
                    $( $val => Some(Self::$variant), )+
                    _ => None,
                }
            }
        }

        impl From<$name> for StatusId {
            fn from(value: $name) -> Self {
                value as StatusId
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }
    };
}

define_status_enum! {
    /// Parking request approval status.
    RequestStatus {
        Pending = 1 => "PENDING",
        Approved = 2 => "APPROVED",
        Rejected = 3 => "REJECTED",
    }
}

define_status_enum! {
    /// Vehicle entry record status.
    EntryRecordStatus {
        Pending = 1 => "PENDING",
        Approved = 2 => "APPROVED",
    }
}

impl RequestStatus {
    /// `APPROVED` and `REJECTED` are terminal; nothing transitions out of them.
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_status_ids_match_seed_order() {
        assert_eq!(RequestStatus::Pending.id(), 1);
        assert_eq!(RequestStatus::Approved.id(), 2);
        assert_eq!(RequestStatus::Rejected.id(), 3);
    }

    #[test]
    fn from_id_round_trips_and_rejects_unknown() {
        assert_eq!(RequestStatus::from_id(2), Some(RequestStatus::Approved));
        assert_eq!(EntryRecordStatus::from_id(1), Some(EntryRecordStatus::Pending));
        assert_eq!(RequestStatus::from_id(0), None);
        assert_eq!(EntryRecordStatus::from_id(3), None);
    }

    #[test]
    fn only_pending_is_non_terminal() {
        assert!(!RequestStatus::Pending.is_terminal());
        assert!(RequestStatus::Approved.is_terminal());
        assert!(RequestStatus::Rejected.is_terminal());
    }

    #[test]
    fn display_uses_upper_case_label() {
        assert_eq!(RequestStatus::Rejected.to_string(), "REJECTED");
        assert_eq!(EntryRecordStatus::Approved.to_string(), "APPROVED");
    }
}
