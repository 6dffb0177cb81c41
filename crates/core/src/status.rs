//! Status enums mapping to SMALLINT lookup tables, plus a lighter variant
//! for enums persisted as plain text.
//!
//! Each status variant's discriminant matches the seed data order (1-based)
//! in the corresponding `*_statuses` database table. The wire and display
//! form is always the snake_case name.

/// Status ID type matching SMALLINT/SMALLSERIAL in the database.
pub type StatusId = i16;

/// Shared name-based plumbing: `as_str`, `ALL`, `Display`, `FromStr` and serde
/// as the name string.
macro_rules! define_name_enum {
    (
        $(#[$meta:meta])*
        $name:ident ($label:literal) {
            $( $(#[$vmeta:meta])* $variant:ident $(= $val:literal)? => $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $(#[$vmeta])* $variant $(= $val)? ),+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$name] = &[$( $name::$variant ),+];

            /// The canonical snake_case name.
            pub fn as_str(self) -> &'static str {
                match self {
                    $( $name::$variant => $text ),+
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = $crate::error::CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $text => Ok($name::$variant), )+
                    other => Err($crate::error::CoreError::Validation(format!(
                        "Invalid {} '{other}'. Must be one of: {}",
                        $label,
                        [$( $text ),+].join(", ")
                    ))),
                }
            }
        }

        impl ::serde::Serialize for $name {
            fn serialize<S: ::serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $name {
            fn deserialize<D: ::serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = <String as ::serde::Deserialize>::deserialize(deserializer)?;
                raw.parse::<$name>().map_err(::serde::de::Error::custom)
            }
        }
    };
}

pub(crate) use define_name_enum;

macro_rules! define_status_enum {
    (
        $(#[$meta:meta])*
        $name:ident ($label:literal) {
            $( $(#[$vmeta:meta])* $variant:ident = $val:literal => $text:literal ),+ $(,)?
        }
    ) => {
        define_name_enum! {
            $(#[$meta])*
            #[repr(i16)]
            $name ($label) {
                $( $(#[$vmeta])* $variant = $val => $text ),+
            }
        }

        impl $name {
            /// Return the database status ID.
            pub fn id(self) -> StatusId {
                self as StatusId
            }

            /// Resolve a database status ID back to the enum.
            pub fn from_id(id: StatusId) -> Option<Self> {
                match id {
                    $( $val => Some($name::$variant), )+
                    _ => None,
                }
            }
        }

        impl From<$name> for StatusId {
            fn from(value: $name) -> Self {
                value as StatusId
            }
        }
    };
}

define_status_enum! {
    /// Project fulfillment lifecycle status.
    ProjectStatus ("project status") {
        PendingPayment = 1 => "pending_payment",
        Queued = 2 => "queued",
        InProduction = 3 => "in_production",
        InReview = 4 => "in_review",
        AwaitingApproval = 5 => "awaiting_approval",
        InRevision = 6 => "in_revision",
        Completed = 7 => "completed",
        Cancelled = 8 => "cancelled",
    }
}

define_status_enum! {
    /// Outcome of a single payment attempt, and the derived status of a project's payments.
    PaymentStatus ("payment status") {
        Pending = 1 => "pending",
        Completed = 2 => "completed",
        Failed = 3 => "failed",
        Refunded = 4 => "refunded",
    }
}

define_status_enum! {
    /// Revision request status. Mirrors the subset of project statuses a revision can be in.
    RevisionStatus ("revision status") {
        InRevision = 1 => "in_revision",
        Completed = 2 => "completed",
        Cancelled = 3 => "cancelled",
    }
}

impl ProjectStatus {
    /// `completed` and `cancelled` accept no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, ProjectStatus::Completed | ProjectStatus::Cancelled)
    }

    /// Counted as "active" on dashboards: paid for and not yet finished.
    pub fn is_active(self) -> bool {
        !self.is_terminal() && self != ProjectStatus::PendingPayment
    }
}
