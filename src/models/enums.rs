use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

str_enum!(AppointmentStatus {
    Pending => "pending",
    Approved => "approved",
    Rescheduled => "rescheduled",
    Canceled => "canceled",
});

impl AppointmentStatus {
    /// `canceled` has no outbound transition into `approved`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Canceled)
    }
}

/// Role carried by an authenticated actor.
///
/// Registration still accepts the labels used by the first mobile client
/// (`client`, `dentist`), which map onto the two roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[serde(alias = "client")]
    Patient,
    #[serde(alias = "dentist")]
    Staff,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Patient => "patient",
            Self::Staff => "staff",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = DatabaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "patient" | "client" => Ok(Self::Patient),
            "staff" | "dentist" => Ok(Self::Staff),
            _ => Err(DatabaseError::InvalidEnum {
                field: "Role".into(),
                value: s.into(),
            }),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn status_round_trips_through_str() {
        for status in [
            AppointmentStatus::Pending,
            AppointmentStatus::Approved,
            AppointmentStatus::Rescheduled,
            AppointmentStatus::Canceled,
        ] {
            assert_eq!(AppointmentStatus::from_str(status.as_str()).unwrap(), status);
        }
    }

    #[test]
    fn unknown_status_is_rejected() {
        let err = AppointmentStatus::from_str("confirmed").unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidEnum { .. }));
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&AppointmentStatus::Rescheduled).unwrap();
        assert_eq!(json, "\"rescheduled\"");
    }

    #[test]
    fn only_canceled_is_terminal() {
        assert!(AppointmentStatus::Canceled.is_terminal());
        assert!(!AppointmentStatus::Approved.is_terminal());
        assert!(!AppointmentStatus::Pending.is_terminal());
    }

    #[test]
    fn role_accepts_legacy_labels() {
        let role: Role = serde_json::from_str("\"dentist\"").unwrap();
        assert_eq!(role, Role::Staff);
        let role: Role = serde_json::from_str("\"client\"").unwrap();
        assert_eq!(role, Role::Patient);
        assert_eq!(Role::from_str("staff").unwrap(), Role::Staff);
        assert!(Role::from_str("admin").is_err());
    }
}
