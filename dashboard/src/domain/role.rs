//! Dashboard roles and their landing destinations.
//!
//! Roles form a closed set. Everything keyed by role is written as an
//! exhaustive `match` so adding a variant fails to compile until every
//! mapping handles it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::routing::Route;

/// Role attached to every authenticated user.
///
/// Serialised with the backend's enum spelling (`"ADMIN"`, `"DOCTOR"`, ...).
///
/// # Examples
/// ```
/// use dashboard::domain::Role;
///
/// let role: Role = "DOCTOR".parse().unwrap();
/// assert_eq!(role.landing_route().as_str(), "/doctor");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Hospital administrator.
    Admin,
    /// Clinician with patients and a schedule.
    Doctor,
    /// Front-desk staff handling registration and check-in.
    Receptionist,
    /// Patient using the self-service portal.
    Patient,
}

/// Error returned when a role string is not one of the known roles.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role '{value}'; expected ADMIN|DOCTOR|RECEPTIONIST|PATIENT")]
pub struct UnknownRoleError {
    value: String,
}

/// One entry of a role's navigation menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavItem {
    /// Menu label shown to the user.
    pub label: &'static str,
    /// Destination path.
    pub path: &'static str,
}

const fn item(label: &'static str, path: &'static str) -> NavItem {
    NavItem { label, path }
}

const ADMIN_NAV: &[NavItem] = &[
    item("Dashboard", "/admin"),
    item("User Management", "/admin/users"),
    item("Patients", "/admin/patients"),
    item("Appointments", "/admin/appointments"),
    item("Staff", "/admin/staff"),
    item("Reports", "/admin/reports"),
    item("Settings", "/admin/settings"),
];

const DOCTOR_NAV: &[NavItem] = &[
    item("Dashboard", "/doctor"),
    item("My Appointments", "/doctor/appointments"),
    item("My Patients", "/doctor/patients"),
    item("Schedule", "/doctor/schedule"),
    item("Profile", "/doctor/profile"),
];

const RECEPTIONIST_NAV: &[NavItem] = &[
    item("Dashboard", "/receptionist"),
    item("Register Patient", "/receptionist/register"),
    item("Appointments", "/receptionist/appointments"),
    item("Patients", "/receptionist/patients"),
    item("Check-In", "/receptionist/checkin"),
];

const PATIENT_NAV: &[NavItem] = &[
    item("Dashboard", "/patient"),
    item("My Appointments", "/patient/appointments"),
    item("Book Appointment", "/patient/book"),
    item("Medical Records", "/patient/records"),
    item("Profile", "/patient/profile"),
];

impl Role {
    /// Every role, in declaration order.
    pub const ALL: [Self; 4] = [Self::Admin, Self::Doctor, Self::Receptionist, Self::Patient];

    /// Wire spelling used by the backend.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::Doctor => "DOCTOR",
            Self::Receptionist => "RECEPTIONIST",
            Self::Patient => "PATIENT",
        }
    }

    /// Default destination after login or after a refused navigation.
    pub fn landing_route(self) -> Route {
        let path = match self {
            Self::Admin => "/admin",
            Self::Doctor => "/doctor",
            Self::Receptionist => "/receptionist",
            Self::Patient => "/patient",
        };
        Route::new(path)
    }

    /// Sidebar menu for this role. The first entry is the landing page.
    pub const fn navigation(self) -> &'static [NavItem] {
        match self {
            Self::Admin => ADMIN_NAV,
            Self::Doctor => DOCTOR_NAV,
            Self::Receptionist => RECEPTIONIST_NAV,
            Self::Patient => PATIENT_NAV,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownRoleError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|role| role.as_str() == value)
            .ok_or_else(|| UnknownRoleError {
                value: value.to_owned(),
            })
    }
}
