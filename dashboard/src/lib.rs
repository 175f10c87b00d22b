//! Session core for the hospital management dashboard.
//!
//! The crate owns the three pieces of the dashboard with real state:
//! the session store, the authorised request gateway with its single-flight
//! token refresh, and the role-based route authoriser. Presentation code
//! consumes them through [`domain`] types; infrastructure lives in
//! [`outbound`].

pub mod config;
pub mod domain;
pub mod outbound;

pub use config::DashboardSettings;
