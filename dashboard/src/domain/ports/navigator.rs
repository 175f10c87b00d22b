//! Driven port used to move the user to another destination.

use crate::domain::Route;

/// Performs navigation on behalf of domain services.
///
/// The gateway uses this to send the user to the login page after a forced
/// logout.
#[cfg_attr(test, mockall::automock)]
pub trait Navigator: Send + Sync {
    /// Navigate to `route`.
    fn navigate(&self, route: &Route);
}
