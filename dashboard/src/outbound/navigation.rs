//! Navigator adapter for headless use.

use std::sync::{Mutex, PoisonError};

use tracing::info;

use crate::domain::Route;
use crate::domain::ports::Navigator;

/// Logs navigations and remembers the most recent destination.
#[derive(Debug, Default)]
pub struct TracingNavigator {
    last: Mutex<Option<Route>>,
}

impl TracingNavigator {
    /// Most recent destination, if any navigation happened.
    pub fn last_destination(&self) -> Option<Route> {
        self.last
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Navigator for TracingNavigator {
    fn navigate(&self, route: &Route) {
        info!(destination = %route, "navigating");
        *self.last.lock().unwrap_or_else(PoisonError::into_inner) = Some(route.clone());
    }
}
