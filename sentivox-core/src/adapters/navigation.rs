//! Navigation adapter that records where the user was sent

use std::sync::Mutex;

use crate::domain::Route;
use crate::ports::Navigator;

/// [`Navigator`] keeping an ordered history of visited surfaces
///
/// Front-ends read `current()` after an operation to decide which surface to
/// show next. Navigating to the surface already shown is a no-op.
#[derive(Debug)]
pub struct HistoryNavigator {
    history: Mutex<Vec<Route>>,
}

impl HistoryNavigator {
    pub fn new() -> Self {
        Self {
            history: Mutex::new(Vec::new()),
        }
    }

    pub fn current(&self) -> Option<Route> {
        self.history.lock().ok().and_then(|h| h.last().copied())
    }

    pub fn history(&self) -> Vec<Route> {
        self.history.lock().map(|h| h.clone()).unwrap_or_default()
    }

    /// How many times the user arrived at `route`
    pub fn count(&self, route: Route) -> usize {
        self.history().iter().filter(|r| **r == route).count()
    }
}

impl Default for HistoryNavigator {
    fn default() -> Self {
        Self::new()
    }
}

impl Navigator for HistoryNavigator {
    fn navigate(&self, route: Route) {
        if let Ok(mut history) = self.history.lock() {
            if history.last() != Some(&route) {
                history.push(route);
            }
        }
    }
}
