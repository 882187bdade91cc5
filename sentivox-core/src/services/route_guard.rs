//! Gate for protected surfaces

use std::sync::Arc;

use tokio::sync::watch;

use crate::domain::{Identity, Route, SessionState};
use crate::ports::Navigator;

/// What a protected surface should display
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardView<T> {
    /// Session still loading; show a neutral indicator
    Waiting,
    /// Not authenticated; show nothing
    Hidden,
    Content(T),
}

impl<T> GuardView<T> {
    pub fn is_content(&self) -> bool {
        matches!(self, GuardView::Content(_))
    }
}

/// Renders protected content only for an authenticated session
///
/// Sends the user to the login surface once per transition into
/// `Unauthenticated`; later renders in that state stay quiet.
pub struct RouteGuard {
    state: watch::Receiver<SessionState>,
    navigator: Arc<dyn Navigator>,
    redirected: bool,
}

impl RouteGuard {
    pub fn new(state: watch::Receiver<SessionState>, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            state,
            navigator,
            redirected: false,
        }
    }

    pub fn render<T>(&mut self, content: impl FnOnce(&Identity) -> T) -> GuardView<T> {
        let state = self.state.borrow_and_update().clone();
        match state {
            SessionState::Loading => GuardView::Waiting,
            SessionState::Unauthenticated => {
                if !self.redirected {
                    self.redirected = true;
                    self.navigator.navigate(Route::Login);
                }
                GuardView::Hidden
            }
            SessionState::Authenticated(identity) => {
                self.redirected = false;
                GuardView::Content(content(&identity))
            }
        }
    }

    /// Whether the session changed since the last render
    pub fn has_changed(&self) -> bool {
        self.state.has_changed().unwrap_or(false)
    }

    /// Wait until the session has left `Loading`
    pub async fn resolved(&mut self) -> SessionState {
        let settled = self
            .state
            .wait_for(|state| !state.is_loading())
            .await
            .map(|state| state.clone());
        match settled {
            Ok(state) => state,
            // Controller gone; whatever was last published is final
            Err(_) => self.state.borrow().clone(),
        }
    }
}
