//! Navigation signals from the session to the hosting application.
//!
//! The session never changes views itself. It calls a [`Navigator`] the
//! host supplied, and the host decides what "go to login" means (a router
//! push, a terminal prompt, nothing at all in tests).

use tokio::sync::mpsc;

/// Where the session wants the UI to go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// The default view after a successful login.
    Home,
    /// The login view, after logout or invalidation.
    Login,
}

/// Receives navigation signals. Must not block.
pub trait Navigator: Send + Sync + 'static {
    fn navigate(&self, route: Route);
}

/// Any `Fn(Route)` closure is a navigator.
impl<F> Navigator for F
where
    F: Fn(Route) + Send + Sync + 'static,
{
    fn navigate(&self, route: Route) {
        self(route)
    }
}

/// Ignores every signal.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNavigator;

impl Navigator for NoopNavigator {
    fn navigate(&self, _route: Route) {}
}

/// Forwards signals into an unbounded channel for the host's event loop.
#[derive(Debug, Clone)]
pub struct ChannelNavigator {
    tx: mpsc::UnboundedSender<Route>,
}

impl ChannelNavigator {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Route>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Navigator for ChannelNavigator {
    fn navigate(&self, route: Route) {
        if self.tx.send(route).is_err() {
            tracing::debug!(?route, "navigation receiver dropped");
        }
    }
}
