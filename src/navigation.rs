//! Navigation sink - where the engine sends the user after a transition.

use serde::Serialize;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Route {
    /// Default view.
    Home,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self { Route::Home => "/" }
    }
}

pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route);
}

/// Records every redirect in order.
#[derive(Debug, Clone, Default)]
pub struct NavigationLog {
    routes: Arc<Mutex<Vec<Route>>>,
}

impl NavigationLog {
    pub fn new() -> Self { Self::default() }
    pub fn routes(&self) -> Vec<Route> { self.routes.lock().unwrap_or_else(|p| p.into_inner()).clone() }
    pub fn count(&self) -> usize { self.routes.lock().unwrap_or_else(|p| p.into_inner()).len() }
}

impl Navigator for NavigationLog {
    fn navigate(&self, route: Route) {
        self.routes.lock().unwrap_or_else(|p| p.into_inner()).push(route);
    }
}

/// Forwards redirects to a router task.
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
            tracing::debug!(route = route.path(), "router gone, redirect dropped");
        }
    }
}
