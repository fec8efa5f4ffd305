use tokio::sync::watch;

/// Screens of the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    Register,
    Dashboard,
    TestPlans,
    TestCases,
}

impl Route {
    pub fn path(self) -> &'static str {
        match self {
            Self::Login => "/login",
            Self::Register => "/register",
            Self::Dashboard => "/dashboard",
            Self::TestPlans => "/test-plans",
            Self::TestCases => "/test-cases",
        }
    }

    /// Parse a path. The root path maps to the dashboard.
    pub fn from_path(path: &str) -> Option<Self> {
        let trimmed = path.trim_end_matches('/');
        match trimmed {
            "" => Some(Self::Dashboard),
            "/login" => Some(Self::Login),
            "/register" => Some(Self::Register),
            "/dashboard" => Some(Self::Dashboard),
            "/test-plans" => Some(Self::TestPlans),
            "/test-cases" => Some(Self::TestCases),
            _ => None,
        }
    }

    /// Reachable without a session.
    pub fn is_public(self) -> bool {
        matches!(self, Self::Login | Self::Register)
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}

/// Where a request for `requested` actually lands.
pub fn guard(requested: Route, authenticated: bool) -> Route {
    match (requested.is_public(), authenticated) {
        (true, true) => Route::Dashboard,
        (false, false) => Route::Login,
        _ => requested,
    }
}

/// Receives navigation requests from outside the view layer.
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route);
}

/// Active-route holder that views can watch.
#[derive(Debug)]
pub struct ViewState {
    current: watch::Sender<Route>,
}

impl ViewState {
    pub fn new(initial: Route) -> Self {
        let (current, _) = watch::channel(initial);
        Self { current }
    }

    pub fn current(&self) -> Route {
        *self.current.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<Route> {
        self.current.subscribe()
    }
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new(Route::Login)
    }
}

impl Navigator for ViewState {
    fn navigate(&self, route: Route) {
        tracing::debug!(%route, "navigating");
        self.current.send_replace(route);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_sends_anonymous_users_to_login() {
        assert_eq!(guard(Route::TestPlans, false), Route::Login);
        assert_eq!(guard(Route::Dashboard, false), Route::Login);
        assert_eq!(guard(Route::Register, false), Route::Register);
    }

    #[test]
    fn guard_keeps_signed_in_users_off_auth_screens() {
        assert_eq!(guard(Route::Login, true), Route::Dashboard);
        assert_eq!(guard(Route::Register, true), Route::Dashboard);
        assert_eq!(guard(Route::TestCases, true), Route::TestCases);
    }

    #[test]
    fn root_path_is_dashboard() {
        assert_eq!(Route::from_path("/"), Some(Route::Dashboard));
        assert_eq!(Route::from_path("/test-plans/"), Some(Route::TestPlans));
        assert_eq!(Route::from_path("/nope"), None);
    }

    #[test]
    fn view_state_records_navigation() {
        let view = ViewState::new(Route::Dashboard);
        view.navigate(Route::Login);
        assert_eq!(view.current(), Route::Login);
    }
}
