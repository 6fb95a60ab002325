//! Navigation between the three screens.
//!
//! The current route is mirrored into a fragment string (`""`, `"video"`,
//! `"claim"`) which is the only state that survives a restart.

use std::fmt;

/// Application screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Route {
    #[default]
    Connect,
    Video,
    Claim,
}

impl Route {
    /// Parse a fragment. Unknown or empty fragments resolve to `Connect`.
    pub fn from_fragment(fragment: &str) -> Self {
        match fragment.trim().trim_start_matches('#') {
            "video" => Route::Video,
            "claim" => Route::Claim,
            _ => Route::Connect,
        }
    }

    pub fn fragment(&self) -> &'static str {
        match self {
            Route::Connect => "",
            Route::Video => "video",
            Route::Claim => "claim",
        }
    }

    pub fn requires_session(&self) -> bool {
        !matches!(self, Route::Connect)
    }

    /// Where a request for `self` actually lands given the session state.
    pub fn guarded(self, authenticated: bool) -> Self {
        if self.requires_session() && !authenticated {
            Route::Connect
        } else {
            self
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Connect => f.write_str("connect"),
            other => f.write_str(other.fragment()),
        }
    }
}

/// Holds the current route and its fragment.
#[derive(Debug, Clone, Default)]
pub struct Navigator {
    route: Route,
    fragment: String,
}

impl Navigator {
    /// Start from a fragment (persisted value or deep link).
    pub fn from_fragment(fragment: &str) -> Self {
        let mut nav = Self::default();
        nav.sync_from_fragment(fragment);
        nav
    }

    pub fn route(&self) -> Route {
        self.route
    }

    pub fn fragment(&self) -> &str {
        &self.fragment
    }

    /// Set the route and rewrite the fragment.
    pub fn navigate(&mut self, route: Route) {
        if route != self.route {
            tracing::info!(from = %self.route, to = %route, "navigate");
        }
        self.route = route;
        self.fragment = route.fragment().to_string();
    }

    /// Follow an externally changed fragment. The fragment is kept as given
    /// so that history stays untouched; only the route is normalized.
    pub fn sync_from_fragment(&mut self, fragment: &str) {
        self.route = Route::from_fragment(fragment);
        self.fragment = fragment.to_string();
    }

    /// Navigate to `route` unless the session guard redirects it to `Connect`.
    /// Returns the route actually taken.
    pub fn navigate_guarded(&mut self, route: Route, authenticated: bool) -> Route {
        let target = route.guarded(authenticated);
        self.navigate(target);
        target
    }

    /// Re-evaluate the guard for the current route after a session change.
    /// Returns `true` if it bounced to `Connect`.
    pub fn enforce_guard(&mut self, authenticated: bool) -> bool {
        let target = self.route.guarded(authenticated);
        if target != self.route {
            self.navigate(target);
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fragment_parsing() {
        assert_eq!(Route::from_fragment(""), Route::Connect);
        assert_eq!(Route::from_fragment("video"), Route::Video);
        assert_eq!(Route::from_fragment("#claim"), Route::Claim);
        assert_eq!(Route::from_fragment("garbage"), Route::Connect);
        assert_eq!(Route::from_fragment("connect"), Route::Connect);
        assert_eq!(Route::from_fragment("VIDEO"), Route::Connect);
    }

    #[test]
    fn test_navigate_writes_fragment() {
        let mut nav = Navigator::default();
        assert_eq!(nav.route(), Route::Connect);
        assert_eq!(nav.fragment(), "");

        nav.navigate(Route::Claim);
        assert_eq!(nav.fragment(), "claim");

        nav.navigate(Route::Connect);
        assert_eq!(nav.fragment(), "");
    }

    #[test]
    fn test_external_fragment_change() {
        let mut nav = Navigator::from_fragment("video");
        assert_eq!(nav.route(), Route::Video);

        nav.sync_from_fragment("garbage");
        assert_eq!(nav.route(), Route::Connect);
    }

    #[test]
    fn test_guards() {
        let mut nav = Navigator::default();
        assert_eq!(nav.navigate_guarded(Route::Video, false), Route::Connect);
        assert_eq!(nav.navigate_guarded(Route::Video, true), Route::Video);

        assert!(!nav.enforce_guard(true));
        assert!(nav.enforce_guard(false));
        assert_eq!(nav.route(), Route::Connect);
        assert_eq!(nav.fragment(), "");

        // Connect is always reachable.
        assert!(!nav.enforce_guard(false));
    }
}
