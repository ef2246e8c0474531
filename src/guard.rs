// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Route authorization.
//!
//! [`authorize`] is a pure decision over a route and a [`SessionView`];
//! [`Navigator`] applies its side effects (logout) and follows redirects.

use std::sync::Arc;

use crate::models::{home_route_for, Role, Status, StatusGate};
use crate::session::{Session, SessionView};

pub const LOGIN_ROUTE: &str = "/login";
pub const ROOT_ROUTE: &str = "/";
/// Where unknown paths are sent.
pub const FALLBACK_ROUTE: &str = "/dashboard";

const MAX_REDIRECTS: usize = 8;

/// Guard verdict for one navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    Redirect(String),
    /// Log the session out, then redirect
    LogoutAndRedirect(String),
}

/// Entry of the route table.
#[derive(Debug)]
pub struct RouteSpec {
    /// Pattern; `:name` segments match any single segment
    pub path: &'static str,
    pub name: &'static str,
    pub requires_auth: bool,
    /// Roles allowed in; `None` admits any authenticated role
    pub roles: Option<&'static [Role]>,
}

const ADMIN_ONLY: &[Role] = &[Role::Admin];
const SUPPORT_ONLY: &[Role] = &[Role::SupportUser];
const IGA_ONLY: &[Role] = &[Role::InterestGroupAdmin];

macro_rules! route {
    ($path:literal, $name:literal, public) => {
        RouteSpec { path: $path, name: $name, requires_auth: false, roles: None }
    };
    ($path:literal, $name:literal, auth) => {
        RouteSpec { path: $path, name: $name, requires_auth: true, roles: None }
    };
    ($path:literal, $name:literal, auth, $roles:expr) => {
        RouteSpec { path: $path, name: $name, requires_auth: true, roles: Some($roles) }
    };
}

pub static ROUTES: &[RouteSpec] = &[
    route!("/login", "Login", public),
    route!("/register", "Register", public),
    route!("/dashboard", "Dashboard", auth),
    route!("/profile", "Profile", auth),
    route!("/notifications", "Notifications", auth),
    route!("/tickets", "Tickets", auth),
    route!("/tickets/:id", "TicketDetail", auth),
    route!("/caregivers", "Caregivers", auth),
    route!("/caregivers/approvals", "CaregiverApprovals", auth),
    route!("/role-selection", "RoleSelection", auth),
    route!("/officials", "Officials", auth, ADMIN_ONLY),
    route!("/iga/register", "IgaRegister", auth, ADMIN_ONLY),
    route!("/iga/groups", "IgaGroups", auth, ADMIN_ONLY),
    route!("/support/dashboard", "SupportDashboard", auth, SUPPORT_ONLY),
    route!("/iga/dashboard", "IgaDashboard", auth, IGA_ONLY),
];

/// Strip query, fragment and trailing slash.
fn normalize(target: &str) -> &str {
    let path = target.split(&['?', '#'][..]).next().unwrap_or_default();
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        ROOT_ROUTE
    } else {
        trimmed
    }
}

fn pattern_matches(pattern: &str, path: &str) -> bool {
    let mut pattern_segments = pattern.split('/');
    let mut path_segments = path.split('/');
    loop {
        match (pattern_segments.next(), path_segments.next()) {
            (None, None) => return true,
            (Some(p), Some(s)) if p.starts_with(':') => {
                if s.is_empty() {
                    return false;
                }
            }
            (Some(p), Some(s)) if p == s => {}
            _ => return false,
        }
    }
}

/// Route table entry for `target`, if any.
pub fn resolve(target: &str) -> Option<&'static RouteSpec> {
    let path = normalize(target);
    ROUTES.iter().find(|route| pattern_matches(route.path, path))
}

/// Decide whether `session` may visit `target`.
pub fn authorize(target: &str, session: &SessionView) -> GuardDecision {
    let path = normalize(target);
    let authenticated = session.is_authenticated;
    let home = || GuardDecision::Redirect(home_route_for(session.role()).to_string());

    // Root is special-cased before the generic authentication check.
    if path == ROOT_ROUTE {
        return if authenticated {
            home()
        } else {
            GuardDecision::Redirect(LOGIN_ROUTE.to_string())
        };
    }

    let Some(route) = resolve(path) else {
        return GuardDecision::Redirect(FALLBACK_ROUTE.to_string());
    };

    if route.requires_auth && !authenticated {
        // A leftover record whose status lost access is cleared on the way out.
        return if session.user().is_some() {
            GuardDecision::LogoutAndRedirect(LOGIN_ROUTE.to_string())
        } else {
            GuardDecision::Redirect(LOGIN_ROUTE.to_string())
        };
    }

    if route.path == LOGIN_ROUTE && authenticated {
        return home();
    }

    // Applies to public routes too, so a blocked session cannot linger on /register.
    if authenticated && Status::gate(session.status()) != StatusGate::Allowed {
        return GuardDecision::LogoutAndRedirect(LOGIN_ROUTE.to_string());
    }

    if let Some(roles) = route.roles {
        let permitted = session.role().is_some_and(|role| roles.contains(role));
        if !permitted {
            return home();
        }
    }

    GuardDecision::Allow
}

/// Outcome of a navigation after redirects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    pub requested: String,
    pub resolved: String,
    pub logged_out: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NavigationError {
    #[error("Too many redirects navigating to {0}")]
    RedirectLoop(String),
}

/// Runs the guard against the live session.
#[derive(Clone)]
pub struct Navigator {
    session: Arc<Session>,
}

impl Navigator {
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }

    pub async fn navigate(&self, target: &str) -> Result<Navigation, NavigationError> {
        let mut current = normalize(target).to_string();
        let mut logged_out = false;

        for _ in 0..MAX_REDIRECTS {
            let view = self.session.view().await;
            match authorize(&current, &view) {
                GuardDecision::Allow => {
                    tracing::debug!(requested = target, resolved = %current, "Navigation allowed");
                    return Ok(Navigation {
                        requested: target.to_string(),
                        resolved: current,
                        logged_out,
                    });
                }
                GuardDecision::Redirect(next) => {
                    tracing::debug!(from = %current, to = %next, "Guard redirect");
                    current = next;
                }
                GuardDecision::LogoutAndRedirect(next) => {
                    tracing::info!(
                        from = %current,
                        status = ?view.status().map(Status::as_str),
                        "Session no longer valid, logging out"
                    );
                    if let Err(e) = self.session.logout().await {
                        tracing::warn!(error = %e, "Logout during navigation failed");
                    }
                    logged_out = true;
                    current = next;
                }
            }
        }

        Err(NavigationError::RedirectLoop(target.to_string()))
    }
}
