use serde::Serialize;

use crate::user::User;

/// Where the UI should go next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Destination {
    Home,
    AdminDashboard,
    Login,
    Unauthorized,
}

impl Destination {
    pub fn path(&self) -> &'static str {
        match self {
            Destination::Home => "/",
            Destination::AdminDashboard => "/admin",
            Destination::Login => "/login",
            Destination::Unauthorized => "/unauthorized",
        }
    }

    /// Landing page after a successful login: staff (ADMIN, COLABORADOR) go to
    /// the dashboard, everyone else to the home page.
    pub fn after_login(user: &User) -> Self {
        if user.roles.iter().any(|r| r.name.is_staff()) {
            Destination::AdminDashboard
        } else {
            Destination::Home
        }
    }
}
