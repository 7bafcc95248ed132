//! Reachability of an optional remote service.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Connectivity {
    /// No URL configured; the feature is disabled.
    Unconfigured,
    /// Last health probe succeeded.
    Online,
    /// Last probe or request failed, or no probe ran yet.
    Offline,
}

impl Connectivity {
    pub fn is_online(&self) -> bool {
        *self == Connectivity::Online
    }

    /// Status line shown next to a disabled input.
    pub fn status_message(&self) -> &'static str {
        match self {
            Connectivity::Unconfigured => "Service unavailable",
            Connectivity::Online => "Online",
            Connectivity::Offline => "Offline. Trying to reconnect...",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_online_is_online() {
        assert!(Connectivity::Online.is_online());
        assert!(!Connectivity::Offline.is_online());
        assert!(!Connectivity::Unconfigured.is_online());
        assert_eq!(Connectivity::Unconfigured.status_message(), "Service unavailable");
    }
}
