use std::fmt;
use std::str::FromStr;

/// Identity of a caller as `user@host`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CallerIdentity {
    pub user: String,
    pub host: String,
}

impl CallerIdentity {
    pub fn new(user: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            host: host.into(),
        }
    }
}

impl FromStr for CallerIdentity {
    type Err = String;

    /// Parses `user@host`. A bare `user` is taken to be on `localhost`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (user, host) = match s.split_once('@') {
            Some((user, host)) => (user, host),
            None => (s, "localhost"),
        };
        if user.is_empty() || host.is_empty() {
            return Err(format!("invalid caller identity '{}'", s));
        }
        Ok(Self::new(user, host))
    }
}

impl fmt::Display for CallerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.user, self.host)
    }
}

/// Yes/no privilege decision for scheduler-wide configuration changes.
pub trait PrivilegeCheck: Send + Sync {
    fn is_privileged(&self, caller: &CallerIdentity) -> bool;
}
