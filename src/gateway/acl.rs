use crate::contracts::{CallerIdentity, PrivilegeCheck};

/// Manager access list of `user@host` entries. Host `*` (or a bare user)
/// matches any host; host comparison ignores case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerList {
    entries: Vec<ManagerEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ManagerEntry {
    user: String,
    /// `None` matches every host.
    host: Option<String>,
}

impl ManagerEntry {
    fn parse(entry: &str) -> Option<Self> {
        let entry = entry.trim();
        let (user, host) = match entry.split_once('@') {
            Some((user, "*")) => (user, None),
            Some((user, host)) => (user, Some(host.to_ascii_lowercase())),
            None => (entry, None),
        };
        if user.is_empty() || host.as_deref() == Some("") {
            return None;
        }
        Some(Self {
            user: user.to_string(),
            host,
        })
    }

    fn matches(&self, caller: &CallerIdentity) -> bool {
        self.user == caller.user
            && self
                .host
                .as_deref()
                .map_or(true, |host| host.eq_ignore_ascii_case(&caller.host))
    }
}

impl Default for ManagerList {
    fn default() -> Self {
        Self::from_entries(["root@*"])
    }
}

impl ManagerList {
    /// Builds the list, skipping entries that do not parse.
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let entries = entries
            .into_iter()
            .filter_map(|entry| {
                let parsed = ManagerEntry::parse(entry.as_ref());
                if parsed.is_none() {
                    tracing::warn!(entry = entry.as_ref(), "Ignoring invalid manager entry");
                }
                parsed
            })
            .collect();
        Self { entries }
    }

    /// Reads `JOBSEQ_MANAGERS` as a comma-separated list (default: `root@*`).
    pub fn from_env() -> Self {
        match std::env::var("JOBSEQ_MANAGERS") {
            Ok(v) if !v.trim().is_empty() => Self::from_entries(v.split(',')),
            _ => Self::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl PrivilegeCheck for ManagerList {
    fn is_privileged(&self, caller: &CallerIdentity) -> bool {
        self.entries.iter().any(|entry| entry.matches(caller))
    }
}
