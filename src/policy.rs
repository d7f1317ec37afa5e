use std::fmt;

use regex::Regex;
use secstr::SecStr;

/// Secret used when the caller doesn't provide one. Public, so insecure.
pub const PLACEHOLDER_SECRET: &str = "changemepls";
pub const WILDCARD: &str = "*";
pub const DEFAULT_EVENTS: &[&str] = &["push"];
pub const DEFAULT_BRANCHES: &[&str] = &["main", "master"];
pub const DEFAULT_PUSHER_IGNORE: &str = r"(?i)\[bot\]";
pub const DEFAULT_COMMIT_IGNORE: &str = r"(?i)\[nopull\]";

#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    #[error("invalid pusher ignore pattern: {0}")]
    PusherPattern(#[source] regex::Error),
    #[error("invalid commit ignore pattern: {0}")]
    CommitPattern(#[source] regex::Error),
}

/// Caller-supplied policy fields. Anything left as `None` falls back to the
/// default.
///
/// An empty `secret` turns signature checks off, an empty pattern turns the
/// corresponding ignore rule off.
#[derive(Debug, Clone, Default)]
pub struct PolicyOptions {
    pub secret: Option<SecStr>,
    pub events: Option<Vec<String>>,
    pub branches: Option<Vec<String>>,
    pub only_tags: Option<bool>,
    pub pusher_ignore: Option<String>,
    pub commit_ignore: Option<String>,
}

/// What the gatekeeper lets through. Resolved once and never mutated.
#[derive(Clone)]
pub struct Policy {
    secret: Option<SecStr>,
    events: Vec<String>,
    branches: Vec<String>,
    only_tags: bool,
    pusher_ignore: Option<Regex>,
    commit_ignore: Option<Regex>,
}

fn to_owned_list(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn compile(pattern: Option<String>, default: &str) -> Result<Option<Regex>, regex::Error> {
    match pattern {
        Some(p) if p.is_empty() => Ok(None),
        Some(p) => Regex::new(&p).map(Some),
        None => Regex::new(default).map(Some),
    }
}

impl Policy {
    pub fn from_options(options: PolicyOptions) -> Result<Self, PolicyError> {
        let PolicyOptions {
            secret,
            events,
            branches,
            only_tags,
            pusher_ignore,
            commit_ignore,
        } = options;

        let secret = match secret {
            Some(s) if s.unsecure().is_empty() => None,
            Some(s) => Some(s),
            None => Some(SecStr::new(PLACEHOLDER_SECRET.as_bytes().to_vec())),
        };
        match &secret {
            None => tracing::warn!(
                "No webhook secret configured, request signatures will NOT be verified"
            ),
            Some(s) if s.unsecure() == PLACEHOLDER_SECRET.as_bytes() => tracing::warn!(
                "Using the placeholder webhook secret `{}`, set a real one",
                PLACEHOLDER_SECRET
            ),
            Some(_) => {}
        }

        Ok(Self {
            secret,
            events: events.unwrap_or_else(|| to_owned_list(DEFAULT_EVENTS)),
            branches: branches.unwrap_or_else(|| to_owned_list(DEFAULT_BRANCHES)),
            only_tags: only_tags.unwrap_or(false),
            pusher_ignore: compile(pusher_ignore, DEFAULT_PUSHER_IGNORE)
                .map_err(PolicyError::PusherPattern)?,
            commit_ignore: compile(commit_ignore, DEFAULT_COMMIT_IGNORE)
                .map_err(PolicyError::CommitPattern)?,
        })
    }

    /// `None` means signatures are not checked at all.
    pub fn secret(&self) -> Option<&SecStr> {
        self.secret.as_ref()
    }

    pub fn verifies_signatures(&self) -> bool {
        self.secret.is_some()
    }

    pub fn events(&self) -> &[String] {
        &self.events
    }

    pub fn branches(&self) -> &[String] {
        &self.branches
    }

    pub fn only_tags(&self) -> bool {
        self.only_tags
    }

    pub fn pusher_ignore(&self) -> Option<&Regex> {
        self.pusher_ignore.as_ref()
    }

    pub fn commit_ignore(&self) -> Option<&Regex> {
        self.commit_ignore.as_ref()
    }
}

impl Default for Policy {
    fn default() -> Self {
        Self::from_options(PolicyOptions::default()).expect("default ignore patterns are valid")
    }
}

impl fmt::Debug for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Policy")
            .field("verifies_signatures", &self.verifies_signatures())
            .field("events", &self.events)
            .field("branches", &self.branches)
            .field("only_tags", &self.only_tags)
            .field("pusher_ignore", &self.pusher_ignore.as_ref().map(Regex::as_str))
            .field("commit_ignore", &self.commit_ignore.as_ref().map(Regex::as_str))
            .finish()
    }
}
