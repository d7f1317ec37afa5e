use secstr::SecStr;
use serde::{Deserialize, Deserializer};

use crate::policy::PolicyOptions;

pub const ENV_PREFIX: &str = "HOOKGATE_";

/// Process configuration, read from `HOOKGATE_*` environment variables.
///
/// Lists (`HOOKGATE_EVENTS`, `HOOKGATE_BRANCHES`) are comma-separated. Policy
/// fields that aren't set fall back to the policy defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default, deserialize_with = "deserialize_opt_secstr")]
    pub secret: Option<SecStr>,
    pub events: Option<Vec<String>>,
    pub branches: Option<Vec<String>>,
    pub only_tags: Option<bool>,
    pub pusher_ignore: Option<String>,
    pub commit_ignore: Option<String>,
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_path")]
    pub path: String,
    #[serde(default = "default_payload_limit")]
    pub payload_limit: usize,
}

fn default_bind() -> String {
    "127.0.0.1:8080".into()
}

fn default_path() -> String {
    "/".into()
}

/// GitHub caps webhook payloads at 25 MB.
fn default_payload_limit() -> usize {
    25 * 1024 * 1024
}

fn deserialize_opt_secstr<'de, D>(de: D) -> Result<Option<SecStr>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(de).map(|o| o.map(|s| SecStr::new(s.into_bytes())))
}

/// Lists are split on commas only, so entries are trimmed and blanks dropped.
fn trimmed(items: &[String]) -> Vec<String> {
    items
        .iter()
        .map(|item| item.trim())
        .filter(|item| !item.is_empty())
        .map(String::from)
        .collect()
}

impl Config {
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::prefixed(ENV_PREFIX).from_env()
    }

    pub fn policy_options(&self) -> PolicyOptions {
        PolicyOptions {
            secret: self.secret.clone(),
            events: self.events.as_deref().map(trimmed),
            branches: self.branches.as_deref().map(trimmed),
            only_tags: self.only_tags,
            pusher_ignore: self.pusher_ignore.clone(),
            commit_ignore: self.commit_ignore.clone(),
        }
    }
}
