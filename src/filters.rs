//! Content filters. Each answers "is this delivery interesting?"; a `false`
//! is not an error, the delivery just isn't forwarded.

use std::fmt;

use crate::{
    github::PushEvent,
    policy::{Policy, WILDCARD},
};

const TAG_PREFIX: &str = "refs/tags/";
const BRANCH_PREFIX: &str = "refs/heads/";

/// Which filter dropped a delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
    Event,
    Ref,
    Pusher,
    Commit,
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Filter::Event => "event",
            Filter::Ref => "ref",
            Filter::Pusher => "pusher",
            Filter::Commit => "commit",
        })
    }
}

pub fn event_filter(policy: &Policy, event: &str) -> bool {
    match policy.events() {
        [] => false,
        [first, ..] if first == WILDCARD => true,
        events => events.iter().any(|e| e == event),
    }
}

pub fn ref_filter(policy: &Policy, payload: &PushEvent) -> bool {
    let branches = match policy.branches() {
        [] => return false,
        [first, ..] if first == WILDCARD => return true,
        branches => branches,
    };

    let reference = payload.reference.as_deref();
    if policy.only_tags() && !reference.map_or(false, |r| r.starts_with(TAG_PREFIX)) {
        return false;
    }

    // Tag pushes carry the tag in `ref` and the branch it came from in `base_ref`.
    let name = match payload.base_ref.as_deref().or(reference) {
        Some(name) => name,
        None => return false,
    };
    let name = name.strip_prefix(BRANCH_PREFIX).unwrap_or(name).trim();
    branches.iter().any(|branch| branch == name)
}

pub fn pusher_filter(policy: &Policy, payload: &PushEvent) -> bool {
    let name = payload.pusher.as_ref().and_then(|p| p.name.as_deref());
    match (policy.pusher_ignore(), name) {
        (Some(pattern), Some(name)) => !pattern.is_match(name),
        _ => true,
    }
}

pub fn commit_filter(policy: &Policy, payload: &PushEvent) -> bool {
    match (policy.commit_ignore(), payload.relevant_commit()) {
        (Some(pattern), Some(commit)) => !pattern.is_match(&commit.message),
        _ => true,
    }
}

/// Runs every content filter in order and reports the first one that
/// dropped the delivery.
pub fn apply(policy: &Policy, event: &str, payload: &PushEvent) -> Result<(), Filter> {
    if !event_filter(policy, event) {
        return Err(Filter::Event);
    }
    if !ref_filter(policy, payload) {
        return Err(Filter::Ref);
    }
    if !pusher_filter(policy, payload) {
        return Err(Filter::Pusher);
    }
    if !commit_filter(policy, payload) {
        return Err(Filter::Commit);
    }
    Ok(())
}
