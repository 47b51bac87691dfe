// src/trigger/flags.rs

//! Named git-trigger flags.
//!
//! A git-trigger descriptor watches an auxiliary repository and turns its
//! changes into named booleans that unrelated target groups can reference
//! with `"*name"`. Several descriptors may declare the same name; the
//! effective value is the OR of all of them.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::config::GitTriggerConfig;
use crate::git::SyncedRepos;
use crate::types::ChangeResult;

use super::patterns::{TriggerPattern, first_file_match};

/// Run-scoped table of accumulated git-trigger flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TriggerFlags {
    flags: BTreeMap<String, bool>,
}

impl TriggerFlags {
    pub fn new() -> Self {
        Self::default()
    }

    /// OR `fired` into the flag `name`.
    pub fn record(&mut self, name: &str, fired: bool) {
        let slot = self.flags.entry(name.to_string()).or_insert(false);
        *slot |= fired;
    }

    /// Accumulated value of `name`; absent flags are false.
    pub fn get(&self, name: &str) -> bool {
        self.flags.get(name).copied().unwrap_or(false)
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.flags.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Evaluate every git-trigger descriptor against its synced repository.
    ///
    /// Descriptors whose repository failed to sync contribute nothing.
    pub fn from_git_triggers(triggers: &[GitTriggerConfig], synced: &SyncedRepos) -> Self {
        let mut flags = TriggerFlags::new();

        for trigger in triggers {
            if trigger.triggers.is_empty() {
                continue;
            }

            let Some(repo) = synced.get(&trigger.git) else {
                warn!(url = %trigger.git, dir = %trigger.dir, "ignoring git-triggers from unsynced repository");
                continue;
            };

            for (name, patterns) in &trigger.triggers {
                let fired = pattern_list_fires(patterns, &repo.changes);
                debug!(trigger = %name, url = %trigger.git, fired, "evaluated git-trigger");
                flags.record(name, fired);
            }
        }

        flags
    }
}

/// A git-trigger's pattern list fires on a fresh clone, or when any of its
/// file patterns matches.
fn pattern_list_fires(patterns: &[TriggerPattern], changes: &ChangeResult) -> bool {
    changes.is_unknown() || first_file_match(patterns, changes).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_is_logical_or() {
        let mut flags = TriggerFlags::new();
        flags.record("rhv", false);
        assert!(!flags.get("rhv"));
        flags.record("rhv", true);
        flags.record("rhv", false);
        assert!(flags.get("rhv"));
    }

    #[test]
    fn absent_flag_is_false() {
        assert!(!TriggerFlags::new().get("nope"));
    }

    #[test]
    fn empty_pattern_list_fires_only_on_clone() {
        assert!(pattern_list_fires(&[], &ChangeResult::Unknown));
        assert!(!pattern_list_fires(&[], &ChangeResult::files(["a"])));
    }
}
