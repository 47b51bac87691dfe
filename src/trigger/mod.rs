// src/trigger/mod.rs

//! Trigger evaluation: decides whether a target group should be rebuilt
//! given what changed in its repository and which git-trigger flags fired.
//!
//! - [`patterns`] parses `triggers = [...]` entries and matches file patterns.
//! - [`flags`] accumulates named git-trigger flags across descriptors.

pub mod flags;
pub mod patterns;

use std::fmt;

pub use flags::TriggerFlags;
pub use patterns::{TriggerPattern, file_trigger_matches, first_file_match};

use crate::types::ChangeResult;

/// Why a target group's triggers fired (or didn't).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerReason {
    /// Fresh clone: no baseline to diff against.
    Clone,
    /// A file pattern matched; holds the pattern as written in the config.
    FileChanged(String),
    /// A named git-trigger flag is set.
    NamedTrigger(String),
    None,
}

impl fmt::Display for TriggerReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriggerReason::Clone => f.write_str("clone"),
            TriggerReason::FileChanged(pattern) => write!(f, "file change: {pattern}"),
            TriggerReason::NamedTrigger(name) => write!(f, "triggered: {name}"),
            TriggerReason::None => f.write_str("no match"),
        }
    }
}

/// Outcome of evaluating one target group's trigger list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerDecision {
    pub should_build: bool,
    pub reason: TriggerReason,
}

/// Look up a named flag. Absent names are false.
pub fn named_trigger_matches(name: &str, flags: &TriggerFlags) -> bool {
    flags.get(name)
}

/// Evaluate a target group's trigger list.
///
/// Priority: a fresh clone always wins, then the first file pattern (in list
/// order) that matches, then the first named pattern whose flag is set.
pub fn evaluate(
    patterns: &[TriggerPattern],
    changes: &ChangeResult,
    flags: &TriggerFlags,
) -> TriggerDecision {
    let reason = if changes.is_unknown() {
        TriggerReason::Clone
    } else if let Some(hit) = first_file_match(patterns, changes) {
        TriggerReason::FileChanged(hit.to_string())
    } else if let Some(name) = first_named_match(patterns, flags) {
        TriggerReason::NamedTrigger(name.to_string())
    } else {
        TriggerReason::None
    };

    TriggerDecision {
        should_build: reason != TriggerReason::None,
        reason,
    }
}

fn first_named_match<'a>(patterns: &'a [TriggerPattern], flags: &TriggerFlags) -> Option<&'a str> {
    patterns.iter().find_map(|p| match p {
        TriggerPattern::Named(name) if named_trigger_matches(name, flags) => Some(name.as_str()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patterns(raw: &[&str]) -> Vec<TriggerPattern> {
        raw.iter().map(|p| TriggerPattern::parse(p)).collect()
    }

    #[test]
    fn clone_beats_everything() {
        let decision = evaluate(&[], &ChangeResult::Unknown, &TriggerFlags::new());
        assert!(decision.should_build);
        assert_eq!(decision.reason, TriggerReason::Clone);
    }

    #[test]
    fn file_match_beats_named_match_regardless_of_order() {
        let mut flags = TriggerFlags::new();
        flags.record("lib", true);

        let decision = evaluate(
            &patterns(&["*lib", "app.py"]),
            &ChangeResult::files(["app.py"]),
            &flags,
        );
        assert_eq!(decision.reason, TriggerReason::FileChanged("app.py".into()));
    }

    #[test]
    fn named_flag_fires_without_file_changes() {
        let mut flags = TriggerFlags::new();
        flags.record("lib", false);
        flags.record("dict", true);

        let decision = evaluate(
            &patterns(&["*lib", "*dict"]),
            &ChangeResult::unchanged(),
            &flags,
        );
        assert!(decision.should_build);
        assert_eq!(decision.reason, TriggerReason::NamedTrigger("dict".into()));
    }

    #[test]
    fn nothing_fires_on_empty_changes() {
        let decision = evaluate(
            &patterns(&["*", "src*", "*missing"]),
            &ChangeResult::unchanged(),
            &TriggerFlags::new(),
        );
        assert!(!decision.should_build);
        assert_eq!(decision.reason, TriggerReason::None);
    }
}
