// src/trigger/patterns.rs

use std::fmt;
use std::str::FromStr;

use crate::types::ChangeResult;

/// One entry of a target group's `triggers = [...]` list (or of a
/// git-trigger's pattern list).
///
/// Pattern syntax:
///
/// - `"*"`: any changed file.
/// - `"src*"`: any changed path starting with `src`.
/// - `"*name"`: the named git-trigger flag `name`.
/// - anything else: that exact path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerPattern {
    AnyFile,
    Prefix(String),
    Literal(String),
    Named(String),
}

impl TriggerPattern {
    pub fn parse(raw: &str) -> Self {
        if raw == "*" {
            TriggerPattern::AnyFile
        } else if let Some(name) = raw.strip_prefix('*') {
            TriggerPattern::Named(name.to_string())
        } else if let Some(prefix) = raw.strip_suffix('*') {
            TriggerPattern::Prefix(prefix.to_string())
        } else {
            TriggerPattern::Literal(raw.to_string())
        }
    }

    /// Whether this pattern refers to a named flag rather than to files.
    pub fn is_named(&self) -> bool {
        matches!(self, TriggerPattern::Named(_))
    }
}

impl FromStr for TriggerPattern {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(TriggerPattern::parse(s))
    }
}

impl fmt::Display for TriggerPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriggerPattern::AnyFile => f.write_str("*"),
            TriggerPattern::Prefix(prefix) => write!(f, "{prefix}*"),
            TriggerPattern::Literal(path) => f.write_str(path),
            TriggerPattern::Named(name) => write!(f, "*{name}"),
        }
    }
}

/// Returns true if `pattern` fires for the given change set.
///
/// A fresh clone (`ChangeResult::Unknown`) matches everything. Named
/// patterns never match a concrete file set; they are resolved against the
/// flag table instead (see [`super::named_trigger_matches`]).
pub fn file_trigger_matches(pattern: &TriggerPattern, changes: &ChangeResult) -> bool {
    let files = match changes {
        ChangeResult::Unknown => return true,
        ChangeResult::Files(files) => files,
    };

    match pattern {
        TriggerPattern::AnyFile => !files.is_empty(),
        TriggerPattern::Prefix(prefix) => files.iter().any(|f| f.starts_with(prefix.as_str())),
        TriggerPattern::Literal(path) => files.contains(path),
        TriggerPattern::Named(_) => false,
    }
}

/// First file pattern in list order that fires, if any.
pub fn first_file_match<'a>(
    patterns: &'a [TriggerPattern],
    changes: &ChangeResult,
) -> Option<&'a TriggerPattern> {
    patterns
        .iter()
        .filter(|p| !p.is_named())
        .find(|p| file_trigger_matches(p, changes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_pattern_kinds() {
        assert_eq!(TriggerPattern::parse("*"), TriggerPattern::AnyFile);
        assert_eq!(
            TriggerPattern::parse("*rhv_dict"),
            TriggerPattern::Named("rhv_dict".into())
        );
        assert_eq!(
            TriggerPattern::parse("src/*"),
            TriggerPattern::Prefix("src/".into())
        );
        assert_eq!(
            TriggerPattern::parse("app.py"),
            TriggerPattern::Literal("app.py".into())
        );
    }

    #[test]
    fn display_round_trips_the_config_text() {
        for raw in ["*", "*flag", "lib*", "entrypoint.sh"] {
            assert_eq!(TriggerPattern::parse(raw).to_string(), raw);
        }
    }

    #[test]
    fn any_file_needs_a_non_empty_change_set() {
        assert!(!file_trigger_matches(
            &TriggerPattern::AnyFile,
            &ChangeResult::unchanged()
        ));
        assert!(file_trigger_matches(
            &TriggerPattern::AnyFile,
            &ChangeResult::files(["README.md"])
        ));
    }

    #[test]
    fn prefix_is_anchored_at_repository_root() {
        let changes = ChangeResult::files(["src/main.ext"]);
        assert!(file_trigger_matches(&TriggerPattern::parse("src*"), &changes));

        let nested = ChangeResult::files(["other/src/main.ext"]);
        assert!(!file_trigger_matches(&TriggerPattern::parse("src*"), &nested));
    }

    #[test]
    fn literal_requires_exact_path() {
        let changes = ChangeResult::files(["app/entrypoint.sh"]);
        assert!(!file_trigger_matches(
            &TriggerPattern::parse("entrypoint.sh"),
            &changes
        ));
        assert!(file_trigger_matches(
            &TriggerPattern::parse("app/entrypoint.sh"),
            &changes
        ));
    }

    #[test]
    fn fresh_clone_matches_every_pattern() {
        for raw in ["*", "src*", "app.py", "*flag"] {
            assert!(file_trigger_matches(
                &TriggerPattern::parse(raw),
                &ChangeResult::Unknown
            ));
        }
    }

    #[test]
    fn first_file_match_skips_named_patterns() {
        let patterns: Vec<_> = ["*flag", "docs*", "app.py"]
            .iter()
            .map(|p| TriggerPattern::parse(p))
            .collect();
        let changes = ChangeResult::files(["app.py", "docs/index.md"]);

        let hit = first_file_match(&patterns, &changes).unwrap();
        assert_eq!(hit, &TriggerPattern::Prefix("docs".into()));
    }
}
