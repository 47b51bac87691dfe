// tests/trigger_flags.rs

use std::path::PathBuf;

use dockyard::git::{SyncedRepo, SyncedRepos};
use dockyard::trigger::{TriggerFlags, TriggerPattern, TriggerReason, evaluate};
use dockyard::types::ChangeResult;
use dockyard_test_utils::builders::ConfigFileBuilder;

const DICT_GIT: &str = "https://example.com/dict.git";
const LIB_GIT: &str = "https://example.com/lib.git";

fn synced(entries: &[(&str, ChangeResult)]) -> SyncedRepos {
    let mut repos = SyncedRepos::new();
    for (url, changes) in entries {
        repos.insert(
            *url,
            SyncedRepo {
                dir: PathBuf::from("/work/.triggers").join(url.rsplit('/').next().unwrap()),
                changes: changes.clone(),
            },
        );
    }
    repos
}

#[test]
fn same_flag_from_two_repositories_is_ored() {
    let cfg = ConfigFileBuilder::new()
        .with_git_trigger("dict", DICT_GIT, &[("words", &["en/*"])])
        .with_git_trigger("lib", LIB_GIT, &[("words", &["data/words.txt"])])
        .build();

    let repos = synced(&[
        (DICT_GIT, ChangeResult::unchanged()),
        (LIB_GIT, ChangeResult::files(["data/words.txt"])),
    ]);
    let flags = TriggerFlags::from_git_triggers(&cfg.git_triggers, &repos);

    assert!(flags.get("words"));
}

#[test]
fn fresh_clone_fires_every_flag_of_that_repository() {
    let cfg = ConfigFileBuilder::new()
        .with_git_trigger("dict", DICT_GIT, &[("en", &["en/*"]), ("de", &["de/*"])])
        .build();

    let repos = synced(&[(DICT_GIT, ChangeResult::Unknown)]);
    let flags = TriggerFlags::from_git_triggers(&cfg.git_triggers, &repos);

    assert!(flags.get("en"));
    assert!(flags.get("de"));
}

#[test]
fn unsynced_trigger_repository_contributes_nothing() {
    let cfg = ConfigFileBuilder::new()
        .with_git_trigger("dict", DICT_GIT, &[("en", &["*"])])
        .build();

    let flags = TriggerFlags::from_git_triggers(&cfg.git_triggers, &SyncedRepos::new());

    assert!(flags.is_empty());
    assert!(!flags.get("en"));
}

#[test]
fn flags_only_fire_targets_that_reference_them() {
    let cfg = ConfigFileBuilder::new()
        .with_git_trigger("dict", DICT_GIT, &[("en", &["en/*"])])
        .build();
    let repos = synced(&[(DICT_GIT, ChangeResult::files(["en/common.txt"]))]);
    let flags = TriggerFlags::from_git_triggers(&cfg.git_triggers, &repos);

    let referencing = [TriggerPattern::parse("*en")];
    let other = [TriggerPattern::parse("*de"), TriggerPattern::parse("src*")];

    let fired = evaluate(&referencing, &ChangeResult::unchanged(), &flags);
    assert_eq!(fired.reason, TriggerReason::NamedTrigger("en".into()));

    let quiet = evaluate(&other, &ChangeResult::unchanged(), &flags);
    assert!(!quiet.should_build);
}
