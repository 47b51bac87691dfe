// tests/planner_scenarios.rs

mod common;

use common::{accepted_names, dockerfile_for, options, synced, work_fs};

use dockyard::plan::{AcceptReason, BuildPlanner, Exclusion, TagSet};
use dockyard::trigger::TriggerFlags;
use dockyard::types::{Arch, ChangeResult};
use dockyard_test_utils::builders::{ConfigFileBuilder, RepoBuilder, TargetBuilder};

const DEMO_GIT: &str = "https://example.com/demo.git";

fn amd64_tags() -> TagSet {
    TagSet {
        arch: "amd64".into(),
        commit_full: "0123456789abcdef".into(),
        commit_short: "0123456".into(),
        tag: "1.2.0".into(),
        tag_full: "1.2.0-3-g0123456".into(),
    }
}

fn demo_config(target: TargetBuilder) -> dockyard::config::ConfigFile {
    ConfigFileBuilder::new()
        .with_repo(RepoBuilder::new(DEMO_GIT, "demo").target(target.build()).build())
        .build()
}

#[test]
fn force_builds_matching_arch_dockerfile() {
    let cfg = demo_config(TargetBuilder::new("demo").build_entry("Dockerfile.amd64", "{arch}"));
    let fs = work_fs(&[("demo/Dockerfile.amd64", dockerfile_for(Arch::Amd64))]);
    let (_, repo) = synced(DEMO_GIT, "demo", ChangeResult::unchanged());

    let mut opts = options(Arch::Amd64);
    opts.force = true;
    let mut planner = BuildPlanner::new(&fs, opts);
    planner.plan_repository(&cfg.repos[0], &repo, &amd64_tags(), &TriggerFlags::new());
    let plan = planner.finish();

    assert_eq!(accepted_names(&plan), vec!["demo:amd64"]);
    assert_eq!(plan.accepted[0].reason, AcceptReason::Force);
    assert_eq!(plan.accepted[0].context, repo.dir);
    assert!(plan.rejected.is_empty());
}

#[test]
fn missing_dockerfile_is_rejected_with_config_path() {
    let cfg = demo_config(TargetBuilder::new("demo").build_entry("Dockerfile.amd64", "{arch}"));
    let fs = work_fs(&[]);
    let (_, repo) = synced(DEMO_GIT, "demo", ChangeResult::Unknown);

    let mut planner = BuildPlanner::new(&fs, options(Arch::Amd64));
    planner.plan_repository(&cfg.repos[0], &repo, &amd64_tags(), &TriggerFlags::new());
    let plan = planner.finish();

    assert!(plan.is_empty());
    assert_eq!(
        plan.rejected[0].exclusion,
        Exclusion::FileNotFound("Dockerfile.amd64".into())
    );
    assert_eq!(
        plan.rejected[0].exclusion.to_string(),
        "file not found: Dockerfile.amd64"
    );
}

#[test]
fn dockerfile_for_other_arch_is_rejected() {
    let cfg = demo_config(TargetBuilder::new("demo").build_entry("Dockerfile.amd64", "amd64"));
    let fs = work_fs(&[("demo/Dockerfile.amd64", dockerfile_for(Arch::Amd64))]);
    let (_, repo) = synced(DEMO_GIT, "demo", ChangeResult::Unknown);

    let mut planner = BuildPlanner::new(&fs, options(Arch::Arm64v8));
    planner.plan_repository(&cfg.repos[0], &repo, &amd64_tags(), &TriggerFlags::new());
    let plan = planner.finish();

    assert!(plan.is_empty());
    assert_eq!(
        plan.rejected[0].exclusion,
        Exclusion::ArchMismatch {
            expected: Arch::Arm64v8,
            found: Some(Arch::Amd64),
        }
    );
}

#[test]
fn arch_detection_off_accepts_any_from_line() {
    let cfg = demo_config(TargetBuilder::new("demo").build_entry("Dockerfile", "latest"));
    let fs = work_fs(&[("demo/Dockerfile", "FROM scratch\n".to_string())]);
    let (_, repo) = synced(DEMO_GIT, "demo", ChangeResult::Unknown);

    let mut opts = options(Arch::Arm64v8);
    opts.arch_detect = false;
    let mut planner = BuildPlanner::new(&fs, opts);
    planner.plan_repository(&cfg.repos[0], &repo, &amd64_tags(), &TriggerFlags::new());

    assert_eq!(accepted_names(&planner.finish()), vec!["demo:latest"]);
}

#[test]
fn unchanged_repository_builds_nothing() {
    let cfg = demo_config(
        TargetBuilder::new("demo")
            .trigger("*")
            .build_entry("Dockerfile.amd64", "{arch}"),
    );
    let fs = work_fs(&[("demo/Dockerfile.amd64", dockerfile_for(Arch::Amd64))]);
    let (_, repo) = synced(DEMO_GIT, "demo", ChangeResult::unchanged());

    let mut planner = BuildPlanner::new(&fs, options(Arch::Amd64));
    planner.plan_repository(&cfg.repos[0], &repo, &amd64_tags(), &TriggerFlags::new());
    let plan = planner.finish();

    assert!(plan.is_empty());
    assert_eq!(plan.rejected[0].exclusion, Exclusion::NoChange);
}

#[test]
fn fresh_clone_builds_with_clone_reason() {
    let cfg = demo_config(TargetBuilder::new("demo").build_entry("Dockerfile.amd64", "{arch}"));
    let fs = work_fs(&[("demo/Dockerfile.amd64", dockerfile_for(Arch::Amd64))]);
    let (_, repo) = synced(DEMO_GIT, "demo", ChangeResult::Unknown);

    let mut planner = BuildPlanner::new(&fs, options(Arch::Amd64));
    planner.plan_repository(&cfg.repos[0], &repo, &amd64_tags(), &TriggerFlags::new());
    let plan = planner.finish();

    assert_eq!(plan.accepted[0].reason, AcceptReason::Clone);
}

#[test]
fn changed_dockerfile_builds_without_matching_trigger() {
    let cfg = demo_config(
        TargetBuilder::new("demo")
            .trigger("src/*")
            .build_entry("Dockerfile.amd64", "{arch}"),
    );
    let fs = work_fs(&[("demo/Dockerfile.amd64", dockerfile_for(Arch::Amd64))]);
    let (_, repo) = synced(DEMO_GIT, "demo", ChangeResult::files(["Dockerfile.amd64"]));

    let mut planner = BuildPlanner::new(&fs, options(Arch::Amd64));
    planner.plan_repository(&cfg.repos[0], &repo, &amd64_tags(), &TriggerFlags::new());
    let plan = planner.finish();

    assert_eq!(plan.accepted[0].reason, AcceptReason::DockerfileChange);
}

#[test]
fn file_trigger_reports_the_matching_pattern() {
    let cfg = demo_config(
        TargetBuilder::new("demo")
            .trigger("docs/*")
            .trigger("src/*")
            .build_entry("Dockerfile.amd64", "{arch}"),
    );
    let fs = work_fs(&[("demo/Dockerfile.amd64", dockerfile_for(Arch::Amd64))]);
    let (_, repo) = synced(DEMO_GIT, "demo", ChangeResult::files(["src/main.c"]));

    let mut planner = BuildPlanner::new(&fs, options(Arch::Amd64));
    planner.plan_repository(&cfg.repos[0], &repo, &amd64_tags(), &TriggerFlags::new());
    let plan = planner.finish();

    assert_eq!(
        plan.accepted[0].reason,
        AcceptReason::FileChange("src/*".into())
    );
}

#[test]
fn named_trigger_builds_unchanged_repository() {
    let cfg = demo_config(
        TargetBuilder::new("demo")
            .trigger("*shared")
            .build_entry("Dockerfile.amd64", "{arch}"),
    );
    let fs = work_fs(&[("demo/Dockerfile.amd64", dockerfile_for(Arch::Amd64))]);
    let (_, repo) = synced(DEMO_GIT, "demo", ChangeResult::unchanged());

    let mut flags = TriggerFlags::new();
    flags.record("shared", true);

    let mut planner = BuildPlanner::new(&fs, options(Arch::Amd64));
    planner.plan_repository(&cfg.repos[0], &repo, &amd64_tags(), &flags);
    let plan = planner.finish();

    assert_eq!(
        plan.accepted[0].reason,
        AcceptReason::Triggered("shared".into())
    );
}

#[test]
fn empty_tag_and_registry_are_rejected_in_order() {
    let cfg = ConfigFileBuilder::new()
        .with_repo(
            RepoBuilder::new(DEMO_GIT, "demo")
                .target(
                    TargetBuilder::new("demo")
                        .build_entry("Dockerfile.amd64", "{tag}")
                        .build(),
                )
                .target(
                    TargetBuilder::new("")
                        .build_entry("Dockerfile.amd64", "{arch}")
                        .build(),
                )
                .build(),
        )
        .build();
    let fs = work_fs(&[("demo/Dockerfile.amd64", dockerfile_for(Arch::Amd64))]);
    let (_, repo) = synced(DEMO_GIT, "demo", ChangeResult::Unknown);

    let untagged = TagSet {
        tag: String::new(),
        ..amd64_tags()
    };
    let mut planner = BuildPlanner::new(&fs, options(Arch::Amd64));
    planner.plan_repository(&cfg.repos[0], &repo, &untagged, &TriggerFlags::new());
    let plan = planner.finish();

    let exclusions: Vec<_> = plan.rejected.iter().map(|r| r.exclusion.clone()).collect();
    assert_eq!(exclusions, vec![Exclusion::EmptyTag, Exclusion::EmptyRegistry]);
}

#[test]
fn second_claim_on_a_name_is_a_duplicate() {
    let cfg = demo_config(
        TargetBuilder::new("demo")
            .build_entry("Dockerfile.amd64", "{arch}")
            .build_entry("Dockerfile.amd64", "amd64"),
    );
    let fs = work_fs(&[("demo/Dockerfile.amd64", dockerfile_for(Arch::Amd64))]);
    let (_, repo) = synced(DEMO_GIT, "demo", ChangeResult::Unknown);

    let mut planner = BuildPlanner::new(&fs, options(Arch::Amd64));
    planner.plan_repository(&cfg.repos[0], &repo, &amd64_tags(), &TriggerFlags::new());
    let plan = planner.finish();

    assert_eq!(accepted_names(&plan), vec!["demo:amd64"]);
    assert_eq!(
        plan.rejected[0].exclusion,
        Exclusion::DuplicateName("demo:amd64".into())
    );
}

#[test]
fn user_prefixes_names_and_manifests() {
    let cfg = demo_config(
        TargetBuilder::new("demo")
            .build_entry("Dockerfile.amd64", "{arch}")
            .manifest(&[Arch::Amd64, Arch::Arm64v8]),
    );
    let fs = work_fs(&[("demo/Dockerfile.amd64", dockerfile_for(Arch::Amd64))]);
    let (_, repo) = synced(DEMO_GIT, "demo", ChangeResult::Unknown);

    let mut opts = options(Arch::Amd64);
    opts.user = "bob".into();
    let mut planner = BuildPlanner::new(&fs, opts);
    planner.plan_repository(&cfg.repos[0], &repo, &amd64_tags(), &TriggerFlags::new());
    let plan = planner.finish();

    assert_eq!(accepted_names(&plan), vec!["bob/demo:amd64"]);
    assert_eq!(plan.manifests.len(), 1);
    assert_eq!(
        plan.manifests[0].members(),
        vec!["bob/demo:amd64", "bob/demo:arm64v8"]
    );
}
