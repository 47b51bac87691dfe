// src/plan/mod.rs

//! Build planning: tag templates, exclusion rules and the planner itself.

pub mod arch;
pub mod exclusion;
pub mod planner;
pub mod template;

pub use arch::dockerfile_arch;
pub use exclusion::Exclusion;
pub use planner::{
    AcceptReason, BuildPlan, BuildPlanner, BuildTask, ManifestSpec, PlannerOptions, Rejection,
    image_base_name,
};
pub use template::{TagSet, TagTemplate, TemplateError};
