// src/docker/cleanup.rs

use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use super::{ContainerEngine, ContainerInfo, ImageInfo};

/// A local image that is about to be rebuilt, plus the containers using it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaleImage {
    pub reference: String,
    pub containers: Vec<String>,
}

/// What the cleanup stage removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub images: Vec<String>,
    pub containers: Vec<String>,
    pub elapsed: Duration,
}

/// Match planned build names against local images and containers.
///
/// Containers are listed by image id; ids are translated to `repo:tag`
/// where a local image has that id. An id carrying several tags resolves to
/// the first one listed. Names without a local image are skipped.
pub fn find_stale_images<'n>(
    containers: &[ContainerInfo],
    images: &[ImageInfo],
    names: impl IntoIterator<Item = &'n str>,
) -> Vec<StaleImage> {
    let mut by_id: HashMap<&str, &str> = HashMap::new();
    for img in images {
        by_id.entry(img.id.as_str()).or_insert(img.reference.as_str());
    }
    let references: HashSet<&str> = images.iter().map(|img| img.reference.as_str()).collect();

    let resolved: Vec<(&str, &str)> = containers
        .iter()
        .map(|c| {
            let image = by_id.get(c.image.as_str()).copied().unwrap_or(c.image.as_str());
            (image, c.name.as_str())
        })
        .collect();

    names
        .into_iter()
        .filter(|name| references.contains(name))
        .map(|name| StaleImage {
            reference: name.to_string(),
            containers: resolved
                .iter()
                .filter(|(image, _)| *image == name)
                .map(|(_, container)| container.to_string())
                .collect(),
        })
        .collect()
}

/// Removes existing images (and the containers using them) for every build
/// about to run, so fresh builds do not leave dangling copies behind.
///
/// Every failure is logged and skipped; cleanup never aborts a run. If either
/// listing fails the stage removes nothing.
#[derive(Debug)]
pub struct CleanupStage<'a> {
    engine: &'a dyn ContainerEngine,
}

impl<'a> CleanupStage<'a> {
    pub fn new(engine: &'a dyn ContainerEngine) -> Self {
        Self { engine }
    }

    pub async fn run<'n>(&self, names: impl IntoIterator<Item = &'n str>) -> CleanupReport {
        let started = Instant::now();

        let mut report = CleanupReport::default();

        let listed = match self.engine.list_containers().await {
            Ok(containers) => match self.engine.list_images().await {
                Ok(images) => Ok((containers, images)),
                Err(e) => Err(("images", e)),
            },
            Err(e) => Err(("containers", e)),
        };
        let (containers, images) = match listed {
            Ok(listed) => listed,
            Err((what, e)) => {
                warn!(listing = what, error = %e, "cannot list local state; skipping cleanup");
                report.elapsed = started.elapsed();
                return report;
            }
        };

        for stale in find_stale_images(&containers, &images, names) {
            for container in &stale.containers {
                debug!(%container, image = %stale.reference, "removing container");
                if let Err(e) = self.engine.stop_container(container).await {
                    warn!(%container, error = %e, "failed to stop container");
                }
                match self.engine.remove_container(container).await {
                    Ok(()) => report.containers.push(container.clone()),
                    Err(e) => warn!(%container, error = %e, "failed to remove container"),
                }
            }

            info!(image = %stale.reference, "removing stale image");
            match self.engine.remove_image(&stale.reference).await {
                Ok(()) => report.images.push(stale.reference),
                Err(e) => warn!(image = %stale.reference, error = %e, "failed to remove image"),
            }
        }

        report.elapsed = started.elapsed();
        report
    }
}
