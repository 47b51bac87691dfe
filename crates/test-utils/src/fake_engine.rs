use std::collections::{HashMap, HashSet, VecDeque};
use std::path::Path;
use std::sync::{Arc, Mutex};

use dockyard::config::Credentials;
use dockyard::docker::{ContainerEngine, ContainerInfo, EngineError, ImageInfo};
use dockyard::types::BoxFuture;

/// A scripted push outcome for one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushFailure {
    Transient,
    Fatal(i32),
}

impl PushFailure {
    fn into_error(self) -> EngineError {
        match self {
            PushFailure::Transient => {
                EngineError::Transient("connection reset by peer".to_string())
            }
            PushFailure::Fatal(code) => EngineError::Command {
                action: "push".to_string(),
                code: Some(code),
                stderr: "denied: requested access to the resource is denied".to_string(),
            },
        }
    }
}

#[derive(Debug, Default)]
struct State {
    calls: Vec<String>,
    containers: Vec<ContainerInfo>,
    images: Vec<ImageInfo>,
    failing_builds: HashMap<String, i32>,
    panicking_builds: HashSet<String>,
    push_failures: HashMap<String, VecDeque<PushFailure>>,
    failing_removals: HashSet<String>,
    login_fails: bool,
    container_listing_fails: bool,
    image_listing_fails: bool,
}

/// A scripted `ContainerEngine` that records every call it receives.
///
/// Calls are recorded as short strings such as `"build demo:amd64"`,
/// `"push demo amd64"`, `"rmi demo:amd64"` or `"manifest demo a b"`.
#[derive(Debug, Clone, Default)]
pub struct FakeContainerEngine {
    state: Arc<Mutex<State>>,
}

impl FakeContainerEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_image(self, id: &str, reference: &str) -> Self {
        self.state.lock().unwrap().images.push(ImageInfo {
            id: id.to_string(),
            reference: reference.to_string(),
        });
        self
    }

    pub fn with_container(self, image: &str, name: &str) -> Self {
        self.state.lock().unwrap().containers.push(ContainerInfo {
            image: image.to_string(),
            name: name.to_string(),
        });
        self
    }

    /// Builds of `name` exit with `code`.
    pub fn failing_build(self, name: &str, code: i32) -> Self {
        self.state
            .lock()
            .unwrap()
            .failing_builds
            .insert(name.to_string(), code);
        self
    }

    /// Builds of `name` panic inside the engine.
    pub fn panicking_build(self, name: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .panicking_builds
            .insert(name.to_string());
        self
    }

    /// The next pushes of `name` fail with `failures`, in order; later
    /// attempts succeed.
    pub fn push_failures(self, name: &str, failures: &[PushFailure]) -> Self {
        self.state
            .lock()
            .unwrap()
            .push_failures
            .insert(name.to_string(), failures.iter().copied().collect());
        self
    }

    pub fn failing_removal(self, reference: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .failing_removals
            .insert(reference.to_string());
        self
    }

    pub fn failing_login(self) -> Self {
        self.state.lock().unwrap().login_fails = true;
        self
    }

    pub fn failing_container_listing(self) -> Self {
        self.state.lock().unwrap().container_listing_fails = true;
        self
    }

    pub fn failing_image_listing(self) -> Self {
        self.state.lock().unwrap().image_listing_fails = true;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Recorded calls starting with `prefix`.
    pub fn calls_to(&self, prefix: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.starts_with(prefix))
            .collect()
    }

    fn record(&self, call: String) {
        self.state.lock().unwrap().calls.push(call);
    }
}

fn failed(action: &str, code: i32) -> EngineError {
    EngineError::Command {
        action: action.to_string(),
        code: Some(code),
        stderr: format!("scripted {action} failure"),
    }
}

impl ContainerEngine for FakeContainerEngine {
    fn login<'a>(&'a self, credentials: &'a Credentials) -> BoxFuture<'a, Result<(), EngineError>> {
        Box::pin(async move {
            self.record(format!("login {}", credentials.user));
            if self.state.lock().unwrap().login_fails {
                return Err(failed("login", 1));
            }
            Ok(())
        })
    }

    fn logout(&self) -> BoxFuture<'_, Result<(), EngineError>> {
        Box::pin(async move {
            self.record("logout".to_string());
            Ok(())
        })
    }

    fn build_image<'a>(
        &'a self,
        tag: &'a str,
        _dockerfile: &'a Path,
        _context: &'a Path,
    ) -> BoxFuture<'a, Result<(), EngineError>> {
        Box::pin(async move {
            self.record(format!("build {tag}"));
            if self.state.lock().unwrap().panicking_builds.contains(tag) {
                panic!("scripted build panic for {tag}");
            }
            let code = self.state.lock().unwrap().failing_builds.get(tag).copied();
            match code {
                Some(code) => Err(failed("build", code)),
                None => Ok(()),
            }
        })
    }

    fn push_image<'a>(
        &'a self,
        repository: &'a str,
        tag: &'a str,
    ) -> BoxFuture<'a, Result<(), EngineError>> {
        Box::pin(async move {
            self.record(format!("push {repository} {tag}"));
            let name = format!("{repository}:{tag}");
            let next = self
                .state
                .lock()
                .unwrap()
                .push_failures
                .get_mut(&name)
                .and_then(|queue| queue.pop_front());
            match next {
                Some(failure) => Err(failure.into_error()),
                None => Ok(()),
            }
        })
    }

    fn list_containers(&self) -> BoxFuture<'_, Result<Vec<ContainerInfo>, EngineError>> {
        Box::pin(async move {
            let state = self.state.lock().unwrap();
            if state.container_listing_fails {
                return Err(failed("ps", 1));
            }
            Ok(state.containers.clone())
        })
    }

    fn list_images(&self) -> BoxFuture<'_, Result<Vec<ImageInfo>, EngineError>> {
        Box::pin(async move {
            let state = self.state.lock().unwrap();
            if state.image_listing_fails {
                return Err(failed("images", 1));
            }
            Ok(state.images.clone())
        })
    }

    fn stop_container<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<(), EngineError>> {
        Box::pin(async move {
            self.record(format!("stop {name}"));
            Ok(())
        })
    }

    fn remove_container<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<(), EngineError>> {
        Box::pin(async move {
            self.record(format!("rm {name}"));
            Ok(())
        })
    }

    fn remove_image<'a>(&'a self, reference: &'a str) -> BoxFuture<'a, Result<(), EngineError>> {
        Box::pin(async move {
            self.record(format!("rmi {reference}"));
            if self.state.lock().unwrap().failing_removals.contains(reference) {
                return Err(failed("rmi", 1));
            }
            Ok(())
        })
    }

    fn system_prune(&self) -> BoxFuture<'_, Result<(), EngineError>> {
        Box::pin(async move {
            self.record("prune".to_string());
            Ok(())
        })
    }

    fn publish_manifest<'a>(
        &'a self,
        name: &'a str,
        members: &'a [String],
    ) -> BoxFuture<'a, Result<(), EngineError>> {
        Box::pin(async move {
            self.record(format!("manifest {name} {}", members.join(" ")));
            Ok(())
        })
    }
}
