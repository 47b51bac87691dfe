// src/plan/arch.rs

use crate::types::Arch;

/// Architecture declared by a dockerfile's base image.
///
/// Only the first line starting with `FROM` is inspected; it is searched
/// for `amd64`, `arm64v8` and `arm32v7` in that order. `None` if there is no
/// `FROM` line or it names none of them.
pub fn dockerfile_arch(content: &str) -> Option<Arch> {
    let from_line = content.lines().find(|l| l.starts_with("FROM"))?;
    let lowered = from_line.to_lowercase();
    Arch::KNOWN
        .into_iter()
        .find(|arch| lowered.contains(arch.as_str()))
}
