//! Build information.

use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Version and platform of the running build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildInfo {
    /// Crate version.
    pub version: &'static str,
    /// Package name.
    pub package: &'static str,
    /// Target operating system.
    pub os: &'static str,
    /// Target architecture.
    pub arch: &'static str,
}

impl fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Parlance v{} ({}/{})", self.version, self.os, self.arch)
    }
}

/// Build information for this binary.
pub const fn build_info() -> BuildInfo {
    BuildInfo {
        version: VERSION,
        package: env!("CARGO_PKG_NAME"),
        os: std::env::consts::OS,
        arch: std::env::consts::ARCH,
    }
}

/// Whether this build is at least `min_version`.
///
/// Versions compare numerically per dot-separated component; a leading `v`
/// and any `-pre` or `+build` suffix are ignored, and missing components
/// count as zero.
pub fn is_compatible(min_version: &str) -> bool {
    compare_versions(VERSION, min_version) != Ordering::Less
}

fn compare_versions(left: &str, right: &str) -> Ordering {
    let (left, right) = (components(left), components(right));
    let len = left.len().max(right.len());
    (0..len)
        .map(|i| {
            let a = left.get(i).copied().unwrap_or(0);
            let b = right.get(i).copied().unwrap_or(0);
            a.cmp(&b)
        })
        .find(|ordering| ordering.is_ne())
        .unwrap_or(Ordering::Equal)
}

fn components(version: &str) -> Vec<u64> {
    let version = version.trim();
    let version = version.strip_prefix('v').unwrap_or(version);
    let core = version.split(['-', '+']).next().unwrap_or_default();
    core.split('.')
        .map(|part| part.parse().unwrap_or(0))
        .collect()
}
