// src/version.rs
//! Program version.
//!
//! Release builds can inject a tag at compile time:
//!
//! ```text
//! BATCH_RENAME_VERSION=v1.2.3 cargo build --release
//! ```
//!
//! The tag may carry a `v` prefix. If it is missing or not valid SemVer we
//! fall back to the package version, and after that to `0.0.0-unknown`.

use semver::Version;

/// Version of this build. Resolve once and pass it along.
pub fn current() -> Version {
    resolve(option_env!("BATCH_RENAME_VERSION"), env!("CARGO_PKG_VERSION"))
}

pub fn resolve(injected: Option<&str>, package: &str) -> Version {
    if let Some(tag) = injected.map(str::trim).filter(|s| !s.is_empty()) {
        let tag = tag.strip_prefix('v').unwrap_or(tag);
        match Version::parse(tag) {
            Ok(v) => return v,
            Err(e) => log::debug!("Ignoring invalid version tag {tag:?}: {e}"),
        }
    }
    Version::parse(package).unwrap_or_else(|_| unknown())
}

fn unknown() -> Version {
    Version {
        pre: semver::Prerelease::new("unknown").unwrap_or(semver::Prerelease::EMPTY),
        ..Version::new(0, 0, 0)
    }
}
