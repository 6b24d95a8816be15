use jstubs_api::{StubError, StubResult};
use sha2::{Digest, Sha256, Sha512};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Maven distribution installed when no `mvn` is available.
pub const DEFAULT_MAVEN_URL: &str =
    "tgz+https://dlcdn.apache.org/maven/maven-3/3.9.9/binaries/apache-maven-3.9.9-bin.tar.gz";
pub const DEFAULT_MAVEN_SHA512: &str = "a555254d6b53d267965a3404ecb14e53c3827c09c3b94b5678835887ab404556bfaf78dcfe03ba76fa2508649dca8531c74bca4d5846513522404d48e8c4ac8b";

const COMPLETE_MARKER: &str = ".complete";

pub(crate) fn mvn_name() -> &'static str {
    if cfg!(windows) { "mvn.cmd" } else { "mvn" }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArchiveFormat {
    TarGz,
    Zip,
}

/// Where to download Maven from, and the sha512 it must match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MavenDistribution {
    pub url: String,
    pub sha512: Option<String>,
}

impl Default for MavenDistribution {
    fn default() -> Self {
        Self {
            url: DEFAULT_MAVEN_URL.to_string(),
            sha512: Some(DEFAULT_MAVEN_SHA512.to_string()),
        }
    }
}

impl MavenDistribution {
    pub fn new(url: impl Into<String>, sha512: Option<String>) -> Self {
        Self {
            url: url.into(),
            sha512,
        }
    }

    /// `MAVEN_URL` (with `MAVEN_SHA`) when set, the pinned default otherwise.
    pub fn from_env() -> Self {
        match std::env::var("MAVEN_URL") {
            Ok(url) if !url.trim().is_empty() => Self::new(
                url.trim(),
                std::env::var("MAVEN_SHA")
                    .ok()
                    .map(|sha| sha.trim().to_string())
                    .filter(|sha| !sha.is_empty()),
            ),
            _ => Self::default(),
        }
    }

    /// The URL with any `tgz+`/`zip+` format prefix removed, and the format.
    fn source(&self) -> (&str, ArchiveFormat) {
        if let Some(rest) = self.url.strip_prefix("tgz+") {
            return (rest, ArchiveFormat::TarGz);
        }
        if let Some(rest) = self.url.strip_prefix("zip+") {
            return (rest, ArchiveFormat::Zip);
        }
        let format = if self.url.ends_with(".zip") {
            ArchiveFormat::Zip
        } else {
            ArchiveFormat::TarGz
        };
        (&self.url, format)
    }

    /// Cache directory name: stable per URL.
    fn cache_key(&self) -> String {
        let digest = format!("{:x}", Sha256::digest(self.url.as_bytes()));
        digest[..16].to_string()
    }
}

/// Downloads and unpacks Maven distributions into a per-user cache.
#[derive(Debug, Clone)]
pub struct MavenProvisioner {
    cache_dir: PathBuf,
}

impl Default for MavenProvisioner {
    fn default() -> Self {
        Self::new()
    }
}

impl MavenProvisioner {
    /// Cache under the platform cache directory (`~/.cache/jstubs/maven`).
    pub fn new() -> Self {
        let base = dirs::cache_dir().unwrap_or_else(std::env::temp_dir);
        Self {
            cache_dir: base.join("jstubs").join("maven"),
        }
    }

    pub fn with_cache_dir(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    fn package_dir(&self, distribution: &MavenDistribution) -> PathBuf {
        self.cache_dir.join(distribution.cache_key())
    }

    /// The `mvn` launcher of a previously completed install, if any.
    pub fn cached(&self, distribution: &MavenDistribution) -> Option<PathBuf> {
        let package = self.package_dir(distribution);
        if !package.join(COMPLETE_MARKER).is_file() {
            return None;
        }
        find_mvn(&package.join("home"))
    }

    /// Return the `mvn` launcher for `distribution`, downloading and
    /// unpacking it first when the cache has no completed install.
    pub fn provision(&self, distribution: &MavenDistribution) -> StubResult<PathBuf> {
        if let Some(mvn) = self.cached(distribution) {
            debug!("Using cached Maven at {}", mvn.display());
            return Ok(mvn);
        }

        let package = self.package_dir(distribution);
        std::fs::create_dir_all(&package)?;
        let (source, format) = distribution.source();
        let archive = package.join(match format {
            ArchiveFormat::TarGz => "maven.tar.gz",
            ArchiveFormat::Zip => "maven.zip",
        });

        info!("Downloading Maven from {source}");
        fetch(source, &archive)?;
        if let Some(expected) = &distribution.sha512 {
            if let Err(err) = verify_sha512(&archive, expected) {
                let _ = std::fs::remove_file(&archive);
                return Err(err);
            }
        } else {
            warn!("No sha512 given for {source}; skipping checksum verification");
        }

        let staging = package.join("home.partial");
        if staging.exists() {
            std::fs::remove_dir_all(&staging)?;
        }
        std::fs::create_dir_all(&staging)?;
        extract(&archive, format, &staging)?;

        let home = package.join("home");
        if home.exists() {
            std::fs::remove_dir_all(&home)?;
        }
        std::fs::rename(&staging, &home)?;
        let _ = std::fs::remove_file(&archive);

        let mvn = find_mvn(&home).ok_or_else(|| {
            StubError::EnvironmentUnavailable(format!(
                "Maven archive from {source} contains no bin/{}",
                mvn_name()
            ))
        })?;
        std::fs::write(package.join(COMPLETE_MARKER), source)?;
        info!("Installed Maven at {}", mvn.display());
        Ok(mvn)
    }
}

fn unavailable(message: String) -> StubError {
    StubError::EnvironmentUnavailable(message)
}

fn fetch(source: &str, dest: &Path) -> StubResult<()> {
    if source.starts_with("http://") || source.starts_with("https://") {
        let output = Command::new("curl")
            .arg("-fsSL")
            .arg("--retry")
            .arg("2")
            .arg("-o")
            .arg(dest)
            .arg(source)
            .output()
            .map_err(|e| unavailable(format!("Cannot download Maven, curl failed to run: {e}")))?;
        if !output.status.success() {
            return Err(unavailable(format!(
                "Downloading {source} failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        return Ok(());
    }

    let local = source.strip_prefix("file://").unwrap_or(source);
    std::fs::copy(local, dest)
        .map_err(|e| unavailable(format!("Cannot copy Maven archive {local}: {e}")))?;
    Ok(())
}

fn verify_sha512(archive: &Path, expected: &str) -> StubResult<()> {
    let mut hasher = Sha512::new();
    let mut file = File::open(archive)?;
    std::io::copy(&mut file, &mut hasher)?;
    let actual = format!("{:x}", hasher.finalize());
    if !actual.eq_ignore_ascii_case(expected.trim()) {
        return Err(unavailable(format!(
            "Checksum mismatch for Maven archive: expected sha512 {expected}, got {actual}"
        )));
    }
    Ok(())
}

fn extract(archive: &Path, format: ArchiveFormat, dest: &Path) -> StubResult<()> {
    match format {
        ArchiveFormat::Zip => {
            let file = File::open(archive)?;
            let mut zip = zip::ZipArchive::new(file)
                .map_err(|e| unavailable(format!("Invalid Maven archive: {e}")))?;
            zip.extract(dest)
                .map_err(|e| unavailable(format!("Cannot unpack Maven archive: {e}")))?;
        }
        ArchiveFormat::TarGz => {
            let output = Command::new("tar")
                .arg("-xzf")
                .arg(archive)
                .arg("-C")
                .arg(dest)
                .output()
                .map_err(|e| unavailable(format!("Cannot unpack Maven archive, tar failed to run: {e}")))?;
            if !output.status.success() {
                return Err(unavailable(format!(
                    "Cannot unpack Maven archive: {}",
                    String::from_utf8_lossy(&output.stderr).trim()
                )));
            }
        }
    }
    Ok(())
}

/// Find `bin/mvn` below an unpacked distribution.
fn find_mvn(home: &Path) -> Option<PathBuf> {
    WalkDir::new(home)
        .max_depth(3)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .find(|path| {
            path.is_file()
                && path.file_name().and_then(|n| n.to_str()) == Some(mvn_name())
                && path.parent().and_then(|p| p.file_name()).and_then(|n| n.to_str()) == Some("bin")
        })
}
