use crate::pom::render_pom;
use crate::provision::{MavenDistribution, MavenProvisioner, mvn_name};
use jstubs_api::{Coordinate, DependencyResolver, StubError, StubResult};
use jstubs_java::{JavaHome, JdkLocator};
use once_cell::sync::OnceCell;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info, warn};

const CLASSPATH_FILE: &str = "classpath.txt";

/// Resolves coordinates by running `mvn dependency:build-classpath` on a
/// generated POM.
#[derive(Debug, Clone, Default)]
pub struct MavenResolver {
    maven_home: Option<PathBuf>,
    java_home: Option<PathBuf>,
    local_repository: Option<PathBuf>,
    provisioner: MavenProvisioner,
    /// Distribution to install when no `mvn` is found; `MAVEN_URL` when unset.
    distribution: Option<MavenDistribution>,
    provisioned: OnceCell<PathBuf>,
}

impl MavenResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_maven_home(mut self, path: Option<PathBuf>) -> Self {
        self.maven_home = path;
        self
    }

    pub fn with_java_home(mut self, path: Option<PathBuf>) -> Self {
        self.java_home = path;
        self
    }

    pub fn with_local_repository(mut self, path: Option<PathBuf>) -> Self {
        self.local_repository = path;
        self
    }

    pub fn with_provisioner(mut self, provisioner: MavenProvisioner) -> Self {
        self.provisioner = provisioner;
        self
    }

    pub fn with_distribution(mut self, distribution: MavenDistribution) -> Self {
        self.distribution = Some(distribution);
        self
    }

    fn distribution(&self) -> MavenDistribution {
        self.distribution
            .clone()
            .unwrap_or_else(MavenDistribution::from_env)
    }

    /// Locate the `mvn` launcher: explicit home, `MAVEN_HOME`/`M2_HOME`,
    /// `PATH`, then a previously provisioned install.
    pub fn mvn_executable(&self) -> Option<PathBuf> {
        self.installed_mvn()
            .or_else(|| self.provisioned.get().cloned())
            .or_else(|| self.provisioner.cached(&self.distribution()))
    }

    /// `mvn`, installing it into the cache when nothing is installed.
    fn mvn_or_provision(&self) -> StubResult<PathBuf> {
        if let Some(mvn) = self.mvn_executable() {
            return Ok(mvn);
        }
        let distribution = self.distribution();
        warn!("Maven not found; provisioning {}", distribution.url);
        self.provisioned
            .get_or_try_init(|| self.provisioner.provision(&distribution))
            .cloned()
            .map_err(|e| {
                StubError::EnvironmentUnavailable(format!(
                    "Maven not found and could not be provisioned: {e}. \
                     Install Maven or set MAVEN_HOME"
                ))
            })
    }

    fn installed_mvn(&self) -> Option<PathBuf> {
        let homes = self
            .maven_home
            .clone()
            .into_iter()
            .chain(std::env::var_os("MAVEN_HOME").map(PathBuf::from))
            .chain(std::env::var_os("M2_HOME").map(PathBuf::from));
        for home in homes {
            let candidate = home.join("bin").join(mvn_name());
            if candidate.is_file() {
                return Some(candidate);
            }
        }

        let path = std::env::var_os("PATH")?;
        std::env::split_paths(&path)
            .map(|dir| dir.join(mvn_name()))
            .find(|candidate| candidate.is_file())
    }

    fn java_home(&self) -> Option<JavaHome> {
        match &self.java_home {
            Some(path) => JdkLocator::with_home(path.clone()).locate(),
            None => JdkLocator::new().locate(),
        }
    }

    fn read_classpath(file: &Path) -> StubResult<Vec<PathBuf>> {
        let content = std::fs::read_to_string(file)?;
        Ok(std::env::split_paths(content.trim())
            .filter(|p| !p.as_os_str().is_empty())
            .collect())
    }
}

impl DependencyResolver for MavenResolver {
    fn name(&self) -> &str {
        "maven"
    }

    fn ensure_available(&self) -> StubResult<()> {
        if self.java_home().is_none() {
            return Err(StubError::EnvironmentUnavailable(
                "No Java installation found. Install a JDK or set JAVA_HOME".to_string(),
            ));
        }
        self.mvn_or_provision()?;
        Ok(())
    }

    fn resolve(&self, coordinates: &[Coordinate]) -> StubResult<Vec<PathBuf>> {
        let mvn = self.mvn_or_provision()?;
        let java = self.java_home().ok_or_else(|| {
            StubError::EnvironmentUnavailable("No Java installation found".to_string())
        })?;

        let work_dir = tempfile::tempdir()?;
        let pom = work_dir.path().join("pom.xml");
        std::fs::write(&pom, render_pom(coordinates))?;
        let classpath_file = work_dir.path().join(CLASSPATH_FILE);

        let mut command = Command::new(&mvn);
        command
            .current_dir(work_dir.path())
            .env("JAVA_HOME", &java.path)
            .arg("-B")
            .arg("-q")
            .arg("-f")
            .arg(&pom)
            .arg("dependency:build-classpath")
            .arg(format!("-Dmdep.outputFile={}", classpath_file.display()));
        if let Some(repo) = &self.local_repository {
            command.arg(format!("-Dmaven.repo.local={}", repo.display()));
        }

        info!(
            "Resolving {} coordinates with {} (java {})",
            coordinates.len(),
            mvn.display(),
            java.version.as_deref().unwrap_or("unknown")
        );
        let output = command.output().map_err(|e| {
            StubError::EnvironmentUnavailable(format!("Failed to run {}: {e}", mvn.display()))
        })?;
        if !output.status.success() {
            let stdout = String::from_utf8_lossy(&output.stdout);
            let stderr = String::from_utf8_lossy(&output.stderr);
            let tail: Vec<&str> = stdout.lines().chain(stderr.lines()).rev().take(20).collect();
            let tail: Vec<&str> = tail.into_iter().rev().collect();
            return Err(StubError::Resolution(format!(
                "mvn exited with {}:\n{}",
                output.status,
                tail.join("\n")
            )));
        }

        let classpath = Self::read_classpath(&classpath_file)?;
        debug!("Resolved classpath: {:?}", classpath);
        Ok(classpath)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_maven_home() {
        let temp = tempfile::tempdir().unwrap();
        let bin = temp.path().join("bin");
        std::fs::create_dir_all(&bin).unwrap();
        std::fs::File::create(bin.join(mvn_name())).unwrap();

        let resolver = MavenResolver::new().with_maven_home(Some(temp.path().to_path_buf()));
        assert_eq!(resolver.mvn_executable(), Some(bin.join(mvn_name())));
    }

    #[test]
    fn test_missing_java_is_environment_unavailable() {
        let temp = tempfile::tempdir().unwrap();
        let bin = temp.path().join("bin");
        std::fs::create_dir_all(&bin).unwrap();
        std::fs::File::create(bin.join(mvn_name())).unwrap();

        let resolver = MavenResolver::new()
            .with_maven_home(Some(temp.path().to_path_buf()))
            .with_java_home(Some(temp.path().join("no-such-jdk")));
        assert!(matches!(
            resolver.ensure_available(),
            Err(StubError::EnvironmentUnavailable(_))
        ));
    }

    fn maven_zip(path: &Path) {
        use std::io::Write;
        let mut zip = zip::ZipWriter::new(std::fs::File::create(path).unwrap());
        zip.start_file(
            format!("apache-maven/bin/{}", mvn_name()),
            zip::write::SimpleFileOptions::default(),
        )
        .unwrap();
        zip.write_all(b"#!/bin/sh\n").unwrap();
        zip.finish().unwrap();
    }

    #[test]
    fn test_missing_maven_is_provisioned_into_cache() {
        let temp = tempfile::tempdir().unwrap();
        let archive = temp.path().join("maven-bin.zip");
        maven_zip(&archive);

        let resolver = MavenResolver::new()
            .with_provisioner(MavenProvisioner::with_cache_dir(temp.path().join("cache")))
            .with_distribution(MavenDistribution::new(archive.display().to_string(), None));
        if resolver.installed_mvn().is_some() {
            // A system Maven takes precedence over provisioning.
            return;
        }

        assert!(resolver.mvn_executable().is_none());
        let mvn = resolver.mvn_or_provision().unwrap();
        assert!(mvn.starts_with(temp.path().join("cache")));
        assert_eq!(resolver.mvn_executable(), Some(mvn.clone()));

        // A fresh resolver finds the completed install without downloading.
        std::fs::remove_file(&archive).unwrap();
        let again = MavenResolver::new()
            .with_provisioner(MavenProvisioner::with_cache_dir(temp.path().join("cache")))
            .with_distribution(MavenDistribution::new(archive.display().to_string(), None));
        assert_eq!(again.mvn_executable(), Some(mvn));
    }

    #[test]
    fn test_failed_provisioning_is_environment_unavailable() {
        let temp = tempfile::tempdir().unwrap();
        let resolver = MavenResolver::new()
            .with_provisioner(MavenProvisioner::with_cache_dir(temp.path().join("cache")))
            .with_distribution(MavenDistribution::new(
                temp.path().join("missing.zip").display().to_string(),
                None,
            ));
        if resolver.installed_mvn().is_some() {
            return;
        }

        match resolver.mvn_or_provision() {
            Err(StubError::EnvironmentUnavailable(message)) => {
                assert!(message.contains("could not be provisioned"))
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_read_classpath() {
        let temp = tempfile::tempdir().unwrap();
        let a = temp.path().join("a.jar");
        let b = temp.path().join("b.jar");
        let joined = std::env::join_paths([&a, &b]).unwrap();
        let file = temp.path().join(CLASSPATH_FILE);
        std::fs::write(&file, format!("{}\n", joined.to_string_lossy())).unwrap();

        assert_eq!(MavenResolver::read_classpath(&file).unwrap(), vec![a, b]);
    }
}
