//! Offline resolution against artifacts already on disk.
//!
//! Looks in the local Maven repository (`~/.m2/repository`) and the Gradle
//! cache (`~/.gradle/caches/modules-2/files-2.1/{group}/{artifact}/{version}/{hash}/{file}`).
//! Only the requested artifacts are returned; transitive dependencies must
//! be listed explicitly.

use jstubs_api::{Coordinate, DependencyResolver, StubError, StubResult};
use std::path::PathBuf;
use tracing::debug;
use walkdir::WalkDir;

#[derive(Debug, Clone)]
pub struct LocalRepositoryResolver {
    maven_repository: Option<PathBuf>,
    gradle_cache: Option<PathBuf>,
}

impl LocalRepositoryResolver {
    pub fn new() -> Self {
        let maven_repository = std::env::var_os("MAVEN_REPO")
            .map(PathBuf::from)
            .or_else(|| dirs::home_dir().map(|h| h.join(".m2/repository")));
        let gradle_cache = dirs::home_dir().map(|h| h.join(".gradle/caches/modules-2/files-2.1"));

        Self {
            maven_repository,
            gradle_cache,
        }
    }

    /// Create with custom repository locations (for testing)
    pub fn with_paths(maven_repository: Option<PathBuf>, gradle_cache: Option<PathBuf>) -> Self {
        Self {
            maven_repository,
            gradle_cache,
        }
    }

    pub fn with_maven_repository(mut self, path: PathBuf) -> Self {
        self.maven_repository = Some(path);
        self
    }

    fn find_in_maven(&self, coordinate: &Coordinate) -> Option<PathBuf> {
        let repo = self.maven_repository.as_ref()?;
        let jar = repo.join(coordinate.repository_path());
        jar.is_file().then_some(jar)
    }

    fn find_in_gradle(&self, coordinate: &Coordinate) -> Option<PathBuf> {
        let cache = self.gradle_cache.as_ref()?;
        let version_dir = cache
            .join(coordinate.group())
            .join(coordinate.artifact())
            .join(coordinate.version());
        if !version_dir.is_dir() {
            return None;
        }

        let expected = format!("{}-{}.jar", coordinate.artifact(), coordinate.version());
        WalkDir::new(&version_dir)
            .min_depth(2)
            .max_depth(2)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .map(|e| e.into_path())
            .find(|path| path.file_name().and_then(|n| n.to_str()) == Some(expected.as_str()))
    }

    fn locate(&self, coordinate: &Coordinate) -> Option<PathBuf> {
        self.find_in_maven(coordinate)
            .or_else(|| self.find_in_gradle(coordinate))
    }
}

impl Default for LocalRepositoryResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl DependencyResolver for LocalRepositoryResolver {
    fn name(&self) -> &str {
        "local-repository"
    }

    fn resolve(&self, coordinates: &[Coordinate]) -> StubResult<Vec<PathBuf>> {
        let mut classpath = Vec::new();
        let mut missing = Vec::new();
        for coordinate in coordinates {
            match self.locate(coordinate) {
                Some(path) => {
                    debug!("{} -> {}", coordinate, path.display());
                    classpath.push(path);
                }
                None => missing.push(coordinate.to_string()),
            }
        }

        if !missing.is_empty() {
            return Err(StubError::Resolution(format!(
                "not found in local repositories: {}",
                missing.join(", ")
            )));
        }
        Ok(classpath)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_resolves_from_maven_layout() {
        let temp = tempfile::tempdir().unwrap();
        let repo = temp.path().to_path_buf();
        let coordinate = Coordinate::parse("org.example:lib:1.0.0").unwrap();
        let jar = repo.join("org/example/lib/1.0.0/lib-1.0.0.jar");
        fs::create_dir_all(jar.parent().unwrap()).unwrap();
        fs::File::create(&jar).unwrap();

        let resolver = LocalRepositoryResolver::with_paths(Some(repo), None);
        assert_eq!(resolver.resolve(&[coordinate]).unwrap(), vec![jar]);
    }

    #[test]
    fn test_resolves_from_gradle_cache() {
        let temp = tempfile::tempdir().unwrap();
        let cache_path = temp.path().to_path_buf();

        // group/artifact/version/hash/file.jar
        let jar_dir = cache_path.join("io.netty/netty-common/4.1.100.Final/abc123");
        fs::create_dir_all(&jar_dir).unwrap();
        let jar_path = jar_dir.join("netty-common-4.1.100.Final.jar");
        fs::File::create(&jar_path).unwrap();
        fs::File::create(jar_dir.join("netty-common-4.1.100.Final-sources.jar")).unwrap();

        let resolver = LocalRepositoryResolver::with_paths(None, Some(cache_path));
        let coordinate = Coordinate::parse("io.netty:netty-common:4.1.100.Final").unwrap();
        assert_eq!(resolver.resolve(&[coordinate]).unwrap(), vec![jar_path]);
    }

    #[test]
    fn test_missing_artifacts_are_reported() {
        let temp = tempfile::tempdir().unwrap();
        let resolver =
            LocalRepositoryResolver::with_paths(Some(temp.path().to_path_buf()), None);
        let err = resolver
            .resolve(&[Coordinate::parse("org.example:missing:2.0").unwrap()])
            .unwrap_err();
        match err {
            StubError::Resolution(message) => assert!(message.contains("org.example:missing:2.0")),
            other => panic!("unexpected error: {other}"),
        }
    }
}
