use jstubs_api::{DependencyResolver, StartOptions};
use jstubs_core::{Environment, RuffFormatter, StubgenConfig};
use jstubs_java::{ClassfileStubGenerator, ClasspathRuntime};
use jstubs_maven::{LocalRepositoryResolver, MavenResolver};
use std::sync::Arc;

/// Pick the dependency resolver a configuration asks for.
///
/// Offline runs look artifacts up in the local Maven repository and the
/// Gradle cache; otherwise `mvn` computes the full transitive classpath.
pub fn build_resolver(config: &StubgenConfig) -> Arc<dyn DependencyResolver> {
    if config.offline {
        tracing::info!("Offline mode: resolving from local repositories only");
        let local = LocalRepositoryResolver::new();
        match &config.maven_repository {
            Some(repo) => Arc::new(local.with_maven_repository(repo.clone())),
            None => Arc::new(local),
        }
    } else {
        Arc::new(
            MavenResolver::new()
                .with_maven_home(config.maven_home.clone())
                .with_java_home(config.java_home.clone())
                .with_local_repository(config.maven_repository.clone()),
        )
    }
}

/// Assemble the runtime environment for a configuration: dependency
/// resolution plus the classpath runtime, started with the configured
/// string policy.
pub fn build_environment(config: &StubgenConfig) -> Arc<Environment> {
    Arc::new(Environment::new(
        build_resolver(config),
        Arc::new(ClasspathRuntime),
        StartOptions {
            convert_strings: config.convert_strings,
        },
    ))
}

/// Build the environment for `config` and make it the process-wide one used
/// by runtime shims.
pub fn install_environment(config: &StubgenConfig) -> Arc<Environment> {
    Environment::install(build_environment(config))
}

pub fn default_generator() -> ClassfileStubGenerator {
    ClassfileStubGenerator::new()
}

pub fn default_formatter() -> RuffFormatter {
    RuffFormatter::new()
}

/// Initializes the logging system for a specific component.
/// This delegates to the core logging module.
pub fn init_logging(component: &str, to_stderr: bool) -> Option<impl Drop> {
    Some(jstubs_core::logging::init_logging(component, to_stderr))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolver_selection() {
        let online = StubgenConfig::default();
        assert_eq!(build_resolver(&online).name(), "maven");

        let offline = StubgenConfig {
            offline: true,
            ..Default::default()
        };
        assert_eq!(build_resolver(&offline).name(), "local-repository");
    }

    #[test]
    fn test_environment_carries_string_policy() {
        let config = StubgenConfig {
            convert_strings: false,
            ..Default::default()
        };
        let env = build_environment(&config);
        assert!(!env.options().convert_strings);
        assert!(env.session().is_none());
    }
}
