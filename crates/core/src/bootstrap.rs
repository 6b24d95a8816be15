//! Process-wide runtime environment.
//!
//! The runtime starts at most once per process. Callers ask for a session
//! through [`Environment::bootstrap`]; the first caller resolves the
//! classpath and starts the runtime while concurrent callers block until
//! that attempt finishes and then share its outcome. A failed attempt is
//! not cached as a success: the next caller after it starts a new attempt.

use jstubs_api::{
    Coordinate, DependencyResolver, RuntimeLauncher, RuntimeSession, StartOptions, StubError,
    StubResult,
};
use once_cell::sync::OnceCell;
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvironmentState {
    NotStarted,
    Starting,
    Running,
    Failed,
}

enum State {
    NotStarted,
    Starting,
    Running(Arc<dyn RuntimeSession>),
    Failed,
}

struct Inner {
    state: State,
    /// Coordinates requested so far; frozen once the runtime runs.
    coordinates: Vec<Coordinate>,
    attempt: u64,
    last_failure: Option<(u64, StubError)>,
}

pub struct Environment {
    resolver: Arc<dyn DependencyResolver>,
    launcher: Arc<dyn RuntimeLauncher>,
    options: StartOptions,
    inner: Mutex<Inner>,
    changed: Condvar,
}

static GLOBAL: OnceCell<Arc<Environment>> = OnceCell::new();

impl Environment {
    pub fn new(
        resolver: Arc<dyn DependencyResolver>,
        launcher: Arc<dyn RuntimeLauncher>,
        options: StartOptions,
    ) -> Self {
        Self {
            resolver,
            launcher,
            options,
            inner: Mutex::new(Inner {
                state: State::NotStarted,
                coordinates: Vec::new(),
                attempt: 0,
                last_failure: None,
            }),
            changed: Condvar::new(),
        }
    }

    /// Install the process-wide environment. Returns the already installed
    /// one if another caller got there first.
    pub fn install(environment: Arc<Environment>) -> Arc<Environment> {
        GLOBAL.get_or_init(|| environment).clone()
    }

    /// The process-wide environment used by runtime shims.
    pub fn global() -> StubResult<Arc<Environment>> {
        GLOBAL.get().cloned().ok_or_else(|| {
            StubError::EnvironmentUnavailable("no runtime environment installed".to_string())
        })
    }

    pub fn options(&self) -> StartOptions {
        self.options
    }

    pub fn state(&self) -> EnvironmentState {
        match self.inner.lock().state {
            State::NotStarted => EnvironmentState::NotStarted,
            State::Starting => EnvironmentState::Starting,
            State::Running(_) => EnvironmentState::Running,
            State::Failed => EnvironmentState::Failed,
        }
    }

    /// The running session, if the runtime has been started.
    pub fn session(&self) -> Option<Arc<dyn RuntimeSession>> {
        match &self.inner.lock().state {
            State::Running(session) => Some(session.clone()),
            _ => None,
        }
    }

    pub fn coordinates(&self) -> Vec<Coordinate> {
        self.inner.lock().coordinates.clone()
    }

    /// Add coordinates to the set the runtime will be started with.
    pub fn require(&self, coordinates: &[Coordinate]) {
        let mut inner = self.inner.lock();
        Self::add_coordinates(&mut inner, coordinates);
    }

    fn add_coordinates(inner: &mut Inner, coordinates: &[Coordinate]) {
        let frozen = matches!(inner.state, State::Running(_) | State::Starting);
        for coordinate in coordinates {
            if inner.coordinates.contains(coordinate) {
                continue;
            }
            if frozen {
                warn!(
                    "Runtime already started; ignoring late coordinate {}",
                    coordinate
                );
                continue;
            }
            inner.coordinates.push(coordinate.clone());
        }
    }

    /// Start the runtime if needed and return its session.
    pub fn bootstrap(&self, coordinates: &[Coordinate]) -> StubResult<Arc<dyn RuntimeSession>> {
        let mut inner = self.inner.lock();
        Self::add_coordinates(&mut inner, coordinates);

        loop {
            match &inner.state {
                State::Running(session) => return Ok(session.clone()),
                State::Starting => {
                    let awaited = inner.attempt;
                    while matches!(inner.state, State::Starting) && inner.attempt == awaited {
                        self.changed.wait(&mut inner);
                    }
                    if let Some((attempt, error)) = &inner.last_failure {
                        if *attempt == awaited {
                            return Err(error.duplicate());
                        }
                    }
                }
                State::NotStarted | State::Failed => break,
            }
        }

        inner.attempt += 1;
        let attempt = inner.attempt;
        inner.state = State::Starting;
        let requested = inner.coordinates.clone();
        drop(inner);

        let result = self.start(&requested);

        let mut inner = self.inner.lock();
        let outcome = match result {
            Ok(session) => {
                inner.state = State::Running(session.clone());
                Ok(session)
            }
            Err(error) => {
                warn!("Runtime bootstrap attempt {} failed: {}", attempt, error);
                let reported = error.duplicate();
                inner.state = State::Failed;
                inner.last_failure = Some((attempt, error));
                Err(reported)
            }
        };
        self.changed.notify_all();
        outcome
    }

    fn start(&self, coordinates: &[Coordinate]) -> StubResult<Arc<dyn RuntimeSession>> {
        self.resolver.ensure_available()?;
        self.launcher.ensure_available()?;

        info!(
            "Resolving {} coordinates with {}",
            coordinates.len(),
            self.resolver.name()
        );
        let classpath = self.resolver.resolve(coordinates)?;
        info!(
            "Starting runtime with {} classpath entries (convert_strings={})",
            classpath.len(),
            self.options.convert_strings
        );
        self.launcher.start(classpath, self.options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jstubs_api::{NamespaceHandle, StubResult};
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct FixedResolver;
    impl DependencyResolver for FixedResolver {
        fn name(&self) -> &str {
            "fixed"
        }
        fn resolve(&self, coordinates: &[Coordinate]) -> StubResult<Vec<PathBuf>> {
            Ok(coordinates
                .iter()
                .map(|c| PathBuf::from(format!("{}.jar", c.artifact())))
                .collect())
        }
    }

    struct EmptySession {
        classpath: Vec<PathBuf>,
        options: StartOptions,
    }
    impl RuntimeSession for EmptySession {
        fn classpath(&self) -> &[PathBuf] {
            &self.classpath
        }
        fn options(&self) -> StartOptions {
            self.options
        }
        fn load_namespace(&self, name: &str) -> StubResult<Arc<dyn NamespaceHandle>> {
            Err(StubError::NamespaceLoad {
                name: name.to_string(),
                reason: "empty".to_string(),
            })
        }
    }

    /// Fails the first `failures` starts, then succeeds.
    struct CountingLauncher {
        starts: AtomicUsize,
        failures: usize,
        delay: Duration,
    }
    impl RuntimeLauncher for CountingLauncher {
        fn start(
            &self,
            classpath: Vec<PathBuf>,
            options: StartOptions,
        ) -> StubResult<Arc<dyn RuntimeSession>> {
            let n = self.starts.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(self.delay);
            if n < self.failures {
                return Err(StubError::Bootstrap(format!("start {n} failed")));
            }
            Ok(Arc::new(EmptySession { classpath, options }))
        }
    }

    fn environment(failures: usize, delay: Duration) -> (Arc<Environment>, Arc<CountingLauncher>) {
        let launcher = Arc::new(CountingLauncher {
            starts: AtomicUsize::new(0),
            failures,
            delay,
        });
        let env = Arc::new(Environment::new(
            Arc::new(FixedResolver),
            launcher.clone(),
            StartOptions {
                convert_strings: false,
            },
        ));
        (env, launcher)
    }

    fn coords(raw: &[&str]) -> Vec<Coordinate> {
        raw.iter().map(|c| Coordinate::parse(c).unwrap()).collect()
    }

    #[test]
    fn test_bootstrap_is_idempotent() {
        let (env, launcher) = environment(0, Duration::ZERO);
        assert_eq!(env.state(), EnvironmentState::NotStarted);

        let first = env.bootstrap(&coords(&["org.example:lib:1.0.0"])).unwrap();
        let second = env.bootstrap(&[]).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(launcher.starts.load(Ordering::SeqCst), 1);
        assert_eq!(env.state(), EnvironmentState::Running);
        assert_eq!(first.classpath(), &[PathBuf::from("lib.jar")]);
        assert!(!first.options().convert_strings);
    }

    #[test]
    fn test_concurrent_callers_share_one_start() {
        let (env, launcher) = environment(0, Duration::from_millis(50));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let env = env.clone();
                std::thread::spawn(move || env.bootstrap(&coords(&["org.example:lib:1.0.0"])))
            })
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap().is_ok());
        }
        assert_eq!(launcher.starts.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_overlapping_callers_see_the_same_failure() {
        let (env, launcher) = environment(1, Duration::from_millis(50));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let env = env.clone();
                std::thread::spawn(move || env.bootstrap(&[]).err().map(|e| e.to_string()))
            })
            .collect();
        let errors: Vec<Option<String>> =
            handles.into_iter().map(|h| h.join().unwrap()).collect();

        // Threads that arrive after the failed attempt retry and succeed.
        let failed: Vec<&String> = errors.iter().flatten().collect();
        assert!(!failed.is_empty());
        assert!(failed.iter().all(|m| m.contains("start 0 failed")));
        assert!(launcher.starts.load(Ordering::SeqCst) <= 2);
    }

    #[test]
    fn test_failure_is_retryable() {
        let (env, launcher) = environment(1, Duration::ZERO);

        let err = env.bootstrap(&[]).err().unwrap();
        assert!(matches!(err, StubError::Bootstrap(_)));
        assert_eq!(env.state(), EnvironmentState::Failed);
        assert!(env.session().is_none());

        assert!(env.bootstrap(&[]).is_ok());
        assert_eq!(launcher.starts.load(Ordering::SeqCst), 2);
        assert_eq!(env.state(), EnvironmentState::Running);
    }

    #[test]
    fn test_late_coordinates_are_ignored() {
        let (env, _) = environment(0, Duration::ZERO);
        env.require(&coords(&["org.example:lib:1.0.0"]));
        env.bootstrap(&coords(&["org.example:lib:1.0.0"])).unwrap();
        env.require(&coords(&["org.example:other:2.0"]));

        assert_eq!(env.coordinates(), coords(&["org.example:lib:1.0.0"]));
    }
}
