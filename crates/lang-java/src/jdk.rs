//! Java installation lookup.
//!
//! Searches, in order:
//! - JAVA_HOME environment variable
//! - macOS java_home tool
//! - Common installation paths
//! - SDKMAN
//! - `java` on PATH (via its reported `java.home`)

use std::path::{Path, PathBuf};
use std::process::Command;

/// A located Java installation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JavaHome {
    pub path: PathBuf,
    pub version: Option<String>,
}

impl JavaHome {
    pub fn java_executable(&self) -> PathBuf {
        let exe = if cfg!(windows) { "java.exe" } else { "java" };
        self.path.join("bin").join(exe)
    }
}

/// Finds a usable Java home. An explicit home, when given, is the only
/// candidate considered.
pub struct JdkLocator {
    explicit: Option<PathBuf>,
}

impl JdkLocator {
    pub fn new() -> Self {
        Self { explicit: None }
    }

    pub fn with_home(path: PathBuf) -> Self {
        Self {
            explicit: Some(path),
        }
    }

    pub fn locate(&self) -> Option<JavaHome> {
        if let Some(path) = &self.explicit {
            return Self::check_home(path);
        }

        // 1. Check JAVA_HOME
        if let Ok(java_home) = std::env::var("JAVA_HOME") {
            if let Some(home) = Self::check_home(Path::new(&java_home)) {
                return Some(home);
            }
        }

        // 2. macOS specific: Use java_home tool
        #[cfg(target_os = "macos")]
        if let Ok(output) = Command::new("/usr/libexec/java_home").output() {
            if output.status.success() {
                let path_str = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if let Some(home) = Self::check_home(Path::new(&path_str)) {
                    return Some(home);
                }
            }
        }

        // 3. Search common installation paths
        for root in Self::search_roots() {
            if !root.exists() {
                continue;
            }

            // If root itself is a JDK (e.g. Homebrew symlink)
            if let Some(home) = Self::check_home(&root) {
                return Some(home);
            }

            // If root is a parent directory containing multiple SDKs
            if let Ok(entries) = std::fs::read_dir(&root) {
                let mut candidates: Vec<PathBuf> = entries.flatten().map(|e| e.path()).collect();
                candidates.sort();
                for mut sdk_path in candidates {
                    if cfg!(target_os = "macos") && sdk_path.join("Contents/Home").exists() {
                        sdk_path = sdk_path.join("Contents/Home");
                    }
                    if let Some(home) = Self::check_home(&sdk_path) {
                        return Some(home);
                    }
                }
            }
        }

        // 4. Ask whatever `java` is on PATH
        Self::from_java_command()
    }

    fn search_roots() -> Vec<PathBuf> {
        let mut search_roots = Vec::new();

        #[cfg(target_os = "macos")]
        {
            search_roots.push(PathBuf::from("/Library/Java/JavaVirtualMachines/"));
            search_roots.push(PathBuf::from("/opt/homebrew/opt/openjdk/"));
            search_roots.push(PathBuf::from("/usr/local/opt/openjdk/"));
        }
        #[cfg(target_os = "linux")]
        {
            search_roots.push(PathBuf::from("/usr/lib/jvm/"));
        }
        #[cfg(target_os = "windows")]
        {
            search_roots.push(PathBuf::from("C:\\Program Files\\Java\\"));
        }

        // SDKMAN
        if let Some(mut sdkman) = dirs::home_dir() {
            sdkman.push(".sdkman/candidates/java/");
            search_roots.push(sdkman);
        }

        search_roots
    }

    fn from_java_command() -> Option<JavaHome> {
        let output = Command::new("java")
            .arg("-XshowSettings:properties")
            .arg("-version")
            .output()
            .ok()?;

        // Output is on stderr usually
        let stderr = String::from_utf8_lossy(&output.stderr);
        stderr
            .lines()
            .map(str::trim)
            .find_map(|line| line.strip_prefix("java.home = "))
            .and_then(|path| Self::check_home(Path::new(path.trim())))
    }

    fn check_home(path: &Path) -> Option<JavaHome> {
        let exe = if cfg!(windows) { "java.exe" } else { "java" };
        if !path.join("bin").join(exe).exists() {
            return None;
        }
        Some(JavaHome {
            path: path.to_path_buf(),
            version: detect_version(path),
        })
    }
}

impl Default for JdkLocator {
    fn default() -> Self {
        Self::new()
    }
}

fn detect_version(java_home: &Path) -> Option<String> {
    // Try to read release file
    let release_file = java_home.join("release");
    if let Ok(content) = std::fs::read_to_string(&release_file) {
        for line in content.lines() {
            if let Some(version) = line.strip_prefix("JAVA_VERSION=") {
                return Some(version.trim_matches('"').to_string());
            }
        }
    }

    // Fallback: try to extract from path
    let path_str = java_home.to_string_lossy();
    regex::Regex::new(r"jdk-?(\d+(?:\.\d+)*)")
        .ok()
        .and_then(|re| re.captures(&path_str))
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str().to_string())
}
