use std::io::IsTerminal;
use std::path::PathBuf;

/// Read-only host globals, set once at process start and never mutated —
/// the handful of facts the embedded business logic needs about its own
/// process without going through an entry point.
#[derive(Debug, Clone)]
pub struct Globals {
    pub version: &'static str,
    pub platform: &'static str,
    pub arch: String,
    pub default_arch: &'static str,
    pub pathsep: char,
    pub systmpdir: PathBuf,
    pub exefile: Option<PathBuf>,
    pub tty: bool,
    pub default_repo_url: &'static str,
    pub default_release_url: &'static str,
    pub no_network: bool,
    pub no_git: bool,
    pub lpm_run_from_gui: bool,
    pub argv: Vec<String>,
}

impl Globals {
    /// Reads the running process's environment and `std::env::consts` to
    /// populate every field. Called once by the bootstrap binary; an
    /// embedding layer that needs to override a value (tests, a sandboxed
    /// harness) constructs its own `Globals` directly instead.
    #[must_use]
    pub fn detect() -> Self {
        let platform = detect_platform();
        let processor = detect_processor();
        Self {
            version: env!("CARGO_PKG_VERSION"),
            platform,
            arch: format!("{processor}-{platform}"),
            default_arch: processor,
            pathsep: std::path::MAIN_SEPARATOR,
            systmpdir: std::env::temp_dir(),
            exefile: std::env::current_exe().ok(),
            tty: std::io::stdout().is_terminal(),
            default_repo_url: "https://github.com/lite-xl/lite-xl-plugins.git",
            default_release_url: "https://github.com/lite-xl/lite-xl/releases/download/%r",
            no_network: env_flag("NO_NETWORK"),
            no_git: env_flag("NO_GIT"),
            lpm_run_from_gui: env_flag("LPM_RUN_FROM_GUI"),
            argv: std::env::args().collect(),
        }
    }
}

fn env_flag(name: &str) -> bool {
    std::env::var_os(name).is_some_and(|v| !v.is_empty())
}

fn detect_platform() -> &'static str {
    match std::env::consts::OS {
        "windows" => "windows",
        "linux" => "linux",
        "macos" => "darwin",
        "android" => "android",
        other => {
            tracing::warn!(os = other, "unrecognized platform, reporting as linux");
            "linux"
        }
    }
}

fn detect_processor() -> &'static str {
    match std::env::consts::ARCH {
        "x86" => "x86",
        "x86_64" => "x86_64",
        "aarch64" => "aarch64",
        "arm" => "arm",
        "riscv32" => "riscv32",
        "riscv64" => "riscv64",
        other => {
            tracing::warn!(arch = other, "unrecognized processor, reporting as x86_64");
            "x86_64"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_populates_arch_from_platform_and_processor() {
        let globals = Globals::detect();
        assert!(globals.arch.ends_with(globals.platform));
        assert!(!globals.version.is_empty());
    }
}
