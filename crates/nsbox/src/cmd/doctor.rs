use std::fmt;
use std::path::Path;

use nsbox::launch::Launcher;
use serde::Serialize;

use crate::cmd::DoctorArgs;
use crate::exit::{CliResult, HEALTH_CHECK_FAILED, SUCCESS};
use crate::output::{print_json, OutputFormat};

/// `clone3` appeared in 5.3, `CLONE_CLEAR_SIGHAND` in 5.5.
const MIN_KERNEL: KernelVersion = KernelVersion::new(5, 5, 0);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
enum CheckStatus {
    Pass,
    Fail,
    Warn,
    Skip,
}

#[derive(Debug, Serialize)]
struct CheckResult {
    name: &'static str,
    status: CheckStatus,
    detail: String,
}

impl CheckResult {
    fn new(name: &'static str, status: CheckStatus, detail: impl Into<String>) -> Self {
        Self {
            name,
            status,
            detail: detail.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct DoctorOutput {
    checks: Vec<CheckResult>,
    overall: &'static str,
}

pub fn run(_args: DoctorArgs, format: OutputFormat) -> CliResult<i32> {
    let checks = vec![
        user_namespace_check(),
        max_user_namespaces_check(Path::new("/proc/sys/user/max_user_namespaces")),
        unprivileged_userns_check(Path::new("/proc/sys/kernel/unprivileged_userns_clone")),
        apparmor_userns_check(Path::new(
            "/proc/sys/kernel/apparmor_restrict_unprivileged_userns",
        )),
        kernel_version_check(read_trimmed(Path::new("/proc/sys/kernel/osrelease")).as_deref()),
    ];

    let has_fail = checks.iter().any(|c| c.status == CheckStatus::Fail);
    let output = DoctorOutput {
        checks,
        overall: if has_fail { "fail" } else { "pass" },
    };
    print_doctor(&output, format);

    Ok(if has_fail { HEALTH_CHECK_FAILED } else { SUCCESS })
}

fn print_doctor(output: &DoctorOutput, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(output),
        OutputFormat::Text => {
            println!("nsbox doctor\n");
            for c in &output.checks {
                println!("  [{:>4}] {:<28} {}", status_text(c.status), c.name, c.detail);
            }
            if output.overall == "pass" {
                println!("\n  Result: all checks passed");
            } else {
                println!("\n  Result: one or more checks failed");
            }
        }
    }
}

fn status_text(status: CheckStatus) -> &'static str {
    match status {
        CheckStatus::Pass => "PASS",
        CheckStatus::Fail => "FAIL",
        CheckStatus::Warn => "WARN",
        CheckStatus::Skip => "SKIP",
    }
}

fn read_trimmed(path: &Path) -> Option<String> {
    std::fs::read_to_string(path)
        .ok()
        .map(|raw| raw.trim().to_string())
}

fn user_namespace_check() -> CheckResult {
    if Launcher::is_supported() {
        CheckResult::new("user_namespaces", CheckStatus::Pass, "/proc/self/ns/user present")
    } else {
        CheckResult::new(
            "user_namespaces",
            CheckStatus::Fail,
            "kernel built without user namespace support",
        )
    }
}

fn max_user_namespaces_check(path: &Path) -> CheckResult {
    const NAME: &str = "max_user_namespaces";
    match read_trimmed(path).map(|raw| raw.parse::<u64>()) {
        None => CheckResult::new(NAME, CheckStatus::Skip, format!("{} not readable", path.display())),
        Some(Ok(0)) => CheckResult::new(NAME, CheckStatus::Fail, "user namespaces disabled (limit is 0)"),
        Some(Ok(limit)) => CheckResult::new(NAME, CheckStatus::Pass, format!("limit {limit}")),
        Some(Err(err)) => CheckResult::new(NAME, CheckStatus::Warn, format!("unparsable limit: {err}")),
    }
}

fn unprivileged_userns_check(path: &Path) -> CheckResult {
    const NAME: &str = "unprivileged_userns_clone";
    match read_trimmed(path).as_deref() {
        None => CheckResult::new(NAME, CheckStatus::Skip, "sysctl not present on this kernel"),
        Some("0") => CheckResult::new(
            NAME,
            CheckStatus::Fail,
            "unprivileged user namespaces disabled by sysctl",
        ),
        Some(value) => CheckResult::new(NAME, CheckStatus::Pass, format!("enabled ({value})")),
    }
}

fn apparmor_userns_check(path: &Path) -> CheckResult {
    const NAME: &str = "apparmor_userns_restriction";
    match read_trimmed(path).as_deref() {
        None => CheckResult::new(NAME, CheckStatus::Skip, "AppArmor restriction not present"),
        Some("0") => CheckResult::new(NAME, CheckStatus::Pass, "not restricted"),
        Some(_) => CheckResult::new(
            NAME,
            CheckStatus::Warn,
            "AppArmor may deny capabilities inside unprivileged user namespaces",
        ),
    }
}

fn kernel_version_check(release: Option<&str>) -> CheckResult {
    const NAME: &str = "kernel_version";
    let Some(release) = release else {
        return CheckResult::new(NAME, CheckStatus::Skip, "kernel release not readable");
    };
    match KernelVersion::parse(release) {
        Some(version) if version >= MIN_KERNEL => {
            CheckResult::new(NAME, CheckStatus::Pass, format!("{version} >= {MIN_KERNEL}"))
        }
        Some(version) => CheckResult::new(
            NAME,
            CheckStatus::Fail,
            format!("{version} < {MIN_KERNEL} (clone3 with CLONE_CLEAR_SIGHAND unavailable)"),
        ),
        None => CheckResult::new(NAME, CheckStatus::Warn, format!("unrecognized release {release}")),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct KernelVersion {
    major: u32,
    minor: u32,
    patch: u32,
}

impl KernelVersion {
    const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parse "6.7.0-generic" or "6.7" style releases.
    fn parse(release: &str) -> Option<Self> {
        let version = release.split(['-', '+']).next()?;
        let mut parts = version.split('.');
        let major = parts.next()?.parse().ok()?;
        let minor = parts.next()?.parse().ok()?;
        let patch = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
        Some(Self::new(major, minor, patch))
    }
}

impl fmt::Display for KernelVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doctor_output_has_overall_status() {
        let output = DoctorOutput {
            checks: vec![CheckResult::new("x", CheckStatus::Pass, "ok")],
            overall: "pass",
        };
        let json = serde_json::to_string(&output).expect("doctor output should serialize");
        assert!(json.contains("\"overall\":\"pass\""));
        assert!(json.contains("\"status\":\"pass\""));
    }

    #[test]
    fn parses_kernel_releases() {
        assert_eq!(
            KernelVersion::parse("6.7.0-generic"),
            Some(KernelVersion::new(6, 7, 0))
        );
        assert_eq!(KernelVersion::parse("5.15"), Some(KernelVersion::new(5, 15, 0)));
        assert_eq!(
            KernelVersion::parse("6.18.44-fc-v139"),
            Some(KernelVersion::new(6, 18, 44))
        );
        assert_eq!(KernelVersion::parse("garbage"), None);
    }

    #[test]
    fn kernel_threshold() {
        assert_eq!(kernel_version_check(Some("5.4.0")).status, CheckStatus::Fail);
        assert_eq!(kernel_version_check(Some("5.5.0")).status, CheckStatus::Pass);
        assert_eq!(kernel_version_check(Some("6.1.0-13-amd64")).status, CheckStatus::Pass);
        assert_eq!(kernel_version_check(None).status, CheckStatus::Skip);
    }

    #[test]
    fn missing_sysctls_are_skipped() {
        let missing = Path::new("/nonexistent/nsbox/sysctl");
        assert_eq!(max_user_namespaces_check(missing).status, CheckStatus::Skip);
        assert_eq!(unprivileged_userns_check(missing).status, CheckStatus::Skip);
        assert_eq!(apparmor_userns_check(missing).status, CheckStatus::Skip);
    }
}
