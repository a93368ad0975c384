use crate::config::Config;
use reqpolicy_check::CheckReport;
use reqpolicy_kernel::{DeclarationSet, MarkerMatch, ParseOptions};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

pub fn load_config_or_exit(explicit: Option<&str>) -> Config {
    Config::load(explicit).unwrap_or_else(|e| {
        eprintln!("error: {e}");
        std::process::exit(2);
    })
}

pub fn read_text_or_exit(path: impl AsRef<Path>) -> String {
    let path = path.as_ref();
    fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("error: failed to read {}: {e}", path.display());
        std::process::exit(2);
    })
}

/// Parse a requirements-format file; the file name is kept as the set's
/// source for diagnostics.
pub fn load_set_or_exit(path: &str, permit_urls: bool) -> DeclarationSet {
    let text = read_text_or_exit(path);
    let options = ParseOptions::new(path).permit_urls(permit_urls);
    DeclarationSet::parse(&text, &options).unwrap_or_else(|e| {
        eprintln!("error: {e}");
        std::process::exit(2);
    })
}

pub fn parse_marker_matching_or_exit(flag: Option<&str>, config: &Config) -> MarkerMatch {
    match flag {
        Some(value) => value.parse().unwrap_or_else(|e| {
            eprintln!("error: {e}");
            std::process::exit(2);
        }),
        None => config.validate.marker_matching,
    }
}

fn print_report(report: &CheckReport) {
    println!(
        "[{}] {} (checked={}, errors={}, warnings={})",
        report.check_kind,
        if report.accepted() { "OK" } else { "FAIL" },
        report.summary.checked_count,
        report.summary.error_count,
        report.summary.warning_count
    );
    for finding in &report.errors {
        println!("  - {}", finding.message);
    }
    for finding in &report.warnings {
        println!("  - WARN {}", finding.message);
    }
}

/// Print the report and exit 1 when it was rejected.
pub fn emit_report(report: &CheckReport, json_output: bool) {
    if json_output {
        let rendered = serde_json::to_string_pretty(report).unwrap_or_else(|e| {
            eprintln!("error: failed to render {} report: {e}", report.check_kind);
            std::process::exit(2);
        });
        println!("{rendered}");
    } else {
        print_report(report);
    }
    if !report.accepted() {
        std::process::exit(1);
    }
}

/// Replace `path` through a synced temp file and a rename.
pub fn write_atomic(path: &Path, content: &str) -> io::Result<()> {
    let tmp_path = tmp_write_path(path);
    let write_result = (|| -> io::Result<()> {
        let mut file = File::create(&tmp_path)?;
        file.write_all(content.as_bytes())?;
        file.sync_all()
    })();
    if let Err(error) = write_result {
        let _ = fs::remove_file(&tmp_path);
        return Err(error);
    }
    fs::rename(&tmp_path, path).inspect_err(|_| {
        let _ = fs::remove_file(&tmp_path);
    })
}

pub fn write_atomic_or_exit(path: &Path, content: &str) {
    write_atomic(path, content).unwrap_or_else(|e| {
        eprintln!("error: failed to write {}: {e}", path.display());
        std::process::exit(2);
    });
}

fn tmp_write_path(path: &Path) -> PathBuf {
    let unique = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let mut tmp: OsString = path.as_os_str().to_os_string();
    tmp.push(format!(".tmp.{}.{}", std::process::id(), unique));
    PathBuf::from(tmp)
}
