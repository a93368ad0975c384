use serde_json::Value;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

struct TempDirGuard {
    path: PathBuf,
}

impl TempDirGuard {
    fn new(prefix: &str) -> Self {
        let unique = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be after unix epoch")
            .as_nanos();
        let path = std::env::temp_dir().join(format!(
            "reqpolicy-cli-{prefix}-{}-{unique}",
            std::process::id()
        ));
        fs::create_dir_all(&path).expect("temp dir should be created");
        Self { path }
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self, name: &str, content: &str) -> String {
        let path = self.path.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("parent dir should be created");
        }
        fs::write(&path, content).expect("fixture should be written");
        path.display().to_string()
    }
}

impl Drop for TempDirGuard {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

fn run_reqpolicy<I, S>(args: I) -> Output
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let bin = env!("CARGO_BIN_EXE_reqpolicy");
    Command::new(bin)
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("reqpolicy command should execute")
}

fn assert_success(output: &Output) {
    if !output.status.success() {
        panic!(
            "command failed with status {:?}\nstdout:\n{}\nstderr:\n{}",
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
        );
    }
}

fn assert_failure(output: &Output) {
    if output.status.success() {
        panic!(
            "command unexpectedly succeeded\nstdout:\n{}\nstderr:\n{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
        );
    }
}

fn stdout_text(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn parse_json_stdout(output: &Output) -> Value {
    serde_json::from_slice::<Value>(&output.stdout).unwrap_or_else(|e| {
        panic!(
            "expected valid JSON stdout, got error: {e}\nstdout:\n{}",
            String::from_utf8_lossy(&output.stdout)
        )
    })
}

fn failure_classes(payload: &Value) -> Vec<String> {
    payload["failureClasses"]
        .as_array()
        .expect("failureClasses should be an array")
        .iter()
        .map(|v| v.as_str().expect("class should be a string").to_string())
        .collect()
}

const GLOBAL: &str = "six>=1.9.0\nrequests>=2.14.2,!=2.15.0\n";
const CONSTRAINTS: &str = "six===1.10.0\nrequests===2.18.4\n";

#[test]
fn validate_constraints_accepts_compatible_pins() {
    let tmp = TempDirGuard::new("validate-constraints-ok");
    let global = tmp.write("global-requirements.txt", GLOBAL);
    let constraints = tmp.write("upper-constraints.txt", CONSTRAINTS);

    let output = run_reqpolicy([
        "validate-constraints",
        "--global",
        global.as_str(),
        "--constraints",
        constraints.as_str(),
    ]);
    assert_success(&output);
    assert!(stdout_text(&output).starts_with("[reqpolicy.validate_constraints.v1] OK"));
}

#[test]
fn validate_constraints_reports_format_and_compatibility() {
    let tmp = TempDirGuard::new("validate-constraints-fail");
    let global = tmp.write("global-requirements.txt", GLOBAL);
    let constraints = tmp.write("upper-constraints.txt", "six==1.10.0\nrequests===2.15.0\n");

    let output = run_reqpolicy([
        "validate-constraints",
        "--global",
        global.as_str(),
        "--constraints",
        constraints.as_str(),
        "--json",
    ]);
    assert_failure(&output);
    assert_eq!(output.status.code(), Some(1));
    let payload = parse_json_stdout(&output);
    assert_eq!(payload["result"], "rejected");
    assert_eq!(payload["checkKind"], "reqpolicy.validate_constraints.v1");
    let classes = failure_classes(&payload);
    assert!(classes.contains(&"constraints.format.not_exact_pin".to_string()));
    assert!(classes.contains(&"constraints.incompatible".to_string()));
}

#[test]
fn validate_constraints_reports_unparseable_lines_as_findings() {
    let tmp = TempDirGuard::new("validate-constraints-url");
    let global = tmp.write("global-requirements.txt", GLOBAL);
    let constraints = tmp.write(
        "upper-constraints.txt",
        "-f http://tarballs.openstack.org/six/six-1.10.0.tar.gz\n\
         six===1.10.0\n\
         -e git+https://example.org/requests#egg=requests\n",
    );

    let output = run_reqpolicy([
        "validate-constraints",
        "--global",
        global.as_str(),
        "--constraints",
        constraints.as_str(),
        "--json",
    ]);
    assert_eq!(output.status.code(), Some(1));
    let payload = parse_json_stdout(&output);
    assert_eq!(payload["summary"]["errorCount"], 1);
    assert_eq!(payload["errors"][0]["class"], "requirements.parse.invalid");
}

#[test]
fn validate_constraints_reads_paths_from_config() {
    let tmp = TempDirGuard::new("config-paths");
    let global = tmp.write("g.txt", GLOBAL);
    let constraints = tmp.write("u.txt", CONSTRAINTS);
    let config = tmp.write(
        "reqpolicy.toml",
        &format!(
            "[paths]\nglobal_requirements = {global:?}\nupper_constraints = {constraints:?}\n"
        ),
    );

    let output = run_reqpolicy(["--config", config.as_str(), "validate-constraints"]);
    assert_success(&output);
}

#[test]
fn missing_input_is_a_tool_error() {
    let tmp = TempDirGuard::new("missing-input");
    let missing = tmp.path().join("nope.txt").display().to_string();

    let output = run_reqpolicy(["check-overlap", missing.as_str(), missing.as_str()]);
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("error: failed to read"));
}

fn write_policy(tmp: &TempDirGuard) -> (String, String) {
    let global = tmp.write("policy/global-requirements.txt", GLOBAL);
    let blacklist = tmp.write("policy/blacklist.txt", "# nothing blacklisted\n");
    (global, blacklist)
}

#[test]
fn validate_project_accepts_matching_project() {
    let tmp = TempDirGuard::new("validate-project-ok");
    let (global, blacklist) = write_policy(&tmp);
    tmp.write("demo/requirements.txt", "six>=1.9.0\n");
    tmp.write("demo/setup.cfg", "[extras]\ntest =\n    six>=1.9.0\n");
    tmp.write("demo/lower-constraints.txt", "six==1.9.0\n");
    let project = tmp.path().join("demo").display().to_string();

    let output = run_reqpolicy([
        "validate-project",
        project.as_str(),
        "--global",
        global.as_str(),
        "--blacklist",
        blacklist.as_str(),
        "--json",
    ]);
    assert_success(&output);
    let payload = parse_json_stdout(&output);
    assert_eq!(payload["result"], "accepted");
    assert_eq!(payload["summary"]["checkedCount"], 2);
}

#[test]
fn validate_project_rejects_unknown_package() {
    let tmp = TempDirGuard::new("validate-project-unknown");
    let (global, blacklist) = write_policy(&tmp);
    tmp.write("demo/requirements.txt", "leftpad>=1.0\n");
    let project = tmp.path().join("demo").display().to_string();

    let output = run_reqpolicy([
        "validate-project",
        project.as_str(),
        "--global",
        global.as_str(),
        "--blacklist",
        blacklist.as_str(),
        "--json",
    ]);
    assert_eq!(output.status.code(), Some(1));
    let payload = parse_json_stdout(&output);
    assert_eq!(payload["errors"][0]["class"], "validate.not_in_global");
    assert_eq!(payload["errors"][0]["file"], "requirements.txt");
}

#[test]
fn validate_project_checks_lower_constraint_floor() {
    let tmp = TempDirGuard::new("validate-project-lower");
    let (global, blacklist) = write_policy(&tmp);
    tmp.write("demo/requirements.txt", "six>=1.9.0\n");
    let lower = tmp.write("lower.txt", "six==1.10.0\n");
    let project = tmp.path().join("demo").display().to_string();

    let output = run_reqpolicy([
        "validate-project",
        project.as_str(),
        "--global",
        global.as_str(),
        "--blacklist",
        blacklist.as_str(),
        "--lower-constraints",
        lower.as_str(),
        "--json",
    ]);
    assert_failure(&output);
    let payload = parse_json_stdout(&output);
    assert_eq!(
        failure_classes(&payload),
        ["lower_constraints.floor_mismatch"]
    );
}

#[test]
fn validate_project_strict_warns_on_missing_newline() {
    let tmp = TempDirGuard::new("validate-project-strict");
    let (global, blacklist) = write_policy(&tmp);
    tmp.write("demo/requirements.txt", "six>=1.9.0");
    let project = tmp.path().join("demo").display().to_string();

    let output = run_reqpolicy([
        "validate-project",
        project.as_str(),
        "--global",
        global.as_str(),
        "--blacklist",
        blacklist.as_str(),
        "--strict",
        "--json",
    ]);
    assert_success(&output);
    let payload = parse_json_stdout(&output);
    assert_eq!(payload["warningClasses"][0], "project.trailing_newline.missing");
}

#[test]
fn validate_project_strict_warns_on_ragged_policy_files() {
    let tmp = TempDirGuard::new("validate-project-strict-policy");
    let global = tmp.write("policy/global-requirements.txt", "six>=1.9.0");
    let blacklist = tmp.write("policy/blacklist.txt", "");
    tmp.write("demo/requirements.txt", "six>=1.9.0\n");
    let project = tmp.path().join("demo").display().to_string();

    let output = run_reqpolicy([
        "validate-project",
        project.as_str(),
        "--global",
        global.as_str(),
        "--blacklist",
        blacklist.as_str(),
        "--strict",
        "--json",
    ]);
    assert_success(&output);
    let payload = parse_json_stdout(&output);
    assert_eq!(payload["summary"]["warningCount"], 1);
    assert_eq!(payload["warnings"][0]["class"], "project.trailing_newline.missing");
    assert_eq!(payload["warnings"][0]["file"], global.as_str());
}

#[test]
fn check_coverage_reports_uncovered_packages() {
    let tmp = TempDirGuard::new("coverage");
    let global = tmp.write("global-requirements.txt", "six>=1.9.0\nmock>=2.0\n");
    let constraints = tmp.write("upper-constraints.txt", "six===1.10.0\n");
    let blacklist = tmp.write("blacklist.txt", "");

    let output = run_reqpolicy([
        "check-coverage",
        "--global",
        global.as_str(),
        "--constraints",
        constraints.as_str(),
        "--blacklist",
        blacklist.as_str(),
    ]);
    assert_eq!(output.status.code(), Some(1));
    let stdout = stdout_text(&output);
    assert!(stdout.starts_with("[reqpolicy.coverage.v1] FAIL"));
    assert!(stdout.contains("\"mock\" appears in"));
}

#[test]
fn check_exists_flags_requirements_above_the_pin() {
    let tmp = TempDirGuard::new("exists");
    let global = tmp.write("global-requirements.txt", GLOBAL);
    let constraints = tmp.write("upper-constraints.txt", CONSTRAINTS);
    let blacklist = tmp.write("blacklist.txt", "");
    tmp.write("demo/requirements.txt", "six>=1.11\n");
    let project = tmp.path().join("demo").display().to_string();

    let output = run_reqpolicy([
        "check-exists",
        project.as_str(),
        "--global",
        global.as_str(),
        "--constraints",
        constraints.as_str(),
        "--blacklist",
        blacklist.as_str(),
    ]);
    assert_failure(&output);
    assert!(stdout_text(&output).contains("six must be <= 1.10.0 from upper-constraints"));
}

#[test]
fn check_overlap_compares_parent_and_head() {
    let tmp = TempDirGuard::new("overlap");
    let parent = tmp.write("parent.txt", "six>=1.9.0\n");
    let raised = tmp.write("raised.txt", "six>=2.0\n");
    let disjoint = tmp.write("disjoint.txt", "six<1.5\n");

    assert_success(&run_reqpolicy(["check-overlap", parent.as_str(), raised.as_str()]));

    let output = run_reqpolicy(["check-overlap", parent.as_str(), disjoint.as_str(), "--json"]);
    assert_eq!(output.status.code(), Some(1));
    let payload = parse_json_stdout(&output);
    assert_eq!(failure_classes(&payload), ["overlap.no_parent_overlap"]);
}

#[test]
fn cap_prints_capped_requirements() {
    let tmp = TempDirGuard::new("cap");
    let requirements = tmp.write("requirements.txt", "six>=1.9.0\n# tools\nmock\nrequests<3\n");
    let freeze = tmp.write("freeze.txt", "six==1.10.0\nmock==2.0.0\nrequests==2.18.4\n");

    let output = run_reqpolicy(["cap", requirements.as_str(), freeze.as_str()]);
    assert_success(&output);
    assert_eq!(
        stdout_text(&output),
        "six~=1.10.0\n# tools\nmock~=2.0.0\nrequests<3\n"
    );
}

#[test]
fn merge_constraints_combines_interpreters() {
    let tmp = TempDirGuard::new("merge");
    let py36 = tmp.write("py36.txt", "six==1.10.0\nenum34==1.1.6\n");
    let py37 = tmp.write("py37.txt", "six==1.10.0\n");
    let blacklist = tmp.write("blacklist.txt", "Enum34\n");
    let c36 = format!("3.6:{py36}");
    let c37 = format!("3.7:{py37}");

    let output = run_reqpolicy(["merge-constraints", "-c", c36.as_str(), "-c", c37.as_str()]);
    assert_success(&output);
    assert_eq!(
        stdout_text(&output),
        "enum34===1.1.6;python_version=='3.6'\nsix===1.10.0\n"
    );

    let output = run_reqpolicy([
        "merge-constraints",
        "-c",
        c36.as_str(),
        "-c",
        c37.as_str(),
        "-b",
        blacklist.as_str(),
    ]);
    assert_success(&output);
    assert_eq!(stdout_text(&output), "six===1.10.0\n");
}

const HEADER: &str = "\
# The order of packages is significant, because pip processes them in the order
# of appearance. Changing the order has an impact on the overall integration
# process, which may cause wedges in the gate later.
";

#[test]
fn update_rewrites_project_files() {
    let tmp = TempDirGuard::new("update");
    tmp.write("source/global-requirements.txt", GLOBAL);
    tmp.write("demo/requirements.txt", "SIX>=1.0\n");
    tmp.write("demo/setup.py", "import setuptools\nsetuptools.setup(pbr=True)\n");
    let project = tmp.path().join("demo");
    let source = tmp.path().join("source").display().to_string();
    let project_arg = project.display().to_string();

    let output = run_reqpolicy(["update", project_arg.as_str(), "--source", source.as_str()]);
    assert_success(&output);
    assert!(stdout_text(&output).contains("Version change for: six"));
    let rewritten = fs::read_to_string(project.join("requirements.txt")).expect("read back");
    assert_eq!(rewritten, format!("{HEADER}six>=1.9.0\n"));
    let setup_py = fs::read_to_string(project.join("setup.py")).expect("read back");
    assert!(setup_py.contains("setup_requires=['pbr']"));
}

#[test]
fn update_with_suffix_leaves_original() {
    let tmp = TempDirGuard::new("update-suffix");
    tmp.write("source/global-requirements.txt", GLOBAL);
    tmp.write("demo/test-requirements.txt", "six>=1.0\n");
    let project = tmp.path().join("demo");
    let source = tmp.path().join("source").display().to_string();
    let project_arg = project.display().to_string();

    let output = run_reqpolicy([
        "update",
        project_arg.as_str(),
        "--source",
        source.as_str(),
        "-o",
        "global",
    ]);
    assert_success(&output);
    let original = fs::read_to_string(project.join("test-requirements.txt")).expect("read back");
    assert_eq!(original, "six>=1.0\n");
    let synced =
        fs::read_to_string(project.join("test-requirements.txt.global")).expect("read back");
    assert_eq!(synced, format!("{HEADER}six>=1.9.0\n"));
}

#[test]
fn update_rejects_non_standard_requirements() {
    let tmp = TempDirGuard::new("update-non-standard");
    tmp.write("source/global-requirements.txt", GLOBAL);
    tmp.write("demo/requirements.txt", "leftpad\n");
    let project = tmp.path().join("demo").display().to_string();
    let source = tmp.path().join("source").display().to_string();

    let output = run_reqpolicy(["update", project.as_str(), "--source", source.as_str()]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stdout_text(&output).contains("'leftpad' is not in global-requirements.txt"));

    let output = run_reqpolicy([
        "update",
        project.as_str(),
        "--source",
        source.as_str(),
        "--soft-update",
    ]);
    assert_success(&output);
}

#[test]
fn sort_rewrites_file_in_place() {
    let tmp = TempDirGuard::new("sort");
    let file = tmp.write("global-requirements.txt", "## section:core\nzeta>=1\nAlpha>=2\n");

    assert_success(&run_reqpolicy(["sort", file.as_str()]));
    let sorted = fs::read_to_string(&file).expect("read back");
    assert_eq!(sorted, "## section:core\nAlpha>=2\nzeta>=1\n");
}
