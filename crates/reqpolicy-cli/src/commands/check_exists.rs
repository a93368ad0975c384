use crate::project::load_project_or_exit;
use crate::support::{emit_report, load_set_or_exit};
use reqpolicy_check::{CHECK_KIND_EXISTS, CheckReport, check_exists};

pub fn run(
    project_root: String,
    global_path: String,
    constraints_path: String,
    blacklist_path: String,
    json_output: bool,
) {
    let global = load_set_or_exit(&global_path, false);
    let constraints = load_set_or_exit(&constraints_path, false);
    let blacklist = load_set_or_exit(&blacklist_path, false);
    let project = load_project_or_exit(&project_root, false);

    let errors = check_exists(&project, &global, &constraints, &blacklist);
    let report = CheckReport::from_findings(
        CHECK_KIND_EXISTS,
        project.package_count(),
        errors,
        Vec::new(),
    );
    emit_report(&report, json_output);
}
