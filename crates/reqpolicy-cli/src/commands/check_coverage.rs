use crate::support::{emit_report, load_set_or_exit};
use reqpolicy_check::{CHECK_KIND_COVERAGE, CheckReport, check_blacklist_coverage};

pub fn run(
    global_path: String,
    constraints_path: String,
    blacklist_path: String,
    json_output: bool,
) {
    let global = load_set_or_exit(&global_path, false);
    let constraints = load_set_or_exit(&constraints_path, false);
    let blacklist = load_set_or_exit(&blacklist_path, false);

    let errors = check_blacklist_coverage(&global, &constraints, &blacklist);
    let report = CheckReport::from_findings(CHECK_KIND_COVERAGE, global.len(), errors, Vec::new());
    emit_report(&report, json_output);
}
