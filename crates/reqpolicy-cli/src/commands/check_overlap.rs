use crate::support::{emit_report, load_set_or_exit};
use reqpolicy_check::{CHECK_KIND_PARENT_OVERLAP, CheckReport, check_parent_overlap};

pub fn run(parent_path: String, head_path: String, json_output: bool) {
    let parent = load_set_or_exit(&parent_path, false);
    let head = load_set_or_exit(&head_path, false);

    let errors = check_parent_overlap(&parent, &head);
    let report =
        CheckReport::from_findings(CHECK_KIND_PARENT_OVERLAP, head.len(), errors, Vec::new());
    emit_report(&report, json_output);
}
