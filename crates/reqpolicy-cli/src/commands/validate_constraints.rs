use crate::support::{emit_report, read_text_or_exit};
use reqpolicy_check::{
    CHECK_KIND_VALIDATE_CONSTRAINTS, CheckReport, check_compatible, check_constraint_format,
};
use reqpolicy_kernel::{DeclarationSet, ParseOptions};

fn parse_or_exit(path: &str, text: &str) -> DeclarationSet {
    DeclarationSet::parse(text, &ParseOptions::new(path)).unwrap_or_else(|e| {
        eprintln!("error: {e}");
        std::process::exit(2);
    })
}

/// Bad constraint lines are already format findings; the compatibility
/// pass is skipped rather than treated as a tool error.
fn constraints_for_compat(path: &str, text: &str) -> Option<DeclarationSet> {
    match DeclarationSet::parse(text, &ParseOptions::new(path)) {
        Ok(set) => Some(set),
        Err(err) => {
            tracing::warn!(error = %err, "skipping compatibility check");
            None
        }
    }
}

pub fn run(global_path: String, constraints_path: String, json_output: bool) {
    tracing::info!(file = %constraints_path, "checking upper constraints");
    let constraints_text = read_text_or_exit(&constraints_path);
    let mut errors = check_constraint_format(&constraints_path, &constraints_text);

    tracing::info!(file = %global_path, "checking global requirements");
    let global = parse_or_exit(&global_path, &read_text_or_exit(&global_path));
    if let Some(constraints) = constraints_for_compat(&constraints_path, &constraints_text) {
        errors.extend(check_compatible(&global, &constraints));
    }

    let report = CheckReport::from_findings(
        CHECK_KIND_VALIDATE_CONSTRAINTS,
        global.len(),
        errors,
        Vec::new(),
    );
    emit_report(&report, json_output);
}
