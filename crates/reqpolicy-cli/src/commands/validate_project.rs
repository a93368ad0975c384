use crate::config::Config;
use crate::project::{LOWER_CONSTRAINTS_FILE, load_project_or_exit};
use crate::support::{emit_report, load_set_or_exit, parse_marker_matching_or_exit};
use reqpolicy_check::{
    CHECK_KIND_VALIDATE_PROJECT, CheckReport, LowerConstraintOptions, missing_newline_warning,
    validate, validate_lower_constraints,
};
use std::path::Path;

pub struct ValidateProjectArgs {
    pub project: String,
    pub global: String,
    pub blacklist: String,
    pub lower_constraints: Option<String>,
    pub strict: bool,
    pub marker_matching: Option<String>,
    pub json: bool,
}

fn lower_constraints_path(args: &ValidateProjectArgs) -> Option<String> {
    if let Some(path) = &args.lower_constraints {
        return Some(path.clone());
    }
    let candidate = Path::new(&args.project).join(LOWER_CONSTRAINTS_FILE);
    candidate
        .is_file()
        .then(|| candidate.display().to_string())
}

pub fn run(args: ValidateProjectArgs, config: &Config) {
    let marker_match = parse_marker_matching_or_exit(args.marker_matching.as_deref(), config);
    let global = load_set_or_exit(&args.global, false);
    let blacklist = load_set_or_exit(&args.blacklist, false);
    let project = load_project_or_exit(&args.project, args.strict);

    let mut errors = project.errors.clone();
    errors.extend(validate(&project, &blacklist, &global));

    match lower_constraints_path(&args) {
        Some(path) => {
            tracing::info!(file = %path, "validating lower constraints");
            let lower = load_set_or_exit(&path, false);
            let options = LowerConstraintOptions {
                skip_files: config.validate.skip_lower_constraint_files.clone(),
                marker_match,
            };
            errors.extend(validate_lower_constraints(&project, &lower, &blacklist, &options));
        }
        None => tracing::debug!(project = %project.name, "no lower constraints file"),
    }

    let mut warnings = project.warnings.clone();
    if args.strict {
        warnings.extend(missing_newline_warning(&global));
        warnings.extend(missing_newline_warning(&blacklist));
    }

    let report = CheckReport::from_findings(
        CHECK_KIND_VALIDATE_PROJECT,
        project.package_count(),
        errors,
        warnings,
    );
    emit_report(&report, args.json);
}
