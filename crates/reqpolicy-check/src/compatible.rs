//! Upper-constraints against the global list.

use crate::report::{
    FAILURE_CLASS_CONSTRAINT_FORMAT, FAILURE_CLASS_CONSTRAINT_INCOMPATIBLE, FAILURE_CLASS_PARSE,
    Finding,
};
use reqpolicy_kernel::{DeclarationSet, Line, is_pass_through, parse_line, specifier};

/// Every pin in `constraints` must fit at least one of the package's
/// specifier-sets in `global`. Packages absent from `global` are taken to
/// be transitive and pass.
pub fn check_compatible(global: &DeclarationSet, constraints: &DeclarationSet) -> Vec<Finding> {
    let mut findings = Vec::new();
    for (name, entries) in constraints.iter() {
        if !global.contains(name) {
            continue;
        }
        for entry in entries {
            let pin = &entry.declaration.specifiers;
            let version = pin.strip_prefix("===").unwrap_or(pin);
            let mut tested = Vec::new();
            let satisfied = global.declarations(name).any(|decl| {
                let ok = specifier::contains(&decl.specifiers, version);
                if !ok {
                    tested.push(format!("'{}'", decl.specifiers));
                }
                ok
            });
            if !satisfied {
                findings.push(
                    Finding::new(
                        FAILURE_CLASS_CONSTRAINT_INCOMPATIBLE,
                        name,
                        format!(
                            "Constraint for {name}=={version} does not match requirement [{}]",
                            tested.join(", ")
                        ),
                    )
                    .in_file(constraints.source()),
                );
            }
        }
    }
    findings
}

/// Every declaration line of an upper-constraints file must be a `===` pin.
pub fn check_constraint_format(source: &str, content: &str) -> Vec<Finding> {
    let mut findings = Vec::new();
    for (idx, raw) in content.lines().enumerate() {
        let line_no = idx + 1;
        if is_pass_through(raw) {
            continue;
        }
        match parse_line(raw, false) {
            Ok(Line::Comment(_)) => {}
            Ok(Line::Declaration(decl)) if decl.specifiers.starts_with("===") => {}
            Ok(Line::Declaration(decl)) => findings.push(
                Finding::new(
                    FAILURE_CLASS_CONSTRAINT_FORMAT,
                    &decl.package,
                    format!("Invalid constraint line {line_no} {raw:?}, does not have 3 \"=\""),
                )
                .in_file(source),
            ),
            Err(err) => findings.push(
                Finding::new(FAILURE_CLASS_PARSE, "", err.at(source, line_no).to_string())
                    .in_file(source),
            ),
        }
    }
    findings
}
