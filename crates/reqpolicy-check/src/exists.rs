//! Project packages must exist in the global list and upper-constraints,
//! and must not demand more than the upper pin.

use crate::project::{ProjectRequirements, is_extra_key};
use crate::report::{
    FAILURE_CLASS_EXISTS_ABOVE_PIN, FAILURE_CLASS_EXISTS_CONSTRAINTS, FAILURE_CLASS_EXISTS_GLOBAL,
    Finding,
};
use reqpolicy_kernel::{DeclarationSet, Operator, SpecifierSet, Version};

pub fn check_exists(
    project: &ProjectRequirements,
    global: &DeclarationSet,
    constraints: &DeclarationSet,
    blacklist: &DeclarationSet,
) -> Vec<Finding> {
    let mut findings = Vec::new();
    for (file, name, decls) in project.iter() {
        if is_extra_key(file) || blacklist.contains(name) {
            continue;
        }
        if !global.contains(name) {
            findings.push(
                Finding::new(
                    FAILURE_CLASS_EXISTS_GLOBAL,
                    name,
                    format!("{name} from {file} not found in global-requirements"),
                )
                .in_file(file),
            );
            continue;
        }
        let Some(pin) = constraints.declarations(name).last() else {
            findings.push(
                Finding::new(
                    FAILURE_CLASS_EXISTS_CONSTRAINTS,
                    name,
                    format!("{name} from {file} not found in upper-constraints"),
                )
                .in_file(file),
            );
            continue;
        };
        let pinned = pin.specifiers.trim_start_matches('=');
        let Ok(pinned_version) = pinned.parse::<Version>() else {
            tracing::warn!(package = name, pin = %pin.specifiers, "unparseable pin");
            continue;
        };

        for decl in decls {
            let Ok(set) = decl.specifiers.parse::<SpecifierSet>() else {
                continue;
            };
            for clause in set.clauses() {
                let Ok(version) = clause.version().parse::<Version>() else {
                    continue;
                };
                let bound = match clause.operator() {
                    Operator::Equal | Operator::GreaterEqual if version > pinned_version => "<=",
                    Operator::Greater if version >= pinned_version => "<",
                    _ => continue,
                };
                findings.push(
                    Finding::new(
                        FAILURE_CLASS_EXISTS_ABOVE_PIN,
                        name,
                        format!("{name} must be {bound} {pinned} from upper-constraints"),
                    )
                    .in_file(file),
                );
            }
        }
    }
    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::ProjectSource;
    use reqpolicy_kernel::ParseOptions;
    use std::collections::BTreeMap;

    fn set(content: &str) -> DeclarationSet {
        DeclarationSet::parse(content, &ParseOptions::new("x.txt"))
            .unwrap_or_else(|e| panic!("{e}"))
    }

    fn project(content: &str) -> ProjectRequirements {
        let extras = BTreeMap::from([("test".to_string(), "notglobal>=1\n".to_string())]);
        ProjectRequirements::process(
            "demo",
            &[ProjectSource::new("requirements.txt", content)],
            &extras,
            true,
        )
        .unwrap_or_else(|e| panic!("{e}"))
    }

    #[test]
    fn reports_missing_packages() {
        let findings = check_exists(
            &project("foo>=1\nbar>=1\nskip>=1\n"),
            &set("foo>=1\n"),
            &set("baz===1\n"),
            &set("skip\n"),
        );
        let rows: Vec<_> = findings.iter().map(|f| f.message.as_str()).collect();
        assert_eq!(
            rows,
            [
                "bar from requirements.txt not found in global-requirements",
                "foo from requirements.txt not found in upper-constraints",
            ]
        );
    }

    #[test]
    fn floors_above_the_pin_fail() {
        let global = set("foo>=1\n");
        let constraints = set("foo===2.0\n");
        let run = |content: &str| check_exists(&project(content), &global, &constraints, &set(""));

        assert!(run("foo>=2.0\n").is_empty());
        assert!(run("foo>1.9\n").is_empty());
        assert_eq!(run("foo>=2.1\n")[0].message, "foo must be <= 2.0 from upper-constraints");
        assert_eq!(run("foo==2.0.1\n")[0].message, "foo must be <= 2.0 from upper-constraints");
        assert_eq!(run("foo>2.0\n")[0].message, "foo must be < 2.0 from upper-constraints");
        assert!(run("foo<3.0,!=2.5\n").is_empty());
    }

    #[test]
    fn last_pin_wins() {
        let global = set("foo>=1\n");
        let constraints = set("foo===1.0;python_version=='2.7'\nfoo===3.0\n");
        assert!(check_exists(&project("foo>=2.0\n"), &global, &constraints, &set("")).is_empty());
    }
}
