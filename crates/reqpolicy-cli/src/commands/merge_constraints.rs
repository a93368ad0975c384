use crate::support::{load_set_or_exit, read_text_or_exit};
use reqpolicy_rewrite::{Freeze, clone_versions, merge_constraints, parse_freeze, parse_version_map};

fn exit_on<T, E: std::fmt::Display>(result: Result<T, E>) -> T {
    result.unwrap_or_else(|e| {
        eprintln!("error: {e}");
        std::process::exit(2);
    })
}

pub fn run(constraints: Vec<String>, blacklist_path: Option<String>, version_map: Vec<String>) {
    let version_map = exit_on(parse_version_map(&version_map));
    let mut freezes = Vec::with_capacity(constraints.len());
    for entry in &constraints {
        let Some((python, path)) = entry.split_once(':') else {
            eprintln!("error: invalid constraints entry {entry:?}, expected PYVER:PATH");
            std::process::exit(2);
        };
        tracing::debug!(python, file = path, "reading freeze");
        let packages = exit_on(parse_freeze(&read_text_or_exit(path)));
        freezes.push(Freeze::new(python, packages));
    }
    clone_versions(&mut freezes, &version_map);

    let blacklist: Vec<String> = blacklist_path
        .map(|path| {
            load_set_or_exit(&path, false)
                .names()
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    for line in exit_on(merge_constraints(&freezes, &blacklist)) {
        println!("{line}");
    }
}
