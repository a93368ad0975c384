use crate::support::{read_text_or_exit, write_atomic_or_exit};
use reqpolicy_rewrite::{
    SYNC_TARGETS, SyncError, SyncOptions, global_lines, managed_setup_py, sync_requirements,
};
use std::path::{Path, PathBuf};

pub struct UpdateArgs {
    pub project: String,
    pub source: String,
    pub output_suffix: Option<String>,
    pub options: SyncOptions,
}

fn read_optional(path: &Path) -> Option<String> {
    path.is_file().then(|| read_text_or_exit(path))
}

fn output_path(dest: &Path, suffix: Option<&str>) -> PathBuf {
    match suffix.filter(|s| !s.is_empty()) {
        Some(suffix) => PathBuf::from(format!("{}.{suffix}", dest.display())),
        None => dest.to_path_buf(),
    }
}

pub fn run(args: UpdateArgs) {
    let root = Path::new(&args.project);
    if !root.is_dir() {
        eprintln!("error: project directory not found: {}", root.display());
        std::process::exit(2);
    }
    let global_path = Path::new(&args.source).join("global-requirements.txt");
    let global = global_lines(&read_text_or_exit(&global_path)).unwrap_or_else(|e| {
        eprintln!("error: {e}");
        std::process::exit(2);
    });

    for target in SYNC_TARGETS {
        let dest = root.join(target);
        let Some(content) = read_optional(&dest) else {
            continue;
        };
        let out_path = output_path(&dest, args.output_suffix.as_deref());
        tracing::info!(file = %out_path.display(), "syncing");
        let outcome = match sync_requirements(&global, &content, &args.options) {
            Ok(outcome) => outcome,
            Err(SyncError::NonStandard { name, .. }) => {
                println!("'{name}' is not in global-requirements.txt");
                eprintln!("error: nonstandard requirement present in {}", dest.display());
                std::process::exit(1);
            }
            Err(SyncError::Parse(e)) => {
                eprintln!("error: {}: {e}", dest.display());
                std::process::exit(2);
            }
        };
        for name in &outcome.dropped {
            println!("'{name}' is not in global-requirements.txt");
        }
        write_atomic_or_exit(&out_path, &outcome.content);
        if !outcome.changes.is_empty() {
            let names: Vec<&str> = outcome.changes.iter().map(|c| c.name.as_str()).collect();
            println!("Version change for: {}", names.join(", "));
            println!("Updated {}:", out_path.display());
            for change in &outcome.changes {
                println!("    {change}");
            }
        }
    }

    let setup_py = read_optional(&root.join("setup.py"));
    let setup_cfg = read_optional(&root.join("setup.cfg"));
    if let Some(text) = managed_setup_py(setup_py.as_deref(), setup_cfg.as_deref()) {
        tracing::info!("syncing setup.py");
        let path = root.join("setup.py");
        if setup_py.as_deref() != Some(text) {
            write_atomic_or_exit(&path, text);
        }
    }
}
