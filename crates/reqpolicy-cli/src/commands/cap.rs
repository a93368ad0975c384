use crate::config::Config;
use crate::support::read_text_or_exit;
use reqpolicy_rewrite::{Capper, frozen_versions};

/// Print the capped requirements to stdout.
pub fn run(requirements_path: String, freeze_path: String, config: &Config) {
    let requirements = read_text_or_exit(&requirements_path);
    let frozen = frozen_versions(&read_text_or_exit(&freeze_path));
    let capper = match config.cap.overrides() {
        Some(overrides) => Capper::new(overrides),
        None => Capper::with_default_overrides(),
    };
    tracing::debug!(packages = frozen.len(), "loaded freeze snapshot");
    for line in capper.cap(requirements.lines(), &frozen) {
        println!("{line}");
    }
}
