use crate::support::{read_text_or_exit, write_atomic_or_exit};
use reqpolicy_rewrite::sort_sections;
use std::path::Path;

pub fn run(file: String) {
    let content = read_text_or_exit(&file);
    let sorted = sort_sections(&content);
    if sorted == content {
        tracing::info!(file = %file, "already sorted");
        return;
    }
    write_atomic_or_exit(Path::new(&file), &sorted);
    tracing::info!(file = %file, "sorted");
}
