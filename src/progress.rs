use indicatif::{ProgressBar, ProgressStyle};

/// Creates a progress bar of `len` steps, or a hidden one when `visible` is false.
pub fn new_bar(len: u64, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(len);
    let style = ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] {bar:40.green/blue} {pos:>5}/{len:5} {msg}",
    )
    .map(|s| s.progress_chars("█▇▆▅▄▃▂▁"))
    .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);
    pb
}
