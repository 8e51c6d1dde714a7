//! CLI command implementations.

pub mod inspect;
pub mod pack;
pub mod staging;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Creates a progress bar with `prefix`, hidden when `quiet`.
///
/// A zero `len` gives a spinner that counts items.
pub fn progress_bar(prefix: &'static str, len: u64, quiet: bool) -> ProgressBar {
    let bar = if len == 0 {
        ProgressBar::new_spinner()
    } else {
        ProgressBar::new(len)
    };
    if quiet {
        bar.set_draw_target(ProgressDrawTarget::hidden());
    }

    let template = if len == 0 {
        "{prefix:12} {spinner:.dim} {pos} {msg}"
    } else {
        "{prefix:12} [{bar:25}] {percent:>3}%  {pos}/{len} {msg}"
    };
    if let Ok(style) = ProgressStyle::with_template(template) {
        bar.set_style(
            style
                .tick_strings(&["|", "/", "-", "\\", " "])
                .progress_chars("=>-"),
        );
    }
    bar.set_prefix(prefix);
    bar
}
