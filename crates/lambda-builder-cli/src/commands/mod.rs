pub mod build;
pub mod detect;
pub mod doctor;

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;

pub fn json_pretty(value: &impl serde::Serialize) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("JSON serialization failed: {e}"))
}

pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .expect("valid template")
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    pb.set_message(msg.to_owned());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

pub fn spin_ok(pb: &ProgressBar, msg: &str) {
    pb.set_style(ProgressStyle::with_template("{msg}").expect("valid template"));
    pb.finish_with_message(format!("✓ {msg}"));
}

pub fn spin_fail(pb: &ProgressBar, msg: &str) {
    pb.set_style(ProgressStyle::with_template("{msg}").expect("valid template"));
    pb.finish_with_message(format!("✗ {msg}"));
}

/// How results reach the terminal. Computed once in `main`.
#[derive(Debug, Clone, Copy)]
pub struct OutputMode {
    pub json: bool,
    pub colour: bool,
    pub interactive: bool,
}

impl OutputMode {
    pub fn detect(json: bool) -> Self {
        let term = console::Term::stdout();
        Self {
            json,
            colour: console::colors_enabled(),
            interactive: term.is_term(),
        }
    }

    fn paint(self, style: &Style, text: String) -> String {
        if self.colour {
            style.apply_to(text).to_string()
        } else {
            text
        }
    }

    /// Top-level step, e.g. `=====> Detecting builder`. Silent in JSON mode.
    pub fn header(self, msg: &str) {
        if !self.json {
            println!("{}", self.paint(&Style::new().bold(), format!("=====> {msg}")));
        }
    }

    /// Sub-step under the current header.
    pub fn step(self, msg: &str) {
        if !self.json {
            println!("-----> {msg}");
        }
    }

    pub fn warning(self, msg: &str) {
        if !self.json {
            println!("{}", self.paint(&Style::new().yellow(), format!(" !     {msg}")));
        }
    }

    /// A spinner only makes sense on a terminal with nothing else streaming.
    pub fn spinner(self, quiet: bool, msg: &str) -> Option<ProgressBar> {
        (quiet && self.interactive && !self.json).then(|| spinner(msg))
    }
}

/// Whole megabytes and kilobytes, rounded down.
pub fn human_size(bytes: u64) -> (u64, u64) {
    (bytes / (1024 * 1024), bytes / 1024)
}
