//! CLI output formatting.
//!
//! # Output Format
//!
//! ## List
//!
//! ```text
//! Filter sets
//! 001 avatar (quality 100)
//!     thumbnail mode="outbound" size=[64, 64]
//!     grayscale
//! 002 thumbnail (quality 80)
//!     thumbnail mode="outbound" size=[180, 180]
//!     sepia (unregistered)
//!
//! Step types
//!     crop, downscale, flip, grayscale, ...
//! ```
//!
//! ## Apply
//!
//! ```text
//! photos/a.jpg → filtered/a.jpg (48.2 KB → 6.1 KB)
//! photos/broken.png: FAILED Invalid payload: ...
//! ```
//!
//! Each command has a `format_*` function (returns `Vec<String>` or
//! `String`) for testability and a `print_*` wrapper that writes to stdout.

use crate::batch::BatchEvent;
use crate::config::{FilterStep, FiltersConfig};

fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn format_bytes(bytes: usize) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

fn step_line(step: &FilterStep, registered: &[&str]) -> String {
    let mut line = format!("{}{}", indent(1), step.step_type);
    for (key, value) in &step.options {
        line.push_str(&format!(" {key}={value}"));
    }
    if !registered.contains(&step.step_type.as_str()) {
        line.push_str(" (unregistered)");
    }
    line
}

/// Filter sets with their steps, then the registered step types.
pub fn format_filter_sets(config: &FiltersConfig, registered: &[&str]) -> Vec<String> {
    let mut lines = vec!["Filter sets".to_string()];

    if config.filter_sets.is_empty() {
        lines.push(format!("{}(none)", indent(1)));
    }
    for (i, (name, set)) in config.filter_sets.iter().enumerate() {
        lines.push(format!(
            "{} {} (quality {})",
            format_index(i + 1),
            name,
            set.quality.unwrap_or(100)
        ));
        for step in &set.filters {
            lines.push(step_line(step, registered));
        }
    }

    lines.push(String::new());
    lines.push("Step types".to_string());
    lines.push(format!("{}{}", indent(1), registered.join(", ")));
    lines
}

pub fn print_filter_sets(config: &FiltersConfig, registered: &[&str]) {
    for line in format_filter_sets(config, registered) {
        println!("{}", line);
    }
}

/// One line per processed (or failed) file.
pub fn format_batch_event(event: &BatchEvent) -> String {
    match event {
        BatchEvent::Processed {
            source,
            output,
            input_bytes,
            output_bytes,
        } => format!(
            "{} → {} ({} → {})",
            source.display(),
            output.display(),
            format_bytes(*input_bytes),
            format_bytes(*output_bytes)
        ),
        BatchEvent::Failed { source, error } => {
            format!("{}: FAILED {}", source.display(), error)
        }
    }
}
