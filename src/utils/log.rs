// src/utils/log.rs

//! Console report helpers for CLI output.
//!
//! Library code logs through the `log` macros; these print the
//! human-facing blocks the CLI shows at the end of a command.

use chrono::Local;

fn stamp(message: &str) -> String {
    format!("[{}] {}", Local::now().format("%Y-%m-%d %H:%M:%S"), message)
}

/// Print a boxed title.
pub fn header(title: &str) {
    let border = "═".repeat(60);
    println!("{}", stamp(&border));
    println!("{}", stamp(&format!("  {title}")));
    println!("{}", stamp(&border));
}

/// Print an indented line.
pub fn sub_item(message: &str) {
    println!("{}", stamp(&format!("    {message}")));
}

/// Print a completed-step line.
pub fn success(message: &str) {
    println!("{}", stamp(&format!("[OK] {message}")));
}

/// Print a titled key/value block.
pub fn summary(title: &str, items: &[(&str, String)]) {
    println!();
    for line in summary_lines(title, items) {
        println!("{}", stamp(&line));
    }
}

fn summary_lines(title: &str, items: &[(&str, String)]) -> Vec<String> {
    let width = items.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
    std::iter::once(format!("[SUMMARY] {title}"))
        .chain(
            items
                .iter()
                .map(|(key, value)| format!("    {key:<width$} : {value}")),
        )
        .collect()
}

/// Human-readable byte count.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}
