//! Terminal output: stage progress on stderr, result panels on stdout.

use colored::{ColoredString, Colorize};
use figma_rag_core::contract::ProgressReporter;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

const SPINNER_TEMPLATE: &str = "{spinner:.green} {msg}";
const BAR_TEMPLATE: &str = "{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}";

/// Spinner while a stage starts, bar once the stage reports counts.
pub struct ConsoleProgress {
    bar: ProgressBar,
    spinner_style: ProgressStyle,
    bar_style: ProgressStyle,
}

impl ConsoleProgress {
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner();
        bar.enable_steady_tick(Duration::from_millis(100));
        Self::with_bar(bar)
    }

    /// Drives the given bar; a hidden one keeps output quiet.
    pub fn with_bar(bar: ProgressBar) -> Self {
        let spinner_style =
            ProgressStyle::with_template(SPINNER_TEMPLATE).unwrap_or_else(|_| ProgressStyle::default_spinner());
        let bar_style = ProgressStyle::with_template(BAR_TEMPLATE)
            .map(|style| style.progress_chars("#>-"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        bar.set_style(spinner_style.clone());
        Self {
            bar,
            spinner_style,
            bar_style,
        }
    }
}

impl Default for ConsoleProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for ConsoleProgress {
    fn stage(&self, name: &str) {
        self.bar.set_style(self.spinner_style.clone());
        self.bar.set_length(0);
        self.bar.set_position(0);
        self.bar.set_message(name.to_string());
    }

    fn advance(&self, done: usize, total: usize) {
        if self.bar.length() != Some(total as u64) {
            self.bar.set_style(self.bar_style.clone());
            self.bar.set_length(total as u64);
        }
        self.bar.set_position(done as u64);
    }
}

impl Drop for ConsoleProgress {
    fn drop(&mut self) {
        self.bar.finish_and_clear();
    }
}

/// Prints a titled block to stdout.
pub fn panel(title: &str, body: &str) {
    print_panel(title.cyan().bold(), body);
}

pub fn warning_panel(title: &str, body: &str) {
    print_panel(title.yellow().bold(), body);
}

pub fn error_panel(title: &str, body: &str) {
    print_panel(title.red().bold(), body);
}

fn print_panel(title: ColoredString, body: &str) {
    println!("== {title} ==");
    for line in body.lines() {
        println!("  {line}");
    }
    println!();
}

/// Prints `label  count` rows under a heading.
pub fn table<'a, I>(heading: &str, rows: I)
where
    I: IntoIterator<Item = (&'a str, usize)>,
{
    let rows: Vec<(&str, usize)> = rows.into_iter().collect();
    let width = rows.iter().map(|(label, _)| label.len()).max().unwrap_or(0).max(4);
    println!("{}", heading.green().bold());
    println!("  {}  {}", format!("{:<width$}", "Type").bold(), "Count".bold());
    for (label, count) in rows {
        println!("  {:<width$}  {count}", capitalize(label));
    }
    println!();
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
