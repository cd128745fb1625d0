//! Terminal rendering of change histories.
//!
//! Two layouts are supported:
//!
//! ```text
//! * 2024-02-01 (1.1-1) [extra] Update to 1.1 [...]
//! ```
//!
//! and, with `long`,
//!
//! ```text
//! 2024-02-01 13:00:00 (1.1-1) [extra] Update to 1.1
//! Drop obsolete patch.
//! --------------
//! ```
//!
//! Timestamps are shown in local time. Columns are padded before colouring so
//! alignment does not depend on escape sequences.

use chrono::Local;
use owo_colors::{OwoColorize, Style};

use crate::change::Change;

/// Line printed after every entry of the long layout.
pub const SEPARATOR: &str = "--------------";

/// How a history is cut down and rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatOptions {
    /// Maximum number of entries shown.
    pub max: usize,
    /// Newest first instead of oldest first.
    pub reverse: bool,
    /// Use the multi-line layout.
    pub long: bool,
    /// Emit ANSI colours.
    pub color: bool,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            max: 10,
            reverse: false,
            long: false,
            color: false,
        }
    }
}

/// Sorts by timestamp and keeps at most `max` entries.
///
/// Sorting is stable. Entries without a timestamp sort before all others.
/// Unless reversed, the newest `max` entries are kept; reversed, the sort is
/// descending and again the newest `max` (now the first ones) are kept.
///
/// ## Examples
///
/// ```
/// use arch_log_lib::change::{Change, parse_timestamp};
/// use arch_log_lib::format::prepare;
///
/// let change = |summary: &str, ts: &str| Change {
///     summary: summary.to_string(),
///     timestamp: parse_timestamp(ts),
///     ..Default::default()
/// };
/// let changes = vec![
///     change("b", "2024-02-01T12:00:00Z"),
///     change("a", "2024-01-01T12:00:00Z"),
///     change("c", "2024-03-01T12:00:00Z"),
/// ];
///
/// let kept: Vec<_> = prepare(changes, 2, false).into_iter().map(|c| c.summary).collect();
/// assert_eq!(kept, ["b", "c"]);
/// ```
pub fn prepare(mut changes: Vec<Change>, max: usize, reverse: bool) -> Vec<Change> {
    if reverse {
        changes.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        changes.truncate(max);
    } else {
        changes.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        let excess = changes.len().saturating_sub(max);
        changes.drain(..excess);
    }
    changes
}

/// Sorts, truncates and renders a history. Every line ends with a newline.
pub fn render(changes: Vec<Change>, options: &FormatOptions) -> String {
    let changes = prepare(changes, options.max, options.reverse);
    let palette = Palette::new(options.color);

    let mut out = String::new();
    if options.long {
        for change in &changes {
            out.push_str(&long_entry(change, &palette));
            out.push('\n');
            out.push_str(SEPARATOR);
            out.push('\n');
        }
    } else {
        let tag_width = column_width(&changes, |c| &c.tag);
        let repo_width = column_width(&changes, |c| &c.repo);
        for change in &changes {
            out.push_str(&short_line(change, tag_width, repo_width, &palette));
            out.push('\n');
        }
    }
    out
}

/// Width of a bracketed column, or 0 if no entry has a value.
fn column_width(changes: &[Change], field: impl Fn(&Change) -> &String) -> usize {
    changes
        .iter()
        .map(|c| field(c).chars().count())
        .max()
        .filter(|&width| width > 0)
        .map_or(0, |width| width + 2)
}

struct Palette {
    enabled: bool,
    time: Style,
    summary: Style,
    tag: Style,
    repo: Style,
    bullet: Style,
}

impl Palette {
    fn new(enabled: bool) -> Self {
        Self {
            enabled,
            time: Style::new().yellow().bold(),
            summary: Style::new().bold(),
            tag: Style::new().green(),
            repo: Style::new().yellow(),
            bullet: Style::new().green().bold(),
        }
    }

    fn paint(&self, text: &str, style: Style) -> String {
        if self.enabled {
            text.style(style).to_string()
        } else {
            text.to_string()
        }
    }
}

fn bracketed(value: &str, open: char, close: char) -> String {
    if value.is_empty() {
        String::new()
    } else {
        format!("{open}{value}{close}")
    }
}

fn local_time(change: &Change, pattern: &str) -> String {
    change
        .timestamp
        .map(|ts| ts.with_timezone(&Local).format(pattern).to_string())
        .unwrap_or_default()
}

fn short_line(change: &Change, tag_width: usize, repo_width: usize, palette: &Palette) -> String {
    let mut line = palette.paint("*", palette.bullet);
    line.push(' ');
    line.push_str(&palette.paint(
        &format!("{:>10}", local_time(change, "%Y-%m-%d")),
        palette.time,
    ));

    if tag_width > 0 {
        let tag = format!(" {:>tag_width$}", bracketed(&change.tag, '(', ')'));
        line.push_str(&palette.paint(&tag, palette.tag));
    }

    if repo_width > 0 {
        let repo = format!(" {:<repo_width$}", bracketed(&change.repo, '[', ']'));
        line.push_str(&palette.paint(&repo, palette.repo));
    }

    line.push(' ');
    line.push_str(&palette.paint(&change.summary, palette.summary));

    if change.has_message() {
        line.push_str(" [...]");
    }
    line
}

fn long_entry(change: &Change, palette: &Palette) -> String {
    let mut entry = palette.paint(
        &format!("{:<19}", local_time(change, "%Y-%m-%d %H:%M:%S")),
        palette.time,
    );

    if !change.tag.is_empty() {
        entry.push(' ');
        entry.push_str(&palette.paint(&bracketed(&change.tag, '(', ')'), palette.tag));
    }

    if !change.repo.is_empty() {
        entry.push(' ');
        entry.push_str(&palette.paint(&bracketed(&change.repo, '[', ']'), palette.repo));
    }

    entry.push(' ');
    entry.push_str(&palette.paint(&change.summary, palette.summary));

    let message = change.message.trim();
    if !message.is_empty() {
        entry.push('\n');
        entry.push_str(message);
    }
    entry
}
