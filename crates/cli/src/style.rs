//! Terminal styling for doctor checks and preprocess reports.

use console::{Style, StyledObject};

fn marked(mark: StyledObject<&str>, msg: &str) -> String {
    format!("{} {}", mark, msg)
}

/// A passing check: green `✓` then the message.
pub fn success(msg: &str) -> String {
    marked(Style::new().green().apply_to("✓"), msg)
}

/// A failing check: red `✗` then the message.
pub fn error(msg: &str) -> String {
    marked(Style::new().red().bold().apply_to("✗"), msg)
}

/// A check that passed with caveats, such as a catch-all remapping.
pub fn warn(msg: &str) -> String {
    marked(Style::new().yellow().apply_to("!"), msg)
}

pub fn header(title: &str) -> String {
    Style::new().bold().underlined().apply_to(title).to_string()
}

/// Secondary text: file locations in a rewrite listing, absent sections.
pub fn dim(text: &str) -> String {
    Style::new().dim().apply_to(text).to_string()
}

/// Render a rewritten import as a two-line `-` / `+` diff.
pub fn rewrite(before: &str, after: &str) -> String {
    let removed = Style::new().red().apply_to(format!("- {}", before));
    let added = Style::new().green().apply_to(format!("+ {}", after));
    format!("{}\n{}", removed, added)
}
