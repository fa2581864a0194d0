//! Output formatting for CLI display
//!
//! Rendering of products, categories and the browse view for the terminal.
//! Nutrition grades get colored badges; everything else is plain text with
//! light emphasis.

use crate::browse::{BrowseView, LoadOutcome};
use crate::catalog::{CategoryRef, ProductSummary};
use colored::{ColoredString, Colorize};

/// Turn colors on or off for the whole process
pub fn set_color(enabled: bool) {
    colored::control::set_override(enabled);
}

/// Grade badge, e.g. `[A]` in green
#[must_use]
pub fn grade_badge(item: &ProductSummary) -> ColoredString {
    let Some(grade) = item.grade_label() else {
        return "[?]".dimmed();
    };

    let badge = format!("[{grade}]");
    match grade.as_str() {
        "A" => badge.green().bold(),
        "B" => badge.bright_green(),
        "C" => badge.yellow(),
        "D" => badge.bright_red(),
        "E" => badge.red().bold(),
        _ => badge.normal(),
    }
}

/// One list row: index, grade, name and brand
#[must_use]
pub fn product_line(index: usize, item: &ProductSummary) -> String {
    format!(
        "{:>4}. {} {} {}",
        index,
        grade_badge(item),
        item.display_name().bold(),
        format!("({})", item.display_brand()).dimmed()
    )
}

/// Multi-line product card used for barcode lookups
#[must_use]
pub fn product_detail(item: &ProductSummary) -> String {
    format!(
        "{} {}\n  Brand:   {}\n  Barcode: {}\n  Image:   {}",
        grade_badge(item),
        item.display_name().bold(),
        item.display_brand(),
        item.code,
        item.display_image()
    )
}

#[must_use]
pub fn category_line(index: usize, category: &CategoryRef) -> String {
    format!("{:>4}. {} {}", index, category.label(), category.id.dimmed())
}

/// One-line description of the active filters and paging state
#[must_use]
pub fn view_header(view: &BrowseView) -> String {
    let mut parts = Vec::new();

    let term = view.filters.search_term().trim();
    if !term.is_empty() {
        parts.push(format!("search \"{term}\""));
    }
    if let Some(category) = view.filters.category() {
        parts.push(format!("category {}", category.display_name));
    }
    if parts.is_empty() {
        parts.push("all products".to_string());
    }
    parts.push(format!("sort: {}", view.filters.sort_key().label()));
    parts.push(format!("{} item(s), page {}", view.items.len(), view.page_number));

    let status = if view.loading {
        "loading...".yellow()
    } else if view.has_more {
        "more available".normal()
    } else {
        "end of list".dimmed()
    };

    format!("{} | {}", parts.join(" | ").bold(), status)
}

/// Full listing: header, rows, and the last error if any
#[must_use]
pub fn view_listing(view: &BrowseView) -> String {
    let mut lines = vec![view_header(view)];
    if view.items.is_empty() && !view.loading {
        lines.push("  No products.".dimmed().to_string());
    }
    lines.extend(
        view.items
            .iter()
            .enumerate()
            .map(|(i, item)| product_line(i + 1, item)),
    );
    if let Some(error) = &view.error {
        lines.push(format!("{} {error} (type 'retry')", "Load failed:".red().bold()));
    }
    lines.join("\n")
}

/// Short notice for outcomes that need one
#[must_use]
pub fn outcome_notice(outcome: &LoadOutcome) -> Option<String> {
    match outcome {
        LoadOutcome::Restored { items } => Some(format!("Resumed previous session ({items} item(s))")),
        LoadOutcome::Failed(err) => Some(format!("{} {err}", "Load failed:".red().bold())),
        LoadOutcome::Exhausted => Some("No more products.".dimmed().to_string()),
        LoadOutcome::Unchanged => Some("Filters unchanged.".dimmed().to_string()),
        LoadOutcome::Idle => Some("Nothing to retry.".dimmed().to_string()),
        LoadOutcome::Applied { .. } | LoadOutcome::Superseded => None,
    }
}
