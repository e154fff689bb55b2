//! Table formatting for search results and corpus summaries.

use crate::semantic::SearchHit;
use comfy_table::{
    Attribute, Cell, CellAlignment, Color, Table, modifiers::UTF8_ROUND_CORNERS,
    presets::UTF8_FULL,
};

fn new_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.apply_modifier(UTF8_ROUND_CORNERS);
    table.set_header(
        headers
            .iter()
            .map(|h| Cell::new(h).add_attribute(Attribute::Bold))
            .collect::<Vec<_>>(),
    );
    table
}

/// Score color bands, aligned with `semantic::thresholds`.
fn score_color(score: f32) -> Color {
    use crate::semantic::thresholds;
    if score >= thresholds::VERY_SIMILAR {
        Color::Green
    } else if score >= thresholds::SIMILAR {
        Color::Cyan
    } else if score >= thresholds::RELATED {
        Color::Yellow
    } else {
        Color::Reset
    }
}

/// Render ranked hits as a table of rank, score, label and domain.
pub fn create_results_table(hits: &[SearchHit]) -> String {
    let mut table = new_table(&["#", "Score", "Label", "Domain"]);

    for (rank, hit) in hits.iter().enumerate() {
        table.add_row(vec![
            Cell::new(rank + 1).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.3}", hit.score))
                .fg(score_color(hit.score))
                .set_alignment(CellAlignment::Right),
            Cell::new(&hit.label),
            Cell::new(&hit.domain),
        ]);
    }

    table.to_string()
}

/// Render per-domain row counts with a total row.
pub fn create_domains_table(domains: &[(String, usize)]) -> String {
    let mut table = new_table(&["Domain", "Labels"]);

    let mut total = 0;
    for (domain, count) in domains {
        total += count;
        let name = if domain.is_empty() {
            "<none>"
        } else {
            domain.as_str()
        };
        table.add_row(vec![
            Cell::new(name),
            Cell::new(count).set_alignment(CellAlignment::Right),
        ]);
    }

    table.add_row(vec![
        Cell::new("TOTAL").add_attribute(Attribute::Bold),
        Cell::new(total)
            .add_attribute(Attribute::Bold)
            .set_alignment(CellAlignment::Right),
    ]);

    table.to_string()
}

/// Two-column key/value table used by `index` and `config`.
pub fn create_summary_table(rows: &[(&str, String)]) -> String {
    let mut table = new_table(&["Setting", "Value"]);
    for (key, value) in rows {
        table.add_row(vec![*key, value.as_str()]);
    }
    table.to_string()
}
