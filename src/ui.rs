use crate::columns::Cell as ColumnCell;
use crate::format::{Health, success_rate_health};
use crate::model::{ResourceKind, Row};
use crate::table::TableSpec;
use chrono::{DateTime, Utc};
use crossterm::queue;
use crossterm::style::{Color as TermColor, Print, ResetColor, SetForegroundColor};
use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Row as TableRow, Table, Widget};
use serde_json::{Value, json};
use std::io::{self, Write};
use tracing::warn;

const ACCENT: Color = Color::Rgb(52, 211, 153);
const MUTED: Color = Color::Rgb(140, 156, 178);
const WARN: Color = Color::Rgb(251, 191, 36);
const ERROR: Color = Color::Rgb(248, 113, 113);
const LINK: Color = Color::Rgb(96, 165, 250);
const COLUMN_SPACING: u16 = 1;
// Borders and header take three lines of the buffer height.
const MAX_RENDERED_ROWS: usize = (u16::MAX - 3) as usize;

pub fn table_title(kind: &ResourceKind, rows: usize, generated_at: Option<DateTime<Utc>>) -> String {
    let title = format!("{} ({rows})", kind.plural_title());
    match generated_at {
        Some(at) => format!("{title} - {}", at.format("%Y-%m-%d %H:%M:%S UTC")),
        None => title,
    }
}

fn cell_style(cell: &ColumnCell) -> Style {
    match cell {
        ColumnCell::Empty | ColumnCell::Text { .. } => Style::default().fg(Color::White),
        ColumnCell::Link(_) => Style::default().fg(LINK),
        ColumnCell::SuccessRate { value: None } => Style::default().fg(MUTED),
        ColumnCell::SuccessRate { value: Some(rate) } => match success_rate_health(*rate) {
            Health::Good => Style::default().fg(ACCENT),
            Health::Warning => Style::default().fg(WARN),
            Health::Poor => Style::default().fg(ERROR),
        },
        ColumnCell::Flagged { .. } => Style::default().fg(ERROR),
    }
}

pub fn render_to_buffer(spec: &TableSpec, rows: &[&Row], title: &str) -> Buffer {
    render_rows(spec, rows, title, MAX_RENDERED_ROWS)
}

fn render_rows(spec: &TableSpec, rows: &[&Row], title: &str, max_rows: usize) -> Buffer {
    let shown = &rows[..rows.len().min(max_rows)];
    let title = if shown.len() < rows.len() {
        warn!(
            "table has {} rows, drawing the first {}",
            rows.len(),
            shown.len()
        );
        format!("{title} (truncated to {})", shown.len())
    } else {
        title.to_string()
    };

    let cells = shown
        .iter()
        .map(|row| {
            spec.columns
                .iter()
                .map(|column| column.render(row))
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();

    let widths = spec
        .columns
        .iter()
        .enumerate()
        .map(|(index, column)| {
            cells
                .iter()
                .map(|row| text_width(&row[index].plain_text()))
                .chain(std::iter::once(text_width(&column.title)))
                .max()
                .unwrap_or(0)
        })
        .collect::<Vec<_>>();

    let gaps = u16::try_from(widths.len().saturating_sub(1)).unwrap_or(u16::MAX);
    let content_width = widths
        .iter()
        .fold(0u16, |total, width| total.saturating_add(*width))
        .saturating_add(gaps.saturating_mul(COLUMN_SPACING));
    let width = content_width.max(text_width(&title)).saturating_add(2);
    let height = u16::try_from(cells.len())
        .unwrap_or(u16::MAX)
        .saturating_add(3);
    let area = Rect::new(0, 0, width, height);

    let header_row = TableRow::new(spec.columns.iter().map(|column| {
        Cell::from(column.title.clone()).style(Style::default().add_modifier(Modifier::BOLD))
    }))
    .height(1)
    .style(Style::default().fg(ACCENT));

    let body = cells.iter().map(|row| {
        TableRow::new(
            row.iter()
                .map(|cell| Cell::from(cell.plain_text()).style(cell_style(cell))),
        )
    });

    let constraints = widths
        .iter()
        .map(|width| Constraint::Length(*width))
        .collect::<Vec<_>>();
    let table = Table::new(body, constraints)
        .header(header_row)
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(Style::default().fg(MUTED)),
        )
        .column_spacing(COLUMN_SPACING);

    let mut buffer = Buffer::empty(area);
    table.render(area, &mut buffer);
    buffer
}

fn text_width(text: &str) -> u16 {
    text.chars().count().min(u16::MAX as usize) as u16
}

fn term_color(color: Color) -> Option<TermColor> {
    match color {
        Color::Rgb(r, g, b) => Some(TermColor::Rgb { r, g, b }),
        Color::White => Some(TermColor::White),
        _ => None,
    }
}

pub fn write_buffer<W: Write>(buffer: &Buffer, out: &mut W, color: bool) -> io::Result<()> {
    let area = buffer.area;
    for y in area.top()..area.bottom() {
        let mut line = String::new();
        let mut current: Option<TermColor> = None;
        for x in area.left()..area.right() {
            let cell = &buffer[(x, y)];
            if color {
                let wanted = term_color(cell.fg);
                if wanted != current {
                    if !line.is_empty() {
                        queue!(out, Print(std::mem::take(&mut line)))?;
                    }
                    match wanted {
                        Some(fg) => queue!(out, SetForegroundColor(fg))?,
                        None => queue!(out, ResetColor)?,
                    }
                    current = wanted;
                }
            }
            line.push_str(cell.symbol());
        }

        if color {
            queue!(out, Print(line), ResetColor, Print("\n"))?;
        } else {
            queue!(out, Print(line.trim_end()), Print("\n"))?;
        }
    }
    out.flush()
}

pub fn draw(spec: &TableSpec, rows: &[&Row], title: &str, color: bool) -> io::Result<()> {
    let buffer = render_to_buffer(spec, rows, title);
    let mut stdout = io::stdout().lock();
    write_buffer(&buffer, &mut stdout, color)
}

pub fn json_view(spec: &TableSpec, rows: &[&Row]) -> Value {
    let columns = spec
        .columns
        .iter()
        .map(|column| {
            json!({
                "title": column.title,
                "key": column.key,
                "isNumeric": column.is_numeric,
            })
        })
        .collect::<Vec<_>>();
    let rows = rows
        .iter()
        .map(|row| {
            let cells = spec
                .columns
                .iter()
                .map(|column| column.render(row))
                .collect::<Vec<_>>();
            json!({ "cells": cells, "row": row })
        })
        .collect::<Vec<_>>();

    json!({
        "defaultSortKey": spec.default_sort_key,
        "columns": columns,
        "rows": rows,
    })
}

#[cfg(test)]
mod tests {
    use super::{json_view, render_rows, render_to_buffer, table_title, write_buffer};
    use crate::links::{LinkFactory, PrefixedLinks};
    use crate::model::{MetricRecord, NamespaceScope, ResourceKind};
    use crate::table::{SortSpec, TableOptions, render};
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use std::sync::Arc;

    fn spec() -> crate::table::TableSpec {
        let metrics: Vec<MetricRecord> = serde_json::from_value(json!([
            {
                "name": "web",
                "namespace": "emojivoto",
                "type": "deployment",
                "added": true,
                "pods": {"meshedPods": "1", "totalPods": "1"},
                "successRate": 0.5,
                "requestRate": 2.0,
                "latency": {"P50": 12.0, "P95": 40.0, "P99": 90.0}
            }
        ]))
        .unwrap();
        let links: Arc<dyn LinkFactory> = Arc::new(PrefixedLinks::default());
        let options = TableOptions::new(
            ResourceKind::from_token("deployment"),
            NamespaceScope::Named("emojivoto".to_string()),
        );
        render(&metrics, &options, &links)
    }

    #[test]
    fn title_includes_count_and_generation_time() {
        let kind = ResourceKind::from_token("deploy");
        assert_eq!(table_title(&kind, 3, None), "Deployments (3)");
        let at = Utc.with_ymd_and_hms(2026, 10, 18, 9, 30, 0).unwrap();
        assert_eq!(
            table_title(&kind, 1, Some(at)),
            "Deployments (1) - 2026-10-18 09:30:00 UTC"
        );
    }

    #[test]
    fn plain_output_contains_headers_and_cells() {
        let spec = spec();
        let rows = spec.visible_rows("", &SortSpec::default());
        let buffer = render_to_buffer(&spec, &rows, "Deployments (1)");

        let mut out = Vec::new();
        write_buffer(&buffer, &mut out, false).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines = text.lines().collect::<Vec<_>>();

        assert_eq!(lines.len(), 4);
        assert!(lines[0].contains("Deployments (1)"));
        assert!(lines[1].contains("Deployment"));
        assert!(lines[1].contains("P99 Latency"));
        assert!(lines[2].contains("web"));
        assert!(lines[2].contains("1/1"));
        assert!(lines[2].contains("50.00%"));
        assert!(lines[2].contains("12 ms"));
    }

    #[test]
    fn row_cap_keeps_height_consistent_and_marks_title() {
        let metrics: Vec<MetricRecord> = (0..12)
            .map(|index| MetricRecord {
                name: format!("web-{index:02}"),
                kind: "pod".to_string(),
                ..MetricRecord::default()
            })
            .collect();
        let links: Arc<dyn LinkFactory> = Arc::new(PrefixedLinks::default());
        let options = TableOptions::new(ResourceKind::from_token("pod"), NamespaceScope::All);
        let spec = render(&metrics, &options, &links);
        let rows = spec.visible_rows("", &SortSpec::default());

        let buffer = render_rows(&spec, &rows, "Pods (12)", 5);
        assert_eq!(buffer.area.height, 5 + 3);

        let mut out = Vec::new();
        write_buffer(&buffer, &mut out, false).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.lines().next().unwrap().contains("Pods (12) (truncated to 5)"));
        assert!(text.contains("web-04"));
        assert!(!text.contains("web-05"));

        let full = render_rows(&spec, &rows, "Pods (12)", 100);
        assert_eq!(full.area.height, 12 + 3);
    }

    #[test]
    fn colored_output_emits_escape_sequences() {
        let spec = spec();
        let rows = spec.visible_rows("", &SortSpec::default());
        let buffer = render_to_buffer(&spec, &rows, "t");

        let mut out = Vec::new();
        write_buffer(&buffer, &mut out, true).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("\u{1b}["));
        assert!(text.contains("web"));
    }

    #[test]
    fn json_view_lists_columns_and_rendered_cells() {
        let spec = spec();
        let rows = spec.visible_rows("", &SortSpec::default());
        let view = json_view(&spec, &rows);

        assert_eq!(view["defaultSortKey"], json!("name"));
        assert_eq!(view["columns"][0]["title"], json!("Deployment"));
        assert_eq!(view["columns"][1]["key"], json!("pods.totalPods"));
        assert_eq!(view["rows"][0]["cells"][0]["kind"], json!("link"));
        assert_eq!(
            view["rows"][0]["cells"][0]["href"],
            json!("/namespaces/emojivoto/deployments/web")
        );
        assert_eq!(view["rows"][0]["row"]["P50"], json!(12.0));
    }
}
