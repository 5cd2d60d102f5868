//! Terminal presentation: output panes, the table grid, and artifact files.
//!
//! Raster images and figure/chart specs cannot be embedded in a terminal, so
//! they are written under the output directory and announced in their pane.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use owo_colors::OwoColorize;
use termimad::MadSkin;
use unicode_width::UnicodeWidthStr;

use crate::results::{cell_text, ResultKind, TableData};
use crate::sandbox::Logs;

pub struct MarkdownPrinter {
    pub skin: MadSkin,
}

impl Default for MarkdownPrinter {
    fn default() -> Self {
        Self { skin: MadSkin::default() }
    }
}

impl MarkdownPrinter {
    pub fn print(&self, text: &str) {
        self.skin.print_text(text);
        println!();
    }
}

pub struct Renderer {
    out_dir: PathBuf,
    markdown: bool,
}

impl Renderer {
    pub fn new(out_dir: PathBuf, markdown: bool) -> Self {
        Self { out_dir, markdown }
    }

    pub fn section(&self, title: &str) {
        println!();
        println!("{}", title.cyan().bold());
    }

    pub fn warning(&self, text: &str) {
        println!("{}", text.yellow());
    }

    pub fn error(&self, text: &str) {
        eprintln!("{}", text.red());
    }

    pub fn text(&self, text: &str) {
        println!("{}", text);
    }

    /// Generated-code pane, verbatim.
    pub fn code(&self, code: &str) {
        if self.markdown {
            MarkdownPrinter::default().print(&format!("```python\n{}\n```", code));
        } else {
            println!("{}", code);
        }
    }

    /// Explanation pane.
    pub fn explanation(&self, text: &str) {
        if self.markdown {
            MarkdownPrinter::default().print(text);
        } else {
            println!("{}", text);
        }
    }

    /// Captured interpreter streams, as dimmed diagnostics on stderr. Never a
    /// result pane: warnings stay out of user-facing output.
    pub fn diagnostics(&self, logs: &Logs) {
        for line in &logs.stdout {
            self.dim(&format!("[sandbox stdout] {line}"));
        }
        for line in &logs.stderr {
            self.dim(&format!("[sandbox stderr] {line}"));
        }
    }

    pub fn dim(&self, text: &str) {
        eprintln!("{}", text.dimmed());
    }

    /// One classified execution result, dispatched to its presentation path.
    pub fn result(&self, idx: usize, kind: &ResultKind) -> Result<()> {
        match kind {
            ResultKind::Image { png_base64 } => match BASE64.decode(png_base64) {
                Ok(bytes) => {
                    let path = self.write_artifact(&format!("figure-{idx}.png"), &bytes)?;
                    println!("saved visualisation to {}", path.display());
                }
                Err(e) => self.warning(&format!("discarding undecodable image payload: {e}")),
            },
            ResultKind::Figure { spec } => {
                let path = self.write_artifact(
                    &format!("figure-{idx}.json"),
                    serde_json::to_string_pretty(spec)?.as_bytes(),
                )?;
                println!("saved figure spec to {}", path.display());
            }
            ResultKind::InteractiveChart { spec } => {
                let path = self.write_artifact(
                    &format!("chart-{idx}.json"),
                    serde_json::to_string_pretty(spec)?.as_bytes(),
                )?;
                println!("saved chart spec to {}", path.display());
            }
            ResultKind::Table(table) => self.table(table),
            ResultKind::FieldList(fields) => self.field_list(fields),
            ResultKind::Text(text) => println!("{}", text),
        }
        Ok(())
    }

    pub fn table(&self, table: &TableData) {
        print!("{}", table_grid(table));
    }

    pub fn field_list(&self, fields: &[String]) {
        println!(
            "{}",
            format!("The dataset contains the following fields: {}", fields.join(", ")).cyan()
        );
    }

    fn write_artifact(&self, name: &str, bytes: &[u8]) -> Result<PathBuf> {
        fs::create_dir_all(&self.out_dir)
            .with_context(|| format!("cannot create {}", self.out_dir.display()))?;
        let path = self.out_dir.join(name);
        fs::write(&path, bytes).with_context(|| format!("cannot write {}", path.display()))?;
        Ok(path)
    }
}

/// Aligned text grid for a table. Column widths follow the widest cell,
/// measured in display columns rather than bytes.
pub fn table_grid(table: &TableData) -> String {
    let rows: Vec<Vec<String>> = table
        .rows
        .iter()
        .map(|r| r.iter().map(cell_text).collect())
        .collect();

    let mut widths: Vec<usize> = table
        .columns
        .iter()
        .map(|c| UnicodeWidthStr::width(c.as_str()))
        .collect();
    for row in &rows {
        for (i, cell) in row.iter().enumerate() {
            let w = UnicodeWidthStr::width(cell.as_str());
            if i < widths.len() {
                widths[i] = widths[i].max(w);
            } else {
                widths.push(w);
            }
        }
    }

    let mut out = String::new();
    out.push_str(&grid_line(&table.columns, &widths));
    out.push_str(
        &widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("-+-"),
    );
    out.push('\n');
    for row in &rows {
        out.push_str(&grid_line(row, &widths));
    }
    out
}

fn grid_line(cells: &[String], widths: &[usize]) -> String {
    let padded: Vec<String> = widths
        .iter()
        .enumerate()
        .map(|(i, w)| {
            let cell = cells.get(i).map(String::as_str).unwrap_or("");
            let pad = w.saturating_sub(UnicodeWidthStr::width(cell));
            format!("{}{}", cell, " ".repeat(pad))
        })
        .collect();
    let mut line = padded.join(" | ");
    while line.ends_with(' ') {
        line.pop();
    }
    line.push('\n');
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine as _;
    use serde_json::json;

    fn sample_table() -> TableData {
        TableData {
            columns: vec!["category".into(), "cost".into()],
            rows: vec![
                vec![json!("food"), json!(12.5)],
                vec![json!("travel"), json!(7)],
            ],
        }
    }

    #[test]
    fn grid_aligns_columns_to_widest_cell() {
        let grid = table_grid(&sample_table());
        assert_eq!(
            grid,
            "category | cost\n\
             ---------+-----\n\
             food     | 12.5\n\
             travel   | 7\n"
        );
    }

    #[test]
    fn grid_handles_rows_wider_than_header() {
        let table = TableData {
            columns: vec!["a".into()],
            rows: vec![vec![json!("x"), json!("extra")]],
        };
        let grid = table_grid(&table);
        assert_eq!(grid, "a |\n--+------\nx | extra\n");
    }

    #[test]
    fn image_result_writes_decoded_png() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = Renderer::new(dir.path().to_path_buf(), false);
        let kind = ResultKind::Image { png_base64: BASE64.encode(b"png-bytes") };
        renderer.result(1, &kind).unwrap();
        let written = std::fs::read(dir.path().join("figure-1.png")).unwrap();
        assert_eq!(written, b"png-bytes");
    }

    #[test]
    fn undecodable_image_payload_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = Renderer::new(dir.path().to_path_buf(), false);
        let kind = ResultKind::Image { png_base64: "%%%not-base64%%%".into() };
        renderer.result(1, &kind).unwrap();
        assert!(!dir.path().join("figure-1.png").exists());
    }

    #[test]
    fn chart_result_writes_spec_json() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = Renderer::new(dir.path().to_path_buf(), false);
        let spec = json!({"type": "bar", "series": [1, 2]});
        renderer
            .result(2, &ResultKind::InteractiveChart { spec: spec.clone() })
            .unwrap();
        let written = std::fs::read_to_string(dir.path().join("chart-2.json")).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed, spec);
    }
}
