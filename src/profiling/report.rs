//! Cost aggregation and report rendering
//!
//! A [`ProfilingSession`] is the explicit per-measurement-session context:
//! operators record named cost samples into it while it is enabled, and a
//! report ranks the entries by their dominant cost and renders them as a
//! fixed-width ASCII table. The session is single-writer state scoped to the
//! thread driving one device's command stream.
//!
//! The table geometry (rule length `sum(widths) + 3 * columns + 1`, title
//! right-justified at `rule_len / 2 + title_len / 2`) intentionally matches
//! the long-standing report format, including its integer-truncation title
//! offset. Downstream log scrapers key on it; do not re-center.

use std::fmt;

/// Fixed-point rendering with 3 decimal digits
pub fn double_to_string(val: f64) -> String {
    format!("{:.3}", val)
}

/// Like [`double_to_string`], but renders exactly-zero values as blank so
/// optional metrics read as absent rather than "0.000"
pub fn double_to_string_filter(val: f64) -> String {
    if val == 0.0 {
        String::new()
    } else {
        double_to_string(val)
    }
}

/// A rendered-on-demand report: title, column headers, and string cell rows
/// aligned positionally with the headers. Derived fresh per request, never
/// persisted.
#[derive(Debug, Clone)]
pub struct ReportTable {
    pub title: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ReportTable {
    /// Render as a fixed-width table. Column width is the maximum of the
    /// header label and every cell in that column.
    pub fn render(&self) -> String {
        if self.headers.is_empty() {
            return String::new();
        }
        let columns = self.headers.len();
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.len()).collect();
        for row in &self.rows {
            for (col, cell) in row.iter().enumerate().take(columns) {
                if cell.len() > widths[col] {
                    widths[col] = cell.len();
                }
            }
        }

        let row_length: usize = widths.iter().sum::<usize>() + 3 * columns + 1;
        let dash_line: String = "-".repeat(row_length);

        let mut out = String::new();
        out.push_str(&dash_line);
        out.push('\n');
        out.push_str(&format!(
            "{:>offset$}",
            self.title,
            offset = row_length / 2 + self.title.len() / 2
        ));
        out.push('\n');
        out.push_str(&dash_line);
        out.push('\n');
        Self::format_row(&mut out, &self.headers, &widths);
        out.push_str(&dash_line);
        out.push('\n');
        for row in &self.rows {
            Self::format_row(&mut out, row, &widths);
        }
        out.push_str(&dash_line);
        out.push('\n');
        out
    }

    fn format_row(out: &mut String, cells: &[String], widths: &[usize]) {
        out.push('|');
        for (col, width) in widths.iter().enumerate() {
            let cell = cells.get(col).map(String::as_str).unwrap_or("");
            out.push(' ');
            out.push_str(&format!("{:>width$}", cell, width = width));
            out.push_str(" |");
        }
        out.push('\n');
    }
}

impl fmt::Display for ReportTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Named cost aggregate for one measurement session.
///
/// Keys are unique; within a key, values accumulate in invocation order.
/// Entries live in a Vec rather than a map so report tie-breaks follow
/// insertion order deterministically.
#[derive(Debug)]
pub struct ProfilingSession {
    profiling_enabled: bool,
    entries: Vec<(String, Vec<f64>)>,
}

impl ProfilingSession {
    /// Session that collects and aggregates per-invocation samples
    pub fn enabled() -> Self {
        ProfilingSession {
            profiling_enabled: true,
            entries: Vec::new(),
        }
    }

    /// Session that records nothing; profiled code paths are skipped
    /// entirely, so no completion waits are paid
    pub fn disabled() -> Self {
        ProfilingSession {
            profiling_enabled: false,
            entries: Vec::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.profiling_enabled
    }

    /// Append cost values to the named sequence, creating the key if absent.
    /// The 0th value of an entry is its ranking key at report time.
    pub fn record(&mut self, name: &str, values: &[f64]) {
        if let Some((_, existing)) = self.entries.iter_mut().find(|(n, _)| n == name) {
            existing.extend_from_slice(values);
        } else {
            self.entries.push((name.to_string(), values.to_vec()));
        }
    }

    /// Clear the aggregate at session end; the enable flag is unchanged
    pub fn reset(&mut self) {
        self.entries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Build a report: entries sorted by strictly-descending primary metric
    /// (stable — ties keep insertion order), one row per entry with the name
    /// followed by its values rendered through the zero filter. Rows are
    /// padded or truncated to the header count.
    pub fn report(&self, title: &str, headers: &[&str]) -> ReportTable {
        let mut sorted: Vec<&(String, Vec<f64>)> = self.entries.iter().collect();
        sorted.sort_by(|a, b| {
            let a0 = a.1.first().copied().unwrap_or(0.0);
            let b0 = b.1.first().copied().unwrap_or(0.0);
            b0.partial_cmp(&a0).unwrap_or(std::cmp::Ordering::Equal)
        });

        let columns = headers.len();
        let rows = sorted
            .iter()
            .map(|(name, values)| {
                let mut row = Vec::with_capacity(columns);
                row.push(name.clone());
                for &value in values {
                    row.push(double_to_string_filter(value));
                }
                row.resize(columns, String::new());
                row
            })
            .collect();

        ReportTable {
            title: title.to_string(),
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows,
        }
    }
}
