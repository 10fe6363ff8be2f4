//! Upload service domain logic: parsing an uploaded tabular file and
//! building generic chart series against user-chosen columns.
//!
//! Nothing is persisted - the uploaded text travels with every request.

use anyhow::{anyhow, Result};
use log::info;

use shared::{
    ChartKind, ChartPoint, ChartRequest, ChartResponse, ColumnKind, HeatmapGrid,
    UploadTableResponse, UploadedColumn,
};

/// Rows shown in the upload preview
const PREVIEW_ROWS: usize = 5;

/// Bins per axis of the heatmap density grid
const HEATMAP_BINS: usize = 10;

/// An uploaded table split into header and data rows
struct UploadedTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl UploadedTable {
    fn column_index(&self, name: &str) -> Result<usize> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| anyhow!("unknown column: {}", name))
    }

    /// A column is numeric when it has at least one non-empty cell and
    /// every non-empty cell parses as a number.
    fn column_kind(&self, index: usize) -> ColumnKind {
        let mut saw_value = false;
        for row in &self.rows {
            let cell = row.get(index).map(String::as_str).unwrap_or("").trim();
            if cell.is_empty() {
                continue;
            }
            if cell.parse::<f64>().is_err() {
                return ColumnKind::Text;
            }
            saw_value = true;
        }
        if saw_value {
            ColumnKind::Numeric
        } else {
            ColumnKind::Text
        }
    }

    /// Non-empty numeric values of one column, paired with their row index
    fn numeric_values(&self, index: usize) -> Vec<(usize, f64)> {
        self.rows
            .iter()
            .enumerate()
            .filter_map(|(i, row)| {
                let cell = row.get(index)?.trim();
                cell.parse::<f64>().ok().map(|v| (i, v))
            })
            .collect()
    }
}

/// Upload service that handles tabular uploads and chart building
#[derive(Clone)]
pub struct UploadService {}

impl UploadService {
    pub fn new() -> Self {
        Self {}
    }

    /// Parse an uploaded CSV and describe it: column kinds, a short
    /// preview, and the row count. An empty upload is an informational
    /// message, not an error.
    pub fn describe_table(&self, csv_text: &str) -> Result<UploadTableResponse> {
        let table = read_table(csv_text)?;
        info!(
            "Upload: {} columns, {} rows",
            table.headers.len(),
            table.rows.len()
        );

        let columns = table
            .headers
            .iter()
            .enumerate()
            .map(|(i, name)| UploadedColumn {
                name: name.clone(),
                kind: table.column_kind(i),
            })
            .collect();

        let message = if table.rows.is_empty() {
            Some("업로드한 파일에 데이터가 없습니다.".to_string())
        } else {
            None
        };

        Ok(UploadTableResponse {
            columns,
            preview: table.rows.iter().take(PREVIEW_ROWS).cloned().collect(),
            row_count: table.rows.len(),
            message,
        })
    }

    /// Build one chart against user-chosen columns.
    ///
    /// Scatter/line/bar need a numeric Y column; the heatmap needs both
    /// columns numeric. A chart that is unavailable for the chosen columns
    /// is an informational message, while an unknown column name is an
    /// error (bad request at the REST layer).
    pub fn chart(&self, request: &ChartRequest) -> Result<ChartResponse> {
        let table = read_table(&request.csv_text)?;
        let x_index = table.column_index(&request.x_column)?;
        let y_index = table.column_index(&request.y_column)?;

        match request.kind {
            ChartKind::Scatter | ChartKind::Line | ChartKind::Bar => {
                if table.column_kind(y_index) != ColumnKind::Numeric {
                    return Ok(unavailable(
                        request.kind,
                        "Y축은 숫자형 열만 선택할 수 있습니다.",
                    ));
                }

                let points = table
                    .numeric_values(y_index)
                    .into_iter()
                    .map(|(row, y)| ChartPoint {
                        x: table.rows[row].get(x_index).cloned().unwrap_or_default(),
                        y,
                    })
                    .collect();

                Ok(ChartResponse {
                    kind: request.kind,
                    points,
                    heatmap: None,
                    message: None,
                })
            }
            ChartKind::Heatmap => {
                if table.column_kind(x_index) != ColumnKind::Numeric
                    || table.column_kind(y_index) != ColumnKind::Numeric
                {
                    return Ok(unavailable(
                        ChartKind::Heatmap,
                        "히트맵은 X축과 Y축이 모두 숫자형일 때만 표시됩니다.",
                    ));
                }

                Ok(ChartResponse {
                    kind: ChartKind::Heatmap,
                    points: Vec::new(),
                    heatmap: Some(density_grid(&table, x_index, y_index)),
                    message: None,
                })
            }
        }
    }
}

impl Default for UploadService {
    fn default() -> Self {
        Self::new()
    }
}

/// Read CSV text (BOM tolerated) into header + rows
fn read_table(csv_text: &str) -> Result<UploadedTable> {
    let stripped = csv_text.strip_prefix('\u{feff}').unwrap_or(csv_text);
    let mut reader = csv::Reader::from_reader(stripped.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| anyhow!("invalid CSV header: {}", e))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| anyhow!("invalid CSV row: {}", e))?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(UploadedTable { headers, rows })
}

fn unavailable(kind: ChartKind, message: &str) -> ChartResponse {
    ChartResponse {
        kind,
        points: Vec::new(),
        heatmap: None,
        message: Some(message.to_string()),
    }
}

/// Bin both numeric columns into a fixed-size density grid. Rows where
/// either value is missing are left out of the grid.
fn density_grid(table: &UploadedTable, x_index: usize, y_index: usize) -> HeatmapGrid {
    let xs: std::collections::HashMap<usize, f64> =
        table.numeric_values(x_index).into_iter().collect();
    let ys: std::collections::HashMap<usize, f64> =
        table.numeric_values(y_index).into_iter().collect();

    let pairs: Vec<(f64, f64)> = xs
        .iter()
        .filter_map(|(row, x)| ys.get(row).map(|y| (*x, *y)))
        .collect();

    let x_edges = bin_edges(pairs.iter().map(|(x, _)| *x));
    let y_edges = bin_edges(pairs.iter().map(|(_, y)| *y));

    let mut counts = vec![vec![0u32; HEATMAP_BINS]; HEATMAP_BINS];
    for (x, y) in &pairs {
        let col = bin_index(*x, &x_edges);
        let row = bin_index(*y, &y_edges);
        counts[row][col] += 1;
    }

    HeatmapGrid {
        x_edges,
        y_edges,
        counts,
    }
}

/// Evenly spaced bin edges spanning the values (degenerate spans get a
/// unit-wide bin so every value still lands somewhere)
fn bin_edges(values: impl Iterator<Item = f64>) -> Vec<f64> {
    let values: Vec<f64> = values.collect();
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let (min, max) = if values.is_empty() {
        (0.0, 1.0)
    } else if min == max {
        (min, min + 1.0)
    } else {
        (min, max)
    };

    let step = (max - min) / HEATMAP_BINS as f64;
    (0..=HEATMAP_BINS).map(|i| min + step * i as f64).collect()
}

fn bin_index(value: f64, edges: &[f64]) -> usize {
    let min = edges[0];
    let max = edges[edges.len() - 1];
    let span = max - min;
    let raw = ((value - min) / span * HEATMAP_BINS as f64) as usize;
    raw.min(HEATMAP_BINS - 1)
}
