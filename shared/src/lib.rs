use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// School meal dashboard
// ---------------------------------------------------------------------------

/// One raw meal record for one date, as returned by the upstream meal API.
/// Ephemeral - produced per request and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyMealRecord {
    pub date: NaiveDate,
    /// Meal type name (e.g. breakfast/lunch/dinner label from the API)
    pub meal_name: String,
    /// Free-text dish listing, break markers included
    pub dish_listing: String,
    /// Free-text nutrition annotation ("label: value(unit)" segments), if any
    pub nutrition_annotation: Option<String>,
}

/// The fixed three-nutrient allow-list that aggregation is restricted to.
/// Labels are the exact strings the upstream API reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Nutrient {
    #[serde(rename = "탄수화물")]
    Carbohydrate,
    #[serde(rename = "단백질")]
    Protein,
    #[serde(rename = "지방")]
    Fat,
}

impl Nutrient {
    pub const ALL: [Nutrient; 3] = [Nutrient::Carbohydrate, Nutrient::Protein, Nutrient::Fat];

    /// The upstream label for this nutrient.
    pub fn label(&self) -> &'static str {
        match self {
            Nutrient::Carbohydrate => "탄수화물",
            Nutrient::Protein => "단백질",
            Nutrient::Fat => "지방",
        }
    }

    /// Match a trimmed annotation label against the allow-list.
    pub fn from_label(label: &str) -> Option<Nutrient> {
        Nutrient::ALL.iter().copied().find(|n| n.label() == label)
    }
}

impl fmt::Display for Nutrient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One parsed nutrient amount for one date. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutrientReading {
    pub date: NaiveDate,
    pub nutrient: Nutrient,
    /// Amount as reported (grams for the allow-listed nutrients), never negative
    pub amount: f64,
}

/// Flat per-month table of nutrient readings, ordered by date.
/// May contain duplicate (date, nutrient) pairs when a date has multiple
/// meals - those are summed before charting, never overwritten.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyTable {
    pub year: i32,
    pub month: u32,
    pub rows: Vec<NutrientReading>,
}

/// One menu card for the day view (one per meal record).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealCard {
    pub meal_name: String,
    /// Cleaned dish lines, input order preserved
    pub menu_items: Vec<String>,
    /// Bar chart entries for the day's allow-listed nutrients
    pub nutrient_bars: Vec<NutrientBar>,
}

/// One bar of the per-day nutrient bar chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutrientBar {
    pub nutrient: Nutrient,
    pub amount: f64,
}

/// Response for the single-day meal view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealDayResponse {
    pub date: NaiveDate,
    /// Human-readable date with the Korean weekday, e.g. "2024년 03월 04일(월)"
    pub date_display: String,
    pub meals: Vec<MealCard>,
    /// Informational message when the date has no meal data
    pub message: Option<String>,
}

/// One line series of the monthly trend chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendSeries {
    pub nutrient: Nutrient,
    /// One value per entry of `MonthlyTrendResponse::dates`, zero-filled
    pub values: Vec<f64>,
}

/// Response for the monthly three-nutrient trend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyTrendResponse {
    pub year: i32,
    pub month: u32,
    /// Sorted distinct dates that contributed at least one reading
    pub dates: Vec<NaiveDate>,
    pub series: Vec<TrendSeries>,
    /// Informational message when the month has no nutrition data
    pub message: Option<String>,
}

/// A downloadable CSV document (UTF-8 with BOM).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CsvExportResponse {
    pub filename: String,
    pub content: String,
}

// ---------------------------------------------------------------------------
// Air quality dashboard
// ---------------------------------------------------------------------------

/// Three-way pollutant status, plus Unknown for missing readings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PollutantStatus {
    Safe,
    Moderate,
    Danger,
    Unknown,
}

impl PollutantStatus {
    /// Display color used by the gauge rendering layer.
    pub fn color(&self) -> &'static str {
        match self {
            PollutantStatus::Safe => "green",
            PollutantStatus::Moderate => "orange",
            PollutantStatus::Danger => "red",
            PollutantStatus::Unknown => "gray",
        }
    }
}

/// One normalized sensor reading from the air-quality API.
/// Missing or unparseable numeric fields are None, never zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirReading {
    /// "YYYY-MM-DD HH:MM", hour 24:00 already normalized to next-day 00:00
    pub data_time: String,
    pub pm10: Option<f64>,
    pub pm25: Option<f64>,
    pub o3: Option<f64>,
    pub no2: Option<f64>,
    pub co: Option<f64>,
    pub so2: Option<f64>,
    /// Composite air-quality index reported alongside the pollutants
    pub khai: Option<f64>,
}

/// One per-pollutant status gauge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollutantGauge {
    pub name: String,
    pub unit: String,
    pub value: Option<f64>,
    pub status: PollutantStatus,
    pub color: String,
    /// Donut-gauge filler segment, None when the value is missing
    pub remainder: Option<f64>,
}

/// Response for the air-quality dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirDashboardResponse {
    pub station: String,
    /// Measurement time of the most recent reading
    pub latest_time: Option<String>,
    pub khai: Option<f64>,
    pub gauges: Vec<PollutantGauge>,
    /// Full normalized reading table, most recent first
    pub readings: Vec<AirReading>,
    /// Informational message when the station returned no data
    pub message: Option<String>,
}

// ---------------------------------------------------------------------------
// CSV upload dashboard
// ---------------------------------------------------------------------------

/// Inferred kind of an uploaded column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnKind {
    Numeric,
    Text,
}

/// One column of an uploaded table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadedColumn {
    pub name: String,
    pub kind: ColumnKind,
}

/// Response for an uploaded tabular file: column metadata plus a preview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadTableResponse {
    pub columns: Vec<UploadedColumn>,
    /// First rows of the table, as raw cell text
    pub preview: Vec<Vec<String>>,
    pub row_count: usize,
    /// Informational message when the upload is empty
    pub message: Option<String>,
}

/// Chart types available against user-chosen columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Scatter,
    Line,
    Bar,
    Heatmap,
}

/// Request to render one chart of an uploaded table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartRequest {
    /// The uploaded file content (no persistence - resent per request)
    pub csv_text: String,
    pub x_column: String,
    pub y_column: String,
    pub kind: ChartKind,
}

/// One (x, y) point of a scatter/line/bar chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub x: String,
    pub y: f64,
}

/// Binned density grid for the heatmap chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapGrid {
    /// Bin edges along x (len = columns + 1)
    pub x_edges: Vec<f64>,
    /// Bin edges along y (len = rows + 1)
    pub y_edges: Vec<f64>,
    /// counts[row][column], row index along y
    pub counts: Vec<Vec<u32>>,
}

/// Response for one rendered chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartResponse {
    pub kind: ChartKind,
    pub points: Vec<ChartPoint>,
    pub heatmap: Option<HeatmapGrid>,
    /// Informational message when the chart is unavailable for these columns
    pub message: Option<String>,
}
