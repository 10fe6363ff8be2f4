//! Meal service domain logic: the single-day view and the date-range
//! nutrition aggregation pipeline.
//!
//! The aggregator walks every real calendar day of a month, fetches that
//! day's meal records through the cached source, and parses each nutrition
//! annotation into flat (date, nutrient, amount) rows. A day that fetches
//! empty contributes zero rows - there are no placeholder rows, no retries,
//! and no partial-failure signal beyond that.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use anyhow::{anyhow, Result};
use chrono::{Datelike, NaiveDate};
use log::info;

use shared::{
    CsvExportResponse, MealCard, MealDayResponse, MonthlyTable, MonthlyTrendResponse, Nutrient,
    NutrientBar, NutrientReading, TrendSeries,
};

use crate::backend::domain::nutrition;
use crate::backend::fetch::{CachedMealSource, MealSource, Memo};

/// Korean single-character weekday labels, Monday first
const WEEKDAY_KOR: [&str; 7] = ["월", "화", "수", "목", "금", "토", "일"];

/// Meal service that handles the day view and month aggregation
pub struct MealService {
    source: CachedMealSource,
    month_cache: Memo<(i32, u32), MonthlyTable>,
}

impl MealService {
    pub fn new(source: Arc<dyn MealSource>) -> Self {
        Self {
            source: CachedMealSource::new(source),
            month_cache: Memo::new(),
        }
    }

    /// Build the single-day view: one menu card per meal record plus the
    /// day's three-nutrient bar series. An empty fetch produces the
    /// informational "no data" message, never an error.
    pub async fn day_view(&self, date: NaiveDate) -> MealDayResponse {
        let records = self.source.fetch_day(date).await;
        info!("Day view for {}: {} meal records", date, records.len());

        if records.is_empty() {
            return MealDayResponse {
                date,
                date_display: format_date_display(date),
                meals: Vec::new(),
                message: Some("해당 날짜에는 급식 정보가 없습니다. (방학·공휴일 등)".to_string()),
            };
        }

        let meals = records
            .into_iter()
            .map(|record| {
                let nutrient_bars = record
                    .nutrition_annotation
                    .as_deref()
                    .map(nutrition::parse_nutrition)
                    .unwrap_or_default()
                    .into_iter()
                    .map(|(nutrient, amount)| NutrientBar { nutrient, amount })
                    .collect();

                MealCard {
                    meal_name: record.meal_name,
                    menu_items: nutrition::format_dish_lines(&record.dish_listing),
                    nutrient_bars,
                }
            })
            .collect();

        MealDayResponse {
            date,
            date_display: format_date_display(date),
            meals,
            message: None,
        }
    }

    /// Aggregate one month into a flat table of nutrient readings.
    ///
    /// Every real calendar day is fetched once (through the per-date cache);
    /// records without an annotation are skipped. The result is memoized by
    /// (year, month) for the process lifetime.
    pub async fn aggregate_month(&self, year: i32, month: u32) -> Result<MonthlyTable> {
        if let Some(cached) = self.month_cache.get(&(year, month)) {
            return Ok(cached);
        }

        let last_day = days_in_month(year, month)
            .ok_or_else(|| anyhow!("invalid month: {}-{}", year, month))?;

        let mut rows = Vec::new();
        for day in 1..=last_day {
            // Day numbers come from the actual calendar, so this cannot fail
            let Some(date) = NaiveDate::from_ymd_opt(year, month, day) else {
                continue;
            };

            let records = self.source.fetch_day(date).await;
            for record in records {
                let Some(annotation) = record.nutrition_annotation.as_deref() else {
                    continue;
                };
                for (nutrient, amount) in nutrition::parse_nutrition(annotation) {
                    rows.push(NutrientReading {
                        date,
                        nutrient,
                        amount,
                    });
                }
            }
        }

        info!(
            "Aggregated {}-{:02}: {} nutrient readings",
            year,
            month,
            rows.len()
        );

        let table = MonthlyTable { year, month, rows };
        self.month_cache.put((year, month), table.clone());
        Ok(table)
    }

    /// Pivot a monthly table into per-nutrient line series.
    ///
    /// Duplicate (date, nutrient) readings - e.g. breakfast and lunch both
    /// reporting protein - are summed into a single point. Dates where a
    /// nutrient is absent after summing are zero-filled.
    pub fn monthly_trend(&self, table: &MonthlyTable) -> MonthlyTrendResponse {
        if table.rows.is_empty() {
            return MonthlyTrendResponse {
                year: table.year,
                month: table.month,
                dates: Vec::new(),
                series: Vec::new(),
                message: Some("선택 달에 영양 정보가 없습니다.".to_string()),
            };
        }

        let mut summed: BTreeMap<(NaiveDate, Nutrient), f64> = BTreeMap::new();
        let mut dates: BTreeSet<NaiveDate> = BTreeSet::new();
        for row in &table.rows {
            *summed.entry((row.date, row.nutrient)).or_insert(0.0) += row.amount;
            dates.insert(row.date);
        }
        let dates: Vec<NaiveDate> = dates.into_iter().collect();

        let series = Nutrient::ALL
            .iter()
            .copied()
            .filter(|nutrient| summed.keys().any(|(_, n)| n == nutrient))
            .map(|nutrient| TrendSeries {
                nutrient,
                values: dates
                    .iter()
                    .map(|date| summed.get(&(*date, nutrient)).copied().unwrap_or(0.0))
                    .collect(),
            })
            .collect();

        MonthlyTrendResponse {
            year: table.year,
            month: table.month,
            dates,
            series,
            message: None,
        }
    }

    /// Export the raw table rows as UTF-8 CSV with a byte-order mark, one
    /// row per reading (pre-summing).
    pub fn export_csv(&self, table: &MonthlyTable) -> CsvExportResponse {
        let mut content = String::from("\u{feff}");
        content.push_str("날짜,영양소,함량\n");
        for row in &table.rows {
            content.push_str(&format!(
                "{},{},{}\n",
                row.date.format("%Y-%m-%d"),
                row.nutrient.label(),
                row.amount
            ));
        }

        CsvExportResponse {
            filename: format!("삼일고_3대영양소_{}_{:02}.csv", table.year, table.month),
            content,
        }
    }
}

/// Number of days in the given month, None for an invalid month
pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
    NaiveDate::from_ymd_opt(year, month, 1)?;
    let next_month = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some(next_month.pred_opt()?.day())
}

/// "2024년 03월 04일(월)" style display string
fn format_date_display(date: NaiveDate) -> String {
    let weekday = WEEKDAY_KOR[date.weekday().num_days_from_monday() as usize];
    format!("{}({})", date.format("%Y년 %m월 %d일"), weekday)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use shared::DailyMealRecord;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Stub source returning canned records and counting upstream calls
    struct StubSource {
        days: HashMap<NaiveDate, Vec<DailyMealRecord>>,
        calls: AtomicUsize,
    }

    impl StubSource {
        fn new(days: HashMap<NaiveDate, Vec<DailyMealRecord>>) -> Self {
            Self {
                days,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl MealSource for StubSource {
        async fn fetch_day(&self, date: NaiveDate) -> Vec<DailyMealRecord> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.days.get(&date).cloned().unwrap_or_default()
        }
    }

    fn record(date: NaiveDate, meal: &str, annotation: Option<&str>) -> DailyMealRecord {
        DailyMealRecord {
            date,
            meal_name: meal.to_string(),
            dish_listing: "쌀밥<br/>미역국".to_string(),
            nutrition_annotation: annotation.map(str::to_string),
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn days_in_month_handles_length_and_leap_years() {
        assert_eq!(days_in_month(2024, 2), Some(29)); // leap year
        assert_eq!(days_in_month(2023, 2), Some(28));
        assert_eq!(days_in_month(2024, 12), Some(31));
        assert_eq!(days_in_month(2024, 4), Some(30));
        assert_eq!(days_in_month(2024, 13), None);
    }

    #[tokio::test]
    async fn aggregates_only_days_with_data() {
        let mut days = HashMap::new();
        days.insert(
            date(2024, 3, 4),
            vec![record(date(2024, 3, 4), "중식", Some("탄수화물(g): 120.5<br/>단백질(g): 15"))],
        );
        days.insert(
            date(2024, 3, 5),
            vec![record(date(2024, 3, 5), "중식", Some("지방(g): 5.2"))],
        );
        let service = MealService::new(Arc::new(StubSource::new(days)));

        let table = service.aggregate_month(2024, 3).await.unwrap();

        // 31 calendar days, rows only for the 2 days with data
        assert_eq!(table.rows.len(), 3);
        let dates: BTreeSet<NaiveDate> = table.rows.iter().map(|r| r.date).collect();
        assert_eq!(dates, BTreeSet::from([date(2024, 3, 4), date(2024, 3, 5)]));
    }

    #[tokio::test]
    async fn records_without_annotation_are_skipped() {
        let mut days = HashMap::new();
        days.insert(
            date(2024, 3, 4),
            vec![
                record(date(2024, 3, 4), "조식", None),
                record(date(2024, 3, 4), "중식", Some("단백질(g): 20")),
            ],
        );
        let service = MealService::new(Arc::new(StubSource::new(days)));

        let table = service.aggregate_month(2024, 3).await.unwrap();
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0].nutrient, Nutrient::Protein);
    }

    #[tokio::test]
    async fn month_aggregation_is_memoized() {
        let source = Arc::new(StubSource::new(HashMap::new()));
        let service = MealService::new(source.clone());

        service.aggregate_month(2024, 4).await.unwrap();
        let calls_after_first = source.calls.load(Ordering::SeqCst);
        assert_eq!(calls_after_first, 30);

        service.aggregate_month(2024, 4).await.unwrap();
        assert_eq!(source.calls.load(Ordering::SeqCst), calls_after_first);
    }

    #[tokio::test]
    async fn trend_sums_duplicate_date_nutrient_pairs() {
        let mut days = HashMap::new();
        days.insert(
            date(2024, 3, 4),
            vec![
                record(date(2024, 3, 4), "조식", Some("단백질(g): 10")),
                record(date(2024, 3, 4), "중식", Some("단백질(g): 25<br/>지방(g): 8")),
            ],
        );
        days.insert(
            date(2024, 3, 6),
            vec![record(date(2024, 3, 6), "중식", Some("단백질(g): 18"))],
        );
        let service = MealService::new(Arc::new(StubSource::new(days)));

        let table = service.aggregate_month(2024, 3).await.unwrap();
        let trend = service.monthly_trend(&table);

        assert_eq!(trend.dates, vec![date(2024, 3, 4), date(2024, 3, 6)]);
        assert!(trend.message.is_none());

        let protein = trend
            .series
            .iter()
            .find(|s| s.nutrient == Nutrient::Protein)
            .unwrap();
        assert_eq!(protein.values, vec![35.0, 18.0]); // breakfast + lunch summed

        // Fat appears only on the 4th; the 6th is zero-filled
        let fat = trend
            .series
            .iter()
            .find(|s| s.nutrient == Nutrient::Fat)
            .unwrap();
        assert_eq!(fat.values, vec![8.0, 0.0]);

        // Carbohydrate never appeared, so it has no series
        assert!(trend
            .series
            .iter()
            .all(|s| s.nutrient != Nutrient::Carbohydrate));
    }

    #[tokio::test]
    async fn empty_month_produces_informational_message() {
        let service = MealService::new(Arc::new(StubSource::new(HashMap::new())));
        let table = service.aggregate_month(2024, 3).await.unwrap();
        let trend = service.monthly_trend(&table);
        assert!(trend.dates.is_empty());
        assert!(trend.message.is_some());
    }

    #[tokio::test]
    async fn day_view_reports_no_data_as_message() {
        let service = MealService::new(Arc::new(StubSource::new(HashMap::new())));
        let view = service.day_view(date(2024, 3, 4)).await;
        assert!(view.meals.is_empty());
        assert!(view.message.is_some());
        assert_eq!(view.date_display, "2024년 03월 04일(월)");
    }

    #[tokio::test]
    async fn day_view_builds_cards_and_bars() {
        let mut days = HashMap::new();
        days.insert(
            date(2024, 3, 4),
            vec![record(
                date(2024, 3, 4),
                "중식",
                Some("탄수화물(g): 120.5<br/>단백질(g): 15<br/>지방: 5.2"),
            )],
        );
        let service = MealService::new(Arc::new(StubSource::new(days)));

        let view = service.day_view(date(2024, 3, 4)).await;
        assert_eq!(view.meals.len(), 1);
        assert_eq!(view.meals[0].menu_items, vec!["쌀밥", "미역국"]);
        assert_eq!(
            view.meals[0].nutrient_bars,
            vec![
                NutrientBar {
                    nutrient: Nutrient::Carbohydrate,
                    amount: 120.5
                },
                NutrientBar {
                    nutrient: Nutrient::Protein,
                    amount: 15.0
                },
                NutrientBar {
                    nutrient: Nutrient::Fat,
                    amount: 5.2
                },
            ]
        );
    }

    #[test]
    fn csv_export_round_trips_and_carries_bom() {
        let table = MonthlyTable {
            year: 2024,
            month: 3,
            rows: vec![
                NutrientReading {
                    date: date(2024, 3, 4),
                    nutrient: Nutrient::Carbohydrate,
                    amount: 120.5,
                },
                NutrientReading {
                    date: date(2024, 3, 4),
                    nutrient: Nutrient::Protein,
                    amount: 15.0,
                },
                NutrientReading {
                    date: date(2024, 3, 6),
                    nutrient: Nutrient::Fat,
                    amount: 5.2,
                },
            ],
        };
        let service = MealService::new(Arc::new(StubSource::new(HashMap::new())));

        let export = service.export_csv(&table);
        assert_eq!(export.filename, "삼일고_3대영양소_2024_03.csv");
        assert!(export.content.starts_with('\u{feff}'));

        // Re-parse and compare order-insensitively
        let stripped = export.content.trim_start_matches('\u{feff}');
        let mut reader = csv::Reader::from_reader(stripped.as_bytes());
        let mut parsed: Vec<NutrientReading> = reader
            .records()
            .map(|r| {
                let r = r.unwrap();
                NutrientReading {
                    date: r[0].parse().unwrap(),
                    nutrient: Nutrient::from_label(&r[1]).unwrap(),
                    amount: r[2].parse().unwrap(),
                }
            })
            .collect();
        parsed.sort_by(|a, b| (a.date, a.nutrient).cmp(&(b.date, b.nutrient)));

        let mut expected = table.rows.clone();
        expected.sort_by(|a, b| (a.date, a.nutrient).cmp(&(b.date, b.nutrient)));
        assert_eq!(parsed, expected);
    }
}
