//! Period statistics for the reporting figures
//!
//! Daily series are reduced to one value per year (or per month of each
//! year) and then summarised across the years of each comparison period.
//! The resulting table is keyed by (scenario, variable, statistic, period,
//! month) and has the same columns whether or not a quantile was requested.
//! An annual series per scenario can be collected alongside it.

use crate::error::{ProcessingError, Result};
use crate::models::QuantityKind;
use crate::processors::UnitConverter;
use crate::readers::SourceFile;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Inclusive span of years compared in the report figures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ComparisonPeriod {
    pub start_year: i32,
    pub end_year: i32,
}

impl ComparisonPeriod {
    pub fn new(start_year: i32, end_year: i32) -> Result<Self> {
        if start_year > end_year {
            return Err(ProcessingError::Config(format!(
                "Period start {} is after end {}",
                start_year, end_year
            )));
        }
        Ok(Self {
            start_year,
            end_year,
        })
    }

    pub fn contains(&self, year: i32) -> bool {
        (self.start_year..=self.end_year).contains(&year)
    }
}

impl FromStr for ComparisonPeriod {
    type Err = ProcessingError;

    fn from_str(s: &str) -> Result<Self> {
        let (start, end) = s
            .trim()
            .split_once('-')
            .ok_or_else(|| ProcessingError::Config(format!("Invalid period '{}', expected YYYY-YYYY", s)))?;
        let parse = |year: &str| {
            year.trim()
                .parse::<i32>()
                .map_err(|_| ProcessingError::Config(format!("Invalid year '{}' in period '{}'", year, s)))
        };
        Self::new(parse(start)?, parse(end)?)
    }
}

impl fmt::Display for ComparisonPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start_year, self.end_year)
    }
}

/// How daily values are combined within a year or month ("calc").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    #[default]
    Mean,
    Sum,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Statistic {
    #[default]
    Annual,
    Monthly,
}

impl Statistic {
    pub fn name(&self) -> &'static str {
        match self {
            Statistic::Annual => "mean_annual",
            Statistic::Monthly => "mean_monthly",
        }
    }
}

/// Label used in place of the statistic name for a quantile, e.g. 0.1 -> `Q90`.
pub fn quantile_label(quantile: f64) -> String {
    format!("Q{:.0}0", 10.0 * (1.0 - quantile))
}

/// Scenario part of a GDP download name: the stem with the variable token
/// removed, so `gcm1_a2_tmax` and `gcm1_a2_prcp` share the scenario `gcm1_a2`.
pub fn scenario_name(stem: &str, quantity: QuantityKind) -> String {
    let is_variable = |token: &str| {
        token.eq_ignore_ascii_case(quantity.prms_name())
            || token.eq_ignore_ascii_case(quantity.descriptive_name())
    };
    let kept: Vec<&str> = stem.split('_').filter(|token| !is_variable(token)).collect();

    if kept.is_empty() {
        stem.to_string()
    } else {
        kept.join("_")
    }
}

/// One spatially averaged daily value: `(year, month, value)`.
pub type DailyValue = (i32, u32, f64);

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct StatKey {
    pub scenario: String,
    pub variable: String,
    pub statistic: String,
    pub period: String,
    pub month: Option<u32>,
}

/// One row of the statistics table as handed to the reporting side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatRow {
    pub scenario: String,
    pub variable: String,
    pub statistic: String,
    pub period: String,
    pub month: Option<u32>,
    pub value: f64,
    pub years: usize,
}

#[derive(Debug, Clone, Default)]
pub struct StatisticsTable {
    rows: BTreeMap<StatKey, (f64, usize)>,
}

impl StatisticsTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: StatKey, value: f64, years: usize) {
        self.rows.insert(key, (value, years));
    }

    pub fn get(
        &self,
        scenario: &str,
        variable: &str,
        statistic: &str,
        period: &str,
        month: Option<u32>,
    ) -> Option<f64> {
        let key = StatKey {
            scenario: scenario.to_string(),
            variable: variable.to_string(),
            statistic: statistic.to_string(),
            period: period.to_string(),
            month,
        };
        self.rows.get(&key).map(|(value, _)| *value)
    }

    /// Every scenario's value for one (variable, statistic, period, month),
    /// in scenario order. This is one box of a comparison figure.
    pub fn by_scenario(
        &self,
        variable: &str,
        statistic: &str,
        period: &str,
        month: Option<u32>,
    ) -> Vec<(String, f64)> {
        self.rows
            .iter()
            .filter(|(key, _)| {
                key.variable == variable
                    && key.statistic == statistic
                    && key.period == period
                    && key.month == month
            })
            .map(|(key, (value, _))| (key.scenario.clone(), *value))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = StatRow> + '_ {
        self.rows.iter().map(|(key, (value, years))| StatRow {
            scenario: key.scenario.clone(),
            variable: key.variable.clone(),
            statistic: key.statistic.clone(),
            period: key.period.clone(),
            month: key.month,
            value: *value,
            years: *years,
        })
    }

    pub fn write_csv(&self, path: &Path) -> Result<()> {
        write_rows(path, self.rows())
    }
}

/// One year of a scenario's annual series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnualRow {
    pub scenario: String,
    pub variable: String,
    pub year: i32,
    pub value: f64,
    pub days: usize,
}

/// Year-by-year values per scenario, with spin-up years already dropped.
#[derive(Debug, Clone, Default)]
pub struct AnnualSeries {
    rows: BTreeMap<(String, String, i32), (f64, usize)>,
}

impl AnnualSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, scenario: &str, variable: &str, year: i32) -> Option<f64> {
        self.rows
            .get(&(scenario.to_string(), variable.to_string(), year))
            .map(|(value, _)| *value)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = AnnualRow> + '_ {
        self.rows
            .iter()
            .map(|((scenario, variable, year), (value, days))| AnnualRow {
                scenario: scenario.clone(),
                variable: variable.clone(),
                year: *year,
                value: *value,
                days: *days,
            })
    }

    pub fn write_csv(&self, path: &Path) -> Result<()> {
        write_rows(path, self.rows())
    }
}

fn write_rows<T: Serialize>(path: &Path, rows: impl Iterator<Item = T>) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

pub struct PeriodStatistics {
    periods: Vec<ComparisonPeriod>,
    baseline: Option<ComparisonPeriod>,
    statistic: Statistic,
    aggregation: Aggregation,
    quantile: Option<f64>,
    spinup_years: u32,
    converter: UnitConverter,
}

impl PeriodStatistics {
    pub fn new(periods: Vec<ComparisonPeriod>) -> Self {
        Self {
            periods,
            baseline: None,
            statistic: Statistic::default(),
            aggregation: Aggregation::default(),
            quantile: None,
            spinup_years: 0,
            converter: UnitConverter::new(),
        }
    }

    pub fn with_baseline(mut self, baseline: Option<ComparisonPeriod>) -> Self {
        self.baseline = baseline;
        self
    }

    pub fn with_statistic(mut self, statistic: Statistic) -> Self {
        self.statistic = statistic;
        self
    }

    pub fn with_aggregation(mut self, aggregation: Aggregation) -> Self {
        self.aggregation = aggregation;
        self
    }

    pub fn with_quantile(mut self, quantile: Option<f64>) -> Result<Self> {
        if let Some(q) = quantile {
            if !(q > 0.0 && q < 1.0) {
                return Err(ProcessingError::Config(format!(
                    "Quantile must be between 0 and 1, got {}",
                    q
                )));
            }
        }
        self.quantile = quantile;
        Ok(self)
    }

    /// Leading years of each annual series to drop while the model spins up.
    pub fn with_spinup(mut self, years: u32) -> Self {
        self.spinup_years = years;
        self
    }

    /// Statistic column value: the statistic name, or the quantile label.
    pub fn statistic_label(&self) -> String {
        match self.quantile {
            Some(q) => quantile_label(q),
            None => self.statistic.name().to_string(),
        }
    }

    /// Spatial mean of each row of `source`, in model units.
    pub fn daily_series(&self, source: &SourceFile, quantity: QuantityKind) -> Result<Vec<DailyValue>> {
        let mut daily = Vec::new();
        for record in source.records() {
            let record = record?;
            let converted: Vec<f64> = record
                .values
                .iter()
                .map(|&v| self.converter.convert(quantity, v))
                .collect();
            if let Some(mean) = spatial_mean(&converted) {
                daily.push((record.timestamp.year, record.timestamp.month, mean));
            }
        }
        Ok(daily)
    }

    /// Add the rows of one source file, keyed by its scenario and the
    /// quantity's PRMS name.
    pub fn add_source(
        &self,
        table: &mut StatisticsTable,
        source: &SourceFile,
        quantity: QuantityKind,
    ) -> Result<()> {
        let daily = self.daily_series(source, quantity)?;
        let scenario = scenario_name(source.stem(), quantity);
        self.add_series(table, &scenario, quantity.prms_name(), &daily);
        Ok(())
    }

    /// Add period rows for a daily series.
    pub fn add_series(
        &self,
        table: &mut StatisticsTable,
        scenario: &str,
        variable: &str,
        daily: &[DailyValue],
    ) {
        let mut buckets: BTreeMap<(i32, u32), Vec<f64>> = BTreeMap::new();
        for &(year, month, value) in daily {
            let month_key = match self.statistic {
                Statistic::Annual => 0,
                Statistic::Monthly => month,
            };
            buckets.entry((year, month_key)).or_default().push(value);
        }

        let aggregated: BTreeMap<(i32, u32), f64> = buckets
            .into_iter()
            .map(|(key, values)| (key, self.aggregate(&values)))
            .collect();

        let statistic = self.statistic_label();
        let labelled = self
            .periods
            .iter()
            .map(|p| (*p, p.to_string()))
            .chain(self.baseline.map(|b| (b, format!("baseline ({})", b))));

        for (period, label) in labelled {
            let months: Vec<Option<u32>> = match self.statistic {
                Statistic::Annual => vec![None],
                Statistic::Monthly => (1..=12).map(Some).collect(),
            };

            for month in months {
                let values: Vec<f64> = aggregated
                    .iter()
                    .filter(|((year, m), _)| period.contains(*year) && *m == month.unwrap_or(0))
                    .map(|(_, value)| *value)
                    .collect();

                if let Some(value) = self.reduce(&values) {
                    table.insert(
                        StatKey {
                            scenario: scenario.to_string(),
                            variable: variable.to_string(),
                            statistic: statistic.clone(),
                            period: label.clone(),
                            month,
                        },
                        value,
                        values.len(),
                    );
                }
            }
        }
    }

    /// Add one value per year (daily values combined with the configured
    /// aggregation), skipping the first `spinup` years of the series.
    pub fn add_annual(
        &self,
        series: &mut AnnualSeries,
        scenario: &str,
        variable: &str,
        daily: &[DailyValue],
    ) {
        let mut years: BTreeMap<i32, Vec<f64>> = BTreeMap::new();
        for &(year, _, value) in daily {
            years.entry(year).or_default().push(value);
        }

        let first_kept = match years.keys().next() {
            Some(&first) => first.saturating_add_unsigned(self.spinup_years),
            None => return,
        };

        for (year, values) in years.range(first_kept..) {
            series.rows.insert(
                (scenario.to_string(), variable.to_string(), *year),
                (self.aggregate(values), values.len()),
            );
        }
    }

    fn aggregate(&self, values: &[f64]) -> f64 {
        let sum: f64 = values.iter().sum();
        match self.aggregation {
            Aggregation::Sum => sum,
            Aggregation::Mean => sum / values.len() as f64,
        }
    }

    fn reduce(&self, values: &[f64]) -> Option<f64> {
        if values.is_empty() {
            return None;
        }
        match self.quantile {
            Some(q) => Some(quantile(values, q)),
            None => Some(values.iter().sum::<f64>() / values.len() as f64),
        }
    }
}

fn spatial_mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Linear-interpolated quantile of a non-empty slice.
fn quantile(values: &[f64], q: f64) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    sorted[lower] + (sorted[upper] - sorted[lower]) * (position - lower as f64)
}
