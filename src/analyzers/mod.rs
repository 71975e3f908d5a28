pub mod period_stats;

pub use period_stats::{
    quantile_label, scenario_name, Aggregation, AnnualRow, AnnualSeries, ComparisonPeriod,
    DailyValue, PeriodStatistics, StatKey, StatRow, Statistic, StatisticsTable,
};
