use cbh_processor::analyzers::{
    scenario_name, Aggregation, AnnualSeries, ComparisonPeriod, PeriodStatistics, StatisticsTable,
};
use cbh_processor::config::UnrecognizedPolicy;
use cbh_processor::models::{LabelStyle, QuantityKind};
use cbh_processor::processors::{BatchProcessor, FailureKind, HeaderClassifier, Transcoder};
use cbh_processor::readers::SourceDiscovery;
use pretty_assertions::assert_eq;
use std::path::Path;
use tempfile::TempDir;

fn write(dir: &Path, name: &str, body: &str) {
    std::fs::write(dir.join(name), body).expect("Failed to write source file");
}

#[tokio::test]
async fn test_end_to_end_tmax_scenario() {
    let input = TempDir::new().expect("Failed to create temp directory");
    let output = TempDir::new().expect("Failed to create temp directory");
    write(
        input.path(),
        "wicci_tmax_scenarioA.csv",
        "# wicci_tmax_scenarioA\nTIMESTEP,1\nTIMESTEP,MEAN(C)\n2050-01-01T00:00:00Z,10.0\n",
    );

    let files = SourceDiscovery::new(input.path()).discover().await.unwrap();
    let report = BatchProcessor::new(Transcoder::new(output.path(), "cbh-processor"))
        .process_files(&files, None)
        .unwrap();

    assert!(report.is_clean());
    let bytes = std::fs::read(output.path().join("wicci_tmax_scenarioA.prms")).unwrap();
    assert_eq!(
        String::from_utf8(bytes).unwrap(),
        "created by cbh-processor\r\n\
         maximum-temperature      1\r\n\
         ########################################\r\n\
         2050 1 1 0 0 0 50.0000\r\n"
    );
}

#[tokio::test]
async fn test_directory_conversion_with_prms_labels() {
    let input = TempDir::new().expect("Failed to create temp directory");
    let output = TempDir::new().expect("Failed to create temp directory");

    write(
        input.path(),
        "gcm1_a2_prcp.csv",
        "# gcm1\nTIMESTEP,1,2\nTIMESTEP,MEAN(mm),MEAN(mm)\n\
         2046-01-01T00:00:00Z,0.0,12.7\n\
         2046-01-02T00:00:00Z,0.00004,25.4\n\
         2046-01-03T00:00:00Z,5.08,0.0001\n",
    );
    write(
        input.path(),
        "gcm1_a2_tmin.csv",
        "# gcm1\nTIMESTEP,1,2\nTIMESTEP,MEAN(C),MEAN(C)\n\
         2046-01-01T00:00:00Z,-40.0,0.0\n",
    );
    write(
        input.path(),
        "gcm1_a2_rh.csv",
        "# gcm1\nTIMESTEP,1\nTIMESTEP,MEAN(%)\n2046-01-01T00:00:00Z,55\n",
    );
    write(input.path(), "readme.txt", "not a source file");

    let files = SourceDiscovery::new(input.path()).discover().await.unwrap();
    assert_eq!(files.len(), 3);

    let transcoder = Transcoder::new(output.path(), "pyGDP_to_cbh.py").with_labels(LabelStyle::Prms);
    let report = BatchProcessor::new(transcoder)
        .process_files(&files, None)
        .unwrap();

    assert_eq!(report.converted.len(), 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].kind, FailureKind::Classification);
    assert!(report.failures[0].message.contains("gcm1_a2_rh.csv"));

    let prcp = std::fs::read_to_string(output.path().join("gcm1_a2_prcp.prms")).unwrap();
    let lines: Vec<&str> = prcp.split_terminator("\r\n").collect();
    assert_eq!(
        lines,
        vec![
            "created by pyGDP_to_cbh.py",
            "prcp      2",
            "########################################",
            "2046 1 1 0 0 0 0.0000 0.5000",
            "2046 1 2 0 0 0 0.0000 1.0000",
            "2046 1 3 0 0 0 0.2000 0.0000",
        ]
    );
    assert!(!prcp.replace("\r\n", "").contains('\n'));

    let tmin = std::fs::read_to_string(output.path().join("gcm1_a2_tmin.prms")).unwrap();
    assert!(tmin.contains("tmin      2\r\n"));
    assert!(tmin.ends_with("2046 1 1 0 0 0 -40.0000 32.0000\r\n"));
}

#[test]
fn test_row_count_matches_input() {
    let input = TempDir::new().expect("Failed to create temp directory");
    let output = TempDir::new().expect("Failed to create temp directory");

    let mut body = String::from("x\ny\nTIMESTEP,MEAN(C),MEAN(C),MEAN(C)\n");
    for day in 1..=28 {
        body.push_str(&format!("2060-02-{:02}T00:00:00Z,{}.5,1,-2\n", day, day));
    }
    write(input.path(), "tmax_2060.csv", &body);

    let summary = Transcoder::new(output.path(), "t")
        .transcode(&input.path().join("tmax_2060.csv"))
        .unwrap();

    assert_eq!(summary.rows, 28);
    let text = std::fs::read_to_string(&summary.output).unwrap();
    assert_eq!(text.split_terminator("\r\n").count(), 3 + 28);
    for line in text.split_terminator("\r\n").skip(3) {
        assert_eq!(line.split(' ').count(), 6 + 3);
    }
}

#[test]
fn test_malformed_timestamp_aborts_file() {
    let input = TempDir::new().expect("Failed to create temp directory");
    let output = TempDir::new().expect("Failed to create temp directory");
    write(
        input.path(),
        "wicci_tmax_bad.csv",
        "x\ny\nTIMESTEP,MEAN(C)\n2050-01-01T00:00:00Z,1\n2050-01-02 00:00:00Z,2\n",
    );
    write(
        input.path(),
        "wicci_tmax_good.csv",
        "x\ny\nTIMESTEP,MEAN(C)\n2050-01-01T00:00:00Z,1\n",
    );

    let files = vec![
        input.path().join("wicci_tmax_bad.csv"),
        input.path().join("wicci_tmax_good.csv"),
    ];
    let report = BatchProcessor::new(Transcoder::new(output.path(), "t"))
        .with_unrecognized_policy(UnrecognizedPolicy::Abort)
        .process_files(&files, None)
        .unwrap();

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].kind, FailureKind::Format);
    assert!(report.failures[0].message.starts_with("wicci_tmax_bad.csv: "));
    assert!(!output.path().join("wicci_tmax_bad.prms").exists());
    assert!(output.path().join("wicci_tmax_good.prms").exists());
}

#[test]
fn test_statistics_table_csv() {
    let input = TempDir::new().expect("Failed to create temp directory");
    write(
        input.path(),
        "gcm1_a2_prcp.csv",
        "x\ny\nTIMESTEP,MEAN(mm)\n\
         2046-01-01T00:00:00Z,25.4\n\
         2046-06-01T00:00:00Z,25.4\n\
         2047-01-01T00:00:00Z,50.8\n\
         2047-06-01T00:00:00Z,50.8\n",
    );
    write(
        input.path(),
        "gcm1_b1_prcp.csv",
        "x\ny\nTIMESTEP,MEAN(mm)\n\
         2046-01-01T00:00:00Z,101.6\n\
         2047-01-01T00:00:00Z,101.6\n",
    );

    let transcoder = Transcoder::new(input.path().join("unused"), "t");
    let stats = PeriodStatistics::new(vec![ComparisonPeriod::new(2046, 2047).unwrap()])
        .with_aggregation(Aggregation::Sum)
        .with_spinup(1);
    let mut table = StatisticsTable::new();
    let mut series = AnnualSeries::new();

    for name in ["gcm1_a2_prcp.csv", "gcm1_b1_prcp.csv"] {
        let (source, quantity) = transcoder.classify(&input.path().join(name)).unwrap();
        stats.add_source(&mut table, &source, quantity).unwrap();

        let daily = stats.daily_series(&source, quantity).unwrap();
        let scenario = scenario_name(source.stem(), quantity);
        stats.add_annual(&mut series, &scenario, quantity.prms_name(), &daily);
    }

    // gcm1_a2 annual totals 2 in and 4 in
    assert_eq!(table.get("gcm1_a2", "prcp", "mean_annual", "2046-2047", None), Some(3.0));
    assert_eq!(
        table.by_scenario("prcp", "mean_annual", "2046-2047", None),
        vec![("gcm1_a2".to_string(), 3.0), ("gcm1_b1".to_string(), 4.0)]
    );

    let out = input.path().join("stats/table.csv");
    table.write_csv(&out).unwrap();
    assert_eq!(
        std::fs::read_to_string(&out).unwrap(),
        "scenario,variable,statistic,period,month,value,years\n\
         gcm1_a2,prcp,mean_annual,2046-2047,,3.0,2\n\
         gcm1_b1,prcp,mean_annual,2046-2047,,4.0,2\n"
    );

    // 2046 is spin-up
    let out = input.path().join("stats/annual.csv");
    series.write_csv(&out).unwrap();
    assert_eq!(
        std::fs::read_to_string(&out).unwrap(),
        "scenario,variable,year,value,days\n\
         gcm1_a2,prcp,2047,4.0,2\n\
         gcm1_b1,prcp,2047,4.0,1\n"
    );
}

#[test]
fn test_extended_classifier() {
    let input = TempDir::new().expect("Failed to create temp directory");
    let output = TempDir::new().expect("Failed to create temp directory");
    write(
        input.path(),
        "station_tavg_hi.csv",
        "x\ny\nTIMESTEP,MEAN(C)\n2050-01-01T00:00:00Z,0.0\n",
    );
    let path = input.path().join("station_tavg_hi.csv");

    let default = Transcoder::new(output.path(), "t");
    assert!(default.transcode(&path).unwrap_err().is_classification());

    let classifier =
        HeaderClassifier::default().with_file_name_rule("_hi", QuantityKind::MaximumTemperature);
    let summary = Transcoder::new(output.path(), "t")
        .with_classifier(classifier)
        .transcode(&path)
        .unwrap();

    assert_eq!(summary.quantity, QuantityKind::MaximumTemperature);
    let text = std::fs::read_to_string(&summary.output).unwrap();
    assert!(text.ends_with("2050 1 1 0 0 0 32.0000\r\n"));
}
