use chrono::{NaiveDate, NaiveDateTime};
use std::fs;
use std::path::Path;
use wkn_charts::{ChartError, Config, FixedPathProvider, RunOutcome, RunService, RunSummary, StyleConfig};

const TABLE: &str = "\
WKN;WP_Bollinger_Baender.Datum;Schlusskurs;Mean_20;Bollinger_upper;Bollinger_lower;Unterstuetzungspunkte;Volumen
840400;02.01.2024;100,5;99,0;104,0;94,0;;1200
840400;03.01.2024;101,0;99,5;104,5;94,5;95,0;1500
840400;04.01.2024;99,0;99,6;104,2;95,0;;900
A0B1C2;02.01.2024;12,0;11,5;13,0;10,0;;50000
A0B1C2;03.01.2024;n/a;11,6;13,1;10,1;;40000
";

fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 5, 17).unwrap().and_hms_opt(h, m, s).unwrap()
}

fn write_table(dir: &Path, content: &str) -> std::path::PathBuf {
    let path = dir.join("input.csv");
    fs::write(&path, content).unwrap();
    path
}

fn completed(outcome: RunOutcome) -> RunSummary {
    match outcome {
        RunOutcome::Completed(summary) => summary,
        RunOutcome::Aborted => panic!("run should not abort"),
    }
}

fn png_count(dir: &Path) -> usize {
    fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().map(|x| x == "png").unwrap_or(false))
        .count()
}

#[test]
fn declining_file_selection_writes_nothing() {
    let scratch = tempfile::tempdir().unwrap();
    let config = Config::new().with_output_root(scratch.path());
    let service = RunService::new(config, StyleConfig::default(), Box::new(FixedPathProvider::cancelled()));

    let outcome = service.run_at(at(9, 0, 0)).unwrap();
    assert!(matches!(outcome, RunOutcome::Aborted));
    assert_eq!(fs::read_dir(scratch.path()).unwrap().count(), 0);
}

#[test]
fn missing_date_column_creates_no_output_directory() {
    let scratch = tempfile::tempdir().unwrap();
    let input = write_table(scratch.path(), "WKN;Datum;Schlusskurs\n840400;02.01.2024;100,5\n");
    let chosen = scratch.path().join("chosen");

    let config = Config::new().with_output_root(scratch.path());
    let paths = FixedPathProvider::new(&input).with_output_dir(&chosen);
    let service = RunService::new(config, StyleConfig::default(), Box::new(paths));

    match service.run_at(at(9, 0, 0)) {
        Err(ChartError::MissingColumn(column)) => assert_eq!(column, "WP_Bollinger_Baender.Datum"),
        other => panic!("expected MissingColumn, got {:?}", other),
    }
    assert!(!chosen.exists());

    let entries: Vec<_> = fs::read_dir(scratch.path()).unwrap().filter_map(|e| e.ok()).collect();
    assert_eq!(entries.len(), 1, "only the input file should exist");
}

#[test]
fn default_output_directory_is_named_after_run_date() {
    let scratch = tempfile::tempdir().unwrap();
    let input = write_table(scratch.path(), TABLE);
    let config = Config::new().with_output_root(scratch.path());
    let service = RunService::new(config, StyleConfig::default(), Box::new(FixedPathProvider::new(&input)));

    let dir = service.resolve_output_dir(at(9, 0, 0).date()).unwrap();
    assert_eq!(dir, scratch.path().join("charts_2024-05-17"));
    assert!(dir.is_dir());
}

#[test]
fn renders_one_png_per_entity_and_keeps_earlier_runs() {
    let scratch = tempfile::tempdir().unwrap();
    let input = write_table(scratch.path(), TABLE);
    let out = scratch.path().join("charts");

    let config = Config::new().with_output_root(scratch.path()).with_size(800, 500);
    let paths = FixedPathProvider::new(&input).with_output_dir(&out);
    let service = RunService::new(config, StyleConfig::default(), Box::new(paths));

    let first = completed(service.run_at(at(9, 0, 0)).unwrap());
    assert!(first.is_success(), "{:?}", first.failed);
    assert_eq!(first.written.len(), 2);
    assert!(out.join("840400_04012024_2024-05-17_090000.png").is_file());
    assert!(out.join("A0B1C2_03012024_2024-05-17_090000.png").is_file());

    service.run_at(at(9, 0, 1)).unwrap();
    assert_eq!(png_count(&out), 4);
}

#[test]
fn entity_without_dates_is_skipped() {
    let scratch = tempfile::tempdir().unwrap();
    let input = write_table(
        scratch.path(),
        "WKN;WP_Bollinger_Baender.Datum;Schlusskurs\n999999;kaputt;10,0\n999999;;11,0\n",
    );
    let out = scratch.path().join("charts");

    let config = Config::new().with_output_root(scratch.path());
    let paths = FixedPathProvider::new(&input).with_output_dir(&out);
    let service = RunService::new(config, StyleConfig::default(), Box::new(paths));

    let summary = completed(service.run_at(at(9, 0, 0)).unwrap());
    assert_eq!(summary.skipped, vec!["999999".to_string()]);
    assert!(summary.written.is_empty());
    assert!(summary.is_success());
    assert_eq!(png_count(&out), 0);
}

#[test]
fn failed_entity_does_not_stop_the_run() {
    let scratch = tempfile::tempdir().unwrap();
    let input = write_table(scratch.path(), TABLE);
    let out = scratch.path().join("charts");
    // 目标文件名被目录占用，写入 840400 时失败
    let blocked = out.join("840400_04012024_2024-05-17_090000.png");
    fs::create_dir_all(&blocked).unwrap();

    let config = Config::new().with_output_root(scratch.path()).with_size(800, 500);
    let paths = FixedPathProvider::new(&input).with_output_dir(&out);
    let service = RunService::new(config, StyleConfig::default(), Box::new(paths));

    let summary = completed(service.run_at(at(9, 0, 0)).unwrap());
    assert!(!summary.is_success());
    assert_eq!(summary.failed.len(), 1);
    assert_eq!(summary.failed[0].0, "840400");
    assert_eq!(summary.written, vec![out.join("A0B1C2_03012024_2024-05-17_090000.png")]);
    assert!(summary.written[0].is_file());
    assert!(blocked.is_dir());
}
