use std::io::Write;
use std::thread;

use lc_data::{
    DetectionSignal, EngineConfig, EngineError, HeaderFormat, LogFile, LogFileEngine,
    SharedLogEngine,
};
use rayon::prelude::*;
use tempfile::NamedTempFile;

fn write_log(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_missing_file_reports_not_found() {
    let mut engine = LogFileEngine::new();
    let err = engine.load("/definitely/not/here.csv").unwrap_err();

    assert_eq!(err.io_kind(), Some(std::io::ErrorKind::NotFound));
    assert!(!engine.is_loaded());
}

#[test]
fn test_accessors_after_release_fail_cleanly() {
    let file = write_log("T,PolicyName\n0,abc\n");
    let mut engine = LogFileEngine::new();
    engine.load(file.path()).unwrap();
    assert_eq!(engine.total_rows().unwrap(), 2);

    engine.release();
    engine.release();

    assert!(matches!(engine.string_at(1, 1), Err(EngineError::NotLoaded)));
    assert!(matches!(engine.value_at(1, 0), Err(EngineError::NotLoaded)));
    assert!(matches!(engine.column_names(), Err(EngineError::NotLoaded)));
}

#[test]
fn test_reload_replaces_previous_file() {
    let first = write_log("T,PolicyName\n0,abc\n");
    let second = write_log("UnixTime,Speed\n1,2\n3,4\n");

    let mut engine = LogFileEngine::new();
    engine.load(first.path()).unwrap();
    engine.load(second.path()).unwrap();

    assert_eq!(engine.total_rows().unwrap(), 3);
    assert_eq!(engine.column_names().unwrap(), &["UnixTime", "Speed"]);
    assert_eq!(engine.value_at(2, 1).unwrap(), 4.0);
}

#[test]
fn test_failed_reload_leaves_engine_unloaded() {
    let file = write_log("T,PolicyName\n0,abc\n");
    let mut engine = LogFileEngine::new();
    engine.load(file.path()).unwrap();

    assert!(engine.load("/definitely/not/here.csv").is_err());
    assert!(!engine.is_loaded());
}

#[test]
fn test_three_line_file_has_no_data_rows() {
    let file = write_log("A,B\n1,2\n3,4\n");
    let log = LogFile::open(file.path()).unwrap();

    assert_eq!(log.detected_format(), HeaderFormat::DefaultHierarchical);
    assert!(log.is_fallback_format());
    assert_eq!(log.total_rows(), 3);
    assert_eq!(log.column_names(), &["A_1_3", "B_2_4"]);
    assert_eq!(log.data_start_row(), 3);
    assert!(log.data_rows().is_empty());
}

#[test]
fn test_hierarchical_file_with_crlf() {
    let content = "Axis,Axis,\r\nPos,Vel,\r\nmm,mm/s,\r\n0.5,1.25,x\r\n1.5,,y\r\n";
    let file = write_log(content);
    let log = LogFile::open(file.path()).unwrap();

    assert_eq!(log.column_names(), &["Axis_Pos_mm", "Axis_Vel_mm/s", "Column_2"]);
    assert_eq!(log.data_start_row(), 3);
    assert_eq!(log.value_at(3, 1), 1.25);
    assert!(log.value_at(4, 1).is_nan());
    assert_eq!(log.string_at(4, 2), "y");
    assert_eq!(log.line_text(4), "1.5,,y");
}

#[test]
fn test_last_line_excludes_crlf_terminator() {
    let file = write_log("UnixTime,v\r\n0,\"x\"  \r\n");
    let mut engine = LogFileEngine::new();
    engine.load(file.path()).unwrap();
    let log = engine.log().unwrap();

    assert_eq!(log.total_rows(), 2);
    assert_eq!(log.line_text(1), "0,\"x\"  ");
    assert_eq!(log.string_at(1, 1), "x");
    assert_eq!(engine.value_at(1, 0).unwrap(), 0.0);
}

#[test]
fn test_last_line_excludes_lf_terminator() {
    let file = write_log("UnixTime,v\n0,7.5\n");
    let log = LogFile::open(file.path()).unwrap();

    assert_eq!(log.line_text(1), "0,7.5");
    assert_eq!(log.string_at(1, 1), "7.5");
    assert_eq!(log.value_at(1, 1), 7.5);
}

#[test]
fn test_scope_export() {
    let content = "\
ScopeProject,Line4\n\
Exported,2024/05/02\n\
Name,Time,MAIN.fSpeed,GVL.nMode,MAIN.pAxis^.fPos\n\
Unit,s,rpm,,mm\n\
SampleTime,0.001\n\
0.000,1200.5,3,10.0\n\
0.001,1201.0,3,10.5\n";
    let file = write_log(content);
    let log = LogFile::open(file.path()).unwrap();

    assert_eq!(log.detected_format(), HeaderFormat::ScopeMultiBlock);
    assert_eq!(log.detection().signal, DetectionSignal::ScopeProject);
    assert_eq!(log.data_start_row(), 5);
    assert_eq!(
        log.column_names(),
        &["Name", "Time", "fSpeed", "G.nMode", "pAxis.fPos"]
    );
    assert_eq!(log.raw_column_names()[2], "MAIN.fSpeed");
    assert_eq!(log.column_index("fSpeed"), Some(2));
    assert_eq!(log.value_at(6, 1), 1201.0);
}

#[test]
fn test_quoted_cells() {
    let content = "UnixTime,Message,Value\n1,\"motor, left\",\" 7 \"\n";
    let file = write_log(content);
    let log = LogFile::open(file.path()).unwrap();

    assert_eq!(log.string_at(1, 1), "motor, left");
    assert_eq!(log.string_at(1, 2), " 7 ");
    assert_eq!(log.string_at(1, 3), "");
    // Numeric reads are not quote-aware
    assert!(log.value_at(1, 2).is_nan());
}

#[test]
fn test_ragged_rows_are_tolerated() {
    let content = "UnixTime,A,B\n1,2\n1,2,3,4\n";
    let file = write_log(content);
    let log = LogFile::open(file.path()).unwrap();

    assert_eq!(log.string_at(1, 2), "");
    assert!(log.value_at(1, 2).is_nan());
    assert_eq!(log.value_at(2, 3), 4.0);
}

#[test]
fn test_string_cells_match_naive_split() {
    let rows = ["0,1.5,abc,,  x  ", "1,-2e3,,def,y", "2"];
    let content = format!("UnixTime,a,b,c,d\n{}\n", rows.join("\n"));
    let file = write_log(&content);
    let log = LogFile::open(file.path()).unwrap();

    for (offset, row) in rows.iter().enumerate() {
        let expected: Vec<&str> = row.split(',').collect();
        for col in 0..6 {
            let cell = log.string_at(offset + 1, col);
            let want = expected.get(col).map(|s| s.trim()).unwrap_or("");
            assert_eq!(cell, want, "row {offset} col {col}");

            let value = log.value_at(offset + 1, col);
            match want.parse::<f64>() {
                Ok(parsed) => assert_eq!(value, parsed),
                Err(_) => assert!(value.is_nan()),
            }
        }
    }
}

#[test]
fn test_custom_markers_from_config() {
    let config = EngineConfig::from_json_str(
        r#"{ "detection": { "single_line_markers": ["Stamp"] } }"#,
    )
    .unwrap();
    let file = write_log("Stamp,Temp\n1,20.5\n");
    let log = LogFile::open_with(file.path(), &config).unwrap();

    assert_eq!(log.detected_format(), HeaderFormat::SingleLineTagged);
    assert_eq!(log.value_at(1, 1), 20.5);
}

#[test]
fn test_engine_rejects_invalid_config() {
    let file = write_log("UnixTime,v\n0,1\n");
    let mut config = EngineConfig::default();
    config.detection.header_scan_lines = 1;

    let mut engine = LogFileEngine::with_config(config);
    let err = engine.load(file.path()).unwrap_err();

    assert!(matches!(err, EngineError::Config(_)));
    assert!(!engine.is_loaded());
}

#[test]
fn test_parallel_reads() {
    let mut content = String::from("UnixTime,Value\n");
    for i in 0..2000 {
        content.push_str(&format!("{i},{}\n", i * 2));
    }
    let file = write_log(&content);
    let log = LogFile::open(file.path()).unwrap();

    let sum: f64 = log
        .data_rows()
        .into_par_iter()
        .map(|row| log.value_at(row, 1))
        .sum();
    assert_eq!(sum, (0..2000).map(|i| (i * 2) as f64).sum::<f64>());
}

#[test]
fn test_shared_engine_across_threads() {
    let file = write_log("UnixTime,Value\n0,10\n1,20\n");
    let shared = SharedLogEngine::default();
    assert!(matches!(shared.with_log(|log| log.total_rows()), Err(EngineError::NotLoaded)));

    shared.load(file.path()).unwrap();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let shared = shared.clone();
            thread::spawn(move || shared.with_log(|log| log.value_at(2, 1)).unwrap())
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), 20.0);
    }

    shared.release();
    assert!(!shared.is_loaded());
}
