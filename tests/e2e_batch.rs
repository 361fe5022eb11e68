// LogNorm - tests/e2e_batch.rs
//
// End-to-end tests for the batch pipeline.
//
// These tests exercise the real filesystem, real INI registry loading, real
// walkdir discovery and real csv reading/writing: from raw log files on disk
// to the consolidated output file. No mocks, no stubs.

use lognorm::app::batch::{run_batch, BatchConfig};
use lognorm::core::model::{OnInvalidRecord, RequiredFields};
use lognorm::util::error::{LogNormError, TransformError};
use std::fs;
use std::path::Path;

// =============================================================================
// Helpers
// =============================================================================

const HEADER: &str = "id,appCode,deviceId,contactable,subscription_status,\
has_downloaded_free_product_status,has_downloaded_iap_product_status";

/// A workspace with `data/` populated from `logs` and an optional app code file.
fn workspace(logs: &[(&str, &str)], app_codes: Option<&str>) -> (tempfile::TempDir, BatchConfig) {
    let dir = tempfile::tempdir().expect("tempdir");
    let data = dir.path().join("data");
    fs::create_dir(&data).expect("mkdir data");
    for (name, content) in logs {
        fs::write(data.join(name), content).expect("write log");
    }
    let codes_path = dir.path().join("appCodes.ini");
    if let Some(content) = app_codes {
        fs::write(&codes_path, content).expect("write appCodes.ini");
    }

    let config = BatchConfig {
        data_dir: data,
        app_codes: codes_path,
        output: dir.path().join("output.csv"),
        ..Default::default()
    };
    (dir, config)
}

fn read_output(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .expect("read output")
        .lines()
        .map(str::to_string)
        .collect()
}

fn ids(lines: &[String]) -> Vec<u64> {
    lines[1..]
        .iter()
        .map(|l| l.split(',').next().unwrap().parse().unwrap())
        .collect()
}

// =============================================================================
// Happy path
// =============================================================================

/// The documented reference record, end to end.
#[test]
fn e2e_reference_record() {
    let (_dir, config) = workspace(
        &[(
            "feed.log",
            "app,deviceToken,deviceTokenStatus,tags\n\
             42,abc,1,Expired_Subscriber | has_downloaded_free_product\n",
        )],
        None,
    );

    let summary = run_batch(&config).expect("run");
    assert_eq!(summary.records, 1);

    let lines = read_output(&config.output);
    assert_eq!(lines[0], HEADER);
    assert_eq!(
        lines[1],
        "1,42,abc,1,expired_subscriber,has_downloaded_free_product,downloaded_iap_product_unknown"
    );
}

/// Ids run 1..=N across files in path order, never restarting per file.
#[test]
fn e2e_ids_are_global_across_files() {
    let (_dir, config) = workspace(
        &[
            ("2024-02.log", "app,deviceToken\nb1,t\nb2,t\nb3,t\n"),
            ("2024-01.log", "app,deviceToken\na1,t\na2,t\n"),
            ("ignored.txt", "app,deviceToken\nx,t\n"),
        ],
        None,
    );

    let summary = run_batch(&config).expect("run");
    assert_eq!(summary.records, 5);
    assert_eq!(summary.files.len(), 2);

    let lines = read_output(&config.output);
    assert_eq!(ids(&lines), vec![1, 2, 3, 4, 5]);
    assert!(lines[1].starts_with("1,a1,"), "2024-01.log first: {lines:?}");
    assert!(lines[3].starts_with("3,b1,"));
}

/// The data tree is walked recursively by default; ids follow full-path order.
#[test]
fn e2e_nested_files_consumed_in_path_order() {
    let (_dir, config) = workspace(&[("top.log", "app,deviceToken\ntop,t\n")], None);
    let nested = config.data_dir.join("2024");
    fs::create_dir(&nested).expect("mkdir 2024");
    fs::write(nested.join("nested.log"), "app,deviceToken\nnested,t\n").expect("write nested");
    let late = config.data_dir.join("zz");
    fs::create_dir(&late).expect("mkdir zz");
    fs::write(late.join("late.log"), "app,deviceToken\nlate,t\n").expect("write late");

    let summary = run_batch(&config).expect("run");
    assert_eq!(summary.records, 3);
    assert_eq!(summary.files.len(), 3);

    // "2024/nested.log" < "top.log" < "zz/late.log"
    let lines = read_output(&config.output);
    assert!(lines[1].starts_with("1,nested,"), "got {lines:?}");
    assert!(lines[2].starts_with("2,top,"));
    assert!(lines[3].starts_with("3,late,"));
}

/// Mapped app identifiers are replaced, unmapped ones pass through.
#[test]
fn e2e_app_codes_are_applied() {
    let (_dir, config) = workspace(
        &[(
            "feed.log",
            "app,deviceToken,deviceTokenStatus,tags\n\
             com.example.daily,t1,0,active_subscriber\n\
             unmapped,t2,1,\n",
        )],
        Some("; production codes\n[codes]\ncom.example.daily = \"DAILY\" ; main app\n"),
    );

    run_batch(&config).expect("run");
    let lines = read_output(&config.output);
    assert!(lines[1].starts_with("1,DAILY,t1,0,active_subscriber,"));
    assert!(lines[2].starts_with("2,unmapped,t2,1,subscription_unknown,"));
}

/// A broken app code file degrades to pass-through instead of failing the run.
#[test]
fn e2e_malformed_app_codes_degrade() {
    let (_dir, config) = workspace(
        &[("feed.log", "app,deviceToken\ncom.example.daily,t1\n")],
        Some("com.example.daily = DAILY\nthis line is not a mapping\n"),
    );

    run_batch(&config).expect("run");
    assert!(read_output(&config.output)[1].starts_with("1,com.example.daily,"));
}

/// First recognised tag in source order wins, per category.
#[test]
fn e2e_first_match_in_source_order() {
    let (_dir, config) = workspace(
        &[(
            "feed.log",
            "app,deviceToken,tags\n\
             1,t,never_subscribed|active_subscriber|not_downloaded_free_product|has_downloaded_iap_product\n",
        )],
        None,
    );

    run_batch(&config).expect("run");
    assert_eq!(
        read_output(&config.output)[1],
        "1,1,t,0,never_subscribed,not_downloaded_free_product,not_downloaded_free_product"
    );
}

/// Empty data directory still writes the header.
#[test]
fn e2e_no_input_files_writes_header_only() {
    let (_dir, config) = workspace(&[], None);
    let summary = run_batch(&config).expect("run");
    assert_eq!(summary.records, 0);
    assert_eq!(read_output(&config.output), vec![HEADER.to_string()]);
}

/// Aliases are only consolidated when asked for.
#[test]
fn e2e_alias_consolidation_is_opt_in() {
    let log = "app,deviceToken,tags\n1,t,purchased_single_issue_while_no_sub|downloaded_free_single_issue_while_active_sub\n";

    let (_dir, config) = workspace(&[("feed.log", log)], None);
    run_batch(&config).expect("run");
    assert!(read_output(&config.output)[1]
        .ends_with("downloaded_free_product_unknown,downloaded_iap_product_unknown"));

    let (_dir2, mut config) = workspace(&[("feed.log", log)], None);
    config.consolidate_aliases = true;
    run_batch(&config).expect("run");
    assert!(read_output(&config.output)[1]
        .ends_with("has_downloaded_free_product,has_downloaded_iap_product"));
}

// =============================================================================
// Failure policy
// =============================================================================

/// A record without `app` aborts the run and names the failing record id.
#[test]
fn e2e_missing_app_aborts_run() {
    let (_dir, config) = workspace(
        &[
            ("a.log", "app,deviceToken\n1,t\n2,t\n"),
            ("b.log", "deviceToken,tags\nt,active_subscriber\n"),
        ],
        None,
    );

    let err = run_batch(&config).unwrap_err();
    match err {
        LogNormError::Transform(TransformError::MissingRequiredField { record_id, field }) => {
            assert_eq!(record_id, 3);
            assert_eq!(field, "app");
        }
        other => panic!("expected MissingRequiredField, got {other:?}"),
    }
}

/// Under the lenient policy an absent device token becomes an empty device id.
#[test]
fn e2e_lenient_allows_missing_device_token() {
    let (_dir, mut config) = workspace(&[("feed.log", "app,tags\n42,active_subscriber\n")], None);

    assert!(matches!(
        run_batch(&config),
        Err(LogNormError::Transform(_))
    ));

    config.required_fields = RequiredFields::AppOnly;
    run_batch(&config).expect("run");
    assert!(read_output(&config.output)[1].starts_with("1,42,,0,active_subscriber,"));
}

/// Skipped records do not leave gaps in the id sequence.
#[test]
fn e2e_skip_invalid_keeps_ids_contiguous() {
    let (_dir, mut config) = workspace(
        &[
            ("a.log", "app,deviceToken\n1,t\n"),
            ("b.log", "deviceToken\nt\nt\n"),
            ("c.log", "app,deviceToken\n2,t\n3,t\n"),
        ],
        None,
    );
    config.on_invalid_record = OnInvalidRecord::Skip;

    let summary = run_batch(&config).expect("run");
    assert_eq!(summary.records, 3);
    assert_eq!(summary.skipped, 2);
    assert_eq!(ids(&read_output(&config.output)), vec![1, 2, 3]);
}

/// A missing data directory is a fatal discovery error.
#[test]
fn e2e_missing_data_dir_is_fatal() {
    let (dir, mut config) = workspace(&[], None);
    config.data_dir = dir.path().join("nowhere");
    assert!(matches!(
        run_batch(&config),
        Err(LogNormError::Discovery(_))
    ));
}
