// LogNorm - app/batch.rs
//
// Batch driver: registry load -> discovery -> stream every input row through
// the transformer -> consolidated CSV.
//
// Single pass, single thread. The record id counter lives here and is handed
// to the transformer by value; files are consumed in discovery (path) order,
// rows in file order, so ids follow one total order across the run.
//
// Error policy:
//   - I/O and CSV errors abort the run.
//   - A record that fails to transform aborts the run, unless the skip policy
//     is selected; skipped records do not consume an id.

use crate::core::classifier::TagVocabulary;
use crate::core::discovery::{self, DiscoveryConfig};
use crate::core::export::NormalizedCsvWriter;
use crate::core::model::{BatchSummary, OnInvalidRecord, RawRecord, RequiredFields};
use crate::core::registry::AppCodeRegistry;
use crate::core::transform::RowTransformer;
use crate::util::constants::STDOUT_PATH;
use crate::util::error::{ExportError, InputError, Result, TransformError};
use chrono::Utc;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

// =============================================================================
// Configuration
// =============================================================================

/// Everything a batch run needs, already validated.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Directory scanned for input files.
    pub data_dir: PathBuf,

    pub discovery: DiscoveryConfig,

    /// App code key=value source. Missing or malformed is tolerated.
    pub app_codes: PathBuf,

    /// Output CSV path, or `-` for stdout.
    pub output: PathBuf,

    pub required_fields: RequiredFields,
    pub on_invalid_record: OnInvalidRecord,
    pub consolidate_aliases: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        use crate::util::constants;
        Self {
            data_dir: PathBuf::from(constants::DEFAULT_DATA_DIR),
            discovery: DiscoveryConfig::default(),
            app_codes: PathBuf::from(constants::DEFAULT_APP_CODES_FILE),
            output: PathBuf::from(constants::DEFAULT_OUTPUT_FILE),
            required_fields: RequiredFields::default(),
            on_invalid_record: OnInvalidRecord::default(),
            consolidate_aliases: false,
        }
    }
}

// =============================================================================
// Run
// =============================================================================

/// Run one batch to completion.
///
/// The output header is written even when no input files are found.
pub fn run_batch(config: &BatchConfig) -> Result<BatchSummary> {
    let started_at = Utc::now();

    tracing::info!(
        data_dir = %config.data_dir.display(),
        output = %config.output.display(),
        required_fields = config.required_fields.as_str(),
        on_invalid_record = config.on_invalid_record.as_str(),
        consolidate_aliases = config.consolidate_aliases,
        "Batch starting"
    );

    let registry = AppCodeRegistry::load(&config.app_codes);
    let vocabulary = TagVocabulary {
        consolidate_aliases: config.consolidate_aliases,
    };
    let transformer = RowTransformer::new(registry, vocabulary, config.required_fields);

    let (files, warnings) = discovery::discover_files(&config.data_dir, &config.discovery)?;
    for warning in &warnings {
        tracing::warn!(warning = %warning, "Discovery warning");
    }
    tracing::info!(
        data_dir = %config.data_dir.display(),
        files = files.len(),
        "Input files discovered"
    );

    let sink = open_output(&config.output)?;
    let mut writer = NormalizedCsvWriter::new(sink, &config.output)?;

    let mut next_id: u64 = 1;
    let mut skipped: u64 = 0;
    let mut input_bytes: u64 = 0;
    for file in &files {
        tracing::debug!(
            file = %file.path.display(),
            size = file.size,
            modified = ?file.modified,
            first_id = next_id,
            "Processing file"
        );
        input_bytes += file.size;
        skipped += process_file(
            &file.path,
            &transformer,
            &mut writer,
            &mut next_id,
            config.on_invalid_record,
        )?;
    }

    let records = writer.finish()?;

    let summary = BatchSummary {
        files: files.into_iter().map(|f| f.path).collect(),
        records,
        skipped,
        input_bytes,
        output: config.output.clone(),
        started_at,
        finished_at: Utc::now(),
    };

    tracing::info!(
        files = summary.files.len(),
        records = summary.records,
        skipped = summary.skipped,
        output = %summary.output.display(),
        "Batch complete"
    );

    Ok(summary)
}

/// Stream one input file into `writer`. Returns the number of skipped records.
fn process_file<W: Write>(
    path: &Path,
    transformer: &RowTransformer,
    writer: &mut NormalizedCsvWriter<W>,
    next_id: &mut u64,
    on_invalid: OnInvalidRecord,
) -> Result<u64> {
    let file = File::open(path).map_err(|e| InputError::Open {
        path: path.to_path_buf(),
        source: e,
    })?;

    let csv_err = |e: csv::Error| InputError::Csv {
        path: path.to_path_buf(),
        source: e,
    };

    // flexible: short rows leave trailing fields absent instead of failing.
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(BufReader::new(file));
    let headers = reader.headers().map_err(csv_err)?.clone();

    let mut row = csv::StringRecord::new();
    let mut written: u64 = 0;
    let mut skipped: u64 = 0;

    while reader.read_record(&mut row).map_err(csv_err)? {
        let raw: RawRecord = headers.iter().zip(row.iter()).collect();

        match transformer.transform(&raw, *next_id) {
            Ok(record) => {
                writer.write_record(&record)?;
                *next_id += 1;
                written += 1;
            }
            Err(e) => match on_invalid {
                OnInvalidRecord::Abort => return Err(e.into()),
                OnInvalidRecord::Skip => {
                    let line = row.position().map(|p| p.line());
                    tracing::warn!("{}", skip_notice(path, line, &e));
                    skipped += 1;
                }
            },
        }
    }

    tracing::debug!(file = %path.display(), written, skipped, "File processed");

    Ok(skipped)
}

/// Warning text for a skipped record.
///
/// Names the input location rather than the record id: a skipped record
/// releases its id to the next written row.
fn skip_notice(path: &Path, line: Option<u64>, error: &TransformError) -> String {
    let location = match line {
        Some(line) => format!("{}:{line}", path.display()),
        None => path.display().to_string(),
    };
    match error {
        TransformError::MissingRequiredField { field, .. } => format!(
            "Skipping record at {location}: missing required field '{field}' (no id assigned)"
        ),
    }
}

/// Open the output destination. `-` selects stdout.
fn open_output(path: &Path) -> std::result::Result<Box<dyn Write>, ExportError> {
    if path.as_os_str() == STDOUT_PATH {
        return Ok(Box::new(BufWriter::new(io::stdout())));
    }
    let file = File::create(path).map_err(|e| ExportError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(Box::new(BufWriter::new(file)))
}

// =============================================================================
// Summary rendering
// =============================================================================

/// How the final summary is reported on stdout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum SummaryFormat {
    /// `Processed N records.`
    #[default]
    Text,
    /// The full `BatchSummary` as a JSON object.
    Json,
}

/// Render `summary` for stdout.
pub fn render_summary(
    summary: &BatchSummary,
    format: SummaryFormat,
) -> std::result::Result<String, ExportError> {
    match format {
        SummaryFormat::Text => Ok(format!("Processed {} records.", summary.records)),
        SummaryFormat::Json => {
            serde_json::to_string_pretty(summary).map_err(|e| ExportError::Json { source: e })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::error::LogNormError;
    use std::fs;

    fn setup(files: &[(&str, &str)]) -> (tempfile::TempDir, BatchConfig) {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("data");
        fs::create_dir(&data).unwrap();
        for (name, content) in files {
            fs::write(data.join(name), content).unwrap();
        }
        let config = BatchConfig {
            data_dir: data,
            app_codes: dir.path().join("appCodes.ini"),
            output: dir.path().join("output.csv"),
            ..Default::default()
        };
        (dir, config)
    }

    fn output_lines(config: &BatchConfig) -> Vec<String> {
        fs::read_to_string(&config.output)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_ids_continue_across_files() {
        let (_dir, config) = setup(&[
            ("a.log", "app,deviceToken\n1,t1\n2,t2\n"),
            ("b.log", "app,deviceToken\n3,t3\n"),
        ]);
        let summary = run_batch(&config).unwrap();
        assert_eq!(summary.records, 3);
        assert_eq!(summary.files.len(), 2);

        let lines = output_lines(&config);
        assert!(lines[1].starts_with("1,1,t1,"));
        assert!(lines[2].starts_with("2,2,t2,"));
        assert!(lines[3].starts_with("3,3,t3,"));
    }

    #[test]
    fn test_short_row_leaves_fields_absent() {
        let (_dir, mut config) = setup(&[(
            "a.log",
            "app,deviceToken,deviceTokenStatus,tags\n1,t1\n",
        )]);
        config.required_fields = RequiredFields::AppOnly;
        run_batch(&config).unwrap();
        assert_eq!(
            output_lines(&config)[1],
            "1,1,t1,0,subscription_unknown,downloaded_free_product_unknown,\
             downloaded_iap_product_unknown"
        );
    }

    #[test]
    fn test_missing_app_column_aborts() {
        let (_dir, config) = setup(&[("a.log", "deviceToken\nt1\n")]);
        let err = run_batch(&config).unwrap_err();
        assert!(matches!(err, LogNormError::Transform(_)), "got {err:?}");
    }

    #[test]
    fn test_skip_policy_keeps_ids_contiguous() {
        let (_dir, mut config) = setup(&[(
            "a.log",
            "app,deviceToken\n1,t1\n2\n3,t3\n",
        )]);
        config.on_invalid_record = OnInvalidRecord::Skip;
        let summary = run_batch(&config).unwrap();
        assert_eq!(summary.records, 2);
        assert_eq!(summary.skipped, 1);

        let lines = output_lines(&config);
        assert!(lines[1].starts_with("1,1,t1,"));
        assert!(lines[2].starts_with("2,3,t3,"));
    }

    #[test]
    fn test_render_summary() {
        let (_dir, config) = setup(&[]);
        let summary = run_batch(&config).unwrap();
        assert_eq!(
            render_summary(&summary, SummaryFormat::Text).unwrap(),
            "Processed 0 records."
        );
        let json = render_summary(&summary, SummaryFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["records"], 0);
        assert_eq!(value["skipped"], 0);
        assert_eq!(value["input_bytes"], 0);
    }

    #[test]
    fn test_summary_counts_input_bytes() {
        let (_dir, config) = setup(&[
            ("a.log", "app,deviceToken\n1,t1\n"),
            ("b.log", "app,deviceToken\n2,t2\n"),
        ]);
        let summary = run_batch(&config).unwrap();
        assert_eq!(summary.input_bytes, 2 * "app,deviceToken\n1,t1\n".len() as u64);
    }

    #[test]
    fn test_skip_notice_names_location_not_id() {
        let err = TransformError::MissingRequiredField {
            record_id: 7,
            field: "app",
        };
        let notice = skip_notice(Path::new("data/a.log"), Some(3), &err);
        assert_eq!(
            notice,
            "Skipping record at data/a.log:3: missing required field 'app' (no id assigned)"
        );
        assert!(!notice.contains('7'));

        let notice = skip_notice(Path::new("data/a.log"), None, &err);
        assert!(notice.starts_with("Skipping record at data/a.log: "));
    }
}
