// LogNorm - core/export.rs
//
// CSV sink for normalised records.
// Core layer: writes to any Write trait object.

use crate::core::model::NormalizedRecord;
use crate::util::constants::OUTPUT_HEADER;
use crate::util::error::ExportError;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Streams normalised records as CSV under the fixed output header.
///
/// The header is written on construction so an empty run still produces a
/// well-formed file.
pub struct NormalizedCsvWriter<W: Write> {
    inner: csv::Writer<W>,
    path: PathBuf,
    rows: u64,
}

impl<W: Write> NormalizedCsvWriter<W> {
    /// `path` is used only to give errors context.
    pub fn new(writer: W, path: &Path) -> Result<Self, ExportError> {
        let mut inner = csv::Writer::from_writer(writer);
        inner
            .write_record(OUTPUT_HEADER)
            .map_err(|e| ExportError::Csv {
                path: path.to_path_buf(),
                source: e,
            })?;
        Ok(Self {
            inner,
            path: path.to_path_buf(),
            rows: 0,
        })
    }

    pub fn write_record(&mut self, record: &NormalizedRecord) -> Result<(), ExportError> {
        self.inner
            .write_record(record.to_row())
            .map_err(|e| ExportError::Csv {
                path: self.path.clone(),
                source: e,
            })?;
        self.rows += 1;
        Ok(())
    }

    /// Flush and return the number of rows written.
    pub fn finish(mut self) -> Result<u64, ExportError> {
        self.inner.flush().map_err(|e| ExportError::Io {
            path: self.path.clone(),
            source: e,
        })?;
        Ok(self.rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{FreeProductStatus, IapProductStatus, SubscriptionStatus};

    fn make_record(id: u64, app_code: &str) -> NormalizedRecord {
        NormalizedRecord {
            id,
            app_code: app_code.to_string(),
            device_id: "tok,with,commas".to_string(),
            contactable: false,
            subscription_status: SubscriptionStatus::Active,
            free_product_status: FreeProductStatus::NotDownloaded,
            iap_product_status: IapProductStatus::Unknown,
        }
    }

    #[test]
    fn test_csv_export() {
        let mut buf = Vec::new();
        let mut writer = NormalizedCsvWriter::new(&mut buf, Path::new("out.csv")).unwrap();
        writer.write_record(&make_record(1, "A")).unwrap();
        writer.write_record(&make_record(2, "B")).unwrap();
        assert_eq!(writer.finish().unwrap(), 2);

        let output = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(
            lines[0],
            "id,appCode,deviceId,contactable,subscription_status,\
             has_downloaded_free_product_status,has_downloaded_iap_product_status"
        );
        assert_eq!(
            lines[1],
            "1,A,\"tok,with,commas\",0,active_subscriber,\
             not_downloaded_free_product,downloaded_iap_product_unknown"
        );
        assert!(lines[2].starts_with("2,B,"));
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_header_only_when_empty() {
        let mut buf = Vec::new();
        let writer = NormalizedCsvWriter::new(&mut buf, Path::new("out.csv")).unwrap();
        assert_eq!(writer.finish().unwrap(), 0);

        let output = String::from_utf8(buf).unwrap();
        assert_eq!(output.lines().count(), 1);
        assert!(output.starts_with("id,appCode,"));
    }
}
