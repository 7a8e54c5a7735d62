use super::record::LegacyRecord;
use std::io::Write;

#[derive(Debug, thiserror::Error)]
pub enum LegacyExportError {
    #[error("failed to write legacy record: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to flush legacy output: {0}")]
    Io(#[from] std::io::Error),
    #[error("legacy record columns differ from the header already written")]
    ColumnMismatch,
}

/// Destination for legacy rows (the relational insert in production).
pub trait LegacyWriter {
    fn write(&mut self, record: &LegacyRecord) -> Result<(), LegacyExportError>;
}

/// Writes legacy rows as CSV, emitting the header from the first record.
pub struct CsvLegacyWriter<W: Write> {
    writer: csv::Writer<W>,
    header: Option<Vec<String>>,
}

impl<W: Write> CsvLegacyWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            writer: csv::WriterBuilder::new().from_writer(inner),
            header: None,
        }
    }

    pub fn finish(mut self) -> Result<W, LegacyExportError> {
        self.writer.flush()?;
        self.writer
            .into_inner()
            .map_err(|err| LegacyExportError::Io(err.into_error()))
    }
}

impl<W: Write> LegacyWriter for CsvLegacyWriter<W> {
    fn write(&mut self, record: &LegacyRecord) -> Result<(), LegacyExportError> {
        match &self.header {
            Some(header) => {
                if !header.iter().map(String::as_str).eq(record.headers()) {
                    return Err(LegacyExportError::ColumnMismatch);
                }
            }
            None => {
                let header: Vec<String> = record.headers().map(str::to_string).collect();
                self.writer.write_record(&header)?;
                self.header = Some(header);
            }
        }

        self.writer
            .write_record(record.fields().map(|(_, value)| value.to_string()))?;
        Ok(())
    }
}
