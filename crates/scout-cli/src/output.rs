use std::io::Write;

use scout_core::models::{CSV_HEADER, PageResult};

/// Writes results as CSV rows, header first.
///
/// The header is written on construction so that a run without results
/// still produces a well-formed file.
pub struct CsvSink<W: Write> {
    writer: csv::Writer<W>,
    written: usize,
}

impl<W: Write> CsvSink<W> {
    pub fn new(inner: W) -> Result<Self, csv::Error> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(inner);
        writer.write_record(CSV_HEADER)?;
        Ok(Self { writer, written: 0 })
    }

    pub fn write(&mut self, result: &PageResult) -> Result<(), csv::Error> {
        self.writer.serialize(result.to_row())?;
        self.written += 1;
        Ok(())
    }

    pub fn written(&self) -> usize {
        self.written
    }

    /// Flush buffered rows and return how many were written.
    pub fn finish(mut self) -> Result<usize, csv::Error> {
        self.writer.flush()?;
        Ok(self.written)
    }
}
