//! File sinks for product records

use crate::config::{OutputConfig, RecordFormat};
use crate::extract::ProductRecord;
use crate::output::traits::{OutputError, OutputResult, RecordSink};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

/// One JSON object per line
pub struct JsonLinesSink<W: Write> {
    writer: W,
    written: u64,
    finished: bool,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            written: 0,
            finished: false,
        }
    }
}

impl<W: Write + Send> RecordSink for JsonLinesSink<W> {
    fn emit(&mut self, record: &ProductRecord) -> OutputResult<()> {
        if self.finished {
            return Err(OutputError::Finished);
        }
        serde_json::to_writer(&mut self.writer, record)?;
        self.writer.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        self.finished = true;
        self.writer.flush()?;
        Ok(())
    }

    fn records_written(&self) -> u64 {
        self.written
    }
}

/// A single JSON array, closed on `finish`
pub struct JsonArraySink<W: Write> {
    writer: W,
    written: u64,
    finished: bool,
}

impl<W: Write> JsonArraySink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            written: 0,
            finished: false,
        }
    }
}

impl<W: Write + Send> RecordSink for JsonArraySink<W> {
    fn emit(&mut self, record: &ProductRecord) -> OutputResult<()> {
        if self.finished {
            return Err(OutputError::Finished);
        }
        let separator: &[u8] = if self.written == 0 { b"[\n" } else { b",\n" };
        self.writer.write_all(separator)?;
        serde_json::to_writer(&mut self.writer, record)?;
        self.written += 1;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        let closing: &[u8] = if self.written == 0 { b"[]\n" } else { b"\n]\n" };
        self.writer.write_all(closing)?;
        self.writer.flush()?;
        Ok(())
    }

    fn records_written(&self) -> u64 {
        self.written
    }
}

/// Creates the configured records file, replacing any previous content
pub fn open_sink(config: &OutputConfig) -> OutputResult<Box<dyn RecordSink>> {
    let path = Path::new(&config.records_path);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let writer = BufWriter::new(File::create(path)?);
    tracing::debug!("Writing {:?} records to {}", config.format, path.display());

    Ok(match config.format {
        RecordFormat::Jsonl => Box::new(JsonLinesSink::new(writer)),
        RecordFormat::Json => Box::new(JsonArraySink::new(writer)),
    })
}
