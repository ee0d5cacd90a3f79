//! JSON file sinks
//!
//! - [`JsonArraySink`] writes one JSON array, one record per element. Records
//!   are streamed into a `.partial` file next to the target, which replaces
//!   the target only when `finish` closes the array. In append mode the
//!   records already in the file are kept in front.
//! - [`JsonLinesSink`] writes one JSON object per line.

use crate::normalize::NormalizedProductRecord;
use crate::output::traits::{OutputError, OutputResult, RecordSink};
use serde::Serialize;
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Writes records as a single JSON array
///
/// The target file keeps its previous content until [`finish`] succeeds. A
/// sink dropped without `finish` (a failed or aborted run) removes its
/// partial file and leaves the target as it was.
///
/// [`finish`]: RecordSink::finish
pub struct JsonArraySink {
    writer: Option<BufWriter<File>>,
    path: PathBuf,
    partial_path: PathBuf,
    written: usize,
    emitted: usize,
}

impl JsonArraySink {
    /// Opens the array file
    ///
    /// With `overwrite = false` an existing file must hold a JSON array; its
    /// elements are carried over before any new record. An empty or missing
    /// file starts a new array.
    pub fn create(path: &Path, overwrite: bool) -> OutputResult<Self> {
        let existing = if overwrite {
            Vec::new()
        } else {
            read_existing_array(path)?
        };

        create_parent_dir(path)?;
        let partial_path = partial_path(path);
        let mut writer = BufWriter::new(File::create(&partial_path)?);
        writer.write_all(b"[")?;

        let mut sink = Self {
            writer: Some(writer),
            path: path.to_path_buf(),
            partial_path,
            written: 0,
            emitted: 0,
        };
        for value in &existing {
            sink.write_element(value)?;
        }

        tracing::debug!(
            path = %sink.path.display(),
            partial = %sink.partial_path.display(),
            carried_over = existing.len(),
            "Opened JSON array output"
        );

        Ok(sink)
    }

    fn write_element<T: Serialize>(&mut self, value: &T) -> OutputResult<()> {
        let first = self.written == 0;
        let writer = self.writer.as_mut().ok_or(OutputError::Finished)?;
        if !first {
            writer.write_all(b",")?;
        }
        writer.write_all(b"\n  ")?;
        serde_json::to_writer(&mut *writer, value)?;
        self.written += 1;
        Ok(())
    }
}

impl RecordSink for JsonArraySink {
    fn emit(&mut self, record: NormalizedProductRecord) -> OutputResult<()> {
        self.write_element(&record)?;
        if let Some(writer) = self.writer.as_mut() {
            writer.flush()?;
        }
        self.emitted += 1;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        let Some(mut writer) = self.writer.take() else {
            return Ok(());
        };

        if self.written > 0 {
            writer.write_all(b"\n")?;
        }
        writer.write_all(b"]\n")?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
        drop(writer);

        fs::rename(&self.partial_path, &self.path)?;

        tracing::info!(
            path = %self.path.display(),
            records = self.written,
            "Product file written"
        );
        Ok(())
    }

    fn emitted(&self) -> usize {
        self.emitted
    }
}

impl Drop for JsonArraySink {
    fn drop(&mut self) {
        if self.writer.take().is_none() {
            return;
        }
        if let Err(e) = fs::remove_file(&self.partial_path) {
            tracing::warn!(
                partial = %self.partial_path.display(),
                "Could not remove unfinished output: {}",
                e
            );
        }
        tracing::warn!(
            path = %self.path.display(),
            "Output not finished; existing file left unchanged"
        );
    }
}

/// Writes records as JSON Lines
pub struct JsonLinesSink {
    writer: BufWriter<File>,
    path: PathBuf,
    emitted: usize,
    finished: bool,
}

impl JsonLinesSink {
    pub fn create(path: &Path, overwrite: bool) -> OutputResult<Self> {
        create_parent_dir(path)?;
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .append(!overwrite)
            .truncate(overwrite)
            .open(path)?;

        Ok(Self {
            writer: BufWriter::new(file),
            path: path.to_path_buf(),
            emitted: 0,
            finished: false,
        })
    }
}

impl RecordSink for JsonLinesSink {
    fn emit(&mut self, record: NormalizedProductRecord) -> OutputResult<()> {
        if self.finished {
            return Err(OutputError::Finished);
        }
        serde_json::to_writer(&mut self.writer, &record)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        self.emitted += 1;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if !self.finished {
            self.writer.flush()?;
            self.finished = true;
            tracing::info!(
                path = %self.path.display(),
                records = self.emitted,
                "Product file written"
            );
        }
        Ok(())
    }

    fn emitted(&self) -> usize {
        self.emitted
    }
}

fn read_existing_array(path: &Path) -> OutputResult<Vec<serde_json::Value>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let content = fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }

    serde_json::from_str::<Vec<serde_json::Value>>(&content).map_err(|e| OutputError::Existing {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// `products.json` -> `products.json.partial`, in the same directory
fn partial_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".partial");
    PathBuf::from(name)
}

fn create_parent_dir(path: &Path) -> OutputResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
