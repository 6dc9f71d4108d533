//! Newline-delimited JSON output for the run manifest.

use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// File name of the manifest written next to the augmented images.
pub const MANIFEST_FILE: &str = "manifest.jsonl";

/// Serializes records as one JSON object per line.
pub struct OutputWriter<W: Write> {
    writer: W,
    items_written: usize,
}

impl OutputWriter<BufWriter<File>> {
    /// Create (or truncate) the file at `path`.
    pub fn create(path: &Path) -> io::Result<Self> {
        Ok(Self::new(BufWriter::new(File::create(path)?)))
    }
}

impl<W: Write> OutputWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            items_written: 0,
        }
    }

    /// Write one record followed by a newline.
    pub fn write<T: Serialize>(&mut self, item: &T) -> io::Result<()> {
        serde_json::to_writer(&mut self.writer, item).map_err(io::Error::other)?;
        writeln!(self.writer)?;
        self.items_written += 1;
        Ok(())
    }

    pub fn items_written(&self) -> usize {
        self.items_written
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    /// Consume the writer and return the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct TestItem {
        name: String,
        value: i32,
    }

    #[test]
    fn test_write_one_object_per_line() {
        let mut writer = OutputWriter::new(Vec::new());
        for (name, value) in [("a", 1), ("b", 2)] {
            writer
                .write(&TestItem {
                    name: name.to_string(),
                    value,
                })
                .unwrap();
        }
        assert_eq!(writer.items_written(), 2);

        let output = String::from_utf8(writer.into_inner()).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines, vec![r#"{"name":"a","value":1}"#, r#"{"name":"b","value":2}"#]);
    }

    #[test]
    fn test_create_replaces_previous_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(MANIFEST_FILE);
        std::fs::write(&path, "{\"old\":true}\n").unwrap();

        let mut writer = OutputWriter::create(&path).unwrap();
        writer.write(&serde_json::json!({"new": true})).unwrap();
        writer.flush().unwrap();
        drop(writer);

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "{\"new\":true}\n");
    }
}
