//! Newline-delimited bulk payload writer.

use std::io::Write;

use serde_json::{Map, Value};

use crate::error::{IngotError, Result};
use crate::ingest::builder::BuiltDocument;

/// Writes built documents as a bulk payload: an action line naming the target
/// index (and id, when known) followed by the document line.
pub struct BulkWriter<W: Write> {
    writer: W,
    index: String,
    action_lines: bool,
    written: u64,
}

impl<W: Write> BulkWriter<W> {
    pub fn new(writer: W, index: impl Into<String>) -> Self {
        BulkWriter {
            writer,
            index: index.into(),
            action_lines: true,
            written: 0,
        }
    }

    /// Emit document lines only, without action lines.
    pub fn without_action_lines(mut self) -> Self {
        self.action_lines = false;
        self
    }

    pub fn write_document(&mut self, document: &BuiltDocument) -> Result<()> {
        if document.line.contains('\n') {
            return Err(IngotError::MultiLine);
        }

        if self.action_lines {
            let mut meta = Map::new();
            meta.insert("_index".to_string(), Value::String(self.index.clone()));
            if let Some(id) = &document.id {
                meta.insert("_id".to_string(), Value::String(id.clone()));
            }
            let mut action = Map::new();
            action.insert("index".to_string(), Value::Object(meta));
            serde_json::to_writer(&mut self.writer, &action)?;
            self.writer.write_all(b"\n")?;
        }

        self.writer.write_all(document.line.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }

    /// Number of documents written so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}
