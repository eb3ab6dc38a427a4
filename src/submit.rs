use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::recorder::{FinalPayload, SubmittedSession};

/// Receives the finished session. Implementations decide where it goes.
pub trait PayloadSink {
    fn submit(&mut self, payload: &FinalPayload<'_>) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PayloadSink for JsonFileSink {
    fn submit(&mut self, payload: &FinalPayload<'_>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let data = serde_json::to_vec_pretty(payload)?;
        fs::write(&self.path, data)?;
        tracing::info!(path = %self.path.display(), "session payload written");
        Ok(())
    }
}

/// Writes the payload as pretty JSON to any writer, stdout by default.
pub struct WriterSink<W: Write> {
    writer: W,
}

impl WriterSink<io::Stdout> {
    pub fn stdout() -> Self {
        Self {
            writer: io::stdout(),
        }
    }
}

impl<W: Write> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> PayloadSink for WriterSink<W> {
    fn submit(&mut self, payload: &FinalPayload<'_>) -> Result<()> {
        serde_json::to_writer_pretty(&mut self.writer, payload)?;
        writeln!(self.writer)?;
        self.writer.flush()?;
        Ok(())
    }
}

pub fn read_submitted<P: AsRef<Path>>(path: P) -> Result<SubmittedSession> {
    let bytes = fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}
