//! Per-tick CSV trace of cart positions and pole angles.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Buffered CSV writer: one line per tick, no header row, one file per
/// episode. Lines are appended in tick order; the buffer never reorders
/// them.
pub struct TelemetryLog {
    writer: BufWriter<File>,
}

impl TelemetryLog {
    /// Open (truncating) the per-episode trace file.
    ///
    /// # Errors
    ///
    /// Any filesystem error opening the file.
    pub fn create(path: &Path) -> io::Result<Self> {
        Ok(Self {
            writer: BufWriter::new(File::create(path)?),
        })
    }

    /// Append one tick: cart positions first, then pole angles in pole
    /// order.
    ///
    /// # Errors
    ///
    /// Any write error; the caller aborts the episode rather than dropping
    /// the line.
    pub fn record(&mut self, values: &[f64]) -> io::Result<()> {
        let mut first = true;
        for value in values {
            if first {
                write!(self.writer, "{value}")?;
                first = false;
            } else {
                write!(self.writer, ",{value}")?;
            }
        }
        writeln!(self.writer)
    }

    /// Flush buffered lines to disk. Dropping the log flushes too, but only
    /// `finish` surfaces the error.
    ///
    /// # Errors
    ///
    /// Any flush error.
    pub fn finish(mut self) -> io::Result<()> {
        self.writer.flush()
    }
}
