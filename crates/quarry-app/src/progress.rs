//! Single-line progress bar for terminals.

use std::io::{self, Write};

use quarry_import::ProgressSink;

const BAR_WIDTH: usize = 30;

/// Draws `status [#####     ]  42%` on one line, redrawn in place with `\r`.
///
/// The line is terminated when a report reaches `1.0` or on
/// [`finish`](Self::finish). Write failures are logged and otherwise
/// ignored.
pub struct TerminalProgress<W: Write> {
    out: W,
    status: String,
    last_percent: Option<u32>,
    line_open: bool,
}

impl<W: Write> TerminalProgress<W> {
    /// Draws onto `out`.
    pub fn new(out: W) -> Self {
        Self {
            out,
            status: String::new(),
            last_percent: None,
            line_open: false,
        }
    }

    /// Ends the current line if one is still open.
    pub fn finish(&mut self) {
        if self.line_open {
            self.line_open = false;
            if let Err(err) = writeln!(self.out).and_then(|()| self.out.flush()) {
                tracing::debug!(error = %err, "progress output failed");
            }
        }
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn draw(&mut self, fraction: f64) -> io::Result<()> {
        let fraction = fraction.clamp(0.0, 1.0);
        let percent = (fraction * 100.0).floor() as u32;
        if self.last_percent == Some(percent) {
            return Ok(());
        }
        self.last_percent = Some(percent);

        let filled = (fraction * BAR_WIDTH as f64).round() as usize;
        write!(
            self.out,
            "\r{} [{}{}] {:>3}%",
            self.status,
            "#".repeat(filled),
            " ".repeat(BAR_WIDTH - filled),
            percent
        )?;
        self.line_open = true;
        if percent == 100 {
            writeln!(self.out)?;
            self.line_open = false;
        }
        self.out.flush()
    }
}

impl<W: Write> ProgressSink for TerminalProgress<W> {
    fn report(&mut self, fraction: f64, status: Option<&str>) {
        if let Some(status) = status {
            self.finish();
            self.status = status.to_string();
            self.last_percent = None;
        }
        if let Err(err) = self.draw(fraction) {
            tracing::debug!(error = %err, "progress output failed");
        }
    }
}
