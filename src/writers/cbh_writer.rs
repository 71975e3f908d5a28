use crate::error::Result;
use crate::models::{LabelStyle, OutputLine, QuantityKind};
use crate::utils::constants::{CBH_LABEL_GAP, CBH_LINE_ENDING, CBH_SEPARATOR_WIDTH};
use std::io::Write;

/// Writes PRMS climate-by-HRU text: a three line header followed by one
/// line per timestep, CRLF terminated regardless of platform.
pub struct CbhWriter<W: Write> {
    inner: W,
    lines_written: usize,
}

impl<W: Write> CbhWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            lines_written: 0,
        }
    }

    pub fn write_header(
        &mut self,
        tool_name: &str,
        quantity: QuantityKind,
        labels: LabelStyle,
        columns: usize,
    ) -> Result<()> {
        write!(self.inner, "created by {}{}", tool_name, CBH_LINE_ENDING)?;
        write!(
            self.inner,
            "{}{}{}{}",
            quantity.label(labels),
            CBH_LABEL_GAP,
            columns,
            CBH_LINE_ENDING
        )?;
        write!(
            self.inner,
            "{}{}",
            "#".repeat(CBH_SEPARATOR_WIDTH),
            CBH_LINE_ENDING
        )?;
        Ok(())
    }

    pub fn write_line(&mut self, line: &OutputLine) -> Result<()> {
        write!(self.inner, "{}{}", line, CBH_LINE_ENDING)?;
        self.lines_written += 1;
        Ok(())
    }

    /// Data lines written so far (header excluded)
    pub fn lines_written(&self) -> usize {
        self.lines_written
    }

    pub fn finish(mut self) -> Result<W> {
        self.inner.flush()?;
        Ok(self.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Timestamp;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_header_layout() {
        let mut writer = CbhWriter::new(Vec::new());
        writer
            .write_header("cbh-processor", QuantityKind::Precipitation, LabelStyle::Prms, 12)
            .unwrap();
        let bytes = writer.finish().unwrap();

        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            "created by cbh-processor\r\nprcp      12\r\n########################################\r\n"
        );
    }

    #[test]
    fn test_lines_are_crlf_terminated() {
        let mut writer = CbhWriter::new(Vec::new());
        writer
            .write_line(&OutputLine {
                timestamp: Timestamp::decompose("2050-01-01T00:00:00Z").unwrap(),
                values: vec!["50.0000".to_string()],
            })
            .unwrap();
        assert_eq!(writer.lines_written(), 1);

        let text = String::from_utf8(writer.finish().unwrap()).unwrap();
        assert_eq!(text, "2050 1 1 0 0 0 50.0000\r\n");
    }
}
