//! Record serialization
//!
//! A record is written with a single `write_all` per packet. TSV records are
//! `<value1>\t<value2>\t...\t<valueN>\n`, the optional preamble names the columns.

use std::io::Write;

use crate::errors::Error;
use crate::format::{FieldRegistry, Record};

pub const FIELD_SEPARATOR: char = '\t';
pub const RECORD_TERMINATOR: char = '\n';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordFormat {
    /// Tab separated values, `-` for unset fields.
    #[default]
    Tsv,
    /// One Json object per line, `null` for unset fields.
    Json,
}

pub struct RecordEmitter<W: Write> {
    out: W,
    format: RecordFormat,
    line: String,
}

impl<W: Write> RecordEmitter<W> {
    pub fn new(out: W, format: RecordFormat) -> Self {
        Self {
            out,
            format,
            line: String::with_capacity(1024),
        }
    }

    /// Write the version and `# Fields:` lines. Only done for persistent sinks, before any
    /// record.
    pub fn write_preamble(&mut self, registry: &FieldRegistry) -> Result<(), Error> {
        writeln!(
            self.out,
            "# {} version {}",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION")
        )?;
        writeln!(self.out, "# Fields: {}", registry.header_line())?;

        Ok(())
    }

    /// Write the registry's current values as one record and reset the registry.
    pub fn emit(&mut self, registry: &mut FieldRegistry) -> Result<(), Error> {
        let format = self.format;
        let line = &mut self.line;
        line.clear();

        registry.emit_and_reset(|record| match format {
            RecordFormat::Tsv => {
                render_tsv(line, &record);
                Ok(())
            }
            RecordFormat::Json => render_json(line, &record),
        })?;
        self.line.push(RECORD_TERMINATOR);

        self.out.write_all(self.line.as_bytes())?;

        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), Error> {
        self.out.flush()?;
        Ok(())
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

fn render_tsv(line: &mut String, record: &Record<'_>) {
    for (i, column) in record.columns().enumerate() {
        if i > 0 {
            line.push(FIELD_SEPARATOR);
        }
        line.push_str(column);
    }
}

fn render_json(line: &mut String, record: &Record<'_>) -> Result<(), Error> {
    let json = serde_json::to_string(record)
        .map_err(|e| Error::ParseError(format!("record to json: {}", e)))?;
    line.push_str(&json);
    Ok(())
}
