use std::collections::BTreeSet;
use std::io::Write;

const SCHEMA_VERSION: u32 = 1;

/// Result of checking one input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineReport {
    /// 1-based line number.
    pub line: usize,
    pub confusables: BTreeSet<String>,
}

impl LineReport {
    pub fn new(line: usize, confusables: BTreeSet<String>) -> Self {
        Self { line, confusables }
    }

    pub fn is_clean(&self) -> bool {
        self.confusables.is_empty()
    }
}

/// JSON output wrapper with schema version.
#[derive(serde::Serialize)]
pub struct JsonLine<'a> {
    pub schema_version: u32,
    pub line: usize,
    pub clean: bool,
    pub confusables: &'a BTreeSet<String>,
}

/// Write a line report as one JSON object followed by a newline.
pub fn write_json(report: &LineReport, mut w: impl Write) -> std::io::Result<()> {
    let output = JsonLine {
        schema_version: SCHEMA_VERSION,
        line: report.line,
        clean: report.is_clean(),
        confusables: &report.confusables,
    };
    serde_json::to_writer(&mut w, &output)?;
    writeln!(w)?;
    Ok(())
}

/// Write `CLEAN` or `CONFUSABLES_DETECTED: 'x', 'y'`.
pub fn write_human(report: &LineReport, mut w: impl Write) -> std::io::Result<()> {
    if report.is_clean() {
        return writeln!(w, "CLEAN");
    }

    write!(w, "CONFUSABLES_DETECTED: ")?;
    for (i, confusable) in report.confusables.iter().enumerate() {
        if i > 0 {
            write!(w, ", ")?;
        }
        write!(w, "'{confusable}'")?;
    }
    writeln!(w)
}
