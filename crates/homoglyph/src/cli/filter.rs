use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use homoglyph_core::codec;
use homoglyph_core::report::{self, LineReport};
use homoglyph_core::table::{self, ConfusableTable};
use homoglyph_core::unicode::{self, NormalizationForm};
use homoglyph_core::ConfusableEngine;

#[derive(Debug, Args)]
pub struct FilterArgs {
    /// Only check each line (exit code 0=clean, 1=contains confusables)
    #[arg(short, long)]
    pub check: bool,

    /// Emit one JSON object per checked line
    #[arg(long, requires = "check")]
    pub json: bool,

    /// Unicode normalization applied before confusable normalization
    #[arg(short, long, value_enum, value_name = "TYPE", default_value_t = NormalizeArg::None)]
    pub normalize: NormalizeArg,

    /// Compiled table artifact to use instead of the built-in table
    #[arg(long, env = "HOMOGLYPH_TABLE", value_name = "PATH")]
    pub table: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum NormalizeArg {
    Nfc,
    Nfd,
    Nfkc,
    Nfkd,
    None,
}

impl NormalizeArg {
    pub fn form(self) -> Option<NormalizationForm> {
        match self {
            NormalizeArg::Nfc => Some(NormalizationForm::Nfc),
            NormalizeArg::Nfd => Some(NormalizationForm::Nfd),
            NormalizeArg::Nfkc => Some(NormalizationForm::Nfkc),
            NormalizeArg::Nfkd => Some(NormalizationForm::Nfkd),
            NormalizeArg::None => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Normalize(Option<NormalizationForm>),
    Check { json: bool },
}

impl Mode {
    fn from_args(args: &FilterArgs) -> Self {
        if args.check {
            Mode::Check { json: args.json }
        } else {
            Mode::Normalize(args.normalize.form())
        }
    }
}

pub fn run(args: &FilterArgs) -> Result<i32> {
    let engine = match &args.table {
        Some(path) => {
            let loaded = ConfusableTable::load(path)
                .with_context(|| format!("loading table {}", path.display()))?;
            ConfusableEngine::new(table::install(loaded)?)
        }
        None => ConfusableEngine::global(),
    };

    let mode = Mode::from_args(args);
    let stdin = io::stdin();
    let stdout = io::stdout();
    let detected =
        process(engine, mode, stdin.lock(), stdout.lock()).context("processing standard input")?;

    Ok(if detected { 1 } else { 0 })
}

/// Filter `input` to `output` line by line. Returns whether any checked
/// line contained a confusable; always `false` in normalize mode.
pub fn process(
    engine: ConfusableEngine<'_>,
    mode: Mode,
    mut input: impl BufRead,
    mut output: impl Write,
) -> io::Result<bool> {
    let mut buf = Vec::new();
    let mut line_no = 0;
    let mut detected = false;

    loop {
        buf.clear();
        if input.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        line_no += 1;
        let line = buf.strip_suffix(b"\n").unwrap_or(&buf);
        let text = codec::decode_lossy(line);

        match mode {
            Mode::Check { json } => {
                let found = LineReport::new(line_no, engine.detect(&text));
                detected |= !found.is_clean();
                if json {
                    report::write_json(&found, &mut output)?;
                } else {
                    report::write_human(&found, &mut output)?;
                }
            }
            Mode::Normalize(form) => {
                let text = match form {
                    Some(form) => unicode::unicode_normalize(&text, form, true),
                    None => text,
                };
                let normalized = engine.normalize(&text);
                output.write_all(normalized.as_bytes())?;
                output.write_all(b"\n")?;
            }
        }
    }

    output.flush()?;
    Ok(detected)
}
