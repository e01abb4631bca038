use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use homoglyph_core::compiler::{self, CompileOptions};
use homoglyph_core::config::CompilerConfig;
use homoglyph_core::table::TableArtifact;

#[derive(Debug, Args)]
pub struct CompileArgs {
    /// Raw mapping data (`SRC; DST [DST...]` lines)
    pub input: PathBuf,

    /// Where to write the JSON table artifact
    pub output: PathBuf,

    /// Compiler config (YAML); discovered automatically when omitted
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

pub fn run(args: &CompileArgs) -> Result<i32> {
    let options = resolve_options(args)?;
    let compiled = compiler::compile_file(&args.input, &options)?;

    let json = TableArtifact::from(&compiled)
        .to_json()
        .context("serializing table artifact")?;
    compiler::write_output(&args.output, json.as_bytes())?;

    let stats = compiled.stats;
    eprintln!(
        "homoglyph: compiled {} confusables in {} classes from {} raw entries -> {}",
        compiled.len(),
        stats.classes,
        stats.raw_entries,
        args.output.display()
    );
    Ok(0)
}

fn resolve_options(args: &CompileArgs) -> Result<CompileOptions> {
    if let Some(path) = &args.config {
        let config = CompilerConfig::load(path)?;
        return config
            .to_options()
            .with_context(|| format!("invalid config {}", path.display()));
    }

    let config = CompilerConfig::discover(None);
    match config.to_options() {
        Ok(options) => Ok(options),
        Err(e) => {
            let origin = config
                .path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "defaults".to_string());
            tracing::warn!("ignoring config {origin}: {e}");
            Ok(CompileOptions::default())
        }
    }
}
