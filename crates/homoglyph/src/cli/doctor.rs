use std::path::PathBuf;

use clap::Args;
use homoglyph_core::compiler::DEFAULT_EMOJI_PLACEHOLDER;
use homoglyph_core::config::{self, CONFIG_ENV};
use homoglyph_core::table::{self, ConfusableTable};

#[derive(Debug, Args)]
pub struct DoctorArgs {
    /// Print machine-readable JSON
    #[arg(long)]
    pub json: bool,

    /// Inspect this table artifact instead of the built-in table
    #[arg(long, env = "HOMOGLYPH_TABLE", value_name = "PATH")]
    pub table: Option<PathBuf>,
}

pub fn run(args: &DoctorArgs) -> i32 {
    let info = gather_info(args);

    if args.json {
        match serde_json::to_string_pretty(&info) {
            Ok(s) => println!("{s}"),
            Err(e) => {
                eprintln!("homoglyph: JSON serialization failed: {e}");
                return 1;
            }
        }
    } else {
        print_human(&info);
    }
    if info.table_error.is_some() {
        1
    } else {
        0
    }
}

#[derive(serde::Serialize)]
struct DoctorInfo {
    version: String,
    binary_path: String,
    unicode_version: String,
    table_source: String,
    table_entries: usize,
    table_classes: usize,
    table_error: Option<String>,
    builtin_entries: usize,
    emoji_placeholder: String,
    config_path: Option<String>,
    config_env: Option<String>,
    log_filter: Option<String>,
}

fn gather_info(args: &DoctorArgs) -> DoctorInfo {
    let binary_path = std::env::current_exe()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    let builtin = table::builtin();
    let (table_source, loaded, table_error) = match &args.table {
        Some(path) => match ConfusableTable::load(path) {
            Ok(t) => (path.display().to_string(), Some(t), None),
            Err(e) => (path.display().to_string(), None, Some(e.to_string())),
        },
        None => ("built-in".to_string(), None, None),
    };
    let active = loaded.as_ref().unwrap_or(builtin);
    let (table_entries, table_classes) = if table_error.is_some() {
        (0, 0)
    } else {
        (active.len(), active.class_count())
    };

    // The placeholder is the canonical form of any emoji in the table.
    let emoji_placeholder = active
        .lookup("\u{1F600}")
        .unwrap_or(DEFAULT_EMOJI_PLACEHOLDER)
        .to_string();

    DoctorInfo {
        version: env!("CARGO_PKG_VERSION").to_string(),
        binary_path,
        unicode_version: table::unicode_version(),
        table_source,
        table_entries,
        table_classes,
        table_error,
        builtin_entries: builtin.len(),
        emoji_placeholder,
        config_path: config::discover_config_path(None).map(|p| p.display().to_string()),
        config_env: std::env::var(CONFIG_ENV).ok(),
        log_filter: std::env::var("HOMOGLYPH_LOG").ok(),
    }
}

fn print_human(info: &DoctorInfo) {
    eprintln!("homoglyph {}", info.version);
    eprintln!("  binary:       {}", info.binary_path);
    eprintln!("  unicode:      {}", info.unicode_version);
    eprintln!("  table:        {}", info.table_source);
    match &info.table_error {
        Some(e) => eprintln!("  table status: UNUSABLE ({e})"),
        None => eprintln!(
            "  entries:      {} in {} classes",
            info.table_entries, info.table_classes
        ),
    }
    eprintln!("  built-in:     {} entries", info.builtin_entries);
    eprintln!("  placeholder:  {}", info.emoji_placeholder);
    eprintln!(
        "  config:       {}",
        info.config_path.as_deref().unwrap_or("(none found)")
    );
    if let Some(ref env) = info.config_env {
        eprintln!("  config env:   {env} ({CONFIG_ENV})");
    }
    eprintln!(
        "  log filter:   {}",
        info.log_filter.as_deref().unwrap_or("warn (default)")
    );
}
