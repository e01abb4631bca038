use std::env;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

// Shares the compiler sources with the library and `homoglyph compile`.
#[allow(dead_code)]
#[path = "src/codec.rs"]
mod codec;
#[allow(dead_code, unused_imports)]
#[path = "src/compiler/mod.rs"]
mod compiler;

fn main() {
    let out_dir = env::var("OUT_DIR").unwrap();
    let manifest_dir = env::var("CARGO_MANIFEST_DIR").unwrap();
    // Data files live under the crate directory so they are included in the
    // crate tarball and `cargo publish` / `cargo install` work correctly.
    let data_dir = Path::new(&manifest_dir).join("assets").join("data");

    compile_confusables(&data_dir, &out_dir);

    println!("cargo:rerun-if-changed=assets/data/confusables.txt");
    println!("cargo:rerun-if-changed=src/codec.rs");
    println!("cargo:rerun-if-changed=src/compiler");
    println!("cargo:rerun-if-changed=build.rs");
}

fn compile_confusables(data_dir: &Path, out_dir: &str) {
    let confusables_path = data_dir.join("confusables.txt");
    let table = compiler::compile_file(&confusables_path, &compiler::CompileOptions::default())
        .unwrap_or_else(|e| panic!("Failed to compile confusables.txt: {e}"));
    if table.is_empty() {
        panic!("confusables.txt produced an empty table");
    }

    let mut code = String::new();
    code.push_str("// Auto-generated from assets/data/confusables.txt by build.rs.\n");
    code.push_str("// DO NOT EDIT. Change the data file or the compiler instead.\n\n");

    code.push_str("/// Confusable unit to canonical form, sorted by key.\n");
    code.push_str("pub const CONFUSABLE_TO_CANONICAL: &[(&str, &str)] = &[\n");
    for (confusable, canonical) in &table.confusable_to_canonical {
        let _ = writeln!(
            code,
            "    (\"{}\", \"{}\"),",
            confusable.escape_default(),
            canonical.escape_default()
        );
    }
    code.push_str("];\n\n");

    code.push_str("/// Canonical form to every confusable of it, sorted by key.\n");
    code.push_str("pub const CANONICAL_TO_CONFUSABLES: &[(&str, &[&str])] = &[\n");
    for (canonical, members) in &table.canonical_to_confusables {
        let _ = write!(code, "    (\"{}\", &[", canonical.escape_default());
        for (i, member) in members.iter().enumerate() {
            if i > 0 {
                code.push_str(", ");
            }
            let _ = write!(code, "\"{}\"", member.escape_default());
        }
        code.push_str("]),\n");
    }
    code.push_str("];\n");

    let count = table.len();
    let classes = table.canonical_to_confusables.len();
    let _ = writeln!(code, "\npub const CONFUSABLE_COUNT: usize = {count};");
    let _ = writeln!(code, "pub const CLASS_COUNT: usize = {classes};");

    let out_path = Path::new(out_dir).join("confusables_gen.rs");
    fs::write(&out_path, code).unwrap();
}
