// Copyright 2026 the Gamecode Opcodes Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

#![doc = "Code generator for the Ruamoko opcode enum, opcode table and instruction-family dispatch code.\n\n\
          This is a std-only build tool crate. Output goes to stdout and is written only once \
          generation has fully succeeded.\n"]

use std::fs;
use std::io::Write as _;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use gamecode_opcodes::bitpattern::{Bitmap, OpcodeMap, Row};
use gamecode_opcodes::emit::{EnumOptions, render_enum, render_table};
use gamecode_opcodes::families::convert::generate_conversions;
use gamecode_opcodes::families::extend::generate_extends;
use gamecode_opcodes::families::hops::generate_hops;
use gamecode_opcodes::families::swizzle::{Element, generate_dispatch, generate_fixtures};
use gamecode_opcodes::families::{InterpreterSyntax, render_cases};
use gamecode_opcodes::group::{GroupTable, OpcodeTable};
use gamecode_opcodes::trace::{TraceMask, TraceSink};
use gamecode_opcodes::{DEFAULT_BITMAP, DEFAULT_GROUPS, MAIN_ADDRESS_WIDTH};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: gamecode_opcodes_codegen [--bitmap <path>] [--groups <path>] \
                     (enum [debug] | table | convert | extend | hops | swizzle [test])";

#[derive(Clone, Debug, PartialEq, Eq)]
enum Mode {
    Enum { debug: bool },
    Table,
    Convert,
    Extend,
    Hops,
    Swizzle { test: bool },
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct Args {
    bitmap: Option<PathBuf>,
    groups: Option<PathBuf>,
    mode: Mode,
}

/// Returns `None` on a usage error.
fn parse_args(args: impl IntoIterator<Item = String>) -> Option<Args> {
    let mut args = args.into_iter().peekable();
    let mut bitmap = None;
    let mut groups = None;
    loop {
        match args.peek().map(String::as_str) {
            Some("--bitmap") => {
                args.next();
                bitmap = Some(PathBuf::from(args.next()?));
            }
            Some("--groups") => {
                args.next();
                groups = Some(PathBuf::from(args.next()?));
            }
            _ => break,
        }
    }
    let mode = args.next()?;
    let extra = args.next();
    let mode = match (mode.as_str(), extra.as_deref()) {
        ("enum", None) => Mode::Enum { debug: false },
        ("enum", Some("debug")) => Mode::Enum { debug: true },
        ("table", None) => Mode::Table,
        ("convert", None) => Mode::Convert,
        ("extend", None) => Mode::Extend,
        ("hops", None) => Mode::Hops,
        ("swizzle", None) => Mode::Swizzle { test: false },
        ("swizzle", Some("test")) => Mode::Swizzle { test: true },
        _ => return None,
    };
    if args.next().is_some() {
        return None;
    }
    Some(Args {
        bitmap,
        groups,
        mode,
    })
}

/// Forwards expansion events to `tracing`.
struct LogTrace;

impl TraceSink for LogTrace {
    fn mask(&self) -> TraceMask {
        TraceMask::ROW | TraceMask::OVERWRITE
    }

    fn row_start(&mut self, row: &Row) {
        tracing::trace!(
            line = row.line,
            pattern = row.pattern.text(),
            group = row.group.as_deref().unwrap_or("<spare>"),
            "expanding row"
        );
    }

    fn slot_overwrite(&mut self, slot: u32, previous_line: usize, row: &Row) {
        tracing::trace!(slot, previous_line, line = row.line, "slot overwritten");
    }

    fn row_end(&mut self, row: &Row, slots: usize) {
        tracing::trace!(line = row.line, slots, "row expanded");
    }
}

fn read_or_default(path: Option<&PathBuf>, default: &'static str) -> Result<String> {
    match path {
        Some(path) => fs::read_to_string(path).with_context(|| format!("read {}", path.display())),
        None => Ok(default.to_owned()),
    }
}

fn load_table(args: &Args) -> Result<OpcodeTable> {
    let bitmap_name = args
        .bitmap
        .as_ref()
        .map_or_else(|| "embedded bitmap".to_owned(), |p| p.display().to_string());
    let groups_name = args
        .groups
        .as_ref()
        .map_or_else(|| "embedded groups".to_owned(), |p| p.display().to_string());

    let bitmap_text = read_or_default(args.bitmap.as_ref(), DEFAULT_BITMAP)?;
    let groups_text = read_or_default(args.groups.as_ref(), DEFAULT_GROUPS)?;

    let bitmap = Bitmap::parse(&bitmap_text, MAIN_ADDRESS_WIDTH)
        .with_context(|| format!("parse {bitmap_name}"))?;
    let groups =
        GroupTable::from_json(&groups_text).with_context(|| format!("parse {groups_name}"))?;

    let expanded = if tracing::enabled!(tracing::Level::TRACE) {
        let mut sink = LogTrace;
        let mask = sink.mask();
        OpcodeMap::expand_traced(&bitmap, mask, Some(&mut sink))
    } else {
        OpcodeMap::expand(&bitmap)
    };
    let map = expanded.with_context(|| format!("expand {bitmap_name}"))?;

    let table = OpcodeTable::resolve(&map, &groups)
        .with_context(|| format!("resolve {bitmap_name} against {groups_name}"))?;
    tracing::info!(
        slots = table.len(),
        spares = table.spare_count(),
        "opcode table built"
    );
    Ok(table)
}

fn generate(args: &Args) -> Result<String> {
    let syntax = InterpreterSyntax;
    Ok(match args.mode {
        Mode::Enum { debug } => render_enum(&load_table(args)?, EnumOptions { debug }),
        Mode::Table => render_table(&load_table(args)?),
        Mode::Convert => render_cases(&generate_conversions(&syntax)),
        Mode::Extend => render_cases(&generate_extends(&syntax)),
        Mode::Hops => render_cases(&generate_hops(&syntax)),
        Mode::Swizzle { test: true } => generate_fixtures(),
        Mode::Swizzle { test: false } => Element::ALL
            .into_iter()
            .map(|element| generate_dispatch(&syntax, element))
            .collect(),
    })
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let Some(args) = parse_args(std::env::args().skip(1)) else {
        eprintln!("{USAGE}");
        return Ok(ExitCode::FAILURE);
    };
    let rendered = generate(&args)?;
    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(rendered.as_bytes())
        .and_then(|()| stdout.flush())
        .context("write stdout")?;
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Option<Args> {
        parse_args(list.iter().map(|s| (*s).to_owned()))
    }

    fn mode(list: &[&str]) -> Option<Mode> {
        args(list).map(|a| a.mode)
    }

    #[test]
    fn modes() {
        assert_eq!(mode(&["enum"]), Some(Mode::Enum { debug: false }));
        assert_eq!(mode(&["enum", "debug"]), Some(Mode::Enum { debug: true }));
        assert_eq!(mode(&["table"]), Some(Mode::Table));
        assert_eq!(mode(&["swizzle", "test"]), Some(Mode::Swizzle { test: true }));
        assert_eq!(mode(&["hops"]), Some(Mode::Hops));
        assert_eq!(mode(&[]), None);
        assert_eq!(mode(&["tables"]), None);
        assert_eq!(mode(&["table", "debug"]), None);
        assert_eq!(mode(&["enum", "debug", "x"]), None);
        assert_eq!(mode(&["--bitmap"]), None);
    }

    #[test]
    fn path_options() {
        let a = args(&["--groups", "g.json", "--bitmap", "b.txt", "enum"]).unwrap();
        assert_eq!(a.bitmap, Some(PathBuf::from("b.txt")));
        assert_eq!(a.groups, Some(PathBuf::from("g.json")));
        assert_eq!(a.mode, Mode::Enum { debug: false });
    }

    #[test]
    fn generated_files_are_up_to_date() {
        let workspace_root = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        let workspace_root = workspace_root.parent().expect("workspace root");
        let golden = workspace_root.join("gamecode_opcodes/golden");

        let enum_golden = fs::read_to_string(golden.join("opcodes_enum.txt")).expect("read enum");
        let table_golden =
            fs::read_to_string(golden.join("opcodes_table.txt")).expect("read table");

        let rendered_enum = generate(&args(&["enum"]).unwrap()).expect("render enum");
        let rendered_table = generate(&args(&["table"]).unwrap()).expect("render table");

        assert!(
            rendered_enum == enum_golden,
            "golden/opcodes_enum.txt is out of date; regenerate with `cargo run -p gamecode_opcodes_codegen -- enum`"
        );
        assert!(
            rendered_table == table_golden,
            "golden/opcodes_table.txt is out of date; regenerate with `cargo run -p gamecode_opcodes_codegen -- table`"
        );
    }

    #[test]
    fn file_overrides_are_read() {
        let dir = std::env::temp_dir()
            .join(format!("gamecode_opcodes_codegen_{}", std::process::id()));
        fs::create_dir_all(&dir).expect("create temp dir");
        let bitmap = dir.join("bitmap.txt");
        fs::write(&bitmap, "0 0000 mmss\n").expect("write bitmap");
        let a = args(&["--bitmap", bitmap.to_str().expect("utf-8 path"), "enum"]).unwrap();
        let err = generate(&a).expect_err("partial bitmap must fail");
        assert!(format!("{err:#}").contains("bitmap.txt"), "{err:#}");

        let missing = args(&["--groups", "/nonexistent/groups.json", "table"]).unwrap();
        assert!(generate(&missing).is_err());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn family_modes_render() {
        let convert = generate(&args(&["convert"]).unwrap()).unwrap();
        assert_eq!(convert.lines().count(), 224);
        assert!(convert.lines().all(|l| l.starts_with("case 0") && l.ends_with(" break;")));
        let swizzle = generate(&args(&["swizzle"]).unwrap()).unwrap();
        assert!(swizzle.contains("static void *swizzle_f_table[256] = {"));
        assert!(swizzle.contains("static void *swizzle_d_table[256] = {"));
    }
}
