//! Recalc - command-line front end for the recalculating spreadsheet

mod config;

use anyhow::{Context, bail};
use recalc_core::Spreadsheet;
use recalc_core::storage::write_markdown;
use recalc_engine::engine::format_value;
use std::env;
use std::path::PathBuf;

fn print_usage() {
    eprintln!("Usage: recalc [OPTIONS] [FILE]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  [FILE]                    Snapshot file to open (.json)");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -s, --set <NAME=CONTENT>  Set a cell (can be repeated, applied in order)");
    eprintln!("  -g, --get <NAME>          Print a cell value (can be repeated)");
    eprintln!("  -o, --output <FILE>       Export to markdown file");
    eprintln!("  -w, --write               Save changes back to FILE");
    eprintln!("  --config <path>           Load settings from TOML file");
    eprintln!("  --no-config               Ignore the user config file");
    eprintln!("  --version-tag <tag>       Snapshot version tag (overrides config)");
    eprintln!("  --normalize <mode>        identity, upper or lower (overrides config)");
    eprintln!("  -h, --help                Print help");
}

#[derive(Debug, Default)]
struct Options {
    file_path: Option<PathBuf>,
    sets: Vec<String>,
    gets: Vec<String>,
    output_file: Option<PathBuf>,
    write: bool,
    config_file: Option<PathBuf>,
    no_config: bool,
    version_tag: Option<String>,
    normalize: Option<String>,
}

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let mut opts = Options::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_usage();
                return;
            }
            "-s" | "--set" => {
                opts.sets.push(next_value(&args, &mut i, "--set"));
            }
            "-g" | "--get" => {
                opts.gets.push(next_value(&args, &mut i, "--get"));
            }
            "-o" | "--output" => {
                opts.output_file = Some(PathBuf::from(next_value(&args, &mut i, "--output")));
            }
            "-w" | "--write" => opts.write = true,
            "--config" => {
                opts.config_file = Some(PathBuf::from(next_value(&args, &mut i, "--config")));
            }
            "--no-config" => opts.no_config = true,
            "--version-tag" => {
                opts.version_tag = Some(next_value(&args, &mut i, "--version-tag"));
            }
            "--normalize" => {
                opts.normalize = Some(next_value(&args, &mut i, "--normalize"));
            }
            arg if arg.starts_with('-') => {
                eprintln!("Error: Unknown option: {}", arg);
                print_usage();
                std::process::exit(1);
            }
            _ => {
                if opts.file_path.is_none() {
                    opts.file_path = Some(PathBuf::from(&args[i]));
                } else {
                    eprintln!("Error: Unexpected argument: {}", args[i]);
                    print_usage();
                    std::process::exit(1);
                }
            }
        }
        i += 1;
    }

    if let Err(e) = run(opts) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn next_value(args: &[String], i: &mut usize, flag: &str) -> String {
    *i += 1;
    if *i >= args.len() {
        eprintln!("Error: {} requires a value", flag);
        std::process::exit(1);
    }
    args[*i].clone()
}

fn run(opts: Options) -> anyhow::Result<()> {
    let (mut config, warnings) = config::load_config(opts.config_file.as_ref(), !opts.no_config);
    for warning in warnings {
        eprintln!("Warning: {}", warning);
    }
    if let Some(tag) = opts.version_tag {
        config.version = tag;
    }
    if let Some(mode) = opts.normalize.as_deref() {
        config.normalize = mode.parse()?;
    }
    let options = config.sheet_options();

    let mut sheet = match &opts.file_path {
        Some(path) if path.exists() => Spreadsheet::from_file(path, options)
            .with_context(|| format!("Failed to open {}", path.display()))?,
        Some(path) => {
            log::info!("{} does not exist yet; starting empty", path.display());
            let mut sheet = Spreadsheet::with_options(options);
            sheet.file_path = Some(path.clone());
            sheet
        }
        None => Spreadsheet::with_options(options),
    };

    for edit in &opts.sets {
        let Some((name, content)) = edit.split_once('=') else {
            bail!("Expected NAME=CONTENT, got '{}'", edit);
        };
        let order = sheet
            .set_contents_of_cell(name.trim(), content)
            .with_context(|| format!("Cannot set {}", name.trim()))?;
        println!("Recalculated: {}", order.join(", "));
    }

    if opts.gets.is_empty() {
        for name in sheet.names_of_all_nonempty_cells() {
            print_cell(&sheet, name)?;
        }
    } else {
        for name in &opts.gets {
            print_cell(&sheet, name)?;
        }
    }

    if let Some(output_path) = &opts.output_file {
        write_markdown(output_path, &sheet)
            .with_context(|| format!("Failed to export {}", output_path.display()))?;
        eprintln!("Exported to {}", output_path.display());
    }

    if opts.write {
        if sheet.file_path.is_none() {
            bail!("--write requires a FILE");
        }
        let path = sheet.save()?;
        eprintln!("Saved {}", path.display());
    }

    Ok(())
}

fn print_cell(sheet: &Spreadsheet, name: &str) -> anyhow::Result<()> {
    let value = sheet.get_cell_value(name)?;
    println!("{} = {}", name, format_value(value));
    Ok(())
}
