//! Gridcalc - evaluate spreadsheet formulas from the command line

mod error;

use anyhow::Context;
use clap::Parser;
use directories::ProjectDirs;
use gridcalc_core::{Operator, Table, TableConfig};
use gridcalc_engine::engine::{Point, Value, address_to_point, format_value};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::CliError;

#[derive(Parser, Debug)]
#[command(name = "gridcalc", version, about = "Evaluate spreadsheet formulas against a small table.")]
struct Cli {
    /// Formula to evaluate; the leading `=` is optional.
    #[arg(short = 'c', long = "command", value_name = "FORMULA")]
    command: Option<String>,

    /// Write a cell before evaluating, parsed as if typed (repeatable).
    #[arg(long = "set", value_name = "ADDR=TEXT")]
    set: Vec<String>,

    /// Number of rows (grown to fit `--set` addresses).
    #[arg(long)]
    rows: Option<usize>,

    /// Number of columns (grown to fit `--set` addresses).
    #[arg(long)]
    cols: Option<usize>,

    /// Load table settings from this TOML file.
    #[arg(long, value_name = "PATH", conflicts_with = "no_config")]
    config: Option<PathBuf>,

    /// Ignore the user config file.
    #[arg(long)]
    no_config: bool,
}

fn user_config_path() -> Option<PathBuf> {
    let proj = ProjectDirs::from("", "", "gridcalc")?;
    let mut path = proj.config_dir().to_path_buf();
    path.push("config.toml");
    Some(path)
}

fn load_config(cli: &Cli) -> anyhow::Result<TableConfig> {
    if cli.no_config {
        return Ok(TableConfig::default());
    }
    if let Some(path) = &cli.config {
        return TableConfig::load(path)
            .with_context(|| format!("failed to load {}", path.display()));
    }
    match user_config_path() {
        Some(path) if path.exists() => {
            log::debug!("using config {}", path.display());
            TableConfig::load(&path).with_context(|| format!("failed to load {}", path.display()))
        }
        _ => Ok(TableConfig::default()),
    }
}

fn parse_assignment(arg: &str) -> error::Result<(Point, String)> {
    let (address, text) = arg
        .split_once('=')
        .ok_or_else(|| CliError::InvalidAssignment(arg.to_string()))?;
    let point = address_to_point(address.trim())
        .filter(|p| p.y > 0 && p.x > 0)
        .ok_or_else(|| CliError::InvalidAddress(address.to_string()))?;
    Ok((point, text.to_string()))
}

fn build_table(cli: &Cli, assignments: &[(Point, String)]) -> anyhow::Result<Table> {
    let mut config = load_config(cli)?;
    if let Some(rows) = cli.rows {
        config.num_rows = rows;
    }
    if let Some(cols) = cli.cols {
        config.num_cols = cols;
    }
    for (point, _) in assignments {
        config.num_rows = config.num_rows.max(point.y);
        config.num_cols = config.num_cols.max(point.x);
    }

    let mut table = Table::new(config, HashMap::new())?;
    for (point, text) in assignments {
        table = table.write(*point, text, Operator::System)?;
    }
    Ok(table)
}

fn print_table(table: &Table) {
    for y in 1..=table.num_rows() {
        let row: Vec<String> = (1..=table.num_cols())
            .map(|x| table.render(Point::new(y, x)))
            .collect();
        println!("{}", row.join("\t").trim_end());
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let assignments = match cli
        .set
        .iter()
        .map(|arg| parse_assignment(arg))
        .collect::<error::Result<Vec<_>>>()
    {
        Ok(assignments) => assignments,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    };

    let table = match build_table(&cli, &assignments) {
        Ok(table) => table,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };

    let Some(command) = &cli.command else {
        print_table(&table);
        return;
    };

    let formula = if command.starts_with('=') {
        command.clone()
    } else {
        format!("={}", command)
    };
    let formula = table.absolutize(&formula);
    match table.solve_formula(&Value::Text(formula), true) {
        Ok(value) => println!("{}", format_value(&value)),
        Err(e) => {
            println!("{}", e.code());
            eprintln!("Error: {}", e.message);
            std::process::exit(1);
        }
    }
}
