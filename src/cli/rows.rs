use std::{
    collections::BTreeSet,
    io::{Read as _, Write, stdout},
};

use anyhow::{anyhow, bail};
use serde_json::Value;
use supatable::{
    Filter, Query, RowRange,
    rows::{Row, Rows},
};
use tabwriter::TabWriter;

use crate::cli::{Cli, Output, color::*};

const DEFAULT_PAGE_SIZE: u64 = 1000;

#[derive(Debug, clap::Args)]
#[command(after_long_help = CliExamples("
  # Read every column of every row
  supatable -t users read

  # Read two columns of the first ten rows
  supatable -t users read --select id,name --range 0-9

  # Read the rows matching a filter
  supatable -t users read --filter age=gte.18 --filter status=eq.active

  # Walk a large table, 500 rows at a time
  supatable -t events read --page-size 500 --limit 10000
"))]
pub(crate) struct ReadArgs {
    /// Columns to return, separated by commas
    #[arg(long, short, value_delimiter = ',', conflicts_with_all = ["filters", "raw"])]
    pub select: Option<Vec<String>>,
    /// Only return rows matching column=operator.value
    #[arg(long = "filter", short)]
    pub filters: Vec<Filter>,
    /// A raw query fragment, sent verbatim
    #[arg(long)]
    pub raw: Option<String>,
    /// The rows to return, as start-end (inclusive, zero-based)
    #[arg(long, conflicts_with_all = ["page_size", "limit"])]
    pub range: Option<RowRange>,
    /// Read the table in pages of this many rows
    #[arg(long)]
    pub page_size: Option<u64>,
    /// Stop after this many rows
    #[arg(long)]
    pub limit: Option<usize>,
}

#[derive(Debug, clap::Args)]
#[command(after_long_help = CliExamples("
  # Insert a row
  supatable -t users insert '{\"id\": 1, \"name\": \"John\"}'

  # Insert or update several rows, reading them from stdin
  cat users.json | supatable -t users insert --upsert -
"))]
pub(crate) struct InsertArgs {
    /// A JSON object or array of objects, or - to read from stdin
    pub rows: String,
    /// Merge with existing rows on conflict
    #[arg(long)]
    pub upsert: bool,
    /// Filters to send along with the insert
    #[arg(long = "filter", short)]
    pub filters: Vec<Filter>,
}

#[derive(Debug, clap::Args)]
#[command(after_long_help = CliExamples("
  # Rename a user
  supatable -t users update --filter id=eq.1 '{\"name\": \"Jane\"}'
"))]
pub(crate) struct UpdateArgs {
    /// A JSON object with the fields to overwrite, or - to read from stdin
    pub values: String,
    /// Only update rows matching column=operator.value
    #[arg(long = "filter", short, required = true)]
    pub filters: Vec<Filter>,
}

#[derive(Debug, clap::Args)]
#[command(after_long_help = CliExamples("
  # Delete two rows
  supatable -t users delete --filter 'id=in.(1,2)'
"))]
pub(crate) struct DeleteArgs {
    /// Only delete rows matching column=operator.value
    #[arg(long = "filter", short, required = true)]
    pub filters: Vec<Filter>,
}

pub(crate) fn handle_read(cli: &Cli, args: ReadArgs) -> anyhow::Result<()> {
    let ReadArgs {
        select,
        filters,
        raw,
        range,
        page_size,
        limit,
    } = args;

    let query = build_query(select, filters, raw)?;

    let rows = if page_size.is_some() || limit.is_some() {
        let page_size = page_size.unwrap_or(DEFAULT_PAGE_SIZE);
        let rows = cli
            .client
            .read_pages(query, page_size, limit)
            .collect::<Result<Vec<_>, _>>()?;
        Value::Array(rows)
    } else {
        cli.client.read(query, range)?
    };

    print_value(cli, &rows)
}

pub(crate) fn handle_insert(cli: &Cli, args: InsertArgs) -> anyhow::Result<()> {
    let rows = match read_json(&args.rows)? {
        Value::Object(row) => Rows::One(row),
        Value::Array(values) => Rows::Many(
            values
                .into_iter()
                .map(into_row)
                .collect::<anyhow::Result<_>>()?,
        ),
        _ => bail!("Expected a JSON object or an array of objects"),
    };

    let text = cli.client.insert(rows, args.filters, args.upsert)?;
    if text.trim().is_empty() {
        eprintln!("Inserted rows into {}", table_name(cli));
        return Ok(());
    }

    match serde_json::from_str(&text) {
        Ok(value) => print_value(cli, &value),
        Err(_) => {
            println!("{text}");
            Ok(())
        }
    }
}

pub(crate) fn handle_update(cli: &Cli, args: UpdateArgs) -> anyhow::Result<()> {
    let values = into_row(read_json(&args.values)?)?;
    let updated = cli.client.update(values, args.filters)?;
    print_value(cli, &updated)
}

pub(crate) fn handle_delete(cli: &Cli, args: DeleteArgs) -> anyhow::Result<()> {
    cli.client.delete(args.filters)?;
    eprintln!("Deleted matching rows from {}", table_name(cli));
    Ok(())
}

fn build_query(
    select: Option<Vec<String>>,
    mut filters: Vec<Filter>,
    raw: Option<String>,
) -> anyhow::Result<Query> {
    if let Some(columns) = select {
        if !filters.is_empty() || raw.is_some() {
            bail!("--select can't be combined with --filter or --raw");
        }

        return Ok(match columns.as_slice() {
            [column] => Query::from(column.as_str()),
            _ => Query::from(columns),
        });
    }

    filters.extend(raw.map(Filter::raw));
    Ok(match filters.len() {
        0 => Query::SelectAll,
        1 => Query::Filter(filters.remove(0)),
        _ => Query::Filters(filters),
    })
}

fn read_json(arg: &str) -> anyhow::Result<Value> {
    let text = if arg == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        arg.to_owned()
    };

    serde_json::from_str(&text).map_err(|e| anyhow!("Invalid JSON: {e}"))
}

fn into_row(value: Value) -> anyhow::Result<Row> {
    match value {
        Value::Object(row) => Ok(row),
        other => bail!("Expected a JSON object, got: {other}"),
    }
}

fn table_name(cli: &Cli) -> &str {
    cli.client.table().unwrap_or_default()
}

fn print_value(cli: &Cli, value: &Value) -> anyhow::Result<()> {
    match cli.global.output.unwrap_or_default() {
        Output::Json => {
            serde_json::to_writer(stdout(), value)?;
            println!();
        }
        Output::Tty => match value {
            Value::Array(rows) => print_rows(rows)?,
            Value::Null => print_rows(&[])?,
            other => print_rows(std::slice::from_ref(other))?,
        },
    }

    Ok(())
}

fn print_rows(rows: &[Value]) -> anyhow::Result<()> {
    if rows.is_empty() {
        eprintln!("No rows");
        return Ok(());
    }

    let mut columns = Vec::new();
    let mut seen = BTreeSet::new();
    for row in rows {
        if let Value::Object(row) = row {
            for key in row.keys() {
                if seen.insert(key.as_str()) {
                    columns.push(key.as_str());
                }
            }
        }
    }

    let mut out = anstream::stdout().lock();
    let mut tw = TabWriter::new(&mut out).ansi(true);

    if columns.is_empty() {
        writeln!(&mut tw, "{HEADER}VALUE{HEADER:#}")?;
        for row in rows {
            writeln!(&mut tw, "{}", cell(Some(row)))?;
        }
    } else {
        let header = columns
            .iter()
            .map(|c| format!("{HEADER}{c}{HEADER:#}"))
            .collect::<Vec<_>>()
            .join("\t");
        writeln!(&mut tw, "{header}")?;

        for row in rows {
            let line = columns
                .iter()
                .map(|c| cell(row.get(c)))
                .collect::<Vec<_>>()
                .join("\t");
            writeln!(&mut tw, "{line}")?;
        }
    }

    tw.flush()?;
    Ok(())
}

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => format!("{DIM}(null){DIM:#}"),
        Some(Value::String(s)) => s.replace(['\t', '\n'], " "),
        Some(other) => other.to_string(),
    }
}
