use std::path::PathBuf;

use clap::Parser;
use comfy_table::{Cell, Table as ComfyTable, presets::UTF8_FULL};
use contentql::{
    AdapterRegistry, Connection, ConnectionConfig, DriverConfig, QueryResult, Row, parse_statement,
};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

/// contentql interactive client
#[derive(Parser, Debug)]
#[command(name = "contentql")]
#[command(about = "Run SQL against a content-management API", long_about = None)]
struct Args {
    /// Config file (default: /etc/contentql, the user config dir, ./contentql.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Connection name from the config file
    #[arg(short = 'c', long)]
    connection: Option<String>,

    /// Record requests instead of sending them
    #[arg(long)]
    dry_run: bool,

    /// Execute one statement and exit
    #[arg(short = 'e', long)]
    execute: Option<String>,

    /// With --execute: print the compiled statements instead of running them
    #[arg(long)]
    explain: bool,
}

fn connection_config(args: &Args) -> Result<ConnectionConfig, Box<dyn std::error::Error>> {
    let config = DriverConfig::load(args.config.as_deref())?;
    match config.connection(args.connection.as_deref()) {
        Ok(connection) => Ok(connection),
        Err(err) if args.dry_run => {
            warn!(error = %err, "using an unconfigured connection for the dry run");
            let name = args.connection.clone().unwrap_or(config.default);
            Ok(ConnectionConfig::new(name))
        }
        Err(err) => Err(err.into()),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("contentql=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = connection_config(&args)?;
    let registry = AdapterRegistry::with_defaults();

    let connection = if args.dry_run {
        Connection::pretend(&config, &registry)?.0
    } else {
        Connection::connect(&config, &registry)?
    };

    if let Some(sql) = &args.execute {
        if args.explain {
            explain(&connection, sql)?;
        } else {
            execute(&connection, sql)?;
        }
        return Ok(());
    }

    repl(&connection)
}

fn repl(connection: &Connection) -> Result<(), Box<dyn std::error::Error>> {
    let mut rl = DefaultEditor::new()?;

    let history_file = dirs::home_dir().map(|mut p| {
        p.push(".contentql_history");
        p
    });

    if let Some(ref path) = history_file {
        // absent on first run
        let _ = rl.load_history(path);
    }

    println!(
        "Connected to [{}] (adapter {}, prefix '{}').",
        connection.name(),
        connection.adapter_name(),
        connection.prefix()
    );
    println!("Type \\? for help, \\q to quit.\n");

    loop {
        match rl.readline("contentql> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line);

                if line.starts_with('\\') {
                    if !meta_command(connection, line) {
                        break;
                    }
                    continue;
                }

                if let Err(e) = execute(connection, line) {
                    eprintln!("ERROR: {e}");
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("Error: {err}");
                break;
            }
        }
    }

    if let Some(ref path) = history_file
        && let Err(err) = rl.save_history(path)
    {
        debug!(error = %err, "history not saved");
    }
    Ok(())
}

/// Handles a `\` command; returns false to quit.
fn meta_command(connection: &Connection, line: &str) -> bool {
    match line {
        "\\q" | "\\quit" => return false,
        "\\?" | "\\h" | "\\help" => {
            println!("Meta-commands:");
            println!("  \\q, \\quit          - Quit");
            println!("  \\d <table>         - Describe table columns");
            println!("  \\explain <sql>     - Show the compiled statements");
            println!("  \\?, \\h, \\help      - Show this help");
            println!("\nSQL commands: SELECT, INSERT, UPDATE, DELETE, CREATE TABLE, DROP TABLE, ALTER TABLE");
        }
        _ if line.starts_with("\\d ") => {
            let table = line["\\d ".len()..].trim();
            match connection.schema().columns(table) {
                Ok(columns) => {
                    let rows: Vec<Row> = columns.iter().map(contentql::ColumnInfo::to_row).collect();
                    print!("{}", format_rows(&rows));
                }
                Err(e) => eprintln!("ERROR: {e}"),
            }
        }
        _ if line.starts_with("\\explain ") => {
            if let Err(e) = explain(connection, line["\\explain ".len()..].trim()) {
                eprintln!("ERROR: {e}");
            }
        }
        _ => println!("Unknown meta-command: {line}. Use \\? for help."),
    }
    true
}

fn execute(connection: &Connection, sql: &str) -> Result<(), Box<dyn std::error::Error>> {
    let statement = parse_statement(sql)?;
    match connection.run(&statement)? {
        QueryResult::Rows(rows) => print!("{}", format_rows(&rows)),
        QueryResult::Affected(count) => println!("{count} row(s) affected"),
        QueryResult::Success(message) => println!("{message}"),
    }
    Ok(())
}

fn explain(connection: &Connection, sql: &str) -> Result<(), Box<dyn std::error::Error>> {
    let statement = parse_statement(sql)?;
    for compiled in connection.explain(&statement)? {
        println!("{}", serde_json::to_string_pretty(&compiled.to_json())?);
    }
    Ok(())
}

fn format_rows(rows: &[Row]) -> String {
    if rows.is_empty() {
        return "(0 rows)\n".to_string();
    }

    // union of keys, first-seen order
    let mut columns: Vec<&str> = Vec::new();
    for row in rows {
        for key in row.keys() {
            if !columns.contains(&key.as_str()) {
                columns.push(key);
            }
        }
    }

    let mut table = ComfyTable::new();
    table.load_preset(UTF8_FULL);
    table.set_header(columns.iter().map(Cell::new));
    for row in rows {
        table.add_row(columns.iter().map(|column| {
            Cell::new(
                row.get(*column)
                    .map_or_else(String::new, contentql::core::row::display_cell),
            )
        }));
    }

    format!("{table}\n({} rows)\n", rows.len())
}
