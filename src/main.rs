use std::io::{stdin, stdout, Write};
use std::path::PathBuf;

use clap::Parser;
use eyre::{Result, WrapErr};
use tracing_subscriber::EnvFilter;

use leafdb::constants::layout_constants;
use leafdb::virtual_machine::{prepare_statement, VMResult, VirtualMachine};
use leafdb::{Table, TableConfig};

#[derive(Parser)]
#[command(name = "leafdb", about = "Single-table record store on a paged file")]
struct Cli {
    /// Database file, created if it does not exist.
    filename: PathBuf,
    /// Refuse to cache more than this many pages.
    #[arg(long)]
    max_pages: Option<u32>,
    /// Skip the fsync after flushing on exit.
    #[arg(long)]
    no_sync: bool,
}

enum MetaCommand<'a> {
    Exit,
    Constants,
    BTree,
    Unsupported(&'a str),
}

enum ReplAction<'a> {
    Meta(MetaCommand<'a>),
    Statement { original_input: &'a str },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {:?}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let mut config = TableConfig::default().with_sync_on_close(!cli.no_sync);
    if let Some(max_pages) = cli.max_pages {
        config = config.with_max_pages(max_pages);
    }

    let mut table = Table::open_with_config(&cli.filename, &config)
        .wrap_err_with(|| format!("unable to open {}", cli.filename.display()))?;

    let mut input_buffer = String::new();

    loop {
        input_buffer.clear();
        print!("db > ");
        let input = read_user_input(&mut input_buffer).wrap_err("error reading input")?;

        // end of input behaves like .exit
        let action = match input {
            Some(line) => ReplAction::from(line),
            None => ReplAction::Meta(MetaCommand::Exit),
        };

        match action {
            ReplAction::Meta(MetaCommand::Exit) => break,
            ReplAction::Meta(MetaCommand::Constants) => {
                println!("Constants:");
                println!("{}", layout_constants());
            }
            ReplAction::Meta(MetaCommand::BTree) => {
                println!("Tree:");
                println!("{}", table.leaf_summary()?);
            }
            ReplAction::Meta(MetaCommand::Unsupported(command)) => {
                println!("Unrecognized command {}", command)
            }
            ReplAction::Statement { original_input } => {
                let statement = match prepare_statement(original_input) {
                    Ok(statement) => statement,
                    Err(e) => {
                        println!("{}", e);
                        continue;
                    }
                };

                let mut vm = VirtualMachine { table: &mut table };
                match vm.execute_statement(statement) {
                    Ok(VMResult::Rows(rows)) => {
                        rows.iter().for_each(|row| println!("{}", row));
                        println!("Executed.");
                    }
                    Ok(VMResult::Success) => println!("Executed."),
                    Err(e) if e.is_recoverable() => println!("Table Error: {}", e),
                    Err(e) => return Err(e).wrap_err("fatal storage error"),
                }
            }
        }
    }

    table.close().wrap_err("error closing table")?;
    Ok(())
}

/// Reads one line without its newline. `None` means end of input.
fn read_user_input(input_buffer: &mut String) -> std::io::Result<Option<&str>> {
    stdout().flush()?;
    let n = stdin().read_line(input_buffer)?;
    if n == 0 {
        // no newline was echoed, keep the shell prompt off our line
        stdout().write_all(b"\n")?;
        return Ok(None);
    }
    Ok(Some(input_buffer.trim_end_matches(['\n', '\r'])))
}

impl<'a> From<&'a str> for ReplAction<'a> {
    fn from(s: &'a str) -> Self {
        if let Some('.') = s.chars().next() {
            ReplAction::Meta(s.into())
        } else {
            ReplAction::Statement { original_input: s }
        }
    }
}

impl<'a> From<&'a str> for MetaCommand<'a> {
    fn from(s: &'a str) -> Self {
        match s.trim() {
            ".exit" => MetaCommand::Exit,
            ".constants" => MetaCommand::Constants,
            ".btree" => MetaCommand::BTree,
            _ => MetaCommand::Unsupported(s),
        }
    }
}
