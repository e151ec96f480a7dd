// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! CLI tool for interning blobs into a pool

use clap::{ArgAction, CommandFactory, Parser, Subcommand};
use humansize::{SizeFormatter, BINARY};
use rustc_hash::FxHashMap;
use rustyline::DefaultEditor;
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{
    filter::{EnvFilter, LevelFilter},
    prelude::*,
    registry::Registry,
};
use upool::{config::DEFAULT_INITIAL_CAPACITY, Insertion, Offset, Pool};

macro_rules! die {
    ($fmt:literal, $($arg:tt)*) => {{
        eprintln!($fmt, $($arg)*);
        std::process::exit(1);
    }};

    ($msg:literal) => {{
        eprintln!($msg);
        std::process::exit(1);
    }};
}

/// Longest blob prefix that is printed
const DISPLAY_LEN: usize = 50;

/// Installs the stderr subscriber; library `log` records are bridged into it.
fn init_tracing(quiet: bool, verbose: u8) -> (bool, LevelFilter) {
    let is_verbose = !quiet && verbose > 0;

    let level_filter = if quiet {
        LevelFilter::ERROR
    } else {
        match verbose {
            0 => LevelFilter::WARN,
            1 => LevelFilter::INFO,
            2 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    };

    tracing_log::LogTracer::init().expect("Failed to set log tracer");

    let registry = Registry::default();

    let env_filter = EnvFilter::builder()
        .with_default_directive(level_filter.into())
        .with_env_var("UPOOL_LOG")
        .from_env_lossy()
        .add_directive(
            "rustyline=warn"
                .parse()
                .expect("Failed to parse rustyline directive"),
        );

    let subscriber = registry.with(env_filter).with(
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .compact(),
    );

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        die!("INTERNAL ERROR: setting default tracing::subscriber failed");
    }

    let prev_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        tracing_panic::panic_hook(info);
        prev_hook(info); // daisy-chain to old panic hook
    }));

    (is_verbose, level_filter)
}

fn parse_size_as_u32(s: &str) -> Result<u32, String> {
    let cfg = parse_size::Config::new().with_binary();
    let size = cfg.parse_size(s).map_err(|e| e.to_string())?;

    match u32::try_from(size) {
        Ok(0) => Err("chunk size may not be 0".into()),
        Ok(size) => Ok(size),
        Err(e) => Err(e.to_string()),
    }
}

/// CLI tool for interning blobs into a deduplicating pool
#[derive(Parser, Debug)]
#[command(name = "upool")]
#[command(about = "CLI tool for interning blobs into a deduplicating pool")]
struct ToolArgs {
    /// Suppress all output except for errors. This overrides the -v flag.
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Turn on verbose output. Supply -v multiple times to increase verbosity.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Initial number of slots (rounded up to a power of two)
    #[arg(short, long, default_value_t = DEFAULT_INITIAL_CAPACITY)]
    capacity: u32,

    /// Split input files into chunks of this size (e.g., "4KiB", "512") instead of lines
    #[arg(short = 's', long, value_parser = parse_size_as_u32, value_name = "SIZE")]
    chunk_size: Option<u32>,

    /// Input file to intern before running the command (may be repeated)
    #[arg(short, long = "input", value_name = "FILE")]
    inputs: Vec<PathBuf>,

    /// Command to run (if omitted, starts interactive shell)
    #[command(subcommand)]
    command: Option<ToolCommand>,
}

#[derive(Subcommand, Debug, Clone)]
enum ToolCommand {
    /// Intern a blob
    Insert {
        /// The blob contents
        blob: String,
    },
    /// Get the offset of a blob
    Lookup {
        /// The blob contents
        blob: String,
    },
    /// Intern every line (or chunk) of a file
    Load {
        /// The file to read
        path: PathBuf,
    },
    /// List all blobs, ordered by offset
    #[command(visible_alias = "ls")]
    List {
        /// Show blob sizes and how often each blob was interned
        #[arg(short = 'l', long = "long")]
        long: bool,
    },
    /// Show the most frequently interned blobs
    Top {
        /// Number of blobs to show
        #[arg(default_value_t = 10)]
        count: usize,
    },
    /// Count the number of distinct blobs
    Count,
    /// Show pool statistics
    Info,
}

// Internal shell commands, include all external tool commands
#[derive(Parser, Debug)]
#[command(name = "")]
#[command(no_binary_name = true)]
#[command(disable_version_flag = true)]
#[command(help_template = "
{version}

Available Commands:

{subcommands}

Use `help COMMAND` or `COMMAND --help` for more details.

")]
struct ShellArgs {
    #[command(subcommand)]
    command: ShellCommand,
}

// Shell commands (including ones not available from CLI)
#[derive(Subcommand, Debug, Clone)]
enum ShellCommand {
    #[command(flatten)]
    ToolCmd(ToolCommand),

    /// Exit the current shell
    #[command(visible_alias = "quit")]
    Exit,
}

struct Session {
    pool: Pool,
    chunk_size: Option<u32>,

    /// How often each blob was interned
    hits: FxHashMap<Offset, usize>,

    blobs_read: usize,
    bytes_read: usize,
}

impl Session {
    fn open(capacity: u32, chunk_size: Option<u32>) -> upool::Result<Self> {
        Ok(Self {
            pool: Pool::new(capacity)?,
            chunk_size,
            hits: FxHashMap::default(),
            blobs_read: 0,
            bytes_read: 0,
        })
    }

    fn intern(&mut self, bytes: &[u8]) -> upool::Result<Insertion> {
        let insertion = self.pool.insert(bytes)?;

        *self.hits.entry(insertion.offset).or_default() += 1;
        self.blobs_read += 1;
        self.bytes_read += bytes.len();

        Ok(insertion)
    }

    /// Interns every line or chunk of a file, returning `(read, new)` blob counts.
    fn load(&mut self, path: &Path) -> Result<(usize, usize), Box<dyn std::error::Error>> {
        let bytes = std::fs::read(path)?;

        let blobs: Vec<&[u8]> = match self.chunk_size {
            Some(size) => bytes.chunks(size as usize).collect(),
            None => split_lines(&bytes).collect(),
        };

        let mut added = 0;
        for blob in &blobs {
            if self.intern(blob)?.is_new {
                added += 1;
            }
        }

        info!(
            "Loaded {} blobs ({added} new) from {}",
            blobs.len(),
            path.display()
        );

        Ok((blobs.len(), added))
    }
}

/// Splits on `\n`, dropping a trailing `\r` and the empty piece after a final newline.
fn split_lines(bytes: &[u8]) -> impl Iterator<Item = &[u8]> {
    let bytes = bytes.strip_suffix(b"\n").unwrap_or(bytes);

    bytes
        .split(|&b| b == b'\n')
        .filter(move |_| !bytes.is_empty())
        .map(|line| line.strip_suffix(b"\r").unwrap_or(line))
}

fn display_blob(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) if s.chars().count() > DISPLAY_LEN => {
            format!("{}...", s.chars().take(DISPLAY_LEN).collect::<String>())
        }
        Ok(s) => s.to_string(),
        Err(_) => format!("{bytes:?}"),
    }
}

fn print_info(session: &Session) {
    let pool = &session.pool;

    println!("Blobs: {}", pool.len());
    println!("Capacity: {} slots", pool.capacity());
    println!("Load factor: {:.3}", pool.load_factor());
    println!(
        "Data size: {}",
        SizeFormatter::new(pool.data_len() as u64, BINARY)
    );
    println!("Blobs read: {}", session.blobs_read);
    println!(
        "Bytes read: {}",
        SizeFormatter::new(session.bytes_read as u64, BINARY)
    );

    if session.bytes_read > 0 {
        let saved = session.bytes_read.saturating_sub(pool.data_len());
        println!(
            "Saved by deduplication: {} ({:.1}%)",
            SizeFormatter::new(saved as u64, BINARY),
            saved as f64 / session.bytes_read as f64 * 100.0
        );
    }
}

fn handle_insert(session: &mut Session, blob: &str) {
    match session.intern(blob.as_bytes()) {
        Ok(Insertion {
            offset,
            is_new: true,
        }) => println!("OK (new, offset={offset})"),
        Ok(Insertion {
            offset,
            is_new: false,
        }) => println!("OK (existing, offset={offset})"),
        Err(e) => eprintln!("Error: {e}"),
    }
}

fn handle_lookup(session: &Session, blob: &str) {
    match session.pool.lookup(blob) {
        Some(offset) => println!("{offset}"),
        None => println!("(not found)"),
    }
}

fn handle_load(session: &mut Session, path: &Path) {
    match session.load(path) {
        Ok((read, added)) => println!("OK ({read} blobs read, {added} new)"),
        Err(e) => eprintln!("Error loading {}: {e}", path.display()),
    }
}

fn handle_list(session: &Session, long: bool) {
    let mut blobs = session.pool.iter().collect::<Vec<_>>();
    blobs.sort_unstable_by_key(|(offset, _)| *offset);

    for (offset, bytes) in &blobs {
        if long {
            let seen = session.hits.get(offset).copied().unwrap_or_default();
            println!(
                "{offset}: {} [size={}, seen={seen}]",
                display_blob(bytes),
                bytes.len()
            );
        } else {
            println!("{offset}: {}", display_blob(bytes));
        }
    }

    println!("({} blobs)", blobs.len());
}

fn handle_top(session: &Session, count: usize) {
    let blobs: FxHashMap<Offset, &[u8]> = session.pool.iter().collect();

    let mut hits = session.hits.iter().collect::<Vec<_>>();

    // NOTE: Ties are broken by offset to keep the output stable
    hits.sort_unstable_by(|(a_offset, a_hits), (b_offset, b_hits)| {
        b_hits.cmp(a_hits).then(a_offset.cmp(b_offset))
    });

    for (offset, seen) in hits.into_iter().take(count) {
        match blobs.get(offset) {
            Some(bytes) => println!("{seen}x {offset}: {}", display_blob(bytes)),
            None => println!("{seen}x {offset}: (missing)"),
        }
    }
}

/// Result of executing a command
enum CommandResult {
    Continue,
    Exit,
}

/// Execute a parsed command
fn execute_command(session: &mut Session, cmd: ToolCommand) -> CommandResult {
    match cmd {
        ToolCommand::Insert { blob } => handle_insert(session, &blob),
        ToolCommand::Lookup { blob } => handle_lookup(session, &blob),
        ToolCommand::Load { path } => handle_load(session, &path),
        ToolCommand::List { long } => handle_list(session, long),
        ToolCommand::Top { count } => handle_top(session, count),
        ToolCommand::Count => println!("{}", session.pool.len()),
        ToolCommand::Info => print_info(session),
    }
    CommandResult::Continue
}

/// Execute a shell-only command
fn execute_shell_command(session: &mut Session, cmd: ShellCommand) -> CommandResult {
    match cmd {
        ShellCommand::ToolCmd(tool_cmd) => execute_command(session, tool_cmd),
        ShellCommand::Exit => CommandResult::Exit,
    }
}

/// Parse and run a shell command line
fn run_shell_command(session: &mut Session, line: &str) -> CommandResult {
    let line = line.trim();
    if line.is_empty() {
        return CommandResult::Continue;
    }

    let tokens = match shlex::split(line) {
        Some(t) if !t.is_empty() => t,
        Some(_) => return CommandResult::Continue,
        None => {
            eprintln!("error: unclosed quote");
            return CommandResult::Continue;
        }
    };

    match ShellArgs::try_parse_from(&tokens) {
        Ok(args) => execute_shell_command(session, args.command),
        Err(e) => {
            // Print clap's error message
            eprintln!("{e}");
            CommandResult::Continue
        }
    }
}

fn run_shell(session: &mut Session) {
    if io::stdin().is_terminal() {
        run_shell_interactive(session);
    } else {
        run_shell_non_interactive(session);
    }
}

fn run_shell_interactive(session: &mut Session) {
    println!("Welcome to the upool shell");
    println!("Type 'help' for available commands, 'exit' to quit.\n");

    let mut rl = match DefaultEditor::new() {
        Ok(editor) => editor,
        Err(e) => {
            eprintln!("Error initializing line editor: {e}");
            return;
        }
    };

    loop {
        match rl.readline("upool> ") {
            Ok(line) => {
                let _ = rl.add_history_entry(&line);
                if let CommandResult::Exit = run_shell_command(session, &line) {
                    break;
                }
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                // Ignore Ctrl+C, just show a new prompt
                continue;
            }
            Err(rustyline::error::ReadlineError::Eof) => {
                println!();
                break;
            }
            Err(e) => {
                eprintln!("Error reading input: {e}");
                break;
            }
        }
    }
}

fn run_shell_non_interactive(session: &mut Session) {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        if stdout.flush().is_err() {
            die!("can't flush stdout");
        }

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => {
                // EOF
                break;
            }
            Ok(_) => {
                if let CommandResult::Exit = run_shell_command(session, &line) {
                    break;
                }
            }
            Err(e) => {
                die!("Error reading input: {}", e);
            }
        }
    }
}

fn main() {
    let args = ToolArgs::parse();
    let (verbose, level_filter) = init_tracing(args.quiet, args.verbose);

    let cmd = ToolArgs::command();

    info!(
        "starting {} ({} {}), log level: {level_filter}",
        cmd.get_name(),
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );

    let note = if verbose {
        ""
    } else {
        ". Note: Use -v (one or multiple times) for more information"
    };

    let mut session = match Session::open(args.capacity, args.chunk_size) {
        Ok(s) => s,
        Err(e) => die!("Error creating pool: {}{}", e, note),
    };

    for path in &args.inputs {
        if let Err(e) = session.load(path) {
            die!("Error loading {}: {}{}", path.display(), e, note);
        }
    }

    match args.command {
        Some(cmd) => {
            execute_command(&mut session, cmd);
        }
        None => run_shell(&mut session),
    }
}
