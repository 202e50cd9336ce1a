use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use colored::Colorize;
use rand::Rng;

use crate::blocks::{default_blocks, load_blocks, BlockRecord};
use crate::controller::{block_leader, is_swap_block, SessionController};
use crate::display::{block_plans_table, print_error, print_section, print_success, schedule_table, vp_label};
use crate::error::{TabletopError, TabletopResult};
use crate::round_log::{persist_jsonl, RoundLog};
use crate::session::session_command;

#[derive(Parser)]
#[command(name = "tabletop", version = "1.0.0", about = "Tabletop experiment session runner: blocks, rounds, roles and round logs.")]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an interactive session in the terminal
    Run {
        /// Start mode (C = unmasked, T = masked)
        #[arg(short, long)]
        mode: String,
        /// Block configuration (JSON); defaults to the bundled blocks
        #[arg(short, long)]
        blocks: Option<PathBuf>,
        /// Session id; a random one is generated if omitted
        #[arg(short, long)]
        session: Option<String>,
        /// Write the round log as JSON lines to this file
        #[arg(short, long)]
        log: Option<PathBuf>,
        /// Start at the Nth configured block (1-based)
        #[arg(long)]
        start_block: Option<usize>,
    },
    /// Show the block schedule with hand swaps and leaders
    Blocks {
        /// Block configuration (JSON); defaults to the bundled blocks
        #[arg(short, long)]
        blocks: Option<PathBuf>,
    },
    /// Show the hands dealt in every round of one block
    Plan {
        /// Block index as configured
        index: u32,
        /// Block configuration (JSON); defaults to the bundled blocks
        #[arg(short, long)]
        blocks: Option<PathBuf>,
    },
}

pub fn run() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    dispatch(cli);
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default)).init();
}

fn dispatch(cli: Cli) {
    let result = match cli.command {
        Commands::Run {
            mode,
            blocks,
            session,
            log,
            start_block,
        } => cmd_run(&mode, blocks.as_deref(), session, log.as_deref(), start_block),
        Commands::Blocks { blocks } => cmd_blocks(blocks.as_deref()),
        Commands::Plan { index, blocks } => cmd_plan(index, blocks.as_deref()),
    };
    if let Err(err) = result {
        print_error(&err.to_string());
        std::process::exit(1);
    }
}

fn resolve_blocks(path: Option<&Path>) -> TabletopResult<Vec<BlockRecord>> {
    match path {
        Some(p) => load_blocks(p),
        None => Ok(default_blocks()),
    }
}

fn new_session_id() -> String {
    format!("{:08x}", rand::thread_rng().gen::<u32>())
}

/// Look up a block by its configured index.
pub fn find_block(blocks: &[BlockRecord], index: u32) -> TabletopResult<&BlockRecord> {
    blocks
        .iter()
        .find(|b| b.index == index)
        .ok_or_else(|| TabletopError::InvalidValue(format!("no block with index {}", index)))
}

/// Build the controller for `run`, optionally placed at the first round of
/// the Nth configured block (1-based).
pub fn prepare_controller(
    blocks: Vec<BlockRecord>,
    mode: &str,
    start_block: Option<usize>,
) -> TabletopResult<SessionController> {
    let mut controller = SessionController::from_config(blocks, mode)?;
    if let Some(n) = start_block {
        if n == 0 {
            return Err(TabletopError::InvalidValue("start block is 1-based".to_string()));
        }
        controller.jump_to(n - 1, 0)?;
    }
    Ok(controller)
}

fn cmd_run(
    mode: &str,
    blocks_path: Option<&Path>,
    session: Option<String>,
    log_path: Option<&Path>,
    start_block: Option<usize>,
) -> TabletopResult<()> {
    let blocks = resolve_blocks(blocks_path)?;
    let mut controller = prepare_controller(blocks, mode, start_block)?;

    let session_id = session.unwrap_or_else(new_session_id);
    let mut round_log = RoundLog::new(&session_id);
    log::info!("session {} started in mode {}", session_id, controller.state().start_mode());

    let summary = session_command(&mut controller, &mut round_log)?;
    println!(
        "  Rounds played: {}  |  records: {}",
        summary.rounds_played.to_string().bold(),
        round_log.len().to_string().bold()
    );

    if let Some(path) = log_path {
        let mut writer = BufWriter::new(File::create(path)?);
        let written = persist_jsonl(&round_log.drain(), &mut writer)?;
        print_success(&format!("Wrote {} records to {}", written, path.display()));
    }
    Ok(())
}

fn cmd_blocks(blocks_path: Option<&Path>) -> TabletopResult<()> {
    let blocks = resolve_blocks(blocks_path)?;
    print_section("Block schedule", &schedule_table(&blocks));
    let total: usize = blocks.iter().map(|b| b.total_rounds()).sum();
    println!("  {} blocks, {} rounds", blocks.len(), total);
    Ok(())
}

fn cmd_plan(index: u32, blocks_path: Option<&Path>) -> TabletopResult<()> {
    let blocks = resolve_blocks(blocks_path)?;
    let block = find_block(&blocks, index)?;

    let swap_note = if is_swap_block(block.index) {
        "hands swapped".red().to_string()
    } else {
        "hands as stored".dimmed().to_string()
    };
    print_section(
        &format!("Block {}", block.index),
        &format!("  {}  |  leader {}", swap_note, vp_label(block_leader(block.index))),
    );
    println!("{}", block_plans_table(block));
    Ok(())
}
