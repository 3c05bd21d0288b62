// Tue Jan 13 2026 - Alex

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use x86_probe::{
    analysis::CodeAnalyzer,
    config::Config,
    disasm::{Instruction, InstructionIter},
    memory::{Address, MemoryRange, SnapshotMemory, TargetMemory},
    pattern::{Pattern, PatternScanner, ScanCompletion, ScanOptions, ScanOutcome},
    utils::{hex, measure_time, LoggingUtils},
};

#[derive(Parser, Debug)]
#[command(name = "x86-probe")]
#[command(author = "Alex")]
#[command(version = "1.0.0")]
#[command(about = "Instruction lengths, pattern scans and xrefs for 32-bit x86 targets", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long, global = true, help = "PE32 image to analyse")]
    image: Option<PathBuf>,

    #[arg(short, long, global = true, help = "Live process to attach to (Linux)")]
    pid: Option<i32>,

    #[arg(long, global = true, help = "Print results as JSON")]
    json: bool,

    #[arg(long, global = true, help = "Config file path")]
    config: Option<PathBuf>,

    #[arg(long, global = true, help = "Disable the progress spinner")]
    no_progress: bool,

    #[arg(short, long, global = true, action = ArgAction::Count, help = "Increase log verbosity")]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(about = "Length-decode instructions from hex bytes or target memory")]
    Decode {
        #[arg(help = "Hex bytes, e.g. \"55 8B EC\"")]
        bytes: Option<String>,

        #[arg(long, help = "Address of the first instruction")]
        at: Option<String>,

        #[arg(short, long, default_value_t = 1, help = "Instructions to decode from the target")]
        count: usize,
    },

    #[command(about = "Scan target memory for a byte pattern")]
    Scan {
        #[arg(help = "AOB pattern, e.g. \"E8 ?? ?? ?? ??\"")]
        pattern: String,

        #[arg(long, help = "Treat the pattern as an ASCII string")]
        string: bool,

        #[arg(long, help = "Scan start address")]
        start: Option<String>,

        #[arg(long, help = "Scan end address (exclusive)")]
        end: Option<String>,

        #[arg(short, long, help = "Alignment of candidate addresses")]
        alignment: Option<usize>,

        #[arg(short, long, help = "Stop after this many matches")]
        limit: Option<usize>,
    },

    #[command(about = "Find calls to an address or references to a string")]
    Xrefs {
        #[arg(help = "Target address, or string with --string")]
        target: String,

        #[arg(long, help = "Look up a string literal instead of an address")]
        string: bool,

        #[arg(long, help = "Search the writable data section instead of constants")]
        data: bool,
    },

    #[command(about = "Locate the function containing an address")]
    Function {
        #[arg(help = "Address inside the function")]
        address: String,
    },
}

fn main() {
    let args = Args::parse();
    LoggingUtils::init(args.verbose);

    if let Err(e) = run(&args) {
        eprintln!("{} {:#}", "[!]".red(), e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<()> {
    let config = match &args.config {
        Some(path) => Config::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => Config::default(),
    };

    match &args.command {
        Commands::Decode { bytes, at, count } => decode(args, bytes.as_deref(), at.as_deref(), *count),
        Commands::Scan { pattern, string, start, end, alignment, limit } => {
            let pattern = if *string {
                Pattern::from_string(pattern, false)?
            } else {
                Pattern::from_aob(pattern)?
            };
            let target = open_target(args)?;
            let mut options = ScanOptions::from_config(pattern, &config.scan);
            if args.image.is_some() && start.is_none() && end.is_none() {
                options = options.with_range(target.main_module()?.range());
            }
            if start.is_some() || end.is_some() {
                let from = start.as_deref().map(hex::parse_address).transpose()?.unwrap_or(options.range.start());
                let to = match end.as_deref() {
                    Some(end) => hex::parse_address(end)?.as_u64(),
                    None => options.range.end(),
                };
                options = options.with_range(MemoryRange::new(from, to));
            }
            if let Some(alignment) = alignment {
                options = options.with_alignment(*alignment);
            }
            if let Some(limit) = limit {
                options = options.with_limit(*limit);
            }
            scan(args, target.as_ref(), &options)
        }
        Commands::Xrefs { target: what, string, data } => {
            let analyzer = CodeAnalyzer::new(open_target(args)?).with_config(config.analysis.clone());
            let spinner = spinner(args, "Scanning for references...");
            let xrefs = if *string {
                analyzer.string_xrefs(what, !*data, None)?
            } else {
                analyzer.call_xrefs(hex::parse_address(what)?)?
            };
            spinner.finish_and_clear();
            print_addresses(args, &analyzer, &format!("References to {}", what), &xrefs)
        }
        Commands::Function { address } => {
            let analyzer = CodeAnalyzer::new(open_target(args)?).with_config(config.analysis.clone());
            let bounds = analyzer.function_at(hex::parse_address(address)?)?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&bounds)?);
            } else {
                println!("{} start {}  {}", "[+]".green(), bounds.start, name_of(&analyzer, bounds.start));
                println!("{} end   {}  {}", "[+]".green(), bounds.end, name_of(&analyzer, bounds.end));
            }
            Ok(())
        }
    }
}

fn open_target(args: &Args) -> Result<Arc<dyn TargetMemory>> {
    if let Some(path) = &args.image {
        log::info!("loading image {}", path.display());
        let snapshot = SnapshotMemory::load(path).with_context(|| format!("loading {}", path.display()))?;
        return Ok(Arc::new(snapshot));
    }
    if let Some(pid) = args.pid {
        return attach(pid);
    }
    bail!("either --image or --pid is required")
}

#[cfg(target_os = "linux")]
fn attach(pid: i32) -> Result<Arc<dyn TargetMemory>> {
    log::info!("attaching to process {}", pid);
    Ok(Arc::new(x86_probe::memory::ProcessMemory::attach(pid)?))
}

#[cfg(not(target_os = "linux"))]
fn attach(_pid: i32) -> Result<Arc<dyn TargetMemory>> {
    bail!("attaching to a live process is only supported on Linux")
}

fn spinner(args: &Args, message: &str) -> ProgressBar {
    if args.no_progress || args.json {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn decode(args: &Args, bytes: Option<&str>, at: Option<&str>, count: usize) -> Result<()> {
    let base = at.map(hex::parse_address).transpose()?.unwrap_or_default();

    let decoded: Vec<(Address, Vec<u8>, Instruction)> = match bytes {
        Some(text) => {
            let code = hex::parse_bytes(text)?;
            InstructionIter::new(&code, base)
                .map(|(addr, insn)| {
                    let from = (addr - base) as usize;
                    let to = (from + insn.len()).min(code.len());
                    (addr, code[from..to].to_vec(), insn)
                })
                .collect()
        }
        None => {
            if at.is_none() {
                bail!("decode needs hex bytes or --at <address>");
            }
            let analyzer = CodeAnalyzer::new(open_target(args)?);
            let mut out = Vec::with_capacity(count);
            let mut addr = base;
            for _ in 0..count {
                let insn = analyzer.instruction_at(addr)?;
                let raw = analyzer.target().read_bytes(addr, insn.len()).unwrap_or_default();
                out.push((addr, raw, insn));
                addr = addr + insn.len() as u32;
            }
            out
        }
    };

    if args.json {
        let rows: Vec<_> = decoded
            .iter()
            .map(|(addr, raw, insn)| json!({ "address": addr, "bytes": hex::format_bytes(raw), "instruction": insn }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    for (addr, raw, insn) in &decoded {
        let line = format!("{}  {:<30} {}", addr, hex::format_bytes(raw), insn);
        if insn.is_error() {
            println!("{}", line.red());
        } else {
            println!("{}", line);
        }
        if let Some(target) = insn.branch_target(*addr) {
            println!("    {} {}", "->".cyan(), target);
        }
    }
    Ok(())
}

fn scan(args: &Args, target: &dyn TargetMemory, options: &ScanOptions) -> Result<()> {
    let spinner = spinner(args, &format!("Scanning for {}...", options.pattern));
    let (outcome, elapsed) = measure_time(|| PatternScanner::new().scan(target, options));
    spinner.finish_and_clear();
    let outcome: ScanOutcome = outcome?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    println!(
        "{} {} matches for {} in {:.2}s",
        "[+]".green(),
        outcome.len().to_string().green(),
        options.pattern,
        elapsed.as_secs_f64()
    );
    for addr in &outcome.matches {
        let name = target.static_address(*addr).ok().flatten().unwrap_or_default();
        println!("  {}  {}", addr, name.dimmed());
    }

    match outcome.completion {
        ScanCompletion::Exhausted => {}
        ScanCompletion::LimitReached => println!("{} result limit reached", "[*]".blue()),
        ScanCompletion::Truncated { at } => {
            println!("{} region walk stopped at {}; results may be incomplete", "[!]".yellow(), at)
        }
    }
    if outcome.unreadable_regions > 0 {
        println!("{} {} regions could not be read", "[!]".yellow(), outcome.unreadable_regions);
    }
    Ok(())
}

fn print_addresses(args: &Args, analyzer: &CodeAnalyzer, title: &str, addresses: &[Address]) -> Result<()> {
    if args.json {
        println!("{}", serde_json::to_string_pretty(&addresses)?);
        return Ok(());
    }

    println!("{}", title.cyan().bold());
    println!("{}", "-".repeat(40).cyan());
    if addresses.is_empty() {
        println!("  {}", "none".yellow());
    }
    for addr in addresses {
        println!("  {}  {}", addr, name_of(analyzer, *addr).dimmed());
    }
    Ok(())
}

fn name_of(analyzer: &CodeAnalyzer, addr: Address) -> String {
    analyzer.static_address(addr).ok().flatten().unwrap_or_default()
}
