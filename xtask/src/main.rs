use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use std::process::{Command, Stdio};
use std::time::Instant;

/// Vertex codes the smoke check feeds to `pspge describe`
///
/// Float position, 8888 color + float position, u16 uv + s16 position with
/// 16-bit indices, and a two-target morph of s8 normals and positions.
const SMOKE_CODES: [&str; 4] = ["0x180", "0x19C", "0x1102", "0x400A0"];

/// Frames presented by the smoke simulation
const SMOKE_FRAMES: u32 = 8;

#[derive(Parser)]
#[command(name = "x")]
#[command(about = "Development automation for pspge")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run all CI checks (fmt, clippy, tests, doctests, smoke)
    Ci {
        #[arg(long)]
        verbose: bool,
    },
    /// Quick checks before commit (fmt, clippy, unit tests)
    Check {
        #[arg(long)]
        verbose: bool,
    },
    /// Format code
    Fmt {
        #[arg(long)]
        check: bool,
    },
    /// Run clippy on every target
    Clippy {
        #[arg(long)]
        fix: bool,
    },
    /// Run tests, optionally limited to some modules
    Test {
        /// Run only the doc examples
        #[arg(long)]
        doc: bool,
        /// Modules to test (all when omitted)
        #[arg(value_enum)]
        modules: Vec<Module>,
    },
    /// Run the criterion benches
    Bench {
        #[arg(value_enum)]
        group: Option<BenchGroup>,
    },
    /// Exercise the CLI: describe a few formats and simulate a few frames
    Smoke {
        #[arg(long)]
        release: bool,
    },
    /// Run the headless frame simulation
    Simulate {
        /// Number of frames to present
        #[arg(short = 'n', long, default_value = "60")]
        frames: u32,
        #[arg(long)]
        release: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Module {
    Vertex,
    Draw,
    Framebuffer,
    Memory,
    Capture,
}

impl Module {
    fn path(self) -> &'static str {
        match self {
            Module::Vertex => "core::vertex",
            Module::Draw => "core::draw",
            Module::Framebuffer => "core::framebuffer",
            Module::Memory => "core::memory",
            Module::Capture => "core::capture",
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum BenchGroup {
    Decode,
    Plan,
    Index,
    Submit,
    Framebuffer,
}

impl BenchGroup {
    /// Criterion filter matching the bench names in `benches/vertex_bench.rs`
    fn filter(self) -> &'static str {
        match self {
            BenchGroup::Decode => "decode/",
            BenchGroup::Plan => "plan_",
            BenchGroup::Index => "index_bounds",
            BenchGroup::Submit => "submit_prim",
            BenchGroup::Framebuffer => "framebuffer_frame",
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Ci { verbose } => run_ci(verbose),
        Commands::Check { verbose } => run_check(verbose),
        Commands::Fmt { check } => run_fmt(check),
        Commands::Clippy { fix } => run_clippy(fix),
        Commands::Test { doc: true, .. } => run_doctests(),
        Commands::Test { modules, .. } => run_tests(&modules),
        Commands::Bench { group } => run_bench(group),
        Commands::Smoke { release } => run_smoke(release),
        Commands::Simulate { frames, release } => run_simulate(frames, release),
    }
}

fn run_ci(verbose: bool) -> Result<()> {
    println!("{}", "=== pspge CI ===".bold().blue());
    let start = Instant::now();

    run_task("Format Check", || run_fmt(true), verbose)?;
    run_task("Clippy", || run_clippy(false), verbose)?;
    run_task("Tests", || run_tests(&[]), verbose)?;
    run_task("Doc examples", run_doctests, verbose)?;
    run_task("CLI smoke", || run_smoke(false), verbose)?;

    finished("CI passed in", start);
    Ok(())
}

fn run_check(verbose: bool) -> Result<()> {
    println!("{}", "=== Quick Checks ===".bold().blue());
    let start = Instant::now();

    run_task("Format Check", || run_fmt(true), verbose)?;
    run_task("Clippy", || run_clippy(false), verbose)?;
    run_task("Unit tests", || cargo(&["test", "--lib"]), verbose)?;

    finished("Checks passed in", start);
    Ok(())
}

fn run_fmt(check: bool) -> Result<()> {
    if check {
        cargo(&["fmt", "--all", "--", "--check"])
    } else {
        cargo(&["fmt", "--all"])
    }
}

fn run_clippy(fix: bool) -> Result<()> {
    if fix {
        cargo(&["clippy", "--all-targets", "--fix"])
    } else {
        cargo(&["clippy", "--all-targets", "--", "-D", "warnings"])
    }
}

fn run_doctests() -> Result<()> {
    cargo(&["test", "--doc"])
}

/// Run every test, or each selected module's unit tests in turn
fn run_tests(modules: &[Module]) -> Result<()> {
    if modules.is_empty() {
        return cargo(&["test", "--workspace"]);
    }

    let mut failed = Vec::new();
    for &module in modules {
        println!("{} Testing {}", "→".blue(), module.path().bold());
        if cargo(&["test", "--lib", module.path()]).is_err() {
            failed.push(module.path());
        }
    }

    if failed.is_empty() {
        Ok(())
    } else {
        anyhow::bail!("Tests failed in: {}", failed.join(", "))
    }
}

fn run_bench(group: Option<BenchGroup>) -> Result<()> {
    match group {
        Some(group) => cargo(&["bench", "--bench", "vertex_bench", "--", group.filter()]),
        None => cargo(&["bench", "--bench", "vertex_bench"]),
    }
}

fn run_smoke(release: bool) -> Result<()> {
    for code in SMOKE_CODES {
        pspge(release, &["describe", code])?;
    }
    pspge(release, &["simulate", "--frames", &SMOKE_FRAMES.to_string()])
}

fn run_simulate(frames: u32, release: bool) -> Result<()> {
    if frames == 0 {
        anyhow::bail!("Frame count must be at least 1");
    }

    println!(
        "{} Simulating {} frames ({})",
        "→".blue(),
        frames.to_string().bold(),
        if release { "release".green() } else { "debug".yellow() }
    );
    let start = Instant::now();
    pspge(release, &["simulate", "--frames", &frames.to_string()])?;
    finished("Simulation completed in", start);
    Ok(())
}

/// Run the `pspge` binary through cargo
fn pspge(release: bool, args: &[&str]) -> Result<()> {
    let mut cmd = Command::new("cargo");
    cmd.args(["run", "--quiet", "--bin", "pspge"]);
    if release {
        cmd.arg("--release");
    }
    cmd.arg("--").args(args);
    execute_command(&mut cmd)
}

fn cargo(args: &[&str]) -> Result<()> {
    execute_command(Command::new("cargo").args(args))
}

fn finished(message: &str, start: Instant) {
    println!(
        "\n{} {}",
        format!("✓ {message}").green().bold(),
        format!("{:.2}s", start.elapsed().as_secs_f64()).bold()
    );
}

fn run_task<F>(name: &str, task: F, verbose: bool) -> Result<()>
where
    F: FnOnce() -> Result<()>,
{
    println!("{} {}", "→".blue(), name);
    let start = Instant::now();

    match task() {
        Ok(()) => {
            if verbose {
                println!("{} {} ({:.2}s)", "✓".green().bold(), name, start.elapsed().as_secs_f64());
            } else {
                println!("{} {}", "✓".green().bold(), name);
            }
            Ok(())
        }
        Err(e) => {
            println!("{} {}", "✗".red().bold(), name);
            Err(e)
        }
    }
}

fn execute_command(cmd: &mut Command) -> Result<()> {
    let status = cmd
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()?;

    if !status.success() {
        anyhow::bail!("Command failed with exit code: {}", status);
    }

    Ok(())
}
