use clap::{error::ErrorKind, Args, CommandFactory, Parser, Subcommand};
use crossterm::tty::IsTty;
use std::{
    error::Error,
    io::{self, stdin},
    path::PathBuf,
    process,
    str::FromStr,
};
use tracing_subscriber::EnvFilter;
use zetatrack::{
    config::{ConfigStore, FileConfigStore, OperandBounds, SessionConfig},
    generator::ProblemGenerator,
    history::ScoreLog,
    input::CrosstermByteSource,
    problem::Operator,
    session::run_session,
    stats::Summary,
    terminal::RawModeGuard,
};

/// timed mental-arithmetic drill for the terminal
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    args_conflicts_with_subcommands = true,
    long_about = "A zetamac-style arithmetic drill: answer as many problems as you can before the clock runs out. Every session is appended to a score history that the stats command summarises."
)]
pub struct Cli {
    #[clap(subcommand)]
    command: Option<Command>,

    #[clap(flatten)]
    play: PlayArgs,

    /// score history file
    #[clap(long, global = true, default_value = ScoreLog::DEFAULT_FILE)]
    scores: PathBuf,

    /// directory holding named configs (defaults to the platform config dir)
    #[clap(long, global = true)]
    config_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// play one timed session (the default)
    Play(PlayArgs),
    /// summarise the score history
    Stats,
    /// create or update a named config
    Config(ConfigArgs),
    /// print a resolved config as JSON
    Show {
        name: Option<String>,
    },
}

#[derive(Args, Debug, Clone, Default)]
struct PlayArgs {
    /// named config to play
    config: Option<String>,

    /// session length in seconds, overriding the config
    #[clap(short = 't', long)]
    duration: Option<i64>,
}

#[derive(Args, Debug, Clone)]
struct ConfigArgs {
    name: String,

    /// session length in seconds
    #[clap(short = 'd', long)]
    duration: Option<i64>,

    /// operators to drill, e.g. "+-*/"
    #[clap(long)]
    operations: Option<OperatorSet>,

    #[clap(long)]
    override_subtraction: Option<bool>,

    #[clap(long)]
    override_division: Option<bool>,

    /// addition operand ranges, MIN:MAX,MIN:MAX
    #[clap(long)]
    addition: Option<OperandBounds>,

    /// subtraction operand ranges, MIN:MAX,MIN:MAX
    #[clap(long)]
    subtraction: Option<OperandBounds>,

    /// multiplication operand ranges, MIN:MAX,MIN:MAX
    #[clap(long)]
    multiplication: Option<OperandBounds>,

    /// division operand ranges, MIN:MAX,MIN:MAX
    #[clap(long)]
    division: Option<OperandBounds>,

    /// only accept subtraction problems with a non-negative result
    #[clap(long)]
    non_negative: Option<bool>,

    /// only accept division problems without a remainder
    #[clap(long)]
    clean_division: Option<bool>,
}

impl ConfigArgs {
    fn apply(&self, cfg: &mut SessionConfig) {
        cfg.name = self.name.clone();
        if let Some(secs) = self.duration {
            cfg.duration_secs = secs;
        }
        if let Some(ops) = &self.operations {
            cfg.operations = ops.0.clone();
        }
        if let Some(v) = self.override_subtraction {
            cfg.override_subtraction = v;
        }
        if let Some(v) = self.override_division {
            cfg.override_division = v;
        }
        if let Some(b) = self.addition {
            cfg.addition.bounds = b;
        }
        if let Some(b) = self.subtraction {
            cfg.subtraction.bounds = b;
        }
        if let Some(b) = self.multiplication {
            cfg.multiplication.bounds = b;
        }
        if let Some(b) = self.division {
            cfg.division.bounds = b;
        }
        if let Some(v) = self.non_negative {
            cfg.subtraction.force_non_negative_difference = v;
        }
        if let Some(v) = self.clean_division {
            cfg.division.force_clean_division = v;
        }
    }
}

/// Operator symbols given as one string, duplicates dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
struct OperatorSet(Vec<Operator>);

impl FromStr for OperatorSet {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut ops = Vec::new();
        for c in s.chars().filter(|c| !c.is_whitespace()) {
            let op = Operator::from_symbol(c).ok_or_else(|| format!("unknown operator `{c}`"))?;
            if !ops.contains(&op) {
                ops.push(op);
            }
        }
        Ok(Self(ops))
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("zetatrack=warn")),
        )
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let store = match &cli.config_dir {
        Some(dir) => FileConfigStore::with_dir(dir),
        None => FileConfigStore::new(),
    };

    match cli.command.clone() {
        None => play(&cli, &store, &cli.play),
        Some(Command::Play(args)) => play(&cli, &store, &args),
        Some(Command::Stats) => {
            let records = ScoreLog::new(&cli.scores).load()?;
            println!("{}", Summary::from_records(&records));
            Ok(())
        }
        Some(Command::Config(args)) => {
            let mut cfg = match store.load(&args.name) {
                Ok(cfg) => cfg,
                Err(zetatrack::error::StoreError::NotFound(_)) => SessionConfig::default(),
                Err(e) => return Err(e.into()),
            };
            args.apply(&mut cfg);
            check(&cfg);
            store.save(&cfg)?;
            println!("saved {}", store.path_for(&cfg.name).display());
            Ok(())
        }
        Some(Command::Show { name }) => {
            let cfg = store.load(name.as_deref().unwrap_or(FileConfigStore::DEFAULT_NAME))?;
            println!("{}", serde_json::to_string_pretty(&cfg)?);
            Ok(())
        }
    }
}

fn play(cli: &Cli, store: &FileConfigStore, args: &PlayArgs) -> Result<(), Box<dyn Error>> {
    let mut cfg = store.load(args.config.as_deref().unwrap_or(FileConfigStore::DEFAULT_NAME))?;
    if let Some(secs) = args.duration {
        cfg.duration_secs = secs;
    }
    check(&cfg);

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let guard = RawModeGuard::enable()?;
    let outcome = run_session(
        ProblemGenerator::new(cfg),
        ScoreLog::new(&cli.scores),
        &guard,
        CrosstermByteSource,
        io::stdout(),
    );
    drop(guard);

    let outcome = outcome?;
    tracing::debug!(reason = ?outcome.reason, score = outcome.score, "session finished");
    Ok(())
}

/// Prints every violation and exits with status 1 if the config is unusable.
fn check(cfg: &SessionConfig) {
    if let Err(errors) = cfg.validate() {
        for e in errors {
            eprintln!("config error: {e}");
        }
        process::exit(1);
    }
}
