// src/commands.rs

use anyhow::{
    Context,
    Result
};
use clap::{
    ArgAction,
    Parser
};
use regex::Regex;
use simplelog::{
    ColorChoice,
    ConfigBuilder,
    LevelFilter,
    TermLogger,
    TerminalMode
};
use std::path::PathBuf;
use crate::{
    editor::{
        CommandEditor,
        DefaultApplication,
        Editor
    },
    error::SessionError,
    manifest::ManifestFormat,
    mover::FsMover,
    prompt::ConsolePrompt,
    report,
    scan::{
        self,
        ScanOptions
    },
    session::{
        Session,
        SessionConfig
    },
    version
};

/// Rename every file below a directory by editing a list of their paths.
#[derive(Debug, Parser)]
#[command(name = "batch-rename", version)]
pub struct Cli {
    /// Directory to collect files from.
    #[arg(default_value = ".")]
    pub root: PathBuf,

    /// Only include paths matching this regular expression.
    #[arg(long, value_name = "REGEX")]
    pub filter: Option<Regex>,

    /// Manifest layout: `numbered` lines may be reordered, `bare` lines may not.
    #[arg(long, value_enum, env = "BATCH_RENAME_FORMAT", default_value_t = ManifestFormat::Numbered)]
    pub format: ManifestFormat,

    /// Editor command; waited on until it exits. Defaults to $VISUAL/$EDITOR.
    #[arg(long, env = "BATCH_RENAME_EDITOR", value_name = "CMD")]
    pub editor: Option<String>,

    /// Open the manifest with the system default application instead.
    /// Takes precedence over --editor.
    #[arg(long)]
    pub open_default: bool,

    /// Honor .gitignore/.ignore files and skip hidden files.
    #[arg(long)]
    pub respect_ignore: bool,

    /// Where to create the manifest.
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub manifest_dir: PathBuf,

    /// Create missing parent directories of target paths.
    #[arg(long)]
    pub create_dirs: bool,

    /// Reject duplicate indices and colliding target paths, and never
    /// replace an existing file.
    #[arg(long)]
    pub strict: bool,

    /// Write a JSON report of the renames (file, or directory to put it in).
    #[arg(long, value_name = "PATH")]
    pub report: Option<PathBuf>,

    /// More logging (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count, conflicts_with = "quiet")]
    pub verbose: u8,

    /// Only log warnings and errors.
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    fn log_level(&self) -> LevelFilter {
        match (self.quiet, self.verbose) {
            (true, _) => LevelFilter::Warn,
            (false, 0) => LevelFilter::Info,
            (false, 1) => LevelFilter::Debug,
            (false, _) => LevelFilter::Trace,
        }
    }

    fn editor(&self) -> Result<Box<dyn Editor>> {
        if self.open_default {
            return Ok(Box::new(DefaultApplication));
        }
        let editor = match &self.editor {
            Some(cmd) => CommandEditor::from_command_line(cmd),
            None => CommandEditor::detect(),
        }
        .context("choosing an editor")?;
        Ok(Box::new(editor))
    }
}

pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level())?;
    run(&cli)
}

fn init_logging(level: LevelFilter) -> Result<()> {
    let config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_target_level(LevelFilter::Off)
        .build();
    TermLogger::init(level, config, TerminalMode::Stderr, ColorChoice::Auto)
        .context("initializing logger")
}

pub fn run(cli: &Cli) -> Result<()> {
    let version = version::current();
    log::info!("Started batch-rename v{version}");

    let opts = ScanOptions {
        filter: cli.filter.clone(),
        respect_ignore: cli.respect_ignore,
    };
    let mut entries = scan::discover(&cli.root, &opts)
        .with_context(|| format!("Failed to read file tree at {}", cli.root.display()))?;

    if entries.is_empty() {
        log::info!("There are no files to be renamed.");
        return Ok(());
    }
    log::info!("Got {} files to rename", entries.len());

    let started: Vec<String> = entries.iter().map(|e| e.original_path.clone()).collect();
    let config = SessionConfig {
        format: cli.format,
        manifest_dir: cli.manifest_dir.clone(),
        strict: cli.strict,
        version,
    };

    let mut editor = cli.editor()?;
    let mut operator = ConsolePrompt::stdio();
    let mover = FsMover::new(cli.create_dirs, cli.strict);
    let mut session = Session::new(config, editor.as_mut(), &mut operator, &mover);
    let outcome = session.run(&mut entries);

    // fatal errors before the edit never touch the file system; nothing to report
    let reportable = matches!(outcome, Ok(_) | Err(SessionError::Abandoned { .. }));
    if let (Some(out), true) = (&cli.report, reportable) {
        let value = report::build_report(&started, &entries, &session.config().version, outcome.is_ok());
        let path = report::write_report(out, &value)?;
        log::info!("Report written to {}", path.display());
    }

    let applied = outcome?;
    log::info!(
        "Done: {} files renamed in {} attempt(s)",
        applied.renamed,
        applied.attempts
    );
    Ok(())
}
