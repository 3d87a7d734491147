//! Command-line surface.

use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use crate::app::export::{ExportFormat, ExportOptions, Exporter};
use crate::app::inspect::inspect_lines;
use crate::app::parser::{HighlightParser, ParseOutcome};
use crate::app::progress;
use crate::app::reconstruct::lossy_lines;
use crate::app::report::{Reporter, StatusContext};
use crate::app::session::{ProgressFound, Session};
use crate::domain::model::{CalloutType, IdAllocator};
use crate::infra::config::Config;
use crate::infra::files;
use crate::ui::repl;

#[derive(Parser, Debug)]
#[command(name = "booknotes", author, version)]
#[command(about = "Convert Kindle highlight exports into Markdown callout notes", long_about = None)]
pub struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Convert an export into callout Markdown
    Convert(ConvertArgs),
    /// List the quotes found in an export
    List {
        input: PathBuf,
        /// Print quotes as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show counts and saved progress for an export
    Status { input: PathBuf },
    /// Remove saved progress metadata from a document
    Strip {
        input: PathBuf,
        /// Write here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show how each line's location references are recognised
    Inspect { input: PathBuf },
    /// Work on an export interactively
    Session { input: PathBuf },
    /// Generate shell completions
    Completions { shell: Shell },
}

#[derive(Args, Debug)]
pub struct ConvertArgs {
    pub input: PathBuf,

    /// Output path (defaults to `<name>-converted.md` next to the input)
    #[arg(short, long, conflicts_with = "stdout")]
    pub output: Option<PathBuf>,

    /// Print the result instead of writing a file
    #[arg(long)]
    pub stdout: bool,

    /// Also copy the result to the clipboard
    #[arg(long)]
    pub copy: bool,

    /// Callout type for every quote
    #[arg(long, value_enum)]
    pub callout: Option<CalloutType>,

    /// Quote numbers to merge before converting, e.g. `--merge 2,3`
    #[arg(long, value_delimiter = ',', value_parser = clap::value_parser!(u32).range(1..))]
    pub merge: Vec<u32>,

    #[arg(long, value_enum, default_value_t = ExportFormat::Callout)]
    pub format: ExportFormat,
}

pub fn run(cli: Cli) -> Result<()> {
    if let Commands::Completions { shell } = cli.command {
        clap_complete::generate(shell, &mut Cli::command(), "booknotes", &mut io::stdout());
        return Ok(());
    }

    let config = Config::load().context("failed to load configuration")?;
    match cli.command {
        Commands::Convert(args) => convert(&config, args),
        Commands::List { input, json } => list(&config, &input, json),
        Commands::Status { input } => status(&config, &input),
        Commands::Strip { input, output } => strip(&input, output.as_deref()),
        Commands::Inspect { input } => inspect(&config, &input),
        Commands::Session { input } => repl::run(&config, &input),
        Commands::Completions { .. } => Ok(()),
    }
}

fn open_session(config: &Config, input: &Path) -> Result<(Session, ProgressFound)> {
    let loaded = files::read_document(input)?;
    let mut session = Session::new(config);
    let found = session.load_text(Some(loaded.name.as_str()), &loaded.contents);
    Ok((session, found))
}

fn parse_quotes(session: &mut Session, input: &Path) -> Result<usize> {
    let report = session.parse();
    match report.outcome {
        ParseOutcome::Empty => bail!("{} is empty; nothing to convert", input.display()),
        ParseOutcome::NoQuotes => bail!(
            "no highlights found in {}; sections must be separated by '---'",
            input.display()
        ),
        ParseOutcome::Parsed(count) => {
            tracing::debug!(count, restored = report.restored, "parsed export");
            Ok(count)
        }
    }
}

fn convert(config: &Config, args: ConvertArgs) -> Result<()> {
    let (mut session, _) = open_session(config, &args.input)?;
    parse_quotes(&mut session, &args.input)?;

    if let Some(callout) = args.callout {
        session.store_mut().set_all_callouts(callout);
    }
    if !args.merge.is_empty() {
        let indices: Vec<usize> = args.merge.iter().map(|n| *n as usize - 1).collect();
        session
            .store_mut()
            .merge(&indices)
            .context("could not merge the requested quotes")?;
    }

    let rendered = args
        .format
        .render(session.store().quotes(), config.progress.embed())?;
    if args.format == ExportFormat::Original {
        for lost in lossy_lines(session.store().quotes()) {
            eprintln!(
                "warning: quote {}: \"{}\" {}",
                lost.quote + 1,
                lost.line,
                lost.reason.describe()
            );
        }
    }
    let mut options = ExportOptions::from_config(config);
    options.copy_to_clipboard |= args.copy;
    if !args.stdout {
        options.output_path = Some(args.output.clone().unwrap_or_else(|| {
            files::converted_path(
                &args.input,
                &config.export.suffix(),
                &config.export.fallback_name(),
            )
        }));
    } else {
        println!("{rendered}");
    }

    let result = Exporter::new().export(&rendered, &options)?;
    let count = session.store().len();
    if let Some(path) = &result.output_path {
        println!("Converted {count} quotes to {}", path.display());
    }
    if let Some(backend) = &result.copied_to {
        eprintln!("Copied {count} quotes ({backend})");
    }
    Ok(())
}

fn list(config: &Config, input: &Path, json: bool) -> Result<()> {
    let (mut session, _) = open_session(config, input)?;
    parse_quotes(&mut session, input)?;
    let quotes = session.store().quotes();
    if json {
        let rendered = serde_json::to_string_pretty(quotes).context("failed to serialize quotes")?;
        println!("{rendered}");
    } else {
        println!("{}", Reporter::new()?.quote_list(quotes)?);
    }
    Ok(())
}

fn status(config: &Config, input: &Path) -> Result<()> {
    let (mut session, found) = open_session(config, input)?;
    session.parse();
    if found == ProgressFound::Invalid {
        eprintln!("warning: saved progress in {} is unreadable", input.display());
    }
    let context = StatusContext::new(
        session.document_name(),
        session.store().quotes(),
        session.progress(),
    );
    println!("{}", Reporter::new()?.status(&context)?);
    Ok(())
}

fn strip(input: &Path, output: Option<&Path>) -> Result<()> {
    let loaded = files::read_document(input)?;
    let stripped = progress::strip(&loaded.contents);
    if stripped == loaded.contents {
        tracing::info!(path = %input.display(), "no progress metadata found");
    }
    match output {
        Some(path) => files::write_document(path, &stripped)?,
        None => print!("{stripped}"),
    }
    Ok(())
}

fn inspect(config: &Config, input: &Path) -> Result<()> {
    let loaded = files::read_document(input)?;
    let text = progress::strip(&loaded.contents);
    let reporter = Reporter::new()?;
    println!("{}", reporter.inspect(&inspect_lines(&text))?);

    let quotes = HighlightParser::new(config.defaults.callout())
        .parse(&text, &mut IdAllocator::default());
    let rendered = serde_json::to_string_pretty(&quotes).context("failed to serialize quotes")?;
    println!("\nParsed quotes:\n{rendered}");
    Ok(())
}
