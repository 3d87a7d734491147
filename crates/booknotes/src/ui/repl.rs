//! Interactive session: a line editor feeding [`Command`]s to a [`Dispatcher`].

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use reedline::{DefaultPrompt, DefaultPromptSegment, Reedline, Signal};

use crate::app::command::{CalloutTarget, Command, HELP};
use crate::app::export::{ExportOptions, Exporter};
use crate::app::parser::ParseOutcome;
use crate::app::report::{Reporter, StatusContext};
use crate::app::session::{ProgressFound, Session, SessionError};
use crate::domain::errors::StoreError;
use crate::infra::config::Config;
use crate::infra::{editor, files};

/// Response to one command, printed by the loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Info(String),
    Success(String),
    /// Multi-line output such as listings or generated Markdown.
    Text(String),
    Quit,
}

/// Executes commands against a session, performing file, clipboard and editor I/O.
pub struct Dispatcher {
    session: Session,
    reporter: Reporter,
    exporter: Exporter,
    source: Option<PathBuf>,
    suffix: String,
    fallback_name: String,
    copy_on_write: bool,
}

impl Dispatcher {
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_session(config, Session::new(config))
    }

    pub fn with_session(config: &Config, session: Session) -> Result<Self> {
        Ok(Self {
            session,
            reporter: Reporter::new()?,
            exporter: Exporter::new(),
            source: None,
            suffix: config.export.suffix(),
            fallback_name: config.export.fallback_name(),
            copy_on_write: config.export.copy_to_clipboard(),
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Load `path` as the session document.
    pub fn open(&mut self, path: &Path) -> Result<Reply> {
        let loaded = files::read_document(path)?;
        let found = self
            .session
            .load_text(Some(loaded.name.as_str()), &loaded.contents);
        self.source = Some(loaded.path);
        let note = match found {
            ProgressFound::Valid => " (saved progress found)",
            ProgressFound::Invalid => " (saved progress unreadable, ignored)",
            ProgressFound::None => "",
        };
        Ok(Reply::Info(format!("Loaded {}{note}", loaded.name)))
    }

    pub fn execute(&mut self, command: Command) -> Result<Reply> {
        let reply = match command {
            Command::Open(path) => self.open(&path)?,
            Command::Parse => {
                let report = self.session.parse();
                match report.outcome {
                    ParseOutcome::Empty => Reply::Info("Nothing to parse: the document is empty.".into()),
                    ParseOutcome::NoQuotes => Reply::Info(
                        "No quotes found. Highlights must be separated by '---' lines.".into(),
                    ),
                    ParseOutcome::Parsed(count) if report.restored > 0 => Reply::Success(format!(
                        "Parsed {count} quotes, restored progress for {}",
                        report.restored
                    )),
                    ParseOutcome::Parsed(count) => Reply::Success(format!("Parsed {count} quotes")),
                }
            }
            Command::List => Reply::Text(self.reporter.quote_list(self.session.store().quotes())?),
            Command::Show(index) => {
                let quote = self.session.store().get(index).map_err(user_error)?;
                Reply::Text(self.reporter.quote_detail(index, quote)?)
            }
            Command::Select(indices) => {
                let store = self.session.store_mut();
                for &index in &indices {
                    store.get(index).map_err(user_error)?;
                }
                for &index in &indices {
                    store.toggle_select(index).map_err(user_error)?;
                }
                Reply::Success(format!("{} selected", store.selected_indices().len()))
            }
            Command::Unselect => {
                self.session.store_mut().clear_selection();
                Reply::Info("Selection cleared".into())
            }
            Command::Delete(index) => {
                self.session.store_mut().delete(index).map_err(user_error)?;
                Reply::Success(format!("Deleted quote {}", index + 1))
            }
            Command::Highlight { index, text } => {
                let store = self.session.store_mut();
                let quote = store.get(index).map_err(user_error)?;
                let (notes, callout) = (quote.notes.clone(), quote.callout);
                store
                    .edit(index, &text, &notes, callout)
                    .map_err(user_error)?;
                Reply::Success(format!("Updated highlight of quote {}", index + 1))
            }
            Command::Notes { index, text } => {
                self.session
                    .store_mut()
                    .set_notes(index, &text)
                    .map_err(user_error)?;
                Reply::Success(format!("Updated notes of quote {}", index + 1))
            }
            Command::Callout { target, callout } => match target {
                CalloutTarget::One(index) => {
                    self.session
                        .store_mut()
                        .set_callout(index, callout)
                        .map_err(user_error)?;
                    Reply::Success(format!(
                        "Quote {} is now {} {}",
                        index + 1,
                        callout.emoji(),
                        callout.title()
                    ))
                }
                CalloutTarget::All => {
                    self.session.store_mut().set_all_callouts(callout);
                    Reply::Success(format!(
                        "All quotes are now {} {}",
                        callout.emoji(),
                        callout.title()
                    ))
                }
            },
            Command::Edit(index) => {
                let quote = self
                    .session
                    .store()
                    .get(index)
                    .map_err(user_error)?
                    .clone();
                let edited = editor::edit_quote(&quote)?;
                self.session
                    .store_mut()
                    .edit(index, &edited.highlight, &edited.notes, edited.callout)
                    .map_err(user_error)?;
                Reply::Success(format!("Updated quote {}", index + 1))
            }
            Command::Merge(indices) => {
                let store = self.session.store_mut();
                let merged = if indices.is_empty() {
                    store.merge_selected()
                } else {
                    store.merge(&indices)
                };
                let position = merged.map_err(user_error)?;
                Reply::Success(format!("Merged into quote {}", position + 1))
            }
            Command::Generate => Reply::Text(self.session.generate()?),
            Command::Save => self.save()?,
            Command::Copy => {
                let rendered = self.session.generate()?;
                let backend = self.exporter.copy(&rendered)?;
                Reply::Success(format!("Copied converted notes ({backend})"))
            }
            Command::Write(path) => self.write(path)?,
            Command::Status => {
                let context = StatusContext::new(
                    self.session.document_name(),
                    self.session.store().quotes(),
                    self.session.progress(),
                );
                Reply::Text(self.reporter.status(&context)?)
            }
            Command::Restore => {
                if self.session.progress().is_none() {
                    Reply::Info("No saved progress to restore".into())
                } else {
                    let restored = self.session.restore_progress();
                    if restored == 0 {
                        Reply::Info("Saved progress does not match the current quotes".into())
                    } else {
                        Reply::Success(format!("Restored progress for {restored} quotes"))
                    }
                }
            }
            Command::Clear => {
                self.session.clear();
                self.source = None;
                Reply::Info("Cleared document and quotes".into())
            }
            Command::Help => Reply::Text(HELP.to_string()),
            Command::Quit => Reply::Quit,
        };
        Ok(reply)
    }

    fn save(&mut self) -> Result<Reply> {
        let saved = self.session.save_document()?;
        let path = match &self.source {
            Some(source) => source.with_file_name(&saved.name),
            None => PathBuf::from(&saved.name),
        };
        let options = ExportOptions {
            output_path: Some(path.clone()),
            copy_to_clipboard: false,
        };
        self.exporter.export(&saved.contents, &options)?;
        if saved.lossy.is_empty() {
            return Ok(Reply::Success(format!("Saved {}", path.display())));
        }
        let mut message = format!(
            "Saved {}, but {} line(s) will change when it is reopened:",
            path.display(),
            saved.lossy.len()
        );
        for lost in &saved.lossy {
            message.push_str(&format!(
                "\n  quote {}: \"{}\" {}",
                lost.quote + 1,
                lost.line,
                lost.reason.describe()
            ));
        }
        Ok(Reply::Text(message))
    }

    fn write(&mut self, path: Option<PathBuf>) -> Result<Reply> {
        let rendered = self.session.generate()?;
        let path = path.unwrap_or_else(|| match &self.source {
            Some(source) => files::converted_path(source, &self.suffix, &self.fallback_name),
            None => PathBuf::from(&self.fallback_name),
        });
        let options = ExportOptions {
            output_path: Some(path.clone()),
            copy_to_clipboard: self.copy_on_write,
        };
        let result = self.exporter.export(&rendered, &options)?;
        let copied = result
            .copied_to
            .map(|backend| format!(", copied via {backend}"))
            .unwrap_or_default();
        Ok(Reply::Success(format!("Wrote {}{copied}", path.display())))
    }
}

/// Store errors speak in 0-based indices; users count from 1.
fn user_error(err: StoreError) -> anyhow::Error {
    match err {
        StoreError::IndexOutOfRange { index, len } => {
            anyhow!("there is no quote {} (the document has {len})", index + 1)
        }
        other => anyhow::Error::new(SessionError::from(other)),
    }
}

/// Run the interactive loop until `quit` or Ctrl+D.
pub fn run(config: &Config, input: &Path) -> Result<()> {
    let mut dispatcher = Dispatcher::new(config)?;
    print_reply(&dispatcher.open(input)?);
    print_reply(&dispatcher.execute(Command::Parse)?);

    let mut line_editor = Reedline::create();
    let prompt = DefaultPrompt::new(
        DefaultPromptSegment::Basic("booknotes".to_string()),
        DefaultPromptSegment::Empty,
    );

    loop {
        let signal = line_editor
            .read_line(&prompt)
            .context("failed to read from terminal")?;
        match signal {
            Signal::Success(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                let command = match Command::parse(&line) {
                    Ok(command) => command,
                    Err(err) => {
                        eprintln!("error: {err}");
                        continue;
                    }
                };
                match dispatcher.execute(command) {
                    Ok(Reply::Quit) => break,
                    Ok(reply) => print_reply(&reply),
                    Err(err) => eprintln!("error: {err:#}"),
                }
            }
            Signal::CtrlC => continue,
            Signal::CtrlD => break,
        }
    }

    tracing::debug!("session ended");
    Ok(())
}

fn print_reply(reply: &Reply) {
    match reply {
        Reply::Info(message) => println!("{message}"),
        Reply::Success(message) => println!("✔ {message}"),
        Reply::Text(text) => println!("{text}"),
        Reply::Quit => {}
    }
}
