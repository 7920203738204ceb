use std::fmt::Display;
use std::io::Write;
use std::path::{Path, PathBuf};

use clap::builder::styling::{AnsiColor, Color, Style, Styles};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::aot::{Generator, Shell, generate};
use clap_complete_nushell::Nushell;
use clap_verbosity_flag::{InfoLevel, Verbosity};
use tokio::io::AsyncReadExt;
use tracing::{error, info, warn};

use crate::AppResult;
use crate::config::{FooterLink, Settings};
use crate::git::cache::{CacheKind, SUMMARY_MARKER};
use crate::git::revision::{CACHED_TOKEN, CURRENT_TOKEN};
use crate::git::{GitRunner, HistoryBuilder, HistoryCache, Pathspec, RevisionResolver};
use crate::output::{OutputMode, SectionMerger, write_output};

const STYLES: Styles = Styles::styled()
    .header(Style::new().bold())
    .usage(Style::new().bold())
    .error(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Red))))
    .literal(
        Style::new()
            .bold()
            .fg_color(Some(Color::Ansi(AnsiColor::Green))),
    )
    .placeholder(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Yellow))))
    .valid(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Cyan))))
    .invalid(Style::new().fg_color(Some(Color::Ansi(AnsiColor::BrightRed))))
    .context(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Magenta))))
    .context_value(
        Style::new()
            .bold()
            .fg_color(Some(Color::Ansi(AnsiColor::Cyan))),
    );

/// Long-form CLI description shown in `--help`.
const LONG_ABOUT: &str = "giv - Turn a slice of git history into project documents

This tool:
- resolves a revision expression (a commit, a..b, a...b, --cached or --current)
  into a unified diff, untracked files included for the working tree
- renders per-commit Markdown history, cached on disk
- merges generated text into a document such as CHANGELOG.md, replacing or
  inserting the section for a version label

Requires \x1b]8;;https://git-scm.com\x1b\\\x1b[4;36mgit\x1b[24;39m\x1b]8;;\x1b\\ on your PATH.";

/// giv - Turn a slice of git history into project documents.
#[derive(Parser, Debug, Clone)]
#[command(author, version, propagate_version = true, about, long_about = Some(LONG_ABOUT), styles = STYLES)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(flatten)]
    pub verbosity: Verbosity<InfoLevel>,

    /// Subcommand to run
    #[command(subcommand)]
    pub cmd: Cmd,
}

/// Options shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Run as if started in this directory
    #[arg(short = 'C', long = "repo", global = true, default_value = ".")]
    pub repo: PathBuf,

    /// Lines of context around each change
    #[arg(long, global = true)]
    pub context_lines: Option<u32>,

    /// Directory for cached commit histories
    ///
    /// Defaults to .giv/cache inside the repository
    #[arg(long, global = true)]
    pub cache_dir: Option<PathBuf>,

    /// Never read or write the history cache
    #[arg(long, global = true)]
    pub no_cache: bool,

    /// Do not append the managed-by footer to written documents
    #[arg(long, global = true)]
    pub no_footer: bool,

    /// Link text of the footer
    #[arg(long, global = true, conflicts_with = "no_footer")]
    pub footer_text: Option<String>,

    /// Link target of the footer
    #[arg(long, global = true, conflicts_with = "no_footer")]
    pub footer_url: Option<String>,
}

impl GlobalArgs {
    /// Fold the flags over the defaults rooted at `--repo`.
    pub fn settings(&self) -> Settings {
        let mut settings = Settings::new(self.repo.clone());
        if let Some(lines) = self.context_lines {
            settings.resolver.context_lines = lines;
        }
        if let Some(dir) = &self.cache_dir {
            settings.cache_dir = dir.clone();
        }
        settings.use_cache = !self.no_cache;
        settings.merge.footer = if self.no_footer {
            None
        } else {
            let defaults = FooterLink::default();
            Some(FooterLink {
                text: self.footer_text.clone().unwrap_or(defaults.text),
                url: self.footer_url.clone().unwrap_or(defaults.url),
            })
        };
        settings
    }
}

/// Which revision to look at. `--cached` and `--current` stand in for the
/// special tokens, which clap would otherwise read as flags.
#[derive(Args, Debug, Clone, Default)]
pub struct RevisionArgs {
    /// A commit, a..b, a...b; the working tree when omitted
    pub revision: Option<String>,

    /// Staged changes only
    #[arg(long, conflicts_with_all = ["revision", "current"])]
    pub cached: bool,

    /// Working tree against HEAD, untracked files included
    #[arg(long, conflicts_with = "revision")]
    pub current: bool,
}

impl RevisionArgs {
    pub fn token(&self) -> String {
        if self.cached {
            CACHED_TOKEN.to_string()
        } else if self.current {
            CURRENT_TOKEN.to_string()
        } else {
            self.revision.clone().unwrap_or_default()
        }
    }
}

/// Top-level commands supported by the CLI.
#[derive(Subcommand, Debug, Clone)]
pub enum Cmd {
    /// Print the diff of a revision
    Diff {
        #[command(flatten)]
        revision: RevisionArgs,

        /// Only include these paths
        #[arg(last = true)]
        paths: Vec<String>,
    },

    /// Print the commits a revision expands to, oldest first
    Commits {
        /// A commit or a range
        revision: String,
    },

    /// Print commit metadata as JSON
    Metadata {
        #[command(flatten)]
        revision: RevisionArgs,
    },

    /// Print the Markdown history of every commit in a revision
    History {
        #[command(flatten)]
        revision: RevisionArgs,

        /// Only include these paths
        #[arg(last = true)]
        paths: Vec<String>,
    },

    /// Print or store the cached summary of a commit
    Summary {
        /// Commit the summary belongs to
        commit: String,

        /// Store the summary read from --input or stdin instead of printing it
        #[arg(long)]
        store: bool,

        /// File holding the summary to store
        #[arg(short, long, requires = "store")]
        input: Option<PathBuf>,

        /// Path filters the summary was made with
        #[arg(last = true)]
        paths: Vec<String>,
    },

    /// Merge generated content into a document
    Write(WriteArgs),

    /// Generate shell completion for a given shell
    Completion {
        /// Output file to write the completion script to
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// The shell to generate the completion for
        #[arg(value_enum)]
        shell: CompletionShell,
    },
}

#[derive(Args, Debug, Clone)]
pub struct WriteArgs {
    /// Target document; stdout when omitted
    pub output: Option<PathBuf>,

    /// How the content is combined with the target
    #[arg(short, long, value_enum, default_value_t = OutputMode::Auto)]
    pub mode: OutputMode,

    /// Section label for update mode
    #[arg(long)]
    pub version_label: Option<String>,

    /// Show what would be written without touching the file
    #[arg(long)]
    pub dry_run: bool,

    /// Read the generated content from this file instead of stdin
    #[arg(short, long)]
    pub input: Option<PathBuf>,
}

/// Supported completion targets for shell auto-completion.
#[derive(ValueEnum, Clone, Debug)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
    Nushell,
}

impl Display for CompletionShell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CompletionShell::Bash => "bash",
            CompletionShell::Zsh => "zsh",
            CompletionShell::Fish => "fish",
            CompletionShell::PowerShell => "powershell",
            CompletionShell::Elvish => "elvish",
            CompletionShell::Nushell => "nushell",
        };
        write!(f, "{}", s)
    }
}

impl Generator for &CompletionShell {
    fn generate(&self, cmd: &clap::builder::Command, buf: &mut dyn Write) {
        match self {
            CompletionShell::Bash => Shell::Bash.generate(cmd, buf),
            CompletionShell::Zsh => Shell::Zsh.generate(cmd, buf),
            CompletionShell::Fish => Shell::Fish.generate(cmd, buf),
            CompletionShell::PowerShell => Shell::PowerShell.generate(cmd, buf),
            CompletionShell::Elvish => Shell::Elvish.generate(cmd, buf),
            CompletionShell::Nushell => Nushell.generate(cmd, buf),
        }
    }

    fn file_name(&self, name: &str) -> String {
        match self {
            CompletionShell::Bash => Shell::Bash.file_name(name),
            CompletionShell::Zsh => Shell::Zsh.file_name(name),
            CompletionShell::Fish => Shell::Fish.file_name(name),
            CompletionShell::PowerShell => Shell::PowerShell.file_name(name),
            CompletionShell::Elvish => Shell::Elvish.file_name(name),
            CompletionShell::Nushell => Nushell.file_name(name),
        }
    }
}

/// Generated content comes from a file or, by default, stdin.
async fn read_input(input: Option<&Path>) -> AppResult<String> {
    match input {
        Some(path) => Ok(tokio::fs::read_to_string(path).await?),
        None => {
            let mut content = String::new();
            tokio::io::stdin().read_to_string(&mut content).await?;
            Ok(content)
        }
    }
}

impl Cli {
    /// Execute the chosen command. `Ok(false)` means the command ran but did
    /// not succeed, e.g. a failed write.
    #[tracing::instrument(name = "Running command", level = "info", skip(self))]
    pub async fn run(&self) -> AppResult<bool> {
        let settings = self.global.settings();
        let resolver = RevisionResolver::new(
            GitRunner::new(&settings.resolver.repo_path),
            settings.resolver.clone(),
        );
        let cache = HistoryCache::new(&settings.cache_dir, settings.use_cache);

        match &self.cmd {
            Cmd::Diff { revision, paths } => {
                let diff = crate::git::resolve_diff(&resolver, &revision.token(), paths).await?;
                if !diff.is_empty() {
                    println!("{}", diff.text);
                }
                Ok(true)
            }
            Cmd::Commits { revision } => {
                for commit in resolver.parse_commit_list(revision).await? {
                    println!("{}", commit);
                }
                Ok(true)
            }
            Cmd::Metadata { revision } => {
                let metadata = resolver.commit_metadata(&revision.token()).await;
                println!("{}", serde_json::to_string_pretty(&metadata)?);
                Ok(true)
            }
            Cmd::History { revision, paths } => {
                let paths = Pathspec::new(paths.iter().cloned());
                let history = HistoryBuilder::new(&resolver, cache)
                    .build_history(&revision.token(), &paths)
                    .await?;
                println!("{}", history);
                Ok(true)
            }
            Cmd::Summary {
                commit,
                store,
                input,
                paths,
            } => {
                let paths = Pathspec::new(paths.iter().cloned());
                let hash = resolver.resolve_commit(commit).await;
                if hash.is_empty() {
                    error!("Not a commit: {}", commit);
                    return Ok(false);
                }
                if *store {
                    let content = read_input(input.as_deref()).await?;
                    if !content.starts_with(SUMMARY_MARKER) {
                        error!("A summary must start with {:?}", SUMMARY_MARKER);
                        return Ok(false);
                    }
                    cache.write(&hash, &paths, CacheKind::Summary, &content).await;
                    return Ok(true);
                }
                match cache.read(&hash, &paths, CacheKind::Summary).await {
                    Some(summary) => {
                        println!("{}", summary);
                        Ok(true)
                    }
                    None => {
                        warn!("No cached summary for {}", commit);
                        Ok(false)
                    }
                }
            }
            Cmd::Write(args) => {
                let content = read_input(args.input.as_deref()).await?;
                let merger = SectionMerger::new(settings.merge.clone());
                Ok(write_output(
                    &merger,
                    args.output.as_deref(),
                    args.mode,
                    &content,
                    args.version_label.as_deref(),
                    args.dry_run,
                )
                .await)
            }
            Cmd::Completion { shell, output } => {
                let mut cmd = Cli::command();
                if let Some(output_path) = output {
                    let mut file = std::fs::OpenOptions::new()
                        .write(true)
                        .truncate(true)
                        .create(true)
                        .open(output_path)?;
                    generate(shell, &mut cmd, "giv", &mut file);
                    info!(
                        "Generated completion script for {} at {}",
                        shell,
                        output_path.display()
                    );
                } else {
                    generate(shell, &mut cmd, "giv", &mut std::io::stdout());
                }
                Ok(true)
            }
        }
    }
}
