use anyhow::{Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::commands::{self, CommandReport};
use crate::coordinator::dispatcher::Scope;
use crate::coordinator::tabs::TabId;

#[derive(Parser)]
#[command(name = "pagebrief")]
#[command(about = "Extract page text, hand it off and summarize it")]
#[command(version)]
struct Cli {
    /// Print the report as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum ScopeArg {
    Selection,
    Page,
}

impl From<ScopeArg> for Scope {
    fn from(value: ScopeArg) -> Self {
        match value {
            ScopeArg::Selection => Scope::Selection,
            ScopeArg::Page => Scope::Page,
        }
    }
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct SummarizeInput {
    /// Text to summarize
    #[arg(long)]
    text: Option<String>,

    /// File whose contents are summarized
    #[arg(long)]
    file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Extract the selection or main content from a page snapshot
    Extract {
        #[arg(long)]
        page: PathBuf,
        #[arg(long, value_enum, default_value = "selection")]
        scope: ScopeArg,
    },
    /// Mark every occurrence of text on a page snapshot
    Highlight {
        #[arg(long)]
        page: PathBuf,
        #[arg(long)]
        text: String,
        /// Write the highlighted page here
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Remove every highlight from a page snapshot
    Unhighlight {
        #[arg(long)]
        page: PathBuf,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Send text to the summarization service
    Summarize {
        #[command(flatten)]
        input: SummarizeInput,
        /// bullet_points, tldr, simplified or detailed
        #[arg(long)]
        format: Option<String>,
        /// low, medium or high
        #[arg(long)]
        detail: Option<String>,
    },
    /// Check whether the summarization service is reachable
    Health,
    /// Fire a trigger (menu:<id>, command:<id>, action-click, popup-button)
    Trigger {
        id: String,
        #[arg(long)]
        page: PathBuf,
        /// Behave as if the popup cannot be opened programmatically
        #[arg(long)]
        no_popup: bool,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Inspect or consume the hand-off slot
    Handoff {
        #[command(subcommand)]
        action: HandoffAction,
    },
    /// Per-tab state
    Tabs {
        #[command(subcommand)]
        action: TabsAction,
    },
    /// Register and list context menu items and commands
    Menus,
    /// User settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
    /// Paths, configuration and stored state
    Status,
}

#[derive(Subcommand)]
enum HandoffAction {
    Show,
    /// Open the popup manually and consume the slot
    Open,
    Clear,
}

#[derive(Subcommand)]
enum TabsAction {
    Set {
        tab: TabId,
        /// JSON value
        state: String,
    },
    Get {
        tab: TabId,
    },
    Remove {
        tab: TabId,
    },
    Navigated {
        tab: TabId,
    },
}

#[derive(Subcommand)]
enum SettingsAction {
    Show,
    Set {
        #[arg(long)]
        format: Option<String>,
        #[arg(long)]
        detail: Option<String>,
        #[arg(long)]
        auto_open: Option<bool>,
        #[arg(long)]
        notifications: Option<bool>,
    },
}

fn print_report(report: &CommandReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }
    let status = if report.ok { "ok" } else { "failed" };
    println!("{}: {status}", report.command);
    for detail in &report.details {
        println!("  {detail}");
    }
    for issue in &report.issues {
        println!("  issue: {issue}");
    }
    Ok(())
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let report = match cli.command {
        Command::Extract { page, scope } => commands::extract::run(&page, scope.into())?,
        Command::Highlight { page, text, out } => {
            commands::highlight::run(&page, &text, out.as_deref())?
        }
        Command::Unhighlight { page, out } => {
            commands::highlight::run_remove(&page, out.as_deref())?
        }
        Command::Summarize {
            input,
            format,
            detail,
        } => {
            let input = match (&input.text, &input.file) {
                (Some(text), _) => commands::summarize::Input::Text(text),
                (None, Some(file)) => commands::summarize::Input::File(file),
                (None, None) => bail!("either --text or --file is required"),
            };
            commands::summarize::run(input, format.as_deref(), detail.as_deref())?
        }
        Command::Health => commands::health::run()?,
        Command::Trigger {
            id,
            page,
            no_popup,
            out,
        } => commands::trigger::run(&id, &page, no_popup, out.as_deref())?,
        Command::Handoff { action } => match action {
            HandoffAction::Show => commands::handoff::show()?,
            HandoffAction::Open => commands::handoff::open()?,
            HandoffAction::Clear => commands::handoff::clear()?,
        },
        Command::Tabs { action } => match action {
            TabsAction::Set { tab, state } => commands::tabs::set(tab, &state)?,
            TabsAction::Get { tab } => commands::tabs::get(tab)?,
            TabsAction::Remove { tab } => commands::tabs::remove(tab)?,
            TabsAction::Navigated { tab } => commands::tabs::navigated(tab)?,
        },
        Command::Menus => commands::menus::run()?,
        Command::Settings { action } => match action {
            SettingsAction::Show => commands::settings::show()?,
            SettingsAction::Set {
                format,
                detail,
                auto_open,
                notifications,
            } => commands::settings::set(commands::settings::SettingsUpdate {
                format,
                detail,
                auto_open,
                notifications,
            })?,
        },
        Command::Status => commands::status::run()?,
    };

    print_report(&report, cli.json)?;
    if !report.ok {
        bail!("{} failed: {}", report.command, report.issues.join("; "));
    }
    Ok(())
}
