//! Tabmark - a tabbed, themeable markdown previewer.
//!
//! # Usage
//!
//! ```bash
//! tabmark README.md > readme.html
//! tabmark --theme dracula --out preview.html docs/*.md
//! tabmark --interactive --watch README.md CHANGELOG.md
//! tabmark --folder notes/ --out notes.html
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use tabmark::app::App;
use tabmark::config::{
    ConfigFlags, clear_config_flags, global_config_path, load_config_flags, local_override_path,
    parse_flag_tokens, save_config_flags,
};
use tabmark::files::{FileSource, FsSource};
use tabmark::input::DropPolicy;
use tabmark::perf;
use tabmark::theme::{self, DEFAULT_THEME, ThemeId};

/// A tabbed, themeable markdown previewer
#[derive(Parser, Debug)]
#[command(name = "tabmark", version, about, long_about = None)]
struct Cli {
    /// Markdown files to open, one tab each
    #[arg(value_name = "FILES")]
    files: Vec<PathBuf>,

    /// Scan a folder for markdown files and show the listing
    #[arg(long, value_name = "DIR")]
    folder: Option<PathBuf>,

    /// Theme id (see --list-themes)
    #[arg(long, value_name = "ID")]
    theme: Option<String>,

    /// Print the available themes and exit
    #[arg(long)]
    list_themes: bool,

    /// Print the theme list or the --folder listing as JSON and exit
    #[arg(long)]
    json: bool,

    /// Write the page here instead of stdout (or the temp dir when interactive)
    #[arg(short, long, value_name = "PATH")]
    out: Option<PathBuf>,

    /// Keep running: keys switch tabs and themes, pasted paths open files
    #[arg(short, long)]
    interactive: bool,

    /// Watch open files for changes and auto-reload (interactive mode)
    #[arg(short, long)]
    watch: bool,

    /// Open any dropped file, not just .md/.markdown/.mdx
    #[arg(long)]
    accept_all_drops: bool,

    /// Enable performance logging
    #[arg(long)]
    perf: bool,

    /// Write detailed render/diagram debug events to a file
    #[arg(long, value_name = "PATH")]
    render_debug_log: Option<PathBuf>,

    /// Save current command-line flags as defaults
    #[arg(long)]
    save: bool,

    /// Clear saved defaults
    #[arg(long)]
    clear: bool,
}

fn print_themes() {
    for (heading, group) in [
        ("Light", theme::light().collect::<Vec<_>>()),
        ("Dark", theme::dark().collect::<Vec<_>>()),
    ] {
        println!("{heading}:");
        for meta in group {
            let marker = if meta.id == DEFAULT_THEME { " (default)" } else { "" };
            println!("  {:<12} {}{marker}", meta.id, meta.label);
        }
    }
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let raw_args = std::env::args().collect::<Vec<_>>();
    let cli = Cli::parse();

    if cli.list_themes {
        if cli.json {
            println!("{}", serde_json::to_string_pretty(theme::all())?);
        } else {
            print_themes();
        }
        return Ok(());
    }
    if cli.json {
        let Some(folder) = &cli.folder else {
            anyhow::bail!("--json needs --list-themes or --folder");
        };
        let files = FsSource.list_files(folder)?;
        println!("{}", serde_json::to_string_pretty(&files)?);
        return Ok(());
    }

    let global_path = global_config_path();
    let local_path = local_override_path();
    let cli_flags = parse_flag_tokens(&raw_args);

    if cli.clear {
        clear_config_flags(&global_path)?;
    }
    if cli.save {
        save_config_flags(&global_path, &cli_flags)?;
    }

    let file_flags = if cli.clear {
        ConfigFlags::default()
    } else {
        let global_flags = load_config_flags(&global_path)?;
        let local_flags = load_config_flags(&local_path)?;
        global_flags.union(&local_flags)
    };
    let effective = file_flags.union(&cli_flags);

    perf::set_enabled(effective.perf);
    let render_debug_log_path = effective
        .render_debug_log
        .clone()
        .or_else(|| std::env::var_os("TABMARK_RENDER_DEBUG_LOG").map(PathBuf::from));
    if let Err(err) = perf::set_debug_log_path(render_debug_log_path.as_deref()) {
        tracing::warn!(
            path = %render_debug_log_path
                .as_ref()
                .map_or_else(|| "<unset>".to_string(), |p| p.display().to_string()),
            %err,
            "failed to initialize render debug log"
        );
    }

    let theme = match effective.theme.as_deref() {
        Some(id) if theme::find(id).is_some() => ThemeId::new(id),
        Some(id) => {
            tracing::warn!(theme = id, "unknown theme, using {DEFAULT_THEME}");
            ThemeId::default()
        }
        None => ThemeId::default(),
    };

    if cli.files.is_empty() && cli.folder.is_none() && !cli.interactive {
        if cli.save || cli.clear {
            return Ok(());
        }
        anyhow::bail!("Nothing to show: pass markdown files, --folder, or --interactive");
    }

    let drop_policy = if effective.accept_all_drops {
        DropPolicy::AcceptAll
    } else {
        DropPolicy::MarkdownOnly
    };

    let app = App::new(cli.files)
        .with_folder(cli.folder)
        .with_theme(theme)
        .with_watch(effective.watch)
        .with_drop_policy(drop_policy)
        .with_output(cli.out);

    if cli.interactive {
        app.run().context("Application error")
    } else {
        app.export().context("Export failed")
    }
}
