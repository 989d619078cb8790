mod renderer;

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use scrollspy_core::{PageLayout, tracker};
use scrollspy_protocol::{ScrollState, SectionId};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "scrollspy")]
#[command(about = "Scroll-driven navigation highlighting for single-page sites", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Page layout JSON (sections + tuning). Defaults to the built-in portfolio page.
    #[arg(short, long, global = true)]
    layout: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Scroll through a simulated page in the terminal (default)
    View {
        /// Where to write logs; the terminal itself is taken by the UI
        #[arg(long)]
        log_file: Option<PathBuf>,
    },
    /// Print the active section for one scroll position
    Probe {
        /// Vertical scroll offset in pixels
        #[arg(long, allow_negative_numbers = true)]
        scroll_y: f64,
        /// Viewport height in pixels
        #[arg(long)]
        viewport: f64,
        /// Document height in pixels (defaults to the layout's)
        #[arg(long)]
        document: Option<f64>,
        /// Section active before this scroll position
        #[arg(long)]
        previous: Option<String>,
        /// Print probe point and bottom-rule details as JSON
        #[arg(long)]
        json: bool,
    },
}

fn load_layout(path: Option<&Path>) -> Result<PageLayout> {
    let Some(path) = path else {
        return Ok(PageLayout::portfolio());
    };
    let data = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let layout = PageLayout::from_json(&data)
        .with_context(|| format!("loading layout {}", path.display()))?;
    tracing::info!(
        path = %path.display(),
        sections = layout.sections.len(),
        "loaded page layout"
    );
    Ok(layout)
}

/// `RUST_LOG` directives when given, otherwise `info`.
fn log_filter(rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

fn init_logging(log_file: Option<&Path>) -> Result<()> {
    let filter = log_filter(std::env::var("RUST_LOG").ok().as_deref());
    match log_file {
        Some(path) => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("creating log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}

#[allow(clippy::print_stdout)]
fn probe(
    layout: &PageLayout,
    scroll: ScrollState,
    previous: Option<&str>,
    json: bool,
) -> Result<()> {
    let previous = previous.map(SectionId::from);
    let active = tracker::compute_active(
        &scroll,
        &layout.sections,
        previous.as_ref(),
        &layout.tracker,
    );
    if json {
        let clamped = scroll.clamped();
        let report = serde_json::json!({
            "active": active,
            "probe_point": tracker::probe_point(&clamped, &layout.tracker),
            "at_bottom": tracker::is_at_bottom(&clamped, &layout.tracker),
            "scroll": clamped,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{active}");
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Probe {
            scroll_y,
            viewport,
            document,
            previous,
            json,
        }) => {
            init_logging(None)?;
            let layout = load_layout(cli.layout.as_deref())?;
            let document = document.unwrap_or_else(|| layout.document_height());
            let scroll = ScrollState::new(scroll_y, viewport, document);
            probe(&layout, scroll, previous.as_deref(), json)
        }
        Some(Commands::View { log_file }) => {
            let log_file = log_file.unwrap_or_else(|| std::env::temp_dir().join("scrollspy.log"));
            init_logging(Some(&log_file))?;
            let layout = load_layout(cli.layout.as_deref())?;
            renderer::run(layout)
        }
        None => {
            init_logging(Some(&std::env::temp_dir().join("scrollspy.log")))?;
            let layout = load_layout(cli.layout.as_deref())?;
            renderer::run(layout)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::level_filters::LevelFilter;

    #[test]
    fn rust_log_is_not_capped_at_info() {
        assert_eq!(log_filter(Some("debug")).max_level_hint(), Some(LevelFilter::DEBUG));
        assert_eq!(
            log_filter(Some("scrollspy_core=trace")).max_level_hint(),
            Some(LevelFilter::TRACE)
        );
    }

    #[test]
    fn defaults_to_info() {
        assert_eq!(log_filter(None).max_level_hint(), Some(LevelFilter::INFO));
    }
}
