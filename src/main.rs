use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::PathBuf;
use transboard::config::{self, Source};
use transboard::report::{self, Summary};
use transboard::{chart, derive, serve, Dashboard, DashboardView, FilterState};

#[derive(Parser, Debug)]
#[command(name = "transboard")]
#[command(author, version, about = "Histograms of workflow state transition durations")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Log level used when RUST_LOG is unset
    #[arg(long, global = true, default_value = "warn", env = config::ENV_LOG)]
    log_level: String,
}

#[derive(clap::Args, Debug)]
struct SourceArgs {
    /// Data endpoint returning { last_updated, results }
    #[arg(long, env = config::ENV_DATA_URL)]
    url: Option<String>,

    /// Local transitions file (payload or bare array)
    #[arg(long, env = config::ENV_DATA_FILE)]
    file: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
struct FilterArgs {
    /// Time window: 'all' or a number of days
    #[arg(long, default_value = "all", env = config::ENV_DAYS)]
    days: String,

    /// Time unit: minutes, hours or days
    #[arg(long, default_value = "minutes", env = config::ENV_UNIT)]
    unit: String,

    /// Batch name, or 'all'
    #[arg(long, default_value = "all")]
    batch: String,
}

impl FilterArgs {
    fn to_state(&self) -> FilterState {
        match FilterState::from_selectors(&self.days, &self.unit, &self.batch) {
            Ok(state) => state,
            Err(e) => fail(&e.to_string()),
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print one histogram per transition type
    Show {
        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        filters: FilterArgs,

        /// Width of a full-scale bar, in columns
        #[arg(long, default_value = "40")]
        width: usize,

        /// Only show summary
        #[arg(short, long)]
        quiet: bool,
    },

    /// Write the dashboard to a file (.html or .json)
    Report {
        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        filters: FilterArgs,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,

        /// Open the report when done
        #[arg(long)]
        open: bool,
    },

    /// Start the live dashboard web UI
    Serve {
        /// Transitions file to serve
        #[arg(long, env = config::ENV_DATA_FILE)]
        data_file: PathBuf,

        /// Port to listen on
        #[arg(short, long, default_value_t = config::DEFAULT_PORT, env = config::ENV_PORT)]
        port: u16,

        #[command(flatten)]
        filters: FilterArgs,

        /// Don't open a browser
        #[arg(long)]
        no_open: bool,
    },

    /// Derive transitions from relval workflow status histories
    Derive {
        /// JSON list of relval documents
        input: PathBuf,

        /// Where to write the transitions
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn main() {
    let args = Args::parse();

    if let Err(e) = transboard::logging::init_tracing(Some(&args.log_level)) {
        eprintln!("Failed to initialise logging: {}", e);
    }

    match args.command {
        Command::Show { source, filters, width, quiet } => {
            let view = build_view(&source, &filters);
            print_view(&view, width, quiet);
            if !view.is_ready() {
                std::process::exit(1);
            }
        }

        Command::Report { source, filters, output, open } => {
            let view = build_view(&source, &filters);
            if let Err(e) = report::generate(&output, &view) {
                fail(&format!("Failed to write report: {}", e));
            }
            eprintln!("\x1b[32mReport saved: {}\x1b[0m", output.display());

            if open {
                if let Err(e) = open::that(&output) {
                    eprintln!("Failed to open report: {}", e);
                }
            }
            if !view.is_ready() {
                std::process::exit(1);
            }
        }

        Command::Serve { data_file, port, filters, no_open } => {
            if let Err(e) = serve::start(port, data_file, filters.to_state(), !no_open) {
                fail(&format!("Server error: {}", e));
            }
        }

        Command::Derive { input, output } => {
            let documents = match derive::read_documents(&input) {
                Ok(documents) => documents,
                Err(e) => fail(&e.to_string()),
            };
            let transitions = derive::derive_transitions(&documents);
            if let Err(e) = derive::write_transitions(&output, &transitions) {
                fail(&e.to_string());
            }
            println!(
                "Derived {} transitions from {} documents → {}",
                transitions.len(),
                documents.len(),
                output.display()
            );
        }
    }
}

fn build_view(source: &SourceArgs, filters: &FilterArgs) -> DashboardView {
    let state = filters.to_state();
    let source = match Source::from_options(source.url.clone(), source.file.clone()) {
        Ok(source) => source,
        Err(e) => fail(&e.to_string()),
    };

    tracing::info!(%source, "loading transitions");
    match source.load() {
        Ok(dataset) => {
            if dataset.rejected > 0 {
                eprintln!("\x1b[33mSkipped {} invalid record(s)\x1b[0m", dataset.rejected);
            }
            Dashboard::new(dataset).with_filters(state).view()
        }
        Err(e) => {
            tracing::error!(error = %e, "error initializing dashboard");
            DashboardView::failed(&e)
        }
    }
}

fn print_view(view: &DashboardView, width: usize, quiet: bool) {
    let (updated_text, selection) = match view {
        DashboardView::Failed { message } => {
            eprintln!("\x1b[31m{}\x1b[0m", message);
            return;
        }
        DashboardView::Ready { updated_text, selection, .. } => (updated_text, selection),
    };

    eprintln!("\x1b[1mTransition durations\x1b[0m");
    eprintln!("{}", "─".repeat(70));
    eprintln!("Last updated: {}", updated_text);
    eprintln!(
        "Window: {}  Unit: {}  Batch: {}\n",
        selection.days.as_deref().unwrap_or("all"),
        selection.unit.as_deref().unwrap_or("minutes"),
        selection.batch.as_deref().unwrap_or("all")
    );

    if !quiet {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        for spec in view.charts() {
            if chart::render_text(&mut out, spec, width).and_then(|_| writeln!(out)).is_err() {
                return;
            }
        }
    }

    let summary = Summary::from_view(view);
    eprintln!("{}", "─".repeat(70));
    eprintln!("\x1b[1mSummary:\x1b[0m");
    eprintln!("  Shown:            {} of {}", summary.shown, summary.total);
    eprintln!("  Transition types: {}", summary.transition_types);
    eprintln!("  Bins:             {}", summary.bins);
    if summary.transition_types == 0 {
        eprintln!("\n\x1b[90mNo transitions match the current filters.\x1b[0m");
    }
}

fn fail(message: &str) -> ! {
    eprintln!("\x1b[31mError: {}\x1b[0m", message);
    std::process::exit(1);
}
