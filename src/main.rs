use std::{
    io::{self, BufRead, Read, Write},
    path::PathBuf,
    sync::Arc,
};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tokio::sync::broadcast::error::TryRecvError;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use snappy_lens_lib::{
    capture::{menu_item, on_menu_clicked, MENU_ITEM_ID},
    clipboard::Clipboards,
    config::Config,
    controller::CopyOutcome,
    loader::is_selection_change,
    messages::{self, encode_response, Request, Responder, StaticSelection},
    render::Format,
    state::{AppState, Flow, SessionCommand},
    store::{FileStore, SelectionStore},
    surface::{SnapshotSurface, TerminalSurface},
};

#[derive(Parser)]
#[command(name = "snappy-lens", version, about = "Format, highlight and search captured JSON")]
struct Cli {
    /// Directory holding the selection store
    #[arg(long, env = "SNAPPY_LENS_HOME", global = true)]
    store_dir: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, env = "SNAPPY_LENS_LOG", global = true)]
    log: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Capture a selection, as the "View Formatted JSON" menu item does. Reads stdin when TEXT is omitted.
    Select {
        text: Option<String>,
        #[arg(long, default_value = MENU_ITEM_ID)]
        item: String,
    },
    /// Print the context-menu entry to register, as JSON
    Menu,
    /// Render the stored selection once
    Show {
        #[arg(long, value_enum, default_value_t = Format::Ansi)]
        format: Format,
        /// Highlight matches of this query
        #[arg(long)]
        query: Option<String>,
    },
    /// Interactive search over the stored selection
    Browse {
        #[arg(long, value_enum, default_value_t = Format::Ansi)]
        format: Format,
    },
    /// Copy the formatted JSON to the clipboard
    Copy,
    /// Send a request through the message exchange and print the reply
    Request {
        #[arg(value_enum)]
        kind: RequestKind,
        /// Page selection answered for get-selection
        #[arg(long, default_value = "")]
        selection: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum RequestKind {
    GetSelectedJson,
    GetSelection,
}

impl From<RequestKind> for Request {
    fn from(kind: RequestKind) -> Self {
        match kind {
            RequestKind::GetSelectedJson => Request::GetSelectedJson,
            RequestKind::GetSelection => Request::GetSelection,
        }
    }
}

fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::resolve(cli.store_dir, cli.log)?;
    init_tracing(&config.log_filter);

    let file_store = Arc::new(config.open_store().context("failed to open selection store")?);
    let store: Arc<dyn SelectionStore> = file_store.clone();
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start runtime")?;

    match cli.command {
        Commands::Select { text, item } => {
            let text = match text {
                Some(text) => text,
                None => {
                    let mut buf = String::new();
                    io::stdin().read_to_string(&mut buf)?;
                    buf
                }
            };
            if !on_menu_clicked(store.as_ref(), &item, &text)? {
                warn!(item = %item, "unknown menu item, nothing stored");
            }
        }
        Commands::Menu => println!("{}", serde_json::to_string_pretty(&menu_item())?),
        Commands::Show { format, query } => {
            let surface = SnapshotSurface::new(format).with_counter(query.is_some());
            let state = AppState::new(store, surface, Clipboards::system());
            runtime.block_on(state.show(query.as_deref(), &mut io::stdout().lock()))?;
        }
        Commands::Browse { format } => browse(&runtime, &file_store, store, format)?,
        Commands::Copy => {
            let state = AppState::new(store, SnapshotSurface::new(Format::Plain), Clipboards::system());
            runtime.block_on(state.reload());
            let outcome = state.copy();
            for notice in state.controller.lock().surface().notices() {
                eprintln!("{notice}");
            }
            match outcome {
                CopyOutcome::Copied(_) => {}
                CopyOutcome::NothingToCopy => anyhow::bail!("no formatted JSON to copy"),
                CopyOutcome::Failed => anyhow::bail!("failed to copy JSON to clipboard"),
            }
        }
        Commands::Request { kind, selection } => {
            let responder = Responder::new(store, Arc::new(StaticSelection(selection)));
            let reply = runtime.block_on(async move {
                let (messenger, inbox) = messages::channel(1);
                let server = tokio::spawn(inbox.serve(responder));
                let reply = messenger.request(kind.into()).await;
                drop(messenger);
                let _ = server.await;
                reply
            })?;
            println!("{}", encode_response(&reply)?);
        }
    }
    Ok(())
}

fn browse(
    runtime: &tokio::runtime::Runtime,
    file_store: &FileStore,
    store: Arc<dyn SelectionStore>,
    format: Format,
) -> anyhow::Result<()> {
    let mut changes = store.subscribe();
    let state = AppState::new(store, TerminalSurface::new(io::stdout(), format), Clipboards::system());
    runtime.block_on(state.reload());
    eprintln!("type to search; n/Enter next, p previous, c copy, r reload, q quit");

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        eprint!("> ");
        io::stderr().flush()?;
        let Some(line) = lines.next() else { break };
        let line = line?;

        if let Err(e) = file_store.poll_external_change() {
            warn!(error = %e, "failed to poll store");
        }
        let mut selection_changed = false;
        loop {
            match changes.try_recv() {
                Ok(change) => selection_changed |= is_selection_change(&change),
                Err(TryRecvError::Lagged(_)) => selection_changed = true,
                Err(_) => break,
            }
        }
        if selection_changed {
            info!("selection changed, reloading");
            runtime.block_on(state.reload());
        }

        if runtime.block_on(state.apply(SessionCommand::parse(&line))) == Flow::Quit {
            break;
        }
    }
    Ok(())
}
