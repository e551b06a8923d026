/// Atomic Uploader - browse and upload atomic assets on AO
///
/// Command line front end over the `atomic_uploader` library.

use anyhow::{bail, Context};
use atomic_uploader::{
    assets::{pagination::index_label, AssetRow, TableView},
    config::UploaderConfig,
    context::AppContext,
    metrics,
    upload::{ItemOutcome, UploadEvent, UploadSessionState},
};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true, env = "UPLOADER_LOG_JSON")]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List a page of the atomic assets owned by a wallet
    Assets {
        /// Wallet address; defaults to the configured wallet
        #[arg(long)]
        address: Option<String>,

        /// Zero-based page number
        #[arg(long, default_value_t = 0)]
        page: usize,
    },

    /// Show the existing assets selected in a session manifest
    Selected { manifest: PathBuf },

    /// Add an existing asset to a session manifest, or remove it if present
    Select { manifest: PathBuf, id: String },

    /// Upload the content of a session manifest
    Upload {
        manifest: PathBuf,

        /// Write the resulting session back to the manifest
        #[arg(long)]
        save_session: bool,

        /// Print Prometheus metrics when the batch ends
        #[arg(long)]
        print_metrics: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = UploaderConfig::from_env().context("Failed to load configuration")?;

    // Initialize logging
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.logging.filter_directive().into());
    if cli.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    print_banner();

    let ctx = AppContext::new(config).await.context("Failed to initialize")?;

    match cli.command {
        Command::Assets { address, page } => list_assets(&ctx, address, page).await,
        Command::Selected { manifest } => show_selected(&ctx, &manifest).await,
        Command::Select { manifest, id } => toggle_selected(&ctx, &manifest, &id).await,
        Command::Upload {
            manifest,
            save_session,
            print_metrics,
        } => {
            let result = upload(&ctx, &manifest, save_session).await;
            if print_metrics {
                println!("{}", metrics::gather_metrics());
            }
            result
        }
    }
}

async fn list_assets(ctx: &AppContext, address: Option<String>, page: usize) -> anyhow::Result<()> {
    let address = address.or_else(|| ctx.wallet.address.clone());
    let mut table = ctx.assets_table();
    table.refresh(address.as_deref()).await?;

    if page > 0 {
        let label = index_label(page);
        if table.group_index().and_then(|index| index.page(&label)).is_none() {
            bail!("Page {} does not exist", page);
        }
        table.select_page(&label).await?;
    }

    match table.view(&[]) {
        TableView::ConnectRequired => println!("Connect a wallet or pass --address to list assets"),
        TableView::Loading | TableView::NotLoaded => println!("Assets not loaded"),
        TableView::NoAssets => println!("No assets found"),
        TableView::Page(view) => {
            print_rows(&view.rows);
            println!("Showing {}-{} of {}", view.first, view.last, view.total);
            if let Some(previous) = view.previous {
                println!("Previous page: {}", previous);
            }
            if let Some(next) = view.next {
                println!("Next page: {}", next);
            }
        }
    }
    Ok(())
}

async fn show_selected(ctx: &AppContext, manifest: &Path) -> anyhow::Result<()> {
    let session = UploadSessionState::load(manifest).await?;
    let selection = &session.data.id_list;

    let mut table = ctx.assets_table();
    table.refresh_selected(selection).await?;
    let rows = table.selected_view(selection);
    if rows.is_empty() {
        println!("No existing assets selected");
    } else {
        print_rows(&rows);
    }
    Ok(())
}

async fn toggle_selected(ctx: &AppContext, manifest: &Path, id: &str) -> anyhow::Result<()> {
    let session = UploadSessionState::load(manifest).await?;
    let updated = ctx.assets_table().toggle_selection(&session, id);
    updated.save(manifest).await?;

    if updated.data.id_list.iter().any(|existing| existing == id) {
        println!("Selected {}", id);
    } else {
        println!("Deselected {}", id);
    }
    Ok(())
}

async fn upload(ctx: &AppContext, manifest: &Path, save_session: bool) -> anyhow::Result<()> {
    let session = UploadSessionState::load(manifest).await?;

    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let uploader = ctx.uploader()?.with_events(events_tx);

    let printer = tokio::spawn(async move {
        while let Some(event) = events_rx.recv().await {
            match &event {
                UploadEvent::ItemFinished(ItemOutcome::Failure { .. }) => eprintln!("{}", event),
                _ => println!("{}", event),
            }
        }
    });

    // In-flight requests cannot be cancelled; the first Ctrl-C only warns
    let report = {
        let run = uploader.run(&session, &ctx.wallet);
        tokio::pin!(run);
        let mut interrupted = false;
        loop {
            tokio::select! {
                report = &mut run => break report?,
                _ = tokio::signal::ctrl_c() => {
                    if interrupted {
                        warn!("Upload interrupted");
                        std::process::exit(130);
                    }
                    interrupted = true;
                    warn!("Upload in progress; in-flight requests will not be cancelled. Press Ctrl-C again to exit");
                }
            }
        }
    };
    drop(uploader);
    printer.await.ok();

    if save_session {
        report.session.save(manifest).await?;
        info!("Session written to {}", manifest.display());
    }

    let created = report.created_ids();
    if !created.is_empty() {
        println!("Assets created: {}", created.join(", "));
    }
    if let Some(id) = report.collection.as_ref().and_then(|c| c.id()) {
        println!("Collection created: {}", id);
    }
    if let Some(reason) = report.last_error() {
        bail!("Upload finished with errors: {}", reason);
    }
    Ok(())
}

fn print_rows(rows: &[AssetRow]) {
    for row in rows {
        let marker = if row.selected { "*" } else { " " };
        println!("{} {:<32} {}", marker, row.title, row.url);
    }
}

fn print_banner() {
    println!(
        r#"
    ___   __                  _
   /   | / /_____  ____ ___  (_)____
  / /| |/ __/ __ \/ __ `__ \/ / ___/
 / ___ / /_/ /_/ / / / / / / / /__
/_/  |_\__/\____/_/ /_/ /_/_/\___/

        Atomic Uploader v{}
        "#,
        env!("CARGO_PKG_VERSION")
    );
}
