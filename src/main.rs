//! Larder CLI application entry point
//!
//! Browses the OpenFoodFacts catalog from the terminal. The interactive loop
//! keeps its place in a session snapshot, so filters, page and loaded
//! products are resumed when the browse view is entered again: `detail`
//! leaves the list for one product and `back` returns to it.
//!
//! # Usage
//!
//! ```bash
//! # Browse interactively (default command), resuming the last session
//! larder
//!
//! # Start with filters (replaces a stored session that does not match)
//! larder --search "oat milk" --sort grade-asc
//! larder --category en:breakfast-cereals
//!
//! # One-shot lookups
//! larder barcode 3017620422003
//! larder categories
//! ```
//!
//! # Configuration
//!
//! Settings live in the user's config directory
//! (`~/.config/larder/config.toml` on Linux) and are created on first run.
//! `RUST_LOG` controls logging; `--verbose` defaults it to `debug`.

use colored::Colorize;
use larder::{
    LarderError,
    browse::{BrowseController, BrowseView, FilterState, LoadOutcome},
    catalog::{CategoryRef, OpenFoodFactsClient, ProductSummary},
    cli::{Cli, Commands, REPL_HELP, ReplCommand, category_from_id},
    config::LarderConfig,
    output,
    session::{SessionBackend, SessionStore},
};
use std::io::{self, Write};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

type Result<T> = std::result::Result<T, LarderError>;
type Browser = BrowseController<OpenFoodFactsClient, Arc<dyn SessionBackend>>;
type Input = Lines<BufReader<Stdin>>;

/// How the list view was left
enum Leave {
    Quit,
    Detail(ProductSummary),
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();
}

fn print_categories(categories: &[CategoryRef]) {
    if categories.is_empty() {
        println!("{}", "No categories available.".dimmed());
        return;
    }
    for (i, category) in categories.iter().enumerate() {
        println!("{}", output::category_line(i + 1, category));
    }
}

/// Print the notice for `outcome` and, when the list changed, the list
fn report(browser: &Browser, outcome: &LoadOutcome) {
    if let Some(notice) = output::outcome_notice(outcome) {
        println!("{notice}");
    }
    if matches!(outcome, LoadOutcome::Applied { .. } | LoadOutcome::Restored { .. }) {
        println!("{}", output::view_listing(&browser.view()));
    }
}

fn prompt(label: &str) -> io::Result<()> {
    print!("{} ", format!("{label}>").cyan().bold());
    io::stdout().flush()
}

/// Read and parse the next line; `None` at end of input
async fn next_command(input: &mut Input, label: &str) -> Result<Option<ReplCommand>> {
    loop {
        prompt(label)?;
        let Some(line) = input.next_line().await? else {
            return Ok(None);
        };
        match line.parse::<ReplCommand>() {
            Ok(command) => return Ok(Some(command)),
            Err(msg) => eprintln!("{}", msg.red()),
        }
    }
}

/// Fresh controller over the shared session backend
fn open_browser(
    client: &Arc<OpenFoodFactsClient>,
    backend: &Arc<dyn SessionBackend>,
    config: &LarderConfig,
) -> Result<Browser> {
    let session = SessionStore::new(Arc::clone(backend), config.session.scope.clone());
    let browser = BrowseController::new(Arc::clone(client), session, config.browse_settings())?;
    browser.subscribe(Box::new(|view: &BrowseView| {
        if view.loading {
            eprintln!("{}", "loading...".dimmed());
        }
    }));
    Ok(browser)
}

/// The list view, until the user quits or opens a product
async fn home(browser: &Browser, filters: Option<FilterState>, input: &mut Input) -> Result<Leave> {
    let outcome = browser.initialize(filters).await;
    report(browser, &outcome);
    println!("{}", "Type 'help' for commands.".dimmed());

    let mut known_categories: Vec<CategoryRef> = Vec::new();

    while let Some(command) = next_command(input, "larder").await? {
        match command {
            ReplCommand::Search(term) => report(browser, &browser.set_search(term).await),
            ReplCommand::Category(id) => {
                let category = id.map(|id| {
                    known_categories
                        .iter()
                        .find(|c| c.id == id)
                        .cloned()
                        .unwrap_or_else(|| category_from_id(&id))
                });
                report(browser, &browser.set_category(category).await);
            }
            ReplCommand::Sort(key) => report(browser, &browser.set_sort(key).await),
            ReplCommand::Clear => report(browser, &browser.clear_filters().await),
            ReplCommand::More => match browser.load_more().await {
                Ok(outcome) => report(browser, &outcome),
                Err(e) => eprintln!("{}", e.to_string().yellow()),
            },
            ReplCommand::Retry => match browser.retry().await {
                Ok(outcome) => report(browser, &outcome),
                Err(e) => eprintln!("{}", e.to_string().yellow()),
            },
            ReplCommand::Barcode(code) => match browser.lookup_barcode(&code).await {
                Ok(item) => println!("{}", output::product_detail(&item)),
                Err(e) => eprintln!("{}", e.to_string().red()),
            },
            ReplCommand::Detail(code) => match browser.lookup_barcode(&code).await {
                Ok(item) => return Ok(Leave::Detail(item)),
                Err(e) => eprintln!("{}", e.to_string().red()),
            },
            ReplCommand::Categories => {
                known_categories = browser.categories().await;
                print_categories(&known_categories);
            }
            ReplCommand::Show => println!("{}", output::view_listing(&browser.view())),
            ReplCommand::Help => println!("{REPL_HELP}"),
            ReplCommand::Back | ReplCommand::Empty => {}
            ReplCommand::Quit => return Ok(Leave::Quit),
        }
    }

    Ok(Leave::Quit)
}

/// One product's card; `true` when the user went back to the list
async fn detail(item: &ProductSummary, input: &mut Input) -> Result<bool> {
    println!("{}", output::product_detail(item));
    println!("{}", "Type 'back' to return to the list.".dimmed());

    while let Some(command) = next_command(input, "detail").await? {
        match command {
            ReplCommand::Back => return Ok(true),
            ReplCommand::Quit => return Ok(false),
            ReplCommand::Show => println!("{}", output::product_detail(item)),
            ReplCommand::Empty => {}
            _ => println!("{}", "Type 'back' to return to the list or 'quit' to leave.".dimmed()),
        }
    }

    Ok(false)
}

/// Alternate between the list and product details
///
/// The list's controller is dropped while a product is open and rebuilt on
/// return, which resumes from the session snapshot.
async fn browse(
    client: &Arc<OpenFoodFactsClient>,
    backend: &Arc<dyn SessionBackend>,
    config: &LarderConfig,
    mut filters: Option<FilterState>,
) -> Result<()> {
    let mut input = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let leave = {
            let browser = open_browser(client, backend, config)?;
            home(&browser, filters.take(), &mut input).await?
        };
        match leave {
            Leave::Quit => return Ok(()),
            Leave::Detail(item) => {
                if !detail(&item, &mut input).await? {
                    return Ok(());
                }
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();
    init_logging(cli.verbose);
    if cli.no_color {
        output::set_color(false);
    }

    let config = match &cli.config {
        Some(path) => LarderConfig::load_from(path)?,
        None => LarderConfig::load()?,
    };
    log::debug!("catalog at {}, page size {}", config.base_url, config.page_size);

    let client = Arc::new(OpenFoodFactsClient::new(&config.base_url, config.request_timeout())?);
    let backend: Arc<dyn SessionBackend> = Arc::from(config.open_session_backend()?);

    match cli.get_command() {
        Commands::Browse => browse(&client, &backend, &config, cli.filter_override()).await?,
        Commands::Barcode { code } => {
            let browser = open_browser(&client, &backend, &config)?;
            let item = browser.lookup_barcode(&code).await?;
            println!("{}", output::product_detail(&item));
        }
        Commands::Categories => print_categories(&open_browser(&client, &backend, &config)?.categories().await),
    }

    Ok(())
}
