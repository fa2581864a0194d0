//! Command-line interface definitions and parsing
//!
//! Two layers live here: the process arguments (`Cli`, parsed by `clap`) and
//! the line commands of the interactive browse loop (`ReplCommand`).
//!
//! # Commands
//!
//! - **browse**: interactive browsing loop (default)
//! - **barcode**: one-shot product lookup
//! - **categories**: list the category directory
//!
//! The global `--search`, `--category` and `--sort` flags form the filter
//! override used when the browse view is entered. Without any of them a
//! stored session is resumed.
//!
//! # Examples
//!
//! ```
//! use larder::cli::{Cli, Commands};
//! use clap::Parser;
//!
//! let cli = Cli::parse_from(["larder", "--search", "oat milk"]);
//! assert_eq!(cli.get_command(), Commands::Browse);
//! assert_eq!(cli.filter_override().unwrap().search_term(), "oat milk");
//! ```

use crate::browse::{FilterState, SortKey};
use crate::catalog::CategoryRef;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Browse products interactively (default)
    #[command(visible_alias = "b")]
    Browse,

    /// Look up a single product by barcode
    Barcode {
        /// EAN/UPC code
        #[arg(value_name = "CODE")]
        code: String,
    },

    /// List product categories
    #[command(visible_alias = "cats")]
    Categories,
}

#[derive(Parser, Debug)]
#[command(name = "larder")]
#[command(about = "Browse the OpenFoodFacts product catalog", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Start with this search term
    #[arg(short = 's', long = "search", value_name = "TERM", global = true)]
    pub search: Option<String>,

    /// Start in this category (e.g. en:snacks)
    #[arg(short = 'c', long = "category", value_name = "ID", global = true)]
    pub category: Option<String>,

    /// Sort order: none, name-asc, name-desc, grade-asc, grade-desc
    #[arg(long = "sort", value_name = "KEY", global = true)]
    pub sort: Option<SortKey>,

    /// Use this config file instead of the default location
    #[arg(long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Log debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,
}

impl Cli {
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Subcommand to run, `browse` when none was given
    #[must_use]
    pub fn get_command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Browse)
    }

    /// Filters requested on the command line, if any flag was given
    #[must_use]
    pub fn filter_override(&self) -> Option<FilterState> {
        if self.search.is_none() && self.category.is_none() && self.sort.is_none() {
            return None;
        }

        Some(FilterState::new(
            self.search.clone().unwrap_or_default(),
            self.category.as_deref().map(category_from_id),
            self.sort.unwrap_or_default(),
        ))
    }
}

/// Category known only by id
#[must_use]
pub fn category_from_id(id: &str) -> CategoryRef {
    CategoryRef::new(id, id, 0)
}

/// One line of input in the browse loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    /// Replace the search term; empty removes it
    Search(String),
    /// Set the category by id, `None` removes it
    Category(Option<String>),
    Sort(SortKey),
    Clear,
    More,
    Retry,
    Barcode(String),
    /// Leave the list for one product's detail view
    Detail(String),
    /// Return from the detail view to the list
    Back,
    Categories,
    Show,
    Help,
    Quit,
    /// Blank line
    Empty,
}

pub const REPL_HELP: &str = "\
Commands:
  search <term>        search by product name (no term removes the search)
  category <id|->      filter by category id, '-' removes the category
  sort <key>           none, name-asc, name-desc, grade-asc, grade-desc
  clear                reset all filters
  more                 load the next page
  retry                repeat the last failed load
  barcode <code>       look up one product
  detail <code>        open a product, 'back' returns to the list
  categories           list categories
  show                 print the current list
  help                 this text
  quit                 leave";

impl FromStr for ReplCommand {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(Self::Empty);
        }

        let (command, rest) = line
            .split_once(char::is_whitespace)
            .map_or((line, ""), |(c, r)| (c, r.trim()));

        match command.to_ascii_lowercase().as_str() {
            "search" | "s" => Ok(Self::Search(rest.to_string())),
            "category" | "cat" | "c" => match rest {
                "" | "-" => Ok(Self::Category(None)),
                id => Ok(Self::Category(Some(id.to_string()))),
            },
            "sort" => rest.parse().map(Self::Sort),
            "clear" => Ok(Self::Clear),
            "more" | "m" => Ok(Self::More),
            "retry" | "r" => Ok(Self::Retry),
            "barcode" | "b" => {
                if rest.is_empty() {
                    Err("usage: barcode <code>".to_string())
                } else {
                    Ok(Self::Barcode(rest.to_string()))
                }
            }
            "detail" | "d" | "open" => {
                if rest.is_empty() {
                    Err("usage: detail <code>".to_string())
                } else {
                    Ok(Self::Detail(rest.to_string()))
                }
            }
            "back" => Ok(Self::Back),
            "categories" | "cats" => Ok(Self::Categories),
            "show" | "ls" => Ok(Self::Show),
            "help" | "h" | "?" => Ok(Self::Help),
            "quit" | "q" | "exit" => Ok(Self::Quit),
            other => Err(format!("Unknown command '{other}'. Type 'help' for a list of commands.")),
        }
    }
}
