use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::filter::{CardStatus, FilterSpec};

#[derive(Parser)]
#[command(name = "kard", about = concat!("[>] kard v", env!("CARGO_PKG_VERSION"), " - review your board without leaving the terminal"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Use this board instead of the configured one
    #[arg(short = 'b', long, global = true)]
    pub board: Option<String>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Skip the startup banner
    #[arg(long, global = true)]
    pub no_banner: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Display cards, lists, tags, or boards
    Show(ShowCmd),
    /// Search card titles by regex
    Grep(GrepArgs),
    /// Create a card, tag, or list
    Add(AddCmd),
    /// Apply one action across every matching card
    Batch(BatchCmd),
    /// Review matching cards one at a time
    Review(ReviewArgs),
    /// Show the active configuration
    Config,
}

// ---------------------------------------------------------------------------
// Filter flags, shared by show/grep/batch/review
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct FilterArgs {
    /// Only cards carrying all of these comma-separated tags
    #[arg(short = 't', long)]
    pub tag: Option<String>,

    /// Only cards with no tags at all
    #[arg(long, conflicts_with = "tag")]
    pub no_tag: bool,

    /// Only cards whose title matches this regex
    #[arg(short = 'm', long = "match")]
    pub title: Option<String>,

    /// Case-insensitive title matching
    #[arg(short = 'i', long)]
    pub insensitive: bool,

    /// Only cards in lists whose name matches this regex
    #[arg(short = 'l', long)]
    pub list: Option<String>,

    /// Only cards with attachments
    #[arg(long)]
    pub attachments: bool,

    /// Only cards with a due date
    #[arg(long)]
    pub has_due: bool,

    /// Which card status to fetch from the service
    #[arg(short = 's', long, value_enum, default_value_t = StatusArg::Visible)]
    pub status: StatusArg,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum StatusArg {
    All,
    Closed,
    Open,
    Visible,
}

impl FilterArgs {
    pub fn to_spec(&self) -> FilterSpec {
        FilterSpec {
            tag: self.tag.clone(),
            no_tag: self.no_tag,
            title_pattern: self.title.clone(),
            ignore_case: self.insensitive,
            list_pattern: self.list.clone(),
            has_attachments: self.attachments,
            has_due: self.has_due,
            status: match self.status {
                StatusArg::All => CardStatus::All,
                StatusArg::Closed => CardStatus::Closed,
                StatusArg::Open => CardStatus::Open,
                StatusArg::Visible => CardStatus::Visible,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Show args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ShowCmd {
    #[command(subcommand)]
    pub target: ShowCommands,
}

#[derive(Subcommand)]
pub enum ShowCommands {
    /// Display matching cards as a table
    Cards(ShowCardsArgs),
    /// Display the board's lists
    Lists,
    /// Display tags in use
    Tags(ShowTagsArgs),
    /// Display the boards on this account
    Boards(ShowBoardsArgs),
    /// Display cards with due dates, soonest first
    Soon(ShowSoonArgs),
}

#[derive(Args)]
pub struct ShowCardsArgs {
    #[command(flatten)]
    pub filter: FilterArgs,

    /// Output as JSON
    #[arg(long, conflicts_with = "tsv")]
    pub json: bool,

    /// Output tab-separated, one card per line
    #[arg(long)]
    pub tsv: bool,

    /// Comma-separated columns to display
    #[arg(long)]
    pub fields: Option<String>,

    /// Sort rows by this column
    #[arg(long)]
    pub sort: Option<String>,
}

#[derive(Args)]
pub struct ShowTagsArgs {
    /// Only tags used on cards in lists matching this regex
    #[arg(short = 'l', long)]
    pub list: Option<String>,
}

#[derive(Args)]
pub struct ShowBoardsArgs {
    /// Include closed boards
    #[arg(short = 'a', long)]
    pub show_all: bool,
}

#[derive(Args)]
pub struct ShowSoonArgs {
    /// Output as JSON
    #[arg(long, conflicts_with = "tsv")]
    pub json: bool,

    /// Output tab-separated, one card per line
    #[arg(long)]
    pub tsv: bool,
}

// ---------------------------------------------------------------------------
// Grep args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct GrepArgs {
    /// Regex to match against card titles
    pub pattern: Option<String>,

    /// Additional patterns, OR-ed together
    #[arg(short = 'e', long = "regexp")]
    pub regexp: Vec<String>,

    /// Case-insensitive matching
    #[arg(short = 'i', long)]
    pub insensitive: bool,

    /// Print only the number of matching cards
    #[arg(short = 'c', long)]
    pub count: bool,

    /// Output as JSON
    #[arg(short = 'j', long)]
    pub json: bool,
}

// ---------------------------------------------------------------------------
// Add args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct AddCmd {
    #[command(subcommand)]
    pub target: AddCommands,
}

#[derive(Subcommand)]
pub enum AddCommands {
    /// Create a new card
    Card(AddCardArgs),
    /// Create a new tag on the board
    Tag(AddTagArgs),
    /// Create a new list on the board
    List(AddListArgs),
}

#[derive(Args)]
pub struct AddCardArgs {
    /// Card title; $EDITOR opens for one when omitted
    pub title: Option<String>,

    /// Description for the new card
    #[arg(short = 'm', long)]
    pub message: Option<String>,

    /// Review the card as soon as it is created
    #[arg(short = 'e', long)]
    pub edit: bool,

    /// List to place the card in (regex, first match); defaults to the
    /// board's first open list
    #[arg(short = 'l', long)]
    pub list: Option<String>,
}

#[derive(Args)]
pub struct AddTagArgs {
    pub name: String,

    /// Color for the new tag
    #[arg(short = 'c', long, default_value = "black")]
    pub color: String,
}

#[derive(Args)]
pub struct AddListArgs {
    pub name: String,
}

// ---------------------------------------------------------------------------
// Batch args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct BatchCmd {
    #[command(subcommand)]
    pub action: BatchCommands,
}

#[derive(Subcommand)]
pub enum BatchCommands {
    /// Move every matching card to one chosen list
    Move(BatchArgs),
    /// Add one tag to every matching card
    Tag(BatchArgs),
    /// Delete every matching card
    Delete(BatchDeleteArgs),
    /// Set one due date on every matching card
    Due(BatchArgs),
    /// Attach the URL found in each matching card's title
    Attach(BatchArgs),
}

#[derive(Args)]
pub struct BatchArgs {
    #[command(flatten)]
    pub filter: FilterArgs,
}

#[derive(Args)]
pub struct BatchDeleteArgs {
    #[command(flatten)]
    pub filter: FilterArgs,

    /// Delete without asking per card
    #[arg(short = 'f', long)]
    pub force: bool,
}

// ---------------------------------------------------------------------------
// Review args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ReviewArgs {
    #[command(flatten)]
    pub filter: FilterArgs,

    /// Review the daily working list
    #[arg(long)]
    pub daily: bool,
}
