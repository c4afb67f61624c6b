use std::collections::BTreeSet;
use std::error::Error;

use crate::cli::commands::*;
use crate::display::{ALL_FIELDS, CardTable, Display};
use crate::filter::{CardSource, FilterSpec, resolve_lists};
use crate::interact::{self, InputError};
use crate::model::{Board, BoardList, Card, Config, Label};
use crate::remote::ApiClient;
use crate::review::{ReviewSession, SessionError};
use crate::util::{date, url};
use crate::view::CardView;

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> Result<(), Box<dyn Error>> {
    match run_command(cli) {
        // Ctrl-C during a prompt ends the run cleanly, like quit.
        Err(e) if is_interrupt(e.as_ref()) => {
            println!();
            Ok(())
        }
        other => other,
    }
}

fn run_command(cli: Cli) -> Result<(), Box<dyn Error>> {
    match cli.command {
        Commands::Config => cmd_config(),
        Commands::Show(ref show) => match show.target {
            ShowCommands::Cards(ref args) => {
                let ctx = Ctx::connect(&cli)?;
                cmd_show_cards(&ctx, args)
            }
            ShowCommands::Lists => {
                let ctx = Ctx::connect(&cli)?;
                cmd_show_lists(&ctx)
            }
            ShowCommands::Tags(ref args) => {
                let ctx = Ctx::connect(&cli)?;
                cmd_show_tags(&ctx, args)
            }
            ShowCommands::Boards(ref args) => {
                let ctx = Ctx::connect(&cli)?;
                cmd_show_boards(&ctx, args)
            }
            ShowCommands::Soon(ref args) => {
                let ctx = Ctx::connect(&cli)?;
                cmd_show_soon(&ctx, args)
            }
        },
        Commands::Grep(ref args) => cmd_grep(&cli, args),
        Commands::Add(ref add) => {
            let ctx = Ctx::connect(&cli)?;
            match &add.target {
                AddCommands::Card(args) => cmd_add_card(&ctx, args),
                AddCommands::Tag(args) => cmd_add_tag(&ctx, args),
                AddCommands::List(args) => cmd_add_list(&ctx, args),
            }
        }
        Commands::Batch(ref batch) => {
            let ctx = Ctx::connect(&cli)?;
            match &batch.action {
                BatchCommands::Move(args) => cmd_batch_move(&ctx, &args.filter),
                BatchCommands::Tag(args) => cmd_batch_tag(&ctx, &args.filter),
                BatchCommands::Delete(args) => cmd_batch_delete(&ctx, &args.filter, args.force),
                BatchCommands::Due(args) => cmd_batch_due(&ctx, &args.filter),
                BatchCommands::Attach(args) => cmd_batch_attach(&ctx, &args.filter),
            }
        }
        Commands::Review(ref args) => {
            let ctx = Ctx::connect(&cli)?;
            cmd_review(&ctx, args)
        }
    }
}

fn is_interrupt(e: &(dyn Error + 'static)) -> bool {
    if let Some(InputError::Interrupted) = e.downcast_ref::<InputError>() {
        return true;
    }
    matches!(
        e.downcast_ref::<SessionError>(),
        Some(SessionError::Input(InputError::Interrupted))
    )
}

// ---------------------------------------------------------------------------
// Shared command context
// ---------------------------------------------------------------------------

/// Everything a connected command needs: loaded config, a checked client,
/// the chosen board and its lists.
struct Ctx {
    config: Config,
    client: ApiClient,
    board: Board,
    lists: Vec<BoardList>,
    display: Display,
}

impl Ctx {
    fn connect(cli: &Cli) -> Result<Ctx, Box<dyn Error>> {
        let config = Config::load()?;
        let client = ApiClient::new(&config)?;
        // Listing boards doubles as the credential check.
        let boards = client.open_boards()?;
        let wanted = cli.board.as_deref().or(config.board.as_deref());
        let board = pick_board(boards, wanted)?;
        // All lists, archived included, so cards on closed lists still
        // resolve to a name in output.
        let lists = client.lists(&board.id, "all")?;
        let display = Display::new(
            config.color && !cli.no_color,
            config.banner && !cli.no_banner,
            &lists,
        );
        Ok(Ctx {
            config,
            client,
            board,
            lists,
            display,
        })
    }

    fn open_lists(&self) -> Vec<BoardList> {
        self.lists.iter().filter(|l| !l.closed).cloned().collect()
    }

    /// Lazy card stream for a filter, targeting matched lists when a list
    /// pattern is present and the whole board otherwise.
    fn source(&self, spec: &FilterSpec) -> Result<CardSource<'_>, Box<dyn Error>> {
        match &spec.list_pattern {
            Some(pattern) => {
                let open = self.open_lists();
                let matched = resolve_lists(&open, pattern)?;
                Ok(CardSource::lists(&self.client, &matched, spec)?)
            }
            None => Ok(CardSource::board(&self.client, &self.board.id, spec)?),
        }
    }

    fn matching_cards(&self, spec: &FilterSpec) -> Result<Vec<Card>, Box<dyn Error>> {
        Ok(self.source(spec)?.collect_all()?)
    }
}

fn pick_board(boards: Vec<Board>, wanted: Option<&str>) -> Result<Board, Box<dyn Error>> {
    match wanted {
        Some(name) => boards
            .into_iter()
            .find(|b| b.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| format!("no open board named '{}'", name).into()),
        None => boards
            .into_iter()
            .next()
            .ok_or_else(|| "no open boards on this account".into()),
    }
}

fn terminal_width() -> usize {
    crossterm::terminal::size()
        .map(|(w, _)| w as usize)
        .unwrap_or(80)
}

// ---------------------------------------------------------------------------
// Show commands
// ---------------------------------------------------------------------------

const DEFAULT_SORT: &str = "activity";

fn parse_fields(arg: Option<&str>) -> Result<Vec<&str>, Box<dyn Error>> {
    let Some(arg) = arg else {
        return Ok(ALL_FIELDS.to_vec());
    };
    let mut fields = Vec::new();
    for name in arg.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        match ALL_FIELDS.iter().find(|f| **f == name) {
            Some(f) => fields.push(*f),
            None => {
                return Err(format!(
                    "unknown field '{}' (valid: {})",
                    name,
                    ALL_FIELDS.join(", ")
                )
                .into());
            }
        }
    }
    Ok(fields)
}

fn cmd_show_cards(ctx: &Ctx, args: &ShowCardsArgs) -> Result<(), Box<dyn Error>> {
    let fields = parse_fields(args.fields.as_deref())?;
    let cards = ctx.matching_cards(&args.filter.to_spec())?;
    if args.json {
        println!("{}", CardView::new(cards).json()?);
        return Ok(());
    }
    if cards.is_empty() {
        eprintln!("No cards matched");
        return Ok(());
    }
    let mut table = ctx.display.table_for(&cards, &fields);
    table.sort_by(args.sort.as_deref().unwrap_or(DEFAULT_SORT));
    if args.tsv {
        print!("{}", table.render_tsv());
    } else {
        let table = fit_unless_projected(table, args.fields.is_some(), terminal_width());
        print!("{}", table.render());
    }
    Ok(())
}

/// An explicit column projection is printed exactly as asked for; only the
/// default column set is narrowed to the terminal.
fn fit_unless_projected(table: CardTable, projected: bool, width: usize) -> CardTable {
    if projected {
        table
    } else {
        table.fit_width(width)
    }
}

fn cmd_show_lists(ctx: &Ctx) -> Result<(), Box<dyn Error>> {
    for list in &ctx.lists {
        if list.closed {
            println!("{} (archived)", list.name);
        } else {
            println!("{}", list.name);
        }
    }
    Ok(())
}

fn cmd_show_tags(ctx: &Ctx, args: &ShowTagsArgs) -> Result<(), Box<dyn Error>> {
    let names: BTreeSet<String> = match &args.list {
        // Tags actually in use on the matched lists.
        Some(pattern) => {
            let spec = FilterSpec {
                list_pattern: Some(pattern.clone()),
                ..Default::default()
            };
            let mut names = BTreeSet::new();
            for card in ctx.source(&spec)? {
                let card = card?;
                names.extend(card.label_names().iter().map(|n| n.to_string()));
            }
            names
        }
        // Every named tag defined on the board.
        None => ctx
            .client
            .labels(&ctx.board.id)?
            .into_iter()
            .map(|l| l.name)
            .filter(|n| !n.is_empty())
            .collect(),
    };
    for name in names {
        println!("{}", name);
    }
    Ok(())
}

fn cmd_show_boards(ctx: &Ctx, args: &ShowBoardsArgs) -> Result<(), Box<dyn Error>> {
    let filter = if args.show_all { "all" } else { "open" };
    for board in ctx.client.boards(filter)? {
        if board.closed {
            println!("{} (closed)", board.name);
        } else {
            println!("{}", board.name);
        }
    }
    Ok(())
}

fn cmd_show_soon(ctx: &Ctx, args: &ShowSoonArgs) -> Result<(), Box<dyn Error>> {
    let spec = FilterSpec {
        has_due: true,
        ..Default::default()
    };
    let cards = ctx.matching_cards(&spec)?;
    if args.json {
        println!("{}", CardView::new(cards).json()?);
        return Ok(());
    }
    if cards.is_empty() {
        eprintln!("No cards matched");
        return Ok(());
    }
    let mut table = ctx.display.table_for(&cards, &ALL_FIELDS);
    table.sort_by("due");
    if args.tsv {
        print!("{}", table.render_tsv());
    } else {
        print!("{}", table.fit_width(terminal_width()).render());
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Grep
// ---------------------------------------------------------------------------

fn cmd_grep(cli: &Cli, args: &GrepArgs) -> Result<(), Box<dyn Error>> {
    let mut patterns: Vec<&str> = Vec::new();
    if let Some(p) = &args.pattern {
        patterns.push(p);
    }
    patterns.extend(args.regexp.iter().map(String::as_str));
    if patterns.is_empty() {
        return Err("a pattern is required (positional or -e)".into());
    }
    let spec = FilterSpec {
        title_pattern: Some(patterns.join("|")),
        ignore_case: args.insensitive,
        ..Default::default()
    };

    let ctx = Ctx::connect(cli)?;
    if args.count {
        let mut count = 0u64;
        for card in ctx.source(&spec)? {
            card?;
            count += 1;
        }
        println!("{}", count);
        return Ok(());
    }
    let cards = ctx.matching_cards(&spec)?;
    if args.json {
        println!("{}", CardView::new(cards).json()?);
    } else if cards.is_empty() {
        eprintln!("No cards matched");
    } else {
        let table = ctx.display.table_for(&cards, &["name", "list"]);
        print!("{}", table.fit_width(terminal_width()).render());
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Add commands
// ---------------------------------------------------------------------------

/// First open list whose name matches the pattern; without a pattern, the
/// board's first open list.
fn pick_list<'a>(
    open: &'a [BoardList],
    pattern: Option<&str>,
) -> Result<&'a BoardList, Box<dyn Error>> {
    match pattern {
        Some(p) => resolve_lists(open, p)?
            .into_iter()
            .next()
            .ok_or_else(|| format!("no list names matched by '{}'", p).into()),
        None => open
            .first()
            .ok_or_else(|| "board has no open lists".into()),
    }
}

fn cmd_add_card(ctx: &Ctx, args: &AddCardArgs) -> Result<(), Box<dyn Error>> {
    let open = ctx.open_lists();
    let list = pick_list(&open, args.list.as_deref())?;
    let title = match &args.title {
        Some(title) => title.clone(),
        None => match interact::edit_text("<Title here>")? {
            Some(text) => text.lines().next().unwrap_or("").trim().to_string(),
            None => return Err("no title entered for the new card".into()),
        },
    };
    if title.is_empty() {
        return Err("no title entered for the new card".into());
    }
    let card = ctx.client.create_card(&list.id, &title, args.message.as_deref())?;
    if args.edit {
        let mut view = CardView::new(vec![card]);
        let mut session = ReviewSession::new(&ctx.client, &ctx.display, &ctx.config, &ctx.board)?;
        session.run(&mut view)?;
    } else {
        println!("Added '{}' to {}", card.name, list.name);
    }
    Ok(())
}

fn cmd_add_tag(ctx: &Ctx, args: &AddTagArgs) -> Result<(), Box<dyn Error>> {
    let label = ctx
        .client
        .create_label(&ctx.board.id, &args.name, &args.color)?;
    println!("Created tag '{}'", label.name);
    Ok(())
}

fn cmd_add_list(ctx: &Ctx, args: &AddListArgs) -> Result<(), Box<dyn Error>> {
    let list = ctx.client.create_list(&ctx.board.id, &args.name)?;
    println!("Created list '{}'", list.name);
    Ok(())
}

// ---------------------------------------------------------------------------
// Batch commands
// ---------------------------------------------------------------------------

// Batch loops pull cards lazily and surface mutation failures per card so
// one refused request does not abandon the rest of the run.

fn cmd_batch_move(ctx: &Ctx, filter: &FilterArgs) -> Result<(), Box<dyn Error>> {
    let mut names: Vec<String> = ctx.open_lists().into_iter().map(|l| l.name).collect();
    names.sort();
    println!("Move matching cards to which list?");
    let Some(i) = interact::single_select(&names)? else {
        println!("No list selected");
        return Ok(());
    };
    let target = ctx
        .open_lists()
        .into_iter()
        .find(|l| l.name == names[i])
        .expect("selected name came from this list");
    let mut any = false;
    for card in ctx.source(&filter.to_spec())? {
        let card = card?;
        any = true;
        ctx.display.show_card(&card, &ctx.client)?;
        if interact::prompt_for_confirmation("Move this card?", true)? {
            if let Err(e) = ctx.client.set_list(&card.id, &target.id) {
                eprintln!("error: could not move '{}': {}", card.name, e);
            } else {
                println!("Moved to {}", target.name);
            }
        }
    }
    if !any {
        eprintln!("No cards matched");
    }
    Ok(())
}

fn cmd_batch_tag(ctx: &Ctx, filter: &FilterArgs) -> Result<(), Box<dyn Error>> {
    let labels: Vec<Label> = ctx
        .client
        .labels(&ctx.board.id)?
        .into_iter()
        .filter(|l| !l.name.is_empty())
        .collect();
    if labels.is_empty() {
        return Err("no named tags on this board".into());
    }
    println!("Add which tags?");
    let names: Vec<String> = labels.iter().map(|l| l.name.clone()).collect();
    let picked = interact::multiple_select(&names)?;
    if picked.is_empty() {
        println!("No tags selected");
        return Ok(());
    }
    let mut any = false;
    for card in ctx.source(&filter.to_spec())? {
        let card = card?;
        any = true;
        let missing: Vec<&Label> = picked
            .iter()
            .map(|&i| &labels[i])
            .filter(|l| !card.has_label_id(&l.id))
            .collect();
        if missing.is_empty() {
            println!("'{}' already tagged", card.name);
            continue;
        }
        ctx.display.show_card(&card, &ctx.client)?;
        if interact::prompt_for_confirmation("Tag this card?", true)? {
            for label in missing {
                if let Err(e) = ctx.client.add_label(&card.id, &label.id) {
                    eprintln!("error: could not tag '{}': {}", card.name, e);
                } else {
                    println!("Added {}", label.name);
                }
            }
        }
    }
    if !any {
        eprintln!("No cards matched");
    }
    Ok(())
}

fn cmd_batch_delete(ctx: &Ctx, filter: &FilterArgs, force: bool) -> Result<(), Box<dyn Error>> {
    let mut any = false;
    for card in ctx.source(&filter.to_spec())? {
        let card = card?;
        any = true;
        ctx.display.show_card(&card, &ctx.client)?;
        if force || interact::prompt_for_confirmation("Delete this card?", false)? {
            if let Err(e) = ctx.client.delete_card(&card.id) {
                eprintln!("error: could not delete '{}': {}", card.name, e);
            } else {
                println!("Deleted!");
            }
        }
    }
    if !any {
        eprintln!("No cards matched");
    }
    Ok(())
}

fn cmd_batch_due(ctx: &Ctx, filter: &FilterArgs) -> Result<(), Box<dyn Error>> {
    let due = loop {
        let Some(line) = interact::prompt_line("due date (e.g. Jun 15 2026)> ")? else {
            return Ok(());
        };
        match date::parse_due(&line) {
            Some(due) => break due,
            None => println!("could not parse that date, try again"),
        }
    };
    let mut any = false;
    for card in ctx.source(&filter.to_spec())? {
        let card = card?;
        any = true;
        ctx.display.show_card(&card, &ctx.client)?;
        if interact::prompt_for_confirmation("Set the due date on this card?", true)? {
            if let Err(e) = ctx.client.set_due(&card.id, due) {
                eprintln!("error: could not set due date on '{}': {}", card.name, e);
            } else {
                println!("Due {}", due.format("%Y-%m-%d"));
            }
        }
    }
    if !any {
        eprintln!("No cards matched");
    }
    Ok(())
}

fn cmd_batch_attach(ctx: &Ctx, filter: &FilterArgs) -> Result<(), Box<dyn Error>> {
    let mut any = false;
    for card in ctx.source(&filter.to_spec())? {
        let card = card?;
        if !url::contains_url(&card.name) {
            continue;
        }
        any = true;
        ctx.display.show_card(&card, &ctx.client)?;
        if interact::prompt_for_confirmation("Attach the link(s) in this title?", true)? {
            for link in url::extract_links(&card.name) {
                if let Err(e) = ctx.client.attach_url(&card.id, link) {
                    eprintln!("error: could not attach '{}': {}", link, e);
                } else {
                    println!("Attached {}", link);
                }
            }
        }
    }
    if !any {
        eprintln!("No cards with a link in the title matched");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Review
// ---------------------------------------------------------------------------

fn cmd_review(ctx: &Ctx, args: &ReviewArgs) -> Result<(), Box<dyn Error>> {
    let mut spec = args.filter.to_spec();
    if args.daily && spec.list_pattern.is_none() {
        spec.list_pattern = Some("Doing".to_string());
        println!("Welcome to the daily review!");
    }
    let cards = ctx.matching_cards(&spec)?;
    if cards.is_empty() {
        println!("No cards to review");
        return Ok(());
    }
    ctx.display.banner();
    println!("Reviewing {} cards", cards.len());
    let mut view = CardView::new(cards);
    let mut session = ReviewSession::new(&ctx.client, &ctx.display, &ctx.config, &ctx.board)?;
    session.run(&mut view)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

fn cmd_config() -> Result<(), Box<dyn Error>> {
    let config = Config::load()?;
    print!("{}", config);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn board(name: &str) -> Board {
        Board {
            id: format!("b-{}", name),
            name: name.to_string(),
            closed: false,
            extra: Default::default(),
        }
    }

    fn list(id: &str, name: &str) -> BoardList {
        BoardList {
            id: id.to_string(),
            name: name.to_string(),
            closed: false,
        }
    }

    #[test]
    fn test_pick_board_by_name_case_insensitive() {
        let boards = vec![board("Work"), board("Home")];
        let picked = pick_board(boards, Some("home")).unwrap();
        assert_eq!(picked.name, "Home");
    }

    #[test]
    fn test_pick_board_unknown_name_errors() {
        let boards = vec![board("Work")];
        assert!(pick_board(boards, Some("Garden")).is_err());
    }

    #[test]
    fn test_pick_board_defaults_to_first() {
        let boards = vec![board("Work"), board("Home")];
        assert_eq!(pick_board(boards, None).unwrap().name, "Work");
    }

    #[test]
    fn test_pick_board_no_boards() {
        assert!(pick_board(vec![], None).is_err());
    }

    #[test]
    fn test_parse_fields_default_and_explicit() {
        assert_eq!(parse_fields(None).unwrap(), ALL_FIELDS.to_vec());
        assert_eq!(
            parse_fields(Some("name, list")).unwrap(),
            vec!["name", "list"]
        );
        assert!(parse_fields(Some("name,bogus")).is_err());
    }

    fn wide_table() -> CardTable {
        let mut t = CardTable::new(vec!["name", "desc"]);
        t.add_row(vec![
            "a".into(),
            "a description long enough to overflow a narrow terminal".into(),
        ]);
        t
    }

    #[test]
    fn test_projected_columns_survive_any_width() {
        let t = fit_unless_projected(wide_table(), true, 10);
        assert!(t.columns().iter().any(|c| c == "desc"));
    }

    #[test]
    fn test_default_columns_narrow_to_terminal() {
        let t = fit_unless_projected(wide_table(), false, 10);
        assert!(!t.columns().iter().any(|c| c == "desc"));
    }

    #[test]
    fn test_default_sort_orders_by_activity() {
        let mut t = CardTable::new(vec!["name", "activity"]);
        t.add_row(vec!["newer".into(), "2026-05-02".into()]);
        t.add_row(vec!["older".into(), "2026-01-15".into()]);
        t.sort_by(DEFAULT_SORT);
        let text = t.render_tsv();
        assert!(text.find("older").unwrap() < text.find("newer").unwrap());
    }

    #[test]
    fn test_pick_list_first_match_wins() {
        let lists = vec![list("1", "Backlog"), list("2", "Doing"), list("3", "Done")];
        assert_eq!(pick_list(&lists, Some("do")).unwrap().name, "Doing");
    }

    #[test]
    fn test_pick_list_defaults_to_first() {
        let lists = vec![list("1", "Backlog"), list("2", "Doing")];
        assert_eq!(pick_list(&lists, None).unwrap().name, "Backlog");
    }

    #[test]
    fn test_pick_list_no_match_errors() {
        let lists = vec![list("1", "Backlog")];
        assert!(pick_list(&lists, Some("archive")).is_err());
        assert!(pick_list(&[], None).is_err());
    }
}
