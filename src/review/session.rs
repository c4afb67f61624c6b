use crate::display::Display;
use crate::interact::{self, InputError};
use crate::model::{Board, Card, Config, Label};
use crate::remote::{ApiClient, ApiError};
use crate::review::{BoardIndex, COMMAND_HELP, ReviewCommand, ReviewStep};
use crate::util::{date, url};
use crate::view::CardView;

/// Error type for the interactive review session
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Input(#[from] InputError),
}

/// The interactive per-card review loop.
///
/// Each card gets the same treatment: display it, run the automatic
/// suggestions, then take commands until one moves the cursor or ends the
/// session. Quit is an ordinary return value, never an unwind.
pub struct ReviewSession<'a> {
    client: &'a ApiClient,
    display: &'a Display,
    config: &'a Config,
    board: &'a Board,
    index: BoardIndex,
}

impl<'a> ReviewSession<'a> {
    pub fn new(
        client: &'a ApiClient,
        display: &'a Display,
        config: &'a Config,
        board: &'a Board,
    ) -> Result<ReviewSession<'a>, SessionError> {
        let index = BoardIndex::load(client, &board.id)?;
        Ok(ReviewSession {
            client,
            display,
            config,
            board,
            index,
        })
    }

    /// Walk the view until it is exhausted or the user quits.
    pub fn run(&mut self, view: &mut CardView) -> Result<(), SessionError> {
        if view.is_empty() {
            return Ok(());
        }
        loop {
            match self.card_repl(view)? {
                ReviewStep::Next => {
                    if view.next().is_none() {
                        println!("All done!");
                        return Ok(());
                    }
                }
                // A no-op at the first card; the same card is shown again.
                ReviewStep::Prev => {
                    view.prev();
                }
                ReviewStep::Quit => return Ok(()),
            }
        }
    }

    /// Display one card, run the suggestion preamble, then loop on commands
    /// until one of them moves the cursor or ends the session.
    fn card_repl(&mut self, view: &mut CardView) -> Result<ReviewStep, SessionError> {
        let mut card = match view.current() {
            Some(card) => card.clone(),
            None => return Ok(ReviewStep::Quit),
        };
        println!();
        self.display.show_card(&card, self.client)?;
        self.preamble(&mut card)?;

        let step = loop {
            let line = match interact::prompt_line("kard > ") {
                Ok(Some(line)) => line,
                Ok(None) => continue,
                Err(InputError::Eof) => break ReviewStep::Quit,
                Err(e) => return Err(e.into()),
            };
            match ReviewCommand::parse(&line) {
                None => println!("{:?} is not a command, try \"help\"", line),
                Some(ReviewCommand::Next) => break ReviewStep::Next,
                Some(ReviewCommand::Prev) => break ReviewStep::Prev,
                Some(ReviewCommand::Quit) => break ReviewStep::Quit,
                Some(ReviewCommand::Help) => println!("{}", COMMAND_HELP),
                Some(ReviewCommand::Print) => {
                    card = self.client.card(&card.id)?;
                    self.display.show_card(&card, self.client)?;
                }
                Some(ReviewCommand::Delete) => {
                    self.client.delete_card(&card.id)?;
                    println!("Deleted!");
                    break ReviewStep::Next;
                }
                Some(ReviewCommand::Archive) => {
                    self.client.set_closed(&card.id, true)?;
                    println!("Archived!");
                    break ReviewStep::Next;
                }
                Some(ReviewCommand::Unarchive) => {
                    self.client.set_closed(&card.id, false)?;
                    card.closed = false;
                    println!("Restored!");
                }
                Some(ReviewCommand::Move) => {
                    if self.move_to_list(&card)? {
                        break ReviewStep::Next;
                    }
                }
                Some(ReviewCommand::Tag) => self.add_labels(&mut card)?,
                Some(ReviewCommand::Rename) => {
                    let variables = [("oldname", card.name.clone())];
                    self.rename(&mut card, None, &variables)?
                }
                Some(ReviewCommand::DueDate) => self.set_due_date(&mut card)?,
                Some(ReviewCommand::Description) => self.change_description(&mut card)?,
                Some(ReviewCommand::Comment) => self.add_comment(&card)?,
                Some(ReviewCommand::Attach) => self.manipulate_attachments(&mut card)?,
                Some(ReviewCommand::Open) => self.open_attachment(&card)?,
            }
        };
        view.replace_current(card);
        Ok(step)
    }

    /// Automatic suggestions before the command loop, in fixed order:
    /// attachments worth opening, a URL stuck in the title, a missing tag.
    /// Each one is gated by its own confirmation.
    fn preamble(&mut self, card: &mut Card) -> Result<(), SessionError> {
        if card.badges.attachments > 0
            && self.config.prompt_for_open_attachments
            && interact::prompt_for_confirmation("Open attachments in browser?", false)?
        {
            for attachment in self.client.card_attachments(&card.id)? {
                if let Some(link) = &attachment.url {
                    let _ = url::open_in_browser(link);
                }
            }
        }
        if url::contains_url(&card.name)
            && interact::prompt_for_confirmation(
                "Link in title. Attach it and clean up the name?",
                true,
            )?
        {
            self.title_to_link(card)?;
        }
        if card.id_labels.is_empty()
            && self.config.prompt_for_untagged_cards
            && interact::prompt_for_confirmation("Card has no tags. Tag it?", true)?
        {
            self.add_labels(card)?;
        }
        Ok(())
    }

    /// Pull URLs out of the title, attach any that are not already on the
    /// card, then offer a rename with the links stripped. Page titles are
    /// fetched best-effort and offered as substitution variables.
    fn title_to_link(&mut self, card: &mut Card) -> Result<(), SessionError> {
        let links: Vec<String> = url::extract_links(&card.name)
            .into_iter()
            .map(str::to_string)
            .collect();
        let attached: Vec<String> = self
            .client
            .card_attachments(&card.id)?
            .into_iter()
            .filter_map(|a| a.url)
            .collect();
        let mut variables = vec![("oldname".to_string(), card.name.clone())];
        for (i, link) in links.iter().enumerate() {
            if !attached.contains(link) {
                self.client.attach_url(&card.id, link)?;
                println!("Attached {}", link);
            }
            variables.push((format!("link{}", i), link.clone()));
            if let Some(title) = url::page_title(link) {
                variables.push((format!("title{}", i), title));
            }
        }
        let default = url::strip_links(&card.name);
        let refs: Vec<(&str, String)> = variables
            .iter()
            .map(|(k, v)| (k.as_str(), v.clone()))
            .collect();
        self.rename(card, Some(default), &refs)?;
        Ok(())
    }

    /// Prompt for a new name. `$variable` references are expanded; a blank
    /// line takes the default when there is one, otherwise keeps the name.
    fn rename(
        &self,
        card: &mut Card,
        default: Option<String>,
        variables: &[(&str, String)],
    ) -> Result<(), SessionError> {
        for (name, value) in variables {
            println!("  ${} = {}", name, value);
        }
        let prompt = match &default {
            Some(d) => format!("new name (blank for {:?})> ", d),
            None => "new name (blank keeps current)> ".to_string(),
        };
        let new_name = match interact::prompt_line(&prompt) {
            Ok(Some(line)) => {
                let mut expanded = line;
                for (name, value) in variables {
                    expanded = expanded.replace(&format!("${}", name), value);
                }
                expanded
            }
            Ok(None) => match default {
                Some(d) => d,
                None => return Ok(()),
            },
            Err(InputError::Eof) => return Ok(()),
            Err(e) => return Err(e.into()),
        };
        if new_name.is_empty() || new_name == card.name {
            return Ok(());
        }
        self.client.set_name(&card.id, &new_name)?;
        card.name = new_name;
        println!("Renamed!");
        Ok(())
    }

    /// Tag-toggle loop: a known name is added or removed, an unknown name
    /// offers label creation. Blank input exits.
    fn add_labels(&mut self, card: &mut Card) -> Result<(), SessionError> {
        println!("Tags on this board: {}", self.tag_names().join(", "));
        loop {
            let name = match interact::prompt_line("kard > tag > ") {
                Ok(Some(line)) => line,
                Ok(None) | Err(InputError::Eof) => return Ok(()),
                Err(e) => return Err(e.into()),
            };
            if name == "ls" {
                println!("{}", self.tag_names().join(", "));
                continue;
            }
            let label = match self.index.labels.get(&name) {
                Some(label) => label.clone(),
                None => {
                    let message = format!("Tag {:?} does not exist. Create it?", name);
                    if !interact::prompt_for_confirmation(&message, false)? {
                        continue;
                    }
                    let label = self.client.create_label(&self.board.id, &name, "green")?;
                    self.index.refresh_labels(self.client, &self.board.id)?;
                    label
                }
            };
            if toggle_label(card, &label) {
                self.client.add_label(&card.id, &label.id)?;
                println!("Added {}", label.name);
            } else {
                self.client.remove_label(&card.id, &label.id)?;
                println!("Removed {}", label.name);
            }
        }
    }

    fn tag_names(&self) -> Vec<&str> {
        self.index.labels.keys().map(String::as_str).collect()
    }

    /// Prompt for a due date, retrying on anything unparseable. Blank input
    /// cancels.
    fn set_due_date(&self, card: &mut Card) -> Result<(), SessionError> {
        loop {
            let line = match interact::prompt_line("due date (e.g. Jun 15 2026)> ") {
                Ok(Some(line)) => line,
                Ok(None) | Err(InputError::Eof) => return Ok(()),
                Err(e) => return Err(e.into()),
            };
            match date::parse_due(&line) {
                Some(due) => {
                    self.client.set_due(&card.id, due)?;
                    card.due = Some(due);
                    println!("Due {}", due.format("%Y-%m-%d"));
                    return Ok(());
                }
                None => println!("could not parse that date, try again"),
            }
        }
    }

    fn change_description(&self, card: &mut Card) -> Result<(), SessionError> {
        if let Some(text) = interact::edit_text(&card.desc)? {
            self.client.set_desc(&card.id, &text)?;
            card.desc = text;
            println!("Updated!");
        }
        Ok(())
    }

    fn add_comment(&self, card: &Card) -> Result<(), SessionError> {
        if let Some(text) = interact::edit_text("")? {
            self.client.comment(&card.id, &text)?;
            println!("Commented!");
        }
        Ok(())
    }

    /// Attachment sub-loop: a URL attaches it, `print` lists, `open` and
    /// `delete` pick one. Blank input exits.
    fn manipulate_attachments(&self, card: &mut Card) -> Result<(), SessionError> {
        println!("attach: paste a URL, or print / open / delete");
        loop {
            let line = match interact::prompt_line("kard > attach > ") {
                Ok(Some(line)) => line,
                Ok(None) | Err(InputError::Eof) => return Ok(()),
                Err(e) => return Err(e.into()),
            };
            match line.as_str() {
                "print" => {
                    for attachment in self.client.card_attachments(&card.id)? {
                        let link = attachment.url.as_deref().unwrap_or("(no url)");
                        println!("  {}: {}", attachment.title(), link);
                    }
                }
                "open" => self.open_attachment(card)?,
                "delete" => {
                    let attachments = self.client.card_attachments(&card.id)?;
                    let names: Vec<String> =
                        attachments.iter().map(|a| a.title().to_string()).collect();
                    if let Some(i) = interact::single_select(&names)? {
                        self.client.remove_attachment(&card.id, &attachments[i].id)?;
                        card.badges.attachments = card.badges.attachments.saturating_sub(1);
                        println!("Deleted {}", names[i]);
                    }
                }
                _ if url::contains_url(&line) => {
                    self.client.attach_url(&card.id, &line)?;
                    card.badges.attachments += 1;
                    println!("Attached!");
                }
                _ => println!("attach: paste a URL, or print / open / delete"),
            }
        }
    }

    fn open_attachment(&self, card: &Card) -> Result<(), SessionError> {
        let attachments: Vec<_> = self
            .client
            .card_attachments(&card.id)?
            .into_iter()
            .filter(|a| a.url.is_some())
            .collect();
        if attachments.is_empty() {
            println!("Nothing to open");
            return Ok(());
        }
        let choice = if attachments.len() == 1 {
            Some(0)
        } else {
            let names: Vec<String> = attachments.iter().map(|a| a.title().to_string()).collect();
            interact::single_select(&names)?
        };
        if let Some(i) = choice {
            if let Some(link) = &attachments[i].url {
                let _ = url::open_in_browser(link);
            }
        }
        Ok(())
    }

    /// Pick a destination list. Returns true when the card moved, false when
    /// the user made no selection (the card stays put).
    fn move_to_list(&self, card: &Card) -> Result<bool, SessionError> {
        let mut names: Vec<String> = self.index.lists.keys().cloned().collect();
        names.sort();
        match interact::single_select(&names)? {
            Some(i) => {
                let list = &self.index.lists[&names[i]];
                self.client.set_list(&card.id, &list.id)?;
                println!("Moved to {}", list.name);
                Ok(true)
            }
            None => {
                println!("Skipping!");
                Ok(false)
            }
        }
    }
}

/// Flip a label's presence on the local card copy. Returns true when the
/// label was added, false when removed.
fn toggle_label(card: &mut Card, label: &Label) -> bool {
    if card.has_label_id(&label.id) {
        card.id_labels.retain(|id| id != &label.id);
        card.labels.retain(|l| l.id != label.id);
        false
    } else {
        card.id_labels.push(label.id.clone());
        card.labels.push(label.clone());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Badges;
    use pretty_assertions::assert_eq;

    fn bare_card() -> Card {
        Card {
            id: "5e6a1f00aabbccddeeff0011".to_string(),
            name: "card".to_string(),
            desc: String::new(),
            due: None,
            id_labels: vec![],
            labels: vec![],
            id_list: "list1".to_string(),
            closed: false,
            date_last_activity: None,
            short_url: None,
            badges: Badges::default(),
            extra: Default::default(),
        }
    }

    fn label(id: &str, name: &str) -> Label {
        Label {
            id: id.to_string(),
            name: name.to_string(),
            color: None,
        }
    }

    #[test]
    fn test_toggle_label_adds_then_removes() {
        let mut card = bare_card();
        let urgent = label("l1", "urgent");
        assert!(toggle_label(&mut card, &urgent));
        assert_eq!(card.id_labels, vec!["l1"]);
        assert_eq!(card.label_names(), vec!["urgent"]);
        assert!(!toggle_label(&mut card, &urgent));
        assert!(card.id_labels.is_empty());
        assert!(card.labels.is_empty());
    }

    #[test]
    fn test_toggle_label_leaves_other_labels_alone() {
        let mut card = bare_card();
        toggle_label(&mut card, &label("l1", "urgent"));
        toggle_label(&mut card, &label("l2", "home"));
        toggle_label(&mut card, &label("l1", "urgent"));
        assert_eq!(card.id_labels, vec!["l2"]);
        assert_eq!(card.label_names(), vec!["home"]);
    }

}
