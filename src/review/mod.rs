pub mod session;

use indexmap::IndexMap;

use crate::model::{BoardList, Label};
use crate::remote::{ApiClient, ApiError};

pub use session::{ReviewSession, SessionError};

/// Name lookups for the board under review, in board order.
///
/// The index is owned by the session and refreshed explicitly after a
/// mutation that can invalidate it (label creation). Nothing refreshes it
/// behind the session's back.
pub struct BoardIndex {
    pub lists: IndexMap<String, BoardList>,
    pub labels: IndexMap<String, Label>,
}

impl BoardIndex {
    pub fn load(client: &ApiClient, board_id: &str) -> Result<BoardIndex, ApiError> {
        let lists = client
            .lists(board_id, "open")?
            .into_iter()
            .map(|l| (l.name.clone(), l))
            .collect();
        let labels = load_labels(client, board_id)?;
        Ok(BoardIndex { lists, labels })
    }

    pub fn refresh_labels(&mut self, client: &ApiClient, board_id: &str) -> Result<(), ApiError> {
        self.labels = load_labels(client, board_id)?;
        Ok(())
    }
}

fn load_labels(
    client: &ApiClient,
    board_id: &str,
) -> Result<IndexMap<String, Label>, ApiError> {
    Ok(client
        .labels(board_id)?
        .into_iter()
        .filter(|l| !l.name.is_empty())
        .map(|l| (l.name.clone(), l))
        .collect())
}

/// How the session proceeds after one card's command loop ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewStep {
    Next,
    Prev,
    Quit,
}

/// One textual command in the per-card loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewCommand {
    Next,
    Prev,
    Print,
    Delete,
    Archive,
    Unarchive,
    Move,
    Tag,
    Rename,
    DueDate,
    Description,
    Comment,
    Attach,
    Open,
    Help,
    Quit,
}

impl ReviewCommand {
    pub fn parse(input: &str) -> Option<ReviewCommand> {
        match input.trim() {
            "next" | "n" => Some(ReviewCommand::Next),
            "prev" | "p" => Some(ReviewCommand::Prev),
            "print" => Some(ReviewCommand::Print),
            "delete" => Some(ReviewCommand::Delete),
            "archive" => Some(ReviewCommand::Archive),
            "unarchive" => Some(ReviewCommand::Unarchive),
            "move" | "m" => Some(ReviewCommand::Move),
            "tag" | "t" => Some(ReviewCommand::Tag),
            "rename" => Some(ReviewCommand::Rename),
            "duedate" => Some(ReviewCommand::DueDate),
            "description" | "desc" => Some(ReviewCommand::Description),
            "comment" => Some(ReviewCommand::Comment),
            "attach" => Some(ReviewCommand::Attach),
            "open" | "o" => Some(ReviewCommand::Open),
            "help" | "h" => Some(ReviewCommand::Help),
            "quit" | "q" => Some(ReviewCommand::Quit),
            _ => None,
        }
    }
}

pub const COMMAND_HELP: &str = "\
next (n)      move to the next card
prev (p)      move to the previous card
print         re-fetch and re-display this card
delete        delete this card and move on
archive       archive this card and move on
unarchive     restore this card from the archive
move (m)      move this card to another list
tag (t)       toggle tags on this card
rename        change this card's title
duedate       set a due date
description   edit the description in $EDITOR
comment       add a comment
attach        manage attachments
open (o)      open an attachment in the browser
help (h)      show this message
quit (q)      end the review session";

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_aliases() {
        assert_eq!(ReviewCommand::parse("n"), Some(ReviewCommand::Next));
        assert_eq!(ReviewCommand::parse("next"), Some(ReviewCommand::Next));
        assert_eq!(ReviewCommand::parse("q"), Some(ReviewCommand::Quit));
        assert_eq!(ReviewCommand::parse("desc"), Some(ReviewCommand::Description));
        assert_eq!(ReviewCommand::parse("  move "), Some(ReviewCommand::Move));
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert_eq!(ReviewCommand::parse("destroy"), None);
        assert_eq!(ReviewCommand::parse(""), None);
    }

    #[test]
    fn test_help_mentions_every_command() {
        for word in ["next", "prev", "delete", "move", "tag", "quit"] {
            assert!(COMMAND_HELP.contains(word), "missing {word}");
        }
    }
}
