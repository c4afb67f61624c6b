use std::collections::VecDeque;

use regex::RegexBuilder;

use crate::filter::spec::{self, CardPredicate, FilterError, FilterSpec};
use crate::model::{BoardList, Card};
use crate::remote::{ApiClient, ApiError};

/// Error type for card retrieval
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error(transparent)]
    Filter(#[from] FilterError),
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Lists whose names match `pattern`, case-insensitively, as a substring.
/// Board order is preserved and every match is kept.
pub fn resolve_lists<'a>(
    lists: &'a [BoardList],
    pattern: &str,
) -> Result<Vec<&'a BoardList>, FilterError> {
    let re = RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| FilterError::BadRegex {
            pattern: pattern.to_string(),
            source: e,
        })?;
    Ok(lists.iter().filter(|l| re.is_match(&l.name)).collect())
}

enum Pending {
    /// Fetch the whole board in one request.
    Board(String),
    /// Fetch each remaining list in its own request.
    Lists(VecDeque<String>),
    Done,
}

/// Lazy stream of cards matching a `FilterSpec`.
///
/// Nothing is fetched until the first call to `next()`; a consumer that stops
/// early (such as a review session the user quits) never pays for the cards
/// it did not look at. Each fetched batch runs through the filter's
/// predicates before being handed out.
pub struct CardSource<'a> {
    client: &'a ApiClient,
    status: &'static str,
    predicates: Vec<CardPredicate>,
    pending: Pending,
    buffer: VecDeque<Card>,
}

impl<'a> CardSource<'a> {
    /// Source over every card on the board.
    pub fn board(
        client: &'a ApiClient,
        board_id: &str,
        spec: &FilterSpec,
    ) -> Result<CardSource<'a>, FilterError> {
        Ok(CardSource {
            client,
            status: spec.status.as_str(),
            predicates: spec.predicates()?,
            pending: Pending::Board(board_id.to_string()),
            buffer: VecDeque::new(),
        })
    }

    /// Source over the cards of specific lists, in the order given.
    pub fn lists(
        client: &'a ApiClient,
        lists: &[&BoardList],
        spec: &FilterSpec,
    ) -> Result<CardSource<'a>, FilterError> {
        Ok(CardSource {
            client,
            status: spec.status.as_str(),
            predicates: spec.predicates()?,
            pending: Pending::Lists(lists.iter().map(|l| l.id.clone()).collect()),
            buffer: VecDeque::new(),
        })
    }

    /// Pull the next batch into the buffer. Returns false when exhausted.
    fn refill(&mut self) -> Result<bool, ApiError> {
        loop {
            let batch = match &mut self.pending {
                Pending::Board(board_id) => {
                    let cards = self.client.board_cards(board_id, self.status)?;
                    self.pending = Pending::Done;
                    cards
                }
                Pending::Lists(queue) => match queue.pop_front() {
                    Some(list_id) => self.client.list_cards(&list_id, self.status)?,
                    None => {
                        self.pending = Pending::Done;
                        return Ok(false);
                    }
                },
                Pending::Done => return Ok(false),
            };
            self.buffer.extend(
                batch
                    .into_iter()
                    .filter(|card| spec::passes(&self.predicates, card)),
            );
            // A list may contribute nothing; keep going until a card shows
            // up or the work queue runs dry.
            if !self.buffer.is_empty() {
                return Ok(true);
            }
        }
    }

    /// Drain the remaining cards into a vector, stopping at the first error.
    pub fn collect_all(self) -> Result<Vec<Card>, SourceError> {
        let mut cards = Vec::new();
        for card in self {
            cards.push(card?);
        }
        Ok(cards)
    }
}

impl Iterator for CardSource<'_> {
    type Item = Result<Card, ApiError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.buffer.is_empty() {
            match self.refill() {
                Ok(true) => {}
                Ok(false) => return None,
                Err(e) => {
                    self.pending = Pending::Done;
                    return Some(Err(e));
                }
            }
        }
        self.buffer.pop_front().map(Ok)
    }
}
