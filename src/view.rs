use crate::model::Card;

/// A materialized selection of cards with a movable cursor.
///
/// The position stays in `0..len` for a non-empty view; the cursor never
/// wraps and never walks past either end.
pub struct CardView {
    cards: Vec<Card>,
    position: usize,
}

impl CardView {
    pub fn new(cards: Vec<Card>) -> CardView {
        CardView { cards, position: 0 }
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn current(&self) -> Option<&Card> {
        self.cards.get(self.position)
    }

    /// Advance and return the new current card. At the last card this is a
    /// no-op returning None.
    pub fn next(&mut self) -> Option<&Card> {
        if self.position + 1 < self.cards.len() {
            self.position += 1;
            self.current()
        } else {
            None
        }
    }

    /// Step back and return the new current card. At the first card this is
    /// a no-op returning None.
    pub fn prev(&mut self) -> Option<&Card> {
        if self.position > 0 {
            self.position -= 1;
            self.current()
        } else {
            None
        }
    }

    /// Swap in a freshly fetched copy of the current card.
    pub fn replace_current(&mut self, card: Card) {
        if self.position < self.cards.len() {
            self.cards[self.position] = card;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Card> {
        self.cards.iter()
    }

    /// The whole selection as pretty-printed JSON, object keys sorted.
    pub fn json(&self) -> serde_json::Result<String> {
        let value = serde_json::to_value(&self.cards)?;
        serde_json::to_string_pretty(&value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Badges, Card};
    use pretty_assertions::assert_eq;

    fn card(name: &str) -> Card {
        Card {
            id: format!("5e6a1f00{:016x}", name.len()),
            name: name.to_string(),
            desc: String::new(),
            due: None,
            id_labels: vec![],
            labels: vec![],
            id_list: "list1".to_string(),
            closed: false,
            date_last_activity: None,
            short_url: None,
            badges: Badges {
                attachments: 0,
                comments: 0,
                extra: Default::default(),
            },
            extra: Default::default(),
        }
    }

    fn view(names: &[&str]) -> CardView {
        CardView::new(names.iter().map(|n| card(n)).collect())
    }

    #[test]
    fn test_starts_at_first_card() {
        let v = view(&["a", "b", "c"]);
        assert_eq!(v.position(), 0);
        assert_eq!(v.current().unwrap().name, "a");
    }

    #[test]
    fn test_next_reaches_last_then_stops() {
        let mut v = view(&["a", "b", "c"]);
        assert_eq!(v.next().unwrap().name, "b");
        assert_eq!(v.next().unwrap().name, "c");
        assert_eq!(v.position(), 2);
        // Third call is a no-op at the end.
        assert!(v.next().is_none());
        assert_eq!(v.position(), 2);
        assert_eq!(v.current().unwrap().name, "c");
    }

    #[test]
    fn test_prev_is_noop_at_first_card() {
        let mut v = view(&["a", "b"]);
        assert!(v.prev().is_none());
        assert_eq!(v.position(), 0);
        assert_eq!(v.current().unwrap().name, "a");
    }

    #[test]
    fn test_prev_steps_back() {
        let mut v = view(&["a", "b"]);
        v.next();
        assert_eq!(v.prev().unwrap().name, "a");
        assert_eq!(v.position(), 0);
    }

    #[test]
    fn test_empty_view() {
        let mut v = view(&[]);
        assert!(v.is_empty());
        assert!(v.current().is_none());
        assert!(v.next().is_none());
        assert!(v.prev().is_none());
        assert_eq!(v.position(), 0);
    }

    #[test]
    fn test_replace_current() {
        let mut v = view(&["a", "b"]);
        v.next();
        let mut fresh = card("b");
        fresh.name = "b renamed".to_string();
        v.replace_current(fresh);
        assert_eq!(v.current().unwrap().name, "b renamed");
        assert_eq!(v.prev().unwrap().name, "a");
    }

    #[test]
    fn test_json_sorts_keys() {
        let v = view(&["a"]);
        let text = v.json().unwrap();
        let badges = text.find("\"badges\"").unwrap();
        let name = text.find("\"name\"").unwrap();
        assert!(badges < name);
    }
}
