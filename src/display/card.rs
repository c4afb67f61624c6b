use std::collections::HashMap;

use chrono::Utc;

use crate::display::table::CardTable;
use crate::model::{BoardList, Card};
use crate::remote::{ApiClient, ApiError};

const RESET: &str = "\x1b[0m";
const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const BLUE: &str = "\x1b[34m";
const MAGENTA: &str = "\x1b[35m";
const CYAN: &str = "\x1b[36m";
const WHITE: &str = "\x1b[37m";

/// ANSI painter that collapses to plain text when color is off.
#[derive(Debug, Clone, Copy)]
pub struct Colors {
    enabled: bool,
}

impl Colors {
    pub fn new(enabled: bool) -> Colors {
        Colors { enabled }
    }

    pub fn paint(&self, code: &str, text: &str) -> String {
        if self.enabled {
            format!("{}{}{}", code, text, RESET)
        } else {
            text.to_string()
        }
    }

    /// Paint text in a label's color. The service uses a few names with no
    /// ANSI counterpart; those map onto the nearest basic color.
    pub fn label(&self, color: Option<&str>, text: &str) -> String {
        let code = match color {
            Some("red") => RED,
            Some("green" | "lime") => GREEN,
            Some("yellow" | "orange") => YELLOW,
            Some("blue") => BLUE,
            Some("purple" | "pink") => MAGENTA,
            Some("sky") => CYAN,
            Some("black") | None => WHITE,
            Some(_) => WHITE,
        };
        self.paint(code, text)
    }
}

const BANNER: &str = r"  _             _
 | | ____ _ _ _| |
 | |/ / _` | '_| _|
 |   < (_| | | | |_
 |_|\_\__,_|_|  \__|
";

/// Renders cards, tables and the startup banner to stdout.
pub struct Display {
    colors: Colors,
    banner: bool,
    lists_by_id: HashMap<String, String>,
}

impl Display {
    pub fn new(color: bool, banner: bool, lists: &[BoardList]) -> Display {
        Display {
            colors: Colors::new(color),
            banner,
            lists_by_id: lists
                .iter()
                .map(|l| (l.id.clone(), l.name.clone()))
                .collect(),
        }
    }

    pub fn banner(&self) {
        if self.banner {
            print!("{}", self.colors.paint(GREEN, BANNER));
        }
    }

    pub fn list_name<'a>(&'a self, list_id: &'a str) -> &'a str {
        self.lists_by_id
            .get(list_id)
            .map(String::as_str)
            .unwrap_or(list_id)
    }

    /// Full per-card detail block. Attachments and comments are fetched on
    /// demand; the badge counts tell us whether a fetch is worth it.
    pub fn show_card(&self, card: &Card, client: &ApiClient) -> Result<(), ApiError> {
        println!("{}", self.colors.paint(BLUE, &format!("Card {}", card.id)));
        println!("  Name:    {}", card.name);
        println!("  List:    {}", self.list_name(&card.id_list));
        if !card.labels.is_empty() {
            let tags: Vec<String> = card
                .labels
                .iter()
                .map(|l| self.colors.label(l.color.as_deref(), &l.name))
                .collect();
            println!("  Tags:    {}", tags.join(", "));
        }
        if let Some(created) = card.created_at() {
            let age = (Utc::now() - created).num_days();
            println!(
                "  Created: {} ({} days ago)",
                created.format("%Y-%m-%d"),
                age
            );
        }
        if card.badges.attachments > 0 {
            println!("  Attachments:");
            for attachment in client.card_attachments(&card.id)? {
                let url = attachment.url.as_deref().unwrap_or("(no url)");
                println!("    {}: {}", attachment.title(), url);
            }
        }
        if card.badges.comments > 0 {
            println!("  Comments:");
            for comment in client.card_comments(&card.id)? {
                let author = comment
                    .member
                    .as_ref()
                    .map(|m| m.username.as_str())
                    .unwrap_or("someone");
                println!(
                    "    [{} {}] {}",
                    comment.date.format("%Y-%m-%d"),
                    author,
                    comment.data.text
                );
            }
        }
        if let Some(due) = card.due {
            let remaining = (due - Utc::now()).num_days();
            let code = if remaining < 0 {
                RED
            } else if remaining < 14 {
                YELLOW
            } else {
                GREEN
            };
            let text = format!("{} ({} days remaining)", due.format("%Y-%m-%d"), remaining);
            println!("  Due:     {}", self.colors.paint(code, &text));
        }
        if !card.desc.is_empty() {
            println!("  Description:");
            for line in card.desc.lines() {
                println!("    {}", line);
            }
        }
        Ok(())
    }

    /// One cell of the card table.
    pub fn field_value(&self, card: &Card, field: &str) -> String {
        match field {
            "name" => card.name.clone(),
            "list" => self.list_name(&card.id_list).to_string(),
            "tags" => card.label_names().join("\n"),
            "desc" => card.desc.clone(),
            "due" => card
                .due
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            "activity" => card
                .date_last_activity
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            "id" => card.id.clone(),
            "url" => card.short_url.clone().unwrap_or_default(),
            _ => String::new(),
        }
    }

    /// Build a table of the given fields, one row per card.
    pub fn table_for(&self, cards: &[Card], fields: &[&str]) -> CardTable {
        let mut table = CardTable::new(fields.to_vec());
        for card in cards {
            table.add_row(fields.iter().map(|f| self.field_value(card, f)).collect());
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Badges, Label};
    use pretty_assertions::assert_eq;

    fn sample_card() -> Card {
        Card {
            id: "5e6a1f00aabbccddeeff0011".to_string(),
            name: "Fix the roof".to_string(),
            desc: "before winter".to_string(),
            due: None,
            id_labels: vec!["l1".to_string()],
            labels: vec![Label {
                id: "l1".to_string(),
                name: "urgent".to_string(),
                color: Some("red".to_string()),
            }],
            id_list: "list1".to_string(),
            closed: false,
            date_last_activity: None,
            short_url: Some("https://example.com/c/abc".to_string()),
            badges: Badges {
                attachments: 0,
                comments: 0,
                extra: Default::default(),
            },
            extra: Default::default(),
        }
    }

    fn sample_display() -> Display {
        Display::new(
            false,
            false,
            &[BoardList {
                id: "list1".to_string(),
                name: "Doing".to_string(),
                closed: false,
            }],
        )
    }

    #[test]
    fn test_colors_disabled_passes_text_through() {
        let colors = Colors::new(false);
        assert_eq!(colors.paint(RED, "hello"), "hello");
        assert_eq!(colors.label(Some("sky"), "hello"), "hello");
    }

    #[test]
    fn test_colors_enabled_wraps_text() {
        let colors = Colors::new(true);
        assert_eq!(colors.paint(RED, "x"), "\x1b[31mx\x1b[0m");
        // "sky" is not an ANSI color; it renders as cyan.
        assert_eq!(colors.label(Some("sky"), "x"), "\x1b[36mx\x1b[0m");
    }

    #[test]
    fn test_field_value_resolves_list_name() {
        let display = sample_display();
        let card = sample_card();
        assert_eq!(display.field_value(&card, "list"), "Doing");
        assert_eq!(display.field_value(&card, "tags"), "urgent");
        assert_eq!(display.field_value(&card, "due"), "");
    }

    #[test]
    fn test_field_value_unknown_list_falls_back_to_id() {
        let display = sample_display();
        let mut card = sample_card();
        card.id_list = "mystery".to_string();
        assert_eq!(display.field_value(&card, "list"), "mystery");
    }

    #[test]
    fn test_table_for_builds_one_row_per_card() {
        let display = sample_display();
        let cards = vec![sample_card(), sample_card()];
        let table = display.table_for(&cards, &["name", "list"]);
        let text = table.render_tsv();
        assert_eq!(text.lines().count(), 3);
        assert!(text.contains("Fix the roof\tDoing"));
    }
}
