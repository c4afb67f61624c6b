use std::collections::HashSet;

use regex::RegexBuilder;

use crate::model::Card;

/// Error type for filter construction
#[derive(Debug, thiserror::Error)]
pub enum FilterError {
    #[error("invalid regular expression \"{pattern}\": {source}")]
    BadRegex {
        pattern: String,
        source: regex::Error,
    },
    #[error("--tag and --no-tag are mutually exclusive")]
    TagConflict,
}

/// Card status to request from the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CardStatus {
    All,
    Closed,
    Open,
    #[default]
    Visible,
}

impl CardStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CardStatus::All => "all",
            CardStatus::Closed => "closed",
            CardStatus::Open => "open",
            CardStatus::Visible => "visible",
        }
    }
}

/// A pure boolean test over a card. Predicates are combined with AND.
pub type CardPredicate = Box<dyn Fn(&Card) -> bool>;

/// The immutable set of filter inputs for one command invocation.
///
/// `tag` and `no_tag` are mutually exclusive; when neither is given no tag
/// predicate is produced at all.
#[derive(Debug, Clone, Default)]
pub struct FilterSpec {
    /// Comma-separated tag names; a card must carry every one
    pub tag: Option<String>,
    /// Select only cards with an empty label set
    pub no_tag: bool,
    pub title_pattern: Option<String>,
    /// Case-insensitive title matching (default: sensitive)
    pub ignore_case: bool,
    /// Regex over list names, matched case-insensitively
    pub list_pattern: Option<String>,
    pub has_attachments: bool,
    pub has_due: bool,
    pub status: CardStatus,
}

impl FilterSpec {
    /// Build the predicate list, in fixed order: tag (or no-tag), title
    /// regex, attachment presence, due-date presence. One predicate per
    /// non-default option; all-default yields an empty list that accepts
    /// every card.
    pub fn predicates(&self) -> Result<Vec<CardPredicate>, FilterError> {
        if self.tag.is_some() && self.no_tag {
            return Err(FilterError::TagConflict);
        }
        let mut predicates: Vec<CardPredicate> = Vec::new();

        if let Some(tags) = &self.tag {
            let wanted: HashSet<String> = tags
                .split(',')
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect();
            predicates.push(Box::new(move |card: &Card| {
                let present: HashSet<&str> = card.labels.iter().map(|l| l.name.as_str()).collect();
                wanted.iter().all(|t| present.contains(t.as_str()))
            }));
        }
        if self.no_tag {
            predicates.push(Box::new(|card: &Card| card.id_labels.is_empty()));
        }
        if let Some(pattern) = &self.title_pattern {
            let re = RegexBuilder::new(pattern)
                .case_insensitive(self.ignore_case)
                .build()
                .map_err(|e| FilterError::BadRegex {
                    pattern: pattern.clone(),
                    source: e,
                })?;
            predicates.push(Box::new(move |card: &Card| re.is_match(&card.name)));
        }
        if self.has_attachments {
            predicates.push(Box::new(|card: &Card| card.badges.attachments > 0));
        }
        if self.has_due {
            predicates.push(Box::new(|card: &Card| card.due.is_some()));
        }
        Ok(predicates)
    }
}

/// A card passes iff every predicate accepts it.
pub fn passes(predicates: &[CardPredicate], card: &Card) -> bool {
    predicates.iter().all(|p| p(card))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Badges, Label};
    use pretty_assertions::assert_eq;

    fn card(name: &str, labels: &[(&str, &str)], due: bool, attachments: u32) -> Card {
        Card {
            id: format!("5e6a1f00{:016x}", name.len()),
            name: name.to_string(),
            desc: String::new(),
            due: due.then(|| "2020-06-15T00:00:00Z".parse().unwrap()),
            id_labels: labels.iter().map(|(id, _)| id.to_string()).collect(),
            labels: labels
                .iter()
                .map(|(id, name)| Label {
                    id: id.to_string(),
                    name: name.to_string(),
                    color: None,
                })
                .collect(),
            id_list: "list1".to_string(),
            closed: false,
            date_last_activity: None,
            short_url: None,
            badges: Badges {
                attachments,
                comments: 0,
                extra: Default::default(),
            },
            extra: Default::default(),
        }
    }

    #[test]
    fn test_default_spec_yields_no_predicates() {
        let spec = FilterSpec::default();
        let preds = spec.predicates().unwrap();
        assert_eq!(preds.len(), 0);
        assert!(passes(&preds, &card("anything", &[], false, 0)));
    }

    #[test]
    fn test_predicate_count_matches_options() {
        let spec = FilterSpec {
            tag: Some("urgent".to_string()),
            title_pattern: Some("fix".to_string()),
            has_attachments: true,
            has_due: true,
            ..Default::default()
        };
        assert_eq!(spec.predicates().unwrap().len(), 4);

        let spec = FilterSpec {
            no_tag: true,
            ..Default::default()
        };
        assert_eq!(spec.predicates().unwrap().len(), 1);
    }

    #[test]
    fn test_tag_and_no_tag_conflict() {
        let spec = FilterSpec {
            tag: Some("urgent".to_string()),
            no_tag: true,
            ..Default::default()
        };
        assert!(matches!(spec.predicates(), Err(FilterError::TagConflict)));
    }

    #[test]
    fn test_tag_predicate_requires_all_tags() {
        let spec = FilterSpec {
            tag: Some("urgent,home".to_string()),
            ..Default::default()
        };
        let preds = spec.predicates().unwrap();
        let both = card("a", &[("l1", "urgent"), ("l2", "home")], false, 0);
        let one = card("b", &[("l1", "urgent")], false, 0);
        assert!(passes(&preds, &both));
        assert!(!passes(&preds, &one));
    }

    #[test]
    fn test_no_tag_predicate() {
        let spec = FilterSpec {
            no_tag: true,
            ..Default::default()
        };
        let preds = spec.predicates().unwrap();
        assert!(passes(&preds, &card("bare", &[], false, 0)));
        assert!(!passes(&preds, &card("tagged", &[("l1", "urgent")], false, 0)));
    }

    #[test]
    fn test_title_regex_case_flag() {
        let sensitive = FilterSpec {
            title_pattern: Some("Fix".to_string()),
            ..Default::default()
        };
        let preds = sensitive.predicates().unwrap();
        assert!(!passes(&preds, &card("fix the build", &[], false, 0)));

        let insensitive = FilterSpec {
            title_pattern: Some("Fix".to_string()),
            ignore_case: true,
            ..Default::default()
        };
        let preds = insensitive.predicates().unwrap();
        assert!(passes(&preds, &card("fix the build", &[], false, 0)));
    }

    #[test]
    fn test_bad_regex_is_user_error() {
        let spec = FilterSpec {
            title_pattern: Some("(unclosed".to_string()),
            ..Default::default()
        };
        let err = spec.predicates().err().unwrap();
        assert!(matches!(err, FilterError::BadRegex { .. }));
        assert!(err.to_string().contains("(unclosed"));
    }

    #[test]
    fn test_urgent_with_due_scenario() {
        // Five cards; only #2 and #4 carry the "urgent" label AND a due date.
        let board = vec![
            card("one", &[("l1", "urgent")], false, 0),
            card("two", &[("l1", "urgent")], true, 0),
            card("three", &[], true, 0),
            card("four", &[("l1", "urgent"), ("l2", "home")], true, 0),
            card("five", &[("l2", "home")], false, 0),
        ];
        let spec = FilterSpec {
            tag: Some("urgent".to_string()),
            has_due: true,
            ..Default::default()
        };
        let preds = spec.predicates().unwrap();
        let matched: Vec<&str> = board
            .iter()
            .filter(|c| passes(&preds, c))
            .map(|c| c.name.as_str())
            .collect();
        // Board order preserved
        assert_eq!(matched, vec!["two", "four"]);
    }
}
