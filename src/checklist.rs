//! Checklist parsing for issue bodies
//!
//! GitHub task-list grammar: lines of the form `- [ ] text` or `- [x] text`
//! (also `*` bullets; the `x` is case-insensitive). Source order is preserved
//! as the item index.

/// One parsed checklist item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecklistItem {
    /// Zero-based source-order index among checklist lines
    pub index: usize,
    /// Item text with the marker stripped
    pub text: String,
    /// Whether the box is checked
    pub checked: bool,
}

/// All checklist items found in a body
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Checklist {
    /// Items in source order
    pub items: Vec<ChecklistItem>,
}

impl Checklist {
    /// Total number of items
    pub fn total(&self) -> usize {
        self.items.len()
    }

    /// Number of checked items
    pub fn completed(&self) -> usize {
        self.items.iter().filter(|i| i.checked).count()
    }

    /// First unchecked item in source order, if any
    pub fn first_unchecked(&self) -> Option<&ChecklistItem> {
        self.items.iter().find(|i| !i.checked)
    }

    /// Whether the body contained items and all of them are checked
    pub fn all_done(&self) -> bool {
        !self.items.is_empty() && self.items.iter().all(|i| i.checked)
    }
}

/// Parse every checklist line out of an issue body.
///
/// Non-checklist lines are ignored. Indented items are accepted (nested
/// lists), the indentation is not preserved.
pub fn parse_checklist(body: &str) -> Checklist {
    let mut items = Vec::new();

    for line in body.lines() {
        let trimmed = line.trim_start();
        let Some(rest) = trimmed
            .strip_prefix("- ")
            .or_else(|| trimmed.strip_prefix("* "))
        else {
            continue;
        };

        let checked = if rest.starts_with("[ ] ") || rest == "[ ]" {
            false
        } else if rest.len() >= 3 && rest.is_char_boundary(3) {
            let (marker, _) = rest.split_at(3);
            let is_marker = marker.starts_with('[')
                && marker.ends_with(']')
                && marker[1..2].eq_ignore_ascii_case("x");
            if is_marker && (rest.len() == 3 || rest[3..].starts_with(' ')) {
                true
            } else {
                continue;
            }
        } else {
            continue;
        };

        let text = rest[3..].trim().to_string();
        items.push(ChecklistItem {
            index: items.len(),
            text,
            checked,
        });
    }

    Checklist { items }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mixed_items_preserves_order() {
        let body = "Intro text\n- [x] done item\n- [ ] todo item\n";
        let list = parse_checklist(body);

        assert_eq!(list.total(), 2);
        assert_eq!(list.completed(), 1);
        assert_eq!(list.items[0].text, "done item");
        assert!(list.items[0].checked);
        assert_eq!(list.items[0].index, 0);
        assert_eq!(list.items[1].text, "todo item");
        assert!(!list.items[1].checked);
        assert_eq!(list.items[1].index, 1);
    }

    #[test]
    fn test_first_unchecked() {
        let body = "- [x] one\n- [ ] two\n- [ ] three";
        let list = parse_checklist(body);
        assert_eq!(list.first_unchecked().unwrap().text, "two");
    }

    #[test]
    fn test_uppercase_x_and_star_bullets() {
        let body = "* [X] shouted\n* [ ] quiet";
        let list = parse_checklist(body);
        assert_eq!(list.completed(), 1);
        assert_eq!(list.total(), 2);
    }

    #[test]
    fn test_non_checklist_bullets_ignored() {
        let body = "- plain bullet\n- [nope] not a box\n- [ ] real";
        let list = parse_checklist(body);
        assert_eq!(list.total(), 1);
        assert_eq!(list.items[0].text, "real");
    }

    #[test]
    fn test_indented_items_accepted() {
        let body = "- [ ] top\n  - [x] nested";
        let list = parse_checklist(body);
        assert_eq!(list.total(), 2);
        assert!(list.items[1].checked);
    }

    #[test]
    fn test_empty_body() {
        let list = parse_checklist("");
        assert_eq!(list.total(), 0);
        assert!(list.first_unchecked().is_none());
        assert!(!list.all_done());
    }

    #[test]
    fn test_all_done_requires_items() {
        assert!(parse_checklist("- [x] a\n- [x] b").all_done());
        assert!(!parse_checklist("- [x] a\n- [ ] b").all_done());
        assert!(!parse_checklist("no items here").all_done());
    }
}
