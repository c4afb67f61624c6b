use unicode_width::UnicodeWidthStr;

/// Every column a card table can carry, in default display order.
pub const ALL_FIELDS: [&str; 8] = [
    "name", "list", "tags", "desc", "due", "activity", "id", "url",
];

// Least important first. Dropping in this fixed order keeps narrowing
// deterministic for a given terminal width.
const DROP_ORDER: [&str; 5] = ["desc", "id", "url", "activity", "list"];

/// A text table of card fields with framed rendering and width fitting.
pub struct CardTable {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl CardTable {
    pub fn new<S: Into<String>>(columns: Vec<S>) -> CardTable {
        CardTable {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn add_row(&mut self, row: Vec<String>) {
        debug_assert_eq!(row.len(), self.columns.len());
        self.rows.push(row);
    }

    /// Stable sort of the rows by one column's cell text. Unknown columns
    /// leave the table untouched.
    pub fn sort_by(&mut self, column: &str) {
        if let Some(i) = self.columns.iter().position(|c| c == column) {
            self.rows.sort_by(|a, b| a[i].cmp(&b[i]));
        }
    }

    fn drop_column(&mut self, column: &str) -> bool {
        match self.columns.iter().position(|c| c == column) {
            Some(i) => {
                self.columns.remove(i);
                for row in &mut self.rows {
                    row.remove(i);
                }
                true
            }
            None => false,
        }
    }

    /// Drop columns, least important first, until the rendered table fits in
    /// `max_width` or no droppable columns remain.
    pub fn fit_width(mut self, max_width: usize) -> CardTable {
        let mut drops = DROP_ORDER.iter();
        while self.first_line_width() >= max_width {
            match drops.next() {
                Some(column) => {
                    self.drop_column(column);
                }
                None => break,
            }
        }
        self
    }

    fn first_line_width(&self) -> usize {
        // The frame line is pure ASCII, so bytes equal display cells.
        self.render().lines().next().map_or(0, str::len)
    }

    fn column_widths(&self) -> Vec<usize> {
        self.columns
            .iter()
            .enumerate()
            .map(|(i, header)| {
                self.rows
                    .iter()
                    .flat_map(|row| row[i].lines())
                    .map(UnicodeWidthStr::width)
                    .chain([header.width()])
                    .max()
                    .unwrap_or(0)
            })
            .collect()
    }

    /// Render with `+---+` frame lines, one frame line between every row.
    /// Multiline cells occupy extra physical lines within their row.
    pub fn render(&self) -> String {
        let widths = self.column_widths();
        let mut out = String::new();
        let frame = frame_line(&widths);
        out.push_str(&frame);
        out.push('\n');
        push_row(&mut out, &self.columns, &widths);
        out.push_str(&frame);
        out.push('\n');
        for row in &self.rows {
            push_row(&mut out, row, &widths);
            out.push_str(&frame);
            out.push('\n');
        }
        out
    }

    /// Tab-separated output for piping into other tools. Cell newlines are
    /// flattened to commas so each card stays on one physical line.
    pub fn render_tsv(&self) -> String {
        let mut out = String::new();
        out.push_str(&self.columns.join("\t"));
        out.push('\n');
        for row in &self.rows {
            let cells: Vec<String> = row.iter().map(|c| c.replace('\n', ",")).collect();
            out.push_str(&cells.join("\t"));
            out.push('\n');
        }
        out
    }
}

fn frame_line(widths: &[usize]) -> String {
    let mut s = String::from("+");
    for w in widths {
        s.push_str(&"-".repeat(w + 2));
        s.push('+');
    }
    s
}

fn push_row(out: &mut String, cells: &[String], widths: &[usize]) {
    let height = cells.iter().map(|c| c.lines().count().max(1)).max().unwrap_or(1);
    for line_no in 0..height {
        out.push('|');
        for (cell, w) in cells.iter().zip(widths) {
            let text = cell.lines().nth(line_no).unwrap_or("");
            let pad = w - text.width();
            out.push(' ');
            out.push_str(text);
            out.push_str(&" ".repeat(pad + 1));
            out.push('|');
        }
        out.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> CardTable {
        let mut t = CardTable::new(vec!["name", "list", "desc", "id", "url"]);
        t.add_row(vec![
            "Fix the roof".into(),
            "Doing".into(),
            "a longer description cell".into(),
            "5e6a1f00aabbccdd".into(),
            "https://example.com/c/abc".into(),
        ]);
        t.add_row(vec![
            "Buy paint".into(),
            "Backlog".into(),
            "".into(),
            "5e6a1f00ddeeff00".into(),
            "https://example.com/c/def".into(),
        ]);
        t
    }

    #[test]
    fn test_render_frames_every_row() {
        let t = sample();
        let text = t.render();
        let frames = text.lines().filter(|l| l.starts_with('+')).count();
        // Top, under header, and one after each of the two rows.
        assert_eq!(frames, 4);
        let first = text.lines().next().unwrap();
        assert!(first.chars().all(|c| c == '+' || c == '-'));
    }

    #[test]
    fn test_render_multiline_cell() {
        let mut t = CardTable::new(vec!["name", "tags"]);
        t.add_row(vec!["card".into(), "urgent\nhome".into()]);
        let text = t.render();
        assert!(text.contains("| urgent |"));
        assert!(text.contains("| home   |"));
    }

    #[test]
    fn test_render_tsv_flattens_newlines() {
        let mut t = CardTable::new(vec!["name", "tags"]);
        t.add_row(vec!["card".into(), "urgent\nhome".into()]);
        assert_eq!(t.render_tsv(), "name\ttags\ncard\turgent,home\n");
    }

    #[test]
    fn test_sort_by_column() {
        let mut t = sample();
        t.sort_by("name");
        assert!(t.render().find("Buy paint").unwrap() < t.render().find("Fix the roof").unwrap());
    }

    #[test]
    fn test_fit_width_drops_in_fixed_order() {
        let t = sample().fit_width(60);
        // desc goes first, then id, until the frame line fits.
        assert!(!t.columns().iter().any(|c| c == "desc"));
        assert!(t.columns().iter().any(|c| c == "name"));
    }

    #[test]
    fn test_fit_width_monotonic_and_bounded() {
        let mut t = sample();
        let full = t.render().lines().next().unwrap().len();
        let mut prev = full;
        // Each narrowing target strictly shrinks the table or leaves only
        // undroppable columns behind.
        for target in [full, full / 2, 20, 5] {
            t = t.fit_width(target);
            let width = t.render().lines().next().unwrap().len();
            assert!(width <= prev);
            prev = width;
        }
        // name is not droppable, so it survives any width.
        assert!(t.columns().iter().any(|c| c == "name"));
    }

    #[test]
    fn test_fit_width_wide_terminal_keeps_everything() {
        let t = sample().fit_width(500);
        assert_eq!(t.columns().len(), 5);
    }
}
