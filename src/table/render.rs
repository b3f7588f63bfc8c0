use std::fmt::Write;

use super::{DataTable, HeaderCheck, SortDirection, TableRow, PAGE_SIZE_OPTIONS};

const SEPARATOR: &str = " | ";

fn checkbox(check: HeaderCheck) -> &'static str {
    match check {
        HeaderCheck::Unchecked => "[ ]",
        HeaderCheck::Indeterminate => "[-]",
        HeaderCheck::Checked => "[x]",
    }
}

fn pad(text: &str, width: usize) -> String {
    let len = text.chars().count();
    let mut padded = String::from(text);
    padded.extend(std::iter::repeat(' ').take(width.saturating_sub(len)));
    padded
}

fn join_line(cells: &[String], widths: &[usize]) -> String {
    let line: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| pad(cell, *width))
        .collect();
    line.join(SEPARATOR).trim_end().to_string()
}

/// Renders the current page of `table` as plain text.
pub fn render<T: TableRow>(table: &DataTable<T>) -> String {
    let rows = table.page_rows();
    let info = table.page_info();
    let offset = info.page_index * info.page_size;

    let mut header = vec![checkbox(table.page_header_check()).to_string(), "#".to_string()];
    for column in table.columns() {
        let marker = if !column.sortable {
            ""
        } else {
            match table.sort_state().direction_of(column.id) {
                Some(SortDirection::Ascending) => " ^",
                Some(SortDirection::Descending) => " v",
                None => " ~",
            }
        };
        header.push(format!("{}{}", column.header, marker));
    }

    let body: Vec<Vec<String>> = rows
        .iter()
        .enumerate()
        .map(|(position, row)| {
            let check = if table.is_selected(&row.row_id()) {
                HeaderCheck::Checked
            } else {
                HeaderCheck::Unchecked
            };
            let mut cells = vec![checkbox(check).to_string(), (offset + position + 1).to_string()];
            cells.extend(table.columns().iter().map(|column| column.render(*row)));
            cells
        })
        .collect();

    let mut widths: Vec<usize> = header.iter().map(|cell| cell.chars().count()).collect();
    for cells in &body {
        for (width, cell) in widths.iter_mut().zip(cells) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut output = String::new();
    let _ = writeln!(output, "{}", table.title());
    let _ = writeln!(output, "{}", join_line(&header, &widths));
    let rule: Vec<String> = widths.iter().map(|width| "-".repeat(*width)).collect();
    let _ = writeln!(output, "{}", rule.join("-+-"));

    if body.is_empty() {
        let _ = writeln!(output, "No results.");
    } else {
        for cells in &body {
            let _ = writeln!(output, "{}", join_line(cells, &widths));
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(
        output,
        "{} of {} row(s) selected.",
        table.filtered_selected_count(),
        info.filtered_len
    );
    let sizes: Vec<String> = PAGE_SIZE_OPTIONS.iter().map(usize::to_string).collect();
    let _ = writeln!(output, "Rows per page: {}  [{}]", info.page_size, sizes.join(" "));
    let _ = writeln!(
        output,
        "Page {} of {}",
        info.page_index + 1,
        info.page_count.max(1)
    );

    let back = if info.can_previous_page { ["<<", "<"] } else { ["--", "-"] };
    let forward = if info.can_next_page { [">", ">>"] } else { ["-", "--"] };
    let _ = writeln!(output, "{} {} {} {}", back[0], back[1], forward[0], forward[1]);

    output
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::table::{CellValue, Column, PageSize, RowId};

    struct Faq {
        id: String,
        question: String,
        answer: Option<String>,
    }

    impl TableRow for Faq {
        fn row_id(&self) -> RowId {
            self.id.clone()
        }

        fn search_fields(&self) -> Vec<&str> {
            vec![self.question.as_str()]
        }
    }

    fn faqs(count: usize) -> Arc<[Faq]> {
        (0..count)
            .map(|i| Faq {
                id: format!("f{i}"),
                question: format!("Question {i}"),
                answer: if i == 0 { None } else { Some(format!("Answer {i}")) },
            })
            .collect::<Vec<_>>()
            .into()
    }

    fn table(count: usize) -> DataTable<Faq> {
        let columns = vec![
            Column::new("question", "Question", |f: &Faq| CellValue::text(f.question.as_str()))
                .sortable(),
            Column::new("answer", "Answer", |f: &Faq| CellValue::optional_text(f.answer.as_deref())),
        ];
        DataTable::new("FAQs", columns, faqs(count))
    }

    #[test]
    fn empty_table_shows_no_results() {
        let output = render(&table(0));
        assert!(output.contains("No results."));
        assert!(output.contains("0 of 0 row(s) selected."));
        assert!(output.contains("Page 1 of 1"));
        assert!(output.contains("-- - - --"));
    }

    #[test]
    fn header_marks_sortable_columns_and_sort_direction() {
        let mut table = table(3);
        let output = render(&table);
        assert!(output.contains("Question ~"));
        assert!(!output.contains("Answer ~"));

        table.toggle_sort("question");
        table.toggle_sort("question");
        let output = render(&table);
        assert!(output.contains("Question v"));
        let first_row = output.lines().nth(3).unwrap();
        assert!(first_row.contains("Question 2"));
    }

    #[test]
    fn unresolved_cells_render_empty() {
        let output = render(&table(1));
        let row = output.lines().nth(3).unwrap();
        assert!(row.ends_with("| Question 0 |"));
    }

    #[test]
    fn selection_footer_and_indeterminate_header() {
        let mut table = table(12);
        table.set_page_size(PageSize::try_from(5).unwrap());
        table.toggle_row("f1");

        let output = render(&table);
        assert!(output.lines().nth(1).unwrap().starts_with("[-]"));
        assert!(output.contains("1 of 12 row(s) selected."));
        assert!(output.contains("Rows per page: 5  [5 10 20 30 40 50]"));
        assert!(output.contains("Page 1 of 3"));
        assert!(output.contains("-- - > >>"));
    }

    #[test]
    fn row_numbers_continue_across_pages() {
        let mut table = table(12);
        table.set_page_size(PageSize::try_from(5).unwrap());
        table.next_page();

        let output = render(&table);
        let first_row = output.lines().nth(3).unwrap();
        assert!(first_row.starts_with("[ ] | 6 "));
        assert!(output.contains("<< < > >>"));
    }
}
