//! Generic client-side data table.
//!
//! [`DataTable`] owns the derived state (filters, sort, pagination, selection)
//! over a canonical dataset it never mutates. The owning screen hands it a new
//! `Arc<[T]>` after every fetch; a different allocation counts as a new dataset
//! version and resets the selection.

use std::borrow::Cow;
use std::sync::Arc;

pub mod column;
pub mod export;
pub mod filter;
pub mod paginate;
pub mod render;
pub mod selection;
pub mod sort;

pub use column::{CellValue, Column};
pub use filter::{DateRange, FilterState, VIEW_ALL};
pub use paginate::{PageInfo, PageSize, PaginationState, PAGE_SIZE_OPTIONS};
pub use selection::{HeaderCheck, SelectionState};
pub use sort::{SortDirection, SortKey, SortState};

pub type RowId = String;

/// What the table needs to know about a row beyond its columns.
pub trait TableRow {
    fn row_id(&self) -> RowId;

    /// Fields searched by the free-text filter.
    fn search_fields(&self) -> Vec<&str>;

    fn status(&self) -> Option<Cow<'_, str>> {
        None
    }

    /// Raw timestamp used by the date-range filter.
    fn filter_date(&self) -> Option<&str> {
        None
    }
}

pub struct DataTable<T> {
    title: String,
    columns: Vec<Column<T>>,
    data: Arc<[T]>,
    filter: FilterState,
    sort: SortState,
    pagination: PaginationState,
    selection: SelectionState,
}

impl<T: TableRow> DataTable<T> {
    pub fn new(title: impl Into<String>, columns: Vec<Column<T>>, data: Arc<[T]>) -> Self {
        Self {
            title: title.into(),
            columns,
            data,
            filter: FilterState::default(),
            sort: SortState::default(),
            pagination: PaginationState::default(),
            selection: SelectionState::default(),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn columns(&self) -> &[Column<T>] {
        &self.columns
    }

    pub fn data(&self) -> &Arc<[T]> {
        &self.data
    }

    /// Swaps in a freshly fetched dataset. Returns `false` when `data` is the
    /// dataset already held, in which case nothing changes.
    pub fn set_data(&mut self, data: Arc<[T]>) -> bool {
        if Arc::ptr_eq(&self.data, &data) {
            return false;
        }
        self.data = data;
        self.selection.clear();
        self.clamp_page();
        tracing::debug!(table = %self.title, rows = self.data.len(), "dataset replaced");
        true
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn set_free_text(&mut self, text: impl Into<String>) {
        self.filter.free_text = text.into();
        self.clamp_page();
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.filter.status = status.into();
        self.clamp_page();
    }

    pub fn set_date_range(&mut self, range: DateRange) {
        self.filter.date_range = range;
        self.clamp_page();
    }

    pub fn sort_state(&self) -> &SortState {
        &self.sort
    }

    fn sortable_column(&self, column_id: &str) -> bool {
        self.columns
            .iter()
            .any(|column| column.id == column_id && column.sortable)
    }

    /// Cycles the sort on one column. Unknown or non-sortable columns are ignored.
    pub fn toggle_sort(&mut self, column_id: &str) -> bool {
        if !self.sortable_column(column_id) {
            tracing::debug!(column = column_id, "sort ignored for column");
            return false;
        }
        self.sort.toggle(column_id);
        true
    }

    pub fn set_sort(&mut self, column_id: &str, direction: SortDirection) -> bool {
        if !self.sortable_column(column_id) {
            tracing::debug!(column = column_id, "sort ignored for column");
            return false;
        }
        self.sort.set(column_id, direction);
        true
    }

    /// Adds a tie-breaking key after the current ones.
    pub fn then_sort_by(&mut self, column_id: &str, direction: SortDirection) -> bool {
        if !self.sortable_column(column_id) {
            tracing::debug!(column = column_id, "sort ignored for column");
            return false;
        }
        self.sort.then_by(column_id, direction);
        true
    }

    pub fn clear_sort(&mut self) {
        self.sort.clear();
    }

    pub fn pagination(&self) -> PaginationState {
        self.pagination
    }

    pub fn set_page_size(&mut self, size: PageSize) {
        let len = self.filtered_len();
        self.pagination.set_page_size(size, len);
    }

    pub fn first_page(&mut self) {
        self.pagination.first();
    }

    pub fn previous_page(&mut self) {
        self.pagination.previous();
    }

    pub fn next_page(&mut self) {
        let len = self.filtered_len();
        self.pagination.next(len);
    }

    pub fn last_page(&mut self) {
        let len = self.filtered_len();
        self.pagination.last(len);
    }

    pub fn go_to_page(&mut self, index: usize) {
        let len = self.filtered_len();
        self.pagination.go_to(index, len);
    }

    pub fn page_info(&self) -> PageInfo {
        self.pagination.info(self.filtered_len())
    }

    fn clamp_page(&mut self) {
        let len = self.filtered_len();
        self.pagination.clamp(len);
    }

    fn filtered_indices(&self) -> Vec<usize> {
        let mut indices = filter::apply(&self.data, &self.filter);
        sort::sort_indices(&self.data, &mut indices, &self.columns, &self.sort);
        indices
    }

    pub fn filtered_len(&self) -> usize {
        self.data.iter().filter(|row| self.filter.matches(*row)).count()
    }

    /// Every row passing the filters, in sorted order.
    pub fn filtered_rows(&self) -> Vec<&T> {
        self.filtered_indices()
            .into_iter()
            .map(|index| &self.data[index])
            .collect()
    }

    /// Rows on the current page.
    pub fn page_rows(&self) -> Vec<&T> {
        let indices = self.filtered_indices();
        let range = self.pagination.page_range(indices.len());
        indices[range]
            .iter()
            .map(|&index| &self.data[index])
            .collect()
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selection.is_selected(id)
    }

    pub fn toggle_row(&mut self, id: &str) -> bool {
        self.selection.toggle(id)
    }

    pub fn toggle_all_page_rows(&mut self, selected: bool) {
        let ids: Vec<RowId> = self.page_rows().iter().map(|row| row.row_id()).collect();
        self.selection
            .set_many(ids.iter().map(String::as_str), selected);
    }

    pub fn toggle_all_filtered_rows(&mut self, selected: bool) {
        let ids: Vec<RowId> = self
            .filtered_rows()
            .iter()
            .map(|row| row.row_id())
            .collect();
        self.selection
            .set_many(ids.iter().map(String::as_str), selected);
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn page_header_check(&self) -> HeaderCheck {
        let ids: Vec<RowId> = self.page_rows().iter().map(|row| row.row_id()).collect();
        self.selection.header_state(ids.iter().map(String::as_str))
    }

    /// Selected rows that survive the current filters, in view order.
    pub fn selected_rows(&self) -> Vec<&T> {
        self.filtered_rows()
            .into_iter()
            .filter(|row| self.selection.is_selected(&row.row_id()))
            .collect()
    }

    pub fn filtered_selected_count(&self) -> usize {
        self.selected_rows().len()
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    #[derive(Debug, Clone)]
    struct Cohort {
        id: String,
        name: String,
        status: String,
        created_at: String,
    }

    impl TableRow for Cohort {
        fn row_id(&self) -> RowId {
            self.id.clone()
        }

        fn search_fields(&self) -> Vec<&str> {
            vec![self.name.as_str()]
        }

        fn status(&self) -> Option<Cow<'_, str>> {
            Some(Cow::Borrowed(self.status.as_str()))
        }

        fn filter_date(&self) -> Option<&str> {
            Some(self.created_at.as_str())
        }
    }

    fn cohort(id: usize, status: &str) -> Cohort {
        Cohort {
            id: format!("c-{id:02}"),
            name: format!("Cohort {id:02}"),
            status: status.to_string(),
            created_at: format!("2024-01-{:02}T09:00:00.000000Z", id % 28 + 1),
        }
    }

    fn dataset(count: usize) -> Arc<[Cohort]> {
        (0..count)
            .map(|id| cohort(id, if id % 2 == 0 { "open" } else { "closed" }))
            .collect::<Vec<_>>()
            .into()
    }

    fn columns() -> Vec<Column<Cohort>> {
        vec![
            Column::new("name", "Name", |c: &Cohort| CellValue::text(c.name.as_str())).sortable(),
            Column::new("status", "Status", |c: &Cohort| CellValue::text(c.status.as_str())),
        ]
    }

    fn table(count: usize) -> DataTable<Cohort> {
        DataTable::new("Cohorts", columns(), dataset(count))
    }

    fn page_ids(table: &DataTable<Cohort>) -> Vec<String> {
        table.page_rows().iter().map(|row| row.id.clone()).collect()
    }

    #[test]
    fn pages_slice_the_filtered_rows() {
        let mut table = table(23);
        assert_eq!(table.page_info().page_count, 3);
        assert_eq!(table.page_rows().len(), 10);

        table.last_page();
        assert_eq!(table.page_rows().len(), 3);
        assert_eq!(page_ids(&table)[0], "c-20");
    }

    #[test]
    fn filtering_clamps_page_index() {
        let mut table = table(23);
        table.last_page();
        assert_eq!(table.pagination().page_index, 2);

        table.set_status("open");
        assert_eq!(table.filtered_len(), 12);
        assert_eq!(table.pagination().page_index, 1);

        table.set_free_text("no such cohort");
        assert_eq!(table.pagination().page_index, 0);
        assert_eq!(table.page_info().page_count, 0);
        assert!(table.page_rows().is_empty());
    }

    #[test]
    fn page_size_change_rederives_page_count() {
        let mut table = table(23);
        table.last_page();
        table.set_page_size(PageSize::try_from(50).unwrap());
        let info = table.page_info();
        assert_eq!(info.page_count, 1);
        assert_eq!(info.page_index, 0);
        assert_eq!(table.page_rows().len(), 23);
    }

    #[test]
    fn navigation_at_boundaries_is_idempotent() {
        let mut table = table(23);
        table.previous_page();
        assert_eq!(table.pagination().page_index, 0);

        table.last_page();
        table.next_page();
        table.next_page();
        assert_eq!(table.pagination().page_index, 2);
        assert!(!table.page_info().can_next_page);
    }

    #[test]
    fn sort_toggle_only_applies_to_sortable_columns() {
        let mut table = table(5);
        assert!(!table.toggle_sort("status"));
        assert!(!table.toggle_sort("missing"));
        assert!(table.sort_state().is_empty());

        assert!(table.toggle_sort("name"));
        assert!(table.toggle_sort("name"));
        assert_eq!(page_ids(&table)[0], "c-04");
    }

    #[test]
    fn secondary_sort_keys_and_clearing() {
        let rows: Arc<[Cohort]> = vec![cohort(1, "open"), cohort(2, "closed"), cohort(3, "open")].into();
        let mut columns = columns();
        columns.push(
            Column::new("state", "State", |c: &Cohort| CellValue::text(c.status.as_str())).sortable(),
        );
        let mut table = DataTable::new("Cohorts", columns, rows);
        let ids = |table: &DataTable<Cohort>| -> Vec<String> {
            table.filtered_rows().iter().map(|c| c.id.clone()).collect()
        };

        assert!(table.set_sort("state", SortDirection::Descending));
        assert!(table.then_sort_by("name", SortDirection::Descending));
        assert!(!table.then_sort_by("status", SortDirection::Ascending));
        assert_eq!(table.sort_state().keys().len(), 2);
        assert_eq!(ids(&table), vec!["c-03", "c-01", "c-02"]);

        table.clear_sort();
        assert!(table.sort_state().is_empty());
        assert_eq!(ids(&table), vec!["c-01", "c-02", "c-03"]);
    }

    #[test]
    fn selection_survives_sort_filter_and_paging() {
        let mut table = table(23);
        table.toggle_row("c-03");

        table.toggle_sort("name");
        table.toggle_sort("name");
        assert!(table.is_selected("c-03"));

        table.last_page();
        table.first_page();
        assert!(table.is_selected("c-03"));

        table.set_status("open");
        assert!(table.is_selected("c-03"));
        assert_eq!(table.filtered_selected_count(), 0);

        table.set_status(VIEW_ALL);
        assert_eq!(table.filtered_selected_count(), 1);
    }

    #[test]
    fn replacing_the_dataset_resets_selection() {
        let mut table = table(10);
        table.toggle_all_filtered_rows(true);
        assert_eq!(table.selection().len(), 10);

        let same = Arc::clone(table.data());
        assert!(!table.set_data(same));
        assert_eq!(table.selection().len(), 10);

        assert!(table.set_data(dataset(10)));
        assert!(table.selection().is_empty());
    }

    #[test]
    fn replacing_the_dataset_keeps_filters_and_clamps() {
        let mut table = table(30);
        table.set_status("closed");
        table.last_page();
        assert_eq!(table.pagination().page_index, 1);

        table.set_data(dataset(6));
        assert_eq!(table.filter().status, "closed");
        assert_eq!(table.filtered_len(), 3);
        assert_eq!(table.pagination().page_index, 0);
    }

    #[test]
    fn page_and_filtered_select_all_differ() {
        let mut table = table(23);
        table.toggle_all_page_rows(true);
        assert_eq!(table.selection().len(), 10);
        assert_eq!(table.page_header_check(), HeaderCheck::Checked);

        table.next_page();
        assert_eq!(table.page_header_check(), HeaderCheck::Unchecked);
        table.toggle_row("c-12");
        assert_eq!(table.page_header_check(), HeaderCheck::Indeterminate);

        table.toggle_all_filtered_rows(true);
        assert_eq!(table.selection().len(), 23);
        table.toggle_all_page_rows(false);
        assert_eq!(table.selection().len(), 13);
    }

    #[test]
    fn date_range_narrows_view() {
        let mut table = table(10);
        table.set_date_range(DateRange::new(
            NaiveDate::from_ymd_opt(2024, 1, 2),
            NaiveDate::from_ymd_opt(2024, 1, 5),
        ));
        let ids: Vec<String> = table.filtered_rows().iter().map(|c| c.id.clone()).collect();
        assert_eq!(ids, vec!["c-01", "c-02", "c-03"]);
    }

    #[test]
    fn status_sentinel_returns_all_statuses() {
        let mut table = table(2);
        table.set_status("open");
        assert_eq!(table.filtered_len(), 1);
        table.set_status(VIEW_ALL);
        let statuses: Vec<&str> = table
            .filtered_rows()
            .iter()
            .map(|c| c.status.as_str())
            .collect();
        assert_eq!(statuses, vec!["open", "closed"]);
    }
}
