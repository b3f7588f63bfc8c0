use std::cmp::Ordering;

use super::column::{CellValue, Column};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub column_id: String,
    pub direction: SortDirection,
}

/// Ordered sort keys. The toggle keeps a single active column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortState {
    keys: Vec<SortKey>,
}

impl SortState {
    pub fn keys(&self) -> &[SortKey] {
        &self.keys
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn direction_of(&self, column_id: &str) -> Option<SortDirection> {
        self.keys
            .iter()
            .find(|key| key.column_id == column_id)
            .map(|key| key.direction)
    }

    /// Ascending unless the column is already ascending; clears every other key.
    pub fn toggle(&mut self, column_id: &str) {
        let direction = match self.direction_of(column_id) {
            Some(SortDirection::Ascending) => SortDirection::Descending,
            _ => SortDirection::Ascending,
        };
        self.set(column_id, direction);
    }

    pub fn set(&mut self, column_id: &str, direction: SortDirection) {
        self.keys = vec![SortKey {
            column_id: column_id.to_string(),
            direction,
        }];
    }

    /// Appends a secondary key, replacing any existing key for the column.
    pub fn then_by(&mut self, column_id: &str, direction: SortDirection) {
        self.keys.retain(|key| key.column_id != column_id);
        self.keys.push(SortKey {
            column_id: column_id.to_string(),
            direction,
        });
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }
}

/// Stable sort of `indices` (positions into `rows`) by the active keys.
/// Keys naming unknown columns are skipped.
pub fn sort_indices<T>(rows: &[T], indices: &mut Vec<usize>, columns: &[Column<T>], state: &SortState) {
    let active: Vec<(&Column<T>, SortDirection)> = state
        .keys()
        .iter()
        .filter_map(|key| {
            columns
                .iter()
                .find(|column| column.id == key.column_id)
                .map(|column| (column, key.direction))
        })
        .collect();

    if active.is_empty() {
        return;
    }

    let mut keyed: Vec<(usize, Vec<CellValue>)> = indices
        .iter()
        .map(|&index| {
            let values = active
                .iter()
                .map(|(column, _)| column.value(&rows[index]))
                .collect();
            (index, values)
        })
        .collect();

    keyed.sort_by(|(_, left), (_, right)| {
        for (position, (_, direction)) in active.iter().enumerate() {
            let ordering = left[position].compare(&right[position]);
            let ordering = match direction {
                SortDirection::Ascending => ordering,
                SortDirection::Descending => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });

    *indices = keyed.into_iter().map(|(index, _)| index).collect();
}
