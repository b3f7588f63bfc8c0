use std::collections::BTreeSet;

use super::RowId;

/// Tri-state of a "select all" checkbox over a set of visible rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderCheck {
    Unchecked,
    Indeterminate,
    Checked,
}

/// Selected row identities. Independent of row position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    selected: BTreeSet<RowId>,
}

impl SelectionState {
    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.contains(id)
    }

    pub fn set_selected(&mut self, id: &str, selected: bool) {
        if selected {
            self.selected.insert(id.to_string());
        } else {
            self.selected.remove(id);
        }
    }

    /// Flips one row and returns its new state.
    pub fn toggle(&mut self, id: &str) -> bool {
        let selected = !self.is_selected(id);
        self.set_selected(id, selected);
        selected
    }

    pub fn set_many<'a>(&mut self, ids: impl IntoIterator<Item = &'a str>, selected: bool) {
        for id in ids {
            self.set_selected(id, selected);
        }
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn header_state<'a>(&self, visible: impl IntoIterator<Item = &'a str>) -> HeaderCheck {
        let mut total = 0usize;
        let mut selected = 0usize;
        for id in visible {
            total += 1;
            if self.is_selected(id) {
                selected += 1;
            }
        }

        if selected == 0 {
            HeaderCheck::Unchecked
        } else if selected == total {
            HeaderCheck::Checked
        } else {
            HeaderCheck::Indeterminate
        }
    }
}
