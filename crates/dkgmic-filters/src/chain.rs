//! Editable list of chained filters, backing the item editor.

use crate::node::FilterCommands;

/// One chained filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainEntry {
    /// Sub-filter name.
    pub title: String,
    /// G'MIC command.
    pub command: String,
}

/// Ordered filter list with a current row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterChain {
    entries: Vec<ChainEntry>,
    current: Option<usize>,
}

impl FilterChain {
    /// Creates an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the chain from a command map, replacing the content.
    pub fn from_commands(commands: &FilterCommands) -> Self {
        let mut chain = Self::new();
        chain.set_chained_filters(commands);
        chain
    }

    /// Replaces the content with `commands`.
    pub fn set_chained_filters(&mut self, commands: &FilterCommands) {
        self.entries = commands
            .iter()
            .map(|(title, command)| ChainEntry {
                title: title.to_string(),
                command: command.to_string(),
            })
            .collect();
        self.current = None;
    }

    /// The chain as a command map. Later duplicates of a title replace
    /// earlier ones.
    pub fn chained_filters(&self) -> FilterCommands {
        self.entries
            .iter()
            .map(|e| (e.title.as_str(), e.command.as_str()))
            .collect()
    }

    /// Commands in order.
    pub fn chained_commands(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.command.as_str()).collect()
    }

    /// Entries in order.
    pub fn entries(&self) -> &[ChainEntry] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the chain is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Current row.
    pub fn current(&self) -> Option<usize> {
        self.current
    }

    /// Selects `row`; out-of-range rows clear the selection.
    pub fn set_current(&mut self, row: Option<usize>) {
        self.current = row.filter(|&r| r < self.entries.len());
    }

    /// Command of the current row, empty without one.
    pub fn current_command(&self) -> &str {
        self.current
            .and_then(|r| self.entries.get(r))
            .map_or("", |e| e.command.as_str())
    }

    /// Appends a filter.
    pub fn create_new_filter(&mut self, title: impl Into<String>, command: impl Into<String>) {
        self.entries.push(ChainEntry {
            title: title.into(),
            command: command.into(),
        });
    }

    /// Replaces the current filter. Returns false without a current row.
    pub fn update_current_filter(&mut self, title: impl Into<String>, command: impl Into<String>) -> bool {
        match self.current.and_then(|r| self.entries.get_mut(r)) {
            Some(entry) => {
                entry.title = title.into();
                entry.command = command.into();
                true
            }
            None => false,
        }
    }

    /// Removes the given rows, returning the ones actually removed in
    /// ascending order.
    pub fn remove(&mut self, rows: &[usize]) -> Vec<usize> {
        let mut rows: Vec<usize> = rows.iter().copied().filter(|&r| r < self.entries.len()).collect();
        rows.sort_unstable();
        rows.dedup();

        for &row in rows.iter().rev() {
            self.entries.remove(row);
        }
        self.current = None;
        rows
    }

    /// Removes everything.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.current = None;
    }

    /// Moves the current row up one place. Returns false at the top.
    pub fn move_up(&mut self) -> bool {
        match self.current {
            Some(row) if row > 0 && row < self.entries.len() => {
                self.entries.swap(row - 1, row);
                self.current = Some(row - 1);
                true
            }
            _ => false,
        }
    }

    /// Moves the current row down one place. Returns false at the bottom.
    pub fn move_down(&mut self) -> bool {
        match self.current {
            Some(row) if row + 1 < self.entries.len() => {
                self.entries.swap(row, row + 1);
                self.current = Some(row + 1);
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain() -> FilterChain {
        let mut chain = FilterChain::new();
        chain.create_new_filter("blur", "fx_blur 2");
        chain.create_new_filter("sharpen", "fx_unsharp 1");
        chain.create_new_filter("frame", "fx_frame 4");
        chain
    }

    #[test]
    fn conversions() {
        let chain = chain();
        let commands = chain.chained_filters();
        assert_eq!(commands.chained(), "fx_blur 2 fx_unsharp 1 fx_frame 4");
        assert_eq!(FilterChain::from_commands(&commands).entries(), chain.entries());
        assert_eq!(chain.chained_commands(), ["fx_blur 2", "fx_unsharp 1", "fx_frame 4"]);
    }

    #[test]
    fn moves_follow_current() {
        let mut chain = chain();
        assert!(!chain.move_up());

        chain.set_current(Some(2));
        assert!(chain.move_up());
        assert_eq!(chain.current(), Some(1));
        assert_eq!(chain.current_command(), "fx_frame 4");
        assert_eq!(chain.chained_commands(), ["fx_blur 2", "fx_frame 4", "fx_unsharp 1"]);

        assert!(chain.move_down());
        assert!(!chain.move_down());
        assert_eq!(chain.current(), Some(2));
    }

    #[test]
    fn edit_and_remove() {
        let mut chain = chain();
        assert!(!chain.update_current_filter("x", "y"));

        chain.set_current(Some(0));
        assert!(chain.update_current_filter("soft", "fx_blur 1"));
        assert_eq!(chain.entries()[0].title, "soft");

        assert_eq!(chain.remove(&[2, 0, 0, 7]), [0, 2]);
        assert_eq!(chain.chained_commands(), ["fx_unsharp 1"]);
        assert_eq!(chain.current(), None);

        chain.clear();
        assert!(chain.is_empty());
        chain.set_current(Some(0));
        assert_eq!(chain.current_command(), "");
    }
}
