use std::collections::HashSet;

use callscope_logs::{LogStore, ViewFilter};
use callscope_types::{LevelFilter, LogLevel, SortOrder};

/// Cache of visible record positions to avoid re-filtering on every render
#[derive(Default)]
pub struct ViewCache {
    /// Cached search pattern
    cached_pattern: String,
    /// Cached case sensitivity setting
    cached_case_insensitive: bool,
    /// Cached level visibility
    cached_levels: LevelFilter,
    /// Cached display order
    cached_order: SortOrder,
    /// Store generation when cache was built
    cached_generation: u64,
    /// Store record count when cache was built
    cached_record_count: usize,
    /// Positions into the store's records, in display order
    pub indices: Vec<usize>,
    /// Whether cache is valid
    pub is_valid: bool,
}

impl ViewCache {
    /// Check if cache needs to be rebuilt for the given view and store state
    pub fn needs_refresh(&self, view: &ViewFilter, generation: u64, record_count: usize) -> bool {
        !self.is_valid
            || self.cached_generation != generation
            || self.cached_record_count != record_count
            || self.cached_pattern != view.pattern()
            || self.cached_case_insensitive != view.is_case_insensitive()
            || self.cached_levels != view.levels()
            || self.cached_order != view.order()
    }

    /// Update the cache with new visible positions
    pub fn update(
        &mut self,
        view: &ViewFilter,
        generation: u64,
        record_count: usize,
        indices: Vec<usize>,
    ) {
        self.cached_pattern = view.pattern().to_string();
        self.cached_case_insensitive = view.is_case_insensitive();
        self.cached_levels = view.levels();
        self.cached_order = view.order();
        self.cached_generation = generation;
        self.cached_record_count = record_count;
        self.indices = indices;
        self.is_valid = true;
    }

    pub fn invalidate(&mut self) {
        self.is_valid = false;
    }
}

/// UI-specific transient state
pub struct UiState {
    /// Is search/filter bar active?
    pub search_active: bool,

    /// Current search input text
    pub search_input: String,

    /// Is help overlay visible?
    pub help_visible: bool,

    /// Error message to display (if any)
    pub error_message: Option<String>,

    /// Selected row (position in the visible list)
    pub selected: usize,

    /// First row drawn in the log list
    pub scroll: usize,

    /// Rows that fit in the log list at the last render
    pub page_height: usize,

    /// Show timestamps in log viewer?
    pub show_timestamps: bool,

    /// Show statistics panel?
    pub stats_visible: bool,

    /// Keys of records shown pretty-printed
    pub expanded: HashSet<String>,

    /// Level visibility, search pattern and order
    pub view: ViewFilter,

    /// Filter input error message (e.g., invalid regex)
    pub filter_error: Option<String>,

    /// Case insensitive search?
    pub filter_case_insensitive: bool,

    /// Cache for visible record positions
    pub view_cache: ViewCache,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            search_active: false,
            search_input: String::new(),
            help_visible: false,
            error_message: None,
            selected: 0,
            scroll: 0,
            page_height: 0,
            show_timestamps: true,
            stats_visible: false,
            expanded: HashSet::new(),
            view: ViewFilter::default(),
            filter_error: None,
            filter_case_insensitive: true,
            view_cache: ViewCache::default(),
        }
    }
}

/// Global application state
pub struct AppState {
    /// UI state
    pub ui_state: UiState,

    /// Whether app should quit
    pub should_quit: bool,

    /// Dirty flag for rendering - only render when true
    pub render_dirty: bool,
}

impl AppState {
    /// Create state starting from the given view settings
    pub fn new(view: ViewFilter, show_timestamps: bool) -> Self {
        let ui_state = UiState {
            filter_case_insensitive: view.is_case_insensitive(),
            show_timestamps,
            view,
            ..UiState::default()
        };

        Self {
            ui_state,
            should_quit: false,
            render_dirty: true, // Start dirty to ensure initial render
        }
    }

    /// Rebuild the visible list if the view or the store changed
    pub fn refresh_view(&mut self, store: &LogStore) {
        let generation = store.loaded_generation();
        let count = store.len();
        let ui = &mut self.ui_state;

        if ui.view_cache.needs_refresh(&ui.view, generation, count) {
            let indices = store.with_records(|records| ui.view.visible_indices(records));
            ui.view_cache.update(&ui.view, generation, count, indices);
        }

        let len = ui.view_cache.indices.len();
        if ui.selected >= len {
            ui.selected = len.saturating_sub(1);
        }
    }

    /// Number of rows in the visible list
    pub fn visible_len(&self) -> usize {
        self.ui_state.view_cache.indices.len()
    }

    /// Forget per-file state after a new set of records arrives
    pub fn reset_for_new_file(&mut self) {
        self.ui_state.expanded.clear();
        self.ui_state.selected = 0;
        self.ui_state.scroll = 0;
        self.ui_state.view_cache.invalidate();
    }

    /// Move selection up
    pub fn select_up(&mut self, n: usize) {
        self.ui_state.selected = self.ui_state.selected.saturating_sub(n);
    }

    /// Move selection down
    pub fn select_down(&mut self, n: usize) {
        let last = self.visible_len().saturating_sub(1);
        self.ui_state.selected = (self.ui_state.selected + n).min(last);
    }

    pub fn select_top(&mut self) {
        self.ui_state.selected = 0;
    }

    pub fn select_bottom(&mut self) {
        self.ui_state.selected = self.visible_len().saturating_sub(1);
    }

    pub fn page_up(&mut self) {
        self.select_up(self.ui_state.page_height.max(1));
    }

    pub fn page_down(&mut self) {
        self.select_down(self.ui_state.page_height.max(1));
    }

    /// Key of the selected record
    pub fn selected_key(&self, store: &LogStore) -> Option<String> {
        let index = *self.ui_state.view_cache.indices.get(self.ui_state.selected)?;
        store.with_records(|records| records.get(index).map(|r| r.key.clone()))
    }

    /// Switch the selected record between compact and pretty data
    pub fn toggle_expand(&mut self, store: &LogStore) {
        if let Some(key) = self.selected_key(store)
            && !self.ui_state.expanded.remove(&key)
        {
            self.ui_state.expanded.insert(key);
        }
    }

    pub fn is_expanded(&self, key: &str) -> bool {
        self.ui_state.expanded.contains(key)
    }

    /// Show or hide one level
    pub fn toggle_level(&mut self, level: &LogLevel) {
        let mut levels = self.ui_state.view.levels();
        levels.toggle(level);
        self.ui_state.view = self.ui_state.view.clone().with_levels(levels);
    }

    /// Flip between file order and reverse file order
    pub fn toggle_sort_order(&mut self) {
        let order = self.ui_state.view.order().toggle();
        self.ui_state.view = self.ui_state.view.clone().with_order(order);
        self.ui_state.selected = 0;
    }

    pub fn toggle_timestamps(&mut self) {
        self.ui_state.show_timestamps = !self.ui_state.show_timestamps;
    }

    pub fn toggle_stats(&mut self) {
        self.ui_state.stats_visible = !self.ui_state.stats_visible;
    }

    pub fn toggle_help(&mut self) {
        self.ui_state.help_visible = !self.ui_state.help_visible;
    }

    /// Show an error message
    pub fn show_error(&mut self, msg: String) {
        self.ui_state.error_message = Some(msg);
    }

    /// Dismiss the error message
    pub fn dismiss_error(&mut self) {
        self.ui_state.error_message = None;
    }

    /// Start search/filter input mode
    pub fn start_search(&mut self) {
        self.ui_state.search_active = true;
        self.ui_state.search_input.clear();
        self.ui_state.filter_error = None;
    }

    /// Cancel search/filter input and clear filter
    pub fn cancel_search(&mut self) {
        self.ui_state.search_active = false;
        self.ui_state.search_input.clear();
        self.ui_state.filter_error = None;
        self.reset_pattern();
    }

    /// Apply the current search input as a filter
    pub fn apply_filter(&mut self) {
        self.ui_state.search_active = false;
        self.ui_state.filter_error = None;

        let input = self.ui_state.search_input.clone();
        if let Err(e) = self.set_pattern(&input) {
            self.ui_state.filter_error = Some(e);
            self.ui_state.search_active = true; // Keep input open to fix
        }
    }

    /// Clear the active search pattern
    pub fn clear_filter(&mut self) {
        self.ui_state.search_input.clear();
        self.ui_state.filter_error = None;
        self.reset_pattern();
    }

    /// Toggle case sensitivity, recompiling the active pattern
    pub fn toggle_case_sensitive(&mut self) {
        self.ui_state.filter_case_insensitive = !self.ui_state.filter_case_insensitive;
        let pattern = self.ui_state.view.pattern().to_string();
        if let Err(e) = self.set_pattern(&pattern) {
            self.ui_state.filter_error = Some(e);
        }
    }

    /// Add a character to search input
    pub fn search_input_char(&mut self, c: char) {
        self.ui_state.search_input.push(c);
    }

    /// Remove last character from search input
    pub fn search_input_backspace(&mut self) {
        self.ui_state.search_input.pop();
    }

    pub fn search_input_clear(&mut self) {
        self.ui_state.search_input.clear();
    }

    /// Drop the search pattern, keeping levels, order and case setting
    fn reset_pattern(&mut self) {
        let levels = self.ui_state.view.levels();
        let order = self.ui_state.view.order();
        self.ui_state.view = ViewFilter::without_pattern(self.ui_state.filter_case_insensitive)
            .with_levels(levels)
            .with_order(order);
        self.ui_state.selected = 0;
    }

    /// Recompile the view with a new pattern, keeping levels and order
    fn set_pattern(&mut self, pattern: &str) -> Result<(), String> {
        let result = if self.ui_state.filter_case_insensitive {
            ViewFilter::new_case_insensitive(pattern)
        } else {
            ViewFilter::new(pattern)
        };

        let view = result.map_err(|e| format!("Invalid regex: {}", e))?;
        self.ui_state.view = view
            .with_levels(self.ui_state.view.levels())
            .with_order(self.ui_state.view.order());
        self.ui_state.selected = 0;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use callscope_types::{InternalLogEntry, LogEntry};

    fn store_with(levels: &[LogLevel]) -> LogStore {
        let store = LogStore::new();
        let generation = store.begin_load();
        let records = levels
            .iter()
            .enumerate()
            .map(|(i, level)| {
                InternalLogEntry::new(
                    format!("key-{i}"),
                    LogEntry::new(level.clone(), i.to_string(), vec![format!("msg {i}").into()]),
                )
            })
            .collect();
        store.finish_load(generation, "calls.json", records);
        store
    }

    fn state() -> AppState {
        AppState::new(ViewFilter::default(), true)
    }

    #[test]
    fn test_refresh_view_tracks_levels() {
        let store = store_with(&[LogLevel::Debug, LogLevel::Log, LogLevel::Error]);
        let mut state = state();

        state.refresh_view(&store);
        assert_eq!(state.visible_len(), 3);

        state.toggle_level(&LogLevel::Debug);
        state.refresh_view(&store);
        assert_eq!(state.ui_state.view_cache.indices, vec![1, 2]);
    }

    #[test]
    fn test_sort_order_reverses_indices() {
        let store = store_with(&[LogLevel::Log, LogLevel::Log, LogLevel::Log]);
        let mut state = state();
        state.toggle_sort_order();
        state.refresh_view(&store);
        assert_eq!(state.ui_state.view_cache.indices, vec![2, 1, 0]);
    }

    #[test]
    fn test_selection_is_clamped() {
        let store = store_with(&[LogLevel::Log, LogLevel::Log]);
        let mut state = state();
        state.refresh_view(&store);

        state.select_down(10);
        assert_eq!(state.ui_state.selected, 1);
        state.select_up(10);
        assert_eq!(state.ui_state.selected, 0);

        state.select_bottom();
        state.toggle_level(&LogLevel::Log);
        state.refresh_view(&store);
        assert_eq!(state.ui_state.selected, 0);
    }

    #[test]
    fn test_toggle_expand_uses_record_key() {
        let store = store_with(&[LogLevel::Log, LogLevel::Warn]);
        let mut state = state();
        state.refresh_view(&store);
        state.select_down(1);

        state.toggle_expand(&store);
        assert!(state.is_expanded("key-1"));
        state.toggle_expand(&store);
        assert!(!state.is_expanded("key-1"));
    }

    #[test]
    fn test_apply_filter_and_invalid_regex() {
        let store = store_with(&[LogLevel::Log, LogLevel::Log, LogLevel::Log]);
        let mut state = state();

        state.start_search();
        "MSG 2".chars().for_each(|c| state.search_input_char(c));
        state.apply_filter();
        state.refresh_view(&store);
        assert_eq!(state.ui_state.view_cache.indices, vec![2]);

        state.toggle_case_sensitive();
        state.refresh_view(&store);
        assert_eq!(state.visible_len(), 0);

        state.start_search();
        state.search_input_char('(');
        state.apply_filter();
        assert!(state.ui_state.search_active);
        assert!(state.ui_state.filter_error.is_some());
    }

    #[test]
    fn test_filter_keeps_levels_and_order() {
        let store = store_with(&[LogLevel::Debug, LogLevel::Log, LogLevel::Log]);
        let mut state = state();
        state.toggle_level(&LogLevel::Debug);
        state.toggle_sort_order();

        state.start_search();
        state.search_input_char('m');
        state.apply_filter();
        state.refresh_view(&store);
        assert_eq!(state.ui_state.view_cache.indices, vec![2, 1]);

        state.clear_filter();
        state.refresh_view(&store);
        assert_eq!(state.ui_state.view_cache.indices, vec![2, 1]);
    }

    #[test]
    fn test_cancel_search_clears_pattern() {
        let store = store_with(&[LogLevel::Log, LogLevel::Log]);
        let mut state = state();
        state.toggle_case_sensitive();

        state.start_search();
        state.search_input_char('1');
        state.apply_filter();
        state.refresh_view(&store);
        assert_eq!(state.visible_len(), 1);

        state.start_search();
        state.cancel_search();
        state.refresh_view(&store);
        assert_eq!(state.visible_len(), 2);
        assert!(!state.ui_state.view.has_pattern());
        assert!(!state.ui_state.view.is_case_insensitive());
    }

    #[test]
    fn test_new_file_resets_expansion() {
        let store = store_with(&[LogLevel::Log]);
        let mut state = state();
        state.refresh_view(&store);
        state.toggle_expand(&store);
        assert!(!state.ui_state.expanded.is_empty());

        state.reset_for_new_file();
        assert!(state.ui_state.expanded.is_empty());
        assert!(!state.ui_state.view_cache.is_valid);
    }
}
