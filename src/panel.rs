use std::time::{Duration, Instant};

use crate::transfer::{ApiError, DirEntry, Endpoint};

/// Idle window after the last search keystroke before the search fires
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

/// Informational row shown for a zero-match search (not an error)
pub const NO_ENDPOINTS_FOUND: &str = "No endpoints found";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelRole {
    Source,
    Destination,
}

impl PanelRole {
    pub fn title(&self) -> &'static str {
        match self {
            PanelRole::Source => "Source",
            PanelRole::Destination => "Destination",
        }
    }
}

/// Which control inside the panel receives key input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelFocus {
    Search,
    Results,
    Path,
    Listing,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResultsState {
    Hidden,
    Loading,
    Loaded(Vec<Endpoint>),
    Empty,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ListingState {
    Hidden,
    Loading,
    Loaded(Vec<EntryRow>),
    Failed(String),
}

/// A rendered listing row. Selection lives on the row itself, so it dies
/// with the rows whenever the listing is rebuilt.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryRow {
    pub entry: DirEntry,
    pub selected: bool,
}

/// What activating a listing row asks the app to do next.
#[derive(Debug, Clone, PartialEq)]
pub enum RowAction {
    /// Directory row: re-list at the new path
    Descend(String),
    /// File row: selection toggled in place
    Toggled,
}

/// All state owned by one browse panel. The source and destination panels
/// are two independent instances; nothing is shared between them.
pub struct Panel {
    pub role: PanelRole,
    pub focus: PanelFocus,

    pub search_input: String,
    pub results: ResultsState,
    pub results_cursor: usize,

    pub endpoint: Option<Endpoint>,
    pub path_input: String,
    pub listing: ListingState,
    pub cursor: usize,

    default_path: String,
    search_deadline: Option<Instant>,
}

impl Panel {
    pub fn new(role: PanelRole, default_path: String) -> Self {
        Self {
            role,
            focus: PanelFocus::Search,
            search_input: String::new(),
            results: ResultsState::Hidden,
            results_cursor: 0,
            endpoint: None,
            path_input: default_path.clone(),
            listing: ListingState::Hidden,
            cursor: 0,
            default_path,
            search_deadline: None,
        }
    }

    /// Record an edit of the search input. Editing discards the chosen
    /// endpoint, hides the listing and resets the path; an emptied input
    /// hides the results immediately without scheduling a search.
    pub fn note_search_edited(&mut self) {
        self.endpoint = None;
        self.listing = ListingState::Hidden;
        self.path_input = self.default_path.clone();

        if self.search_input.is_empty() {
            self.results = ResultsState::Hidden;
            self.search_deadline = None;
        } else {
            self.search_deadline = Some(Instant::now() + SEARCH_DEBOUNCE);
        }
    }

    /// Make a pending-or-not search fire on the next tick, skipping the
    /// remainder of the idle window. No-op on an empty input.
    pub fn force_search(&mut self) {
        if !self.search_input.is_empty() {
            self.search_deadline = Some(Instant::now());
        }
    }

    /// Take the query of a search whose idle window has elapsed. Clears the
    /// deadline, so each restart chain fires at most once.
    pub fn take_due_search(&mut self, now: Instant) -> Option<String> {
        match self.search_deadline {
            Some(deadline) if now >= deadline => {
                self.search_deadline = None;
                Some(self.search_input.clone())
            }
            _ => None,
        }
    }

    pub fn begin_search(&mut self) {
        self.results = ResultsState::Loading;
        self.results_cursor = 0;
    }

    pub fn apply_search(&mut self, outcome: Result<Vec<Endpoint>, ApiError>) {
        self.results = match outcome {
            Ok(endpoints) if endpoints.is_empty() => ResultsState::Empty,
            Ok(endpoints) => ResultsState::Loaded(endpoints),
            Err(e) => ResultsState::Failed(e.to_string()),
        };
        self.results_cursor = 0;
    }

    /// Choose a search result. Returns the endpoint the app should
    /// activate and list.
    pub fn choose_result(&mut self, idx: usize) -> Option<Endpoint> {
        let ResultsState::Loaded(list) = &self.results else {
            return None;
        };
        let endpoint = list.get(idx)?.clone();

        self.search_input = endpoint.display_name.clone();
        self.results = ResultsState::Hidden;
        self.endpoint = Some(endpoint.clone());
        self.search_deadline = None;
        if self.path_input.is_empty() {
            self.path_input = self.default_path.clone();
        }
        Some(endpoint)
    }

    /// Show this panel's loading indicator for a directory retrieval.
    pub fn begin_listing(&mut self) {
        if self.path_input.is_empty() {
            self.path_input = self.default_path.clone();
        }
        self.listing = ListingState::Loading;
        self.cursor = 0;
    }

    pub fn apply_listing(&mut self, outcome: Result<Vec<DirEntry>, ApiError>) {
        self.listing = match outcome {
            Ok(entries) => ListingState::Loaded(
                entries
                    .into_iter()
                    .map(|entry| EntryRow {
                        entry,
                        selected: false,
                    })
                    .collect(),
            ),
            Err(e) => ListingState::Failed(e.to_string()),
        };
        self.cursor = 0;
    }

    pub fn rows(&self) -> &[EntryRow] {
        match &self.listing {
            ListingState::Loaded(rows) => rows,
            _ => &[],
        }
    }

    fn rows_mut(&mut self) -> Option<&mut Vec<EntryRow>> {
        match &mut self.listing {
            ListingState::Loaded(rows) => Some(rows),
            _ => None,
        }
    }

    pub fn move_cursor_down(&mut self) {
        let len = self.rows().len();
        if len > 0 {
            self.cursor = (self.cursor + 1) % len;
        }
    }

    pub fn move_cursor_up(&mut self) {
        let len = self.rows().len();
        if len > 0 {
            self.cursor = self.cursor.checked_sub(1).unwrap_or(len - 1);
        }
    }

    pub fn move_results_cursor_down(&mut self) {
        if let ResultsState::Loaded(list) = &self.results {
            if !list.is_empty() {
                self.results_cursor = (self.results_cursor + 1) % list.len();
            }
        }
    }

    pub fn move_results_cursor_up(&mut self) {
        if let ResultsState::Loaded(list) = &self.results {
            if !list.is_empty() {
                self.results_cursor = self.results_cursor.checked_sub(1).unwrap_or(list.len() - 1);
            }
        }
    }

    /// Toggle selection of row `idx`. Without the additive modifier every
    /// selection in this listing is cleared first, so the clicked row ends
    /// up the only one selected.
    pub fn toggle_selection(&mut self, idx: usize, additive: bool) {
        let Some(rows) = self.rows_mut() else { return };
        if idx >= rows.len() {
            return;
        }
        if additive {
            rows[idx].selected = !rows[idx].selected;
        } else {
            for row in rows.iter_mut() {
                row.selected = false;
            }
            rows[idx].selected = true;
        }
    }

    /// Open a row: directories descend, files toggle their selection.
    pub fn activate_row(&mut self, idx: usize) -> Option<RowAction> {
        let is_dir = {
            let row = self.rows().get(idx)?;
            row.entry.is_dir()
        };
        if is_dir {
            let name = self.rows()[idx].entry.name.clone();
            let path = format!("{}{}/", self.path_input, name);
            self.path_input = path.clone();
            Some(RowAction::Descend(path))
        } else {
            let rows = self.rows_mut()?;
            rows[idx].selected = !rows[idx].selected;
            Some(RowAction::Toggled)
        }
    }

    /// Path one level up from the current path input, clamped at the root.
    pub fn parent_path(&self) -> String {
        parent_of(&self.path_input)
    }

    pub fn any_selected(&self) -> bool {
        self.rows().iter().any(|r| r.selected)
    }

    pub fn selected_count(&self) -> usize {
        self.rows().iter().filter(|r| r.selected).count()
    }

    pub fn selected_entries(&self) -> Vec<&DirEntry> {
        self.rows()
            .iter()
            .filter(|r| r.selected)
            .map(|r| &r.entry)
            .collect()
    }

    /// Label of the aggregate selection control: the opposite of the
    /// current aggregate state.
    pub fn select_all_label(&self) -> &'static str {
        if self.any_selected() {
            "select none"
        } else {
            "select all"
        }
    }

    /// Apply whatever the label currently offers.
    pub fn toggle_select_all(&mut self) {
        let select = !self.any_selected();
        if let Some(rows) = self.rows_mut() {
            for row in rows.iter_mut() {
                row.selected = select;
            }
        }
    }

    /// One-line summary once an endpoint is chosen, for the panel header.
    pub fn summary(&self) -> Option<String> {
        let endpoint = self.endpoint.as_ref()?;
        let mut summary = format!("{}: {}", endpoint.display_name, self.path_input);
        if self.role == PanelRole::Source {
            summary.push_str(&format!(" ({} selected)", self.selected_count()));
        }
        Some(summary)
    }
}

/// Truncate the last component of a slash-separated path, clamping at `/`.
fn parent_of(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return "/".to_string();
    }
    match trimmed.rfind('/') {
        Some(i) => trimmed[..=i].to_string(),
        None => "/".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transfer::EntryKind;

    fn panel() -> Panel {
        Panel::new(PanelRole::Source, "/~/".to_string())
    }

    fn entry(name: &str, kind: EntryKind) -> DirEntry {
        DirEntry {
            name: name.to_string(),
            size: 100,
            kind,
        }
    }

    fn loaded_panel(names: &[(&str, EntryKind)]) -> Panel {
        let mut p = panel();
        p.apply_listing(Ok(names.iter().map(|(n, k)| entry(n, *k)).collect()));
        p
    }

    #[test]
    fn test_empty_query_hides_results_without_search() {
        let mut p = panel();
        p.search_input = "clu".to_string();
        p.note_search_edited();
        assert!(p.take_due_search(Instant::now() + Duration::from_secs(1)).is_some());

        p.search_input.clear();
        p.note_search_edited();
        assert_eq!(p.results, ResultsState::Hidden);
        // No search is ever due for a zero-length input
        assert!(p.take_due_search(Instant::now() + Duration::from_secs(1)).is_none());
    }

    #[test]
    fn test_search_waits_out_the_idle_window() {
        let mut p = panel();
        p.search_input = "cluster".to_string();
        p.note_search_edited();

        // Still inside the idle window: nothing fires
        assert!(p.take_due_search(Instant::now()).is_none());
        // Past the window: fires exactly once
        let later = Instant::now() + SEARCH_DEBOUNCE + Duration::from_millis(100);
        assert_eq!(p.take_due_search(later), Some("cluster".to_string()));
        assert!(p.take_due_search(later).is_none());
    }

    #[test]
    fn test_editing_search_discards_endpoint_and_listing() {
        let mut p = loaded_panel(&[("a.txt", EntryKind::File)]);
        p.endpoint = Some(Endpoint {
            id: "A".to_string(),
            display_name: "Cluster".to_string(),
            owner_string: String::new(),
        });
        p.path_input = "/~/deep/".to_string();

        p.search_input = "new query".to_string();
        p.note_search_edited();

        assert!(p.endpoint.is_none());
        assert_eq!(p.listing, ListingState::Hidden);
        assert_eq!(p.path_input, "/~/");
    }

    #[test]
    fn test_zero_match_search_shows_empty_indicator() {
        let mut p = panel();
        p.apply_search(Ok(Vec::new()));
        assert_eq!(p.results, ResultsState::Empty);
    }

    #[test]
    fn test_failed_search_shows_error_message() {
        let mut p = panel();
        p.apply_search(Err(ApiError::Service("token expired".to_string())));
        assert_eq!(p.results, ResultsState::Failed("token expired".to_string()));
    }

    #[test]
    fn test_choose_result_records_endpoint_and_hides_list() {
        let mut p = panel();
        p.apply_search(Ok(vec![Endpoint {
            id: "abc".to_string(),
            display_name: "Campus Cluster".to_string(),
            owner_string: "ops@campus".to_string(),
        }]));

        let chosen = p.choose_result(0).unwrap();
        assert_eq!(chosen.id, "abc");
        assert_eq!(p.search_input, "Campus Cluster");
        assert_eq!(p.results, ResultsState::Hidden);
        assert_eq!(p.endpoint.as_ref().unwrap().id, "abc");
    }

    #[test]
    fn test_plain_selection_clears_others() {
        let mut p = loaded_panel(&[
            ("a.txt", EntryKind::File),
            ("b.txt", EntryKind::File),
            ("c.txt", EntryKind::File),
        ]);
        p.toggle_selection(0, false);
        p.toggle_selection(1, true);
        assert_eq!(p.selected_count(), 2);

        // Plain selection: only the clicked row stays selected
        p.toggle_selection(2, false);
        let selected: Vec<&str> = p.selected_entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(selected, vec!["c.txt"]);
    }

    #[test]
    fn test_additive_selection_preserves_and_toggles() {
        let mut p = loaded_panel(&[("a.txt", EntryKind::File), ("b.txt", EntryKind::File)]);
        p.toggle_selection(0, false);
        p.toggle_selection(1, true);
        assert_eq!(p.selected_count(), 2);

        // Additive toggle on an already-selected row deselects just that row
        p.toggle_selection(0, true);
        let selected: Vec<&str> = p.selected_entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(selected, vec!["b.txt"]);
    }

    #[test]
    fn test_activating_directory_descends() {
        let mut p = loaded_panel(&[("results", EntryKind::Dir)]);
        let action = p.activate_row(0);
        assert_eq!(action, Some(RowAction::Descend("/~/results/".to_string())));
        assert_eq!(p.path_input, "/~/results/");
    }

    #[test]
    fn test_activating_file_toggles_selection() {
        let mut p = loaded_panel(&[("a.txt", EntryKind::File)]);
        assert_eq!(p.activate_row(0), Some(RowAction::Toggled));
        assert!(p.rows()[0].selected);
        assert_eq!(p.path_input, "/~/");

        assert_eq!(p.activate_row(0), Some(RowAction::Toggled));
        assert!(!p.rows()[0].selected);
    }

    #[test]
    fn test_select_all_label_opposes_state() {
        let mut p = loaded_panel(&[("a.txt", EntryKind::File), ("b.txt", EntryKind::File)]);
        assert_eq!(p.select_all_label(), "select all");

        p.toggle_select_all();
        assert_eq!(p.selected_count(), 2);
        assert_eq!(p.select_all_label(), "select none");

        p.toggle_select_all();
        assert_eq!(p.selected_count(), 0);
        assert_eq!(p.select_all_label(), "select all");
    }

    #[test]
    fn test_partial_selection_counts_as_selected() {
        let mut p = loaded_panel(&[("a.txt", EntryKind::File), ("b.txt", EntryKind::File)]);
        p.toggle_selection(0, false);
        // One row selected: the control offers to clear
        assert_eq!(p.select_all_label(), "select none");
        p.toggle_select_all();
        assert_eq!(p.selected_count(), 0);
    }

    #[test]
    fn test_relisting_drops_selection() {
        let mut p = loaded_panel(&[("a.txt", EntryKind::File)]);
        p.toggle_selection(0, false);
        assert_eq!(p.selected_count(), 1);

        p.apply_listing(Ok(vec![entry("a.txt", EntryKind::File)]));
        assert_eq!(p.selected_count(), 0);
    }

    #[test]
    fn test_listing_failure_carries_message() {
        let mut p = panel();
        p.apply_listing(Err(ApiError::Service("permission denied".to_string())));
        assert_eq!(p.listing, ListingState::Failed("permission denied".to_string()));
    }

    #[test]
    fn test_empty_path_resets_to_default_before_listing() {
        let mut p = panel();
        p.path_input.clear();
        p.begin_listing();
        assert_eq!(p.path_input, "/~/");
        assert_eq!(p.listing, ListingState::Loading);
    }

    #[test]
    fn test_parent_path() {
        assert_eq!(parent_of("/~/results/"), "/~/");
        assert_eq!(parent_of("/~/a/b/"), "/~/a/");
        assert_eq!(parent_of("/~/"), "/");
        assert_eq!(parent_of("/"), "/");
        assert_eq!(parent_of(""), "/");
    }
}
