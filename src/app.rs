use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::time::Instant;

use crate::config::AppConfig;
use crate::panel::{Panel, PanelFocus, PanelRole, ResultsState, RowAction};
use crate::transfer::client::TransferClient;
use crate::transfer::personal::personal_endpoint_id;
use crate::transfer::{TransferItem, TransferRequest};

/// Precondition message shown when a submission is attempted with an
/// endpoint missing. No network call is made in that case.
pub const MISSING_ENDPOINTS: &str = "Both endpoints must be selected to start transfer";

/// Seconds before a transient status message clears itself
const STATUS_CLEAR_SECS: u64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Source,
    Destination,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Popup {
    None,
    Help,
}

/// Outcome of the most recent submission attempt. Exactly one outcome is
/// shown per attempt; a new attempt replaces it.
#[derive(Debug, Clone, PartialEq)]
pub enum TransferOutcome {
    Success(String),
    Failure(String),
}

pub struct App {
    pub section: Section,
    pub popup: Popup,

    pub source: Panel,
    pub destination: Panel,

    pub transfer_result: Option<TransferOutcome>,

    // Status message (shown in info line, auto-clears after timeout)
    pub status_message: Option<String>,
    pub status_message_time: Option<Instant>,

    pub config: AppConfig,
    client: TransferClient,
}

impl App {
    pub fn new() -> Result<Self> {
        let config = AppConfig::load().unwrap_or_default();
        let client = TransferClient::new(&config)?;
        let default_path = config.default_path.clone();

        Ok(Self {
            section: Section::Source,
            popup: Popup::None,
            source: Panel::new(PanelRole::Source, default_path.clone()),
            destination: Panel::new(PanelRole::Destination, default_path),
            transfer_result: None,
            status_message: None,
            status_message_time: None,
            config,
            client,
        })
    }

    /// Set a status message (auto-clears after a few seconds)
    fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = Some(msg.into());
        self.status_message_time = Some(Instant::now());
    }

    pub fn active_panel(&self) -> &Panel {
        match self.section {
            Section::Source => &self.source,
            Section::Destination => &self.destination,
        }
    }

    fn active_panel_mut(&mut self) -> &mut Panel {
        match self.section {
            Section::Source => &mut self.source,
            Section::Destination => &mut self.destination,
        }
    }

    fn panel_mut(&mut self, section: Section) -> &mut Panel {
        match section {
            Section::Source => &mut self.source,
            Section::Destination => &mut self.destination,
        }
    }

    pub async fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        if self.popup == Popup::Help {
            if matches!(
                key.code,
                KeyCode::Esc | KeyCode::Char('?') | KeyCode::Enter | KeyCode::Char('q')
            ) {
                self.popup = Popup::None;
            }
            return Ok(());
        }

        match key.code {
            // Switch between the source and destination panels
            KeyCode::Tab | KeyCode::BackTab => {
                self.section = match self.section {
                    Section::Source => Section::Destination,
                    Section::Destination => Section::Source,
                };
                Ok(())
            }
            _ => match self.active_panel().focus {
                PanelFocus::Search => self.handle_search_key(key),
                PanelFocus::Results => self.handle_results_key(key).await,
                PanelFocus::Path => self.handle_path_key(key).await,
                PanelFocus::Listing => self.handle_listing_key(key).await,
            },
        }
    }

    fn handle_search_key(&mut self, key: KeyEvent) -> Result<()> {
        let panel = self.active_panel_mut();
        match key.code {
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                panel.search_input.push(c);
                panel.note_search_edited();
            }
            KeyCode::Backspace => {
                panel.search_input.pop();
                panel.note_search_edited();
            }
            // Skip the rest of the idle window
            KeyCode::Enter => panel.force_search(),
            KeyCode::Down => {
                if matches!(panel.results, ResultsState::Loaded(_)) {
                    panel.focus = PanelFocus::Results;
                } else if !panel.rows().is_empty() {
                    panel.focus = PanelFocus::Listing;
                }
            }
            KeyCode::Esc => {
                if !panel.rows().is_empty() {
                    panel.focus = PanelFocus::Listing;
                }
            }
            _ => {}
        }
        Ok(())
    }

    async fn handle_results_key(&mut self, key: KeyEvent) -> Result<()> {
        let section = self.section;
        match key.code {
            KeyCode::Down | KeyCode::Char('j') => self.active_panel_mut().move_results_cursor_down(),
            KeyCode::Up | KeyCode::Char('k') => self.active_panel_mut().move_results_cursor_up(),
            KeyCode::Enter => {
                let panel = self.active_panel_mut();
                let idx = panel.results_cursor;
                let chosen = panel.choose_result(idx).is_some();
                if chosen {
                    self.open_active_endpoint(section).await;
                }
            }
            KeyCode::Esc => {
                let panel = self.active_panel_mut();
                panel.results = ResultsState::Hidden;
                panel.focus = PanelFocus::Search;
            }
            _ => {}
        }
        Ok(())
    }

    async fn handle_path_key(&mut self, key: KeyEvent) -> Result<()> {
        let section = self.section;
        match key.code {
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.active_panel_mut().path_input.push(c);
            }
            KeyCode::Backspace => {
                self.active_panel_mut().path_input.pop();
            }
            // Committing the path re-issues the listing
            KeyCode::Enter => {
                self.active_panel_mut().focus = PanelFocus::Listing;
                self.refresh_listing(section).await;
            }
            KeyCode::Esc => self.active_panel_mut().focus = PanelFocus::Listing,
            _ => {}
        }
        Ok(())
    }

    async fn handle_listing_key(&mut self, key: KeyEvent) -> Result<()> {
        let section = self.section;
        match key.code {
            KeyCode::Down | KeyCode::Char('j') => self.active_panel_mut().move_cursor_down(),
            KeyCode::Up | KeyCode::Char('k') => self.active_panel_mut().move_cursor_up(),

            // Plain select clears the rest of the listing; Ctrl/Shift keeps it
            KeyCode::Char(' ') => {
                let additive = key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::SHIFT);
                let panel = self.active_panel_mut();
                let idx = panel.cursor;
                panel.toggle_selection(idx, additive);
            }

            // Open: directories descend, files toggle selection
            KeyCode::Enter => {
                let panel = self.active_panel_mut();
                let idx = panel.cursor;
                if let Some(RowAction::Descend(_)) = panel.activate_row(idx) {
                    self.refresh_listing(section).await;
                }
            }

            KeyCode::Char('a') => self.active_panel_mut().toggle_select_all(),
            KeyCode::Char('r') => self.refresh_listing(section).await,
            KeyCode::Backspace | KeyCode::Char('u') => {
                let panel = self.active_panel_mut();
                panel.path_input = panel.parent_path();
                self.refresh_listing(section).await;
            }

            KeyCode::Char('/') => self.active_panel_mut().focus = PanelFocus::Search,
            KeyCode::Char('e') => self.active_panel_mut().focus = PanelFocus::Path,

            KeyCode::Char('t') => self.start_transfer().await,
            KeyCode::Char('p') => self.use_personal_endpoint(),
            KeyCode::Char('?') => self.popup = Popup::Help,

            KeyCode::Esc => {
                self.transfer_result = None;
                self.status_message = None;
                self.status_message_time = None;
            }
            _ => {}
        }
        Ok(())
    }

    /// Fill the destination search with the configured personal endpoint id
    /// and fire the search right away.
    fn use_personal_endpoint(&mut self) {
        match personal_endpoint_id(&self.config) {
            Some(id) => {
                let panel = &mut self.destination;
                panel.search_input = id;
                panel.note_search_edited();
                panel.force_search();
                panel.focus = PanelFocus::Search;
                self.section = Section::Destination;
                self.set_status("Looking up your personal endpoint");
            }
            None => self.set_status("No personal endpoint configured"),
        }
    }

    /// Activate the panel's chosen endpoint, then list its current path.
    /// Activation must succeed before the listing is requested; either
    /// failure lands in the panel's listing area.
    async fn open_active_endpoint(&mut self, section: Section) {
        let client = self.client.clone();
        let panel = self.panel_mut(section);
        let Some(endpoint) = panel.endpoint.clone() else {
            return;
        };

        panel.begin_listing();
        let path = panel.path_input.clone();
        let outcome = match client.activate(&endpoint.id).await {
            Ok(()) => client.list_directory(&endpoint.id, &path).await,
            Err(e) => Err(e),
        };

        let panel = self.panel_mut(section);
        panel.apply_listing(outcome);
        panel.focus = PanelFocus::Listing;
    }

    /// Re-issue the listing for the panel's current path.
    async fn refresh_listing(&mut self, section: Section) {
        let client = self.client.clone();
        let panel = self.panel_mut(section);
        let Some(endpoint) = panel.endpoint.clone() else {
            self.set_status("Search for an endpoint first");
            return;
        };

        panel.begin_listing();
        let path = panel.path_input.clone();
        let outcome = client.list_directory(&endpoint.id, &path).await;
        self.panel_mut(section).apply_listing(outcome);
    }

    /// Submit a transfer of the source panel's selected rows. An empty
    /// selection still submits (with an empty item set); a missing endpoint
    /// short-circuits with the fixed message and no network call.
    async fn start_transfer(&mut self) {
        let Some(request) = build_transfer_request(&self.source, &self.destination) else {
            self.transfer_result = Some(TransferOutcome::Failure(MISSING_ENDPOINTS.to_string()));
            return;
        };

        self.transfer_result = None;
        self.set_status("Submitting transfer...");

        match self.client.submit(&request).await {
            Ok(receipt) => {
                tracing::info!(task_id = ?receipt.task_id, "transfer submitted");
                notify_submitted(&receipt.message);
                self.transfer_result = Some(TransferOutcome::Success(receipt.message));
            }
            Err(e) => {
                tracing::warn!("transfer submission failed: {}", e);
                self.transfer_result = Some(TransferOutcome::Failure(e.to_string()));
            }
        }
    }

    pub async fn tick(&mut self) -> Result<()> {
        // Clear transient status messages
        if let Some(time) = self.status_message_time {
            if time.elapsed().as_secs() >= STATUS_CLEAR_SECS {
                self.status_message = None;
                self.status_message_time = None;
            }
        }

        // Fire searches whose idle window has elapsed
        let now = Instant::now();
        if let Some(query) = self.source.take_due_search(now) {
            self.run_search(Section::Source, query).await;
        }
        if let Some(query) = self.destination.take_due_search(now) {
            self.run_search(Section::Destination, query).await;
        }

        Ok(())
    }

    async fn run_search(&mut self, section: Section, query: String) {
        let client = self.client.clone();
        self.panel_mut(section).begin_search();
        let outcome = client.search(&query).await;

        let panel = self.panel_mut(section);
        panel.apply_search(outcome);
        if matches!(panel.results, ResultsState::Loaded(_)) && panel.focus == PanelFocus::Search {
            panel.focus = PanelFocus::Results;
        }
    }
}

/// Build the submission payload, or `None` when either endpoint is missing.
pub fn build_transfer_request(source: &Panel, destination: &Panel) -> Option<TransferRequest> {
    let source_endpoint = source.endpoint.as_ref()?;
    let destination_endpoint = destination.endpoint.as_ref()?;

    let items: Vec<TransferItem> = source
        .selected_entries()
        .into_iter()
        .map(|entry| TransferItem::for_entry(&source.path_input, &destination.path_input, entry))
        .collect();

    Some(TransferRequest::new(
        source_endpoint.id.clone(),
        destination_endpoint.id.clone(),
        items,
    ))
}

fn notify_submitted(message: &str) {
    let _ = notify_rust::Notification::new()
        .summary("hakobu")
        .body(message)
        .icon("folder-remote")
        .show();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transfer::{DirEntry, Endpoint, EntryKind};

    fn endpoint(id: &str) -> Endpoint {
        Endpoint {
            id: id.to_string(),
            display_name: format!("Endpoint {id}"),
            owner_string: String::new(),
        }
    }

    fn panel_with_listing(role: PanelRole, entries: Vec<DirEntry>) -> Panel {
        let mut panel = Panel::new(role, "/~/".to_string());
        panel.apply_listing(Ok(entries));
        panel
    }

    #[test]
    fn test_missing_endpoint_builds_no_request() {
        let source = Panel::new(PanelRole::Source, "/~/".to_string());
        let mut destination = Panel::new(PanelRole::Destination, "/~/".to_string());
        assert!(build_transfer_request(&source, &destination).is_none());

        destination.endpoint = Some(endpoint("B"));
        assert!(build_transfer_request(&source, &destination).is_none());
    }

    #[test]
    fn test_empty_selection_submits_empty_item_set() {
        let mut source = panel_with_listing(PanelRole::Source, Vec::new());
        source.endpoint = Some(endpoint("A"));
        let mut destination = Panel::new(PanelRole::Destination, "/~/".to_string());
        destination.endpoint = Some(endpoint("B"));

        let request = build_transfer_request(&source, &destination).unwrap();
        assert_eq!(request.source_endpoint, "A");
        assert_eq!(request.destination_endpoint, "B");
        assert!(request.items.is_empty());
    }

    #[test]
    fn test_selected_rows_become_items() {
        let mut source = panel_with_listing(
            PanelRole::Source,
            vec![
                DirEntry {
                    name: "data.csv".to_string(),
                    size: 2048,
                    kind: EntryKind::File,
                },
                DirEntry {
                    name: "results".to_string(),
                    size: 0,
                    kind: EntryKind::Dir,
                },
            ],
        );
        source.endpoint = Some(endpoint("A"));
        source.toggle_selection(0, false);
        source.toggle_selection(1, true);

        let mut destination = Panel::new(PanelRole::Destination, "/~/".to_string());
        destination.endpoint = Some(endpoint("B"));
        destination.path_input = "/out/".to_string();

        let request = build_transfer_request(&source, &destination).unwrap();
        assert_eq!(request.items.len(), 2);

        assert_eq!(request.items[0].source_path, "/~/data.csv");
        assert_eq!(request.items[0].destination_path, "/out/data.csv");
        assert!(!request.items[0].recursive);

        assert_eq!(request.items[1].source_path, "/~/results");
        assert_eq!(request.items[1].destination_path, "/out/results");
        assert!(request.items[1].recursive);
    }
}
