use std::sync::OnceLock;

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Row, Table, Wrap},
    Frame,
};

use crate::app::{App, Popup, Section, TransferOutcome};
use crate::panel::{ListingState, Panel, PanelFocus, ResultsState, NO_ENDPOINTS_FOUND};
use crate::theme::Theme;

// Load theme colors from the system once at startup
static THEME: OnceLock<Theme> = OnceLock::new();

fn theme() -> &'static Theme {
    THEME.get_or_init(Theme::load)
}

// Helper functions to get theme colors
fn accent() -> Color { theme().accent }
fn success() -> Color { theme().success }
fn danger() -> Color { theme().danger }
fn text() -> Color { theme().text }
fn text_dim() -> Color { theme().text_dim }
fn bg_selected() -> Color { theme().bg_selected }
fn inactive() -> Color { theme().inactive }
fn header() -> Color { theme().header }
fn dir_color() -> Color { theme().dir }
fn file_color() -> Color { theme().file }

pub fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Info line
            Constraint::Min(10),   // Panels
            Constraint::Length(1), // Transfer result
            Constraint::Length(1), // Footer
        ])
        .split(f.area());

    draw_info_line(f, app, chunks[0]);

    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 2), Constraint::Ratio(1, 2)])
        .split(chunks[1]);

    draw_panel(f, &app.source, app.section == Section::Source, panes[0]);
    draw_panel(f, &app.destination, app.section == Section::Destination, panes[1]);

    draw_transfer_result(f, app, chunks[2]);
    draw_footer(f, app, chunks[3]);

    if app.popup == Popup::Help {
        draw_help_popup(f);
    }
}

fn draw_info_line(f: &mut Frame, app: &App, area: Rect) {
    // Priority: status message > panel summaries > ready
    let line = if let Some(ref status) = app.status_message {
        Line::from(Span::styled(status, Style::default().fg(accent())))
    } else {
        match (app.source.summary(), app.destination.summary()) {
            (Some(src), Some(dst)) => Line::from(vec![
                Span::styled(src, Style::default().fg(text_dim())),
                Span::styled(" → ", Style::default().fg(accent())),
                Span::styled(dst, Style::default().fg(text_dim())),
            ]),
            (Some(one), None) | (None, Some(one)) => {
                Line::from(Span::styled(one, Style::default().fg(text_dim())))
            }
            (None, None) => Line::from(Span::styled(
                "Search for a collection to get started",
                Style::default().fg(text_dim()),
            )),
        }
    };

    let info = Paragraph::new(line).alignment(Alignment::Center);
    f.render_widget(info, area);
}

fn draw_panel(f: &mut Frame, panel: &Panel, is_active: bool, area: Rect) {
    let border_color = if is_active { accent() } else { inactive() };
    let title_style = if is_active {
        Style::default().fg(accent()).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(inactive())
    };

    let block = Block::default()
        .title(Span::styled(format!(" {} ", panel.role.title()), title_style))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color));

    let inner = block.inner(area);
    f.render_widget(block, area);

    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(4)])
        .split(inner);

    draw_search_input(f, panel, is_active, sections[0]);

    // The endpoint results dropdown replaces the directory area while visible
    if panel.results == ResultsState::Hidden {
        draw_directory_area(f, panel, is_active, sections[1]);
    } else {
        draw_endpoint_results(f, panel, is_active, sections[1]);
    }
}

fn draw_search_input(f: &mut Frame, panel: &Panel, is_active: bool, area: Rect) {
    let focused = is_active && panel.focus == PanelFocus::Search;
    let border = if focused { accent() } else { inactive() };

    let content = if panel.search_input.is_empty() && !focused {
        Span::styled("Search collections", Style::default().fg(text_dim()))
    } else {
        let cursor = if focused { "_" } else { "" };
        Span::styled(
            format!("{}{}", panel.search_input, cursor),
            Style::default().fg(text()),
        )
    };

    let input = Paragraph::new(Line::from(content)).block(
        Block::default()
            .title(Span::styled(
                " Collection ",
                Style::default().fg(if focused { accent() } else { header() }),
            ))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border)),
    );
    f.render_widget(input, area);
}

fn draw_endpoint_results(f: &mut Frame, panel: &Panel, is_active: bool, area: Rect) {
    match &panel.results {
        ResultsState::Hidden => {}
        ResultsState::Loading => {
            let loading = Paragraph::new("Loading collections...")
                .style(Style::default().fg(text_dim()));
            f.render_widget(loading, area);
        }
        ResultsState::Empty => {
            let empty = Paragraph::new(NO_ENDPOINTS_FOUND).style(Style::default().fg(text_dim()));
            f.render_widget(empty, area);
        }
        ResultsState::Failed(message) => {
            let failed = Paragraph::new(message.as_str())
                .style(Style::default().fg(danger()))
                .wrap(Wrap { trim: false });
            f.render_widget(failed, area);
        }
        ResultsState::Loaded(endpoints) => {
            let rows: Vec<Row> = endpoints
                .iter()
                .enumerate()
                .map(|(i, endpoint)| {
                    let row_style = if i == panel.results_cursor
                        && is_active
                        && panel.focus == PanelFocus::Results
                    {
                        Style::default().bg(bg_selected()).fg(text())
                    } else {
                        Style::default()
                    };
                    Row::new(vec![
                        Span::styled(&endpoint.display_name, Style::default().fg(text())),
                        Span::styled(&endpoint.owner_string, Style::default().fg(text_dim())),
                    ])
                    .style(row_style)
                })
                .collect();

            let widths = [Constraint::Percentage(60), Constraint::Percentage(40)];
            let table = Table::new(rows, widths).header(Row::new(vec![
                Span::styled("Name", Style::default().fg(header())),
                Span::styled("Owner", Style::default().fg(header())),
            ]));
            f.render_widget(table, area);
        }
    }
}

fn draw_directory_area(f: &mut Frame, panel: &Panel, is_active: bool, area: Rect) {
    if panel.endpoint.is_none() && panel.listing == ListingState::Hidden {
        let hint = Paragraph::new("Type above to search for a collection")
            .style(Style::default().fg(text_dim()));
        f.render_widget(hint, area);
        return;
    }

    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Path input
            Constraint::Length(1), // Menu line
            Constraint::Min(2),    // Listing
        ])
        .split(area);

    draw_path_input(f, panel, is_active, sections[0]);
    draw_menu_line(f, panel, sections[1]);
    draw_listing(f, panel, is_active, sections[2]);
}

fn draw_path_input(f: &mut Frame, panel: &Panel, is_active: bool, area: Rect) {
    let focused = is_active && panel.focus == PanelFocus::Path;
    let border = if focused { accent() } else { inactive() };
    let cursor = if focused { "_" } else { "" };

    let input = Paragraph::new(format!("{}{}", panel.path_input, cursor))
        .style(Style::default().fg(text()))
        .block(
            Block::default()
                .title(Span::styled(
                    " Path ",
                    Style::default().fg(if focused { accent() } else { header() }),
                ))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(border)),
        );
    f.render_widget(input, area);
}

fn draw_menu_line(f: &mut Frame, panel: &Panel, area: Rect) {
    // The select-all control's label reflects the opposite of the current
    // aggregate selection state
    let menu = Paragraph::new(Line::from(vec![
        Span::styled(" a", Style::default().fg(accent())),
        Span::styled(
            format!(" {} │", panel.select_all_label()),
            Style::default().fg(text_dim()),
        ),
        Span::styled(" u", Style::default().fg(accent())),
        Span::styled(" up │", Style::default().fg(text_dim())),
        Span::styled(" r", Style::default().fg(accent())),
        Span::styled(" refresh │", Style::default().fg(text_dim())),
        Span::styled(" t", Style::default().fg(accent())),
        Span::styled(" transfer", Style::default().fg(text_dim())),
    ]));
    f.render_widget(menu, area);
}

fn draw_listing(f: &mut Frame, panel: &Panel, is_active: bool, area: Rect) {
    match &panel.listing {
        ListingState::Hidden => {}
        ListingState::Loading => {
            let loading = Paragraph::new("Retrieving directories...")
                .style(Style::default().fg(text_dim()));
            f.render_widget(loading, area);
        }
        ListingState::Failed(message) => {
            let failed = Paragraph::new(message.as_str())
                .style(Style::default().fg(danger()))
                .wrap(Wrap { trim: false });
            f.render_widget(failed, area);
        }
        ListingState::Loaded(rows) if rows.is_empty() => {
            let empty =
                Paragraph::new("Empty directory").style(Style::default().fg(text_dim()));
            f.render_widget(empty, area);
        }
        ListingState::Loaded(entry_rows) => {
            let rows: Vec<Row> = entry_rows
                .iter()
                .enumerate()
                .map(|(i, row)| {
                    // Exactly one of the two kind stylings applies per row
                    let (icon, kind_color) = if row.entry.is_dir() {
                        ("󰉋", dir_color())
                    } else {
                        ("󰈔", file_color())
                    };

                    let marker = if row.selected { "●" } else { " " };
                    let name_style = if row.selected {
                        Style::default().fg(accent()).add_modifier(Modifier::BOLD)
                    } else {
                        Style::default().fg(text())
                    };

                    let row_style =
                        if i == panel.cursor && is_active && panel.focus == PanelFocus::Listing {
                            Style::default().bg(bg_selected()).fg(text())
                        } else {
                            Style::default()
                        };

                    Row::new(vec![
                        Span::styled(marker, Style::default().fg(accent())),
                        Span::styled(icon, Style::default().fg(kind_color)),
                        Span::styled(&row.entry.name, name_style),
                        Span::styled(format_size(row.entry.size), Style::default().fg(text_dim())),
                    ])
                    .style(row_style)
                })
                .collect();

            let widths = [
                Constraint::Length(2),
                Constraint::Length(2),
                Constraint::Percentage(70),
                Constraint::Length(10),
            ];
            let table = Table::new(rows, widths).header(Row::new(vec![
                Span::raw(""),
                Span::raw(""),
                Span::styled("Name", Style::default().fg(header())),
                Span::styled("Size", Style::default().fg(header())),
            ]));
            f.render_widget(table, area);
        }
    }
}

fn draw_transfer_result(f: &mut Frame, app: &App, area: Rect) {
    let line = match &app.transfer_result {
        Some(TransferOutcome::Success(message)) => Line::from(Span::styled(
            format!("✓ {}", message),
            Style::default().fg(success()),
        )),
        Some(TransferOutcome::Failure(message)) => Line::from(Span::styled(
            format!("✗ {}", message),
            Style::default().fg(danger()),
        )),
        None => Line::from(""),
    };

    let result = Paragraph::new(line).alignment(Alignment::Center);
    f.render_widget(result, area);
}

fn draw_footer(f: &mut Frame, app: &App, area: Rect) {
    let hints: Vec<(&str, &str)> = match app.active_panel().focus {
        PanelFocus::Search => vec![
            ("type", "search"),
            ("Enter", "Now"),
            ("↓", "Results"),
            ("Tab", "Panel"),
        ],
        PanelFocus::Results => vec![
            ("↑↓", "Nav"),
            ("Enter", "Open"),
            ("Esc", "Back"),
            ("Tab", "Panel"),
        ],
        PanelFocus::Path => vec![("type", "edit"), ("Enter", "List"), ("Esc", "Back")],
        PanelFocus::Listing => vec![
            ("Space", "Select"),
            ("Enter", "Open"),
            ("a", "All"),
            ("u", "Up"),
            ("t", "Transfer"),
            ("/", "Search"),
            ("?", "Help"),
        ],
    };

    // Responsive: show fewer hints on narrow terminals
    let max_hints = if area.width < 60 {
        4
    } else if area.width < 80 {
        5
    } else {
        hints.len()
    };

    let hint_spans: Vec<Span> = hints
        .iter()
        .take(max_hints)
        .flat_map(|(key, action)| {
            vec![
                Span::styled(*key, Style::default().fg(accent())),
                Span::styled(format!(" {} │ ", action), Style::default().fg(text_dim())),
            ]
        })
        .chain(std::iter::once(Span::styled(
            "Ctrl+C quit",
            Style::default().fg(text_dim()),
        )))
        .collect();

    let footer = Paragraph::new(Line::from(hint_spans)).alignment(Alignment::Center);
    f.render_widget(footer, area);
}

fn draw_help_popup(f: &mut Frame) {
    let area = f.area();
    let popup_area = centered_rect(
        if area.width < 80 { 95 } else { 70 },
        if area.height < 40 { 95 } else { 80 },
        area,
    );

    f.render_widget(Clear, popup_area);

    let help_text = vec![
        Line::from(Span::styled(
            "═══ Panels ═══",
            Style::default().fg(header()).add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![
            Span::styled("  Tab       ", Style::default().fg(accent())),
            Span::raw("Switch between Source and Destination"),
        ]),
        Line::from(vec![
            Span::styled("  ↑/↓ j/k   ", Style::default().fg(accent())),
            Span::raw("Move up/down in lists"),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            "═══ Collections ═══",
            Style::default().fg(header()).add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![
            Span::styled("  type      ", Style::default().fg(accent())),
            Span::raw("Search as you type (fires after a short pause)"),
        ]),
        Line::from(vec![
            Span::styled("  Enter     ", Style::default().fg(accent())),
            Span::raw("Open the highlighted collection"),
        ]),
        Line::from(vec![
            Span::styled("  p         ", Style::default().fg(accent())),
            Span::raw("Use your personal endpoint as destination"),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            "═══ Browsing ═══",
            Style::default().fg(header()).add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![
            Span::styled("  Enter     ", Style::default().fg(accent())),
            Span::raw("Open directory / toggle file selection"),
        ]),
        Line::from(vec![
            Span::styled("  Space     ", Style::default().fg(accent())),
            Span::raw("Select row (Ctrl/Shift keeps other selections)"),
        ]),
        Line::from(vec![
            Span::styled("  a         ", Style::default().fg(accent())),
            Span::raw("Select all / select none"),
        ]),
        Line::from(vec![
            Span::styled("  u / Bksp  ", Style::default().fg(accent())),
            Span::raw("Up one directory"),
        ]),
        Line::from(vec![
            Span::styled("  r         ", Style::default().fg(accent())),
            Span::raw("Refresh listing"),
        ]),
        Line::from(vec![
            Span::styled("  e         ", Style::default().fg(accent())),
            Span::raw("Edit the path directly"),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            "═══ Transfer ═══",
            Style::default().fg(header()).add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![
            Span::styled("  t         ", Style::default().fg(accent())),
            Span::raw("Submit selected source files to the destination"),
        ]),
        Line::from(vec![Span::raw(
            "            The service moves the data; hakobu only submits",
        )]),
        Line::from(""),
        Line::from(Span::styled(
            "═══ Command line ═══",
            Style::default().fg(header()).add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![
            Span::styled("  hakobu --search QUERY      ", Style::default().fg(accent())),
            Span::raw("Print matching collections as JSON"),
        ]),
        Line::from(vec![
            Span::styled("  hakobu --list ID --path P  ", Style::default().fg(accent())),
            Span::raw("Print a directory listing as JSON"),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Press ", Style::default().fg(text_dim())),
            Span::styled("?", Style::default().fg(accent())),
            Span::styled("/", Style::default().fg(text_dim())),
            Span::styled("Esc", Style::default().fg(accent())),
            Span::styled(" to close", Style::default().fg(text_dim())),
        ]),
    ];

    let help = Paragraph::new(help_text)
        .block(
            Block::default()
                .title(Span::styled(" 󰋖 hakobu Help ", Style::default().fg(accent())))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(accent())),
        )
        .wrap(Wrap { trim: false });

    f.render_widget(help, popup_area);
}

/// Format a byte count for the size column
fn format_size(bytes: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = KIB * 1024;
    const GIB: u64 = MIB * 1024;
    const TIB: u64 = GIB * 1024;

    if bytes >= TIB {
        format!("{:.2} TiB", bytes as f64 / TIB as f64)
    } else if bytes >= GIB {
        format!("{:.2} GiB", bytes as f64 / GIB as f64)
    } else if bytes >= MIB {
        format!("{:.2} MiB", bytes as f64 / MIB as f64)
    } else if bytes >= KIB {
        format!("{:.2} KiB", bytes as f64 / KIB as f64)
    } else {
        format!("{} B", bytes)
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
