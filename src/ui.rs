//! UI rendering helpers for the terminal user interface.
//!
//! This module contains functions to render the TUI using `ratatui`.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    widgets::{Block, Borders, Clear, List, ListItem, Padding, Paragraph, Wrap},
};
use std::{collections::BTreeMap, sync::LazyLock, time::Duration};

use crate::app::App;
use crate::config::{ControlsConfig, UiConfig};
use crate::library::format_file_size;
use crate::player::RepeatMode;

static CONTROLS_MAP: LazyLock<BTreeMap<&'static str, &'static str>> = LazyLock::new(|| {
    let mut map = BTreeMap::new();
    map.insert("j/k", "up/down");
    map.insert("gg/G", "top/bottom");
    map.insert("zz", "now playing");
    map.insert("enter", "play selected");
    map.insert("space/p", "play/pause");
    map.insert("h/l", "prev/next");
    // H/L is filled dynamically from config.
    map.insert("+/-", "volume");
    map.insert("s", "shuffle");
    map.insert("r", "repeat");
    map.insert("o", "open dir");
    map.insert("K", "details");
    map.insert("q", "quit");
    map
});

/// Render the controls help text, incorporating scrub seconds.
fn controls_text(scrub_seconds: u64) -> String {
    // Keep the rendered order stable and human-friendly.
    let order = [
        "j/k", "h/l", "H/L", "enter", "space/p", "+/-", "gg/G", "zz", "K", "s", "r", "o", "q",
    ];
    order
        .iter()
        .filter_map(|k| {
            if *k == "H/L" {
                Some(format!("[H/L] scrub -/+{}s", scrub_seconds))
            } else {
                CONTROLS_MAP.get(*k).map(|v| format!("[{}] {}", k, v))
            }
        })
        .collect::<Vec<String>>()
        .join(" | ")
}

/// Format a `Duration` as `MM:SS`.
fn format_mmss(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

fn repeat_text(mode: RepeatMode) -> &'static str {
    match mode {
        RepeatMode::None => "Repeat: off",
        RepeatMode::Track => "Repeat: track",
        RepeatMode::Playlist => "Repeat: playlist",
    }
}

/// Compose the status line shown under the header.
fn status_text(app: &App) -> String {
    let mut parts: Vec<String> = Vec::new();

    if let Some(track) = app.now_playing.and_then(|i| app.tracks.get(i)) {
        let elapsed = format_mmss(Duration::from_millis(app.position_ms));
        let total = format_mmss(Duration::from_millis(app.duration_ms));
        parts.push(format!("Song: {} [{} / {}]", track.display, elapsed, total));
    }
    parts.push(app.status_label().to_string());

    parts.push(if app.shuffle { "Shuffle: ON" } else { "Shuffle: OFF" }.to_string());
    parts.push(repeat_text(app.repeat).to_string());
    parts.push(format!("Vol: {}%", app.volume));
    parts.push(
        if app.follow_playback {
            "Cursor: follow"
        } else {
            "Cursor: free"
        }
        .to_string(),
    );

    if let Some(dir) = &app.current_dir {
        parts.push(format!("Dir: {}", dir.display()));
    }
    if let Some(err) = &app.last_error {
        parts.push(format!("Error: {}", err));
    }

    parts.join(" • ")
}

/// Compute a centered rectangle with given size constrained to `r`.
fn centered_rect_sized(mut width: u16, mut height: u16, r: Rect) -> Rect {
    // Keep the popup smaller and avoid covering the entire UI.
    width = width.min(r.width.saturating_sub(2)).max(10);
    height = height.min(r.height.saturating_sub(2)).max(3);

    let x = r.x + (r.width.saturating_sub(width) / 2);
    let y = r.y + (r.height.saturating_sub(height) / 2);
    Rect {
        x,
        y,
        width,
        height,
    }
}

/// Format an optional duration, rounding up partial seconds, showing total seconds.
fn format_duration_mmss_ceil(d: Option<Duration>) -> String {
    let Some(d) = d else {
        return "-".to_string();
    };

    let mut total_secs = d.as_secs();
    if d.subsec_nanos() > 0 {
        total_secs = total_secs.saturating_add(1);
    }

    let minutes = total_secs / 60;
    let seconds = total_secs % 60;
    format!("{}:{:02} ({}s)", minutes, seconds, total_secs)
}

fn details_text(app: &App) -> String {
    let Some(track) = app.tracks.get(app.selected) else {
        return "No track selected".to_string();
    };
    format!(
        "File: {}\nFolder: {}\nSize: {}\nDuration: {}\nPath: {}",
        track.display,
        track.folder.as_deref().unwrap_or("-"),
        track
            .size_bytes
            .map(format_file_size)
            .unwrap_or_else(|| "-".to_string()),
        format_duration_mmss_ceil(app.duration_of(app.selected)),
        track.path.display()
    )
}

fn left_pad() -> Padding {
    Padding {
        left: 1,
        right: 0,
        top: 0,
        bottom: 0,
    }
}

/// Render the entire UI into the provided `frame`.
pub fn draw(frame: &mut Frame, app: &App, ui: &UiConfig, controls: &ControlsConfig) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(5),
            Constraint::Min(1),
            Constraint::Length(4),
        ])
        .split(frame.area());

    // Header
    let header = Paragraph::new(ui.header_text.as_str())
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" allegro ")
                .title_alignment(Alignment::Center),
        );
    frame.render_widget(header, chunks[0]);

    let status_par = Paragraph::new(status_text(app))
        .block(Block::bordered().padding(left_pad()).title(" status "))
        .wrap(Wrap { trim: true });
    frame.render_widget(status_par, chunks[1]);

    // Main list
    {
        // Center the selected item when possible by creating a visible window.
        // Only build ListItems for the visible window.
        let total = app.tracks.len();
        let list_height = chunks[2].height.saturating_sub(2) as usize;
        let sel_pos = app.selected.min(total.saturating_sub(1));
        let (start, end, selected_pos_in_visible) = if total <= list_height || list_height == 0 {
            (0, total, sel_pos)
        } else {
            let half = list_height / 2;
            let mut start = sel_pos.saturating_sub(half);
            if start + list_height > total {
                start = total - list_height;
            }
            (start, start + list_height, sel_pos - start)
        };

        let visible_items: Vec<ListItem> = app.tracks[start..end]
            .iter()
            .enumerate()
            .map(|(offset, track)| {
                let marker = if app.now_playing == Some(start + offset) {
                    "♪ "
                } else {
                    "  "
                };
                ListItem::new(format!("{marker}{}", track.display))
            })
            .collect();

        let title = if total == 0 {
            " tracks (none) ".to_string()
        } else {
            format!(" tracks ({total}) ")
        };
        let list = List::new(visible_items)
            .block(Block::default().borders(Borders::ALL).title(title))
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol("> ");
        let mut state = ratatui::widgets::ListState::default();
        if total > 0 {
            state.select(Some(selected_pos_in_visible));
        }
        frame.render_stateful_widget(list, chunks[2], &mut state);
    }

    // Overlay details popup (keeps list visible under it)
    if app.details_window {
        let popup_area = centered_rect_sized(72, 9, chunks[2]);
        frame.render_widget(Clear, popup_area);
        let details = Paragraph::new(details_text(app))
            .block(
                Block::default()
                    .padding(left_pad())
                    .borders(Borders::ALL)
                    .title(" details (K closes) "),
            )
            .wrap(Wrap { trim: true });
        frame.render_widget(details, popup_area);
    }

    if let Some(input) = &app.prompt {
        let popup_area = centered_rect_sized(72, 3, chunks[2]);
        frame.render_widget(Clear, popup_area);
        let prompt = Paragraph::new(format!("{input}▏")).block(
            Block::default()
                .padding(left_pad())
                .borders(Borders::ALL)
                .title(" open directory (enter loads, esc cancels) "),
        );
        frame.render_widget(prompt, popup_area);
    }

    let footer = Paragraph::new(controls_text(controls.scrub_seconds))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" controls ")
                .padding(left_pad()),
        )
        .wrap(Wrap { trim: true });

    frame.render_widget(footer, chunks[3]);
}
