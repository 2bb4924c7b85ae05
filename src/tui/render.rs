//! Frame composition: system panel, device region, process table.

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Paragraph};

use super::state::AppState;
use super::style::{Styles, Theme};
use super::widgets::{render_device, render_processes, render_system};

/// Fixed height of the system panel, content plus borders.
const SYSTEM_PANEL_HEIGHT: u16 = 7;
/// Fixed height of the process table.
const PROCESS_PANEL_HEIGHT: u16 = 12;

/// Main render function. Panels are composed fresh from the current state;
/// the terminal backend repaints only the cells that changed.
pub fn render(frame: &mut Frame, state: &AppState) {
    let chunks = Layout::vertical([
        Constraint::Length(SYSTEM_PANEL_HEIGHT),
        Constraint::Min(10),
        Constraint::Length(PROCESS_PANEL_HEIGHT),
    ])
    .split(frame.area());

    render_system(
        frame,
        chunks[0],
        &state.system,
        state.backend,
        state.updated.as_ref(),
    );

    if let Some(message) = &state.cycle_error {
        render_cycle_error(frame, chunks[1], message);
    } else {
        render_devices(frame, chunks[1], state);
    }

    render_processes(frame, chunks[2], &state.processes);
}

/// Stacks one panel per device; a single device takes the whole region.
fn render_devices(frame: &mut Frame, area: Rect, state: &AppState) {
    if state.devices.is_empty() {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Theme::PANEL_BORDER));
        frame.render_widget(
            Paragraph::new(Line::styled("Waiting for first sample...", Styles::dim()))
                .block(block),
            area,
        );
        return;
    }

    let count = state.devices.len() as u32;
    let rows = Layout::vertical(vec![Constraint::Ratio(1, count); count as usize]).split(area);

    for (snapshot, cell) in state.devices.iter().zip(rows.iter()) {
        if let Some(series) = state.history.device(snapshot.index) {
            render_device(frame, *cell, snapshot, series);
        }
    }
}

/// Inline panel shown for a cycle whose poll failed. The next successful
/// cycle replaces it with normal output.
fn render_cycle_error(frame: &mut Frame, area: Rect, message: &str) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Theme::ERROR))
        .title("Sample error");

    let lines = vec![
        Line::styled(message.to_string(), Styles::error()),
        Line::styled("Retrying on next cycle...", Styles::dim()),
    ];

    frame.render_widget(Paragraph::new(lines).block(block), area);
}
