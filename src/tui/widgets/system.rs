//! System info panel: driver, device count, last update time.

use chrono::{DateTime, Local};
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::collector::SystemInfo;
use crate::tui::style::{Styles, Theme};

const LABEL_WIDTH: usize = 9;

fn row(name: &str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{:<width$}", name, width = LABEL_WIDTH), Styles::label()),
        Span::styled(value, Styles::value()),
    ])
}

/// Renders the system panel into `area`.
pub fn render_system(
    frame: &mut Frame,
    area: Rect,
    info: &SystemInfo,
    backend: &'static str,
    updated: Option<&DateTime<Local>>,
) {
    let mut lines = Vec::with_capacity(5);
    lines.push(row("Driver:", info.driver_version.clone()));
    if let Some(cuda) = &info.cuda_version {
        lines.push(row("CUDA:", cuda.clone()));
    }
    lines.push(row("GPUs:", info.device_count.to_string()));
    lines.push(row(
        "Updated:",
        updated
            .map(|t| t.format("%H:%M:%S").to_string())
            .unwrap_or_else(|| "—".to_string()),
    ));
    lines.push(row("Method:", backend.to_string()));

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Theme::SYSTEM_BORDER))
        .title(Span::styled("System", Styles::label()));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}
