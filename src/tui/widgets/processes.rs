//! Process table: one row per process using a device.

use ratatui::Frame;
use ratatui::layout::{Constraint, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Row, Table};

use crate::collector::ProcessEntry;
use crate::fmt::format_mib;
use crate::tui::style::{Styles, Theme};

const HEADERS: [&str; 4] = ["GPU", "PID", "Process Name", "Memory"];
const PLACEHOLDER: &str = "No active GPU processes";

/// Cell values for every table row, in the order the backend supplied them.
///
/// An empty process list produces exactly one placeholder row so "no
/// processes" is visually distinct from "not yet loaded".
pub(crate) fn table_cells(processes: &[ProcessEntry]) -> Vec<[String; 4]> {
    if processes.is_empty() {
        return vec![[
            "—".to_string(),
            "—".to_string(),
            PLACEHOLDER.to_string(),
            "—".to_string(),
        ]];
    }

    processes
        .iter()
        .map(|entry| {
            [
                entry.device_index.to_string(),
                entry.pid.to_string(),
                entry.name.clone(),
                format_mib(entry.memory_used),
            ]
        })
        .collect()
}

/// Renders the process table into `area`.
pub fn render_processes(frame: &mut Frame, area: Rect, processes: &[ProcessEntry]) {
    let header = Row::new(
        HEADERS.map(|h| Span::styled(h, Styles::table_header())),
    )
    .height(1);

    let row_style = if processes.is_empty() {
        Styles::dim()
    } else {
        Styles::value()
    };
    let rows: Vec<Row> = table_cells(processes)
        .into_iter()
        .map(|cells| Row::new(cells).style(row_style).height(1))
        .collect();

    let widths = [
        Constraint::Length(4),
        Constraint::Length(8),
        Constraint::Min(20),
        Constraint::Length(10),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Theme::PANEL_BORDER))
        .title(Span::styled("GPU Processes", Styles::label()))
        .title_bottom(Line::from(Span::styled(" q:quit  r:refresh ", Styles::help())));

    let table = Table::new(rows, widths)
        .header(header)
        .column_spacing(2)
        .block(block);

    frame.render_widget(table, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(device_index: usize, pid: u32, name: &str) -> ProcessEntry {
        ProcessEntry {
            device_index,
            pid,
            name: name.to_string(),
            memory_used: 100 * 1024 * 1024,
        }
    }

    #[test]
    fn empty_list_renders_single_placeholder_row() {
        let cells = table_cells(&[]);
        assert_eq!(cells.len(), 1);
        assert_eq!(cells[0][2], PLACEHOLDER);
    }

    #[test]
    fn rows_pass_through_in_backend_order() {
        let processes = vec![
            entry(1, 300, "trainer"),
            entry(0, 100, "render"),
            entry(1, 200, "encode"),
        ];
        let cells = table_cells(&processes);

        assert_eq!(cells.len(), 3);
        assert_eq!(cells[0][1], "300");
        assert_eq!(cells[1][1], "100");
        assert_eq!(cells[2][1], "200");
        assert_eq!(cells[0][0], "1");
        assert_eq!(cells[1][0], "0");
    }

    #[test]
    fn cells_format_memory_as_mib() {
        let cells = table_cells(&[entry(0, 1, "proc")]);
        assert_eq!(cells[0][3], "100 MB");
    }
}
