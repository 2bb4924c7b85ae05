//! Per-device panel: metric bars, clocks, fan and trend sparklines.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::collector::DeviceSnapshot;
use crate::fmt::format_memory;
use crate::history::{DeviceSeries, MetricSeries};
use crate::tui::style::{Styles, Theme, Tier};

/// Default bar width in cells.
pub const BAR_WIDTH: usize = 40;

const BAR_FILLED: char = '█';
const BAR_EMPTY: char = '░';

/// Glyph per sparkline level, lowest to highest.
const SPARK_GLYPHS: [char; 9] = [' ', '▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
/// Rendered for every slot of an all-zero series.
const SPARK_FLAT: char = '─';

const LABEL_WIDTH: usize = 14;

/// Number of filled cells for a 0-100 value in a `width`-cell bar.
pub fn bar_fill(value: f64, width: usize) -> usize {
    let clamped = value.clamp(0.0, 100.0);
    ((clamped / 100.0) * width as f64) as usize
}

/// Two-glyph bar for a 0-100 value.
pub fn bar(value: f64, width: usize) -> String {
    let filled = bar_fill(value, width);
    let mut out = String::with_capacity(width * BAR_FILLED.len_utf8());
    for _ in 0..filled {
        out.push(BAR_FILLED);
    }
    for _ in filled..width {
        out.push(BAR_EMPTY);
    }
    out
}

/// Glyph level for one sample, normalized against the series maximum.
pub fn spark_level(value: f64, series_max: f64) -> usize {
    if series_max <= 0.0 {
        return 0;
    }
    (((value / series_max) * 8.0) as usize).min(8)
}

/// Renders a series as one colored glyph per sample, oldest first.
///
/// Normalization is against the current series maximum, not a fixed scale;
/// an all-zero series renders a flat dim line instead of dividing by zero.
pub fn sparkline(series: &MetricSeries, tier_for: fn(f64) -> Tier) -> Line<'static> {
    let max = series.max();
    if max <= 0.0 {
        let flat: String = std::iter::repeat(SPARK_FLAT).take(series.len()).collect();
        return Line::from(Span::styled(flat, Styles::dim()));
    }

    let spans: Vec<Span> = series
        .iter()
        .map(|value| {
            let glyph = SPARK_GLYPHS[spark_level(value, max)];
            Span::styled(glyph.to_string(), tier_for(value).style())
        })
        .collect();
    Line::from(spans)
}

fn label(text: &str) -> Span<'static> {
    Span::styled(format!("{:<width$}", text, width = LABEL_WIDTH), Styles::label())
}

fn bar_row(name: &str, value: f64, trailer: String) -> Line<'static> {
    Line::from(vec![
        label(name),
        Span::styled(bar(value, BAR_WIDTH), Tier::for_load(value).style()),
        Span::styled(trailer, Styles::value()),
    ])
}

/// Content lines for one device panel.
fn panel_lines(snapshot: &DeviceSnapshot, series: &DeviceSeries) -> Vec<Line<'static>> {
    let mut lines = Vec::with_capacity(11);

    lines.push(bar_row(
        "GPU Usage:",
        snapshot.utilization,
        format!(" {:>3.0}%", snapshot.utilization),
    ));

    let memory_percent = snapshot.memory_percent();
    lines.push(bar_row(
        "Memory:",
        memory_percent,
        format!(
            " {}",
            format_memory(snapshot.memory_used, snapshot.memory_total, memory_percent)
        ),
    ));

    let heat = if snapshot.temperature > 80.0 { "HOT " } else { "TEMP" };
    lines.push(Line::from(vec![
        label("Temperature:"),
        Span::styled(
            format!("{} {:.0}°C", heat, snapshot.temperature),
            Tier::for_temperature(snapshot.temperature).style(),
        ),
    ]));

    // Power row only renders when the limit is known.
    if snapshot.power_limit > 0.0 {
        let power_percent = snapshot.power_percent();
        lines.push(Line::from(vec![
            label("Power:"),
            Span::styled(bar(power_percent, BAR_WIDTH), Tier::for_load(power_percent).style()),
            Span::styled(
                format!(" {:.1}/{:.0} W", snapshot.power_draw, snapshot.power_limit),
                Styles::value(),
            ),
        ]));
    }

    lines.push(Line::from(vec![
        label("GPU Clock:"),
        Span::styled(format!("{} MHz", snapshot.graphics_clock), Styles::clock()),
    ]));
    lines.push(Line::from(vec![
        label("Memory Clock:"),
        Span::styled(format!("{} MHz", snapshot.memory_clock), Styles::clock()),
    ]));

    // A zero fan reading also means "not reported" on some devices; the row
    // is hidden either way.
    if snapshot.fan_speed > 0.0 {
        lines.push(Line::from(vec![
            label("Fan Speed:"),
            Span::styled(
                format!("{:.0}%", snapshot.fan_speed),
                Tier::for_load(snapshot.fan_speed).style(),
            ),
        ]));
    }

    lines.push(Line::default());
    for (name, metric, tier_for) in [
        ("GPU History:", &series.utilization, Tier::for_load as fn(f64) -> Tier),
        ("Mem History:", &series.memory, Tier::for_load),
        ("Temp History:", &series.temperature, Tier::for_temperature),
    ] {
        let mut row = vec![label(name)];
        row.extend(sparkline(metric, tier_for).spans);
        lines.push(Line::from(row));
    }

    lines
}

/// Renders one device panel into `area`.
pub fn render_device(frame: &mut Frame, area: Rect, snapshot: &DeviceSnapshot, series: &DeviceSeries) {
    let title = Line::from(vec![
        Span::styled("GPU ", Style::default().add_modifier(Modifier::BOLD)),
        Span::styled(
            snapshot.index.to_string(),
            Style::default()
                .fg(Theme::TITLE_INDEX)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!(": {}", snapshot.name),
            Style::default()
                .fg(Theme::TITLE_NAME)
                .add_modifier(Modifier::BOLD),
        ),
    ]);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Theme::PANEL_BORDER))
        .title(title);

    frame.render_widget(Paragraph::new(panel_lines(snapshot, series)).block(block), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::HistoryStore;

    #[test]
    fn bar_fill_is_monotonic() {
        let values = [0.0, 10.0, 49.9, 50.0, 73.2, 80.0, 99.0, 100.0];
        let fills: Vec<usize> = values.iter().map(|v| bar_fill(*v, BAR_WIDTH)).collect();
        assert!(fills.windows(2).all(|pair| pair[0] <= pair[1]));
    }

    #[test]
    fn bar_fill_covers_full_range() {
        assert_eq!(bar_fill(0.0, 40), 0);
        assert_eq!(bar_fill(50.0, 40), 20);
        assert_eq!(bar_fill(100.0, 40), 40);
        // Out-of-range input is clamped, not wrapped.
        assert_eq!(bar_fill(-5.0, 40), 0);
        assert_eq!(bar_fill(250.0, 40), 40);
    }

    #[test]
    fn bar_has_fixed_width() {
        for value in [0.0, 33.0, 100.0] {
            assert_eq!(bar(value, 40).chars().count(), 40);
        }
    }

    #[test]
    fn spark_level_normalizes_against_series_max() {
        assert_eq!(spark_level(0.0, 100.0), 0);
        assert_eq!(spark_level(100.0, 100.0), 8);
        assert_eq!(spark_level(50.0, 100.0), 4);
        // The series maximum maps to the top glyph even for small maxima.
        assert_eq!(spark_level(5.0, 5.0), 8);
    }

    #[test]
    fn spark_level_of_zero_max_never_divides() {
        assert_eq!(spark_level(0.0, 0.0), 0);
        assert_eq!(spark_level(42.0, 0.0), 0);
    }

    #[test]
    fn all_zero_series_renders_flat_line() {
        let mut store = HistoryStore::new(1, 8);
        store.record(0, 0.0, 0.0, 0.0);
        let series = store.device(0).expect("device exists");

        let line = sparkline(&series.utilization, Tier::for_load);
        assert_eq!(line.spans.len(), 1);
        let text: String = line.spans[0].content.chars().collect();
        assert_eq!(text.chars().count(), 8);
        assert!(text.chars().all(|c| c == SPARK_FLAT));
    }

    #[test]
    fn sparkline_emits_one_glyph_per_sample() {
        let mut store = HistoryStore::new(1, 4);
        for value in [10.0, 55.0, 90.0, 20.0] {
            store.record(0, value, 0.0, 0.0);
        }
        let series = store.device(0).expect("device exists");

        let line = sparkline(&series.utilization, Tier::for_load);
        assert_eq!(line.spans.len(), 4);
        // The 90.0 sample is the series max and renders the top glyph in
        // critical color.
        assert_eq!(line.spans[2].content.as_ref(), "█");
        assert_eq!(line.spans[2].style, Tier::Critical.style());
        // The 10.0 sample is nominal.
        assert_eq!(line.spans[0].style, Tier::Nominal.style());
    }

    #[test]
    fn power_and_fan_rows_are_hidden_when_unreported() {
        let store = HistoryStore::new(1, 4);
        let series = store.device(0).expect("device exists");

        let bare = DeviceSnapshot {
            index: 0,
            name: "test".to_string(),
            power_limit: 0.0,
            fan_speed: 0.0,
            ..DeviceSnapshot::default()
        };
        let with_extras = DeviceSnapshot {
            power_draw: 100.0,
            power_limit: 200.0,
            fan_speed: 45.0,
            ..bare.clone()
        };

        let bare_lines = panel_lines(&bare, series);
        let full_lines = panel_lines(&with_extras, series);
        assert_eq!(full_lines.len(), bare_lines.len() + 2);
    }
}
