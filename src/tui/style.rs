//! Color scheme and severity classification.

use ratatui::style::{Color, Modifier, Style};

/// Severity tier for a metric value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Nominal,
    Warning,
    Critical,
}

impl Tier {
    /// Load-type metrics: utilization, memory percent, power percent, fan
    /// percent all share the same pair.
    pub fn for_load(value: f64) -> Self {
        Self::classify(value, 50.0, 80.0)
    }

    /// Temperature uses a lower warning bound; thermal headroom differs
    /// from load headroom.
    pub fn for_temperature(value: f64) -> Self {
        Self::classify(value, 65.0, 80.0)
    }

    fn classify(value: f64, warn: f64, crit: f64) -> Self {
        if value > crit {
            Tier::Critical
        } else if value > warn {
            Tier::Warning
        } else {
            Tier::Nominal
        }
    }

    pub fn color(self) -> Color {
        match self {
            Tier::Nominal => Color::Green,
            Tier::Warning => Color::Yellow,
            Tier::Critical => Color::Red,
        }
    }

    pub fn style(self) -> Style {
        Style::default().fg(self.color())
    }
}

/// Dashboard color palette.
pub struct Theme;

impl Theme {
    pub const PANEL_BORDER: Color = Color::LightBlue;
    pub const SYSTEM_BORDER: Color = Color::Green;
    pub const ERROR: Color = Color::Red;
    pub const LABEL: Color = Color::Cyan;
    pub const VALUE: Color = Color::White;
    pub const CLOCK: Color = Color::LightBlue;
    pub const FG_DIM: Color = Color::DarkGray;
    pub const TITLE_NAME: Color = Color::Cyan;
    pub const TITLE_INDEX: Color = Color::Yellow;
    pub const TABLE_HEADER: Color = Color::Magenta;
}

/// Pre-defined styles.
pub struct Styles;

impl Styles {
    /// Row label ("GPU Usage:", "Driver:").
    pub fn label() -> Style {
        Style::default()
            .fg(Theme::LABEL)
            .add_modifier(Modifier::BOLD)
    }

    /// Plain value text.
    pub fn value() -> Style {
        Style::default().fg(Theme::VALUE)
    }

    /// Clock readings.
    pub fn clock() -> Style {
        Style::default().fg(Theme::CLOCK)
    }

    /// Dimmed text (flat sparklines, placeholder rows).
    pub fn dim() -> Style {
        Style::default().fg(Theme::FG_DIM)
    }

    /// Inline error text.
    pub fn error() -> Style {
        Style::default()
            .fg(Theme::ERROR)
            .add_modifier(Modifier::BOLD)
    }

    /// Process table header.
    pub fn table_header() -> Style {
        Style::default()
            .fg(Theme::TABLE_HEADER)
            .add_modifier(Modifier::BOLD)
    }

    /// Help line at the bottom of the screen.
    pub fn help() -> Style {
        Style::default().fg(Theme::FG_DIM)
    }
}
