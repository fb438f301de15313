//! Screen renderers: source data in, 84-character [`Screen`] out.
//!
//! Every renderer here is a pure function.  Each produces four 21-column
//! lines laid out as a data column on the left, a `|` divider, and a title
//! tile on the right:
//!
//! ```text
//! CPU: ■■■■■■        |▚      performance (title family 0)
//! MSFT : $412.30  |  ▚      stock       (title family 1)
//! desc: Sunny     |  ▚      weather     (title family 2)
//! ```
//!
//! The width arithmetic is exact: every line is padded or truncated so the
//! concatenated screen is exactly [`SCREEN_LEN`] characters.  A performance
//! label set that cannot fit is a configuration bug and is reported as a
//! [`FormatError`] rather than silently producing a frame the keyboard would
//! refuse.

use thiserror::Error;

use super::glyph::title_glyph;
use super::{Screen, ScreenKind, LINE_COUNT, LINE_WIDTH, SCREEN_LEN};

/// Font tile drawn for a filled bar-graph cell.
pub const BAR_FILLED: char = '\u{0008}';

/// Width of the text column on stock and weather lines, before `|`.
const STOCK_COLUMN_WIDTH: usize = 16;

/// Width of a padded symbol on a stock line.
const STOCK_SYMBOL_WIDTH: usize = 5;

/// Width of a weather value (including the `%` on the rain line).
const WEATHER_VALUE_WIDTH: usize = 9;

/// Characters a performance line spends outside the bar: the space after the
/// label, the `|` divider, and the title tile.
const PERF_LINE_OVERHEAD: usize = 3;

/// Errors raised by renderers whose input cannot fill a complete screen.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormatError {
    /// The renderer needs one entry per display line.
    #[error("expected {expected} entries, got {actual}")]
    LineCount { expected: usize, actual: usize },

    /// A label leaves no room for the bar graph.
    #[error("label {label:?} is too wide: at most {max} characters fit")]
    LabelTooWide { label: String, max: usize },
}

/// One bar-graph row on the performance screen.
#[derive(Debug, Clone, PartialEq)]
pub struct PerfStat {
    /// Short label such as `"CPU:"`.
    pub label: String,
    /// Usage in percent.  Values outside `0..=100` are clamped; non-finite
    /// values render as an empty bar.
    pub percent: f64,
}

impl PerfStat {
    /// Creates a row from a label and a percentage.
    pub fn new(label: impl Into<String>, percent: f64) -> Self {
        Self {
            label: label.into(),
            percent,
        }
    }
}

/// Current conditions as displayed on the weather screen.
///
/// `description` is the already-windowed text (see
/// [`super::scroll::DescriptionScroller`]); the other fields are shown as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WeatherFields {
    pub description: String,
    pub temp_now: String,
    pub temp_high: String,
    /// Precipitation probability without the `%` sign.
    pub rain: String,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Renders the performance screen: one labelled bar graph per line.
///
/// With `max_label` the widest label, each bar is `21 - max_label - 3`
/// cells wide and `ceil(bar_width * percent / 100)` of them are filled.
///
/// # Errors
///
/// Returns [`FormatError::LineCount`] unless exactly four rows are given, and
/// [`FormatError::LabelTooWide`] if a label leaves no room for the bar.
pub fn format_performance_screen(stats: &[PerfStat]) -> Result<Screen, FormatError> {
    if stats.len() != LINE_COUNT {
        return Err(FormatError::LineCount {
            expected: LINE_COUNT,
            actual: stats.len(),
        });
    }

    let max_label = stats
        .iter()
        .map(|s| s.label.chars().count())
        .max()
        .unwrap_or(0);
    let max_allowed = LINE_WIDTH - PERF_LINE_OVERHEAD - 1;
    if max_label > max_allowed {
        let widest = stats
            .iter()
            .find(|s| s.label.chars().count() == max_label)
            .map(|s| s.label.clone())
            .unwrap_or_default();
        return Err(FormatError::LabelTooWide {
            label: widest,
            max: max_allowed,
        });
    }
    let bar_width = LINE_WIDTH - max_label - PERF_LINE_OVERHEAD;

    let mut out = String::with_capacity(SCREEN_LEN * 2);
    for (line, stat) in stats.iter().enumerate() {
        let filled = filled_cells(bar_width, stat.percent);
        out.push_str(&pad_to(&stat.label, max_label));
        out.push(' ');
        out.extend(std::iter::repeat(BAR_FILLED).take(filled));
        out.extend(std::iter::repeat(' ').take(bar_width - filled));
        out.push('|');
        out.push(title_glyph(line, ScreenKind::Performance.title_index()));
    }

    Ok(Screen::new(out))
}

/// Renders the stock screen: one `SYMBL: $price` line per quote, in order.
///
/// Each line is the symbol padded to 5, `": $"`, and the price, fitted to a
/// 16-character column, then `"|  "`, the title tile, and a trailing space
/// (21 characters).  Four quotes fill a complete screen; fewer produce an
/// incomplete screen that the write path will not send.
pub fn format_stock_screen<S, P>(quotes: &[(S, P)]) -> Screen
where
    S: AsRef<str>,
    P: AsRef<str>,
{
    let mut out = String::with_capacity(SCREEN_LEN * 2);
    for (line, (symbol, price)) in quotes.iter().enumerate() {
        let column = format!(
            "{:<width$}: ${}",
            symbol.as_ref(),
            price.as_ref(),
            width = STOCK_SYMBOL_WIDTH
        );
        out.push_str(&pad_to(&column, STOCK_COLUMN_WIDTH));
        out.push_str("|  ");
        out.push(title_glyph(line, ScreenKind::Stock.title_index()));
        out.push(' ');
    }
    Screen::new(out)
}

/// Renders the weather screen from four fields.
///
/// Each line is `"<name>: "`, the value fitted to 9 characters, `" |  "`, the
/// title tile, and a space.
pub fn format_weather_screen(weather: &WeatherFields) -> Screen {
    let rain = format!("{}%", weather.rain);
    let rows = [
        ("desc", weather.description.as_str()),
        ("temp", weather.temp_now.as_str()),
        ("high", weather.temp_high.as_str()),
        ("rain", rain.as_str()),
    ];

    let mut out = String::with_capacity(SCREEN_LEN * 2);
    for (line, (name, value)) in rows.iter().enumerate() {
        out.push_str(name);
        out.push_str(": ");
        out.push_str(&pad_to(value, WEATHER_VALUE_WIDTH));
        out.push_str(" |  ");
        out.push(title_glyph(line, ScreenKind::Weather.title_index()));
        out.push(' ');
    }
    Screen::new(out)
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Number of filled cells for `percent` on a bar `width` cells wide.
fn filled_cells(width: usize, percent: f64) -> usize {
    let percent = if percent.is_finite() {
        percent.clamp(0.0, 100.0)
    } else {
        0.0
    };
    let filled = (width as f64 * percent / 100.0).ceil() as usize;
    filled.min(width)
}

/// Truncates or space-pads `text` to exactly `width` characters.
fn pad_to(text: &str, width: usize) -> String {
    let mut out: String = text.chars().take(width).collect();
    let len = out.chars().count();
    out.extend(std::iter::repeat(' ').take(width - len));
    out
}

// ── Tests ─────────────────────────────────────────────────────────────────────
