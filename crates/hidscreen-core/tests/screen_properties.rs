//! Property tests for the screen renderers and report encoding.
//!
//! These tests drive the public API with generated inputs and check the
//! width invariants the keyboard firmware depends on: every complete screen
//! is exactly 84 one-byte characters, and every line is exactly 21.

use hidscreen_core::{
    decode_screen_selection, format_performance_screen, format_stock_screen,
    format_weather_screen, frame_reports, title_glyph, PerfStat, WeatherFields, LINE_WIDTH,
    SCREEN_LEN,
};
use proptest::prelude::*;

fn perf_stats(cpu: f64, ram: f64, vol: f64, bat: f64) -> Vec<PerfStat> {
    vec![
        PerfStat::new("CPU:", cpu),
        PerfStat::new("RAM:", ram),
        PerfStat::new("VOL:", vol),
        PerfStat::new("BAT:", bat),
    ]
}

fn line_widths(text: &str) -> Vec<usize> {
    let chars: Vec<char> = text.chars().collect();
    chars.chunks(LINE_WIDTH).map(|c| c.len()).collect()
}

proptest! {
    #[test]
    fn performance_screen_is_always_84_characters(
        cpu in 0.0f64..=100.0,
        ram in 0.0f64..=100.0,
        vol in 0.0f64..=100.0,
        bat in 0.0f64..=100.0,
    ) {
        let screen = format_performance_screen(&perf_stats(cpu, ram, vol, bat)).unwrap();
        prop_assert_eq!(screen.char_len(), SCREEN_LEN);
        prop_assert!(frame_reports(&screen).is_ok());
    }

    #[test]
    fn performance_screen_width_holds_for_any_label_width(
        width in 1usize..=17,
        percent in 0.0f64..=100.0,
    ) {
        let label = "L".repeat(width);
        let stats: Vec<PerfStat> = (0..4).map(|_| PerfStat::new(label.clone(), percent)).collect();
        let screen = format_performance_screen(&stats).unwrap();
        prop_assert_eq!(screen.char_len(), SCREEN_LEN);
    }

    #[test]
    fn stock_lines_are_always_21_characters(
        quotes in proptest::collection::vec(("[A-Z]{1,5}", "[0-9]{1,12}\\.[0-9]{2}"), 0..=4),
    ) {
        let screen = format_stock_screen(&quotes);
        prop_assert_eq!(screen.char_len(), LINE_WIDTH * quotes.len());
        for (line, width) in line_widths(screen.as_str()).into_iter().enumerate() {
            prop_assert_eq!(width, LINE_WIDTH, "line {} has the wrong width", line);
        }
        // The price column always ends at column 16, followed by the divider.
        let chars: Vec<char> = screen.as_str().chars().collect();
        for line in 0..quotes.len() {
            prop_assert_eq!(chars[line * LINE_WIDTH + 16], '|');
            prop_assert_eq!(chars[line * LINE_WIDTH + 19], title_glyph(line, 1));
        }
    }

    #[test]
    fn weather_screen_is_always_84_characters(
        description in "[A-Za-z ]{0,20}",
        now in "-?[0-9]{1,3}",
        high in "-?[0-9]{1,3}",
        rain in "[0-9]{1,3}",
    ) {
        let screen = format_weather_screen(&WeatherFields {
            description,
            temp_now: now,
            temp_high: high,
            rain,
        });
        prop_assert_eq!(screen.char_len(), SCREEN_LEN);
    }

    #[test]
    fn selection_is_valid_index_or_ignored(first in any::<u8>(), count in 1usize..=8) {
        match decode_screen_selection(&[first], count) {
            Some(index) => prop_assert!(index < count),
            None => prop_assert!(first == 0 || usize::from(first) > count),
        }
    }
}

#[test]
fn title_glyph_sentinel_for_fourth_line() {
    for title_index in 0..=2u8 {
        assert_eq!(title_glyph(3, title_index), '\u{00DE}');
    }
}
