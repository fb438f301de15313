//! The screen model: an 84-character frame for the keyboard's OLED panel.
//!
//! # Why 84 characters?
//!
//! The panel driven by the keyboard firmware is a 128×32 OLED with a 6×8
//! font, which gives 4 rows of 21 columns.  The firmware keeps a flat
//! 84-byte buffer and paints it row by row, so the host always deals in whole
//! frames: a screen is either exactly 84 characters ("complete") or it is not
//! sent at all.
//!
//! # One-byte characters
//!
//! The firmware's font is indexed by byte value, and several glyphs live
//! above 0x7F (the title tiles at 0x98–0xFA, the sentinel at 0xDE).  Rust
//! strings are UTF-8, so a [`Screen`] stores a `String` whose characters are
//! all in `U+0000..=U+00FF` and converts each character to its code point when
//! encoding.  A character above `U+00FF` cannot be encoded and is reported as
//! [`ScreenError::Unencodable`].

pub mod format;
pub mod glyph;
pub mod scroll;

use std::fmt;

use thiserror::Error;

/// Number of character columns on one display line.
pub const LINE_WIDTH: usize = 21;

/// Number of display lines.
pub const LINE_COUNT: usize = 4;

/// Total number of characters in a complete screen.
pub const SCREEN_LEN: usize = LINE_WIDTH * LINE_COUNT;

/// Errors raised when converting a [`Screen`] into raw font bytes.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScreenError {
    /// The screen does not hold exactly [`SCREEN_LEN`] characters.
    #[error("screen is incomplete: {len} of {SCREEN_LEN} characters")]
    Incomplete { len: usize },

    /// A character has no single-byte font code.
    #[error("character {ch:?} at position {position} has no one-byte font code")]
    Unencodable { ch: char, position: usize },
}

/// The screen families the host knows how to render.
///
/// The discriminant doubles as the registry index and as the `titleIndex`
/// passed to [`glyph::title_glyph`], which is how the keyboard knows which
/// icon set to draw beside each line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScreenKind {
    /// CPU, RAM, volume, and battery bar graphs.
    Performance = 0,
    /// Cached stock quotes.
    Stock = 1,
    /// Current conditions, temperature, high, and rain chance.
    Weather = 2,
}

impl ScreenKind {
    /// All kinds in registry order.
    pub const ALL: [ScreenKind; 3] = [ScreenKind::Performance, ScreenKind::Stock, ScreenKind::Weather];

    /// Registry slot for this kind.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Title-glyph family for this kind.
    pub fn title_index(self) -> u8 {
        self as u8
    }
}

/// A rendered frame for the OLED panel.
///
/// Screens are values: a monitor source produces a new one on every refresh
/// and the old one is replaced wholesale.  Equality is plain string equality,
/// which is what the write path uses to suppress redundant transmissions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Screen(String);

impl Screen {
    /// Creates the empty placeholder screen (never complete).
    pub fn empty() -> Self {
        Self(String::new())
    }

    /// Wraps an already-rendered string.
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Returns the rendered text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number of characters (not bytes) in the screen.
    pub fn char_len(&self) -> usize {
        self.0.chars().count()
    }

    /// `true` when the screen holds exactly [`SCREEN_LEN`] characters.
    pub fn is_complete(&self) -> bool {
        self.char_len() == SCREEN_LEN
    }

    /// Converts the screen into the raw font bytes the firmware expects.
    ///
    /// # Errors
    ///
    /// Returns [`ScreenError::Incomplete`] if the screen is not exactly
    /// [`SCREEN_LEN`] characters, or [`ScreenError::Unencodable`] if a
    /// character lies above `U+00FF`.
    pub fn encode(&self) -> Result<[u8; SCREEN_LEN], ScreenError> {
        let len = self.char_len();
        if len != SCREEN_LEN {
            return Err(ScreenError::Incomplete { len });
        }

        let mut bytes = [0u8; SCREEN_LEN];
        for (position, ch) in self.0.chars().enumerate() {
            bytes[position] =
                u8::try_from(u32::from(ch)).map_err(|_| ScreenError::Unencodable { ch, position })?;
        }
        Ok(bytes)
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Screen {
    fn from(text: String) -> Self {
        Self(text)
    }
}

impl From<&str> for Screen {
    fn from(text: &str) -> Self {
        Self(text.to_string())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_screen_is_not_complete() {
        assert!(!Screen::empty().is_complete());
        assert_eq!(Screen::empty().char_len(), 0);
    }

    #[test]
    fn test_screen_of_84_ascii_characters_is_complete() {
        // Arrange
        let screen = Screen::new("x".repeat(SCREEN_LEN));

        // Assert
        assert!(screen.is_complete());
    }

    #[test]
    fn test_char_len_counts_characters_not_utf8_bytes() {
        // Arrange – U+00DE takes two bytes in UTF-8 but is one panel cell
        let screen = Screen::new("\u{00DE}".repeat(SCREEN_LEN));

        // Assert
        assert_eq!(screen.as_str().len(), SCREEN_LEN * 2);
        assert!(screen.is_complete());
    }

    #[test]
    fn test_encode_maps_each_character_to_its_code_point() {
        // Arrange
        let mut text = "a".repeat(SCREEN_LEN - 2);
        text.push('\u{0008}');
        text.push('\u{00DE}');
        let screen = Screen::new(text);

        // Act
        let bytes = screen.encode().expect("encode");

        // Assert
        assert_eq!(bytes[0], b'a');
        assert_eq!(bytes[SCREEN_LEN - 2], 0x08);
        assert_eq!(bytes[SCREEN_LEN - 1], 0xDE);
    }

    #[test]
    fn test_encode_rejects_incomplete_screen() {
        let screen = Screen::new("short");
        assert_eq!(screen.encode(), Err(ScreenError::Incomplete { len: 5 }));
    }

    #[test]
    fn test_encode_rejects_characters_above_latin1() {
        // Arrange
        let mut text = "a".repeat(SCREEN_LEN - 1);
        text.push('€');
        let screen = Screen::new(text);

        // Act
        let result = screen.encode();

        // Assert
        assert_eq!(
            result,
            Err(ScreenError::Unencodable {
                ch: '€',
                position: SCREEN_LEN - 1
            })
        );
    }

    #[test]
    fn test_screen_kind_indices_follow_registry_order() {
        assert_eq!(ScreenKind::Performance.index(), 0);
        assert_eq!(ScreenKind::Stock.index(), 1);
        assert_eq!(ScreenKind::Weather.index(), 2);
        assert_eq!(ScreenKind::ALL.len(), 3);
    }
}
