//! Title glyph lookup.
//!
//! The keyboard font reserves a block of tiles that, drawn in the right
//! column of each line, spell out a small icon for the active screen.  Tile
//! codes step by 32 per line and shift down by one per screen family, so
//! line `i` of family `t` lives at `(0x9A - t) + i * 32`.  The fourth line
//! always uses the shared bottom tile [`TITLE_SENTINEL`].

/// Font tile used for the fourth line of every screen family.
pub const TITLE_SENTINEL: char = '\u{00DE}';

/// Base tile code for line 0 of family 0.
const TITLE_BASE: u32 = 0x9A;

/// Stride between lines in the font table.
const TITLE_LINE_STRIDE: u32 = 32;

/// Returns the title tile for line `line` of screen family `title_index`.
///
/// `line == 3` always yields [`TITLE_SENTINEL`].  For lines 0–2 the code is
/// `(0x9A - title_index) + line * 32`.  Families 0–2 are the only ones the
/// firmware ships tiles for.  A `title_index` above `0x9A` has no tile code
/// and yields [`TITLE_SENTINEL`].
pub fn title_glyph(line: usize, title_index: u8) -> char {
    if line == 3 {
        return TITLE_SENTINEL;
    }

    TITLE_BASE
        .checked_sub(u32::from(title_index))
        .and_then(|base| u32::try_from(line).ok()?.checked_mul(TITLE_LINE_STRIDE)?.checked_add(base))
        .and_then(char::from_u32)
        .unwrap_or(TITLE_SENTINEL)
}
