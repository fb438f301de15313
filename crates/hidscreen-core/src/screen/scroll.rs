//! Marquee scrolling for the weather description.
//!
//! The weather description column is only 9 characters wide.  When the same
//! long description ("PartlyCloudyRain") comes back on consecutive refreshes,
//! the column scrolls through it one character per refresh and then starts
//! again from the beginning.  A new description always starts unscrolled.

/// Width of the visible description window.
pub const DESCRIPTION_WINDOW: usize = 9;

/// Scroll state carried between weather refreshes.
#[derive(Debug, Clone)]
pub struct DescriptionScroller {
    last: Option<String>,
    /// Offset of the window shown on the previous refresh.  `-1` means the
    /// next repeat shows offset 0.
    cursor: isize,
}

impl Default for DescriptionScroller {
    fn default() -> Self {
        Self::new()
    }
}

impl DescriptionScroller {
    /// Creates a scroller that has not seen any description yet.
    pub fn new() -> Self {
        Self {
            last: None,
            cursor: 0,
        }
    }

    /// Returns the window of `description` to display for this refresh and
    /// advances the scroll state.
    ///
    /// - Different from the previous description (or the first call): the
    ///   cursor resets to 0 and the first 9 characters are shown.
    /// - Same description, 9 characters or fewer: shown whole.
    /// - Same description, longer than 9: the cursor advances by one and the
    ///   9-character window at the cursor is shown.  Once the window reaches
    ///   the end of the text, the next repeat starts over at offset 0.
    pub fn window(&mut self, description: &str) -> String {
        let chars: Vec<char> = description.chars().collect();
        let repeated = self.last.as_deref() == Some(description);

        let shown = if repeated && chars.len() > DESCRIPTION_WINDOW {
            self.cursor += 1;
            let start = self.cursor.max(0) as usize;
            let window: String = chars[start..start + DESCRIPTION_WINDOW].iter().collect();
            if start + DESCRIPTION_WINDOW >= chars.len() {
                self.cursor = -1;
            }
            window
        } else {
            self.cursor = 0;
            chars.iter().take(DESCRIPTION_WINDOW).collect()
        };

        self.last = Some(description.to_string());
        shown
    }
}
