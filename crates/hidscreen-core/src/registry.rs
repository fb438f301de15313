//! ScreenRegistry: the latest rendered screen for each screen index.
//!
//! The registry is a fixed-length table.  Slot `i` always holds exactly one
//! [`Screen`]; slots start as the empty placeholder and are overwritten
//! wholesale whenever the matching monitor source produces a new frame.

use thiserror::Error;

use crate::screen::Screen;

/// Error type for registry updates.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("screen index {index} out of range (registry holds {len})")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Fixed-length table of screens keyed by source index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenRegistry {
    screens: Vec<Screen>,
}

impl ScreenRegistry {
    /// Creates a registry with `len` empty placeholder slots.
    pub fn new(len: usize) -> Self {
        Self {
            screens: vec![Screen::empty(); len],
        }
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        self.screens.len()
    }

    /// `true` when the registry has no slots at all.
    pub fn is_empty(&self) -> bool {
        self.screens.is_empty()
    }

    /// Replaces the screen in slot `index`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::IndexOutOfRange`] if `index >= len()`.
    pub fn set(&mut self, index: usize, screen: Screen) -> Result<(), RegistryError> {
        let len = self.screens.len();
        let slot = self
            .screens
            .get_mut(index)
            .ok_or(RegistryError::IndexOutOfRange { index, len })?;
        *slot = screen;
        Ok(())
    }

    /// Returns the screen in slot `index`, if it exists.
    pub fn get(&self, index: usize) -> Option<&Screen> {
        self.screens.get(index)
    }

    /// Iterates over all slots in index order.
    pub fn iter(&self) -> impl Iterator<Item = &Screen> {
        self.screens.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_registry_holds_empty_placeholders() {
        // Arrange / Act
        let registry = ScreenRegistry::new(3);

        // Assert
        assert_eq!(registry.len(), 3);
        assert!(registry.iter().all(|s| *s == Screen::empty()));
    }

    #[test]
    fn test_set_replaces_only_target_slot() {
        // Arrange
        let mut registry = ScreenRegistry::new(3);

        // Act
        registry.set(1, Screen::new("stocks")).expect("set");

        // Assert
        assert_eq!(registry.get(1), Some(&Screen::new("stocks")));
        assert_eq!(registry.get(0), Some(&Screen::empty()));
        assert_eq!(registry.get(2), Some(&Screen::empty()));
    }

    #[test]
    fn test_set_out_of_range_is_rejected_and_leaves_registry_unchanged() {
        // Arrange
        let mut registry = ScreenRegistry::new(3);

        // Act
        let result = registry.set(3, Screen::new("x"));

        // Assert
        assert_eq!(result, Err(RegistryError::IndexOutOfRange { index: 3, len: 3 }));
        assert_eq!(registry, ScreenRegistry::new(3));
    }

    #[test]
    fn test_get_out_of_range_returns_none() {
        assert!(ScreenRegistry::new(3).get(7).is_none());
    }
}
