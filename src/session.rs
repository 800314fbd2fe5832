//! Placement session state: the explicit Idle / Armed / MoveArmed machine.
//!
//! Armed item and move target are one `Mode` value instead of two
//! independently settable fields, so the "both set at once" class of bugs is
//! unrepresentable: arming replaces a pending move and vice versa.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use crate::catalog::PaletteItem;
use crate::consts::{METADATA_SAVE_DEBOUNCE_MS, SAVED_INDICATOR_MS};
use crate::layer::EntityId;

/// What the next map click will do.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Mode {
    /// Clicks select the nearest feature, or nothing.
    #[default]
    Idle,
    /// The next click instantiates this catalog item.
    Armed(PaletteItem),
    /// The next click relocates this feature.
    MoveArmed(EntityId),
}

/// Transient UI/session state for the palette.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacementSession {
    /// Panel visibility.
    pub open: bool,
    /// Pending click intent.
    pub mode: Mode,
    /// The currently highlighted feature, if any.
    pub selected_id: Option<EntityId>,
}

impl Default for PlacementSession {
    fn default() -> Self {
        Self { open: true, mode: Mode::Idle, selected_id: None }
    }
}

impl PlacementSession {
    /// Fresh session: panel open, idle, nothing selected.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm `item` for placement on the next click. Replaces any pending
    /// move.
    pub fn arm(&mut self, item: PaletteItem) {
        self.mode = Mode::Armed(item);
    }

    /// Arm relocation of `id` and highlight it so the operator sees which
    /// feature the next click will move. Replaces any armed item.
    pub fn start_move(&mut self, id: EntityId) {
        self.selected_id = Some(id.clone());
        self.mode = Mode::MoveArmed(id);
    }

    /// Back to idle, keeping the selection.
    pub fn disarm(&mut self) {
        self.mode = Mode::Idle;
    }

    /// Change (or clear) the highlighted feature.
    pub fn select(&mut self, id: Option<EntityId>) {
        self.selected_id = id;
    }

    /// Show/hide the panel.
    pub fn toggle_open(&mut self) {
        self.open = !self.open;
    }
}

/// Debounce guard for metadata saves. The caller supplies the clock (ms, any
/// monotonic origin) so the crate stays timer-free and testable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveDebounce {
    last_save_ms: Option<u64>,
}

impl SaveDebounce {
    /// Guard that has never seen a save.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a save may proceed at `now_ms`; records it when it may.
    /// Duplicate submissions inside the debounce window are swallowed.
    pub fn try_save(&mut self, now_ms: u64) -> bool {
        match self.last_save_ms {
            Some(last) if now_ms.saturating_sub(last) < METADATA_SAVE_DEBOUNCE_MS => false,
            _ => {
                self.last_save_ms = Some(now_ms);
                true
            }
        }
    }

    /// Whether the transient "saved" indicator is still visible at `now_ms`.
    #[must_use]
    pub fn indicator_visible(&self, now_ms: u64) -> bool {
        self.last_save_ms
            .is_some_and(|last| now_ms.saturating_sub(last) < SAVED_INDICATOR_MS)
    }
}
