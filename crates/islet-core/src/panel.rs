//! Panel state machine — the single owner of `{expanded, pinned, visible}`.
//!
//! Only the control loop mutates this; everything downstream learns about
//! changes through the returned [`PanelTransition`]s.  Every operation is
//! idempotent: re-requesting the current state returns nothing, so the
//! sizing driver never re-animates on redundant signals.

use serde::{Deserialize, Serialize};

/// How the panel reacts to the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InteractionMode {
    /// Expand when the pointer enters the trigger zone, collapse when it
    /// leaves both the zone and the panel frame.
    Hover,
    /// Expand only on an explicit click; the pointer can only collapse.
    ClickToExpand,
}

impl InteractionMode {
    /// Map the persisted `require_click_to_expand` preference.
    pub fn from_require_click(require_click: bool) -> Self {
        if require_click {
            InteractionMode::ClickToExpand
        } else {
            InteractionMode::Hover
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelState {
    pub expanded: bool,
    pub pinned: bool,
    pub visible: bool,
}

impl Default for PanelState {
    fn default() -> Self {
        // The pill starts visible and collapsed.
        Self {
            expanded: false,
            pinned: false,
            visible: true,
        }
    }
}

/// A state change that actually happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelTransition {
    ExpansionChanged(bool),
    PinnedChanged(bool),
    VisibilityChanged(bool),
}

/// Owns [`PanelState`] for the process lifetime.  `rev` increases on every
/// real transition.
#[derive(Debug, Default)]
pub struct PanelStateMachine {
    state: PanelState,
    rev: u64,
}

impl PanelStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PanelState {
        self.state
    }

    pub fn rev(&self) -> u64 {
        self.rev
    }

    /// Expand if not already expanded.
    pub fn request_expand(&mut self) -> Option<PanelTransition> {
        if self.state.expanded {
            return None;
        }
        self.state.expanded = true;
        self.rev += 1;
        Some(PanelTransition::ExpansionChanged(true))
    }

    /// Collapse unless pinned.  A pinned panel refuses the request outright:
    /// no state change, no event.
    pub fn request_collapse(&mut self) -> Option<PanelTransition> {
        if self.state.pinned || !self.state.expanded {
            return None;
        }
        self.state.expanded = false;
        self.rev += 1;
        Some(PanelTransition::ExpansionChanged(false))
    }

    /// Flip the pin.  Pin-on forces expansion (invariant: pinned ⇒ expanded);
    /// pin-off leaves the panel expanded and lets the next pointer pass
    /// decide.
    pub fn toggle_pin(&mut self) -> Vec<PanelTransition> {
        self.state.pinned = !self.state.pinned;
        self.rev += 1;
        let mut out = vec![PanelTransition::PinnedChanged(self.state.pinned)];
        if self.state.pinned {
            if let Some(t) = self.request_expand() {
                out.push(t);
            }
        }
        out
    }

    /// Show or hide the pill.  Visibility is independent of expansion.
    pub fn set_visible(&mut self, visible: bool) -> Option<PanelTransition> {
        if self.state.visible == visible {
            return None;
        }
        self.state.visible = visible;
        self.rev += 1;
        Some(PanelTransition::VisibilityChanged(visible))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expand_is_idempotent() {
        let mut sm = PanelStateMachine::new();
        assert_eq!(
            sm.request_expand(),
            Some(PanelTransition::ExpansionChanged(true))
        );
        // Second request: no event, no rev bump.
        let rev = sm.rev();
        assert_eq!(sm.request_expand(), None);
        assert_eq!(sm.rev(), rev);
        assert!(sm.state().expanded);
    }

    #[test]
    fn collapse_refused_while_pinned() {
        let mut sm = PanelStateMachine::new();
        let ts = sm.toggle_pin();
        assert!(ts.contains(&PanelTransition::PinnedChanged(true)));
        assert!(ts.contains(&PanelTransition::ExpansionChanged(true)));

        assert_eq!(sm.request_collapse(), None);
        assert!(sm.state().expanded);
        assert!(sm.state().pinned);
    }

    #[test]
    fn pin_off_does_not_collapse() {
        let mut sm = PanelStateMachine::new();
        sm.toggle_pin();
        let ts = sm.toggle_pin();
        assert_eq!(ts, vec![PanelTransition::PinnedChanged(false)]);
        // Still expanded until the next evaluator pass says otherwise.
        assert!(sm.state().expanded);
        assert_eq!(
            sm.request_collapse(),
            Some(PanelTransition::ExpansionChanged(false))
        );
    }

    #[test]
    fn pin_while_expanded_emits_only_pin_change() {
        let mut sm = PanelStateMachine::new();
        sm.request_expand();
        let ts = sm.toggle_pin();
        assert_eq!(ts, vec![PanelTransition::PinnedChanged(true)]);
    }

    #[test]
    fn collapse_when_already_collapsed_is_noop() {
        let mut sm = PanelStateMachine::new();
        assert_eq!(sm.request_collapse(), None);
        assert_eq!(sm.rev(), 0);
    }

    #[test]
    fn visibility_is_independent_of_expansion() {
        let mut sm = PanelStateMachine::new();
        sm.request_expand();
        assert_eq!(
            sm.set_visible(false),
            Some(PanelTransition::VisibilityChanged(false))
        );
        assert!(sm.state().expanded);
        assert_eq!(sm.set_visible(false), None);
    }

    #[test]
    fn mode_from_preference() {
        assert_eq!(
            InteractionMode::from_require_click(true),
            InteractionMode::ClickToExpand
        );
        assert_eq!(
            InteractionMode::from_require_click(false),
            InteractionMode::Hover
        );
    }
}
