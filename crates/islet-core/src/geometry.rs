//! Screen geometry and the hover trigger-zone evaluator.
//!
//! Coordinates are Quartz-style: origin at the bottom-left of the primary
//! display, y grows upward.  The top edge of the screen is `screen.max_y()`.

use crate::panel::InteractionMode;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned rectangle.  `x`/`y` is the bottom-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub const ZERO: Rect = Rect {
        x: 0.0,
        y: 0.0,
        width: 0.0,
        height: 0.0,
    };

    pub fn max_x(&self) -> f64 {
        self.x + self.width
    }

    pub fn max_y(&self) -> f64 {
        self.y + self.height
    }

    pub fn mid_x(&self) -> f64 {
        self.x + self.width / 2.0
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x < self.max_x() && p.y >= self.y && p.y < self.max_y()
    }
}

/// The hover band at the top of the screen.  Fixed-pixel half-width rather
/// than a fraction of the screen: on wide displays a fractional band reaches
/// far outside the panel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriggerZone {
    /// Band height, measured down from the top screen edge.
    pub height: f64,
    /// Half-width of the band, centered on the screen's horizontal midpoint.
    pub half_width: f64,
}

impl TriggerZone {
    pub fn new(height: f64, half_width: f64) -> Self {
        Self { height, half_width }
    }

    /// True when `p` lies inside the band on `screen`.
    pub fn contains(&self, p: Point, screen: Rect) -> bool {
        let from_top = screen.max_y() - p.y;
        if from_top < 0.0 || from_top > self.height {
            return false;
        }
        (p.x - screen.mid_x()).abs() < self.half_width
    }
}

/// What a pointer sample asks of the state machine.
///
/// `Hold` exists for click-to-expand mode: a pointer inside the panel frame
/// must neither expand a collapsed pill nor collapse an expanded card.
/// Hover mode never produces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpansionDecision {
    Expand,
    Collapse,
    Hold,
}

/// Reduce one pointer sample to an expansion decision.
///
/// Pure and stateless; `pinned` must be the value at evaluation time, not a
/// cached copy from when the sample was taken.
pub fn evaluate(
    pointer: Point,
    panel_frame: Rect,
    screen: Rect,
    pinned: bool,
    mode: InteractionMode,
    zone: TriggerZone,
) -> ExpansionDecision {
    if pinned {
        return ExpansionDecision::Expand;
    }

    match mode {
        InteractionMode::Hover => {
            if zone.contains(pointer, screen) || panel_frame.contains(pointer) {
                ExpansionDecision::Expand
            } else {
                ExpansionDecision::Collapse
            }
        }
        // Expansion only ever comes from an explicit click; the pointer can
        // only ask to collapse, and only once it has left the frame.
        InteractionMode::ClickToExpand => {
            if panel_frame.contains(pointer) {
                ExpansionDecision::Hold
            } else {
                ExpansionDecision::Collapse
            }
        }
    }
}
