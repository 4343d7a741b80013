//! Bounded scalar that moves in coarser steps the larger it gets
//!
//! Used for every "hold a bracket key to adjust a radius/distance" control.
//!
//! | value (up)      | step        | value (down)    | step        |
//! |-----------------|-------------|-----------------|-------------|
//! | v >= 250        | +50         | v >= 250        | -50         |
//! | 100 <= v < 250  | +10         | 100 <= v < 250  | -10         |
//! | 10 <= v < 100   | +5          | 10 <= v < 100   | -5          |
//! | 1 <= v < 10     | +1          | 1 < v < 10      | -1          |
//! | 0.2 <= v < 1    | +0.2        | 0.21 < v <= 1   | -0.2        |
//! | v < 0.2         | 0.2         | v <= 0.21       | 0.2         |
//!
//! Results are clamped to `[FLOOR, CEILING]`. The down side stops at 0.21
//! rather than 0.2 so float error near the floor can't make it oscillate.

use modkit_events::KeyCode;

pub const FLOOR: f32 = 0.2;
pub const CEILING: f32 = 1000.0;

/// Down-side snap threshold, slightly above the floor
const DOWN_SNAP: f32 = 0.21;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepDirection {
    Up,
    Down,
}

impl StepDirection {
    /// `]` steps up, `[` steps down
    pub fn from_bracket(key: &KeyCode) -> Option<Self> {
        match key {
            KeyCode::Char(']') => Some(StepDirection::Up),
            KeyCode::Char('[') => Some(StepDirection::Down),
            _ => None,
        }
    }
}

/// Next value after one step in `direction`
pub fn step(value: f32, direction: StepDirection) -> f32 {
    let next = match direction {
        StepDirection::Up => {
            if value >= CEILING {
                CEILING
            } else if value >= 250.0 {
                value + 50.0
            } else if value >= 100.0 {
                value + 10.0
            } else if value >= 10.0 {
                value + 5.0
            } else if value >= 1.0 {
                value + 1.0
            } else if value >= FLOOR {
                value + 0.2
            } else {
                FLOOR
            }
        }
        StepDirection::Down => {
            if value >= 250.0 {
                value - 50.0
            } else if value >= 100.0 {
                value - 10.0
            } else if value >= 10.0 {
                value - 5.0
            } else if value > 1.0 {
                value - 1.0
            } else if value > DOWN_SNAP {
                value - 0.2
            } else {
                FLOOR
            }
        }
    };

    next.clamp(FLOOR, CEILING)
}

/// A radius or distance owned by one script
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SteppedValue(f32);

impl SteppedValue {
    /// Create a value, clamped into range
    pub fn new(value: f32) -> Self {
        Self(value.clamp(FLOOR, CEILING))
    }

    pub fn get(&self) -> f32 {
        self.0
    }

    /// Step in place, returning the new value
    pub fn step(&mut self, direction: StepDirection) -> f32 {
        self.0 = step(self.0, direction);
        self.0
    }

    pub fn increase(&mut self) -> f32 {
        self.step(StepDirection::Up)
    }

    pub fn decrease(&mut self) -> f32 {
        self.step(StepDirection::Down)
    }
}
