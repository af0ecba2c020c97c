// Canned input scripts for headless runs.
//
// - `idle`: stand still. The avatar drops from spawn and settles.
// - `walk`: hold forward forever.
// - `tour`: walk a square, jumping now and then, and at each corner look
//   down, mine the block underfoot, build it back and look up again.
//
// Every script loops, so `--ticks` alone decides how long a run lasts.

use blockfield_sim::input::{InputSnapshot, ScriptedInput};
use glam::Vec2;

/// Pointer units for a quarter turn at the default look sensitivity.
const QUARTER_TURN: f32 = 157.0;

/// Pointer units that saturate pitch from level.
const FULL_TILT: f32 = 200.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Script {
    Idle,
    Walk,
    Tour,
}

impl Script {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "idle" => Some(Script::Idle),
            "walk" => Some(Script::Walk),
            "tour" => Some(Script::Tour),
            _ => None,
        }
    }

    pub fn input(self) -> ScriptedInput {
        match self {
            Script::Idle => ScriptedInput::looping(vec![InputSnapshot::idle()]),
            Script::Walk => ScriptedInput::looping(vec![InputSnapshot::walking_forward()]),
            Script::Tour => ScriptedInput::looping(tour_leg()),
        }
    }
}

fn look(dx: f32, dy: f32) -> InputSnapshot {
    InputSnapshot {
        pointer_delta: Vec2::new(dx, dy),
        ..InputSnapshot::default()
    }
}

/// One side of the square plus the corner routine.
fn tour_leg() -> Vec<InputSnapshot> {
    let mut frames = Vec::new();
    for n in 0..120 {
        frames.push(InputSnapshot {
            forward: true,
            jump: n % 40 == 39,
            ..InputSnapshot::default()
        });
    }
    frames.extend(std::iter::repeat_n(InputSnapshot::idle(), 30));
    frames.push(look(0.0, FULL_TILT));
    frames.push(InputSnapshot {
        mine: true,
        ..InputSnapshot::default()
    });
    frames.extend(std::iter::repeat_n(InputSnapshot::idle(), 30));
    frames.push(InputSnapshot {
        jump: true,
        ..InputSnapshot::default()
    });
    frames.extend(std::iter::repeat_n(InputSnapshot::idle(), 8));
    frames.push(InputSnapshot {
        build: true,
        select: Some(5),
        ..InputSnapshot::default()
    });
    frames.extend(std::iter::repeat_n(InputSnapshot::idle(), 30));
    frames.push(look(QUARTER_TURN, -FULL_TILT));
    frames
}
