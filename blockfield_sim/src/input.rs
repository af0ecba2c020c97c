// Polled input model.
//
// The tick reads exactly one `InputSnapshot` at its start. A snapshot holds
// the held state of the four movement keys, rising edges for one-shot
// actions (jump, pause, build, mine), the pointer delta accumulated since
// the previous poll, and at most one block-selection hotkey.
//
// Frontends that receive input as callbacks feed an `InputAccumulator`,
// which folds key/button/pointer events into the next snapshot and clears
// edges and deltas on `poll()`. Tests and headless drivers use
// `ScriptedInput` or any `FnMut() -> InputSnapshot` closure.
//
// See also: `sim.rs` for how a snapshot is consumed, `session.rs` which
// polls the `InputSource` once per frame.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// One tick's worth of input.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InputSnapshot {
    pub forward: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
    /// Jump pressed this tick.
    pub jump: bool,
    /// Pause toggle pressed this tick.
    pub pause: bool,
    /// Mine the targeted block (primary action pressed this tick).
    pub mine: bool,
    /// Build against the targeted face (secondary action pressed this tick).
    pub build: bool,
    /// Pointer movement since the previous poll, in pointer units.
    pub pointer_delta: Vec2,
    /// Block-selection hotkey (1–5) pressed this tick.
    pub select: Option<u8>,
}

impl InputSnapshot {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn walking_forward() -> Self {
        Self {
            forward: true,
            ..Self::default()
        }
    }
}

/// Anything that can be polled once per tick.
pub trait InputSource {
    fn poll(&mut self) -> InputSnapshot;
}

impl<F> InputSource for F
where
    F: FnMut() -> InputSnapshot,
{
    fn poll(&mut self) -> InputSnapshot {
        self()
    }
}

// ---------------------------------------------------------------------------
// Event-driven frontends
// ---------------------------------------------------------------------------

/// Logical keys a frontend maps its physical keys onto.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    Forward,
    Back,
    Left,
    Right,
    Jump,
    Pause,
    /// Block-selection hotkey, 1–5.
    Hotkey(u8),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Button {
    Primary,
    Secondary,
}

/// Folds input callbacks into polled snapshots.
///
/// Held keys persist across polls until released. Edges fire only on the
/// transition from released to pressed, so OS key repeat does not produce
/// repeated jumps or pause toggles.
#[derive(Clone, Debug, Default)]
pub struct InputAccumulator {
    held: InputSnapshot,
    jump_down: bool,
    pause_down: bool,
    pending: InputSnapshot,
}

impl InputAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key_down(&mut self, key: Key) {
        match key {
            Key::Forward => self.held.forward = true,
            Key::Back => self.held.back = true,
            Key::Left => self.held.left = true,
            Key::Right => self.held.right = true,
            Key::Jump => {
                if !self.jump_down {
                    self.pending.jump = true;
                }
                self.jump_down = true;
            }
            Key::Pause => {
                if !self.pause_down {
                    self.pending.pause = true;
                }
                self.pause_down = true;
            }
            Key::Hotkey(n) => self.pending.select = Some(n),
        }
    }

    pub fn key_up(&mut self, key: Key) {
        match key {
            Key::Forward => self.held.forward = false,
            Key::Back => self.held.back = false,
            Key::Left => self.held.left = false,
            Key::Right => self.held.right = false,
            Key::Jump => self.jump_down = false,
            Key::Pause => self.pause_down = false,
            Key::Hotkey(_) => {}
        }
    }

    pub fn button_down(&mut self, button: Button) {
        match button {
            Button::Primary => self.pending.mine = true,
            Button::Secondary => self.pending.build = true,
        }
    }

    pub fn pointer_moved(&mut self, dx: f32, dy: f32) {
        self.pending.pointer_delta += Vec2::new(dx, dy);
    }
}

impl InputSource for InputAccumulator {
    fn poll(&mut self) -> InputSnapshot {
        let edges = std::mem::take(&mut self.pending);
        InputSnapshot {
            forward: self.held.forward,
            back: self.held.back,
            left: self.held.left,
            right: self.held.right,
            ..edges
        }
    }
}

// ---------------------------------------------------------------------------
// Scripted input
// ---------------------------------------------------------------------------

/// Replays a fixed list of snapshots, then idles (or loops).
#[derive(Clone, Debug)]
pub struct ScriptedInput {
    frames: VecDeque<InputSnapshot>,
    looped: Option<Vec<InputSnapshot>>,
}

impl ScriptedInput {
    pub fn new(frames: impl IntoIterator<Item = InputSnapshot>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
            looped: None,
        }
    }

    /// Replay `frames` forever.
    pub fn looping(frames: Vec<InputSnapshot>) -> Self {
        Self {
            frames: frames.iter().cloned().collect(),
            looped: Some(frames),
        }
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl InputSource for ScriptedInput {
    fn poll(&mut self) -> InputSnapshot {
        if self.frames.is_empty() {
            if let Some(cycle) = &self.looped {
                self.frames.extend(cycle.iter().cloned());
            }
        }
        self.frames.pop_front().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn held_keys_persist_across_polls() {
        let mut acc = InputAccumulator::new();
        acc.key_down(Key::Forward);
        acc.key_down(Key::Left);
        assert!(acc.poll().forward);
        let second = acc.poll();
        assert!(second.forward && second.left);
        acc.key_up(Key::Forward);
        assert!(!acc.poll().forward);
    }

    #[test]
    fn jump_edge_fires_once_per_press() {
        let mut acc = InputAccumulator::new();
        acc.key_down(Key::Jump);
        // Key repeat while held.
        acc.key_down(Key::Jump);
        assert!(acc.poll().jump);
        acc.key_down(Key::Jump);
        assert!(!acc.poll().jump);
        acc.key_up(Key::Jump);
        acc.key_down(Key::Jump);
        assert!(acc.poll().jump);
    }

    #[test]
    fn pause_edge_clears_after_poll() {
        let mut acc = InputAccumulator::new();
        acc.key_down(Key::Pause);
        acc.key_up(Key::Pause);
        assert!(acc.poll().pause);
        assert!(!acc.poll().pause);
    }

    #[test]
    fn pointer_delta_accumulates_then_resets() {
        let mut acc = InputAccumulator::new();
        acc.pointer_moved(3.0, -1.0);
        acc.pointer_moved(2.0, 4.0);
        assert_eq!(acc.poll().pointer_delta, Vec2::new(5.0, 3.0));
        assert_eq!(acc.poll().pointer_delta, Vec2::ZERO);
    }

    #[test]
    fn buttons_and_hotkeys_are_one_shot() {
        let mut acc = InputAccumulator::new();
        acc.button_down(Button::Primary);
        acc.button_down(Button::Secondary);
        acc.key_down(Key::Hotkey(4));
        let snap = acc.poll();
        assert!(snap.mine && snap.build);
        assert_eq!(snap.select, Some(4));
        let next = acc.poll();
        assert!(!next.mine && !next.build);
        assert_eq!(next.select, None);
    }

    #[test]
    fn scripted_input_idles_when_exhausted() {
        let mut input = ScriptedInput::new(vec![InputSnapshot::walking_forward()]);
        assert!(input.poll().forward);
        assert_eq!(input.remaining(), 0);
        assert_eq!(input.poll(), InputSnapshot::idle());
    }

    #[test]
    fn looping_script_repeats() {
        let jump = InputSnapshot {
            jump: true,
            ..InputSnapshot::default()
        };
        let mut input = ScriptedInput::looping(vec![InputSnapshot::idle(), jump]);
        let jumps: Vec<bool> = (0..6).map(|_| input.poll().jump).collect();
        assert_eq!(jumps, vec![false, true, false, true, false, true]);
    }

    #[test]
    fn closures_are_input_sources() {
        let mut n = 0;
        let mut source = move || {
            n += 1;
            InputSnapshot {
                select: Some(n),
                ..InputSnapshot::default()
            }
        };
        assert_eq!(source.poll().select, Some(1));
        assert_eq!(source.poll().select, Some(2));
    }
}
