// Avatar kinematics: look, jump, walk, gravity, collision, respawn.
//
// `AvatarState` is the single first-person body in the world. `step()` runs
// one tick of the controller in a fixed order:
//
//   look -> jump -> horizontal movement -> gravity -> integrate Y
//        -> collision (vertical pass, then horizontal pass) -> respawn check
//
// Movement is per tick, not per second: each held key adds `move_speed`
// along the yaw-derived forward or right vector, and the contributions are
// summed without normalization (diagonal movement is faster). Horizontal
// velocity is recomputed from input every tick; vertical velocity carries
// over and is only changed by gravity, jumps and collision snaps.
//
// Orientation is yaw about world Y followed by pitch about the resulting
// local X (`EulerRot::YXZ`), with roll fixed at zero and pitch clamped to
// `[-π/2, π/2]`. Yaw 0 looks down -Z.
//
// Pause handling and build/mine actions live one level up in `sim.rs`; this
// module is only the body.
//
// See also: `collision.rs` for the resolver passes, `config.rs` for
// `PhysicsConfig`, `input.rs` for `InputSnapshot`.

use crate::collision::{self, Contacts};
use crate::config::PhysicsConfig;
use crate::grid::VoxelGrid;
use crate::input::InputSnapshot;
use glam::{EulerRot, Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};
use std::f32::consts::FRAC_PI_2;

/// Kinematic state of the avatar.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AvatarState {
    /// Centre of the avatar body.
    pub position: Vec3,
    /// World units per tick.
    pub velocity: Vec3,
    /// Radians about world Y. Unbounded.
    pub yaw: f32,
    /// Radians, clamped to `[-π/2, π/2]`. Positive looks up.
    pub pitch: f32,
    /// Set by the vertical collision pass when resting on a block top.
    pub on_ground: bool,
}

/// The persisted and rendered subset of `AvatarState`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AvatarPose {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
}

/// What happened to the avatar during one `step()`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StepOutcome {
    pub jumped: bool,
    pub respawned: bool,
    pub contacts: Contacts,
}

impl AvatarState {
    /// At rest at `position`, looking down -Z.
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            velocity: Vec3::ZERO,
            yaw: 0.0,
            pitch: 0.0,
            on_ground: false,
        }
    }

    pub fn pose(&self) -> AvatarPose {
        AvatarPose {
            position: self.position,
            yaw: self.yaw,
            pitch: self.pitch,
        }
    }

    /// Adopt a persisted pose. Velocity is zeroed and `on_ground` cleared;
    /// the next tick's collision pass re-establishes contact.
    pub fn set_pose(&mut self, pose: AvatarPose) {
        self.position = pose.position;
        self.yaw = pose.yaw;
        self.pitch = pose.pitch.clamp(-FRAC_PI_2, FRAC_PI_2);
        self.velocity = Vec3::ZERO;
        self.on_ground = false;
    }

    /// Camera rotation: yaw about Y, then pitch about local X, no roll.
    pub fn orientation(&self) -> Quat {
        Quat::from_euler(EulerRot::YXZ, self.yaw, self.pitch, 0.0)
    }

    /// Unit vector the avatar is looking along.
    pub fn view_direction(&self) -> Vec3 {
        self.orientation() * Vec3::NEG_Z
    }

    /// Horizontal forward unit vector from yaw alone.
    pub fn forward(&self) -> Vec3 {
        Vec3::new(-self.yaw.sin(), 0.0, -self.yaw.cos())
    }

    /// Horizontal right unit vector from yaw alone.
    pub fn right(&self) -> Vec3 {
        Vec3::new(self.yaw.cos(), 0.0, -self.yaw.sin())
    }

    /// Apply a pointer delta. Moving right turns right; moving down looks
    /// down.
    pub fn look(&mut self, delta: Vec2, sensitivity: f32) {
        if !delta.is_finite() {
            return;
        }
        self.yaw -= delta.x * sensitivity;
        self.pitch = (self.pitch - delta.y * sensitivity).clamp(-FRAC_PI_2, FRAC_PI_2);
    }

    /// Start a jump if standing on a block. Returns whether it happened.
    pub fn try_jump(&mut self, config: &PhysicsConfig) -> bool {
        if !self.on_ground {
            return false;
        }
        self.velocity.y = config.jump_velocity;
        self.on_ground = false;
        true
    }

    /// Set horizontal velocity from the held movement keys and integrate it.
    pub fn walk(&mut self, input: &InputSnapshot, config: &PhysicsConfig) {
        let forward = self.forward();
        let right = self.right();
        let mut v = Vec3::ZERO;
        if input.forward {
            v += forward * config.move_speed;
        }
        if input.back {
            v -= forward * config.move_speed;
        }
        if input.right {
            v += right * config.move_speed;
        }
        if input.left {
            v -= right * config.move_speed;
        }
        self.velocity.x = v.x;
        self.velocity.z = v.z;
        self.position.x += v.x;
        self.position.z += v.z;
    }

    /// Accelerate downward and integrate Y.
    pub fn fall(&mut self, config: &PhysicsConfig) {
        self.velocity.y -= config.gravity;
        self.position.y += self.velocity.y;
    }

    /// Return to spawn if below the fall floor (or no longer finite).
    pub fn respawn_if_fallen(&mut self, config: &PhysicsConfig) -> bool {
        if self.position.y >= config.fall_floor && self.position.is_finite() {
            return false;
        }
        self.position = config.spawn_point;
        self.velocity = Vec3::ZERO;
        self.on_ground = false;
        true
    }
}

/// One controller tick against `grid`. The caller is responsible for pause
/// handling; a paused world must not call this.
pub fn step(
    avatar: &mut AvatarState,
    input: &InputSnapshot,
    grid: &VoxelGrid,
    config: &PhysicsConfig,
) -> StepOutcome {
    avatar.look(input.pointer_delta, config.look_sensitivity);
    let jumped = input.jump && avatar.try_jump(config);
    avatar.walk(input, config);
    avatar.fall(config);
    let contacts = collision::resolve(avatar, grid, config);
    let respawned = avatar.respawn_if_fallen(config);
    if respawned {
        log::debug!("avatar fell below {} and respawned", config.fall_floor);
    }
    StepOutcome {
        jumped,
        respawned,
        contacts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BlockType, CellKey};

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-5
    }

    fn floor_grid() -> VoxelGrid {
        let mut grid = VoxelGrid::new();
        for x in -3..=3 {
            for z in -3..=3 {
                grid.insert_cell(CellKey::new(x, 0, z), BlockType::Stone, true);
            }
        }
        grid
    }

    #[test]
    fn respawn_after_falling_out_of_world() {
        let config = PhysicsConfig::default();
        let mut avatar = AvatarState::at(Vec3::new(5.0, -150.0, 5.0));
        avatar.velocity = Vec3::new(0.0, -7.0, 0.0);
        let outcome = step(&mut avatar, &InputSnapshot::idle(), &VoxelGrid::new(), &config);
        assert!(outcome.respawned);
        assert_eq!(avatar.position, Vec3::new(0.0, 50.0, 0.0));
        assert_eq!(avatar.velocity, Vec3::ZERO);
    }

    #[test]
    fn falling_avatar_settles_on_floor() {
        let config = PhysicsConfig::default();
        let grid = floor_grid();
        let mut avatar = AvatarState::at(Vec3::new(0.0, 100.0, 0.0));
        let mut landed_at = None;
        for tick in 0..200 {
            step(&mut avatar, &InputSnapshot::idle(), &grid, &config);
            // Once within reach of the column the avatar never sinks below
            // the snap height.
            if avatar.position.y <= 20.0 {
                assert!(avatar.position.y >= 15.0, "tick {tick}: y = {}", avatar.position.y);
            }
            if avatar.on_ground && landed_at.is_none() {
                landed_at = Some(tick);
            }
        }
        assert!(landed_at.is_some());
        assert_eq!(avatar.position.y, 15.0);
        assert_eq!(avatar.velocity.y, 0.0);
        assert!(avatar.on_ground);
    }

    #[test]
    fn resting_avatar_stays_put() {
        let config = PhysicsConfig::default();
        let grid = floor_grid();
        let mut avatar = AvatarState::at(Vec3::new(0.0, 15.0, 0.0));
        for _ in 0..30 {
            step(&mut avatar, &InputSnapshot::idle(), &grid, &config);
            assert_eq!(avatar.position, Vec3::new(0.0, 15.0, 0.0));
            assert!(avatar.on_ground);
        }
    }

    #[test]
    fn jump_requires_ground() {
        let config = PhysicsConfig::default();
        let jump = InputSnapshot {
            jump: true,
            ..InputSnapshot::default()
        };
        let mut airborne = AvatarState::at(Vec3::new(0.0, 200.0, 0.0));
        let outcome = step(&mut airborne, &jump, &VoxelGrid::new(), &config);
        assert!(!outcome.jumped);
        assert_eq!(airborne.velocity.y, -config.gravity);

        let grid = floor_grid();
        let mut grounded = AvatarState::at(Vec3::new(0.0, 15.0, 0.0));
        step(&mut grounded, &InputSnapshot::idle(), &grid, &config);
        assert!(grounded.on_ground);
        let outcome = step(&mut grounded, &jump, &grid, &config);
        assert!(outcome.jumped);
        assert!(!grounded.on_ground);
        assert_eq!(grounded.velocity.y, config.jump_velocity - config.gravity);
        assert!(grounded.position.y > 15.0);
    }

    #[test]
    fn no_double_jump() {
        let config = PhysicsConfig::default();
        let grid = floor_grid();
        let jump = InputSnapshot {
            jump: true,
            ..InputSnapshot::default()
        };
        let mut avatar = AvatarState::at(Vec3::new(0.0, 15.0, 0.0));
        step(&mut avatar, &InputSnapshot::idle(), &grid, &config);
        assert!(step(&mut avatar, &jump, &grid, &config).jumped);
        assert!(!step(&mut avatar, &jump, &grid, &config).jumped);
    }

    #[test]
    fn jump_arc_returns_to_ground() {
        let config = PhysicsConfig::default();
        let grid = floor_grid();
        let mut avatar = AvatarState::at(Vec3::new(0.0, 15.0, 0.0));
        step(&mut avatar, &InputSnapshot::idle(), &grid, &config);
        let jump = InputSnapshot {
            jump: true,
            ..InputSnapshot::default()
        };
        step(&mut avatar, &jump, &grid, &config);
        let mut peak = avatar.position.y;
        for _ in 0..60 {
            step(&mut avatar, &InputSnapshot::idle(), &grid, &config);
            peak = peak.max(avatar.position.y);
        }
        assert!(peak > 50.0, "peak {peak}");
        assert_eq!(avatar.position.y, 15.0);
        assert!(avatar.on_ground);
    }

    #[test]
    fn walking_follows_yaw() {
        let config = PhysicsConfig::default();
        let mut avatar = AvatarState::at(Vec3::ZERO);
        avatar.walk(&InputSnapshot::walking_forward(), &config);
        assert!(approx(avatar.position, Vec3::new(0.0, 0.0, -0.3)));

        let mut turned = AvatarState::at(Vec3::ZERO);
        turned.yaw = FRAC_PI_2;
        turned.walk(&InputSnapshot::walking_forward(), &config);
        assert!(approx(turned.position, Vec3::new(-0.3, 0.0, 0.0)));

        let mut strafing = AvatarState::at(Vec3::ZERO);
        let right = InputSnapshot {
            right: true,
            ..InputSnapshot::default()
        };
        strafing.walk(&right, &config);
        assert!(approx(strafing.position, Vec3::new(0.3, 0.0, 0.0)));
    }

    #[test]
    fn diagonal_movement_is_not_normalized() {
        let config = PhysicsConfig::default();
        let mut avatar = AvatarState::at(Vec3::ZERO);
        let diagonal = InputSnapshot {
            forward: true,
            right: true,
            ..InputSnapshot::default()
        };
        avatar.walk(&diagonal, &config);
        let speed = Vec2::new(avatar.velocity.x, avatar.velocity.z).length();
        assert!((speed - 0.3 * 2f32.sqrt()).abs() < 1e-5);
    }

    #[test]
    fn opposing_keys_cancel() {
        let config = PhysicsConfig::default();
        let mut avatar = AvatarState::at(Vec3::ZERO);
        let both = InputSnapshot {
            forward: true,
            back: true,
            ..InputSnapshot::default()
        };
        avatar.walk(&both, &config);
        assert!(approx(avatar.position, Vec3::ZERO));
    }

    #[test]
    fn pitch_is_clamped() {
        let mut avatar = AvatarState::at(Vec3::ZERO);
        avatar.look(Vec2::new(0.0, -10_000.0), 0.01);
        assert_eq!(avatar.pitch, FRAC_PI_2);
        avatar.look(Vec2::new(0.0, 10_000.0), 0.01);
        assert_eq!(avatar.pitch, -FRAC_PI_2);
    }

    #[test]
    fn look_ignores_non_finite_delta() {
        let mut avatar = AvatarState::at(Vec3::ZERO);
        avatar.look(Vec2::new(f32::NAN, 1.0), 0.01);
        assert_eq!(avatar.yaw, 0.0);
        assert_eq!(avatar.pitch, 0.0);
    }

    #[test]
    fn view_direction_matches_yaw_and_pitch() {
        let mut avatar = AvatarState::at(Vec3::ZERO);
        assert!(approx(avatar.view_direction(), Vec3::NEG_Z));
        avatar.yaw = FRAC_PI_2;
        assert!(approx(avatar.view_direction(), Vec3::NEG_X));
        avatar.yaw = 0.0;
        avatar.pitch = FRAC_PI_2;
        assert!(approx(avatar.view_direction(), Vec3::Y));
        // Orientation never rolls: local X stays horizontal.
        avatar.yaw = 0.7;
        avatar.pitch = -0.4;
        let lateral = avatar.orientation() * Vec3::X;
        assert!(lateral.y.abs() < 1e-6);
    }

    #[test]
    fn set_pose_clears_motion() {
        let mut avatar = AvatarState::at(Vec3::ZERO);
        avatar.velocity = Vec3::new(1.0, 2.0, 3.0);
        avatar.on_ground = true;
        avatar.set_pose(AvatarPose {
            position: Vec3::new(10.0, 40.0, -10.0),
            yaw: 1.0,
            pitch: 5.0,
        });
        assert_eq!(avatar.velocity, Vec3::ZERO);
        assert!(!avatar.on_ground);
        assert_eq!(avatar.pitch, FRAC_PI_2);
        assert_eq!(avatar.pose().position, Vec3::new(10.0, 40.0, -10.0));
    }
}
