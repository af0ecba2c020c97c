// blockfield_sim: pure Rust voxel sandbox core.
//
// This crate contains all simulation logic for Blockfield: the sparse voxel
// grid, terrain generation, avatar kinematics and collision, build/mine
// actions, and snapshot persistence. It has no windowing, GPU or audio
// dependencies and can be tested, benchmarked, and run headless.
//
// Module overview:
// - `sim.rs`:       WorldState, the tick function, build/mine/select actions.
// - `grid.rs`:      Sparse voxel grid (the world's spatial truth) + DDA raycast.
// - `terrain.rs`:   Sine height-field terrain generation.
// - `collision.rs`: Two-pass avatar-vs-grid collision resolver.
// - `avatar.rs`:    AvatarState and the per-tick controller step.
// - `input.rs`:     Polled InputSnapshot, InputSource trait, accumulator, scripts.
// - `event.rs`:     Narrative SimEvents and save triggers.
// - `persist.rs`:   Snapshot document and the Persistence adapter.
// - `store.rs`:     Store trait, MemoryStore, DirStore.
// - `render.rs`:    Renderer trait and RenderFrame.
// - `session.rs`:   Session driver and fixed-step pacing.
// - `config.rs`:    GameConfig, all tunable parameters.
// - `error.rs`:     Error enums (thiserror).
// - `types.rs`:     CELL_SIZE, quantization, CellKey, BlockType, Block, RunState.
//
// Frontends (the headless binary, or a windowed host) implement
// `InputSource` and `Renderer` and hand them to a `Session`.
//
// **Critical constraint: determinism.** Given the same config, saved world
// and input sequence, `WorldState::tick()` produces the same states and
// events. No system time, no OS entropy, no randomly seeded hashing: the
// grid uses `FxHashMap`, and every place that iterates it for output
// (snapshots, collision candidates) imposes key order first.

pub mod avatar;
pub mod collision;
pub mod config;
pub mod error;
pub mod event;
pub mod grid;
pub mod input;
pub mod persist;
pub mod render;
pub mod session;
pub mod sim;
pub mod store;
pub mod terrain;
pub mod types;
