//! Headless scenario runner
//!
//! Runs scripted ability scenarios without any graphical output, suitable
//! for automated testing and balance checks.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --release -- --scenario scenarios/duel.json
//! ```
//!
//! ## JSON Configuration
//!
//! ```json
//! {
//!   "actors": [
//!     {"id": 1, "name": "Mage", "team": 1, "target": 2,
//!      "loadout": ["fireball", "frost_nova"],
//!      "resources": [{"kind": "Mana", "max": 1000}]},
//!     {"id": 2, "name": "Dummy", "team": 2, "position": [0, 0, 20]}
//!   ],
//!   "script": [
//!     {"at": 0.0, "actor": 1, "command": {"type": "Use", "slot": 0}},
//!     {"at": 1.0, "actor": 1, "command": {"type": "MoveTo", "position": [5, 0, 0]}}
//!   ],
//!   "max_duration_secs": 30,
//!   "random_seed": 42
//! }
//! ```

pub mod config;
pub mod runner;

pub use config::{ActorSpec, ScenarioCommand, ScenarioConfig, ScriptStep};
pub use runner::{run_scenario, ActorResult, ScenarioResult, ScenarioRunner};
