//! Headless scenario execution
//!
//! Drives a Bevy app with a manual fixed time step until the script is
//! exhausted and every actor is idle, or the maximum duration elapses.

use bevy::log::LogPlugin;
use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::combat::ability::{ActorId, ResourceKind};
use crate::combat::ability_config::AbilityLibrary;
use crate::combat::config::EngineConfig;
use crate::combat::engine::AbilityEngine;
use crate::combat::error::ConfigError;
use crate::combat::events::CombatEvent;
use crate::combat::log::{CombatLog, CombatLogEventType};
use crate::combat::plugin::{
    process_use_requests, AbilityEnginePlugin, AbilitySystemPhase, Actor, CombatTarget, Health,
    UseAbilityRequest,
};
use crate::combat::state::InterruptReason;
use crate::combat::stealth::StealthBreakReason;
use crate::combat::world::WorldSnapshot;

use super::config::{ScenarioCommand, ScenarioConfig, ScriptStep};

/// Result of a completed headless scenario
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioResult {
    /// Simulated seconds until completion or timeout
    pub duration: f32,
    /// Whether the run stopped because `max_duration_secs` elapsed
    pub timed_out: bool,
    /// Random seed used (if deterministic mode)
    pub random_seed: Option<u64>,
    pub actors: Vec<ActorResult>,
    /// Where the combat log was written, if anywhere
    pub log_path: Option<PathBuf>,
    /// Rendered combat log
    #[serde(skip)]
    pub log: String,
}

impl ScenarioResult {
    pub fn actor(&self, id: u64) -> Option<&ActorResult> {
        self.actors.iter().find(|a| a.id == id)
    }
}

/// Final state of one actor
#[derive(Debug, Clone, Serialize)]
pub struct ActorResult {
    pub id: u64,
    pub name: String,
    pub team: u8,
    pub max_health: f32,
    pub final_health: f32,
    pub final_position: [f32; 3],
    pub resources: BTreeMap<ResourceKind, f32>,
    pub combo_points: u8,
    pub in_stealth: bool,
    /// Instants, completed casts and started channels
    pub executions: usize,
    pub interrupts: usize,
    pub damage_dealt: f32,
    pub damage_taken: f32,
}

#[derive(Debug, Clone, Default)]
struct ActorStats {
    executions: usize,
    interrupts: usize,
    damage_dealt: f32,
    damage_taken: f32,
}

/// Resource to track headless scenario state
#[derive(Resource)]
pub struct ScenarioState {
    pub config: ScenarioConfig,
    /// Index of the next script step to issue
    next_step: usize,
    pub complete: bool,
    pub timed_out: bool,
    stats: BTreeMap<ActorId, ActorStats>,
}

impl ScenarioState {
    fn new(mut config: ScenarioConfig) -> Self {
        config
            .script
            .sort_by(|a, b| a.at.total_cmp(&b.at));
        Self {
            config,
            next_step: 0,
            complete: false,
            timed_out: false,
            stats: BTreeMap::new(),
        }
    }

    fn script_exhausted(&self) -> bool {
        self.next_step >= self.config.script.len()
    }
}

/// Plugin for headless scenario execution
pub struct HeadlessPlugin {
    pub config: ScenarioConfig,
}

impl Plugin for HeadlessPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(ScenarioState::new(self.config.clone()))
            .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f32(
                self.config.time_step,
            )))
            .add_systems(Startup, setup_scenario)
            .add_systems(
                Update,
                run_script
                    .in_set(AbilitySystemPhase::Input)
                    .before(process_use_requests),
            )
            .add_systems(
                Update,
                (collect_stats, check_scenario_end)
                    .chain()
                    .after(AbilitySystemPhase::Log),
            );
    }
}

/// Spawn actors and register their loadouts and pools
fn setup_scenario(
    mut commands: Commands,
    state: Res<ScenarioState>,
    library: Res<AbilityLibrary>,
    mut engine: ResMut<AbilityEngine>,
    mut combat_log: ResMut<CombatLog>,
) {
    combat_log.clear();
    combat_log.log(
        CombatLogEventType::ScenarioEvent,
        "Scenario started (headless mode)".to_string(),
    );

    for spec in &state.config.actors {
        let id = ActorId(spec.id);
        engine.register_actor(id);
        for (slot, ability_id) in spec.loadout.iter().enumerate() {
            let ability = ability_id.as_deref().and_then(|a| library.get(a));
            if !engine.set_slot(id, slot, ability) {
                warn!("{}: slot {} exceeds the configured slot count", spec.name, slot);
            }
        }
        for resource in &spec.resources {
            engine.register_resource(id, resource.kind, resource.max, resource.starting);
        }
        engine.set_in_combat(id, spec.in_combat);
        if spec.stealthed {
            engine.enter_stealth(id);
        }
        combat_log.register_actor(id, spec.name.clone());

        let [x, y, z] = spec.position;
        commands.spawn((
            Actor {
                id,
                team: spec.team,
                name: spec.name.clone(),
            },
            Transform::from_xyz(x, y, z),
            Health::new(spec.max_health),
            CombatTarget(spec.target.map(ActorId)),
        ));
    }

    info!(
        "Headless scenario setup complete: {} actors, {} script steps",
        state.config.actors.len(),
        state.config.script.len()
    );
}

/// Issue every script step whose time has come
fn run_script(
    mut state: ResMut<ScenarioState>,
    mut engine: ResMut<AbilityEngine>,
    mut snapshot: ResMut<WorldSnapshot>,
    mut requests: EventWriter<UseAbilityRequest>,
    mut actors: Query<(&Actor, &mut Transform, &mut CombatTarget)>,
) {
    let now = engine.elapsed();
    while let Some(step) = state.config.script.get(state.next_step).cloned() {
        if step.at > now + f32::EPSILON {
            break;
        }
        state.next_step += 1;
        apply_step(&step, &mut engine, &mut snapshot, &mut requests, &mut actors);
    }
}

fn apply_step(
    step: &ScriptStep,
    engine: &mut AbilityEngine,
    snapshot: &mut WorldSnapshot,
    requests: &mut EventWriter<UseAbilityRequest>,
    actors: &mut Query<(&Actor, &mut Transform, &mut CombatTarget)>,
) {
    let actor = ActorId(step.actor);
    match &step.command {
        ScenarioCommand::Use {
            slot,
            target,
            queue,
        } => {
            requests.send(UseAbilityRequest {
                actor,
                slot: *slot,
                target: target.map(ActorId),
                queue: *queue,
            });
        }
        ScenarioCommand::MoveTo { position } => {
            let position = Vec3::from_array(*position);
            snapshot.set_position(actor, position);
            if let Some((_, mut transform, _)) = actors.iter_mut().find(|(a, _, _)| a.id == actor) {
                transform.translation = position;
            }
        }
        ScenarioCommand::SetTarget { target } => {
            let target = target.map(ActorId);
            snapshot.set_target(actor, target);
            if let Some((_, _, mut current)) = actors.iter_mut().find(|(a, _, _)| a.id == actor) {
                current.0 = target;
            }
        }
        ScenarioCommand::Lock { duration } => engine.lock(actor, *duration),
        ScenarioCommand::Unlock => engine.unlock(actor),
        ScenarioCommand::Interrupt => {
            engine.interrupt(actor, InterruptReason::External);
        }
        ScenarioCommand::EnterStealth => {
            if !engine.enter_stealth(actor) {
                debug!("Actor {} could not enter stealth", actor);
            }
        }
        ScenarioCommand::BreakStealth => {
            engine.break_stealth(actor, StealthBreakReason::Manual);
        }
        ScenarioCommand::SetInCombat { in_combat } => engine.set_in_combat(actor, *in_combat),
    }
}

/// Accumulate per-actor statistics from published events
fn collect_stats(mut events: EventReader<CombatEvent>, mut state: ResMut<ScenarioState>) {
    for event in events.read() {
        match event {
            CombatEvent::AbilityExecuted { actor, .. } | CombatEvent::ChannelStarted { actor, .. } => {
                state.stats.entry(*actor).or_default().executions += 1;
            }
            CombatEvent::Damage {
                source,
                target,
                amount,
                ..
            } => {
                state.stats.entry(*source).or_default().damage_dealt += amount;
                state.stats.entry(*target).or_default().damage_taken += amount;
            }
            e if e.is_interrupt() => {
                state.stats.entry(e.actor()).or_default().interrupts += 1;
            }
            _ => {}
        }
    }
}

/// Finish once the script is done and nobody is busy, or on timeout
fn check_scenario_end(
    mut state: ResMut<ScenarioState>,
    engine: Res<AbilityEngine>,
    mut combat_log: ResMut<CombatLog>,
) {
    if state.complete {
        return;
    }
    let elapsed = engine.elapsed();
    if elapsed >= state.config.max_duration_secs {
        info!("Scenario timed out after {:.1}s", elapsed);
        combat_log.log(
            CombatLogEventType::ScenarioEvent,
            format!("Scenario timed out after {:.1}s", elapsed),
        );
        state.timed_out = true;
        state.complete = true;
        return;
    }
    let all_idle = engine.actor_ids().all(|actor| {
        !engine.is_casting(actor) && !engine.is_channeling(actor) && engine.queued(actor).is_none()
    });
    if state.script_exhausted() && all_idle && elapsed > 0.0 {
        info!("Scenario complete after {:.2}s", elapsed);
        combat_log.log(
            CombatLogEventType::ScenarioEvent,
            format!("Scenario complete after {:.2}s", elapsed),
        );
        state.complete = true;
    }
}

/// Runs a scenario to completion and returns the result
pub struct ScenarioRunner {
    pub config: ScenarioConfig,
    pub library: AbilityLibrary,
    pub engine_config: EngineConfig,
    /// Install `LogPlugin` (disable when a subscriber is already set, e.g. in tests)
    pub logging: bool,
}

impl ScenarioRunner {
    pub fn new(config: ScenarioConfig, library: AbilityLibrary, engine_config: EngineConfig) -> Self {
        Self {
            config,
            library,
            engine_config,
            logging: false,
        }
    }

    pub fn with_logging(mut self, logging: bool) -> Self {
        self.logging = logging;
        self
    }

    pub fn run(self) -> Result<ScenarioResult, ConfigError> {
        self.config.validate()?;
        self.config.validate_loadouts(&self.library)?;
        self.engine_config.validate()?;

        let step = self.config.time_step;
        let max_frames = (self.config.max_duration_secs / step).ceil() as usize + 2;
        let random_seed = self.config.random_seed;
        let output_path = self.config.output_path.clone().map(PathBuf::from);

        let mut app = App::new();
        // Minimal plugins - no window, no rendering
        app.add_plugins(MinimalPlugins)
            .add_plugins(TransformPlugin)
            .add_plugins(HierarchyPlugin);
        if self.logging {
            app.add_plugins(LogPlugin::default());
        }
        app.add_plugins(AbilityEnginePlugin {
            config: self.engine_config,
            library: self.library,
            random_seed,
        })
        .add_plugins(HeadlessPlugin {
            config: self.config,
        });
        app.finish();
        app.cleanup();

        for _ in 0..max_frames {
            app.update();
            if app.world().resource::<ScenarioState>().complete {
                break;
            }
        }

        let world = app.world_mut();
        let mut actors_query = world.query::<(&Actor, &Health, &Transform)>();
        let engine = world.resource::<AbilityEngine>();
        let state = world.resource::<ScenarioState>();
        let combat_log = world.resource::<CombatLog>();

        let mut actors: Vec<ActorResult> = actors_query
            .iter(world)
            .map(|(actor, health, transform)| {
                let stats = state.stats.get(&actor.id).cloned().unwrap_or_default();
                let resources = [ResourceKind::Mana, ResourceKind::Energy, ResourceKind::Focus]
                    .into_iter()
                    .filter(|kind| engine.systems().resources.maximum(actor.id, *kind) > 0.0)
                    .map(|kind| (kind, engine.resource(actor.id, kind)))
                    .collect();
                ActorResult {
                    id: actor.id.0,
                    name: actor.name.clone(),
                    team: actor.team,
                    max_health: health.max,
                    final_health: health.current,
                    final_position: transform.translation.to_array(),
                    resources,
                    combo_points: engine.combo_points(actor.id),
                    in_stealth: engine.is_in_stealth(actor.id),
                    executions: stats.executions,
                    interrupts: stats.interrupts,
                    damage_dealt: stats.damage_dealt,
                    damage_taken: stats.damage_taken,
                }
            })
            .collect();
        actors.sort_by_key(|a| a.id);

        let log_path = match output_path {
            Some(path) => {
                let header = format!(
                    "=== Ability Engine Combat Log ===\nDuration: {:.2}s\nSeed: {}\n",
                    engine.elapsed(),
                    random_seed.map_or("none".to_string(), |s| s.to_string())
                );
                combat_log
                    .save_to_file(&path, &header)
                    .map_err(|source| ConfigError::Io {
                        path: path.clone(),
                        source,
                    })?;
                Some(path)
            }
            None => None,
        };

        Ok(ScenarioResult {
            duration: engine.elapsed(),
            timed_out: state.timed_out,
            random_seed,
            actors,
            log_path,
            log: combat_log.render(),
        })
    }
}

/// Run a scenario with logging left to the caller
pub fn run_scenario(
    config: ScenarioConfig,
    library: AbilityLibrary,
    engine_config: EngineConfig,
) -> Result<ScenarioResult, ConfigError> {
    ScenarioRunner::new(config, library, engine_config).run()
}
