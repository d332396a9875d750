//! Simulated game world backing the session in the terminal client.
//!
//! Stands in for the physics and combat layers: the player walks right at
//! its current move speed and live encounters fall one at a time.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tokio::sync::watch;

use runner_core::{BigNumber, EntityId, Position};
use runner_runtime::events::{EncounterDefeated, MoveSpeedChanged, RebirthRequested};
use runner_runtime::{EncounterManager, EventBus, PlayerWorld, Scope, Subscription};

use crate::config::SimConfig;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ============================================================================
// World
// ============================================================================

struct Body {
    x: f32,
    speed: f32,
    frozen: bool,
    _speed_updates: Subscription,
}

/// Player bodies on an endless x axis.
pub struct SimWorld {
    bus: EventBus,
    start: Position,
    base_speed: f32,
    next_id: AtomicU32,
    bodies: Arc<Mutex<HashMap<EntityId, Body>>>,
}

impl SimWorld {
    pub fn new(bus: EventBus, start: Position, base_speed: f32) -> Self {
        Self {
            bus,
            start,
            base_speed,
            next_id: AtomicU32::new(1),
            bodies: Arc::default(),
        }
    }

    /// Moves every unfrozen body by `dt` seconds of travel.
    pub fn advance(&self, dt: f32) {
        for body in lock(&self.bodies).values_mut() {
            if !body.frozen {
                body.x += body.speed * dt;
            }
        }
    }
}

impl PlayerWorld for SimWorld {
    fn start_position(&self) -> Position {
        self.start
    }

    fn spawn_player(&self, at: Position) -> EntityId {
        let id = EntityId(self.next_id.fetch_add(1, Ordering::Relaxed));

        let bodies = Arc::downgrade(&self.bodies);
        let speed_updates =
            self.bus
                .subscribe::<MoveSpeedChanged, _>(Scope::Entity(id), move |event| {
                    let Some(bodies) = bodies.upgrade() else {
                        return;
                    };
                    if let Some(body) = lock(&bodies).get_mut(&id) {
                        body.speed = event.0;
                    }
                });

        lock(&self.bodies).insert(
            id,
            Body {
                x: at.x,
                speed: self.base_speed,
                frozen: false,
                _speed_updates: speed_updates,
            },
        );
        tracing::debug!(player = %id, x = at.x, "player spawned");
        id
    }

    fn destroy(&self, player: EntityId) {
        let body = lock(&self.bodies).remove(&player);
        if body.is_some() {
            tracing::debug!(%player, "player destroyed");
        }
    }

    fn position_x(&self, player: EntityId) -> Option<f32> {
        lock(&self.bodies).get(&player).map(|body| body.x)
    }

    fn set_movement_frozen(&self, player: EntityId, frozen: bool) {
        if let Some(body) = lock(&self.bodies).get_mut(&player) {
            body.frozen = frozen;
        }
    }
}

// ============================================================================
// Encounters
// ============================================================================

const BASE_GOLD: u32 = 5;

#[derive(Debug)]
struct Foe {
    kind: String,
    is_special: bool,
}

/// Queue of live encounters, defeated front to back.
pub struct SimEncounters {
    live: Mutex<VecDeque<Foe>>,
    special_chance: f64,
    one_shot_ratio: f64,
    rng: Mutex<StdRng>,
}

impl SimEncounters {
    pub fn new(special_chance: f32, one_shot_ratio: f64, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(1)),
            None => StdRng::from_entropy(),
        };
        Self {
            live: Mutex::new(VecDeque::new()),
            special_chance: f64::from(special_chance).clamp(0.0, 1.0),
            one_shot_ratio: one_shot_ratio.clamp(0.0, 1.0),
            rng: Mutex::new(rng),
        }
    }

    /// Removes the oldest live encounter and describes how it died.
    pub fn defeat_one(&self) -> Option<EncounterDefeated> {
        let foe = lock(&self.live).pop_front()?;
        let is_one_shot = lock(&self.rng).gen_bool(self.one_shot_ratio);
        tracing::trace!(kind = %foe.kind, is_one_shot, "encounter defeated");
        Some(EncounterDefeated {
            base_gold: BigNumber::from(BASE_GOLD),
            is_one_shot,
            is_special: foe.is_special,
        })
    }
}

impl EncounterManager for SimEncounters {
    fn active_count(&self) -> usize {
        lock(&self.live).len()
    }

    fn clear_all(&self) {
        lock(&self.live).clear();
    }

    fn spawn(&self, encounter_ids: &[String], count: u32, at: Position) {
        let mut foes = Vec::with_capacity(count as usize);
        {
            let mut rng = lock(&self.rng);
            for _ in 0..count {
                let Some(kind) = encounter_ids.choose(&mut *rng) else {
                    break;
                };
                foes.push(Foe {
                    kind: kind.clone(),
                    is_special: rng.gen_bool(self.special_chance),
                });
            }
        }

        tracing::debug!(count = foes.len(), x = at.x, "wave spawned");
        lock(&self.live).extend(foes);
    }
}

// ============================================================================
// Driver
// ============================================================================

/// Steps the world and lands kills until `chapter` closes.
///
/// With `rebirth_at` set, a rebirth is requested once per run when the
/// observed chapter reaches it.
pub async fn drive(
    world: Arc<SimWorld>,
    encounters: Arc<SimEncounters>,
    bus: EventBus,
    sim: SimConfig,
    mut chapter: watch::Receiver<u32>,
) {
    let mut frame = tokio::time::interval(sim.frame);
    let mut kills = tokio::time::interval_at(
        tokio::time::Instant::now() + sim.kill_interval,
        sim.kill_interval,
    );
    let mut rebirth_requested = false;

    loop {
        tokio::select! {
            _ = frame.tick() => world.advance(sim.frame.as_secs_f32()),
            _ = kills.tick() => {
                if let Some(defeated) = encounters.defeat_one() {
                    bus.publish(Scope::Global, defeated);
                }
            }
            changed = chapter.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = *chapter.borrow_and_update();
                let Some(target) = sim.rebirth_at else {
                    continue;
                };
                if current < target {
                    rebirth_requested = false;
                } else if !rebirth_requested {
                    rebirth_requested = true;
                    tracing::info!(chapter = current, "requesting rebirth");
                    bus.publish(Scope::Global, RebirthRequested);
                }
            }
        }
    }
}
