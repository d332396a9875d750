//! Shared fakes for session integration tests.
#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use runner_core::{EncounterSetConfig, EntityId, Position, SessionConfig, StageOracle};
use runner_runtime::{
    AccountContext, EncounterManager, Event, EventBus, FlatRebirthStats, FlatStatSystem,
    InMemoryAccount, PlayerWorld, RebirthStatSystem, Runtime, RuntimeConfig, Scope,
    ServiceRegistry, StageOracleImpl, StatUpgradeSystem, Subscription,
};

/// Ordered record of side effects, shared by fakes and subscribers.
pub type Journal = Arc<Mutex<Vec<String>>>;

pub fn note(journal: &Journal, entry: impl Into<String>) {
    journal.lock().unwrap().push(entry.into());
}

// ============================================================================
// World
// ============================================================================

/// Player world where tests place the player by hand.
pub struct FakeWorld {
    start: Position,
    next_id: AtomicU32,
    positions: Mutex<HashMap<EntityId, f32>>,
    frozen: Mutex<HashSet<EntityId>>,
    journal: Journal,
}

impl FakeWorld {
    pub fn new(start_x: f32, journal: Journal) -> Self {
        Self {
            start: Position::new(start_x, 0.0),
            next_id: AtomicU32::new(1),
            positions: Mutex::new(HashMap::new()),
            frozen: Mutex::new(HashSet::new()),
            journal,
        }
    }

    /// Moves every live player to `x`.
    pub fn move_to(&self, x: f32) {
        for position in self.positions.lock().unwrap().values_mut() {
            *position = x;
        }
    }

    pub fn is_alive(&self, player: EntityId) -> bool {
        self.positions.lock().unwrap().contains_key(&player)
    }

    pub fn is_frozen(&self, player: EntityId) -> bool {
        self.frozen.lock().unwrap().contains(&player)
    }
}

impl PlayerWorld for FakeWorld {
    fn start_position(&self) -> Position {
        self.start
    }

    fn spawn_player(&self, at: Position) -> EntityId {
        let id = EntityId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.positions.lock().unwrap().insert(id, at.x);
        note(&self.journal, format!("spawn {id}"));
        id
    }

    fn destroy(&self, player: EntityId) {
        self.positions.lock().unwrap().remove(&player);
        note(&self.journal, format!("destroy {player}"));
    }

    fn position_x(&self, player: EntityId) -> Option<f32> {
        self.positions.lock().unwrap().get(&player).copied()
    }

    fn set_movement_frozen(&self, player: EntityId, frozen: bool) {
        let mut set = self.frozen.lock().unwrap();
        if frozen {
            set.insert(player);
        } else {
            set.remove(&player);
        }
    }
}

// ============================================================================
// Encounters
// ============================================================================

/// Encounter manager that only counts.
pub struct FakeEncounters {
    active: AtomicUsize,
    waves: Mutex<Vec<(Vec<String>, u32)>>,
    journal: Journal,
}

impl FakeEncounters {
    pub fn new(journal: Journal) -> Self {
        Self {
            active: AtomicUsize::new(0),
            waves: Mutex::new(Vec::new()),
            journal,
        }
    }

    /// Every `spawn` call so far.
    pub fn waves(&self) -> Vec<(Vec<String>, u32)> {
        self.waves.lock().unwrap().clone()
    }

    /// Simulates the player killing everything on screen.
    pub fn kill_all(&self) {
        self.active.store(0, Ordering::SeqCst);
    }
}

impl EncounterManager for FakeEncounters {
    fn active_count(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    fn clear_all(&self) {
        self.active.store(0, Ordering::SeqCst);
        note(&self.journal, "clear");
    }

    fn spawn(&self, encounter_ids: &[String], count: u32, _at: Position) {
        self.active.fetch_add(count as usize, Ordering::SeqCst);
        self.waves
            .lock()
            .unwrap()
            .push((encounter_ids.to_vec(), count));
    }
}

// ============================================================================
// Harness
// ============================================================================

pub fn encounter_set(min_count: u32, max_count: u32, id: &str) -> EncounterSetConfig {
    EncounterSetConfig {
        min_count,
        max_count,
        encounter_ids: vec![id.to_owned()],
    }
}

/// Three chapters with distinguishable encounter ids.
pub fn three_chapters() -> BTreeMap<u32, EncounterSetConfig> {
    BTreeMap::from([
        (1, encounter_set(2, 5, "slime")),
        (2, encounter_set(3, 6, "bat")),
        (3, encounter_set(4, 4, "golem")),
    ])
}

/// Session tuning with round numbers: stages every 20, first goal at 100.
pub fn session_config() -> SessionConfig {
    SessionConfig {
        stage_distance: 20.0,
        chapter_distance: 100.0,
        gold_expression: "value * stage * chapter".into(),
        one_shot_bonus_multiplier: 2.0,
        special_encounter_bonus_multiplier: 5.0,
        rebirth_condition_chapter: 3,
        ..SessionConfig::default()
    }
}

pub fn runtime_config() -> RuntimeConfig {
    RuntimeConfig {
        distance_tick: Duration::from_millis(100),
        population_tick: Duration::from_millis(1000),
        seed: Some(7),
        ..RuntimeConfig::default()
    }
}

pub struct Harness {
    pub bus: EventBus,
    pub services: ServiceRegistry,
    pub world: Arc<FakeWorld>,
    pub encounters: Arc<FakeEncounters>,
    pub account: Arc<InMemoryAccount>,
    pub stats: Arc<FlatStatSystem>,
    pub rebirth_stats: Arc<FlatRebirthStats>,
    pub journal: Journal,
    pub stages: BTreeMap<u32, EncounterSetConfig>,
    pub config: SessionConfig,
}

impl Harness {
    pub fn new() -> Self {
        let journal = Journal::default();
        Self {
            bus: EventBus::new(),
            services: ServiceRegistry::new(),
            world: Arc::new(FakeWorld::new(0.0, journal.clone())),
            encounters: Arc::new(FakeEncounters::new(journal.clone())),
            account: Arc::new(InMemoryAccount::new()),
            stats: Arc::new(FlatStatSystem::new()),
            rebirth_stats: Arc::new(FlatRebirthStats::default()),
            journal,
            stages: three_chapters(),
            config: session_config(),
        }
    }

    pub fn with_account(mut self, account: InMemoryAccount) -> Self {
        self.account = Arc::new(account);
        self
    }

    pub fn with_stages(mut self, stages: BTreeMap<u32, EncounterSetConfig>) -> Self {
        self.stages = stages;
        self
    }

    pub fn register_all(&self) {
        let services = &self.services;
        services.register(Arc::new(self.config.clone()));
        services.register::<dyn StageOracle>(Arc::new(StageOracleImpl::new(self.stages.clone())));
        services.register::<dyn EncounterManager>(self.encounters.clone());
        services.register::<dyn PlayerWorld>(self.world.clone());
        services.register::<dyn AccountContext>(self.account.clone());
        services.register::<dyn StatUpgradeSystem>(self.stats.clone());
        services.register::<dyn RebirthStatSystem>(self.rebirth_stats.clone());
    }

    /// Registers every service, builds the runtime and waits until the first
    /// playthrough has run its opening loop ticks.
    pub async fn start(&self) -> Runtime {
        self.register_all();
        let runtime = Runtime::builder()
            .config(runtime_config())
            .services(self.services.clone())
            .event_bus(self.bus.clone())
            .build()
            .await;
        settle(&runtime).await;
        runtime
    }

    /// Records every `T` published on `scope`.
    pub fn record<T: Event + Clone>(&self, scope: Scope) -> (Arc<Mutex<Vec<T>>>, Subscription) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let subscription = self
            .bus
            .subscribe::<T, _>(scope, move |event| sink.lock().unwrap().push(event.clone()));
        (seen, subscription)
    }

    /// Appends `label` to the journal whenever `T` is published globally.
    pub fn journal_on<T: Event>(&self, label: &'static str) -> Subscription {
        let journal = self.journal.clone();
        self.bus
            .subscribe::<T, _>(Scope::Global, move |_| note(&journal, label))
    }

    pub fn journal(&self) -> Vec<String> {
        self.journal.lock().unwrap().clone()
    }
}

/// Sleeps on the paused clock so loop ticks inside the window are delivered.
pub async fn run_for(millis: u64) {
    tokio::time::sleep(Duration::from_millis(millis)).await;
}

/// Lets the loops of a just-started playthrough deliver their immediate
/// first ticks. The paused clock only advances once every task is idle.
pub async fn settle(runtime: &Runtime) {
    runtime.handle().snapshot().await.unwrap();
    run_for(1).await;
    runtime.handle().snapshot().await.unwrap();
}
