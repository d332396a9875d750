//! Session progression orchestrator.
//!
//! Owns the [`ProgressionState`] of the running playthrough and reacts to
//! loop ticks and inbound game events. All mutation happens on the session
//! worker task; collaborators are only called from here.

use std::any::type_name;
use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use strum::IntoEnumIterator;
use tokio::sync::mpsc;
use tracing::{debug, error, info, trace, warn};

use runner_core::{
    ConfigError, Crossing, Economy, EntityId, KillReward, ProgressionState, SessionConfig,
    StageOracle, StatKind, StatUpdate, StatUpgradeId,
};

use super::scope::{LoopCadence, LoopKind, LoopScope};
use super::session::Command;
use crate::api::{
    AccountContext, EncounterManager, PlayerWorld, RebirthStatSystem, Result, RuntimeError,
    ServiceRegistry, SessionSnapshot, StatUpgradeSystem,
};
use crate::events::{
    BeforeReplay, ChapterStageChanged, CharacterStatUpgraded, EncounterDefeated, Event, EventBus,
    PlayerDiedAcknowledged, PlayerInit, RebirthBegin, RebirthRequested, Replay, Scope,
    StageDistanceChanged, StatLevelChanged, SubscriptionSet, publish_stat_update,
};

// ============================================================================
// Collaborators
// ============================================================================

/// Every service the orchestrator needs, resolved together at startup.
pub(crate) struct Collaborators {
    pub config: Arc<SessionConfig>,
    pub stages: Arc<dyn StageOracle>,
    pub encounters: Arc<dyn EncounterManager>,
    pub world: Arc<dyn PlayerWorld>,
    pub account: Arc<dyn AccountContext>,
    pub stats: Arc<dyn StatUpgradeSystem>,
    pub rebirth_stats: Arc<dyn RebirthStatSystem>,
}

impl Collaborators {
    /// Suspends until all services are registered, or until `timeout`.
    pub async fn resolve(registry: &ServiceRegistry, timeout: Option<Duration>) -> Result<Self> {
        let all = async {
            let (config, stages, encounters, world, account, stats, rebirth_stats) = tokio::join!(
                registry.resolve::<SessionConfig>(),
                registry.resolve::<dyn StageOracle>(),
                registry.resolve::<dyn EncounterManager>(),
                registry.resolve::<dyn PlayerWorld>(),
                registry.resolve::<dyn AccountContext>(),
                registry.resolve::<dyn StatUpgradeSystem>(),
                registry.resolve::<dyn RebirthStatSystem>(),
            );
            Self {
                config,
                stages,
                encounters,
                world,
                account,
                stats,
                rebirth_stats,
            }
        };

        match timeout {
            None => Ok(all.await),
            Some(limit) => tokio::time::timeout(limit, all)
                .await
                .map_err(|_| RuntimeError::ServiceTimeout {
                    missing: Self::missing(registry),
                }),
        }
    }

    fn missing(registry: &ServiceRegistry) -> Vec<&'static str> {
        fn check<T: ?Sized + Send + Sync + 'static>(
            registry: &ServiceRegistry,
            missing: &mut Vec<&'static str>,
        ) {
            if !registry.contains::<T>() {
                missing.push(type_name::<T>());
            }
        }

        let mut missing = Vec::new();
        check::<SessionConfig>(registry, &mut missing);
        check::<dyn StageOracle>(registry, &mut missing);
        check::<dyn EncounterManager>(registry, &mut missing);
        check::<dyn PlayerWorld>(registry, &mut missing);
        check::<dyn AccountContext>(registry, &mut missing);
        check::<dyn StatUpgradeSystem>(registry, &mut missing);
        check::<dyn RebirthStatSystem>(registry, &mut missing);
        missing
    }
}

/// Game events forwarded from bus handlers to the worker task.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Inbound {
    EncounterDefeated(EncounterDefeated),
    PlayerDied,
    StatLevelChanged(StatLevelChanged),
    Rebirth,
}

// ============================================================================
// Orchestrator
// ============================================================================

pub(crate) struct SessionOrchestrator {
    services: Collaborators,
    economy: Economy,
    bus: EventBus,
    state: ProgressionState,
    player: Option<EntityId>,
    scope: LoopScope,
    cadence: LoopCadence,
    commands: mpsc::WeakSender<Command>,
    rng: StdRng,
    subscriptions: SubscriptionSet,
}

impl SessionOrchestrator {
    pub fn new(
        services: Collaborators,
        bus: EventBus,
        cadence: LoopCadence,
        commands: mpsc::WeakSender<Command>,
        seed: Option<u64>,
    ) -> Self {
        if let Err(err) = services.config.validate() {
            report(&err);
        }
        let economy = Economy::from_config(&services.config);
        let state = ProgressionState::new(0.0, services.config.chapter_distance);
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            services,
            economy,
            bus,
            state,
            player: None,
            scope: LoopScope::idle(),
            cadence,
            commands,
            rng,
            subscriptions: SubscriptionSet::new(),
        }
    }

    /// Installs the inbound subscriptions. Must run after every collaborator
    /// is bound, since handlers forward straight into the worker.
    pub fn subscribe(&mut self, inbound: &mpsc::UnboundedSender<Inbound>) {
        self.forward::<EncounterDefeated>(inbound, |event| Inbound::EncounterDefeated(*event));
        self.forward::<PlayerDiedAcknowledged>(inbound, |_| Inbound::PlayerDied);
        self.forward::<StatLevelChanged>(inbound, |event| Inbound::StatLevelChanged(*event));
        self.forward::<RebirthRequested>(inbound, |_| Inbound::Rebirth);
        debug!(
            target: "runtime::session",
            subscriptions = self.subscriptions.len(),
            "session subscriptions installed"
        );
    }

    fn forward<T: Event>(
        &mut self,
        inbound: &mpsc::UnboundedSender<Inbound>,
        map: fn(&T) -> Inbound,
    ) {
        let inbound = inbound.clone();
        let subscription = self.bus.subscribe::<T, _>(Scope::Global, move |event| {
            if inbound.send(map(event)).is_err() {
                trace!(
                    target: "runtime::session",
                    event = type_name::<T>(),
                    "session stopped; dropping inbound event"
                );
            }
        });
        self.subscriptions.push(subscription);
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            progression: self.state.clone(),
            player: self.player,
            generation: self.scope.generation(),
        }
    }

    // ------------------------------------------------------------------------
    // Chapter / stage
    // ------------------------------------------------------------------------

    /// Switches chapter and resolves its encounters. Stage and distance
    /// baseline are the caller's responsibility.
    pub fn set_chapter(
        &mut self,
        chapter: u32,
        update_record: bool,
    ) -> std::result::Result<(), ConfigError> {
        let result = self
            .state
            .set_chapter(chapter, self.services.stages.as_ref());
        if let Err(err) = &result {
            report(err);
        }
        if update_record {
            self.raise_record(chapter);
        }
        result
    }

    fn raise_record(&self, chapter: u32) {
        let account = &self.services.account;
        if chapter > account.highest_chapter() {
            account.set_highest_chapter(chapter);
            debug!(target: "runtime::session", chapter, "highest chapter raised");
        }
    }

    fn publish_chapter_stage(&self, is_new_chapter: bool, is_new_record: bool) {
        let event = ChapterStageChanged {
            chapter: self.state.chapter,
            stage: self.state.stage,
            highest_chapter: self.services.account.highest_chapter(),
            is_new_chapter,
            is_new_record,
        };
        debug!(target: "runtime::session", ?event, "chapter/stage changed");
        self.bus.publish(Scope::Global, event);
    }

    // ------------------------------------------------------------------------
    // Playthrough lifecycle
    // ------------------------------------------------------------------------

    /// Tears down the current playthrough (if any) and starts a fresh one.
    pub fn start_or_reset(&mut self) {
        self.services.encounters.clear_all();

        if let Some(previous) = self.player.take() {
            self.bus.close_scope(Scope::Entity(previous));
            self.services.world.destroy(previous);
        }

        let start = self.services.world.start_position();
        let player = self.services.world.spawn_player(start);
        self.player = Some(player);
        self.bus.publish_sticky(
            Scope::Entity(player),
            PlayerInit(Arc::clone(&self.services.config)),
        );

        for id in StatUpgradeId::iter() {
            self.publish_stat(id);
        }

        self.state = ProgressionState::new(start.x, self.services.config.chapter_distance);
        if self.set_chapter(1, false).is_err() {
            warn!(target: "runtime::session", "playthrough started without encounter data");
        }
        self.publish_chapter_stage(false, false);

        self.restart_loops();
        info!(
            target: "runtime::session",
            %player,
            generation = self.scope.generation(),
            "playthrough started"
        );
    }

    /// Death or rebirth reset, bracketed by replay notifications.
    pub fn full_reset(&mut self) {
        self.bus.publish(Scope::Global, BeforeReplay);
        self.start_or_reset();
        self.bus.publish(Scope::Global, Replay);
    }

    fn restart_loops(&mut self) {
        self.scope.cancel();
        let generation = self.scope.generation() + 1;
        self.scope = LoopScope::start(generation, self.cadence, self.commands.clone());
    }

    /// Stops the loops and revokes every subscription.
    pub fn shutdown(&mut self) {
        self.scope.abort();
        self.subscriptions.clear();
        info!(target: "runtime::session", "session stopped");
    }

    // ------------------------------------------------------------------------
    // Stats
    // ------------------------------------------------------------------------

    /// Pushes the current effect of `id` at its persisted level.
    pub fn publish_stat(&mut self, id: StatUpgradeId) {
        let level = match id.kind() {
            None => return,
            Some(StatKind::Normal) => self.services.stats.current_level(id),
            Some(StatKind::Rebirth(_)) => 0,
        };
        self.publish_stat_to_player(id, level);
    }

    /// Pushes the effect of `id` at `level` to the current player.
    pub fn publish_stat_to_player(&mut self, id: StatUpgradeId, level: u32) {
        let Some(kind) = id.kind() else {
            return;
        };
        let Some(player) = self.player else {
            debug!(target: "runtime::session", %id, "no player to receive stat");
            return;
        };

        let value = match kind {
            StatKind::Normal => self.services.stats.calculate(id, level),
            StatKind::Rebirth(rebirth) => self.services.rebirth_stats.calculate(rebirth),
        };

        let scope = Scope::Entity(player);
        match StatUpdate::for_stat(id, value) {
            Ok(update) => {
                trace!(target: "runtime::session", stat = update.name(), %value, "stat update");
                publish_stat_update(&self.bus, scope, update);
            }
            Err(err) => report(&err),
        }

        self.bus.publish(
            scope,
            CharacterStatUpgraded {
                id,
                name: id.label(),
                level,
                value,
            },
        );
    }

    // ------------------------------------------------------------------------
    // Loops
    // ------------------------------------------------------------------------

    pub fn on_tick(&mut self, kind: LoopKind, generation: u64) {
        if generation != self.scope.generation() {
            debug!(
                target: "runtime::loops",
                ?kind,
                generation,
                current = self.scope.generation(),
                "discarding stale tick"
            );
            return;
        }
        match kind {
            LoopKind::Distance => self.distance_tick(),
            LoopKind::Population => self.population_tick(),
        }
    }

    fn distance_tick(&mut self) {
        let Some(player) = self.player else {
            return;
        };
        let Some(x) = self.services.world.position_x(player) else {
            debug!(target: "runtime::loops", %player, "player has no position");
            return;
        };

        let stage_distance = self.services.config.stage_distance;
        let tick = self.state.tick_distance(x, stage_distance);
        self.bus.publish(
            Scope::Global,
            StageDistanceChanged {
                current: tick.current,
                goal: tick.goal,
            },
        );

        match tick.crossing {
            Crossing::None => {}
            Crossing::Stage(stage) => {
                debug!(target: "runtime::loops", chapter = self.state.chapter, stage, "stage advanced");
                self.publish_chapter_stage(false, false);
            }
            Crossing::ChapterGoal => {
                // The cleared chapter against the record before it is raised.
                let record = self.services.account.highest_chapter();
                let is_new_record = record < self.state.chapter;

                let rolled =
                    self.state
                        .roll_over_chapter(x, stage_distance, self.services.stages.as_ref());
                if let Err(err) = &rolled {
                    report(err);
                }
                self.raise_record(self.state.chapter);

                info!(
                    target: "runtime::session",
                    chapter = self.state.chapter,
                    is_new_record,
                    "chapter cleared"
                );
                self.publish_chapter_stage(true, is_new_record);
            }
        }
    }

    fn population_tick(&mut self) {
        if self.services.encounters.active_count() > 0 {
            return;
        }
        let Some(encounters) = &self.state.encounters else {
            trace!(target: "runtime::loops", chapter = self.state.chapter, "no encounter data");
            return;
        };

        let count = if encounters.min_count >= encounters.max_count {
            encounters.min_count
        } else {
            self.rng
                .gen_range(encounters.min_count..encounters.max_count)
        };
        if count == 0 {
            return;
        }

        let at = self.services.world.start_position();
        debug!(
            target: "runtime::loops",
            chapter = self.state.chapter,
            count,
            "spawning encounters"
        );
        self.services
            .encounters
            .spawn(&encounters.encounter_ids, count, at);
    }

    // ------------------------------------------------------------------------
    // Inbound events
    // ------------------------------------------------------------------------

    /// Applies one inbound event. `pending` is the rest of the inbound queue,
    /// drained while a rebirth waits on its begin handlers.
    pub async fn on_inbound(
        &mut self,
        inbound: Inbound,
        pending: &mut mpsc::UnboundedReceiver<Inbound>,
    ) {
        match inbound {
            Inbound::PlayerDied => {
                info!(target: "runtime::session", "player died; resetting");
                self.full_reset();
            }
            Inbound::Rebirth => self.rebirth(pending).await,
            other => self.apply_event(other),
        }
    }

    fn apply_event(&mut self, inbound: Inbound) {
        match inbound {
            Inbound::EncounterDefeated(event) => self.award_gold(&event),
            Inbound::StatLevelChanged(event) => {
                self.publish_stat_to_player(event.id, event.new_level)
            }
            Inbound::PlayerDied | Inbound::Rebirth => {
                debug!(target: "runtime::session", ?inbound, "reset in progress; ignored");
            }
        }
    }

    fn award_gold(&self, event: &EncounterDefeated) {
        let reward = KillReward {
            base_gold: event.base_gold,
            is_one_shot: event.is_one_shot,
            is_special: event.is_special,
        };
        match self
            .economy
            .gold_for_kill(&reward, self.state.chapter, self.state.stage)
        {
            Ok(gold) => {
                trace!(target: "runtime::session", %gold, "gold awarded");
                self.services.account.add_gold(gold);
            }
            Err(err) => report(&err),
        }
    }

    async fn rebirth(&mut self, pending: &mut mpsc::UnboundedReceiver<Inbound>) {
        let (chapter, stage) = (self.state.chapter, self.state.stage);
        if let Some(player) = self.player {
            self.services.world.set_movement_frozen(player, true);
        }
        info!(target: "runtime::session", chapter, stage, "rebirth started");

        // Kills reported while the begin handlers run still belong to the
        // ending run: price them now, before the ledger is wiped.
        let bus = self.bus.clone();
        let begin = bus.publish_async(Scope::Global, RebirthBegin { chapter, stage });
        tokio::pin!(begin);
        loop {
            tokio::select! {
                biased;
                Some(inbound) = pending.recv() => self.apply_event(inbound),
                () = &mut begin => break,
            }
        }
        while let Ok(inbound) = pending.try_recv() {
            self.apply_event(inbound);
        }

        self.services.account.rebirth();
        match self.economy.rebirth_points(chapter, stage) {
            Ok(points) => {
                info!(target: "runtime::session", %points, "rebirth points awarded");
                self.services.account.add_rebirth_points(points);
            }
            Err(err) => report(&err),
        }

        self.full_reset();
    }
}

fn report(err: &ConfigError) {
    error!(
        target: "runtime::session",
        kind = err.kind(),
        error = %err,
        "configuration error"
    );
}
