//! Service resolution, stat propagation and runtime lifecycle.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{Harness, run_for, runtime_config};
use runner_content::ContentFactory;
use runner_core::{BigNumber, EntityId, StageOracle, StatUpgradeId};
use runner_runtime::events::{
    ChapterStageChanged, CharacterStatUpgraded, DamageChanged, MoveSpeedChanged,
    PlayerDiedAcknowledged, StageDistanceChanged, StatLevelChanged,
};
use runner_runtime::{Runtime, RuntimeConfig, RuntimeError, Scope, StageOracleImpl};

#[tokio::test(start_paused = true)]
async fn missing_services_time_out_with_their_names() {
    let harness = Harness::new();
    harness.services.register(Arc::new(harness.config.clone()));

    let runtime = Runtime::builder()
        .config(RuntimeConfig {
            service_timeout: Some(Duration::from_secs(1)),
            ..runtime_config()
        })
        .services(harness.services.clone())
        .build()
        .await;

    match runtime.shutdown().await {
        Err(RuntimeError::ServiceTimeout { missing }) => {
            assert_eq!(missing.len(), 6);
            assert!(missing.iter().any(|name| name.contains("EncounterManager")));
            assert!(missing.iter().all(|name| !name.contains("SessionConfig")));
        }
        other => panic!("expected a service timeout, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn session_waits_for_late_registration() {
    let harness = Harness::new();
    let (changes, _sub) = harness.record::<ChapterStageChanged>(Scope::Global);
    let runtime = Runtime::builder()
        .config(runtime_config())
        .services(harness.services.clone())
        .event_bus(harness.bus.clone())
        .build()
        .await;

    run_for(500).await;
    assert!(changes.lock().unwrap().is_empty());

    harness.register_all();
    let snapshot = runtime.handle().snapshot().await.unwrap();
    assert_eq!(snapshot.progression.chapter, 1);
    assert_eq!(changes.lock().unwrap().len(), 1);

    runtime.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn shutdown_stops_loops_and_subscriptions() {
    let harness = Harness::new();
    let (distances, _sub) = harness.record::<StageDistanceChanged>(Scope::Global);
    let runtime = harness.start().await;
    let handle = runtime.handle();

    run_for(250).await;
    runtime.shutdown().await.unwrap();
    let seen = distances.lock().unwrap().len();

    run_for(1000).await;
    assert_eq!(distances.lock().unwrap().len(), seen);
    assert_eq!(
        harness
            .bus
            .subscriber_count::<PlayerDiedAcknowledged>(Scope::Global),
        0
    );
    assert!(matches!(
        handle.snapshot().await,
        Err(RuntimeError::CommandChannelClosed)
    ));
}

#[tokio::test(start_paused = true)]
async fn stats_reach_the_player_at_start_and_on_level_change() {
    let harness = Harness::new();
    harness.stats.set_level(StatUpgradeId::Attack, 3);
    // The fake world hands out ids from 1.
    let player = Scope::Entity(EntityId(1));
    let (damage, _d) = harness.record::<DamageChanged>(player);
    let (speed, _s) = harness.record::<MoveSpeedChanged>(player);
    let (upgrades, _u) = harness.record::<CharacterStatUpgraded>(player);
    let runtime = harness.start().await;

    // attack: 10 + 2 * level
    assert_eq!(*damage.lock().unwrap(), vec![DamageChanged(BigNumber::from(16u32))]);
    assert_eq!(*speed.lock().unwrap(), vec![MoveSpeedChanged(2.0)]);
    {
        let upgrades = upgrades.lock().unwrap();
        assert_eq!(upgrades.len(), 8);
        assert!(upgrades.iter().all(|u| u.id != StatUpgradeId::None));
        let move_speed = upgrades
            .iter()
            .find(|u| u.id == StatUpgradeId::MoveSpeed)
            .unwrap();
        assert_eq!(move_speed.level, 0);
    }
    upgrades.lock().unwrap().clear();

    harness.bus.publish(
        Scope::Global,
        StatLevelChanged {
            id: StatUpgradeId::Attack,
            new_level: 5,
        },
    );
    runtime.handle().snapshot().await.unwrap();
    assert_eq!(
        damage.lock().unwrap().last(),
        Some(&DamageChanged(BigNumber::from(20u32)))
    );
    assert_eq!(
        *upgrades.lock().unwrap(),
        vec![CharacterStatUpgraded {
            id: StatUpgradeId::Attack,
            name: "Attack",
            level: 5,
            value: BigNumber::from(20u32),
        }]
    );

    runtime.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn unmapped_stats_still_announce_the_upgrade() {
    let harness = Harness::new();
    let (upgrades, _u) = harness.record::<CharacterStatUpgraded>(Scope::Entity(EntityId(1)));
    let runtime = harness.start().await;
    upgrades.lock().unwrap().clear();

    harness.bus.publish(
        Scope::Global,
        StatLevelChanged {
            id: StatUpgradeId::Armor,
            new_level: 2,
        },
    );
    harness.bus.publish(
        Scope::Global,
        StatLevelChanged {
            id: StatUpgradeId::None,
            new_level: 9,
        },
    );
    runtime.handle().snapshot().await.unwrap();

    let upgrades = upgrades.lock().unwrap().clone();
    assert_eq!(upgrades.len(), 1);
    assert_eq!(upgrades[0].id, StatUpgradeId::Armor);
    assert_eq!(upgrades[0].value, BigNumber::from(2u32));

    runtime.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn dead_players_stop_receiving_stats() {
    let harness = Harness::new();
    let (damage, _d) = harness.record::<DamageChanged>(Scope::Entity(EntityId(1)));
    let runtime = harness.start().await;
    assert_eq!(damage.lock().unwrap().len(), 1);

    harness.bus.publish(Scope::Global, PlayerDiedAcknowledged);
    runtime.handle().snapshot().await.unwrap();
    assert_eq!(
        harness
            .bus
            .subscriber_count::<DamageChanged>(Scope::Entity(EntityId(1))),
        0
    );

    harness.bus.publish(
        Scope::Global,
        StatLevelChanged {
            id: StatUpgradeId::Attack,
            new_level: 4,
        },
    );
    runtime.handle().snapshot().await.unwrap();
    assert_eq!(damage.lock().unwrap().len(), 1);

    runtime.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn content_files_drive_the_session() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("session.toml"),
        "stage_distance = 10.0\nchapter_distance = 30.0\n",
    )
    .unwrap();
    std::fs::write(
        dir.path().join("stages.ron"),
        r#"{
            "1": (min_count: 1, max_count: 1, encounter_ids: ["rat"]),
            "2": (min_count: 2, max_count: 2, encounter_ids: ["wolf"]),
        }"#,
    )
    .unwrap();

    let factory = ContentFactory::new(dir.path());
    let mut harness = Harness::new().with_stages(factory.load_stages().unwrap());
    harness.config = factory.load_session().unwrap();
    let oracle = StageOracleImpl::new(harness.stages.clone());
    assert_eq!(oracle.chapter_count(), 2);

    let (changes, _sub) = harness.record::<ChapterStageChanged>(Scope::Global);
    let runtime = harness.start().await;

    harness.world.move_to(30.0);
    run_for(105).await;
    let last = *changes.lock().unwrap().last().unwrap();
    assert_eq!((last.chapter, last.stage, last.is_new_chapter), (2, 1, true));

    harness.encounters.kill_all();
    run_for(1000).await;
    assert_eq!(
        harness.encounters.waves(),
        vec![(vec!["rat".to_owned()], 1), (vec!["wolf".to_owned()], 2)]
    );

    runtime.shutdown().await.unwrap();
}
