//! Log-based consumer of session events.
use tokio::sync::watch;
use tracing::{debug, info, trace};

use runner_runtime::events::{
    BeforeReplay, ChapterStageChanged, RebirthBegin, Replay, StageDistanceChanged,
};
use runner_runtime::{EventBus, Scope, SubscriptionSet};

/// Subscribes the progress log. Keeps `chapter` pointed at the current
/// chapter for as long as the returned set is alive.
pub fn install(bus: &EventBus, chapter: watch::Sender<u32>) -> SubscriptionSet {
    let mut subscriptions = SubscriptionSet::new();

    subscriptions.push(bus.subscribe::<ChapterStageChanged, _>(
        Scope::Global,
        move |event| {
            if event.is_new_chapter {
                info!(
                    chapter = event.chapter,
                    record = event.highest_chapter,
                    new_record = event.is_new_record,
                    "chapter reached"
                );
            } else {
                info!(chapter = event.chapter, stage = event.stage, "stage reached");
            }
            chapter.send_replace(event.chapter);
        },
    ));

    subscriptions.push(bus.subscribe::<StageDistanceChanged, _>(Scope::Global, |event| {
        trace!(current = event.current, goal = event.goal, "distance");
    }));

    subscriptions.push(bus.subscribe::<RebirthBegin, _>(Scope::Global, |event| {
        info!(chapter = event.chapter, stage = event.stage, "rebirth");
    }));

    subscriptions.push(bus.subscribe::<BeforeReplay, _>(Scope::Global, |_| {
        debug!("tearing down playthrough");
    }));
    subscriptions.push(bus.subscribe::<Replay, _>(Scope::Global, |_| {
        info!("new playthrough");
    }));

    subscriptions
}
