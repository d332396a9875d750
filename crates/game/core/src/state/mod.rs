//! Chapter and stage progression state.
//!
//! [`ProgressionState`] is the data half of the session orchestrator: it
//! tracks where the current playthrough stands and turns raw player positions
//! into stage and chapter crossings. It never talks to the account ledger or
//! the event bus; callers react to the returned [`DistanceTick`].
mod common;

pub use common::{EntityId, Position};

use crate::config::EncounterSetConfig;
use crate::env::{StageOracle, resolve_encounters};
use crate::error::ConfigError;

/// Progress of one playthrough. Replaced wholesale on every reset.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProgressionState {
    /// Current chapter, starting at 1.
    pub chapter: u32,
    /// Current stage inside the chapter, starting at 1.
    pub stage: u32,
    /// Encounter rules for `chapter`. `None` means "do not spawn".
    pub encounters: Option<EncounterSetConfig>,
    /// Player x at the start of the current chapter.
    pub distance_offset: f32,
    /// Distance from `distance_offset` that completes the chapter.
    pub goal_distance: f32,
}

/// Threshold crossed by a single distance tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Crossing {
    None,
    /// Stage advanced to the contained value.
    Stage(u32),
    /// Chapter goal reached; the caller must roll the chapter over.
    ChapterGoal,
}

/// Result of feeding one player position into [`ProgressionState::tick_distance`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DistanceTick {
    /// Distance travelled since the chapter baseline.
    pub current: f32,
    pub goal: f32,
    pub crossing: Crossing,
}

impl ProgressionState {
    /// Fresh playthrough at chapter 1, stage 1, with no encounters resolved yet.
    pub fn new(start_x: f32, chapter_distance: f32) -> Self {
        Self {
            chapter: 1,
            stage: 1,
            encounters: None,
            distance_offset: start_x,
            goal_distance: chapter_distance,
        }
    }

    /// Switches to `chapter` and resolves its encounter set.
    ///
    /// Stage and distance baseline are left alone. On failure the chapter is
    /// still updated but `encounters` is cleared, so spawning stops until the
    /// next successful resolution.
    pub fn set_chapter<S>(&mut self, chapter: u32, stages: &S) -> Result<(), ConfigError>
    where
        S: StageOracle + ?Sized,
    {
        self.chapter = chapter;
        match resolve_encounters(stages, chapter) {
            Ok(encounters) => {
                self.encounters = Some(encounters);
                Ok(())
            }
            Err(err) => {
                self.encounters = None;
                Err(err)
            }
        }
    }

    /// Distance travelled since the current chapter started.
    pub fn distance(&self, position_x: f32) -> f32 {
        (position_x - self.distance_offset).max(0.0)
    }

    /// Stage implied by a distance, `floor(distance / stage_distance) + 1`.
    pub fn implied_stage(distance: f32, stage_distance: f32) -> u32 {
        if stage_distance <= 0.0 {
            return 1;
        }
        // Saturating float-to-int cast.
        (distance / stage_distance).floor() as u32 + 1
    }

    /// Evaluates one distance-loop tick.
    ///
    /// Stage advances are applied here. A reached chapter goal is only
    /// reported; the caller decides the record bookkeeping and then calls
    /// [`roll_over_chapter`](Self::roll_over_chapter).
    pub fn tick_distance(&mut self, position_x: f32, stage_distance: f32) -> DistanceTick {
        let current = self.distance(position_x);
        let goal = self.goal_distance;

        let crossing = if current >= goal {
            Crossing::ChapterGoal
        } else {
            let implied = Self::implied_stage(current, stage_distance);
            if implied > self.stage {
                self.stage = implied;
                Crossing::Stage(implied)
            } else {
                Crossing::None
            }
        };

        DistanceTick {
            current,
            goal,
            crossing,
        }
    }

    /// Advances to the next chapter at `position_x`.
    ///
    /// Re-baselines distance, grows the goal by one stage increment, resets
    /// stage to 1, then resolves the next chapter's encounters.
    pub fn roll_over_chapter<S>(
        &mut self,
        position_x: f32,
        stage_distance: f32,
        stages: &S,
    ) -> Result<(), ConfigError>
    where
        S: StageOracle + ?Sized,
    {
        self.distance_offset = position_x;
        self.goal_distance += stage_distance;
        self.stage = 1;
        self.set_chapter(self.chapter.saturating_add(1), stages)
    }
}
