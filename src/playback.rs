// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Keeps the video drawing surface in step with playback.
//!
//! While the video plays, a poll task samples the player time and shows the
//! snapshot of the entry active at that time. The task is restarted on every
//! transition into playing, never stacked.

use crate::models::RasterSurface;
use crate::player::PlayerState;
use crate::schedule::{Scheduler, TaskHandle};
use crate::timestamps::TimestampStore;

#[derive(Debug)]
pub struct PlaybackSync {
    period_ms: u64,
    poll: Option<TaskHandle>,
    displayed: Option<u64>,
}

impl PlaybackSync {
    pub fn new(period_ms: u64) -> Self {
        Self {
            period_ms,
            poll: None,
            displayed: None,
        }
    }

    /// React to a player state change.
    pub fn on_player_state(&mut self, state: PlayerState, now_ms: u64, scheduler: &mut dyn Scheduler) {
        match state {
            PlayerState::Playing => {
                self.stop(scheduler);
                self.poll = Some(scheduler.start_repeating("playback-poll", self.period_ms, now_ms));
                log::debug!("Playback poll started");
            }
            PlayerState::Paused | PlayerState::Ended => self.stop(scheduler),
            PlayerState::Unstarted | PlayerState::Buffering | PlayerState::Error => {}
        }
    }

    /// Show the snapshot active at `time`; returns whether the surface changed.
    ///
    /// Nothing is repainted while the same entry stays active. With no
    /// active entry the surface is cleared once.
    pub fn on_time_tick(&mut self, time: f64, store: &TimestampStore, surface: &mut RasterSurface) -> bool {
        let active = store.entry_active_at(time);
        let active_id = active.map(|e| e.id);
        if active_id == self.displayed {
            return false;
        }
        match active {
            Some(entry) => {
                surface.replace_with(entry.snapshot.image());
                log::debug!("Showing drawing {} at {:.2}s", entry.id, time);
            }
            None => surface.clear(),
        }
        self.displayed = active_id;
        true
    }

    /// Record an entry painted outside the poll (a jump or a save).
    pub fn mark_displayed(&mut self, id: Option<u64>) {
        self.displayed = id;
    }

    pub fn displayed(&self) -> Option<u64> {
        self.displayed
    }

    pub fn poll_task(&self) -> Option<TaskHandle> {
        self.poll
    }

    pub fn stop(&mut self, scheduler: &mut dyn Scheduler) {
        if let Some(handle) = self.poll.take() {
            scheduler.cancel(handle);
        }
    }
}
