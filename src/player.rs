// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! The embedded video player as seen by the engine.

/// Playback state reported by the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    Unstarted,
    Playing,
    Paused,
    Ended,
    Buffering,
    Error,
}

/// Opaque player surface: time query, seek, play and pause.
pub trait VideoPlayer {
    /// Current position in seconds.
    fn current_time(&self) -> f64;
    fn seek_to(&mut self, seconds: f64);
    fn play(&mut self);
    fn pause(&mut self);
    fn state(&self) -> PlayerState;
}

/// Player with a hand-set clock; used by tests and the headless CLI.
#[derive(Debug, Clone)]
pub struct ScriptedPlayer {
    time: f64,
    state: PlayerState,
}

impl Default for ScriptedPlayer {
    fn default() -> Self {
        Self {
            time: 0.0,
            state: PlayerState::Unstarted,
        }
    }
}

impl ScriptedPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(seconds: f64) -> Self {
        Self {
            time: seconds,
            state: PlayerState::Paused,
        }
    }

    /// Advance the clock as playback would.
    pub fn advance(&mut self, seconds: f64) {
        self.time += seconds;
    }

    pub fn set_state(&mut self, state: PlayerState) {
        self.state = state;
    }
}

impl VideoPlayer for ScriptedPlayer {
    fn current_time(&self) -> f64 {
        self.time
    }

    fn seek_to(&mut self, seconds: f64) {
        self.time = seconds.max(0.0);
    }

    fn play(&mut self) {
        self.state = PlayerState::Playing;
    }

    fn pause(&mut self) {
        self.state = PlayerState::Paused;
    }

    fn state(&self) -> PlayerState {
        self.state
    }
}
