// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! I/O: the session blob, its stores, image codecs and config files.

pub mod codec;
pub mod persistence;
pub mod serialization;
pub mod store;

pub use persistence::{DecodeLimits, DecodedSession, PersistedSession};
pub use store::{FileStore, KeyValueStore, MemoryStore};
