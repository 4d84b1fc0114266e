//! Identifier generation.
//!
//! Production uses random v4 UUIDs. Tests and replays use `SeededIds`,
//! which derives the same UUID sequence from the same seed.

use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg64;
use std::sync::Mutex;
use uuid::Uuid;

use crate::types::EntityId;

pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> EntityId;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct UuidIds;

impl IdGenerator for UuidIds {
    fn next_id(&self) -> EntityId {
        Uuid::new_v4().to_string()
    }
}

/// Deterministic UUID-shaped ids from a seeded PCG stream.
pub struct SeededIds {
    rng: Mutex<Pcg64>,
}

impl SeededIds {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(Pcg64::seed_from_u64(seed)),
        }
    }
}

impl IdGenerator for SeededIds {
    fn next_id(&self) -> EntityId {
        let mut bytes = [0u8; 16];
        match self.rng.lock() {
            Ok(mut rng) => rng.fill_bytes(&mut bytes),
            Err(poisoned) => poisoned.into_inner().fill_bytes(&mut bytes),
        }
        uuid::Builder::from_random_bytes(bytes)
            .into_uuid()
            .to_string()
    }
}
