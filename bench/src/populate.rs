//! Registry builders used by the benches.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rusty_ecs::ecs::{Entity, Registry};

use crate::components::{Health, Position, Velocity};

/// Fixed seed so every run sees the same component layout.
pub const SEED: u64 = 0x5eed;

/// Creates `count` entities that all carry a `Position`. Every other entity also gets a
/// `Velocity` and every fourth a `Health`.
pub fn mixed(count: usize) -> (Registry, Vec<Entity>) {
    let mut registry = Registry::new();
    let mut entities = Vec::with_capacity(count);
    for i in 0..count {
        let entity = registry.create();
        registry.add_component(
            entity,
            Position {
                x: i as f32,
                ..Default::default()
            },
        );
        if i % 2 == 0 {
            registry.add_component(
                entity,
                Velocity {
                    x: 1.0,
                    ..Default::default()
                },
            );
        }
        if i % 4 == 0 {
            registry.add_component(
                entity,
                Health {
                    current: 100.0,
                    max: 100.0,
                },
            );
        }
        entities.push(entity);
    }
    (registry, entities)
}

/// Like [`mixed`], but `Velocity` is assigned at random with the given probability.
pub fn random(count: usize, velocity_chance: f64) -> (Registry, Vec<Entity>) {
    let mut rng = ChaCha8Rng::seed_from_u64(SEED);
    let mut registry = Registry::new();
    let mut entities = Vec::with_capacity(count);
    for _ in 0..count {
        let entity = registry.create();
        registry.add_component(entity, Position::default());
        if rng.gen_bool(velocity_chance) {
            registry.add_component(entity, Velocity::default());
        }
        entities.push(entity);
    }
    (registry, entities)
}
