//! Components used by the benches, sized like typical gameplay data so pool moves and swaps
//! cost what they would in a real workload.

use rusty_ecs_macros::Component;

#[derive(Component, Clone, Copy, Debug, Default)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

#[derive(Component, Clone, Copy, Debug, Default)]
pub struct Velocity {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// Column-major model matrix, the largest payload the benches move around.
#[derive(Component, Clone, Copy, Debug)]
pub struct Transform(pub [f32; 16]);

impl Default for Transform {
    fn default() -> Self {
        let mut identity = [0.0; 16];
        for diagonal in [0, 5, 10, 15] {
            identity[diagonal] = 1.0;
        }
        Self(identity)
    }
}

#[derive(Component, Clone, Copy, Debug, Default)]
pub struct Health {
    pub current: f32,
    pub max: f32,
}

/// Zero sized marker toggled by the add/remove benches.
#[derive(Component, Clone, Copy, Debug, Default)]
pub struct Frozen;
