use log::Level;
use rusty_ecs::ecs::{Owned, Partial, Registry};
use rusty_ecs_macros::Component;

const PARTICLES: usize = 64;
const STEPS: usize = 10;

#[derive(Component, Debug)]
struct Position {
    x: f32,
    y: f32,
}

#[derive(Component, Debug)]
struct Velocity {
    dx: f32,
    dy: f32,
}

#[derive(Component, Debug)]
struct Lifetime(u32);

fn main() {
    let logs = match rusty_ecs::log::init(Level::Debug) {
        Ok(receiver) => receiver,
        Err(err) => {
            eprintln!("failed to install logger: {err}");
            return;
        }
    };

    let mut registry = Registry::new();

    // Every particle moves, only some of them expire.
    for i in 0..PARTICLES {
        let particle = registry.create();
        registry.add_component(particle, Position { x: 0.0, y: 0.0 });
        registry.add_component(
            particle,
            Velocity {
                dx: (i % 8) as f32,
                dy: (i / 8) as f32,
            },
        );
        if i % 4 == 0 {
            registry.add_component(particle, Lifetime(3 + (i % 5) as u32));
        }
    }

    for step in 0..STEPS {
        registry
            .create_view::<(Owned<Position>, Partial<Velocity>)>()
            .for_each_mut(|mut particle| {
                let (dx, dy) = {
                    let velocity = particle.get::<Velocity>();
                    (velocity.dx, velocity.dy)
                };
                let position = particle.get_mut::<Position>();
                position.x += dx;
                position.y += dy;
            });

        let mut expired = Vec::new();
        registry
            .create_view::<Partial<Lifetime>>()
            .for_each_mut(|mut particle| {
                let lifetime = particle.get_mut::<Lifetime>();
                lifetime.0 = lifetime.0.saturating_sub(1);
                if lifetime.0 == 0 {
                    expired.push(particle.entity());
                }
            });
        for particle in &expired {
            registry.free(*particle);
        }

        println!(
            "step {step}: {} particles alive, {} expired",
            registry.alive_count(),
            expired.len()
        );
    }

    let view = registry.create_view::<(Owned<Position>, Partial<Velocity>)>();
    if let Some(first) = view.iter().next() {
        println!("{} ended at {:?}", first.entity(), first.get::<Position>());
    }

    for message in logs.try_iter() {
        println!("[{}] {}: {}", message.level, message.target, message.message);
    }
}
