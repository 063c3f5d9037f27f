//! A small drifting-particles scene: threaded physics, per-frame wrapping,
//! main-thread rendering.

use anyhow::Result;
use cadence_core::ecs::SystemResult;
use cadence_core::math::Vec2;
use cadence_core::{spawn, vector2_component, CallRate, ExecutionMode, Game};
use tracing::debug;

use crate::settings::RuntimeSettings;

/// Side length of the square arena entities wrap around in.
pub const ARENA: f32 = 100.0;

const RENDER_LOG_EVERY: u64 = 60;

vector2_component!(Position);
vector2_component!(
    /// Units per second.
    Velocity
);

/// Spawn `settings.entities` particles spread over the arena, each heading
/// in a different direction.
pub fn populate(game: &Game, settings: &RuntimeSettings) -> Result<()> {
    let world = game.world();
    world.register_component::<Position>();
    world.register_component::<Velocity>();

    let golden = std::f32::consts::PI * (3.0 - 5.0_f32.sqrt());
    for i in 0..settings.entities {
        let angle = i as f32 * golden;
        let radius = ARENA * 0.4 * ((i as f32 + 0.5) / settings.entities as f32).sqrt();
        let center = Vec2::splat(ARENA / 2.0);
        let heading = Vec2::from_angle(angle);
        spawn!(
            world,
            Position::from(center + heading * radius),
            Velocity::from(heading.perp() * 10.0)
        )?;
    }
    Ok(())
}

/// Register the scene's systems on `game`.
pub fn install(game: &mut Game, settings: &RuntimeSettings) -> Result<()> {
    let dt = (1.0 / settings.physics_rate_hz) as f32;
    let rate = CallRate::new(settings.physics_rate_hz)?;
    game.add_system_named(
        "physics",
        ExecutionMode::Threaded(rate),
        move |positions: Vec<&mut Position>, velocities: Vec<&mut Velocity>| -> SystemResult {
            for (p, v) in positions.into_iter().zip(velocities) {
                **p += **v * dt;
            }
            Ok(())
        },
    )?;

    game.add_system(wrap)?;

    let mut frame = 0u64;
    game.add_system_named(
        "render",
        ExecutionMode::MainThreadOnly,
        move |positions: Vec<&mut Position>| -> SystemResult {
            frame += 1;
            if frame % RENDER_LOG_EVERY == 0 && !positions.is_empty() {
                let sum = positions.iter().fold(Vec2::ZERO, |acc, p| acc + p.0);
                let centroid = sum / positions.len() as f32;
                debug!(frame, entities = positions.len(), ?centroid, "render");
            }
            Ok(())
        },
    )?;
    Ok(())
}

fn wrap(positions: Vec<&mut Position>) -> SystemResult {
    for p in positions {
        p.x = p.x.rem_euclid(ARENA);
        p.y = p.y.rem_euclid(ARENA);
    }
    Ok(())
}
