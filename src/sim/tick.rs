//! Fixed timestep simulation tick
//!
//! One call advances projectiles and enemies, resolves hits, keeps score,
//! escalates speed and spawns the next wave when the arena is cleared.

use glam::Vec2;
use rand::Rng;

use super::collision::{projectiles_hitting, resolve_enemy_separation};
use super::state::{Armory, Battlefield, Enemy, Explosion, GameEvent};
use crate::consts::*;

/// Enemy count for the spawn that happens while `wave_count` spawns have
/// been counted so far.
///
/// The very first spawn (wave_count 0) yields 4, one below the base.
pub fn wave_population(wave_count: u32) -> usize {
    let raw = BASE_WAVE_POPULATION + wave_count as i64 - 1;
    (raw.max(0) as usize).max(MIN_WAVE_POPULATION)
}

/// Lay out a new wave evenly across the arena and count it.
///
/// The reported wave number is the population index, so the warm-up batch
/// is wave 1 and the first playable batch is wave 2.
pub fn spawn_enemies(field: &mut Battlefield) -> GameEvent {
    let arena = field.arena;
    let count = wave_population(field.wave_count);
    let wave = field.wave_count.max(1);

    let available = arena.width - count as f32 * ENEMY_SIZE;
    let spacing = available / (count - 1) as f32;
    let band = ((arena.height / 3.0).floor() - SPAWN_Y_MARGIN).max(0.0);

    field.enemies.clear();
    for i in 0..count {
        let x = spacing * i as f32 + ENEMY_HALF_SIZE + i as f32 * ENEMY_SIZE;
        let y = field.rng().random::<f32>() * band + SPAWN_Y_OFFSET;
        let enemy = Enemy::with_random_velocity(Vec2::new(x, y), &arena, field.rng());
        field.enemies.push(enemy);
    }

    field.wave_count += 1;
    escalate(&mut field.enemies, ESCALATION_MULTIPLIER);

    log::info!(
        "Wave {} spawned with {} enemies (arena {}x{})",
        wave,
        count,
        arena.width,
        arena.height
    );
    GameEvent::WaveSpawned {
        wave,
        enemies: count,
    }
}

/// Multiply every live enemy's velocity
pub fn escalate(enemies: &mut [Enemy], multiplier: f32) {
    for enemy in enemies {
        enemy.increase_speed(multiplier);
    }
}

/// Fire one escalation per score multiple crossed since the last checkpoint.
/// Returns the thresholds that fired.
pub fn apply_score_escalation(field: &mut Battlefield) -> Vec<u32> {
    let mut fired = Vec::new();
    while field.score >= field.score_checkpoint() + ESCALATION_SCORE_STEP {
        let next = field.score_checkpoint() + ESCALATION_SCORE_STEP;
        field.set_score_checkpoint(next);
        escalate(&mut field.enemies, ESCALATION_MULTIPLIER);
        log::debug!("Speed escalated at score {}", next);
        fired.push(next);
    }
    fired
}

/// Advance the game by one fixed tick
pub fn tick(field: &mut Battlefield, armory: &mut Armory) -> Vec<GameEvent> {
    let mut events = Vec::new();

    // Frozen until a new run starts
    if field.game_over || armory.paused {
        return events;
    }

    field.time_ticks += 1;
    let arena = field.arena;

    for projectile in &mut armory.projectiles {
        projectile.step();
    }
    for enemy in &mut field.enemies {
        enemy.step(&arena);
    }
    armory.projectiles.retain(|p| !p.is_off_arena());

    // The first batch never becomes interactive
    if field.wave_count == 1 {
        field.enemies.clear();
        field.wave_count += 1;
        log::info!("Warm-up wave discarded");
        events.push(GameEvent::WarmUpWaveDiscarded);
        return events;
    }

    // Hits: every projectile inside an enemy is spent, the enemy counts once
    let player_box = armory.player.hitbox(&arena);
    let mut killed = vec![false; field.enemies.len()];
    let mut player_hit = false;
    for (i, enemy) in field.enemies.iter().enumerate() {
        let hits = projectiles_hitting(enemy, &armory.projectiles);
        if !hits.is_empty() {
            killed[i] = true;
            field.explosions.push(Explosion::at(enemy.pos));
            events.push(GameEvent::EnemyDestroyed { pos: enemy.pos });
            field.score += 1;
            let mut idx = 0;
            armory.projectiles.retain(|_| {
                let keep = !hits.contains(&idx);
                idx += 1;
                keep
            });
        }
        if player_box.overlaps(&enemy.hitbox()) {
            player_hit = true;
        }
    }

    for score in apply_score_escalation(field) {
        events.push(GameEvent::SpeedEscalated { score });
    }

    // Enemies shot this tick still push their neighbours before they go
    resolve_enemy_separation(&mut field.enemies);

    let mut dead = killed.into_iter();
    field.enemies.retain(|_| !dead.next().unwrap_or(false));

    field.explosions.retain_mut(|e| e.age());

    if player_hit {
        field.game_over = true;
        log::info!(
            "Game over at wave {} with score {}",
            field.wave_count,
            field.score
        );
        events.push(GameEvent::GameOver { score: field.score });
        return events;
    }

    if field.enemies.is_empty() {
        events.push(spawn_enemies(field));
    }

    events
}
