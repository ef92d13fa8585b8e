//! Fixed-order simulation tick
//!
//! One tick per rendered frame:
//! fire queued shots -> advance chain -> loss check -> advance shots and
//! insert hits -> resolve runs to a fixed point -> win check.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::chain::MarbleColor;
use super::matching::{Resolution, resolve};
use super::projectile::{Projectile, advance_projectiles, find_hit};
use super::state::{GameSession, SessionState};
use crate::error::{InvariantViolation, SimError};
use crate::seconds_to_nanos;

/// What happened during one tick
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickReport {
    /// Projectiles fired from the shot queue
    pub fired: u32,
    /// Projectiles spliced into the chain
    pub hits: u32,
    /// Projectiles that left the playfield
    pub misses: u32,
    pub resolution: Resolution,
}

/// Advance the session by one timestep.
///
/// Terminal sessions are left untouched. An `Err` means the session has been
/// aborted and should be discarded by the host.
pub fn tick<R: Rng>(session: &mut GameSession<R>, dt: f32) -> Result<TickReport, SimError> {
    match session.state {
        SessionState::Aborted => return Err(SimError::SessionAborted),
        SessionState::Won | SessionState::Lost => return Ok(TickReport::default()),
        SessionState::Playing => {}
    }

    if let Err(violation) = session.chain.check_sorted() {
        return Err(abort(session, violation));
    }

    session.time_ticks += 1;
    session.clock_ns = session.clock_ns.saturating_add(seconds_to_nanos(dt));
    session.last_removed.clear();

    let mut report = TickReport {
        fired: fire_queued_shots(session),
        ..Default::default()
    };

    // Chain movement; reaching the goal beats anything else this tick
    let speed = session.level.chain_speed;
    if let Some(id) = session.chain.advance(&session.path, speed, dt) {
        session.state = SessionState::Lost;
        log::info!(
            "Marble {} reached the goal at tick {}: lost with score {}",
            id,
            session.time_ticks,
            session.score
        );
        return Ok(report);
    }

    report.misses = advance_projectiles(&mut session.projectiles, dt, &session.level.bounds) as u32;

    // Each shot sees the chain as left by the shots before it
    let mut spent: Vec<u32> = Vec::new();
    let mut i = 0;
    while i < session.projectiles.len() {
        let Some(hit_id) = find_hit(&session.projectiles[i], &session.chain, &spent) else {
            i += 1;
            continue;
        };
        let shot = session.projectiles.remove(i);
        let id = session.next_entity_id();
        if let Err(violation) = session.chain.insert_behind(
            &session.path,
            hit_id,
            id,
            shot.color,
            session.level.insert_offset,
        ) {
            return Err(abort(session, violation));
        }
        spent.push(hit_id);
        report.hits += 1;
    }

    let rules = session.match_rules();
    let resolution = resolve(&mut session.chain, &mut session.combo, session.clock_ns, rules);
    if resolution.match_count > 0 {
        session.score = session.score.saturating_add(resolution.total_score);
        session.last_removed = resolution.removed.clone();
        refresh_shooter(session);
    }
    report.resolution = resolution;

    if session.chain.is_empty() && session.projectiles.is_empty() {
        session.state = SessionState::Won;
        log::info!(
            "Chain cleared at tick {}: won with score {}",
            session.time_ticks,
            session.score
        );
    }

    Ok(report)
}

/// Turn queued aim requests into projectiles
fn fire_queued_shots<R: Rng>(session: &mut GameSession<R>) -> u32 {
    let mut fired = 0;
    while let Some(aim) = session.shot_queue.pop_front() {
        let id = session.next_entity_id();
        let shooter = session.shooter;
        let Some(shot) = Projectile::spawn(
            id,
            shooter.origin,
            aim,
            shooter.current,
            session.level.projectile_speed,
        ) else {
            log::debug!("Ignoring shot with zero-length aim");
            continue;
        };

        session.projectiles.push(shot);
        session.shooter.current = shooter.next;
        session.shooter.next = session.draw_shot_color();
        fired += 1;
    }
    fired
}

/// Replace shooter colors that no longer appear on the chain
fn refresh_shooter<R: Rng>(session: &mut GameSession<R>) {
    if session.chain.is_empty() {
        return;
    }
    let present = |color: MarbleColor| session.chain.marbles().iter().any(|m| m.color == color);
    let current_gone = !present(session.shooter.current);
    let next_gone = !present(session.shooter.next);
    if current_gone {
        session.shooter.current = session.draw_shot_color();
    }
    if next_gone {
        session.shooter.next = session.draw_shot_color();
    }
}

fn abort<R: Rng>(session: &mut GameSession<R>, violation: InvariantViolation) -> SimError {
    log::error!("Aborting session at tick {}: {}", session.time_ticks, violation);
    session.state = SessionState::Aborted;
    violation.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{BASE_POINTS, SIM_DT};
    use crate::level::LevelConfig;
    use crate::sim::chain::{Chain, Marble};
    use crate::sim::state::Outcome;
    use glam::Vec2;
    use crate::sim::chain::MarbleColor::*;

    /// Horizontal track at y=100 across an 800x600 field, shooter below it
    fn line_level() -> LevelConfig {
        LevelConfig {
            path: vec![Vec2::new(0.0, 100.0), Vec2::new(800.0, 100.0)],
            shooter: Vec2::new(400.0, 400.0),
            marble_count: 0,
            palette_size: 3,
            chain_speed: 1e-6,
            insert_offset: 0.01,
            ..Default::default()
        }
    }

    fn session_with(marbles: &[(MarbleColor, f32)]) -> GameSession {
        let mut session = GameSession::seeded(line_level(), 42).unwrap();
        let mut chain = Chain::from_marbles(
            marbles
                .iter()
                .map(|&(color, progress)| {
                    let id = session.next_entity_id();
                    Marble::new(id, color, progress)
                })
                .collect(),
        );
        chain.refresh_positions(&session.path);
        session.chain = chain;
        session
    }

    fn run_until_terminal(session: &mut GameSession, max_ticks: usize) {
        for _ in 0..max_ticks {
            tick(session, SIM_DT).unwrap();
            if session.state().is_terminal() {
                break;
            }
        }
    }

    #[test]
    fn test_shot_completes_run_and_wins() {
        let mut session = session_with(&[(Red, 0.5), (Red, 0.52)]);
        session.shooter.current = Red;

        session.queue_shot(Vec2::new(400.0, 100.0));
        let report = tick(&mut session, SIM_DT).unwrap();
        assert_eq!(report.fired, 1);
        assert_eq!(session.projectiles().len(), 1);

        run_until_terminal(&mut session, 120);

        assert_eq!(session.state(), SessionState::Won);
        assert!(session.chain().is_empty());
        assert_eq!(session.score(), 3 * BASE_POINTS);
        assert_eq!(session.take_outcome(), Some(Outcome::Won { score: 3 * BASE_POINTS }));
        assert_eq!(session.take_outcome(), None);
    }

    #[test]
    fn test_hit_inserts_without_match() {
        let mut session = session_with(&[(Blue, 0.5), (Green, 0.6)]);
        session.shooter.current = Red;
        session.queue_shot(Vec2::new(400.0, 100.0));

        let mut hits = 0;
        for _ in 0..120 {
            hits += tick(&mut session, SIM_DT).unwrap().hits;
            if hits > 0 {
                break;
            }
        }
        assert_eq!(hits, 1);
        assert_eq!(session.chain().colors(), vec![Red, Blue, Green]);
        assert!(session.projectiles().is_empty());
        assert_eq!(session.state(), SessionState::Playing);
    }

    #[test]
    fn test_miss_leaves_chain_alone() {
        let mut session = session_with(&[(Blue, 0.5), (Green, 0.6)]);
        session.queue_shot(Vec2::new(400.0, 600.0));

        let mut misses = 0;
        for _ in 0..60 {
            misses += tick(&mut session, SIM_DT).unwrap().misses;
        }
        assert_eq!(misses, 1);
        assert_eq!(session.chain().len(), 2);
        assert!(session.projectiles().is_empty());
        assert_eq!(session.state(), SessionState::Playing);
    }

    #[test]
    fn test_later_shot_can_hit_marble_inserted_same_tick() {
        let mut session = session_with(&[(Blue, 0.5), (Green, 0.6)]);
        for id in [900, 901] {
            session.projectiles.push(Projectile {
                id,
                color: Red,
                pos: Vec2::new(400.0, 100.0),
                vel: Vec2::ZERO,
            });
        }

        let report = tick(&mut session, SIM_DT).unwrap();

        assert_eq!(report.hits, 2);
        assert_eq!(session.chain().colors(), vec![Red, Red, Blue, Green]);
        session.chain().check_sorted().unwrap();
    }

    #[test]
    fn test_goal_beats_same_tick_match() {
        let mut level = line_level();
        level.chain_speed = 0.5;
        let mut session = GameSession::seeded(level, 1).unwrap();
        session.chain = Chain::from_marbles(vec![
            Marble::new(100, Red, 0.90),
            Marble::new(101, Red, 0.95),
            Marble::new(102, Red, 0.99),
        ]);

        let report = tick(&mut session, 0.1).unwrap();

        assert_eq!(session.state(), SessionState::Lost);
        assert_eq!(report.resolution.match_count, 0);
        assert_eq!(session.chain().len(), 3);
        assert_eq!(session.take_outcome(), Some(Outcome::Lost { score: 0 }));

        // Terminal sessions ignore further ticks
        let report = tick(&mut session, 0.1).unwrap();
        assert_eq!(report, TickReport::default());
        assert_eq!(session.time_ticks(), 1);
    }

    #[test]
    fn test_seeded_runs_resolve_on_first_tick() {
        let mut session = session_with(&[(Red, 0.1), (Red, 0.11), (Blue, 0.12), (Blue, 0.13), (Blue, 0.14), (Green, 0.2)]);
        let report = tick(&mut session, SIM_DT).unwrap();
        assert_eq!(report.resolution.match_count, 1);
        assert_eq!(session.chain().colors(), vec![Red, Red, Green]);
        assert_eq!(session.snapshot().removed.len(), 1);

        // The removal log only covers the latest tick
        tick(&mut session, SIM_DT).unwrap();
        assert!(session.snapshot().removed.is_empty());
    }

    #[test]
    fn test_unsorted_chain_aborts_session() {
        let mut session = session_with(&[(Red, 0.6), (Blue, 0.3)]);

        let err = tick(&mut session, SIM_DT).unwrap_err();
        assert!(matches!(
            err,
            SimError::Invariant(InvariantViolation::ChainUnsorted { index: 1, .. })
        ));
        assert_eq!(session.state(), SessionState::Aborted);
        assert_eq!(session.take_outcome(), None);
        assert!(matches!(tick(&mut session, SIM_DT), Err(SimError::SessionAborted)));
    }

    #[test]
    fn test_empty_chain_waits_for_shots_in_flight() {
        let mut session = session_with(&[]);
        session.projectiles.push(Projectile {
            id: 900,
            color: Red,
            pos: Vec2::new(400.0, 300.0),
            vel: Vec2::new(0.0, 600.0),
        });

        tick(&mut session, SIM_DT).unwrap();
        assert_eq!(session.state(), SessionState::Playing);

        run_until_terminal(&mut session, 60);
        assert_eq!(session.state(), SessionState::Won);
    }

    #[test]
    fn test_firing_rotates_shooter_colors() {
        let mut session = GameSession::seeded(LevelConfig::default(), 8).unwrap();
        let before = *session.shooter();
        session.queue_shot(before.origin + Vec2::new(0.0, -1.0));
        session.queue_shot(before.origin);

        let report = tick(&mut session, SIM_DT).unwrap();

        // The zero-length aim is dropped without consuming a color
        assert_eq!(report.fired, 1);
        assert_eq!(session.projectiles()[0].color, before.current);
        assert_eq!(session.shooter().current, before.next);
    }

    #[test]
    fn test_combo_survives_long_sessions() {
        let mut session = session_with(&[(Red, 0.1), (Red, 0.11), (Red, 0.12), (Green, 0.5)]);
        // A hundred hours of play
        session.clock_ns = 360_000 * 1_000_000_000;
        session.score = u64::MAX - 5;

        tick(&mut session, SIM_DT).unwrap();
        assert_eq!(session.clock_ns(), 360_000 * 1_000_000_000 + seconds_to_nanos(SIM_DT));
        assert!(session.snapshot().combo_active);
        assert_eq!(session.score(), u64::MAX);

        // A second run one tick later still chains onto the first
        let mut marbles = session.chain().marbles().to_vec();
        for progress in [0.6, 0.61, 0.62] {
            let id = session.next_entity_id();
            marbles.push(Marble::new(id, Blue, progress));
        }
        session.chain = Chain::from_marbles(marbles);
        session.chain.refresh_positions(&session.path);

        let report = tick(&mut session, SIM_DT).unwrap();
        assert_eq!(report.resolution.removed[0].combo, 1);
        assert_eq!(report.resolution.total_score, 3 * BASE_POINTS * 2);
        assert_eq!(session.snapshot().combo, 1);
    }

    #[test]
    fn test_determinism() {
        let aims = [Vec2::new(100.0, 60.0), Vec2::new(700.0, 200.0), Vec2::new(40.0, 400.0)];
        let mut a = GameSession::seeded(LevelConfig::default(), 2024).unwrap();
        let mut b = GameSession::seeded(LevelConfig::default(), 2024).unwrap();

        for step in 0..600 {
            if step % 40 == 0 {
                let aim = aims[(step / 40) % aims.len()];
                a.queue_shot(aim);
                b.queue_shot(aim);
            }
            tick(&mut a, SIM_DT).unwrap();
            tick(&mut b, SIM_DT).unwrap();
        }

        assert_eq!(a.score(), b.score());
        assert_eq!(a.chain().colors(), b.chain().colors());
        assert_eq!(a.state(), b.state());
        assert_eq!(a.shooter(), b.shooter());
    }
}
