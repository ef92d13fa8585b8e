//! Marble Chain headless runner
//!
//! Plays one level with a simple auto-aim and prints the final snapshot.
//!
//! Usage: `marble-chain [level.json] [seed]`

#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    env_logger::init();
    native::run()
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Web hosts drive `marble_chain::sim::tick` from their own frame callback
}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use anyhow::{Context, Result};
    use glam::Vec2;

    use marble_chain::LevelConfig;
    use marble_chain::consts::{MAX_SUBSTEPS, SIM_DT};
    use marble_chain::sim::{GameSession, Snapshot, tick};

    /// Host frame length; deliberately not a multiple of the sim step
    const FRAME_DT: f32 = 1.0 / 45.0;
    /// Give up after ten minutes of game time
    const MAX_FRAMES: u32 = 45 * 600;
    /// Frames between auto-aim shots
    const SHOT_INTERVAL: u32 = 20;

    pub fn run() -> Result<()> {
        let mut args = std::env::args().skip(1);
        let level = match args.next() {
            Some(path) => {
                let json = std::fs::read_to_string(&path).with_context(|| format!("read level {path}"))?;
                LevelConfig::from_json(&json).with_context(|| format!("parse level {path}"))?
            }
            None => LevelConfig::default(),
        };
        let seed = match args.next() {
            Some(s) => s.parse::<u64>().with_context(|| format!("invalid seed {s:?}"))?,
            None => 1,
        };

        log::info!("Marble Chain (native) starting with seed {}", seed);
        let mut session = GameSession::seeded(level, seed)?;

        let mut accumulator = 0.0;
        for frame in 0..MAX_FRAMES {
            if frame % SHOT_INTERVAL == 0 {
                aim(&mut session);
            }

            accumulator += FRAME_DT;
            let mut substeps = 0;
            while accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
                let report = tick(&mut session, SIM_DT)?;
                if report.resolution.match_count > 0 {
                    log::debug!(
                        "Tick {}: {} runs, +{} points",
                        session.time_ticks(),
                        report.resolution.match_count,
                        report.resolution.total_score
                    );
                }
                accumulator -= SIM_DT;
                substeps += 1;
            }

            if let Some(outcome) = session.take_outcome() {
                log::info!("Outcome after {} frames: {:?}", frame + 1, outcome);
                break;
            }
        }

        print_snapshot(&session.snapshot())
    }

    /// Aim at a marble that already has a same-colored neighbour, swapping
    /// shot colors if only the on-deck color has one. Falls back to the head.
    fn aim(session: &mut GameSession) {
        let target = match pick_target(session) {
            Some(target) => Some(target),
            None => {
                session.swap_shot_colors();
                pick_target(session)
            }
        };
        let target = target.or_else(|| session.chain().head().map(|m| m.pos));
        if let Some(target) = target {
            session.queue_shot(target);
        }
    }

    fn pick_target(session: &GameSession) -> Option<Vec2> {
        let color = session.shooter().current;
        let marbles = session.chain().marbles();
        marbles
            .windows(2)
            .rev()
            .find(|pair| pair[0].color == color && pair[1].color == color)
            .map(|pair| pair[1].pos)
    }

    fn print_snapshot(snapshot: &Snapshot) -> Result<()> {
        let json = serde_json::to_string_pretty(snapshot).context("serialize snapshot")?;
        println!("{json}");
        Ok(())
    }
}
