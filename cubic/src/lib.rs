//! # Cubic
//!
//! The server around a cubic-chunks world: it prepares the spawn area, runs
//! the world tick and hands saves to a blocking worker.
use std::sync::Arc;
use std::time::Duration;

use cubic_core::cube_io::{CubeIo, CubeIoError, RamOnlyStorage};
use cubic_core::lighting::CubeCache;
use cubic_core::{BlockRegistry, WorldContext};
use cubic_utils::{ColumnPos, CubePos};
use tokio::{select, task};
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;

pub mod config;
pub mod logger;

use config::CubicConfig;

/// The running server.
pub struct CubicServer {
    /// Cancelled to stop the tick loop.
    pub cancel_token: CancellationToken,
    context: WorldContext,
    io: CubeIo,
    config: CubicConfig,
}

impl CubicServer {
    /// Builds the world, its pipeline and storage from `config`.
    pub fn new(config: CubicConfig) -> anyhow::Result<Self> {
        log::info!("Starting Cubic Server");
        let blocks = Arc::new(BlockRegistry::vanilla());
        let context = WorldContext::new(config.world.clone(), blocks)?;
        let io = CubeIo::new(Arc::new(RamOnlyStorage::new()), config.world.has_sky);
        Ok(Self {
            cancel_token: CancellationToken::new(),
            context,
            io,
            config,
        })
    }

    /// Loads or queues every cube of the spawn area. Returns the cubes queued
    /// for generation.
    pub fn prepare_spawn(&mut self) -> anyhow::Result<usize> {
        let radius = self.config.spawn_radius;
        let [min_y, max_y] = self.config.spawn_cube_range;
        for x in -radius..=radius {
            for z in -radius..=radius {
                self.load_column(ColumnPos::new(x, z), min_y, max_y)?;
            }
        }
        let queued = self
            .context
            .prepare_region(ColumnPos::new(0, 0), radius, min_y..=max_y)?;
        log::info!("Preparing {queued} spawn cubes");
        Ok(queued)
    }

    fn load_column(&mut self, pos: ColumnPos, min_y: i32, max_y: i32) -> Result<(), CubeIoError> {
        let Some(mut column) = self.io.load_column(pos)? else {
            return Ok(());
        };
        let game_time = self.context.world.game_time();
        for y in min_y..=max_y {
            if let Some(cube) = self.io.load_cube(&column, y, game_time)? {
                column.insert_cube(cube);
            }
        }
        self.context.insert_column(column)?;
        Ok(())
    }

    /// Runs the tick loop until the cancel token fires, then saves.
    pub async fn run(mut self) -> anyhow::Result<()> {
        let mut ticker = interval(Duration::from_millis(self.config.tick_interval_ms));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        log::info!("Started Cubic Server");

        let cancel_token = self.cancel_token.clone();
        loop {
            select! {
                () = cancel_token.cancelled() => break,
                _ = ticker.tick() => {
                    self.tick();
                    let save_every = self.config.save_interval_ticks;
                    if save_every > 0 && self.context.world.game_time() % save_every == 0 {
                        self.save().await?;
                    }
                }
            }
        }

        self.save().await?;
        log::info!("Stopped Cubic Server");
        Ok(())
    }

    fn tick(&mut self) {
        let report = self.context.tick();
        if report.processed > 0 {
            log::debug!(
                "Tick {}: {} processed, {} advanced, {} retried, {} dropped",
                self.context.world.game_time(),
                report.processed,
                report.advanced,
                report.retried,
                report.dropped
            );
        }
    }

    async fn save(&mut self) -> anyhow::Result<()> {
        let queued = self.io.save_world(&mut self.context.world)?;
        if queued == 0 {
            return Ok(());
        }
        let writer = self.io.writer();
        let report = task::spawn_blocking(move || writer.flush()).await??;
        log::info!("Saved {} columns and {} cubes", report.columns, report.cubes);
        Ok(())
    }

    /// Whether the cube at `pos` is loaded.
    #[must_use]
    pub fn is_loaded(&self, pos: CubePos) -> bool {
        self.context.world.cube(pos).is_some()
    }

    /// Stops the tick loop.
    pub fn stop(&self) {
        self.cancel_token.cancel();
    }
}
