//! Saving and loading columns and cubes.
//!
//! The world thread encodes records and leaves them in a pending set; a
//! [`CubeIoWriter`] running on a worker moves them to storage in batches.
//! A batch stays readable while storage writes it, and returns to the
//! pending set if the write fails. Loads look at pending and in-flight
//! records first so a cube read back right after being saved sees its
//! latest state.
pub mod nbt_codec;
mod storage;

use std::collections::BTreeMap;
use std::io;
use std::iter;
use std::sync::Arc;

use cubic_utils::{AddressError, ColumnAddress, ColumnPos, CubeAddress};
use parking_lot::Mutex;
use thiserror::Error;

pub use storage::{CubeStorage, RamOnlyStorage};

use crate::column::{Column, OpacityIndexError};
use crate::cube::Cube;
use crate::world::World;

/// Format version written into every record.
pub const CUBE_IO_VERSION: i32 = 1;
/// Columns moved to storage per writer batch.
pub const COLUMN_BATCH_SIZE: usize = 25;
/// Cubes moved to storage per writer batch.
pub const CUBE_BATCH_SIZE: usize = 250;

/// Errors from encoding or decoding saved data.
#[derive(Debug, Error)]
pub enum CubeIoError {
    /// A cube record has an unknown format version.
    #[error("cube format version {found} is not supported (expected {expected})")]
    VersionMismatch {
        /// Version found in the record.
        found: i32,
        /// Version this build writes.
        expected: i32,
    },
    /// The record is stored under the wrong position.
    #[error("expected {expected} but the record belongs to {found}")]
    CoordinateMismatch {
        /// Position that was requested.
        expected: String,
        /// Position stored in the record.
        found: String,
    },
    /// A required tag is absent.
    #[error("missing tag `{0}`")]
    MissingTag(&'static str),
    /// A tag has the wrong type or contents.
    #[error("invalid tag `{0}`")]
    InvalidTag(&'static str),
    /// The record is not valid NBT.
    #[error("malformed nbt: {0}")]
    Nbt(#[from] simdnbt::Error),
    /// Storage or compression failed.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// The stored opacity index is corrupt.
    #[error(transparent)]
    OpacityIndex(#[from] OpacityIndexError),
    /// The position cannot be addressed.
    #[error(transparent)]
    Address(#[from] AddressError),
}

#[derive(Default)]
struct PendingSaves {
    columns: SaveQueue<ColumnAddress>,
    cubes: SaveQueue<CubeAddress>,
}

/// Encoded records of one kind, waiting for or being written by the writer.
struct SaveQueue<K> {
    state: Mutex<QueueState<K>>,
}

struct QueueState<K> {
    pending: BTreeMap<K, Vec<u8>>,
    writing: BTreeMap<K, Vec<u8>>,
}

impl<K> Default for SaveQueue<K> {
    fn default() -> Self {
        Self {
            state: Mutex::new(QueueState {
                pending: BTreeMap::new(),
                writing: BTreeMap::new(),
            }),
        }
    }
}

impl<K: Ord + Copy> SaveQueue<K> {
    fn insert(&self, key: K, bytes: Vec<u8>) {
        self.state.lock().pending.insert(key, bytes);
    }

    /// The newest unwritten record for `key`.
    fn get(&self, key: &K) -> Option<Vec<u8>> {
        let state = self.state.lock();
        state.pending.get(key).or_else(|| state.writing.get(key)).cloned()
    }

    fn len(&self) -> usize {
        self.state.lock().pending.len()
    }

    /// Moves up to `limit` records from pending to in-flight.
    fn take_batch(&self, limit: usize) -> Vec<(K, Vec<u8>)> {
        let mut state = self.state.lock();
        let batch: Vec<_> = iter::from_fn(|| state.pending.pop_first())
            .take(limit)
            .collect();
        state
            .writing
            .extend(batch.iter().map(|(key, bytes)| (*key, bytes.clone())));
        batch
    }

    /// Drops written records from in-flight unless another writer replaced them.
    fn finish(&self, batch: &[(K, Vec<u8>)]) {
        let mut state = self.state.lock();
        for (key, bytes) in batch {
            if state.writing.get(key) == Some(bytes) {
                state.writing.remove(key);
            }
        }
    }

    /// Returns a failed batch to pending, keeping newer records for the same keys.
    fn restore(&self, batch: Vec<(K, Vec<u8>)>) {
        let mut state = self.state.lock();
        for (key, bytes) in batch {
            if state.writing.get(&key) == Some(&bytes) {
                state.writing.remove(&key);
            }
            state.pending.entry(key).or_insert(bytes);
        }
    }
}

/// Counts from one writer batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteReport {
    /// Columns written.
    pub columns: usize,
    /// Cubes written.
    pub cubes: usize,
}

impl WriteReport {
    /// Whether the batch wrote nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.columns == 0 && self.cubes == 0
    }
}

/// World-side handle for saving and loading.
pub struct CubeIo {
    storage: Arc<dyn CubeStorage>,
    pending: Arc<PendingSaves>,
    has_sky: bool,
}

impl CubeIo {
    /// Creates a handle over `storage`.
    pub fn new(storage: Arc<dyn CubeStorage>, has_sky: bool) -> Self {
        Self {
            storage,
            pending: Arc::default(),
            has_sky,
        }
    }

    /// A writer draining this handle's pending saves.
    #[must_use]
    pub fn writer(&self) -> CubeIoWriter {
        CubeIoWriter {
            storage: Arc::clone(&self.storage),
            pending: Arc::clone(&self.pending),
        }
    }

    /// Queues a column record, replacing an unwritten older one.
    pub fn save_column(&self, column: &Column) -> Result<(), CubeIoError> {
        let address = ColumnAddress::encode(column.pos())?;
        let bytes = nbt_codec::encode(nbt_codec::write_column(column)?)?;
        self.pending.columns.insert(address, bytes);
        Ok(())
    }

    /// Queues a cube record.
    ///
    /// `opacity_hash` is the content hash of the owning column's index.
    pub fn save_cube(&self, cube: &Cube, opacity_hash: u64, game_time: u64) -> Result<(), CubeIoError> {
        let address = CubeAddress::encode(cube.pos())?;
        let nbt = nbt_codec::write_cube(cube, opacity_hash, self.has_sky, game_time);
        let bytes = nbt_codec::encode(nbt)?;
        self.pending.cubes.insert(address, bytes);
        Ok(())
    }

    /// Queues every modified column and cube of `world` and marks them saved.
    ///
    /// Returns the number of records queued.
    pub fn save_world(&self, world: &mut World) -> Result<usize, CubeIoError> {
        let game_time = world.game_time();
        let mut saved = 0;
        for column in world.columns_mut() {
            if column.is_modified() {
                self.save_column(column)?;
                column.mark_saved();
                saved += 1;
            }
            let hash = column.opacity_index().content_hash();
            for cube in column.all_cubes_mut() {
                if cube.is_modified() {
                    self.save_cube(cube, hash, game_time)?;
                    cube.mark_saved();
                    saved += 1;
                }
            }
        }
        if saved > 0 {
            log::debug!("Queued {saved} records for saving");
        }
        Ok(saved)
    }

    /// Loads a column without its cubes.
    ///
    /// `Ok(None)` means there is nothing usable and the column must be generated.
    pub fn load_column(&self, pos: ColumnPos) -> Result<Option<Column>, CubeIoError> {
        let address = ColumnAddress::encode(pos)?;
        let pending = self.pending.columns.get(&address);
        let Some(bytes) = pending.map_or_else(|| self.storage.read_column(address), |b| Ok(Some(b)))? else {
            return Ok(None);
        };
        nbt_codec::read_column(&nbt_codec::decode(&bytes)?, pos)
    }

    /// Loads the cube at height `y` of an already loaded column.
    pub fn load_cube(&self, column: &Column, y: i32, game_time: u64) -> Result<Option<Cube>, CubeIoError> {
        let pos = column.pos().cube(y);
        let address = CubeAddress::encode(pos)?;
        let pending = self.pending.cubes.get(&address);
        let Some(bytes) = pending.map_or_else(|| self.storage.read_cube(address), |b| Ok(Some(b)))? else {
            return Ok(None);
        };
        let hash = column.opacity_index().content_hash();
        nbt_codec::read_cube(&nbt_codec::decode(&bytes)?, pos, hash, self.has_sky, game_time).map(Some)
    }

    /// Records the writer has not picked up yet, as columns and cubes.
    #[must_use]
    pub fn pending(&self) -> (usize, usize) {
        (self.pending.columns.len(), self.pending.cubes.len())
    }
}

/// Moves pending records to storage. Cheap to clone onto a worker.
#[derive(Clone)]
pub struct CubeIoWriter {
    storage: Arc<dyn CubeStorage>,
    pending: Arc<PendingSaves>,
}

impl CubeIoWriter {
    /// Writes one batch of up to [`COLUMN_BATCH_SIZE`] columns and
    /// [`CUBE_BATCH_SIZE`] cubes.
    ///
    /// Loads keep seeing the batch until storage holds it. On failure the
    /// batch goes back to the pending set unless a newer record for the same
    /// address arrived meanwhile.
    pub fn try_write(&self) -> io::Result<WriteReport> {
        let columns = self.pending.columns.take_batch(COLUMN_BATCH_SIZE);
        let cubes = self.pending.cubes.take_batch(CUBE_BATCH_SIZE);
        let report = WriteReport {
            columns: columns.len(),
            cubes: cubes.len(),
        };
        if report.is_empty() {
            return Ok(report);
        }

        if let Err(err) = self.storage.write_columns(columns.clone()) {
            log::warn!("Writing {} columns failed: {err}", report.columns);
            self.pending.columns.restore(columns);
            self.pending.cubes.restore(cubes);
            return Err(err);
        }
        self.pending.columns.finish(&columns);
        if let Err(err) = self.storage.write_cubes(cubes.clone()) {
            log::warn!("Writing {} cubes failed: {err}", report.cubes);
            self.pending.cubes.restore(cubes);
            return Err(err);
        }
        self.pending.cubes.finish(&cubes);
        log::debug!(
            "Wrote {} columns and {} cubes",
            report.columns,
            report.cubes
        );
        Ok(report)
    }

    /// Writes batches until nothing is pending, then flushes storage.
    pub fn flush(&self) -> io::Result<WriteReport> {
        let mut total = WriteReport::default();
        loop {
            let report = self.try_write()?;
            if report.is_empty() {
                break;
            }
            total.columns += report.columns;
            total.cubes += report.cubes;
        }
        self.storage.flush()?;
        Ok(total)
    }
}
