//! Backends holding encoded column and cube records.
use std::collections::BTreeMap;
use std::io;

use cubic_utils::{ColumnAddress, CubeAddress};
use parking_lot::Mutex;

/// Keyed byte storage for encoded records.
///
/// Implementations are shared between the world thread, which reads, and the
/// save worker, which writes.
pub trait CubeStorage: Send + Sync {
    /// The stored column record, if any.
    fn read_column(&self, address: ColumnAddress) -> io::Result<Option<Vec<u8>>>;

    /// The stored cube record, if any.
    fn read_cube(&self, address: CubeAddress) -> io::Result<Option<Vec<u8>>>;

    /// Stores a batch of column records.
    fn write_columns(&self, batch: Vec<(ColumnAddress, Vec<u8>)>) -> io::Result<()>;

    /// Stores a batch of cube records.
    fn write_cubes(&self, batch: Vec<(CubeAddress, Vec<u8>)>) -> io::Result<()>;

    /// Makes previous writes durable.
    fn flush(&self) -> io::Result<()> {
        Ok(())
    }
}

/// In-memory storage.
///
/// Nothing survives the process. Useful for tests and throwaway worlds.
#[derive(Debug, Default)]
pub struct RamOnlyStorage {
    columns: Mutex<BTreeMap<ColumnAddress, Vec<u8>>>,
    cubes: Mutex<BTreeMap<CubeAddress, Vec<u8>>>,
}

impl RamOnlyStorage {
    /// Creates an empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Addresses of the stored cubes of one column, bottom to top.
    #[must_use]
    pub fn cubes_in_column(&self, column: ColumnAddress) -> Vec<CubeAddress> {
        self.cubes
            .lock()
            .range(column.cube_range())
            .map(|(address, _)| *address)
            .collect()
    }

    /// Number of stored columns and cubes.
    #[must_use]
    pub fn record_counts(&self) -> (usize, usize) {
        (self.columns.lock().len(), self.cubes.lock().len())
    }
}

impl CubeStorage for RamOnlyStorage {
    fn read_column(&self, address: ColumnAddress) -> io::Result<Option<Vec<u8>>> {
        Ok(self.columns.lock().get(&address).cloned())
    }

    fn read_cube(&self, address: CubeAddress) -> io::Result<Option<Vec<u8>>> {
        Ok(self.cubes.lock().get(&address).cloned())
    }

    fn write_columns(&self, batch: Vec<(ColumnAddress, Vec<u8>)>) -> io::Result<()> {
        self.columns.lock().extend(batch);
        Ok(())
    }

    fn write_cubes(&self, batch: Vec<(CubeAddress, Vec<u8>)>) -> io::Result<()> {
        self.cubes.lock().extend(batch);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use cubic_utils::{ColumnPos, CubePos};

    use super::*;

    #[test]
    fn cubes_are_listed_per_column() {
        let storage = RamOnlyStorage::new();
        let address = |x, y, z| CubeAddress::encode(CubePos::new(x, y, z)).expect("in range");
        storage
            .write_cubes(vec![
                (address(0, 3, 0), vec![3]),
                (address(0, -2, 0), vec![1]),
                (address(1, 0, 0), vec![2]),
                (address(0, 0, 1), vec![4]),
            ])
            .expect("ram write");

        let column = ColumnAddress::encode(ColumnPos::new(0, 0)).expect("in range");
        assert_eq!(
            storage.cubes_in_column(column),
            vec![address(0, -2, 0), address(0, 3, 0)]
        );
        assert_eq!(storage.record_counts(), (0, 4));
    }
}
