//! NBT layout of saved columns and cubes.
//!
//! Both records start with a format version `v`. Payloads are written as an
//! unnamed root compound and compressed with zstd.
use std::io::Cursor;

use cubic_utils::coords::CUBE_AREA;
use cubic_utils::{BlockPos, BlockStateId, ColumnPos, CubePos, LocalPos};
use simdnbt::owned::{BaseNbt, Nbt, NbtCompound, NbtList, NbtTag};
use uuid::Uuid;

use super::{CUBE_IO_VERSION, CubeIoError};
use crate::column::{Column, OpacityIndex};
use crate::cube::{BlockStorage, Cube, GeneratorStage, LightKind, LightStorage};
use crate::entity_container::{EntityContainer, EntityRecord};
use crate::ticks::{ScheduledTick, TickPriority};

const ZSTD_LEVEL: i32 = 3;

/// Serializes a column without its cubes.
pub fn write_column(column: &Column) -> Result<NbtCompound, CubeIoError> {
    let mut nbt = NbtCompound::new();
    nbt.insert("v", NbtTag::Int(CUBE_IO_VERSION));
    nbt.insert("x", NbtTag::Int(column.pos().x()));
    nbt.insert("z", NbtTag::Int(column.pos().z()));
    nbt.insert("Biomes", NbtTag::ByteArray(column.biomes().to_vec()));
    nbt.insert("OpacityIndex", NbtTag::ByteArray(column.opacity_index().data()?));
    nbt.insert("Entities", write_entities(column.entities()));
    Ok(nbt)
}

/// Reads a column saved by [`write_column`].
///
/// Returns `Ok(None)` for a column in another format version, so the caller
/// can generate it again.
pub fn read_column(nbt: &NbtCompound, expected: ColumnPos) -> Result<Option<Column>, CubeIoError> {
    let version = nbt.int("v").ok_or(CubeIoError::MissingTag("v"))?;
    if version != CUBE_IO_VERSION {
        log::warn!("Column {expected} has format version {version}, regenerating it");
        return Ok(None);
    }

    let found = ColumnPos::new(int(nbt, "x")?, int(nbt, "z")?);
    if found != expected {
        log::error!("Column {expected} was stored as {found}");
        return Err(CubeIoError::CoordinateMismatch {
            expected: expected.to_string(),
            found: found.to_string(),
        });
    }

    let mut column = Column::new(expected);
    let biomes: [u8; CUBE_AREA] = nbt
        .byte_array("Biomes")
        .ok_or(CubeIoError::MissingTag("Biomes"))?
        .try_into()
        .map_err(|_| CubeIoError::InvalidTag("Biomes"))?;
    column.set_biomes(biomes);

    let mut index = OpacityIndex::new();
    index.read_data(
        nbt.byte_array("OpacityIndex")
            .ok_or(CubeIoError::MissingTag("OpacityIndex"))?,
    )?;
    column.set_opacity_index(index);

    read_entities(nbt, column.entities_mut())?;
    column.mark_saved();
    Ok(Some(column))
}

/// Serializes a cube.
///
/// `opacity_hash` is the content hash of the owning column's index, and tick
/// delays are stored relative to `game_time`.
#[must_use]
pub fn write_cube(cube: &Cube, opacity_hash: u64, has_sky: bool, game_time: u64) -> NbtCompound {
    let pos = cube.pos();
    let mut nbt = NbtCompound::new();
    nbt.insert("v", NbtTag::Int(CUBE_IO_VERSION));
    nbt.insert("x", NbtTag::Int(pos.x()));
    nbt.insert("y", NbtTag::Int(pos.y()));
    nbt.insert("z", NbtTag::Int(pos.z()));
    nbt.insert(
        "GeneratorStage",
        NbtTag::Int(i32::from(cube.generator_stage().ordinal())),
    );
    nbt.insert("Blocks", NbtTag::ByteArray(cube.block_storage().to_bytes()));
    nbt.insert(
        "BlockLight",
        NbtTag::ByteArray(cube.light_storage(LightKind::Block).to_bytes()),
    );
    if has_sky {
        nbt.insert(
            "SkyLight",
            NbtTag::ByteArray(cube.light_storage(LightKind::Sky).to_bytes()),
        );
    }

    let tile_entities = cube
        .block_entities()
        .map(|(local, data)| {
            let mut entry = NbtCompound::new();
            insert_local(&mut entry, local);
            entry.insert("Data", NbtTag::Compound(data.clone()));
            entry
        })
        .collect();
    nbt.insert("TileEntities", NbtTag::List(NbtList::Compound(tile_entities)));

    let ticks = cube
        .ticks()
        .iter()
        .map(|tick| {
            let mut entry = NbtCompound::new();
            entry.insert("i", NbtTag::Int(i32::from(tick.tick_type.0)));
            entry.insert("x", NbtTag::Int(tick.pos.x()));
            entry.insert("y", NbtTag::Int(tick.pos.y()));
            entry.insert("z", NbtTag::Int(tick.pos.z()));
            let delay = tick.delay_from(game_time);
            let delay = delay.clamp(i64::from(i32::MIN), i64::from(i32::MAX));
            entry.insert("t", NbtTag::Int(delay as i32));
            entry.insert("p", NbtTag::Int(i32::from(tick.priority.value())));
            entry
        })
        .collect();
    nbt.insert("TileTicks", NbtTag::List(NbtList::Compound(ticks)));

    nbt.insert("OpacityIndex", NbtTag::Long(opacity_hash as i64));
    nbt.insert("Entities", write_entities(cube.entities()));
    nbt
}

/// Reads a cube saved by [`write_cube`].
///
/// The cube is flagged for relighting when `opacity_hash`, the hash of the
/// column's current index, differs from the one stored with it.
pub fn read_cube(
    nbt: &NbtCompound,
    expected: CubePos,
    opacity_hash: u64,
    has_sky: bool,
    game_time: u64,
) -> Result<Cube, CubeIoError> {
    let version = nbt.int("v").ok_or(CubeIoError::MissingTag("v"))?;
    if version != CUBE_IO_VERSION {
        return Err(CubeIoError::VersionMismatch {
            found: version,
            expected: CUBE_IO_VERSION,
        });
    }

    let found = CubePos::new(int(nbt, "x")?, int(nbt, "y")?, int(nbt, "z")?);
    if found != expected {
        log::error!("Cube {expected} was stored as {found}");
        return Err(CubeIoError::CoordinateMismatch {
            expected: expected.to_string(),
            found: found.to_string(),
        });
    }

    let mut cube = Cube::new(expected);
    let stage = u8::try_from(int(nbt, "GeneratorStage")?)
        .ok()
        .and_then(GeneratorStage::from_ordinal)
        .ok_or(CubeIoError::InvalidTag("GeneratorStage"))?;
    cube.set_generator_stage(stage);

    let blocks = nbt
        .byte_array("Blocks")
        .ok_or(CubeIoError::MissingTag("Blocks"))?;
    cube.set_block_storage(
        BlockStorage::from_bytes(blocks).ok_or(CubeIoError::InvalidTag("Blocks"))?,
    );
    cube.set_light_storage(LightKind::Block, light(nbt, "BlockLight")?);
    if has_sky {
        cube.set_light_storage(LightKind::Sky, light(nbt, "SkyLight")?);
    }

    for entry in compounds(nbt, "TileEntities")? {
        let local = read_local(entry).ok_or(CubeIoError::InvalidTag("TileEntities"))?;
        let data = entry
            .compound("Data")
            .ok_or(CubeIoError::InvalidTag("TileEntities"))?;
        cube.set_block_entity(local, data.clone());
    }

    for (order, entry) in compounds(nbt, "TileTicks")?.iter().enumerate() {
        let tick = read_tick(entry, game_time, order as u64)
            .ok_or(CubeIoError::InvalidTag("TileTicks"))?;
        if !cube.contains(tick.pos) {
            return Err(CubeIoError::InvalidTag("TileTicks"));
        }
        cube.schedule_tick(tick);
    }

    read_entities(nbt, cube.entities_mut())?;

    let relight = nbt
        .long("OpacityIndex")
        .is_none_or(|stored| stored as u64 != opacity_hash);
    cube.set_needs_relight(relight);
    cube.mark_saved();
    Ok(cube)
}

/// Compresses an NBT payload for storage.
pub fn encode(nbt: NbtCompound) -> Result<Vec<u8>, CubeIoError> {
    let mut raw = Vec::new();
    BaseNbt::new("", nbt).write(&mut raw);
    Ok(zstd::encode_all(raw.as_slice(), ZSTD_LEVEL)?)
}

/// Inverse of [`encode`].
pub fn decode(bytes: &[u8]) -> Result<NbtCompound, CubeIoError> {
    let raw = zstd::decode_all(bytes)?;
    match simdnbt::owned::read(&mut Cursor::new(raw.as_slice()))? {
        Nbt::Some(base) => Ok(base.as_compound()),
        Nbt::None => Err(CubeIoError::MissingTag("root")),
    }
}

fn int(nbt: &NbtCompound, key: &'static str) -> Result<i32, CubeIoError> {
    nbt.int(key).ok_or(CubeIoError::MissingTag(key))
}

fn light(nbt: &NbtCompound, key: &'static str) -> Result<LightStorage, CubeIoError> {
    let bytes = nbt.byte_array(key).ok_or(CubeIoError::MissingTag(key))?;
    LightStorage::from_bytes(bytes).ok_or(CubeIoError::InvalidTag(key))
}

/// Compound entries of a list tag. An empty list may have lost its element type.
fn compounds<'a>(nbt: &'a NbtCompound, key: &'static str) -> Result<&'a [NbtCompound], CubeIoError> {
    match nbt.list(key) {
        None => Err(CubeIoError::MissingTag(key)),
        Some(NbtList::Empty) => Ok(&[]),
        Some(list) => list.compounds().ok_or(CubeIoError::InvalidTag(key)),
    }
}

fn insert_local(nbt: &mut NbtCompound, local: LocalPos) {
    nbt.insert("x", NbtTag::Byte(local.x as i8));
    nbt.insert("y", NbtTag::Byte(local.y as i8));
    nbt.insert("z", NbtTag::Byte(local.z as i8));
}

fn read_local(nbt: &NbtCompound) -> Option<LocalPos> {
    let coord = |key| {
        let value = usize::try_from(nbt.byte(key)?).ok()?;
        (value < 16).then_some(value)
    };
    Some(LocalPos::new(coord("x")?, coord("y")?, coord("z")?))
}

fn read_tick(nbt: &NbtCompound, game_time: u64, order: u64) -> Option<ScheduledTick<BlockStateId>> {
    let state = BlockStateId(u16::try_from(nbt.int("i")?).ok()?);
    let pos = BlockPos::new(nbt.int("x")?, nbt.int("y")?, nbt.int("z")?);
    let delay = i64::from(nbt.int("t")?);
    let trigger = game_time.saturating_add_signed(delay);
    let priority = TickPriority::from_value(nbt.int("p")?);
    Some(ScheduledTick::with_priority(state, pos, trigger, priority, order))
}

fn write_entities(entities: &EntityContainer) -> NbtTag {
    let records = entities
        .iter()
        .map(|record| {
            let mut entry = NbtCompound::new();
            entry.insert("UUID", NbtTag::IntArray(uuid_to_ints(record.id).to_vec()));
            entry.insert("Data", NbtTag::Compound(record.data.clone()));
            entry
        })
        .collect();
    NbtTag::List(NbtList::Compound(records))
}

fn read_entities(nbt: &NbtCompound, entities: &mut EntityContainer) -> Result<(), CubeIoError> {
    for entry in compounds(nbt, "Entities")? {
        let id = entry
            .int_array("UUID")
            .and_then(|ints| <[i32; 4]>::try_from(ints).ok())
            .map(ints_to_uuid)
            .ok_or(CubeIoError::InvalidTag("Entities"))?;
        let data = entry
            .compound("Data")
            .ok_or(CubeIoError::InvalidTag("Entities"))?;
        entities.add(EntityRecord {
            id,
            data: data.clone(),
        });
    }
    Ok(())
}

fn uuid_to_ints(id: Uuid) -> [i32; 4] {
    let bits = id.as_u128();
    [
        (bits >> 96) as i32,
        (bits >> 64) as i32,
        (bits >> 32) as i32,
        bits as i32,
    ]
}

fn ints_to_uuid(ints: [i32; 4]) -> Uuid {
    let bits = ints
        .iter()
        .fold(0u128, |acc, part| (acc << 32) | u128::from(*part as u32));
    Uuid::from_u128(bits)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::block::{BlockRegistry, blocks};

    fn sample_column() -> Column {
        let registry = BlockRegistry::vanilla();
        let mut column = Column::new(ColumnPos::new(-3, 7));
        column.set_block_state(BlockPos::new(-45, 70, 113), blocks::STONE, &registry);
        column.set_block_state(BlockPos::new(-48, 20, 112), blocks::WATER, &registry);
        column.set_biome(2, 5, 4);
        column
    }

    #[test]
    fn column_round_trip() {
        let column = sample_column();
        let bytes = encode(write_column(&column).expect("writable")).expect("encodes");
        let read = read_column(&decode(&bytes).expect("decodes"), column.pos())
            .expect("valid")
            .expect("same version");
        assert_eq!(read.opacity_index(), column.opacity_index());
        assert_eq!(read.biome(2, 5), Some(4));
        assert_eq!(read.biome(0, 0), None);
        assert!(!read.is_modified());
        assert!(!read.has_cubes());
    }

    #[test]
    fn old_column_versions_are_regenerated() {
        let mut nbt = write_column(&sample_column()).expect("writable");
        nbt.remove("v");
        nbt.insert("v", NbtTag::Int(CUBE_IO_VERSION + 1));
        assert!(matches!(read_column(&nbt, ColumnPos::new(-3, 7)), Ok(None)));
    }

    #[test]
    fn cube_round_trip() {
        let mut column = sample_column();
        let hash = column.opacity_index().content_hash();
        let pos = CubePos::new(-3, 4, 7);
        let cube = column.cube_mut(4).expect("created by the edit");
        cube.set_generator_stage(GeneratorStage::Features);
        cube.set_light(LightKind::Block, LocalPos::new(3, 6, 1), 9);
        cube.set_light(LightKind::Sky, LocalPos::new(3, 7, 1), 4);
        let mut data = NbtCompound::new();
        data.insert("Count", NbtTag::Int(3));
        cube.set_block_entity(LocalPos::new(1, 2, 3), data.clone());
        cube.schedule_tick(ScheduledTick::with_priority(
            blocks::WATER,
            BlockPos::new(-40, 66, 120),
            110,
            TickPriority::High,
            0,
        ));
        let entity = EntityRecord::new(data.clone());
        cube.entities_mut().add(entity.clone());

        let bytes = encode(write_cube(cube, hash, true, 100)).expect("encodes");
        let read = read_cube(&decode(&bytes).expect("decodes"), pos, hash, true, 1000)
            .expect("valid");

        assert_eq!(read.generator_stage(), GeneratorStage::Features);
        assert_eq!(read.block_state(LocalPos::new(3, 6, 1)), blocks::STONE);
        assert_eq!(read.light(LightKind::Block, LocalPos::new(3, 6, 1)), 9);
        assert_eq!(read.light(LightKind::Sky, LocalPos::new(3, 7, 1)), 4);
        assert_eq!(read.block_entity(LocalPos::new(1, 2, 3)), Some(&data));
        assert_eq!(read.entities().get(entity.id), Some(&entity));

        let tick = read.ticks().iter().next().expect("one tick");
        assert_eq!(tick.trigger_tick, 1010);
        assert_eq!(tick.priority, TickPriority::High);
        assert_eq!(tick.tick_type, blocks::WATER);

        assert!(!read.needs_relight());
        assert!(!read.is_modified());
    }

    #[test]
    fn every_voxel_survives_a_cube_round_trip() {
        let pos = CubePos::new(2, -1, 5);
        let mut cube = Cube::new(pos);
        let states = [
            blocks::STONE,
            blocks::DIRT,
            blocks::AIR,
            blocks::WATER,
            blocks::GLOWSTONE,
        ];
        for (i, local) in LocalPos::all().enumerate() {
            cube.set_block_state(local, states[i % states.len()]);
            cube.set_light(LightKind::Sky, local, (i % 16) as u8);
            cube.set_light(LightKind::Block, local, ((i / 7) % 16) as u8);
        }

        let bytes = encode(write_cube(&cube, 77, true, 0)).expect("encodes");
        let read =
            read_cube(&decode(&bytes).expect("decodes"), pos, 77, true, 0).expect("valid");
        assert!(!read.needs_relight());
        assert_eq!(read.block_storage(), cube.block_storage());
        for kind in LightKind::ALL {
            assert_eq!(read.light_storage(kind), cube.light_storage(kind));
        }
    }

    #[test]
    fn stale_opacity_hash_requests_relight() {
        let column = sample_column();
        let cube = column.cube(4).expect("created by the edit");
        let nbt = write_cube(cube, 1234, true, 0);
        let read = read_cube(&nbt, cube.pos(), 4321, true, 0).expect("valid");
        assert!(read.needs_relight());

        let mut without_hash = write_cube(cube, 1234, true, 0);
        without_hash.remove("OpacityIndex");
        let read = read_cube(&without_hash, cube.pos(), 1234, true, 0).expect("valid");
        assert!(read.needs_relight());
    }

    #[test]
    fn sky_light_is_skipped_without_sky() {
        let column = sample_column();
        let cube = column.cube(4).expect("created by the edit");
        let nbt = write_cube(cube, 0, false, 0);
        assert!(nbt.byte_array("SkyLight").is_none());
        let read = read_cube(&nbt, cube.pos(), 0, false, 0).expect("valid");
        assert_eq!(read.light(LightKind::Sky, LocalPos::new(0, 0, 0)), 0);
    }

    #[test]
    fn mismatched_coordinates_are_errors() {
        let column = sample_column();
        let cube = column.cube(4).expect("created by the edit");
        let nbt = write_cube(cube, 0, true, 0);
        let err = read_cube(&nbt, CubePos::new(-3, 5, 7), 0, true, 0).unwrap_err();
        assert!(matches!(err, CubeIoError::CoordinateMismatch { .. }));

        let nbt = write_column(&column).expect("writable");
        let err = read_column(&nbt, ColumnPos::new(0, 0)).unwrap_err();
        assert!(matches!(err, CubeIoError::CoordinateMismatch { .. }));
    }

    #[test]
    fn future_cube_version_is_an_error() {
        let column = sample_column();
        let cube = column.cube(4).expect("created by the edit");
        let mut nbt = write_cube(cube, 0, true, 0);
        nbt.remove("v");
        nbt.insert("v", NbtTag::Int(9));
        assert!(matches!(
            read_cube(&nbt, cube.pos(), 0, true, 0),
            Err(CubeIoError::VersionMismatch { found: 9, .. })
        ));
    }

    #[test]
    fn uuid_ints_round_trip() {
        let id = Uuid::new_v4();
        assert_eq!(ints_to_uuid(uuid_to_ints(id)), id);
    }
}
