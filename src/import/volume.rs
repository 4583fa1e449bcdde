//! Raw (headerless) volume import parameters.
//!
//! A raw volume is just voxels on disk; the caller supplies the
//! dimensions, the voxel type, and whether bytes need swapping.
//! Validation is fail-fast: nothing is read until the parameters are
//! coherent.

use std::path::Path;

use byteorder::{NativeEndian, ReadBytesExt};
use tracing::info;

use super::read_bytes;
use crate::util::{Error, Result};

/// On-disk voxel representation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VoxelType {
    UnsignedByte,
    SignedShort,
    SignedInt,
    Float,
}

impl VoxelType {
    /// Bytes per voxel.
    pub const fn size(self) -> usize {
        match self {
            VoxelType::UnsignedByte => 1,
            VoxelType::SignedShort => 2,
            VoxelType::SignedInt => 4,
            VoxelType::Float => 4,
        }
    }
}

/// Import parameters for a raw volume file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RawVolumeParams {
    pub dimensions: [i64; 3],
    pub voxel_type: VoxelType,
    /// Swap byte order while reading (file written on an
    /// opposite-endian machine).
    pub byte_swap: bool,
}

impl RawVolumeParams {
    pub fn new(dimensions: [i64; 3], voxel_type: VoxelType, byte_swap: bool) -> Self {
        Self {
            dimensions,
            voxel_type,
            byte_swap,
        }
    }

    /// Total voxel count. Fails when any dimension is non-positive.
    pub fn voxel_count(&self) -> Result<usize> {
        for (axis, &d) in self.dimensions.iter().enumerate() {
            if d <= 0 {
                return Err(Error::PolicyViolation(format!(
                    "volume dimension {} is {}; all dimensions must be positive",
                    axis, d
                )));
            }
        }
        Ok(self.dimensions.iter().product::<i64>() as usize)
    }
}

/// Read a raw volume into a flat voxel array (x fastest).
pub fn import_raw_volume(path: impl AsRef<Path>, params: &RawVolumeParams) -> Result<Vec<f32>> {
    let path = path.as_ref();
    let count = params.voxel_count()?;

    let data = read_bytes(path)?;
    let needed = count * params.voxel_type.size();
    if data.len() < needed {
        return Err(Error::format(
            path,
            0,
            format!("volume needs {} bytes, file has {}", needed, data.len()),
        ));
    }

    let mut cursor = data.as_slice();
    let mut voxels = Vec::with_capacity(count);
    for _ in 0..count {
        let value = read_voxel(&mut cursor, params.voxel_type, params.byte_swap)
            .map_err(Error::Io)?;
        voxels.push(value);
    }
    info!(path = %path.display(), voxels = count, voxel_type = ?params.voxel_type, "imported raw volume");
    Ok(voxels)
}

fn read_voxel(
    cursor: &mut &[u8],
    voxel_type: VoxelType,
    byte_swap: bool,
) -> std::io::Result<f32> {
    let swap = |v: u32| if byte_swap { v.swap_bytes() } else { v };
    Ok(match voxel_type {
        VoxelType::UnsignedByte => f32::from(cursor.read_u8()?),
        VoxelType::SignedShort => {
            let v = cursor.read_u16::<NativeEndian>()?;
            (if byte_swap { v.swap_bytes() } else { v }) as i16 as f32
        }
        VoxelType::SignedInt => swap(cursor.read_u32::<NativeEndian>()?) as i32 as f32,
        VoxelType::Float => f32::from_bits(swap(cursor.read_u32::<NativeEndian>()?)),
    })
}
