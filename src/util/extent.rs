//! Block arithmetic for sparse image bindings.

use ash::vk;

/// Divide, rounding up. Used to count sparse blocks along one axis.
pub fn div_up(value: u32, divisor: u32) -> u32 {
    debug_assert!(divisor > 0);
    (value + divisor - 1) / divisor
}

/// Extent of one mip level, given the level 0 extent.
pub fn mip_extent(base: vk::Extent3D, level: u32) -> vk::Extent3D {
    vk::Extent3D {
        width: (base.width >> level).max(1),
        height: (base.height >> level).max(1),
        depth: (base.depth >> level).max(1),
    }
}

/// Number of sparse blocks along each axis for a subresource extent.
pub fn block_counts(extent: vk::Extent3D, block: vk::Extent3D) -> (u32, u32, u32) {
    (
        div_up(extent.width, block.width.max(1)),
        div_up(extent.height, block.height.max(1)),
        div_up(extent.depth, block.depth.max(1)),
    )
}

/// Linear block index of the block containing `offset` within a subresource.
/// Blocks are numbered x-major, then y, then z, matching the order sparse
/// bind ranges walk the subresource.
pub fn block_index(
    offset: vk::Offset3D,
    extent: vk::Extent3D,
    block: vk::Extent3D,
) -> u64 {
    let (nx, ny, _) = block_counts(extent, block);
    let bx = offset.x.max(0) as u32 / block.width.max(1);
    let by = offset.y.max(0) as u32 / block.height.max(1);
    let bz = offset.z.max(0) as u32 / block.depth.max(1);
    bz as u64 * nx as u64 * ny as u64 + by as u64 * nx as u64 + bx as u64
}
