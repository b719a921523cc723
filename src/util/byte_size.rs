use std::mem::size_of;

use ash::vk;

/// Simple trait to get the size of one element in bytes of a `vk::Format`.
pub trait ByteSize {
    /// Returns the size, in bytes, of one element of this thing, or `None`
    /// when the size is not known (multi-planar and block-compressed formats).
    fn byte_size(&self) -> Option<usize>;
}

impl ByteSize for vk::Format {
    /// If an image is created with this format, then the return value of this
    /// function is the size in bytes of one pixel. Callers that get `None`
    /// fall back to whole-resource granularity.
    fn byte_size(&self) -> Option<usize> {
        let size = match *self {
            vk::Format::R8_UNORM
            | vk::Format::R8_SNORM
            | vk::Format::R8_UINT
            | vk::Format::R8_SINT
            | vk::Format::S8_UINT => 1,
            vk::Format::R8G8_UNORM
            | vk::Format::R8G8_SNORM
            | vk::Format::R16_SFLOAT
            | vk::Format::R16_UNORM
            | vk::Format::R16_UINT
            | vk::Format::D16_UNORM => 2,
            vk::Format::R8G8B8_UNORM | vk::Format::B8G8R8_UNORM => 3,
            vk::Format::R8G8B8A8_UNORM
            | vk::Format::R8G8B8A8_SRGB
            | vk::Format::R8G8B8A8_UINT
            | vk::Format::B8G8R8A8_UNORM
            | vk::Format::B8G8R8A8_SRGB
            | vk::Format::A2B10G10R10_UNORM_PACK32
            | vk::Format::R16G16_SFLOAT
            | vk::Format::R32_SFLOAT
            | vk::Format::R32_UINT
            | vk::Format::R32_SINT
            | vk::Format::D32_SFLOAT
            | vk::Format::D24_UNORM_S8_UINT => 4,
            vk::Format::D32_SFLOAT_S8_UINT => 5,
            vk::Format::R16G16B16A16_SFLOAT | vk::Format::R32G32_SFLOAT => 8,
            vk::Format::R32G32B32_SFLOAT => 3 * size_of::<f32>(),
            vk::Format::R32G32B32A32_SFLOAT => 4 * size_of::<f32>(),
            _ => return None,
        };
        Some(size)
    }
}
