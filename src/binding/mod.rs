//! The memory binding engine.
//!
//! Every resource (buffer or image) carries an ordered interval list mapping
//! its address space to backing data: memory spans for opaque and sparse
//! binds, labels for swapchain-owned images. The list answers "which backing
//! data variables cover `[offset, offset + size)` of this resource?",
//! the question every read/write stamping path asks.
//!
//! Vulkan rebinding semantics apply: adding a binding overwrites prior
//! bindings over the overlapped region.

use ash::vk;

use crate::core::error::Error;
use crate::graph::variable::{MemorySpan, Var, VariableId};

/// Backing data of one binding interval.
#[derive(Debug, Copy, Clone)]
pub enum BackingData {
    /// An interval of a device memory object (opaque or sparse bind).
    Span(MemorySpan),
    /// A label standing in for data the application never owns, e.g. the
    /// presentation engine's storage of a swapchain image.
    Label(VariableId),
}

/// One interval of a resource's address space together with its backing.
#[derive(Debug, Copy, Clone)]
pub struct ResBinding {
    /// Start of the interval in resource address space.
    pub offset: u64,
    /// Size of the interval in bytes.
    pub size: u64,
    /// Where the interval's data actually lives.
    pub data: BackingData,
}

impl ResBinding {
    /// An opaque binding of `[offset, offset + size)` of the resource to
    /// device memory at `memory_offset`.
    pub fn opaque(
        offset: u64,
        size: u64,
        memory: vk::DeviceMemory,
        memory_offset: u64,
    ) -> Self {
        ResBinding {
            offset,
            size,
            data: BackingData::Span(MemorySpan::new(memory, memory_offset, size)),
        }
    }

    /// A label-backed binding covering `[offset, offset + size)`.
    pub fn labeled(offset: u64, size: u64, label: VariableId) -> Self {
        ResBinding {
            offset,
            size,
            data: BackingData::Label(label),
        }
    }

    /// End of the interval in resource address space.
    pub fn end(&self) -> u64 {
        self.offset.saturating_add(self.size)
    }

    /// The backing data as an emitter variable reference.
    pub fn backing_var(&self) -> Var {
        match self.data {
            BackingData::Span(span) => Var::Span(span),
            BackingData::Label(label) => Var::Id(label),
        }
    }

    /// Clip this binding to `[offset, offset + size)` in resource address
    /// space. The returned sub-binding shares the same backing data with the
    /// memory span shrunk to the intersection; label-backed bindings may
    /// only be returned whole.
    fn shrink(&self, offset: u64, size: u64) -> Result<ResBinding, Error> {
        if offset < self.offset || offset.saturating_add(size) > self.end() {
            return Err(Error::BindingOutOfBounds {
                offset: offset.saturating_sub(self.offset),
                size,
                bind_size: self.size,
            });
        }
        if offset == self.offset && size == self.size {
            return Ok(*self);
        }
        match self.data {
            BackingData::Span(span) => {
                let shift = offset - self.offset;
                Ok(ResBinding {
                    offset,
                    size,
                    data: BackingData::Span(MemorySpan {
                        memory: span.memory,
                        start: span.start + shift,
                        end: span.start + shift + size,
                    }),
                })
            }
            BackingData::Label(_) => Err(Error::BindingNotResizable),
        }
    }
}

/// Ordered, non-overlapping interval list of [`ResBinding`]s for a single
/// resource.
#[derive(Debug, Default)]
pub struct BindingList {
    bindings: Vec<ResBinding>,
}

impl BindingList {
    /// Create an empty binding list.
    pub fn new() -> Self {
        Self::default()
    }

    /// All bindings in address order.
    pub fn bindings(&self) -> &[ResBinding] {
        &self.bindings
    }

    /// One past the last bound byte; zero for an empty list.
    pub fn end(&self) -> u64 {
        self.bindings.last().map(|b| b.end()).unwrap_or(0)
    }

    /// Insert `binding`, preserving address order. Prior bindings are
    /// replaced over the overlap region; a prior binding strictly containing
    /// the new one is split around it.
    pub fn add(&mut self, binding: ResBinding) {
        let mut result: Vec<ResBinding> = Vec::with_capacity(self.bindings.len() + 1);
        let mut inserted = false;
        for existing in &self.bindings {
            if existing.end() <= binding.offset || existing.offset >= binding.end() {
                if !inserted && existing.offset >= binding.end() {
                    result.push(binding);
                    inserted = true;
                }
                result.push(*existing);
                continue;
            }
            if existing.offset < binding.offset {
                match existing.shrink(existing.offset, binding.offset - existing.offset) {
                    Ok(left) => result.push(left),
                    Err(e) => warn!("dropping left remainder of rebound interval: {e}"),
                }
            }
            if !inserted {
                result.push(binding);
                inserted = true;
            }
            if existing.end() > binding.end() {
                match existing.shrink(binding.end(), existing.end() - binding.end()) {
                    Ok(right) => result.push(right),
                    Err(e) => warn!("dropping right remainder of rebound interval: {e}"),
                }
            }
        }
        if !inserted {
            result.push(binding);
        }
        self.bindings = result;
    }

    /// The ordered sub-list of bindings covering `[offset, offset + size)`,
    /// with boundary bindings clipped to the requested range. `size` may be
    /// [`vk::WHOLE_SIZE`]; an `offset + size` that overflows is clamped the
    /// same way. Bindings that fail to clip are logged and dropped.
    pub fn sub_list(&self, offset: u64, size: u64) -> Vec<ResBinding> {
        let end = if size == vk::WHOLE_SIZE {
            self.end()
        } else {
            offset.checked_add(size).unwrap_or_else(|| self.end())
        };
        let mut result = Vec::new();
        for binding in &self.bindings {
            if binding.end() <= offset || binding.offset >= end {
                continue;
            }
            let clip_start = binding.offset.max(offset);
            let clip_end = binding.end().min(end);
            match binding.shrink(clip_start, clip_end - clip_start) {
                Ok(sub) => result.push(sub),
                Err(e) => warn!(
                    "dropping sub-binding [{clip_start}, {clip_end}) of binding at {}: {e}",
                    binding.offset
                ),
            }
        }
        result
    }

    /// Flatten [`sub_list`](Self::sub_list) to the backing-data variables,
    /// ready for read/write stamping.
    pub fn bound_data(&self, offset: u64, size: u64) -> Vec<Var> {
        self.sub_list(offset, size)
            .iter()
            .map(|b| b.backing_var())
            .collect()
    }

    /// Backing data of the entire resource.
    pub fn all_data(&self) -> Vec<Var> {
        self.bindings.iter().map(|b| b.backing_var()).collect()
    }
}
