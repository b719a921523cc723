//! Per-handle shadow state maintained across the command stream.
//!
//! The shadow state mirrors what the builder needs to know about every live
//! handle: where resources are bound, what each descriptor slot holds, what
//! a command buffer has recorded, and the label pairs of synchronization
//! primitives. Entries are created on `vkCreate*`/`vkAllocate*`, mutated as
//! the trace progresses, and deleted on `vkDestroy*`/`vkFree*`.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use ash::vk;

use crate::binding::BindingList;
use crate::graph::variable::{MemorySpan, Var, VariableId, VariableTable};
use crate::record::RecordedCommand;
use crate::trace::command::DescriptorContents;

/// One sparse block binding of an image subresource.
#[derive(Debug, Copy, Clone)]
pub struct SparseBlock {
    /// The sparse-binding variable, written by the `vkQueueBindSparse` that
    /// established the block.
    pub var: VariableId,
    /// Backing memory range of the block.
    pub span: MemorySpan,
}

/// Shadow state of a `VkImage`: layout label, opaque bindings and the
/// four-level sparse map `aspect → layer → level → block index → binding`.
#[derive(Debug, Default)]
pub struct ImageState {
    /// Layout label, conservatively modified on every transition.
    pub layout: Option<VariableId>,
    /// Opaque (non-sparse) bindings.
    pub opaque: BindingList,
    /// Sparse block bindings.
    pub sparse: HashMap<vk::ImageAspectFlags, HashMap<u32, HashMap<u32, BTreeMap<u64, SparseBlock>>>>,
    /// Whether the image is owned by a swapchain.
    pub is_swapchain: bool,
}

impl ImageState {
    /// All backing-data variables of the image: opaque bindings plus every
    /// sparse block (binding variable and backing span).
    pub fn data(&self) -> Vec<Var> {
        let mut data = self.opaque.all_data();
        for layers in self.sparse.values() {
            for levels in layers.values() {
                for blocks in levels.values() {
                    for block in blocks.values() {
                        data.push(Var::Id(block.var));
                        data.push(Var::Span(block.span));
                    }
                }
            }
        }
        data
    }
}

/// Shadow state of a `VkBuffer`.
#[derive(Debug, Default)]
pub struct BufferState {
    /// Memory bindings of the buffer.
    pub bindings: BindingList,
}

/// One descriptor slot: its abstract variable plus the last written
/// contents.
#[derive(Debug, Clone)]
pub struct DescriptorSlot {
    /// Slot variable; written by `vkUpdateDescriptorSets`, read by draws.
    pub var: VariableId,
    /// Contents, `None` until the first update.
    pub contents: Option<DescriptorContents>,
}

/// One binding of a descriptor set.
#[derive(Debug, Clone)]
pub struct DescriptorBindingState {
    /// Descriptor type of the binding.
    pub ty: vk::DescriptorType,
    /// Array slots of the binding.
    pub slots: Vec<DescriptorSlot>,
}

/// Shadow state of a `VkDescriptorSet`.
#[derive(Debug, Default)]
pub struct DescriptorSetState {
    /// Bindings keyed by binding number; ordered so dynamic offsets are
    /// consumed in binding order.
    pub bindings: BTreeMap<u32, DescriptorBindingState>,
    /// Number of dynamic descriptors in the set, sizing the dynamic-offset
    /// snapshot taken at bind time.
    pub dynamic_count: usize,
}

/// Shadow state of a `VkCommandBuffer`.
#[derive(Debug)]
pub struct CommandBufferState {
    /// Label written by `vkBeginCommandBuffer`.
    pub begin: VariableId,
    /// Label written by `vkEndCommandBuffer`.
    pub end: VariableId,
    /// Forward-paired label pairing `vkCmdBeginRenderPass` with its end.
    pub render_pass_begin: VariableId,
    /// Deferred commands in record order.
    pub records: Vec<Arc<RecordedCommand>>,
    /// Primary or secondary.
    pub level: vk::CommandBufferLevel,
    /// Pool the buffer was allocated from.
    pub pool: vk::CommandPool,
}

impl CommandBufferState {
    /// Fresh state for a newly allocated command buffer.
    pub fn new(table: &mut VariableTable, level: vk::CommandBufferLevel, pool: vk::CommandPool) -> Self {
        CommandBufferState {
            begin: table.new_label(),
            end: table.new_label(),
            render_pass_begin: table.new_forward_label(),
            records: Vec::new(),
            level,
            pool,
        }
    }
}

/// Signal/unsignal label pair shared by semaphores, fences and events.
#[derive(Debug, Copy, Clone)]
pub struct SignalPair {
    /// Written when the primitive becomes signaled.
    pub signal: VariableId,
    /// Written when the primitive becomes unsignaled.
    pub unsignal: VariableId,
}

impl SignalPair {
    /// Allocate a fresh pair.
    pub fn new(table: &mut VariableTable) -> Self {
        SignalPair {
            signal: table.new_label(),
            unsignal: table.new_label(),
        }
    }
}

/// Per-query label quad of a query pool.
#[derive(Debug, Copy, Clone)]
pub struct QueryState {
    /// Written by `vkCmdResetQueryPool`.
    pub reset: VariableId,
    /// Written by `vkCmdBeginQuery`.
    pub begin: VariableId,
    /// Written by `vkCmdEndQuery`.
    pub end: VariableId,
    /// Written when results are copied or read.
    pub result: VariableId,
}

/// Shadow state of a `VkQueryPool`.
#[derive(Debug, Default)]
pub struct QueryPoolState {
    /// One label quad per query.
    pub queries: Vec<QueryState>,
}

/// Shadow state of a `VkSwapchainKHR`.
#[derive(Debug, Default)]
pub struct SwapchainState {
    /// Swapchain images, in image-index order.
    pub images: Vec<vk::Image>,
    /// Per-image label written when the image is acquired.
    pub acquired: Vec<VariableId>,
    /// Per-image label written when the image is presented.
    pub presented: Vec<VariableId>,
}

/// The complete shadow state of one builder instance.
#[derive(Default)]
pub struct ShadowState {
    /// Live images.
    pub images: HashMap<vk::Image, ImageState>,
    /// Live buffers.
    pub buffers: HashMap<vk::Buffer, BufferState>,
    /// Live descriptor sets.
    pub descriptor_sets: HashMap<vk::DescriptorSet, DescriptorSetState>,
    /// Sets allocated from each descriptor pool, for pool-level resets.
    pub descriptor_pool_sets: HashMap<vk::DescriptorPool, Vec<vk::DescriptorSet>>,
    /// Live command buffers.
    pub command_buffers: HashMap<vk::CommandBuffer, CommandBufferState>,
    /// Live semaphores.
    pub semaphores: HashMap<vk::Semaphore, SignalPair>,
    /// Live fences.
    pub fences: HashMap<vk::Fence, SignalPair>,
    /// Live events.
    pub events: HashMap<vk::Event, SignalPair>,
    /// Live query pools.
    pub query_pools: HashMap<vk::QueryPool, QueryPoolState>,
    /// Live swapchains.
    pub swapchains: HashMap<vk::SwapchainKHR, SwapchainState>,
    /// Coherently mapped memory ranges as `(offset, end)`, tracked between
    /// map and unmap.
    pub coherent_memories: HashMap<vk::DeviceMemory, (u64, u64)>,
}

impl ShadowState {
    /// Backing data of an image, or `None` when the handle is unknown.
    pub fn image_data(&self, image: vk::Image) -> Option<Vec<Var>> {
        self.images.get(&image).map(ImageState::data)
    }

    /// Layout label of an image.
    pub fn image_layout(&self, image: vk::Image) -> Option<VariableId> {
        self.images.get(&image).and_then(|s| s.layout)
    }

    /// Command buffers allocated from `pool`, for pool-level operations.
    pub fn buffers_of_pool(&self, pool: vk::CommandPool) -> Vec<vk::CommandBuffer> {
        self.command_buffers
            .iter()
            .filter(|(_, state)| state.pool == pool)
            .map(|(&handle, _)| handle)
            .collect()
    }
}
