//! The command stream vocabulary.
//!
//! One variant per Vulkan command the dispatcher understands, carrying the
//! call arguments the builder needs. Object *properties* (sizes, formats,
//! subpass layouts, …) are not duplicated here; the builder reads them from
//! the collaborator's [`StateSnapshot`](crate::trace::snapshot::StateSnapshot)
//! after mutation. Commands outside this vocabulary travel as
//! [`Command::Other`] and are kept alive by the dispatcher.

use ash::vk;

/// Contents of one descriptor slot, as delivered by
/// `vkUpdateDescriptorSets`. The same type describes the slot contents in
/// the shadow state.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DescriptorContents {
    /// A lone sampler.
    Sampler {
        /// Sampler handle.
        sampler: vk::Sampler,
    },
    /// An image descriptor (sampled, storage, combined, input attachment).
    Image {
        /// Image view the descriptor points at.
        view: vk::ImageView,
        /// Combined sampler, null unless the type carries one.
        sampler: vk::Sampler,
    },
    /// A buffer descriptor (uniform/storage, plain or dynamic).
    Buffer {
        /// Buffer handle.
        buffer: vk::Buffer,
        /// Offset into the buffer.
        offset: vk::DeviceSize,
        /// Range of the descriptor; may be [`vk::WHOLE_SIZE`].
        range: vk::DeviceSize,
    },
    /// A texel buffer view, pre-resolved by the collaborator to the window
    /// of its underlying buffer.
    TexelBufferView {
        /// Underlying buffer handle.
        buffer: vk::Buffer,
        /// Offset of the view.
        offset: vk::DeviceSize,
        /// Range of the view; may be [`vk::WHOLE_SIZE`].
        range: vk::DeviceSize,
    },
}

/// One `VkWriteDescriptorSet`.
#[derive(Debug, Clone)]
pub struct DescriptorWrite {
    /// Destination set.
    pub set: vk::DescriptorSet,
    /// Destination binding; overflows carry to the next binding.
    pub binding: u32,
    /// First destination array element.
    pub array_element: u32,
    /// Descriptor type of the write.
    pub ty: vk::DescriptorType,
    /// New contents, one entry per descriptor.
    pub elements: Vec<DescriptorContents>,
}

/// One `VkCopyDescriptorSet`.
#[derive(Debug, Copy, Clone)]
pub struct DescriptorCopy {
    /// Source set.
    pub src_set: vk::DescriptorSet,
    /// Source binding.
    pub src_binding: u32,
    /// First source array element.
    pub src_array_element: u32,
    /// Destination set.
    pub dst_set: vk::DescriptorSet,
    /// Destination binding.
    pub dst_binding: u32,
    /// First destination array element.
    pub dst_array_element: u32,
    /// Number of descriptors to copy; overflows carry on both sides.
    pub count: u32,
}

/// A memory range passed to flush/invalidate.
#[derive(Debug, Copy, Clone)]
pub struct MappedRange {
    /// Device memory object.
    pub memory: vk::DeviceMemory,
    /// Start offset within the memory object.
    pub offset: vk::DeviceSize,
    /// Size; may be [`vk::WHOLE_SIZE`].
    pub size: vk::DeviceSize,
}

/// One batch of a `vkQueueSubmit` call.
#[derive(Debug, Clone, Default)]
pub struct SubmitBatch {
    /// Semaphores waited on before the batch executes.
    pub wait_semaphores: Vec<vk::Semaphore>,
    /// Command buffers executed by the batch, in order.
    pub command_buffers: Vec<vk::CommandBuffer>,
    /// Semaphores signaled when the batch completes.
    pub signal_semaphores: Vec<vk::Semaphore>,
}

/// One swapchain entry of a `vkQueuePresentKHR` call.
#[derive(Debug, Copy, Clone)]
pub struct PresentTarget {
    /// Swapchain being presented.
    pub swapchain: vk::SwapchainKHR,
    /// Index of the presented image within the swapchain.
    pub image_index: u32,
}

/// One image memory barrier of a `vkCmdPipelineBarrier`.
#[derive(Debug, Copy, Clone)]
pub struct ImageBarrier {
    /// Image being transitioned.
    pub image: vk::Image,
    /// Layout before the barrier.
    pub old_layout: vk::ImageLayout,
    /// Layout after the barrier.
    pub new_layout: vk::ImageLayout,
}

/// One buffer memory barrier of a `vkCmdPipelineBarrier`.
#[derive(Debug, Copy, Clone)]
pub struct BufferBarrier {
    /// Buffer the barrier covers.
    pub buffer: vk::Buffer,
    /// Start of the covered range.
    pub offset: vk::DeviceSize,
    /// Size of the covered range; may be [`vk::WHOLE_SIZE`].
    pub size: vk::DeviceSize,
}

/// One cleared attachment of a `vkCmdClearAttachments`.
#[derive(Debug, Copy, Clone)]
pub struct ClearAttachmentTarget {
    /// Aspects cleared.
    pub aspect_mask: vk::ImageAspectFlags,
    /// Color attachment index within the current subpass; ignored for
    /// depth/stencil aspects.
    pub color_attachment: u32,
}

/// Fixed-function state touched by the `vkCmdSet*` family.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DynamicState {
    /// `vkCmdSetViewport`
    Viewport,
    /// `vkCmdSetScissor`
    Scissor,
    /// `vkCmdSetLineWidth`
    LineWidth,
    /// `vkCmdSetDepthBias`
    DepthBias,
    /// `vkCmdSetBlendConstants`
    BlendConstants,
    /// `vkCmdSetDepthBounds`
    DepthBounds,
    /// `vkCmdSetStencilCompareMask`
    StencilCompareMask,
    /// `vkCmdSetStencilWriteMask`
    StencilWriteMask,
    /// `vkCmdSetStencilReference`
    StencilReference,
}

/// A Vulkan command as delivered by the collaborator, one variant per
/// understood command kind.
#[derive(Debug, Clone)]
#[allow(missing_docs)]
pub enum Command {
    // Resource lifecycle.
    CreateBuffer { buffer: vk::Buffer },
    DestroyBuffer { buffer: vk::Buffer },
    CreateImage { image: vk::Image },
    DestroyImage { image: vk::Image },
    CreateImageView { view: vk::ImageView },
    DestroyImageView { view: vk::ImageView },
    CreateSampler { sampler: vk::Sampler },
    DestroySampler { sampler: vk::Sampler },
    CreateRenderPass { render_pass: vk::RenderPass },
    DestroyRenderPass { render_pass: vk::RenderPass },
    CreateFramebuffer { framebuffer: vk::Framebuffer },
    DestroyFramebuffer { framebuffer: vk::Framebuffer },
    CreatePipelineLayout { layout: vk::PipelineLayout },
    DestroyPipelineLayout { layout: vk::PipelineLayout },
    CreateGraphicsPipelines { pipelines: Vec<vk::Pipeline> },
    CreateComputePipelines { pipelines: Vec<vk::Pipeline> },
    DestroyPipeline { pipeline: vk::Pipeline },
    CreateDescriptorSetLayout { layout: vk::DescriptorSetLayout },
    DestroyDescriptorSetLayout { layout: vk::DescriptorSetLayout },
    CreateDescriptorPool { pool: vk::DescriptorPool },
    DestroyDescriptorPool { pool: vk::DescriptorPool },
    ResetDescriptorPool { pool: vk::DescriptorPool },
    CreateQueryPool { pool: vk::QueryPool, query_count: u32 },
    DestroyQueryPool { pool: vk::QueryPool },
    CreateCommandPool { pool: vk::CommandPool },
    DestroyCommandPool { pool: vk::CommandPool },
    ResetCommandPool { pool: vk::CommandPool },

    // Memory.
    AllocateMemory { memory: vk::DeviceMemory },
    FreeMemory { memory: vk::DeviceMemory },
    MapMemory { memory: vk::DeviceMemory, offset: vk::DeviceSize, size: vk::DeviceSize },
    UnmapMemory { memory: vk::DeviceMemory },
    FlushMappedMemoryRanges { ranges: Vec<MappedRange> },
    InvalidateMappedMemoryRanges { ranges: Vec<MappedRange> },

    // Bindings.
    BindBufferMemory { buffer: vk::Buffer, memory: vk::DeviceMemory, offset: vk::DeviceSize },
    BindImageMemory { image: vk::Image, memory: vk::DeviceMemory, offset: vk::DeviceSize },
    QueueBindSparse {
        queue: vk::Queue,
        wait_semaphores: Vec<vk::Semaphore>,
        signal_semaphores: Vec<vk::Semaphore>,
        fence: vk::Fence,
    },

    // Descriptors.
    AllocateDescriptorSets {
        pool: vk::DescriptorPool,
        layouts: Vec<vk::DescriptorSetLayout>,
        sets: Vec<vk::DescriptorSet>,
    },
    FreeDescriptorSets { pool: vk::DescriptorPool, sets: Vec<vk::DescriptorSet> },
    UpdateDescriptorSets { writes: Vec<DescriptorWrite>, copies: Vec<DescriptorCopy> },

    // Command buffer lifecycle.
    AllocateCommandBuffers {
        pool: vk::CommandPool,
        level: vk::CommandBufferLevel,
        buffers: Vec<vk::CommandBuffer>,
    },
    FreeCommandBuffers { pool: vk::CommandPool, buffers: Vec<vk::CommandBuffer> },
    BeginCommandBuffer { buffer: vk::CommandBuffer },
    EndCommandBuffer { buffer: vk::CommandBuffer },
    ResetCommandBuffer { buffer: vk::CommandBuffer },

    // Recorded state commands.
    CmdBindPipeline {
        buffer: vk::CommandBuffer,
        bind_point: vk::PipelineBindPoint,
        pipeline: vk::Pipeline,
    },
    CmdBindDescriptorSets {
        buffer: vk::CommandBuffer,
        bind_point: vk::PipelineBindPoint,
        first_set: u32,
        sets: Vec<vk::DescriptorSet>,
        dynamic_offsets: Vec<u32>,
    },
    CmdBindVertexBuffers {
        buffer: vk::CommandBuffer,
        first_binding: u32,
        buffers: Vec<vk::Buffer>,
        offsets: Vec<vk::DeviceSize>,
    },
    CmdBindIndexBuffer {
        buffer: vk::CommandBuffer,
        index_buffer: vk::Buffer,
        offset: vk::DeviceSize,
        index_type: vk::IndexType,
    },
    CmdSetDynamicState { buffer: vk::CommandBuffer, state: DynamicState },
    CmdPushConstants { buffer: vk::CommandBuffer },

    // Render passes.
    CmdBeginRenderPass {
        buffer: vk::CommandBuffer,
        render_pass: vk::RenderPass,
        framebuffer: vk::Framebuffer,
    },
    CmdNextSubpass { buffer: vk::CommandBuffer },
    CmdEndRenderPass { buffer: vk::CommandBuffer },

    // Draws and dispatches.
    CmdDraw { buffer: vk::CommandBuffer, vertex_count: u32, instance_count: u32 },
    CmdDrawIndexed {
        buffer: vk::CommandBuffer,
        index_count: u32,
        instance_count: u32,
        first_index: u32,
    },
    CmdDrawIndirect {
        buffer: vk::CommandBuffer,
        indirect_buffer: vk::Buffer,
        offset: vk::DeviceSize,
        draw_count: u32,
        stride: u32,
    },
    CmdDrawIndexedIndirect {
        buffer: vk::CommandBuffer,
        indirect_buffer: vk::Buffer,
        offset: vk::DeviceSize,
        draw_count: u32,
        stride: u32,
    },
    CmdDispatch { buffer: vk::CommandBuffer },
    CmdDispatchIndirect {
        buffer: vk::CommandBuffer,
        indirect_buffer: vk::Buffer,
        offset: vk::DeviceSize,
    },

    // Copies, blits, clears, fills, updates.
    CmdCopyBuffer {
        buffer: vk::CommandBuffer,
        src: vk::Buffer,
        dst: vk::Buffer,
        regions: Vec<vk::BufferCopy>,
    },
    CmdCopyImage {
        buffer: vk::CommandBuffer,
        src: vk::Image,
        dst: vk::Image,
        regions: Vec<vk::ImageCopy>,
    },
    CmdCopyBufferToImage {
        buffer: vk::CommandBuffer,
        src: vk::Buffer,
        dst: vk::Image,
        regions: Vec<vk::BufferImageCopy>,
    },
    CmdCopyImageToBuffer {
        buffer: vk::CommandBuffer,
        src: vk::Image,
        dst: vk::Buffer,
        regions: Vec<vk::BufferImageCopy>,
    },
    CmdBlitImage {
        buffer: vk::CommandBuffer,
        src: vk::Image,
        dst: vk::Image,
        regions: Vec<vk::ImageBlit>,
    },
    CmdResolveImage {
        buffer: vk::CommandBuffer,
        src: vk::Image,
        dst: vk::Image,
        regions: Vec<vk::ImageResolve>,
    },
    CmdClearColorImage {
        buffer: vk::CommandBuffer,
        image: vk::Image,
        ranges: Vec<vk::ImageSubresourceRange>,
    },
    CmdClearDepthStencilImage {
        buffer: vk::CommandBuffer,
        image: vk::Image,
        ranges: Vec<vk::ImageSubresourceRange>,
    },
    CmdClearAttachments {
        buffer: vk::CommandBuffer,
        attachments: Vec<ClearAttachmentTarget>,
    },
    CmdFillBuffer {
        buffer: vk::CommandBuffer,
        dst: vk::Buffer,
        offset: vk::DeviceSize,
        size: vk::DeviceSize,
    },
    CmdUpdateBuffer {
        buffer: vk::CommandBuffer,
        dst: vk::Buffer,
        offset: vk::DeviceSize,
        size: vk::DeviceSize,
    },

    // Synchronization.
    CmdPipelineBarrier {
        buffer: vk::CommandBuffer,
        image_barriers: Vec<ImageBarrier>,
        buffer_barriers: Vec<BufferBarrier>,
    },
    CmdSetEvent { buffer: vk::CommandBuffer, event: vk::Event },
    CmdResetEvent { buffer: vk::CommandBuffer, event: vk::Event },
    CmdWaitEvents { buffer: vk::CommandBuffer, events: Vec<vk::Event> },
    CreateSemaphore { semaphore: vk::Semaphore },
    DestroySemaphore { semaphore: vk::Semaphore },
    CreateFence { fence: vk::Fence },
    DestroyFence { fence: vk::Fence },
    ResetFences { fences: Vec<vk::Fence> },
    WaitForFences { fences: Vec<vk::Fence> },
    GetFenceStatus { fence: vk::Fence },
    CreateEvent { event: vk::Event },
    DestroyEvent { event: vk::Event },
    SetEvent { event: vk::Event },
    ResetEvent { event: vk::Event },
    GetEventStatus { event: vk::Event },

    // Queries.
    CmdResetQueryPool {
        buffer: vk::CommandBuffer,
        pool: vk::QueryPool,
        first_query: u32,
        query_count: u32,
    },
    CmdBeginQuery { buffer: vk::CommandBuffer, pool: vk::QueryPool, query: u32 },
    CmdEndQuery { buffer: vk::CommandBuffer, pool: vk::QueryPool, query: u32 },
    CmdCopyQueryPoolResults {
        buffer: vk::CommandBuffer,
        pool: vk::QueryPool,
        first_query: u32,
        query_count: u32,
        dst: vk::Buffer,
        offset: vk::DeviceSize,
        stride: vk::DeviceSize,
    },
    GetQueryPoolResults { pool: vk::QueryPool, first_query: u32, query_count: u32 },

    // Secondary command buffers.
    CmdExecuteCommands {
        buffer: vk::CommandBuffer,
        secondaries: Vec<vk::CommandBuffer>,
    },

    // Queue operations.
    QueueSubmit {
        queue: vk::Queue,
        submits: Vec<SubmitBatch>,
        fence: vk::Fence,
    },
    QueueWaitIdle { queue: vk::Queue },
    DeviceWaitIdle,

    // Presentation.
    CreateSwapchain { swapchain: vk::SwapchainKHR },
    DestroySwapchain { swapchain: vk::SwapchainKHR },
    GetSwapchainImages { swapchain: vk::SwapchainKHR, images: Vec<vk::Image> },
    AcquireNextImage {
        swapchain: vk::SwapchainKHR,
        semaphore: vk::Semaphore,
        fence: vk::Fence,
        image_index: u32,
    },
    QueuePresent {
        queue: vk::Queue,
        wait_semaphores: Vec<vk::Semaphore>,
        targets: Vec<PresentTarget>,
    },

    /// Any command outside the vocabulary above. Kept alive by the
    /// dispatcher: the default is never to drop what we do not understand.
    Other { name: String },
}

impl Command {
    /// Name of the underlying Vulkan entry point, for logging.
    pub fn name(&self) -> &str {
        match self {
            Command::CreateBuffer { .. } => "vkCreateBuffer",
            Command::DestroyBuffer { .. } => "vkDestroyBuffer",
            Command::CreateImage { .. } => "vkCreateImage",
            Command::DestroyImage { .. } => "vkDestroyImage",
            Command::CreateImageView { .. } => "vkCreateImageView",
            Command::DestroyImageView { .. } => "vkDestroyImageView",
            Command::CreateSampler { .. } => "vkCreateSampler",
            Command::DestroySampler { .. } => "vkDestroySampler",
            Command::CreateRenderPass { .. } => "vkCreateRenderPass",
            Command::DestroyRenderPass { .. } => "vkDestroyRenderPass",
            Command::CreateFramebuffer { .. } => "vkCreateFramebuffer",
            Command::DestroyFramebuffer { .. } => "vkDestroyFramebuffer",
            Command::CreatePipelineLayout { .. } => "vkCreatePipelineLayout",
            Command::DestroyPipelineLayout { .. } => "vkDestroyPipelineLayout",
            Command::CreateGraphicsPipelines { .. } => "vkCreateGraphicsPipelines",
            Command::CreateComputePipelines { .. } => "vkCreateComputePipelines",
            Command::DestroyPipeline { .. } => "vkDestroyPipeline",
            Command::CreateDescriptorSetLayout { .. } => "vkCreateDescriptorSetLayout",
            Command::DestroyDescriptorSetLayout { .. } => "vkDestroyDescriptorSetLayout",
            Command::CreateDescriptorPool { .. } => "vkCreateDescriptorPool",
            Command::DestroyDescriptorPool { .. } => "vkDestroyDescriptorPool",
            Command::ResetDescriptorPool { .. } => "vkResetDescriptorPool",
            Command::CreateQueryPool { .. } => "vkCreateQueryPool",
            Command::DestroyQueryPool { .. } => "vkDestroyQueryPool",
            Command::CreateCommandPool { .. } => "vkCreateCommandPool",
            Command::DestroyCommandPool { .. } => "vkDestroyCommandPool",
            Command::ResetCommandPool { .. } => "vkResetCommandPool",
            Command::AllocateMemory { .. } => "vkAllocateMemory",
            Command::FreeMemory { .. } => "vkFreeMemory",
            Command::MapMemory { .. } => "vkMapMemory",
            Command::UnmapMemory { .. } => "vkUnmapMemory",
            Command::FlushMappedMemoryRanges { .. } => "vkFlushMappedMemoryRanges",
            Command::InvalidateMappedMemoryRanges { .. } => "vkInvalidateMappedMemoryRanges",
            Command::BindBufferMemory { .. } => "vkBindBufferMemory",
            Command::BindImageMemory { .. } => "vkBindImageMemory",
            Command::QueueBindSparse { .. } => "vkQueueBindSparse",
            Command::AllocateDescriptorSets { .. } => "vkAllocateDescriptorSets",
            Command::FreeDescriptorSets { .. } => "vkFreeDescriptorSets",
            Command::UpdateDescriptorSets { .. } => "vkUpdateDescriptorSets",
            Command::AllocateCommandBuffers { .. } => "vkAllocateCommandBuffers",
            Command::FreeCommandBuffers { .. } => "vkFreeCommandBuffers",
            Command::BeginCommandBuffer { .. } => "vkBeginCommandBuffer",
            Command::EndCommandBuffer { .. } => "vkEndCommandBuffer",
            Command::ResetCommandBuffer { .. } => "vkResetCommandBuffer",
            Command::CmdBindPipeline { .. } => "vkCmdBindPipeline",
            Command::CmdBindDescriptorSets { .. } => "vkCmdBindDescriptorSets",
            Command::CmdBindVertexBuffers { .. } => "vkCmdBindVertexBuffers",
            Command::CmdBindIndexBuffer { .. } => "vkCmdBindIndexBuffer",
            Command::CmdSetDynamicState { .. } => "vkCmdSet*",
            Command::CmdPushConstants { .. } => "vkCmdPushConstants",
            Command::CmdBeginRenderPass { .. } => "vkCmdBeginRenderPass",
            Command::CmdNextSubpass { .. } => "vkCmdNextSubpass",
            Command::CmdEndRenderPass { .. } => "vkCmdEndRenderPass",
            Command::CmdDraw { .. } => "vkCmdDraw",
            Command::CmdDrawIndexed { .. } => "vkCmdDrawIndexed",
            Command::CmdDrawIndirect { .. } => "vkCmdDrawIndirect",
            Command::CmdDrawIndexedIndirect { .. } => "vkCmdDrawIndexedIndirect",
            Command::CmdDispatch { .. } => "vkCmdDispatch",
            Command::CmdDispatchIndirect { .. } => "vkCmdDispatchIndirect",
            Command::CmdCopyBuffer { .. } => "vkCmdCopyBuffer",
            Command::CmdCopyImage { .. } => "vkCmdCopyImage",
            Command::CmdCopyBufferToImage { .. } => "vkCmdCopyBufferToImage",
            Command::CmdCopyImageToBuffer { .. } => "vkCmdCopyImageToBuffer",
            Command::CmdBlitImage { .. } => "vkCmdBlitImage",
            Command::CmdResolveImage { .. } => "vkCmdResolveImage",
            Command::CmdClearColorImage { .. } => "vkCmdClearColorImage",
            Command::CmdClearDepthStencilImage { .. } => "vkCmdClearDepthStencilImage",
            Command::CmdClearAttachments { .. } => "vkCmdClearAttachments",
            Command::CmdFillBuffer { .. } => "vkCmdFillBuffer",
            Command::CmdUpdateBuffer { .. } => "vkCmdUpdateBuffer",
            Command::CmdPipelineBarrier { .. } => "vkCmdPipelineBarrier",
            Command::CmdSetEvent { .. } => "vkCmdSetEvent",
            Command::CmdResetEvent { .. } => "vkCmdResetEvent",
            Command::CmdWaitEvents { .. } => "vkCmdWaitEvents",
            Command::CreateSemaphore { .. } => "vkCreateSemaphore",
            Command::DestroySemaphore { .. } => "vkDestroySemaphore",
            Command::CreateFence { .. } => "vkCreateFence",
            Command::DestroyFence { .. } => "vkDestroyFence",
            Command::ResetFences { .. } => "vkResetFences",
            Command::WaitForFences { .. } => "vkWaitForFences",
            Command::GetFenceStatus { .. } => "vkGetFenceStatus",
            Command::CreateEvent { .. } => "vkCreateEvent",
            Command::DestroyEvent { .. } => "vkDestroyEvent",
            Command::SetEvent { .. } => "vkSetEvent",
            Command::ResetEvent { .. } => "vkResetEvent",
            Command::GetEventStatus { .. } => "vkGetEventStatus",
            Command::CmdResetQueryPool { .. } => "vkCmdResetQueryPool",
            Command::CmdBeginQuery { .. } => "vkCmdBeginQuery",
            Command::CmdEndQuery { .. } => "vkCmdEndQuery",
            Command::CmdCopyQueryPoolResults { .. } => "vkCmdCopyQueryPoolResults",
            Command::GetQueryPoolResults { .. } => "vkGetQueryPoolResults",
            Command::CmdExecuteCommands { .. } => "vkCmdExecuteCommands",
            Command::QueueSubmit { .. } => "vkQueueSubmit",
            Command::QueueWaitIdle { .. } => "vkQueueWaitIdle",
            Command::DeviceWaitIdle => "vkDeviceWaitIdle",
            Command::CreateSwapchain { .. } => "vkCreateSwapchainKHR",
            Command::DestroySwapchain { .. } => "vkDestroySwapchainKHR",
            Command::GetSwapchainImages { .. } => "vkGetSwapchainImagesKHR",
            Command::AcquireNextImage { .. } => "vkAcquireNextImageKHR",
            Command::QueuePresent { .. } => "vkQueuePresentKHR",
            Command::Other { name } => name,
        }
    }

    /// The command buffer this command records into, if it is a `vkCmd*`.
    pub fn recording_buffer(&self) -> Option<vk::CommandBuffer> {
        use Command::*;
        match self {
            CmdBindPipeline { buffer, .. }
            | CmdBindDescriptorSets { buffer, .. }
            | CmdBindVertexBuffers { buffer, .. }
            | CmdBindIndexBuffer { buffer, .. }
            | CmdSetDynamicState { buffer, .. }
            | CmdPushConstants { buffer }
            | CmdBeginRenderPass { buffer, .. }
            | CmdNextSubpass { buffer }
            | CmdEndRenderPass { buffer }
            | CmdDraw { buffer, .. }
            | CmdDrawIndexed { buffer, .. }
            | CmdDrawIndirect { buffer, .. }
            | CmdDrawIndexedIndirect { buffer, .. }
            | CmdDispatch { buffer }
            | CmdDispatchIndirect { buffer, .. }
            | CmdCopyBuffer { buffer, .. }
            | CmdCopyImage { buffer, .. }
            | CmdCopyBufferToImage { buffer, .. }
            | CmdCopyImageToBuffer { buffer, .. }
            | CmdBlitImage { buffer, .. }
            | CmdResolveImage { buffer, .. }
            | CmdClearColorImage { buffer, .. }
            | CmdClearDepthStencilImage { buffer, .. }
            | CmdClearAttachments { buffer, .. }
            | CmdFillBuffer { buffer, .. }
            | CmdUpdateBuffer { buffer, .. }
            | CmdPipelineBarrier { buffer, .. }
            | CmdSetEvent { buffer, .. }
            | CmdResetEvent { buffer, .. }
            | CmdWaitEvents { buffer, .. }
            | CmdResetQueryPool { buffer, .. }
            | CmdBeginQuery { buffer, .. }
            | CmdEndQuery { buffer, .. }
            | CmdCopyQueryPoolResults { buffer, .. }
            | CmdExecuteCommands { buffer, .. } => Some(*buffer),
            _ => None,
        }
    }
}
