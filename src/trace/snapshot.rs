//! The live Vulkan state snapshot exposed by the collaborator, plus the
//! mutation entry point and its callbacks.

use anyhow::Result;
use ash::vk;

use crate::graph::behavior::{CommandId, SubcommandRef};
use crate::trace::command::Command;

/// Sparse memory requirements of one image aspect.
#[derive(Debug, Copy, Clone)]
pub struct SparseRequirements {
    /// Aspects this requirement applies to. The first entry whose mask
    /// intersects a bind's aspect wins.
    pub aspect_mask: vk::ImageAspectFlags,
    /// Sparse block extent in texels.
    pub block_extent: vk::Extent3D,
}

/// Properties of a live `VkImage`.
#[derive(Debug, Clone)]
pub struct ImageInfo {
    /// Texel format.
    pub format: vk::Format,
    /// Level 0 extent.
    pub extent: vk::Extent3D,
    /// Number of mip levels.
    pub mip_levels: u32,
    /// Number of array layers.
    pub array_layers: u32,
    /// Aspects present in the format.
    pub aspects: vk::ImageAspectFlags,
    /// Total byte size inferred from format and extent, used to size the
    /// opaque binding created by `vkBindImageMemory`.
    pub byte_size: vk::DeviceSize,
    /// Whether the image was created with sparse residency.
    pub is_sparse: bool,
    /// Per-aspect sparse block requirements, in query order.
    pub sparse_requirements: Vec<SparseRequirements>,
}

/// Properties of a live `VkBuffer`.
#[derive(Debug, Copy, Clone)]
pub struct BufferInfo {
    /// Buffer size in bytes.
    pub size: vk::DeviceSize,
}

/// Properties of a live `VkImageView`.
#[derive(Debug, Copy, Clone)]
pub struct ImageViewInfo {
    /// Image the view windows into.
    pub image: vk::Image,
    /// Subresource range covered by the view. Layer and level counts may be
    /// [`vk::REMAINING_ARRAY_LAYERS`] / [`vk::REMAINING_MIP_LEVELS`].
    pub range: vk::ImageSubresourceRange,
    /// View dimensionality.
    pub view_type: vk::ImageViewType,
}

/// One attachment description of a render pass.
#[derive(Debug, Copy, Clone)]
pub struct AttachmentDesc {
    /// Color/depth load operation.
    pub load_op: vk::AttachmentLoadOp,
    /// Color/depth store operation.
    pub store_op: vk::AttachmentStoreOp,
    /// Stencil load operation.
    pub stencil_load_op: vk::AttachmentLoadOp,
    /// Stencil store operation.
    pub stencil_store_op: vk::AttachmentStoreOp,
}

/// One subpass description of a render pass; entries are attachment indices
/// into the render pass attachment list, `None` for `VK_ATTACHMENT_UNUSED`.
#[derive(Debug, Clone, Default)]
pub struct SubpassDesc {
    /// Input attachment references.
    pub input: Vec<Option<u32>>,
    /// Color attachment references.
    pub color: Vec<Option<u32>>,
    /// Resolve attachment references, parallel to `color`.
    pub resolve: Vec<Option<u32>>,
    /// Depth/stencil attachment reference.
    pub depth_stencil: Option<u32>,
}

/// Properties of a live `VkRenderPass`.
#[derive(Debug, Clone)]
pub struct RenderPassInfo {
    /// Attachment descriptions.
    pub attachments: Vec<AttachmentDesc>,
    /// Subpass descriptions, in subpass order.
    pub subpasses: Vec<SubpassDesc>,
}

/// Properties of a live `VkFramebuffer`.
#[derive(Debug, Clone)]
pub struct FramebufferInfo {
    /// Render pass the framebuffer was created against.
    pub render_pass: vk::RenderPass,
    /// Attached image views, in attachment order.
    pub attachments: Vec<vk::ImageView>,
    /// Framebuffer extent.
    pub extent: vk::Extent2D,
    /// Framebuffer layer count.
    pub layers: u32,
}

/// One binding of a descriptor set layout.
#[derive(Debug, Copy, Clone)]
pub struct LayoutBinding {
    /// Binding number.
    pub binding: u32,
    /// Descriptor type of the binding.
    pub ty: vk::DescriptorType,
    /// Number of array elements.
    pub count: u32,
}

/// Properties of a live `VkDescriptorSetLayout`.
#[derive(Debug, Clone)]
pub struct DescriptorSetLayoutInfo {
    /// Bindings, in binding-number order.
    pub bindings: Vec<LayoutBinding>,
}

/// Properties of a live `VkDeviceMemory`.
#[derive(Debug, Copy, Clone)]
pub struct DeviceMemoryInfo {
    /// Allocation size in bytes.
    pub size: vk::DeviceSize,
    /// Currently mapped range as `(offset, size)`, if mapped.
    pub mapped: Option<(vk::DeviceSize, vk::DeviceSize)>,
    /// Whether the memory type is host-coherent.
    pub coherent: bool,
}

/// The last queue submission the global state knows about, used to pin the
/// observation point's framebuffer data.
#[derive(Debug, Copy, Clone)]
pub struct LastSubmission {
    /// Queue the submission went to.
    pub queue: vk::Queue,
    /// Framebuffer bound during the submission's last draw.
    pub framebuffer: vk::Framebuffer,
}

/// A host read of device memory observed while replaying the current
/// command. Ranges are relative to the memory object's base.
#[derive(Debug, Copy, Clone)]
pub struct MemoryObservation {
    /// Memory object observed.
    pub memory: vk::DeviceMemory,
    /// Start of the observed range.
    pub offset: vk::DeviceSize,
    /// Size of the observed range.
    pub size: vk::DeviceSize,
}

/// One sparse bind delivered by the post-bind-sparse callback.
#[derive(Debug, Copy, Clone)]
pub enum SparseBind {
    /// A buffer sparse bind.
    Buffer {
        /// Buffer being bound.
        buffer: vk::Buffer,
        /// Offset in buffer address space.
        resource_offset: vk::DeviceSize,
        /// Size of the bound range.
        size: vk::DeviceSize,
        /// Backing memory; null unbinds.
        memory: vk::DeviceMemory,
        /// Offset into the backing memory.
        memory_offset: vk::DeviceSize,
    },
    /// An opaque image sparse bind (mip tail or opaque image).
    ImageOpaque {
        /// Image being bound.
        image: vk::Image,
        /// Offset in image address space.
        resource_offset: vk::DeviceSize,
        /// Size of the bound range.
        size: vk::DeviceSize,
        /// Backing memory; null unbinds.
        memory: vk::DeviceMemory,
        /// Offset into the backing memory.
        memory_offset: vk::DeviceSize,
    },
    /// A per-block image sparse bind.
    Image {
        /// Image being bound.
        image: vk::Image,
        /// Aspect of the bound subresource.
        aspect_mask: vk::ImageAspectFlags,
        /// Array layer of the bound subresource.
        layer: u32,
        /// Mip level of the bound subresource.
        level: u32,
        /// Texel offset of the bound region.
        offset: vk::Offset3D,
        /// Texel extent of the bound region.
        extent: vk::Extent3D,
        /// Backing memory; null unbinds.
        memory: vk::DeviceMemory,
        /// Offset into the backing memory.
        memory_offset: vk::DeviceSize,
    },
}

/// Callback payloads collected while the collaborator mutates a command.
/// The builder hands an empty value to [`TraceContext::mutate`]; the
/// collaborator appends an entry per event, in the order they happened.
#[derive(Debug, Default)]
pub struct MutationEvents {
    /// Actual execution order of every subcommand that really ran. Replay
    /// may abort partway, so this can be a prefix of the submitted order.
    /// A misbehaving replayer can also diverge from it.
    pub executed: Vec<SubcommandRef>,
    /// Sparse binds that took effect, for `vkQueueBindSparse`.
    pub sparse_binds: Vec<SparseBind>,
}

/// Read-only accessors over the collaborator's live Vulkan state. Lookups
/// return `None` for handles the snapshot does not know; the builder logs
/// and skips the affected operation.
pub trait StateSnapshot {
    /// Look up a live image.
    fn image(&self, image: vk::Image) -> Option<ImageInfo>;
    /// Look up a live buffer.
    fn buffer(&self, buffer: vk::Buffer) -> Option<BufferInfo>;
    /// Look up a live image view.
    fn image_view(&self, view: vk::ImageView) -> Option<ImageViewInfo>;
    /// Look up a live render pass.
    fn render_pass(&self, render_pass: vk::RenderPass) -> Option<RenderPassInfo>;
    /// Look up a live framebuffer.
    fn framebuffer(&self, framebuffer: vk::Framebuffer) -> Option<FramebufferInfo>;
    /// Look up a live descriptor set layout.
    fn descriptor_set_layout(
        &self,
        layout: vk::DescriptorSetLayout,
    ) -> Option<DescriptorSetLayoutInfo>;
    /// Look up a live device memory allocation.
    fn device_memory(&self, memory: vk::DeviceMemory) -> Option<DeviceMemoryInfo>;
    /// The last queue submission with a bound framebuffer, if any.
    fn last_submission(&self) -> Option<LastSubmission>;
}

/// The full collaborator interface: snapshot accessors plus the mutate
/// entry point and the per-command memory observation list.
pub trait TraceContext: StateSnapshot {
    /// Apply `command` to the live state. Events observed during mutation
    /// (executed subcommands, sparse binds) are appended to `events`. On
    /// error the builder stamps nothing for this command and continues.
    fn mutate(
        &mut self,
        id: CommandId,
        command: &Command,
        events: &mut MutationEvents,
    ) -> Result<()>;

    /// Host memory reads observed for the current command. The builder
    /// intersects these with mapped-coherent ranges to stamp
    /// coherent-memory writes before queue submits and unmaps.
    fn observations(&self) -> &[MemoryObservation];
}
