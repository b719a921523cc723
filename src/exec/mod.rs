//! Queue execution state and submit bookkeeping.
//!
//! `vkQueueSubmit` turns each submitted command buffer's record list into a
//! FIFO pending queue; the collaborator then reports which subcommands
//! really executed and in what order, and the builder rolls the pending
//! queue out against that report. Everything a deferred `behave` closure
//! can touch while rolling out lives in [`ExecutionCtx`].

use std::collections::VecDeque;
use std::sync::Arc;

use ash::vk;
use ash::vk::Handle;

use crate::core::error::Error;
use crate::graph::behavior::{BehaviorIndex, BehaviorOwner, Footprint, SubcommandRef};
use crate::graph::emitter::Emitter;
use crate::graph::variable::{Var, VariableId, VariableTable};
use crate::record::RecordedCommand;
use crate::state::ShadowState;
use crate::trace::snapshot::TraceContext;

/// One vertex buffer binding slot.
#[derive(Debug, Copy, Clone)]
pub struct VertexBinding {
    /// Bound buffer.
    pub buffer: vk::Buffer,
    /// Offset the binding starts at.
    pub offset: vk::DeviceSize,
}

/// The index buffer binding.
#[derive(Debug, Copy, Clone)]
pub struct IndexBinding {
    /// Bound buffer.
    pub buffer: vk::Buffer,
    /// Offset the binding starts at.
    pub offset: vk::DeviceSize,
    /// Index element type.
    pub index_type: vk::IndexType,
}

/// A descriptor set as bound by `vkCmdBindDescriptorSets`: the set, a fresh
/// bound-set variable, and the dynamic offsets captured at bind time.
#[derive(Debug, Clone)]
pub struct BoundDescriptorSet {
    /// The bound-set variable, written at bind, read by draws.
    pub var: VariableId,
    /// The underlying descriptor set.
    pub set: vk::DescriptorSet,
    /// Dynamic offsets snapshot, sized by the set's dynamic descriptor
    /// count.
    pub dynamic_offsets: Vec<u64>,
}

/// Bound state of one command buffer while it executes. Primary and
/// secondary command buffers each get their own context.
#[derive(Debug, Default)]
pub struct CommandBufferContext {
    /// Label written by the last `vkCmdBindPipeline`.
    pub pipeline: Option<VariableId>,
    /// Label written by the last `vkCmdSet*` dynamic-state command.
    pub dynamic_state: Option<VariableId>,
    /// Vertex buffer bindings by slot.
    pub vertex_buffers: std::collections::BTreeMap<u32, VertexBinding>,
    /// Index buffer binding.
    pub index_buffer: Option<IndexBinding>,
    /// Bound descriptor sets by set index.
    pub descriptor_sets: std::collections::BTreeMap<u32, BoundDescriptorSet>,
}

/// One framebuffer attachment of the render pass in progress, captured at
/// `vkCmdBeginRenderPass` execution time.
#[derive(Debug, Clone)]
pub struct AttachmentInfo {
    /// Image behind the attachment's view.
    pub image: vk::Image,
    /// Backing data of that image at begin time.
    pub data: Vec<Var>,
    /// The image's layout label.
    pub layout: Option<VariableId>,
    /// Whether the view covers the whole image and matches the framebuffer
    /// extent, allowing `write` instead of `modify` stamping.
    pub full_image: bool,
    /// Color/depth load operation.
    pub load_op: vk::AttachmentLoadOp,
    /// Stencil load operation.
    pub stencil_load_op: vk::AttachmentLoadOp,
    /// Color/depth store operation.
    pub store_op: vk::AttachmentStoreOp,
    /// Stencil store operation.
    pub stencil_store_op: vk::AttachmentStoreOp,
    /// Whether the attachment carries a stencil aspect.
    pub has_stencil: bool,
}

/// Attachment references of one subpass, as indices into the render pass
/// scope's attachment table.
#[derive(Debug, Clone, Default)]
pub struct SubpassInfo {
    /// Input attachments.
    pub input: Vec<usize>,
    /// Color attachments.
    pub color: Vec<usize>,
    /// Resolve attachments as `(resolve target, paired color)`.
    pub resolve: Vec<(usize, usize)>,
    /// Depth/stencil attachment.
    pub depth_stencil: Option<usize>,
}

/// Everything captured about the render pass in progress.
#[derive(Debug, Clone)]
pub struct RenderPassScope {
    /// Framebuffer attachments, in attachment order.
    pub attachments: Vec<AttachmentInfo>,
    /// Subpasses of the render pass.
    pub subpasses: Vec<SubpassInfo>,
    /// Per attachment: the first subpass referencing it (its load happens
    /// there).
    pub load_subpass: Vec<Option<usize>>,
    /// Per attachment: the last subpass referencing it (its store happens
    /// there).
    pub store_subpass: Vec<Option<usize>>,
    /// Subpass currently in progress.
    pub current: usize,
    /// Label redefined every time a subpass starts; draws read it so they
    /// order against subpass progression.
    pub subpass_label: VariableId,
    /// Framebuffer of the pass.
    pub framebuffer: vk::Framebuffer,
}

/// Execution state of one queue: the current primary and secondary
/// command-buffer contexts and the render pass in progress.
#[derive(Debug, Default)]
pub struct QueueExecutionState {
    /// Bound state of the executing primary command buffer.
    pub primary: CommandBufferContext,
    /// Bound state of the executing secondary command buffer.
    pub secondary: CommandBufferContext,
    /// Render pass in progress, shared between primary and secondaries.
    pub render_pass: Option<RenderPassScope>,
}

impl QueueExecutionState {
    /// The context a subcommand executes in: the secondary context for
    /// commands recorded into a secondary buffer, the primary otherwise.
    pub fn context_mut(&mut self, sub: &SubcommandRef) -> &mut CommandBufferContext {
        if sub.secondary.is_some() {
            &mut self.secondary
        } else {
            &mut self.primary
        }
    }
}

/// One entry of a submit's pending-commands queue.
#[derive(Debug, Clone)]
pub struct PendingCommand {
    /// Where this command is expected to execute.
    pub expected: SubcommandRef,
    /// The recorded command.
    pub command: Arc<RecordedCommand>,
    /// Command buffer the command was recorded into.
    pub buffer: vk::CommandBuffer,
}

/// Bookkeeping of one `vkQueueSubmit` call.
#[derive(Debug)]
pub struct SubmitInfo {
    /// Queue submitted to.
    pub queue: vk::Queue,
    /// Label written when the submit is enqueued.
    pub queued: VariableId,
    /// Label written when the submit finishes executing.
    pub done: VariableId,
    /// Wait semaphores of all batches.
    pub wait_semaphores: Vec<vk::Semaphore>,
    /// Signal semaphores of all batches.
    pub signal_semaphores: Vec<vk::Semaphore>,
    /// Fence signaled on completion; may be null.
    pub signal_fence: vk::Fence,
    /// Subcommands not yet observed executing, in submission order.
    pub pending: VecDeque<PendingCommand>,
    /// Whether the first subcommand has been observed.
    pub began: bool,
    /// Set when observed execution order diverged from submission order;
    /// no further subcommands of this submit are rolled out.
    pub halted: bool,
}

/// The live context a deferred `behave` closure runs against: the variable
/// table and footprint (through [`Emitter`]), the shadow state, the owning
/// queue's execution state, and the collaborator's snapshot.
pub struct ExecutionCtx<'a> {
    /// Variable arena.
    pub table: &'a mut VariableTable,
    /// Behavior arena.
    pub footprint: &'a mut Footprint,
    /// Shadow state.
    pub state: &'a mut ShadowState,
    /// Execution state of the queue rolling out.
    pub exec: &'a mut QueueExecutionState,
    /// Live Vulkan state snapshot.
    pub snapshot: &'a dyn TraceContext,
    /// Owner stamped onto behaviors created in this context.
    pub owner: BehaviorOwner,
    /// Per-edge trace logging toggle.
    pub debug: bool,
}

impl ExecutionCtx<'_> {
    /// Append a fresh behavior owned by the current subcommand.
    pub fn behavior(&mut self) -> BehaviorIndex {
        self.footprint.add_behavior(self.owner)
    }

    /// Borrow an emitter over the table and footprint.
    pub fn emitter(&mut self) -> Emitter<'_> {
        Emitter::new(self.table, self.footprint, self.debug)
    }

    /// Backing data of a buffer range, whole-size normalized against the
    /// snapshot's buffer size. Unknown buffers log and resolve to nothing.
    pub fn buffer_data(&self, buffer: vk::Buffer, offset: u64, size: u64) -> Vec<Var> {
        let Some(state) = self.state.buffers.get(&buffer) else {
            warn!(
                "{}",
                Error::UnknownHandle {
                    kind: "buffer",
                    handle: buffer.as_raw(),
                }
            );
            return Vec::new();
        };
        let size = if size == vk::WHOLE_SIZE {
            match self.snapshot.buffer(buffer) {
                Some(info) => info.size.saturating_sub(offset),
                None => vk::WHOLE_SIZE,
            }
        } else {
            size
        };
        state.bindings.bound_data(offset, size)
    }

    /// Layout label and backing data of an image. Unknown images log and
    /// resolve to nothing.
    pub fn image_layout_and_data(&self, image: vk::Image) -> (Option<VariableId>, Vec<Var>) {
        match self.state.images.get(&image) {
            Some(state) => (state.layout, state.data()),
            None => {
                warn!(
                    "{}",
                    Error::UnknownHandle {
                        kind: "image",
                        handle: image.as_raw(),
                    }
                );
                (None, Vec::new())
            }
        }
    }
}
