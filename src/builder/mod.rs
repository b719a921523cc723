//! The footprint builder: per-command dispatch over the trace stream.
//!
//! [`FootprintBuilder::build_command`] is the single entry point. It mutates
//! the collaborator's state, classifies the command, updates shadow state,
//! and either stamps behaviors directly (for non-command-buffer commands)
//! or appends deferred behaviors to the recorder. `vkQueueSubmit`
//! additionally rolls out the recorded commands against the execution order
//! the collaborator reports.
//!
//! No error is ever propagated out of `build_command`: the builder is
//! best-effort, and ambiguity is compensated by marking behaviors alive.

mod commands;
mod descriptors;
mod resources;
mod submit;

use std::collections::HashMap;

use ash::vk;
use static_assertions::assert_impl_all;

use crate::exec::{QueueExecutionState, SubmitInfo};
use crate::graph::behavior::{BehaviorIndex, BehaviorOwner, CommandId, Footprint};
use crate::graph::emitter::Emitter;
use crate::graph::variable::{Var, VariableTable};
use crate::state::ShadowState;
use crate::trace::command::Command;
use crate::trace::snapshot::{MutationEvents, TraceContext};

/// Builds the footprint of one trace. All mutable state is owned by the
/// instance; independent builds run on distinct instances.
#[derive(Default)]
pub struct FootprintBuilder {
    pub(crate) table: VariableTable,
    pub(crate) footprint: Footprint,
    pub(crate) state: ShadowState,
    pub(crate) queues: HashMap<vk::Queue, QueueExecutionState>,
    pub(crate) submits: HashMap<CommandId, SubmitInfo>,
    pub(crate) debug: bool,
}

assert_impl_all!(FootprintBuilder: Send);

impl FootprintBuilder {
    /// Create a builder with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder with per-edge trace logging enabled or disabled.
    pub fn with_debug(debug: bool) -> Self {
        FootprintBuilder {
            debug,
            ..Default::default()
        }
    }

    /// The footprint built so far.
    pub fn footprint(&self) -> &Footprint {
        &self.footprint
    }

    /// Consume the builder, returning the footprint.
    pub fn into_footprint(self) -> Footprint {
        self.footprint
    }

    /// The variable table backing the footprint, for def lookups.
    pub fn variables(&self) -> &VariableTable {
        &self.table
    }

    /// Process one command of the trace.
    ///
    /// The collaborator's `mutate` runs first; if it fails, a single
    /// aborted behavior is stamped and the command contributes no edges.
    pub fn build_command(&mut self, ctx: &mut dyn TraceContext, id: CommandId, command: &Command) {
        let mut events = MutationEvents::default();
        if let Err(err) = ctx.mutate(id, command, &mut events) {
            warn!(
                "mutation of {} at {id} failed, skipping: {err:#}",
                command.name()
            );
            let behavior = self.footprint.add_behavior(BehaviorOwner::direct(id));
            self.footprint.get_mut(behavior).set_aborted();
            return;
        }
        self.dispatch(ctx, id, command, &events);
        self.pin_last_draw(ctx, id);
    }

    /// Start a behavior stamped directly by the current command and borrow
    /// an emitter for it. The emitter borrows the whole builder; gather any
    /// shadow-state inputs before calling this.
    pub(crate) fn behavior(&mut self, id: CommandId) -> BehaviorIndex {
        self.footprint.add_behavior(BehaviorOwner::direct(id))
    }

    pub(crate) fn emitter(&mut self) -> Emitter<'_> {
        Emitter::new(&mut self.table, &mut self.footprint, self.debug)
    }

    fn dispatch(
        &mut self,
        ctx: &mut dyn TraceContext,
        id: CommandId,
        command: &Command,
        events: &MutationEvents,
    ) {
        use Command::*;
        match command {
            // Resource lifecycle.
            CreateBuffer { buffer } => self.create_buffer(id, *buffer),
            DestroyBuffer { buffer } => self.destroy_buffer(id, *buffer),
            CreateImage { image } => self.create_image(id, *image),
            DestroyImage { image } => self.destroy_image(id, *image),
            CreateImageView { view } => self.stamp_create(id, &[Var::handle(*view)]),
            DestroyImageView { view } => self.stamp_destroy(id, &[Var::handle(*view)]),
            CreateSampler { sampler } => self.stamp_create(id, &[Var::handle(*sampler)]),
            DestroySampler { sampler } => self.stamp_destroy(id, &[Var::handle(*sampler)]),
            CreateRenderPass { render_pass } => self.stamp_create(id, &[Var::handle(*render_pass)]),
            DestroyRenderPass { render_pass } => {
                self.stamp_destroy(id, &[Var::handle(*render_pass)])
            }
            CreateFramebuffer { framebuffer } => self.stamp_create(id, &[Var::handle(*framebuffer)]),
            DestroyFramebuffer { framebuffer } => {
                self.stamp_destroy(id, &[Var::handle(*framebuffer)])
            }
            CreatePipelineLayout { layout } => self.stamp_create(id, &[Var::handle(*layout)]),
            DestroyPipelineLayout { layout } => self.stamp_destroy(id, &[Var::handle(*layout)]),
            CreateGraphicsPipelines { pipelines } | CreateComputePipelines { pipelines } => {
                let handles: Vec<Var> = pipelines.iter().map(|p| Var::handle(*p)).collect();
                self.stamp_create(id, &handles);
            }
            DestroyPipeline { pipeline } => self.stamp_destroy(id, &[Var::handle(*pipeline)]),
            CreateDescriptorSetLayout { layout } => self.stamp_create(id, &[Var::handle(*layout)]),
            DestroyDescriptorSetLayout { layout } => {
                self.stamp_destroy(id, &[Var::handle(*layout)])
            }
            CreateDescriptorPool { pool } => self.stamp_create(id, &[Var::handle(*pool)]),
            DestroyDescriptorPool { pool } => self.destroy_descriptor_pool(id, *pool),
            ResetDescriptorPool { pool } => self.reset_descriptor_pool(id, *pool),
            CreateQueryPool { pool, query_count } => self.create_query_pool(id, *pool, *query_count),
            DestroyQueryPool { pool } => {
                self.state.query_pools.remove(pool);
                self.stamp_destroy(id, &[Var::handle(*pool)]);
            }
            CreateCommandPool { pool } => self.stamp_create(id, &[Var::handle(*pool)]),
            DestroyCommandPool { pool } => self.destroy_command_pool(id, *pool),
            ResetCommandPool { pool } => self.reset_command_pool(id, *pool),

            // Memory.
            AllocateMemory { memory } => self.stamp_create(id, &[Var::handle(*memory)]),
            FreeMemory { memory } => self.free_memory(id, *memory),
            MapMemory {
                memory,
                offset,
                size,
            } => self.map_memory(ctx, id, *memory, *offset, *size),
            UnmapMemory { memory } => self.unmap_memory(ctx, id, *memory),
            FlushMappedMemoryRanges { ranges } => self.flush_ranges(ctx, id, ranges),
            InvalidateMappedMemoryRanges { ranges } => self.invalidate_ranges(ctx, id, ranges),

            // Bindings.
            BindBufferMemory {
                buffer,
                memory,
                offset,
            } => self.bind_buffer_memory(ctx, id, *buffer, *memory, *offset),
            BindImageMemory {
                image,
                memory,
                offset,
            } => self.bind_image_memory(ctx, id, *image, *memory, *offset),
            QueueBindSparse {
                queue,
                wait_semaphores,
                signal_semaphores,
                fence,
            } => self.queue_bind_sparse(
                ctx,
                id,
                *queue,
                wait_semaphores,
                signal_semaphores,
                *fence,
                events,
            ),

            // Descriptors.
            AllocateDescriptorSets {
                pool,
                layouts,
                sets,
            } => self.allocate_descriptor_sets(ctx, id, *pool, layouts, sets),
            FreeDescriptorSets { pool, sets } => self.free_descriptor_sets(id, *pool, sets),
            UpdateDescriptorSets { writes, copies } => {
                self.update_descriptor_sets(id, writes, copies)
            }

            // Command buffer lifecycle.
            AllocateCommandBuffers {
                pool,
                level,
                buffers,
            } => self.allocate_command_buffers(id, *pool, *level, buffers),
            FreeCommandBuffers { buffers, .. } => self.free_command_buffers(id, buffers),
            BeginCommandBuffer { buffer } => self.begin_command_buffer(id, *buffer),
            EndCommandBuffer { buffer } => self.end_command_buffer(id, *buffer),
            ResetCommandBuffer { buffer } => self.reset_command_buffer(id, *buffer),

            // Recorded commands.
            CmdBindPipeline {
                buffer, pipeline, ..
            } => self.cmd_bind_pipeline(id, *buffer, *pipeline),
            CmdBindDescriptorSets {
                buffer,
                first_set,
                sets,
                dynamic_offsets,
                ..
            } => self.cmd_bind_descriptor_sets(id, *buffer, *first_set, sets, dynamic_offsets),
            CmdBindVertexBuffers {
                buffer,
                first_binding,
                buffers,
                offsets,
            } => self.cmd_bind_vertex_buffers(id, *buffer, *first_binding, buffers, offsets),
            CmdBindIndexBuffer {
                buffer,
                index_buffer,
                offset,
                index_type,
            } => self.cmd_bind_index_buffer(id, *buffer, *index_buffer, *offset, *index_type),
            CmdSetDynamicState { buffer, .. } => self.cmd_set_dynamic_state(id, *buffer),
            CmdPushConstants { buffer } => self.cmd_push_constants(id, *buffer),
            CmdBeginRenderPass {
                buffer,
                render_pass,
                framebuffer,
            } => self.cmd_begin_render_pass(id, *buffer, *render_pass, *framebuffer),
            CmdNextSubpass { buffer } => self.cmd_next_subpass(id, *buffer),
            CmdEndRenderPass { buffer } => self.cmd_end_render_pass(id, *buffer),
            CmdDraw { buffer, .. } => self.cmd_draw(id, *buffer),
            CmdDrawIndexed {
                buffer,
                index_count,
                first_index,
                ..
            } => self.cmd_draw_indexed(id, *buffer, *first_index, *index_count),
            CmdDrawIndirect {
                buffer,
                indirect_buffer,
                offset,
                draw_count,
                stride,
            } => self.cmd_draw_indirect(
                id,
                *buffer,
                *indirect_buffer,
                *offset,
                *draw_count,
                *stride,
                false,
            ),
            CmdDrawIndexedIndirect {
                buffer,
                indirect_buffer,
                offset,
                draw_count,
                stride,
            } => self.cmd_draw_indirect(
                id,
                *buffer,
                *indirect_buffer,
                *offset,
                *draw_count,
                *stride,
                true,
            ),
            CmdDispatch { buffer } => self.cmd_dispatch(id, *buffer),
            CmdDispatchIndirect {
                buffer,
                indirect_buffer,
                offset,
            } => self.cmd_dispatch_indirect(id, *buffer, *indirect_buffer, *offset),

            // Copies, clears, fills.
            CmdCopyBuffer {
                buffer,
                src,
                dst,
                regions,
            } => self.cmd_copy_buffer(id, *buffer, *src, *dst, regions),
            CmdCopyImage {
                buffer,
                src,
                dst,
                regions,
            } => self.cmd_copy_image(id, *buffer, *src, *dst, regions),
            CmdCopyBufferToImage {
                buffer,
                src,
                dst,
                regions,
            } => self.cmd_copy_buffer_to_image(id, *buffer, *src, *dst, regions),
            CmdCopyImageToBuffer {
                buffer,
                src,
                dst,
                regions,
            } => self.cmd_copy_image_to_buffer(id, *buffer, *src, *dst, regions),
            CmdBlitImage {
                buffer,
                src,
                dst,
                regions,
            } => self.cmd_blit_image(id, *buffer, *src, *dst, regions),
            CmdResolveImage {
                buffer,
                src,
                dst,
                regions,
            } => self.cmd_resolve_image(id, *buffer, *src, *dst, regions),
            CmdClearColorImage {
                buffer,
                image,
                ranges,
            }
            | CmdClearDepthStencilImage {
                buffer,
                image,
                ranges,
            } => self.cmd_clear_image(id, *buffer, *image, ranges),
            CmdClearAttachments {
                buffer,
                attachments,
            } => self.cmd_clear_attachments(id, *buffer, attachments),
            CmdFillBuffer {
                buffer,
                dst,
                offset,
                size,
            }
            | CmdUpdateBuffer {
                buffer,
                dst,
                offset,
                size,
            } => self.cmd_write_buffer(id, command.name(), *buffer, *dst, *offset, *size),

            // Synchronization inside command buffers.
            CmdPipelineBarrier {
                buffer,
                image_barriers,
                buffer_barriers,
            } => self.cmd_pipeline_barrier(id, *buffer, image_barriers, buffer_barriers),
            CmdSetEvent { buffer, event } => self.cmd_set_event(id, *buffer, *event, true),
            CmdResetEvent { buffer, event } => self.cmd_set_event(id, *buffer, *event, false),
            CmdWaitEvents { buffer, events } => self.cmd_wait_events(id, *buffer, events),

            // Host synchronization objects.
            CreateSemaphore { semaphore } => self.create_semaphore(id, *semaphore),
            DestroySemaphore { semaphore } => {
                self.state.semaphores.remove(semaphore);
                self.stamp_destroy(id, &[Var::handle(*semaphore)]);
            }
            CreateFence { fence } => self.create_fence(id, *fence),
            DestroyFence { fence } => {
                self.state.fences.remove(fence);
                self.stamp_destroy(id, &[Var::handle(*fence)]);
            }
            ResetFences { fences } => self.reset_fences(id, fences),
            WaitForFences { fences } => self.wait_for_fences(id, fences),
            GetFenceStatus { fence } => self.get_fence_status(id, *fence),
            CreateEvent { event } => self.create_event(id, *event),
            DestroyEvent { event } => {
                self.state.events.remove(event);
                self.stamp_destroy(id, &[Var::handle(*event)]);
            }
            SetEvent { event } => self.host_set_event(id, *event, true),
            ResetEvent { event } => self.host_set_event(id, *event, false),
            GetEventStatus { event } => self.get_event_status(id, *event),

            // Queries.
            CmdResetQueryPool {
                buffer,
                pool,
                first_query,
                query_count,
            } => self.cmd_reset_query_pool(id, *buffer, *pool, *first_query, *query_count),
            CmdBeginQuery {
                buffer,
                pool,
                query,
            } => self.cmd_begin_query(id, *buffer, *pool, *query),
            CmdEndQuery {
                buffer,
                pool,
                query,
            } => self.cmd_end_query(id, *buffer, *pool, *query),
            CmdCopyQueryPoolResults {
                buffer,
                pool,
                first_query,
                query_count,
                dst,
                offset,
                stride,
            } => self.cmd_copy_query_pool_results(
                id,
                *buffer,
                *pool,
                *first_query,
                *query_count,
                *dst,
                *offset,
                *stride,
            ),
            GetQueryPoolResults {
                pool,
                first_query,
                query_count,
            } => self.get_query_pool_results(id, *pool, *first_query, *query_count),

            // Secondary command buffers.
            CmdExecuteCommands {
                buffer,
                secondaries,
            } => self.cmd_execute_commands(id, *buffer, secondaries),

            // Queue operations.
            QueueSubmit {
                queue,
                submits,
                fence,
            } => self.queue_submit(ctx, id, *queue, submits, *fence, events),
            QueueWaitIdle { queue } => self.queue_wait_idle(id, *queue),
            DeviceWaitIdle => self.device_wait_idle(id),

            // Presentation.
            CreateSwapchain { swapchain } => self.create_swapchain(id, *swapchain),
            DestroySwapchain { swapchain } => self.destroy_swapchain(id, *swapchain),
            GetSwapchainImages { swapchain, images } => {
                self.get_swapchain_images(ctx, id, *swapchain, images)
            }
            AcquireNextImage {
                swapchain,
                semaphore,
                fence,
                image_index,
            } => self.acquire_next_image(id, *swapchain, *semaphore, *fence, *image_index),
            QueuePresent {
                queue,
                wait_semaphores,
                targets,
            } => self.queue_present(id, *queue, wait_semaphores, targets),

            Other { name } => self.unknown_command(id, name),
        }
    }

    /// Commands outside the vocabulary are logged and kept alive: the
    /// default is never to drop what we do not understand.
    fn unknown_command(&mut self, id: CommandId, name: &str) {
        warn!(
            "{} at {id}, keeping alive",
            crate::core::error::Error::UnhandledCommand(name.to_owned())
        );
        let behavior = self.behavior(id);
        self.footprint.keep_alive(behavior);
    }

    /// After every command: if the global state reports a last submission
    /// with a bound framebuffer, read every backing datum of that
    /// framebuffer's attachments. This pins the data produced for the
    /// user's observation point so the pruner preserves the draws behind it.
    fn pin_last_draw(&mut self, ctx: &dyn TraceContext, id: CommandId) {
        let Some(last) = ctx.last_submission() else {
            return;
        };
        let Some(framebuffer) = ctx.framebuffer(last.framebuffer) else {
            return;
        };
        let mut data = Vec::new();
        for view in &framebuffer.attachments {
            let Some(view_info) = ctx.image_view(*view) else {
                continue;
            };
            if let Some(image_data) = self.state.image_data(view_info.image) {
                data.extend(image_data);
            }
        }
        if data.is_empty() {
            return;
        }
        let behavior = self.behavior(id);
        self.emitter().read(behavior, &data);
        self.footprint.keep_alive(behavior);
    }

    /// Create-family stamping: the behavior writes each created handle.
    pub(crate) fn stamp_create(&mut self, id: CommandId, handles: &[Var]) {
        let behavior = self.behavior(id);
        self.emitter().write(behavior, handles);
    }

    /// Destroy-family stamping: the behavior reads each destroyed handle
    /// and is kept alive.
    pub(crate) fn stamp_destroy(&mut self, id: CommandId, handles: &[Var]) {
        let behavior = self.behavior(id);
        self.emitter().read(behavior, handles);
        self.footprint.keep_alive(behavior);
    }
}
