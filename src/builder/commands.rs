//! Command-buffer recording and the execution-time semantics of every
//! `vkCmd*` family: render passes, draws and dispatches, copies and clears,
//! events and queries.
//!
//! Recording stamps only `read(commandBuffer, begin)` and appends a deferred
//! command; everything else happens in the `behave` closure invoked by the
//! queue execution engine during rollout.

use std::sync::Arc;

use ash::vk;

use crate::builder::FootprintBuilder;
use crate::exec::{
    AttachmentInfo, BoundDescriptorSet, ExecutionCtx, IndexBinding, RenderPassScope, SubpassInfo,
    VertexBinding,
};
use crate::graph::behavior::{BehaviorIndex, CommandId, SubcommandRef};
use crate::graph::emitter::Emitter;
use crate::graph::variable::Var;
use crate::record::RecordedCommand;
use crate::state::CommandBufferState;
use crate::trace::command::{BufferBarrier, ClearAttachmentTarget, DescriptorContents, ImageBarrier};
use crate::trace::snapshot::{ImageInfo, ImageViewInfo};
use crate::util::byte_size::ByteSize;

impl FootprintBuilder {
    // -- Command buffer lifecycle --------------------------------------------

    pub(crate) fn allocate_command_buffers(
        &mut self,
        id: CommandId,
        pool: vk::CommandPool,
        level: vk::CommandBufferLevel,
        buffers: &[vk::CommandBuffer],
    ) {
        let mut vars = Vec::new();
        for &buffer in buffers {
            let state = CommandBufferState::new(&mut self.table, level, pool);
            vars.extend([
                Var::handle(buffer),
                Var::Id(state.begin),
                Var::Id(state.end),
                Var::Id(state.render_pass_begin),
            ]);
            self.state.command_buffers.insert(buffer, state);
        }
        self.stamp_create(id, &vars);
    }

    pub(crate) fn free_command_buffers(&mut self, id: CommandId, buffers: &[vk::CommandBuffer]) {
        for buffer in buffers {
            self.state.command_buffers.remove(buffer);
        }
        let handles: Vec<Var> = buffers.iter().map(|b| Var::handle(*b)).collect();
        self.stamp_destroy(id, &handles);
    }

    pub(crate) fn destroy_command_pool(&mut self, id: CommandId, pool: vk::CommandPool) {
        for buffer in self.state.buffers_of_pool(pool) {
            self.state.command_buffers.remove(&buffer);
        }
        self.stamp_destroy(id, &[Var::handle(pool)]);
    }

    pub(crate) fn reset_command_pool(&mut self, id: CommandId, pool: vk::CommandPool) {
        let behavior = self.behavior(id);
        self.emitter().read(behavior, &[Var::handle(pool)]);
        for buffer in self.state.buffers_of_pool(pool) {
            let Some(state) = self.state.command_buffers.get_mut(&buffer) else {
                continue;
            };
            state.records.clear();
            let (begin, end) = (state.begin, state.end);
            self.emitter()
                .write(behavior, &[Var::Id(begin), Var::Id(end)]);
        }
    }

    pub(crate) fn begin_command_buffer(&mut self, id: CommandId, buffer: vk::CommandBuffer) {
        let Some(state) = self.state.command_buffers.get_mut(&buffer) else {
            warn!("vkBeginCommandBuffer on unknown buffer {buffer:?}");
            return;
        };
        state.records.clear();
        let begin = state.begin;
        let behavior = self.behavior(id);
        let mut emitter = self.emitter();
        emitter.read(behavior, &[Var::handle(buffer)]);
        emitter.write(behavior, &[Var::Id(begin)]);
    }

    pub(crate) fn end_command_buffer(&mut self, id: CommandId, buffer: vk::CommandBuffer) {
        let Some(state) = self.state.command_buffers.get(&buffer) else {
            warn!("vkEndCommandBuffer on unknown buffer {buffer:?}");
            return;
        };
        let (begin, end) = (state.begin, state.end);
        let behavior = self.behavior(id);
        let mut emitter = self.emitter();
        emitter.read(behavior, &[Var::handle(buffer), Var::Id(begin)]);
        emitter.write(behavior, &[Var::Id(end)]);
    }

    pub(crate) fn reset_command_buffer(&mut self, id: CommandId, buffer: vk::CommandBuffer) {
        let Some(state) = self.state.command_buffers.get_mut(&buffer) else {
            warn!("vkResetCommandBuffer on unknown buffer {buffer:?}");
            return;
        };
        state.records.clear();
        let (begin, end) = (state.begin, state.end);
        let behavior = self.behavior(id);
        let mut emitter = self.emitter();
        emitter.read(behavior, &[Var::handle(buffer)]);
        emitter.write(behavior, &[Var::Id(begin), Var::Id(end)]);
    }

    /// Shared recording path of every `vkCmd*`: stamp
    /// `read(commandBuffer, begin)` and append the deferred command.
    pub(crate) fn record(
        &mut self,
        id: CommandId,
        buffer: vk::CommandBuffer,
        command: Arc<RecordedCommand>,
    ) {
        let Some(state) = self.state.command_buffers.get(&buffer) else {
            warn!("{} recorded into unknown buffer {buffer:?}", command.name);
            return;
        };
        let begin = state.begin;
        let behavior = self.behavior(id);
        self.emitter()
            .read(behavior, &[Var::handle(buffer), Var::Id(begin)]);
        if let Some(state) = self.state.command_buffers.get_mut(&buffer) {
            state.records.push(command);
        }
    }

    // -- Bind commands -------------------------------------------------------

    pub(crate) fn cmd_bind_pipeline(
        &mut self,
        id: CommandId,
        buffer: vk::CommandBuffer,
        pipeline: vk::Pipeline,
    ) {
        self.record(
            id,
            buffer,
            RecordedCommand::new(
                "vkCmdBindPipeline",
                Box::new(move |ctx, sub| {
                    let behavior = ctx.behavior();
                    let label = ctx.table.new_label();
                    let mut emitter = ctx.emitter();
                    emitter.read(behavior, &[Var::handle(pipeline)]);
                    emitter.write(behavior, &[Var::Id(label)]);
                    ctx.exec.context_mut(sub).pipeline = Some(label);
                }),
            ),
        );
    }

    pub(crate) fn cmd_bind_descriptor_sets(
        &mut self,
        id: CommandId,
        buffer: vk::CommandBuffer,
        first_set: u32,
        sets: &[vk::DescriptorSet],
        dynamic_offsets: &[u32],
    ) {
        let sets = sets.to_vec();
        let dynamic_offsets = dynamic_offsets.to_vec();
        self.record(
            id,
            buffer,
            RecordedCommand::new(
                "vkCmdBindDescriptorSets",
                Box::new(move |ctx, sub| {
                    let behavior = ctx.behavior();
                    let mut remaining: &[u32] = &dynamic_offsets;
                    for (i, &set) in sets.iter().enumerate() {
                        let dynamic_count = match ctx.state.descriptor_sets.get(&set) {
                            Some(state) => state.dynamic_count,
                            None => {
                                warn!("binding unknown descriptor set {set:?}");
                                0
                            }
                        };
                        let take = dynamic_count.min(remaining.len());
                        if take < dynamic_count {
                            warn!(
                                "{}",
                                crate::core::error::Error::DynamicOffsetUnderflow {
                                    set: ash::vk::Handle::as_raw(set),
                                }
                            );
                        }
                        let offsets: Vec<u64> =
                            remaining[..take].iter().map(|&o| o as u64).collect();
                        remaining = &remaining[take..];

                        let var = ctx.table.new_bound_descriptor_set();
                        let mut emitter = ctx.emitter();
                        emitter.read(behavior, &[Var::handle(set)]);
                        emitter.write(behavior, &[Var::Id(var)]);
                        ctx.exec.context_mut(sub).descriptor_sets.insert(
                            first_set + i as u32,
                            BoundDescriptorSet {
                                var,
                                set,
                                dynamic_offsets: offsets,
                            },
                        );
                    }
                }),
            ),
        );
    }

    pub(crate) fn cmd_bind_vertex_buffers(
        &mut self,
        id: CommandId,
        buffer: vk::CommandBuffer,
        first_binding: u32,
        buffers: &[vk::Buffer],
        offsets: &[vk::DeviceSize],
    ) {
        let buffers = buffers.to_vec();
        let offsets = offsets.to_vec();
        self.record(
            id,
            buffer,
            RecordedCommand::new(
                "vkCmdBindVertexBuffers",
                Box::new(move |ctx, sub| {
                    let behavior = ctx.behavior();
                    for (i, (&vertex_buffer, &offset)) in
                        buffers.iter().zip(&offsets).enumerate()
                    {
                        ctx.emitter()
                            .read(behavior, &[Var::handle(vertex_buffer)]);
                        ctx.exec.context_mut(sub).vertex_buffers.insert(
                            first_binding + i as u32,
                            VertexBinding {
                                buffer: vertex_buffer,
                                offset,
                            },
                        );
                    }
                }),
            ),
        );
    }

    pub(crate) fn cmd_bind_index_buffer(
        &mut self,
        id: CommandId,
        buffer: vk::CommandBuffer,
        index_buffer: vk::Buffer,
        offset: vk::DeviceSize,
        index_type: vk::IndexType,
    ) {
        self.record(
            id,
            buffer,
            RecordedCommand::new(
                "vkCmdBindIndexBuffer",
                Box::new(move |ctx, sub| {
                    let behavior = ctx.behavior();
                    ctx.emitter().read(behavior, &[Var::handle(index_buffer)]);
                    ctx.exec.context_mut(sub).index_buffer = Some(IndexBinding {
                        buffer: index_buffer,
                        offset,
                        index_type,
                    });
                }),
            ),
        );
    }

    pub(crate) fn cmd_set_dynamic_state(&mut self, id: CommandId, buffer: vk::CommandBuffer) {
        self.record(
            id,
            buffer,
            RecordedCommand::new(
                "vkCmdSet*",
                Box::new(move |ctx, sub| {
                    let behavior = ctx.behavior();
                    let label = ctx.table.new_label();
                    ctx.emitter().write(behavior, &[Var::Id(label)]);
                    ctx.exec.context_mut(sub).dynamic_state = Some(label);
                }),
            ),
        );
    }

    pub(crate) fn cmd_push_constants(&mut self, id: CommandId, buffer: vk::CommandBuffer) {
        self.record(
            id,
            buffer,
            RecordedCommand::new(
                "vkCmdPushConstants",
                Box::new(move |ctx, _| {
                    ctx.behavior();
                }),
            ),
        );
    }

    // -- Render passes -------------------------------------------------------

    pub(crate) fn cmd_begin_render_pass(
        &mut self,
        id: CommandId,
        buffer: vk::CommandBuffer,
        render_pass: vk::RenderPass,
        framebuffer: vk::Framebuffer,
    ) {
        self.record(
            id,
            buffer,
            RecordedCommand::new(
                "vkCmdBeginRenderPass",
                Box::new(move |ctx, _| {
                    let behavior = ctx.behavior();
                    ctx.emitter().read(
                        behavior,
                        &[Var::handle(render_pass), Var::handle(framebuffer)],
                    );
                    let Some(scope) = collect_render_pass_scope(ctx, render_pass, framebuffer)
                    else {
                        return;
                    };
                    if let Some(state) = ctx.state.command_buffers.get(&buffer) {
                        let begin = state.render_pass_begin;
                        ctx.emitter().write(behavior, &[Var::Id(begin)]);
                    }
                    ctx.exec.render_pass = Some(scope);
                    start_subpass(ctx, behavior, 0);
                }),
            ),
        );
    }

    pub(crate) fn cmd_next_subpass(&mut self, id: CommandId, buffer: vk::CommandBuffer) {
        self.record(
            id,
            buffer,
            RecordedCommand::new(
                "vkCmdNextSubpass",
                Box::new(move |ctx, _| {
                    let behavior = ctx.behavior();
                    let Some(current) = ctx.exec.render_pass.as_ref().map(|s| s.current) else {
                        warn!("vkCmdNextSubpass outside a render pass");
                        return;
                    };
                    end_subpass(ctx, behavior, current);
                    if let Some(scope) = ctx.exec.render_pass.as_mut() {
                        scope.current = current + 1;
                    }
                    start_subpass(ctx, behavior, current + 1);
                }),
            ),
        );
    }

    pub(crate) fn cmd_end_render_pass(&mut self, id: CommandId, buffer: vk::CommandBuffer) {
        self.record(
            id,
            buffer,
            RecordedCommand::new(
                "vkCmdEndRenderPass",
                Box::new(move |ctx, _| {
                    let behavior = ctx.behavior();
                    let Some(current) = ctx.exec.render_pass.as_ref().map(|s| s.current) else {
                        warn!("vkCmdEndRenderPass outside a render pass");
                        return;
                    };
                    end_subpass(ctx, behavior, current);
                    if let Some(state) = ctx.state.command_buffers.get(&buffer) {
                        let begin = state.render_pass_begin;
                        ctx.emitter().read(behavior, &[Var::Id(begin)]);
                    }
                    ctx.exec.render_pass = None;
                }),
            ),
        );
    }

    // -- Draws and dispatches ------------------------------------------------

    pub(crate) fn cmd_draw(&mut self, id: CommandId, buffer: vk::CommandBuffer) {
        self.record(
            id,
            buffer,
            RecordedCommand::new(
                "vkCmdDraw",
                Box::new(move |ctx, sub| {
                    let behavior = ctx.behavior();
                    draw_behavior(ctx, behavior, sub);
                }),
            ),
        );
    }

    pub(crate) fn cmd_draw_indexed(
        &mut self,
        id: CommandId,
        buffer: vk::CommandBuffer,
        first_index: u32,
        index_count: u32,
    ) {
        self.record(
            id,
            buffer,
            RecordedCommand::new(
                "vkCmdDrawIndexed",
                Box::new(move |ctx, sub| {
                    let behavior = ctx.behavior();
                    read_index_data(ctx, behavior, sub, first_index, index_count);
                    draw_behavior(ctx, behavior, sub);
                }),
            ),
        );
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn cmd_draw_indirect(
        &mut self,
        id: CommandId,
        buffer: vk::CommandBuffer,
        indirect_buffer: vk::Buffer,
        offset: vk::DeviceSize,
        draw_count: u32,
        stride: u32,
        indexed: bool,
    ) {
        let name = if indexed {
            "vkCmdDrawIndexedIndirect"
        } else {
            "vkCmdDrawIndirect"
        };
        let command_size = if indexed { 20u64 } else { 16u64 };
        self.record(
            id,
            buffer,
            RecordedCommand::new(
                name,
                Box::new(move |ctx, sub| {
                    let behavior = ctx.behavior();
                    if indexed {
                        // Indirect indexed draws may read the entire bound
                        // index buffer range.
                        read_index_data(ctx, behavior, sub, 0, u32::MAX);
                    }
                    let size = (stride as u64).max(command_size) * draw_count as u64;
                    let data = ctx.buffer_data(indirect_buffer, offset, size);
                    let mut emitter = ctx.emitter();
                    emitter.read(behavior, &[Var::handle(indirect_buffer)]);
                    emitter.read(behavior, &data);
                    draw_behavior(ctx, behavior, sub);
                }),
            ),
        );
    }

    pub(crate) fn cmd_dispatch(&mut self, id: CommandId, buffer: vk::CommandBuffer) {
        self.record(
            id,
            buffer,
            RecordedCommand::new(
                "vkCmdDispatch",
                Box::new(move |ctx, sub| {
                    let behavior = ctx.behavior();
                    dispatch_behavior(ctx, behavior, sub);
                }),
            ),
        );
    }

    pub(crate) fn cmd_dispatch_indirect(
        &mut self,
        id: CommandId,
        buffer: vk::CommandBuffer,
        indirect_buffer: vk::Buffer,
        offset: vk::DeviceSize,
    ) {
        self.record(
            id,
            buffer,
            RecordedCommand::new(
                "vkCmdDispatchIndirect",
                Box::new(move |ctx, sub| {
                    let behavior = ctx.behavior();
                    let data = ctx.buffer_data(indirect_buffer, offset, 12);
                    let mut emitter = ctx.emitter();
                    emitter.read(behavior, &[Var::handle(indirect_buffer)]);
                    emitter.read(behavior, &data);
                    dispatch_behavior(ctx, behavior, sub);
                }),
            ),
        );
    }

    // -- Copies, blits, clears, fills ---------------------------------------

    pub(crate) fn cmd_copy_buffer(
        &mut self,
        id: CommandId,
        buffer: vk::CommandBuffer,
        src: vk::Buffer,
        dst: vk::Buffer,
        regions: &[vk::BufferCopy],
    ) {
        let regions = regions.to_vec();
        self.record(
            id,
            buffer,
            RecordedCommand::new(
                "vkCmdCopyBuffer",
                Box::new(move |ctx, _| {
                    let behavior = ctx.behavior();
                    for region in &regions {
                        let src_data = ctx.buffer_data(src, region.src_offset, region.size);
                        let dst_data = ctx.buffer_data(dst, region.dst_offset, region.size);
                        let mut emitter = ctx.emitter();
                        emitter.read(behavior, &[Var::handle(src)]);
                        emitter.read(behavior, &src_data);
                        emitter.read(behavior, &[Var::handle(dst)]);
                        emitter.write(behavior, &dst_data);
                    }
                }),
            ),
        );
    }

    pub(crate) fn cmd_copy_image(
        &mut self,
        id: CommandId,
        buffer: vk::CommandBuffer,
        src: vk::Image,
        dst: vk::Image,
        regions: &[vk::ImageCopy],
    ) {
        let regions = regions.to_vec();
        self.record(
            id,
            buffer,
            RecordedCommand::new(
                "vkCmdCopyImage",
                Box::new(move |ctx, _| {
                    let behavior = ctx.behavior();
                    read_image(ctx, behavior, src);
                    let covered = ctx.snapshot.image(dst).is_some_and(|info| {
                        regions.iter().any(|r| {
                            layers_fully_cover(&info, r.dst_subresource, r.dst_offset, r.extent)
                        })
                    });
                    write_image(ctx, behavior, dst, covered);
                }),
            ),
        );
    }

    pub(crate) fn cmd_copy_buffer_to_image(
        &mut self,
        id: CommandId,
        buffer: vk::CommandBuffer,
        src: vk::Buffer,
        dst: vk::Image,
        regions: &[vk::BufferImageCopy],
    ) {
        let regions = regions.to_vec();
        self.record(
            id,
            buffer,
            RecordedCommand::new(
                "vkCmdCopyBufferToImage",
                Box::new(move |ctx, _| {
                    let behavior = ctx.behavior();
                    let info = ctx.snapshot.image(dst);
                    for region in &regions {
                        let size = buffer_image_copy_size(info.as_ref(), region);
                        let data = ctx.buffer_data(src, region.buffer_offset, size);
                        let mut emitter = ctx.emitter();
                        emitter.read(behavior, &[Var::handle(src)]);
                        emitter.read(behavior, &data);
                    }
                    let covered = info.is_some_and(|info| {
                        regions.iter().any(|r| {
                            layers_fully_cover(&info, r.image_subresource, r.image_offset, r.image_extent)
                        })
                    });
                    write_image(ctx, behavior, dst, covered);
                }),
            ),
        );
    }

    pub(crate) fn cmd_copy_image_to_buffer(
        &mut self,
        id: CommandId,
        buffer: vk::CommandBuffer,
        src: vk::Image,
        dst: vk::Buffer,
        regions: &[vk::BufferImageCopy],
    ) {
        let regions = regions.to_vec();
        self.record(
            id,
            buffer,
            RecordedCommand::new(
                "vkCmdCopyImageToBuffer",
                Box::new(move |ctx, _| {
                    let behavior = ctx.behavior();
                    read_image(ctx, behavior, src);
                    let info = ctx.snapshot.image(src);
                    for region in &regions {
                        let size = buffer_image_copy_size(info.as_ref(), region);
                        let data = ctx.buffer_data(dst, region.buffer_offset, size);
                        let mut emitter = ctx.emitter();
                        emitter.read(behavior, &[Var::handle(dst)]);
                        emitter.write(behavior, &data);
                    }
                }),
            ),
        );
    }

    pub(crate) fn cmd_blit_image(
        &mut self,
        id: CommandId,
        buffer: vk::CommandBuffer,
        src: vk::Image,
        dst: vk::Image,
        regions: &[vk::ImageBlit],
    ) {
        let regions = regions.to_vec();
        self.record(
            id,
            buffer,
            RecordedCommand::new(
                "vkCmdBlitImage",
                Box::new(move |ctx, _| {
                    let behavior = ctx.behavior();
                    read_image(ctx, behavior, src);
                    let covered = ctx.snapshot.image(dst).is_some_and(|info| {
                        regions.iter().any(|r| blit_fully_covers(&info, r))
                    });
                    write_image(ctx, behavior, dst, covered);
                }),
            ),
        );
    }

    pub(crate) fn cmd_resolve_image(
        &mut self,
        id: CommandId,
        buffer: vk::CommandBuffer,
        src: vk::Image,
        dst: vk::Image,
        regions: &[vk::ImageResolve],
    ) {
        let regions = regions.to_vec();
        self.record(
            id,
            buffer,
            RecordedCommand::new(
                "vkCmdResolveImage",
                Box::new(move |ctx, _| {
                    let behavior = ctx.behavior();
                    read_image(ctx, behavior, src);
                    let covered = ctx.snapshot.image(dst).is_some_and(|info| {
                        regions.iter().any(|r| {
                            layers_fully_cover(&info, r.dst_subresource, r.dst_offset, r.extent)
                        })
                    });
                    write_image(ctx, behavior, dst, covered);
                }),
            ),
        );
    }

    pub(crate) fn cmd_clear_image(
        &mut self,
        id: CommandId,
        buffer: vk::CommandBuffer,
        image: vk::Image,
        ranges: &[vk::ImageSubresourceRange],
    ) {
        let ranges = ranges.to_vec();
        self.record(
            id,
            buffer,
            RecordedCommand::new(
                "vkCmdClearImage",
                Box::new(move |ctx, _| {
                    let behavior = ctx.behavior();
                    let covered = ctx.snapshot.image(image).is_some_and(|info| {
                        ranges.iter().any(|r| range_fully_covers(&info, *r))
                    });
                    write_image(ctx, behavior, image, covered);
                }),
            ),
        );
    }

    pub(crate) fn cmd_clear_attachments(
        &mut self,
        id: CommandId,
        buffer: vk::CommandBuffer,
        targets: &[ClearAttachmentTarget],
    ) {
        let targets = targets.to_vec();
        self.record(
            id,
            buffer,
            RecordedCommand::new(
                "vkCmdClearAttachments",
                Box::new(move |ctx, _| {
                    let behavior = ctx.behavior();
                    let Some(scope) = ctx.exec.render_pass.as_ref() else {
                        warn!("vkCmdClearAttachments outside a render pass");
                        return;
                    };
                    let subpass = &scope.subpasses[scope.current];
                    let mut data = Vec::new();
                    for target in &targets {
                        if target.aspect_mask.intersects(vk::ImageAspectFlags::COLOR) {
                            if let Some(&attachment) =
                                subpass.color.get(target.color_attachment as usize)
                            {
                                data.extend(scope.attachments[attachment].data.iter().copied());
                            }
                        }
                        if target.aspect_mask.intersects(
                            vk::ImageAspectFlags::DEPTH | vk::ImageAspectFlags::STENCIL,
                        ) {
                            if let Some(attachment) = subpass.depth_stencil {
                                data.extend(scope.attachments[attachment].data.iter().copied());
                            }
                        }
                    }
                    Emitter::new(ctx.table, ctx.footprint, ctx.debug).modify(behavior, &data);
                }),
            ),
        );
    }

    pub(crate) fn cmd_write_buffer(
        &mut self,
        id: CommandId,
        name: &str,
        buffer: vk::CommandBuffer,
        dst: vk::Buffer,
        offset: vk::DeviceSize,
        size: vk::DeviceSize,
    ) {
        self.record(
            id,
            buffer,
            RecordedCommand::new(
                name,
                Box::new(move |ctx, _| {
                    let behavior = ctx.behavior();
                    let data = ctx.buffer_data(dst, offset, size);
                    let mut emitter = ctx.emitter();
                    emitter.read(behavior, &[Var::handle(dst)]);
                    emitter.write(behavior, &data);
                }),
            ),
        );
    }

    // -- Events, barriers and queries ---------------------------------------

    pub(crate) fn cmd_pipeline_barrier(
        &mut self,
        id: CommandId,
        buffer: vk::CommandBuffer,
        image_barriers: &[ImageBarrier],
        _buffer_barriers: &[BufferBarrier],
    ) {
        let image_barriers = image_barriers.to_vec();
        self.record(
            id,
            buffer,
            RecordedCommand::new(
                "vkCmdPipelineBarrier",
                Box::new(move |ctx, _| {
                    let behavior = ctx.behavior();
                    for barrier in &image_barriers {
                        let layout = ctx.state.image_layout(barrier.image);
                        let mut emitter = ctx.emitter();
                        emitter.read(behavior, &[Var::handle(barrier.image)]);
                        if let Some(layout) = layout {
                            emitter.modify(behavior, &[Var::Id(layout)]);
                        }
                    }
                }),
            ),
        );
    }

    pub(crate) fn cmd_set_event(
        &mut self,
        id: CommandId,
        buffer: vk::CommandBuffer,
        event: vk::Event,
        signal: bool,
    ) {
        let name = if signal {
            "vkCmdSetEvent"
        } else {
            "vkCmdResetEvent"
        };
        self.record(
            id,
            buffer,
            RecordedCommand::new(
                name,
                Box::new(move |ctx, _| {
                    let behavior = ctx.behavior();
                    let Some(pair) = ctx.state.events.get(&event).copied() else {
                        warn!("unknown event handle {event:?}");
                        return;
                    };
                    let label = if signal { pair.signal } else { pair.unsignal };
                    let mut emitter = ctx.emitter();
                    emitter.read(behavior, &[Var::handle(event)]);
                    emitter.write(behavior, &[Var::Id(label)]);
                }),
            ),
        );
    }

    pub(crate) fn cmd_wait_events(
        &mut self,
        id: CommandId,
        buffer: vk::CommandBuffer,
        events: &[vk::Event],
    ) {
        let events = events.to_vec();
        self.record(
            id,
            buffer,
            RecordedCommand::new(
                "vkCmdWaitEvents",
                Box::new(move |ctx, _| {
                    let behavior = ctx.behavior();
                    let mut vars = Vec::new();
                    for event in &events {
                        let Some(pair) = ctx.state.events.get(event).copied() else {
                            warn!("unknown event handle {event:?}");
                            continue;
                        };
                        vars.extend([
                            Var::handle(*event),
                            Var::Id(pair.signal),
                            Var::Id(pair.unsignal),
                        ]);
                    }
                    ctx.emitter().read(behavior, &vars);
                }),
            ),
        );
    }

    pub(crate) fn cmd_reset_query_pool(
        &mut self,
        id: CommandId,
        buffer: vk::CommandBuffer,
        pool: vk::QueryPool,
        first_query: u32,
        query_count: u32,
    ) {
        self.record(
            id,
            buffer,
            RecordedCommand::new(
                "vkCmdResetQueryPool",
                Box::new(move |ctx, _| {
                    let behavior = ctx.behavior();
                    let vars = query_labels(ctx, pool, first_query, query_count, |q| q.reset);
                    let mut emitter = ctx.emitter();
                    emitter.read(behavior, &[Var::handle(pool)]);
                    emitter.write(behavior, &vars);
                }),
            ),
        );
    }

    pub(crate) fn cmd_begin_query(
        &mut self,
        id: CommandId,
        buffer: vk::CommandBuffer,
        pool: vk::QueryPool,
        query: u32,
    ) {
        self.record(
            id,
            buffer,
            RecordedCommand::new(
                "vkCmdBeginQuery",
                Box::new(move |ctx, _| {
                    let behavior = ctx.behavior();
                    let reset = query_labels(ctx, pool, query, 1, |q| q.reset);
                    let begin = query_labels(ctx, pool, query, 1, |q| q.begin);
                    let mut emitter = ctx.emitter();
                    emitter.read(behavior, &[Var::handle(pool)]);
                    emitter.read(behavior, &reset);
                    emitter.write(behavior, &begin);
                }),
            ),
        );
    }

    pub(crate) fn cmd_end_query(
        &mut self,
        id: CommandId,
        buffer: vk::CommandBuffer,
        pool: vk::QueryPool,
        query: u32,
    ) {
        self.record(
            id,
            buffer,
            RecordedCommand::new(
                "vkCmdEndQuery",
                Box::new(move |ctx, _| {
                    let behavior = ctx.behavior();
                    let begin = query_labels(ctx, pool, query, 1, |q| q.begin);
                    let end = query_labels(ctx, pool, query, 1, |q| q.end);
                    let mut emitter = ctx.emitter();
                    emitter.read(behavior, &[Var::handle(pool)]);
                    emitter.read(behavior, &begin);
                    emitter.write(behavior, &end);
                }),
            ),
        );
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn cmd_copy_query_pool_results(
        &mut self,
        id: CommandId,
        buffer: vk::CommandBuffer,
        pool: vk::QueryPool,
        first_query: u32,
        query_count: u32,
        dst: vk::Buffer,
        offset: vk::DeviceSize,
        stride: vk::DeviceSize,
    ) {
        self.record(
            id,
            buffer,
            RecordedCommand::new(
                "vkCmdCopyQueryPoolResults",
                Box::new(move |ctx, _| {
                    let behavior = ctx.behavior();
                    let end = query_labels(ctx, pool, first_query, query_count, |q| q.end);
                    let result = query_labels(ctx, pool, first_query, query_count, |q| q.result);
                    let size = stride.max(4) * query_count as u64;
                    let data = ctx.buffer_data(dst, offset, size);
                    let mut emitter = ctx.emitter();
                    emitter.read(behavior, &[Var::handle(pool), Var::handle(dst)]);
                    emitter.read(behavior, &end);
                    emitter.write(behavior, &result);
                    emitter.write(behavior, &data);
                }),
            ),
        );
    }

    // -- Secondary command buffers ------------------------------------------

    pub(crate) fn cmd_execute_commands(
        &mut self,
        id: CommandId,
        buffer: vk::CommandBuffer,
        secondaries: &[vk::CommandBuffer],
    ) {
        let captured = secondaries.to_vec();
        self.record(
            id,
            buffer,
            RecordedCommand::with_secondaries(
                "vkCmdExecuteCommands",
                secondaries.to_vec(),
                Box::new(move |ctx, _| {
                    let behavior = ctx.behavior();
                    // Secondary buffers start executing with fresh bound
                    // state; the render pass scope is inherited.
                    ctx.exec.secondary = Default::default();
                    let mut vars = Vec::new();
                    for secondary in &captured {
                        vars.push(Var::handle(*secondary));
                        if let Some(state) = ctx.state.command_buffers.get(secondary) {
                            vars.extend([Var::Id(state.begin), Var::Id(state.end)]);
                        }
                    }
                    ctx.emitter().read(behavior, &vars);
                }),
            ),
        );
    }
}

// -- Execution-time helpers ---------------------------------------------------

/// Labels of one field of a query-pool range; unknown pools or queries log
/// and resolve to nothing.
fn query_labels(
    ctx: &ExecutionCtx<'_>,
    pool: vk::QueryPool,
    first: u32,
    count: u32,
    field: impl Fn(&crate::state::QueryState) -> crate::graph::variable::VariableId,
) -> Vec<Var> {
    let Some(state) = ctx.state.query_pools.get(&pool) else {
        warn!("unknown query pool {pool:?}");
        return Vec::new();
    };
    (first..first.saturating_add(count))
        .filter_map(|i| state.queries.get(i as usize))
        .map(|q| Var::Id(field(q)))
        .collect()
}

/// Read an image: its backing data and layout label plus the handle.
fn read_image(ctx: &mut ExecutionCtx<'_>, behavior: BehaviorIndex, image: vk::Image) {
    let (layout, data) = ctx.image_layout_and_data(image);
    let mut emitter = ctx.emitter();
    emitter.read(behavior, &[Var::handle(image)]);
    emitter.read(behavior, &data);
    if let Some(layout) = layout {
        emitter.read(behavior, &[Var::Id(layout)]);
    }
}

/// Write an image: `write` when `covered` says the operation overwrites
/// every subresource, `modify` otherwise.
fn write_image(ctx: &mut ExecutionCtx<'_>, behavior: BehaviorIndex, image: vk::Image, covered: bool) {
    let (layout, data) = ctx.image_layout_and_data(image);
    let mut emitter = ctx.emitter();
    emitter.read(behavior, &[Var::handle(image)]);
    if covered {
        emitter.write(behavior, &data);
    } else {
        emitter.modify(behavior, &data);
    }
    if let Some(layout) = layout {
        emitter.read(behavior, &[Var::Id(layout)]);
    }
}

/// Capture everything `startSubpass`/`endSubpass` and draws will need about
/// the render pass now beginning.
fn collect_render_pass_scope(
    ctx: &mut ExecutionCtx<'_>,
    render_pass: vk::RenderPass,
    framebuffer: vk::Framebuffer,
) -> Option<RenderPassScope> {
    let rp = ctx.snapshot.render_pass(render_pass).or_else(|| {
        warn!("unknown render pass {render_pass:?}");
        None
    })?;
    let fb = ctx.snapshot.framebuffer(framebuffer).or_else(|| {
        warn!("unknown framebuffer {framebuffer:?}");
        None
    })?;

    let mut attachments = Vec::with_capacity(fb.attachments.len());
    for (i, &view) in fb.attachments.iter().enumerate() {
        let desc = rp.attachments.get(i).copied().unwrap_or(
            crate::trace::snapshot::AttachmentDesc {
                load_op: vk::AttachmentLoadOp::DONT_CARE,
                store_op: vk::AttachmentStoreOp::DONT_CARE,
                stencil_load_op: vk::AttachmentLoadOp::DONT_CARE,
                stencil_store_op: vk::AttachmentStoreOp::DONT_CARE,
            },
        );
        let view_info = ctx.snapshot.image_view(view);
        let (image, layout, data, full_image, has_stencil) = match view_info {
            Some(view_info) => {
                let (layout, data) = ctx.image_layout_and_data(view_info.image);
                let image_info = ctx.snapshot.image(view_info.image);
                let full = image_info
                    .as_ref()
                    .map(|info| view_fully_covers(info, &view_info, fb.extent))
                    .unwrap_or(false);
                let stencil = image_info
                    .map(|info| info.aspects.intersects(vk::ImageAspectFlags::STENCIL))
                    .unwrap_or(false);
                (view_info.image, layout, data, full, stencil)
            }
            None => {
                warn!("unknown image view {view:?} in framebuffer {framebuffer:?}");
                (vk::Image::null(), None, Vec::new(), false, false)
            }
        };
        attachments.push(AttachmentInfo {
            image,
            data,
            layout,
            full_image,
            load_op: desc.load_op,
            stencil_load_op: desc.stencil_load_op,
            store_op: desc.store_op,
            stencil_store_op: desc.stencil_store_op,
            has_stencil,
        });
    }

    let mut subpasses = Vec::with_capacity(rp.subpasses.len());
    let mut load_subpass = vec![None; attachments.len()];
    let mut store_subpass = vec![None; attachments.len()];
    for (index, desc) in rp.subpasses.iter().enumerate() {
        let mut subpass = SubpassInfo::default();
        let mut note = |attachment: u32| {
            let slot = attachment as usize;
            if slot < attachments.len() {
                if load_subpass[slot].is_none() {
                    load_subpass[slot] = Some(index);
                }
                store_subpass[slot] = Some(index);
            }
        };
        for reference in desc.input.iter().flatten() {
            note(*reference);
            subpass.input.push(*reference as usize);
        }
        for (color_slot, reference) in desc.color.iter().enumerate() {
            let Some(reference) = reference else { continue };
            note(*reference);
            subpass.color.push(*reference as usize);
            if let Some(Some(resolve)) = desc.resolve.get(color_slot) {
                note(*resolve);
                subpass.resolve.push((*resolve as usize, *reference as usize));
            }
        }
        if let Some(reference) = desc.depth_stencil {
            note(reference);
            subpass.depth_stencil = Some(reference as usize);
        }
        subpasses.push(subpass);
    }

    Some(RenderPassScope {
        attachments,
        subpasses,
        load_subpass,
        store_subpass,
        current: 0,
        subpass_label: ctx.table.new_label(),
        framebuffer,
    })
}

/// Apply per-attachment load semantics for the subpass now starting: LOAD
/// reads the attachment data, anything else writes it when the view fully
/// covers the image and modifies it otherwise. The layout label is always
/// modified. TODO: not every subpass transition changes the layout; track
/// the actual transitions from the render pass description.
fn start_subpass(ctx: &mut ExecutionCtx<'_>, behavior: BehaviorIndex, index: usize) {
    enum Access {
        Read,
        Write,
        Modify,
    }
    let Some(scope) = ctx.exec.render_pass.as_ref() else {
        return;
    };
    let subpass_label = scope.subpass_label;
    let mut work: Vec<(Vec<Var>, Option<Var>, Access)> = Vec::new();
    for (slot, attachment) in scope.attachments.iter().enumerate() {
        if scope.load_subpass[slot] != Some(index) {
            continue;
        }
        let loads = attachment.load_op == vk::AttachmentLoadOp::LOAD
            || (attachment.has_stencil
                && attachment.stencil_load_op == vk::AttachmentLoadOp::LOAD);
        let access = if loads {
            Access::Read
        } else if attachment.full_image {
            Access::Write
        } else {
            Access::Modify
        };
        work.push((
            attachment.data.clone(),
            attachment.layout.map(Var::Id),
            access,
        ));
    }
    let mut emitter = Emitter::new(ctx.table, ctx.footprint, ctx.debug);
    emitter.write(behavior, &[Var::Id(subpass_label)]);
    for (data, layout, access) in work {
        match access {
            Access::Read => emitter.read(behavior, &data),
            Access::Write => emitter.write(behavior, &data),
            Access::Modify => emitter.modify(behavior, &data),
        };
        if let Some(layout) = layout {
            emitter.modify(behavior, &[layout]);
        }
    }
}

/// Apply per-attachment store semantics for the subpass now ending. STORE
/// makes the rendered content visible in memory, so it reads what the
/// subpass produced and writes the data (modify). DONT_CARE discards the
/// content: a plain write when the view fully covers the image, modify
/// otherwise. Resolve attachments additionally read their paired color
/// attachment. The layout label is always modified, mirroring subpass
/// start.
fn end_subpass(ctx: &mut ExecutionCtx<'_>, behavior: BehaviorIndex, index: usize) {
    enum Access {
        Write,
        Modify,
    }
    let Some(scope) = ctx.exec.render_pass.as_ref() else {
        return;
    };
    let resolve_pairs: Vec<(usize, usize)> = scope
        .subpasses
        .get(index)
        .map(|s| s.resolve.clone())
        .unwrap_or_default();
    let mut work: Vec<(Vec<Var>, Option<Var>, Access)> = Vec::new();
    let mut resolve_reads: Vec<Vec<Var>> = Vec::new();
    for (slot, attachment) in scope.attachments.iter().enumerate() {
        if scope.store_subpass[slot] != Some(index) {
            continue;
        }
        let stores = attachment.store_op == vk::AttachmentStoreOp::STORE
            || (attachment.has_stencil
                && attachment.stencil_store_op == vk::AttachmentStoreOp::STORE);
        let access = if stores || !attachment.full_image {
            Access::Modify
        } else {
            Access::Write
        };
        work.push((
            attachment.data.clone(),
            attachment.layout.map(Var::Id),
            access,
        ));
        if let Some(&(_, color)) = resolve_pairs.iter().find(|(resolve, _)| *resolve == slot) {
            resolve_reads.push(scope.attachments[color].data.clone());
        }
    }
    let mut emitter = Emitter::new(ctx.table, ctx.footprint, ctx.debug);
    for data in resolve_reads {
        emitter.read(behavior, &data);
    }
    for (data, layout, access) in work {
        match access {
            Access::Write => emitter.write(behavior, &data),
            Access::Modify => emitter.modify(behavior, &data),
        };
        if let Some(layout) = layout {
            emitter.modify(behavior, &[layout]);
        }
    }
}

/// Index element size in bytes.
fn index_size(ty: vk::IndexType) -> u64 {
    match ty {
        vk::IndexType::UINT16 => 2,
        vk::IndexType::UINT8_EXT => 1,
        _ => 4,
    }
}

/// Read the bound index buffer over `[first * size, (first + count) * size)`.
fn read_index_data(
    ctx: &mut ExecutionCtx<'_>,
    behavior: BehaviorIndex,
    sub: &SubcommandRef,
    first_index: u32,
    index_count: u32,
) {
    let binding = match ctx.exec.context_mut(sub).index_buffer {
        Some(binding) => binding,
        None => {
            warn!("indexed draw without a bound index buffer");
            return;
        }
    };
    let element = index_size(binding.index_type);
    let start = binding.offset + first_index as u64 * element;
    let size = (index_count as u64).saturating_mul(element);
    let data = ctx.buffer_data(binding.buffer, start, size);
    let mut emitter = ctx.emitter();
    emitter.read(behavior, &[Var::handle(binding.buffer)]);
    emitter.read(behavior, &data);
}

/// The common read/modify set of every draw: pipeline and dynamic-state
/// labels, vertex buffer data, bound descriptor sets with per-type
/// semantics, and the current subpass's attachments.
fn draw_behavior(ctx: &mut ExecutionCtx<'_>, behavior: BehaviorIndex, sub: &SubcommandRef) {
    let context = ctx.exec.context_mut(sub);
    let pipeline = context.pipeline;
    let dynamic_state = context.dynamic_state;
    let vertex_buffers: Vec<VertexBinding> = context.vertex_buffers.values().copied().collect();
    let bound_sets: Vec<BoundDescriptorSet> = context.descriptor_sets.values().cloned().collect();

    {
        let mut emitter = ctx.emitter();
        if let Some(pipeline) = pipeline {
            emitter.read(behavior, &[Var::Id(pipeline)]);
        } else {
            warn!("draw without a bound pipeline");
        }
        if let Some(dynamic_state) = dynamic_state {
            emitter.read(behavior, &[Var::Id(dynamic_state)]);
        }
    }

    for binding in vertex_buffers {
        let data = ctx.buffer_data(binding.buffer, binding.offset, vk::WHOLE_SIZE);
        let mut emitter = ctx.emitter();
        emitter.read(behavior, &[Var::handle(binding.buffer)]);
        emitter.read(behavior, &data);
    }

    read_descriptor_sets(ctx, behavior, &bound_sets);

    // Current subpass attachments: inputs are read, color and depth/stencil
    // outputs are modified.
    let attachment_work = ctx.exec.render_pass.as_ref().map(|scope| {
        let subpass = &scope.subpasses[scope.current];
        let read: Vec<Var> = subpass
            .input
            .iter()
            .flat_map(|&slot| scope.attachments[slot].data.iter().copied())
            .collect();
        let modified: Vec<Var> = subpass
            .color
            .iter()
            .chain(subpass.depth_stencil.iter())
            .flat_map(|&slot| scope.attachments[slot].data.iter().copied())
            .collect();
        (scope.subpass_label, read, modified)
    });
    if let Some((subpass_label, read, modified)) = attachment_work {
        let mut emitter = ctx.emitter();
        emitter.read(behavior, &[Var::Id(subpass_label)]);
        emitter.read(behavior, &read);
        emitter.modify(behavior, &modified);
    }
}

/// The common read/modify set of every dispatch: pipeline label and bound
/// descriptor sets.
fn dispatch_behavior(ctx: &mut ExecutionCtx<'_>, behavior: BehaviorIndex, sub: &SubcommandRef) {
    let context = ctx.exec.context_mut(sub);
    let pipeline = context.pipeline;
    let bound_sets: Vec<BoundDescriptorSet> = context.descriptor_sets.values().cloned().collect();
    if let Some(pipeline) = pipeline {
        ctx.emitter().read(behavior, &[Var::Id(pipeline)]);
    } else {
        warn!("dispatch without a bound pipeline");
    }
    read_descriptor_sets(ctx, behavior, &bound_sets);
}

/// Per-descriptor-type access semantics: storage images and buffers are
/// modified, everything else is read. Dynamic buffer descriptors consume one
/// dynamic offset each, in binding order.
fn read_descriptor_sets(
    ctx: &mut ExecutionCtx<'_>,
    behavior: BehaviorIndex,
    bound_sets: &[BoundDescriptorSet],
) {
    for bound in bound_sets {
        ctx.emitter()
            .read(behavior, &[Var::Id(bound.var), Var::handle(bound.set)]);

        // Collect per-slot work first; the set state cannot stay borrowed
        // while data lookups run.
        struct SlotAccess {
            var: crate::graph::variable::VariableId,
            ty: vk::DescriptorType,
            contents: Option<DescriptorContents>,
        }
        let slots: Vec<SlotAccess> = match ctx.state.descriptor_sets.get(&bound.set) {
            Some(state) => state
                .bindings
                .values()
                .flat_map(|binding| {
                    binding.slots.iter().map(|slot| SlotAccess {
                        var: slot.var,
                        ty: binding.ty,
                        contents: slot.contents,
                    })
                })
                .collect(),
            None => {
                warn!("draw with unknown descriptor set {:?}", bound.set);
                continue;
            }
        };

        let mut dynamic_index = 0usize;
        for slot in slots {
            ctx.emitter().read(behavior, &[Var::Id(slot.var)]);
            let dynamic = slot.ty == vk::DescriptorType::UNIFORM_BUFFER_DYNAMIC
                || slot.ty == vk::DescriptorType::STORAGE_BUFFER_DYNAMIC;
            let dynamic_offset = if dynamic {
                let offset = bound.dynamic_offsets.get(dynamic_index).copied();
                dynamic_index += 1;
                offset.unwrap_or(0)
            } else {
                0
            };
            let Some(contents) = slot.contents else {
                continue;
            };
            let writes = matches!(
                slot.ty,
                vk::DescriptorType::STORAGE_IMAGE
                    | vk::DescriptorType::STORAGE_BUFFER
                    | vk::DescriptorType::STORAGE_BUFFER_DYNAMIC
                    | vk::DescriptorType::STORAGE_TEXEL_BUFFER
            );
            match contents {
                DescriptorContents::Sampler { sampler } => {
                    ctx.emitter().read(behavior, &[Var::handle(sampler)]);
                }
                DescriptorContents::Image { view, sampler } => {
                    let image = ctx.snapshot.image_view(view).map(|info| info.image);
                    let Some(image) = image else {
                        warn!("descriptor references unknown image view {view:?}");
                        continue;
                    };
                    if writes {
                        write_image(ctx, behavior, image, false);
                    } else {
                        read_image(ctx, behavior, image);
                    }
                    if sampler != vk::Sampler::null() {
                        ctx.emitter().read(behavior, &[Var::handle(sampler)]);
                    }
                }
                DescriptorContents::Buffer {
                    buffer,
                    offset,
                    range,
                }
                | DescriptorContents::TexelBufferView {
                    buffer,
                    offset,
                    range,
                } => {
                    let data = ctx.buffer_data(buffer, offset + dynamic_offset, range);
                    let mut emitter = ctx.emitter();
                    emitter.read(behavior, &[Var::handle(buffer)]);
                    if writes {
                        emitter.modify(behavior, &data);
                    } else {
                        emitter.read(behavior, &data);
                    }
                }
            }
        }
    }
}

// -- Coverage predicates ------------------------------------------------------

fn layer_count_covers(count: u32, total: u32) -> bool {
    count == vk::REMAINING_ARRAY_LAYERS || count >= total
}

fn level_count_covers(count: u32, total: u32) -> bool {
    count == vk::REMAINING_MIP_LEVELS || count >= total
}

/// Whether writing `extent` texels at `offset` into the given subresource
/// layers overwrites every texel of the image.
pub(crate) fn layers_fully_cover(
    info: &ImageInfo,
    layers: vk::ImageSubresourceLayers,
    offset: vk::Offset3D,
    extent: vk::Extent3D,
) -> bool {
    offset == vk::Offset3D::default()
        && extent.width == info.extent.width
        && extent.height == info.extent.height
        && extent.depth == info.extent.depth
        && layers.mip_level == 0
        && info.mip_levels == 1
        && layers.base_array_layer == 0
        && layer_count_covers(layers.layer_count, info.array_layers)
}

/// Whether the subresource range covers every subresource of the image.
pub(crate) fn range_fully_covers(info: &ImageInfo, range: vk::ImageSubresourceRange) -> bool {
    range.base_mip_level == 0
        && level_count_covers(range.level_count, info.mip_levels)
        && range.base_array_layer == 0
        && layer_count_covers(range.layer_count, info.array_layers)
        && range.aspect_mask.contains(info.aspects)
}

/// Whether a blit region overwrites the entire destination image.
pub(crate) fn blit_fully_covers(info: &ImageInfo, region: &vk::ImageBlit) -> bool {
    let [start, end] = region.dst_offsets;
    start == vk::Offset3D::default()
        && end.x as u32 == info.extent.width
        && end.y as u32 == info.extent.height
        && end.z.max(1) as u32 == info.extent.depth
        && region.dst_subresource.mip_level == 0
        && info.mip_levels == 1
        && region.dst_subresource.base_array_layer == 0
        && layer_count_covers(region.dst_subresource.layer_count, info.array_layers)
}

/// Whether an attachment view covers its whole image and matches the
/// framebuffer extent: writes through it then count as full overwrites.
pub(crate) fn view_fully_covers(
    info: &ImageInfo,
    view: &ImageViewInfo,
    fb_extent: vk::Extent2D,
) -> bool {
    view.range.base_array_layer == 0
        && layer_count_covers(view.range.layer_count, info.array_layers)
        && matches!(
            view.view_type,
            vk::ImageViewType::TYPE_2D | vk::ImageViewType::TYPE_2D_ARRAY
        )
        && info.extent.width == fb_extent.width
        && info.extent.height == fb_extent.height
}

/// Byte size of one buffer↔image copy region on the buffer side. Unknown
/// formats fall back to whole-size granularity.
fn buffer_image_copy_size(info: Option<&ImageInfo>, region: &vk::BufferImageCopy) -> u64 {
    let Some(element) = info.and_then(|i| i.format.byte_size()) else {
        return vk::WHOLE_SIZE;
    };
    let row = if region.buffer_row_length != 0 {
        region.buffer_row_length
    } else {
        region.image_extent.width
    } as u64;
    let height = if region.buffer_image_height != 0 {
        region.buffer_image_height
    } else {
        region.image_extent.height
    } as u64;
    let layers = region.image_subresource.layer_count.max(1) as u64;
    row * height * region.image_extent.depth.max(1) as u64 * layers * element as u64
}
