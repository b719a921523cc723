//! Resource lifecycle, memory and binding families of the dispatcher.

use ash::vk;

use crate::binding::ResBinding;
use crate::builder::FootprintBuilder;
use crate::graph::behavior::CommandId;
use crate::graph::variable::{MemorySpan, Var};
use crate::state::{ImageState, SignalPair, SparseBlock};
use crate::trace::command::MappedRange;
use crate::trace::snapshot::{MutationEvents, SparseBind, TraceContext};
use crate::util::byte_size::ByteSize;
use crate::util::extent::{block_index, mip_extent};

impl FootprintBuilder {
    pub(crate) fn create_buffer(&mut self, id: CommandId, buffer: vk::Buffer) {
        self.state.buffers.insert(buffer, Default::default());
        self.stamp_create(id, &[Var::handle(buffer)]);
    }

    pub(crate) fn destroy_buffer(&mut self, id: CommandId, buffer: vk::Buffer) {
        self.state.buffers.remove(&buffer);
        self.stamp_destroy(id, &[Var::handle(buffer)]);
    }

    pub(crate) fn create_image(&mut self, id: CommandId, image: vk::Image) {
        let layout = self.table.new_label();
        self.state.images.insert(
            image,
            ImageState {
                layout: Some(layout),
                ..Default::default()
            },
        );
        let behavior = self.behavior(id);
        self.emitter()
            .write(behavior, &[Var::handle(image), Var::Id(layout)]);
    }

    pub(crate) fn destroy_image(&mut self, id: CommandId, image: vk::Image) {
        self.state.images.remove(&image);
        self.stamp_destroy(id, &[Var::handle(image)]);
    }

    pub(crate) fn create_query_pool(&mut self, id: CommandId, pool: vk::QueryPool, count: u32) {
        let mut vars = vec![Var::handle(pool)];
        let mut queries = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let query = crate::state::QueryState {
                reset: self.table.new_label(),
                begin: self.table.new_label(),
                end: self.table.new_label(),
                result: self.table.new_label(),
            };
            vars.extend([
                Var::Id(query.reset),
                Var::Id(query.begin),
                Var::Id(query.end),
                Var::Id(query.result),
            ]);
            queries.push(query);
        }
        self.state
            .query_pools
            .insert(pool, crate::state::QueryPoolState { queries });
        self.stamp_create(id, &vars);
    }

    pub(crate) fn create_semaphore(&mut self, id: CommandId, semaphore: vk::Semaphore) {
        let pair = SignalPair::new(&mut self.table);
        self.state.semaphores.insert(semaphore, pair);
        self.stamp_create(
            id,
            &[
                Var::handle(semaphore),
                Var::Id(pair.signal),
                Var::Id(pair.unsignal),
            ],
        );
    }

    pub(crate) fn create_fence(&mut self, id: CommandId, fence: vk::Fence) {
        let pair = SignalPair::new(&mut self.table);
        self.state.fences.insert(fence, pair);
        self.stamp_create(
            id,
            &[
                Var::handle(fence),
                Var::Id(pair.signal),
                Var::Id(pair.unsignal),
            ],
        );
    }

    pub(crate) fn create_event(&mut self, id: CommandId, event: vk::Event) {
        let pair = SignalPair::new(&mut self.table);
        self.state.events.insert(event, pair);
        self.stamp_create(
            id,
            &[
                Var::handle(event),
                Var::Id(pair.signal),
                Var::Id(pair.unsignal),
            ],
        );
    }

    // -- Memory --------------------------------------------------------------

    pub(crate) fn free_memory(&mut self, id: CommandId, memory: vk::DeviceMemory) {
        self.table.drop_spans(memory);
        self.state.coherent_memories.remove(&memory);
        self.stamp_destroy(id, &[Var::handle(memory)]);
    }

    pub(crate) fn map_memory(
        &mut self,
        ctx: &dyn TraceContext,
        id: CommandId,
        memory: vk::DeviceMemory,
        offset: vk::DeviceSize,
        size: vk::DeviceSize,
    ) {
        let behavior = self.behavior(id);
        self.emitter().read(behavior, &[Var::handle(memory)]);
        let Some(info) = ctx.device_memory(memory) else {
            warn!("unknown device memory {memory:?} in vkMapMemory");
            return;
        };
        if info.coherent {
            let end = if size == vk::WHOLE_SIZE {
                info.size
            } else {
                offset.saturating_add(size).min(info.size)
            };
            self.state.coherent_memories.insert(memory, (offset, end));
        }
    }

    pub(crate) fn unmap_memory(
        &mut self,
        ctx: &dyn TraceContext,
        id: CommandId,
        memory: vk::DeviceMemory,
    ) {
        let behavior = self.behavior(id);
        self.stamp_coherent_observations(ctx, behavior);
        self.emitter().read(behavior, &[Var::handle(memory)]);
        self.state.coherent_memories.remove(&memory);
    }

    pub(crate) fn flush_ranges(
        &mut self,
        ctx: &dyn TraceContext,
        id: CommandId,
        ranges: &[MappedRange],
    ) {
        let behavior = self.behavior(id);
        for range in ranges {
            let Some(span) = self.resolve_range(ctx, range) else {
                continue;
            };
            let mut emitter = self.emitter();
            emitter.read(behavior, &[Var::handle(range.memory)]);
            emitter.write(behavior, &[Var::Span(span)]);
        }
    }

    pub(crate) fn invalidate_ranges(
        &mut self,
        ctx: &dyn TraceContext,
        id: CommandId,
        ranges: &[MappedRange],
    ) {
        let behavior = self.behavior(id);
        for range in ranges {
            let Some(span) = self.resolve_range(ctx, range) else {
                continue;
            };
            let mut emitter = self.emitter();
            emitter.read(behavior, &[Var::handle(range.memory), Var::Span(span)]);
        }
        // The host observes the invalidated ranges.
        self.footprint.keep_alive(behavior);
    }

    fn resolve_range(&self, ctx: &dyn TraceContext, range: &MappedRange) -> Option<MemorySpan> {
        let Some(info) = ctx.device_memory(range.memory) else {
            warn!("unknown device memory {:?} in mapped range", range.memory);
            return None;
        };
        let end = if range.size == vk::WHOLE_SIZE {
            info.size
        } else {
            range.offset.saturating_add(range.size).min(info.size)
        };
        Some(MemorySpan {
            memory: range.memory,
            start: range.offset,
            end,
        })
    }

    /// Scan the collaborator's memory observations against mapped-coherent
    /// ranges; each overlap stamps a write to the corresponding span.
    /// Returns true when any overlap was found; such behaviors are kept
    /// alive because observations may be shared with later submits.
    pub(crate) fn stamp_coherent_observations(
        &mut self,
        ctx: &dyn TraceContext,
        behavior: crate::graph::behavior::BehaviorIndex,
    ) -> bool {
        let mut touched = false;
        let spans: Vec<MemorySpan> = ctx
            .observations()
            .iter()
            .filter_map(|obs| {
                let (start, end) = *self.state.coherent_memories.get(&obs.memory)?;
                MemorySpan {
                    memory: obs.memory,
                    start: obs.offset,
                    end: obs.offset.saturating_add(obs.size),
                }
                .intersect(start, end)
            })
            .collect();
        for span in spans {
            self.emitter().write(behavior, &[Var::Span(span)]);
            touched = true;
        }
        if touched {
            self.footprint.keep_alive(behavior);
        }
        touched
    }

    // -- Bindings ------------------------------------------------------------

    pub(crate) fn bind_buffer_memory(
        &mut self,
        ctx: &dyn TraceContext,
        id: CommandId,
        buffer: vk::Buffer,
        memory: vk::DeviceMemory,
        offset: vk::DeviceSize,
    ) {
        let Some(info) = ctx.buffer(buffer) else {
            warn!("unknown buffer {buffer:?} in vkBindBufferMemory");
            return;
        };
        let binding = ResBinding::opaque(0, info.size, memory, offset);
        let behavior = self.behavior(id);
        {
            let mut emitter = self.emitter();
            emitter.read(behavior, &[Var::handle(buffer), Var::handle(memory)]);
            emitter.write(behavior, &[binding.backing_var()]);
        }
        if let Some(state) = self.state.buffers.get_mut(&buffer) {
            state.bindings.add(binding);
        }
    }

    pub(crate) fn bind_image_memory(
        &mut self,
        ctx: &dyn TraceContext,
        id: CommandId,
        image: vk::Image,
        memory: vk::DeviceMemory,
        offset: vk::DeviceSize,
    ) {
        let Some(info) = ctx.image(image) else {
            warn!("unknown image {image:?} in vkBindImageMemory");
            return;
        };
        let binding = ResBinding::opaque(0, info.byte_size, memory, offset);
        let behavior = self.behavior(id);
        {
            let mut emitter = self.emitter();
            emitter.read(behavior, &[Var::handle(image), Var::handle(memory)]);
            emitter.write(behavior, &[binding.backing_var()]);
        }
        if let Some(state) = self.state.images.get_mut(&image) {
            state.opaque.add(binding);
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn queue_bind_sparse(
        &mut self,
        ctx: &dyn TraceContext,
        id: CommandId,
        queue: vk::Queue,
        wait_semaphores: &[vk::Semaphore],
        signal_semaphores: &[vk::Semaphore],
        fence: vk::Fence,
        events: &MutationEvents,
    ) {
        let behavior = self.behavior(id);
        self.emitter().read(behavior, &[Var::handle(queue)]);
        let waits = self.semaphore_signal_vars(wait_semaphores);
        self.emitter().modify(behavior, &waits);

        for bind in &events.sparse_binds {
            self.apply_sparse_bind(ctx, behavior, bind);
        }

        let signals = self.semaphore_signal_vars(signal_semaphores);
        self.emitter().write(behavior, &signals);
        if let Some(pair) = self.state.fences.get(&fence).copied() {
            self.emitter().write(behavior, &[Var::Id(pair.signal)]);
        }
    }

    fn apply_sparse_bind(
        &mut self,
        ctx: &dyn TraceContext,
        behavior: crate::graph::behavior::BehaviorIndex,
        bind: &SparseBind,
    ) {
        match *bind {
            SparseBind::Buffer {
                buffer,
                resource_offset,
                size,
                memory,
                memory_offset,
            } => {
                if memory == vk::DeviceMemory::null() {
                    debug!("sparse unbind of buffer {buffer:?} ignored");
                    return;
                }
                let binding = ResBinding::opaque(resource_offset, size, memory, memory_offset);
                let mut emitter = self.emitter();
                emitter.read(behavior, &[Var::handle(buffer), Var::handle(memory)]);
                emitter.write(behavior, &[binding.backing_var()]);
                drop(emitter);
                if let Some(state) = self.state.buffers.get_mut(&buffer) {
                    state.bindings.add(binding);
                } else {
                    warn!("sparse bind to unknown buffer {buffer:?}");
                }
            }
            SparseBind::ImageOpaque {
                image,
                resource_offset,
                size,
                memory,
                memory_offset,
            } => {
                if memory == vk::DeviceMemory::null() {
                    debug!("sparse unbind of image {image:?} ignored");
                    return;
                }
                let binding = ResBinding::opaque(resource_offset, size, memory, memory_offset);
                let mut emitter = self.emitter();
                emitter.read(behavior, &[Var::handle(image), Var::handle(memory)]);
                emitter.write(behavior, &[binding.backing_var()]);
                drop(emitter);
                if let Some(state) = self.state.images.get_mut(&image) {
                    state.opaque.add(binding);
                } else {
                    warn!("sparse bind to unknown image {image:?}");
                }
            }
            SparseBind::Image {
                image,
                aspect_mask,
                layer,
                level,
                offset,
                extent: _,
                memory,
                memory_offset,
            } => {
                if memory == vk::DeviceMemory::null() {
                    debug!("sparse unbind of image {image:?} ignored");
                    return;
                }
                let Some(info) = ctx.image(image) else {
                    warn!("sparse bind to unknown image {image:?}");
                    return;
                };
                // First entry whose aspect mask intersects wins.
                let Some(requirement) = info
                    .sparse_requirements
                    .iter()
                    .find(|r| r.aspect_mask.intersects(aspect_mask))
                else {
                    warn!("no sparse requirements for aspect {aspect_mask:?} of {image:?}");
                    return;
                };
                let block = requirement.block_extent;
                let block_size = block.width as u64
                    * block.height as u64
                    * block.depth as u64
                    * info.format.byte_size().unwrap_or(4) as u64;
                let index = block_index(offset, mip_extent(info.extent, level), block);
                let span = MemorySpan::new(memory, memory_offset, block_size);
                let var = self.table.new_sparse_binding();
                {
                    let mut emitter = self.emitter();
                    emitter.read(behavior, &[Var::handle(image), Var::handle(memory)]);
                    emitter.write(behavior, &[Var::Span(span), Var::Id(var)]);
                }
                if let Some(state) = self.state.images.get_mut(&image) {
                    state
                        .sparse
                        .entry(aspect_mask)
                        .or_default()
                        .entry(layer)
                        .or_default()
                        .entry(level)
                        .or_default()
                        .insert(index, SparseBlock { var, span });
                }
            }
        }
    }

    /// Signal labels of the given semaphores; unknown handles are logged
    /// and skipped.
    pub(crate) fn semaphore_signal_vars(&self, semaphores: &[vk::Semaphore]) -> Vec<Var> {
        semaphores
            .iter()
            .filter_map(|s| match self.state.semaphores.get(s) {
                Some(pair) => Some(Var::Id(pair.signal)),
                None => {
                    warn!("unknown semaphore handle {s:?}");
                    None
                }
            })
            .collect()
    }
}
