//! Queue submission and rollout, host synchronization and presentation.
//!
//! `vkQueueSubmit` stamps the top-level submit behavior, flattens the
//! submitted command buffers (secondaries included) into a FIFO pending
//! queue, then rolls the queue out against the execution order the
//! collaborator observed. Rollout halts for a submit the moment observed
//! and submitted orders diverge.

use std::collections::VecDeque;

use ash::vk;

use crate::binding::ResBinding;
use crate::builder::FootprintBuilder;
use crate::core::error::Error;
use crate::exec::{ExecutionCtx, PendingCommand, SubmitInfo};
use crate::graph::behavior::{BehaviorOwner, CommandId, SubcommandRef};
use crate::graph::emitter::Emitter;
use crate::graph::variable::Var;
use crate::state::{ImageState, SwapchainState};
use crate::trace::command::{PresentTarget, SubmitBatch};
use crate::trace::snapshot::{MutationEvents, TraceContext};

impl FootprintBuilder {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn queue_submit(
        &mut self,
        ctx: &dyn TraceContext,
        id: CommandId,
        queue: vk::Queue,
        submits: &[SubmitBatch],
        fence: vk::Fence,
        events: &MutationEvents,
    ) {
        let queued = self.table.new_label();
        let done = self.table.new_label();
        let behavior = self.behavior(id);
        // Coherent-memory observations may be shared with later submits, so
        // an overlap also marks the submit behavior alive.
        self.stamp_coherent_observations(ctx, behavior);
        self.emitter().read(behavior, &[Var::handle(queue)]);

        let mut pending = VecDeque::new();
        let mut wait_semaphores = Vec::new();
        let mut signal_semaphores = Vec::new();
        for (submit_index, batch) in submits.iter().enumerate() {
            wait_semaphores.extend_from_slice(&batch.wait_semaphores);
            signal_semaphores.extend_from_slice(&batch.signal_semaphores);
            for (cb_index, &buffer) in batch.command_buffers.iter().enumerate() {
                let Some(state) = self.state.command_buffers.get(&buffer) else {
                    warn!("submitted unknown command buffer {buffer:?}");
                    continue;
                };
                let end = state.end;
                let records = state.records.clone();
                self.emitter()
                    .read(behavior, &[Var::handle(buffer), Var::Id(end)]);
                for (cmd_index, record) in records.iter().enumerate() {
                    pending.push_back(PendingCommand {
                        expected: SubcommandRef {
                            submit_index,
                            command_buffer: cb_index,
                            command: cmd_index,
                            secondary: None,
                        },
                        command: record.clone(),
                        buffer,
                    });
                    // A vkCmdExecuteCommands interleaves every secondary
                    // buffer's deferred commands right behind it.
                    for (sec_index, &secondary) in record.secondaries.iter().enumerate() {
                        let Some(sec_state) = self.state.command_buffers.get(&secondary) else {
                            warn!("executing unknown secondary buffer {secondary:?}");
                            continue;
                        };
                        for (sec_cmd, sec_record) in sec_state.records.iter().enumerate() {
                            pending.push_back(PendingCommand {
                                expected: SubcommandRef {
                                    submit_index,
                                    command_buffer: cb_index,
                                    command: cmd_index,
                                    secondary: Some((sec_index, sec_cmd)),
                                },
                                command: sec_record.clone(),
                                buffer: secondary,
                            });
                        }
                    }
                }
            }
        }
        self.emitter().write(behavior, &[Var::Id(queued)]);

        self.submits.insert(
            id,
            SubmitInfo {
                queue,
                queued,
                done,
                wait_semaphores,
                signal_semaphores,
                signal_fence: fence,
                pending,
                began: false,
                halted: false,
            },
        );
        self.roll_out(ctx, id, &events.executed);
    }

    /// Walk the collaborator-reported execution order, popping the pending
    /// queue and evaluating each deferred behavior with the live queue
    /// state.
    pub(crate) fn roll_out(
        &mut self,
        ctx: &dyn TraceContext,
        id: CommandId,
        executed: &[SubcommandRef],
    ) {
        for sub in executed {
            let Some(submit) = self.submits.get_mut(&id) else {
                warn!("execution report for unknown submit {id}");
                return;
            };
            if submit.halted {
                continue;
            }
            let queue = submit.queue;
            let queued = submit.queued;
            let first = !submit.began;
            submit.began = true;
            let waits = if first {
                submit.wait_semaphores.clone()
            } else {
                Vec::new()
            };
            let Some(head) = submit.pending.pop_front() else {
                warn!("executed subcommand {sub} reported for drained submit {id}");
                continue;
            };

            // The first observed subcommand marks execution begin: waiting
            // consumes (reads and resets) every wait semaphore's signal.
            if first {
                let behavior = self
                    .footprint
                    .add_behavior(BehaviorOwner::submitted(id, *sub));
                let wait_vars = self.semaphore_signal_vars(&waits);
                let mut emitter = Emitter::new(&mut self.table, &mut self.footprint, self.debug);
                emitter.read(behavior, &[Var::Id(queued)]);
                emitter.modify(behavior, &wait_vars);
            }

            if head.expected != *sub {
                error!(
                    "{}",
                    Error::ExecutionOrderDivergence {
                        observed: sub.to_string(),
                        expected: format!("{} ({})", head.expected, head.command.name),
                    }
                );
                if let Some(submit) = self.submits.get_mut(&id) {
                    submit.halted = true;
                }
                continue;
            }

            let mut exec = self.queues.remove(&queue).unwrap_or_default();
            {
                let mut exec_ctx = ExecutionCtx {
                    table: &mut self.table,
                    footprint: &mut self.footprint,
                    state: &mut self.state,
                    exec: &mut exec,
                    snapshot: ctx,
                    owner: BehaviorOwner::submitted(id, *sub),
                    debug: self.debug,
                };
                head.command.behave(&mut exec_ctx, sub);
            }
            self.queues.insert(queue, exec);

            self.finish_submit_if_drained(id, *sub);
        }
    }

    /// After the last pending subcommand drains, a terminal behavior reads
    /// `queued`, writes `done`, and signals semaphores and fence.
    fn finish_submit_if_drained(&mut self, id: CommandId, sub: SubcommandRef) {
        let Some(submit) = self.submits.get(&id) else {
            return;
        };
        if submit.halted || !submit.pending.is_empty() {
            return;
        }
        let queued = submit.queued;
        let done = submit.done;
        let signals = submit.signal_semaphores.clone();
        let fence = submit.signal_fence;

        let behavior = self.footprint.add_behavior(BehaviorOwner::submitted(id, sub));
        let signal_vars = self.semaphore_signal_vars(&signals);
        let fence_signal = self.state.fences.get(&fence).map(|pair| pair.signal);
        let mut emitter = Emitter::new(&mut self.table, &mut self.footprint, self.debug);
        emitter.read(behavior, &[Var::Id(queued)]);
        emitter.write(behavior, &[Var::Id(done)]);
        emitter.write(behavior, &signal_vars);
        if let Some(signal) = fence_signal {
            emitter.write(behavior, &[Var::Id(signal)]);
        }
    }

    // -- Host synchronization ------------------------------------------------

    pub(crate) fn queue_wait_idle(&mut self, id: CommandId, queue: vk::Queue) {
        let behavior = self.behavior(id);
        self.emitter().read(behavior, &[Var::handle(queue)]);
        self.footprint.keep_alive(behavior);
    }

    pub(crate) fn device_wait_idle(&mut self, id: CommandId) {
        let behavior = self.behavior(id);
        self.footprint.keep_alive(behavior);
    }

    pub(crate) fn reset_fences(&mut self, id: CommandId, fences: &[vk::Fence]) {
        let behavior = self.behavior(id);
        for fence in fences {
            let Some(pair) = self.state.fences.get(fence).copied() else {
                warn!("unknown fence handle {fence:?}");
                continue;
            };
            let mut emitter = self.emitter();
            emitter.read(behavior, &[Var::handle(*fence)]);
            emitter.write(behavior, &[Var::Id(pair.unsignal)]);
        }
    }

    pub(crate) fn wait_for_fences(&mut self, id: CommandId, fences: &[vk::Fence]) {
        let behavior = self.behavior(id);
        for fence in fences {
            let Some(pair) = self.state.fences.get(fence).copied() else {
                warn!("unknown fence handle {fence:?}");
                continue;
            };
            self.emitter()
                .read(behavior, &[Var::handle(*fence), Var::Id(pair.signal)]);
        }
        self.footprint.keep_alive(behavior);
    }

    pub(crate) fn get_fence_status(&mut self, id: CommandId, fence: vk::Fence) {
        let behavior = self.behavior(id);
        if let Some(pair) = self.state.fences.get(&fence).copied() {
            self.emitter().read(
                behavior,
                &[
                    Var::handle(fence),
                    Var::Id(pair.signal),
                    Var::Id(pair.unsignal),
                ],
            );
        }
        self.footprint.keep_alive(behavior);
    }

    pub(crate) fn host_set_event(&mut self, id: CommandId, event: vk::Event, signal: bool) {
        let behavior = self.behavior(id);
        let Some(pair) = self.state.events.get(&event).copied() else {
            warn!("unknown event handle {event:?}");
            return;
        };
        let label = if signal { pair.signal } else { pair.unsignal };
        let mut emitter = self.emitter();
        emitter.read(behavior, &[Var::handle(event)]);
        emitter.write(behavior, &[Var::Id(label)]);
        self.footprint.keep_alive(behavior);
    }

    pub(crate) fn get_event_status(&mut self, id: CommandId, event: vk::Event) {
        let behavior = self.behavior(id);
        if let Some(pair) = self.state.events.get(&event).copied() {
            self.emitter().read(
                behavior,
                &[
                    Var::handle(event),
                    Var::Id(pair.signal),
                    Var::Id(pair.unsignal),
                ],
            );
        }
        self.footprint.keep_alive(behavior);
    }

    pub(crate) fn get_query_pool_results(
        &mut self,
        id: CommandId,
        pool: vk::QueryPool,
        first_query: u32,
        query_count: u32,
    ) {
        let behavior = self.behavior(id);
        let vars: Vec<Var> = match self.state.query_pools.get(&pool) {
            Some(state) => (first_query..first_query.saturating_add(query_count))
                .filter_map(|i| state.queries.get(i as usize))
                .flat_map(|q| [Var::Id(q.end), Var::Id(q.result)])
                .collect(),
            None => {
                warn!("unknown query pool {pool:?}");
                Vec::new()
            }
        };
        let mut emitter = self.emitter();
        emitter.read(behavior, &[Var::handle(pool)]);
        emitter.read(behavior, &vars);
        self.footprint.keep_alive(behavior);
    }

    // -- Presentation --------------------------------------------------------

    pub(crate) fn create_swapchain(&mut self, id: CommandId, swapchain: vk::SwapchainKHR) {
        self.state
            .swapchains
            .insert(swapchain, SwapchainState::default());
        self.stamp_create(id, &[Var::handle(swapchain)]);
    }

    pub(crate) fn destroy_swapchain(&mut self, id: CommandId, swapchain: vk::SwapchainKHR) {
        let mut handles = vec![Var::handle(swapchain)];
        if let Some(state) = self.state.swapchains.remove(&swapchain) {
            for image in state.images {
                self.state.images.remove(&image);
                handles.push(Var::handle(image));
            }
        }
        self.stamp_destroy(id, &handles);
    }

    pub(crate) fn get_swapchain_images(
        &mut self,
        ctx: &dyn TraceContext,
        id: CommandId,
        swapchain: vk::SwapchainKHR,
        images: &[vk::Image],
    ) {
        let mut vars = vec![Var::handle(swapchain)];
        let mut swapchain_state = SwapchainState {
            images: images.to_vec(),
            ..Default::default()
        };
        for &image in images {
            let size = ctx
                .image(image)
                .map(|info| info.byte_size)
                .unwrap_or(vk::WHOLE_SIZE);
            let layout = self.table.new_label();
            let backing = self.table.new_label();
            let acquired = self.table.new_label();
            let presented = self.table.new_label();
            let mut state = ImageState {
                layout: Some(layout),
                is_swapchain: true,
                ..Default::default()
            };
            // The presentation engine owns the storage; a label stands in
            // for data the trace can never address.
            state.opaque.add(ResBinding::labeled(0, size, backing));
            self.state.images.insert(image, state);
            swapchain_state.acquired.push(acquired);
            swapchain_state.presented.push(presented);
            vars.extend([
                Var::handle(image),
                Var::Id(layout),
                Var::Id(backing),
                Var::Id(acquired),
                Var::Id(presented),
            ]);
        }
        self.state.swapchains.insert(swapchain, swapchain_state);
        self.stamp_create(id, &vars);
    }

    pub(crate) fn acquire_next_image(
        &mut self,
        id: CommandId,
        swapchain: vk::SwapchainKHR,
        semaphore: vk::Semaphore,
        fence: vk::Fence,
        image_index: u32,
    ) {
        let Some(state) = self.state.swapchains.get(&swapchain) else {
            warn!("acquire from unknown swapchain {swapchain:?}");
            return;
        };
        let index = image_index as usize;
        let (Some(&acquired), Some(&presented), Some(&image)) = (
            state.acquired.get(index),
            state.presented.get(index),
            state.images.get(index),
        ) else {
            warn!("acquired image index {image_index} out of range for {swapchain:?}");
            return;
        };
        let semaphore_signal = self.state.semaphores.get(&semaphore).map(|p| p.signal);
        let fence_signal = self.state.fences.get(&fence).map(|p| p.signal);

        let behavior = self.behavior(id);
        let mut emitter = self.emitter();
        emitter.read(
            behavior,
            &[
                Var::handle(swapchain),
                Var::handle(image),
                Var::Id(presented),
            ],
        );
        emitter.write(behavior, &[Var::Id(acquired)]);
        if let Some(signal) = semaphore_signal {
            emitter.write(behavior, &[Var::Id(signal)]);
        }
        if let Some(signal) = fence_signal {
            emitter.write(behavior, &[Var::Id(signal)]);
        }
    }

    pub(crate) fn queue_present(
        &mut self,
        id: CommandId,
        queue: vk::Queue,
        wait_semaphores: &[vk::Semaphore],
        targets: &[PresentTarget],
    ) {
        let behavior = self.behavior(id);
        {
            let waits = self.semaphore_signal_vars(wait_semaphores);
            let mut emitter = self.emitter();
            emitter.read(behavior, &[Var::handle(queue)]);
            emitter.modify(behavior, &waits);
        }

        // The extra behavior pins each acquire/present pair live so the
        // pruner never stalls the presentation engine.
        let pair_behavior = self.behavior(id);
        self.footprint.keep_alive(behavior);
        self.footprint.keep_alive(pair_behavior);

        for target in targets {
            let Some(state) = self.state.swapchains.get(&target.swapchain) else {
                warn!("present to unknown swapchain {:?}", target.swapchain);
                continue;
            };
            let index = target.image_index as usize;
            let (Some(&acquired), Some(&presented), Some(&image)) = (
                state.acquired.get(index),
                state.presented.get(index),
                state.images.get(index),
            ) else {
                warn!(
                    "presented image index {} out of range for {:?}",
                    target.image_index, target.swapchain
                );
                continue;
            };
            let (layout, data) = match self.state.images.get(&image) {
                Some(image_state) => (image_state.layout, image_state.data()),
                None => (None, Vec::new()),
            };
            let mut emitter = Emitter::new(&mut self.table, &mut self.footprint, self.debug);
            // The presented contents are the observable output.
            emitter.read(behavior, &[Var::handle(image), Var::Id(acquired)]);
            emitter.read(behavior, &data);
            if let Some(layout) = layout {
                emitter.read(behavior, &[Var::Id(layout)]);
            }
            emitter.read(pair_behavior, &[Var::Id(acquired)]);
            emitter.write(pair_behavior, &[Var::Id(presented)]);
        }
    }
}
