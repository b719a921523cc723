//! End-to-end footprints over small literal traces.

mod common;

use ash::vk::Handle;
use common::{image_2d, FakeTrace};
use vk_footprint::prelude::*;

struct Runner {
    trace: FakeTrace,
    builder: FootprintBuilder,
    next: u64,
}

impl Runner {
    fn new() -> Self {
        Runner {
            trace: FakeTrace::new(),
            builder: FootprintBuilder::new(),
            next: 0,
        }
    }

    fn run(&mut self, command: Command) -> CommandId {
        let id = CommandId(self.next);
        self.next += 1;
        self.builder.build_command(&mut self.trace, id, &command);
        id
    }

    fn submit_one(&mut self, queue: vk::Queue, buffer: vk::CommandBuffer) -> CommandId {
        self.run(Command::QueueSubmit {
            queue,
            submits: vec![SubmitBatch {
                wait_semaphores: vec![],
                command_buffers: vec![buffer],
                signal_semaphores: vec![],
            }],
            fence: vk::Fence::null(),
        })
    }

    /// Behaviors owned by `id`, in stamping order.
    fn of(&self, id: CommandId) -> Vec<&Behavior> {
        self.builder.footprint().of_command(id).collect()
    }

    /// The behavior of the rolled-out subcommand `command` of submit `id`.
    /// Submit behaviors are ordered [top-level, began, behaves…, terminal],
    /// so the behave of recorded command `k` sits at position `2 + k`.
    fn subcommand(&self, id: CommandId, command: usize) -> &Behavior {
        let behaviors: Vec<&Behavior> = self.builder.footprint().of_command(id).collect();
        let behavior = behaviors[2 + command];
        assert_eq!(
            behavior.owner().sub.map(|s| s.command),
            Some(command),
            "behavior order does not match rollout order"
        );
        behavior
    }

    fn spans_of(&self, vars: &[VariableId], memory: vk::DeviceMemory) -> Vec<VariableId> {
        vars.iter()
            .copied()
            .filter(|&v| match self.builder.variables().kind(v) {
                VariableKind::Span(span) => span.memory == memory,
                _ => false,
            })
            .collect()
    }
}

/// Record a one-draw render pass into `cb`.
fn record_draw_pass(
    runner: &mut Runner,
    cb: vk::CommandBuffer,
    render_pass: vk::RenderPass,
    framebuffer: vk::Framebuffer,
) {
    runner.run(Command::BeginCommandBuffer { buffer: cb });
    runner.run(Command::CmdBeginRenderPass {
        buffer: cb,
        render_pass,
        framebuffer,
    });
    runner.run(Command::CmdDraw {
        buffer: cb,
        vertex_count: 3,
        instance_count: 1,
    });
    runner.run(Command::CmdEndRenderPass { buffer: cb });
    runner.run(Command::EndCommandBuffer { buffer: cb });
}

fn setup_draw_target(runner: &mut Runner) -> (vk::Image, vk::DeviceMemory, vk::CommandBuffer, vk::Queue, vk::Framebuffer) {
    let image = vk::Image::from_raw(1);
    let memory = vk::DeviceMemory::from_raw(2);
    let queue = vk::Queue::from_raw(3);
    let view = vk::ImageView::from_raw(4);
    let render_pass = vk::RenderPass::from_raw(5);
    let framebuffer = vk::Framebuffer::from_raw(6);
    let pool = vk::CommandPool::from_raw(7);
    let cb = vk::CommandBuffer::from_raw(8);

    runner.trace.add_image(image, image_2d(32, 32));
    runner.trace.add_memory(memory, 4096, false);
    runner.trace.add_full_view(view, image);
    runner.trace.add_single_color_pass(
        render_pass,
        framebuffer,
        view,
        vk::Extent2D {
            width: 32,
            height: 32,
        },
        vk::AttachmentLoadOp::DONT_CARE,
        vk::AttachmentStoreOp::STORE,
    );

    runner.run(Command::CreateImage { image });
    runner.run(Command::AllocateMemory { memory });
    runner.run(Command::BindImageMemory {
        image,
        memory,
        offset: 0,
    });
    runner.run(Command::CreateImageView { view });
    runner.run(Command::CreateRenderPass { render_pass });
    runner.run(Command::CreateFramebuffer { framebuffer });
    runner.run(Command::CreateCommandPool { pool });
    runner.run(Command::AllocateCommandBuffers {
        pool,
        level: vk::CommandBufferLevel::PRIMARY,
        buffers: vec![cb],
    });
    record_draw_pass(runner, cb, render_pass, framebuffer);
    (image, memory, cb, queue, framebuffer)
}

/// A draw whose output nothing reads leaves its backing-span chain with no
/// live downstream reader: pruner-eligible.
#[test]
fn dead_draw_is_pruner_eligible() {
    let mut runner = Runner::new();
    let (_, memory, cb, queue, _) = setup_draw_target(&mut runner);
    let submit = runner.submit_one(queue, cb);

    // Subcommands: 0 = begin render pass, 1 = draw, 2 = end render pass.
    let draw = runner.subcommand(submit, 1);
    let written = runner.spans_of(draw.writes(), memory);
    assert!(!written.is_empty(), "draw must write the backing span");
    assert!(!draw.alive());

    // Nothing in the trace reads the final backing data of the image, and
    // nothing alive touches any span of its memory.
    let behaviors = runner.builder.footprint().behaviors();
    for behavior in behaviors {
        if behavior.alive() {
            assert!(
                runner.spans_of(behavior.reads(), memory).is_empty(),
                "no alive behavior may pin the dead draw's memory"
            );
        }
    }
}

/// With a last submission reported by the global state, an extra alive
/// behavior reads the framebuffer's backing data, transitively pinning the
/// draw chain.
#[test]
fn last_draw_pin_keeps_the_draw_reachable() {
    let mut runner = Runner::new();
    let (_, memory, cb, queue, framebuffer) = setup_draw_target(&mut runner);
    runner.trace.last = Some(LastSubmission {
        queue,
        framebuffer,
    });
    let submit = runner.submit_one(queue, cb);

    let behaviors = runner.builder.footprint().behaviors();
    let pin = behaviors
        .iter()
        .rev()
        .find(|b| b.alive() && !runner.spans_of(b.reads(), memory).is_empty())
        .expect("an alive behavior must read the framebuffer backing data");

    // The pinned span was defined by the store at end-of-render-pass, which
    // read the draw's output, which read the load write: the chain to the
    // draw is intact.
    let pinned = runner.spans_of(pin.reads(), memory)[0];
    let store = runner
        .builder
        .variables()
        .def(pinned)
        .expect("pinned span has a defining behavior");
    let store = runner.builder.footprint().get(store);
    let store_reads = runner.spans_of(store.reads(), memory);
    assert!(!store_reads.is_empty(), "store must read the rendered span");

    let draw = runner.subcommand(submit, 1);
    assert!(runner
        .spans_of(draw.writes(), memory)
        .iter()
        .any(|v| store_reads.contains(v)));
}

/// Full-region copies overwrite the destination (write); partial-region
/// copies preserve the rest (modify).
#[test]
fn copy_full_writes_partial_modifies() {
    for (extent, expect_dst_read) in [(512u32, false), (256u32, true)] {
        let mut runner = Runner::new();
        let src = vk::Image::from_raw(10);
        let dst = vk::Image::from_raw(11);
        let src_memory = vk::DeviceMemory::from_raw(20);
        let dst_memory = vk::DeviceMemory::from_raw(21);
        let pool = vk::CommandPool::from_raw(7);
        let cb = vk::CommandBuffer::from_raw(8);
        let queue = vk::Queue::from_raw(3);

        runner.trace.add_image(src, image_2d(512, 512));
        runner.trace.add_image(dst, image_2d(512, 512));
        runner.trace.add_memory(src_memory, 1 << 20, false);
        runner.trace.add_memory(dst_memory, 1 << 20, false);

        runner.run(Command::CreateImage { image: src });
        runner.run(Command::CreateImage { image: dst });
        runner.run(Command::AllocateMemory { memory: src_memory });
        runner.run(Command::AllocateMemory { memory: dst_memory });
        runner.run(Command::BindImageMemory {
            image: src,
            memory: src_memory,
            offset: 0,
        });
        runner.run(Command::BindImageMemory {
            image: dst,
            memory: dst_memory,
            offset: 0,
        });
        runner.run(Command::CreateCommandPool { pool });
        runner.run(Command::AllocateCommandBuffers {
            pool,
            level: vk::CommandBufferLevel::PRIMARY,
            buffers: vec![cb],
        });
        runner.run(Command::BeginCommandBuffer { buffer: cb });
        let layers = vk::ImageSubresourceLayers {
            aspect_mask: vk::ImageAspectFlags::COLOR,
            mip_level: 0,
            base_array_layer: 0,
            layer_count: 1,
        };
        runner.run(Command::CmdCopyImage {
            buffer: cb,
            src,
            dst,
            regions: vec![vk::ImageCopy {
                src_subresource: layers,
                src_offset: vk::Offset3D::default(),
                dst_subresource: layers,
                dst_offset: vk::Offset3D::default(),
                extent: vk::Extent3D {
                    width: extent,
                    height: extent,
                    depth: 1,
                },
            }],
        });
        runner.run(Command::EndCommandBuffer { buffer: cb });
        let submit = runner.submit_one(queue, cb);

        let copy = runner.subcommand(submit, 0);
        assert!(
            !runner.spans_of(copy.reads(), src_memory).is_empty(),
            "copy must read the source backing data"
        );
        assert!(
            !runner.spans_of(copy.writes(), dst_memory).is_empty(),
            "copy must write the destination backing data"
        );
        assert_eq!(
            !runner.spans_of(copy.reads(), dst_memory).is_empty(),
            expect_dst_read,
            "destination is read back only when the region covers it partially"
        );
    }
}

/// Secondary command buffers interleave behind their vkCmdExecuteCommands
/// in submission order, and the rollout accepts the collaborator's report.
#[test]
fn secondary_buffers_interleave_in_order() {
    let mut runner = Runner::new();
    let pool = vk::CommandPool::from_raw(7);
    let primary = vk::CommandBuffer::from_raw(8);
    let s1 = vk::CommandBuffer::from_raw(9);
    let s2 = vk::CommandBuffer::from_raw(10);
    let queue = vk::Queue::from_raw(3);

    runner.run(Command::CreateCommandPool { pool });
    runner.run(Command::AllocateCommandBuffers {
        pool,
        level: vk::CommandBufferLevel::PRIMARY,
        buffers: vec![primary],
    });
    runner.run(Command::AllocateCommandBuffers {
        pool,
        level: vk::CommandBufferLevel::SECONDARY,
        buffers: vec![s1, s2],
    });

    for (buffer, draws) in [(s1, 2usize), (s2, 1usize)] {
        runner.run(Command::BeginCommandBuffer { buffer });
        for _ in 0..draws {
            runner.run(Command::CmdDraw {
                buffer,
                vertex_count: 3,
                instance_count: 1,
            });
        }
        runner.run(Command::EndCommandBuffer { buffer });
    }
    runner.run(Command::BeginCommandBuffer { buffer: primary });
    runner.run(Command::CmdExecuteCommands {
        buffer: primary,
        secondaries: vec![s1, s2],
    });
    runner.run(Command::EndCommandBuffer { buffer: primary });
    let submit = runner.submit_one(queue, primary);

    // submit + began + exec-commands + three draws + terminal.
    let behaviors = runner.of(submit);
    assert_eq!(behaviors.len(), 7);

    let secondary_refs: Vec<Option<(usize, usize)>> = behaviors
        .iter()
        .filter_map(|b| b.owner().sub)
        .map(|s| s.secondary)
        .collect();
    assert!(secondary_refs.contains(&Some((0, 0))));
    assert!(secondary_refs.contains(&Some((0, 1))));
    assert!(secondary_refs.contains(&Some((1, 0))));
}

/// Scrambled execution order halts the rollout for the submit after the
/// first mismatch.
#[test]
fn execution_order_divergence_halts_rollout() {
    let mut runner = Runner::new();
    let pool = vk::CommandPool::from_raw(7);
    let cb = vk::CommandBuffer::from_raw(8);
    let queue = vk::Queue::from_raw(3);

    runner.run(Command::CreateCommandPool { pool });
    runner.run(Command::AllocateCommandBuffers {
        pool,
        level: vk::CommandBufferLevel::PRIMARY,
        buffers: vec![cb],
    });
    runner.run(Command::BeginCommandBuffer { buffer: cb });
    for _ in 0..3 {
        runner.run(Command::CmdDraw {
            buffer: cb,
            vertex_count: 3,
            instance_count: 1,
        });
    }
    runner.run(Command::EndCommandBuffer { buffer: cb });

    runner.trace.scramble_execution = true;
    let submit = runner.submit_one(queue, cb);

    // Top-level submit behavior plus the execution-begin behavior; nothing
    // else rolls out once the order diverges.
    assert_eq!(runner.of(submit).len(), 2);
}

/// A reset command buffer leaves no residual deferred behaviors behind.
#[test]
fn reset_clears_deferred_commands() {
    let mut runner = Runner::new();
    let pool = vk::CommandPool::from_raw(7);
    let cb = vk::CommandBuffer::from_raw(8);
    let queue = vk::Queue::from_raw(3);

    runner.run(Command::CreateCommandPool { pool });
    runner.run(Command::AllocateCommandBuffers {
        pool,
        level: vk::CommandBufferLevel::PRIMARY,
        buffers: vec![cb],
    });
    runner.run(Command::BeginCommandBuffer { buffer: cb });
    runner.run(Command::CmdDraw {
        buffer: cb,
        vertex_count: 3,
        instance_count: 1,
    });
    runner.run(Command::ResetCommandBuffer { buffer: cb });
    runner.run(Command::BeginCommandBuffer { buffer: cb });
    runner.run(Command::EndCommandBuffer { buffer: cb });
    let submit = runner.submit_one(queue, cb);

    // Only the top-level submit behavior: the pending queue was empty.
    assert_eq!(runner.of(submit).len(), 1);
}

/// A failing mutation stamps a single aborted behavior with no edges.
#[test]
fn failed_mutation_aborts_the_command() {
    let mut runner = Runner::new();
    let image = vk::Image::from_raw(1);
    runner.trace.add_image(image, image_2d(4, 4));
    runner.trace.fail_next_mutation = true;
    let id = runner.run(Command::CreateImage { image });

    let behaviors = runner.of(id);
    assert_eq!(behaviors.len(), 1);
    assert!(behaviors[0].aborted());
    assert!(behaviors[0].reads().is_empty());
    assert!(behaviors[0].writes().is_empty());
}

/// Unknown commands stay alive: never drop what we do not understand.
#[test]
fn unknown_commands_are_kept_alive() {
    let mut runner = Runner::new();
    let id = runner.run(Command::Other {
        name: String::from("vkCmdFrobnicateEXT"),
    });
    let behaviors = runner.of(id);
    assert_eq!(behaviors.len(), 1);
    assert!(behaviors[0].alive());
}

/// The dot export names behaviors and draws def-use edges.
#[test]
fn dot_export_contains_def_use_edges() {
    let mut runner = Runner::new();
    let (_, _, cb, queue, _) = setup_draw_target(&mut runner);
    runner.submit_one(queue, cb);

    let dot = runner.builder.footprint().dot();
    assert!(dot.contains("digraph"));
    assert!(dot.contains("cmd0"));
    assert!(dot.contains("->"));
}
