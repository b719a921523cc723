//! Synchronization semantics: semaphore chaining across submits, fence
//! signaling, presentation pinning and coherent-memory observations.

mod common;

use ash::vk::Handle;
use common::FakeTrace;
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

    fn of(&self, id: CommandId) -> Vec<Behavior> {
        self.builder.footprint().of_command(id).cloned().collect()
    }
}

fn record_one_command(runner: &mut Runner, pool: vk::CommandPool, cb: vk::CommandBuffer) {
    runner.run(Command::AllocateCommandBuffers {
        pool,
        level: vk::CommandBufferLevel::PRIMARY,
        buffers: vec![cb],
    });
    runner.run(Command::BeginCommandBuffer { buffer: cb });
    runner.run(Command::CmdSetDynamicState {
        buffer: cb,
        state: DynamicState::Viewport,
    });
    runner.run(Command::EndCommandBuffer { buffer: cb });
}

/// Submit A signals a semaphore; submit B waits on it and signals a fence.
/// B's execution-begin behavior must consume A's terminal semaphore write,
/// and B's terminal behavior must produce the fence signal a host wait
/// reads.
#[test]
fn semaphore_chains_submits_and_fence_reaches_the_host() {
    let mut runner = Runner::new();
    let semaphore = vk::Semaphore::from_raw(5);
    let fence = vk::Fence::from_raw(6);
    let queue = vk::Queue::from_raw(3);
    let pool = vk::CommandPool::from_raw(7);
    let cb_a = vk::CommandBuffer::from_raw(8);
    let cb_b = vk::CommandBuffer::from_raw(9);

    runner.run(Command::CreateSemaphore { semaphore });
    runner.run(Command::CreateFence { fence });
    runner.run(Command::CreateCommandPool { pool });
    record_one_command(&mut runner, pool, cb_a);
    record_one_command(&mut runner, pool, cb_b);

    let submit_a = runner.run(Command::QueueSubmit {
        queue,
        submits: vec![SubmitBatch {
            wait_semaphores: vec![],
            command_buffers: vec![cb_a],
            signal_semaphores: vec![semaphore],
        }],
        fence: vk::Fence::null(),
    });
    let submit_b = runner.run(Command::QueueSubmit {
        queue,
        submits: vec![SubmitBatch {
            wait_semaphores: vec![semaphore],
            command_buffers: vec![cb_b],
            signal_semaphores: vec![],
        }],
        fence,
    });
    let wait = runner.run(Command::WaitForFences {
        fences: vec![fence],
    });

    // A: submit, began, recorded command, terminal.
    let a = runner.of(submit_a);
    assert_eq!(a.len(), 4);
    let a_terminal = a.last().unwrap();

    // B's began behavior modifies the semaphore signal A's terminal wrote.
    let b = runner.of(submit_b);
    assert_eq!(b.len(), 4);
    let b_began = b[1].clone();
    let chained: Vec<VariableId> = b_began
        .reads()
        .iter()
        .copied()
        .filter(|v| a_terminal.writes_var(*v))
        .collect();
    assert!(!chained.is_empty(), "B must wait on A's semaphore write");
    assert!(
        chained.iter().all(|v| b_began.writes_var(*v)),
        "waiting consumes (modifies) the signal"
    );

    // The host fence wait reads what B's terminal behavior wrote.
    let b_terminal = b.last().unwrap();
    let wait_behavior = runner.of(wait)[0].clone();
    assert!(wait_behavior.alive());
    assert!(wait_behavior
        .reads()
        .iter()
        .any(|v| b_terminal.writes_var(*v)));
}

/// Presentation emits an extra always-alive behavior that reads the image's
/// acquired label and writes its presented label, holding the pair live.
#[test]
fn present_pins_the_acquire_present_pair() {
    let mut runner = Runner::new();
    let swapchain = vk::SwapchainKHR::from_raw(40);
    let image = vk::Image::from_raw(41);
    let queue = vk::Queue::from_raw(3);
    runner.trace.add_image(image, common::image_2d(32, 32));

    runner.run(Command::CreateSwapchain { swapchain });
    runner.run(Command::GetSwapchainImages {
        swapchain,
        images: vec![image],
    });
    let acquire = runner.run(Command::AcquireNextImage {
        swapchain,
        semaphore: vk::Semaphore::null(),
        fence: vk::Fence::null(),
        image_index: 0,
    });
    let present = runner.run(Command::QueuePresent {
        queue,
        wait_semaphores: vec![],
        targets: vec![PresentTarget {
            swapchain,
            image_index: 0,
        }],
    });

    let acquire_behavior = runner.of(acquire)[0].clone();
    let behaviors = runner.of(present);
    behaviors
        .iter()
        .find(|b| {
            b.alive()
                && b.reads()
                    .iter()
                    .any(|v| acquire_behavior.writes_var(*v))
                && !b.writes().is_empty()
        })
        .expect("an alive behavior must read the acquired label and write the presented label");

    // The next acquire of the same image depends on that presented write.
    let reacquire = runner.run(Command::AcquireNextImage {
        swapchain,
        semaphore: vk::Semaphore::null(),
        fence: vk::Fence::null(),
        image_index: 0,
    });
    let pair_writes: Vec<VariableId> = runner
        .builder
        .footprint()
        .of_command(present)
        .flat_map(|b| b.writes().iter().copied())
        .collect();
    let reacquire_behavior = runner.of(reacquire)[0].clone();
    assert!(reacquire_behavior
        .reads()
        .iter()
        .any(|v| pair_writes.contains(v)));
}

/// Host observations overlapping a mapped-coherent range stamp memory-span
/// writes on the submit and keep it alive.
#[test]
fn coherent_observations_mark_the_submit() {
    let mut runner = Runner::new();
    let memory = vk::DeviceMemory::from_raw(21);
    let buffer = vk::Buffer::from_raw(20);
    let queue = vk::Queue::from_raw(3);

    runner.trace.add_memory(memory, 4096, true);
    runner.trace.add_buffer(buffer, 4096);
    runner.run(Command::AllocateMemory { memory });
    runner.run(Command::CreateBuffer { buffer });
    runner.run(Command::BindBufferMemory {
        buffer,
        memory,
        offset: 0,
    });
    runner.run(Command::MapMemory {
        memory,
        offset: 0,
        size: vk::WHOLE_SIZE,
    });

    runner.trace.observed = vec![MemoryObservation {
        memory,
        offset: 128,
        size: 64,
    }];
    let submit = runner.run(Command::QueueSubmit {
        queue,
        submits: vec![],
        fence: vk::Fence::null(),
    });

    let behavior = runner.of(submit)[0].clone();
    assert!(behavior.alive());
    let wrote_span = behavior.writes().iter().any(|&v| {
        matches!(
            runner.builder.variables().kind(v),
            VariableKind::Span(span) if span.memory == memory
        )
    });
    assert!(wrote_span, "the observation must write a memory span");

    // A later read of the observed range depends on the submit's write.
    runner.trace.observed.clear();
    let invalidate = runner.run(Command::InvalidateMappedMemoryRanges {
        ranges: vec![MappedRange {
            memory,
            offset: 0,
            size: vk::WHOLE_SIZE,
        }],
    });
    let invalidate_behavior = runner.of(invalidate)[0].clone();
    assert!(invalidate_behavior
        .reads()
        .iter()
        .any(|v| behavior.writes_var(*v)));
}

/// Unmapping also scans observations, so writes through the mapping are
/// not lost when the mapping goes away.
#[test]
fn unmap_flushes_pending_observations() {
    let mut runner = Runner::new();
    let memory = vk::DeviceMemory::from_raw(21);
    runner.trace.add_memory(memory, 4096, true);
    runner.run(Command::AllocateMemory { memory });
    runner.run(Command::MapMemory {
        memory,
        offset: 0,
        size: vk::WHOLE_SIZE,
    });
    runner.trace.observed = vec![MemoryObservation {
        memory,
        offset: 0,
        size: 256,
    }];
    let unmap = runner.run(Command::UnmapMemory { memory });

    let behavior = runner.of(unmap)[0].clone();
    assert!(behavior.alive());
    assert!(!behavior.writes().is_empty());
}
