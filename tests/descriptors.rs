//! Descriptor tracking: overflow carry, update idempotence and dynamic
//! offsets.

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
}

fn two_binding_layout(ty: vk::DescriptorType, count: u32) -> DescriptorSetLayoutInfo {
    DescriptorSetLayoutInfo {
        bindings: vec![
            LayoutBinding {
                binding: 0,
                ty,
                count,
            },
            LayoutBinding {
                binding: 1,
                ty,
                count,
            },
        ],
    }
}

fn allocate_set(runner: &mut Runner, layout_info: DescriptorSetLayoutInfo) -> (vk::DescriptorSet, CommandId) {
    let pool = vk::DescriptorPool::from_raw(30);
    let layout = vk::DescriptorSetLayout::from_raw(31);
    let set = vk::DescriptorSet::from_raw(32);
    runner.trace.set_layouts.insert(layout, layout_info);
    runner.run(Command::CreateDescriptorPool { pool });
    runner.run(Command::CreateDescriptorSetLayout { layout });
    let id = runner.run(Command::AllocateDescriptorSets {
        pool,
        layouts: vec![layout],
        sets: vec![set],
    });
    (set, id)
}

fn buffer_element(buffer: vk::Buffer, offset: u64, range: u64) -> DescriptorContents {
    DescriptorContents::Buffer {
        buffer,
        offset,
        range,
    }
}

/// A write starting at (binding 0, element 1) with three elements lands in
/// slots (0,1), (1,0) and (1,1): DstBinding carries by one and
/// DstArrayElement resets to zero.
#[test]
fn descriptor_write_overflow_carries_to_next_binding() {
    let mut runner = Runner::new();
    let buffer = vk::Buffer::from_raw(20);
    runner.trace.add_buffer(buffer, 1024);
    let (set, alloc) = allocate_set(
        &mut runner,
        two_binding_layout(vk::DescriptorType::UNIFORM_BUFFER, 2),
    );

    let update = runner.run(Command::UpdateDescriptorSets {
        writes: vec![DescriptorWrite {
            set,
            binding: 0,
            array_element: 1,
            ty: vk::DescriptorType::UNIFORM_BUFFER,
            elements: vec![
                buffer_element(buffer, 0, 64),
                buffer_element(buffer, 64, 64),
                buffer_element(buffer, 128, 64),
            ],
        }],
        copies: vec![],
    });

    // Allocation writes [set handle, s00, s01, s10, s11]; the update must
    // write exactly the last three slot variables.
    let footprint = runner.builder.footprint();
    let allocated: Vec<VariableId> = footprint.of_command(alloc).next().unwrap().writes().to_vec();
    let updated: Vec<VariableId> = footprint.of_command(update).next().unwrap().writes().to_vec();
    assert_eq!(updated, allocated[2..5].to_vec());
}

/// Repeated identical updates produce an identical dependency shape.
#[test]
fn identical_updates_have_identical_shape() {
    let mut runner = Runner::new();
    let buffer = vk::Buffer::from_raw(20);
    runner.trace.add_buffer(buffer, 1024);
    let (set, _) = allocate_set(
        &mut runner,
        two_binding_layout(vk::DescriptorType::UNIFORM_BUFFER, 1),
    );

    let write = DescriptorWrite {
        set,
        binding: 0,
        array_element: 0,
        ty: vk::DescriptorType::UNIFORM_BUFFER,
        elements: vec![buffer_element(buffer, 0, 256)],
    };
    let first = runner.run(Command::UpdateDescriptorSets {
        writes: vec![write.clone()],
        copies: vec![],
    });
    let second = runner.run(Command::UpdateDescriptorSets {
        writes: vec![write],
        copies: vec![],
    });

    let footprint = runner.builder.footprint();
    let a = footprint.of_command(first).next().unwrap();
    let b = footprint.of_command(second).next().unwrap();
    assert_eq!(a.reads(), b.reads());
    assert_eq!(a.writes(), b.writes());
}

/// Copies walk source and destination with parallel overflow carry and move
/// the contents across.
#[test]
fn descriptor_copy_reads_source_and_writes_destination() {
    let mut runner = Runner::new();
    let buffer = vk::Buffer::from_raw(20);
    runner.trace.add_buffer(buffer, 1024);

    let pool = vk::DescriptorPool::from_raw(30);
    let layout = vk::DescriptorSetLayout::from_raw(31);
    let src = vk::DescriptorSet::from_raw(32);
    let dst = vk::DescriptorSet::from_raw(33);
    runner.trace.set_layouts.insert(
        layout,
        two_binding_layout(vk::DescriptorType::UNIFORM_BUFFER, 1),
    );
    runner.run(Command::CreateDescriptorPool { pool });
    runner.run(Command::CreateDescriptorSetLayout { layout });
    let alloc = runner.run(Command::AllocateDescriptorSets {
        pool,
        layouts: vec![layout, layout],
        sets: vec![src, dst],
    });
    runner.run(Command::UpdateDescriptorSets {
        writes: vec![DescriptorWrite {
            set: src,
            binding: 0,
            array_element: 0,
            ty: vk::DescriptorType::UNIFORM_BUFFER,
            elements: vec![buffer_element(buffer, 0, 64), buffer_element(buffer, 64, 64)],
        }],
        copies: vec![],
    });
    // Two descriptors from (src, binding 0) into (dst, binding 0): carries
    // into binding 1 on both sides.
    let copy = runner.run(Command::UpdateDescriptorSets {
        writes: vec![],
        copies: vec![DescriptorCopy {
            src_set: src,
            src_binding: 0,
            src_array_element: 0,
            dst_set: dst,
            dst_binding: 0,
            dst_array_element: 0,
            count: 2,
        }],
    });

    let footprint = runner.builder.footprint();
    // Allocation wrote [src handle, src slots(2), dst handle, dst slots(2)].
    let allocated = footprint.of_command(alloc).next().unwrap().writes().to_vec();
    let behavior = footprint.of_command(copy).next().unwrap();
    let src_slots = &allocated[1..3];
    let dst_slots = &allocated[4..6];
    for slot in src_slots {
        assert!(behavior.reads_var(*slot));
    }
    for slot in dst_slots {
        assert!(behavior.writes_var(*slot));
    }
}

/// A dynamic uniform descriptor's offset shifts the buffer window the draw
/// reads: offset 64 over (offset 0, range 256) reads [64, 320) and not
/// [0, 64).
#[test]
fn dynamic_offset_shifts_the_read_window() {
    let mut runner = Runner::new();
    let buffer = vk::Buffer::from_raw(20);
    let memory = vk::DeviceMemory::from_raw(21);
    let pool = vk::CommandPool::from_raw(7);
    let cb = vk::CommandBuffer::from_raw(8);
    let queue = vk::Queue::from_raw(3);

    runner.trace.add_buffer(buffer, 1024);
    runner.trace.add_memory(memory, 1024, true);

    runner.run(Command::CreateBuffer { buffer });
    runner.run(Command::AllocateMemory { memory });
    runner.run(Command::BindBufferMemory {
        buffer,
        memory,
        offset: 0,
    });
    // Two flushes split the recorded spans at the dynamic-offset boundary
    // so the read window is observable in the edges.
    runner.run(Command::MapMemory {
        memory,
        offset: 0,
        size: vk::WHOLE_SIZE,
    });
    let low = runner.run(Command::FlushMappedMemoryRanges {
        ranges: vec![MappedRange {
            memory,
            offset: 0,
            size: 64,
        }],
    });
    let high = runner.run(Command::FlushMappedMemoryRanges {
        ranges: vec![MappedRange {
            memory,
            offset: 64,
            size: 256,
        }],
    });

    let (set, _) = allocate_set(
        &mut runner,
        DescriptorSetLayoutInfo {
            bindings: vec![LayoutBinding {
                binding: 0,
                ty: vk::DescriptorType::UNIFORM_BUFFER_DYNAMIC,
                count: 1,
            }],
        },
    );
    runner.run(Command::UpdateDescriptorSets {
        writes: vec![DescriptorWrite {
            set,
            binding: 0,
            array_element: 0,
            ty: vk::DescriptorType::UNIFORM_BUFFER_DYNAMIC,
            elements: vec![buffer_element(buffer, 0, 256)],
        }],
        copies: vec![],
    });

    runner.run(Command::CreateCommandPool { pool });
    runner.run(Command::AllocateCommandBuffers {
        pool,
        level: vk::CommandBufferLevel::PRIMARY,
        buffers: vec![cb],
    });
    runner.run(Command::BeginCommandBuffer { buffer: cb });
    runner.run(Command::CmdBindDescriptorSets {
        buffer: cb,
        bind_point: vk::PipelineBindPoint::GRAPHICS,
        first_set: 0,
        sets: vec![set],
        dynamic_offsets: vec![64],
    });
    runner.run(Command::CmdDraw {
        buffer: cb,
        vertex_count: 3,
        instance_count: 1,
    });
    runner.run(Command::EndCommandBuffer { buffer: cb });
    let submit = runner.run(Command::QueueSubmit {
        queue,
        submits: vec![SubmitBatch {
            wait_semaphores: vec![],
            command_buffers: vec![cb],
            signal_semaphores: vec![],
        }],
        fence: vk::Fence::null(),
    });

    let footprint = runner.builder.footprint();
    let low_var = footprint.of_command(low).next().unwrap().writes()[0];
    let high_var = footprint.of_command(high).next().unwrap().writes()[0];
    let draw = footprint
        .of_command(submit)
        .find(|b| b.owner().sub.map_or(false, |s| s.command == 1))
        .expect("draw behavior");
    assert!(
        draw.reads_var(high_var),
        "the shifted window covers the [64, 320) span"
    );
    assert!(
        !draw.reads_var(low_var),
        "the [0, 64) span is outside the shifted window"
    );
}
