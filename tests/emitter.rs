//! Dependency emitter semantics: null handles, span subdivision at read
//! time, forward-paired label reader lists.

use ash::vk::Handle;
use vk_footprint::prelude::*;

fn memory(raw: u64) -> vk::DeviceMemory {
    vk::DeviceMemory::from_raw(raw)
}

fn span(raw: u64, start: u64, end: u64) -> MemorySpan {
    MemorySpan {
        memory: memory(raw),
        start,
        end,
    }
}

struct Fixture {
    table: VariableTable,
    footprint: Footprint,
}

impl Fixture {
    fn new() -> Self {
        Fixture {
            table: VariableTable::new(),
            footprint: Footprint::new(),
        }
    }

    fn behavior(&mut self, index: u64) -> BehaviorIndex {
        self.footprint
            .add_behavior(BehaviorOwner::direct(CommandId(index)))
    }

    fn emitter(&mut self) -> Emitter<'_> {
        Emitter::new(&mut self.table, &mut self.footprint, false)
    }
}

#[test]
fn null_handles_are_dropped() {
    let mut fx = Fixture::new();
    let behavior = fx.behavior(0);
    assert!(!fx.emitter().read(behavior, &[Var::Handle(0)]));
    assert!(!fx.emitter().write(behavior, &[Var::Handle(0)]));
    assert!(fx.footprint.get(behavior).reads().is_empty());
    assert!(fx.footprint.get(behavior).writes().is_empty());
}

#[test]
fn handle_reads_attach_to_the_interned_variable() {
    let mut fx = Fixture::new();
    let writer = fx.behavior(0);
    let reader = fx.behavior(1);
    assert!(fx.emitter().write(writer, &[Var::Handle(42)]));
    assert!(fx.emitter().read(reader, &[Var::Handle(42)]));

    let written = fx.footprint.get(writer).writes()[0];
    assert_eq!(fx.footprint.get(reader).reads(), &[written]);
    assert_eq!(fx.table.def(written), Some(writer));
}

/// A write to [0, 200) followed by a write to [100, 300) and a read of
/// [0, 300) must produce two read edges, one to each covering writer.
#[test]
fn overlapping_writes_subdivide_at_read() {
    let mut fx = Fixture::new();
    let first = fx.behavior(0);
    let second = fx.behavior(1);
    let reader = fx.behavior(2);

    fx.emitter().write(first, &[Var::Span(span(1, 0, 200))]);
    fx.emitter().write(second, &[Var::Span(span(1, 100, 300))]);
    fx.emitter().read(reader, &[Var::Span(span(1, 0, 300))]);

    let first_var = fx.footprint.get(first).writes()[0];
    let second_var = fx.footprint.get(second).writes()[0];
    let reads = fx.footprint.get(reader).reads();
    assert_eq!(reads.len(), 2);
    assert!(reads.contains(&first_var));
    assert!(reads.contains(&second_var));
}

#[test]
fn fully_overwritten_spans_are_not_read() {
    let mut fx = Fixture::new();
    let old = fx.behavior(0);
    let new = fx.behavior(1);
    let reader = fx.behavior(2);

    fx.emitter().write(old, &[Var::Span(span(1, 0, 100))]);
    fx.emitter().write(new, &[Var::Span(span(1, 0, 100))]);
    fx.emitter().read(reader, &[Var::Span(span(1, 0, 100))]);

    let old_var = fx.footprint.get(old).writes()[0];
    let new_var = fx.footprint.get(new).writes()[0];
    let reads = fx.footprint.get(reader).reads();
    assert_eq!(reads, &[new_var]);
    assert!(!reads.contains(&old_var));
}

#[test]
fn reads_in_other_memories_do_not_alias() {
    let mut fx = Fixture::new();
    let writer = fx.behavior(0);
    let reader = fx.behavior(1);

    fx.emitter().write(writer, &[Var::Span(span(1, 0, 100))]);
    fx.emitter().read(reader, &[Var::Span(span(2, 0, 100))]);
    assert!(fx.footprint.get(reader).reads().is_empty());
}

#[test]
fn a_split_entry_keeps_its_identity_on_both_sides() {
    let mut fx = Fixture::new();
    let host = fx.behavior(0);
    let hole = fx.behavior(1);
    let left = fx.behavior(2);
    let right = fx.behavior(3);

    fx.emitter().write(host, &[Var::Span(span(1, 0, 300))]);
    fx.emitter().write(hole, &[Var::Span(span(1, 100, 200))]);
    fx.emitter().read(left, &[Var::Span(span(1, 0, 50))]);
    fx.emitter().read(right, &[Var::Span(span(1, 250, 300))]);

    let host_var = fx.footprint.get(host).writes()[0];
    assert_eq!(fx.footprint.get(left).reads(), &[host_var]);
    assert_eq!(fx.footprint.get(right).reads(), &[host_var]);
}

#[test]
fn forward_labels_remember_their_readers() {
    let mut fx = Fixture::new();
    let begin = fx.behavior(0);
    let end = fx.behavior(1);
    let label = fx.table.new_forward_label();

    fx.emitter().write(begin, &[Var::Id(label)]);
    fx.emitter().read(end, &[Var::Id(label)]);

    assert_eq!(fx.table.readers(label), &[end]);
    assert_eq!(fx.table.def(label), Some(begin));
}

#[test]
fn modify_reads_then_writes() {
    let mut fx = Fixture::new();
    let writer = fx.behavior(0);
    let modifier = fx.behavior(1);

    fx.emitter().write(writer, &[Var::Span(span(1, 0, 100))]);
    fx.emitter().modify(modifier, &[Var::Span(span(1, 0, 100))]);

    let original = fx.footprint.get(writer).writes()[0];
    let behavior = fx.footprint.get(modifier);
    assert_eq!(behavior.reads(), &[original]);
    assert_eq!(behavior.writes().len(), 1);
    assert_ne!(behavior.writes()[0], original);
}
