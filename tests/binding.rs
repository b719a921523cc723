//! Interval-list semantics of the memory binding engine.

use ash::vk::Handle;
use vk_footprint::prelude::*;

fn memory(raw: u64) -> vk::DeviceMemory {
    vk::DeviceMemory::from_raw(raw)
}

fn span_of(binding: &ResBinding) -> MemorySpan {
    match binding.data {
        BackingData::Span(span) => span,
        BackingData::Label(_) => panic!("expected span backing"),
    }
}

#[test]
fn add_keeps_sorted_non_overlapping() {
    let mut list = BindingList::new();
    list.add(ResBinding::opaque(100, 50, memory(1), 0));
    list.add(ResBinding::opaque(0, 50, memory(2), 0));
    list.add(ResBinding::opaque(200, 50, memory(3), 0));

    let offsets: Vec<u64> = list.bindings().iter().map(|b| b.offset).collect();
    assert_eq!(offsets, vec![0, 100, 200]);
    for pair in list.bindings().windows(2) {
        assert!(pair[0].end() <= pair[1].offset);
    }
}

#[test]
fn rebinding_overwrites_the_overlap() {
    let mut list = BindingList::new();
    list.add(ResBinding::opaque(0, 100, memory(1), 0));
    // Overlaps the tail half of the first binding.
    list.add(ResBinding::opaque(50, 100, memory(2), 0));

    assert_eq!(list.bindings().len(), 2);
    let first = &list.bindings()[0];
    assert_eq!((first.offset, first.size), (0, 50));
    assert_eq!(span_of(first).memory, memory(1));
    // The surviving left half still maps to the original memory range.
    assert_eq!((span_of(first).start, span_of(first).end), (0, 50));

    let second = &list.bindings()[1];
    assert_eq!((second.offset, second.size), (50, 100));
    assert_eq!(span_of(second).memory, memory(2));
}

#[test]
fn rebinding_inside_splits_the_host() {
    let mut list = BindingList::new();
    list.add(ResBinding::opaque(0, 300, memory(1), 1000));
    list.add(ResBinding::opaque(100, 100, memory(2), 0));

    let offsets: Vec<(u64, u64)> = list.bindings().iter().map(|b| (b.offset, b.size)).collect();
    assert_eq!(offsets, vec![(0, 100), (100, 100), (200, 100)]);
    // Both remainders keep their original memory placement.
    assert_eq!(span_of(&list.bindings()[0]).start, 1000);
    assert_eq!(span_of(&list.bindings()[2]).start, 1200);
}

#[test]
fn sub_list_clips_boundary_bindings() {
    let mut list = BindingList::new();
    list.add(ResBinding::opaque(0, 4096, memory(1), 0));

    let sub = list.sub_list(100, 200);
    assert_eq!(sub.len(), 1);
    assert_eq!((sub[0].offset, sub[0].size), (100, 200));
    assert_eq!((span_of(&sub[0]).start, span_of(&sub[0]).end), (100, 300));
}

#[test]
fn whole_size_reaches_the_end() {
    let mut list = BindingList::new();
    list.add(ResBinding::opaque(0, 100, memory(1), 0));
    list.add(ResBinding::opaque(100, 100, memory(2), 0));

    let sub = list.sub_list(64, vk::WHOLE_SIZE);
    assert_eq!(sub.len(), 2);
    assert_eq!(sub[0].offset, 64);
    assert_eq!(sub[1].end(), 200);
}

#[test]
fn overflowing_size_is_clamped() {
    let mut list = BindingList::new();
    list.add(ResBinding::opaque(0, 100, memory(1), 0));

    let sub = list.sub_list(10, u64::MAX - 5);
    assert_eq!(sub.len(), 1);
    assert_eq!((sub[0].offset, sub[0].end()), (10, 100));
}

#[test]
fn label_backed_bindings_are_returned_whole_or_dropped() {
    let mut table = VariableTable::new();
    let label = table.new_label();
    let mut list = BindingList::new();
    list.add(ResBinding::labeled(0, 100, label));

    // Whole request: returned as-is.
    let whole = list.sub_list(0, 100);
    assert_eq!(whole.len(), 1);
    assert!(matches!(whole[0].data, BackingData::Label(_)));

    // Partial request: not resizable, dropped.
    assert!(list.sub_list(10, 20).is_empty());
}

#[test]
fn bound_data_flattens_backing_vars() {
    let mut list = BindingList::new();
    list.add(ResBinding::opaque(0, 100, memory(1), 0));
    list.add(ResBinding::opaque(100, 100, memory(2), 500));

    let data = list.bound_data(50, 100);
    assert_eq!(data.len(), 2);
    match data[0] {
        Var::Span(span) => assert_eq!((span.memory, span.start, span.end), (memory(1), 50, 100)),
        _ => panic!("expected span"),
    }
    match data[1] {
        Var::Span(span) => assert_eq!((span.memory, span.start, span.end), (memory(2), 500, 550)),
        _ => panic!("expected span"),
    }
}
