//! Abstract state variables, the unit of dependency tracking.
//!
//! Every behavior reads and writes a set of these. Variables are
//! arena-allocated in a [`VariableTable`] and referred to by stable
//! [`VariableId`] indices; the "defining behavior" back-reference the pruner
//! needs is a plain index into the footprint, never an owning pointer.

use std::collections::HashMap;

use ash::vk;
use ash::vk::Handle;

use crate::graph::behavior::BehaviorIndex;

/// Stable index of an abstract variable inside a [`VariableTable`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VariableId(pub(crate) u32);

/// A half-open interval `[start, end)` of a Vulkan device memory object, the
/// unit of memory-level dependency.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct MemorySpan {
    /// Device memory this span lives in.
    pub memory: vk::DeviceMemory,
    /// First byte covered.
    pub start: u64,
    /// One past the last byte covered.
    pub end: u64,
}

impl MemorySpan {
    /// Create a span from an offset and size, saturating on overflow.
    pub fn new(memory: vk::DeviceMemory, offset: u64, size: u64) -> Self {
        MemorySpan {
            memory,
            start: offset,
            end: offset.saturating_add(size),
        }
    }

    /// Whether the span covers zero bytes.
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Intersection with another range in the same memory, if any.
    pub fn intersect(&self, start: u64, end: u64) -> Option<MemorySpan> {
        let s = self.start.max(start);
        let e = self.end.min(end);
        (s < e).then_some(MemorySpan {
            memory: self.memory,
            start: s,
            end: e,
        })
    }
}

/// What a variable stands for. Identity always lives in the [`VariableId`];
/// the kind exists for debug printing and for the two kinds with extra
/// semantics (forward-paired labels and memory spans).
#[derive(Debug, Clone)]
pub enum VariableKind {
    /// A unique 64-bit Vulkan object handle. The zero handle is "null" and
    /// reads/writes on it are silently dropped before reaching the table.
    Handle(u64),
    /// An opaque, monotonically numbered token for stateful events.
    Label,
    /// A label that records each reader so its defining writer can later
    /// link begin/end pairs.
    ForwardLabel,
    /// One entry of the recorded-span list of a device memory object.
    Span(MemorySpan),
    /// The per-slot contents of one descriptor-set entry.
    Descriptor,
    /// A descriptor set plus its dynamic offsets, captured at bind time.
    BoundDescriptorSet,
    /// One block-sized backing span of a sparsely bound image subresource.
    SparseBinding,
}

/// A variable reference as it appears at an emitter call site. Handles and
/// memory spans are resolved against the table when the edge is stamped;
/// everything else is already an allocated table entry.
#[derive(Debug, Copy, Clone)]
pub enum Var {
    /// Raw Vulkan handle value; zero is dropped.
    Handle(u64),
    /// A memory range, resolved against the recorded-span list.
    Span(MemorySpan),
    /// An already-allocated variable.
    Id(VariableId),
}

impl Var {
    /// Reference any Vulkan handle type as a variable.
    pub fn handle<T: Handle>(handle: T) -> Var {
        Var::Handle(handle.as_raw())
    }
}

impl From<VariableId> for Var {
    fn from(value: VariableId) -> Self {
        Var::Id(value)
    }
}

impl From<MemorySpan> for Var {
    fn from(value: MemorySpan) -> Self {
        Var::Span(value)
    }
}

struct VariableEntry {
    kind: VariableKind,
    def: Option<BehaviorIndex>,
    /// Reader list, populated only for `ForwardLabel` entries.
    readers: Vec<BehaviorIndex>,
}

#[derive(Debug, Copy, Clone)]
struct SpanEntry {
    start: u64,
    end: u64,
    var: VariableId,
}

/// Arena of abstract variables plus the two lookup structures layered on
/// top: handle interning and the per-memory recorded-span lists.
#[derive(Default)]
pub struct VariableTable {
    entries: Vec<VariableEntry>,
    handles: HashMap<u64, VariableId>,
    /// Sorted, non-overlapping recorded spans per device memory.
    spans: HashMap<vk::DeviceMemory, Vec<SpanEntry>>,
}

impl VariableTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    fn alloc(&mut self, kind: VariableKind) -> VariableId {
        let id = VariableId(self.entries.len() as u32);
        #[cfg(feature = "log-variables")]
        trace!("new variable v{}: {:?}", id.0, kind);
        self.entries.push(VariableEntry {
            kind,
            def: None,
            readers: Vec::new(),
        });
        id
    }

    /// Allocate a fresh label.
    pub fn new_label(&mut self) -> VariableId {
        self.alloc(VariableKind::Label)
    }

    /// Allocate a fresh forward-paired label.
    pub fn new_forward_label(&mut self) -> VariableId {
        self.alloc(VariableKind::ForwardLabel)
    }

    /// Allocate a fresh descriptor-slot variable.
    pub fn new_descriptor(&mut self) -> VariableId {
        self.alloc(VariableKind::Descriptor)
    }

    /// Allocate a fresh bound-descriptor-set variable.
    pub fn new_bound_descriptor_set(&mut self) -> VariableId {
        self.alloc(VariableKind::BoundDescriptorSet)
    }

    /// Allocate a fresh sparse-binding variable.
    pub fn new_sparse_binding(&mut self) -> VariableId {
        self.alloc(VariableKind::SparseBinding)
    }

    /// Intern a raw handle. Returns `None` for the null handle.
    pub fn handle(&mut self, raw: u64) -> Option<VariableId> {
        if raw == 0 {
            return None;
        }
        if let Some(&id) = self.handles.get(&raw) {
            return Some(id);
        }
        let id = self.alloc(VariableKind::Handle(raw));
        self.handles.insert(raw, id);
        Some(id)
    }

    /// The kind of a variable.
    pub fn kind(&self, id: VariableId) -> &VariableKind {
        &self.entries[id.0 as usize].kind
    }

    /// The defining behavior of a variable, if it has been written yet.
    pub fn def(&self, id: VariableId) -> Option<BehaviorIndex> {
        self.entries[id.0 as usize].def
    }

    pub(crate) fn set_def(&mut self, id: VariableId, behavior: BehaviorIndex) {
        self.entries[id.0 as usize].def = Some(behavior);
    }

    pub(crate) fn add_reader(&mut self, id: VariableId, behavior: BehaviorIndex) {
        self.entries[id.0 as usize].readers.push(behavior);
    }

    /// Recorded readers of a forward-paired label.
    pub fn readers(&self, id: VariableId) -> &[BehaviorIndex] {
        &self.entries[id.0 as usize].readers
    }

    /// All recorded-span variables overlapping `[span.start, span.end)` in
    /// `span.memory`, in address order. This is the read-resolution step:
    /// a read of a range depends on every existing span it touches.
    pub fn overlapping_spans(&self, span: &MemorySpan) -> Vec<VariableId> {
        let Some(list) = self.spans.get(&span.memory) else {
            return Vec::new();
        };
        list.iter()
            .filter(|e| e.start < span.end && e.end > span.start)
            .map(|e| e.var)
            .collect()
    }

    /// Record a write of `span`: a fresh span variable is allocated covering
    /// exactly the written range and merged into the recorded-span list.
    /// Overlapped portions of existing entries are clipped away; an entry
    /// strictly containing the write is split in two, both halves keeping
    /// their original variable identity.
    pub fn write_span(&mut self, span: &MemorySpan) -> VariableId {
        let var = self.alloc(VariableKind::Span(*span));
        let list = self.spans.entry(span.memory).or_default();
        let mut merged: Vec<SpanEntry> = Vec::with_capacity(list.len() + 1);
        let mut inserted = false;
        for e in list.iter() {
            if e.end <= span.start || e.start >= span.end {
                if !inserted && e.start >= span.end {
                    merged.push(SpanEntry {
                        start: span.start,
                        end: span.end,
                        var,
                    });
                    inserted = true;
                }
                merged.push(*e);
                continue;
            }
            if e.start < span.start {
                merged.push(SpanEntry {
                    start: e.start,
                    end: span.start,
                    var: e.var,
                });
            }
            if !inserted {
                merged.push(SpanEntry {
                    start: span.start,
                    end: span.end,
                    var,
                });
                inserted = true;
            }
            if e.end > span.end {
                merged.push(SpanEntry {
                    start: span.end,
                    end: e.end,
                    var: e.var,
                });
            }
        }
        if !inserted {
            merged.push(SpanEntry {
                start: span.start,
                end: span.end,
                var,
            });
        }
        *list = merged;
        var
    }

    /// Drop all recorded spans of a memory object. Called on `vkFreeMemory`.
    pub fn drop_spans(&mut self, memory: vk::DeviceMemory) {
        self.spans.remove(&memory);
    }

    /// Number of variables allocated so far.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
