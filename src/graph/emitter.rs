//! The dependency behavior emitter, the central API every dispatcher family
//! goes through to stamp edges into the footprint.
//!
//! Three operations are exposed over a behavior and a list of abstract
//! variables: [`read`](Emitter::read), [`write`](Emitter::write) and
//! [`modify`](Emitter::modify) (read-then-write). The interesting case is
//! memory spans: a read resolves against the recorded-span list of the
//! device memory, a write subdivides it. A write to `[A, C)` followed by a
//! write to `[B, D)` and a read of `[A, D)` must produce two read edges, one
//! to each covering writer, so interval subdivision happens at read time.

use crate::graph::behavior::{BehaviorIndex, Footprint};
use crate::graph::variable::{Var, VariableKind, VariableTable};

/// Stamps read/write/modify edges for one behavior at a time. Cheap to
/// construct; borrow one from the builder or execution context whenever
/// edges need to be recorded.
pub struct Emitter<'a> {
    table: &'a mut VariableTable,
    footprint: &'a mut Footprint,
    debug: bool,
}

impl<'a> Emitter<'a> {
    /// Create an emitter over the given variable table and footprint.
    pub fn new(table: &'a mut VariableTable, footprint: &'a mut Footprint, debug: bool) -> Self {
        Emitter {
            table,
            footprint,
            debug,
        }
    }

    /// Record that `behavior` reads each of `vars`.
    ///
    /// Returns false if any variable was dropped (null handle). Memory span
    /// reads attach to every recorded span overlapping the requested range;
    /// a range no write has touched yet contributes no edge and is not a
    /// failure. Forward-paired labels additionally remember the reader.
    pub fn read(&mut self, behavior: BehaviorIndex, vars: &[Var]) -> bool {
        let mut ok = true;
        for var in vars {
            ok &= self.read_one(behavior, var);
        }
        ok
    }

    /// Record that `behavior` writes each of `vars`.
    ///
    /// Returns false if any variable was dropped (null handle). A memory
    /// span write allocates a fresh span variable covering exactly the
    /// written range and merges it into the recorded-span list.
    pub fn write(&mut self, behavior: BehaviorIndex, vars: &[Var]) -> bool {
        let mut ok = true;
        for var in vars {
            ok &= self.write_one(behavior, var);
        }
        ok
    }

    /// Read-then-write. The write of a variable is skipped when its read
    /// failed.
    pub fn modify(&mut self, behavior: BehaviorIndex, vars: &[Var]) -> bool {
        let mut ok = true;
        for var in vars {
            if self.read_one(behavior, var) {
                ok &= self.write_one(behavior, var);
            } else {
                ok = false;
            }
        }
        ok
    }

    fn read_one(&mut self, behavior: BehaviorIndex, var: &Var) -> bool {
        match *var {
            Var::Handle(raw) => match self.table.handle(raw) {
                Some(id) => {
                    if self.debug {
                        trace!("{:?} reads handle {raw:#x} (v{})", behavior, id.0);
                    }
                    self.footprint.get_mut(behavior).record_read(id);
                    true
                }
                // Null handles never participate in reads or writes.
                None => false,
            },
            Var::Span(span) => {
                if span.is_empty() {
                    return true;
                }
                for id in self.table.overlapping_spans(&span) {
                    if self.debug {
                        trace!("{:?} reads span v{} covering {:?}", behavior, id.0, span);
                    }
                    self.footprint.get_mut(behavior).record_read(id);
                }
                true
            }
            Var::Id(id) => {
                if let VariableKind::ForwardLabel = self.table.kind(id) {
                    self.table.add_reader(id, behavior);
                }
                if self.debug {
                    trace!("{:?} reads v{}", behavior, id.0);
                }
                self.footprint.get_mut(behavior).record_read(id);
                true
            }
        }
    }

    fn write_one(&mut self, behavior: BehaviorIndex, var: &Var) -> bool {
        match *var {
            Var::Handle(raw) => match self.table.handle(raw) {
                Some(id) => {
                    if self.debug {
                        trace!("{:?} writes handle {raw:#x} (v{})", behavior, id.0);
                    }
                    self.footprint.get_mut(behavior).record_write(id);
                    self.table.set_def(id, behavior);
                    true
                }
                None => false,
            },
            Var::Span(span) => {
                if span.is_empty() {
                    return true;
                }
                let id = self.table.write_span(&span);
                if self.debug {
                    trace!("{:?} writes span v{} covering {:?}", behavior, id.0, span);
                }
                self.footprint.get_mut(behavior).record_write(id);
                self.table.set_def(id, behavior);
                true
            }
            Var::Id(id) => {
                if self.debug {
                    trace!("{:?} writes v{}", behavior, id.0);
                }
                self.footprint.get_mut(behavior).record_write(id);
                self.table.set_def(id, behavior);
                true
            }
        }
    }
}
