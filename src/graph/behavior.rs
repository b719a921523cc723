//! Behaviors and the footprint, the ordered behavior arena.

use std::fmt::{Display, Formatter};

use crate::graph::variable::VariableId;

/// Position of a command in the trace, assigned by the collaborator.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommandId(pub u64);

impl Display for CommandId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "cmd{}", self.0)
    }
}

/// Identifies one concrete invocation of a recorded command-buffer command
/// within a queue submission.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub struct SubcommandRef {
    /// Batch index within the `vkQueueSubmit` call.
    pub submit_index: usize,
    /// Command buffer index within the batch.
    pub command_buffer: usize,
    /// Recorded command index within the command buffer.
    pub command: usize,
    /// For commands inside a secondary command buffer executed via
    /// `vkCmdExecuteCommands`: `(secondary buffer index, command index)`.
    pub secondary: Option<(usize, usize)>,
}

impl Display for SubcommandRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.secondary {
            None => write!(
                f,
                "[{}.{}.{}]",
                self.submit_index, self.command_buffer, self.command
            ),
            Some((buffer, command)) => write!(
                f,
                "[{}.{}.{}/{}.{}]",
                self.submit_index, self.command_buffer, self.command, buffer, command
            ),
        }
    }
}

/// The command a behavior belongs to: a trace position plus, for deferred
/// command-buffer commands, the subcommand that was rolled out.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct BehaviorOwner {
    /// Trace position of the owning command (for deferred commands, the
    /// `vkQueueSubmit` that executed them).
    pub command: CommandId,
    /// Subcommand reference for behaviors stamped during rollout.
    pub sub: Option<SubcommandRef>,
}

impl BehaviorOwner {
    /// Owner for a behavior stamped directly while dispatching a command.
    pub fn direct(command: CommandId) -> Self {
        BehaviorOwner {
            command,
            sub: None,
        }
    }

    /// Owner for a behavior stamped while rolling out a submitted command.
    pub fn submitted(command: CommandId, sub: SubcommandRef) -> Self {
        BehaviorOwner {
            command,
            sub: Some(sub),
        }
    }
}

/// Stable index of a behavior inside a [`Footprint`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BehaviorIndex(pub(crate) u32);

/// A node in the footprint: the read and write sets of one executed command
/// (or subcommand) over abstract state variables.
#[derive(Debug, Clone)]
pub struct Behavior {
    owner: BehaviorOwner,
    reads: Vec<VariableId>,
    writes: Vec<VariableId>,
    alive: bool,
    aborted: bool,
}

impl Behavior {
    fn new(owner: BehaviorOwner) -> Self {
        Behavior {
            owner,
            reads: Vec::new(),
            writes: Vec::new(),
            alive: false,
            aborted: false,
        }
    }

    /// The command this behavior belongs to.
    pub fn owner(&self) -> &BehaviorOwner {
        &self.owner
    }

    /// Variables read, in stamping order, deduplicated.
    pub fn reads(&self) -> &[VariableId] {
        &self.reads
    }

    /// Variables written, in stamping order, deduplicated.
    pub fn writes(&self) -> &[VariableId] {
        &self.writes
    }

    /// Whether this behavior must survive pruning regardless of downstream
    /// use.
    pub fn alive(&self) -> bool {
        self.alive
    }

    /// Whether the upstream mutation for this command failed.
    pub fn aborted(&self) -> bool {
        self.aborted
    }

    /// Whether this behavior reads `var`.
    pub fn reads_var(&self, var: VariableId) -> bool {
        self.reads.contains(&var)
    }

    /// Whether this behavior writes `var`.
    pub fn writes_var(&self, var: VariableId) -> bool {
        self.writes.contains(&var)
    }

    pub(crate) fn record_read(&mut self, var: VariableId) {
        if !self.reads.contains(&var) {
            self.reads.push(var);
        }
    }

    pub(crate) fn record_write(&mut self, var: VariableId) {
        if !self.writes.contains(&var) {
            self.writes.push(var);
        }
    }

    pub(crate) fn set_alive(&mut self) {
        self.alive = true;
    }

    pub(crate) fn set_aborted(&mut self) {
        self.aborted = true;
    }
}

/// The ordered sequence of behaviors built for one trace.
#[derive(Debug, Default)]
pub struct Footprint {
    behaviors: Vec<Behavior>,
}

impl Footprint {
    /// Create an empty footprint.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fresh, empty behavior and return its index.
    pub fn add_behavior(&mut self, owner: BehaviorOwner) -> BehaviorIndex {
        let index = BehaviorIndex(self.behaviors.len() as u32);
        self.behaviors.push(Behavior::new(owner));
        index
    }

    /// Borrow a behavior.
    pub fn get(&self, index: BehaviorIndex) -> &Behavior {
        &self.behaviors[index.0 as usize]
    }

    pub(crate) fn get_mut(&mut self, index: BehaviorIndex) -> &mut Behavior {
        &mut self.behaviors[index.0 as usize]
    }

    /// Mark a behavior as "keep regardless" for the pruner.
    pub fn keep_alive(&mut self, index: BehaviorIndex) {
        self.behaviors[index.0 as usize].set_alive();
    }

    /// All behaviors, in stream order.
    pub fn behaviors(&self) -> &[Behavior] {
        &self.behaviors
    }

    /// Behaviors owned by a given trace command, in stamping order.
    pub fn of_command(&self, command: CommandId) -> impl Iterator<Item = &Behavior> + '_ {
        self.behaviors
            .iter()
            .filter(move |b| b.owner.command == command)
    }

    /// Number of behaviors.
    pub fn len(&self) -> usize {
        self.behaviors.len()
    }

    /// Whether the footprint is empty.
    pub fn is_empty(&self) -> bool {
        self.behaviors.is_empty()
    }
}
