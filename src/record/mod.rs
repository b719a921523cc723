//! The command-buffer recorder.
//!
//! A `vkCmd*` command cannot be stamped when it is recorded: its effect
//! depends on the queue's execution state at submit time (active subpass,
//! bound pipeline, dynamic offsets). Each recorded command therefore stores
//! a `behave` closure capturing the record-time inputs; the queue execution
//! engine invokes it during rollout with the live execution context.

use std::sync::Arc;

use ash::vk;

use crate::exec::ExecutionCtx;
use crate::graph::behavior::SubcommandRef;

/// Closure evaluated at submission time for one recorded command.
pub type BehaveFn = Box<dyn Fn(&mut ExecutionCtx<'_>, &SubcommandRef) + Send + Sync>;

/// One deferred command-buffer command.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct RecordedCommand {
    /// Vulkan entry point name, for execution-order divergence logs.
    pub name: String,
    #[derivative(Debug = "ignore")]
    behave: BehaveFn,
    /// Secondary command buffers, non-empty only for `vkCmdExecuteCommands`.
    pub secondaries: Vec<vk::CommandBuffer>,
}

impl RecordedCommand {
    /// A deferred command with no secondary buffers.
    pub fn new(name: impl Into<String>, behave: BehaveFn) -> Arc<Self> {
        Arc::new(RecordedCommand {
            name: name.into(),
            behave,
            secondaries: Vec::new(),
        })
    }

    /// A deferred `vkCmdExecuteCommands` carrying its secondary buffers.
    pub fn with_secondaries(
        name: impl Into<String>,
        secondaries: Vec<vk::CommandBuffer>,
        behave: BehaveFn,
    ) -> Arc<Self> {
        Arc::new(RecordedCommand {
            name: name.into(),
            behave,
            secondaries,
        })
    }

    /// Evaluate the deferred behavior with the live execution context.
    pub fn behave(&self, ctx: &mut ExecutionCtx<'_>, sub: &SubcommandRef) {
        (self.behave)(ctx, sub)
    }
}
