//! Re-exports most commonly used types in the library

pub use ash::vk;

pub use crate::binding::{BackingData, BindingList, ResBinding};
pub use crate::builder::FootprintBuilder;
pub use crate::core::error::Error;
pub use crate::exec::{BoundDescriptorSet, QueueExecutionState, SubmitInfo};
pub use crate::graph::behavior::{
    Behavior, BehaviorIndex, BehaviorOwner, CommandId, Footprint, SubcommandRef,
};
pub use crate::graph::emitter::Emitter;
pub use crate::graph::variable::{MemorySpan, Var, VariableId, VariableKind, VariableTable};
pub use crate::graph::viz::GraphViz;
pub use crate::record::RecordedCommand;
pub use crate::trace::command::*;
pub use crate::trace::snapshot::*;
pub use crate::util::byte_size::ByteSize;
