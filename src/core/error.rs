//! Exposes the footprint builder error type.
//!
//! None of these errors are fatal to a build: every one of them is caught
//! inside [`FootprintBuilder::build_command`](crate::FootprintBuilder::build_command),
//! logged, and recovered from. The type exists so internal helpers can report
//! precisely what went wrong and so tests can assert on the failure mode.

use thiserror::Error;

/// Error type for recoverable failures inside the footprint builder.
#[derive(Error, Debug)]
pub enum Error {
    /// A handle was looked up in the shadow state but never created there.
    #[error("Unknown {kind} handle {handle:#x}")]
    UnknownHandle {
        /// Object kind, e.g. `"image"` or `"command buffer"`.
        kind: &'static str,
        /// Raw 64-bit handle value.
        handle: u64,
    },
    /// A sub-binding request exceeded the binding it was clipped against.
    #[error("Sub-binding [{offset}, {offset}+{size}) exceeds binding size {bind_size}")]
    BindingOutOfBounds {
        /// Requested offset relative to the binding start.
        offset: u64,
        /// Requested size.
        size: u64,
        /// Size of the binding being clipped.
        bind_size: u64,
    },
    /// A non-default sub-range was requested from a binding whose backing
    /// data is not a memory span. Label-backed bindings (swapchain images)
    /// can only be returned whole.
    #[error("Binding backed by non-span data cannot be shrunk")]
    BindingNotResizable,
    /// A bound descriptor set contains more dynamic descriptors than dynamic
    /// offsets were supplied at bind time.
    #[error("Descriptor set {set:#x} ran out of dynamic offsets")]
    DynamicOffsetUnderflow {
        /// Raw descriptor set handle.
        set: u64,
    },
    /// The collaborator-reported execution order disagrees with submission
    /// order. Rollout stops for the affected submit.
    #[error("Executed subcommand {observed} does not match pending {expected}")]
    ExecutionOrderDivergence {
        /// Subcommand reference reported by the collaborator.
        observed: String,
        /// Head of the submit's pending queue.
        expected: String,
    },
    /// A command kind the dispatcher has no rule for. The behavior is kept
    /// alive so the pruner never drops what we do not understand.
    #[error("Unhandled command `{0}`")]
    UnhandledCommand(String),
}
