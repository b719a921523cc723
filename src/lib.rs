//! Dependency-graph (footprint) builder for Vulkan command traces.
//!
//! Given a recorded, replayable sequence of Vulkan API calls, this library
//! builds a *footprint*: an ordered sequence of [`Behavior`](crate::Behavior)
//! nodes, one per executed command, each carrying the sets of abstract state
//! variables the command reads and writes. The def-use relationships between
//! those behaviors form a dependency graph that a downstream dead-code
//! elimination pass can walk to prune commands that do not contribute to a
//! chosen observation point (typically the framebuffer of a draw call).
//!
//! The library does not parse trace files and does not talk to a GPU. A
//! *collaborator*, the trace replayer, feeds commands one at a time through
//! [`FootprintBuilder::build_command`](crate::FootprintBuilder::build_command),
//! exposing its live Vulkan state snapshot through the
//! [`StateSnapshot`](crate::StateSnapshot) trait:
//!
//! ```no_run
//! use vk_footprint::prelude::*;
//! # fn replay(ctx: &mut dyn TraceContext, commands: Vec<Command>) {
//! let mut builder = FootprintBuilder::new();
//! for (index, command) in commands.iter().enumerate() {
//!     builder.build_command(ctx, CommandId(index as u64), command);
//! }
//! let footprint = builder.into_footprint();
//! println!("{} behaviors", footprint.len());
//! # }
//! ```
//!
//! The builder is best-effort by design: mutation failures, unknown handles
//! and unrecognized commands are logged and recovered, never propagated. A
//! command the builder does not understand is marked
//! [`alive`](crate::Behavior::alive) so the pruner keeps it.
//!
//! Module overview:
//! - [`graph`]: the footprint data model with abstract variables, behaviors and
//!   the read/write/modify emitter.
//! - [`binding`]: resource-to-memory binding interval lists.
//! - [`state`]: per-handle shadow state tracked across the stream.
//! - [`record`]: deferred command-buffer commands evaluated at submit time.
//! - [`exec`]: queue execution state and submit bookkeeping.
//! - [`trace`]: the collaborator-facing command and snapshot types.
//! - [`builder`]: the per-command dispatcher tying it all together.

#[macro_use]
extern crate derivative;
#[macro_use]
extern crate log;

pub mod prelude;
pub use crate::prelude::*;

pub mod binding;
pub mod builder;
pub mod core;
pub mod exec;
pub mod graph;
pub mod record;
pub mod state;
pub mod trace;
pub mod util;
