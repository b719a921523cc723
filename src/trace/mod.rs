//! The collaborator-facing interface.
//!
//! The builder never parses trace files or drives a GPU; the replaying
//! collaborator owns both. It hands the builder one [`Command`](command::Command)
//! at a time together with a [`TraceContext`](snapshot::TraceContext) that
//! exposes the live Vulkan state snapshot, applies the command via `mutate`,
//! and reports the actual execution order of submitted subcommands.

pub mod command;
pub mod snapshot;
