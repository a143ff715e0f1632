//! classweave-lib: orchestration core for build-time bytecode transforms
//!
//! This crate takes the compiled output of a build step (class directories and
//! jar archives) and runs an ordered chain of pluggable transformers over it:
//! - `transform`: the `Transformer` contract, the ordered registry and the chain fold
//! - `input`: directory and jar units with their incremental change status
//! - `output`: destination allocation (`OutputProvider`) keyed by unit identity and format
//! - `execute`: full and incremental executors running on a shared worker pool
//! - `artifact`: symbolic artifact-type lookup for transformers
//! - `context`: the per-invocation `TransformContext` handed to every transformer
//! - `invocation`: the `Pre -> Transform -> Post` driver
//! - `manifest`: a JSON host description used to build invocations outside a host build system

pub mod archive;
pub mod artifact;
pub mod context;
pub mod execute;
pub mod input;
pub mod invocation;
pub mod manifest;
pub mod output;
pub mod transform;
pub mod util;
