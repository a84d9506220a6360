//! Runtime for compiled rasc scripts.
//!
//! A [`CompiledScript`](rasc_lower::CompiledScript) is immutable and shared
//! behind an `Arc`; every [`Runtime`] created from it owns its own images,
//! world and variable state, so runtimes can run concurrently. The
//! [`Executor`] runs them on a worker pool.

mod error;
mod executor;
mod image;
mod progress;
mod runtime;
mod transform;
mod world;

pub use error::{RuntimeError, RuntimeResult};
pub use executor::{Executor, ExecutorError, ExecutorEvent, JobId};
pub use image::{Image, RasterImage, WritableImage};
pub use progress::{NullProgressListener, ProgressListener, ProgressPolicy};
pub use runtime::{Runtime, RuntimeState};
pub use transform::{AffineTransform, CoordinateTransform};
pub use world::{World, WorldBounds};

#[cfg(test)]
mod test_helpers;
