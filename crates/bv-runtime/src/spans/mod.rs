//! Trace span emission
//!
//! Two shapes are offered on [`Tracer`]:
//!
//! - [`Tracer::record_span`] sends one span described by [`SpanOptions`].
//! - [`Tracer::trace`] and [`Tracer::start_span`] time a piece of work and
//!   record it when the work ends, marking it as an error if the work failed.
//!
//! # Example
//!
//! ```rust,no_run
//! use bv_runtime::spans::{SpanOptions, Tracer};
//!
//! let tracer = Tracer::from_env();
//! let total = tracer.trace(SpanOptions::new("sum-invoices").tag("billing"), |_span| {
//!     Ok::<_, anyhow::Error>(41 + 1)
//! })?;
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod emitter;
pub mod options;
pub mod scope;

pub use emitter::Tracer;
pub use options::SpanOptions;
pub use scope::SpanScope;
