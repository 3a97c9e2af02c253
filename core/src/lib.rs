//! Action handlers for the Brick dining assistant.
//!
//! A dialogue manager sends one [`Envelope`] per turn; the [`ActionRegistry`]
//! resolves the requested action and returns a [`Response`] with the reply,
//! a UI payload and slot mutations. Turns no action can answer go to the
//! [`FallbackHandler`].

pub mod action;
pub mod context;
pub mod envelope;
pub mod error;
pub mod fallback;
pub mod format;
pub mod handlers;
pub mod metrics;
pub mod registry;
pub mod response;
pub mod wire;

pub use action::{ActionName, FALLBACK_ACTION};
pub use context::{ActionContext, Clock, FixedClock, SystemClock};
pub use envelope::{Envelope, SlotMap};
pub use error::{DispatchError, ExternalServiceError, RegistryError};
pub use fallback::{CompletionClient, FallbackHandler, FallbackSettings};
pub use handlers::Tables;
pub use metrics::DispatchMetrics;
pub use registry::ActionRegistry;
pub use response::Response;
