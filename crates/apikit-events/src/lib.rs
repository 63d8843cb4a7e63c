//! Typed in-process event emitter
//!
//! ```rust,ignore
//! #[derive(Debug, Clone, PartialEq, Eq, Hash)]
//! enum Event { Saved, Deleted }
//!
//! let emitter = EventEmitter::<Event, Document>::new();
//! emitter.on(Event::Saved, |doc: &Document| println!("saved {}", doc.id));
//! let report = emitter.emit(&Event::Saved, &doc);
//! assert!(report.is_clean());
//! ```

pub mod emitter;
pub mod error;

pub use emitter::{EmitReport, EventEmitter, ListenerFailure, ListenerId, ListenerOutcome};
pub use error::{BoxError, ListenerError};
