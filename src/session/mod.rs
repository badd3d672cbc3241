//! Session lifecycle: capture, bounded storage, closed-tab recovery,
//! and restoration.

mod capture;
mod closed;
mod record;
mod restore;
mod store;

pub(crate) use record::lenient_id;

pub use capture::{CaptureScope, CaptureService};
pub use closed::{ClosedTabRecorder, RecoveredTab, RecoverySource};
pub use record::{GroupSnapshot, SessionKind, SessionRecord, TabSnapshot};
pub use restore::{RestoreReport, RestoreService};
pub use store::SessionStore;
