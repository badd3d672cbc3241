pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod grouping;
pub mod host;
pub mod session;
pub mod storage;

pub use cache::TabRegistry;
pub use config::{AutoSaveTrigger, Settings, SortOrder};
pub use engine::{Engine, Request, Response};
pub use error::EngineError;
pub use grouping::{ColorResolver, Organizer, clean_domain, default_color, full_domain};
pub use host::{
    FaviconColorSource, GroupColor, GroupId, GroupUpdate, HostBrowser, Tab, TabGroup, TabId,
    WindowId, is_privileged_url,
};
pub use session::{
    CaptureScope, CaptureService, ClosedTabRecorder, RestoreReport, RestoreService, SessionKind,
    SessionRecord, SessionStore,
};
pub use storage::{KvStore, MemoryKvStore, SqliteKvStore};
