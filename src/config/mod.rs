mod settings;

pub use settings::{AutoSaveTrigger, Settings, SortOrder, keys};
