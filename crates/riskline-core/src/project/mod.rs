pub mod watcher;
pub mod workspace;

pub use watcher::{Debouncer, FileChangeEvent, FileChangeKind, FileWatcher};
pub use workspace::{resolve_workspace, WorkspaceInfo};
