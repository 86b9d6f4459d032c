//! SeaORM repositories for the local catalog store
//!
//! One repository per entity. Batch writers run inside a transaction and bump
//! the store-wide [`crate::database::ChangeNotifier`] after commit, so live
//! query subscribers only ever observe fully committed batches.

pub mod category;
pub mod channel;
pub mod epg_program;
pub mod playlist;
pub mod vod_title;
pub mod watch_progress;

pub use category::CategoryRepository;
pub use channel::ChannelRepository;
pub use epg_program::EpgProgramRepository;
pub use playlist::PlaylistRepository;
pub use vod_title::VodTitleRepository;
pub use watch_progress::WatchProgressRepository;

/// Rows per INSERT statement; keeps bound-variable counts below SQLite limits.
pub(crate) const INSERT_BATCH_SIZE: usize = 500;
