pub use super::categories::Entity as Categories;
pub use super::channels::Entity as Channels;
pub use super::epg_programs::Entity as EpgPrograms;
pub use super::playlists::Entity as Playlists;
pub use super::vod_titles::Entity as VodTitles;
pub use super::watch_progress::Entity as WatchProgress;
