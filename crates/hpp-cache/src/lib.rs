//! # HPP Cache
//!
//! 主資料快取：原料與配方的記憶體快照，整體重建、原子替換

pub mod dirty_tracking;
pub mod master_data;

// Re-export 主要類型
pub use dirty_tracking::DirtyTracker;
pub use master_data::{CachedEntity, MasterData, MasterDataCache};
