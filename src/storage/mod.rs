mod store;

pub use store::{DirectoryStatus, PhotoStore, StorageStats, StoredPhoto};
