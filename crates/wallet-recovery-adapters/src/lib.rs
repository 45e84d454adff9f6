pub mod clock;
pub mod config;
pub mod eip1193;
pub mod entropy;
pub mod manager;
pub mod stores;

pub use clock::SystemClockAdapter;
pub use config::{RecoveryAdapterConfig, RuntimeProfile};
pub use eip1193::Eip1193Adapter;
pub use entropy::OsEntropyAdapter;
pub use manager::InMemoryManagerAdapter;
pub use stores::{InMemoryCollectibleStore, InMemoryTokenStore};
