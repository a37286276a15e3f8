pub mod data_source;
pub mod debounce;
pub mod loader;
pub mod worker;

pub use data_source::{DataSource, DataSourceError, FullDataset, HttpDataSource};
pub use debounce::SelectionDebouncer;
pub use loader::{DataLoader, LoadSnapshot, LoadState};
pub use worker::{DataWorker, WorkerHandle, WorkerRequest, WorkerResponse};
