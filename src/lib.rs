pub mod api;
pub mod batch;
pub mod config;
pub mod metrics;
pub mod retry;
pub mod select;
pub mod snapshot;
pub mod transport;

pub use api::{Client, FetchError, Observation, PriceSeries};
pub use batch::run_batch;
pub use config::Config;
pub use metrics::{Metrics, Outcome};
pub use retry::RetryPolicy;
pub use select::select_price;
pub use snapshot::{Snapshot, SnapshotError};
pub use transport::{DirectTransport, Dispatch, RotatingTransport, Route, Transport};

/// The identifier of a tradable item on the auction house.
pub type ItemId = u64;
