pub mod downloader;
pub mod registry;

pub use downloader::{HubFetcher, ModelDownloader, WeightsFetcher};
pub use registry::{ModelEntry, ModelRegistry};
