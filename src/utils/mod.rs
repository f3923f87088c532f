mod progress;

pub use progress::FetchProgress;
