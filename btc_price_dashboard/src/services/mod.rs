pub mod controller;
pub mod feed;
pub mod mock;
pub mod proxy;
pub mod push;
pub mod runner;
pub mod source;
pub mod upstream;

pub use controller::RefreshController;
pub use feed::PriceFeed;
pub use mock::MockGenerator;
pub use proxy::{DataSource, ProxyResponse, ProxyService};
pub use push::{parse_frame, speaks_socket_io, PushFrame, PushSource};
pub use runner::{DashboardRunner, RunnerHandle};
pub use source::{PollSource, RefreshEvent, UpdateSource};
pub use upstream::UpstreamClient;
