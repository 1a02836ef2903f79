//! Request construction, the HTTP transport and the rate dispatcher.
mod client;
mod dispatcher;
mod request;
mod transport;


pub use client::HttpTransport;
pub use dispatcher::{DispatchStats, Dispatcher, DrainReport, InFlight, TickPlan};
pub use request::PreparedRequest;
pub use transport::Transport;
