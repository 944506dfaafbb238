//! Live-refreshing requests table.

pub mod poller;
pub mod render;
pub mod types;

pub use poller::{PollHandle, RequestPoller};
pub use render::{DisplayMode, RenderedRow, RowActions, RowStyle, TableSnapshot, render, sort, update_title};
pub use types::{PollError, RequestList, RequestRecord, parse_poll_body};
