mod browse;

pub use browse::{BrowseController, BrowseView, LoadTicket};
