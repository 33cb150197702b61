//! tdlight-portal - Session controller for the TD-light light-curve portal.
//!
//! A [`Portal`] owns one [`AppState`] and one [`PortalClient`]. Every user
//! action is a `&mut self` method that talks to the backend, updates the
//! state only on success, and reports the outcome as a [`Notice`].
//!
//! [`PortalClient`]: tdlight_client::PortalClient

pub mod channel;
pub mod display;
pub mod export;
pub mod form;
pub mod jobs;
pub mod notice;
pub mod portal;
pub mod search;
pub mod selection;
pub mod skymap;
pub mod state;

pub use channel::{ChannelSet, ProgressChannel};
pub use jobs::JobUpdate;
pub use notice::{Notice, NoticeKind, NoticeLevel};
pub use portal::Portal;
pub use search::SearchMode;
pub use selection::{Selection, SelectionEntry};
pub use state::AppState;
