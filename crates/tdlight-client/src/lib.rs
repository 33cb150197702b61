//! tdlight-client - Typed HTTP client for the TD-light portal backend.
//!
//! One method per backend endpoint, grouped by service under [`api`].
//! Progress streams are returned as [`EventStream`]s that decode the
//! backend's server-sent events into [`ProgressEvent`]s.
//!
//! ```rust,no_run
//! use tdlight_client::{ConeQuery, PortalClient};
//!
//! # async fn run() -> tdlight_common::Result<()> {
//! let client = PortalClient::from_base_url("http://127.0.0.1:5001")?;
//! let objects = client.cone_search(&ConeQuery::new(10.5, -5.25, 0.2)).await?;
//! println!("{} objects", objects.len());
//! # Ok(())
//! # }
//! ```
//!
//! [`ProgressEvent`]: tdlight_common::ProgressEvent

pub mod api;
pub mod client;
pub mod sse;
pub mod wire;

pub use api::classify::new_task_id;
pub use client::PortalClient;
pub use sse::{EventStream, SseDecoder};
pub use wire::{
    Ack, AutoClassifyRequest, Candidates, ClassifyStarted, ClassifyTarget, ConeQuery, DatabaseList,
    ImportKind, ImportRequest, LightCurveResponse, RegionQuery,
};
