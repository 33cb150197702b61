//! Backend services, one module per endpoint group. Each module adds its
//! methods to [`PortalClient`](crate::PortalClient).

pub mod auto_classify;
pub mod classify;
pub mod config;
pub mod databases;
pub mod import;
pub mod lightcurve;
pub mod search;
