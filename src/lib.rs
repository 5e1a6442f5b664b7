//! # volume-proxy
//!
//! `volume-proxy` exposes a volume management REST API as a Docker volume
//! plugin. It listens on a Unix domain socket, speaks the plugin's
//! JSON-over-HTTP protocol, and forwards each call to the backend.
//!
//! Docker volume names take the form `<repository>/<volume>`, mapping onto
//! the backend's repository and volume namespaces.
pub mod backend;
pub mod cmd;
pub mod error;
pub mod logging;
pub mod signal;
pub mod volume;
