//! # Stencil Maker
//!
//! Client for the stencil-maker rendering service. Pick a photo, say how
//! big the print should be (centimeters or feet and inches, with optional
//! white margins), choose a filter and orientation, and the service returns
//! either a gridded preview image or a multi-page PDF stencil cut to that
//! physical size.
//!
//! All pixel and PDF work happens on the server. This crate covers what the
//! client is responsible for:
//!
//! ```text
//! form state ─► normalize to cm ─► multipart request ─► POST ─► bytes
//!                                                              │
//!                       preview: data URI + aspect ratio ◄─────┤
//!    download: resolve dir ─► write stencil_<ms>.pdf ─► share ◄┘
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`units`] | feet/inches/centimeters → canonical centimeters |
//! | [`form`] | Form state, both unit representations per axis, edit reducer |
//! | [`request`] | Snapshot of form + image into a [`request::GenerationRequest`] |
//! | [`transport`] | [`transport::Transport`] trait and the reqwest multipart implementation |
//! | [`pipeline`] | Preview and Download pipelines, their stages and errors |
//! | [`storage`] | Ordered directory probes for saving PDFs |
//! | [`persist`] | Base64 file write primitive and file naming |
//! | [`share`] | Share facility the saved PDF is handed to |
//! | [`rotator`] | Rotating loading messages, one timer per busy pipeline |
//! | [`session`] | The single interface state store and its reducer |
//! | [`client`] | Wiring of pipelines to real or mock collaborators |
//! | [`config`] | `stencil-maker.toml` loading, merging and validation |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Headless state, explicit reducer
//!
//! Interface state lives in one [`session::Session`] and changes only
//! through [`session::Session::update`]. Pipelines are plain async
//! functions that take a request snapshot and return a result; they never
//! see the session. A preview and a download can therefore run side by side
//! on one thread, and every path is testable without a UI.
//!
//! ## Collaborators behind traits
//!
//! The network, the file write and the share facility are traits
//! ([`transport::Transport`], [`persist::FileWriter`],
//! [`share::ShareFacility`]). Production wiring is in
//! [`client::StencilClient::from_config`]; tests use recording mocks.
//!
//! ## Platform differences at composition time
//!
//! Where a PDF may be written differs per platform. Instead of branching
//! inside the pipeline, [`storage::StorageResolver::for_platform`] builds an
//! ordered probe list once, and the pipeline just asks the resolver.
//!
//! ## No retries, no timeouts
//!
//! A failed request is reported and the trigger re-enabled. A request that
//! never answers keeps its pipeline busy; there is no cancel.

pub mod client;
pub mod config;
pub mod form;
pub mod output;
pub mod persist;
pub mod pipeline;
pub mod request;
pub mod rotator;
pub mod session;
pub mod share;
pub mod storage;
pub mod transport;
pub mod units;

#[cfg(test)]
pub(crate) mod test_helpers;
