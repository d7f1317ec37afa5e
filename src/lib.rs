//! Gatekeeper for GitHub webhook deliveries.
//!
//! A request only reaches the wrapped handler when it is a well-formed
//! `GitHub-Hookshot` delivery, passes the event/ref/pusher/commit filters of
//! the configured [`Policy`], and carries a valid `X-Hub-Signature`.
//! Uninteresting deliveries are answered with an empty `200`, malformed ones
//! with `400`, and forged ones with `401`.
//!
//! ```no_run
//! use actix_web::{App, HttpServer};
//! use hookgate::{hooks, Gatekeeper, PolicyOptions};
//!
//! #[actix_web::main]
//! async fn main() -> std::io::Result<()> {
//!     let gatekeeper = Gatekeeper::from_options(PolicyOptions {
//!         secret: Some(secstr::SecStr::new(b"SuperSecretSecret".to_vec())),
//!         ..PolicyOptions::default()
//!     })
//!     .expect("valid policy");
//!
//!     HttpServer::new(move || {
//!         App::new().service(gatekeeper.resource("/_my_git_endpoint").to(hooks::push_hook))
//!     })
//!     .bind("127.0.0.1:3000")?
//!     .run()
//!     .await
//! }
//! ```

pub mod config;
pub mod filters;
pub mod gatekeeper;
pub mod github;
pub mod hooks;
pub mod http;
pub mod policy;
pub mod signature;

pub use crate::{
    gatekeeper::{Accepted, Delivery, Gatekeeper, Rejection},
    http::Webhook,
    policy::{Policy, PolicyError, PolicyOptions},
};
