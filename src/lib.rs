//! hello-client — client-side glue for the "hello" contact-card app.
//!
//! ARCHITECTURE
//! ============
//! Two independent components, each driven by external events and server
//! data only:
//!
//! - [`form`]: validate and submit the person form (create/edit), meter the
//!   upload and redistribute server validation errors onto a [`form::FormView`].
//! - [`requests`]: poll `/requests_ajax/`, sort by priority and publish a
//!   rendered [`requests::TableSnapshot`] on a watch channel.
//!
//! Both are built from an immutable [`config::ClientConfig`] and an injected
//! [`csrf::RequestConfig`]; nothing is read from ambient global state.

pub mod config;
pub mod csrf;
pub mod error;
pub mod form;
pub mod requests;
