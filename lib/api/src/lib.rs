//! # scanmatch API
//!
//! The surfaces around the lookup engine:
//!
//! - [`ScanSession`] - reads raw codes from a scanner and hands them out one at a time
//! - [`Presenter`] / [`TerminalPresenter`] - render a lookup outcome
//! - [`RestApi`] - HTTP lookup endpoint

pub mod presenter;
pub mod rest;
pub mod session;

pub use presenter::{Presenter, Status, StatusLevel, TerminalPresenter};
pub use rest::{ApiState, RestApi};
pub use session::{
    ScanConfig, ScanError, ScanEvent, ScanFilter, ScanSession, SensorSource, Symbology,
};
