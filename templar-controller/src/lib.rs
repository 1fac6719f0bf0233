//! # templar-controller
//!
//! Controller access for the template mirror: the [`Controller`] capability
//! trait, one HTTP adapter per API flavor, the bounded task poller and the
//! bulk exporter.
//!
//! Call [`connect`] to log in with resolved [`Settings`], then hand the
//! returned controller to [`export_all`] or to the restore pipeline.

pub mod api;
pub mod catalyst;
pub mod dnac;
pub mod error;
pub mod exporter;
pub mod http;
#[cfg(any(test, feature = "testing"))]
pub mod memory;
pub mod poller;
mod wire;

use templar_core::{ApiFlavor, Settings};

pub use api::Controller;
pub use catalyst::CatalystController;
pub use dnac::DnacController;
pub use error::ControllerError;
pub use exporter::{collect_template_ids, export_all, Export};
pub use http::Session;
pub use poller::{poll_task, PollOutcome, RetryPolicy};

/// Log in to the configured controller and return the matching adapter.
pub fn connect(settings: &Settings) -> Result<Box<dyn Controller>, ControllerError> {
    let session = Session::login(&settings.base_url(), &settings.controller)?;
    Ok(match settings.flavor {
        ApiFlavor::Dnac => Box::new(DnacController::new(session)),
        ApiFlavor::Catalyst => Box::new(CatalystController::new(session)),
    })
}
