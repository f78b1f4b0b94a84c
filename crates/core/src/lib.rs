//! # Clinic Core
//!
//! Core business logic for the clinic front end over an OpenMRS EMR.
//!
//! This crate contains everything the clinic does that is not presentation:
//! - Calls to the OpenMRS REST and FHIR APIs through one [`EmrClient`]
//! - The lab workflow, including matching observations to orders
//! - Pharmacy, stock management, patient search and session actions
//! - List operations (pagination, filtering) and CSV export
//!
//! **No API concerns**: HTTP servers and CLIs belong in `api-rest` and `clinic-cli`. They resolve
//! an [`EmrConfig`] at startup, build [`ClinicServices`], and wrap each call in an
//! [`ActionResult`].

pub mod action;
pub mod auth;
pub mod client;
pub mod config;
pub mod constants;
pub mod error;
pub mod export;
pub mod lab;
pub mod listing;
pub mod patients;
pub mod pharmacy;
pub mod session;
pub mod stock;

pub use action::ActionResult;
pub use auth::{auth_from_config, AuthProvider, BasicAuth, NoAuth, SessionCookie};
pub use client::EmrClient;
pub use config::EmrConfig;
pub use error::{ClinicError, ClinicResult, ErrorKind};
pub use lab::LabService;
pub use listing::{filter_text, paginate, Page};
pub use patients::PatientDirectory;
pub use pharmacy::PharmacyService;
pub use session::SessionService;
pub use stock::StockService;

pub use clinic_types::{EmrUuid, NonEmptyText};

use std::sync::Arc;

/// All clinic services over one EMR client.
#[derive(Clone, Debug)]
pub struct ClinicServices {
    pub lab: LabService,
    pub pharmacy: PharmacyService,
    pub stock: StockService,
    pub patients: PatientDirectory,
    pub session: SessionService,
}

impl ClinicServices {
    pub fn new(client: EmrClient) -> Self {
        Self {
            lab: LabService::new(client.clone()),
            pharmacy: PharmacyService::new(client.clone()),
            stock: StockService::new(client.clone()),
            patients: PatientDirectory::new(client.clone()),
            session: SessionService::new(client),
        }
    }

    /// Build the services from configuration, authenticating as configured.
    ///
    /// # Errors
    ///
    /// Returns [`ClinicError::Http`] if the HTTP client cannot be built.
    pub fn from_config(config: EmrConfig) -> ClinicResult<Self> {
        Ok(Self::new(EmrClient::new(Arc::new(config))?))
    }
}
