//! One contract over several hosted-checkout payment processors.
//!
//! Pick a gateway (directly or through [`config::build_gateway`]), call
//! [`PaymentGateway::create_payment`] to get a checkout URL plus an opaque
//! transaction handle, then poll [`PaymentGateway::check_status`] with that
//! handle.

pub mod config;
pub mod error;
pub mod http;
pub mod psp;

pub use error::{PaymentError, Result};
pub use psp::{
    ExtraOptions, PaymentGateway, PaymentRequest, PaymentResponse, PaymentStatus,
};
