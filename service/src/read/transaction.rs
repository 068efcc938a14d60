//! [`Transaction`] read model definition.

#[cfg(doc)]
use crate::domain::{transaction::Status, Transaction};

/// Wrapper around [`Transaction`] indicating that its [`Status`] is still
/// [`Status::Open`], so its checkout session may yet collect a payment.
#[derive(Clone, Copy, Debug)]
pub struct Open<T>(pub T);
