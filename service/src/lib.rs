//! Service contains the business logic of the application.
//!
//! List of available Cargo features:
#![doc = document_features::document_features!()]
#![deny(
    nonstandard_style,
    rust_2018_idioms,
    rustdoc::all,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code
)]
#![forbid(non_ascii_idents)]
#![warn(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    clippy::pedantic,
    clippy::wildcard_enum_match_arm,
    deprecated_in_future,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unreachable_pub,
    unused_crate_dependencies,
    unused_import_braces,
    unused_labels,
    unused_lifetimes,
    unused_qualifications,
    unused_results
)]

pub mod command;
pub mod domain;
pub mod infra;
pub mod query;
pub mod read;
pub mod task;

use std::error::Error as StdError;

use common::operations::{By, Start};
use derive_more::{Debug, Display, Error};

#[cfg(doc)]
use infra::{Database, Gateway, Storage};

pub use self::{command::Command, query::Query, task::Task};

/// [`Service`] configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// [JWT] encoding key.
    ///
    /// [JWT]: https://datatracker.ietf.org/doc/html/rfc7519
    #[debug(skip)]
    pub jwt_encoding_key: jsonwebtoken::EncodingKey,

    /// [JWT] decoding key.
    ///
    /// [JWT]: https://datatracker.ietf.org/doc/html/rfc7519
    #[debug(skip)]
    pub jwt_decoding_key: jsonwebtoken::DecodingKey,

    /// [`task::SweepOpenTransactions`] configuration.
    pub sweep_open_transactions: task::sweep_open_transactions::Config,
}

/// Domain service.
#[derive(Clone, Debug)]
pub struct Service<Db, Pg, Ds> {
    /// Configuration of this [`Service`].
    config: Config,

    /// [`Database`] of this [`Service`].
    database: Db,

    /// Payment [`Gateway`] of this [`Service`].
    payment: Pg,

    /// Document [`Storage`] of this [`Service`].
    storage: Ds,
}

impl<Db, Pg, Ds> Service<Db, Pg, Ds> {
    /// Creates a new [`Service`] with the provided parameters.
    pub fn new(
        config: Config,
        database: Db,
        payment: Pg,
        storage: Ds,
    ) -> (Self, task::Background)
    where
        Self: Task<
                Start<
                    By<
                        task::SweepOpenTransactions<Self>,
                        task::sweep_open_transactions::Config,
                    >,
                >,
                Ok = (),
                Err: StdError,
            > + Clone
            + 'static,
    {
        let this = Service { config, database, payment, storage };

        let mut bg = task::Background::default();
        let svc = this.clone();
        bg.spawn(async move {
            svc.execute(Start(By::new(svc.config().sweep_open_transactions)))
                .await
        });

        (this, bg)
    }

    /// Returns [`Config`] of this [`Service`].
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns [`Database`] of this [`Service`].
    #[must_use]
    pub fn database(&self) -> &Db {
        &self.database
    }

    /// Returns the payment [`Gateway`] of this [`Service`].
    #[must_use]
    pub fn payment(&self) -> &Pg {
        &self.payment
    }

    /// Returns the document [`Storage`] of this [`Service`].
    #[must_use]
    pub fn storage(&self) -> &Ds {
        &self.storage
    }
}

/// Shortcut for the error of starting a [`Task`].
type TaskStartError<Svc, T, Args> = <Svc as Task<Start<By<T, Args>>>>::Err;

/// Error of starting a [`Service`].
#[derive(Debug, Display, Error)]
pub enum StartupError<Svc>
where
    Svc: Task<
        Start<
            By<
                task::SweepOpenTransactions<Svc>,
                task::sweep_open_transactions::Config,
            >,
        >,
    >,
{
    /// [`task::SweepOpenTransactions`] failed to start.
    SweepOpenTransactionsTask(
        TaskStartError<
            Svc,
            task::SweepOpenTransactions<Svc>,
            task::sweep_open_transactions::Config,
        >,
    ),
}
