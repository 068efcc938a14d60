//! REST API definitions.

pub mod contract;
pub mod leasing_history;
pub mod leasing_request;
pub mod order;
pub mod receipt;
pub mod webhook;

use common::{pagination, Money};
use serde::{Deserialize, Serialize};

use crate::define_error;

/// Pagination query parameters of list endpoints.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
pub struct PageQuery {
    /// Number of items per page.
    pub limit: Option<u32>,

    /// 1-based number of the page to select.
    pub page: Option<u32>,
}

impl PageQuery {
    /// Converts these parameters into pagination [`Arguments`].
    ///
    /// [`Arguments`]: pagination::Arguments
    #[must_use]
    pub fn arguments(self) -> pagination::Arguments {
        pagination::Arguments::new(self.limit, self.page)
    }
}

/// Page of `T` representations.
#[derive(Clone, Debug, Serialize)]
pub struct PageResponse<T> {
    /// Items on this page.
    pub items: Vec<T>,

    /// Indicator whether more items exist beyond this page.
    pub has_more: bool,
}

impl<T> PageResponse<T> {
    /// Creates a new [`PageResponse`] out of the selected [`Page`].
    ///
    /// [`Page`]: pagination::Page
    pub fn new<I: Into<T>>(page: pagination::Page<I>) -> Self {
        Self {
            items: page.items.into_iter().map(Into::into).collect(),
            has_more: page.has_more,
        }
    }
}

/// Representation of a [`Money`] amount.
#[derive(Clone, Debug, Serialize)]
pub struct MoneyValue {
    /// Amount in the minor units of the currency.
    pub amount: i64,

    /// [ISO 4217] code of the currency.
    ///
    /// [ISO 4217]: https://wikipedia.org/wiki/ISO_4217
    pub currency: String,
}

impl From<Money> for MoneyValue {
    fn from(money: Money) -> Self {
        Self {
            amount: money.amount,
            currency: money.currency.to_string(),
        }
    }
}

define_error! {
    enum ParseError {
        #[code = "INVALID_STATUS_FILTER"]
        #[status = BAD_REQUEST]
        #[message = "Invalid status filter"]
        Status,
    }
}
