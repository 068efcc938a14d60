//! Abstractions for offset pagination.

/// Default number of items per [`Page`].
pub const DEFAULT_LIMIT: usize = 10;

/// Maximum allowed number of items per [`Page`].
pub const MAX_LIMIT: usize = 50;

/// A page of `I` items.
#[derive(Clone, Debug)]
pub struct Page<I> {
    /// Items on this [`Page`].
    pub items: Vec<I>,

    /// Indicator whether more items exist beyond this [`Page`].
    pub has_more: bool,
}

impl<I> Page<I> {
    /// Creates a new [`Page`] from the selected `items`, treating one item
    /// beyond the [`Arguments::limit()`] as the indicator of more pages.
    #[must_use]
    pub fn new(
        args: &Arguments,
        items: impl IntoIterator<Item = impl Into<I>>,
    ) -> Self {
        let mut items =
            items.into_iter().map(Into::into).collect::<Vec<_>>();
        let has_more = items.len() > args.limit();
        items.truncate(args.limit());
        Self { items, has_more }
    }
}

/// Arguments of selecting a [`Page`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Arguments {
    /// Number of items per [`Page`].
    limit: usize,

    /// 1-based number of the [`Page`] to select.
    page: usize,
}

impl Default for Arguments {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            page: 1,
        }
    }
}

impl Arguments {
    /// Creates a new [`Arguments`] from the provided query parameters,
    /// falling back to [`DEFAULT_LIMIT`] and clamping to [`MAX_LIMIT`].
    #[must_use]
    pub fn new(limit: Option<u32>, page: Option<u32>) -> Self {
        let limit = limit
            .map_or(DEFAULT_LIMIT, |l| l as usize)
            .clamp(1, MAX_LIMIT);
        let page = page.map_or(1, |p| p as usize).max(1);
        Self { limit, page }
    }

    /// Returns the number of items per [`Page`].
    #[must_use]
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Returns the 1-based number of the requested [`Page`].
    #[must_use]
    pub fn page(&self) -> usize {
        self.page
    }

    /// Returns the number of items to skip before the requested [`Page`].
    #[must_use]
    pub fn offset(&self) -> usize {
        (self.page - 1) * self.limit
    }
}

/// [`Page`] selector.
#[derive(Clone, Copy, Debug)]
pub struct Selector<F> {
    /// Pagination [`Arguments`].
    pub arguments: Arguments,

    /// Additional filter being applied to the result.
    pub filter: F,
}

/// Defines pagination types.
#[expect(clippy::module_name_repetitions, reason = "more readable")]
#[macro_export]
macro_rules! define_pagination {
    ($node:ty, $filter:ty) => {
        #[doc = "A [`Page`] of [`$node`]s."]
        pub type Page = $crate::pagination::Page<$node>;

        #[doc = "Arguments for selecting a [`Page`]."]
        pub type Arguments = $crate::pagination::Arguments;

        #[doc = "[`Page`] selector."]
        pub type Selector = $crate::pagination::Selector<$filter>;
    };
}

#[cfg(test)]
mod spec {
    use super::{Arguments, Page, DEFAULT_LIMIT, MAX_LIMIT};

    #[test]
    fn clamps_limit() {
        assert_eq!(Arguments::new(None, None).limit(), DEFAULT_LIMIT);
        assert_eq!(Arguments::new(Some(0), None).limit(), 1);
        assert_eq!(Arguments::new(Some(25), None).limit(), 25);
        assert_eq!(Arguments::new(Some(1000), None).limit(), MAX_LIMIT);
    }

    #[test]
    fn computes_offset() {
        assert_eq!(Arguments::new(None, None).offset(), 0);
        assert_eq!(Arguments::new(None, Some(0)).offset(), 0);
        assert_eq!(Arguments::new(Some(10), Some(3)).offset(), 20);
    }

    #[test]
    fn detects_more_pages() {
        let args = Arguments::new(Some(2), None);

        let page = Page::<u8>::new(&args, [1u8, 2, 3]);
        assert_eq!(page.items, vec![1, 2]);
        assert!(page.has_more);

        let page = Page::<u8>::new(&args, [1u8, 2]);
        assert_eq!(page.items, vec![1, 2]);
        assert!(!page.has_more);
    }
}
