//! Abstractions for cursor-based pagination.

use std::fmt;

/// Generic pagination connection.
#[derive(Clone, Debug)]
pub struct Connection<C, I> {
    /// [`Edge`]s in this [`Connection`], always in the natural order of the
    /// paginated list, regardless of the pagination [`Kind`].
    pub edges: Vec<Edge<C, I>>,

    /// [`Kind`] of this [`Connection`].
    pub kind: Kind,

    /// Indicator whether there are more nodes beyond this [`Connection`] in
    /// the direction of its [`Kind`].
    pub has_more: bool,
}

/// A page in a [`Connection`].
pub type Page<C, I> = Connection<C, I>;

impl<C, I> Connection<C, I> {
    /// Creates a new [`Connection`] from the provided [`Edge`]s.
    ///
    /// [`Edge`]s are expected in the natural order of the paginated list.
    #[must_use]
    pub fn new(
        args: &Arguments<C>,
        edges: impl IntoIterator<Item = impl Into<Edge<C, I>>>,
        has_more: bool,
    ) -> Self {
        Self {
            edges: edges.into_iter().map(Into::into).collect(),
            kind: args.kind(),
            has_more,
        }
    }

    /// Creates a new empty [`Connection`].
    #[must_use]
    pub fn empty(args: &Arguments<C>) -> Self {
        Self {
            edges: vec![],
            kind: args.kind(),
            has_more: false,
        }
    }

    /// Maps nodes of this [`Connection`] with the provided function.
    #[must_use]
    pub fn map<T>(self, mut f: impl FnMut(I) -> T) -> Connection<C, T> {
        Connection {
            edges: self
                .edges
                .into_iter()
                .map(|e| Edge {
                    cursor: e.cursor,
                    node: f(e.node),
                })
                .collect(),
            kind: self.kind,
            has_more: self.has_more,
        }
    }

    /// Returns [`PageInfo`] of this [`Connection`].
    #[must_use]
    pub fn page_info(&self) -> PageInfo<C>
    where
        C: Clone,
    {
        PageInfo {
            start_cursor: self.edges.first().map(|e| e.cursor.clone()),
            end_cursor: self.edges.last().map(|e| e.cursor.clone()),
            has_next_page: self.has_more && self.kind == Kind::Forward,
            has_previous_page: self.has_more && self.kind == Kind::Backward,
        }
    }
}

/// Information about a page in a [`Connection`].
#[derive(Clone, Copy, Debug)]
pub struct PageInfo<C> {
    /// First cursor on this page.
    pub start_cursor: Option<C>,

    /// Last cursor on this page.
    pub end_cursor: Option<C>,

    /// Indicator whether [`Connection`] has a next page.
    pub has_next_page: bool,

    /// Indicator whether [`Connection`] has a previous page.
    pub has_previous_page: bool,
}

/// An edge in a [`Connection`].
#[derive(Clone, Copy, Debug)]
pub struct Edge<C, I> {
    /// Cursor of this [`Edge`].
    pub cursor: C,

    /// Node of this [`Edge`].
    pub node: I,
}

impl<C, I> From<(C, I)> for Edge<C, I> {
    fn from((cursor, node): (C, I)) -> Self {
        Self { cursor, node }
    }
}

/// Pagination arguments.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Arguments<C> {
    /// Forward pagination.
    Forward {
        /// Number of items to return.
        first: usize,

        /// Cursor after which to return items.
        after: Option<C>,
    },

    /// Backward pagination.
    Backward {
        /// Number of items to return.
        last: usize,

        /// Cursor before which to return items.
        before: Option<C>,
    },
}

impl<C> Arguments<C> {
    /// Creates new [`Arguments`] out of the raw `first`/`after` and
    /// `last`/`before` pairs.
    ///
    /// The `default` limit is used when neither `first` nor `last` is
    /// provided, and any limit is clamped to the `max` one.
    ///
    /// [`None`] is returned if the arguments are ambiguous or a limit cannot
    /// be represented.
    pub fn new<Num>(
        first: Option<Num>,
        after: Option<C>,
        last: Option<Num>,
        before: Option<C>,
        default: usize,
        max: usize,
    ) -> Option<Self>
    where
        C: fmt::Debug,
        Num: TryInto<usize> + fmt::Debug,
    {
        let clamp = |n: Num| n.try_into().ok().map(|n: usize| n.min(max));

        Some(match (first, after, last, before) {
            (first, after, None, None) => Self::Forward {
                first: first.map_or(Some(default.min(max)), clamp)?,
                after,
            },
            (None, None, Some(last), before) => Self::Backward {
                last: clamp(last)?,
                before,
            },
            _ => return None,
        })
    }

    /// Returns cursor requested by these [`Arguments`].
    #[must_use]
    pub fn cursor(&self) -> Option<&C> {
        match self {
            Self::Forward { after, .. } => after.as_ref(),
            Self::Backward { before, .. } => before.as_ref(),
        }
    }

    /// Returns [`Kind`] of pagination these [`Arguments`] request.
    #[must_use]
    pub fn kind(&self) -> Kind {
        match self {
            Self::Forward { .. } => Kind::Forward,
            Self::Backward { .. } => Kind::Backward,
        }
    }

    /// Returns limit requested by these [`Arguments`].
    #[must_use]
    pub fn limit(&self) -> usize {
        match *self {
            Self::Forward { first, .. } => first,
            Self::Backward { last, .. } => last,
        }
    }
}

/// Pagination selector.
#[derive(Clone, Copy, Debug)]
pub struct Selector<C, F> {
    /// Pagination [`Arguments`].
    pub arguments: Arguments<C>,

    /// Additional filter being applied to the result.
    pub filter: F,
}

/// Kind of pagination.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Kind {
    /// Forward pagination.
    Forward,

    /// Backward pagination.
    Backward,
}

impl Kind {
    /// Returns the [`Order`] items should be fetched in, given the natural
    /// [`Order`] of the paginated list.
    ///
    /// Backward pagination fetches items in the reversed order, so the
    /// fetched items must be reversed back before building a [`Connection`].
    #[must_use]
    pub const fn order(self, natural: Order) -> Order {
        match self {
            Self::Forward => natural,
            Self::Backward => natural.reversed(),
        }
    }
}

/// Order of pagination.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Order {
    /// Ascending order.
    Ascending,

    /// Descending order.
    Descending,
}

impl Order {
    /// Returns the opposite [`Order`].
    #[must_use]
    pub const fn reversed(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }

    /// Returns comparison operator selecting items past a cursor in this
    /// [`Order`].
    #[must_use]
    pub const fn operator(self) -> &'static str {
        match self {
            Self::Ascending => ">",
            Self::Descending => "<",
        }
    }

    /// Returns SQL keyword representing this [`Order`].
    #[cfg(feature = "postgres")]
    #[must_use]
    pub const fn sql(self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }
}

/// Defines pagination types.
#[expect(clippy::module_name_repetitions, reason = "more readable")]
#[macro_export]
macro_rules! define_pagination {
    ($cursor:ty, $node:ty, $filter:ty) => {
        #[doc = "Edge of a [`Connection`]."]
        pub type Edge = $crate::pagination::Edge<$cursor, $node>;

        #[doc = "A [`Connection`] of nodes."]
        pub type Connection = $crate::pagination::Connection<$cursor, $node>;

        #[doc = "A [`Page`] of nodes."]
        pub type Page = $crate::pagination::Page<$cursor, $node>;

        #[doc = "An information about a [`Page`]."]
        pub type PageInfo = $crate::pagination::PageInfo<$cursor>;

        #[doc = "Arguments for selecting a [`Page`]."]
        pub type Arguments = $crate::pagination::Arguments<$cursor>;

        #[doc = "[`Page`] selector."]
        pub type Selector = $crate::pagination::Selector<$cursor, $filter>;
    };
}

#[cfg(test)]
mod spec {
    use super::{Arguments, Connection, Kind, Order};

    type Args = Arguments<u32>;

    #[test]
    fn defaults_to_forward() {
        assert_eq!(
            Args::new::<i32>(None, None, None, None, 10, 50),
            Some(Args::Forward {
                first: 10,
                after: None,
            }),
        );
    }

    #[test]
    fn clamps_limit() {
        let args = Args::new(Some(500), Some(3), None, None, 10, 50);

        assert_eq!(args.map(|a| a.limit()), Some(50));
        assert_eq!(args.and_then(|a| a.cursor().copied()), Some(3));
    }

    #[test]
    fn rejects_ambiguous_and_negative() {
        assert_eq!(Args::new(Some(1), None, Some(1), None, 10, 50), None);
        assert_eq!(
            Args::new::<i32>(None, Some(1), None, Some(2), 10, 50),
            None,
        );
        assert_eq!(Args::new(Some(-1), None, None, None, 10, 50), None);
    }

    #[test]
    fn backward_reverses_order() {
        assert_eq!(Kind::Forward.order(Order::Descending), Order::Descending);
        assert_eq!(Kind::Backward.order(Order::Descending), Order::Ascending);
        assert_eq!(Order::Descending.operator(), "<");
    }

    #[test]
    fn page_info_reflects_direction() {
        let args = Args::Backward {
            last: 2,
            before: Some(9),
        };
        let conn = Connection::<u32, ()>::new(&args, [(8, ()), (7, ())], true);
        let info = conn.page_info();

        assert_eq!(info.start_cursor, Some(8));
        assert_eq!(info.end_cursor, Some(7));
        assert!(info.has_previous_page);
        assert!(!info.has_next_page);
    }
}
