//! [`Agreement`] read model definitions.

#[cfg(doc)]
use crate::domain::Agreement;

pub mod list {
    //! [`Agreement`]s list definitions.

    use common::{define_pagination, pagination::Order};

    #[cfg(doc)]
    use crate::domain::User;
    use crate::domain::{
        agreement::{self, Role, Status},
        user, Agreement,
    };

    define_pagination!(Cursor, Node, Filter);

    /// Node in a [`Connection`].
    pub type Node = Agreement;

    /// Cursor pointing to a specific [`Agreement`] in a list.
    pub type Cursor = agreement::Id;

    /// Natural [`Order`] of [`Agreement`]s in a list: the newest first.
    pub const ORDER: Order = Order::Descending;

    /// Filter for [`Selector`].
    #[derive(Clone, Copy, Debug)]
    pub struct Filter {
        /// ID of the [`User`] whose [`Agreement`]s are listed.
        pub party: user::Id,

        /// [`Role`] the [`User`] plays in the listed [`Agreement`]s.
        ///
        /// [`None`] means any [`Role`].
        pub role: Option<Role>,

        /// [`Status`] of the listed [`Agreement`]s.
        ///
        /// [`None`] means any [`Status`].
        pub status: Option<Status>,
    }

    impl Filter {
        /// Indicates whether the provided [`Agreement`] passes this
        /// [`Filter`].
        #[must_use]
        pub fn matches(&self, agreement: &Agreement) -> bool {
            let role_matches = match self.role {
                Some(role) => agreement.role_of(self.party) == Some(role),
                None => agreement.is_party(self.party),
            };
            role_matches && self.status.map_or(true, |s| agreement.status == s)
        }
    }
}
