//! Explicit [`Status`] transitions of an [`Agreement`].

use derive_more::{Display, Error as StdError};

use super::{Agreement, Status};

impl Status {
    /// Returns [`Status`]es an [`Agreement`] may be explicitly moved to from
    /// this one.
    ///
    /// [`Status::FullySigned`] is never among them: it's reachable only by
    /// collecting signatures, which also seals the [`Agreement`].
    #[must_use]
    pub const fn allowed_transitions(self) -> &'static [Self] {
        use Status as S;

        match self {
            S::Draft => &[S::PendingHost, S::PendingGuest, S::Cancelled],
            S::PendingHost | S::PendingGuest => &[S::Cancelled],
            S::FullySigned => &[S::Active, S::Cancelled],
            S::Active => &[S::Completed, S::Disputed, S::Cancelled],
            S::Disputed => &[S::Active, S::Cancelled],
            S::Completed | S::Cancelled => &[],
        }
    }

    /// Indicates whether an explicit transition from this [`Status`] to the
    /// provided one is allowed.
    #[must_use]
    pub fn can_transition_to(self, to: Self) -> bool {
        self.allowed_transitions().contains(&to)
    }
}

/// Explicit [`Status`] transition not allowed for an [`Agreement`].
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq, StdError)]
#[display("`Agreement` cannot be moved from `{from}` to `{to}` status")]
pub struct IllegalTransition {
    /// [`Status`] the [`Agreement`] is in.
    pub from: Status,

    /// [`Status`] the [`Agreement`] was requested to be moved to.
    pub to: Status,
}

impl Agreement {
    /// Checks whether this [`Agreement`] may be explicitly moved to the
    /// provided [`Status`].
    ///
    /// Doesn't modify this [`Agreement`].
    ///
    /// # Errors
    ///
    /// With an [`IllegalTransition`] if the transition is not allowed.
    pub fn transition(&self, to: Status) -> Result<Status, IllegalTransition> {
        let from = self.status;
        from.can_transition_to(to)
            .then_some(to)
            .ok_or(IllegalTransition { from, to })
    }
}

#[cfg(test)]
mod spec {
    use proptest::{prelude::*, sample::select};

    use crate::domain::agreement::{spec::agreement, Status};

    use super::IllegalTransition;

    /// Allowed transitions, written down independently of the implementation.
    const TABLE: &[(Status, Status)] = &[
        (Status::Draft, Status::PendingHost),
        (Status::Draft, Status::PendingGuest),
        (Status::Draft, Status::Cancelled),
        (Status::PendingHost, Status::Cancelled),
        (Status::PendingGuest, Status::Cancelled),
        (Status::FullySigned, Status::Active),
        (Status::FullySigned, Status::Cancelled),
        (Status::Active, Status::Completed),
        (Status::Active, Status::Disputed),
        (Status::Active, Status::Cancelled),
        (Status::Disputed, Status::Active),
        (Status::Disputed, Status::Cancelled),
    ];

    #[test]
    fn terminal_statuses() {
        assert!(Status::Completed.is_terminal());
        assert!(Status::Cancelled.is_terminal());
        assert!(!Status::Disputed.is_terminal());
    }

    #[test]
    fn fully_signed_is_never_a_target() {
        for from in Status::ALL.iter().copied() {
            assert!(!from.can_transition_to(Status::FullySigned), "{from}");
        }
    }

    #[test]
    fn operational_lifecycle() {
        let mut a = agreement(Status::FullySigned);

        a.status = a.transition(Status::Active).expect("allowed");
        a.status = a.transition(Status::Completed).expect("allowed");

        assert_eq!(
            a.transition(Status::PendingHost),
            Err(IllegalTransition {
                from: Status::Completed,
                to: Status::PendingHost,
            }),
        );
    }

    proptest! {
        #[test]
        fn matches_table(
            from in select(Status::ALL),
            to in select(Status::ALL),
        ) {
            let res = agreement(from).transition(to);

            if TABLE.contains(&(from, to)) {
                prop_assert_eq!(res, Ok(to));
            } else {
                prop_assert_eq!(res, Err(IllegalTransition { from, to }));
            }
        }
    }
}
