//! Trust metrics definitions.

#[cfg(doc)]
use common::DateTime;
use common::define_kind;

#[cfg(doc)]
use crate::domain::User;
use crate::domain::{agreement, user, Agreement};

/// Trust metrics of a [`User`], accumulated from their [`Agreement`]s.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Metrics {
    /// Number of [`Agreement`]s the [`User`] has fully signed.
    pub completed_agreements: i32,

    /// Number of [`Agreement`]s the [`User`] has completed.
    pub completed_stays: i32,
}

impl Metrics {
    /// Returns the value of the provided [`Counter`].
    #[must_use]
    pub const fn get(&self, counter: Counter) -> i32 {
        match counter {
            Counter::CompletedAgreements => self.completed_agreements,
            Counter::CompletedStays => self.completed_stays,
        }
    }

    /// Returns a mutable reference to the provided [`Counter`].
    pub fn get_mut(&mut self, counter: Counter) -> &mut i32 {
        match counter {
            Counter::CompletedAgreements => &mut self.completed_agreements,
            Counter::CompletedStays => &mut self.completed_stays,
        }
    }
}

define_kind! {
    #[doc = "Trust counter of a [`User`]."]
    enum Counter {
        #[doc = "Number of fully signed [`Agreement`]s."]
        CompletedAgreements = 1,

        #[doc = "Number of completed [`Agreement`]s."]
        CompletedStays = 2,
    }
}

/// Increment of a [`User`]'s trust [`Counter`] caused by an [`Agreement`].
///
/// Applied at most once per [`Agreement`], [`User`] and [`Counter`], so
/// re-applying the same [`Increment`] is a no-op.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Increment {
    /// ID of the [`Agreement`] causing this [`Increment`].
    pub agreement_id: agreement::Id,

    /// ID of the [`User`] whose [`Counter`] is incremented.
    pub user_id: user::Id,

    /// Incremented [`Counter`].
    pub counter: Counter,
}

impl Increment {
    /// Returns [`Increment`]s of the provided [`Counter`] for both parties of
    /// the provided [`Agreement`].
    #[must_use]
    pub fn for_parties(agreement: &Agreement, counter: Counter) -> [Self; 2] {
        [agreement.host_id, agreement.guest_id].map(|user_id| Self {
            agreement_id: agreement.id,
            user_id,
            counter,
        })
    }

    /// Returns all the [`Increment`]s the current state of the provided
    /// [`Agreement`] implies.
    ///
    /// A sealed [`Agreement`] implies [`Counter::CompletedAgreements`], and a
    /// completed one additionally implies [`Counter::CompletedStays`].
    #[must_use]
    pub fn implied_by(agreement: &Agreement) -> Vec<Self> {
        let mut increments = vec![];
        if agreement.seal.is_some() {
            increments.extend(Self::for_parties(
                agreement,
                Counter::CompletedAgreements,
            ));
        }
        if agreement.status == agreement::Status::Completed {
            increments
                .extend(Self::for_parties(agreement, Counter::CompletedStays));
        }
        increments
    }
}

/// Selector of [`Increment`]s implied by [`Agreement`]s, but not applied yet.
#[derive(Clone, Copy, Debug)]
pub struct Missing {
    /// Only [`Agreement`]s modified before this [`DateTime`] are considered,
    /// so the ones being processed right now are left alone.
    pub modified_before: agreement::ModificationDateTime,

    /// Maximum number of [`Increment`]s to select.
    pub limit: usize,
}

#[cfg(test)]
mod spec {
    use crate::domain::agreement::{spec::agreement, Status};

    use super::{Counter, Increment, Metrics};

    #[test]
    fn unsealed_implies_nothing() {
        assert!(Increment::implied_by(&agreement(Status::PendingGuest))
            .is_empty());
    }

    #[test]
    fn sealed_implies_completed_agreements() {
        let mut a = agreement(Status::FullySigned);
        a.seal = a.finalize();

        let increments = Increment::implied_by(&a);

        assert_eq!(increments.len(), 2);
        assert!(increments
            .iter()
            .all(|i| i.counter == Counter::CompletedAgreements));
        assert!(increments.iter().any(|i| i.user_id == a.host_id));
        assert!(increments.iter().any(|i| i.user_id == a.guest_id));
    }

    #[test]
    fn completed_implies_both_counters() {
        let mut a = agreement(Status::FullySigned);
        a.seal = a.finalize();
        a.status = Status::Completed;

        assert_eq!(Increment::implied_by(&a).len(), 4);
    }

    #[test]
    fn metrics_by_counter() {
        let mut m = Metrics::default();
        *m.get_mut(Counter::CompletedStays) += 1;

        assert_eq!(m.get(Counter::CompletedStays), 1);
        assert_eq!(m.get(Counter::CompletedAgreements), 0);
    }
}
