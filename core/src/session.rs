//! Session Management
//!
//! A session is the current authenticated identity plus its realtime
//! subscription handle. It is created on successful sign-in and
//! destroyed on logout: the subscription is torn down, the identity
//! cleared, and all per-session surface state discarded.

use crate::backend::VoteSubscription;
use crate::profile::{Profile, ProfileId};
use crate::votes::VoteInsert;

/// What the auth endpoint hands back on a successful sign-in.
#[derive(Clone, Debug)]
pub struct AuthSession {
    /// The merged account profile.
    pub profile: Profile,
    /// Whether the account is still on its provisioning password and
    /// must change it before using the app.
    pub needs_password_change: bool,
}

/// The live session owned by the controller.
#[derive(Debug)]
pub struct Session {
    /// The authenticated profile.
    pub profile: Profile,
    subscription: Option<VoteSubscription>,
}

impl Session {
    /// Start a session for an authenticated profile. No subscription
    /// is attached yet.
    pub fn new(profile: Profile) -> Self {
        Self {
            profile,
            subscription: None,
        }
    }

    /// The session identity.
    pub fn profile_id(&self) -> ProfileId {
        self.profile.id
    }

    /// Attach the realtime subscription, tearing down any prior one
    /// first so a session never holds two.
    pub fn attach_subscription(&mut self, subscription: VoteSubscription) {
        if let Some(previous) = self.subscription.take() {
            previous.unsubscribe();
        }
        self.subscription = Some(subscription);
    }

    /// Whether a realtime subscription is attached.
    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_some()
    }

    /// Drain every realtime event that has arrived since the last
    /// poll, in arrival order.
    pub fn drain_realtime(&mut self) -> Vec<VoteInsert> {
        let mut events = Vec::new();
        if let Some(sub) = self.subscription.as_mut() {
            while let Some(event) = sub.try_recv() {
                events.push(event);
            }
        }
        events
    }

    /// End the session, tearing down the subscription.
    pub fn end(mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn profile() -> Profile {
        Profile {
            id: ProfileId::random(),
            email: "ana@famstar.local".into(),
            display_name: Some("Ana".into()),
        }
    }

    fn subscription() -> (mpsc::Sender<VoteInsert>, VoteSubscription) {
        let (tx, rx) = mpsc::channel(8);
        (tx, VoteSubscription::new(rx))
    }

    #[tokio::test]
    async fn test_attach_replaces_previous_subscription() {
        let mut session = Session::new(profile());
        let (old_tx, old_sub) = subscription();
        let (new_tx, new_sub) = subscription();

        session.attach_subscription(old_sub);
        session.attach_subscription(new_sub);

        // The old channel's receiver is gone; the new one is live.
        assert!(old_tx.is_closed());
        assert!(!new_tx.is_closed());
        assert!(session.is_subscribed());
    }

    #[tokio::test]
    async fn test_drain_preserves_arrival_order() {
        let mut session = Session::new(profile());
        let (tx, sub) = subscription();
        session.attach_subscription(sub);

        let voter = ProfileId::random();
        for value in [5u8, 3, 1] {
            tx.send(VoteInsert {
                voter_id: voter,
                voted_for_id: session.profile_id(),
                rating: crate::votes::Rating::new(value).unwrap(),
            })
            .await
            .unwrap();
        }

        let drained = session.drain_realtime();
        let values: Vec<u8> = drained.iter().map(|v| v.rating.value()).collect();
        assert_eq!(values, vec![5, 3, 1]);
        assert!(session.drain_realtime().is_empty());
    }

    #[tokio::test]
    async fn test_end_tears_down_subscription() {
        let mut session = Session::new(profile());
        let (tx, sub) = subscription();
        session.attach_subscription(sub);
        session.end();
        assert!(tx.is_closed());
    }
}
