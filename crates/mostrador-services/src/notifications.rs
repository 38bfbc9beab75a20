//! # Notifications
//!
//! Inbox rows in the `notifications` table plus a live feed.
//!
//! ## Hub Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  NotificationHub (owned, cloned into services)                          │
//! │    broadcast::Sender<Notification>                                      │
//! │    Mutex<HashSet<business_id>>   ◄── one live subscription per business │
//! │                                                                         │
//! │  subscribe("b-1") ──► Subscription ──► into_stream() ──► b-1 rows only  │
//! │  subscribe("b-1") ──► Err(AlreadySubscribed)                            │
//! │  drop / unsubscribe() ──► "b-1" released, subscribe works again         │
//! │                                                                         │
//! │  publish(row)  best-effort: no subscriber, lagging receiver → dropped   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashSet;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{ready, Context, Poll};

use chrono::Utc;
use tokio::sync::broadcast;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::Stream;
use tracing::{debug, error, info, warn};

use mostrador_core::Notification;
use mostrador_db::{Database, NewNotification};

use crate::access::StaffContext;
use crate::error::{ServiceError, ServiceResult};

const DEFAULT_CAPACITY: usize = 256;

// =============================================================================
// Hub
// =============================================================================

#[derive(Debug)]
struct HubInner {
    sender: broadcast::Sender<Notification>,
    subscribed: Mutex<HashSet<String>>,
}

impl HubInner {
    fn release(&self, business_id: &str) {
        self.subscribed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(business_id);
    }
}

/// In-process fan-out of new notifications.
#[derive(Debug, Clone)]
pub struct NotificationHub {
    inner: Arc<HubInner>,
}

impl Default for NotificationHub {
    fn default() -> Self {
        NotificationHub::new(DEFAULT_CAPACITY)
    }
}

impl NotificationHub {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        NotificationHub {
            inner: Arc::new(HubInner {
                sender,
                subscribed: Mutex::new(HashSet::new()),
            }),
        }
    }

    /// Opens the live feed of one business.
    pub fn subscribe(&self, business_id: &str) -> ServiceResult<Subscription> {
        let mut subscribed = self
            .inner
            .subscribed
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if !subscribed.insert(business_id.to_string()) {
            return Err(ServiceError::AlreadySubscribed {
                business_id: business_id.to_string(),
            });
        }

        debug!(business_id = %business_id, "Notification subscription opened");

        Ok(Subscription {
            receiver: self.inner.sender.subscribe(),
            guard: SubscriptionGuard {
                business_id: business_id.to_string(),
                hub: Arc::clone(&self.inner),
            },
        })
    }

    pub fn is_subscribed(&self, business_id: &str) -> bool {
        self.inner
            .subscribed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(business_id)
    }

    /// Sends to live subscribers. Returns how many receivers got it.
    pub fn publish(&self, notification: &Notification) -> usize {
        match self.inner.sender.send(notification.clone()) {
            Ok(receivers) => receivers,
            Err(_) => {
                debug!(business_id = %notification.business_id, "No live subscribers");
                0
            }
        }
    }
}

/// Releases the business slot when the subscription goes away.
#[derive(Debug)]
struct SubscriptionGuard {
    business_id: String,
    hub: Arc<HubInner>,
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        self.hub.release(&self.business_id);
        debug!(business_id = %self.business_id, "Notification subscription released");
    }
}

/// A live feed for one business. Dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    receiver: broadcast::Receiver<Notification>,
    guard: SubscriptionGuard,
}

impl Subscription {
    pub fn business_id(&self) -> &str {
        &self.guard.business_id
    }

    /// Next notification for this business; `None` once the hub is gone.
    pub async fn recv(&mut self) -> Option<Notification> {
        loop {
            match self.receiver.recv().await {
                Ok(n) if n.business_id == self.guard.business_id => return Some(n),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(business_id = %self.guard.business_id, skipped, "Notification feed lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    pub fn into_stream(self) -> NotificationStream {
        NotificationStream {
            inner: BroadcastStream::new(self.receiver),
            guard: self.guard,
        }
    }

    pub fn unsubscribe(self) {}
}

/// Stream form of a [`Subscription`].
pub struct NotificationStream {
    inner: BroadcastStream<Notification>,
    guard: SubscriptionGuard,
}

impl Stream for NotificationStream {
    type Item = Notification;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Notification>> {
        let this = self.get_mut();
        loop {
            match ready!(Pin::new(&mut this.inner).poll_next(cx)) {
                Some(Ok(n)) if n.business_id == this.guard.business_id => {
                    return Poll::Ready(Some(n))
                }
                Some(Ok(_)) => continue,
                Some(Err(BroadcastStreamRecvError::Lagged(skipped))) => {
                    warn!(business_id = %this.guard.business_id, skipped, "Notification feed lagged");
                }
                None => return Poll::Ready(None),
            }
        }
    }
}

/// Inserts a notification row and publishes it.
///
/// Best-effort: failures are logged and swallowed, the business write that
/// triggered it has already committed.
pub(crate) async fn record(db: &Database, hub: &NotificationHub, new: NewNotification) {
    match db.notifications().insert(&new).await {
        Ok(notification) => {
            hub.publish(&notification);
        }
        Err(err) => {
            error!(
                business_id = %new.business_id,
                kind = ?new.kind,
                error = %err,
                "Failed to record notification"
            );
        }
    }
}

// =============================================================================
// Service
// =============================================================================

#[derive(Debug, Clone)]
pub struct NotificationService {
    db: Database,
    hub: NotificationHub,
}

impl NotificationService {
    pub fn new(db: Database, hub: NotificationHub) -> Self {
        NotificationService { db, hub }
    }

    pub fn subscribe(&self, ctx: &StaffContext) -> ServiceResult<Subscription> {
        let subscription = self.hub.subscribe(&ctx.business_id)?;
        info!(business_id = %ctx.business_id, staff_id = %ctx.staff_id, "Notification feed opened");
        Ok(subscription)
    }

    pub async fn unread(&self, ctx: &StaffContext) -> ServiceResult<Vec<Notification>> {
        Ok(self.db.notifications().list_unread(&ctx.business_id).await?)
    }

    pub async fn mark_read(&self, ctx: &StaffContext, notification_id: &str) -> ServiceResult<()> {
        self.db
            .notifications()
            .mark_read(&ctx.business_id, notification_id, Utc::now())
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixture;
    use mostrador_core::NotificationKind;
    use tokio_stream::StreamExt;

    fn notification(business_id: &str, title: &str) -> Notification {
        Notification {
            id: format!("n-{}", title),
            business_id: business_id.to_string(),
            kind: NotificationKind::PaymentReceived,
            title: title.to_string(),
            body: String::new(),
            transaction_id: None,
            created_at: Utc::now(),
            read_at: None,
        }
    }

    #[test]
    fn test_single_subscriber_per_business() {
        let hub = NotificationHub::default();

        let first = hub.subscribe("b-1").unwrap();
        assert!(matches!(
            hub.subscribe("b-1"),
            Err(ServiceError::AlreadySubscribed { .. })
        ));
        // Other tenants are independent.
        let _other = hub.subscribe("b-2").unwrap();

        first.unsubscribe();
        assert!(!hub.is_subscribed("b-1"));
        assert!(hub.subscribe("b-1").is_ok());
    }

    #[test]
    fn test_hubs_are_independent() {
        let a = NotificationHub::default();
        let b = NotificationHub::default();
        let _sub = a.subscribe("b-1").unwrap();
        assert!(b.subscribe("b-1").is_ok());
    }

    #[test]
    fn test_publish_without_subscribers() {
        let hub = NotificationHub::default();
        assert_eq!(hub.publish(&notification("b-1", "x")), 0);
    }

    #[tokio::test]
    async fn test_subscription_filters_by_business() {
        let hub = NotificationHub::default();
        let mut sub = hub.subscribe("b-1").unwrap();

        hub.publish(&notification("b-2", "other"));
        hub.publish(&notification("b-1", "mine"));

        let received = sub.recv().await.unwrap();
        assert_eq!(received.title, "mine");
    }

    #[tokio::test]
    async fn test_stream_keeps_slot_until_dropped() {
        let hub = NotificationHub::default();
        let mut stream = hub.subscribe("b-1").unwrap().into_stream();
        assert!(hub.is_subscribed("b-1"));

        hub.publish(&notification("b-1", "first"));
        assert_eq!(stream.next().await.map(|n| n.title), Some("first".to_string()));

        drop(stream);
        assert!(!hub.is_subscribed("b-1"));
    }

    #[tokio::test]
    async fn test_record_inserts_and_publishes() {
        let fx = fixture("retail").await;
        let mut sub = fx.hub.subscribe(&fx.business.id).unwrap();

        record(
            &fx.db,
            &fx.hub,
            NewNotification {
                business_id: fx.business.id.clone(),
                kind: NotificationKind::OnlineOrder,
                title: "Nueva orden".to_string(),
                body: "T-000001".to_string(),
                transaction_id: None,
            },
        )
        .await;

        assert_eq!(sub.recv().await.map(|n| n.kind), Some(NotificationKind::OnlineOrder));

        let service = NotificationService::new(fx.db.clone(), fx.hub.clone());
        let unread = service.unread(&fx.cashier).await.unwrap();
        assert_eq!(unread.len(), 1);
        service.mark_read(&fx.cashier, &unread[0].id).await.unwrap();
        assert!(service.unread(&fx.cashier).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_record_swallows_failures() {
        let fx = fixture("retail").await;
        // Unknown business violates the foreign key; nothing is raised.
        record(
            &fx.db,
            &fx.hub,
            NewNotification {
                business_id: "missing".to_string(),
                kind: NotificationKind::PaymentReceived,
                title: "Pago recibido".to_string(),
                body: String::new(),
                transaction_id: None,
            },
        )
        .await;
        assert_eq!(fx.db.notifications().count_by_business("missing").await.unwrap(), 0);
    }
}
