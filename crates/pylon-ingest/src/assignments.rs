//! Assignment notifier: one stored notification plus a unicast push.
//!
//! Triggered by the assignment CRUD flow when a task is handed to a user.
//! Unlike event fan-out there is exactly one recipient and the push is
//! addressed to the assignee's private destination.

use std::sync::Arc;

use tracing::{error, info};
use uuid::Uuid;

use pylon_core::{
    Assignment, DeliveryChannel, NewNotification, NotificationRepository, PushMessage, Result,
};

use crate::worker::IngestPool;

pub struct AssignmentNotifier {
    notifications: Arc<dyn NotificationRepository>,
    channel: Arc<dyn DeliveryChannel>,
}

impl AssignmentNotifier {
    pub fn new(
        notifications: Arc<dyn NotificationRepository>,
        channel: Arc<dyn DeliveryChannel>,
    ) -> Self {
        Self {
            notifications,
            channel,
        }
    }

    /// Persist and push the notification for an assignment.
    ///
    /// Returns the stored notification id. The push is fire-and-forget;
    /// only the store write can fail the call.
    pub async fn notify_assignment(&self, assignment: &Assignment) -> Result<Uuid> {
        let notification = NewNotification::for_assignment(assignment);
        let notification_id = self.notifications.insert(notification).await?;

        let message = PushMessage::unicast_for_assignment(notification_id, assignment);
        self.channel
            .publish_to_user(&assignment.assignee, &message)
            .await;

        info!(
            subsystem = "ingest",
            component = "assignments",
            op = "notify_assignment",
            assignment_id = %assignment.id,
            notification_id = %notification_id,
            recipient = %assignment.assignee,
            "Assignment notification delivered"
        );
        Ok(notification_id)
    }

    /// Run [`Self::notify_assignment`] on the worker pool so the
    /// triggering request does not wait for the write and push.
    pub async fn spawn_notify_assignment(self: &Arc<Self>, pool: &IngestPool, assignment: Assignment) {
        let notifier = self.clone();
        pool.submit(async move {
            if let Err(e) = notifier.notify_assignment(&assignment).await {
                error!(
                    subsystem = "ingest",
                    component = "assignments",
                    op = "notify_assignment",
                    assignment_id = %assignment.id,
                    error = %e,
                    "Assignment notification failed"
                );
            }
        })
        .await;
    }
}
