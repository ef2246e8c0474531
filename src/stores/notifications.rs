// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Notifications store.

use futures_util::future::join_all;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::models::{BackendNotification, Notification, NotificationId};
use crate::services::api::ApiError;
use crate::services::NotificationsService;
use crate::stores::FetchGeneration;
use crate::time_utils::parse_timestamp;

const RECENT_LIMIT: usize = 5;

const AUTO_REFRESH_PERIOD: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotificationsState {
    pub notifications: Vec<Notification>,
    pub loading: bool,
    pub error: Option<String>,
}

impl NotificationsState {
    pub fn unread(&self) -> Vec<&Notification> {
        self.notifications.iter().filter(|n| !n.read).collect()
    }

    pub fn unread_count(&self) -> usize {
        self.notifications.iter().filter(|n| !n.read).count()
    }

    /// Newest first; notifications without a parseable timestamp sort last.
    pub fn sorted(&self) -> Vec<&Notification> {
        let mut sorted: Vec<&Notification> = self.notifications.iter().collect();
        sorted.sort_by_cached_key(|n| {
            std::cmp::Reverse(n.timestamp.as_deref().and_then(parse_timestamp))
        });
        sorted
    }

    pub fn recent(&self) -> Vec<&Notification> {
        let mut sorted = self.sorted();
        sorted.truncate(RECENT_LIMIT);
        sorted
    }

    pub fn by_type(&self) -> BTreeMap<&str, Vec<&Notification>> {
        let mut groups: BTreeMap<&str, Vec<&Notification>> = BTreeMap::new();
        for notification in &self.notifications {
            groups
                .entry(notification.kind.as_str())
                .or_default()
                .push(notification);
        }
        groups
    }
}

pub struct NotificationsStore {
    service: NotificationsService,
    state: RwLock<NotificationsState>,
    generation: FetchGeneration,
    auto_refresh: AtomicBool,
    refresh_task: Mutex<Option<JoinHandle<()>>>,
}

impl NotificationsStore {
    pub fn new(service: NotificationsService) -> Self {
        Self {
            service,
            state: RwLock::new(NotificationsState::default()),
            generation: FetchGeneration::default(),
            auto_refresh: AtomicBool::new(true),
            refresh_task: Mutex::new(None),
        }
    }

    /// Refetch every 30 seconds until stopped. A no-op if already running.
    ///
    /// Ticks are skipped while auto-refresh is toggled off. The task holds
    /// only a weak reference and exits once the store is dropped.
    pub async fn start_auto_refresh(self: &Arc<Self>) {
        let mut task = self.refresh_task.lock().await;
        if task.as_ref().is_some_and(|t| !t.is_finished()) {
            return;
        }

        let store = Arc::downgrade(self);
        *task = Some(tokio::spawn(async move {
            let mut ticks = interval_at(Instant::now() + AUTO_REFRESH_PERIOD, AUTO_REFRESH_PERIOD);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticks.tick().await;
                let Some(store) = store.upgrade() else {
                    break;
                };
                if !store.is_auto_refresh_enabled() {
                    continue;
                }
                if let Err(e) = store.fetch_notifications().await {
                    tracing::warn!(error = %e, "Notification auto-refresh failed");
                }
            }
        }));
        tracing::debug!(
            period_secs = AUTO_REFRESH_PERIOD.as_secs(),
            "Notification auto-refresh started"
        );
    }

    pub async fn stop_auto_refresh(&self) {
        if let Some(task) = self.refresh_task.lock().await.take() {
            task.abort();
            tracing::debug!("Notification auto-refresh stopped");
        }
    }

    /// Flip whether timer ticks fetch; returns the new setting.
    pub fn toggle_auto_refresh(&self) -> bool {
        !self.auto_refresh.fetch_xor(true, Ordering::Relaxed)
    }

    pub fn is_auto_refresh_enabled(&self) -> bool {
        self.auto_refresh.load(Ordering::Relaxed)
    }

    pub async fn is_auto_refresh_running(&self) -> bool {
        self.refresh_task
            .lock()
            .await
            .as_ref()
            .is_some_and(|t| !t.is_finished())
    }

    pub async fn snapshot(&self) -> NotificationsState {
        self.state.read().await.clone()
    }

    pub async fn fetch_notifications(&self) -> Result<(), ApiError> {
        let generation = self.generation.begin();
        {
            let mut state = self.state.write().await;
            state.loading = true;
            state.error = None;
        }

        let result = self
            .service
            .list()
            .await
            .extract::<Vec<BackendNotification>>("notifications");

        let mut state = self.state.write().await;
        if !self.generation.is_current(generation) {
            return result.map(|_| ());
        }
        state.loading = false;
        match result {
            Ok(list) => {
                tracing::debug!(count = list.len(), "Fetched notifications");
                state.notifications = list.into_iter().map(Notification::from).collect();
                Ok(())
            }
            Err(e) => {
                state.error = Some(e.message());
                Err(e)
            }
        }
    }

    pub async fn mark_as_read(&self, id: &NotificationId) -> Result<(), ApiError> {
        let response = self.service.mark_as_read(id).await;
        let mut state = self.state.write().await;
        if let Some(err) = response.error() {
            state.error = Some(err.message());
            return Err(err.clone());
        }
        if let Some(notification) = state.notifications.iter_mut().find(|n| &n.id == id) {
            notification.read = true;
        }
        Ok(())
    }

    /// Mark every unread notification read, issuing the calls concurrently.
    ///
    /// Each success is applied locally; the first failure is returned.
    pub async fn mark_all_as_read(&self) -> Result<(), ApiError> {
        let unread: Vec<NotificationId> = self
            .state
            .read()
            .await
            .unread()
            .into_iter()
            .map(|n| n.id.clone())
            .collect();
        if unread.is_empty() {
            return Ok(());
        }

        let results = join_all(unread.iter().map(|id| self.mark_as_read(id))).await;
        let failed = results.iter().filter(|r| r.is_err()).count();
        if failed > 0 {
            tracing::warn!(failed, total = unread.len(), "Some notifications not marked read");
        }
        results.into_iter().collect()
    }

    pub async fn delete_notification(&self, id: &NotificationId) -> Result<(), ApiError> {
        let response = self.service.delete(id).await;
        let mut state = self.state.write().await;
        if let Some(err) = response.error() {
            state.error = Some(err.message());
            return Err(err.clone());
        }
        state.notifications.retain(|n| &n.id != id);
        Ok(())
    }

    /// Push a client-side notification to the front of the list.
    pub async fn add_notification(&self, notification: Notification) {
        self.state.write().await.notifications.insert(0, notification);
    }

    /// Drop a notification locally without calling the backend.
    pub async fn remove_notification(&self, id: &NotificationId) {
        self.state
            .write()
            .await
            .notifications
            .retain(|n| &n.id != id);
    }
}

impl Drop for NotificationsStore {
    fn drop(&mut self) {
        if let Some(task) = self.refresh_task.get_mut().take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notification(id: i64, kind: &str, read: bool, timestamp: Option<&str>) -> Notification {
        Notification {
            id: NotificationId::Number(id),
            kind: kind.to_string(),
            priority: None,
            message: format!("Notification {id}"),
            read,
            timestamp: timestamp.map(str::to_string),
            source: None,
        }
    }

    fn state() -> NotificationsState {
        NotificationsState {
            notifications: vec![
                notification(1, "ticket", true, Some("2024-05-01T09:00:00")),
                notification(2, "caregiver", false, Some("2024-05-03T09:00:00Z")),
                notification(3, "ticket", false, None),
                notification(4, "ticket", false, Some("2024-05-02 09:00:00")),
            ],
            ..NotificationsState::default()
        }
    }

    #[test]
    fn unread_getters() {
        let state = state();
        assert_eq!(state.unread_count(), 3);
        let ids: Vec<String> = state.unread().iter().map(|n| n.id.to_string()).collect();
        assert_eq!(ids, ["2", "3", "4"]);
    }

    #[test]
    fn sorted_newest_first() {
        let state = state();
        let ids: Vec<String> = state.sorted().iter().map(|n| n.id.to_string()).collect();
        assert_eq!(ids, ["2", "4", "1", "3"]);
    }

    #[test]
    fn recent_is_capped() {
        let mut state = state();
        for id in 10..20 {
            state
                .notifications
                .push(notification(id, "system", false, Some("2023-01-01T00:00:00Z")));
        }
        assert_eq!(state.recent().len(), RECENT_LIMIT);
    }

    #[test]
    fn grouped_by_type() {
        let state = state();
        let groups = state.by_type();
        assert_eq!(groups["ticket"].len(), 3);
        assert_eq!(groups["caregiver"].len(), 1);
    }
}
