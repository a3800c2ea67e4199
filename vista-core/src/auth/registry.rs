//! Authoritative device state: access code, pending requests, active
//! sessions, ban list and decision signals.
//!
//! All maps live behind one mutex. No method holds the lock across an
//! `.await`; the only I/O the registry performs is best-effort
//! notification through the unbounded control lane of a
//! [`ConnectionHandle`], which never blocks.
//!
//! ```text
//!                 admit_pending            accept
//!   (unknown) ───────────────────► Pending ────────► Active ──► detach/release
//!       │                            │  │
//!       │ ban                 reject │  │ ban
//!       ▼                            ▼  ▼
//!    Banned ◄──────────────────── (discarded)
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info};

use crate::auth::code::{AccessCode, DEFAULT_CODE_LENGTH};
use crate::auth::device::DeviceId;
use crate::auth::permissions::{PermissionPatch, Permissions};
use crate::auth::signal::{Decision, DecisionSignal};
use crate::network::{ConnectionHandle, ConnectionId};
use crate::protocol::{AuthStatus, ServerMessage};

// ── Snapshots ────────────────────────────────────────────────────

/// Read-only view of a pending request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingRequest {
    pub device_id: DeviceId,
    pub name: String,
    /// Creation time in milliseconds since the Unix epoch.
    pub requested_at_ms: u64,
}

/// Read-only view of an active session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActiveSession {
    pub device_id: DeviceId,
    pub name: String,
    pub permissions: Permissions,
    /// Connection the session is bound to.
    #[serde(skip)]
    pub connection: ConnectionId,
}

/// Outcome of waiting on a pending request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Accepted; the session as it existed when the waiter woke up.
    Accepted(ActiveSession),
    /// Rejected. `notified` already received the rejection notice.
    Rejected { notified: Option<ConnectionId> },
    /// Banned. `notified` already received the ban notice.
    Banned { notified: Option<ConnectionId> },
    /// No decision within the wait window.
    TimedOut,
}

// ── Internal entries ─────────────────────────────────────────────

struct PendingEntry {
    name: String,
    conn: ConnectionHandle,
    requested_at: SystemTime,
}

struct ActiveEntry {
    name: String,
    conn: ConnectionHandle,
    permissions: Permissions,
}

impl ActiveEntry {
    fn snapshot(&self, device_id: &DeviceId) -> ActiveSession {
        ActiveSession {
            device_id: device_id.clone(),
            name: self.name.clone(),
            permissions: self.permissions,
            connection: self.conn.id(),
        }
    }
}

/// A decision signal plus the connection that armed (or last re-armed) it.
struct SignalSlot {
    signal: Arc<DecisionSignal>,
    owner: Option<ConnectionId>,
}

struct RegistryState {
    code: AccessCode,
    pending: HashMap<DeviceId, PendingEntry>,
    active: HashMap<DeviceId, ActiveEntry>,
    banned: HashSet<DeviceId>,
    signals: HashMap<DeviceId, SignalSlot>,
}

impl RegistryState {
    /// Fire the signal for `id`, if any.
    fn fire(&self, id: &DeviceId, decision: Decision) {
        if let Some(slot) = self.signals.get(id) {
            slot.signal.fire(decision);
        }
    }

    /// Drop resolved-or-orphaned signals owned by `conn` for ids that are
    /// no longer pending.
    fn prune_signals(&mut self, conn: ConnectionId) {
        let pending = &self.pending;
        self.signals
            .retain(|id, slot| slot.owner != Some(conn) || pending.contains_key(id));
    }
}

// ── Registry ─────────────────────────────────────────────────────

/// Shared device registry. Cheap to clone.
#[derive(Clone)]
pub struct Registry {
    inner: Arc<RegistryInner>,
}

struct RegistryInner {
    state: Mutex<RegistryState>,
    code_length: usize,
}

impl Registry {
    /// Create a registry with a fresh six-digit code.
    pub fn new() -> Self {
        Self::with_code_length(DEFAULT_CODE_LENGTH)
    }

    /// Create a registry whose codes have `code_length` digits.
    pub fn with_code_length(code_length: usize) -> Self {
        let state = RegistryState {
            code: AccessCode::generate(code_length),
            pending: HashMap::new(),
            active: HashMap::new(),
            banned: HashSet::new(),
            signals: HashMap::new(),
        };
        Self {
            inner: Arc::new(RegistryInner {
                state: Mutex::new(state),
                code_length,
            }),
        }
    }

    // ── Access code ──────────────────────────────────────────────

    pub fn current_code(&self) -> String {
        self.inner.state.lock().code.to_string()
    }

    /// Replace the access code. Active sessions are unaffected.
    pub fn regenerate_code(&self) -> String {
        let code = AccessCode::generate(self.inner.code_length);
        let text = code.to_string();
        self.inner.state.lock().code = code;
        info!("access code regenerated");
        text
    }

    /// Compare `candidate` against the code valid right now.
    pub fn check_code(&self, candidate: Option<&str>) -> bool {
        self.inner.state.lock().code.matches(candidate)
    }

    // ── Admission ────────────────────────────────────────────────

    pub fn is_banned(&self, id: &DeviceId) -> bool {
        self.inner.state.lock().banned.contains(id)
    }

    /// Record a pending request for `id` on `conn`.
    ///
    /// Returns `false` if `id` is banned. A re-submission while already
    /// pending replaces the stored connection and keeps the same signal;
    /// a submission after an earlier episode was resolved arms a new one.
    pub fn admit_pending(&self, id: &DeviceId, name: &str, conn: ConnectionHandle) -> bool {
        let mut state = self.inner.state.lock();
        if state.banned.contains(id) {
            return false;
        }

        let owner = conn.id();
        state.pending.insert(
            id.clone(),
            PendingEntry {
                name: name.to_owned(),
                conn,
                requested_at: SystemTime::now(),
            },
        );

        let rearm = state
            .signals
            .get(id)
            .is_none_or(|slot| slot.signal.current().is_resolved());
        if rearm {
            state.signals.insert(
                id.clone(),
                SignalSlot {
                    signal: Arc::new(DecisionSignal::new()),
                    owner: Some(owner),
                },
            );
        } else if let Some(slot) = state.signals.get_mut(id) {
            slot.owner = Some(owner);
        }

        info!(device_id = %id, device_name = name, conn = %owner, "device pending approval");
        true
    }

    // ── Decisions ────────────────────────────────────────────────

    /// Move a pending request to the active set with default permissions.
    ///
    /// An active session for the same device on another connection is
    /// displaced: that connection is told `rejected` and closed.
    pub fn accept(&self, id: &DeviceId) -> bool {
        let mut state = self.inner.state.lock();
        let Some(entry) = state.pending.remove(id) else {
            return false;
        };
        let conn = entry.conn.id();
        let displaced = state.active.insert(
            id.clone(),
            ActiveEntry {
                name: entry.name,
                conn: entry.conn,
                permissions: Permissions::default(),
            },
        );
        if let Some(old) = displaced.filter(|old| old.conn.id() != conn) {
            notify(&old.conn, ServerMessage::auth_result(AuthStatus::Rejected));
            old.conn.close();
            info!(device_id = %id, conn = %old.conn.id(), "active session displaced");
        }
        state.fire(id, Decision::Accepted);
        info!(device_id = %id, "device accepted");
        true
    }

    /// Discard a pending request and notify its connection.
    pub fn reject(&self, id: &DeviceId) -> bool {
        let mut state = self.inner.state.lock();
        let Some(entry) = state.pending.remove(id) else {
            return false;
        };
        let notified = notify(&entry.conn, ServerMessage::auth_result(AuthStatus::Rejected));
        state.fire(id, Decision::Rejected { notified });
        info!(device_id = %id, "device rejected");
        true
    }

    /// Ban `id`. Always succeeds.
    ///
    /// A pending request is discarded and notified. An active session is
    /// force-detached, notified and its connection closed.
    pub fn ban(&self, id: &DeviceId) -> bool {
        let mut state = self.inner.state.lock();
        state.banned.insert(id.clone());

        let mut notified = None;
        if let Some(entry) = state.pending.remove(id) {
            notified = notify(&entry.conn, ServerMessage::auth_result(AuthStatus::Banned));
        }
        if let Some(entry) = state.active.remove(id) {
            notify(&entry.conn, ServerMessage::auth_result(AuthStatus::Banned));
            entry.conn.close();
            info!(device_id = %id, conn = %entry.conn.id(), "active session force-detached by ban");
        }
        state.fire(id, Decision::Banned { notified });
        info!(device_id = %id, "device banned");
        true
    }

    // ── Waiting ──────────────────────────────────────────────────

    /// Wait for the decision on `id`.
    ///
    /// Returns the active session if the device was accepted, `None` if it
    /// was rejected, banned, or the wait timed out. A timeout leaves the
    /// registry untouched.
    pub async fn await_decision(&self, id: &DeviceId, timeout: Duration) -> Option<ActiveSession> {
        match self.wait_verdict(id, timeout).await {
            Verdict::Accepted(session) => Some(session),
            _ => None,
        }
    }

    /// Like [`await_decision`](Self::await_decision) but reports why no
    /// session was produced.
    pub async fn wait_verdict(&self, id: &DeviceId, timeout: Duration) -> Verdict {
        let signal = {
            let mut state = self.inner.state.lock();
            let slot = state.signals.entry(id.clone()).or_insert_with(|| SignalSlot {
                signal: Arc::new(DecisionSignal::new()),
                owner: None,
            });
            Arc::clone(&slot.signal)
        };

        match signal.wait(timeout).await {
            None => Verdict::TimedOut,
            Some(Decision::Rejected { notified }) => Verdict::Rejected { notified },
            Some(Decision::Banned { notified }) => Verdict::Banned { notified },
            Some(Decision::Accepted | Decision::Pending) => {
                let state = self.inner.state.lock();
                match state.active.get(id) {
                    Some(entry) => Verdict::Accepted(entry.snapshot(id)),
                    // Accepted, then detached or banned before we woke up.
                    None if state.banned.contains(id) => Verdict::Banned { notified: None },
                    None => Verdict::Rejected { notified: None },
                }
            }
        }
    }

    // ── Active sessions ──────────────────────────────────────────

    /// Merge `patch` into the permissions of active device `id` and push the
    /// complete new set to its connection.
    pub fn update_permissions(&self, id: &DeviceId, patch: &PermissionPatch) -> bool {
        let mut state = self.inner.state.lock();
        let Some(entry) = state.active.get_mut(id) else {
            return false;
        };
        entry.permissions.apply(patch);
        let permissions = entry.permissions;
        notify(&entry.conn, ServerMessage::PermissionUpdate { permissions });
        info!(device_id = %id, ?permissions, "permissions updated");
        true
    }

    /// Remove `id` from the active set. Idempotent.
    pub fn detach(&self, id: &DeviceId) {
        if self.inner.state.lock().active.remove(id).is_some() {
            info!(device_id = %id, "session detached");
        }
    }

    /// Tear down everything bound to connection `conn`.
    ///
    /// Removes the pending request or active session whose stored handle is
    /// `conn`; entries that were re-bound to a newer connection are left
    /// alone. Signals armed by `conn` that no longer guard a pending
    /// request are dropped.
    pub fn release(&self, conn: ConnectionId) {
        let mut state = self.inner.state.lock();
        state.pending.retain(|_, entry| entry.conn.id() != conn);

        let detached: Vec<DeviceId> = state
            .active
            .iter()
            .filter(|(_, entry)| entry.conn.id() == conn)
            .map(|(id, _)| id.clone())
            .collect();
        for id in &detached {
            state.active.remove(id);
            info!(device_id = %id, %conn, "session detached");
        }

        state.prune_signals(conn);
    }

    /// Active device and permissions bound to connection `conn`.
    pub fn session_for(&self, conn: ConnectionId) -> Option<(DeviceId, Permissions)> {
        self.inner
            .state
            .lock()
            .active
            .iter()
            .find(|(_, entry)| entry.conn.id() == conn)
            .map(|(id, entry)| (id.clone(), entry.permissions))
    }

    /// Current permissions of `id`, provided it is still active on `conn`.
    pub fn permissions_for(&self, id: &DeviceId, conn: ConnectionId) -> Option<Permissions> {
        self.inner
            .state
            .lock()
            .active
            .get(id)
            .filter(|entry| entry.conn.id() == conn)
            .map(|entry| entry.permissions)
    }

    // ── Snapshots ────────────────────────────────────────────────

    pub fn list_pending(&self) -> Vec<PendingRequest> {
        let state = self.inner.state.lock();
        let mut list: Vec<_> = state
            .pending
            .iter()
            .map(|(id, entry)| PendingRequest {
                device_id: id.clone(),
                name: entry.name.clone(),
                requested_at_ms: unix_millis(entry.requested_at),
            })
            .collect();
        list.sort_by(|a, b| {
            a.requested_at_ms
                .cmp(&b.requested_at_ms)
                .then_with(|| a.device_id.cmp(&b.device_id))
        });
        list
    }

    pub fn list_active(&self) -> Vec<ActiveSession> {
        let state = self.inner.state.lock();
        let mut list: Vec<_> = state
            .active
            .iter()
            .map(|(id, entry)| entry.snapshot(id))
            .collect();
        list.sort_by(|a, b| a.device_id.cmp(&b.device_id));
        list
    }

    /// Number of decision signals currently tracked.
    pub fn signal_count(&self) -> usize {
        self.inner.state.lock().signals.len()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

// ── Helpers ──────────────────────────────────────────────────────

/// Best-effort notification. Returns the connection id on success.
fn notify(conn: &ConnectionHandle, message: ServerMessage) -> Option<ConnectionId> {
    match conn.send(message) {
        Ok(()) => Some(conn.id()),
        Err(e) => {
            debug!(conn = %conn.id(), "notification dropped: {e}");
            None
        }
    }
}

fn unix_millis(t: SystemTime) -> u64 {
    t.duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Capability;
    use crate::network::{Outbox, channel};

    const WAIT: Duration = Duration::from_millis(500);

    fn dev(id: &str) -> DeviceId {
        DeviceId::new(id)
    }

    fn conn() -> (ConnectionHandle, Outbox) {
        channel(1)
    }

    #[test]
    fn admit_fails_for_banned_device() {
        let reg = Registry::new();
        let (h, _o) = conn();
        assert!(reg.ban(&dev("d")));
        assert!(!reg.admit_pending(&dev("d"), "n", h));
        assert!(reg.list_pending().is_empty());
    }

    #[test]
    fn accept_requires_pending() {
        let reg = Registry::new();
        assert!(!reg.accept(&dev("ghost")));
        assert!(!reg.reject(&dev("ghost")));
    }

    #[tokio::test]
    async fn accept_yields_default_session() {
        let reg = Registry::new();
        let (h, _o) = conn();
        let conn_id = h.id();
        reg.admit_pending(&dev("d"), "laptop", h);
        assert!(reg.accept(&dev("d")));

        let session = reg.await_decision(&dev("d"), WAIT).await.unwrap();
        assert_eq!(session.permissions, Permissions::default());
        assert_eq!(session.name, "laptop");
        assert_eq!(session.connection, conn_id);
        assert!(reg.list_pending().is_empty());
        assert_eq!(reg.list_active().len(), 1);
    }

    #[tokio::test]
    async fn reject_notifies_and_yields_nothing() {
        let reg = Registry::new();
        let (h, mut o) = conn();
        let conn_id = h.id();
        reg.admit_pending(&dev("d"), "n", h);
        assert!(reg.reject(&dev("d")));

        assert_eq!(reg.await_decision(&dev("d"), WAIT).await, None);
        assert_eq!(
            reg.wait_verdict(&dev("d"), WAIT).await,
            Verdict::Rejected {
                notified: Some(conn_id)
            }
        );
        assert_eq!(
            o.try_next(),
            Some(ServerMessage::auth_result(AuthStatus::Rejected))
        );
    }

    #[tokio::test]
    async fn ban_of_pending_notifies_and_yields_nothing() {
        let reg = Registry::new();
        let (h, mut o) = conn();
        reg.admit_pending(&dev("d"), "n", h);
        assert!(reg.ban(&dev("d")));

        assert_eq!(reg.await_decision(&dev("d"), WAIT).await, None);
        assert!(reg.is_banned(&dev("d")));
        assert_eq!(
            o.try_next(),
            Some(ServerMessage::auth_result(AuthStatus::Banned))
        );
    }

    #[tokio::test]
    async fn first_decision_wins() {
        let reg = Registry::new();
        let (h, _o) = conn();
        reg.admit_pending(&dev("d"), "n", h);
        assert!(reg.accept(&dev("d")));
        assert!(!reg.reject(&dev("d")));
        assert!(!reg.accept(&dev("d")));
        assert!(reg.await_decision(&dev("d"), WAIT).await.is_some());
    }

    #[tokio::test]
    async fn timeout_leaves_state_untouched() {
        let reg = Registry::new();
        let (h, _o) = conn();
        reg.admit_pending(&dev("d"), "n", h);
        assert_eq!(
            reg.wait_verdict(&dev("d"), Duration::from_millis(20)).await,
            Verdict::TimedOut
        );
        assert_eq!(reg.list_pending().len(), 1);
        assert!(reg.accept(&dev("d")));
    }

    #[test]
    fn wrong_code_is_rejected_and_regeneration_invalidates_old_code() {
        let reg = Registry::new();
        let old = reg.current_code();
        assert!(reg.check_code(Some(&old)));
        assert!(!reg.check_code(Some("not-a-code")));
        assert!(!reg.check_code(None));

        // Regenerate until the value actually changes (1 in 10^6 collisions).
        let mut new = reg.regenerate_code();
        while new == old {
            new = reg.regenerate_code();
        }
        assert!(!reg.check_code(Some(&old)));
        assert!(reg.check_code(Some(&new)));
        assert_eq!(reg.current_code(), new);
    }

    #[test]
    fn regeneration_does_not_touch_active_permissions() {
        let reg = Registry::new();
        let (h, _o) = conn();
        reg.admit_pending(&dev("d"), "n", h);
        reg.accept(&dev("d"));
        reg.update_permissions(
            &dev("d"),
            &PermissionPatch::default().with(Capability::ControlKeyboard, true),
        );
        let before = reg.list_active();
        reg.regenerate_code();
        assert_eq!(reg.list_active(), before);
    }

    #[test]
    fn update_permissions_merges_and_notifies() {
        let reg = Registry::new();
        let (h, mut o) = conn();
        assert!(!reg.update_permissions(&dev("d"), &PermissionPatch::default()));

        reg.admit_pending(&dev("d"), "n", h);
        reg.accept(&dev("d"));
        let patch = PermissionPatch::default().with(Capability::ControlMouse, true);
        assert!(reg.update_permissions(&dev("d"), &patch));

        let expected = Permissions {
            control_mouse: true,
            ..Permissions::default()
        };
        assert_eq!(reg.list_active()[0].permissions, expected);
        assert_eq!(
            o.try_next(),
            Some(ServerMessage::PermissionUpdate {
                permissions: expected
            })
        );
    }

    #[test]
    fn update_permissions_survives_dead_connection() {
        let reg = Registry::new();
        let (h, o) = conn();
        reg.admit_pending(&dev("d"), "n", h);
        reg.accept(&dev("d"));
        drop(o);
        assert!(reg.update_permissions(
            &dev("d"),
            &PermissionPatch::default().with(Capability::ViewScreen, false)
        ));
        assert!(!reg.list_active()[0].permissions.view_screen);
    }

    #[test]
    fn ban_force_detaches_active_session() {
        let reg = Registry::new();
        let (h, mut o) = conn();
        let watcher = h.clone();
        reg.admit_pending(&dev("d"), "n", h);
        reg.accept(&dev("d"));

        assert!(reg.ban(&dev("d")));
        assert!(reg.list_active().is_empty());
        assert!(watcher.is_closed());
        assert_eq!(
            o.try_next(),
            Some(ServerMessage::auth_result(AuthStatus::Banned))
        );
        assert!(reg.ban(&dev("d")), "ban is always successful");
    }

    #[test]
    fn accept_displaces_session_on_other_connection() {
        let reg = Registry::new();
        let (old, mut old_out) = conn();
        let (new, _new_out) = conn();
        let (old_watch, new_id) = (old.clone(), new.id());
        reg.admit_pending(&dev("d"), "n", old);
        reg.accept(&dev("d"));

        reg.admit_pending(&dev("d"), "n", new);
        assert!(reg.accept(&dev("d")));

        assert!(old_watch.is_closed());
        assert_eq!(
            old_out.try_next(),
            Some(ServerMessage::auth_result(AuthStatus::Rejected))
        );
        let active = reg.list_active();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].connection, new_id);
        assert_eq!(reg.session_for(old_watch.id()), None);
    }

    #[test]
    fn reaccept_on_same_connection_keeps_it_open() {
        let reg = Registry::new();
        let (h, mut o) = conn();
        let watcher = h.clone();
        reg.admit_pending(&dev("d"), "n", h.clone());
        reg.accept(&dev("d"));
        reg.admit_pending(&dev("d"), "n", h);
        assert!(reg.accept(&dev("d")));

        assert!(!watcher.is_closed());
        assert_eq!(o.try_next(), None);
    }

    #[test]
    fn detach_is_idempotent() {
        let reg = Registry::new();
        let (h, _o) = conn();
        reg.admit_pending(&dev("d"), "n", h);
        reg.accept(&dev("d"));
        reg.detach(&dev("d"));
        reg.detach(&dev("d"));
        assert!(reg.list_active().is_empty());
    }

    #[tokio::test]
    async fn resubmission_keeps_one_signal_and_rebinds_connection() {
        let reg = Registry::new();
        let (first, _o1) = conn();
        let (second, _o2) = conn();
        let second_id = second.id();

        reg.admit_pending(&dev("d"), "n", first);
        let early = {
            let reg = reg.clone();
            tokio::spawn(async move { reg.await_decision(&dev("d"), WAIT).await })
        };
        tokio::task::yield_now().await;
        reg.admit_pending(&dev("d"), "n", second);
        assert_eq!(reg.signal_count(), 1);
        assert_eq!(reg.list_pending().len(), 1);

        reg.accept(&dev("d"));
        let session = early.await.unwrap().unwrap();
        assert_eq!(session.connection, second_id);
    }

    #[tokio::test]
    async fn new_episode_after_rejection_is_rearmed() {
        let reg = Registry::new();
        let (h, _o) = conn();
        reg.admit_pending(&dev("d"), "n", h.clone());
        reg.reject(&dev("d"));

        reg.admit_pending(&dev("d"), "n", h);
        assert_eq!(
            reg.wait_verdict(&dev("d"), Duration::from_millis(20)).await,
            Verdict::TimedOut
        );
        reg.accept(&dev("d"));
        assert!(reg.await_decision(&dev("d"), WAIT).await.is_some());
    }

    #[test]
    fn release_ignores_entries_rebound_to_newer_connection() {
        let reg = Registry::new();
        let (old, _o1) = conn();
        let (new, _o2) = conn();
        let old_id = old.id();
        reg.admit_pending(&dev("d"), "n", old);
        reg.admit_pending(&dev("d"), "n", new);
        reg.accept(&dev("d"));

        reg.release(old_id);
        assert_eq!(reg.list_active().len(), 1);
    }

    #[test]
    fn release_removes_owned_entries_and_signals() {
        let reg = Registry::new();
        let (a, _oa) = conn();
        let (b, _ob) = conn();
        let (a_id, b_id) = (a.id(), b.id());
        reg.admit_pending(&dev("a"), "n", a);
        reg.admit_pending(&dev("b"), "n", b);
        reg.accept(&dev("b"));
        assert_eq!(reg.signal_count(), 2);

        reg.release(a_id);
        assert!(reg.list_pending().is_empty());
        assert_eq!(reg.signal_count(), 1);

        reg.release(b_id);
        assert!(reg.list_active().is_empty());
        assert_eq!(reg.signal_count(), 0);
    }

    #[test]
    fn session_lookup_by_connection() {
        let reg = Registry::new();
        let (h, _o) = conn();
        let id = h.id();
        let (other, _oo) = conn();
        reg.admit_pending(&dev("d"), "n", h);
        assert!(reg.session_for(id).is_none());
        reg.accept(&dev("d"));

        assert_eq!(reg.session_for(id), Some((dev("d"), Permissions::default())));
        assert_eq!(reg.session_for(other.id()), None);
        assert_eq!(reg.permissions_for(&dev("d"), id), Some(Permissions::default()));
        assert_eq!(reg.permissions_for(&dev("d"), other.id()), None);
    }

    #[test]
    fn snapshots_serialize_without_connection() {
        let reg = Registry::new();
        let (h, _o) = conn();
        reg.admit_pending(&dev("d"), "laptop", h);
        let pending = serde_json::to_value(reg.list_pending()).unwrap();
        assert_eq!(pending[0]["device_id"], "d");
        assert_eq!(pending[0]["name"], "laptop");
        assert!(pending[0]["requested_at_ms"].as_u64().unwrap() > 0);

        reg.accept(&dev("d"));
        let active = serde_json::to_value(reg.list_active()).unwrap();
        assert_eq!(active[0]["permissions"]["view_screen"], true);
        assert!(active[0].get("connection").is_none());
    }
}
