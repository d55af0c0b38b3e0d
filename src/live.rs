//! Live data binder: keeps in-memory snapshots of the three store
//! collections current via Postgres LISTEN/NOTIFY and republishes them to
//! registered observers. Delivery replaces the previous snapshot wholesale;
//! ordering and reconnection are the store's problem.

use sqlx::postgres::PgListener;
use sqlx::PgPool;

use crate::db;
use crate::models::{AttendanceRecord, InternProfile, MeetingNote};

pub const ATTENDANCE_CHANNEL: &str = "attendance_changed";
pub const MOM_CHANNEL: &str = "mom_changed";
pub const ROSTER_CHANNEL: &str = "roster_changed";

const CHANNELS: [&str; 3] = [ATTENDANCE_CHANNEL, MOM_CHANNEL, ROSTER_CHANNEL];

#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub attendance: Vec<AttendanceRecord>,
    pub notes: Vec<MeetingNote>,
    pub roster: Vec<InternProfile>,
}

#[derive(Debug, Clone)]
pub enum CollectionUpdate {
    Attendance(Vec<AttendanceRecord>),
    Notes(Vec<MeetingNote>),
    Roster(Vec<InternProfile>),
}

/// Unsubscribe handle returned by [`LiveBinder::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObserverId(u64);

type Observer = Box<dyn FnMut(&Snapshot)>;

pub struct LiveBinder {
    pool: PgPool,
    roster_role: String,
    snapshot: Snapshot,
    observers: Vec<(ObserverId, Observer)>,
    next_id: u64,
}

impl LiveBinder {
    pub fn new(pool: PgPool, roster_role: &str) -> Self {
        LiveBinder {
            pool,
            roster_role: roster_role.to_string(),
            snapshot: Snapshot::default(),
            observers: Vec::new(),
            next_id: 0,
        }
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn subscribe(&mut self, observer: impl FnMut(&Snapshot) + 'static) -> ObserverId {
        let id = ObserverId(self.next_id);
        self.next_id += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    pub fn unsubscribe(&mut self, id: ObserverId) {
        self.observers.retain(|(observer_id, _)| *observer_id != id);
    }

    /// Replaces one collection wholesale and notifies every observer with
    /// the combined snapshot, synchronously on the calling task.
    pub fn deliver(&mut self, update: CollectionUpdate) {
        match update {
            CollectionUpdate::Attendance(records) => self.snapshot.attendance = records,
            CollectionUpdate::Notes(notes) => self.snapshot.notes = notes,
            CollectionUpdate::Roster(roster) => self.snapshot.roster = roster,
        }
        for (_, observer) in &mut self.observers {
            observer(&self.snapshot);
        }
    }

    /// Refetches the collection behind `channel`. A fetch failure is logged
    /// and delivered as an empty collection; there is no retry.
    async fn refresh(&mut self, channel: &str) {
        let update = match channel {
            ATTENDANCE_CHANNEL => CollectionUpdate::Attendance(
                db::fetch_attendance(&self.pool).await.unwrap_or_else(|err| {
                    log::error!("attendance fetch failed: {err:#}");
                    Vec::new()
                }),
            ),
            MOM_CHANNEL => CollectionUpdate::Notes(
                db::fetch_notes(&self.pool).await.unwrap_or_else(|err| {
                    log::error!("meeting note fetch failed: {err:#}");
                    Vec::new()
                }),
            ),
            ROSTER_CHANNEL => CollectionUpdate::Roster(
                db::fetch_roster(&self.pool, &self.roster_role)
                    .await
                    .unwrap_or_else(|err| {
                        log::error!("roster fetch failed: {err:#}");
                        Vec::new()
                    }),
            ),
            other => {
                log::warn!("notification on unknown channel {other:?}");
                return;
            }
        };
        self.deliver(update);
    }

    /// Loads the initial snapshots, then reprocesses one notification at a
    /// time until Ctrl-C.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        let mut listener = PgListener::connect_with(&self.pool).await?;
        listener.listen_all(CHANNELS).await?;

        for channel in CHANNELS {
            self.refresh(channel).await;
        }

        loop {
            tokio::select! {
                notification = listener.recv() => {
                    let notification = notification?;
                    self.refresh(notification.channel()).await;
                }
                _ = tokio::signal::ctrl_c() => {
                    log::info!("shutting down live view");
                    return Ok(());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn record(day: u32, uid: &str) -> AttendanceRecord {
        AttendanceRecord {
            id: format!("{uid}-{day}"),
            date: NaiveDate::from_ymd_opt(2025, 3, day).unwrap(),
            user_id: uid.to_string(),
            present: true,
        }
    }

    fn binder() -> LiveBinder {
        let pool = PgPool::connect_lazy("postgres://localhost/unused").unwrap();
        LiveBinder::new(pool, db::ROSTER_ROLE)
    }

    #[tokio::test]
    async fn delivery_replaces_the_snapshot_wholesale() {
        let mut binder = binder();
        binder.deliver(CollectionUpdate::Attendance(vec![
            record(3, "alice"),
            record(4, "alice"),
        ]));
        assert_eq!(binder.snapshot().attendance.len(), 2);

        binder.deliver(CollectionUpdate::Attendance(vec![record(5, "bob")]));
        let snapshot = binder.snapshot();
        assert_eq!(snapshot.attendance.len(), 1);
        assert_eq!(snapshot.attendance[0].user_id, "bob");
    }

    #[tokio::test]
    async fn collections_update_independently() {
        let mut binder = binder();
        binder.deliver(CollectionUpdate::Attendance(vec![record(3, "alice")]));
        binder.deliver(CollectionUpdate::Notes(vec![MeetingNote {
            date: NaiveDate::from_ymd_opt(2025, 3, 3).unwrap(),
            text: "kickoff".to_string(),
        }]));
        let snapshot = binder.snapshot();
        assert_eq!(snapshot.attendance.len(), 1);
        assert_eq!(snapshot.notes.len(), 1);
    }

    #[tokio::test]
    async fn observers_see_every_delivery_until_unsubscribed() {
        let mut binder = binder();
        let seen = Rc::new(RefCell::new(0u32));

        let counter = Rc::clone(&seen);
        let id = binder.subscribe(move |_| *counter.borrow_mut() += 1);

        binder.deliver(CollectionUpdate::Attendance(vec![record(3, "alice")]));
        binder.deliver(CollectionUpdate::Roster(Vec::new()));
        assert_eq!(*seen.borrow(), 2);

        binder.unsubscribe(id);
        binder.deliver(CollectionUpdate::Attendance(Vec::new()));
        assert_eq!(*seen.borrow(), 2);
    }

    #[tokio::test]
    async fn observer_receives_the_combined_snapshot() {
        let mut binder = binder();
        binder.deliver(CollectionUpdate::Attendance(vec![record(3, "alice")]));

        let seen_attendance = Rc::new(RefCell::new(0usize));
        let probe = Rc::clone(&seen_attendance);
        binder.subscribe(move |snapshot| {
            *probe.borrow_mut() = snapshot.attendance.len();
        });

        // A roster delivery still exposes the previously delivered
        // attendance snapshot.
        binder.deliver(CollectionUpdate::Roster(Vec::new()));
        assert_eq!(*seen_attendance.borrow(), 1);
    }
}
