//! Shared test helpers: an in-memory scripted gateway and record builders

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use chrono::Utc;
use confess_client::{ConfessionGateway, Subscription};
use confess_common::{ChangeEvent, Confession, Error, NewConfession, Result};
use tokio::sync::{mpsc, Notify};
use uuid::Uuid;

pub fn sample(target: &str, message: &str) -> Confession {
    let id = Uuid::new_v4();
    Confession {
        id,
        target_name: target.to_string(),
        message: message.to_string(),
        song_url: None,
        song_embed_id: None,
        is_approved: true,
        is_verified: false,
        dev_code: None,
        created_at: Utc::now(),
        unique_slug: format!("{}-{}", target.to_lowercase(), &id.simple().to_string()[..8]),
        views: Some(0),
        like_count: Some(0),
        user_has_liked: None,
    }
}

pub fn new_confession(target: &str, message: &str) -> NewConfession {
    NewConfession {
        target_name: target.to_string(),
        message: message.to_string(),
        song_url: None,
        song_embed_id: None,
        is_approved: true,
        is_verified: false,
        dev_code: None,
    }
}

/// Holds `set_like` for one record until released
pub struct LikeGate {
    pub id: Uuid,
    pub entered: Notify,
    pub release: Notify,
}

/// Gateway double backed by a Vec, with a failure switch and a call log
#[derive(Default)]
pub struct ScriptedGateway {
    records: Mutex<Vec<Confession>>,
    fail: AtomicBool,
    gate: Option<LikeGate>,
    calls: Mutex<Vec<String>>,
    feeds: Mutex<Vec<mpsc::Sender<ChangeEvent>>>,
}

impl ScriptedGateway {
    pub fn with_records(records: Vec<Confession>) -> Self {
        Self {
            records: Mutex::new(records),
            ..Self::default()
        }
    }

    /// Block `set_like` calls for `id` until `gate().release` is notified
    pub fn gated(records: Vec<Confession>, id: Uuid) -> Self {
        Self {
            records: Mutex::new(records),
            gate: Some(LikeGate {
                id,
                entered: Notify::new(),
                release: Notify::new(),
            }),
            ..Self::default()
        }
    }

    pub fn gate(&self) -> &LikeGate {
        self.gate.as_ref().expect("gateway was built with a gate")
    }

    pub fn set_failing(&self, failing: bool) {
        self.fail.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn record(&self, id: Uuid) -> Option<Confession> {
        self.records.lock().unwrap().iter().find(|c| c.id == id).cloned()
    }

    /// Deliver an event to every open subscription
    pub fn push(&self, event: ChangeEvent) {
        for tx in self.feeds.lock().unwrap().iter() {
            let _ = tx.try_send(event.clone());
        }
    }

    fn log(&self, call: String) -> Result<()> {
        self.calls.lock().unwrap().push(call);
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::Remote("scripted failure".to_string()));
        }
        Ok(())
    }
}

impl ConfessionGateway for ScriptedGateway {
    async fn create(&self, record: NewConfession) -> Result<Confession> {
        self.log(format!("create {}", record.target_name))?;
        let mut confession = sample(&record.target_name, &record.message);
        confession.song_url = record.song_url;
        confession.song_embed_id = record.song_embed_id;
        confession.is_approved = record.is_approved;
        confession.is_verified = record.is_verified;
        confession.dev_code = record.dev_code;
        self.records.lock().unwrap().insert(0, confession.clone());
        Ok(confession)
    }

    async fn list_approved(&self) -> Result<Vec<Confession>> {
        self.log("list_approved".to_string())?;
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.is_approved)
            .cloned()
            .collect())
    }

    async fn list_all(&self) -> Result<Vec<Confession>> {
        self.log("list_all".to_string())?;
        Ok(self.records.lock().unwrap().clone())
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Confession>> {
        self.log(format!("get_by_slug {}", slug))?;
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.is_approved && c.unique_slug == slug)
            .cloned())
    }

    async fn increment_view(&self, id: Uuid) -> Result<()> {
        self.log(format!("increment_view {}", id))?;
        let mut records = self.records.lock().unwrap();
        let record = records
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        record.views = Some(record.views.unwrap_or(0) + 1);
        Ok(())
    }

    async fn set_like(&self, id: Uuid, liked: bool) -> Result<()> {
        if let Some(gate) = self.gate.as_ref().filter(|g| g.id == id) {
            gate.entered.notify_one();
            gate.release.notified().await;
        }

        self.log(format!("set_like {} {}", id, liked))?;
        let mut records = self.records.lock().unwrap();
        let record = records
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        let count = record.like_count.unwrap_or(0);
        record.like_count = Some(if liked { count + 1 } else { (count - 1).max(0) });
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        self.log(format!("delete {}", id))?;
        self.records.lock().unwrap().retain(|c| c.id != id);
        Ok(())
    }

    fn subscribe(&self) -> Subscription {
        let (tx, subscription) = Subscription::channel();
        self.feeds.lock().unwrap().push(tx);
        subscription
    }
}
