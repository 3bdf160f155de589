use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use docchat_core::Session;
use tokio::sync::Mutex;
use uuid::Uuid;

pub(crate) type SharedSession = Arc<Mutex<Session>>;

/// Live sessions keyed by id. The map lock is never held across an await;
/// turns on one session are serialized by its own mutex.
#[derive(Default)]
pub(crate) struct SessionRegistry {
    sessions: RwLock<HashMap<Uuid, SharedSession>>,
}

impl SessionRegistry {
    pub fn insert(&self, session: Session) -> Uuid {
        let id = session.id();
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, Arc::new(Mutex::new(session)));
        id
    }

    pub fn get(&self, id: &Uuid) -> Option<SharedSession> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    pub fn remove(&self, id: &Uuid) -> Option<SharedSession> {
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)
    }

    pub fn len(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
