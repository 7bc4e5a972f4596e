//! Registry of peers waiting for their interlocutor.
//!
//! A name is present exactly while its handler is parked waiting. Each entry
//! also holds the channel ends reserved for the interlocutor; adopting an
//! entry takes those ends, so at most one peer can ever pair with it.
//!
//! Lookups share a read lock. Insert, adopt and remove take the write lock.
//! No lock is ever held across an await.

use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::{PoisonError, RwLock},
};

use crate::session::PeerEnds;

/// Identity of a connected peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    /// Remote socket address
    pub address: SocketAddr,
    /// Registered name
    pub name: String,
    /// Name of the peer it wants to talk to
    pub interlocutor: String,
}

/// What [`WaitingPool::remove`] found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    /// No entry under that name
    Absent,
    /// Entry was still waiting; its reserved ends were dropped
    Waiting,
    /// Entry had already been adopted by its interlocutor
    Adopted,
}

#[derive(Debug)]
struct WaitingEntry {
    info: SessionInfo,
    ends: Option<PeerEnds>,
}

/// Concurrency-safe name -> waiting session map.
#[derive(Debug, Default)]
pub struct WaitingPool {
    sessions: RwLock<HashMap<String, WaitingEntry>>,
}

impl WaitingPool {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Identity of the session waiting under `name`.
    pub fn lookup(&self, name: &str) -> Option<SessionInfo> {
        let sessions = self.sessions.read().unwrap_or_else(PoisonError::into_inner);
        sessions.get(name).map(|entry| entry.info.clone())
    }

    /// Whether `name` is currently waiting.
    pub fn contains(&self, name: &str) -> bool {
        let sessions = self.sessions.read().unwrap_or_else(PoisonError::into_inner);
        sessions.contains_key(name)
    }

    /// Park a session, reserving `ends` for its interlocutor.
    ///
    /// Check and insert happen under one write lock, so two peers racing on
    /// the same name cannot both get in.
    ///
    /// # Errors
    ///
    /// Returns the rejected ends if `info.name` is already waiting.
    pub fn insert(&self, info: SessionInfo, ends: PeerEnds) -> Result<(), PeerEnds> {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        if sessions.contains_key(&info.name) {
            return Err(ends);
        }
        sessions.insert(info.name.clone(), WaitingEntry { info, ends: Some(ends) });
        Ok(())
    }

    /// Take the ends reserved by `interlocutor`, if it is waiting for `name`.
    ///
    /// Returns `None` when nobody is waiting under `interlocutor`, when it is
    /// waiting for someone else, or when another peer already adopted it. The
    /// entry itself stays until its owner removes it.
    pub fn adopt(&self, interlocutor: &str, name: &str) -> Option<PeerEnds> {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        let entry = sessions.get_mut(interlocutor)?;
        if entry.info.interlocutor != name {
            return None;
        }
        entry.ends.take()
    }

    /// Remove `name`. No-op if absent.
    pub fn remove(&self, name: &str) -> Removal {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        match sessions.remove(name) {
            None => Removal::Absent,
            Some(WaitingEntry { ends: Some(_), .. }) => Removal::Waiting,
            Some(WaitingEntry { ends: None, .. }) => Removal::Adopted,
        }
    }

    /// Number of waiting sessions.
    pub fn len(&self) -> usize {
        self.sessions.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether nobody is waiting.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use std::{net::Ipv4Addr, sync::Arc};

    use super::*;
    use crate::session::{CHANNEL_CAPACITY, channel_pair};

    fn info(name: &str, interlocutor: &str) -> SessionInfo {
        SessionInfo {
            address: SocketAddr::from((Ipv4Addr::LOCALHOST, 4000)),
            name: name.into(),
            interlocutor: interlocutor.into(),
        }
    }

    fn ends() -> PeerEnds {
        channel_pair(CHANNEL_CAPACITY).1
    }

    #[test]
    fn new_pool_is_empty() {
        let pool = WaitingPool::new();
        assert!(pool.is_empty());
        assert_eq!(pool.lookup("alice"), None);
    }

    #[test]
    fn insert_then_lookup() {
        let pool = WaitingPool::new();
        pool.insert(info("alice", "bob"), ends()).unwrap();

        assert!(pool.contains("alice"));
        assert_eq!(pool.lookup("alice"), Some(info("alice", "bob")));
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn insert_rejects_duplicate_name() {
        let pool = WaitingPool::new();
        pool.insert(info("alice", "bob"), ends()).unwrap();

        assert!(pool.insert(info("alice", "carol"), ends()).is_err());
        assert_eq!(pool.lookup("alice").unwrap().interlocutor, "bob");
    }

    #[test]
    fn adopt_requires_matching_interlocutor() {
        let pool = WaitingPool::new();
        pool.insert(info("alice", "bob"), ends()).unwrap();

        assert!(pool.adopt("alice", "carol").is_none());
        assert!(pool.adopt("nobody", "bob").is_none());
        assert!(pool.adopt("alice", "bob").is_some());
    }

    #[test]
    fn adopt_succeeds_once() {
        let pool = WaitingPool::new();
        pool.insert(info("alice", "bob"), ends()).unwrap();

        assert!(pool.adopt("alice", "bob").is_some());
        assert!(pool.adopt("alice", "bob").is_none());
        // Entry stays until its owner removes it
        assert!(pool.contains("alice"));
    }

    #[test]
    fn remove_reports_state() {
        let pool = WaitingPool::new();
        pool.insert(info("alice", "bob"), ends()).unwrap();
        pool.insert(info("carol", "dave"), ends()).unwrap();
        pool.adopt("carol", "dave").unwrap();

        assert_eq!(pool.remove("alice"), Removal::Waiting);
        assert_eq!(pool.remove("carol"), Removal::Adopted);
        assert_eq!(pool.remove("alice"), Removal::Absent);
        assert!(pool.is_empty());
    }

    #[test]
    fn concurrent_inserts_admit_one() {
        let pool = Arc::new(WaitingPool::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let pool = Arc::clone(&pool);
                std::thread::spawn(move || pool.insert(info("alice", "bob"), ends()).is_ok())
            })
            .collect();

        let admitted = handles.into_iter().map(|h| h.join().unwrap()).filter(|ok| *ok).count();
        assert_eq!(admitted, 1);
    }

    #[test]
    fn concurrent_adopts_admit_one() {
        let pool = Arc::new(WaitingPool::new());
        pool.insert(info("alice", "bob"), ends()).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let pool = Arc::clone(&pool);
                std::thread::spawn(move || pool.adopt("alice", "bob").is_some())
            })
            .collect();

        let adopted = handles.into_iter().map(|h| h.join().unwrap()).filter(|ok| *ok).count();
        assert_eq!(adopted, 1);
    }
}
