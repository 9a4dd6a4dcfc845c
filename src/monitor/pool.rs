//! One monitor session per resolver

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::capture::traffic::Resolver;
use crate::config::BridgeConfig;
use crate::monitor::session::{MonitorSession, SendOutcome};

pub struct MonitorPool {
    config: BridgeConfig,
    sessions: Mutex<HashMap<Resolver, Arc<MonitorSession>>>,
}

impl MonitorPool {
    pub fn new(config: BridgeConfig) -> MonitorPool {
        MonitorPool {
            config,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// The session for `resolver`, created on first request. The monitor
    /// process itself is only started by the first send.
    pub fn session(&self, resolver: Resolver) -> Arc<MonitorSession> {
        let mut sessions = self.sessions.lock();
        sessions
            .entry(resolver)
            .or_insert_with(|| Arc::new(MonitorSession::new(resolver.as_str(), self.config.clone())))
            .clone()
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.lock().is_empty()
    }

    /// Snapshot of the sessions in resolver order, taken so the pool lock
    /// is not held while talking to monitors
    fn snapshot(&self) -> Vec<(Resolver, Arc<MonitorSession>)> {
        let sessions = self.sessions.lock();
        let mut all: Vec<_> = sessions.iter().map(|(r, s)| (*r, s.clone())).collect();
        all.sort_by_key(|(r, _)| *r);
        all
    }

    pub fn end_all_sessions(&self) -> Vec<(Resolver, SendOutcome)> {
        self.snapshot()
            .into_iter()
            .map(|(resolver, session)| (resolver, session.end_session()))
            .collect()
    }

    pub fn terminate_all(&self) {
        for (_, session) in self.snapshot() {
            session.terminate();
        }
    }
}
