//! A live session: the plain-data [`SessionSnapshot`] plus the owned Graph
//! client handle bound to this user.

use outlook_core::domain::SessionSnapshot;
use outlook_graph::GraphMailQueryEngine;

/// Composes session bookkeeping with a per-user Graph query engine. Kept
/// separate from `SessionSnapshot` so that crates which only need to
/// observe session state (e.g. `outlook-dispatcher`'s logging) don't pull
/// in `outlook-graph`.
pub struct Session {
    snapshot: SessionSnapshot,
    graph_engine: GraphMailQueryEngine,
}

impl Session {
    pub fn new(snapshot: SessionSnapshot, graph_base_url: &str) -> Self {
        let graph_engine = GraphMailQueryEngine::new(snapshot.user_email().as_str()).with_base_url(graph_base_url);
        Self { snapshot, graph_engine }
    }

    pub fn snapshot(&self) -> &SessionSnapshot {
        &self.snapshot
    }

    pub fn snapshot_mut(&mut self) -> &mut SessionSnapshot {
        &mut self.snapshot
    }

    pub fn graph_engine(&self) -> &GraphMailQueryEngine {
        &self.graph_engine
    }

    pub fn access_token(&self) -> &str {
        self.snapshot.access_token()
    }
}
