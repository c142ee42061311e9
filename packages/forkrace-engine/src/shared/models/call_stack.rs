//! Persistent call stack
//!
//! Every recorded access keeps a snapshot of the call stack. Frames are shared
//! between snapshots through `Arc`, so pushing, popping and snapshotting are all
//! O(1) and a snapshot never changes after it has been taken.

use super::ids::InstrId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// How a frame was entered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CallKind {
    /// Ordinary call
    Call,
    /// Spawned call
    Spawn,
    /// Parallel loop body
    Loop,
}

impl CallKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallKind::Call => "Call",
            CallKind::Spawn => "Spawn",
            CallKind::Loop => "Parfor",
        }
    }
}

/// One entry of the call stack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallSite {
    pub kind: CallKind,
    pub id: InstrId,
}

impl CallSite {
    pub fn new(kind: CallKind, id: InstrId) -> Self {
        Self { kind, id }
    }
}

#[derive(Debug, PartialEq, Eq)]
struct CallNode {
    site: CallSite,
    parent: Option<Arc<CallNode>>,
}

/// Immutable, structurally shared call stack
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallStack {
    head: Option<Arc<CallNode>>,
    depth: usize,
}

impl CallStack {
    /// Empty call stack
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a call site
    pub fn push(&mut self, site: CallSite) {
        let node = CallNode {
            site,
            parent: self.head.take(),
        };
        self.head = Some(Arc::new(node));
        self.depth += 1;
    }

    /// Pop the innermost call site
    pub fn pop(&mut self) -> Option<CallSite> {
        let node = self.head.take()?;
        let site = node.site;
        self.head = node.parent.clone();
        self.depth -= 1;
        Some(site)
    }

    /// Innermost call site
    pub fn top(&self) -> Option<&CallSite> {
        self.head.as_ref().map(|node| &node.site)
    }

    /// Check that the innermost entry is `site`
    pub fn tail_matches(&self, site: &CallSite) -> bool {
        self.top() == Some(site)
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.depth == 0
    }

    /// Iterate from the innermost call site outwards
    pub fn iter(&self) -> CallStackIter<'_> {
        CallStackIter {
            next: self.head.as_deref(),
        }
    }

    /// Call sites from innermost to outermost
    pub fn to_vec(&self) -> Vec<CallSite> {
        self.iter().copied().collect()
    }
}

/// Iterator over a call stack, innermost first
pub struct CallStackIter<'a> {
    next: Option<&'a CallNode>,
}

impl<'a> Iterator for CallStackIter<'a> {
    type Item = &'a CallSite;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.next?;
        self.next = node.parent.as_deref();
        Some(&node.site)
    }
}

impl fmt::Display for CallStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sites: Vec<String> = self
            .iter()
            .map(|site| format!("{} {}", site.kind.as_str(), site.id))
            .collect();
        write!(f, "[{}]", sites.join(" <- "))
    }
}
