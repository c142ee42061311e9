//! Test heap backing reducer views
use forkrace_engine::{Address, ReducerOps, ViewAllocator};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

const VIEW_BASE: Address = 0x7000_0000;

#[derive(Debug, Default)]
struct HeapState {
    next: Address,
    ints: HashMap<Address, i64>,
    strings: HashMap<Address, String>,
    live: HashMap<Address, usize>,
    allocations: usize,
    fail_after: Option<usize>,
}

/// Shared handle to a simulated memory with a bump view allocator
#[derive(Debug, Clone)]
pub struct TestHeap {
    state: Arc<Mutex<HeapState>>,
}

impl TestHeap {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(HeapState {
                next: VIEW_BASE,
                ..HeapState::default()
            })),
        }
    }

    /// Refuse every allocation after the first `count`
    pub fn fail_after(&self, count: usize) {
        self.state.lock().fail_after = Some(count);
    }

    pub fn int(&self, addr: Address) -> i64 {
        self.state.lock().ints.get(&addr).copied().unwrap_or(0)
    }

    pub fn set_int(&self, addr: Address, value: i64) {
        self.state.lock().ints.insert(addr, value);
    }

    pub fn add_int(&self, addr: Address, delta: i64) {
        *self.state.lock().ints.entry(addr).or_insert(0) += delta;
    }

    pub fn string(&self, addr: Address) -> String {
        self.state.lock().strings.get(&addr).cloned().unwrap_or_default()
    }

    pub fn set_string(&self, addr: Address, value: &str) {
        self.state.lock().strings.insert(addr, value.to_string());
    }

    pub fn push_str(&self, addr: Address, value: &str) {
        self.state
            .lock()
            .strings
            .entry(addr)
            .or_default()
            .push_str(value);
    }

    /// Views allocated and not yet released
    pub fn live_views(&self) -> usize {
        self.state.lock().live.len()
    }

    /// Views ever allocated
    pub fn allocations(&self) -> usize {
        self.state.lock().allocations
    }
}

impl ViewAllocator for TestHeap {
    fn allocate(&mut self, size: usize) -> Option<Address> {
        let mut state = self.state.lock();
        if let Some(limit) = state.fail_after {
            if state.allocations >= limit {
                return None;
            }
        }
        let addr = state.next;
        state.next += ((size as Address) + 15) & !15;
        state.live.insert(addr, size);
        state.allocations += 1;
        Some(addr)
    }

    fn release(&mut self, addr: Address, _size: usize) {
        let mut state = self.state.lock();
        state.live.remove(&addr);
        state.ints.remove(&addr);
        state.strings.remove(&addr);
    }
}

/// Integer sum: identity 0, reduce left += right
#[derive(Debug, Clone)]
pub struct SumOps {
    pub heap: TestHeap,
}

impl ReducerOps for SumOps {
    fn identity(&self, view: Address, _size: usize) {
        self.heap.set_int(view, 0);
    }

    fn reduce(&self, left: Address, right: Address, _size: usize) {
        let right = self.heap.int(right);
        self.heap.add_int(left, right);
    }
}

/// String concatenation: associative but not commutative
#[derive(Debug, Clone)]
pub struct ConcatOps {
    pub heap: TestHeap,
}

impl ReducerOps for ConcatOps {
    fn identity(&self, view: Address, _size: usize) {
        self.heap.set_string(view, "");
    }

    fn reduce(&self, left: Address, right: Address, _size: usize) {
        let right = self.heap.string(right);
        self.heap.push_str(left, &right);
    }
}

/// Integer subtraction: neither associative nor commutative
#[derive(Debug, Clone)]
pub struct SubtractOps {
    pub heap: TestHeap,
}

impl ReducerOps for SubtractOps {
    fn identity(&self, view: Address, _size: usize) {
        self.heap.set_int(view, 0);
    }

    fn reduce(&self, left: Address, right: Address, _size: usize) {
        let right = self.heap.int(right);
        self.heap.add_int(left, -right);
    }
}
