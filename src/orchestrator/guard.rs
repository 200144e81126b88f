use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Counter identifying the current call; bumped on every call start and end
#[derive(Debug, Clone, Default)]
pub struct SessionGeneration(Arc<AtomicU64>);

impl SessionGeneration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move to a new generation, invalidating every outstanding guard
    pub fn advance(&self) -> u64 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn current(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }

    pub fn guard(&self) -> SessionGuard {
        SessionGuard {
            generation: self.clone(),
            issued: self.current(),
        }
    }
}

/// Captured generation for one in-flight turn
#[derive(Debug, Clone)]
pub struct SessionGuard {
    generation: SessionGeneration,
    issued: u64,
}

impl SessionGuard {
    /// A guard tied to no call; always current
    pub fn detached() -> Self {
        SessionGeneration::new().guard()
    }

    pub fn issued(&self) -> u64 {
        self.issued
    }

    pub fn is_current(&self) -> bool {
        self.generation.current() == self.issued
    }
}
