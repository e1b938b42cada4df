// Generation counter for invalidating in-flight work
use std::fmt::Display;

use tokio_util::sync::CancellationToken;

/// Monotonic id of one opened media.
///
/// Every asynchronous result is tagged with the generation that started it
/// and discarded when that generation is no longer current.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    pub fn value(&self) -> u64 {
        self.0
    }

    fn next(self) -> Self {
        Generation(self.0.wrapping_add(1))
    }
}

impl Display for Generation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "gen#{}", self.0)
    }
}

/// Current generation together with the token cancelling its work.
#[derive(Debug, Default)]
pub struct GenerationScope {
    generation: Generation,
    token: CancellationToken,
}

impl GenerationScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Generation {
        self.generation
    }

    pub fn is_current(&self, generation: Generation) -> bool {
        self.generation == generation
    }

    /// Token for work belonging to the current generation.
    pub fn token(&self) -> CancellationToken {
        self.token.child_token()
    }

    /// Cancel all work of the current generation and start the next one.
    pub fn advance(&mut self) -> Generation {
        self.token.cancel();
        self.token = CancellationToken::new();
        self.generation = self.generation.next();
        self.generation
    }

    /// Cancel the current generation's work without starting a new one.
    pub fn cancel(&self) {
        self.token.cancel();
    }
}

impl Drop for GenerationScope {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
