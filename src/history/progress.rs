/// Progress sink polled between rebuild steps.
///
/// Returning `false` from [`proceed`](Self::proceed) cancels the rebuild
/// before the next step starts; a step that is already running always
/// finishes.
pub trait Progress {
    /// Reports `done` of `total` steps finished and asks whether to go on.
    fn proceed(&mut self, done: usize, total: usize) -> bool;
}

impl<F> Progress for F
where
    F: FnMut(usize, usize) -> bool,
{
    fn proceed(&mut self, done: usize, total: usize) -> bool {
        self(done, total)
    }
}
