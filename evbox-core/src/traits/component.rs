//! Component lifecycle trait

/// A device driven by the scheduler
///
/// `setup` runs once before the first `update`. `update` runs every tick
/// and must never block; anything that has to wait is a deadline checked
/// on a later tick.
pub trait Component {
    /// One-time initialisation
    fn setup(&mut self);

    /// Advance by one tick
    ///
    /// `now_ms` is a free-running millisecond clock that may wrap.
    fn update(&mut self, now_ms: u32);
}
