use crate::Amagi;

/// Extension hooked into the dispatcher lifecycle.
///
/// `load` runs once the dispatcher is constructed, before `init()`. `unload`
/// runs when the dispatcher is dropped. Plugins usually subscribe to
/// [`Amagi::events`] in `load`.
pub trait Plugin: Send + Sync {
    fn name(&self) -> &str;

    fn load(&self, amagi: &Amagi);

    fn unload(&self, _amagi: &Amagi) {}
}
