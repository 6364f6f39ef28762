//! Display sink trait

use can_dash_types::ChannelId;

/// Trait for anything that shows channel values
///
/// Sinks may be slow (redrawing a gauge), so the ingestion side never calls
/// them directly unless they are known to be cheap; see `notifier`.
pub trait DisplaySink {
    /// Show `value` as the current reading of channel `id`
    fn set(&mut self, id: ChannelId, value: f32);

    /// Called after a batch of `set` calls, e.g. to redraw once per refresh
    fn flush(&mut self) {}
}

impl<S: DisplaySink + ?Sized> DisplaySink for &mut S {
    fn set(&mut self, id: ChannelId, value: f32) {
        (**self).set(id, value)
    }

    fn flush(&mut self) {
        (**self).flush()
    }
}

