//! Host-side collaborators: time source and output sinks.

/// Monotonic millisecond clock.
///
/// The counter may wrap; elapsed time is computed with wrapping arithmetic.
pub trait Clock {
    /// Milliseconds since an arbitrary, fixed origin.
    fn now_ms(&mut self) -> u32;
}

impl<F> Clock for F
where
    F: FnMut() -> u32,
{
    fn now_ms(&mut self) -> u32 {
        self()
    }
}

/// Receiver of decoded readings.
///
/// `f32::NAN` signals that no reliable reading is available.
pub trait Sink {
    /// Publishes one value.
    fn publish(&mut self, value: f32);
}

impl<F> Sink for F
where
    F: FnMut(f32),
{
    fn publish(&mut self, value: f32) {
        self(value)
    }
}

/// Placeholder type for a sink that is not attached.
///
/// It has no values, so a poller using it never computes that quantity.
#[derive(Debug)]
pub enum NoSink {}

impl Sink for NoSink {
    fn publish(&mut self, _value: f32) {
        match *self {}
    }
}
