use std::io::Cursor;

/// Position bookkeeping for byte cursors used as position-tracked buffers.
///
/// A cursor position past the end counts as "nothing remaining" rather than an
/// error, matching [`Cursor`]'s own read behaviour.
pub trait AdvanceCursor {
    /// Current position clamped to the buffer length.
    fn offset(&self) -> usize;
    /// Bytes between the position and the end of the buffer.
    fn remaining(&self) -> usize;
    /// Moves the position forward by `n` bytes.
    fn advance(&mut self, n: usize);
}

impl<T: AsRef<[u8]>> AdvanceCursor for Cursor<T> {
    fn offset(&self) -> usize {
        let len = self.get_ref().as_ref().len();
        usize::try_from(self.position()).map_or(len, |p| p.min(len))
    }

    fn remaining(&self) -> usize {
        self.get_ref().as_ref().len() - self.offset()
    }

    fn advance(&mut self, n: usize) {
        self.set_position(self.position() + n as u64); // position is a u64
    }
}
