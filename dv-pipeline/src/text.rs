//! Over-the-air text side channel.
//!
//! Digital voice frames carry a low-rate text stream alongside the speech
//! payload. The codec pulls one character at a time when transmitting and
//! pushes decoded characters one at a time when receiving; these two small
//! types adapt that per-character interface to a cycling station message on
//! the transmit side and a display line on the receive side.

use crate::ring::RingQueue;

/// Bounded queue of characters between the codec callbacks and the display
/// task.
///
/// The codec emits and consumes text from the pipeline's polling context
/// while the display runs in the UI loop; characters cross that boundary
/// through the same lock-free ring the sample blocks use, under the same
/// ownership contract (one producing context, one consuming context, `N`
/// slots with `N - 1` usable).
pub type TextQueue<const N: usize> = RingQueue<char, N>;

/// Cycling transmit message, handed to the codec one byte per request.
///
/// The message repeats forever; a station beacon rather than a one-shot.
pub struct TxMessage<'a> {
    text: &'a [u8],
    next: usize,
}

impl<'a> TxMessage<'a> {
    /// # Panics
    ///
    /// If `text` is empty.
    pub const fn new(text: &'a str) -> Self {
        assert!(!text.is_empty(), "transmit message must not be empty");
        TxMessage {
            text: text.as_bytes(),
            next: 0,
        }
    }

    /// The next byte of the message, wrapping at the end.
    pub fn next_byte(&mut self) -> u8 {
        let byte = self.text[self.next];
        self.next = (self.next + 1) % self.text.len();
        byte
    }

    /// Restart from the beginning of the message.
    pub fn rewind(&mut self) {
        self.next = 0;
    }
}

/// Receive-side text line, built one decoded character at a time.
///
/// Carriage return starts a new line. When the line is full the oldest
/// character is shifted out so the newest is always visible, which suits a
/// narrow one-line display. Bytes outside printable ASCII are dropped; the
/// decoded stream contains garbage under weak-signal conditions.
pub struct RxLine<const MAX: usize> {
    buf: [u8; MAX],
    len: usize,
}

impl<const MAX: usize> RxLine<MAX> {
    pub const fn new() -> Self {
        assert!(MAX >= 1, "line buffer needs at least one character");
        RxLine {
            buf: [0; MAX],
            len: 0,
        }
    }

    /// Feed one decoded byte.
    pub fn push(&mut self, byte: u8) {
        if byte == b'\r' || byte == b'\n' {
            self.len = 0;
            return;
        }
        if !(0x20..=0x7e).contains(&byte) {
            return;
        }
        if self.len == MAX {
            self.buf.copy_within(1.., 0);
            self.len -= 1;
        }
        self.buf[self.len] = byte;
        self.len += 1;
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Current line contents. Always valid UTF-8: only printable ASCII is
    /// ever stored.
    pub fn as_str(&self) -> &str {
        core::str::from_utf8(&self.buf[..self.len]).unwrap_or("")
    }
}

impl<const MAX: usize> Default for RxLine<MAX> {
    fn default() -> Self {
        Self::new()
    }
}
