/// Decoded input window.
///
/// Offsets handed out by the scanner index into [`CharBuffer::as_str`] and
/// stay valid until the next [`CharBuffer::compact`], which returns the
/// delta every retained offset must be shifted by.
#[derive(Debug)]
pub struct CharBuffer {
    text: String,
    window: usize,
}

impl CharBuffer {
    pub fn with_window(window: usize) -> Self {
        Self {
            text: String::with_capacity(window),
            window,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Bytes that may still be read while keeping everything from
    /// `retain_from` in view.
    pub fn room(&self, retain_from: usize) -> usize {
        let live = self.text.len().saturating_sub(retain_from);
        self.window.saturating_sub(live)
    }

    /// Drops everything before `retain_from` and returns the (negative)
    /// offset delta.
    pub fn compact(&mut self, retain_from: usize) -> isize {
        debug_assert!(self.text.is_char_boundary(retain_from));
        if retain_from == 0 {
            return 0;
        }
        self.text.drain(..retain_from);
        -(retain_from as isize)
    }

    pub fn insert_str(&mut self, at: usize, text: &str) {
        self.text.insert_str(at, text);
    }

    pub fn clear(&mut self) {
        self.text.clear();
    }

    pub(crate) fn text_mut(&mut self) -> &mut String {
        &mut self.text
    }
}

pub(crate) fn shift_offset(offset: usize, delta: isize) -> usize {
    offset.saturating_add_signed(delta)
}
