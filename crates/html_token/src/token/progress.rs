//! Progress of a tag or attribute that may be emitted in several parts.
//!
//! Each sub-part (tag name, unstructured text, attribute name, attribute
//! value) records which portion of it the current part holds as a
//! [`Piece`]. The coarse [`Major`] state is always derived from the pieces,
//! never stored.

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Major {
    #[default]
    None,
    /// Started in this part, continues in a later one.
    Begin,
    /// Started earlier, continues in a later one.
    Continue,
    /// Started earlier, finished in this part.
    End,
    /// Started and finished in this part.
    Complete,
}

impl Major {
    fn from_edges(began: bool, ended: bool) -> Major {
        match (began, ended) {
            (true, true) => Major::Complete,
            (true, false) => Major::Begin,
            (false, true) => Major::End,
            (false, false) => Major::Continue,
        }
    }

    pub fn is_begun_here(self) -> bool {
        matches!(self, Major::Begin | Major::Complete)
    }

    pub fn is_ended_here(self) -> bool {
        matches!(self, Major::End | Major::Complete)
    }
}

/// Portion of one sub-part present in the current part.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Piece {
    /// Not present in this part.
    #[default]
    Absent,
    Begin,
    Continue,
    End,
    /// Opened and closed within this part. For an attribute value this also
    /// marks a value that was closed without ever appearing.
    Whole,
}

impl Piece {
    pub fn is_present(self) -> bool {
        self != Piece::Absent
    }

    pub fn is_begun_here(self) -> bool {
        matches!(self, Piece::Begin | Piece::Whole)
    }

    pub fn is_ended(self) -> bool {
        matches!(self, Piece::End | Piece::Whole)
    }

    pub fn is_open(self) -> bool {
        matches!(self, Piece::Begin | Piece::Continue)
    }

    fn closed(self) -> Piece {
        match self {
            Piece::Begin | Piece::Absent => Piece::Whole,
            Piece::Continue => Piece::End,
            ended => ended,
        }
    }

    fn next_part(self) -> Piece {
        if self.is_open() {
            Piece::Continue
        } else {
            Piece::Absent
        }
    }
}

/// Progress of a tag token.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TagProgress {
    begun: bool,
    ended: bool,
    name: Piece,
    unstructured: Piece,
}

impl TagProgress {
    pub(crate) fn begin() -> Self {
        Self {
            begun: true,
            ..Self::default()
        }
    }

    pub fn major(&self) -> Major {
        Major::from_edges(self.begun, self.ended)
    }

    pub fn name(&self) -> Piece {
        self.name
    }

    pub fn unstructured(&self) -> Piece {
        self.unstructured
    }

    pub(crate) fn open_name(&mut self) {
        debug_assert_eq!(self.name, Piece::Absent);
        self.name = Piece::Begin;
    }

    pub(crate) fn close_name(&mut self) {
        self.name = self.name.closed();
    }

    pub(crate) fn open_unstructured(&mut self) {
        debug_assert_eq!(self.unstructured, Piece::Absent);
        self.unstructured = Piece::Begin;
    }

    pub(crate) fn close_unstructured(&mut self) {
        self.unstructured = self.unstructured.closed();
    }

    pub(crate) fn end(&mut self) {
        self.ended = true;
    }

    pub(crate) fn next_part(&mut self) {
        debug_assert!(!self.ended);
        self.begun = false;
        self.name = self.name.next_part();
        self.unstructured = self.unstructured.next_part();
    }
}

/// Progress of one attribute.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AttrProgress {
    name: Piece,
    value: Piece,
}

impl AttrProgress {
    pub(crate) fn begin() -> Self {
        Self {
            name: Piece::Begin,
            value: Piece::Absent,
        }
    }

    /// Derived from the pieces: the attribute began here when its name did,
    /// and ended here when its value was closed (present or not).
    pub fn major(&self) -> Major {
        if !self.name.is_present() && !self.value.is_present() {
            return Major::None;
        }
        Major::from_edges(self.name.is_begun_here(), self.value.is_ended())
    }

    /// Both name and value are closed.
    pub fn is_complete(&self) -> bool {
        self.value.is_ended()
    }

    pub fn name(&self) -> Piece {
        self.name
    }

    pub fn value(&self) -> Piece {
        self.value
    }

    pub(crate) fn close_name(&mut self) {
        self.name = self.name.closed();
    }

    pub(crate) fn open_value(&mut self) {
        debug_assert_eq!(self.value, Piece::Absent);
        self.value = Piece::Begin;
    }

    /// Closes an open value, or records that no value appeared.
    pub(crate) fn close_value(&mut self) {
        self.value = self.value.closed();
    }

    pub(crate) fn next_part(&mut self) {
        self.name = self.name.next_part();
        self.value = self.value.next_part();
    }
}
