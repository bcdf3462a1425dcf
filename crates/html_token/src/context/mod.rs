//! Tag context handed to per-tag callbacks.
//!
//! The owner keeps one [`TagContextState`] and reuses it for every tag.
//! [`TagContextState::initialize`] opens the window in which a
//! [`TagContext`] may be used and bumps the generation;
//! [`TagContextState::uninitialize`] closes it. Attribute handles carry the
//! generation they were issued under, so a handle kept from an earlier tag
//! fails instead of reading whatever attribute now sits at its index.

use std::borrow::Cow;

use crate::error::InvalidOperation;
use crate::names::{AttrId, TagId};
use crate::rewriter::HtmlWriter;
use crate::token::{AttributeView, Major, TokenKind, TokenView};

/// What the callback decided for the tag. Entered at most once.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TagDecision {
    #[default]
    Undefined,
    Written,
    Deleted,
}

/// Index of an attribute, valid only for the tag it was issued for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AttributeHandle {
    generation: u64,
    index: usize,
}

impl AttributeHandle {
    pub fn index(&self) -> usize {
        self.index
    }
}

/// Pooled per-tag state behind [`TagContext`].
#[derive(Debug, Default)]
pub struct TagContextState {
    generation: u64,
    active: bool,
    decision: TagDecision,
    /// Start tag whose matching end tag can carry actions.
    start_tag: bool,
    copy_input_attributes: bool,
    delete_end_tag: bool,
    delete_inner: bool,
    invoke_end_callback: bool,
    attribute_count: usize,
    written: Vec<bool>,
}

impl TagContextState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepares the state for the tag in `view` and opens the callback
    /// window.
    ///
    /// Only a complete tag opens the window. For anything else, including
    /// one part of a tag longer than the buffer window, the context stays
    /// closed and handles from the previous tag still go stale.
    pub fn initialize(&mut self, view: &TokenView<'_>) -> Result<(), InvalidOperation> {
        let token = view.token();
        let tag = token.tag_id();
        self.generation = self.generation.wrapping_add(1);
        self.attribute_count = 0;
        self.written.clear();
        if view.kind() != Some(TokenKind::Tag) || view.major() != Major::Complete {
            self.active = false;
            return Err(InvalidOperation::IncompleteTag);
        }
        self.active = true;
        self.decision = TagDecision::Undefined;
        self.start_tag = view.kind() == Some(TokenKind::Tag)
            && !token.is_end_tag()
            && !token.is_empty_element()
            && !tag.is_void()
            && !tag.is_pseudo();
        self.copy_input_attributes = false;
        self.delete_end_tag = false;
        self.delete_inner = false;
        self.invoke_end_callback = false;
        self.attribute_count = view.attribute_count();
        self.written.resize(self.attribute_count, false);
        Ok(())
    }

    pub fn uninitialize(&mut self) {
        self.active = false;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn decision(&self) -> TagDecision {
        self.decision
    }

    pub fn copies_input_attributes(&self) -> bool {
        self.copy_input_attributes
    }

    pub fn deletes_end_tag(&self) -> bool {
        self.delete_end_tag
    }

    pub fn deletes_inner_content(&self) -> bool {
        self.delete_inner
    }

    pub fn invokes_end_tag_callback(&self) -> bool {
        self.invoke_end_callback
    }

    /// The callback wrote this attribute itself.
    pub fn is_attribute_written(&self, index: usize) -> bool {
        self.written.get(index).copied().unwrap_or(false)
    }

    fn check_active(&self) -> Result<(), InvalidOperation> {
        if self.active {
            Ok(())
        } else {
            Err(InvalidOperation::OutsideCallback)
        }
    }

    fn decide(&mut self, decision: TagDecision) -> Result<(), InvalidOperation> {
        self.check_active()?;
        if self.decision != TagDecision::Undefined {
            return Err(InvalidOperation::AlreadyDecided);
        }
        self.decision = decision;
        Ok(())
    }

    fn check_handle(&self, handle: AttributeHandle) -> Result<usize, InvalidOperation> {
        self.check_active()?;
        if handle.generation != self.generation {
            return Err(InvalidOperation::StaleAttributeHandle);
        }
        if handle.index >= self.attribute_count {
            return Err(InvalidOperation::AttributeIndexOutOfRange);
        }
        Ok(handle.index)
    }
}

/// A complete tag as seen by a callback.
pub struct TagContext<'a> {
    state: &'a mut TagContextState,
    view: TokenView<'a>,
}

impl<'a> TagContext<'a> {
    pub fn new(state: &'a mut TagContextState, view: TokenView<'a>) -> Self {
        Self { state, view }
    }

    pub fn tag_id(&self) -> Result<TagId, InvalidOperation> {
        self.state.check_active()?;
        Ok(self.view.tag_id())
    }

    pub fn is_end_tag(&self) -> Result<bool, InvalidOperation> {
        self.state.check_active()?;
        Ok(self.view.token().is_end_tag())
    }

    pub fn is_empty_element(&self) -> Result<bool, InvalidOperation> {
        self.state.check_active()?;
        Ok(self.view.token().is_empty_element())
    }

    /// Tag name as written.
    pub fn name(&self) -> Result<Cow<'a, str>, InvalidOperation> {
        self.state.check_active()?;
        Ok(self.view.name())
    }

    pub fn decision(&self) -> TagDecision {
        self.state.decision
    }

    pub fn attribute_count(&self) -> Result<usize, InvalidOperation> {
        self.state.check_active()?;
        Ok(self.state.attribute_count)
    }

    pub fn attribute(&self, index: usize) -> Result<AttributeHandle, InvalidOperation> {
        let handle = AttributeHandle {
            generation: self.state.generation,
            index,
        };
        self.state.check_handle(handle)?;
        Ok(handle)
    }

    pub fn attributes(&self) -> Result<impl Iterator<Item = AttributeHandle> + use<>, InvalidOperation> {
        self.state.check_active()?;
        let generation = self.state.generation;
        Ok((0..self.state.attribute_count).map(move |index| AttributeHandle { generation, index }))
    }

    /// First attribute with the given identity.
    pub fn find_attribute(&self, id: AttrId) -> Result<Option<AttributeHandle>, InvalidOperation> {
        self.state.check_active()?;
        let index = self.view.attributes().position(|attr| attr.id() == id);
        Ok(index.map(|index| AttributeHandle {
            generation: self.state.generation,
            index,
        }))
    }

    fn resolve(&self, handle: AttributeHandle) -> Result<AttributeView<'a>, InvalidOperation> {
        let index = self.state.check_handle(handle)?;
        self.view
            .attribute(index)
            .ok_or(InvalidOperation::AttributeIndexOutOfRange)
    }

    pub fn attribute_id(&self, handle: AttributeHandle) -> Result<AttrId, InvalidOperation> {
        Ok(self.resolve(handle)?.id())
    }

    /// Attribute name as written.
    pub fn attribute_name(&self, handle: AttributeHandle) -> Result<Cow<'a, str>, InvalidOperation> {
        Ok(self.resolve(handle)?.name())
    }

    /// Decoded value, `None` for a value-less attribute.
    pub fn attribute_value(
        &self,
        handle: AttributeHandle,
    ) -> Result<Option<Cow<'a, str>>, InvalidOperation> {
        Ok(self.resolve(handle)?.value())
    }

    /// Streams the decoded value into `out`; returns whether a value exists.
    pub fn write_attribute_value_to(
        &self,
        handle: AttributeHandle,
        out: &mut String,
    ) -> Result<bool, InvalidOperation> {
        Ok(self.resolve(handle)?.write_value_to(out))
    }

    /// Writes the tag. With `copy_input_attributes`, every attribute the
    /// callback does not write itself is copied when the tag is finished.
    pub fn write_tag(
        &mut self,
        writer: &mut HtmlWriter,
        copy_input_attributes: bool,
    ) -> Result<(), InvalidOperation> {
        self.state.decide(TagDecision::Written)?;
        self.state.copy_input_attributes = copy_input_attributes;
        writer.start_tag(&self.view.canonical_name(), self.view.token().is_end_tag());
        Ok(())
    }

    /// Suppresses the tag. For a start tag the matching end tag goes too,
    /// unless `keep_end_tag`.
    pub fn delete_tag(&mut self, keep_end_tag: bool) -> Result<(), InvalidOperation> {
        self.state.decide(TagDecision::Deleted)?;
        self.state.delete_end_tag = self.state.start_tag && !keep_end_tag;
        Ok(())
    }

    /// Drops everything up to the matching end tag. No-op unless this is a
    /// start tag.
    pub fn delete_inner_content(&mut self) -> Result<(), InvalidOperation> {
        self.state.check_active()?;
        if self.state.start_tag {
            self.state.delete_inner = true;
        }
        Ok(())
    }

    /// Runs the callback again for the matching end tag. No-op unless this
    /// is a start tag.
    pub fn invoke_callback_for_end_tag(&mut self) -> Result<(), InvalidOperation> {
        self.state.check_active()?;
        if self.state.start_tag {
            self.state.invoke_end_callback = true;
        }
        Ok(())
    }

    fn written_attribute(&mut self, handle: AttributeHandle) -> Result<AttributeView<'a>, InvalidOperation> {
        let attr = self.resolve(handle)?;
        if self.state.decision != TagDecision::Written {
            return Err(InvalidOperation::TagNotWritten);
        }
        self.state.written[handle.index] = true;
        Ok(attr)
    }

    /// Copies the input attribute into the written tag.
    pub fn write_attribute(
        &mut self,
        writer: &mut HtmlWriter,
        handle: AttributeHandle,
    ) -> Result<(), InvalidOperation> {
        let attr = self.written_attribute(handle)?;
        writer.write_attribute(&attr.canonical_name(), attr.value().as_deref())
    }

    /// Writes only the input attribute's name; a value may follow with
    /// [`TagContext::write_attribute_value`] or [`HtmlWriter::write_attribute_value`].
    pub fn write_attribute_name(
        &mut self,
        writer: &mut HtmlWriter,
        handle: AttributeHandle,
    ) -> Result<(), InvalidOperation> {
        let attr = self.written_attribute(handle)?;
        writer.write_attribute_name(&attr.canonical_name())
    }

    /// Writes only the input attribute's value after a name written just
    /// before.
    pub fn write_attribute_value(
        &mut self,
        writer: &mut HtmlWriter,
        handle: AttributeHandle,
    ) -> Result<(), InvalidOperation> {
        let attr = self.written_attribute(handle)?;
        writer.write_attribute_value(attr.value().as_deref().unwrap_or(""))
    }
}
