use crate::error::InvalidOperation;

/// Where the writer is inside the markup it produces.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum Position {
    #[default]
    Content,
    Tag,
    AttributeName,
    AttributeValue,
    /// The tag name filtered to nothing; the rest of the tag is dropped.
    SkippedTag,
    /// The attribute name filtered to nothing; its value is dropped.
    SkippedAttribute,
}

/// Normalizing HTML output.
///
/// Names are filtered to characters that cannot break out of a tag, values
/// are always double-quoted and text is escaped unless written raw.
#[derive(Clone, Debug, Default)]
pub struct HtmlWriter {
    out: String,
    position: Position,
}

impl HtmlWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_str(&self) -> &str {
        &self.out
    }

    pub fn len(&self) -> usize {
        self.out.len()
    }

    pub fn is_empty(&self) -> bool {
        self.out.is_empty()
    }

    /// Hands out everything written so far. A tag still open stays open,
    /// so later writes continue it.
    pub fn take(&mut self) -> String {
        std::mem::take(&mut self.out)
    }

    pub(crate) fn clear(&mut self) {
        self.out.clear();
        self.position = Position::Content;
    }

    /// A tag is open for attributes.
    pub fn in_tag(&self) -> bool {
        self.position != Position::Content
    }

    /// Opens `<name` or `</name`, closing any tag still open.
    pub fn start_tag(&mut self, name: &str, end_tag: bool) {
        self.finish_tag(false);
        if !name.chars().any(is_name_char) {
            self.position = Position::SkippedTag;
            return;
        }
        self.out.push_str(if end_tag { "</" } else { "<" });
        push_name(&mut self.out, name);
        self.position = Position::Tag;
    }

    /// Writes ` name` or ` name="value"` into the open tag.
    pub fn write_attribute(&mut self, name: &str, value: Option<&str>) -> Result<(), InvalidOperation> {
        self.check_in_tag()?;
        self.push_attribute(name, value);
        Ok(())
    }

    pub fn write_attribute_name(&mut self, name: &str) -> Result<(), InvalidOperation> {
        self.check_in_tag()?;
        self.push_attribute_name(name);
        Ok(())
    }

    fn check_in_tag(&self) -> Result<(), InvalidOperation> {
        if self.position == Position::Content {
            return Err(InvalidOperation::TagNotWritten);
        }
        Ok(())
    }

    /// Attribute inside a tag the caller opened. Writes nothing outside a
    /// tag.
    pub(crate) fn push_attribute(&mut self, name: &str, value: Option<&str>) {
        self.push_attribute_name(name);
        if let Some(value) = value {
            self.open_attribute_value();
            self.append_attribute_value(value);
        }
        self.close_attribute();
    }

    pub(crate) fn push_attribute_name(&mut self, name: &str) {
        self.close_attribute();
        if matches!(self.position, Position::Content | Position::SkippedTag) {
            return;
        }
        if name.chars().any(is_name_char) {
            self.out.push(' ');
            push_name(&mut self.out, name);
            self.position = Position::AttributeName;
        } else {
            self.position = Position::SkippedAttribute;
        }
    }

    /// Writes `="value"` after an attribute name.
    pub fn write_attribute_value(&mut self, value: &str) -> Result<(), InvalidOperation> {
        match self.position {
            Position::AttributeName | Position::SkippedAttribute => {
                self.open_attribute_value();
                self.append_attribute_value(value);
                self.close_attribute();
                Ok(())
            }
            Position::SkippedTag => Ok(()),
            Position::Content => Err(InvalidOperation::TagNotWritten),
            Position::Tag | Position::AttributeValue => {
                Err(InvalidOperation::AttributeNameNotWritten)
            }
        }
    }

    /// Drops the attribute being streamed.
    pub(crate) fn skip_attribute(&mut self) {
        self.close_attribute();
        if self.position == Position::Tag {
            self.position = Position::SkippedAttribute;
        }
    }

    pub(crate) fn open_attribute_value(&mut self) {
        if self.position == Position::AttributeName {
            self.out.push_str("=\"");
            self.position = Position::AttributeValue;
        }
    }

    pub(crate) fn append_attribute_value(&mut self, value: &str) {
        if self.position == Position::AttributeValue {
            push_escaped(&mut self.out, value, true);
        }
    }

    pub(crate) fn close_attribute(&mut self) {
        match self.position {
            Position::AttributeValue => {
                self.out.push('"');
                self.position = Position::Tag;
            }
            Position::AttributeName | Position::SkippedAttribute => self.position = Position::Tag,
            _ => {}
        }
    }

    /// Closes the open tag with `>` or `/>`. Does nothing outside a tag.
    pub fn finish_tag(&mut self, empty_element: bool) {
        self.close_attribute();
        match self.position {
            Position::Tag => self.out.push_str(if empty_element { "/>" } else { ">" }),
            Position::Content => return,
            _ => {}
        }
        self.position = Position::Content;
    }

    /// Writes `</name>`.
    pub fn write_end_tag(&mut self, name: &str) {
        self.start_tag(name, true);
        self.finish_tag(false);
    }

    /// Escaped text content.
    pub fn write_text(&mut self, text: &str) {
        self.finish_tag(false);
        push_escaped(&mut self.out, text, false);
    }

    /// Unescaped output, for raw-text content and trusted markup.
    pub fn write_raw(&mut self, html: &str) {
        self.finish_tag(false);
        self.out.push_str(html);
    }

    /// `<!--text-->` with dash runs broken up so the comment cannot end
    /// early.
    pub fn write_comment(&mut self, text: &str) {
        self.finish_tag(false);
        self.out.push_str("<!--");
        let mut previous_dash = false;
        for ch in text.chars() {
            if ch == '-' && previous_dash {
                self.out.push(' ');
            }
            previous_dash = ch == '-';
            self.out.push(ch);
        }
        self.out.push_str("-->");
    }

    /// `<!text>`.
    pub fn write_doctype(&mut self, text: &str) {
        self.finish_tag(false);
        self.out.push_str("<!");
        self.out.extend(text.chars().filter(|&ch| ch != '<' && ch != '>'));
        self.out.push('>');
    }
}

fn is_name_char(ch: char) -> bool {
    !ch.is_whitespace() && !ch.is_control() && !matches!(ch, '<' | '>' | '/' | '=' | '"' | '\'' | '`')
}

fn push_name(out: &mut String, name: &str) {
    out.extend(name.chars().filter(|&ch| is_name_char(ch)));
}

fn push_escaped(out: &mut String, text: &str, in_attribute: bool) {
    let mut rest = text;
    while let Some(at) = rest.find(|ch| matches!(ch, '&' | '<' | '>' | '"')) {
        out.push_str(&rest[..at]);
        let ch = rest.as_bytes()[at];
        match ch {
            b'&' => out.push_str("&amp;"),
            b'<' => out.push_str("&lt;"),
            b'>' => out.push_str("&gt;"),
            _ if in_attribute => out.push_str("&quot;"),
            _ => out.push('"'),
        }
        rest = &rest[at + 1..];
    }
    out.push_str(rest);
}
