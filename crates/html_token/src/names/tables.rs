//! Static tag and attribute identity tables.

macro_rules! name_table {
    (
        $(#[$meta:meta])*
        pub enum $Id:ident {
            pseudo { $($Pseudo:ident),* $(,)? }
            $($Variant:ident => $text:literal),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
        pub enum $Id {
            /// Name not present in the table; the source text is kept in the
            /// token's name fragment.
            #[default]
            Unknown,
            $($Pseudo,)*
            $($Variant,)*
        }

        impl $Id {
            pub(crate) const KNOWN: &'static [($Id, &'static str)] = &[
                $(($Id::$Variant, $text),)*
            ];

            /// Canonical lowercase name, `None` for unknown and pseudo ids.
            pub fn name(self) -> Option<&'static str> {
                match self {
                    $($Id::$Variant => Some($text),)*
                    _ => None,
                }
            }
        }

        impl super::NameId for $Id {
            const UNKNOWN: Self = $Id::Unknown;

            fn known() -> &'static [(Self, &'static str)] {
                Self::KNOWN
            }
        }
    };
}

name_table! {
    /// Identity of a tag name.
    ///
    /// `Comment`, `Doctype` and `Bogus` are pseudo tags for `<!-- -->`,
    /// `<!doctype ...>` and other `<!...>` / `<?...>` / `</ ...>` markup.
    pub enum TagId {
        pseudo { Comment, Doctype, Bogus }
        A => "a",
        Abbr => "abbr",
        Acronym => "acronym",
        Address => "address",
        Applet => "applet",
        Area => "area",
        Article => "article",
        Aside => "aside",
        Audio => "audio",
        B => "b",
        Base => "base",
        Basefont => "basefont",
        Bdi => "bdi",
        Bdo => "bdo",
        Bgsound => "bgsound",
        Big => "big",
        Blink => "blink",
        Blockquote => "blockquote",
        Body => "body",
        Br => "br",
        Button => "button",
        Canvas => "canvas",
        Caption => "caption",
        Center => "center",
        Cite => "cite",
        Code => "code",
        Col => "col",
        Colgroup => "colgroup",
        Data => "data",
        Datalist => "datalist",
        Dd => "dd",
        Del => "del",
        Details => "details",
        Dfn => "dfn",
        Dialog => "dialog",
        Dir => "dir",
        Div => "div",
        Dl => "dl",
        Dt => "dt",
        Em => "em",
        Embed => "embed",
        Fieldset => "fieldset",
        Figcaption => "figcaption",
        Figure => "figure",
        Font => "font",
        Footer => "footer",
        Form => "form",
        Frame => "frame",
        Frameset => "frameset",
        H1 => "h1",
        H2 => "h2",
        H3 => "h3",
        H4 => "h4",
        H5 => "h5",
        H6 => "h6",
        Head => "head",
        Header => "header",
        Hr => "hr",
        Html => "html",
        I => "i",
        Iframe => "iframe",
        Image => "image",
        Img => "img",
        Input => "input",
        Ins => "ins",
        Isindex => "isindex",
        Kbd => "kbd",
        Keygen => "keygen",
        Label => "label",
        Legend => "legend",
        Li => "li",
        Link => "link",
        Listing => "listing",
        Main => "main",
        Map => "map",
        Mark => "mark",
        Marquee => "marquee",
        Math => "math",
        Menu => "menu",
        Meta => "meta",
        Meter => "meter",
        Nav => "nav",
        Nobr => "nobr",
        Noembed => "noembed",
        Noframes => "noframes",
        Noscript => "noscript",
        Object => "object",
        Ol => "ol",
        Optgroup => "optgroup",
        Option => "option",
        Output => "output",
        P => "p",
        Param => "param",
        Picture => "picture",
        Plaintext => "plaintext",
        Pre => "pre",
        Progress => "progress",
        Q => "q",
        Rp => "rp",
        Rt => "rt",
        Ruby => "ruby",
        S => "s",
        Samp => "samp",
        Script => "script",
        Section => "section",
        Select => "select",
        Small => "small",
        Source => "source",
        Span => "span",
        Strike => "strike",
        Strong => "strong",
        Style => "style",
        Sub => "sub",
        Summary => "summary",
        Sup => "sup",
        Svg => "svg",
        Table => "table",
        Tbody => "tbody",
        Td => "td",
        Template => "template",
        Textarea => "textarea",
        Tfoot => "tfoot",
        Th => "th",
        Thead => "thead",
        Time => "time",
        Title => "title",
        Tr => "tr",
        Track => "track",
        Tt => "tt",
        U => "u",
        Ul => "ul",
        Var => "var",
        Video => "video",
        Wbr => "wbr",
        Xmp => "xmp",
    }
}

name_table! {
    /// Identity of an attribute name.
    pub enum AttrId {
        pseudo {}
        Abbr => "abbr",
        Accept => "accept",
        AcceptCharset => "accept-charset",
        Accesskey => "accesskey",
        Action => "action",
        Align => "align",
        Alink => "alink",
        Alt => "alt",
        Archive => "archive",
        Autocomplete => "autocomplete",
        Autofocus => "autofocus",
        Autoplay => "autoplay",
        Axis => "axis",
        Background => "background",
        Bgcolor => "bgcolor",
        Border => "border",
        Cellpadding => "cellpadding",
        Cellspacing => "cellspacing",
        Char => "char",
        Charoff => "charoff",
        Charset => "charset",
        Checked => "checked",
        Cite => "cite",
        Class => "class",
        Classid => "classid",
        Clear => "clear",
        Code => "code",
        Codebase => "codebase",
        Codetype => "codetype",
        Color => "color",
        Cols => "cols",
        Colspan => "colspan",
        Compact => "compact",
        Content => "content",
        Contenteditable => "contenteditable",
        Controls => "controls",
        Coords => "coords",
        Data => "data",
        Datetime => "datetime",
        Declare => "declare",
        Defer => "defer",
        Dir => "dir",
        Disabled => "disabled",
        Download => "download",
        Draggable => "draggable",
        Enctype => "enctype",
        Face => "face",
        For => "for",
        Form => "form",
        Formaction => "formaction",
        Frame => "frame",
        Frameborder => "frameborder",
        Headers => "headers",
        Height => "height",
        Hidden => "hidden",
        High => "high",
        Href => "href",
        Hreflang => "hreflang",
        Hspace => "hspace",
        HttpEquiv => "http-equiv",
        Id => "id",
        Ismap => "ismap",
        Label => "label",
        Lang => "lang",
        Language => "language",
        Link => "link",
        List => "list",
        Longdesc => "longdesc",
        Loop => "loop",
        Low => "low",
        Max => "max",
        Maxlength => "maxlength",
        Media => "media",
        Method => "method",
        Min => "min",
        Multiple => "multiple",
        Name => "name",
        Nohref => "nohref",
        Noresize => "noresize",
        Noshade => "noshade",
        Nowrap => "nowrap",
        Object => "object",
        Onabort => "onabort",
        Onblur => "onblur",
        Onchange => "onchange",
        Onclick => "onclick",
        Ondblclick => "ondblclick",
        Onerror => "onerror",
        Onfocus => "onfocus",
        Onkeydown => "onkeydown",
        Onkeypress => "onkeypress",
        Onkeyup => "onkeyup",
        Onload => "onload",
        Onmousedown => "onmousedown",
        Onmousemove => "onmousemove",
        Onmouseout => "onmouseout",
        Onmouseover => "onmouseover",
        Onmouseup => "onmouseup",
        Onreset => "onreset",
        Onresize => "onresize",
        Onselect => "onselect",
        Onsubmit => "onsubmit",
        Onunload => "onunload",
        Pattern => "pattern",
        Ping => "ping",
        Placeholder => "placeholder",
        Poster => "poster",
        Profile => "profile",
        Prompt => "prompt",
        Readonly => "readonly",
        Rel => "rel",
        Rev => "rev",
        Role => "role",
        Rows => "rows",
        Rowspan => "rowspan",
        Rules => "rules",
        Scheme => "scheme",
        Scope => "scope",
        Scrolling => "scrolling",
        Selected => "selected",
        Shape => "shape",
        Size => "size",
        Span => "span",
        Src => "src",
        Srcdoc => "srcdoc",
        Srcset => "srcset",
        Standby => "standby",
        Start => "start",
        Step => "step",
        Style => "style",
        Summary => "summary",
        Tabindex => "tabindex",
        Target => "target",
        Text => "text",
        Title => "title",
        Type => "type",
        Usemap => "usemap",
        Valign => "valign",
        Value => "value",
        Valuetype => "valuetype",
        Version => "version",
        Vlink => "vlink",
        Vspace => "vspace",
        Width => "width",
        Wrap => "wrap",
        Xmlns => "xmlns",
    }
}

/// How the scanner treats the content after a start tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContentModel {
    Normal,
    /// Text up to the matching end tag, no character references.
    RawText,
    /// Text up to the matching end tag, character references decoded.
    RcData,
    /// Everything up to end of input is text.
    PlainText,
}

impl TagId {
    pub fn is_pseudo(self) -> bool {
        matches!(self, TagId::Comment | TagId::Doctype | TagId::Bogus)
    }

    /// Elements that never have content or an end tag.
    pub fn is_void(self) -> bool {
        matches!(
            self,
            TagId::Area
                | TagId::Base
                | TagId::Basefont
                | TagId::Bgsound
                | TagId::Br
                | TagId::Col
                | TagId::Embed
                | TagId::Frame
                | TagId::Hr
                | TagId::Image
                | TagId::Img
                | TagId::Input
                | TagId::Isindex
                | TagId::Keygen
                | TagId::Link
                | TagId::Meta
                | TagId::Param
                | TagId::Source
                | TagId::Track
                | TagId::Wbr
        )
    }

    pub fn content_model(self) -> ContentModel {
        match self {
            TagId::Script
            | TagId::Style
            | TagId::Xmp
            | TagId::Iframe
            | TagId::Noembed
            | TagId::Noframes
            | TagId::Noscript => ContentModel::RawText,
            TagId::Textarea | TagId::Title => ContentModel::RcData,
            TagId::Plaintext => ContentModel::PlainText,
            _ => ContentModel::Normal,
        }
    }

    /// Resolves legacy aliases to the element browsers actually create.
    pub fn canonical(self) -> TagId {
        match self {
            TagId::Image => TagId::Img,
            TagId::Listing => TagId::Pre,
            other => other,
        }
    }
}
