use crate::diff::Ops;

/// Controls the markup produced by [`diff_pretty_html`](crate::DiffMatchPatch::diff_pretty_html).
///
/// Inserted text is wrapped in `insert_tag` (default `ins`), deleted text in `delete_tag`
/// (default `del`). Unchanged text is emitted as is, unless `equality_tag` is set.
///
/// `nltobr` replaces every `\n` with `&para;<br>`. Defaults to `true`.
///
/// `*_class` adds a `class="..."` attribute and `*_style` a `style="..."` attribute
/// to the corresponding tag. Inserts and deletes carry a green and a red background by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HtmlConfig<'a> {
    insert_tag: &'a str,
    delete_tag: &'a str,
    equality_tag: Option<&'a str>,
    nltobr: bool,
    insert_class: Option<&'a str>,
    delete_class: Option<&'a str>,
    equality_class: Option<&'a str>,
    insert_style: Option<&'a str>,
    delete_style: Option<&'a str>,
    equality_style: Option<&'a str>,
}

impl Default for HtmlConfig<'_> {
    fn default() -> Self {
        Self {
            insert_tag: "ins",
            delete_tag: "del",
            equality_tag: None,
            nltobr: true,
            insert_class: None,
            delete_class: None,
            equality_class: None,
            insert_style: Some("background:#e6ffe6;"),
            delete_style: Some("background:#ffe6e6;"),
            equality_style: None,
        }
    }
}

impl<'a> HtmlConfig<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the HTML tag to be used for text inserted
    pub fn set_insert_tag(&mut self, tag: &'a str) {
        self.insert_tag = tag;
    }

    /// Set the HTML tag to be used for text deleted
    pub fn set_delete_tag(&mut self, tag: &'a str) {
        self.delete_tag = tag;
    }

    /// Wrap unchanged text in `tag`; `None` leaves it bare.
    pub fn set_equality_tag(&mut self, tag: Option<&'a str>) {
        self.equality_tag = tag;
    }

    /// Switch to control if `\n` should be replaced with `&para;<br>`
    pub fn set_nl_to_br(&mut self, nltobr: bool) {
        self.nltobr = nltobr
    }

    pub fn set_insert_class(&mut self, class: Option<&'a str>) {
        self.insert_class = class;
    }

    pub fn set_delete_class(&mut self, class: Option<&'a str>) {
        self.delete_class = class;
    }

    pub fn set_equality_class(&mut self, class: Option<&'a str>) {
        self.equality_class = class;
    }

    pub fn set_insert_style(&mut self, style: Option<&'a str>) {
        self.insert_style = style;
    }

    pub fn set_delete_style(&mut self, style: Option<&'a str>) {
        self.delete_style = style;
    }

    pub fn set_equality_style(&mut self, style: Option<&'a str>) {
        self.equality_style = style;
    }

    /// Markup for one diff segment.
    pub(crate) fn render(&self, op: Ops, text: &str) -> String {
        let body = self.escape(text);

        let (tag, class, style) = match op {
            Ops::Insert => (Some(self.insert_tag), self.insert_class, self.insert_style),
            Ops::Delete => (Some(self.delete_tag), self.delete_class, self.delete_style),
            Ops::Equal => (self.equality_tag, self.equality_class, self.equality_style),
        };
        let Some(tag) = tag else {
            return body;
        };

        let mut html = format!("<{tag}");
        if let Some(class) = class {
            html.push_str(&format!(" class=\"{class}\""));
        }
        if let Some(style) = style {
            html.push_str(&format!(" style=\"{style}\""));
        }
        html.push_str(&format!(">{body}</{tag}>"));

        html
    }

    fn escape(&self, text: &str) -> String {
        let mut escaped = String::with_capacity(text.len());
        for c in text.chars() {
            match c {
                '&' => escaped.push_str("&amp;"),
                '<' => escaped.push_str("&lt;"),
                '>' => escaped.push_str("&gt;"),
                '\n' if self.nltobr => escaped.push_str("&para;<br>"),
                c => escaped.push(c),
            }
        }

        escaped
    }
}
