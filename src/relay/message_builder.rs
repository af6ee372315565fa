use std::fmt::Write;

enum Style {
    Bold,
    Italic,
    Code,
}

impl Style {
    fn marker(&self) -> &'static str {
        match self {
            Self::Bold => "*",
            Self::Italic => "_",
            Self::Code => "`",
        }
    }
}

/// Builds a Keybase chat message.
///
/// Styles are opened and closed explicitly, text is appended through [`std::fmt::Write`].
#[derive(Default)]
pub struct MessageBuilder {
    text: String,
    style_stack: Vec<Style>,
}

impl MessageBuilder {
    pub fn new() -> Self {
        Default::default()
    }

    /// Closes any style left open and returns the message text.
    pub fn build(mut self) -> String {
        self.close_styles();
        self.text
    }

    pub fn bold(&mut self) {
        self.open(Style::Bold);
    }

    pub fn italic(&mut self) {
        self.open(Style::Italic);
    }

    pub fn code(&mut self) {
        self.open(Style::Code);
    }

    fn open(&mut self, style: Style) {
        self.text.push_str(style.marker());
        self.style_stack.push(style);
    }

    /// Writes `*tag*`, the prefix that tells which platform a message comes from.
    pub fn tag(&mut self, tag: &str) {
        self.bold();
        self.text.push_str(tag);
        self.close_last();
    }

    /// Closes every open style and starts a new quoted line.
    pub fn quote_line(&mut self) {
        self.close_styles();
        self.text.push_str("\n>");
    }

    /// Writes `text` as quoted lines, each newline starting a new quoted line.
    pub fn quote_block(&mut self, text: &str) {
        for (i, line) in text.split('\n').enumerate() {
            if i > 0 {
                self.text.push_str("\n>");
            }
            self.text.push_str(line);
        }
    }

    /// Does nothing when no style is open.
    pub fn close_last(&mut self) {
        if let Some(style) = self.style_stack.pop() {
            self.text.push_str(style.marker());
        }
    }

    pub fn close_styles(&mut self) {
        while !self.style_stack.is_empty() {
            self.close_last();
        }
    }
}

impl Write for MessageBuilder {
    fn write_str(&mut self, s: &str) -> std::fmt::Result {
        self.text.push_str(s);
        Ok(())
    }
}
