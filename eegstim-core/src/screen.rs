/// Canvas fill behind every screen.
pub const BACKGROUND: [u8; 4] = [0x2b, 0x2b, 0x2b, 0xff];

/// How a line of text is drawn. Sizes are fractions of the canvas height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextStyle {
    Instruction,
    Prompt,
    Highlight,
    Fixation,
    Caption,
}

impl TextStyle {
    pub fn color(&self) -> [u8; 4] {
        match self {
            TextStyle::Instruction => [0xdd, 0xdd, 0xdd, 0xff],
            TextStyle::Prompt => [0xff, 0xff, 0xff, 0xff],
            TextStyle::Highlight => [0x66, 0xcc, 0xff, 0xff],
            TextStyle::Fixation | TextStyle::Caption => [0x88, 0x88, 0x88, 0xff],
        }
    }

    pub fn relative_size(&self) -> f32 {
        match self {
            TextStyle::Instruction => 0.035,
            TextStyle::Prompt => 0.05,
            TextStyle::Highlight => 0.09,
            TextStyle::Fixation => 0.08,
            TextStyle::Caption => 0.025,
        }
    }
}

/// One entry in a vertically centred stack of text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Line {
    pub text: String,
    pub style: TextStyle,
}

impl Line {
    pub fn new(text: impl Into<String>, style: TextStyle) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }
}
