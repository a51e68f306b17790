//! Reply and embed values produced by command handlers and the notifier.
//!
//! These are plain data; the serenity layer turns them into builders.

use chrono::{DateTime, Utc};

pub const COLOUR_DEFAULT: u32 = 0x0099ff;
pub const COLOUR_ONLINE: u32 = 0x00ff00;
pub const COLOUR_OFFLINE: u32 = 0xff0000;
pub const COLOUR_LEFT: u32 = 0xff4444;

#[derive(Debug, Clone, PartialEq)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmbedCard {
    pub title: String,
    pub description: Option<String>,
    pub colour: u32,
    pub image: Option<String>,
    pub thumbnail: Option<String>,
    pub fields: Vec<EmbedField>,
    pub footer: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
}

impl EmbedCard {
    /// A timestamped card in the default colour
    pub fn new(title: impl Into<String>) -> Self {
        EmbedCard {
            title: title.into(),
            description: None,
            colour: COLOUR_DEFAULT,
            image: None,
            thumbnail: None,
            fields: Vec::new(),
            footer: None,
            timestamp: Some(Utc::now()),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn colour(mut self, colour: u32) -> Self {
        self.colour = colour;
        self
    }

    pub fn image(mut self, url: impl Into<String>) -> Self {
        self.image = Some(url.into());
        self
    }

    pub fn thumbnail(mut self, url: impl Into<String>) -> Self {
        self.thumbnail = Some(url.into());
        self
    }

    pub fn inline_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push(EmbedField {
            name: name.into(),
            value: value.into(),
            inline: true,
        });
        self
    }

    pub fn footer(mut self, text: impl Into<String>) -> Self {
        self.footer = Some(text.into());
        self
    }

    pub fn field_value(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|field| field.name == name)
            .map(|field| field.value.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    /// Only the invoking user sees the message
    Private,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub visibility: Visibility,
    pub content: Option<String>,
    pub embed: Option<EmbedCard>,
}

impl Reply {
    pub fn embed(card: EmbedCard) -> Self {
        Reply {
            visibility: Visibility::Public,
            content: None,
            embed: Some(card),
        }
    }

    pub fn private(content: impl Into<String>) -> Self {
        Reply {
            visibility: Visibility::Private,
            content: Some(content.into()),
            embed: None,
        }
    }

    pub fn private_embed(card: EmbedCard) -> Self {
        Reply {
            visibility: Visibility::Private,
            content: None,
            embed: Some(card),
        }
    }

    pub fn is_private(&self) -> bool {
        self.visibility == Visibility::Private
    }

    /// Content and embed text joined, for logging and assertions
    pub fn text(&self) -> String {
        let mut text = self.content.clone().unwrap_or_default();
        if let Some(card) = &self.embed {
            text.push_str(&card.title);
            if let Some(description) = &card.description {
                text.push('\n');
                text.push_str(description);
            }
        }
        text
    }
}
