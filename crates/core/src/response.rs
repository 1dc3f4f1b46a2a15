use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeechKind {
    PlainText,
    Ssml,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Speech {
    pub kind: SpeechKind,
    pub text: String,
}

impl Speech {
    pub fn plain(text: impl Into<String>) -> Self {
        Self { kind: SpeechKind::PlainText, text: text.into() }
    }

    /// Wraps `body` in a `<speak>` document.
    pub fn ssml(body: impl AsRef<str>) -> Self {
        Self { kind: SpeechKind::Ssml, text: format!("<speak>{}</speak>", body.as_ref().trim()) }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub title: String,
    pub content: String,
}

/// Dual format answer for one request. Built once and handed to the transport as is.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub spoken_text: String,
    pub speech_kind: SpeechKind,
    pub display_text: String,
    pub ends_session: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reprompt: Option<Speech>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card: Option<Card>,
}

impl Response {
    /// Keeps the session open and waits for the next utterance.
    pub fn ask(spoken: Speech, display_text: impl Into<String>, reprompt: Speech) -> Self {
        Self {
            spoken_text: spoken.text,
            speech_kind: spoken.kind,
            display_text: display_text.into(),
            ends_session: false,
            reprompt: Some(reprompt),
            card: None,
        }
    }

    /// Answers and closes the session.
    pub fn tell(spoken: Speech, display_text: impl Into<String>) -> Self {
        Self {
            spoken_text: spoken.text,
            speech_kind: spoken.kind,
            display_text: display_text.into(),
            ends_session: true,
            reprompt: None,
            card: None,
        }
    }

    pub fn with_card(mut self, title: impl Into<String>, content: impl Into<String>) -> Self {
        self.card = Some(Card { title: title.into(), content: content.into() });
        self
    }
}
