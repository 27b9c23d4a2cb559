//! Default seed transcript for a new session.

use folio_common::chat::{Message, TextRole, Transcript};

const PERSONA: &str = "You are the assistant on a personal portfolio site. You answer visitors' \
questions about the site owner's projects, skills and experience, using only what the cards on \
the page say. Keep answers short and friendly.";

const CAPABILITIES: &str = "You can rearrange the site using function calls. Call \
get_cards_layout to see which cards exist, get_card_content to read one, expand_card and \
collapse_card to change what the visitor sees, and set_project_cards_order to reorder or filter \
the projects. Use alert_message only when the visitor asks to be notified.";

/// Two system messages (persona, then tool usage) followed by three assistant greetings.
const SEED: [(TextRole, &str); 5] = [
    (TextRole::System, PERSONA),
    (TextRole::System, CAPABILITIES),
    (TextRole::Assistant, "Hi! I'm the assistant for this portfolio."),
    (
        TextRole::Assistant,
        "Ask me about any project, skill or past role on this page.",
    ),
    (
        TextRole::Assistant,
        "I can also rearrange the cards for you, for example to show only the projects you care about.",
    ),
];

/// The default seed as a transcript.
#[must_use]
pub fn seed_transcript() -> Transcript {
    Transcript::from_text(SEED)
}

/// The default seed as loose messages.
#[must_use]
pub fn seed_messages() -> Vec<Message> {
    SEED.iter()
        .map(|(role, content)| Message::new((*role).into(), *content))
        .collect()
}
