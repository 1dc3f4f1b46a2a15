//! Renders query results and fixed replies into [`Response`] values.
//!
//! Every analytical answer is built from the same pieces: a metric lead ("The Total ROI"), a
//! qualifier phrase made of the populated slots in year, brand, customer order, and the value.
//! The spoken side reads numbers as cardinals; the display side is plain text.

use crate::intent::{IntentName, SlotName, Slots};
use crate::query::{Metric, QueryResult, NO_DATA_TEXT};
use crate::response::{Response, Speech};

pub const FOLLOW_UP_PROMPT: &str = "Would you like to hear more?";

const YES_NO_REPROMPT: &str = "Would you like to hear more? Please say yes or no.";
const BREAK: &str = r#"<break time="0.2s"/>"#;

/// Builds the answer for an analytical intent.
pub fn format(metric: Metric, slots: &Slots, result: &QueryResult) -> Response {
    let display_subject = subject(metric, &qualifier_phrase(slots));
    let spoken_subject = subject(metric, &spoken_qualifier_phrase(slots));

    let (spoken, display_text) = if result.found {
        (
            format!(
                "{spoken_subject} is {BREAK} {}. {FOLLOW_UP_PROMPT}",
                cardinal(&escape_markup(&result.scalar))
            ),
            format!("{display_subject} is {}", result.scalar),
        )
    } else {
        (
            format!("{spoken_subject}: {NO_DATA_TEXT}. {FOLLOW_UP_PROMPT}"),
            format!("{display_subject}: {NO_DATA_TEXT}"),
        )
    };

    Response::ask(Speech::ssml(spoken), display_text.clone(), Speech::ssml(YES_NO_REPROMPT))
        .with_card(metric.title(), display_text)
}

/// Populated slot descriptors in year, brand, customer order, e.g. `year 2016 brand CESAR`.
pub fn qualifier_phrase(slots: &Slots) -> String {
    slots
        .populated()
        .map(|(slot, value)| format!("{} {value}", slot.label()))
        .collect::<Vec<_>>()
        .join(" ")
}

fn spoken_qualifier_phrase(slots: &Slots) -> String {
    slots
        .populated()
        .map(|(slot, value)| match slot {
            SlotName::Year => format!("{} {}", slot.label(), cardinal(&escape_markup(value))),
            SlotName::Brand | SlotName::Customer => {
                format!("{} {}", slot.label(), escape_markup(value))
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn subject(metric: Metric, qualifier: &str) -> String {
    if qualifier.is_empty() {
        format!("The {}", metric.title())
    } else {
        format!("The {} for {qualifier}", metric.title())
    }
}

fn cardinal(value: &str) -> String {
    format!(r#"<say-as interpret-as="cardinal">{value}</say-as>"#)
}

fn escape_markup(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for character in value.chars() {
        match character {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Plain text rendering of a markup fragment: tags removed, whitespace collapsed.
fn strip_markup(markup: &str) -> String {
    let mut text = String::with_capacity(markup.len());
    let mut in_tag = false;
    for character in markup.chars() {
        match character {
            '<' => {
                in_tag = true;
                text.push(' ');
            }
            '>' => in_tag = false,
            other if !in_tag => text.push(other),
            _ => {}
        }
    }
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn ask_ssml(body: &str, reprompt: &str) -> Response {
    Response::ask(Speech::ssml(body), strip_markup(body), Speech::ssml(reprompt))
}

pub fn welcome() -> Response {
    let greeting = "Hello there! Welcome to the CPG Analytics. How can I help you?";
    Response::ask(
        Speech::plain(greeting),
        greeting,
        Speech::ssml("Do you want me to wait? Please say yes or no!"),
    )
}

pub fn help() -> Response {
    let body = format!(
        "You can ask for things like the following {BREAK} \
         What is the Total Trade Spend for Year 2016 {BREAK} \
         What is the Total ROI for Target {BREAK} \
         What is the Total Gross Profit for MUSK {BREAK} \
         or you can simply say exit. Now, what can I help you with?"
    );
    let reprompt = format!(
        "I'm sorry I didn't understand that. You can ask things like, \
         What is the Total Gross Profit for Neon {BREAK} \
         Or you can say exit. Now, what can I help you with?"
    );
    ask_ssml(&body, &reprompt)
}

pub fn hear_more() -> Response {
    let reprompt = format!(
        "Here are a few more samples, \
         What are the top 5 Brands during year 2016 {BREAK} \
         Give me the bottom 3 Products during year 2016 {BREAK} \
         Tell me the top 3 promotions during year 2016"
    );
    Response::ask(
        Speech::plain("Waiting for your query!"),
        "Waiting for your query!",
        Speech::ssml(reprompt),
    )
}

pub fn best_promotions() -> Response {
    let body = r#"<say-as interpret-as="digits">316669</say-as> KANTONG PINEAPPLE PRICE REDUCTION"#;
    ask_ssml(body, YES_NO_REPROMPT)
        .with_card("Best Promotion for year 2016", "316669 KANTONG PINEAPPLE PRICE REDUCTION")
}

pub fn promotions_performance() -> Response {
    let body = format!(
        "{} out of {} Promotions did not perform well",
        cardinal("574"),
        cardinal("3450")
    );
    ask_ssml(&body, YES_NO_REPROMPT).with_card(
        "Promotions Performance for year 2016",
        "574 out of 3450 Promotions did not perform well.",
    )
}

/// Closing reply for the intents that end a session.
pub fn farewell(intent: &IntentName) -> Response {
    let text = match intent {
        IntentName::DontHearMore => "Thanks, please do come again.",
        IntentName::Cancel => "Goodbye!",
        _ => "Bye, hope to see you soon!",
    };
    Response::tell(Speech::plain(text), text)
}

/// Re-prompt for an intent name this backend does not handle. Echoes the name it received.
pub fn unrecognized(intent: &IntentName) -> Response {
    let spoken =
        format!("I'm sorry I didn't understand that. Please try again, intent {}", intent.as_str());
    let reprompt = format!(
        "I'm sorry I didn't understand that. You can ask things like, \
         What is the Total Trade Spend for Year 2016 {BREAK} \
         What is the Total ROI for Target {BREAK} \
         Which Promo Mechanics are Working Best {BREAK} \
         What is the Total Gross Profit for Year 2016"
    );
    Response::ask(Speech::plain(spoken.clone()), spoken, Speech::ssml(reprompt))
}

/// Apology used when the data source could not answer in time.
pub fn executor_unavailable(metric: Metric) -> Response {
    let spoken = format!(
        "Sorry, I could not reach the reporting data for the {} right now. \
         Please try again in a moment.",
        metric.title()
    );
    let display = format!("The {} is unavailable right now. Please try again.", metric.title());
    Response::ask(
        Speech::ssml(spoken),
        display,
        Speech::ssml("Would you like to try again? Please say yes or no."),
    )
}
