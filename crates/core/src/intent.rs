use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::SlotError;

/// Intent names the voice front end can route to this backend.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IntentName {
    TotalTradeSpend,
    TotalGrossProfit,
    TotalRoi,
    BestPromotions,
    PromotionsPerformance,
    HearMore,
    DontHearMore,
    Help,
    Stop,
    Cancel,
    /// Anything the front end sent that is not in the list above, including a missing name.
    Unrecognized(Option<String>),
}

impl IntentName {
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw.map(str::trim).filter(|value| !value.is_empty()) else {
            return Self::Unrecognized(None);
        };

        match raw {
            "TotalTradeSpend" => Self::TotalTradeSpend,
            "TotalGrossProfit" => Self::TotalGrossProfit,
            "TotalROI" | "TotalRoi" => Self::TotalRoi,
            "BestPromotions" => Self::BestPromotions,
            "PromotionsPerformance" => Self::PromotionsPerformance,
            "HearMore" => Self::HearMore,
            "DontHearMore" => Self::DontHearMore,
            "Help" | "AMAZON.HelpIntent" => Self::Help,
            "Stop" | "AMAZON.StopIntent" => Self::Stop,
            "Cancel" | "AMAZON.CancelIntent" => Self::Cancel,
            other => Self::Unrecognized(Some(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::TotalTradeSpend => "TotalTradeSpend",
            Self::TotalGrossProfit => "TotalGrossProfit",
            Self::TotalRoi => "TotalROI",
            Self::BestPromotions => "BestPromotions",
            Self::PromotionsPerformance => "PromotionsPerformance",
            Self::HearMore => "HearMore",
            Self::DontHearMore => "DontHearMore",
            Self::Help => "Help",
            Self::Stop => "Stop",
            Self::Cancel => "Cancel",
            Self::Unrecognized(Some(name)) => name.as_str(),
            Self::Unrecognized(None) => "<none>",
        }
    }
}

impl fmt::Display for IntentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Slots the reporting intents understand.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotName {
    Year,
    Brand,
    Customer,
}

impl SlotName {
    /// Qualifier order used by every rendered response.
    pub const ORDERED: [SlotName; 3] = [SlotName::Year, SlotName::Brand, SlotName::Customer];

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "year" | "yearno" => Some(Self::Year),
            "brand" => Some(Self::Brand),
            "customer" => Some(Self::Customer),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Year => "year",
            Self::Brand => "brand",
            Self::Customer => "customer",
        }
    }
}

/// Slot values of one request. Blank values are stored as absent.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slots {
    year: Option<String>,
    brand: Option<String>,
    customer: Option<String>,
}

impl Slots {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds slots from the front end's name/value pairs. Unknown slot names are ignored.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, Option<V>)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut slots = Self::default();
        for (name, value) in pairs {
            if let Some(slot) = SlotName::parse(name.as_ref()) {
                slots.set(slot, value.as_ref().map(|value| value.as_ref()));
            }
        }
        slots
    }

    pub fn with(mut self, slot: SlotName, value: &str) -> Self {
        self.set(slot, Some(value));
        self
    }

    pub fn set(&mut self, slot: SlotName, value: Option<&str>) {
        let value = value.map(str::trim).filter(|value| !value.is_empty()).map(str::to_string);
        match slot {
            SlotName::Year => self.year = value,
            SlotName::Brand => self.brand = value,
            SlotName::Customer => self.customer = value,
        }
    }

    pub fn get(&self, slot: SlotName) -> Option<&str> {
        match slot {
            SlotName::Year => self.year.as_deref(),
            SlotName::Brand => self.brand.as_deref(),
            SlotName::Customer => self.customer.as_deref(),
        }
    }

    /// Populated slots in qualifier order.
    pub fn populated(&self) -> impl Iterator<Item = (SlotName, &str)> + '_ {
        SlotName::ORDERED
            .into_iter()
            .filter_map(move |slot| self.get(slot).map(|value| (slot, value)))
    }

    /// Drops slot values that fail validation and reports them.
    pub fn sanitized(&self) -> (Slots, Vec<SlotError>) {
        let mut clean = self.clone();
        let mut rejected = Vec::new();

        if let Some(year) = self.year.as_deref() {
            if !is_calendar_year(year) {
                rejected.push(SlotError::MalformedYear(year.to_string()));
                clean.year = None;
            }
        }

        (clean, rejected)
    }
}

fn is_calendar_year(value: &str) -> bool {
    value.len() == 4 && value.bytes().all(|byte| byte.is_ascii_digit())
}

/// A recognized request: intent name plus its slot values.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intent {
    pub name: IntentName,
    pub slots: Slots,
}

impl Intent {
    pub fn new(name: IntentName, slots: Slots) -> Self {
        Self { name, slots }
    }

    pub fn from_request<I, K, V>(name: Option<&str>, slots: I) -> Self
    where
        I: IntoIterator<Item = (K, Option<V>)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        Self { name: IntentName::parse(name), slots: Slots::from_pairs(slots) }
    }
}
