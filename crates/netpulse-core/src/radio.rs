// ── Radio band classification ──
//
// Maps the controller's vendor radio codes onto human band labels.

use serde::{Deserialize, Serialize};
use strum::Display;

/// A Wi-Fi frequency band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub enum RadioBand {
    #[strum(serialize = "2.4 GHz")]
    #[serde(rename = "2.4 GHz")]
    TwoGhz,
    #[strum(serialize = "5 GHz")]
    #[serde(rename = "5 GHz")]
    FiveGhz,
    #[strum(serialize = "6 GHz")]
    #[serde(rename = "6 GHz")]
    SixGhz,
}

/// Classify a client's radio.
///
/// Wired clients and unrecognised or missing codes yield `None`; callers
/// decide how to bucket those.
pub fn classify(code: Option<&str>, wired: bool) -> Option<RadioBand> {
    if wired {
        return None;
    }
    let code = code.filter(|c| !c.is_empty())?.to_ascii_lowercase();
    match code.as_str() {
        "ng" | "2g" | "b" | "g" => Some(RadioBand::TwoGhz),
        "na" | "5g" | "a" | "ac" | "ax" => Some(RadioBand::FiveGhz),
        "6e" | "6g" => Some(RadioBand::SixGhz),
        _ => None,
    }
}
