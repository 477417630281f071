use lazy_static::lazy_static;
use regex::Regex;

use crate::mode::Mode;

lazy_static! {
    // Street Name/Other Street #123
    static ref TRAM_NUMBERED: Regex = Regex::new(r"^(.*)\s#(\d+)").unwrap();
    // 7D-Street Name/Other Street
    static ref TRAM_CODED: Regex = Regex::new(r"^([0-9A-Za-z_]+)-(.*)").unwrap();
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopName {
    pub name: String,
    pub code: Option<String>,
}

pub fn name_stop(mode: Mode, location_name: &str) -> StopName {
    let trimmed = location_name.trim();
    match mode {
        Mode::Train => StopName {
            name: format!("{trimmed} Station"),
            code: None,
        },
        Mode::Tram => name_tram_stop(trimmed),
        Mode::Bus | Mode::Vline => StopName {
            name: trimmed.to_string(),
            code: None,
        },
    }
}

fn name_tram_stop(location_name: &str) -> StopName {
    let caps = TRAM_NUMBERED
        .captures(location_name)
        .map(|caps| (caps[1].to_string(), caps[2].to_string()))
        .or_else(|| {
            TRAM_CODED
                .captures(location_name)
                .map(|caps| (caps[2].to_string(), caps[1].to_string()))
        });
    match caps {
        Some((name, code)) => StopName {
            name,
            code: Some(code),
        },
        None => StopName {
            name: location_name.to_string(),
            code: None,
        },
    }
}
