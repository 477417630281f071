use lazy_static::lazy_static;
use regex::Regex;

use crate::mode::Mode;

lazy_static! {
    // Echuca-Moama - Melbourne via Shepparton
    static ref REGIONAL_VIA: Regex = Regex::new(r"^(.*\s-\s.*) via (.*)").unwrap();
    // 843-845-849-861 - Dandenong - Endeavour Hills via Doveton
    static ref BUS_NUMBERED: Regex = Regex::new(r"^([\d-]+) - (.*)").unwrap();
    // Frankston - Langwarrin (Route 789)
    static ref BUS_PARENTHESISED: Regex = Regex::new(r"^(.*) \(Routes? (.*)\)").unwrap();
    static ref BUS_COMBINED: Regex = Regex::new(r"^(.*) combined - (.*)").unwrap();
    // Geelong City - Newtown via Aberdeen St (Anticlockwise Circular - Route 36)
    static ref BUS_TRAILING_ROUTE: Regex = Regex::new(r"^.* - Route (.*)\)").unwrap();
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteName {
    pub short_name: Option<String>,
    pub long_name: String,
}

/// Derives the published route names from a free-text line name. Input that
/// matches none of the mode's patterns keeps the trimmed line name as long
/// name.
pub fn name_route(mode: Mode, line_name: &str) -> RouteName {
    let trimmed = line_name.trim();
    let fallback = RouteName {
        short_name: None,
        long_name: trimmed.to_string(),
    };

    let name = match mode {
        Mode::Train => Some(fallback.clone()),
        Mode::Tram => name_tram_route(trimmed),
        Mode::Vline => name_regional_route(trimmed),
        Mode::Bus => name_bus_route(trimmed),
    };
    let mut name = name.unwrap_or(fallback);
    if name.short_name.as_deref().is_some_and(str::is_empty) {
        name.short_name = None;
    }
    name
}

// 1 - East Coburg - South Melbourne
fn name_tram_route(line_name: &str) -> Option<RouteName> {
    let segments: Vec<&str> = line_name.split(" - ").collect();
    match segments.as_slice() {
        [number, from, to] => Some(RouteName {
            short_name: Some(number.to_string()),
            long_name: format!("{from} to {to}"),
        }),
        [number, name, ..] => Some(RouteName {
            short_name: Some(number.to_string()),
            long_name: name.to_string(),
        }),
        _ => None,
    }
}

fn name_regional_route(line_name: &str) -> Option<RouteName> {
    let caps = REGIONAL_VIA.captures(line_name)?;
    // The corridor ("A to B Line") is never published as the short name.
    Some(RouteName {
        short_name: None,
        long_name: caps[0].replace(" - ", " to "),
    })
}

fn name_bus_route(line_name: &str) -> Option<RouteName> {
    if let Some(caps) = BUS_NUMBERED.captures(line_name) {
        return Some(RouteName {
            short_name: Some(caps[1].to_string()),
            long_name: caps[2].to_string(),
        });
    }
    if let Some(caps) = BUS_PARENTHESISED.captures(line_name) {
        return Some(RouteName {
            short_name: Some(caps[2].to_string()),
            long_name: caps[1].to_string(),
        });
    }
    if let Some(caps) = BUS_COMBINED.captures(line_name) {
        return Some(RouteName {
            short_name: Some(caps[1].to_string()),
            long_name: caps[2].to_string(),
        });
    }
    BUS_TRAILING_ROUTE.captures(line_name).map(|caps| RouteName {
        short_name: Some(caps[1].to_string()),
        long_name: line_name.to_string(),
    })
}
