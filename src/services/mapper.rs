/// Raw provider record mapping; missing or malformed fields map to absent values
use crate::domain::{
    AirlineInfo, AirportRef, FlightNumberInfo, HistoryRecord, NormalizedFlightState, Position,
    RawFlight,
};
use crate::utils::{feet_to_meters, fpm_to_mps, knots_to_mps, unix_seconds};
use chrono::NaiveDate;

fn normalized_icao24(raw: &RawFlight) -> String {
    raw.icao24().map(str::to_lowercase).unwrap_or_default()
}

fn trimmed_callsign(raw: &RawFlight) -> Option<String> {
    raw.flight_iata()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

pub fn to_flight_state(raw: &RawFlight) -> NormalizedFlightState {
    let mut state = NormalizedFlightState {
        icao24: normalized_icao24(raw),
        callsign: trimmed_callsign(raw),
        origin_country: raw
            .airline
            .as_ref()
            .and_then(|a| a.name.clone())
            .unwrap_or_default(),
        ..Default::default()
    };

    // Every telemetry field comes from the same live block or none at all.
    if let Some(live) = &raw.live {
        let altitude = feet_to_meters(live.altitude);
        state.last_contact = live.updated.as_deref().and_then(unix_seconds);
        state.position = match (live.latitude, live.longitude) {
            (Some(latitude), Some(longitude)) => Some(Position {
                latitude,
                longitude,
            }),
            _ => None,
        };
        state.baro_altitude = altitude;
        state.geo_altitude = altitude;
        // Unknown ground state counts as airborne.
        state.on_ground = live.is_ground.unwrap_or(false);
        state.velocity = knots_to_mps(live.speed_horizontal);
        state.true_track = live.direction;
        state.vertical_rate = fpm_to_mps(live.speed_vertical);
    }

    state
}

/// Map a record returned for `queried` into a history entry
pub fn to_history_record(raw: &RawFlight, queried: NaiveDate) -> HistoryRecord {
    HistoryRecord {
        icao24: normalized_icao24(raw),
        flight_date: raw
            .flight_date
            .clone()
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| queried.format("%Y-%m-%d").to_string()),
        callsign: trimmed_callsign(raw),
        airline: raw.airline.as_ref().map(|a| AirlineInfo {
            name: a.name.clone(),
            iata: a.iata.clone(),
            icao: a.icao.clone(),
        }),
        flight: raw.flight.as_ref().map(|f| FlightNumberInfo {
            number: f.number.clone(),
            iata: f.iata.clone(),
            icao: f.icao.clone(),
        }),
        departure: raw.departure.as_ref().map(|d| AirportRef {
            airport: d.airport.clone(),
        }),
        arrival: raw.arrival.as_ref().map(|a| AirportRef {
            airport: a.airport.clone(),
        }),
    }
}
