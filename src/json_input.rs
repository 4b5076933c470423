use num_rational::Rational32;
use serde_json::{Map, Value};

use super::key::{NamedNote, Note};
use super::score::{DeclaredKey, Event, KeySignature, Part, QuarterLength, Score, Tie, TimeSignature};

// This is the definition of the JSON data format for one score.
//
// Score    = { "id": String, "time_signatures": [ Ratio* ], "key_signatures": [ int* ],
//              "key"?: { "tonic": String, "mode": String }, "parts": [ Part* ] }
// Ratio    = "n/d"
// Part     = { "id": String, "events": [ Event* ] }
// Event    = [ Pitch, Duration ]
//          | { "pitch": Pitch, "duration": Duration, "fermata"?: bool, "tie"?: Tie }
// Pitch    = null | "" | int (MIDI) | String (note name, e.g. "B-3")
// Duration = number | String ("1/3")
// Tie      = "start" | "continue" | "stop"

pub fn parse_score(input: &str) -> Result<Score, String> {
    let json: Value =
        serde_json::from_str(input).map_err(|err| format!("Could not parse JSON: {}", err))?;

    let score_json = json
        .as_object()
        .ok_or_else(|| "Score should be a JSON object!".to_string())?;

    let mut id: Option<String> = None;
    let mut time_signatures: Vec<TimeSignature> = Vec::new();
    let mut key_signatures: Vec<KeySignature> = Vec::new();
    let mut declared_key: Option<DeclaredKey> = None;
    let mut parts: Option<Vec<Part>> = None;

    for (key, value) in score_json {
        match key.as_str() {
            "id" => {
                id = Some(
                    value
                        .as_str()
                        .ok_or_else(|| "ID should be a string!")?
                        .to_string(),
                );
            }
            "time_signatures" => {
                time_signatures = as_array(value, "time_signatures")?
                    .iter()
                    .map(parse_time_signature)
                    .collect::<Result<_, _>>()?;
            }
            "key_signatures" => {
                key_signatures = as_array(value, "key_signatures")?
                    .iter()
                    .map(parse_key_signature)
                    .collect::<Result<_, _>>()?;
            }
            "key" => {
                declared_key = Some(parse_declared_key(value)?);
            }
            "parts" => {
                parts = Some(
                    as_array(value, "parts")?
                        .iter()
                        .map(parse_part)
                        .collect::<Result<_, _>>()?,
                );
            }
            other => {
                return Err(format!("Incorrect key in JSON: {}", other));
            }
        };
    }

    if let (Some(id), Some(parts)) = (id, parts) {
        Ok(Score {
            id,
            parts,
            time_signatures,
            key_signatures,
            declared_key,
        })
    } else {
        Err("A score needs an id and parts!".to_string())
    }
}

fn as_array<'a>(value: &'a Value, what: &str) -> Result<&'a Vec<Value>, String> {
    value
        .as_array()
        .ok_or_else(|| format!("{} should be an array!", what))
}

fn as_object<'a>(value: &'a Value, what: &str) -> Result<&'a Map<String, Value>, String> {
    value
        .as_object()
        .ok_or_else(|| format!("{} should be a JSON object!", what))
}

fn parse_time_signature(value: &Value) -> Result<TimeSignature, String> {
    let ratio = value
        .as_str()
        .ok_or_else(|| "Time signature should be a string!")?;
    let (numerator, denominator) = ratio
        .split_once('/')
        .ok_or_else(|| format!("Invalid time signature: {}", ratio))?;
    let numerator = str::parse::<u8>(numerator).map_err(|_| format!("Invalid time signature: {}", ratio))?;
    let denominator =
        str::parse::<u8>(denominator).map_err(|_| format!("Invalid time signature: {}", ratio))?;
    Ok(TimeSignature {
        numerator,
        denominator,
    })
}

fn parse_key_signature(value: &Value) -> Result<KeySignature, String> {
    let sharps = value
        .as_i64()
        .ok_or_else(|| "Key signature should be an int!")?;
    let sharps = i8::try_from(sharps).map_err(|_| "Could not convert key signature to i8!")?;
    if sharps.abs() > 7 {
        return Err(format!("Key signature out of range: {}", sharps));
    }
    Ok(KeySignature { sharps })
}

fn parse_declared_key(value: &Value) -> Result<DeclaredKey, String> {
    let key_json = as_object(value, "key")?;
    let field = |name: &str| -> Result<String, String> {
        key_json
            .get(name)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| format!("key.{} should be a string!", name))
    };
    Ok(DeclaredKey {
        tonic: field("tonic")?,
        mode: field("mode")?,
    })
}

fn parse_part(value: &Value) -> Result<Part, String> {
    let part_json = as_object(value, "Each part")?;
    let id = part_json
        .get("id")
        .and_then(Value::as_str)
        .ok_or_else(|| "Part ID should be a string!")?
        .to_string();
    let events = match part_json.get("events") {
        Some(events) => as_array(events, "events")?
            .iter()
            .map(parse_event)
            .collect::<Result<_, _>>()
            .map_err(|err| format!("In part {:?}: {}", id, err))?,
        None => Vec::new(),
    };
    Ok(Part { id, events })
}

fn parse_event(value: &Value) -> Result<Event, String> {
    match value {
        Value::Array(pair) => match pair.as_slice() {
            [pitch, duration] => Ok(Event {
                pitch: parse_pitch(pitch)?,
                duration: parse_duration(duration)?,
                fermata: false,
                tie: None,
            }),
            _ => Err("Event arrays should be [pitch, duration]!".to_string()),
        },
        Value::Object(event_json) => {
            let mut pitch: Option<Option<Note>> = None;
            let mut duration: Option<QuarterLength> = None;
            let mut fermata = false;
            let mut tie: Option<Tie> = None;
            for (key, value) in event_json {
                match key.as_str() {
                    "pitch" => pitch = Some(parse_pitch(value)?),
                    "duration" => duration = Some(parse_duration(value)?),
                    "fermata" => {
                        fermata = value.as_bool().ok_or_else(|| "fermata should be a bool!")?;
                    }
                    "tie" => tie = parse_tie(value)?,
                    other => return Err(format!("Incorrect key in event: {}", other)),
                }
            }
            let duration = duration.ok_or_else(|| "Event needs a duration!")?;
            Ok(Event {
                pitch: pitch.flatten(),
                duration,
                fermata,
                tie,
            })
        }
        _ => Err("Events must be an Array or Object!".to_string()),
    }
}

fn parse_pitch(value: &Value) -> Result<Option<Note>, String> {
    match value {
        Value::Null => Ok(None),
        Value::String(string) if string.is_empty() => Ok(None),
        Value::String(string) => {
            let note = str::parse::<NamedNote>(string)?;
            note.to_note()
                .map(Some)
                .ok_or_else(|| format!("Note out of MIDI range: {}", string))
        }
        Value::Number(num) => {
            let midi = num.as_u64().ok_or_else(|| "MIDI pitch must be a uint!")?;
            let note = u8::try_from(midi).ok().and_then(Note::new);
            note.map(Some)
                .ok_or_else(|| format!("MIDI pitch out of range: {}", midi))
        }
        _ => Err("Pitch must be null, a string or an int!".to_string()),
    }
}

fn parse_duration(value: &Value) -> Result<QuarterLength, String> {
    let duration = match value {
        Value::Number(num) => {
            let float = num.as_f64().ok_or_else(|| "Duration must be a number!")?;
            Rational32::approximate_float(float)
                .ok_or_else(|| format!("Could not represent duration {}", float))?
        }
        Value::String(string) => {
            str::parse::<Rational32>(string).map_err(|_| format!("Invalid duration: {}", string))?
        }
        _ => return Err("Duration must be a number or a string!".to_string()),
    };
    if duration <= Rational32::from_integer(0) {
        return Err(format!("Duration must be positive: {}", duration));
    }
    Ok(duration)
}

fn parse_tie(value: &Value) -> Result<Option<Tie>, String> {
    match value {
        Value::Null => Ok(None),
        Value::String(tie) => match tie.as_str() {
            "start" => Ok(Some(Tie::Start)),
            "continue" => Ok(Some(Tie::Continue)),
            "stop" => Ok(Some(Tie::Stop)),
            other => Err(format!("Invalid tie: {}", other)),
        },
        _ => Err("tie should be a string!".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::format_quarter_length;

    #[test]
    fn can_load_score() {
        let data = r#"
        {
            "id": "bwv253",
            "time_signatures": ["4/4"],
            "key_signatures": [1],
            "key": {"tonic": "G", "mode": "major"},
            "parts": [
                {
                    "id": "S.",
                    "events": [
                        ["G4", 1], [null, 0.5], ["", "1/3"], [67, 0.75],
                        {"pitch": "B-3", "duration": 2, "fermata": true, "tie": "start"}
                    ]
                },
                {"id": "B.", "events": []}
            ]
        }"#;

        let score = parse_score(data).unwrap();
        assert_eq!(score.id, "bwv253");
        assert_eq!(score.first_time_signature(), Some(TimeSignature::COMMON_TIME));
        assert_eq!(score.key_signatures, vec![KeySignature { sharps: 1 }]);
        assert_eq!(score.declared_key.as_ref().unwrap().tonic, "G");

        let events = &score.parts[0].events;
        let pitches: Vec<Option<u8>> = events.iter().map(|e| e.pitch.map(|n| n.midi())).collect();
        assert_eq!(pitches, [Some(67), None, None, Some(67), Some(58)]);
        let durations: Vec<String> = events.iter().map(|e| format_quarter_length(e.duration)).collect();
        assert_eq!(durations, ["1.0", "0.5", "1/3", "0.75", "2.0"]);
        assert!(events[4].fermata);
        assert_eq!(events[4].tie, Some(Tie::Start));
        assert!(score.parts[1].events.is_empty());
    }

    #[test]
    fn rejects_bad_input() {
        assert!(parse_score("[]").is_err());
        assert!(parse_score(r#"{"id": "x"}"#).is_err());
        assert!(parse_score(r#"{"id": "x", "parts": [], "tempo": 3}"#).is_err());
        assert!(parse_score(r#"{"id": "x", "parts": [{"id": "S.", "events": [[60, 0]]}]}"#).is_err());
        assert!(parse_score(r#"{"id": "x", "parts": [{"id": "S.", "events": [[200, 1]]}]}"#).is_err());
        assert!(parse_score(r#"{"id": "x", "parts": [{"id": "S.", "events": [["H4", 1]]}]}"#).is_err());
    }
}
