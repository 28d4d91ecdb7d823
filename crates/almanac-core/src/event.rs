use std::fmt;

use chrono::{Duration, NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::datekey::date_key_serde;

/// Event identifier as it appears in the source data: either a number or a string.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(untagged)]
pub enum EventId {
    Int(u64),
    Text(String),
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventId::Int(value) => write!(f, "{value}"),
            EventId::Text(value) => f.write_str(value),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: EventId,

    #[serde(with = "date_key_serde")]
    pub date: NaiveDate,

    #[serde(with = "clock_time_serde")]
    pub start_time: NaiveTime,

    #[serde(default, with = "clock_time_serde::option", skip_serializing_if = "Option::is_none")]
    pub end_time: Option<NaiveTime>,

    pub duration_minutes: u32,

    pub title: String,

    pub color: String,
}

impl Event {
    pub fn new(
        id: impl Into<EventId>,
        date: NaiveDate,
        start_time: NaiveTime,
        duration_minutes: u32,
        title: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            date,
            start_time,
            end_time: None,
            duration_minutes,
            title: title.into(),
            color: String::new(),
        }
    }

    /// Minutes since midnight at which the event starts.
    pub fn start_minute(&self) -> u32 {
        self.start_time.hour() * 60 + self.start_time.minute()
    }

    /// Exclusive end of the event's minute range. May run past midnight.
    pub fn end_minute(&self) -> u32 {
        self.start_minute().saturating_add(self.duration_minutes)
    }

    /// End time for display: the supplied `endTime`, else start plus duration on the clock face.
    pub fn display_end(&self) -> NaiveTime {
        self.end_time.unwrap_or_else(|| {
            let (end, _) = self
                .start_time
                .overflowing_add_signed(Duration::minutes(i64::from(self.duration_minutes)));
            end
        })
    }
}

impl From<u64> for EventId {
    fn from(value: u64) -> Self {
        EventId::Int(value)
    }
}

impl From<&str> for EventId {
    fn from(value: &str) -> Self {
        EventId::Text(value.to_string())
    }
}

impl From<String> for EventId {
    fn from(value: String) -> Self {
        EventId::Text(value)
    }
}

pub mod clock_time_serde {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const CLOCK_FORMAT: &str = "%H:%M";

    pub fn serialize<S>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&time.format(CLOCK_FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(raw.trim(), CLOCK_FORMAT)
            .map_err(|err| serde::de::Error::custom(format!("invalid HH:MM time {raw:?}: {err}")))
    }

    pub mod option {
        use chrono::NaiveTime;
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S>(time: &Option<NaiveTime>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match time {
                Some(value) => super::serialize(value, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveTime>, D::Error>
        where
            D: Deserializer<'de>,
        {
            let opt = Option::<String>::deserialize(deserializer)?;
            match opt {
                Some(raw) => NaiveTime::parse_from_str(raw.trim(), super::CLOCK_FORMAT)
                    .map(Some)
                    .map_err(|err| {
                        serde::de::Error::custom(format!("invalid HH:MM time {raw:?}: {err}"))
                    }),
                None => Ok(None),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveTime};

    use super::{Event, EventId};

    fn at(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0).expect("valid time")
    }

    #[test]
    fn deserializes_camel_case_wire_format() {
        let raw = r##"{
            "id": 7,
            "date": "2025-06-15",
            "startTime": "09:30",
            "endTime": "10:00",
            "durationMinutes": 30,
            "title": "Standup",
            "color": "#3b82f6"
        }"##;
        let event: Event = serde_json::from_str(raw).expect("parse event");

        assert_eq!(event.id, EventId::Int(7));
        assert_eq!(event.date, NaiveDate::from_ymd_opt(2025, 6, 15).expect("valid date"));
        assert_eq!(event.start_minute(), 9 * 60 + 30);
        assert_eq!(event.end_minute(), 10 * 60);
        assert_eq!(event.end_time, Some(at(10, 0)));
        assert_eq!(event.color, "#3b82f6");
    }

    #[test]
    fn accepts_string_ids_and_missing_end_time() {
        let raw = r#"{"id":"evt-1","date":"2025-06-15","startTime":"23:30","durationMinutes":90,"title":"Late","color":"red"}"#;
        let event: Event = serde_json::from_str(raw).expect("parse event");

        assert_eq!(event.id, EventId::Text("evt-1".to_string()));
        assert_eq!(event.end_time, None);
        assert_eq!(event.end_minute(), 23 * 60 + 30 + 90);
        assert_eq!(event.display_end(), at(1, 0));
    }

    #[test]
    fn rejects_malformed_fields() {
        let bad_time = r#"{"id":1,"date":"2025-06-15","startTime":"9h","durationMinutes":10,"title":"x","color":"y"}"#;
        assert!(serde_json::from_str::<Event>(bad_time).is_err());

        let bad_date = r#"{"id":1,"date":"06/15/2025","startTime":"09:00","durationMinutes":10,"title":"x","color":"y"}"#;
        assert!(serde_json::from_str::<Event>(bad_date).is_err());

        let negative = r#"{"id":1,"date":"2025-06-15","startTime":"09:00","durationMinutes":-5,"title":"x","color":"y"}"#;
        assert!(serde_json::from_str::<Event>(negative).is_err());
    }

    #[test]
    fn serializes_back_to_wire_names() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 15).expect("valid date");
        let event = Event::new(3_u64, date, at(8, 5), 45, "Review");
        let value = serde_json::to_value(&event).expect("serialize");

        assert_eq!(value["date"], "2025-06-15");
        assert_eq!(value["startTime"], "08:05");
        assert_eq!(value["durationMinutes"], 45);
        assert!(value.get("endTime").is_none());
    }
}
