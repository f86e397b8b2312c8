use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

/// Backend ids are integers; entries created while the backend was
/// unreachable carry a local uuid until they are migrated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HolidayId {
    Remote(u64),
    Local(Uuid),
}

impl HolidayId {
    pub fn new_local() -> Self {
        HolidayId::Local(Uuid::new_v4())
    }

    pub fn is_local(&self) -> bool {
        matches!(self, HolidayId::Local(_))
    }
}

impl fmt::Display for HolidayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HolidayId::Remote(id) => write!(f, "{}", id),
            HolidayId::Local(id) => write!(f, "{}", id),
        }
    }
}

impl FromStr for HolidayId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(id) = s.parse::<u64>() {
            return Ok(HolidayId::Remote(id));
        }
        Uuid::parse_str(s)
            .map(HolidayId::Local)
            .map_err(|_| format!("invalid holiday id '{}'", s))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "id": 3,
    "name": "New Year Day",
    "date": "2024-01-01",
    "description": "Default New Year Day holiday"
}))]
pub struct Holiday {
    #[schema(value_type = String)]
    pub id: HolidayId,
    pub name: String,
    #[schema(example = "2024-01-01", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Body of `POST /holidays`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NewHoliday {
    #[schema(example = "Independence Day")]
    pub name: String,
    #[schema(example = "2024-03-26", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl NewHoliday {
    pub fn into_local(self) -> Holiday {
        Holiday {
            id: HolidayId::new_local(),
            name: self.name,
            date: self.date,
            description: self.description,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_round_trip_through_paths() {
        assert_eq!("42".parse::<HolidayId>().unwrap(), HolidayId::Remote(42));

        let local = HolidayId::new_local();
        assert!(local.is_local());
        assert_eq!(local.to_string().parse::<HolidayId>().unwrap(), local);
        assert!("not-an-id".parse::<HolidayId>().is_err());
    }

    #[test]
    fn backend_holiday_payload_deserializes() {
        let raw = r#"{
            "id": 7,
            "name": "Christmas Day",
            "date": "2024-12-25",
            "description": null,
            "is_recurring": false,
            "created_by": "admin",
            "created_at": "2024-01-02T10:00:00"
        }"#;
        let holiday: Holiday = serde_json::from_str(raw).unwrap();
        assert_eq!(holiday.id, HolidayId::Remote(7));
        assert_eq!(holiday.date, NaiveDate::from_ymd_opt(2024, 12, 25).unwrap());
        assert_eq!(holiday.description, None);
    }
}
