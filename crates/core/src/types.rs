/// All entity identifiers are application-generated UUIDv4s, never
/// store-generated sequences.
pub type Id = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Calendar dates (attendance dates, birthdates) carry no time zone.
pub type Date = chrono::NaiveDate;
