use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Calendar-day format used in keys and by the periodic healer.
pub const DAY_FORMAT: &str = "%Y-%m-%d";

/// Identifies one user's one calendar day of eaten-meal state.
///
/// Immutable once constructed. The local and remote stores each hold one set
/// of meal ids per key; the engine's job is to keep those two sets equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EatenMealKey {
    user_id: String,
    date: String,
}

impl EatenMealKey {
    pub fn new(user_id: impl Into<String>, date: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            date: date.into(),
        }
    }

    /// Key for a concrete calendar day, formatted as `%Y-%m-%d`.
    pub fn for_day(user_id: impl Into<String>, day: NaiveDate) -> Self {
        Self {
            user_id: user_id.into(),
            date: day.format(DAY_FORMAT).to_string(),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn date(&self) -> &str {
        &self.date
    }
}

impl fmt::Display for EatenMealKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.user_id, self.date)
    }
}

/// The two idempotent remote mutations.
///
/// Applying the same `Save` (or `Remove`) twice is a no-op beyond the first,
/// which is what lets the queue tolerate duplicates and redelivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationKind {
    Save,
    Remove,
}

/// An intended remote mutation that has not been confirmed yet.
///
/// Created when an immediate remote apply fails or the device is offline;
/// destroyed on successful replay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingOperation {
    pub kind: OperationKind,
    pub key: EatenMealKey,
    pub meal_id: String,
}

impl PendingOperation {
    pub fn save(key: EatenMealKey, meal_id: impl Into<String>) -> Self {
        Self {
            kind: OperationKind::Save,
            key,
            meal_id: meal_id.into(),
        }
    }

    pub fn remove(key: EatenMealKey, meal_id: impl Into<String>) -> Self {
        Self {
            kind: OperationKind::Remove,
            key,
            meal_id: meal_id.into(),
        }
    }
}

impl fmt::Display for PendingOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            OperationKind::Save => "save",
            OperationKind::Remove => "remove",
        };
        write!(f, "{} {} for {}", kind, self.meal_id, self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn for_day_formats_as_iso_date() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
        let key = EatenMealKey::for_day("user-42", day);
        assert_eq!(key.date(), "2024-01-03");
        assert_eq!(key.to_string(), "user-42/2024-01-03");
    }

    #[test]
    fn pending_operation_display_names_the_mutation() {
        let op = PendingOperation::remove(EatenMealKey::new("u", "2024-01-03"), "meal-1");
        assert_eq!(op.to_string(), "remove meal-1 for u/2024-01-03");
    }
}
