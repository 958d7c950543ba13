use std::collections::HashMap;
use tracing::{debug, info};

use crate::error::InputError;

/// A registered badge holder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub badge_id: String,
    pub display_name: String,
    pub message_fragment: String,
}

impl UserRecord {
    /// Text shown for this user in the listing
    pub fn listing_line(&self) -> String {
        format!(
            "{}: {} - {}",
            self.badge_id, self.display_name, self.message_fragment
        )
    }
}

/// In-memory badge registry.
///
/// Every visible row stores the key it was created for, so deleting by row
/// never depends on map iteration order.
#[derive(Debug, Default)]
pub struct UserRegistry {
    records: HashMap<String, UserRecord>,
    rows: Vec<String>,
}

impl UserRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user, overwriting any record with the same badge id.
    /// Fields are trimmed and none may be empty.
    pub fn add(
        &mut self,
        badge_id: &str,
        display_name: &str,
        message_fragment: &str,
    ) -> Result<&UserRecord, InputError> {
        let badge_id = badge_id.trim();
        let display_name = display_name.trim();
        let message_fragment = message_fragment.trim();

        if badge_id.is_empty() || display_name.is_empty() || message_fragment.is_empty() {
            return Err(InputError::MissingField);
        }

        let record = UserRecord {
            badge_id: badge_id.to_string(),
            display_name: display_name.to_string(),
            message_fragment: message_fragment.to_string(),
        };

        if self.records.insert(badge_id.to_string(), record).is_some() {
            debug!("Overwrote existing record for badge {}", badge_id);
        } else {
            self.rows.push(badge_id.to_string());
        }
        info!("Registered user {} ({})", display_name, badge_id);

        Ok(&self.records[badge_id])
    }

    /// Remove the user shown at `selected`
    pub fn remove(&mut self, selected: Option<usize>) -> Result<UserRecord, InputError> {
        let index = selected
            .filter(|&i| i < self.rows.len())
            .ok_or(InputError::NoSelection)?;

        let badge_id = self.rows.remove(index);
        let record = self
            .records
            .remove(&badge_id)
            .ok_or(InputError::NoSelection)?;
        info!("Removed user {} ({})", record.display_name, badge_id);
        Ok(record)
    }

    pub fn get(&self, badge_id: &str) -> Option<&UserRecord> {
        self.records.get(badge_id)
    }

    /// Records in listing order
    pub fn rows(&self) -> impl Iterator<Item = &UserRecord> {
        self.rows.iter().filter_map(|key| self.records.get(key))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
