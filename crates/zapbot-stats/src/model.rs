//! Per-group aggregate records.
//!
//! Field names serialize in camelCase so snapshots written by earlier
//! deployments of the bot load unchanged.

use chrono::{DateTime, Local, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::extract::{extract_emojis, extract_words, is_significant};

/// Number of hour-of-day buckets.
pub const HOURS: usize = 24;

/// Activity of one user inside one group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    /// Last observed display name.
    pub name: String,
    pub message_count: u64,
    pub word_count: u64,
    /// Characters sent, counted as Unicode scalar values.
    pub character_count: u64,
    pub last_activity: DateTime<Utc>,
    /// `YYYY-MM-DD` → messages sent that day.
    #[serde(default)]
    pub day_activity: HashMap<String, u64>,
}

impl UserStats {
    fn new(name: &str, now: DateTime<Utc>) -> Self {
        Self {
            name: name.to_string(),
            message_count: 0,
            word_count: 0,
            character_count: 0,
            last_activity: now,
            day_activity: HashMap::new(),
        }
    }

    /// Mean characters per message; 0 before the first message.
    pub fn average_message_length(&self) -> f64 {
        if self.message_count == 0 {
            return 0.0;
        }
        self.character_count as f64 / self.message_count as f64
    }

    /// Number of distinct days with at least one message.
    pub fn active_days(&self) -> usize {
        self.day_activity.len()
    }

    /// Messages per active day; 0 when the user has no active days.
    pub fn messages_per_day(&self) -> f64 {
        match self.active_days() {
            0 => 0.0,
            days => self.message_count as f64 / days as f64,
        }
    }
}

/// Rolling statistics of one group chat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupStats {
    pub group_name: String,
    pub total_messages: u64,
    pub total_words: u64,
    pub total_participants: u64,
    /// First observation of the group. Never changes afterwards.
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    #[serde(default)]
    pub users: HashMap<String, UserStats>,
    #[serde(default)]
    pub word_frequency: HashMap<String, u64>,
    /// Messages per local hour of day, index 0–23.
    #[serde(default)]
    pub messages_by_hour: [u64; HOURS],
    /// `YYYY-MM-DD` → messages that day.
    #[serde(default)]
    pub messages_by_day: HashMap<String, u64>,
    #[serde(default)]
    pub top_emojis: HashMap<String, u64>,
}

impl GroupStats {
    pub fn new(group_name: &str, now: DateTime<Utc>) -> Self {
        Self {
            group_name: group_name.to_string(),
            total_messages: 0,
            total_words: 0,
            total_participants: 0,
            created_at: now,
            last_activity: now,
            users: HashMap::new(),
            word_frequency: HashMap::new(),
            messages_by_hour: [0; HOURS],
            messages_by_day: HashMap::new(),
            top_emojis: HashMap::new(),
        }
    }

    /// Fold one plain (non-command) message into every counter.
    ///
    /// The day key is the UTC calendar date of `now`; the hour bucket is
    /// the local hour of `now`.
    pub(crate) fn fold(
        &mut self,
        user_id: &str,
        user_name: &str,
        text: &str,
        group_name: &str,
        now: DateTime<Utc>,
    ) {
        let day = now.format("%Y-%m-%d").to_string();
        let hour = now.with_timezone(&Local).hour() as usize;
        let words = extract_words(text);

        self.group_name = group_name.to_string();

        if !self.users.contains_key(user_id) {
            self.total_participants += 1;
        }
        let user = self
            .users
            .entry(user_id.to_string())
            .or_insert_with(|| UserStats::new(user_name, now));
        user.name = user_name.to_string();
        user.message_count += 1;
        user.word_count += words.len() as u64;
        user.character_count += text.chars().count() as u64;
        user.last_activity = now;
        *user.day_activity.entry(day.clone()).or_insert(0) += 1;

        for word in words.iter().filter(|w| is_significant(w)) {
            *self.word_frequency.entry(word.clone()).or_insert(0) += 1;
        }
        for emoji in extract_emojis(text) {
            *self.top_emojis.entry(emoji).or_insert(0) += 1;
        }

        self.total_messages += 1;
        self.total_words += words.len() as u64;
        self.last_activity = now;
        self.messages_by_hour[hour % HOURS] += 1;
        *self.messages_by_day.entry(day).or_insert(0) += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 17, h, 30, 0).unwrap()
    }

    #[test]
    fn test_fold_updates_group_and_user() {
        let mut g = GroupStats::new("Grupo X", at(10));
        g.fold("a", "Ana", "bom dia pessoal 😀", "Grupo X", at(10));

        assert_eq!(g.total_messages, 1);
        assert_eq!(g.total_words, 3);
        assert_eq!(g.total_participants, 1);
        assert_eq!(g.messages_by_day.get("2024-05-17"), Some(&1));
        assert_eq!(g.messages_by_hour.iter().sum::<u64>(), 1);
        assert_eq!(g.top_emojis.get("😀"), Some(&1));
        assert_eq!(g.word_frequency.get("dia"), Some(&1));
        assert_eq!(g.word_frequency.get("pessoal"), Some(&1));
        assert_eq!(g.word_frequency.get("bom"), Some(&1));
        assert_eq!(g.word_frequency.len(), 3);

        let ana = &g.users["a"];
        assert_eq!(ana.message_count, 1);
        assert_eq!(ana.word_count, 3);
        assert_eq!(ana.character_count, 17);
        assert_eq!(ana.day_activity.get("2024-05-17"), Some(&1));
    }

    #[test]
    fn test_fold_hour_bucket_is_local_hour() {
        let now = at(23);
        let mut g = GroupStats::new("g", now);
        g.fold("a", "Ana", "oi", "g", now);
        let local_hour = now.with_timezone(&Local).hour() as usize;
        assert_eq!(g.messages_by_hour[local_hour], 1);
    }

    #[test]
    fn test_fold_overwrites_names_keeps_created_at() {
        let mut g = GroupStats::new("Antigo", at(8));
        g.fold("a", "Ana", "primeira", "Antigo", at(8));
        g.fold("a", "Ana Maria", "segunda", "Novo Nome", at(9));

        assert_eq!(g.group_name, "Novo Nome");
        assert_eq!(g.users["a"].name, "Ana Maria");
        assert_eq!(g.created_at, at(8));
        assert_eq!(g.last_activity, at(9));
        assert_eq!(g.users["a"].last_activity, at(9));
        assert_eq!(g.total_participants, 1);
    }

    #[test]
    fn test_average_and_per_day() {
        let mut g = GroupStats::new("g", at(8));
        g.fold("a", "Ana", "abcd", "g", at(8));
        g.fold("a", "Ana", "ab", "g", at(9));
        let ana = &g.users["a"];
        assert_eq!(ana.average_message_length(), 3.0);
        assert_eq!(ana.active_days(), 1);
        assert_eq!(ana.messages_per_day(), 2.0);

        let empty = UserStats::new("x", at(8));
        assert_eq!(empty.average_message_length(), 0.0);
        assert_eq!(empty.messages_per_day(), 0.0);
    }

    #[test]
    fn test_deserialize_legacy_snapshot() {
        let json = r#"{
            "groupName": "Grupo X",
            "totalMessages": 2,
            "totalWords": 3,
            "totalParticipants": 1,
            "createdAt": "2024-05-01T12:00:00.000Z",
            "lastActivity": "2024-05-02T08:15:00.000Z",
            "users": {
                "5511@c.us": {
                    "name": "Ana",
                    "messageCount": 2,
                    "wordCount": 3,
                    "characterCount": 14,
                    "lastActivity": "2024-05-02T08:15:00.000Z",
                    "averageMessageLength": 7,
                    "mostActiveHour": 0,
                    "dayActivity": {"2024-05-01": 1, "2024-05-02": 1}
                }
            },
            "wordFrequency": {"pessoal": 1},
            "messagesByHour": [0,0,0,0,0,0,0,0,1,1,0,0,0,0,0,0,0,0,0,0,0,0,0,0],
            "messagesByDay": {"2024-05-01": 1, "2024-05-02": 1},
            "topEmojis": {}
        }"#;
        let g: GroupStats = serde_json::from_str(json).unwrap();
        assert_eq!(g.total_messages, 2);
        assert_eq!(g.users["5511@c.us"].average_message_length(), 7.0);
        assert_eq!(g.messages_by_hour[8], 1);
        assert_eq!(
            g.created_at,
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_wrong_hour_array_length_is_rejected() {
        let mut value = serde_json::to_value(GroupStats::new("g", at(1))).unwrap();
        value["messagesByHour"] = serde_json::json!([0, 0, 0]);
        assert!(serde_json::from_value::<GroupStats>(value).is_err());
    }
}
