use chrono::{Local, TimeZone};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::types::{put, put_opt, Chunk, Metadata, SourceType, SOURCE_TYPE, SOURCE_URL, TITLE};

/// Messages further apart than this start a new conversation group.
pub const GROUP_GAP_SECS: f64 = 3600.0;

/// One chat message as exported from Slack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlackMessage {
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub text: String,
    /// Epoch seconds as exported, e.g. `"1700000000.000200"`.
    #[serde(deserialize_with = "raw_timestamp")]
    pub ts: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_ts: Option<String>,
}

impl SlackMessage {
    pub fn new(user: impl Into<String>, text: impl Into<String>, ts: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            text: text.into(),
            ts: ts.into(),
            thread_ts: None,
        }
    }

    fn user_or_unknown(&self) -> &str {
        if self.user.trim().is_empty() {
            "unknown"
        } else {
            &self.user
        }
    }

    /// Numeric timestamp; unparsable values compare as zero.
    fn epoch(&self) -> f64 {
        self.ts.trim().parse().unwrap_or(0.0)
    }
}

/// Accepts the timestamp as either a JSON string or a JSON number.
fn raw_timestamp<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number timestamp, got {other}"
        ))),
    }
}

#[derive(Debug)]
struct Group<'a> {
    messages: Vec<&'a SlackMessage>,
    participants: Vec<&'a str>,
}

impl<'a> Group<'a> {
    fn start(first: &'a SlackMessage) -> Self {
        Self {
            messages: vec![first],
            participants: vec![first.user_or_unknown()],
        }
    }

    fn push(&mut self, message: &'a SlackMessage) {
        let user = message.user_or_unknown();
        if !self.participants.contains(&user) {
            self.participants.push(user);
        }
        self.messages.push(message);
    }

    fn first(&self) -> &SlackMessage {
        self.messages[0]
    }

    fn last(&self) -> &SlackMessage {
        self.messages[self.messages.len() - 1]
    }

    fn thread_ts(&self) -> &str {
        let first = self.first();
        first.thread_ts.as_deref().unwrap_or(&first.ts)
    }

    fn render(&self) -> String {
        self.messages
            .iter()
            .map(|m| format!("[{}] {}: {}", format_timestamp(&m.ts), m.user_or_unknown(), m.text))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn group_messages(messages: &[SlackMessage]) -> Vec<Group<'_>> {
    let mut groups: Vec<Group<'_>> = Vec::new();
    for message in messages {
        match groups.last_mut() {
            Some(group) if message.epoch() - group.last().epoch() <= GROUP_GAP_SECS => {
                group.push(message)
            }
            _ => groups.push(Group::start(message)),
        }
    }
    groups
}

/// `YYYY-MM-DD HH:MM` in local time, or the raw string when it is not an
/// epoch timestamp.
pub fn format_timestamp(ts: &str) -> String {
    let Ok(secs) = ts.trim().parse::<f64>() else {
        return ts.to_string();
    };
    if !secs.is_finite() {
        return ts.to_string();
    }
    let whole = secs.floor();
    let nanos = ((secs - whole) * 1e9) as u32;
    match Local.timestamp_opt(whole as i64, nanos).single() {
        Some(dt) => dt.format("%Y-%m-%d %H:%M").to_string(),
        None => ts.to_string(),
    }
}

pub(crate) fn chunk_slack(messages: &[SlackMessage], channel: Option<&str>) -> Vec<Chunk> {
    let channel = channel.map(str::trim).filter(|c| !c.is_empty());

    group_messages(messages)
        .iter()
        .enumerate()
        .map(|(i, group)| {
            let mut meta = Metadata::new();
            put(&mut meta, SOURCE_TYPE, SourceType::Slack.as_str());
            put_opt(&mut meta, "channel", channel);
            put(&mut meta, "thread_ts", group.thread_ts());
            put(&mut meta, "message_count", group.messages.len());
            put(
                &mut meta,
                "participants",
                group
                    .participants
                    .iter()
                    .map(|p| Value::String(p.to_string()))
                    .collect::<Vec<_>>(),
            );
            put(&mut meta, "start_time", group.first().ts.as_str());
            put(&mut meta, "end_time", group.last().ts.as_str());
            let title = match channel {
                Some(c) => format!("Slack discussion in #{c}"),
                None => format!("Slack thread {}", i + 1),
            };
            put(&mut meta, TITLE, title);
            put(
                &mut meta,
                SOURCE_URL,
                format!(
                    "slack://channel/{}/thread/{}",
                    channel.unwrap_or(""),
                    group.thread_ts()
                ),
            );
            Chunk::new(group.render(), meta)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::types::meta_str;

    #[test]
    fn test_gap_splits_groups() {
        let messages = vec![
            SlackMessage::new("alice", "deploy is red", "0"),
            SlackMessage::new("bob", "looking", "5000"),
        ];
        assert_eq!(chunk_slack(&messages, Some("eng")).len(), 2);

        let messages = vec![
            SlackMessage::new("alice", "deploy is red", "0"),
            SlackMessage::new("bob", "looking", "1000"),
        ];
        assert_eq!(chunk_slack(&messages, Some("eng")).len(), 1);
    }

    #[test]
    fn test_gap_is_measured_from_last_message_in_group() {
        let messages = vec![
            SlackMessage::new("a", "one", "0"),
            SlackMessage::new("b", "two", "3000"),
            SlackMessage::new("a", "three", "6000"),
        ];
        assert_eq!(chunk_slack(&messages, None).len(), 1);
    }

    #[test]
    fn test_group_metadata() {
        let mut first = SlackMessage::new("alice", "how do I rotate keys?", "1700000000.000100");
        first.thread_ts = Some("1699999999.000000".into());
        let messages = vec![
            first,
            SlackMessage::new("bob", "run make rotate", "1700000060.000200"),
            SlackMessage::new("alice", "thanks", "1700000120.000300"),
        ];
        let chunks = chunk_slack(&messages, Some("#ops".trim_start_matches('#')));
        assert_eq!(chunks.len(), 1);

        let meta = &chunks[0].metadata;
        assert_eq!(chunks[0].source_type(), Some("slack"));
        assert_eq!(chunks[0].title(), Some("Slack discussion in #ops"));
        assert_eq!(
            chunks[0].source_url(),
            Some("slack://channel/ops/thread/1699999999.000000")
        );
        assert_eq!(meta["message_count"], 3);
        assert_eq!(meta["participants"], serde_json::json!(["alice", "bob"]));
        assert_eq!(meta_str(meta, "start_time"), Some("1700000000.000100"));
        assert_eq!(meta_str(meta, "end_time"), Some("1700000120.000300"));
        assert_eq!(chunks[0].text.lines().count(), 3);
    }

    #[test]
    fn test_rendering_uses_local_time_or_raw() {
        let messages = vec![
            SlackMessage::new("alice", "hello", "1700000000"),
            SlackMessage::new("", "anon", "yesterday"),
        ];
        let chunks = chunk_slack(&messages, None);
        let expected_time = Local
            .timestamp_opt(1_700_000_000, 0)
            .unwrap()
            .format("%Y-%m-%d %H:%M")
            .to_string();

        // "yesterday" compares as 0, so it joins the first group
        assert_eq!(chunks.len(), 1);
        assert_eq!(
            chunks[0].text,
            format!("[{expected_time}] alice: hello\n[yesterday] unknown: anon")
        );
        assert_eq!(chunks[0].title(), Some("Slack thread 1"));
        assert_eq!(chunks[0].source_url(), Some("slack://channel//thread/1700000000"));
    }

    #[test]
    fn test_empty_messages() {
        assert!(chunk_slack(&[], Some("eng")).is_empty());
    }

    #[test]
    fn test_deserialize_numeric_and_string_ts() {
        let json = r#"[{"user":"a","text":"x","ts":1700000000.5},{"user":"b","text":"y","ts":"12","thread_ts":"10"}]"#;
        let messages: Vec<SlackMessage> = serde_json::from_str(json).unwrap();
        assert_eq!(messages[0].ts, "1700000000.5");
        assert_eq!(messages[1].thread_ts.as_deref(), Some("10"));
    }
}
