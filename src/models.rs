use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Highest scheduling level; reviews at this level keep re-arming the longest interval.
pub const MAX_LEVEL: u8 = 4;

// A freshly added topic is due again shortly after creation
const FIRST_REVIEW_MINUTES: i64 = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    pub id: i64,
    pub title: String,
    pub created: DateTime<Utc>,
    pub last_reviewed: DateTime<Utc>,
    pub next_review: DateTime<Utc>,
    #[serde(skip)]
    level: u8,
}

impl Topic {
    pub fn new(id: i64, title: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id,
            title: title.into(),
            created: now,
            last_reviewed: now,
            next_review: now + Duration::minutes(FIRST_REVIEW_MINUTES),
            level: 0,
        }
    }

    /// Records a review happening right now.
    pub fn reviewed(&mut self) {
        self.reviewed_at(Utc::now());
    }

    /// Records a review at `now`: the next review is scheduled from the
    /// interval of the current level, then the level moves up one step.
    pub fn reviewed_at(&mut self, now: DateTime<Utc>) {
        self.last_reviewed = now;
        self.next_review = now + review_interval(self.level);
        if self.level < MAX_LEVEL {
            self.level += 1;
        }
    }

    /// Scheduling level in `0..=MAX_LEVEL`. Read-only; only reviews move it.
    pub fn level(&self) -> u8 {
        self.level
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_review <= now
    }
}

// Spaced repetition intervals, indexed by the level before the review
pub fn review_interval(level: u8) -> Duration {
    match level {
        0 => Duration::hours(8),
        1 => Duration::hours(24),
        2 => Duration::hours(48),
        3 => Duration::days(7),
        _ => Duration::days(30),
    }
}

pub fn level_label(level: u8) -> &'static str {
    match level {
        0 => "New",
        1 => "Learning",
        2 => "Familiar",
        3 => "Comfortable",
        _ => "Long-term",
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub total_topics: usize,
    pub due_now: usize,
    pub long_term: usize,
    pub by_level: [usize; MAX_LEVEL as usize + 1],
}

impl Stats {
    pub fn from_topics(topics: &[Topic], now: DateTime<Utc>) -> Self {
        let mut stats = Stats {
            total_topics: topics.len(),
            ..Stats::default()
        };
        for topic in topics {
            if topic.is_due(now) {
                stats.due_now += 1;
            }
            if topic.level() >= MAX_LEVEL {
                stats.long_term += 1;
            }
            stats.by_level[topic.level().min(MAX_LEVEL) as usize] += 1;
        }
        stats
    }
}

// JSON output wrapper for CLI
#[derive(Debug, Serialize)]
pub struct JsonOutput<T: Serialize> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> JsonOutput<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
    }

    mod topic_tests {
        use super::*;

        #[test]
        fn new_topic_defaults() {
            let now = fixed_now();
            let topic = Topic::new(1, "Go generics", now);
            assert_eq!(topic.id, 1);
            assert_eq!(topic.title, "Go generics");
            assert_eq!(topic.created, now);
            assert_eq!(topic.last_reviewed, now);
            assert_eq!(topic.next_review, now + Duration::minutes(20));
            assert_eq!(topic.level(), 0);
        }

        #[test]
        fn first_review_schedules_eight_hours() {
            let created = fixed_now();
            let mut topic = Topic::new(1, "t", created);
            let now = created + Duration::hours(1);
            topic.reviewed_at(now);
            assert_eq!(topic.last_reviewed, now);
            assert_eq!(topic.next_review, now + Duration::hours(8));
            assert_eq!(topic.level(), 1);
            assert_eq!(topic.created, created);
        }

        #[test]
        fn reviews_walk_the_interval_table() {
            let mut topic = Topic::new(1, "t", fixed_now());
            let expected = [
                Duration::hours(8),
                Duration::hours(24),
                Duration::hours(48),
                Duration::days(7),
                Duration::days(30),
            ];
            for (i, interval) in expected.iter().enumerate() {
                let now = fixed_now() + Duration::days(i as i64 * 40);
                topic.reviewed_at(now);
                assert_eq!(topic.next_review - topic.last_reviewed, *interval);
            }
            assert_eq!(topic.level(), MAX_LEVEL);
        }

        #[test]
        fn level_stays_at_max() {
            let mut topic = Topic::new(1, "t", fixed_now());
            for _ in 0..5 {
                topic.reviewed_at(fixed_now());
            }
            assert_eq!(topic.level(), MAX_LEVEL);

            let later = fixed_now() + Duration::days(100);
            topic.reviewed_at(later);
            assert_eq!(topic.level(), MAX_LEVEL);
            assert_eq!(topic.next_review, later + Duration::days(30));
        }

        #[test]
        fn reviewed_uses_current_time() {
            let mut topic = Topic::new(1, "t", fixed_now());
            let before = Utc::now();
            topic.reviewed();
            let after = Utc::now();
            assert!(topic.last_reviewed >= before && topic.last_reviewed <= after);
            assert_eq!(topic.next_review, topic.last_reviewed + Duration::hours(8));
        }

        #[test]
        fn is_due_compares_next_review() {
            let topic = Topic::new(1, "t", fixed_now());
            assert!(!topic.is_due(fixed_now()));
            assert!(topic.is_due(fixed_now() + Duration::minutes(20)));
            assert!(topic.is_due(fixed_now() + Duration::hours(1)));
        }
    }

    mod interval_tests {
        use super::*;

        #[test]
        fn review_interval_level_0() {
            assert_eq!(review_interval(0), Duration::hours(8));
        }

        #[test]
        fn review_interval_level_1() {
            assert_eq!(review_interval(1), Duration::hours(24));
        }

        #[test]
        fn review_interval_level_2() {
            assert_eq!(review_interval(2), Duration::hours(48));
        }

        #[test]
        fn review_interval_level_3() {
            assert_eq!(review_interval(3), Duration::days(7));
        }

        #[test]
        fn review_interval_level_4() {
            assert_eq!(review_interval(4), Duration::days(30));
        }

        #[test]
        fn review_interval_above_max() {
            assert_eq!(review_interval(10), Duration::days(30));
        }
    }

    mod serde_tests {
        use super::*;

        #[test]
        fn topic_serializes_camel_case_without_level() {
            let mut topic = Topic::new(7, "Ownership", fixed_now());
            topic.reviewed_at(fixed_now());
            let value = serde_json::to_value(&topic).unwrap();

            assert_eq!(value["id"], 7);
            assert_eq!(value["title"], "Ownership");
            assert!(value.get("created").is_some());
            assert!(value.get("lastReviewed").is_some());
            assert!(value.get("nextReview").is_some());
            assert!(value.get("level").is_none());
        }

        #[test]
        fn json_output_ok_and_err() {
            let ok = serde_json::to_value(JsonOutput::ok(3)).unwrap();
            assert_eq!(ok["success"], true);
            assert_eq!(ok["data"], 3);
            assert!(ok["error"].is_null());

            let err = serde_json::to_value(JsonOutput::<()>::err("boom")).unwrap();
            assert_eq!(err["success"], false);
            assert!(err["data"].is_null());
            assert_eq!(err["error"], "boom");
        }
    }

    mod stats_tests {
        use super::*;

        #[test]
        fn stats_empty() {
            let stats = Stats::from_topics(&[], fixed_now());
            assert_eq!(stats, Stats::default());
        }

        #[test]
        fn stats_counts_due_and_levels() {
            let now = fixed_now();
            let fresh = Topic::new(1, "fresh", now);
            let mut reviewed = Topic::new(2, "reviewed", now);
            reviewed.reviewed_at(now);
            let mut old = Topic::new(3, "old", now);
            for _ in 0..6 {
                old.reviewed_at(now);
            }

            let later = now + Duration::hours(1);
            let stats = Stats::from_topics(&[fresh, reviewed, old], later);
            assert_eq!(stats.total_topics, 3);
            assert_eq!(stats.due_now, 1);
            assert_eq!(stats.long_term, 1);
            assert_eq!(stats.by_level, [1, 1, 0, 0, 1]);
        }

        #[test]
        fn level_labels() {
            assert_eq!(level_label(0), "New");
            assert_eq!(level_label(3), "Comfortable");
            assert_eq!(level_label(4), "Long-term");
        }
    }
}
