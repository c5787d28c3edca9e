//! Reminder schedule computation
//!
//! Pure functions only: given a deadline and the current time, produce the
//! ascending list of future reminder timestamps.

use chrono::Duration;
use shared::primitives::WrappedChronoDateTime;

/// Hours before the deadline at which reminders fire
pub const DEFAULT_REMINDER_OFFSET_HOURS: [i64; 6] = [1, 8, 24, 24 * 3, 24 * 7, 24 * 14];

/// Lead times before a deadline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderSchedule {
    offsets: Vec<Duration>,
}

impl ReminderSchedule {
    pub fn new(offsets: Vec<Duration>) -> Self {
        Self { offsets }
    }

    pub fn offsets(&self) -> &[Duration] {
        &self.offsets
    }

    /// Reminder timestamps for `deadline`, earliest first, strictly after `now`.
    ///
    /// Duplicate offsets collapse into one reminder.
    pub fn compute(
        &self,
        deadline: WrappedChronoDateTime,
        now: WrappedChronoDateTime,
    ) -> Vec<WrappedChronoDateTime> {
        let mut reminders: Vec<WrappedChronoDateTime> = self
            .offsets
            .iter()
            .map(|offset| deadline - *offset)
            .collect();
        reminders.sort();
        reminders.dedup();

        let first_future = reminders.partition_point(|at| *at <= now);
        reminders.split_off(first_future)
    }
}

impl Default for ReminderSchedule {
    fn default() -> Self {
        Self::new(
            DEFAULT_REMINDER_OFFSET_HOURS
                .iter()
                .map(|hours| Duration::hours(*hours))
                .collect(),
        )
    }
}

/// Reminders for `deadline` using the default offsets
pub fn compute_reminders(
    deadline: WrappedChronoDateTime,
    now: WrappedChronoDateTime,
) -> Vec<WrappedChronoDateTime> {
    ReminderSchedule::default().compute(deadline, now)
}

#[cfg(test)]
mod tests {
    mod unit {
        use super::super::*;

        fn at(s: &str) -> WrappedChronoDateTime {
            WrappedChronoDateTime::try_from(s).unwrap()
        }

        #[test]
        fn test_all_reminders_when_deadline_is_far_away() {
            let deadline = at("2024-06-30T12:00:00Z");
            let now = at("2024-06-01T00:00:00Z");

            let reminders = compute_reminders(deadline, now);

            assert_eq!(
                reminders,
                vec![
                    at("2024-06-16T12:00:00Z"),
                    at("2024-06-23T12:00:00Z"),
                    at("2024-06-27T12:00:00Z"),
                    at("2024-06-29T12:00:00Z"),
                    at("2024-06-30T04:00:00Z"),
                    at("2024-06-30T11:00:00Z"),
                ]
            );
        }

        #[test]
        fn test_reminders_are_strictly_ascending_future_offsets() {
            let deadline = at("2024-06-30T12:00:00Z");
            let offsets: Vec<Duration> = DEFAULT_REMINDER_OFFSET_HOURS
                .iter()
                .map(|h| Duration::hours(*h))
                .collect();

            let mut now = at("2024-06-10T00:00:00Z");
            while now < deadline {
                let reminders = compute_reminders(deadline, now);
                assert!(reminders.windows(2).all(|w| w[0] < w[1]));
                for r in &reminders {
                    assert!(*r > now);
                    assert!(offsets.iter().any(|o| deadline - *o == *r));
                }
                now = now + Duration::hours(5);
            }
        }

        #[test]
        fn test_past_due_reminders_are_dropped() {
            let deadline = at("2024-06-30T12:00:00Z");
            let now = at("2024-06-29T13:00:00Z");

            let reminders = compute_reminders(deadline, now);
            assert_eq!(
                reminders,
                vec![at("2024-06-30T04:00:00Z"), at("2024-06-30T11:00:00Z")]
            );
        }

        #[test]
        fn test_empty_after_last_reminder() {
            let deadline = at("2024-06-30T12:00:00Z");
            assert!(compute_reminders(deadline, at("2024-06-30T11:30:00Z")).is_empty());
            assert!(compute_reminders(deadline, at("2024-06-30T11:00:00Z")).is_empty());
            assert!(compute_reminders(deadline, at("2024-07-30T00:00:00Z")).is_empty());
        }

        #[test]
        fn test_custom_offsets_any_order() {
            let schedule = ReminderSchedule::new(vec![
                Duration::minutes(10),
                Duration::hours(2),
                Duration::minutes(10),
            ]);
            let deadline = at("2024-06-30T12:00:00Z");

            let reminders = schedule.compute(deadline, at("2024-06-30T00:00:00Z"));
            assert_eq!(
                reminders,
                vec![at("2024-06-30T10:00:00Z"), at("2024-06-30T11:50:00Z")]
            );
        }

        #[test]
        fn test_no_offsets_means_no_reminders() {
            let schedule = ReminderSchedule::new(vec![]);
            assert!(
                schedule
                    .compute(at("2024-06-30T12:00:00Z"), at("2024-06-01T00:00:00Z"))
                    .is_empty()
            );
        }
    }
}
