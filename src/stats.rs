//! Order counts for the admin dashboard.

use chrono::{DateTime, Duration, Months, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::orders::OrderStatus;

#[derive(Serialize, Debug, Clone, Default, PartialEq, ToSchema)]
pub struct StatusCounts {
    pub total: usize,
    pub pending: usize,
    pub dispatched: usize,
    pub ready: usize,
    pub completed: usize,
    pub cancelled: usize,
}

impl StatusCounts {
    fn count(&mut self, status: &str) {
        self.total += 1;
        match status.parse::<OrderStatus>() {
            Ok(OrderStatus::Pending) => self.pending += 1,
            Ok(OrderStatus::Dispatched) => self.dispatched += 1,
            Ok(OrderStatus::Ready) => self.ready += 1,
            Ok(OrderStatus::Completed) => self.completed += 1,
            Ok(OrderStatus::Cancelled) => self.cancelled += 1,
            Err(_) => {}
        }
    }
}

#[derive(Serialize, Debug, Clone, Default, PartialEq, ToSchema)]
pub struct OrderStats {
    pub today: StatusCounts,
    pub week: StatusCounts,
    pub month: StatusCounts,
}

/// Start of each window: UTC midnight, seven days ago and one calendar month ago.
pub struct Windows {
    pub today: DateTime<Utc>,
    pub week: DateTime<Utc>,
    pub month: DateTime<Utc>,
}

impl Windows {
    pub fn ending_at(now: DateTime<Utc>) -> Self {
        let today = now
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .map(|midnight| midnight.and_utc())
            .unwrap_or(now);

        Self {
            today,
            week: now - Duration::days(7),
            month: now.checked_sub_months(Months::new(1)).unwrap_or(now),
        }
    }

    /// The oldest bound, used to limit the rows fetched.
    pub fn earliest(&self) -> DateTime<Utc> {
        self.today.min(self.week).min(self.month)
    }
}

pub fn summarize<'a>(
    orders: impl IntoIterator<Item = (&'a str, DateTime<Utc>)>,
    windows: &Windows,
) -> OrderStats {
    let mut stats = OrderStats::default();

    for (status, created_at) in orders {
        if created_at >= windows.today {
            stats.today.count(status);
        }
        if created_at >= windows.week {
            stats.week.count(status);
        }
        if created_at >= windows.month {
            stats.month.count(status);
        }
    }

    stats
}
