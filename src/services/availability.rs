use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use crate::models::OperatingHours;

/// Computes the bookable start times for one employee on one calendar date.
///
/// `booked` holds (start, duration-in-minutes) of the employee's existing
/// non-cancelled appointments. `now` is the current wall-clock time; when it
/// falls on `date`, slots at or before it are dropped. The result is sorted
/// ascending and is a pure function of its inputs, so re-querying with no
/// intervening bookings returns the same list.
///
/// An empty list is a normal outcome (closed day, fully booked, nothing
/// fits), never an error.
pub fn compute_slots(
    hours: &OperatingHours,
    booked: &[(NaiveDateTime, i64)],
    date: NaiveDate,
    total_duration: i64,
    granularity: i64,
    now: Option<NaiveDateTime>,
) -> Vec<NaiveTime> {
    if hours.is_closed {
        return vec![];
    }
    let (open, close) = match (hours.open_time, hours.close_time) {
        (Some(o), Some(c)) => (o, c),
        _ => return vec![],
    };

    let granularity = granularity.max(1);

    // A break splits the day into up to two candidate windows.
    let mut windows = vec![];
    match (hours.break_start, hours.break_end) {
        (Some(bs), Some(be)) => {
            windows.push((minutes(open), minutes(bs)));
            windows.push((minutes(be), minutes(close)));
        }
        _ => windows.push((minutes(open), minutes(close))),
    }

    let occupied: Vec<(i64, i64)> = booked
        .iter()
        .filter(|(start, _)| start.date() == date)
        .map(|(start, duration)| {
            let m = minutes(start.time());
            (m, m + duration)
        })
        .collect();

    // Slots on "today" must start strictly after the current time.
    let cutoff = now
        .filter(|n| n.date() == date)
        .map(|n| minutes(n.time()));

    let mut slots = vec![];
    for (window_start, window_end) in windows {
        let mut candidate = window_start;
        while candidate < window_end && candidate + total_duration <= window_end {
            let candidate_end = candidate + total_duration;
            // Half-open interval overlap test.
            let taken = occupied
                .iter()
                .any(|&(occ_start, occ_end)| candidate < occ_end && occ_start < candidate_end);
            let in_the_past = cutoff.map_or(false, |c| candidate <= c);

            if !taken && !in_the_past {
                slots.push(candidate);
            }
            candidate += granularity;
        }
    }

    slots.sort_unstable();
    slots.into_iter().filter_map(time_of_minutes).collect()
}

fn minutes(t: NaiveTime) -> i64 {
    (t.num_seconds_from_midnight() / 60) as i64
}

fn time_of_minutes(m: i64) -> Option<NaiveTime> {
    NaiveTime::from_hms_opt((m / 60) as u32, (m % 60) as u32, 0)
}
