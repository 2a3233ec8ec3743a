//! Dashboard aggregates over the full registration set.
//!
//! Everything here is a pure function of `(registrations, reference)`.
//! Nothing is maintained incrementally; the dashboard recomputes on every
//! fetch.
//!
//! Time buckets are independent and do not partition the total. `today`,
//! `yesterday` and `day_before_yesterday` are fixed-width days anchored at
//! the reference's local midnight; `last_month` is a rolling window one
//! calendar month back from the reference instant itself, so its width
//! varies between 28 and 31 days.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Duration, FixedOffset, Months, NaiveTime, TimeZone, Utc};
use serde::Serialize;

use crate::types::{Registration, Sector};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Church,
    District,
    Sector,
}

impl Dimension {
    fn value_of(self, registration: &Registration) -> DimensionValue<'_> {
        match self {
            Dimension::Church => DimensionValue::Text(&registration.church),
            Dimension::District => DimensionValue::Text(&registration.district),
            Dimension::Sector => DimensionValue::Sector(registration.sector),
        }
    }
}

/// Grouping key. Sectors stay typed so `3` and `"3"` never collide with
/// a church or district label.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum DimensionValue<'a> {
    Text(&'a str),
    Sector(Sector),
}

impl DimensionValue<'_> {
    fn label(&self) -> String {
        match self {
            DimensionValue::Text(s) => (*s).to_string(),
            DimensionValue::Sector(s) => s.to_string(),
        }
    }
}

/// Registrations sharing one dimension value, in input order.
#[derive(Clone, Debug)]
pub struct Group<'a> {
    pub value: String,
    pub registrations: Vec<&'a Registration>,
}

impl Group<'_> {
    pub fn count(&self) -> usize {
        self.registrations.len()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DimensionCount {
    pub value: String,
    pub count: usize,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TimeBuckets {
    pub today: usize,
    pub yesterday: usize,
    pub day_before_yesterday: usize,
    pub last_month: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AggregateSnapshot {
    pub reference_instant: DateTime<FixedOffset>,
    pub today_start: DateTime<FixedOffset>,
    pub total: usize,
    pub unique_churches: usize,
    pub unique_districts: usize,
    pub unique_sectors: usize,
    pub buckets: TimeBuckets,
    pub by_church: Vec<DimensionCount>,
    pub by_district: Vec<DimensionCount>,
    pub by_sector: Vec<DimensionCount>,
    pub top_church: Option<DimensionCount>,
    pub top_district: Option<DimensionCount>,
}

/// Partition `registrations` by `dimension`.
///
/// Groups come out in first-occurrence order; each group keeps input order.
pub fn group_by(registrations: &[Registration], dimension: Dimension) -> Vec<Group<'_>> {
    let mut index: HashMap<DimensionValue<'_>, usize> = HashMap::new();
    let mut groups: Vec<Group<'_>> = Vec::new();
    for registration in registrations {
        let value = dimension.value_of(registration);
        let slot = *index.entry(value).or_insert_with(|| {
            groups.push(Group {
                value: value.label(),
                registrations: Vec::new(),
            });
            groups.len() - 1
        });
        groups[slot].registrations.push(registration);
    }
    groups
}

pub fn group_counts(groups: &[Group<'_>]) -> Vec<DimensionCount> {
    groups
        .iter()
        .map(|g| DimensionCount {
            value: g.value.clone(),
            count: g.count(),
        })
        .collect()
}

/// Highest count; ties go to the value seen first.
pub fn top(counts: &[DimensionCount]) -> Option<DimensionCount> {
    let mut ranked: Vec<&DimensionCount> = counts.iter().collect();
    // sort_by is stable, so equal counts keep first-occurrence order.
    ranked.sort_by(|a, b| b.count.cmp(&a.count));
    ranked.first().map(|c| (*c).clone())
}

pub fn distinct(registrations: &[Registration], dimension: Dimension) -> usize {
    registrations
        .iter()
        .map(|r| dimension.value_of(r))
        .collect::<HashSet<_>>()
        .len()
}

/// Local midnight of the reference's calendar day.
pub fn start_of_day<Tz: TimeZone>(reference: &DateTime<Tz>) -> DateTime<Tz> {
    let midnight = reference.date_naive().and_time(NaiveTime::MIN);
    match reference.timezone().from_local_datetime(&midnight).earliest() {
        Some(start) => start,
        // Midnight skipped by a DST jump: step back by the time of day.
        None => reference.clone() - (reference.time() - NaiveTime::MIN),
    }
}

pub fn time_buckets<Tz: TimeZone>(
    registrations: &[Registration],
    reference: &DateTime<Tz>,
) -> TimeBuckets {
    let today0 = start_of_day(reference).with_timezone(&Utc);
    let yesterday0 = today0 - Duration::days(1);
    let day_before0 = today0 - Duration::days(2);
    // Month arithmetic on the local calendar, then compare in UTC.
    let month_ago = reference
        .clone()
        .checked_sub_months(Months::new(1))
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or(DateTime::<Utc>::MIN_UTC);

    let mut buckets = TimeBuckets::default();
    for r in registrations {
        let t = r.created_at;
        if t >= today0 {
            buckets.today += 1;
        }
        if yesterday0 <= t && t < today0 {
            buckets.yesterday += 1;
        }
        if day_before0 <= t && t < yesterday0 {
            buckets.day_before_yesterday += 1;
        }
        if t > month_ago {
            buckets.last_month += 1;
        }
    }
    buckets
}

/// Compute the full dashboard snapshot.
///
/// `registrations` is expected newest first, as the store returns it; group
/// and tie-break order follow whatever order is passed in.
pub fn aggregate(
    registrations: &[Registration],
    reference: DateTime<FixedOffset>,
) -> AggregateSnapshot {
    let by_church = group_counts(&group_by(registrations, Dimension::Church));
    let by_district = group_counts(&group_by(registrations, Dimension::District));
    let by_sector = group_counts(&group_by(registrations, Dimension::Sector));

    AggregateSnapshot {
        today_start: start_of_day(&reference),
        total: registrations.len(),
        unique_churches: distinct(registrations, Dimension::Church),
        unique_districts: distinct(registrations, Dimension::District),
        unique_sectors: distinct(registrations, Dimension::Sector),
        buckets: time_buckets(registrations, &reference),
        top_church: top(&by_church),
        top_district: top(&by_district),
        by_church,
        by_district,
        by_sector,
        reference_instant: reference,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use uuid::Uuid;

    fn reg(name: &str, district: &str, church: &str, at: DateTime<Utc>) -> Registration {
        Registration {
            id: Uuid::new_v4(),
            name: name.into(),
            district: district.into(),
            sector: Sector::Foreign,
            church: church.into(),
            created_at: at,
        }
    }

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn reference(y: i32, m: u32, d: u32, h: u32) -> DateTime<FixedOffset> {
        utc(y, m, d, h, 0).fixed_offset()
    }

    #[test]
    fn empty_input() {
        let snap = aggregate(&[], reference(2025, 3, 15, 10));
        assert_eq!(snap.total, 0);
        assert_eq!(snap.unique_churches, 0);
        assert_eq!(snap.unique_districts, 0);
        assert_eq!(snap.buckets, TimeBuckets::default());
        assert!(snap.top_church.is_none());
        assert!(snap.top_district.is_none());
    }

    #[test]
    fn today_bucket_starts_exactly_at_midnight() {
        let today0 = utc(2025, 3, 15, 0, 0);
        let regs = vec![
            reg("a", "D", "C", today0),
            reg("b", "D", "C", today0 - Duration::nanoseconds(1)),
        ];
        let b = time_buckets(&regs, &reference(2025, 3, 15, 10));
        assert_eq!(b.today, 1);
        assert_eq!(b.yesterday, 1);
        assert_eq!(b.day_before_yesterday, 0);
    }

    #[test]
    fn day_before_yesterday_is_half_open() {
        let today0 = utc(2025, 3, 15, 0, 0);
        let regs = vec![
            reg("a", "D", "C", today0 - Duration::days(1)),
            reg("b", "D", "C", today0 - Duration::days(2)),
            reg("c", "D", "C", today0 - Duration::days(2) - Duration::seconds(1)),
        ];
        let b = time_buckets(&regs, &reference(2025, 3, 15, 10));
        assert_eq!(b.yesterday, 1);
        assert_eq!(b.day_before_yesterday, 1);
        assert_eq!(b.last_month, 3);
    }

    #[test]
    fn buckets_need_not_partition_total() {
        let regs = vec![reg("a", "D", "C", utc(2025, 3, 12, 9, 0))];
        let b = time_buckets(&regs, &reference(2025, 3, 15, 10));
        assert_eq!(b.today + b.yesterday + b.day_before_yesterday, 0);
        assert_eq!(b.last_month, 1);
    }

    #[test]
    fn last_month_is_calendar_rolling_and_exclusive() {
        // 31 March minus one month clamps to 28 Feb (2025 is not a leap year).
        let r = reference(2025, 3, 31, 12);
        let boundary = utc(2025, 2, 28, 12, 0);
        let regs = vec![
            reg("a", "D", "C", boundary),
            reg("b", "D", "C", boundary + Duration::seconds(1)),
        ];
        assert_eq!(time_buckets(&regs, &r).last_month, 1);
    }

    #[test]
    fn last_month_is_measured_on_the_local_calendar() {
        // 30 Apr 20:00 at UTC-7 is 1 May 03:00 UTC; the local month back
        // is 30 Mar 20:00 -07:00, not 1 Apr 03:00 UTC.
        let tz = FixedOffset::west_opt(7 * 3600).unwrap();
        let r = tz.with_ymd_and_hms(2025, 4, 30, 20, 0, 0).unwrap();
        let inside = tz.with_ymd_and_hms(2025, 3, 31, 5, 0, 0).unwrap();
        let boundary = tz.with_ymd_and_hms(2025, 3, 30, 20, 0, 0).unwrap();
        let regs = vec![
            reg("a", "D", "C", inside.with_timezone(&Utc)),
            reg("b", "D", "C", boundary.with_timezone(&Utc)),
        ];
        assert_eq!(time_buckets(&regs, &r).last_month, 1);
    }

    #[test]
    fn last_month_clamps_month_end_in_local_time() {
        // 30 Mar 22:00 at UTC-6 is already 31 Mar in UTC. Locally the month
        // back clamps to 28 Feb 22:00 -06:00 (1 Mar 04:00 UTC).
        let tz = FixedOffset::west_opt(6 * 3600).unwrap();
        let r = tz.with_ymd_and_hms(2025, 3, 30, 22, 0, 0).unwrap();
        let boundary = tz.with_ymd_and_hms(2025, 2, 28, 22, 0, 0).unwrap();
        let regs = vec![
            reg("a", "D", "C", boundary.with_timezone(&Utc)),
            reg("b", "D", "C", (boundary + Duration::seconds(1)).with_timezone(&Utc)),
            reg("c", "D", "C", utc(2025, 2, 28, 12, 0)),
        ];
        assert_eq!(time_buckets(&regs, &r).last_month, 1);
    }

    #[test]
    fn midnight_follows_reference_offset() {
        // 01:30 at UTC-6 is 07:30 UTC; local day starts at 06:00 UTC.
        let tz = FixedOffset::west_opt(6 * 3600).unwrap();
        let r = tz.with_ymd_and_hms(2025, 3, 15, 1, 30, 0).unwrap();
        assert_eq!(start_of_day(&r).with_timezone(&Utc), utc(2025, 3, 15, 6, 0));
        let regs = vec![
            reg("a", "D", "C", utc(2025, 3, 15, 5, 59)),
            reg("b", "D", "C", utc(2025, 3, 15, 6, 0)),
        ];
        let b = time_buckets(&regs, &r);
        assert_eq!(b.today, 1);
        assert_eq!(b.yesterday, 1);
    }

    #[test]
    fn groups_in_first_occurrence_order_preserving_input_order() {
        let t = utc(2025, 3, 15, 9, 0);
        let regs = vec![
            reg("1", "D", "Berea", t),
            reg("2", "D", "Betel", t),
            reg("3", "D", "Berea", t),
        ];
        let groups = group_by(&regs, Dimension::Church);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].value, "Berea");
        let names: Vec<_> = groups[0].registrations.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["1", "3"]);
        assert_eq!(groups[1].value, "Betel");
    }

    #[test]
    fn sector_groups_use_display_labels() {
        let t = utc(2025, 3, 15, 9, 0);
        let mut a = reg("a", "D", "C", t);
        a.sector = Sector::Numbered(3);
        let b = reg("b", "D", "C", t);
        let counts = group_counts(&group_by(&[a, b], Dimension::Sector));
        assert_eq!(counts[0].value, "3");
        assert_eq!(counts[1].value, "Foráneo");
    }

    #[test]
    fn top_breaks_ties_by_first_occurrence() {
        let t = utc(2025, 3, 15, 9, 0);
        let mut regs = Vec::new();
        regs.push(reg("b0", "B", "x", t));
        regs.push(reg("a0", "A", "x", t));
        regs.push(reg("c0", "C", "x", t));
        for i in 1..5 {
            regs.push(reg(&format!("a{i}"), "A", "x", t));
            regs.push(reg(&format!("b{i}"), "B", "x", t));
        }
        for i in 1..3 {
            regs.push(reg(&format!("c{i}"), "C", "x", t));
        }
        let snap = aggregate(&regs, reference(2025, 3, 15, 10));
        assert_eq!(
            snap.top_district,
            Some(DimensionCount {
                value: "B".into(),
                count: 5
            })
        );
        let counts: Vec<_> = snap.by_district.iter().map(|c| c.count).collect();
        assert_eq!(counts, vec![5, 5, 3]);
    }

    #[test]
    fn five_at_one_church() {
        let t = utc(2025, 3, 15, 9, 0);
        let regs: Vec<_> = (0..5)
            .map(|i| reg(&format!("n{i}"), "Distrito Sur", "Distrito Sur", t))
            .collect();
        let snap = aggregate(&regs, reference(2025, 3, 15, 10));
        assert_eq!(snap.total, 5);
        assert_eq!(snap.unique_churches, 1);
        assert_eq!(group_by(&regs, Dimension::Church)[0].count(), 5);
        assert_eq!(snap.buckets.today, 5);
    }

    fn arb_registrations() -> impl Strategy<Value = Vec<Registration>> {
        let churches = prop::sample::select(vec!["Betel", "Berea", "Sion", "Peniel"]);
        let districts = prop::sample::select(vec!["Noroeste", "Norte", "Sur"]);
        let sectors = prop_oneof![
            (1u8..=5).prop_map(Sector::Numbered),
            Just(Sector::Foreign)
        ];
        prop::collection::vec(
            (churches, districts, sectors, 0i64..90 * 24 * 3600),
            0..60,
        )
        .prop_map(|rows| {
            let base = utc(2025, 3, 15, 12, 0);
            rows.into_iter()
                .enumerate()
                .map(|(i, (church, district, sector, secs_ago))| Registration {
                    id: Uuid::new_v4(),
                    name: format!("n{i}"),
                    district: district.to_string(),
                    sector,
                    church: church.to_string(),
                    created_at: base - Duration::seconds(secs_ago),
                })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn grouping_partitions_the_input(regs in arb_registrations()) {
            for dim in [Dimension::Church, Dimension::District, Dimension::Sector] {
                let sum: usize = group_by(&regs, dim).iter().map(Group::count).sum();
                prop_assert_eq!(sum, regs.len());
            }
        }

        #[test]
        fn unique_counts_match_distinct_sets(regs in arb_registrations()) {
            let snap = aggregate(&regs, reference(2025, 3, 15, 12));
            let churches: HashSet<_> = regs.iter().map(|r| r.church.as_str()).collect();
            let districts: HashSet<_> = regs.iter().map(|r| r.district.as_str()).collect();
            prop_assert_eq!(snap.unique_churches, churches.len());
            prop_assert_eq!(snap.unique_districts, districts.len());
            let sectors: HashSet<_> = regs.iter().map(|r| r.sector).collect();
            prop_assert_eq!(snap.unique_sectors, sectors.len());
            prop_assert_eq!(snap.unique_churches, snap.by_church.len());
        }

        #[test]
        fn top_count_is_the_maximum(regs in arb_registrations()) {
            let counts = group_counts(&group_by(&regs, Dimension::Church));
            match top(&counts) {
                None => prop_assert!(regs.is_empty()),
                Some(best) => {
                    let max = counts.iter().map(|c| c.count).max().unwrap_or(0);
                    prop_assert_eq!(best.count, max);
                    let first = counts.iter().find(|c| c.count == max).unwrap();
                    prop_assert_eq!(&best.value, &first.value);
                }
            }
        }
    }
}
