//! Engine-native filter construction.
//!
//! The index engine natively supports only two filter kinds: exact tag
//! containment and inclusive timestamp ranges. Representing them as a
//! tagged union makes an unsupported filter kind unrepresentable - anything
//! else a query needs is a post-filter, never a silently-ignored clause.

use std::ops::Bound::{Included, Unbounded};

use chrono::NaiveDate;
use lore_query::{DateField, DateFilter, DateOp};
use tantivy::{
    Term,
    query::{Query, RangeQuery, TermQuery},
    schema::{IndexRecordOption, Type},
};

use crate::schema::NoteSchema;

/// Which timestamp field a native date range applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFieldKind {
    /// The `created` field.
    Created,
    /// The `modified` field.
    Modified,
}

/// A filter the index engine can evaluate natively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NativeFilter {
    /// Document must carry this exact tag.
    Tag(String),
    /// Document timestamp must fall within the inclusive range.
    DateRange {
        /// Timestamp field the range applies to.
        field: DateFieldKind,
        /// Inclusive lower bound, epoch millis.
        min_ms: i64,
        /// Inclusive upper bound, epoch millis.
        max_ms: i64,
    },
}

impl NativeFilter {
    /// Compiles this filter into a Tantivy query clause.
    pub fn to_query(&self, schema: &NoteSchema) -> Box<dyn Query> {
        match self {
            Self::Tag(tag) => {
                let term = Term::from_field_text(schema.tags, tag);
                Box::new(TermQuery::new(term, IndexRecordOption::Basic))
            }
            Self::DateRange { field, min_ms, max_ms } => {
                let field = match field {
                    DateFieldKind::Created => schema.created,
                    DateFieldKind::Modified => schema.modified,
                };
                let lower = if *min_ms == i64::MIN {
                    Unbounded
                } else {
                    Included(Term::from_field_i64(field, *min_ms))
                };
                let upper = if *max_ms == i64::MAX {
                    Unbounded
                } else {
                    Included(Term::from_field_i64(field, *max_ms))
                };
                let field_name = schema.schema().get_field_name(field).to_string();
                Box::new(RangeQuery::new_term_bounds(
                    field_name,
                    Type::I64,
                    &lower,
                    &upper,
                ))
            }
        }
    }
}

/// Builds the native filter set for a parsed query: one tag filter per
/// included tag and one date range per date filter.
pub fn native_filters(tags: &[String], dates: &[DateFilter]) -> Vec<NativeFilter> {
    let mut filters: Vec<NativeFilter> = tags.iter().cloned().map(NativeFilter::Tag).collect();

    for date in dates {
        let field = match date.field {
            DateField::Created => DateFieldKind::Created,
            DateField::Modified => DateFieldKind::Modified,
        };
        let (min_ms, max_ms) = date_bounds(date.op, date.date);
        filters.push(NativeFilter::DateRange { field, min_ms, max_ms });
    }

    filters
}

/// Computes the inclusive millisecond bounds for a date operator.
///
/// `On` covers the whole calendar day (00:00:00.000 through 23:59:59.999);
/// `Before` everything strictly before that day; `After` everything strictly
/// after it.
fn date_bounds(op: DateOp, date: NaiveDate) -> (i64, i64) {
    let day_start = day_start_ms(date);
    let next_day_start = day_start_ms(date.succ_opt().unwrap_or(date));

    match op {
        DateOp::On => (day_start, next_day_start - 1),
        DateOp::Before => (i64::MIN, day_start - 1),
        DateOp::After => (next_day_start, i64::MAX),
    }
}

/// Epoch millis of midnight (UTC) at the start of the given day.
fn day_start_ms(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp_millis())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn on_covers_the_full_day() {
        let (min, max) = date_bounds(DateOp::On, date(2024, 1, 1));

        // 2024-01-01T00:00:00.000 UTC
        assert_eq!(min, 1_704_067_200_000);
        // 2024-01-01T23:59:59.999 UTC - one millisecond before the next day
        assert_eq!(max, 1_704_153_599_999);
    }

    #[test]
    fn before_ends_at_previous_midnight() {
        let (min, max) = date_bounds(DateOp::Before, date(2024, 1, 1));
        assert_eq!(min, i64::MIN);
        assert_eq!(max, 1_704_067_199_999);
    }

    #[test]
    fn after_starts_at_next_midnight() {
        let (min, max) = date_bounds(DateOp::After, date(2024, 1, 1));
        assert_eq!(min, 1_704_153_600_000);
        assert_eq!(max, i64::MAX);
    }

    #[test]
    fn native_filters_cover_tags_and_dates() {
        let dates = vec![DateFilter {
            field: DateField::Created,
            op: DateOp::After,
            date: date(2024, 1, 1),
        }];
        let filters = native_filters(&["project".to_string()], &dates);

        assert_eq!(filters.len(), 2);
        assert_eq!(filters[0], NativeFilter::Tag("project".to_string()));
        assert!(matches!(
            filters[1],
            NativeFilter::DateRange {
                field: DateFieldKind::Created,
                ..
            }
        ));
    }
}
