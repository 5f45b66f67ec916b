//! Property-based tests for date parsing, date coercion and table name handling.
//!
//! - Every supported date shape parses back to the datetime it was rendered from.
//! - A candidate column is promoted exactly when its parse rate reaches the threshold,
//!   and unparsable cells become nulls.
//! - Normalized table names are idempotent and free of spaces and uppercase letters.

use arrow::array::{Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use chrono::{NaiveDate, NaiveDateTime};
use proptest::prelude::*;
use rental_lens::coercion::temporal::{parse_datetime, parse_timestamp_nanos};
use rental_lens::coercion::{coerce_date_columns, CoercionConfig};
use rental_lens::table::{normalize_table_name, LoadedTable, TableSet};
use std::sync::Arc;

fn datetime_strategy() -> impl Strategy<Value = NaiveDateTime> {
    (1900i32..2200, 1u32..=12, 1u32..=28, 0u32..24, 0u32..60, 0u32..60).prop_map(
        |(y, m, d, h, mi, s)| {
            NaiveDate::from_ymd_opt(y, m, d)
                .and_then(|date| date.and_hms_opt(h, mi, s))
                .unwrap()
        },
    )
}

fn text_table(values: Vec<Option<String>>) -> LoadedTable {
    let schema = Arc::new(Schema::new(vec![Field::new("code", DataType::Utf8, true)]));
    let batch = RecordBatch::try_new(schema.clone(), vec![Arc::new(StringArray::from(values))])
        .unwrap();
    LoadedTable::new("codes", schema, vec![batch])
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn datetime_shapes_round_trip(dt in datetime_strategy()) {
        for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y/%m/%d %H:%M:%S", "%m/%d/%Y %H:%M:%S"] {
            let text = dt.format(format).to_string();
            prop_assert_eq!(parse_datetime(&text), Some(dt), "{}", text);
        }
        let rfc3339 = format!("{}Z", dt.format("%Y-%m-%dT%H:%M:%S"));
        prop_assert_eq!(parse_datetime(&rfc3339), Some(dt));
    }

    #[test]
    fn date_shapes_map_to_midnight(dt in datetime_strategy()) {
        let midnight = dt.date().and_hms_opt(0, 0, 0).unwrap();
        for format in ["%Y-%m-%d", "%d.%m.%Y", "%d-%b-%Y", "%B %d, %Y"] {
            let text = dt.format(format).to_string();
            prop_assert_eq!(parse_datetime(&text), Some(midnight), "{}", text);
        }
    }

    #[test]
    fn nanos_agree_with_parsed_datetime(dt in datetime_strategy()) {
        let text = dt.format("%Y-%m-%d %H:%M:%S").to_string();
        prop_assert_eq!(
            parse_timestamp_nanos(&text),
            dt.and_utc().timestamp_nanos_opt()
        );
    }

    #[test]
    fn words_and_numbers_never_parse(word in "[a-zA-Z ]{1,20}", number in -1_000_000i64..1_000_000) {
        prop_assert_eq!(parse_datetime(&word), None);
        prop_assert_eq!(parse_datetime(&number.to_string()), None);
    }

    #[test]
    fn promotion_follows_threshold(
        parsable in 0usize..20,
        unparsable in 0usize..20,
        nulls in 0usize..5,
        threshold in 0.0f64..=1.0,
    ) {
        prop_assume!(parsable + unparsable > 0);

        let mut values: Vec<Option<String>> = Vec::new();
        values.extend((0..parsable).map(|i| Some(format!("2007-02-{:02} 10:00:00", i % 28 + 1))));
        values.extend((0..unparsable).map(|i| Some(format!("code-{i}"))));
        values.extend((0..nulls).map(|_| None));
        let tables: TableSet = std::iter::once(text_table(values)).collect();

        let config = CoercionConfig { sample_size: 100, threshold, ..Default::default() };
        let (tables, report) = coerce_date_columns(tables, &config);

        let rate = parsable as f64 / (parsable + unparsable) as f64;
        let promoted = rate >= threshold;
        prop_assert_eq!(report.is_promoted("codes", "code"), promoted);

        let table = tables.get("codes").unwrap();
        let data_type = table.schema().field(0).data_type().clone();
        if promoted {
            prop_assert_eq!(data_type, DataType::Timestamp(TimeUnit::Nanosecond, None));
            let column = table.batches()[0].column(0);
            prop_assert_eq!(column.null_count(), unparsable + nulls);
        } else {
            prop_assert_eq!(data_type, DataType::Utf8);
        }
        prop_assert_eq!(table.num_rows(), parsable + unparsable + nulls);
    }

    #[test]
    fn normalized_names_are_stable(stem in "[A-Za-z0-9_ ]{1,24}") {
        let name = normalize_table_name(&stem);
        prop_assert!(!name.contains(' '));
        prop_assert_eq!(name.clone(), name.to_lowercase());
        prop_assert_eq!(normalize_table_name(&name), name);
    }
}
