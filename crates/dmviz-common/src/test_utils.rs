//! Test utilities and shared test helpers for dmviz.
//!
//! This module provides snapshot fixtures in the exact formats the generator
//! scripts write, plus logging and property-testing helpers shared by the
//! workspace's unit and integration tests.

use std::sync::Once;
use tracing_subscriber::{fmt, EnvFilter};

/// Initialize test logging once per test run.
static INIT: Once = Once::new();

/// Initialize logging for tests with a sensible default configuration.
/// This function is safe to call multiple times and will only initialize once.
pub fn init_test_logging() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

        let _ = fmt().with_test_writer().with_env_filter(filter).try_init();
    });
}

/// Assert that two floating point numbers are approximately equal within a tolerance.
pub fn assert_approx_eq(left: f64, right: f64, tolerance: f64) {
    let diff = (left - right).abs();
    assert!(
        diff <= tolerance,
        "assertion failed: `{left}` is not approximately equal to `{right}` (tolerance: {tolerance}, diff: {diff})"
    );
}

/// Snapshot file contents for tests.
pub mod snapshot_fixtures {
    /// The two-contact example table used throughout the docs.
    pub fn example_monthly_csv() -> &'static str {
        "name,total_dm,2020-01,2020-02\nA,8,5,3\nB,11,1,10\n"
    }

    /// Monthly counts for five contacts over six months.
    pub fn monthly_csv() -> &'static str {
        concat!(
            "name,total_dm,2019-11,2019-12,2020-01,2020-02,2020-03,2020-04\n",
            "Alice,120,10,20,30,20,25,15\n",
            "Bob,96,40,30,0,6,10,10\n",
            "Carol,60,0,0,5,15,20,20\n",
            "Dave,33,1,2,,30,0,0\n",
            "Erin,12,3,3,3,3,n/a,0\n",
        )
    }

    /// Quarterly counts matching [`monthly_csv`].
    pub fn quarterly_csv() -> &'static str {
        concat!(
            "name,total_dm,2019-Q4,2020-Q1,2020-Q2\n",
            "Alice,120,30,75,15\n",
            "Bob,96,70,16,10\n",
            "Carol,60,0,40,20\n",
            "Dave,33,3,30,0\n",
            "Erin,12,6,6,0\n",
        )
    }

    /// Sent/received columns per month.
    pub fn sent_recv_csv() -> &'static str {
        concat!(
            "name,2020-01_sent,2020-01_recv,2020-02_sent,2020-02_recv\n",
            "Alice,10,20,5,5\n",
            "Bob,0,0,0,0\n",
            "Carol,7,0,3,0\n",
        )
    }

    /// Per-contact, per-month median reply times in minutes.
    pub fn response_times_csv() -> &'static str {
        concat!(
            "name,month,my_median_mins,their_median_mins,my_count,their_count\n",
            "Alice,2020-01,5.0,10.0,4,6\n",
            "Alice,2020-02,7.0,,3,0\n",
            "Alice,2020-03,9.0,20.0,2,2\n",
            "Bob,2020-01,,3.5,0,5\n",
            "Bob,2020-02,,4.5,0,5\n",
            "Carol,2020-02,,,0,0\n",
        )
    }

    /// Day-of-week by hour-of-day grids per contact and year.
    pub fn day_hour_json() -> String {
        let mut alice_2020 = vec![vec![0u64; 24]; 7];
        alice_2020[0][9] = 4;
        alice_2020[6][23] = 1;
        let mut alice_2021 = vec![vec![0u64; 24]; 7];
        alice_2021[0][9] = 6;
        let mut bob_2020 = vec![vec![0u64; 24]; 7];
        bob_2020[2][12] = 3;

        serde_json::json!({
            "Alice": { "by_year": { "2020": alice_2020, "2021": alice_2021 } },
            "Bob": { "by_year": { "2020": bob_2020, "2022": [[1, 2]] } },
        })
        .to_string()
    }
}

/// Property-based testing utilities using proptest.
#[cfg(feature = "proptest")]
pub mod property_testing {
    use crate::{DateRange, Period};
    use proptest::prelude::*;

    /// Strategy for month periods between 2015 and 2030.
    pub fn month_strategy() -> impl Strategy<Value = Period> {
        (2015u16..=2030, 1u8..=12).prop_map(|(year, month)| {
            Period::month(year, month).expect("strategy only yields valid months")
        })
    }

    /// Strategy for valid month ranges.
    pub fn month_range_strategy() -> impl Strategy<Value = DateRange> {
        (month_strategy(), month_strategy()).prop_map(|(a, b)| {
            let (start, end) = if a <= b { (a, b) } else { (b, a) };
            DateRange::new(start, end).expect("ordered bounds form a valid range")
        })
    }

    /// Strategy for contact names.
    pub fn name_strategy() -> impl Strategy<Value = String> {
        "[A-Z][a-z]{2,8}"
    }
}
