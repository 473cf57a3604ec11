//! Property-based tests for the prediction form normalizer.

use proptest::prelude::*;
use tunelens::features::FEATURES;
use tunelens::normalize::{
    clamp_field, min_sec_to_ms, ms_to_min_sec, normalize_duration, parse_number, Bound,
    MAX_DURATION_MS, MIN_DURATION_MS,
};
use tunelens::FormState;

// =============================================================================
// Duration Tests
// =============================================================================

proptest! {
    /// Whatever is typed, the stored length is in range and consistent.
    #[test]
    fn duration_always_in_range(minutes in -1000i64..1000, seconds in -1000i64..1000) {
        let (length, _) = normalize_duration(minutes, seconds);

        prop_assert!(length.duration_ms >= MIN_DURATION_MS);
        prop_assert!(length.duration_ms <= MAX_DURATION_MS);
        prop_assert!(length.minutes <= 10);
        prop_assert!(length.seconds <= 59);
        prop_assert_eq!(length.duration_ms, min_sec_to_ms(length.minutes, length.seconds));
    }

    /// Anything under 30 seconds snaps to 0:30.
    #[test]
    fn below_minimum_snaps_to_thirty_seconds(seconds in 0i64..30) {
        let (length, warning) = normalize_duration(0, seconds);

        prop_assert_eq!((length.minutes, length.seconds, length.duration_ms), (0, 30, 30_000));
        let warning = warning.unwrap();
        prop_assert_eq!(warning.bound, Bound::Minimum);
        prop_assert_eq!(warning.message, "Minimum: 30 seconds");
    }

    /// Anything past 10:00 snaps to 10:00.
    #[test]
    fn above_maximum_snaps_to_ten_minutes(seconds in 1i64..=59) {
        let (length, warning) = normalize_duration(10, seconds);

        prop_assert_eq!((length.minutes, length.seconds, length.duration_ms), (10, 0, 600_000));
        prop_assert_eq!(warning.unwrap().bound, Bound::Maximum);
    }

    /// Totals over ten minutes warn even when the minutes field alone is
    /// out of range.
    #[test]
    fn long_edits_warn_maximum(minutes in 11i64..1000, seconds in 0i64..60) {
        let (length, warning) = normalize_duration(minutes, seconds);

        prop_assert_eq!(length.duration_ms, 600_000);
        prop_assert_eq!(warning.unwrap().bound, Bound::Maximum);
    }

    /// Typed milliseconds past the maximum never wrap back into range.
    #[test]
    fn huge_duration_ms_clamps(ms in 600_001u64..u64::MAX / 2) {
        let mut form = FormState::defaults();
        let warning = form.edit("duration_ms", &ms.to_string()).unwrap();

        prop_assert_eq!(form.length.duration_ms, 600_000);
        prop_assert_eq!(warning.unwrap().bound, Bound::Maximum);
    }

    /// In-range totals survive ms -> min:sec -> ms.
    #[test]
    fn whole_seconds_round_trip(total_seconds in 30u64..=600) {
        let ms = total_seconds * 1000;
        let (minutes, seconds) = ms_to_min_sec(ms);

        prop_assert!(seconds < 60);
        prop_assert_eq!(min_sec_to_ms(minutes, seconds), ms);

        let (length, warning) = normalize_duration(i64::from(minutes), i64::from(seconds));
        prop_assert!(warning.is_none());
        prop_assert_eq!(length.duration_ms, ms);
    }
}

// =============================================================================
// Feature Field Tests
// =============================================================================

proptest! {
    /// Clamped text always parses back into the feature's range, and a
    /// warning appears exactly when the value moved.
    #[test]
    fn clamp_stays_in_range(index in 0usize..FEATURES.len(), value in -1.0e6f64..1.0e6) {
        let spec = &FEATURES[index];
        let mut text = value.to_string();

        let warning = clamp_field(spec, &mut text);
        let clamped = parse_number(&text).unwrap();

        prop_assert!(clamped >= spec.min && clamped <= spec.max);
        prop_assert_eq!(warning.is_some(), !spec.contains(value));
        if warning.is_none() {
            prop_assert_eq!(clamped, value);
        }
    }

    /// Numeric edits never produce an out-of-range payload.
    #[test]
    fn edited_form_builds_valid_vector(
        values in proptest::collection::vec(-1000.0f64..1000.0, 9),
        minutes in 0i64..20,
        seconds in 0i64..100,
    ) {
        let mut form = FormState::defaults();
        let names = FEATURES.iter().filter(|f| f.name != "duration_ms").map(|f| f.name);
        for (name, value) in names.zip(values) {
            form.edit(name, &value.to_string()).unwrap();
        }
        form.edit("minutes", &minutes.to_string()).unwrap();
        form.edit("seconds", &seconds.to_string()).unwrap();

        let vector = form.to_vector().unwrap();
        prop_assert_eq!(vector.len(), 10);
        for spec in FEATURES.iter() {
            let v = vector.get(spec.name).unwrap();
            prop_assert!(spec.contains(v), "{} = {} out of range", spec.name, v);
        }
    }
}
