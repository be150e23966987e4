//! Property-based tests for input validation: trigger-time parsing and
//! coordinate range checks.

use chrono::Timelike;
use proptest::prelude::*;

use duskshift::common::{
    Coordinates, ThemeType, is_valid_trigger_time, parse_trigger_time, trigger_time_minutes,
};

proptest! {
    #[test]
    fn every_real_time_of_day_parses(hour in 0u32..24, minute in 0u32..60) {
        let padded = format!("{hour:02}:{minute:02}");
        let parsed = parse_trigger_time(&padded).unwrap();
        prop_assert_eq!((parsed.hour(), parsed.minute()), (hour, minute));
        prop_assert_eq!(trigger_time_minutes(parsed), hour * 60 + minute);

        // The leading zero on the hour is optional
        let unpadded = format!("{hour}:{minute:02}");
        prop_assert_eq!(parse_trigger_time(&unpadded), Some(parsed));
    }

    #[test]
    fn out_of_range_components_never_parse(hour in 24u32..100, minute in 60u32..100) {
        let bad_hour = format!("{hour:02}:00");
        let bad_minute = format!("12:{minute:02}");
        let bad_both = format!("{hour:02}:{minute:02}");
        prop_assert!(!is_valid_trigger_time(&bad_hour));
        prop_assert!(!is_valid_trigger_time(&bad_minute));
        prop_assert!(!is_valid_trigger_time(&bad_both));
    }

    #[test]
    fn arbitrary_strings_never_panic_the_parser(s in ".*") {
        // Parsing is total: any input yields Some or None, never a panic
        let _ = parse_trigger_time(&s);
    }

    #[test]
    fn in_range_coordinates_validate(
        latitude in -90.0f64..=90.0,
        longitude in -180.0f64..=180.0,
    ) {
        let result = Coordinates::validated(latitude, longitude);
        if latitude == 0.0 && longitude == 0.0 {
            prop_assert!(result.is_none());
        } else {
            let coordinates = result.unwrap();
            prop_assert_eq!(coordinates.latitude, latitude);
            prop_assert_eq!(coordinates.longitude, longitude);
        }
    }

    #[test]
    fn out_of_range_latitude_is_rejected(
        latitude in prop_oneof![90.0001f64..1e6, -1e6f64..-90.0001],
        longitude in -180.0f64..=180.0,
    ) {
        prop_assert!(Coordinates::validated(latitude, longitude).is_none());
    }

    #[test]
    fn out_of_range_longitude_is_rejected(
        latitude in -90.0f64..=90.0,
        longitude in prop_oneof![180.0001f64..1e6, -1e6f64..-180.0001],
    ) {
        prop_assert!(Coordinates::validated(latitude, longitude).is_none());
    }

    #[test]
    fn theme_toggle_is_an_involution(dark in any::<bool>()) {
        let theme = if dark { ThemeType::Dark } else { ThemeType::Light };
        prop_assert_eq!(theme.toggled().toggled(), theme);
        prop_assert_ne!(theme.toggled(), theme);
    }
}
