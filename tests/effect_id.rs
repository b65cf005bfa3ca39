mod tests {
    use wopr_effects::{Effect, EffectId};

    #[test]
    fn test_effect_id_from_raw() {
        assert_eq!(EffectId::from_raw(0), Some(EffectId::Time));
        assert_eq!(EffectId::from_raw(6), Some(EffectId::XmasSeconds));
        assert_eq!(EffectId::from_raw(12), Some(EffectId::TheRick));
        assert_eq!(EffectId::from_raw(13), None);
    }

    #[test]
    fn test_effect_id_ids_follow_catalog_order() {
        for (raw, id) in EffectId::ALL.iter().enumerate() {
            assert_eq!(EffectId::from_raw(raw as u8), Some(*id));
        }
    }

    #[test]
    fn test_effect_id_parse_date_time_rainbow() {
        assert_eq!(
            EffectId::parse_from_str("Date Time R"),
            Some(EffectId::DateTimeRainbow)
        );
    }

    #[test]
    fn test_effect_id_parse_is_case_sensitive() {
        assert_eq!(EffectId::parse_from_str("Rainbow"), Some(EffectId::Rainbow));
        assert_eq!(EffectId::parse_from_str("rainbow"), None);
        assert_eq!(EffectId::parse_from_str(""), None);
    }

    #[test]
    fn test_effect_id_as_str_xmas() {
        assert_eq!(EffectId::XmasSeconds.as_str(), "Xmas seconds");
    }

    #[test]
    fn test_effect_id_slot_names() {
        for id in EffectId::ALL {
            assert_eq!(id.to_slot().name(), id.as_str());
        }
    }
}
