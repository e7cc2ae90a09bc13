mod tests {
    use myrtio_light_controller::color::{WHITE, rgb_from_u32};
    use myrtio_light_controller::schema::{
        EffectSchema, EnumSpec, FieldSchema, NumberSpec, OpaqueSpec, TextSpec,
    };
    use myrtio_light_controller::{
        EffectKind, FieldValue, RawParams, RawValue, Rgb, ValidationError, ValidationReason,
        validate,
    };

    const LABEL: usize = 0;
    const NOTE: usize = 1;
    const MODE: usize = 2;
    const SCRIPT: usize = 3;
    const LEVEL: usize = 4;

    static TEST_SCHEMA: EffectSchema = EffectSchema::new(
        "Test",
        &[
            FieldSchema::text("Label", "", TextSpec::new(1, 4).with_default("lamp").required()),
            FieldSchema::text("Note", "", TextSpec::new(0, 8)),
            FieldSchema::choice("Mode", "", EnumSpec::new(&["Slow", "Fast"], 1).required()),
            FieldSchema::opaque("Script", "", OpaqueSpec::new().with_default("{}").required()),
            FieldSchema::number("Level", "", NumberSpec::new(0.0, 1.0).with_step(0.25)),
        ],
    );

    static STRICT_SCHEMA: EffectSchema = EffectSchema::new(
        "Strict",
        &[
            FieldSchema::text("Label", "", TextSpec::new(1, 3).with_default("lamp").required()),
            FieldSchema::opaque("Script", "", OpaqueSpec::new().with_default("").required()),
        ],
    );

    fn params(entries: &[(&str, RawValue)]) -> RawParams {
        entries
            .iter()
            .map(|(name, value)| ((*name).to_string(), value.clone()))
            .collect()
    }

    fn color(r: f64, g: f64, b: f64) -> RawValue {
        RawValue::Map(params(&[
            ("r", RawValue::Number(r)),
            ("g", RawValue::Number(g)),
            ("b", RawValue::Number(b)),
        ]))
    }

    fn speed_error(speed: RawValue) -> Option<ValidationReason> {
        let schema = EffectKind::Rainbow.schema();
        validate(schema, &params(&[("Speed", speed)]))
            .err()
            .map(|err| err.reason)
    }

    #[test]
    fn test_rainbow_speed_accepted() {
        let schema = EffectKind::Rainbow.schema();
        let config = validate(schema, &params(&[("Speed", 5.0.into())])).unwrap();
        assert_eq!(config.get(0), Some(&FieldValue::Number(5.0)));
        assert_eq!(config.number(schema, 0), Some(5.0));
    }

    #[test]
    fn test_rainbow_speed_wrong_type_rejected() {
        let schema = EffectKind::Rainbow.schema();
        let err = validate(schema, &params(&[("Speed", "fast".into())])).unwrap_err();
        assert_eq!(
            err,
            ValidationError {
                field: "Speed",
                reason: ValidationReason::TypeMismatch,
            }
        );
    }

    #[test]
    fn test_rainbow_speed_missing_rejected() {
        let schema = EffectKind::Rainbow.schema();
        let err = validate(schema, &RawParams::new()).unwrap_err();
        assert_eq!(err.reason, ValidationReason::MissingRequired);
    }

    #[test]
    fn test_null_counts_as_absent() {
        assert_eq!(
            speed_error(RawValue::Null),
            Some(ValidationReason::MissingRequired)
        );
    }

    #[test]
    fn test_number_bounds_accepted() {
        assert_eq!(speed_error(1.0.into()), None);
        assert_eq!(speed_error(50.0.into()), None);
        assert_eq!(speed_error(17.0.into()), None);
    }

    #[test]
    fn test_number_out_of_range_rejected() {
        assert_eq!(speed_error(0.0.into()), Some(ValidationReason::OutOfRange));
        assert_eq!(speed_error(51.0.into()), Some(ValidationReason::OutOfRange));
        assert_eq!(speed_error((-3.0).into()), Some(ValidationReason::OutOfRange));
    }

    #[test]
    fn test_number_off_step_rejected() {
        assert_eq!(speed_error(2.5.into()), Some(ValidationReason::NotOnStep));
    }

    #[test]
    fn test_number_non_finite_rejected() {
        assert_eq!(speed_error(f64::NAN.into()), Some(ValidationReason::OutOfRange));
        assert_eq!(
            speed_error(f64::INFINITY.into()),
            Some(ValidationReason::OutOfRange)
        );
        assert_eq!(
            speed_error(f64::NEG_INFINITY.into()),
            Some(ValidationReason::OutOfRange)
        );
    }

    #[test]
    fn test_fractional_step() {
        let base = params(&[("Label", "ok".into())]);
        for (level, accepted) in [(0.0, true), (0.75, true), (1.0, true), (0.3, false)] {
            let mut raw = base.clone();
            raw.insert("Level".into(), level.into());
            let config = validate(&TEST_SCHEMA, &raw).unwrap();
            assert_eq!(config.contains(LEVEL), accepted, "level {level}");
        }
    }

    #[test]
    fn test_required_text_falls_back_to_default() {
        let config = validate(&TEST_SCHEMA, &params(&[("Label", "too long".into())])).unwrap();
        assert_eq!(config.text(&TEST_SCHEMA, LABEL), Some("lamp"));
        assert_eq!(config.get(LABEL), Some(&FieldValue::Text("lamp".into())));
    }

    #[test]
    fn test_required_text_with_invalid_default_fails() {
        let err = validate(&STRICT_SCHEMA, &params(&[("Label", "too long".into())])).unwrap_err();
        assert_eq!(
            err,
            ValidationError {
                field: "Label",
                reason: ValidationReason::LengthBounds,
            }
        );
    }

    #[test]
    fn test_text_length_counts_bytes() {
        let config = validate(&TEST_SCHEMA, &params(&[("Label", "ÿÿ".into())])).unwrap();
        assert_eq!(config.text(&TEST_SCHEMA, LABEL), Some("ÿÿ"));

        // three characters, six bytes: over the limit of 4
        let config = validate(&TEST_SCHEMA, &params(&[("Label", "ÿÿÿ".into())])).unwrap();
        assert_eq!(config.text(&TEST_SCHEMA, LABEL), Some("lamp"));
        assert_eq!(
            TextSpec::new(1, 4).check("ÿÿÿ"),
            Err(ValidationReason::LengthBounds)
        );
    }

    #[test]
    fn test_optional_invalid_field_omitted() {
        let raw = params(&[("Label", "ok".into()), ("Note", 12.0.into())]);
        let config = validate(&TEST_SCHEMA, &raw).unwrap();
        assert!(!config.contains(NOTE));
        assert_eq!(config.text(&TEST_SCHEMA, NOTE), None);
    }

    #[test]
    fn test_enum_matches_case_sensitive() {
        let raw = params(&[("Label", "ok".into()), ("Mode", "Slow".into())]);
        let config = validate(&TEST_SCHEMA, &raw).unwrap();
        assert_eq!(config.get(MODE), Some(&FieldValue::Enum(0)));

        let raw = params(&[("Label", "ok".into()), ("Mode", "slow".into())]);
        let config = validate(&TEST_SCHEMA, &raw).unwrap();
        assert_eq!(config.get(MODE), Some(&FieldValue::Enum(1)));
    }

    #[test]
    fn test_optional_enum_unknown_option_uses_default_on_read() {
        let schema = EffectKind::RainbowWave.schema();
        let raw = params(&[("Speed", 3.0.into()), ("Direction", "Sideways".into())]);
        let config = validate(schema, &raw).unwrap();
        assert!(!config.contains(1));
        assert_eq!(config.option(schema, 1), Some(0));
    }

    #[test]
    fn test_opaque_default_substituted() {
        let config = validate(&TEST_SCHEMA, &params(&[("Label", "ok".into())])).unwrap();
        assert_eq!(config.opaque(&TEST_SCHEMA, SCRIPT), Some("{}"));
        assert!(config.contains(SCRIPT));
    }

    #[test]
    fn test_opaque_empty_default_is_not_usable() {
        let err = validate(&STRICT_SCHEMA, &params(&[("Label", "ok".into())])).unwrap_err();
        assert_eq!(
            err,
            ValidationError {
                field: "Script",
                reason: ValidationReason::MissingRequired,
            }
        );
    }

    #[test]
    fn test_first_failing_field_reported() {
        let raw = params(&[("Label", 1.0.into())]);
        let err = validate(&STRICT_SCHEMA, &raw).unwrap_err();
        assert_eq!(err.field, "Label");
        assert_eq!(err.reason, ValidationReason::TypeMismatch);
    }

    #[test]
    fn test_solid_color_accepted() {
        let schema = EffectKind::Solid.schema();
        let config = validate(schema, &params(&[("Color", color(0.0, 255.0, 0.0))])).unwrap();
        assert_eq!(config.color(schema, 0), Some(Rgb::new(0, 255, 0)));
    }

    #[test]
    fn test_color_list_accepted() {
        let schema = EffectKind::Solid.schema();
        let list = RawValue::List(vec![1.0.into(), 2.0.into(), 3.0.into()]);
        let config = validate(schema, &params(&[("Color", list)])).unwrap();
        assert_eq!(config.color(schema, 0), Some(Rgb::new(1, 2, 3)));
    }

    #[test]
    fn test_required_color_falls_back_to_default() {
        let schema = EffectKind::Solid.schema();
        for raw in [
            params(&[("Color", color(300.0, 0.0, 0.0))]),
            params(&[("Color", color(0.5, 0.0, 0.0))]),
            params(&[("Color", "red".into())]),
            RawParams::new(),
        ] {
            let config = validate(schema, &raw).unwrap();
            assert_eq!(config.color(schema, 0), Some(rgb_from_u32(0xFF_00_00)));
        }
    }

    #[test]
    fn test_optional_color_omitted() {
        let schema = EffectKind::Bounce.schema();
        let config = validate(schema, &params(&[("Color", color(0.0, 0.0, 256.0))])).unwrap();
        assert!(!config.contains(1));
        assert_eq!(config.color(schema, 1), Some(WHITE));
    }

    #[test]
    fn test_flag_coercion() {
        let schema = EffectKind::Bounce.schema();
        let cases = [
            (RawValue::Bool(true), true),
            (RawValue::Number(2.0), true),
            (RawValue::Number(0.0), false),
            (RawValue::Text("yes".into()), true),
            (RawValue::Text(String::new()), false),
            (RawValue::List(Vec::new()), true),
            (RawValue::Map(RawParams::new()), true),
        ];
        for (value, expected) in cases {
            let config = validate(schema, &params(&[("Wrap", value.clone())])).unwrap();
            assert_eq!(config.flag(schema, 2), expected, "{value:?}");
        }
    }

    #[test]
    fn test_absent_flag_takes_default() {
        let schema = EffectKind::Bounce.schema();
        let config = validate(schema, &params(&[("Wrap", RawValue::Null)])).unwrap();
        assert_eq!(config.get(2), Some(&FieldValue::Flag(false)));
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let schema = EffectKind::Rainbow.schema();
        let raw = params(&[("Speed", 4.0.into()), ("Sparkle", true.into())]);
        let config = validate(schema, &raw).unwrap();
        assert_eq!(config.len(), 1);
    }
}
