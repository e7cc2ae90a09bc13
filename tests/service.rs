mod tests {
    use myrtio_light_controller::codec;
    use myrtio_light_controller::config::{PREFERENCES_FILE, STATE_FILE};
    use myrtio_light_controller::{
        ConfigService, ControllerConfig, DecodeLimits, EffectInstance, EffectKind,
        MemoryStorage, PersistentDocument, ProtocolError, RawParams, RawValue, SharedState,
        StateObserver, StripConfig, UpdateError, ValidationError, ValidationReason,
    };

    #[derive(Default)]
    struct Recorder {
        documents: Vec<Vec<u8>>,
    }

    impl StateObserver for Recorder {
        fn broadcast(&mut self, document: &[u8]) {
            self.documents.push(document.to_vec());
        }
    }

    fn params(entries: &[(&str, RawValue)]) -> RawParams {
        entries
            .iter()
            .map(|(name, value)| ((*name).to_string(), value.clone()))
            .collect()
    }

    fn message(entries: &[(&str, RawValue)]) -> Vec<u8> {
        rmp_serde::to_vec_named(&RawValue::Map(params(entries))).unwrap()
    }

    fn stored_document(storage: &MemoryStorage) -> PersistentDocument {
        let bytes = storage.get(STATE_FILE).unwrap();
        codec::decode(bytes, DecodeLimits::default()).unwrap()
    }

    fn two_strips() -> ControllerConfig {
        ControllerConfig {
            strips: vec![StripConfig::new("desk", 10), StripConfig::new("shelf", 4)],
            ..ControllerConfig::default()
        }
    }

    #[test]
    fn test_rainbow_scenario() {
        let config = ControllerConfig::default();
        let state = SharedState::new(&config.strips);
        let mut service = ConfigService::new(&state, MemoryStorage::new(), Recorder::default(), &config);
        service.begin();
        assert_eq!(service.observer().documents.len(), 1);

        service
            .apply_update(0, EffectKind::Rainbow, &params(&[("Speed", 5.0.into())]))
            .unwrap();
        let document = stored_document(service.store().storage());
        assert_eq!(
            document["default"]["Rainbow"].get("Speed"),
            Some(&RawValue::Number(5.0))
        );
        assert_eq!(service.observer().documents.len(), 2);

        let err = service
            .apply_update(0, EffectKind::Rainbow, &params(&[("Speed", "fast".into())]))
            .unwrap_err();
        assert_eq!(
            err,
            UpdateError::Validation(ValidationError {
                field: "Speed",
                reason: ValidationReason::TypeMismatch,
            })
        );
        assert!(state.snapshot().config("default", EffectKind::Rainbow).is_none());
        let document = stored_document(service.store().storage());
        assert!(!document["default"].contains_key("Rainbow"));
        assert_eq!(service.observer().documents.len(), 3);

        service.remove(0, EffectKind::Rainbow).unwrap();
        assert_eq!(service.observer().documents.len(), 3);
    }

    #[test]
    fn test_broadcast_matches_stored_document() {
        let config = ControllerConfig::default();
        let state = SharedState::new(&config.strips);
        let mut service = ConfigService::new(&state, MemoryStorage::new(), Recorder::default(), &config);
        service.begin();
        service
            .apply_update(0, EffectKind::Solid, &params(&[("Color", RawValue::Null)]))
            .unwrap();

        let pushed = service.observer().documents.last().unwrap();
        assert_eq!(
            Some(pushed.as_slice()),
            service.store().storage().get(STATE_FILE)
        );
    }

    #[test]
    fn test_failed_update_without_slot_changes_nothing() {
        let config = ControllerConfig::default();
        let state = SharedState::new(&config.strips);
        let mut service = ConfigService::new(&state, MemoryStorage::new(), Recorder::default(), &config);

        let result = service.apply_update(0, EffectKind::Rainbow, &RawParams::new());
        assert!(matches!(result, Err(UpdateError::Validation(_))));
        assert!(service.observer().documents.is_empty());
        assert!(service.store().storage().get(STATE_FILE).is_none());
    }

    #[test]
    fn test_remove_commits_only_present_slots() {
        let config = two_strips();
        let state = SharedState::new(&config.strips);
        let mut service = ConfigService::new(&state, MemoryStorage::new(), Recorder::default(), &config);
        service
            .apply_update(1, EffectKind::Bounce, &RawParams::new())
            .unwrap();
        assert_eq!(service.observer().documents.len(), 1);

        service.remove(1, EffectKind::Rainbow).unwrap();
        service.remove(0, EffectKind::Bounce).unwrap();
        assert_eq!(service.observer().documents.len(), 1);

        service.remove(1, EffectKind::Bounce).unwrap();
        assert_eq!(service.observer().documents.len(), 2);
        assert!(state.snapshot().config("shelf", EffectKind::Bounce).is_none());
        assert!(stored_document(service.store().storage())["shelf"].is_empty());
    }

    #[test]
    fn test_unknown_strip_index() {
        let config = ControllerConfig::default();
        let state = SharedState::new(&config.strips);
        let mut service = ConfigService::new(&state, MemoryStorage::new(), (), &config);

        let raw = params(&[("Speed", 5.0.into())]);
        assert_eq!(
            service.apply_update(3, EffectKind::Rainbow, &raw),
            Err(UpdateError::UnknownStrip(3))
        );
        assert_eq!(
            service.remove(3, EffectKind::Rainbow),
            Err(UpdateError::UnknownStrip(3))
        );
    }

    #[test]
    fn test_update_keeps_animation_state() {
        let config = ControllerConfig::default();
        let state = SharedState::new(&config.strips);
        let mut service = ConfigService::new(&state, MemoryStorage::new(), (), &config);
        service
            .apply_update(0, EffectKind::Bounce, &params(&[("Speed", 1.0.into())]))
            .unwrap();

        let mut leds = vec![Default::default(); 10];
        for frame in 0..3 {
            state.render_strip(0, myrtio_light_controller::Instant::from_millis(frame), &mut leds);
        }

        service
            .apply_update(0, EffectKind::Bounce, &params(&[("Wrap", true.into())]))
            .unwrap();

        let position = state.with_table(|table| {
            match table.strip(0).unwrap().get(EffectKind::Bounce).unwrap().instance() {
                EffectInstance::Bounce(bounce) => bounce.position(),
                _ => unreachable!(),
            }
        });
        assert_eq!(position, 3);
        let snapshot = state.snapshot();
        let stored = snapshot.config("default", EffectKind::Bounce).unwrap();
        assert!(stored.flag(EffectKind::Bounce.schema(), 2));
    }

    #[test]
    fn test_boot_restore_skips_invalid_entries() {
        let root = params(&[
            ("type", "config".into()),
            (
                "desk",
                RawValue::Map(params(&[
                    ("Rainbow", RawValue::Map(params(&[("Speed", 7.0.into())]))),
                    ("Rainbow2", RawValue::Map(params(&[("Speed", 0.0.into())]))),
                    ("Sparkle", RawValue::Map(params(&[("Speed", 1.0.into())]))),
                ])),
            ),
            (
                "garage",
                RawValue::Map(params(&[(
                    "Rainbow",
                    RawValue::Map(params(&[("Speed", 7.0.into())])),
                )])),
            ),
        ]);
        let mut storage = MemoryStorage::new();
        storage.insert(STATE_FILE, rmp_serde::to_vec_named(&RawValue::Map(root)).unwrap());

        let config = two_strips();
        let state = SharedState::new(&config.strips);
        let mut service = ConfigService::new(&state, storage, Recorder::default(), &config);
        service.begin();

        let snapshot = state.snapshot();
        let desk = snapshot.strip("desk").unwrap();
        assert_eq!(desk.effects.len(), 1);
        assert_eq!(desk.effects[0].0, EffectKind::Rainbow);
        assert!(snapshot.strip("shelf").unwrap().effects.is_empty());

        let document = stored_document(service.store().storage());
        assert_eq!(document["desk"].len(), 1);
        assert!(document["shelf"].is_empty());
        assert!(!document.contains_key("garage"));
        assert_eq!(service.observer().documents.len(), 1);
    }

    #[test]
    fn test_corrupt_state_boots_blank() {
        let mut storage = MemoryStorage::new();
        storage.insert(STATE_FILE, b"\xc1 corrupt".to_vec());

        let config = two_strips();
        let state = SharedState::new(&config.strips);
        let mut service = ConfigService::new(&state, storage, (), &config);
        service.begin();

        let snapshot = state.snapshot();
        assert!(snapshot.strips.iter().all(|strip| strip.effects.is_empty()));
    }

    #[test]
    fn test_handle_update_and_remove_messages() {
        let config = two_strips();
        let state = SharedState::new(&config.strips);
        let mut service = ConfigService::new(&state, MemoryStorage::new(), (), &config);

        let update = message(&[
            ("type", "updateEffect".into()),
            ("strip", "shelf".into()),
            ("effect", "Red and Green".into()),
            ("config", RawValue::Map(params(&[("Speed", 2.0.into())]))),
        ]);
        service.handle_message(&update).unwrap();
        assert!(state.snapshot().config("shelf", EffectKind::RedGreen).is_some());

        let remove = message(&[
            ("type", "removeEffect".into()),
            ("strip", "shelf".into()),
            ("effect", "Red and Green".into()),
        ]);
        service.handle_message(&remove).unwrap();
        assert!(state.snapshot().config("shelf", EffectKind::RedGreen).is_none());
    }

    #[test]
    fn test_rejected_config_message_removes_slot() {
        let config = two_strips();
        let state = SharedState::new(&config.strips);
        let mut service = ConfigService::new(&state, MemoryStorage::new(), (), &config);
        service
            .apply_update(0, EffectKind::Rainbow, &params(&[("Speed", 5.0.into())]))
            .unwrap();

        let update = message(&[
            ("type", "updateEffect".into()),
            ("strip", "desk".into()),
            ("effect", "Rainbow".into()),
            ("config", RawValue::Map(params(&[("Speed", 60.0.into())]))),
        ]);
        service.handle_message(&update).unwrap();
        assert!(state.snapshot().config("desk", EffectKind::Rainbow).is_none());
    }

    #[test]
    fn test_invalid_messages_dropped() {
        let config = two_strips();
        let state = SharedState::new(&config.strips);
        let mut service = ConfigService::new(&state, MemoryStorage::new(), Recorder::default(), &config);

        assert_eq!(
            service.handle_message(b"\xc1"),
            Err(ProtocolError::Malformed)
        );
        assert_eq!(
            service.handle_message(&message(&[("type", "reboot".into())])),
            Err(ProtocolError::UnknownMessageType("reboot".into()))
        );
        assert_eq!(
            service.handle_message(&message(&[
                ("type", "removeEffect".into()),
                ("strip", "porch".into()),
                ("effect", "Rainbow".into()),
            ])),
            Err(ProtocolError::UnknownStrip("porch".into()))
        );
        assert_eq!(
            service.handle_message(&message(&[
                ("type", "removeEffect".into()),
                ("strip", "desk".into()),
                ("effect", "Sparkle".into()),
            ])),
            Err(ProtocolError::UnknownEffect("Sparkle".into()))
        );
        assert_eq!(
            service.handle_message(&message(&[
                ("type", "updateEffect".into()),
                ("strip", "desk".into()),
                ("effect", "Rainbow".into()),
            ])),
            Err(ProtocolError::MissingField("config"))
        );
        assert!(service.observer().documents.is_empty());
    }

    #[test]
    fn test_update_global_persists_preferences() {
        let config = ControllerConfig::default();
        let state = SharedState::new(&config.strips);
        let mut service = ConfigService::new(&state, MemoryStorage::new(), Recorder::default(), &config);
        service.begin();
        assert_eq!(state.global().brightness, 30);
        assert!(state.global().on);

        let update = message(&[
            ("type", "updateGlobal".into()),
            ("brightness", 120.0.into()),
            ("on", false.into()),
        ]);
        service.handle_message(&update).unwrap();

        let global = state.global();
        assert_eq!(global.brightness, 120);
        assert!(!global.on);
        assert!(global.follow_sun);

        let pushed: RawValue =
            rmp_serde::from_slice(service.observer().documents.last().unwrap()).unwrap();
        assert_eq!(pushed.get("type"), Some(&RawValue::Text("globalStats".into())));
        assert_eq!(pushed.get("brightness"), Some(&RawValue::Number(120.0)));
        assert_eq!(pushed.get("on"), Some(&RawValue::Bool(false)));
        assert_eq!(pushed.get("followSun"), Some(&RawValue::Bool(true)));
        assert!(service.store().storage().get(PREFERENCES_FILE).is_some());

        let storage = service.store().storage().clone();
        let restarted = SharedState::new(&config.strips);
        let mut service = ConfigService::new(&restarted, storage, (), &config);
        service.begin();
        assert_eq!(restarted.global().brightness, 120);
        assert!(restarted.global().on);
    }

    #[test]
    fn test_greeting_documents() {
        let config = ControllerConfig::default();
        let state = SharedState::new(&config.strips);
        let mut service = ConfigService::new(&state, MemoryStorage::new(), (), &config);
        service
            .apply_update(0, EffectKind::Solid, &RawParams::new())
            .unwrap();

        let greeting = service.greeting().unwrap();
        let document = codec::decode(&greeting.state, DecodeLimits::default()).unwrap();
        assert!(document["default"].contains_key("Solid"));

        let global: RawValue = rmp_serde::from_slice(&greeting.global).unwrap();
        assert_eq!(global.get("type"), Some(&RawValue::Text("globalStats".into())));

        let catalog: RawValue = rmp_serde::from_slice(&greeting.catalog).unwrap();
        assert_eq!(catalog.get("type"), Some(&RawValue::Text("effectConfig".into())));
        let Some(RawValue::List(effects)) = catalog.get("effects") else {
            panic!("catalog without effect list");
        };
        assert_eq!(effects.len(), 5);
        assert_eq!(effects[2].get("name"), Some(&RawValue::Text("Solid".into())));
    }
}
