use super::*;

#[test]
fn style_tags_parse_leniently() {
    assert_eq!(StyleTag::parse(Some("Demon")), StyleTag::Demon);
    assert_eq!(StyleTag::parse(Some(" panic ")), StyleTag::Panic);
    assert_eq!(StyleTag::parse(Some("ghost")), StyleTag::Narrator);
    assert_eq!(StyleTag::parse(None), StyleTag::Narrator);
}

#[test]
fn default_table_maps_roles_to_speakers() {
    let table = ProfileTable::default();
    assert_eq!(table.resolve(StyleTag::Narrator).speaker.primary(), "Ryan");
    assert_eq!(table.resolve(StyleTag::Victim).speaker.primary(), "Vivian");
    let demon = table.resolve(StyleTag::Demon);
    assert_eq!(demon.speaker.primary(), "Aiden");
    assert_eq!(demon.deepen, Some(0.85));
    assert!(table.resolve(StyleTag::Panic).speed > 1.0);
    assert!(table.resolve(StyleTag::Dread).speed < 1.0);
    table.validate().unwrap();
}

#[test]
fn missing_entries_fall_back_to_narrator() {
    let mut table = ProfileTable::empty();
    table.insert(
        StyleTag::Narrator,
        VoiceProfile::new(SpeakerSelection::single("Solo")),
    );
    assert_eq!(table.resolve(StyleTag::Whisper).speaker.primary(), "Solo");
    assert_eq!(
        ProfileTable::empty().resolve(StyleTag::Demon).speaker.primary(),
        "Ryan"
    );
}

#[test]
fn blend_selector_formats_weights() {
    let s = SpeakerSelection::Blend {
        primary: "Aiden".into(),
        secondary: "Ryan".into(),
        ratio: 0.7,
    };
    assert_eq!(s.selector(), "Aiden:0.70,Ryan:0.30");
    assert_eq!(SpeakerSelection::single("Ryan").selector(), "Ryan");
}

#[test]
fn profile_overrides_deserialize_from_json() {
    let json = r#"{
        "narrator": {"speaker": "Eric", "speed": 1.1},
        "demon": {"speaker": {"primary": "A", "secondary": "B", "ratio": 0.6}, "deepen": 0.8}
    }"#;
    let overrides: ProfileTable = serde_json::from_str(json).unwrap();
    let table = ProfileTable::default().merged(&overrides);
    assert_eq!(table.resolve(StyleTag::Narrator).speaker.primary(), "Eric");
    assert_eq!(table.resolve(StyleTag::Narrator).instruct, "Speak normally.");
    assert_eq!(table.resolve(StyleTag::Demon).deepen, Some(0.8));
    assert_eq!(table.resolve(StyleTag::Victim).speaker.primary(), "Vivian");
}

#[test]
fn invalid_profiles_are_rejected() {
    let bad = VoiceProfile {
        speed: 0.0,
        ..VoiceProfile::new(SpeakerSelection::single("Ryan"))
    };
    assert!(bad.validate().is_err());
    let bad_blend = VoiceProfile::new(SpeakerSelection::Blend {
        primary: "A".into(),
        secondary: "B".into(),
        ratio: 1.5,
    });
    assert!(bad_blend.validate().is_err());
}
