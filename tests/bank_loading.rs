use std::path::PathBuf;

use singularity::{
    block::{DspBlockData, ModSource},
    synth::StealPolicy,
    PatchError, ProgramBank, ProgramId, SynthConfig,
};

fn demo_bank_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("patches/demo_bank.toml")
}

#[test]
fn demo_bank_loads() {
    let bank = ProgramBank::load(demo_bank_path()).unwrap();
    assert_eq!(bank.name(), "demo");
    assert_eq!(bank.len(), 2);

    let organ = bank.program(ProgramId(10)).unwrap();
    assert_eq!(organ.name, "organ");
    assert_eq!(organ.role.as_deref(), Some("keys"));
    assert_eq!(organ.layers[0].dsp_blocks.len(), 4);
    assert_eq!(organ.layers[0].control_blocks[0].populated(), 2);

    let split = bank.program_by_name("split").unwrap();
    assert_eq!(split.layers.len(), 2);
    assert_eq!(split.layers[1].key_range.lo, 48);
    assert_eq!(split.layers[1].dsp_blocks[2], DspBlockData::RingMod);
    match &split.layers[0].dsp_blocks[3] {
        DspBlockData::Amp(amp) => assert_eq!(
            amp.source.as_ref().map(|route| &route.from),
            Some(&ModSource::Slot { block: 0, slot: 0 })
        ),
        other => panic!("expected AMP, got {}", other.name()),
    }
}

#[test]
fn lookup_miss_is_none() {
    let bank = ProgramBank::load(demo_bank_path()).unwrap();
    assert!(bank.program_by_name("nonexistent").is_none());
    assert!(bank.program(ProgramId(0)).is_none());
}

#[test]
fn missing_file_reports_the_path() {
    let err = ProgramBank::load("no/such/bank.toml").unwrap_err();
    assert!(matches!(err, PatchError::ReadFile { .. }));
    assert!(err.to_string().contains("no/such/bank.toml"));
}

const HEADER: &str = r#"
name = "broken"

[[programs]]
id = 1
name = "p"

[[programs.layers]]
name = "main"

[[programs.layers.control_blocks]]

[[programs.layers.control_blocks.controllers]]
slot = 0
name = "ampenv"
kind = "envelope"
"#;

fn with_header(rest: &str) -> Result<ProgramBank, PatchError> {
    ProgramBank::from_toml_str(&format!("{HEADER}{rest}"))
}

#[test]
fn routes_to_unknown_controllers_are_rejected() {
    let err = with_header(
        r#"
        [[programs.layers.dsp_blocks]]
        block = "AMP"
        source = { from = "filtenv" }
        "#,
    )
    .unwrap_err();
    assert!(matches!(err, PatchError::UnknownController { .. }), "{err}");
}

#[test]
fn out_of_range_parameters_are_rejected() {
    let err = with_header(
        r#"
        [[programs.layers.dsp_blocks]]
        block = "AMP"
        vel_track = 2.0
        "#,
    )
    .unwrap_err();
    assert!(
        matches!(err, PatchError::InvalidParameter { param: "vel_track", .. }),
        "{err}"
    );
}

#[test]
fn slot_errors_surface_while_parsing() {
    let err = with_header(
        r#"
        [[programs.layers.control_blocks.controllers]]
        slot = 0
        name = "again"
        kind = "constant"
        "#,
    )
    .unwrap_err();
    assert!(matches!(err, PatchError::Parse(_)));
    assert!(err.to_string().contains("assigned twice"), "{err}");

    let err = with_header(
        r#"
        [[programs.layers.control_blocks.controllers]]
        slot = 4
        name = "far"
        kind = "constant"
        "#,
    )
    .unwrap_err();
    assert!(err.to_string().contains("out of range"), "{err}");
}

#[test]
fn unknown_block_tags_fail_to_parse() {
    let err = with_header(
        r#"
        [[programs.layers.dsp_blocks]]
        block = "REVERB"
        "#,
    )
    .unwrap_err();
    assert!(matches!(err, PatchError::Parse(_)));
}

#[test]
fn duplicate_program_ids_are_rejected() {
    let source = r#"
        [[programs]]
        id = 3
        name = "a"
        [[programs.layers]]
        name = "main"

        [[programs]]
        id = 3
        name = "b"
        [[programs.layers]]
        name = "main"
    "#;
    let err = ProgramBank::from_toml_str(source).unwrap_err();
    assert!(matches!(err, PatchError::DuplicateProgram(ProgramId(3))));
}

#[test]
fn config_from_toml() {
    let config = SynthConfig::from_toml_str(
        r#"
        sample_rate = 44100.0
        max_voices = 32
        steal_policy = "quietest"
        "#,
    )
    .unwrap();
    assert_eq!(config.sample_rate, 44_100.0);
    assert_eq!(config.max_voices, 32);
    assert_eq!(config.steal_policy, StealPolicy::Quietest);
    assert_eq!(config.max_block_size, SynthConfig::default().max_block_size);

    assert!(SynthConfig::from_toml_str("max_voices = 0").is_err());
}
