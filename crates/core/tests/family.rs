//! Tests for model family resolution.

use parley_core::ModelFamily;

#[test]
fn resolve_family_names() {
    assert_eq!(ModelFamily::from("harmony"), ModelFamily::Harmony);
    assert_eq!(ModelFamily::from("ChatML"), ModelFamily::ChatMl);
    assert_eq!(ModelFamily::from("kimi"), ModelFamily::Kimi);
    assert_eq!(ModelFamily::from("unknown"), ModelFamily::Unknown);
}

#[test]
fn resolve_model_identifiers() {
    assert_eq!(ModelFamily::from("gpt-oss-20b"), ModelFamily::Harmony);
    assert_eq!(ModelFamily::from("Qwen2.5-7B-Instruct"), ModelFamily::ChatMl);
    assert_eq!(ModelFamily::from("Qwen3-8B"), ModelFamily::Qwen3);
    assert_eq!(
        ModelFamily::from("Meta-Llama-3.1-8B-Instruct"),
        ModelFamily::Llama3
    );
    assert_eq!(ModelFamily::from("kimi-k2-instruct"), ModelFamily::Kimi);
    assert_eq!(
        ModelFamily::from("stable-diffusion-xl"),
        ModelFamily::Diffusion
    );
    assert_eq!(ModelFamily::from("whisper-large-v3"), ModelFamily::Speech);
}

#[test]
fn unrecognised_falls_back_to_unknown() {
    assert_eq!(ModelFamily::from("foobar-model"), ModelFamily::Unknown);
    assert_eq!(ModelFamily::default(), ModelFamily::Unknown);
}

#[test]
fn display_round_trips() {
    for family in ModelFamily::ALL {
        assert_eq!(ModelFamily::from(family.to_string().as_str()), family);
    }
}

#[test]
fn non_text_families() {
    assert!(!ModelFamily::Diffusion.is_text());
    assert!(!ModelFamily::Speech.is_text());
    assert!(ModelFamily::Harmony.is_text());
    assert!(ModelFamily::Unknown.is_text());
}
