//! Voice spec parsing and rate/pitch normalization
//!
//! A raw voice string has the shape
//! `<lang>-<REGION>-<VoiceName>[<sign><digits>R][<sign><digits>P]`, optionally
//! suffixed with `+s` to request persistence, e.g.
//! `en-US-AnaNeural+10r-5p+s`. Parsing is a small hand-written grammar:
//! a fixed base-voice prefix followed by an optional rate modifier (`R`,
//! percent) and then an optional pitch modifier (`P`, Hz), case-insensitive.
//!
//! Parsing never fails: strings that do not match the base pattern are passed
//! through verbatim as the voice id (the provider gets to reject them), and
//! modifiers outside `-99..=99` are discarded. Both cases emit diagnostics.

use tracing::{debug, warn};

use crate::aliases::VoiceAliasTable;
use crate::types::VoiceSpec;

/// Suffix on the raw string requesting that the output be persisted
const SAVE_SUFFIX: &str = "+s";

/// Largest accepted magnitude for rate/pitch modifiers
const MAX_DELTA: i64 = 99;

/// Parse a raw voice string into a [`VoiceSpec`]
///
/// The `+s` suffix is stripped before alias resolution, so aliases map to
/// canonical strings without the save flag.
#[must_use]
pub fn parse_voice_spec(raw: &str, aliases: &VoiceAliasTable) -> VoiceSpec {
    let (stripped, save_output) = raw
        .strip_suffix(SAVE_SUFFIX)
        .map_or((raw, false), |rest| (rest, true));

    let canonical = aliases.resolve(stripped);

    let Some((base_voice, modifiers)) = split_base_voice(canonical) else {
        warn!(voice = %canonical, "Invalid voice string format, passing through verbatim");
        return VoiceSpec {
            base_voice: canonical.to_string(),
            rate_delta: None,
            pitch_delta: None,
            save_output,
        };
    };

    let (rate_delta, pitch_delta) = parse_modifiers(canonical, modifiers);

    debug!(
        voice = %canonical,
        base = %base_voice,
        rate = ?rate_delta,
        pitch = ?pitch_delta,
        save = save_output,
        "Parsed voice string"
    );

    VoiceSpec {
        base_voice: base_voice.to_string(),
        rate_delta,
        pitch_delta,
        save_output,
    }
}

/// Split `<ll>-<RR>-<Name...>` off the front of the string
///
/// Returns the base voice id and the unconsumed remainder, or `None` when the
/// prefix does not match.
fn split_base_voice(input: &str) -> Option<(&str, &str)> {
    let bytes = input.as_bytes();

    // ll-RR- prefix is exactly six bytes
    if bytes.len() < 7 {
        return None;
    }
    if !(bytes[0].is_ascii_alphabetic() && bytes[1].is_ascii_alphabetic()) {
        return None;
    }
    if bytes[2] != b'-' {
        return None;
    }
    if !(bytes[3].is_ascii_uppercase() && bytes[4].is_ascii_uppercase()) {
        return None;
    }
    if bytes[5] != b'-' {
        return None;
    }

    // Voice name: one or more alphanumerics (hyphens end the name)
    let name_len = bytes[6..]
        .iter()
        .take_while(|b| b.is_ascii_alphanumeric())
        .count();
    if name_len == 0 {
        return None;
    }

    let split = 6 + name_len;
    Some((&input[..split], &input[split..]))
}

/// Parse an optional rate then an optional pitch modifier from the remainder
///
/// Each modifier is `<sign><digits><R|P>`, rate strictly before pitch.
/// Duplicate keys, a rate modifier after a pitch modifier, and anything
/// that does not tokenize stops parsing; the remainder is ignored with a
/// diagnostic.
fn parse_modifiers(voice: &str, mut rest: &str) -> (Option<i8>, Option<i8>) {
    let mut rate = None;
    let mut pitch = None;

    while !rest.is_empty() {
        let Some((value, key, tail)) = next_modifier(rest) else {
            warn!(voice = %voice, remainder = %rest, "Ignoring trailing input in voice string");
            break;
        };

        let slot = match key {
            b'r' | b'R' if pitch.is_none() => &mut rate,
            b'p' | b'P' => &mut pitch,
            _ => {
                warn!(voice = %voice, remainder = %rest, "Rate modifier after pitch in voice string, ignoring remainder");
                break;
            },
        };
        if slot.is_some() {
            warn!(voice = %voice, remainder = %rest, "Duplicate modifier in voice string, ignoring remainder");
            break;
        }
        *slot = check_range(voice, key, value);
        rest = tail;
    }

    (rate, pitch)
}

/// Tokenize one `<sign><digits><R|P>` modifier
fn next_modifier(input: &str) -> Option<(i64, u8, &str)> {
    let bytes = input.as_bytes();

    let sign = match bytes.first()? {
        b'+' => 1,
        b'-' => -1,
        _ => return None,
    };

    let digits = bytes[1..]
        .iter()
        .take_while(|b| b.is_ascii_digit())
        .count();
    if digits == 0 {
        return None;
    }

    let key = *bytes.get(1 + digits)?;
    if !matches!(key, b'r' | b'R' | b'p' | b'P') {
        return None;
    }

    // Saturate rather than overflow on absurdly long digit runs; anything
    // past two digits is discarded by the range check anyway.
    let magnitude: i64 = input[1..=digits].parse().unwrap_or(i64::MAX);

    Some((sign * magnitude, key, &input[2 + digits..]))
}

/// Discard modifiers whose magnitude exceeds the accepted range
fn check_range(voice: &str, key: u8, value: i64) -> Option<i8> {
    if value.abs() > MAX_DELTA {
        warn!(
            voice = %voice,
            modifier = %(key as char),
            value,
            "Adjustment outside of reasonable bounds, ignoring"
        );
        return None;
    }
    #[allow(clippy::cast_possible_truncation)]
    Some(value as i8)
}

/// Convert a multiplicative speed value to the provider's rate format
///
/// `1.5` becomes `"+50%"`, `0.5` becomes `"-50%"`, `1.0` becomes `"+0%"`.
#[must_use]
pub fn speed_to_rate_percent(speed: f32) -> String {
    #[allow(clippy::cast_possible_truncation)]
    let percentage = ((speed - 1.0) * 100.0).round() as i32;
    format!("{percentage:+}%")
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn parse(raw: &str) -> VoiceSpec {
        parse_voice_spec(raw, &VoiceAliasTable::empty())
    }

    #[test]
    fn plain_base_voice() {
        let spec = parse("en-US-AnaNeural");
        assert_eq!(spec.base_voice, "en-US-AnaNeural");
        assert_eq!(spec.rate_delta, None);
        assert_eq!(spec.pitch_delta, None);
        assert!(!spec.save_output);
    }

    #[test]
    fn rate_and_pitch_modifiers() {
        let spec = parse("en-US-AnaNeural+10r+10p");
        assert_eq!(spec.base_voice, "en-US-AnaNeural");
        assert_eq!(spec.rate_delta, Some(10));
        assert_eq!(spec.pitch_delta, Some(10));
    }

    #[test]
    fn negative_modifiers() {
        let spec = parse("en-US-AnaNeural-20r+10p");
        assert_eq!(spec.rate_delta, Some(-20));
        assert_eq!(spec.pitch_delta, Some(10));
    }

    #[test]
    fn pitch_only() {
        let spec = parse("en-US-AnaNeural-10p");
        assert_eq!(spec.rate_delta, None);
        assert_eq!(spec.pitch_delta, Some(-10));
    }

    #[test]
    fn rate_after_pitch_is_ignored() {
        // Grammar is rate first, then pitch; the trailing rate modifier is
        // dropped and the speed multiplier applies instead.
        let spec = parse("en-US-AnaNeural-5p-13r");
        assert_eq!(spec.base_voice, "en-US-AnaNeural");
        assert_eq!(spec.rate_delta, None);
        assert_eq!(spec.pitch_delta, Some(-5));
    }

    #[test]
    fn uppercase_modifier_keys() {
        let spec = parse("en-US-AnaNeural+15R-5P");
        assert_eq!(spec.rate_delta, Some(15));
        assert_eq!(spec.pitch_delta, Some(-5));
    }

    #[test]
    fn save_suffix_sets_flag_and_strips() {
        let saved = parse("en-US-EmmaNeural+15r-5p+s");
        let plain = parse("en-US-EmmaNeural+15r-5p");
        assert!(saved.save_output);
        assert!(!plain.save_output);
        assert_eq!(saved.base_voice, plain.base_voice);
        assert_eq!(saved.rate_delta, plain.rate_delta);
        assert_eq!(saved.pitch_delta, plain.pitch_delta);
    }

    #[test]
    fn save_suffix_alone_on_non_matching_string() {
        let spec = parse("alloy+s");
        assert!(spec.save_output);
        assert_eq!(spec.base_voice, "alloy");
    }

    #[test]
    fn non_matching_string_passes_through_verbatim() {
        let spec = parse("not a voice");
        assert_eq!(spec.base_voice, "not a voice");
        assert_eq!(spec.rate_delta, None);
        assert_eq!(spec.pitch_delta, None);
    }

    #[test]
    fn lowercase_region_does_not_match() {
        let spec = parse("en-us-AnaNeural+10r");
        assert_eq!(spec.base_voice, "en-us-AnaNeural+10r");
        assert_eq!(spec.rate_delta, None);
    }

    #[test]
    fn out_of_range_deltas_are_discarded() {
        let spec = parse("en-US-AnaNeural+100r-250p");
        assert_eq!(spec.base_voice, "en-US-AnaNeural");
        assert_eq!(spec.rate_delta, None);
        assert_eq!(spec.pitch_delta, None);
    }

    #[test]
    fn boundary_deltas_are_kept() {
        let spec = parse("en-US-AnaNeural+99r-99p");
        assert_eq!(spec.rate_delta, Some(99));
        assert_eq!(spec.pitch_delta, Some(-99));
    }

    #[test]
    fn duplicate_modifier_stops_parsing() {
        let spec = parse("en-US-AnaNeural+10r+20r");
        assert_eq!(spec.rate_delta, Some(10));
        assert_eq!(spec.pitch_delta, None);
    }

    #[test]
    fn trailing_garbage_is_ignored() {
        let spec = parse("en-US-AnaNeural+10r!!");
        assert_eq!(spec.base_voice, "en-US-AnaNeural");
        assert_eq!(spec.rate_delta, Some(10));
    }

    #[test]
    fn alias_resolution_applies_before_parsing() {
        let table =
            VoiceAliasTable::from_iter([("fable", "en-GB-SoniaNeural-5r+10p")]);
        let spec = parse_voice_spec("fable", &table);
        assert_eq!(spec.base_voice, "en-GB-SoniaNeural");
        assert_eq!(spec.rate_delta, Some(-5));
        assert_eq!(spec.pitch_delta, Some(10));
        assert!(!spec.save_output);
    }

    #[test]
    fn alias_with_save_suffix() {
        let table =
            VoiceAliasTable::from_iter([("fable", "en-GB-SoniaNeural-5r+10p")]);
        let spec = parse_voice_spec("fable+s", &table);
        assert_eq!(spec.base_voice, "en-GB-SoniaNeural");
        assert!(spec.save_output);
    }

    #[test]
    fn speed_to_rate_fixed_points() {
        assert_eq!(speed_to_rate_percent(1.0), "+0%");
        assert_eq!(speed_to_rate_percent(1.5), "+50%");
        assert_eq!(speed_to_rate_percent(0.5), "-50%");
        assert_eq!(speed_to_rate_percent(2.0), "+100%");
        assert_eq!(speed_to_rate_percent(1.25), "+25%");
    }

    proptest! {
        #[test]
        fn valid_strings_round_trip(
            lang in "[a-z]{2}",
            region in "[A-Z]{2}",
            name in "[a-zA-Z0-9]{1,16}",
            rate in -99i8..=99,
            pitch in -99i8..=99,
        ) {
            let base = format!("{lang}-{region}-{name}");
            let raw = format!("{base}{rate:+}r{pitch:+}p");
            let spec = parse(&raw);
            prop_assert_eq!(spec.base_voice, base);
            prop_assert_eq!(spec.rate_delta, Some(rate));
            prop_assert_eq!(spec.pitch_delta, Some(pitch));
        }

        #[test]
        fn oversized_deltas_are_always_dropped(
            rate in prop_oneof![100i64..=9999, -9999i64..=-100],
        ) {
            let raw = format!("en-US-AnaNeural{rate:+}r");
            let spec = parse(&raw);
            prop_assert_eq!(spec.rate_delta, None);
        }
    }
}
