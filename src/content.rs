//! Text content resolution for overlays.
//!
//! Each [`TextSpec`](crate::model::TextSpec) names a generator via
//! `ContentType` and carries the matching payload. Resolution happens once
//! per variation index, so file-backed and regex-backed generators draw a
//! fresh value for every output image.

use anyhow::Context as _;
use rand::Rng;

use crate::error::{ImprintError, ImprintResult};
use crate::model::TextSpec;

/// Upper bound on `*`/`+` repetitions when sampling from a pattern.
const MAX_REGEX_REPEAT: u32 = 10;

/// Produce the final overlay string for one text entry.
pub fn resolve(text: &TextSpec, rng: &mut impl Rng) -> ImprintResult<String> {
    let raw = match text.content_type.to_lowercase().as_str() {
        "fixed" => {
            let payload = text.fixed.as_ref().ok_or_else(|| {
                ImprintError::content("content type 'fixed' requires a Fixed payload")
            })?;
            payload.content.clone()
        }
        "fromfile" => {
            let payload = text.from_file.as_ref().ok_or_else(|| {
                ImprintError::content("content type 'fromfile' requires a FromFile payload")
            })?;
            random_line(&payload.file_path, rng)?
        }
        "fromregex" => {
            let payload = text.from_regex.as_ref().ok_or_else(|| {
                ImprintError::content("content type 'fromregex' requires a FromRegex payload")
            })?;
            generate_matching(&payload.pattern, rng)?
        }
        other => {
            return Err(ImprintError::content(format!(
                "unknown content type '{other}'"
            )));
        }
    };

    apply_transforms(&raw, &text.text_transform)
}

/// Pick a uniformly random line from a newline-separated file.
///
/// Lines are split on `'\n'` without trimming, so a trailing newline
/// contributes an empty final line that can be drawn.
fn random_line(path: &str, rng: &mut impl Rng) -> ImprintResult<String> {
    let body = std::fs::read_to_string(path)
        .with_context(|| format!("read content file '{path}'"))?;
    let lines: Vec<&str> = body.split('\n').collect();
    let pick = rng.random_range(0..lines.len());
    Ok(lines[pick].to_string())
}

/// Sample a string matching `pattern`.
fn generate_matching(pattern: &str, rng: &mut impl Rng) -> ImprintResult<String> {
    let sampler = rand_regex::Regex::compile(pattern, MAX_REGEX_REPEAT).map_err(|err| {
        ImprintError::content(format!("content pattern '{pattern}' is invalid: {err}"))
    })?;
    let sample: String = rng.sample(&sampler);
    Ok(sample)
}

/// Run the comma-separated transform chain over a resolved string.
///
/// Empty tags are skipped so `""` and `"capitalize,"` behave as expected;
/// an unknown tag is fatal.
fn apply_transforms(raw: &str, chain: &str) -> ImprintResult<String> {
    let mut out = raw.to_string();
    for tag in chain.split(',') {
        match tag.trim().to_lowercase().as_str() {
            "" => {}
            "capitalize" => out = out.to_uppercase(),
            other => {
                return Err(ImprintError::content(format!(
                    "unknown text transform '{other}'"
                )));
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand::rngs::StdRng;

    use super::*;
    use crate::model::{FixedContent, FromFileContent, FromRegexContent};

    fn fixed(content: &str) -> TextSpec {
        TextSpec {
            content_type: "fixed".to_string(),
            fixed: Some(FixedContent {
                content: content.to_string(),
            }),
            ..TextSpec::default()
        }
    }

    fn scratch_file(name: &str, body: &str) -> std::path::PathBuf {
        let dir = std::path::PathBuf::from("target").join("content_tests");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn fixed_content_passes_through() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(resolve(&fixed("hello"), &mut rng).unwrap(), "hello");
    }

    #[test]
    fn content_type_is_case_insensitive() {
        let mut spec = fixed("hello");
        spec.content_type = "FIXED".to_string();
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(resolve(&spec, &mut rng).unwrap(), "hello");
    }

    #[test]
    fn missing_payload_is_fatal() {
        let spec = TextSpec {
            content_type: "fromfile".to_string(),
            ..TextSpec::default()
        };
        let mut rng = StdRng::seed_from_u64(1);
        let err = resolve(&spec, &mut rng).unwrap_err();
        assert!(err.to_string().contains("FromFile"));
    }

    #[test]
    fn unknown_content_type_is_fatal() {
        let spec = TextSpec {
            content_type: "oracle".to_string(),
            ..TextSpec::default()
        };
        let mut rng = StdRng::seed_from_u64(1);
        let err = resolve(&spec, &mut rng).unwrap_err();
        assert!(err.to_string().contains("oracle"));
    }

    #[test]
    fn capitalize_transform_uppercases() {
        let mut spec = fixed("hello");
        spec.text_transform = "capitalize".to_string();
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(resolve(&spec, &mut rng).unwrap(), "HELLO");
    }

    #[test]
    fn empty_transform_chain_is_identity() {
        let mut spec = fixed("Hello");
        spec.text_transform = String::new();
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(resolve(&spec, &mut rng).unwrap(), "Hello");
    }

    #[test]
    fn unknown_transform_tag_is_fatal() {
        let mut spec = fixed("hello");
        spec.text_transform = "capitalize,reverse".to_string();
        let mut rng = StdRng::seed_from_u64(1);
        let err = resolve(&spec, &mut rng).unwrap_err();
        assert!(err.to_string().contains("reverse"));
    }

    #[test]
    fn from_file_draws_every_line() {
        let path = scratch_file("lines.txt", "alpha\nbeta\ngamma\ndelta");
        let spec = TextSpec {
            content_type: "fromfile".to_string(),
            from_file: Some(FromFileContent {
                file_path: path.to_string_lossy().into_owned(),
            }),
            ..TextSpec::default()
        };

        let mut rng = StdRng::seed_from_u64(42);
        let mut counts = std::collections::HashMap::new();
        for _ in 0..4000 {
            let line = resolve(&spec, &mut rng).unwrap();
            *counts.entry(line).or_insert(0u32) += 1;
        }
        assert_eq!(counts.len(), 4);
        for (_, n) in counts {
            assert!((800..=1200).contains(&n), "skewed draw count {n}");
        }
    }

    #[test]
    fn trailing_newline_adds_an_empty_line() {
        let path = scratch_file("trailing.txt", "only\n");
        let spec = TextSpec {
            content_type: "fromfile".to_string(),
            from_file: Some(FromFileContent {
                file_path: path.to_string_lossy().into_owned(),
            }),
            ..TextSpec::default()
        };

        let mut rng = StdRng::seed_from_u64(7);
        let mut saw_empty = false;
        for _ in 0..200 {
            if resolve(&spec, &mut rng).unwrap().is_empty() {
                saw_empty = true;
                break;
            }
        }
        assert!(saw_empty, "empty trailing line was never drawn");
    }

    #[test]
    fn missing_content_file_is_fatal() {
        let spec = TextSpec {
            content_type: "fromfile".to_string(),
            from_file: Some(FromFileContent {
                file_path: "target/content_tests/does-not-exist.txt".to_string(),
            }),
            ..TextSpec::default()
        };
        let mut rng = StdRng::seed_from_u64(1);
        assert!(resolve(&spec, &mut rng).is_err());
    }

    #[test]
    fn from_regex_samples_match_the_pattern() {
        let spec = TextSpec {
            content_type: "fromregex".to_string(),
            from_regex: Some(FromRegexContent {
                pattern: "[a-c]{3}-[0-9]{2}".to_string(),
            }),
            ..TextSpec::default()
        };

        let checker = regex::Regex::new("^[a-c]{3}-[0-9]{2}$").unwrap();
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..50 {
            let sample = resolve(&spec, &mut rng).unwrap();
            assert!(checker.is_match(&sample), "sample '{sample}' escapes pattern");
        }
    }

    #[test]
    fn invalid_pattern_is_fatal() {
        let spec = TextSpec {
            content_type: "fromregex".to_string(),
            from_regex: Some(FromRegexContent {
                pattern: "([unclosed".to_string(),
            }),
            ..TextSpec::default()
        };
        let mut rng = StdRng::seed_from_u64(1);
        assert!(resolve(&spec, &mut rng).is_err());
    }
}
