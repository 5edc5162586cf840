//! Output intent.
//!
//! - `icc` - built-in sRGB profile and ICC header reading

pub mod icc;

pub use icc::{IccHeader, SRGB_PROFILE};

use crate::codec::flate::flate_encode;
use crate::config::OutputIntentConfig;
use crate::error::{PackError, PackResult};
use crate::graph::ObjectGraph;
use crate::model::{PDFObject, PDFStream, dict};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

const REGISTRY_NAME: &str = "http://www.color.org";

/// Where the embedded ICC profile came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileSource {
    Configured,
    BuiltIn,
}

/// The profile to embed, per `config`.
///
/// A configured profile that is missing, unreadable or not ICC data is
/// replaced by the built-in sRGB profile, unless
/// `require_configured_profile` is set.
pub fn load_profile(config: &OutputIntentConfig) -> PackResult<(Cow<'static, [u8]>, ProfileSource)> {
    let failure = match &config.icc_profile_path {
        Some(path) => match std::fs::read(path) {
            Ok(bytes) if IccHeader::parse(&bytes).is_some() => {
                tracing::debug!(path = %path.display(), "using configured ICC profile");
                return Ok((Cow::Owned(bytes), ProfileSource::Configured));
            }
            Ok(_) => format!("{} is not an ICC profile", path.display()),
            Err(e) => format!("cannot read {}: {e}", path.display()),
        },
        None => "icc_profile_path is not set".to_string(),
    };

    if config.require_configured_profile {
        return Err(PackError::Config(failure));
    }
    if config.icc_profile_path.is_some() {
        tracing::warn!(reason = %failure, "substituting built-in sRGB profile");
    } else {
        tracing::debug!("using built-in sRGB profile");
    }
    Ok((Cow::Borrowed(SRGB_PROFILE.as_slice()), ProfileSource::BuiltIn))
}

/// Replace the catalog `/OutputIntents` with a single GTS_PDFA1 intent.
pub fn add_output_intent(graph: &mut ObjectGraph, config: &OutputIntentConfig) -> PackResult<ProfileSource> {
    let (profile, source) = load_profile(config)?;
    let components = IccHeader::parse(&profile)
        .and_then(|h| h.components())
        .unwrap_or(3);

    let encoded = flate_encode(&profile)?;
    let icc = PDFStream::new(
        dict([
            ("N", PDFObject::Int(i64::from(components))),
            ("Filter", PDFObject::name("FlateDecode")),
        ]),
        encoded,
    );
    let icc = graph.add_object(PDFObject::from(icc));

    let condition = config.output_condition.as_str();
    let intent = graph.add_object(PDFObject::Dict(dict([
        ("Type", PDFObject::name("OutputIntent")),
        ("S", PDFObject::name("GTS_PDFA1")),
        ("OutputConditionIdentifier", PDFObject::text(condition)),
        ("OutputCondition", PDFObject::text(condition)),
        ("RegistryName", PDFObject::string(REGISTRY_NAME)),
        ("Info", PDFObject::text(condition)),
        ("DestOutputProfile", PDFObject::Ref(icc)),
    ])));
    graph
        .catalog_mut()?
        .insert("OutputIntents".into(), PDFObject::Array(vec![PDFObject::Ref(intent)]));
    tracing::debug!(?source, "output intent attached");
    Ok(source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::flate::flate_decode;
    use std::io::Write;

    #[test]
    fn builtin_profile_is_used_by_default() {
        let mut graph = ObjectGraph::new();
        let source = add_output_intent(&mut graph, &OutputIntentConfig::default()).unwrap();
        assert_eq!(source, ProfileSource::BuiltIn);

        let intents = graph.catalog().unwrap()["OutputIntents"].clone();
        let intents = intents.as_array().unwrap();
        assert_eq!(intents.len(), 1);
        let intent = graph.resolve_dict(&intents[0]).unwrap();
        assert_eq!(intent["S"], PDFObject::name("GTS_PDFA1"));
        assert_eq!(intent["OutputConditionIdentifier"], PDFObject::string("sRGB IEC61966-2.1"));
        let profile = graph.resolve(&intent["DestOutputProfile"]).unwrap().as_stream().unwrap();
        assert_eq!(profile.get("N"), Some(&PDFObject::Int(3)));
        let decoded = flate_decode(profile.get_rawdata(), None).unwrap();
        assert_eq!(decoded, *SRGB_PROFILE);
    }

    #[test]
    fn configured_profile_is_preferred() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&SRGB_PROFILE).unwrap();
        let config = OutputIntentConfig {
            icc_profile_path: Some(file.path().to_path_buf()),
            ..OutputIntentConfig::default()
        };
        let (_, source) = load_profile(&config).unwrap();
        assert_eq!(source, ProfileSource::Configured);
    }

    #[test]
    fn unreadable_profile_is_substituted() {
        let config = OutputIntentConfig {
            icc_profile_path: Some("/nonexistent/sRGB.icc".into()),
            ..OutputIntentConfig::default()
        };
        let (bytes, source) = load_profile(&config).unwrap();
        assert_eq!(source, ProfileSource::BuiltIn);
        assert_eq!(bytes.len(), SRGB_PROFILE.len());
    }

    #[test]
    fn required_profile_missing_is_an_error() {
        let config = OutputIntentConfig {
            require_configured_profile: true,
            ..OutputIntentConfig::default()
        };
        assert!(matches!(load_profile(&config), Err(PackError::Config(_))));
    }
}
