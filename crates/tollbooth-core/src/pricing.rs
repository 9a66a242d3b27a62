//! Pricing calculator for tollbooth.
//!
//! Maps an operation kind plus its usage units to a credit cost. The
//! calculator is pure and deterministic: same inputs, same quote, no I/O.
//!
//! Linear kinds (translate, transcribe, summarize) are priced proportionally
//! to their units with a per-kind minimum. Discrete kinds (image, video,
//! text-to-speech) are fixed-table lookups on their option values. A 10%
//! service fee is applied on top of the base in both cases, and the total is
//! rounded up to whole credits at settlement.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::MeterError;

/// Default service fee percentage applied on top of the base price.
pub const DEFAULT_FEE_PERCENT: u8 = 10;

/// Words per normalization unit for text kinds.
const WORDS_PER_UNIT: f64 = 1000.0;

/// Seconds per normalization unit for audio kinds.
const SECONDS_PER_UNIT: f64 = 60.0;

/// A metered operation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    /// Text translation; units are word count.
    Translate,

    /// Audio transcription; units are seconds of audio.
    Transcribe,

    /// Text summarization; units are word count.
    Summarize,

    /// Image generation; priced by (size, quality).
    GenerateImage,

    /// Video generation; priced by duration tier.
    GenerateVideo,

    /// Text-to-speech; priced by voice model, units are character count.
    Tts,
}

impl OperationKind {
    /// Whether this kind is priced proportionally to its units.
    #[must_use]
    pub const fn is_linear(&self) -> bool {
        matches!(self, Self::Translate | Self::Transcribe | Self::Summarize)
    }

    /// Kind as a string (matches the wire format).
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Translate => "translate",
            Self::Transcribe => "transcribe",
            Self::Summarize => "summarize",
            Self::GenerateImage => "generate_image",
            Self::GenerateVideo => "generate_video",
            Self::Tts => "tts",
        }
    }
}

/// A transient price quote. Never persisted; only the resulting
/// `total_credits` is recorded in a ledger entry at settlement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    /// Base cost in whole credits.
    pub base_credits: i64,

    /// Service fee in fractional credits.
    pub service_fee_credits: f64,

    /// Total cost: `ceil(base + fee)`, in whole credits.
    pub total_credits: i64,
}

/// Requested image size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageSize {
    /// Square output (1:1).
    Square,
    /// Portrait output (9:16).
    Portrait,
    /// Landscape output (16:9).
    Landscape,
}

/// Requested image quality tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageQuality {
    /// Standard quality.
    Standard,
    /// High definition.
    Hd,
}

/// Requested image style. Validated but does not affect price.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageStyle {
    /// Natural rendering.
    #[default]
    Natural,
    /// Vivid, saturated rendering.
    Vivid,
}

/// Video duration tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoDuration {
    /// Up to 5 seconds.
    Short,
    /// Up to 15 seconds.
    Medium,
    /// Up to 30 seconds.
    Long,
}

/// Text-to-speech voice model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TtsModel {
    /// Standard synthesis.
    Standard,
    /// Neural synthesis.
    Neural,
}

/// Kind-specific options for discrete operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OperationOptions {
    /// Options for image generation.
    Image {
        /// Output size.
        size: ImageSize,
        /// Quality tier.
        quality: ImageQuality,
        /// Rendering style.
        #[serde(default)]
        style: ImageStyle,
    },

    /// Options for video generation.
    Video {
        /// Duration tier.
        duration: VideoDuration,
    },

    /// Options for text-to-speech.
    Tts {
        /// Voice name; must be one of the configured voices.
        voice: String,
        /// Synthesis model.
        model: TtsModel,
    },
}

/// Proportional pricing for a linear operation kind.
#[derive(Debug, Clone)]
pub struct LinearPricing {
    /// Credits per normalization unit (1000 words or 60 seconds).
    pub rate_per_unit: f64,

    /// Floor applied to the base price.
    pub min_credits: i64,

    /// How many raw units make one normalization unit.
    pub normalization: f64,
}

/// Pricing configuration for all metered operations. Static; loaded once
/// at startup and never renegotiated at runtime.
#[derive(Debug, Clone)]
pub struct PricingConfig {
    /// Service fee percentage applied on top of the base price.
    pub fee_percent: u8,

    /// Translation pricing (per 1000 words).
    pub translate: LinearPricing,

    /// Transcription pricing (per 60 seconds of audio).
    pub transcribe: LinearPricing,

    /// Summarization pricing (per 1000 words).
    pub summarize: LinearPricing,

    /// Image cost table by (size, quality).
    pub image_credits: HashMap<(ImageSize, ImageQuality), i64>,

    /// Video cost table by duration tier.
    pub video_credits: HashMap<VideoDuration, i64>,

    /// Text-to-speech cost table by model.
    pub tts_credits: HashMap<TtsModel, i64>,

    /// Accepted text-to-speech voice names.
    pub tts_voices: Vec<String>,

    /// Maximum characters accepted per text-to-speech request.
    pub max_tts_characters: f64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        let mut image_credits = HashMap::new();
        image_credits.insert((ImageSize::Square, ImageQuality::Standard), 4);
        image_credits.insert((ImageSize::Square, ImageQuality::Hd), 8);
        image_credits.insert((ImageSize::Portrait, ImageQuality::Standard), 5);
        image_credits.insert((ImageSize::Portrait, ImageQuality::Hd), 10);
        image_credits.insert((ImageSize::Landscape, ImageQuality::Standard), 5);
        image_credits.insert((ImageSize::Landscape, ImageQuality::Hd), 10);

        let mut video_credits = HashMap::new();
        video_credits.insert(VideoDuration::Short, 20);
        video_credits.insert(VideoDuration::Medium, 40);
        video_credits.insert(VideoDuration::Long, 80);

        let mut tts_credits = HashMap::new();
        tts_credits.insert(TtsModel::Standard, 2);
        tts_credits.insert(TtsModel::Neural, 5);

        Self {
            fee_percent: DEFAULT_FEE_PERCENT,
            translate: LinearPricing {
                rate_per_unit: 0.6,
                min_credits: 1,
                normalization: WORDS_PER_UNIT,
            },
            transcribe: LinearPricing {
                rate_per_unit: 1.0,
                min_credits: 2,
                normalization: SECONDS_PER_UNIT,
            },
            summarize: LinearPricing {
                rate_per_unit: 0.5,
                min_credits: 1,
                normalization: WORDS_PER_UNIT,
            },
            image_credits,
            video_credits,
            tts_credits,
            tts_voices: vec![
                "aria".into(),
                "orion".into(),
                "luna".into(),
                "atlas".into(),
            ],
            max_tts_characters: 20_000.0,
        }
    }
}

impl PricingConfig {
    /// Price an operation from its kind, units, and options.
    ///
    /// # Errors
    ///
    /// Returns `MeterError::Validation` for non-finite or negative units,
    /// options supplied for the wrong kind, missing options for a discrete
    /// kind, or option values outside the configured sets.
    #[allow(clippy::cast_possible_truncation)]
    pub fn price(
        &self,
        kind: OperationKind,
        units: f64,
        options: Option<&OperationOptions>,
    ) -> Result<PriceQuote, MeterError> {
        if !units.is_finite() || units < 0.0 {
            return Err(MeterError::Validation(format!(
                "units must be a non-negative number, got {units}"
            )));
        }

        let base_credits = match kind {
            OperationKind::Translate => self.linear_base(&self.translate, kind, units, options)?,
            OperationKind::Transcribe => {
                self.linear_base(&self.transcribe, kind, units, options)?
            }
            OperationKind::Summarize => self.linear_base(&self.summarize, kind, units, options)?,
            OperationKind::GenerateImage => self.image_base(options)?,
            OperationKind::GenerateVideo => self.video_base(options)?,
            OperationKind::Tts => self.tts_base(units, options)?,
        };

        let service_fee_credits = base_credits as f64 * f64::from(self.fee_percent) / 100.0;
        let total_credits = (base_credits as f64 + service_fee_credits).ceil() as i64;

        Ok(PriceQuote {
            base_credits,
            service_fee_credits,
            total_credits,
        })
    }

    #[allow(clippy::cast_possible_truncation, clippy::unused_self)]
    fn linear_base(
        &self,
        pricing: &LinearPricing,
        kind: OperationKind,
        units: f64,
        options: Option<&OperationOptions>,
    ) -> Result<i64, MeterError> {
        if options.is_some() {
            return Err(MeterError::Validation(format!(
                "{} takes no options",
                kind.as_str()
            )));
        }

        let proportional = (units / pricing.normalization * pricing.rate_per_unit).ceil() as i64;
        Ok(proportional.max(pricing.min_credits))
    }

    fn image_base(&self, options: Option<&OperationOptions>) -> Result<i64, MeterError> {
        match options {
            Some(OperationOptions::Image { size, quality, .. }) => self
                .image_credits
                .get(&(*size, *quality))
                .copied()
                .ok_or_else(|| {
                    MeterError::Validation(format!(
                        "no price configured for image {size:?}/{quality:?}"
                    ))
                }),
            Some(_) => Err(MeterError::Validation(
                "generate_image requires image options".into(),
            )),
            None => Err(MeterError::Validation(
                "generate_image requires options".into(),
            )),
        }
    }

    fn video_base(&self, options: Option<&OperationOptions>) -> Result<i64, MeterError> {
        match options {
            Some(OperationOptions::Video { duration }) => self
                .video_credits
                .get(duration)
                .copied()
                .ok_or_else(|| {
                    MeterError::Validation(format!(
                        "no price configured for video duration {duration:?}"
                    ))
                }),
            Some(_) => Err(MeterError::Validation(
                "generate_video requires video options".into(),
            )),
            None => Err(MeterError::Validation(
                "generate_video requires options".into(),
            )),
        }
    }

    fn tts_base(&self, units: f64, options: Option<&OperationOptions>) -> Result<i64, MeterError> {
        match options {
            Some(OperationOptions::Tts { voice, model }) => {
                if !self.tts_voices.iter().any(|v| v == voice) {
                    return Err(MeterError::Validation(format!("unknown voice: {voice}")));
                }
                if units > self.max_tts_characters {
                    return Err(MeterError::Validation(format!(
                        "tts input exceeds {} characters",
                        self.max_tts_characters
                    )));
                }
                self.tts_credits.get(model).copied().ok_or_else(|| {
                    MeterError::Validation(format!("no price configured for tts model {model:?}"))
                })
            }
            Some(_) => Err(MeterError::Validation("tts requires tts options".into())),
            None => Err(MeterError::Validation("tts requires options".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> PricingConfig {
        PricingConfig::default()
    }

    #[test]
    fn translate_1000_words() {
        let quote = config()
            .price(OperationKind::Translate, 1000.0, None)
            .unwrap();
        assert_eq!(quote.base_credits, 1);
        assert!((quote.service_fee_credits - 0.1).abs() < 1e-9);
        assert_eq!(quote.total_credits, 2);
    }

    #[test]
    fn translate_5000_words() {
        let quote = config()
            .price(OperationKind::Translate, 5000.0, None)
            .unwrap();
        assert_eq!(quote.base_credits, 3);
        assert_eq!(quote.total_credits, 4);
    }

    #[test]
    fn transcribe_300_seconds() {
        let quote = config()
            .price(OperationKind::Transcribe, 300.0, None)
            .unwrap();
        assert_eq!(quote.base_credits, 5);
        assert_eq!(quote.total_credits, 6);
    }

    #[test]
    fn transcribe_minimum_floor() {
        let quote = config()
            .price(OperationKind::Transcribe, 30.0, None)
            .unwrap();
        assert_eq!(quote.base_credits, 2);
    }

    #[test]
    fn pricing_is_deterministic() {
        let config = config();
        let a = config.price(OperationKind::Summarize, 4321.0, None).unwrap();
        let b = config.price(OperationKind::Summarize, 4321.0, None).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn image_table_lookup() {
        let options = OperationOptions::Image {
            size: ImageSize::Square,
            quality: ImageQuality::Hd,
            style: ImageStyle::Vivid,
        };
        let quote = config()
            .price(OperationKind::GenerateImage, 0.0, Some(&options))
            .unwrap();
        assert_eq!(quote.base_credits, 8);
        assert_eq!(quote.total_credits, 9); // 8 + 0.8 fee, rounded up
    }

    #[test]
    fn video_table_lookup() {
        let options = OperationOptions::Video {
            duration: VideoDuration::Medium,
        };
        let quote = config()
            .price(OperationKind::GenerateVideo, 0.0, Some(&options))
            .unwrap();
        assert_eq!(quote.base_credits, 40);
        assert_eq!(quote.total_credits, 44);
    }

    #[test]
    fn tts_unknown_voice_is_rejected() {
        let options = OperationOptions::Tts {
            voice: "nonexistent".into(),
            model: TtsModel::Neural,
        };
        let err = config()
            .price(OperationKind::Tts, 500.0, Some(&options))
            .unwrap_err();
        assert_eq!(err.code(), "validation_error");
    }

    #[test]
    fn tts_character_cap() {
        let options = OperationOptions::Tts {
            voice: "aria".into(),
            model: TtsModel::Standard,
        };
        let err = config()
            .price(OperationKind::Tts, 1_000_000.0, Some(&options))
            .unwrap_err();
        assert_eq!(err.code(), "validation_error");
    }

    #[test]
    fn discrete_kind_requires_options() {
        let err = config()
            .price(OperationKind::GenerateImage, 0.0, None)
            .unwrap_err();
        assert_eq!(err.code(), "validation_error");
    }

    #[test]
    fn linear_kind_rejects_options() {
        let options = OperationOptions::Video {
            duration: VideoDuration::Short,
        };
        let err = config()
            .price(OperationKind::Translate, 100.0, Some(&options))
            .unwrap_err();
        assert_eq!(err.code(), "validation_error");
    }

    #[test]
    fn mismatched_options_are_rejected() {
        let options = OperationOptions::Video {
            duration: VideoDuration::Short,
        };
        let err = config()
            .price(OperationKind::GenerateImage, 0.0, Some(&options))
            .unwrap_err();
        assert_eq!(err.code(), "validation_error");
    }

    #[test]
    fn negative_units_are_rejected() {
        let err = config()
            .price(OperationKind::Translate, -5.0, None)
            .unwrap_err();
        assert_eq!(err.code(), "validation_error");
    }

    #[test]
    fn nan_units_are_rejected() {
        let err = config()
            .price(OperationKind::Translate, f64::NAN, None)
            .unwrap_err();
        assert_eq!(err.code(), "validation_error");
    }

    #[test]
    fn zero_units_still_charge_minimum() {
        let quote = config().price(OperationKind::Translate, 0.0, None).unwrap();
        assert_eq!(quote.base_credits, 1);
        assert!(quote.total_credits >= 1);
    }
}
