//! Declarative chain descriptions and their translation into pipelines.
//!
//! A [`ChainConfig`] is what `--config-json` parses into; `--op` flags
//! produce the same [`Operation`] values through [`FromStr`].

use std::str::FromStr;

use kip_pipeline::actions::{self, Channels};
use kip_pipeline::{OverflowPolicy, Pipeline, PipelineBuilder, filters, mask};
use serde::{Deserialize, Serialize};

/// A whole run: history flag and the operations applied in order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    /// Retain every intermediate frame.
    pub keep_history: bool,
    /// Steps, first applied first. A [`Operation::Branch`] splits the
    /// chain and merges it back before the next step.
    pub operations: Vec<Operation>,
}

impl ChainConfig {
    /// Compile into an executable pipeline.
    #[must_use]
    pub fn to_pipeline(&self) -> Pipeline {
        let mut builder = PipelineBuilder::new();
        apply_all(&self.operations, &mut builder);
        builder.build()
    }
}

/// One named step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum Operation {
    Identity,
    Invert,
    Brighten {
        rate: f64,
    },
    Saturate {
        rate: f64,
        #[serde(default = "default_split")]
        split: f64,
        #[serde(default)]
        channels: Channels,
    },
    Desaturate {
        rate: f64,
        #[serde(default)]
        channels: Channels,
    },
    /// `255 * (v / 255) ^ (1 / gamma)`.
    Gamma {
        gamma: f64,
        #[serde(default)]
        channels: Channels,
    },
    Grayscale {
        #[serde(default = "unit_weights")]
        weights: [f64; 3],
    },
    Blur {
        sigma: f32,
    },
    Smooth {
        radius: u32,
        #[serde(default)]
        shape: MaskShape,
        #[serde(default)]
        weight: WeightKind,
    },
    RetainOnly {
        selector: SelectorConfig,
    },
    Branch(BranchConfig),
}

const fn default_split() -> f64 {
    0.5
}

const fn unit_weights() -> [f64; 3] {
    [1.0; 3]
}

/// Neighborhood shape for [`Operation::Smooth`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MaskShape {
    #[default]
    Circle,
    Square,
}

/// Distance weighting for [`Operation::Smooth`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum WeightKind {
    Uniform { multiplier: f64 },
    Linear { value: f64 },
}

impl Default for WeightKind {
    fn default() -> Self {
        Self::Uniform { multiplier: 1.0 }
    }
}

/// Pixel selector for [`Operation::RetainOnly`]. Thresholds are strict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum SelectorConfig {
    GrayOver { threshold: u32 },
    GrayUnder { threshold: u32 },
    MaxOver { threshold: u32 },
    MaxUnder { threshold: u32 },
    MinOver { threshold: u32 },
    MinUnder { threshold: u32 },
    ChannelsOver { r: u32, g: u32, b: u32 },
    ChannelsUnder { r: u32, g: u32, b: u32 },
}

/// Two arms and how their results merge.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BranchConfig {
    pub left: Vec<Operation>,
    pub right: Vec<Operation>,
    pub combine: CombineConfig,
}

/// Merge strategy for a [`BranchConfig`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum CombineConfig {
    /// Keep the left arm's stack, discard the right.
    #[default]
    KeepLeft,
    Add {
        #[serde(default)]
        overflow: OverflowPolicy,
    },
    Subtract,
}

fn apply_all(operations: &[Operation], builder: &mut PipelineBuilder) {
    for op in operations {
        op.apply(builder);
    }
}

impl Operation {
    /// Append this step to `builder`.
    pub fn apply(&self, builder: &mut PipelineBuilder) {
        match *self {
            Self::Identity => {
                builder.map_color(actions::identity());
            }
            Self::Invert => {
                builder.map_color(actions::invert());
            }
            Self::Brighten { rate } => {
                builder.map_color(actions::brighten(rate));
            }
            Self::Saturate {
                rate,
                split,
                channels,
            } => {
                builder.map_color(actions::saturate(rate, split, channels));
            }
            Self::Desaturate { rate, channels } => {
                builder.map_color(actions::desaturate(rate, channels));
            }
            Self::Gamma { gamma, channels } => {
                let exponent = gamma.recip();
                builder.map_color(actions::memoized(actions::curves(
                    move |v| 255.0 * (v / 255.0).powf(exponent),
                    channels,
                )));
            }
            Self::Grayscale { weights: [r, g, b] } => {
                builder.map_color(actions::grayscale(r, g, b));
            }
            Self::Blur { sigma } => {
                builder.paint(actions::gaussian_blur(sigma));
            }
            Self::Smooth {
                radius,
                shape,
                weight,
            } => {
                let mask: Box<mask::Mask> = match shape {
                    MaskShape::Circle => Box::new(mask::circle()),
                    MaskShape::Square => Box::new(mask::square()),
                };
                let weight: Box<mask::Weight> = match weight {
                    WeightKind::Uniform { multiplier } => Box::new(mask::uniform(multiplier)),
                    WeightKind::Linear { value } => Box::new(mask::linear(value)),
                };
                builder.map_with_neighbors_at(actions::smooth(radius, mask, weight));
            }
            Self::RetainOnly { selector } => {
                selector.apply(builder);
            }
            Self::Branch(ref branch) => {
                builder.branch(|br| {
                    br.left(|arm| apply_all(&branch.left, arm))
                        .right(|arm| apply_all(&branch.right, arm));
                    match branch.combine {
                        CombineConfig::KeepLeft => {}
                        CombineConfig::Add { overflow } => {
                            br.add(overflow);
                        }
                        CombineConfig::Subtract => {
                            br.subtract();
                        }
                    }
                });
            }
        }
    }
}

impl SelectorConfig {
    fn apply(self, builder: &mut PipelineBuilder) {
        match self {
            Self::GrayOver { threshold } => retain(builder, filters::gray_over(threshold)),
            Self::GrayUnder { threshold } => retain(builder, filters::gray_under(threshold)),
            Self::MaxOver { threshold } => retain(builder, filters::max_over(threshold)),
            Self::MaxUnder { threshold } => retain(builder, filters::max_under(threshold)),
            Self::MinOver { threshold } => retain(builder, filters::min_over(threshold)),
            Self::MinUnder { threshold } => retain(builder, filters::min_under(threshold)),
            Self::ChannelsOver { r, g, b } => retain(builder, filters::channels_over(r, g, b)),
            Self::ChannelsUnder { r, g, b } => retain(builder, filters::channels_under(r, g, b)),
        }
    }
}

fn retain(
    builder: &mut PipelineBuilder,
    selector: impl Fn(&dyn kip_pipeline::PixelAccess, kip_pipeline::PixelColor) -> bool + 'static,
) {
    builder.map_with_neighbors(actions::retain_only(selector));
}

/// Error from parsing an `--op` argument.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ParseOperationError(String);

/// `NAME` or `NAME=V1,V2,...`.
///
/// | Name                  | Values                  |
/// |-----------------------|-------------------------|
/// | `identity`, `invert`  | none                    |
/// | `brighten`            | rate                    |
/// | `saturate`            | rate, optional split    |
/// | `desaturate`          | rate                    |
/// | `gamma`               | gamma                   |
/// | `grayscale`           | optional r, g, b weight |
/// | `blur`                | sigma                   |
/// | `smooth`              | radius                  |
/// | `retain-gray-over` .. | threshold               |
/// | `retain-channels-over`| r, g, b                 |
impl FromStr for Operation {
    type Err = ParseOperationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, raw) = s.split_once('=').unwrap_or((s, ""));
        let values: Vec<&str> = if raw.is_empty() {
            Vec::new()
        } else {
            raw.split(',').map(str::trim).collect()
        };
        let args = Args { name, values };

        let op = match name {
            "identity" => args.none(Self::Identity)?,
            "invert" => args.none(Self::Invert)?,
            "brighten" => Self::Brighten {
                rate: args.one()?,
            },
            "saturate" => {
                let (rate, split) = match args.values.len() {
                    2 => (args.nth(0)?, args.nth(1)?),
                    _ => (args.one()?, default_split()),
                };
                Self::Saturate {
                    rate,
                    split,
                    channels: Channels::All,
                }
            }
            "desaturate" => Self::Desaturate {
                rate: args.one()?,
                channels: Channels::All,
            },
            "gamma" => Self::Gamma {
                gamma: args.one()?,
                channels: Channels::All,
            },
            "grayscale" => Self::Grayscale {
                weights: if args.values.is_empty() {
                    unit_weights()
                } else {
                    args.three()?
                },
            },
            "blur" => Self::Blur { sigma: args.one()? },
            "smooth" => Self::Smooth {
                radius: args.one()?,
                shape: MaskShape::default(),
                weight: WeightKind::default(),
            },
            _ => match name.strip_prefix("retain-") {
                Some(kind) => Self::RetainOnly {
                    selector: args.selector(kind)?,
                },
                None => return Err(ParseOperationError(format!("unknown operation {name:?}"))),
            },
        };
        Ok(op)
    }
}

struct Args<'a> {
    name: &'a str,
    values: Vec<&'a str>,
}

impl Args<'_> {
    fn none(&self, op: Operation) -> Result<Operation, ParseOperationError> {
        if self.values.is_empty() {
            Ok(op)
        } else {
            Err(self.arity("no values"))
        }
    }

    fn one<T: FromStr>(&self) -> Result<T, ParseOperationError> {
        if self.values.len() != 1 {
            return Err(self.arity("one value"));
        }
        self.nth(0)
    }

    fn three<T: FromStr>(&self) -> Result<[T; 3], ParseOperationError> {
        if self.values.len() != 3 {
            return Err(self.arity("three values"));
        }
        Ok([self.nth(0)?, self.nth(1)?, self.nth(2)?])
    }

    fn nth<T: FromStr>(&self, idx: usize) -> Result<T, ParseOperationError> {
        let raw = self.values.get(idx).copied().unwrap_or_default();
        raw.parse().map_err(|_| {
            ParseOperationError(format!("{}: invalid value {raw:?}", self.name))
        })
    }

    fn arity(&self, expected: &str) -> ParseOperationError {
        ParseOperationError(format!(
            "{} takes {expected}, got {}",
            self.name,
            self.values.len()
        ))
    }

    fn selector(&self, kind: &str) -> Result<SelectorConfig, ParseOperationError> {
        let selector = match kind {
            "gray-over" => SelectorConfig::GrayOver { threshold: self.one()? },
            "gray-under" => SelectorConfig::GrayUnder { threshold: self.one()? },
            "max-over" => SelectorConfig::MaxOver { threshold: self.one()? },
            "max-under" => SelectorConfig::MaxUnder { threshold: self.one()? },
            "min-over" => SelectorConfig::MinOver { threshold: self.one()? },
            "min-under" => SelectorConfig::MinUnder { threshold: self.one()? },
            "channels-over" => {
                let [r, g, b] = self.three()?;
                SelectorConfig::ChannelsOver { r, g, b }
            }
            "channels-under" => {
                let [r, g, b] = self.three()?;
                SelectorConfig::ChannelsUnder { r, g, b }
            }
            _ => {
                return Err(ParseOperationError(format!(
                    "unknown selector {kind:?} in {}",
                    self.name
                )));
            }
        };
        Ok(selector)
    }
}
