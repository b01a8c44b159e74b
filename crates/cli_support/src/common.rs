use clap::{Args, ValueEnum};
use coco_dataset::{MissingImagePolicy, ScanOptions};
use data_contracts::FinitePolicy;
use std::path::PathBuf;

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingImageArg {
    /// Abort when an annotation references an unknown image.
    Fail,
    /// Report the annotation under `<unknown>` and continue.
    Sentinel,
}

impl From<MissingImageArg> for MissingImagePolicy {
    fn from(arg: MissingImageArg) -> Self {
        match arg {
            MissingImageArg::Fail => MissingImagePolicy::Fail,
            MissingImageArg::Sentinel => MissingImagePolicy::Sentinel,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FiniteArg {
    /// Only NaN coordinates are broken.
    NanOnly,
    /// NaN and +/-Infinity are broken.
    RejectInfinite,
}

impl From<FiniteArg> for FinitePolicy {
    fn from(arg: FiniteArg) -> Self {
        match arg {
            FiniteArg::NanOnly => FinitePolicy::NanOnly,
            FiniteArg::RejectInfinite => FinitePolicy::RejectInfinite,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Summary line plus a fixed-width table.
    #[default]
    Text,
    /// Full report as pretty-printed JSON.
    Json,
}

/// Scan options shared across annotation-checking binaries. Unset flags fall
/// back to the tool config.
#[derive(Debug, Clone, Args)]
pub struct ScanArgs {
    /// COCO instances JSON to scan (defaults to the configured path).
    pub annotations: Option<PathBuf>,
    /// Maximum number of broken annotations to list (0 prints only the count).
    #[arg(long)]
    pub limit: Option<usize>,
    /// Policy for annotations whose image id is missing from the index.
    #[arg(long, value_enum)]
    pub missing_image: Option<MissingImageArg>,
    /// Which non-finite coordinates count as broken.
    #[arg(long, value_enum)]
    pub finite: Option<FiniteArg>,
    /// Report format written to stdout.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

impl ScanArgs {
    /// Overlay the flags that were given on top of `base`.
    pub fn apply(&self, base: ScanOptions) -> ScanOptions {
        ScanOptions {
            limit: self.limit.unwrap_or(base.limit),
            finite: self.finite.map(Into::into).unwrap_or(base.finite),
            missing_image: self
                .missing_image
                .map(Into::into)
                .unwrap_or(base.missing_image),
        }
    }
}
