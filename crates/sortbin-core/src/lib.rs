//! sortbin core - zero-shot recycling classification.
//!
//! An uploaded photo is hosted on an external image service, fetched back,
//! scored by CLIP against every descriptor of a recycling taxonomy, and the
//! descriptor probabilities are summed into ranked category scores.
//!
//! # Architecture
//!
//! ```text
//! Upload → Relay (imgbb) → Fetch → Decode → CLIP (zero-shot) → Aggregate → Ranked categories
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use sortbin_core::{Config, Sorter};
//!
//! #[tokio::main]
//! async fn main() -> sortbin_core::Result<()> {
//!     let config = Config::load()?;
//!     let sorter = Sorter::from_config(&config).await?;
//!
//!     let bytes = std::fs::read("./bottle.jpg")?;
//!     let result = sorter.classify_upload(&bytes, Some("bottle.jpg")).await?;
//!     for score in &result.scores {
//!         println!("{}: {:.3}", score.category, score.score);
//!     }
//!     Ok(())
//! }
//! ```

pub mod classifier;
pub mod config;
pub mod decode;
pub mod error;
pub mod math;
pub mod relay;
pub mod sorter;
pub mod taxonomy;
pub mod types;

pub use classifier::{ClipClassifier, ZeroShotClassifier};
pub use config::Config;
pub use error::{ClassifyError, ConfigError, RelayError, Result, SortbinError};
pub use relay::{HostedImage, ImageRelay, ImgbbRelay};
pub use sorter::Sorter;
pub use taxonomy::{aggregate, LabelIndex, TaxonomyTable};
pub use types::{CategoryScore, Classification};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
