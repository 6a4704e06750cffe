//! # Output as Input
//!
//! A node for node-graph image-generation hosts that feeds a previously generated
//! image back into the graph.
//!
//! The node lists the images in the host's output directory (newest first), and
//! loads the picked one as an `IMAGE` tensor `(1, H, W, 3)` plus a `MASK` tensor
//! `(1, H, W)` taken from the alpha channel. Any failure produces placeholder
//! tensors instead of an error, so a stale selection never breaks a graph run.
//!
//! ## Example
//!
//! ```no_run
//! use output_as_input::{Config, OutputAsInput};
//!
//! # fn main() -> output_as_input::Result<()> {
//! let node = OutputAsInput::new(&Config::default())?;
//!
//! let inputs = node.input_types()?;
//! let latest = &inputs.required["image"].default;
//!
//! let (image, mask) = node.load_image_and_mask(latest).into_tuple();
//! assert_eq!(image.shape()[0], 1);
//! assert_eq!(mask.shape()[0], 1);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod image;
pub mod node;
pub mod output_dir;

pub use config::Config;
pub use error::{Error, Result};
pub use node::{node_definitions, NodeDefinition, NodeOutput, OutputAsInput};
pub use output_dir::{Choices, OutputDirectory, NONE_CHOICE};
