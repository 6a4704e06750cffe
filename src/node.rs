//! The "Output as Input" graph node.
//!
//! The node offers the images found in the host's output directory as a single
//! choice input and turns the picked file into an `IMAGE` tensor and a `MASK`
//! tensor. Loading never fails from the host's point of view: anything that goes
//! wrong is logged and replaced by placeholder tensors.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::config::Config;
use crate::error::Result;
use crate::image::{self, ImageTensor, MaskTensor};
use crate::output_dir::{Choices, OutputDirectory, NONE_CHOICE};

/// Static description of a node, as registered with the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeDefinition {
    pub class_name: &'static str,
    pub display_name: &'static str,
    pub category: &'static str,
    /// Name of the entry point the host invokes.
    pub function: &'static str,
    pub return_types: &'static [&'static str],
    pub return_names: &'static [&'static str],
}

/// Inputs a node accepts, keyed by input name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InputTypes {
    pub required: BTreeMap<&'static str, Choices>,
}

/// Definition plus the inputs currently on offer.
#[derive(Debug, Clone, Serialize)]
pub struct NodeInfo {
    #[serde(flatten)]
    pub definition: NodeDefinition,
    pub input: InputTypes,
}

/// Values produced by one evaluation of the node.
#[derive(Debug, Clone)]
pub struct NodeOutput {
    pub image: ImageTensor,
    pub mask: MaskTensor,
}

impl NodeOutput {
    /// Single black pixel with an opaque mask.
    #[must_use]
    pub fn placeholder() -> Self {
        let (image, mask) = image::placeholder();
        Self { image, mask }
    }

    /// Outputs in `return_types` order.
    #[must_use]
    pub fn into_tuple(self) -> (ImageTensor, MaskTensor) {
        (self.image, self.mask)
    }
}

/// Every node this crate registers with the host.
#[must_use]
pub fn node_definitions() -> Vec<NodeDefinition> {
    vec![OutputAsInput::DEFINITION]
}

/// Feeds a previously generated image back into the graph.
#[derive(Debug, Clone)]
pub struct OutputAsInput {
    output_dir: OutputDirectory,
}

impl OutputAsInput {
    pub const DEFINITION: NodeDefinition = NodeDefinition {
        class_name: "OutputAsInput",
        display_name: "Output as Input",
        category: "image",
        function: "load_image_and_mask",
        return_types: &["IMAGE", "MASK"],
        return_names: &["image_out", "mask_out"],
    };

    /// Name of the node's only input.
    pub const IMAGE_INPUT: &'static str = "image";

    /// Create the node for the configured output directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self::with_directory(OutputDirectory::from_config(config)?))
    }

    #[must_use]
    pub fn with_directory(output_dir: OutputDirectory) -> Self {
        Self { output_dir }
    }

    #[must_use]
    pub fn output_dir(&self) -> &OutputDirectory {
        &self.output_dir
    }

    /// Current inputs. The directory is rescanned on every call.
    ///
    /// # Errors
    ///
    /// Returns an error if the output directory exists but cannot be read.
    pub fn input_types(&self) -> Result<InputTypes> {
        let choices = self.output_dir.choices()?;
        Ok(InputTypes {
            required: BTreeMap::from([(Self::IMAGE_INPUT, choices)]),
        })
    }

    /// Definition together with the current inputs.
    ///
    /// # Errors
    ///
    /// Returns an error if the output directory exists but cannot be read.
    pub fn info(&self) -> Result<NodeInfo> {
        Ok(NodeInfo {
            definition: Self::DEFINITION,
            input: self.input_types()?,
        })
    }

    /// Load the selected image, surfacing any failure.
    ///
    /// # Errors
    ///
    /// Returns an error if nothing is selected, the selection does not name a file in
    /// the output directory, or the file cannot be decoded.
    pub fn try_load(&self, selection: &str) -> Result<NodeOutput> {
        let path = self.output_dir.resolve(selection)?;

        tracing::info!("Loading {}", path.display());
        let (image, mask) = image::load_image(&path)?;

        Ok(NodeOutput { image, mask })
    }

    /// Load the selected image, falling back to placeholders on any failure.
    #[must_use]
    pub fn load_image_and_mask(&self, selection: &str) -> NodeOutput {
        if selection.is_empty() || selection == NONE_CHOICE {
            tracing::debug!("No image selected, returning placeholder");
            return NodeOutput::placeholder();
        }

        match self.try_load(selection) {
            Ok(output) => output,
            Err(err) => {
                tracing::error!("{err}");
                NodeOutput::placeholder()
            }
        }
    }
}
