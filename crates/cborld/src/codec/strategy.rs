//! The direction-specific half of a conversion.
//!
//! [`Converter`](crate::codec::converter::Converter) walks a document the
//! same way in both directions. A [`Strategy`] supplies the parts that
//! differ: how entries are located in an input node, how keys are written,
//! and which value codec direction is applied.

use serde_json::Value as JsonValue;

use crate::codec::values::{CodecContext, ValueType};
use crate::error::Error;
use crate::registry::TermRegistry;

/// One entry of an input node, resolved to its term.
///
/// `key` is the output key, fixed when the entry is located so that terms
/// registered while converting the values cannot change it.
#[derive(Debug)]
pub struct Entry<'v, V, K> {
    pub term: String,
    pub key: K,
    pub plural: bool,
    /// The entry's values: the array elements when plural, else one value.
    pub values: Vec<&'v V>,
}

/// Sorts entries by term name, the order both directions register terms in.
pub(crate) fn sort_entries<V, K>(entries: &mut [Entry<'_, V, K>]) {
    entries.sort_by(|a, b| a.term.cmp(&b.term));
}

pub trait Strategy {
    /// Values of the tree being read.
    type Input;
    /// Values of the tree being written.
    type Output;
    /// A node of the tree being read.
    type Node: ?Sized;
    /// A node of the tree being written, under construction.
    type Container;
    /// A key of the tree being written.
    type Key;

    fn as_node<'v>(&self, value: &'v Self::Input) -> Option<&'v Self::Node>;

    fn as_list<'v>(&self, value: &'v Self::Input) -> Option<&'v [Self::Input]>;

    fn is_null(&self, value: &Self::Input) -> bool;

    fn null_output(&self) -> Self::Output;

    fn create_container(&self) -> Self::Container;

    /// Converts the node's `@context` entry into `out` and returns its JSON
    /// form for context processing.
    fn convert_contexts(
        &self,
        node: &Self::Node,
        codec: &CodecContext<'_>,
        registry: &TermRegistry,
        out: &mut Self::Container,
    ) -> Result<Option<JsonValue>, Error>;

    /// Reads the node's type values through every key in `type_terms`.
    fn object_types(
        &self,
        node: &Self::Node,
        type_terms: &[String],
        codec: &CodecContext<'_>,
        registry: &TermRegistry,
    ) -> Result<Vec<String>, Error>;

    /// Lists the node's entries other than `@context`, sorted by term, with
    /// their output keys resolved against the registry as it is now.
    fn locate_entries<'v>(
        &self,
        node: &'v Self::Node,
        registry: &TermRegistry,
    ) -> Result<Vec<Entry<'v, Self::Input, Self::Key>>, Error>;

    /// Applies the value codec for `value_type`. `None` means the value
    /// needs structural conversion.
    fn try_code_value(
        &self,
        value: &Self::Input,
        value_type: &ValueType,
        codec: &CodecContext<'_>,
        registry: &TermRegistry,
    ) -> Result<Option<Self::Output>, Error>;

    fn assign_entry(&self, out: &mut Self::Container, key: Self::Key, plural: bool, values: Vec<Self::Output>);

    fn list_output(&self, items: Vec<Self::Output>) -> Self::Output;

    fn node_output(&self, container: Self::Container) -> Self::Output;

    /// Error for a document root that is neither a node nor a list of nodes.
    fn invalid_root(&self, reason: &'static str) -> Error;

    /// Error for an input value that is neither a node, a list nor a value
    /// any codec accepts.
    fn invalid_value(&self, reason: &'static str) -> Error;
}
