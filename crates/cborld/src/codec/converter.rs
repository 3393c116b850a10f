//! The tree walk shared by compression and decompression.
//!
//! For each node:
//! 1. apply the node's embedded `@context`
//! 2. read the node's types through `@type` and its aliases
//! 3. apply the type-scoped contexts of those types
//! 4. visit entries in term order, converting each value under the
//!    property-scoped context of its term
//!
//! Both directions visit the same keys in the same order, so terms first
//! seen in a context are registered identically on either side. A node's
//! keys are resolved to codes before any of its children are visited.

use std::rc::Rc;

use crate::codec::strategy::Strategy;
use crate::codec::values::{CodecContext, ValueType};
use crate::context::{ActiveContext, ContextLoader, DocumentLoader};
use crate::error::Error;

pub struct Converter<'a, S> {
    strategy: S,
    loader: ContextLoader<'a>,
    codec: CodecContext<'a>,
}

impl<'a, S: Strategy> Converter<'a, S> {
    pub fn new(strategy: S, documents: &'a dyn DocumentLoader, codec: CodecContext<'a>) -> Self {
        Self {
            strategy,
            loader: ContextLoader::new(documents),
            codec,
        }
    }

    /// Converts a document root: a node, or a list of nodes each starting
    /// from an empty context.
    pub fn convert(&mut self, root: &S::Input) -> Result<S::Output, Error> {
        if let Some(items) = self.strategy.as_list(root) {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                let node = self
                    .strategy
                    .as_node(item)
                    .ok_or_else(|| self.strategy.invalid_root("document array must hold only objects"))?;
                out.push(self.convert_node(node, &ActiveContext::empty())?);
            }
            return Ok(self.strategy.list_output(out));
        }
        let node = self
            .strategy
            .as_node(root)
            .ok_or_else(|| self.strategy.invalid_root("document must be an object or an array of objects"))?;
        self.convert_node(node, &ActiveContext::empty())
    }

    fn convert_node(&mut self, node: &S::Node, parent: &Rc<ActiveContext>) -> Result<S::Output, Error> {
        let mut out = self.strategy.create_container();

        let context = self
            .strategy
            .convert_contexts(node, &self.codec, self.loader.registry(), &mut out)?;
        let active = parent.apply_embedded(&mut self.loader, context.as_ref())?;

        let types = self
            .strategy
            .object_types(node, &active.type_terms(), &self.codec, self.loader.registry())?;
        let active = active.apply_type_scoped(&mut self.loader, &types)?;
        let type_terms = active.type_terms();

        for entry in self.strategy.locate_entries(node, self.loader.registry())? {
            let property = active.apply_property_scoped(&mut self.loader, &entry.term)?;
            let is_type_term = type_terms.binary_search(&entry.term).is_ok();
            let value_type = ValueType::for_term(&active, &entry.term, is_type_term);

            let mut values = Vec::with_capacity(entry.values.len());
            for value in entry.values {
                values.push(self.convert_value(value, &value_type, &property)?);
            }
            self.strategy.assign_entry(&mut out, entry.key, entry.plural, values);
        }
        Ok(self.strategy.node_output(out))
    }

    fn convert_value(
        &mut self,
        value: &S::Input,
        value_type: &ValueType,
        active: &Rc<ActiveContext>,
    ) -> Result<S::Output, Error> {
        if self.strategy.is_null(value) {
            return Ok(self.strategy.null_output());
        }
        if let Some(coded) = self
            .strategy
            .try_code_value(value, value_type, &self.codec, self.loader.registry())?
        {
            return Ok(coded);
        }
        if let Some(items) = self.strategy.as_list(value) {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(self.convert_value(item, value_type, active)?);
            }
            return Ok(self.strategy.list_output(out));
        }
        match self.strategy.as_node(value) {
            Some(node) => self.convert_node(node, active),
            None => Err(self.strategy.invalid_value("value has no conversion")),
        }
    }
}
