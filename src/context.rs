use crate::charset::Charset;
use crate::edid::{DecodeContext, Edid};
use crate::registry::{Registry, StandardsAmbiguity};
use crate::standards::Standards;
use crate::traits::DescriptorFactory;

/// Execution context for codec operations: the set of currently active
/// standards, the default character set, the standards-ambiguity rule and
/// the registry in use.
///
/// The default context activates every known standard and uses the shared
/// registry; tests and embedders can build contexts over their own
/// registries. Diagnostics go through the `log` facade and never raise,
/// so the context carries no sink.
#[derive(Clone, Copy)]
pub struct Context<'a> {
    standards: Standards,
    default_charset: Charset,
    ambiguity: StandardsAmbiguity,
    registry: &'a Registry,
}

impl<'a> Context<'a> {
    pub fn new(registry: &'a Registry) -> Self {
        Context {
            standards: Standards::all(),
            default_charset: Charset::default(),
            ambiguity: StandardsAmbiguity::default(),
            registry,
        }
    }

    pub fn with_standards(mut self, standards: Standards) -> Self {
        self.standards = standards;
        self
    }

    pub fn with_default_charset(mut self, charset: Charset) -> Self {
        self.default_charset = charset;
        self
    }

    pub fn with_standards_ambiguity(mut self, ambiguity: StandardsAmbiguity) -> Self {
        self.ambiguity = ambiguity;
        self
    }

    pub fn active_standards(&self) -> Standards {
        self.standards
    }

    pub fn default_charset(&self) -> Charset {
        self.default_charset
    }

    pub fn standards_ambiguity(&self) -> StandardsAmbiguity {
        self.ambiguity
    }

    pub fn registry(&self) -> &'a Registry {
        self.registry
    }

    pub fn lookup_factory(
        &self,
        tag: u8,
        payload: &[u8],
        dctx: &DecodeContext,
    ) -> Option<DescriptorFactory> {
        self.registry
            .lookup_factory(tag, payload, dctx, self.standards, self.ambiguity)
    }

    pub fn resolve_edid(&self, tag: u8, payload: &[u8], dctx: &DecodeContext) -> Edid {
        self.registry
            .resolve_edid(tag, payload, dctx, self.standards, self.ambiguity)
    }
}

impl Default for Context<'static> {
    fn default() -> Self {
        Context::new(Registry::global())
    }
}
