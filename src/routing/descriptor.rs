use crate::config::RouterConfig;
use crate::script::Script;

/// Where and how to reach one script's backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendDescriptor {
    pub script: Script,
    pub endpoint: String,
    pub field_name: &'static str,
}

impl BackendDescriptor {
    pub fn new(script: Script, endpoint: impl Into<String>) -> Self {
        BackendDescriptor { script, endpoint: endpoint.into(), field_name: script.field_name() }
    }
}

/// One descriptor per script, fixed for the router's lifetime.
#[derive(Debug, Clone)]
pub struct Backends {
    decimal: BackendDescriptor,
    devanagari: BackendDescriptor,
}

impl Backends {
    pub fn new(decimal_endpoint: impl Into<String>, devanagari_endpoint: impl Into<String>) -> Self {
        Backends {
            decimal: BackendDescriptor::new(Script::Decimal, decimal_endpoint),
            devanagari: BackendDescriptor::new(Script::Devanagari, devanagari_endpoint),
        }
    }

    pub fn from_config(config: &RouterConfig) -> Self {
        Backends::new(config.endpoint(Script::Decimal), config.endpoint(Script::Devanagari))
    }

    pub fn get(&self, script: Script) -> &BackendDescriptor {
        match script {
            Script::Decimal => &self.decimal,
            Script::Devanagari => &self.devanagari,
        }
    }
}
