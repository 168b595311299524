pub mod header_policy;
pub mod pipeline;
pub mod resolver;
pub mod whitelist;

pub use header_policy::HeaderPolicy;
pub use pipeline::ProxyService;
pub use resolver::{ResolveError, ResolvedTarget, TargetTable};
pub use whitelist::Whitelist;
