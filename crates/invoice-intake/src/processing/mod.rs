//! Request processing: extraction on the blocking pool and the analyzer relay

mod pipeline;
mod relay;

pub use pipeline::InvoicePipeline;
pub use relay::ResponseRelay;
