//! Publish pipeline orchestration.
//!
//! Runs compress -> upload -> register as one observable job with a single
//! status stream. Stages are strictly sequential: a stage's outcome is
//! fully observable before the next stage starts.

mod publish;
mod status;

pub use publish::PublishPipeline;
pub use status::{PublishStage, PublishStatus};
