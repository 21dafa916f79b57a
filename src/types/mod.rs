// ABOUTME: Type-safe identifiers and validated domain types.
// ABOUTME: Uses phantom types to prevent deployment and run ID confusion at compile time.

mod environment;
mod id;
mod revision;
mod service_name;

pub use environment::{EnvironmentName, EnvironmentNameError};
pub use id::{DeploymentId, RunId};
pub use revision::{Revision, RevisionError};
pub use service_name::{ServiceName, ServiceNameError};
