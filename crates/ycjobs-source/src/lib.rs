//! Company sources: the filter-aware primary API, the static snapshot
//! fallback, and the resolver that picks between them.

pub mod http;
pub mod resolve;
pub mod snapshot;

pub use http::{HttpCompanyFeed, SourceError};
pub use resolve::{CompanyFeed, NamePick, Resolution, SourceOrigin, SourceUnavailable, resolve};
pub use snapshot::{SNAPSHOT_TTL, SnapshotCache};
