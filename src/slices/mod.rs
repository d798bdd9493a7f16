//! Slice streaming: prefetch window, sources, cache, and the async bridge.

pub mod cache;
pub mod fetcher;
pub mod sources;
pub mod types;
pub mod window;

pub use cache::{decode_slice, SliceCache};
pub use fetcher::SliceFetcher;
pub use sources::{DirectorySource, SliceSource, SyntheticSource};
pub use types::{FetchEvent, FetchRequest, SliceError, SliceMessage, SlicePayload};
pub use window::SliceWindow;
