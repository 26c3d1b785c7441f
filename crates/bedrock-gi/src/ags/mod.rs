//! AGS input: edition detection, decoding and source metadata.

mod detect;
mod parser;
mod source;

pub use detect::{AgsVersion, detect_ags_version};
pub use parser::{Ags3Parser, GroupDecoder, ParserConfig};
pub use source::{SourceMetadata, content_hash};
