mod article;
mod buffer;
mod hit;
mod readable;
mod status;

pub use article::{ArticleRecord, SeenItem, StoreFile};
pub use buffer::ReadBuffer;
pub use hit::{discussion_url, Hit, RawHit};
pub use readable::{ArticleContext, ArticleMeta, ReadableArticle};
pub use status::ExtractionState;
