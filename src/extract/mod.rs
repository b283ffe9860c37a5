mod article;
mod fetcher;
mod format;
mod normalize;
mod readability;

pub use fetcher::ArticleFetcher;
pub use format::format_context;
