mod browser;
mod front_page;

pub use browser::open_in_browser;
pub use front_page::FrontPageClient;
