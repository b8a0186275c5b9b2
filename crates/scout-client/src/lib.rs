pub mod decode;
pub mod fetcher;
pub mod parser;

pub use decode::{DecodedHtml, decode_html};
pub use fetcher::ReqwestFetcher;
pub use parser::HtmlParser;
