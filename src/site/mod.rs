//! Fred Meyer specific modules: URLs, selectors, the product record and the HTML parser.

pub mod models;
pub mod parser;
pub mod selectors;
pub mod urls;

pub use models::{ImageSlots, ProductRecord, NAME_UNAVAILABLE};
pub use parser::Parser;

/// Site origin used to absolutize relative links.
pub const ORIGIN: &str = "https://www.fredmeyer.com";

/// Short site name used in output file names.
pub const SITE_NAME: &str = "fredmeyer";

/// Path segment that marks a product detail page.
pub const DETAIL_MARKER: &str = "/p/";

/// Host/path fragment shared by every product image on the CDN.
pub const IMAGE_HOST_MARKER: &str = "kroger.com/product/images";

/// CDN prefix for the fixed-pattern product image URLs.
pub const IMAGE_CDN_BASE: &str = "https://www.kroger.com/product/images/xlarge";

/// Placeholder used when no image strategy produced anything.
pub const DUMMY_IMAGE_URL: &str = "https://dummyimage.com/1000x1000/ffffff/999999.jpg&text=No+Image";
