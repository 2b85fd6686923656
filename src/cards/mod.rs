//! Card system: definitions, keywords, elements, unit instances, catalog.
//!
//! ## Key Types
//!
//! - `CardId`: Identifier for one physical card (and its unit in play)
//! - `Card`: Static card data (stats, element, keywords, abilities)
//! - `Keyword` / `KeywordSet`: Typed keyword capabilities
//! - `Element`: Fire, water, earth, air and their oppositions
//! - `UnitInstance`: Runtime state of a card placed on the battlefield
//! - `CardCatalog`: Template lookup and deck building

pub mod catalog;
pub mod definition;
pub mod element;
pub mod instance;
pub mod keyword;

pub use catalog::CardCatalog;
pub(crate) use definition::ceil_div;
pub use definition::{has_keyword, Card, CardId, CardType};
pub use element::Element;
pub use instance::UnitInstance;
pub use keyword::{Keyword, KeywordSet};
