// Submodules for separation of concerns
pub(crate) mod eval;
mod page;
mod parse;
mod translate;
mod types;

pub use eval::{apply_projection, compare_bson, compare_docs, eval_filter};
pub use page::{AdvancedResults, PageCursor, PageState, Pagination};
pub use parse::{
    RawQuery, SHAPING_KEYS, coerce_value, is_shaping_key, parse_filter, parse_filter_key,
    parse_filter_pair, parse_select, parse_sort,
};
pub use translate::{ResultsOptions, TranslatedQuery, translate};
pub use types::{CmpOp, Filter, FindQuery, ID_FIELD, Order, PopulateSpec, Projection, Relation, SortSpec};
