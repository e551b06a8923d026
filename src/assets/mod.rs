/// Asset listing
///
/// Groups the ids owned by a wallet into fixed-size pages and fetches full
/// records for the visible page only.

pub mod pagination;
pub mod table;

pub use pagination::{build_group_index, parse_index_label, Group, GroupIndex, GroupingMode};
pub use table::{AssetRow, AssetsTable, AssetsTableConfig, PageView, TableView};
