/// Fixed-size page grouping of asset identifiers
use crate::gql::AssetIdentifier;

const LABEL_PREFIX: &str = "index-";

/// How pages are formed from the identifier list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GroupingMode {
    /// Straight positional paging: ceil(N/P) pages
    #[default]
    Positional,
    /// Drop a page whose ids are element-wise identical to any page kept
    /// before it. The first page is always kept.
    DedupAgainstPrevious,
}

/// One page of identifiers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub index: String,
    pub ids: Vec<AssetIdentifier>,
}

/// Ordered pages
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupIndex {
    groups: Vec<Group>,
}

pub fn index_label(n: usize) -> String {
    format!("{}{}", LABEL_PREFIX, n)
}

/// Numeric page index of a label such as `index-3` (first run of digits)
pub fn parse_index_label(label: &str) -> Option<usize> {
    let start = label.find(|c: char| c.is_ascii_digit())?;
    let digits: String = label[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

/// Partition `ids` into pages of `page_size`
pub fn build_group_index(ids: &[AssetIdentifier], page_size: usize, mode: GroupingMode) -> GroupIndex {
    let mut groups: Vec<Group> = Vec::new();
    if page_size == 0 {
        return GroupIndex { groups };
    }

    for (j, chunk) in ids.chunks(page_size).enumerate() {
        let label = index_label(j);
        let keep = match mode {
            GroupingMode::Positional => true,
            GroupingMode::DedupAgainstPrevious => {
                j == 0 || !groups.iter().any(|g| g.ids.as_slice() == chunk)
            }
        };
        if keep {
            groups.push(Group {
                index: label,
                ids: chunk.to_vec(),
            });
        }
    }

    GroupIndex { groups }
}

impl GroupIndex {
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn first_label(&self) -> Option<&str> {
        self.groups.first().map(|g| g.index.as_str())
    }

    /// Position of the page carrying `label`
    pub fn position_of(&self, label: &str) -> Option<usize> {
        self.groups.iter().position(|g| g.index == label)
    }

    /// Page addressed by label
    pub fn page(&self, label: &str) -> Option<&Group> {
        self.position_of(label).and_then(|n| self.groups.get(n))
    }

    /// Label of the page after `current`, `None` on the last page
    pub fn next_label(&self, current: &str) -> Option<String> {
        let n = self.position_of(current)?;
        self.groups.get(n + 1).map(|g| g.index.clone())
    }

    /// Label of the page before `current`, `None` on the first page
    pub fn previous_label(&self, current: &str) -> Option<String> {
        let n = self.position_of(current)?;
        if n == 0 {
            return None;
        }
        self.groups.get(n - 1).map(|g| g.index.clone())
    }

    /// All ids, in page order
    pub fn flatten(&self) -> Vec<AssetIdentifier> {
        self.groups.iter().flat_map(|g| g.ids.iter().cloned()).collect()
    }
}
