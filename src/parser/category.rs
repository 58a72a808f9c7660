//! Category definitions from the trace header.
//!
//! A category maps a small integer id (scoped to one trace) to the
//! name the MPE logger gave it. Only a handful of names matter for
//! causal reconstruction; everything else is a generic state.

use crate::utils::config::{
    FINALIZE_CATEGORY_NAME, MESSAGE_CATEGORY_NAME, RECV_CATEGORY_NAME, SEND_CATEGORY_NAME,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Semantic label of a category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryKind {
    Send,
    Receive,
    Message,
    FinalizeMarker,
    Other,
}

impl std::str::FromStr for CategoryKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim() {
            SEND_CATEGORY_NAME => Self::Send,
            RECV_CATEGORY_NAME => Self::Receive,
            MESSAGE_CATEGORY_NAME => Self::Message,
            FINALIZE_CATEGORY_NAME => Self::FinalizeMarker,
            _ => Self::Other,
        })
    }
}

/// One parsed `Category` line
#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub id: u32,
    pub name: String,
    pub kind: CategoryKind,
}

impl Category {
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        let name = name.into();
        // Infallible
        let kind = name.parse().unwrap_or(CategoryKind::Other);
        Self { id, name, kind }
    }
}

/// Id → category lookup for one trace
#[derive(Debug, Clone, Default)]
pub struct CategoryMap {
    categories: HashMap<u32, Category>,
}

impl CategoryMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a category; a later definition with the same id wins
    pub fn insert(&mut self, category: Category) {
        self.categories.insert(category.id, category);
    }

    pub fn get(&self, id: u32) -> Option<&Category> {
        self.categories.get(&id)
    }

    pub fn kind_of(&self, id: u32) -> Option<CategoryKind> {
        self.get(id).map(|c| c.kind)
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_kind_from_name() {
        assert_eq!("MPI_Send".parse::<CategoryKind>().unwrap(), CategoryKind::Send);
        assert_eq!("MPI_Recv".parse::<CategoryKind>().unwrap(), CategoryKind::Receive);
        assert_eq!("message".parse::<CategoryKind>().unwrap(), CategoryKind::Message);
        assert_eq!(
            "MPE_Comm_finalize".parse::<CategoryKind>().unwrap(),
            CategoryKind::FinalizeMarker
        );
        assert_eq!("MPI_Barrier".parse::<CategoryKind>().unwrap(), CategoryKind::Other);
    }

    #[test]
    fn test_category_map_lookup() {
        let mut map = CategoryMap::new();
        map.insert(Category::new(3, "MPI_Send"));

        assert_eq!(map.kind_of(3), Some(CategoryKind::Send));
        assert_eq!(map.kind_of(4), None);
        assert_eq!(map.len(), 1);
    }
}
