//! Filtering, sorting and grouping of item lists for display.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};

use crate::item::{Item, Location};

/// Items expiring within this window count as expiring soon.
pub const EXPIRING_SOON_DAYS: i64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Freshness {
    Fresh,
    ExpiringSoon,
    Expired,
}

impl Freshness {
    pub fn of(item: &Item, now: DateTime<Utc>) -> Self {
        if item.expires_on < now {
            Freshness::Expired
        } else if item.expires_on < now + Duration::days(EXPIRING_SOON_DAYS) {
            Freshness::ExpiringSoon
        } else {
            Freshness::Fresh
        }
    }
}

impl FromStr for Freshness {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace([' ', '_'], "-").as_str() {
            "fresh" => Ok(Freshness::Fresh),
            "expiring-soon" | "expiring" => Ok(Freshness::ExpiringSoon),
            "expired" => Ok(Freshness::Expired),
            _ => Err(format!("unknown freshness: {}", s)),
        }
    }
}

impl fmt::Display for Freshness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Freshness::Fresh => write!(f, "Fresh"),
            Freshness::ExpiringSoon => write!(f, "Expiring Soon"),
            Freshness::Expired => write!(f, "Expired"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    /// As listed.
    #[default]
    Insertion,
    /// Earliest expiration first.
    Expiration,
    /// Expired items first, each group earliest expiration first.
    ExpiredFirst,
    Name,
    AddedAt,
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace([' ', '_'], "-").as_str() {
            "insertion" | "none" => Ok(SortOrder::Insertion),
            "expiration" | "expires" => Ok(SortOrder::Expiration),
            "expired-first" => Ok(SortOrder::ExpiredFirst),
            "name" => Ok(SortOrder::Name),
            "added" | "added-at" => Ok(SortOrder::AddedAt),
            _ => Err(format!("unknown sort order: {}", s)),
        }
    }
}

/// A display query over an item list.
#[derive(Debug, Clone)]
pub struct ItemQuery {
    pub location: Option<Location>,
    /// Sections shown on screen; items elsewhere are hidden.
    pub sections: BTreeSet<Location>,
    pub search: String,
    pub freshness: Option<Freshness>,
    pub sort: SortOrder,
}

impl Default for ItemQuery {
    fn default() -> Self {
        Self {
            location: None,
            sections: Location::ALL.into_iter().collect(),
            search: String::new(),
            freshness: None,
            sort: SortOrder::default(),
        }
    }
}

impl ItemQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    pub fn with_freshness(mut self, freshness: Freshness) -> Self {
        self.freshness = Some(freshness);
        self
    }

    pub fn with_sort(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }

    pub fn hide_section(mut self, location: Location) -> Self {
        self.sections.remove(&location);
        self
    }

    pub fn matches(&self, item: &Item, now: DateTime<Utc>) -> bool {
        if self.location.is_some_and(|location| item.location != location) {
            return false;
        }
        if !self.sections.contains(&item.location) {
            return false;
        }
        if self.freshness.is_some_and(|freshness| Freshness::of(item, now) != freshness) {
            return false;
        }
        let needle = self.search.trim().to_lowercase();
        needle.is_empty() || item.name.to_lowercase().contains(&needle)
    }

    /// Returns the matching items in the requested order.
    pub fn apply(&self, items: &[Item], now: DateTime<Utc>) -> Vec<Item> {
        let mut selected: Vec<Item> = items
            .iter()
            .filter(|item| self.matches(item, now))
            .cloned()
            .collect();
        sort_items(&mut selected, self.sort, now);
        selected
    }
}

pub fn sort_items(items: &mut [Item], order: SortOrder, now: DateTime<Utc>) {
    match order {
        SortOrder::Insertion => {}
        SortOrder::Expiration => items.sort_by_key(|item| item.expires_on),
        SortOrder::ExpiredFirst => {
            items.sort_by_key(|item| (item.expires_on >= now, item.expires_on));
        }
        SortOrder::Name => items.sort_by_cached_key(|item| item.name.to_lowercase()),
        SortOrder::AddedAt => items.sort_by_key(|item| item.added_at),
    }
}

/// Splits a list into its three location sections, keeping relative order.
pub fn group_by_location(items: &[Item]) -> BTreeMap<Location, Vec<Item>> {
    let mut groups: BTreeMap<Location, Vec<Item>> =
        Location::ALL.into_iter().map(|location| (location, Vec::new())).collect();
    for item in items {
        groups.entry(item.location).or_default().push(item.clone());
    }
    groups
}
