use chrono::{DateTime, Utc};
use freezer_core::query::group_by_location;
use freezer_core::{AsyncStore, Freshness, Item, ItemQuery, Location, ViewState};

use crate::error::FrzError;
use crate::store::AppContext;

pub struct NewItem {
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    pub location: Location,
    pub expires_on: DateTime<Utc>,
    pub notes: Option<String>,
}

/// Fields to change on an existing item; `None` keeps the current value.
#[derive(Default)]
pub struct ItemChanges {
    pub name: Option<String>,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    pub location: Option<Location>,
    pub expires_on: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

impl ItemChanges {
    pub fn apply_to(self, mut item: Item) -> Item {
        if let Some(name) = self.name {
            item.name = name;
        }
        if let Some(quantity) = self.quantity {
            item.quantity = quantity;
        }
        if let Some(unit) = self.unit {
            item.unit = unit;
        }
        if let Some(location) = self.location {
            item.location = location;
        }
        if let Some(expires_on) = self.expires_on {
            item.expires_on = expires_on;
        }
        if let Some(notes) = self.notes {
            item.notes = (!notes.is_empty()).then_some(notes);
        }
        item
    }
}

pub fn list(ctx: &AppContext, query: &ItemQuery) {
    print!("{}", render(&ctx.view.items(), query, Utc::now()));
}

pub fn render(items: &[Item], query: &ItemQuery, now: DateTime<Utc>) -> String {
    let selected = query.apply(items, now);
    let mut out = String::new();

    for (location, group) in group_by_location(&selected) {
        if !query.sections.contains(&location) || query.location.is_some_and(|l| l != location) {
            continue;
        }
        out.push_str(&format!("{} ({})\n", location.label(), group.len()));
        if group.is_empty() {
            out.push_str(&format!("  No items in {}\n", location.label()));
        }
        for item in &group {
            out.push_str(&format!(
                "  {}  {} {} {}  expires {} [{}]\n",
                item.id,
                item.name,
                item.quantity,
                item.unit,
                item.expires_on.format("%Y-%m-%d"),
                Freshness::of(item, now),
            ));
            if let Some(notes) = &item.notes {
                out.push_str(&format!("      {}\n", notes));
            }
        }
    }
    out
}

pub async fn add(ctx: &AppContext, new_item: NewItem) -> Result<(), FrzError> {
    let mut item = Item::new(
        new_item.name,
        new_item.quantity,
        new_item.unit,
        new_item.location,
        new_item.expires_on,
    );
    item.notes = new_item.notes;
    let id = item.id.clone();

    ctx.view.create_item(item).await?;
    println!("Added {}", id);
    Ok(())
}

pub async fn edit(ctx: &AppContext, id: &str, changes: ItemChanges) -> Result<(), FrzError> {
    let current = find(&ctx.view, id)?;
    ctx.view.update_item(changes.apply_to(current)).await?;
    println!("Updated {}", id);
    Ok(())
}

pub async fn remove(ctx: &AppContext, id: &str) -> Result<(), FrzError> {
    find(&ctx.view, id)?;
    ctx.view.delete_item(id).await?;
    println!("Removed {}", id);
    Ok(())
}

pub async fn clear(ctx: &AppContext) -> Result<(), FrzError> {
    let count = ctx.view.items().len();
    ctx.view.repository().clear_all().await?;
    ctx.view.load().await?;
    println!("Removed {} items", count);
    Ok(())
}

fn find<S: AsyncStore>(view: &ViewState<S>, id: &str) -> Result<Item, FrzError> {
    view.items()
        .into_iter()
        .find(|item| item.id == id)
        .ok_or_else(|| FrzError::ItemNotFound(id.to_string()))
}
