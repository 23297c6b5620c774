//! Test fixtures: plain source rows reconciled into versioned entities.

use crate::{CallbackError, Merged, Reconciler};

#[derive(Clone, Debug, PartialEq)]
pub struct Row {
    pub id: u32,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Entity {
    pub id: u32,
    pub name: String,
    pub version: u32,
    pub deleted: bool,
}

pub fn row(id: u32, name: &str) -> Row {
    Row {
        id,
        name: name.to_string(),
    }
}

pub fn entity(id: u32, name: &str) -> Entity {
    Entity {
        id,
        name: name.to_string(),
        version: 0,
        deleted: false,
    }
}

pub fn rows(listing: &[(u32, &str)]) -> Vec<Row> {
    listing.iter().map(|(id, name)| row(*id, name)).collect()
}

pub fn entities(listing: &[(u32, &str)]) -> Vec<Entity> {
    listing.iter().map(|(id, name)| entity(*id, name)).collect()
}

pub fn ids<'a>(entities: impl IntoIterator<Item = &'a Entity>) -> Vec<u32> {
    entities.into_iter().map(|e| e.id).collect()
}

pub fn match_row(source: &Row, target: &Entity) -> Result<bool, CallbackError> {
    Ok(source.id == target.id)
}

/// Overlay the name and bump the version; unmatched targets are discarded.
pub fn merge_row(
    source: Option<&Row>,
    target: Option<&mut Entity>,
) -> Result<Merged<Entity>, CallbackError> {
    Ok(match (source, target) {
        (Some(row), Some(existing)) => {
            existing.name = row.name.clone();
            existing.version += 1;
            Merged::Retain
        }
        (Some(row), None) => Merged::Replace(entity(row.id, &row.name)),
        (None, _) => Merged::Discard,
    })
}

fn soft_delete(
    source: Option<&Row>,
    target: Option<&mut Entity>,
) -> Result<Merged<Entity>, CallbackError> {
    match (source, target) {
        (None, Some(existing)) => {
            existing.deleted = true;
            Ok(Merged::Retain)
        }
        (source, target) => merge_row(source, target),
    }
}

pub fn entity_list() -> Reconciler<'static, Row, Entity, Vec<Entity>> {
    Reconciler::list(match_row, merge_row)
}

pub fn soft_deleting_list() -> Reconciler<'static, Row, Entity, Vec<Entity>> {
    Reconciler::list(match_row, soft_delete)
}
